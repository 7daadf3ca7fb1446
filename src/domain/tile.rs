/// Tile legend and tile classes.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Empty,
    Ground,      // '='
    Brick,       // '#'
    BigBlock,    // 'B'
    Question,    // '?'  one-time reward from below
    Coin,        // 'o'
    Pipe,        // 'P'
    EnemySpawn,  // 'g'
    Flag,        // 'F'
    Castle,      // 'C'  decoration
    Hill,        // '^'  decoration
    Cloud,       // 'c'  decoration
    PlayerStart, // 'S'
}

impl Tile {
    /// Map a level character to a tile. Unknown characters are empty space.
    pub fn from_char(ch: char) -> Tile {
        match ch {
            '=' => Tile::Ground,
            '#' => Tile::Brick,
            'B' => Tile::BigBlock,
            '?' => Tile::Question,
            'o' => Tile::Coin,
            'P' => Tile::Pipe,
            'g' => Tile::EnemySpawn,
            'F' => Tile::Flag,
            'C' => Tile::Castle,
            '^' => Tile::Hill,
            'c' => Tile::Cloud,
            'S' => Tile::PlayerStart,
            _ => Tile::Empty,
        }
    }

    /// Blocks movement. Ground, brick and big block render differently
    /// but are one class for physics; pipes and question blocks join them.
    pub fn is_solid(self) -> bool {
        matches!(
            self,
            Tile::Ground | Tile::Brick | Tile::BigBlock | Tile::Pipe | Tile::Question
        )
    }

    /// Background-only tiles the renderer draws but physics ignores.
    pub fn is_decoration(self) -> bool {
        matches!(self, Tile::Castle | Tile::Hill | Tile::Cloud)
    }

    /// Marker tiles that spawn an entity and leave empty space behind.
    pub fn is_marker(self) -> bool {
        matches!(self, Tile::EnemySpawn | Tile::Flag | Tile::PlayerStart)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Empty
    }
}
