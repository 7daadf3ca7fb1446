/// Level model: tile grid → typed feature sets.
///
/// ## Text format
///   ```
///   ; world: 1-1
///   ; any other `;` line is a comment
///   <map rows, top to bottom>
///   ```
///
/// ## Tile legend
///   '=' ground        '#' brick          'B' big block
///   '?' question box  'o' coin           'P' pipe
///   'g' enemy spawn   'F' flag           'S' player start
///   'C' castle        '^' hill           'c' cloud
///   '-' empty
///
/// Unknown characters are empty space. Ragged rows are padded with
/// empty cells to the widest row.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;

use crate::domain::physics::{Cell, SolidView};
use crate::domain::tile::Tile;

pub const DEFAULT_WORLD: &str = "1-1";

/// Raw level data (owned strings, loaded from file or embedded).
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub world: String,
    pub rows: Vec<String>,
}

/// Outcome of striking a cell from below.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockStrike {
    /// Fresh question block: pays out, now spent.
    Reward,
    /// Spent question block or plain solid.
    Bump,
    /// Nothing there.
    Nothing,
}

/// Parsed level. The grid and derived sets are static after `build`;
/// only the coin and question-block flags change, each at most once.
#[derive(Clone, Debug)]
pub struct LevelState {
    pub world: String,
    pub width: usize,
    pub height: usize,
    tiles: Vec<Vec<Tile>>,
    pub solids: HashSet<Cell>,
    pub pipes: HashSet<Cell>,
    /// cell → collected
    pub coins: HashMap<Cell, bool>,
    /// cell → hit
    pub question_blocks: HashMap<Cell, bool>,
    pub enemy_spawns: Vec<Cell>,
    pub flag: Option<Cell>,
    pub player_start: Option<Cell>,
    pub decorations: Vec<(Cell, Tile)>,
}

// ══════════════════════════════════════════════════════════════
// Building
// ══════════════════════════════════════════════════════════════

/// Single pass over every cell. Never fails.
pub fn build<S: AsRef<str>>(rows: &[S]) -> LevelState {
    let height = rows.len();
    let width = rows.iter().map(|r| r.as_ref().chars().count()).max().unwrap_or(0);

    let mut level = LevelState {
        world: DEFAULT_WORLD.to_string(),
        width,
        height,
        tiles: vec![vec![Tile::Empty; width]; height],
        solids: HashSet::new(),
        pipes: HashSet::new(),
        coins: HashMap::new(),
        question_blocks: HashMap::new(),
        enemy_spawns: vec![],
        flag: None,
        player_start: None,
        decorations: vec![],
    };

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.as_ref().chars().enumerate() {
            let tile = Tile::from_char(ch);
            let cell = (x as i32, y as i32);
            level.tiles[y][x] = tile;

            if tile.is_solid() { level.solids.insert(cell); }
            if tile.is_decoration() { level.decorations.push((cell, tile)); }
            match tile {
                Tile::Pipe => { level.pipes.insert(cell); }
                Tile::Coin => { level.coins.insert(cell, false); }
                Tile::Question => { level.question_blocks.insert(cell, false); }
                Tile::EnemySpawn => level.enemy_spawns.push(cell),
                // Last marker wins, matching a top-to-bottom scan.
                Tile::Flag => level.flag = Some(cell),
                Tile::PlayerStart => level.player_start = Some(cell),
                _ => {}
            }
        }
    }

    level
}

pub fn build_def(def: &LevelDef) -> LevelState {
    let mut level = build(&def.rows);
    level.world = def.world.clone();
    level
}

// ══════════════════════════════════════════════════════════════
// Queries & the two mutable overlays
// ══════════════════════════════════════════════════════════════

impl LevelState {
    /// Base tile at (col, row). Out of range = empty.
    pub fn tile_at(&self, col: i32, row: i32) -> Tile {
        if col < 0 || row < 0 { return Tile::Empty; }
        self.tiles
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .copied()
            .unwrap_or(Tile::Empty)
    }

    pub fn solid_view(&self, tile_size: f32) -> SolidView<'_> {
        SolidView::new(&self.solids, tile_size)
    }

    pub fn height_px(&self, tile_size: f32) -> f32 {
        self.height as f32 * tile_size
    }

    /// Is there an uncollected coin in this cell?
    pub fn coin_present(&self, cell: Cell) -> bool {
        matches!(self.coins.get(&cell), Some(false))
    }

    /// Collect the coin at `cell`. True only on the first collection.
    pub fn collect_coin(&mut self, cell: Cell) -> bool {
        match self.coins.get_mut(&cell) {
            Some(collected) if !*collected => {
                *collected = true;
                true
            }
            _ => false,
        }
    }

    pub fn block_spent(&self, cell: Cell) -> bool {
        matches!(self.question_blocks.get(&cell), Some(true))
    }

    /// Resolve a hit from below on `cell`. A question block pays out once,
    /// then only bumps; other solids bump; open space does nothing.
    pub fn strike(&mut self, cell: Cell) -> BlockStrike {
        if let Some(hit) = self.question_blocks.get_mut(&cell) {
            if !*hit {
                *hit = true;
                return BlockStrike::Reward;
            }
            return BlockStrike::Bump;
        }
        if self.solids.contains(&cell) {
            BlockStrike::Bump
        } else {
            BlockStrike::Nothing
        }
    }

    pub fn coins_remaining(&self) -> usize {
        self.coins.values().filter(|c| !**c).count()
    }
}

// ══════════════════════════════════════════════════════════════
// Text parsing & loading
// ══════════════════════════════════════════════════════════════

/// Parse a level from text. None if it has no map rows.
pub fn parse_level_text(content: &str) -> Option<LevelDef> {
    let mut world = String::new();
    let mut rows: Vec<String> = vec![];

    for line in content.lines() {
        if let Some(meta) = line.strip_prefix(';') {
            if let Some(value) = meta.trim().strip_prefix("world:") {
                world = value.trim().to_string();
            }
            continue;
        }
        rows.push(line.trim_end_matches('\r').to_string());
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return None;
    }
    if world.is_empty() {
        world = DEFAULT_WORLD.to_string();
    }

    Some(LevelDef { world, rows })
}

/// Read and parse a level file.
pub fn load_level_file(path: &Path) -> io::Result<LevelDef> {
    let content = std::fs::read_to_string(path)?;
    parse_level_text(&content).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} contains no map rows", path.display()),
        )
    })
}

/// Level from the configured file, or the built-in course on any failure.
pub fn load_or_embedded(path: Option<&Path>) -> LevelDef {
    if let Some(path) = path {
        match load_level_file(path) {
            Ok(def) => {
                log::info!("loaded level {} from {}", def.world, path.display());
                return def;
            }
            Err(e) => log::warn!("level file unusable ({e}); using built-in course"),
        }
    }
    embedded_course()
}

// ══════════════════════════════════════════════════════════════
// Embedded course
// ══════════════════════════════════════════════════════════════

pub fn embedded_course() -> LevelDef {
    LevelDef {
        world: DEFAULT_WORLD.to_string(),
        rows: COURSE_1_1.iter().map(|s| s.to_string()).collect(),
    }
}

const COURSE_1_1: &[&str] = &[
    "----------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------",
    "----------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------------",
    "----------------------c----------------------------------------------------c---------------------------------------------------------------------------------------------c--------------------------------------",
    "-----------------------------------------c--------------------------c---------------------------------------------------------------------------------------------------------c----------------------------------",
    "---------------------   -----------------------------------------------     ------------------------------------------------------------------------------------------------------    ----------------------------",
    "--------------------     --------------------------------------------       ------------------------------#--------------------------#------------      --------------------",
    "-------------------       ------------------------------#---#--------------  ----------------------------###------------------------###-----------        -------------------",
    "------------------   c    -----------------------------###-###-------------   --------------------------#####----------------------#####----------   c    ------------------",
    "----------------------------o-------------------------#####-#####-----------------o--------------------#######--------------------#######----------------------o-------------",
    "----------------------?-------------------------------#####-#####----------------?---------------------#######--------------------#######-------------------?---------------",
    "---------------------###-----------------------------B#####-#####B------------------------------------#######--------------------#######-----------------------------------",
    "--------------------#####----------------------------B#####-#####B--------------------------------------------------------------------------P-------------------------------",
    "-------------------#####-----------------------------B#####-#####B--------------------------------------------------------------------------P-------------------------------",
    "------------------#####----------------------------------------------g--------------------g------------------------------g-------------PP-----------------------------------",
    "-----------------#####----------------------g-------------------------------------g-----------------------------g---------------------PP-----------------------------------",
    "----------------#####-----------P------------------------------?-----------------------------?------------------------------?----------PP-----------------------------------",
    "---------------#####-----------PP-----------------------------###---------------------------###----------------------------###---------PP---------------------F-------------",
    "==============#####===========PPP============================#####=========================#####==========================#####========PP===========CCCCCCCCCCCCCCCCCC=====",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_classes_share_one_set() {
        let level = build(&["=#B?P-oC"]);
        for x in 0..5 {
            assert!(level.solids.contains(&(x, 0)), "column {x}");
        }
        for x in 5..8 {
            assert!(!level.solids.contains(&(x, 0)), "column {x}");
        }
        assert!(level.pipes.contains(&(4, 0)));
    }

    #[test]
    fn features_are_collected() {
        let level = build(&[
            "c   F",
            " o?g ",
            "=S===",
        ]);
        assert_eq!(level.coins.get(&(1, 1)), Some(&false));
        assert_eq!(level.question_blocks.get(&(2, 1)), Some(&false));
        assert_eq!(level.enemy_spawns, vec![(3, 1)]);
        assert_eq!(level.flag, Some((4, 0)));
        assert_eq!(level.player_start, Some((1, 2)));
        assert_eq!(level.decorations, vec![((0, 0), Tile::Cloud)]);
        // The start marker leaves a hole in the floor: it is not solid.
        assert!(!level.solids.contains(&(1, 2)));
    }

    #[test]
    fn ragged_rows_and_unknown_chars_degrade() {
        let level = build(&["==", "=xyz=", ""]);
        assert_eq!(level.width, 5);
        assert_eq!(level.height, 3);
        assert_eq!(level.tile_at(2, 0), Tile::Empty);
        assert_eq!(level.tile_at(1, 1), Tile::Empty);
        assert_eq!(level.tile_at(4, 1), Tile::Ground);
        assert_eq!(level.tile_at(-1, 0), Tile::Empty);
        assert_eq!(level.tile_at(99, 99), Tile::Empty);
    }

    #[test]
    fn coin_collects_exactly_once() {
        let mut level = build(&["o-"]);
        assert!(level.coin_present((0, 0)));
        assert!(level.collect_coin((0, 0)));
        assert!(!level.collect_coin((0, 0)));
        assert!(!level.coin_present((0, 0)));
        assert!(!level.collect_coin((1, 0)));
        assert_eq!(level.coins_remaining(), 0);
    }

    #[test]
    fn question_block_rewards_once_then_bumps() {
        let mut level = build(&["?#-"]);
        assert_eq!(level.strike((0, 0)), BlockStrike::Reward);
        assert!(level.block_spent((0, 0)));
        for _ in 0..3 {
            assert_eq!(level.strike((0, 0)), BlockStrike::Bump);
        }
        assert_eq!(level.strike((1, 0)), BlockStrike::Bump);
        assert_eq!(level.strike((2, 0)), BlockStrike::Nothing);
    }

    #[test]
    fn parse_text_with_metadata() {
        let def = parse_level_text("; world: 2-3\n; a comment\n--o--\n=====\n\n\n").unwrap();
        assert_eq!(def.world, "2-3");
        assert_eq!(def.rows, vec!["--o--".to_string(), "=====".to_string()]);
        let level = build_def(&def);
        assert_eq!(level.world, "2-3");
    }

    #[test]
    fn parse_text_without_rows_is_none() {
        assert!(parse_level_text("; world: 9-9\n\n").is_none());
    }

    #[test]
    fn missing_file_falls_back_to_embedded() {
        let def = load_or_embedded(Some(Path::new("/nonexistent/course.txt")));
        assert_eq!(def.world, DEFAULT_WORLD);
        assert_eq!(def.rows.len(), COURSE_1_1.len());
    }

    #[test]
    fn embedded_course_is_playable() {
        let level = build_def(&embedded_course());
        assert_eq!(level.height, 18);
        assert!(level.flag.is_some());
        assert!(!level.enemy_spawns.is_empty());
        assert!(!level.coins.is_empty());
        assert!(!level.question_blocks.is_empty());
        // Ground under the default start column.
        assert!(level.solids.contains(&(3, 17)));
    }
}
