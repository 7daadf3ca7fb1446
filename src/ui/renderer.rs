/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each level tile is two terminal columns. The visible window starts at
/// the camera's first column; vertically the bottom of the level is kept
/// in view when the terminal is shorter than the level.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Facing;
use crate::domain::tile::Tile;
use crate::sim::world::{Phase, WorldState};
use super::hud::Hud;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for all "empty" terminal cells, so the gap
    /// between rows matches the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 92, g: 148, b: 252 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '\u{0}', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Fill a whole row, then write `s` at its start.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }

    /// Two-column glyph for one level tile.
    fn put_pair(&mut self, col: usize, row: usize, glyph: Glyph) {
        let (c0, c1, fg, bg) = glyph;
        self.set(col, row, Cell::new(c0, fg, bg));
        self.set(col + 1, row, Cell::new(c1, fg, bg));
    }
}

type Glyph = (char, char, Color, Color);

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const GROUND: Glyph = ('▓', '▓', Color::Rgb { r: 230, g: 150, b: 90 }, Color::Rgb { r: 150, g: 70, b: 20 });
const BRICK: Glyph = ('▤', '▤', Color::Rgb { r: 250, g: 190, b: 150 }, Color::Rgb { r: 180, g: 80, b: 30 });
const BIG_BLOCK: Glyph = ('█', '█', Color::Rgb { r: 120, g: 120, b: 120 }, Color::Rgb { r: 70, g: 70, b: 70 });
const QUESTION: Glyph = ('?', '?', Color::Rgb { r: 120, g: 40, b: 0 }, Color::Rgb { r: 250, g: 190, b: 40 });
const SPENT_BLOCK: Glyph = ('▒', '▒', Color::Rgb { r: 90, g: 60, b: 40 }, Color::Rgb { r: 140, g: 100, b: 70 });
const PIPE: Glyph = ('▐', '▌', Color::Rgb { r: 20, g: 120, b: 20 }, Color::Rgb { r: 60, g: 200, b: 60 });
const COIN: Glyph = ('(', ')', Color::Rgb { r: 255, g: 220, b: 40 }, Color::Reset);
const CASTLE: Glyph = ('▚', '▞', Color::Rgb { r: 200, g: 90, b: 40 }, Color::Rgb { r: 120, g: 50, b: 20 });
const HILL: Glyph = ('/', '\\', Color::Rgb { r: 0, g: 120, b: 0 }, Color::Reset);
const CLOUD: Glyph = ('~', '~', Color::White, Color::Reset);
const POLE: Glyph = ('│', ' ', Color::Rgb { r: 200, g: 255, b: 200 }, Color::Reset);
const FLAG: Glyph = ('│', '▶', Color::Rgb { r: 40, g: 200, b: 40 }, Color::Reset);
const ENEMY: Glyph = ('◖', '◗', Color::Rgb { r: 120, g: 50, b: 10 }, Color::Reset);
const ENEMY_DOWN: Glyph = ('_', '_', Color::Rgb { r: 90, g: 90, b: 90 }, Color::Reset);
const PLAYER_HURT: Glyph = ('x', 'x', Color::Rgb { r: 255, g: 60, b: 60 }, Color::Reset);

/// Poles drawn above the flag cell.
const POLE_HEIGHT: i32 = 4;

// ── Renderer ──

/// Terminal columns per level tile.
const CELL_W: usize = 2;

/// Vertical layout
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;
/// HUD + help bar
const RESERVED_ROWS: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    /// Ask the terminal for key Release events. True if granted.
    pub fn enable_key_release(&mut self) -> bool {
        if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            return false;
        }
        let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
        match execute!(self.writer, PushKeyboardEnhancementFlags(flags)) {
            Ok(()) => {
                self.key_release = true;
                true
            }
            Err(e) => {
                log::debug!("keyboard enhancement refused: {e}");
                false
            }
        }
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, hud: &Hud) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clear for a clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        self.compose(world, hud);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, w: &WorldState, hud: &Hud) {
        self.front.put_bar(HUD_ROW, &hud.line(), Color::White, HUD_BG);

        let view_w = self.front.width / CELL_W;
        let view_h = self.front.height.saturating_sub(RESERVED_ROWS).min(w.level.height);
        let first_col = w.camera.first_column(w.physics.tile_size, w.camera_cfg.scale);
        let first_row = w.level.height.saturating_sub(view_h) as i32;

        let view = View { first_col, first_row, cols: view_w, rows: view_h };

        for vy in 0..view.rows {
            for vx in 0..view.cols {
                let cell = (view.first_col + vx as i32, view.first_row + vy as i32);
                if let Some(glyph) = tile_glyph(w, cell) {
                    self.front.put_pair(vx * CELL_W, MAP_ROW + vy, glyph);
                }
            }
        }

        self.compose_flag(w, &view);
        self.compose_enemies(w, &view);
        self.compose_player(w, &view);

        match w.phase {
            Phase::Ready => self.compose_banner(&view, " PRESS ← → OR JUMP TO START ", Color::White),
            Phase::Won => self.compose_banner(&view, " ★ COURSE CLEAR! ★ ", Color::Rgb { r: 255, g: 220, b: 50 }),
            Phase::Lost => self.compose_banner(&view, " ✕ GAME OVER ✕ ", Color::Rgb { r: 255, g: 60, b: 60 }),
            Phase::Running => {}
        }

        let help_row = MAP_ROW + view.rows;
        if help_row < self.front.height {
            let help = " ←→/AD:Move  ↑/W/Space:Jump  X/Z/Shift:Run  M:Mute  R:Respawn  Q:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Black);
        }
    }

    fn compose_flag(&mut self, w: &WorldState, view: &View) {
        let Some((fc, fr)) = w.level.flag else { return };
        for dy in 1..=POLE_HEIGHT {
            let glyph = if dy == POLE_HEIGHT { FLAG } else { POLE };
            self.put_at(view, (fc, fr - dy), glyph);
        }
        self.put_at(view, (fc, fr), POLE);
    }

    fn compose_enemies(&mut self, w: &WorldState, view: &View) {
        let tile = w.physics.tile_size;
        for e in &w.enemies {
            let cell = pixel_cell(e.x + e.w / 2.0, e.y + e.h / 2.0, tile);
            self.put_at(view, cell, if e.alive { ENEMY } else { ENEMY_DOWN });
        }
    }

    fn compose_player(&mut self, w: &WorldState, view: &View) {
        let p = &w.player;
        let cell = p.center_cell(w.physics.tile_size);
        let glyph = if !p.alive {
            PLAYER_HURT
        } else {
            let fg = Color::Rgb { r: 230, g: 30, b: 30 };
            let bg = Color::Rgb { r: 110, g: 60, b: 20 };
            match p.facing {
                Facing::Right => ('█', '▶', fg, bg),
                Facing::Left => ('◀', '█', fg, bg),
            }
        };
        self.put_at(view, cell, glyph);
    }

    fn compose_banner(&mut self, view: &View, text: &str, fg: Color) {
        let len = text.chars().count();
        let x = (view.cols * CELL_W).saturating_sub(len) / 2;
        let y = MAP_ROW + view.rows / 3;
        self.front.put_str(x, y, text, fg, Color::Black);
    }

    /// Draw a glyph at a level cell if it is inside the view.
    fn put_at(&mut self, view: &View, cell: (i32, i32), glyph: Glyph) {
        if let Some((col, row)) = view.screen_pos(cell) {
            self.front.put_pair(col, row, glyph);
        }
    }
}

/// Visible window of the level, in tiles.
struct View {
    first_col: i32,
    first_row: i32,
    cols: usize,
    rows: usize,
}

impl View {
    fn screen_pos(&self, (c, r): (i32, i32)) -> Option<(usize, usize)> {
        let vx = c - self.first_col;
        let vy = r - self.first_row;
        if vx < 0 || vy < 0 || vx as usize >= self.cols || vy as usize >= self.rows {
            return None;
        }
        Some((vx as usize * CELL_W, MAP_ROW + vy as usize))
    }
}

fn pixel_cell(x: f32, y: f32, tile: f32) -> (i32, i32) {
    ((x / tile).floor() as i32, (y / tile).floor() as i32)
}

/// Glyph for the static part of a cell. None = sky.
fn tile_glyph(w: &WorldState, cell: (i32, i32)) -> Option<Glyph> {
    let glyph = match w.level.tile_at(cell.0, cell.1) {
        Tile::Ground => GROUND,
        Tile::Brick => BRICK,
        Tile::BigBlock => BIG_BLOCK,
        Tile::Pipe => PIPE,
        Tile::Question if w.level.block_spent(cell) => SPENT_BLOCK,
        Tile::Question => QUESTION,
        Tile::Coin if w.level.coin_present(cell) => COIN,
        Tile::Castle => CASTLE,
        Tile::Hill => HILL,
        Tile::Cloud => CLOUD,
        Tile::Coin | Tile::Empty | Tile::EnemySpawn | Tile::Flag | Tile::PlayerStart => return None,
    };
    Some(glyph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::level::build;

    fn world(rows: &[&str]) -> WorldState {
        let mut w = WorldState::new(build(rows), &GameConfig::default());
        w.phase = Phase::Running;
        w.camera.x = 0.0;
        w
    }

    fn composed(w: &WorldState) -> Renderer {
        let mut r = Renderer::new();
        r.front.resize(40, 8);
        r.compose(w, &Hud::new());
        r
    }

    fn pair_at(r: &Renderer, col: usize, row: usize) -> (char, char) {
        (r.front.get(col * CELL_W, MAP_ROW + row).ch, r.front.get(col * CELL_W + 1, MAP_ROW + row).ch)
    }

    #[test]
    fn tiles_and_collected_coins() {
        let mut w = world(&["o?-S", "===="]);
        let r = composed(&w);
        assert_eq!(pair_at(&r, 0, 0), ('(', ')'));
        assert_eq!(pair_at(&r, 1, 0), ('?', '?'));
        assert_eq!(pair_at(&r, 0, 1), ('▓', '▓'));

        w.level.collect_coin((0, 0));
        w.level.strike((1, 0));
        let r = composed(&w);
        assert_eq!(pair_at(&r, 0, 0), (' ', ' '));
        assert_eq!(pair_at(&r, 1, 0), ('▒', '▒'));
    }

    #[test]
    fn defeated_enemy_drawn_differently() {
        let mut w = world(&["S-----", "---g--", "======"]);
        let r = composed(&w);
        let alive = pair_at(&r, 3, 0);
        w.enemies[0].alive = false;
        let r = composed(&w);
        let down = pair_at(&r, 3, 0);
        assert_eq!(alive, (ENEMY.0, ENEMY.1));
        assert_eq!(down, (ENEMY_DOWN.0, ENEMY_DOWN.1));
    }

    #[test]
    fn hud_line_on_top_row() {
        let w = world(&["----", "===="]);
        let mut hud = Hud::new();
        hud.world = "1-1".into();
        let mut r = Renderer::new();
        r.front.resize(60, 8);
        r.compose(&w, &hud);
        let top: String = (0..10).map(|x| r.front.get(x, HUD_ROW).ch).collect();
        assert_eq!(top, " WORLD 1-1");
    }

    #[test]
    fn view_clips_outside_cells() {
        let view = View { first_col: 5, first_row: 0, cols: 10, rows: 4 };
        assert_eq!(view.screen_pos((5, 0)), Some((0, MAP_ROW)));
        assert_eq!(view.screen_pos((4, 0)), None);
        assert_eq!(view.screen_pos((15, 0)), None);
        assert_eq!(view.screen_pos((6, 4)), None);
    }
}
