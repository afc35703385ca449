/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Characters are drawn from their lifecycle state; the renderer never
/// feeds anything back into the game.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::character::CharacterState;
use crate::domain::hole::Position;
use crate::sim::game::{EndReason, Game, Phase};
use crate::sim::marks::Outcome;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell, so the terminal default
    /// never shows through between rows.
    const BASE_BG: Color = Color::Rgb { r: 20, g: 30, b: 18 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell { ch, fg, bg });
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, Cell::BASE_BG);
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Layout and palette ──

const HUD_ROW: usize = 0;
const LIFE_ROW: usize = 2;
const LIFE_BAR_WIDTH: usize = 30;

const SOIL: Color = Color::Rgb { r: 110, g: 72, b: 40 };
const MOLE: Color = Color::Rgb { r: 170, g: 130, b: 100 };
const HIT: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const FADED: Color = Color::Rgb { r: 100, g: 100, b: 90 };
const LABEL: Color = Color::Rgb { r: 150, g: 170, b: 140 };
const CURSOR_BG: Color = Color::Rgb { r: 60, g: 90, b: 50 };
const MISSED: Color = Color::Rgb { r: 220, g: 70, b: 60 };

/// Three sprite rows, drawn with the bottom row on the hole center.
fn sprite(state: Option<CharacterState>) -> ([&'static str; 3], Color) {
    match state {
        Some(CharacterState::Raising) => (["       ", "  ,^,  ", " (___) "], MOLE),
        Some(CharacterState::Alive) => (["  ,^,  ", " (o.o) ", " (___) "], MOLE),
        Some(CharacterState::Hit) => (["  \\*/  ", " (x.x) ", " (___) "], HIT),
        Some(CharacterState::Missing) => (["       ", "  ,-,  ", " (___) "], FADED),
        _ => (["       ", "       ", " (___) "], SOIL),
    }
}

/// Key that whacks the hole at `row`, `col` (numpad layout, top row 7 8 9).
fn key_label(row: usize, col: usize) -> char {
    let digit = (2 - row.min(2)) * 3 + col + 1;
    char::from_digit(digit as u32, 10).unwrap_or('?')
}

/// Filled cells of a `width` wide bar with `crop` cut off the right.
fn life_cells(width: usize, crop: f32) -> usize {
    let filled = ((1.0 - crop.clamp(0.0, 1.0)) * width as f32).round() as usize;
    filled.min(width)
}

fn life_color(level: f32) -> Color {
    if level > 0.6 {
        Color::Rgb { r: 90, g: 200, b: 90 }
    } else if level > 0.3 {
        Color::Rgb { r: 230, g: 190, b: 60 }
    } else {
        Color::Rgb { r: 220, g: 70, b: 60 }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    /// Keyboard enhancement pushed by `init`; popped by `cleanup`.
    key_releases: bool,
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
            key_releases: false,
        }
    }

    /// True once `init` has turned on key Release reporting.
    pub fn reports_key_releases(&self) -> bool {
        self.key_releases
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

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.key_releases = true;
        }
        log::info!("key release reporting: {}", self.key_releases);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_releases {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.key_releases = false;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Draw one frame. `cursor` is the gamepad-selected hole, if any.
    pub fn render(&mut self, game: &Game, cursor: Option<usize>) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(game.phase()) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(game.phase());
        }

        self.front.clear();
        match game.phase() {
            Phase::Title => compose_title(&mut self.front),
            Phase::Playing => compose_game(&mut self.front, game, cursor),
            Phase::GameOver => compose_game_over(&mut self.front, game),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
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
}

// ── Compose: build front buffer content ──

fn compose_title(buf: &mut FrameBuffer) {
    let mid = buf.height / 2;
    buf.put_centered(mid.saturating_sub(4), "M O L E   G A R D E N", HIT);
    buf.put_centered(mid.saturating_sub(2), ",^,", MOLE);
    buf.put_centered(mid.saturating_sub(1), "(o.o)", MOLE);
    buf.put_centered(mid, "(___)", SOIL);
    buf.put_centered(mid + 2, "Keys 1-9 whack holes (numpad layout)", LABEL);
    buf.put_centered(mid + 3, "Gamepad: D-pad moves, face buttons whack", LABEL);
    buf.put_centered(mid + 5, "[Enter/Start] Play    [Esc] Quit", Color::White);
}

fn compose_game(buf: &mut FrameBuffer, game: &Game, cursor: Option<usize>) {
    compose_hud(buf, game);
    compose_life_bar(buf, game.life_bar().crop(), game.life_bar().current());

    let garden = game.garden();
    let cols = garden.cols().max(1);
    for hole in garden.holes() {
        let label = HoleLabel {
            key: key_label(hole.id() / cols, hole.id() % cols),
            mark: game.marks().get(hole.id()),
            selected: cursor == Some(hole.id()),
        };
        compose_hole(buf, hole.center(), label);
    }
    for character in garden.characters() {
        let Some(at) = character.position() else { continue };
        let index = at.y as usize * cols + at.x as usize;
        if let Some(hole) = garden.holes().get(index) {
            compose_sprite(buf, hole.center(), Some(character.state()));
        }
    }
}

fn compose_hud(buf: &mut FrameBuffer, game: &Game) {
    let board = game.board();
    let secs = game.remaining_ms() / 1000.0;
    let time_fg = if secs < 10.0 { MISSED } else { Color::White };

    buf.put_str(1, HUD_ROW, "MOLE GARDEN", HIT, Cell::BASE_BG);
    let score = format!("Score {:>5}   Streak {:>2}", board.points, board.streak);
    buf.put_str(15, HUD_ROW, &score, Color::White, Cell::BASE_BG);
    let time = format!("Time {:>5.1}s", secs);
    buf.put_str(15 + score.len() + 3, HUD_ROW, &time, time_fg, Cell::BASE_BG);
}

fn compose_life_bar(buf: &mut FrameBuffer, crop: f32, level: f32) {
    let filled = life_cells(LIFE_BAR_WIDTH, crop);
    buf.put_str(1, LIFE_ROW, "LIFE [", LABEL, Cell::BASE_BG);
    for i in 0..LIFE_BAR_WIDTH {
        let (ch, fg) = if i < filled { ('#', life_color(level)) } else { ('.', FADED) };
        buf.set(7 + i, LIFE_ROW, Cell { ch, fg, bg: Cell::BASE_BG });
    }
    buf.put_str(7 + LIFE_BAR_WIDTH, LIFE_ROW, "]", LABEL, Cell::BASE_BG);
}

/// The `[n]` tag under a hole.
struct HoleLabel {
    key: char,
    mark: Option<Outcome>,
    selected: bool,
}

fn compose_hole(buf: &mut FrameBuffer, center: Position, label: HoleLabel) {
    compose_sprite(buf, center, None);
    let fg = match label.mark {
        Some(Outcome::Hit) => HIT,
        Some(Outcome::Miss) => MISSED,
        None => LABEL,
    };
    let bg = if label.selected { CURSOR_BG } else { Cell::BASE_BG };
    let x = (center.x as usize).saturating_sub(1);
    buf.put_str(x, center.y as usize + 1, &format!("[{}]", label.key), fg, bg);
}

fn compose_sprite(buf: &mut FrameBuffer, center: Position, state: Option<CharacterState>) {
    let (rows, fg) = sprite(state);
    let x = (center.x as usize).saturating_sub(3);
    let y = center.y as usize;
    for (i, row) in rows.iter().enumerate() {
        let row_fg = if i == 2 { SOIL } else { fg };
        buf.put_str(x, (y + i).saturating_sub(2), row, row_fg, Cell::BASE_BG);
    }
}

fn compose_game_over(buf: &mut FrameBuffer, game: &Game) {
    let board = game.board();
    let mid = buf.height / 2;
    let headline = match game.end_reason() {
        Some(EndReason::TimeUp) => "TIME UP",
        _ => "THE MOLES WIN",
    };
    buf.put_centered(mid.saturating_sub(3), headline, HIT);
    buf.put_centered(mid.saturating_sub(1), &format!("Score {}", board.points), Color::White);
    buf.put_centered(
        mid,
        &format!("Hits {}   Misses {}   Best streak {}", board.hits, board.misses, board.best_streak),
        LABEL,
    );
    buf.put_centered(mid + 2, "[Enter/Start] Play again    [Esc] Quit", Color::White);
}
