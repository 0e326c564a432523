//! Drawing the run into a half-block pixel buffer.
//!
//! Each terminal cell holds two vertical pixels (`▀` with separate fore- and
//! background colours), so the buffer is `cols` x `rows * 2` pixels. World
//! coordinates are scaled to fit that grid.

use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};

use crate::palette::{DEFEAT, PANEL, Palette, Rgb};
use crate::physics::Rect;
use crate::run::{ObstacleKind, Run};

// ── Pixel buffer ────────────────────────────────────────────────────────────

pub struct PixelBuf {
    w: usize,
    h: usize,
    px: Vec<Rgb>,
}

fn term_color(c: Rgb) -> CColor {
    CColor::Rgb {
        r: c.0,
        g: c.1,
        b: c.2,
    }
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![Rgb(0, 0, 0); w * h],
        }
    }

    /// Buffer for a terminal of `cols` x `rows` cells.
    pub fn for_terminal(cols: u16, rows: u16) -> Self {
        Self::new(cols as usize, rows as usize * 2)
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, Rgb(0, 0, 0));
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    pub fn fill(&mut self, c: Rgb) {
        self.px.fill(c);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    pub fn map(&mut self, f: impl Fn(Rgb) -> Rgb) {
        for c in &mut self.px {
            *c = f(*c);
        }
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        // None forces the next colour to be emitted.
        let mut fg: Option<Rgb> = None;
        let mut bg: Option<Rgb> = None;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if bg != Some(bot) {
                    queue!(out, style::SetBackgroundColor(term_color(bot)))?;
                    bg = Some(bot);
                }
                if top == bot {
                    queue!(out, style::Print(' '))?;
                    continue;
                }
                if fg != Some(top) {
                    queue!(out, style::SetForegroundColor(term_color(top)))?;
                    fg = Some(top);
                }
                queue!(out, style::Print('\u{2580}'))?; // ▀
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                fg = None;
                bg = None;
            }
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

/// A rectangle in buffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    /// Whether a terminal cell covers any pixel of this rectangle.
    pub fn contains_cell(&self, col: u16, row: u16) -> bool {
        let x = col as i32;
        let y = row as i32 * 2;
        self.contains(x, y) || self.contains(x, y + 1)
    }
}

// ── 3x5 bitmap font ─────────────────────────────────────────────────────────

#[rustfmt::skip]
fn glyph(ch: char) -> [u8; 15] {
    match ch {
        '0' => [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1],
        '1' => [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1],
        '2' => [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1],
        '3' => [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1],
        '4' => [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1],
        '5' => [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1],
        '6' => [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1],
        '7' => [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0],
        '8' => [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1],
        '9' => [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1],
        'A' => [0,1,0, 1,0,1, 1,1,1, 1,0,1, 1,0,1],
        'C' => [0,1,1, 1,0,0, 1,0,0, 1,0,0, 0,1,1],
        'E' => [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,1,1],
        'G' => [0,1,1, 1,0,0, 1,0,1, 1,0,1, 0,1,1],
        'H' => [1,0,1, 1,0,1, 1,1,1, 1,0,1, 1,0,1],
        'I' => [1,1,1, 0,1,0, 0,1,0, 0,1,0, 1,1,1],
        'K' => [1,0,1, 1,0,1, 1,1,0, 1,0,1, 1,0,1],
        'L' => [1,0,0, 1,0,0, 1,0,0, 1,0,0, 1,1,1],
        'M' => [1,0,1, 1,1,1, 1,1,1, 1,0,1, 1,0,1],
        'N' => [1,1,0, 1,0,1, 1,0,1, 1,0,1, 1,0,1],
        'O' => [0,1,0, 1,0,1, 1,0,1, 1,0,1, 0,1,0],
        'P' => [1,1,0, 1,0,1, 1,1,0, 1,0,0, 1,0,0],
        'R' => [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,0,1],
        'S' => [0,1,1, 1,0,0, 0,1,0, 0,0,1, 1,1,0],
        'T' => [1,1,1, 0,1,0, 0,1,0, 0,1,0, 0,1,0],
        'V' => [1,0,1, 1,0,1, 1,0,1, 1,0,1, 0,1,0],
        'Y' => [1,0,1, 1,0,1, 0,1,0, 0,1,0, 0,1,0],
        ':' => [0,0,0, 0,1,0, 0,0,0, 0,1,0, 0,0,0],
        _ => [0; 15],
    }
}

/// Width in pixels of `text` drawn with [`draw_text`].
pub fn text_width(text: &str) -> i32 {
    (text.chars().count() as i32 * 4 - 1).max(0)
}

pub fn draw_text(buf: &mut PixelBuf, x: i32, y: i32, text: &str, fg: Rgb) {
    for (i, ch) in text.chars().enumerate() {
        let g = glyph(ch.to_ascii_uppercase());
        let gx = x + i as i32 * 4;
        for row in 0..5 {
            for col in 0..3 {
                if g[row * 3 + col] == 1 {
                    buf.set(gx + col as i32, y + row as i32, fg);
                }
            }
        }
    }
}

// ── Sprites ─────────────────────────────────────────────────────────────────

// '#' ink, 'o' eye, anything else transparent.
const PLAYER_TOP: [&str; 10] = [
    ".....#####",
    ".....#o###",
    ".....#####",
    ".....###..",
    "#...######",
    "##.#####..",
    "#######...",
    ".######...",
    "..#####...",
    "...###....",
];
const PLAYER_LEGS: [[&str; 2]; 2] = [
    ["...#.##...", "...#......"],
    ["...##.#...", "......#..."],
];

const CACTUS_SINGLE: [&str; 8] = [
    "..#..",
    ".###.",
    "#.#.#",
    "#.#.#",
    "#####",
    "..#..",
    "..#..",
    "..#..",
];
const CACTUS_MULTI: [&str; 8] = [
    "..#.......",
    ".###...#..",
    "#.#.#.###.",
    "#.#.##.#.#",
    "########.#",
    "..#...####",
    "..#....#..",
    "..#....#..",
];

const CLOUD: [&str; 3] = ["...####...", ".########.", "##########"];

/// Nearest-neighbour stretch of a character mask into `dst`.
fn blit(buf: &mut PixelBuf, dst: PixelRect, mask: &[&str], ink: Rgb, eye: Rgb) {
    let mh = mask.len() as i32;
    let mw = mask.first().map_or(0, |row| row.len()) as i32;
    if mw == 0 || dst.w <= 0 || dst.h <= 0 {
        return;
    }
    for dy in 0..dst.h {
        let row = mask[(dy * mh / dst.h) as usize].as_bytes();
        for dx in 0..dst.w {
            let c = match row[(dx * mw / dst.w) as usize] {
                b'#' => ink,
                b'o' => eye,
                _ => continue,
            };
            buf.set(dst.x + dx, dst.y + dy, c);
        }
    }
}

// ── Scene ───────────────────────────────────────────────────────────────────

/// World-to-pixel transform.
#[derive(Debug, Clone, Copy)]
pub struct View {
    sx: f32,
    sy: f32,
}

impl View {
    pub fn new(buf: &PixelBuf, run: &Run) -> Self {
        let tuning = run.tuning();
        Self {
            sx: buf.width() as f32 / tuning.viewport_width,
            sy: buf.height() as f32 / tuning.viewport_height,
        }
    }

    pub fn x(&self, x: f32) -> i32 {
        (x * self.sx).round() as i32
    }

    pub fn y(&self, y: f32) -> i32 {
        (y * self.sy).round() as i32
    }

    /// Never collapses a visible rectangle to nothing.
    pub fn rect(&self, r: &Rect) -> PixelRect {
        let x = self.x(r.x);
        let y = self.y(r.y);
        PixelRect {
            x,
            y,
            w: (self.x(r.right()) - x).max(1),
            h: (self.y(r.bottom()) - y).max(1),
        }
    }
}

pub fn draw(run: &Run, buf: &mut PixelBuf) {
    let view = View::new(buf, run);
    let palette = run.fade().palette();

    buf.fill(palette.sky);
    draw_clouds(run, buf, &view, palette);
    draw_ground(run, buf, &view, palette);
    draw_obstacles(run, buf, &view, palette);
    draw_player(run, buf, &view, palette);
    draw_hud(run, buf, palette);

    let brightness = run.fade().brightness();
    if brightness < 1.0 {
        buf.map(|c| c.dim(brightness));
    }

    if run.prompt_visible() {
        draw_game_over(run, buf);
    }
}

fn draw_clouds(run: &Run, buf: &mut PixelBuf, view: &View, palette: &Palette) {
    for cloud in run.clouds() {
        blit(buf, view.rect(&cloud.rect()), &CLOUD, palette.cloud, palette.cloud);
    }
}

fn draw_ground(run: &Run, buf: &mut PixelBuf, view: &View, palette: &Palette) {
    let gy = view.y(run.tuning().ground_y()).min(buf.height() as i32 - 1);
    let w = buf.width() as i32;
    let scroll = view.x(run.distance());
    for x in 0..w {
        buf.set(x, gy, palette.ground);
        // Sparse pebbles that scroll with the obstacles.
        let world = x + scroll;
        if world.rem_euclid(13) == 0 {
            buf.set(x, gy + 1, palette.ground_speck);
        }
        if world.rem_euclid(29) == 7 {
            buf.set(x, gy + 2, palette.ground_speck);
        }
    }
}

fn draw_obstacles(run: &Run, buf: &mut PixelBuf, view: &View, palette: &Palette) {
    for obstacle in run.obstacles() {
        let mask: &[&str] = match obstacle.kind {
            ObstacleKind::Single => &CACTUS_SINGLE,
            ObstacleKind::Multi => &CACTUS_MULTI,
        };
        blit(
            buf,
            view.rect(&obstacle.rect()),
            mask,
            palette.cactus,
            palette.cactus,
        );
    }
}

fn draw_player(run: &Run, buf: &mut PixelBuf, view: &View, palette: &Palette) {
    let player = run.player();
    let ink = if player.tinted { DEFEAT } else { palette.ink };
    let legs = &PLAYER_LEGS[player.frame as usize % 2];
    let mask: Vec<&str> = PLAYER_TOP.iter().chain(legs.iter()).copied().collect();
    blit(buf, view.rect(&player.sprite()), &mask, ink, palette.ink_light);
}

fn draw_hud(run: &Run, buf: &mut PixelBuf, palette: &Palette) {
    draw_text(buf, 2, 2, &format!("Score: {}", run.display_score()), palette.text);
    let hi = format!("HI {:05}", run.high_score());
    let x = buf.width() as i32 - text_width(&hi) - 2;
    draw_text(buf, x, 2, &hi, palette.text);
}

const GAME_OVER: &str = "GAME OVER";
const PROMPT: &str = "CLICK TO PLAY AGAIN";

/// Clickable area of the restart prompt, in buffer pixels.
pub fn prompt_rect(pw: usize, ph: usize) -> PixelRect {
    let w = text_width(PROMPT) + 6;
    let h = 26;
    PixelRect {
        x: pw as i32 / 2 - w / 2,
        y: ph as i32 / 2 - h / 2,
        w,
        h,
    }
}

/// Restarts the run if a left click at terminal cell `(col, row)` lands on
/// the visible prompt. Returns whether it did.
pub fn click(run: &mut Run, buf: &PixelBuf, col: u16, row: u16) -> bool {
    let prompt = prompt_rect(buf.width(), buf.height());
    let hit = run.prompt_visible() && prompt.contains_cell(col, row);
    if hit {
        run.restart();
    }
    hit
}

fn draw_game_over(run: &Run, buf: &mut PixelBuf) {
    buf.map(|c| Rgb(c.0 / 2, c.1 / 2, c.2 / 2));

    let panel = prompt_rect(buf.width(), buf.height());
    buf.fill_rect(panel.x - 1, panel.y - 1, panel.w + 2, panel.h + 2, DEFEAT);
    buf.fill_rect(panel.x, panel.y, panel.w, panel.h, PANEL);

    let cx = panel.x + panel.w / 2;
    draw_text(
        buf,
        cx - text_width(GAME_OVER) / 2,
        panel.y + 3,
        GAME_OVER,
        DEFEAT,
    );
    let score = run.display_score().to_string();
    draw_text(
        buf,
        cx - text_width(&score) / 2,
        panel.y + 10,
        &score,
        Rgb(255, 255, 255),
    );
    draw_text(
        buf,
        cx - text_width(PROMPT) / 2,
        panel.y + 18,
        PROMPT,
        Rgb(255, 255, 255),
    );
}
