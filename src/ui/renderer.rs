/// Presentation layer: software rasterizer on a double-buffered,
/// diff-based terminal renderer.
///
/// How it works:
///   1. `render()` calls rasterize meshes into `raster` (color + depth)
///   2. `present()` packs two raster rows into one terminal row using
///      the upper-half block: fg = top pixel, bg = bottom pixel
///   3. HUD, message bar and help bar are composed around the view
///   4. Each cell is compared with the `back` buffer (previous frame)
///      and only changed cells are emitted, batched with `queue!`
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use glam::{Mat4, Vec3, Vec4};

use crate::error::Result;
use crate::gfx::{FillMode, MeshData, MeshHandle, RenderBackend};
use crate::sim::world::WorldState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell's
    /// background keeps the inter-row gap pixels of VTE terminals from
    /// showing as horizontal lines.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
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
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            self.set(cx, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Paint a whole row with a background, then write `s` on it.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ══════════════════════════════════════════════════════════════
// Raster: color + depth, two pixels per terminal cell vertically
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug)]
struct ClipVertex {
    pos: Vec4,
    color: Vec3,
}

#[derive(Clone, Copy, Debug)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    color: Vec3,
}

pub struct Raster {
    width: usize,
    height: usize,
    color: Vec<Option<Vec3>>,
    depth: Vec<f32>,
}

impl Raster {
    pub fn new(width: usize, height: usize) -> Self {
        Raster {
            width,
            height,
            color: vec![None; width * height],
            depth: vec![f32::INFINITY; width * height],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            *self = Raster::new(width, height);
        }
    }

    pub fn clear(&mut self) {
        self.color.fill(None);
        self.depth.fill(f32::INFINITY);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Vec3> {
        if x < self.width && y < self.height {
            self.color[y * self.width + x]
        } else {
            None
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 { 1.0 } else { self.width as f32 / self.height as f32 }
    }

    /// Draw every triangle of `mesh` with the combined transform.
    pub fn draw_mesh(&mut self, mesh: &MeshData, mvp: Mat4) {
        for [a, b, c] in mesh.triangles() {
            let tri = [a, b, c].map(|i| ClipVertex {
                pos: mvp * mesh.vertices[i].extend(1.0),
                color: mesh.color(i),
            });
            let poly = clip_near(&tri);
            if poly.len() < 3 {
                continue;
            }
            let screen: Vec<ScreenVertex> = poly.iter().map(|v| self.to_screen(v)).collect();
            for i in 1..screen.len() - 1 {
                let t = [screen[0], screen[i], screen[i + 1]];
                match mesh.fill {
                    FillMode::Fill => self.fill_triangle(t),
                    FillMode::Line => {
                        self.draw_line(t[0], t[1]);
                        self.draw_line(t[1], t[2]);
                        self.draw_line(t[2], t[0]);
                    }
                }
            }
        }
    }

    fn to_screen(&self, v: &ClipVertex) -> ScreenVertex {
        let ndc = v.pos.truncate() / v.pos.w;
        ScreenVertex {
            x: (ndc.x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc.y) * 0.5 * self.height as f32,
            depth: ndc.z,
            color: v.color,
        }
    }

    fn plot(&mut self, x: usize, y: usize, depth: f32, color: Vec3) {
        if x >= self.width || y >= self.height || !(-1.0..=1.0).contains(&depth) {
            return;
        }
        let i = y * self.width + x;
        if depth < self.depth[i] {
            self.depth[i] = depth;
            self.color[i] = Some(color);
        }
    }

    fn fill_triangle(&mut self, [a, b, c]: [ScreenVertex; 3]) {
        let area = edge(a, b, c.x, c.y);
        if area.abs() < 1e-6 {
            return;
        }
        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as usize;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(self.width as f32) as usize;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as usize;
        let max_y = a.y.max(b.y).max(c.y).ceil().min(self.height as f32) as usize;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b, c, px, py) / area;
                let w1 = edge(c, a, px, py) / area;
                let w2 = edge(a, b, px, py) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let depth = w0 * a.depth + w1 * b.depth + w2 * c.depth;
                let color = a.color * w0 + b.color * w1 + c.color * w2;
                self.plot(x, y, depth, color);
            }
        }
    }

    fn draw_line(&mut self, a: ScreenVertex, b: ScreenVertex) {
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().max(1.0);
        // long edges from near-plane vertices would stall the frame
        if steps > 4.0 * (self.width + self.height) as f32 {
            return;
        }
        for s in 0..=steps as usize {
            let t = s as f32 / steps;
            let x = a.x + (b.x - a.x) * t;
            let y = a.y + (b.y - a.y) * t;
            if x < 0.0 || y < 0.0 {
                continue;
            }
            let depth = a.depth + (b.depth - a.depth) * t;
            self.plot(x as usize, y as usize, depth, a.color.lerp(b.color, t));
        }
    }
}

/// Twice the signed area of (a, b, p).
#[inline]
fn edge(a: ScreenVertex, b: ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Clip a triangle against the near plane (z >= -w). Returns the kept
/// polygon, 0, 3 or 4 vertices.
fn clip_near(tri: &[ClipVertex; 3]) -> Vec<ClipVertex> {
    let dist = |v: &ClipVertex| v.pos.z + v.pos.w;
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let cur = tri[i];
        let next = tri[(i + 1) % 3];
        let (dc, dn) = (dist(&cur), dist(&next));
        if dc >= 0.0 {
            out.push(cur);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            let t = dc / (dc - dn);
            out.push(ClipVertex {
                pos: cur.pos.lerp(next.pos, t),
                color: cur.color.lerp(next.color, t),
            });
        }
    }
    out
}

fn to_color(c: Vec3) -> Color {
    let c = (c.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    Color::Rgb { r: c.x as u8, g: c.y as u8, b: c.z as u8 }
}

// ══════════════════════════════════════════════════════════════
// Terminal backend
// ══════════════════════════════════════════════════════════════

/// Vertical layout
const HUD_ROW: usize = 0;
const VIEW_ROW: usize = 1;
/// HUD + message bar + help bar
const RESERVED_ROWS: usize = 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const HELP: &str =
    " ↑↓ move  ←→ turn  Space jump  W/S speed  T/H/A/F view  R restart  Q quit  │  right-drag orbit  wheel zoom";

pub struct TerminalBackend {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    raster: Raster,
    meshes: Vec<MeshData>,
    enhanced_keys: bool,
}

impl TerminalBackend {
    pub fn new() -> Self {
        TerminalBackend {
            writer: BufWriter::with_capacity(65536, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            raster: Raster::new(0, 0),
            meshes: Vec::new(),
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the
    /// terminal reports key releases.
    pub fn init(&mut self) -> Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        self.sync_size()?;
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Width / height of the 3D view in raster pixels.
    pub fn aspect(&self) -> f32 {
        self.raster.aspect()
    }

    /// Detect terminal resize and start a fresh raster.
    pub fn begin_frame(&mut self) -> Result<()> {
        self.sync_size()?;
        self.raster.clear();
        Ok(())
    }

    fn sync_size(&mut self) -> Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            let view_rows = self.term_h.saturating_sub(RESERVED_ROWS).max(1);
            self.raster.resize(self.term_w, view_rows * 2);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        Ok(())
    }

    /// Compose the raster and the bars, then emit the diff.
    pub fn present(&mut self, world: &WorldState) -> Result<()> {
        self.front.clear();
        compose(&mut self.front, &self.raster, world);
        self.flush_diff()?;
        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // Do NOT use ResetColor here: it resets to the terminal's
        // native default, which may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
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
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

impl RenderBackend for TerminalBackend {
    fn create_renderable(&mut self, mesh: MeshData) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    fn render(&mut self, handle: MeshHandle, transform: Mat4) {
        if let Some(mesh) = self.meshes.get(handle.0 as usize) {
            self.raster.draw_mesh(mesh, transform);
        }
    }

    fn release_all(&mut self) {
        self.meshes.clear();
    }
}

// ── Compose: build front buffer content ──

fn compose(front: &mut FrameBuffer, raster: &Raster, w: &WorldState) {
    front.put_bar(HUD_ROW, &hud_line(w), Color::White, HUD_BG);

    let view_rows = raster.height / 2;
    for row in 0..view_rows {
        let ty = VIEW_ROW + row;
        if ty >= front.height {
            break;
        }
        for x in 0..raster.width.min(front.width) {
            let top = raster.pixel(x, row * 2).map_or(Cell::BASE_BG, to_color);
            let bottom = raster.pixel(x, row * 2 + 1).map_or(Cell::BASE_BG, to_color);
            front.set(x, ty, Cell::from_char('▀', top, bottom));
        }
    }

    let msg_row = VIEW_ROW + view_rows;
    if msg_row < front.height && !w.message.is_empty() {
        front.put_bar(msg_row, &format!(" ◈ {} ", w.message), Color::Black, MSG_BG);
    }

    let help_row = msg_row + 1;
    if help_row < front.height {
        front.put_str(0, help_row, HELP, Color::DarkGrey, Color::Reset);
    }
}

/// Top status line. The key indicator blinks on the half-second timer
/// once the lift is unlocked.
pub fn hud_line(w: &WorldState) -> String {
    let key = match (w.game.has_key, w.slow_tick % 2 == 0) {
        (true, true) => "KEY ▲ LIFT",
        (true, false) => "         ",
        (false, _) => "no key",
    };
    format!(
        " Level {:<2}  Score {:<5}  Health {:>3}  Lives {}  {}  Speed {:.1}  View {} ",
        w.game.level,
        w.game.score,
        w.game.health,
        w.game.lives,
        key,
        w.player.speed,
        w.view().label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::gfx::Primitive;

    fn tri(z: f32, color: Vec3, fill: FillMode) -> MeshData {
        MeshData {
            primitive: Primitive::Triangles,
            vertices: vec![
                Vec3::new(-1.0, -1.0, z),
                Vec3::new(1.0, -1.0, z),
                Vec3::new(0.0, 1.0, z),
            ],
            colors: vec![color; 3],
            fill,
        }
    }

    fn shows(px: Option<Vec3>, want: Vec3) -> bool {
        px.is_some_and(|c| c.abs_diff_eq(want, 1e-4))
    }

    #[test]
    fn triangle_covers_centre() {
        let mut r = Raster::new(20, 20);
        r.draw_mesh(&tri(0.0, Vec3::X, FillMode::Fill), Mat4::IDENTITY);
        assert!(shows(r.pixel(10, 10), Vec3::X));
        assert_eq!(r.pixel(0, 0), None);
    }

    #[test]
    fn nearer_triangle_wins_either_order() {
        let near = tri(-0.5, Vec3::X, FillMode::Fill);
        let far = tri(0.5, Vec3::Y, FillMode::Fill);

        let mut r = Raster::new(20, 20);
        r.draw_mesh(&near, Mat4::IDENTITY);
        r.draw_mesh(&far, Mat4::IDENTITY);
        assert!(shows(r.pixel(10, 10), Vec3::X));

        r.clear();
        r.draw_mesh(&far, Mat4::IDENTITY);
        r.draw_mesh(&near, Mat4::IDENTITY);
        assert!(shows(r.pixel(10, 10), Vec3::X));
    }

    #[test]
    fn behind_near_plane_is_dropped() {
        let mut r = Raster::new(20, 20);
        r.draw_mesh(&tri(-1.5, Vec3::X, FillMode::Fill), Mat4::IDENTITY);
        assert!((0..20).all(|y| (0..20).all(|x| r.pixel(x, y).is_none())));
    }

    #[test]
    fn clip_keeps_front_part() {
        let v = |z: f32| ClipVertex { pos: Vec4::new(0.0, 0.0, z, 1.0), color: Vec3::ONE };
        assert_eq!(clip_near(&[v(0.0), v(0.0), v(0.0)]).len(), 3);
        assert_eq!(clip_near(&[v(-2.0), v(0.0), v(0.0)]).len(), 4);
        assert_eq!(clip_near(&[v(-2.0), v(-2.0), v(0.0)]).len(), 3);
        assert!(clip_near(&[v(-2.0), v(-2.0), v(-2.0)]).is_empty());
    }

    #[test]
    fn line_mode_leaves_interior_empty() {
        let mut r = Raster::new(40, 40);
        r.draw_mesh(&tri(0.0, Vec3::Z, FillMode::Line), Mat4::from_scale(Vec3::splat(0.8)));
        assert_eq!(r.pixel(20, 20), None);
        // bottom edge sits on row 36 (35 after rounding)
        assert!((8..32).all(|x| r.pixel(x, 36).is_some() || r.pixel(x, 35).is_some()));
    }

    #[test]
    fn perspective_cube_face_is_visible() {
        let mut r = Raster::new(40, 40);
        let mesh = crate::domain::geometry::terrain_block(20.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, -60.0, 40.0), Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        let proj = crate::domain::camera::projection(r.aspect(), 45.0);
        r.draw_mesh(&mesh, proj * view);
        assert!(r.pixel(20, 20).is_some());
    }

    #[test]
    fn colors_round_to_bytes() {
        assert_eq!(to_color(Vec3::new(1.0, 0.0, 0.05)), Color::Rgb { r: 255, g: 0, b: 13 });
        assert_eq!(to_color(Vec3::new(2.0, -1.0, 0.5)), Color::Rgb { r: 255, g: 0, b: 128 });
    }

    #[test]
    fn compose_packs_two_pixels_per_cell() {
        let mut raster = Raster::new(4, 4);
        raster.plot(1, 0, 0.0, Vec3::X);
        raster.plot(1, 1, 0.0, Vec3::Y);
        let mut front = FrameBuffer::new(4, 6);
        let world = WorldState::new(&GameConfig::default());
        compose(&mut front, &raster, &world);
        let cell = front.get(1, VIEW_ROW);
        assert_eq!(cell.ch, '▀');
        assert_eq!(cell.fg, Color::Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(cell.bg, Color::Rgb { r: 0, g: 255, b: 0 });
        assert_eq!(front.get(0, VIEW_ROW).fg, Cell::BASE_BG);
    }

    #[test]
    fn message_bar_shown_below_view() {
        let raster = Raster::new(30, 4);
        let mut front = FrameBuffer::new(30, 6);
        let mut world = WorldState::new(&GameConfig::default());
        world.set_message("Key found", 10);
        compose(&mut front, &raster, &world);
        let row: String = (0..30).map(|x| front.get(x, VIEW_ROW + 2).ch).collect();
        assert!(row.contains("Key found"));
    }

    #[test]
    fn hud_blinks_key_indicator() {
        let mut world = WorldState::new(&GameConfig::default());
        assert!(hud_line(&world).contains("no key"));
        world.game.has_key = true;
        assert!(hud_line(&world).contains("LIFT"));
        world.slow_tick = 1;
        assert!(!hud_line(&world).contains("LIFT"));
        assert!(hud_line(&world).contains("View orbit"));
    }

    #[test]
    fn backend_ignores_stale_handles() {
        let mut be = TerminalBackend::new();
        be.raster = Raster::new(10, 10);
        let h = be.create_renderable(tri(0.0, Vec3::X, FillMode::Fill));
        be.release_all();
        be.render(h, Mat4::IDENTITY);
        assert!(be.raster.pixel(5, 5).is_none());
    }
}
