/// Mesh builder. Every renderable in the game comes out of `build`.
///
/// Local frames: blocks stand on z = 0 and are centred in x/y, flat
/// pieces lie in the z = 0 plane, the coin disc stands upright in the
/// x/z plane so spinning it about z shows it edge-on and face-on.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::gfx::{FillMode, MeshData, Primitive};

/// Side and top/bottom colors of a block.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub side: Vec3,
    pub cap: Vec3,
}

// 8-bit channel values over 255
const DARK_GREEN: Vec3 = Vec3::new(0.129_411_77, 0.4, 0.0); // (33, 102, 0)
const BRIGHT_GREEN: Vec3 = Vec3::new(0.396_078_44, 1.0, 0.101_960_786); // (101, 255, 26)
const TEAL: Vec3 = Vec3::new(0.129_411_77, 0.4, 0.392_156_87); // (33, 102, 100)

/// Level blocks: dark green sides, bright green caps.
pub const TERRAIN: Palette = Palette { side: DARK_GREEN, cap: BRIGHT_GREEN };
/// Player and key.
pub const PLAYER: Palette = Palette { side: TEAL, cap: DARK_GREEN };

pub const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);
pub const WHITE: Vec3 = Vec3::ONE;
pub const HOLE: Vec3 = Vec3::new(0.0, 0.0, 0.05);

pub const PLATE_HALF: f32 = 5.0;
pub const HOLE_HALF: f32 = 1.5;
pub const SPIKE_HEIGHT: f32 = 10.0;
pub const LIFT_HALF: f32 = 5.0;
pub const COIN_RADIUS: f32 = 2.5;
pub const COIN_SEGMENTS: usize = 32;
/// Holes and spikes sit at these offsets from the plate centre.
pub const HAZARD_OFFSETS: [(f32, f32); 4] = [(2.0, 2.0), (2.0, -2.0), (-2.0, 2.0), (-2.0, -2.0)];
/// Holes sit just above the plate.
pub const HOLE_LIFT: f32 = 0.1;

#[derive(Clone, Copy, Debug)]
pub enum Shape {
    /// Box of `length` (x) by `width` (y) by `height` (z).
    Cuboid { length: f32, width: f32, height: f32, palette: Palette },
    /// Flat square of side `2 * half`.
    Quad { half: f32, color: Vec3 },
    /// Square-based pyramid, apex at `height`.
    Pyramid { half: f32, height: f32, color: Vec3 },
    /// Upright disc as a triangle fan.
    Disc { radius: f32, segments: usize, color: Vec3 },
}

pub fn build(shape: Shape) -> MeshData {
    match shape {
        Shape::Cuboid { length, width, height, palette } => cuboid(length, width, height, palette),
        Shape::Quad { half, color } => quad(half, color),
        Shape::Pyramid { half, height, color } => pyramid(half, height, color),
        Shape::Disc { radius, segments, color } => disc(radius, segments, color),
    }
}

fn triangles(vertices: Vec<Vec3>, colors: Vec<Vec3>) -> MeshData {
    MeshData { primitive: Primitive::Triangles, vertices, colors, fill: FillMode::Fill }
}

fn cuboid(length: f32, width: f32, h: f32, palette: Palette) -> MeshData {
    let (x, y) = (length / 2.0, width / 2.0);
    let corner = |sx: f32, sy: f32, z: f32| Vec3::new(sx * x, sy * y, z);
    // Each face as a quad a-b-c-d, split along a-c
    let faces: [([Vec3; 4], Vec3); 6] = [
        ([corner(-1., -1., 0.), corner(-1., -1., h), corner(-1., 1., h), corner(-1., 1., 0.)], palette.side),
        ([corner(1., -1., 0.), corner(1., 1., 0.), corner(1., 1., h), corner(1., -1., h)], palette.side),
        ([corner(-1., -1., 0.), corner(-1., 1., 0.), corner(1., 1., 0.), corner(1., -1., 0.)], palette.cap),
        ([corner(-1., -1., h), corner(1., -1., h), corner(1., 1., h), corner(-1., 1., h)], palette.cap),
        ([corner(-1., -1., 0.), corner(1., -1., 0.), corner(1., -1., h), corner(-1., -1., h)], palette.side),
        ([corner(-1., 1., 0.), corner(-1., 1., h), corner(1., 1., h), corner(1., 1., 0.)], palette.side),
    ];
    let mut vertices = Vec::with_capacity(36);
    let mut colors = Vec::with_capacity(36);
    for ([a, b, c, d], color) in faces {
        vertices.extend_from_slice(&[a, b, c, a, c, d]);
        colors.extend(std::iter::repeat(color).take(6));
    }
    triangles(vertices, colors)
}

fn quad(half: f32, color: Vec3) -> MeshData {
    let v = |x: f32, y: f32| Vec3::new(x * half, y * half, 0.0);
    triangles(
        vec![v(-1., -1.), v(-1., 1.), v(1., -1.), v(1., 1.), v(1., -1.), v(-1., 1.)],
        vec![color; 6],
    )
}

fn pyramid(half: f32, height: f32, color: Vec3) -> MeshData {
    let apex = Vec3::new(0.0, 0.0, height);
    let b = |x: f32, y: f32| Vec3::new(x * half, y * half, 0.0);
    triangles(
        vec![
            b(-1., 1.), apex, b(-1., -1.),
            b(-1., 1.), apex, b(1., 1.),
            b(1., 1.), apex, b(1., -1.),
            b(-1., -1.), apex, b(1., -1.),
        ],
        vec![color; 12],
    )
}

fn disc(radius: f32, segments: usize, color: Vec3) -> MeshData {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity(segments + 2);
    vertices.push(Vec3::ZERO);
    // rim closes on itself: vertex `segments + 1` repeats vertex 1
    for i in 1..=segments + 1 {
        let a = i as f32 * TAU / segments as f32;
        vertices.push(Vec3::new(radius * a.cos(), 0.0, radius * a.sin()));
    }
    let n = vertices.len();
    MeshData {
        primitive: Primitive::TriangleFan,
        vertices,
        colors: vec![color; n],
        fill: FillMode::Fill,
    }
}

// ── Game pieces ──

pub fn terrain_block(height: f32) -> MeshData {
    build(Shape::Cuboid { length: 10.0, width: 10.0, height, palette: TERRAIN })
}

pub fn player_box() -> MeshData {
    build(Shape::Cuboid { length: 10.0, width: 10.0, height: 10.0, palette: PLAYER })
}

pub fn key_box() -> MeshData {
    build(Shape::Cuboid { length: 4.0, width: 4.0, height: 4.0, palette: PLAYER })
}

pub fn hazard_plate() -> MeshData {
    build(Shape::Quad { half: PLATE_HALF, color: RED })
}

pub fn hazard_hole() -> MeshData {
    build(Shape::Quad { half: HOLE_HALF, color: HOLE })
}

pub fn spike() -> MeshData {
    build(Shape::Pyramid { half: HOLE_HALF, height: SPIKE_HEIGHT, color: WHITE })
}

pub fn lift_plate() -> MeshData {
    build(Shape::Quad { half: LIFT_HALF, color: WHITE })
}

pub fn coin() -> MeshData {
    build(Shape::Disc { radius: COIN_RADIUS, segments: COIN_SEGMENTS, color: RED })
}
