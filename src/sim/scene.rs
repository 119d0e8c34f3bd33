/// Scene registry: everything placed in the current level.
///
/// Filled by the level loader, replaced wholesale on the next load.
/// Per-kind sequences keep the rule probes and the render pass simple
/// (each walks only the kinds it cares about).
///
///   floors / walls / barriers - one renderable each
///   pits                      - no geometry, probed only
///   hazards                   - shared plate, hole and spike meshes
///   coins                     - shared disc, `collected` flag per coin
///   lift, key                 - singletons (last one in the file wins)

use glam::Vec3;

use crate::domain::entity::{Coin, Lift};
use crate::domain::geometry;
use crate::domain::placement::PlacementKind;
use crate::gfx::{MeshHandle, RenderBackend};

#[derive(Clone, Debug)]
pub struct Placement {
    pub kind: PlacementKind,
    pub position: Vec3,
    pub handle: Option<MeshHandle>,
}

/// Meshes drawn at many positions, created once per level load.
#[derive(Clone, Copy, Debug)]
pub struct SharedMeshes {
    pub player: MeshHandle,
    pub plate: MeshHandle,
    pub hole: MeshHandle,
    pub spike: MeshHandle,
    pub coin: MeshHandle,
    pub lift: MeshHandle,
    pub key: MeshHandle,
}

impl SharedMeshes {
    pub fn create(backend: &mut dyn RenderBackend) -> Self {
        SharedMeshes {
            player: backend.create_renderable(geometry::player_box()),
            plate: backend.create_renderable(geometry::hazard_plate()),
            hole: backend.create_renderable(geometry::hazard_hole()),
            spike: backend.create_renderable(geometry::spike()),
            coin: backend.create_renderable(geometry::coin()),
            lift: backend.create_renderable(geometry::lift_plate()),
            key: backend.create_renderable(geometry::key_box()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    pub floors: Vec<Placement>,
    pub walls: Vec<Placement>,
    pub barriers: Vec<Placement>,
    pub pits: Vec<Placement>,
    pub hazards: Vec<Placement>,
    pub coins: Vec<Coin>,
    pub lift: Option<Lift>,
    pub key: Option<Vec3>,
    pub meshes: Option<SharedMeshes>,
    /// Coin rotation about z, radians. Cosmetic.
    pub coin_spin: f32,
}

impl Scene {
    /// Drop every placement. Mesh handles must be released by the caller.
    pub fn clear(&mut self) {
        *self = Scene::default();
    }

    /// Register one placement. Blocks get their own renderable.
    pub fn insert(&mut self, kind: PlacementKind, position: Vec3, backend: &mut dyn RenderBackend) {
        let handle = kind
            .block_height()
            .map(|h| backend.create_renderable(geometry::terrain_block(h)));
        let placement = Placement { kind, position, handle };
        match kind {
            PlacementKind::Floor => self.floors.push(placement),
            PlacementKind::Wall => self.walls.push(placement),
            PlacementKind::Barrier => self.barriers.push(placement),
            PlacementKind::Pit => self.pits.push(placement),
            PlacementKind::Hazard => self.hazards.push(placement),
            PlacementKind::Coin => self.coins.push(Coin::new(position)),
            PlacementKind::KeyPickup => self.key = Some(position),
            PlacementKind::LiftPad => self.lift = Some(Lift { position }),
        }
    }

    /// Every block that pushes the player back.
    pub fn blockers(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.blocks().filter(|p| p.kind.is_blocking()).map(|p| p.position)
    }

    pub fn pit_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.pits.iter().map(|p| p.position)
    }

    pub fn hazard_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.hazards.iter().map(|p| p.position)
    }

    pub fn uncollected_coins(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter().filter(|c| !c.collected)
    }

    /// Floors, walls and barriers, for the render pass.
    pub fn blocks(&self) -> impl Iterator<Item = &Placement> {
        self.floors.iter().chain(&self.walls).chain(&self.barriers)
    }

    /// Number of placements of one kind.
    pub fn count(&self, kind: PlacementKind) -> usize {
        match kind {
            PlacementKind::Floor => self.floors.len(),
            PlacementKind::Wall => self.walls.len(),
            PlacementKind::Barrier => self.barriers.len(),
            PlacementKind::Pit => self.pits.len(),
            PlacementKind::Hazard => self.hazards.len(),
            PlacementKind::Coin => self.coins.len(),
            PlacementKind::KeyPickup => usize::from(self.key.is_some()),
            PlacementKind::LiftPad => usize::from(self.lift.is_some()),
        }
    }
}
