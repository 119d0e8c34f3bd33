/// Level loader.
///
/// ## File format (`<levels_dir>/<n>.txt`):
///   Up to 21 lines of up to 20 characters. The first line is grid
///   row 20, the last is row 0; anything past that window is ignored.
///
/// ## Legend:
///   'x' = Floor        'e' = Wall         'b' = Barrier
///   'o' = Pit          'p' = Spike plate  'c' = Coin (on a floor)
///   'k' = Key (on a floor)                'u' = Lift
///   anything else = empty cell
///
/// A cell at column `c`, row `r` sits at world `(10c - 100, 10r - 100)`.

use std::path::{Path, PathBuf};

use glam::Vec3;
use tracing::{info, warn};

use crate::domain::placement::{cell_to_world, PlacementKind, GRID_COLS, TOP_ROW};
use crate::error::{GameError, Result};
use crate::gfx::{ForceFill, RenderBackend};
use crate::sim::scene::SharedMeshes;
use crate::sim::world::WorldState;

/// Parsed level, before any renderable exists.
#[derive(Clone, Debug, Default)]
pub struct LevelLayout {
    pub placements: Vec<(PlacementKind, Vec3)>,
}

impl LevelLayout {
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    #[cfg(test)]
    pub fn count(&self, kind: PlacementKind) -> usize {
        self.placements.iter().filter(|(k, _)| *k == kind).count()
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

pub fn level_path(dir: &Path, level: u32) -> PathBuf {
    dir.join(format!("{level}.txt"))
}

pub fn read_level(dir: &Path, level: u32) -> Result<String> {
    let path = level_path(dir, level);
    std::fs::read_to_string(&path).map_err(|source| GameError::LevelRead { path, source })
}

/// Turn level text into placements. Never fails: unknown characters are
/// empty cells and out-of-window text is dropped.
pub fn parse_level(text: &str) -> LevelLayout {
    let mut placements = vec![];
    let rows = (0..=TOP_ROW).rev();
    for (row, line) in rows.zip(text.lines()) {
        for (col, ch) in line.chars().take(GRID_COLS).enumerate() {
            let Some(kind) = PlacementKind::from_char(ch) else { continue };
            let (x, y) = cell_to_world(col, row);
            if kind.has_floor_under() {
                placements.push((PlacementKind::Floor, Vec3::new(x, y, 0.0)));
            }
            placements.push((kind, Vec3::new(x, y, kind.base_z())));
        }
    }
    LevelLayout { placements }
}

/// Replace the scene with `world.game.level`. Score and lives survive,
/// the player goes back to the start and the key is dropped.
pub fn load_level(world: &mut WorldState, backend: &mut dyn RenderBackend) {
    backend.release_all();
    world.scene.clear();

    let level = world.game.level;
    let text = match read_level(&world.levels_dir, level) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "level {level} unavailable, loading an empty level");
            String::new()
        }
    };

    let layout = parse_level(&text);
    if layout.is_empty() && !text.trim().is_empty() {
        warn!("level {level} has no recognised placements");
    }
    let mut backend = ForceFill { inner: backend, fill: world.fill };
    for (kind, position) in &layout.placements {
        world.scene.insert(*kind, *position, &mut backend);
    }
    world.scene.meshes = Some(SharedMeshes::create(&mut backend));

    world.player.respawn();
    world.game.has_key = false;
    world.camera.reset_for_level();

    let scene = &world.scene;
    info!(
        level,
        placements = layout.placements.len(),
        walls = scene.count(PlacementKind::Wall),
        barriers = scene.count(PlacementKind::Barrier),
        pits = scene.count(PlacementKind::Pit),
        hazards = scene.count(PlacementKind::Hazard),
        coins = scene.count(PlacementKind::Coin),
        has_key = scene.count(PlacementKind::KeyPickup) > 0,
        has_lift = scene.count(PlacementKind::LiftPad) > 0,
        "level = {level}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::camera::ViewMode;
    use crate::domain::entity::START_POSITION;
    use crate::gfx::RecordingBackend;
    use proptest::prelude::*;

    const LEGEND: [char; 8] = ['x', 'e', 'b', 'o', 'p', 'c', 'k', 'u'];

    fn world_in(dir: &Path) -> WorldState {
        let mut config = GameConfig::default();
        config.levels_dir = dir.to_path_buf();
        WorldState::new(&config)
    }

    #[test]
    fn path_is_number_dot_txt() {
        assert_eq!(level_path(Path::new("lv"), 3), PathBuf::from("lv/3.txt"));
    }

    #[test]
    fn first_line_is_row_twenty() {
        let layout = parse_level("e\n\n.e");
        assert_eq!(layout.placements, vec![
            (PlacementKind::Wall, Vec3::new(-100.0, 100.0, 0.0)),
            (PlacementKind::Wall, Vec3::new(-90.0, 80.0, 0.0)),
        ]);
    }

    #[test]
    fn pickups_stand_on_floor() {
        let layout = parse_level("ck");
        assert_eq!(layout.count(PlacementKind::Floor), 2);
        assert!(layout.placements.contains(&(PlacementKind::Coin, Vec3::new(-100.0, 100.0, 40.0))));
        assert!(layout.placements.contains(&(PlacementKind::KeyPickup, Vec3::new(-90.0, 100.0, 20.0))));
    }

    #[test]
    fn window_is_twenty_by_twenty_one() {
        let long_line = "e".repeat(30);
        let text = vec![long_line.as_str(); 25].join("\n");
        let layout = parse_level(&text);
        assert_eq!(layout.count(PlacementKind::Wall), 20 * 21);
        let lowest = layout.placements.iter().map(|(_, p)| p.y).fold(f32::MAX, f32::min);
        assert_eq!(lowest, -100.0);
    }

    #[test]
    fn unknown_characters_are_empty() {
        assert!(parse_level(" .#?XE\t").is_empty());
    }

    #[test]
    fn crlf_line_endings_parse() {
        let layout = parse_level("e\r\ne\r\n");
        assert_eq!(layout.count(PlacementKind::Wall), 2);
    }

    #[test]
    fn read_level_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        match read_level(dir.path(), 7) {
            Err(GameError::LevelRead { path, .. }) => assert_eq!(path, dir.path().join("7.txt")),
            other => panic!("expected LevelRead, got {other:?}"),
        }
    }

    #[test]
    fn load_level_builds_scene_and_resets() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("1.txt"), "eboxp\nckuu\n").expect("write");
        let mut world = world_in(dir.path());
        let mut be = RecordingBackend::new();
        world.player.position = Vec3::ZERO;
        world.game.has_key = true;
        world.camera.mode = ViewMode::ChaseFar;

        load_level(&mut world, &mut be);

        let scene = &world.scene;
        assert_eq!(scene.walls.len(), 1);
        assert_eq!(scene.barriers.len(), 1);
        assert_eq!(scene.floors.len(), 3);
        assert_eq!(scene.pits.len(), 1);
        assert_eq!(scene.hazards.len(), 1);
        assert_eq!(scene.coins.len(), 1);
        assert_eq!(scene.key, Some(Vec3::new(-90.0, 90.0, 20.0)));
        assert_eq!(scene.lift.as_ref().map(|l| l.position), Some(Vec3::new(-70.0, 90.0, 20.1)));
        assert!(scene.meshes.is_some());
        assert_eq!(world.player.position, START_POSITION);
        assert!(!world.game.has_key);
        assert_eq!(world.camera.mode, ViewMode::Orbit);
        // 5 blocks + 7 shared meshes
        assert_eq!(be.meshes.len(), 12);
    }

    #[test]
    fn reload_releases_previous_meshes() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("1.txt"), "xxxx\n").expect("write");
        let mut world = world_in(dir.path());
        let mut be = RecordingBackend::new();
        load_level(&mut world, &mut be);
        load_level(&mut world, &mut be);
        assert_eq!(be.releases, 2);
        assert_eq!(be.meshes.len(), 4 + 7);
        assert_eq!(world.scene.floors.len(), 4);
    }

    #[test]
    fn wireframe_world_uploads_line_meshes() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("1.txt"), "xe\n").expect("write");
        let mut config = GameConfig::default();
        config.levels_dir = dir.path().to_path_buf();
        config.display.wireframe = true;
        let mut world = WorldState::new(&config);
        let mut be = RecordingBackend::new();
        load_level(&mut world, &mut be);
        assert!(be.meshes.iter().all(|m| m.fill == crate::gfx::FillMode::Line));
    }

    #[test]
    fn missing_file_loads_empty_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut world = world_in(dir.path());
        world.game.level = 42;
        let mut be = RecordingBackend::new();
        load_level(&mut world, &mut be);
        assert_eq!(world.scene.blocks().count(), 0);
        assert!(world.scene.lift.is_none());
        assert!(world.scene.meshes.is_some());
        assert_eq!(world.game.level, 42);
    }

    #[test]
    fn shipped_first_level_has_wall_at_col5_row10() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("levels");
        let text = read_level(&dir, 1).expect("levels/1.txt ships with the crate");
        let layout = parse_level(&text);
        assert!(layout.placements.contains(&(PlacementKind::Wall, Vec3::new(-50.0, 0.0, 0.0))));
        assert_eq!(layout.count(PlacementKind::LiftPad), 1);
        assert_eq!(layout.count(PlacementKind::KeyPickup), 1);
    }

    fn grid() -> impl Strategy<Value = Vec<String>> {
        let cell = prop_oneof![
            4 => Just('.'),
            1 => proptest::sample::select(LEGEND.to_vec()),
        ];
        let line = proptest::collection::vec(cell, 0..26)
            .prop_map(|cs| cs.into_iter().collect::<String>());
        proptest::collection::vec(line, 0..24)
    }

    proptest! {
        #[test]
        fn counts_match_characters_in_window(lines in grid()) {
            let layout = parse_level(&lines.join("\n"));
            let in_window = |c: char| {
                lines.iter().take(21)
                    .map(|l| l.chars().take(20).filter(|&x| x == c).count())
                    .sum::<usize>()
            };
            for (ch, kind) in LEGEND.iter().filter_map(|&c| PlacementKind::from_char(c).map(|k| (c, k))) {
                let expected = if kind == PlacementKind::Floor {
                    in_window('x') + in_window('c') + in_window('k')
                } else {
                    in_window(ch)
                };
                prop_assert_eq!(layout.count(kind), expected);
            }
            for (kind, p) in &layout.placements {
                prop_assert_eq!((p.x + 100.0) % 10.0, 0.0);
                prop_assert_eq!((p.y + 100.0) % 10.0, 0.0);
                prop_assert!(p.x >= -100.0 && p.x <= 90.0);
                prop_assert!(p.y >= -100.0 && p.y <= 100.0);
                prop_assert_eq!(p.z, kind.base_z());
            }
        }
    }
}
