/// Chunk streaming tests: convergence of the live set on the required set,
/// eviction after the viewpoint moves, failure handling and background generation.
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cgmath::{Matrix4, Point3, SquareMatrix};
use voxel_world::engine_state::chunk_manager::required_set;
use voxel_world::engine_state::rendering::vertex::FLOATS_PER_TRIANGLE;
use voxel_world::*;

/// Records what it is asked to draw.
#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<usize>,
}

impl Renderer for RecordingRenderer {
    fn render_data(&mut self, _view: &Matrix4<f32>, vertex_data: &[f32]) -> Result<(), RenderError> {
        if vertex_data.is_empty() {
            return Err(RenderError::EmptyBuffer);
        }
        self.frames.push(vertex_data.len());
        Ok(())
    }
}

fn config(radius: i32, method: GenerationMethod) -> WorldConfig {
    let mut config = WorldConfig {
        radius,
        ..WorldConfig::default()
    };
    config.terrain.method = method;
    config
}

fn chunk_center(x: i32, y: i32, z: i32) -> Point3<f32> {
    Point3::new(
        x as f32 * 16.0 + 8.0,
        y as f32 * 16.0 + 8.0,
        z as f32 * 16.0 + 8.0,
    )
}

fn live_set(manager: &ChunkManager) -> HashSet<Point3<i32>> {
    manager.live_positions().into_iter().collect()
}

#[test]
fn live_set_converges_after_two_stationary_frames() {
    let mut manager = ChunkManager::new(&config(1, GenerationMethod::Noise), BlockAtlas::default()).unwrap();
    let mut renderer = RecordingRenderer::default();
    let viewpoint = chunk_center(0, 0, 0);

    let first = manager.render_world(&mut renderer, viewpoint, Matrix4::identity());
    let second = manager.render_world(&mut renderer, viewpoint, Matrix4::identity());

    let expected = required_set(Point3::new(0, 0, 0), 1, RequiredShape::Cube);
    assert_eq!(live_set(&manager), expected);
    assert_eq!(first.loaded, 27);
    assert_eq!(second.loaded, 0);
    assert_eq!(second.evicted, 0);
    assert_eq!(second.remeshed, 0);
    assert_eq!(first.vertex_floats, second.vertex_floats);
}

#[test]
fn submitted_buffer_is_every_live_mesh_concatenated() {
    let mut manager = ChunkManager::new(&config(1, GenerationMethod::Flat), BlockAtlas::default()).unwrap();
    let mut renderer = RecordingRenderer::default();

    let frame = manager.render_world(&mut renderer, chunk_center(0, 1, 0), Matrix4::identity());

    let expected: usize = manager.world().chunks().map(|chunk| chunk.vertex_data().len()).sum();
    assert!(frame.submitted);
    assert_eq!(renderer.frames, vec![expected]);
    assert_eq!(expected % FLOATS_PER_TRIANGLE, 0);
    assert!(manager.world().chunks().all(|chunk| !chunk.is_dirty()));
}

#[test]
fn moving_one_chunk_evicts_the_trailing_slab() {
    let mut manager = ChunkManager::new(&config(1, GenerationMethod::Flat), BlockAtlas::default()).unwrap();
    let mut renderer = RecordingRenderer::default();

    manager.render_world(&mut renderer, chunk_center(0, 0, 0), Matrix4::identity());
    let frame = manager.render_world(&mut renderer, chunk_center(1, 0, 0), Matrix4::identity());

    assert_eq!(frame.evicted, 9);
    assert_eq!(frame.loaded, 9);
    assert!(manager.live_positions().iter().all(|position| position.x >= 0));
    assert_eq!(live_set(&manager), required_set(Point3::new(1, 0, 0), 1, RequiredShape::Cube));
}

#[test]
fn jumping_away_replaces_the_whole_live_set() {
    let mut manager = ChunkManager::new(&config(1, GenerationMethod::Flat), BlockAtlas::default()).unwrap();
    let mut renderer = RecordingRenderer::default();

    manager.render_world(&mut renderer, chunk_center(0, 0, 0), Matrix4::identity());
    let frame = manager.render_world(&mut renderer, chunk_center(-5, 0, 3), Matrix4::identity());

    assert_eq!(frame.evicted, 27);
    assert_eq!(frame.loaded, 27);
    assert_eq!(live_set(&manager), required_set(Point3::new(-5, 0, 3), 1, RequiredShape::Cube));
}

#[test]
fn sphere_shape_limits_the_live_set() {
    let mut config = config(2, GenerationMethod::Empty);
    config.shape = RequiredShape::Sphere;
    let mut manager = ChunkManager::new(&config, BlockAtlas::default()).unwrap();

    let frame = manager.update(chunk_center(0, 0, 0));

    assert_eq!(frame.live, 33);
    assert!(!manager.is_live(Point3::new(2, 2, 0)));
}

#[test]
fn empty_world_reports_an_empty_frame() {
    let mut manager = ChunkManager::new(&config(1, GenerationMethod::Empty), BlockAtlas::default()).unwrap();
    let mut renderer = RecordingRenderer::default();

    let frame = manager.render_world(&mut renderer, chunk_center(0, 0, 0), Matrix4::identity());

    assert_eq!(frame.live, 27);
    assert!(!frame.submitted);
    assert_eq!(frame.render_error, Some(RenderError::EmptyBuffer));
    assert!(renderer.frames.is_empty());
}

/// Accepts the first frame, then reports a backend failure for every later one.
#[derive(Default)]
struct LostDeviceRenderer {
    frames: usize,
}

impl Renderer for LostDeviceRenderer {
    fn render_data(&mut self, _view: &Matrix4<f32>, _vertex_data: &[f32]) -> Result<(), RenderError> {
        self.frames += 1;
        if self.frames > 1 {
            return Err(RenderError::Backend("device lost".to_string()));
        }
        Ok(())
    }
}

#[test]
fn backend_errors_do_not_stop_streaming() {
    let mut manager = ChunkManager::new(&config(1, GenerationMethod::Flat), BlockAtlas::default()).unwrap();
    let mut renderer = LostDeviceRenderer::default();

    let first = manager.render_world(&mut renderer, chunk_center(0, 0, 0), Matrix4::identity());
    let second = manager.render_world(&mut renderer, chunk_center(1, 0, 0), Matrix4::identity());

    assert!(first.submitted);
    assert!(!second.submitted);
    assert_eq!(second.render_error, Some(RenderError::Backend("device lost".to_string())));
    assert_eq!(second.loaded, 9);
    assert_eq!(live_set(&manager), required_set(Point3::new(1, 0, 0), 1, RequiredShape::Cube));
}

#[test]
fn atlas_missing_a_terrain_block_fails_at_construction() {
    let layout = AtlasLayout::from_json_str(
        r#"{ "columns": 8, "rows": 1, "blocks": [ { "block": "stone", "faces": [4, 4, 4, 4, 4, 4] } ] }"#,
    )
    .unwrap();
    let stone_only = Arc::new(BlockAtlas::from_layout(&layout).unwrap());

    match ChunkManager::new(&config(1, GenerationMethod::Noise), (*stone_only).clone()) {
        Err(GenerationError::UnsupportedBlock(block)) => assert_ne!(block, BlockType::STONE),
        Err(other) => panic!("expected UnsupportedBlock, got {:?}", other),
        Ok(_) => panic!("noise terrain accepted a stone-only atlas"),
    }

    // A generator that only places stone is fine with the same atlas.
    let generator = Arc::new(PanickingGenerator {
        at: Point3::new(i32::MAX, 0, 0),
    });
    let mut manager = ChunkManager::with_generator(&config(0, GenerationMethod::Flat), generator, stone_only).unwrap();
    assert_eq!(manager.update(chunk_center(0, 0, 0)).loaded, 1);
}

#[test]
fn edits_remesh_the_chunk_and_its_neighbors() {
    let mut manager = ChunkManager::new(&config(1, GenerationMethod::Flat), BlockAtlas::default()).unwrap();
    let mut renderer = RecordingRenderer::default();
    let viewpoint = chunk_center(0, 0, 0);
    manager.render_world(&mut renderer, viewpoint, Matrix4::identity());

    manager.set_block(Point3::new(8, 15, 8), BlockType::AIR).unwrap();
    let frame = manager.render_world(&mut renderer, viewpoint, Matrix4::identity());

    assert_eq!(frame.remeshed, 7);
    assert_eq!(manager.block_at(Point3::new(8, 15, 8)), Some(BlockType::AIR));
    assert_eq!(
        manager.set_block(Point3::new(0, 0, 0), BlockType::AIR),
        Ok(())
    );
    assert_eq!(
        manager.set_block(Point3::new(100, 0, 0), BlockType::STONE),
        Err(EditError::ChunkNotLoaded(Point3::new(6, 0, 0)))
    );
}

/// Fails the first attempt at every coordinate in `flaky`.
struct FlakyGenerator {
    inner: Terrain,
    flaky: Mutex<HashSet<Point3<i32>>>,
}

impl TerrainGenerator for FlakyGenerator {
    fn palette(&self) -> Vec<BlockType> {
        self.inner.palette()
    }

    fn fill(&self, chunk: &mut Chunk, origin: Point3<i32>) {
        self.inner.fill(chunk, origin)
    }

    fn generate(&self, position: Point3<i32>, atlas: &BlockAtlas) -> Result<Chunk, GenerationError> {
        if self.flaky.lock().unwrap().remove(&position) {
            return Err(GenerationError::Failed {
                position,
                reason: "transient".to_string(),
            });
        }
        self.inner.generate(position, atlas)
    }
}

#[test]
fn failed_generation_is_excluded_then_retried() {
    let config = config(1, GenerationMethod::Flat);
    let generator = Arc::new(FlakyGenerator {
        inner: Terrain::new(config.terrain.clone()),
        flaky: Mutex::new(HashSet::from([Point3::new(0, 0, 0), Point3::new(1, 1, 1)])),
    });
    let mut manager = ChunkManager::with_generator(&config, generator, Arc::new(BlockAtlas::default())).unwrap();

    let first = manager.update(chunk_center(0, 0, 0));
    assert_eq!(first.failed, 2);
    assert_eq!(first.live, 25);
    assert!(!manager.is_live(Point3::new(0, 0, 0)));

    let second = manager.update(chunk_center(0, 0, 0));
    assert_eq!(second.failed, 0);
    assert_eq!(second.loaded, 2);
    assert!(manager.is_live(Point3::new(0, 0, 0)));
    assert_eq!(second.live, 27);
}

/// Panics for one coordinate.
struct PanickingGenerator {
    at: Point3<i32>,
}

impl TerrainGenerator for PanickingGenerator {
    fn palette(&self) -> Vec<BlockType> {
        vec![BlockType::STONE]
    }

    fn fill(&self, chunk: &mut Chunk, origin: Point3<i32>) {
        if chunk.position() == self.at {
            panic!("generator bug at {:?}", origin);
        }
        chunk.set_horizontal_face(0, BlockType::STONE);
    }
}

#[test]
fn panicking_generation_counts_as_a_failure() {
    let config = config(1, GenerationMethod::Flat);
    let generator = Arc::new(PanickingGenerator {
        at: Point3::new(0, 1, 0),
    });
    let mut manager = ChunkManager::with_generator(&config, generator, Arc::new(BlockAtlas::default())).unwrap();

    let frame = manager.update(chunk_center(0, 0, 0));

    assert_eq!(frame.failed, 1);
    assert_eq!(frame.live, 26);
    assert!(!manager.is_live(Point3::new(0, 1, 0)));
}

fn run_until_settled(manager: &mut ChunkManager, viewpoint: Point3<f32>) -> FrameStats {
    let mut renderer = RecordingRenderer::default();
    let mut total = FrameStats::default();
    for _ in 0..2000 {
        let frame = manager.render_world(&mut renderer, viewpoint, Matrix4::identity());
        total.loaded += frame.loaded;
        total.discarded += frame.discarded;
        total.failed += frame.failed;
        if frame.pending == 0 && frame.live == manager.required().len() {
            total.live = frame.live;
            return total;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("streaming did not settle");
}

#[test]
fn background_generation_converges() {
    let mut config = config(1, GenerationMethod::Noise);
    config.worker_threads = 2;
    let mut manager = ChunkManager::new(&config, BlockAtlas::default()).unwrap();

    let total = run_until_settled(&mut manager, chunk_center(0, 0, 0));

    assert_eq!(total.loaded, 27);
    assert_eq!(live_set(&manager), required_set(Point3::new(0, 0, 0), 1, RequiredShape::Cube));
    assert!(manager.world().chunks().all(|chunk| !chunk.is_dirty()));
}

#[test]
fn background_results_for_abandoned_coordinates_are_discarded() {
    let mut config = config(0, GenerationMethod::Flat);
    config.worker_threads = 1;
    let mut manager = ChunkManager::new(&config, BlockAtlas::default()).unwrap();
    let mut renderer = RecordingRenderer::default();

    let first = manager.render_world(&mut renderer, chunk_center(0, 0, 0), Matrix4::identity());
    assert_eq!(first.pending, 1);

    let total = run_until_settled(&mut manager, chunk_center(10, 0, 0));

    assert_eq!(total.discarded, 1);
    assert!(!manager.is_live(Point3::new(0, 0, 0)));
    assert_eq!(manager.live_positions(), vec![Point3::new(10, 0, 0)]);
}

#[test]
fn fast_movement_keeps_background_work_bounded() {
    let mut config = config(2, GenerationMethod::Flat);
    config.worker_threads = 1;
    let mut manager = ChunkManager::new(&config, BlockAtlas::default()).unwrap();

    for step in 0..20 {
        let frame = manager.update(chunk_center(step * 10, 0, 0));
        assert!(frame.pending <= 1, "{} generations pending", frame.pending);
        assert!(manager.pending_count() <= manager.required().len());
    }

    run_until_settled(&mut manager, chunk_center(190, 0, 0));
    assert_eq!(live_set(&manager), required_set(Point3::new(190, 0, 0), 2, RequiredShape::Cube));
}

#[test]
fn background_mode_never_draws_unmeshed_chunks() {
    let mut config = config(1, GenerationMethod::Flat);
    config.worker_threads = 2;
    let mut manager = ChunkManager::new(&config, BlockAtlas::default()).unwrap();
    let mut renderer = RecordingRenderer::default();

    for _ in 0..2000 {
        let frame = manager.render_world(&mut renderer, chunk_center(0, 0, 0), Matrix4::identity());
        assert!(manager.world().chunks().all(|chunk| chunk.mesh_generation() > 0));
        assert_eq!(manager.world().dirty_count(), 0);
        if frame.pending == 0 && frame.live == 27 {
            return;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("streaming did not settle");
}
