//! Game state and core simulation types
//!
//! Layers and overhangs pair a visual box with a body in the physics world.
//! Everything here is reset wholesale on restart.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::overlap::Axis;
use super::physics::{BodyHandle, PhysicsWorld, RigidBody};
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Main menu; the tower builds itself in the background
    Menu,
    /// Player is stacking
    Playing,
    /// Game is paused
    Paused,
    /// Run ended on a miss
    GameOver,
    /// Reached the win height
    Won,
}

/// Things the frontend reacts to (sounds, DOM updates)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    Placed { perfect: bool, score: u32 },
    /// Active layer slid out of reach and was replaced
    AutoMiss,
    GameOver { score: u32 },
    Won { score: u32 },
}

/// Visual stand-in for a box mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMesh {
    pub position: Vec3,
    pub rotation: Quat,
    pub size: Vec3,
    /// Tower level the box came from (drives its color)
    pub color_index: u32,
}

/// A box in the scene: a tower layer or a falling overhang
#[derive(Debug, Clone)]
pub struct Slab {
    pub mesh: BoxMesh,
    pub body: BodyHandle,
    pub width: f32,
    pub depth: f32,
    pub axis: Axis,
}

/// One placed (or moving) segment of the tower
pub type Layer = Slab;
/// A trimmed-off piece that falls
pub type Overhang = Slab;

impl Slab {
    /// Extent along `axis`
    pub fn size_along(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.width,
            Axis::Z => self.depth,
        }
    }

    fn set_size_along(&mut self, axis: Axis, size: f32) {
        match axis {
            Axis::X => self.width = size,
            Axis::Z => self.depth = size,
        }
        self.mesh.size = Vec3::new(self.width, BOX_HEIGHT, self.depth);
    }

    /// Position along the slab's own movement axis
    pub fn offset(&self) -> f32 {
        self.axis.get(self.mesh.position)
    }
}

/// Camera focus that follows the tower
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    /// Height the camera looks at
    pub height: f32,
    /// Rotation around the tower (radians)
    pub orbit: f32,
    /// 1.0 = default framing, larger shows more
    pub zoom: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            height: 0.0,
            orbit: 0.0,
            zoom: 1.0,
        }
    }
}

impl CameraRig {
    /// Ease toward the framing for the current tower
    pub fn update(&mut self, layer_count: usize, phase: GamePhase, dt: f32) {
        let tower_height = layer_count as f32 * BOX_HEIGHT;

        let (target_height, target_zoom) = match phase {
            GamePhase::Won | GamePhase::GameOver => {
                // Pull back to show the whole tower
                (tower_height * 0.5, (tower_height / 8.0).max(1.0))
            }
            _ => ((layer_count as f32 - 2.0).max(0.0) * BOX_HEIGHT, 1.0),
        };

        if self.height < target_height {
            self.height = (self.height + CAMERA_RISE_SPEED * dt).min(target_height);
        } else {
            self.height += (target_height - self.height) * (dt * 2.0).min(1.0);
        }
        self.zoom += (target_zoom - self.zoom) * (dt * 2.0).min(1.0);

        if phase == GamePhase::Won {
            self.orbit = (self.orbit + CAMERA_ORBIT_SPEED * dt) % std::f32::consts::TAU;
        }
    }
}

/// Ticks the demo tower stays collapsed before rebuilding
pub const DEMO_RESTART_TICKS: u32 = 2 * SIM_HZ;

/// Complete game state for a run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub score: u32,
    /// Tower layers, foundation first; the last one moves while playing
    pub stack: Vec<Layer>,
    /// Falling pieces; only grows until reset
    pub overhangs: Vec<Overhang>,
    pub world: PhysicsWorld,
    pub camera: CameraRig,
    /// Starting hue for the tower palette (degrees)
    pub hue_offset: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Ticks spent in the current phase
    pub phase_ticks: u32,
    /// Pending events for the frontend
    pub events: Vec<GameEvent>,
    /// Countdown before the menu demo rebuilds its tower
    pub demo_restart_ticks: Option<u32>,
    /// Where the autopilot will drop the current layer (delta from perfect)
    pub autopilot_target: f32,
    rng: Pcg32,
}

impl GameState {
    /// Create a new game state showing the menu demo
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut state = Self {
            seed,
            tuning,
            phase: GamePhase::Menu,
            score: 0,
            stack: Vec::new(),
            overhangs: Vec::new(),
            world: PhysicsWorld::new(Vec3::new(0.0, GRAVITY, 0.0)).with_ground(-BOX_HEIGHT / 2.0),
            camera: CameraRig::default(),
            hue_offset: 0.0,
            time_ticks: 0,
            phase_ticks: 0,
            events: Vec::new(),
            demo_restart_ticks: None,
            autopilot_target: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        };
        state.reset(seed, GamePhase::Menu);
        state
    }

    /// Throw away the tower and start over in `phase`
    pub fn reset(&mut self, seed: u64, phase: GamePhase) {
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.score = 0;
        self.stack.clear();
        self.overhangs.clear();
        self.world.clear();
        self.camera = CameraRig::default();
        self.time_ticks = 0;
        self.events.clear();
        self.demo_restart_ticks = None;
        self.hue_offset = self.rng.random_range(0.0..360.0);
        self.set_phase(phase);

        let size = self.tuning.box_size;
        // Foundation
        self.add_layer(0.0, 0.0, size, size, Axis::Z);
        // First moving layer
        self.add_layer(-START_OFFSET, 0.0, size, size, Axis::X);

        if phase == GamePhase::Playing {
            self.events.push(GameEvent::Started);
        }
    }

    /// Enter `phase`, resetting the phase timer
    pub fn set_phase(&mut self, phase: GamePhase) {
        self.phase = phase;
        self.phase_ticks = 0;
    }

    /// Spawn a layer on top of the stack
    pub fn add_layer(&mut self, x: f32, z: f32, width: f32, depth: f32, axis: Axis) {
        let level = self.stack.len() as u32;
        let position = Vec3::new(x, level as f32 * BOX_HEIGHT, z);
        let layer = self.make_slab(position, width, depth, axis, level, 0.0);
        self.stack.push(layer);
        self.roll_autopilot_target();
    }

    /// Spawn a falling piece
    pub fn add_overhang(
        &mut self,
        position: Vec3,
        width: f32,
        depth: f32,
        axis: Axis,
        color_index: u32,
        drift: f32,
    ) {
        let mass = self.overhang_mass(width, depth);
        let overhang = self.make_slab(position, width, depth, axis, color_index, mass);
        self.world
            .make_dynamic(overhang.body, mass, tumble(axis, drift));
        self.overhangs.push(overhang);
    }

    /// Move a layer into the overhang list and let it fall
    pub fn drop_layer(&mut self, layer: Layer, drift: f32) {
        let mass = self.overhang_mass(layer.width, layer.depth);
        self.world
            .make_dynamic(layer.body, mass, tumble(layer.axis, drift));
        self.overhangs.push(layer);
    }

    fn overhang_mass(&self, width: f32, depth: f32) -> f32 {
        let base = self.tuning.box_size;
        OVERHANG_BASE_MASS * (width / base) * (depth / base)
    }

    fn make_slab(
        &mut self,
        position: Vec3,
        width: f32,
        depth: f32,
        axis: Axis,
        color_index: u32,
        mass: f32,
    ) -> Slab {
        let size = Vec3::new(width, BOX_HEIGHT, depth);
        let body = if mass > 0.0 {
            RigidBody::dynamic(position, size, mass)
        } else {
            RigidBody::fixed(position, size)
        };
        let body = self.world.add_body(body);
        Slab {
            mesh: BoxMesh {
                position,
                rotation: Quat::IDENTITY,
                size,
                color_index,
            },
            body,
            width,
            depth,
            axis,
        }
    }

    /// Trim the top layer to `size` along `axis`, centered at `center`
    pub fn cut_top_layer(&mut self, axis: Axis, center: f32, size: f32) {
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        top.set_size_along(axis, size);
        axis.set(&mut top.mesh.position, center);

        let (body, position, mesh_size) = (top.body, top.mesh.position, top.mesh.size);
        self.world.set_shape(body, mesh_size);
        self.world.set_position(body, position);
    }

    /// Slide the top layer along its axis
    pub fn move_top_layer(&mut self, distance: f32) {
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        let axis = top.axis;
        let offset = axis.get(top.mesh.position) + distance;
        axis.set(&mut top.mesh.position, offset);

        let (body, position) = (top.body, top.mesh.position);
        self.world.set_position(body, position);
    }

    /// Moving layer and the one it will land on
    pub fn top_pair(&self) -> Option<(&Layer, &Layer)> {
        match self.stack.as_slice() {
            [.., prev, top] => Some((top, prev)),
            _ => None,
        }
    }

    /// Copy body transforms onto their meshes
    pub fn sync_visuals(&mut self) {
        let world = &self.world;
        for slab in self.stack.iter_mut().chain(self.overhangs.iter_mut()) {
            if let Some(body) = world.body(slab.body) {
                slab.mesh.position = body.position;
                slab.mesh.rotation = body.rotation;
            }
        }
    }

    /// Score to show the player; the menu demo's placements don't count
    pub fn display_score(&self) -> u32 {
        match self.phase {
            GamePhase::Menu => 0,
            _ => self.score,
        }
    }

    /// All boxes to draw
    pub fn meshes(&self) -> impl Iterator<Item = &BoxMesh> {
        self.stack
            .iter()
            .chain(self.overhangs.iter())
            .map(|slab| &slab.mesh)
    }

    /// Pick a new placement error for the autopilot
    pub fn roll_autopilot_target(&mut self) {
        let spread = self.tuning.autopilot_precision;
        self.autopilot_target = if spread > 0.0 {
            self.rng.random_range(-0.5..0.5) * spread
        } else {
            0.0
        };
    }

    /// Draw a seed for the next run
    pub fn next_seed(&mut self) -> u64 {
        self.rng.random()
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Spin that tips a falling piece away from the tower
fn tumble(axis: Axis, drift: f32) -> Vec3 {
    const TUMBLE_SPEED: f32 = 1.5;
    let s = crate::sign(drift);
    match axis {
        Axis::X => Vec3::Z * (-s * TUMBLE_SPEED),
        Axis::Z => Vec3::X * (s * TUMBLE_SPEED),
    }
}
