//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod overlap;
pub mod physics;
pub mod state;
pub mod tick;

pub use overlap::{Axis, CutOutcome, Segment, cut, overlap};
pub use physics::{Aabb, BodyHandle, PhysicsWorld, RigidBody};
pub use state::{
    BoxMesh, CameraRig, GameEvent, GamePhase, GameState, Layer, Overhang, Slab,
    DEMO_RESTART_TICKS,
};
pub use tick::{TickInput, place_layer, tick};
