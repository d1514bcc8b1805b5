//! Minimal rigid-body world for falling boxes
//!
//! Collision is axis-aligned box vs axis-aligned box. Dynamic bodies carry a
//! cosmetic rotation so cut pieces tumble, but their collision shape stays
//! axis-aligned. Static bodies (mass 0) are only moved by explicit calls.
//!
//! Dynamic bodies collide with static bodies and the optional ground plane
//! only; falling pieces pass through each other.

use glam::{Quat, Vec3};

use crate::consts::KILL_PLANE_Y;

/// Penetration below this is treated as touching, not colliding
const CONTACT_SLOP: f32 = 1e-4;
/// Horizontal velocity kept per resting contact
const CONTACT_FRICTION: f32 = 0.85;
/// Fraction of vertical speed kept after landing
const RESTITUTION: f32 = 0.1;
/// Angular velocity kept per resting contact
const ANGULAR_DAMPING: f32 = 0.8;

/// Stable index of a body in a [`PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(u32);

impl BodyHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Overlap depth on each axis (negative or zero when separated)
    fn overlap_depths(&self, other: &Aabb) -> Vec3 {
        self.max.min(other.max) - self.min.max(other.min)
    }

    /// True when the boxes share volume (touching faces do not count)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.overlap_depths(other).min_element() > CONTACT_SLOP
    }

    /// Minimum translation that pushes `self` out of `other`, if they intersect
    pub fn separation(&self, other: &Aabb) -> Option<Vec3> {
        if !self.intersects(other) {
            return None;
        }
        let depth = self.overlap_depths(other);

        let away = self.center() - other.center();
        let push = |d: f32, dir: f32| if dir >= 0.0 { d } else { -d };

        let mtv = if depth.y <= depth.x && depth.y <= depth.z {
            Vec3::new(0.0, push(depth.y, away.y), 0.0)
        } else if depth.x <= depth.z {
            Vec3::new(push(depth.x, away.x), 0.0, 0.0)
        } else {
            Vec3::new(0.0, 0.0, push(depth.z, away.z))
        };
        Some(mtv)
    }
}

/// A box-shaped rigid body
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    pub angular_velocity: Vec3,
    pub half_extents: Vec3,
    /// 0 = static
    pub mass: f32,
    /// Asleep bodies are skipped by the integrator
    pub sleeping: bool,
}

impl RigidBody {
    /// An immovable box
    pub fn fixed(position: Vec3, size: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            half_extents: size * 0.5,
            mass: 0.0,
            sleeping: false,
        }
    }

    /// A box that falls under gravity
    pub fn dynamic(position: Vec3, size: Vec3, mass: f32) -> Self {
        Self {
            mass: mass.max(f32::EPSILON),
            ..Self::fixed(position, size)
        }
    }

    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }

    pub fn size(&self) -> Vec3 {
        self.half_extents * 2.0
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }
}

/// Container and integrator for all bodies in a run
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    pub gravity: Vec3,
    /// Height of an infinite floor, if any
    pub ground: Option<f32>,
    bodies: Vec<RigidBody>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            ground: None,
            bodies: Vec::new(),
        }
    }

    /// Add a floor at height `y`
    pub fn with_ground(mut self, y: f32) -> Self {
        self.ground = Some(y);
        self
    }

    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(body);
        handle
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.index())
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.index())
    }

    /// Replace the collision shape of a body (keeps its position)
    pub fn set_shape(&mut self, handle: BodyHandle, size: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.half_extents = size * 0.5;
            body.sleeping = false;
        }
    }

    pub fn set_position(&mut self, handle: BodyHandle, position: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.position = position;
            body.sleeping = false;
        }
    }

    /// Turn a body into a falling one
    pub fn make_dynamic(&mut self, handle: BodyHandle, mass: f32, angular_velocity: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.mass = mass.max(f32::EPSILON);
            body.angular_velocity = angular_velocity;
            body.sleeping = false;
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    /// Advance every awake dynamic body by `dt`
    pub fn step(&mut self, dt: f32) {
        let statics: Vec<Aabb> = self
            .bodies
            .iter()
            .filter(|b| b.is_static())
            .map(RigidBody::aabb)
            .collect();

        for body in self.bodies.iter_mut() {
            if body.is_static() || body.sleeping {
                continue;
            }

            let was_above_ground = self
                .ground
                .map(|y| body.aabb().min.y >= y - CONTACT_SLOP);

            body.velocity += self.gravity * dt;
            body.position += body.velocity * dt;

            let spin = body.angular_velocity * dt;
            if spin != Vec3::ZERO {
                body.rotation = (Quat::from_scaled_axis(spin) * body.rotation).normalize();
            }

            for other in &statics {
                let Some(mtv) = body.aabb().separation(other) else {
                    continue;
                };
                body.position += mtv;

                if mtv.y > 0.0 {
                    land(body);
                } else if mtv.y < 0.0 {
                    body.velocity.y = body.velocity.y.min(0.0);
                } else if mtv.x != 0.0 {
                    body.velocity.x = 0.0;
                } else {
                    body.velocity.z = 0.0;
                }
            }

            // Bodies that start below the floor keep falling
            if let (Some(floor), Some(true)) = (self.ground, was_above_ground) {
                let bottom = body.aabb().min.y;
                if bottom < floor {
                    body.position.y += floor - bottom;
                    land(body);
                }
            }

            if body.position.y < KILL_PLANE_Y {
                body.sleeping = true;
                body.velocity = Vec3::ZERO;
                body.angular_velocity = Vec3::ZERO;
            }
        }
    }
}

/// Contact response for a body coming to rest on a surface below it
fn land(body: &mut RigidBody) {
    body.velocity.y = -body.velocity.y * RESTITUTION;
    body.velocity.x *= CONTACT_FRICTION;
    body.velocity.z *= CONTACT_FRICTION;
    body.angular_velocity *= ANGULAR_DAMPING;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{GRAVITY, SIM_DT};
    use proptest::prelude::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(Vec3::new(0.0, GRAVITY, 0.0))
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut world = world();
        let h = world.add_body(RigidBody::dynamic(Vec3::new(0.0, 5.0, 0.0), Vec3::ONE, 1.0));
        for _ in 0..60 {
            world.step(SIM_DT);
        }
        let body = world.body(h).unwrap();
        assert!(body.position.y < 5.0);
        assert!(body.velocity.y < 0.0);
    }

    #[test]
    fn test_dynamic_body_rests_on_static() {
        let mut world = world();
        world.add_body(RigidBody::fixed(Vec3::ZERO, Vec3::new(3.0, 1.0, 3.0)));
        let h = world.add_body(RigidBody::dynamic(Vec3::new(0.0, 3.0, 0.0), Vec3::ONE, 1.0));

        for _ in 0..(5.0 / SIM_DT) as usize {
            world.step(SIM_DT);
        }

        let body = world.body(h).unwrap();
        // Top of the platform is y=0.5, box half height is 0.5
        assert!((body.position.y - 1.0).abs() < 0.05, "y = {}", body.position.y);
        assert!(body.velocity.y.abs() < 0.5);
    }

    #[test]
    fn test_dynamic_body_rests_on_ground() {
        let mut world = world().with_ground(-0.5);
        let h = world.add_body(RigidBody::dynamic(Vec3::new(4.0, 3.0, 0.0), Vec3::ONE, 1.0));

        for _ in 0..(5.0 / SIM_DT) as usize {
            world.step(SIM_DT);
        }

        let body = world.body(h).unwrap();
        assert!((body.position.y - 0.0).abs() < 0.05, "y = {}", body.position.y);
        assert!(!body.sleeping);
    }

    #[test]
    fn test_body_below_ground_keeps_falling() {
        let mut world = world().with_ground(-0.5);
        let h = world.add_body(RigidBody::dynamic(Vec3::new(0.0, -3.0, 0.0), Vec3::ONE, 1.0));
        for _ in 0..30 {
            world.step(SIM_DT);
        }
        assert!(world.body(h).unwrap().position.y < -3.0);
    }

    #[test]
    fn test_touching_boxes_do_not_collide() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5));
        let b = Aabb::from_center(Vec3::new(1.0, 0.0, 0.0), Vec3::splat(0.5));
        assert!(!a.intersects(&b));
        assert!(a.separation(&b).is_none());
    }

    #[test]
    fn test_separation_picks_shallowest_axis() {
        let a = Aabb::from_center(Vec3::new(0.0, 0.9, 0.0), Vec3::splat(0.5));
        let b = Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5));
        let mtv = a.separation(&b).unwrap();
        assert!(mtv.x == 0.0 && mtv.z == 0.0);
        assert!((mtv.y - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_shape_replacement_changes_aabb() {
        let mut world = world();
        let h = world.add_body(RigidBody::fixed(Vec3::ZERO, Vec3::new(3.0, 1.0, 3.0)));
        world.set_shape(h, Vec3::new(1.5, 1.0, 3.0));
        let aabb = world.body(h).unwrap().aabb();
        assert!((aabb.max.x - 0.75).abs() < 1e-6);
        assert!((aabb.max.z - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_kill_plane_puts_body_to_sleep() {
        let mut world = world();
        let h = world.add_body(RigidBody::dynamic(
            Vec3::new(0.0, KILL_PLANE_Y + 0.01, 0.0),
            Vec3::ONE,
            1.0,
        ));
        for _ in 0..10 {
            world.step(SIM_DT);
        }
        let body = world.body(h).unwrap();
        assert!(body.sleeping);
        let y = body.position.y;
        world.step(SIM_DT);
        assert_eq!(world.body(h).unwrap().position.y, y);
    }

    #[test]
    fn test_make_dynamic_releases_static_body() {
        let mut world = world();
        let h = world.add_body(RigidBody::fixed(Vec3::new(0.0, 10.0, 0.0), Vec3::ONE));
        world.step(SIM_DT);
        assert_eq!(world.body(h).unwrap().position.y, 10.0);

        world.make_dynamic(h, 2.0, Vec3::Z);
        world.step(SIM_DT);
        let body = world.body(h).unwrap();
        assert!(body.position.y < 10.0);
        assert!(body.rotation != Quat::IDENTITY);
    }

    proptest! {
        #[test]
        fn prop_static_bodies_never_move(
            x in -5.0f32..5.0,
            z in -5.0f32..5.0,
            drop_height in 1.5f32..10.0,
            steps in 1usize..240,
        ) {
            let mut world = world();
            let base = world.add_body(RigidBody::fixed(Vec3::ZERO, Vec3::new(3.0, 1.0, 3.0)));
            world.add_body(RigidBody::dynamic(Vec3::new(x, drop_height, z), Vec3::ONE, 1.0));
            for _ in 0..steps {
                world.step(SIM_DT);
            }
            prop_assert_eq!(world.body(base).unwrap().position, Vec3::ZERO);
        }
    }
}
