use super::camera::{CameraRig, IgnoreTarget};
use super::display::DisplayList;
use super::events::EventArg;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub scale: f32,
    pub flip_x: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: 1.0,
            flip_x: false,
        }
    }
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableKind {
    Placeholder { color: [u8; 4] },
    Sprite { key: String, frame: u32 },
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub debug_name: &'static str,
}

impl RenderableDesc {
    pub fn sprite(key: &str, debug_name: &'static str) -> Self {
        Self {
            kind: RenderableKind::Sprite {
                key: key.to_string(),
                frame: 0,
            },
            debug_name,
        }
    }

    pub fn placeholder(color: [u8; 4], debug_name: &'static str) -> Self {
        Self {
            kind: RenderableKind::Placeholder { color },
            debug_name,
        }
    }
}

/// Axis-aligned arcade body centred on the entity position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub half_size: Vec2,
    pub velocity: Vec2,
    pub allow_gravity: bool,
    touching: bool,
    was_touching: bool,
    on_ground: bool,
}

impl Body {
    pub fn new(half_size: Vec2) -> Self {
        Self {
            half_size,
            velocity: Vec2::ZERO,
            allow_gravity: true,
            touching: false,
            was_touching: false,
            on_ground: false,
        }
    }

    pub fn without_gravity(mut self) -> Self {
        self.allow_gravity = false;
        self
    }

    pub fn set_velocity_x(&mut self, x: f32) {
        self.velocity.x = x;
    }

    pub fn set_velocity_y(&mut self, y: f32) {
        self.velocity.y = y;
    }

    /// Overlapping any registered partner after the latest physics step.
    pub fn is_touching(&self) -> bool {
        self.touching
    }

    /// Touching state from the step before the latest one.
    pub fn was_touching(&self) -> bool {
        self.was_touching
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    #[cfg(test)]
    pub(crate) fn with_contact(mut self, touching: bool, was_touching: bool) -> Self {
        self.touching = touching;
        self.was_touching = was_touching;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub renderable: RenderableDesc,
    pub body: Option<Body>,
    pub tag: Option<&'static str>,
    pub visible: bool,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBounds {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    overlap_pairs: Vec<(EntityId, EntityId)>,
    gravity_y: f32,
    physics_bounds: Option<PhysicsBounds>,
    display: DisplayList,
    cameras: CameraRig,
    ready_signal: Option<Vec<EventArg>>,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new((800, 600))
    }
}

impl SceneWorld {
    pub fn new(viewport: (u32, u32)) -> Self {
        Self {
            allocator: EntityIdAllocator::default(),
            entities: Vec::new(),
            pending_spawns: Vec::new(),
            pending_despawns: Vec::new(),
            next_applied_spawn_order: 0,
            overlap_pairs: Vec::new(),
            gravity_y: 0.0,
            physics_bounds: None,
            display: DisplayList::default(),
            cameras: CameraRig::new(viewport),
            ready_signal: None,
        }
    }

    pub fn spawn(&mut self, transform: Transform, renderable: RenderableDesc) -> EntityId {
        self.spawn_internal(transform, renderable, None, None)
    }

    pub fn spawn_body(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        body: Body,
    ) -> EntityId {
        self.spawn_internal(transform, renderable, Some(body), None)
    }

    pub fn spawn_tagged(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        tag: &'static str,
    ) -> EntityId {
        self.spawn_internal(transform, renderable, None, Some(tag))
    }

    pub fn spawn_tagged_body(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        body: Body,
        tag: &'static str,
    ) -> EntityId {
        self.spawn_internal(transform, renderable, Some(body), Some(tag))
    }

    fn spawn_internal(
        &mut self,
        transform: Transform,
        renderable: RenderableDesc,
        body: Option<Body>,
        tag: Option<&'static str>,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            renderable,
            body,
            tag,
            visible: true,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_spawns.is_empty() {
            for mut entity in self.pending_spawns.drain(..) {
                entity.applied_spawn_order = self.next_applied_spawn_order;
                self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
                self.entities.push(entity);
            }
        }

        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_unstable();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.overlap_pairs.retain(|(a, b)| {
                pending.binary_search(a).is_err() && pending.binary_search(b).is_err()
            });
            self.pending_despawns.clear();
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
        self.overlap_pairs.clear();
        self.physics_bounds = None;
        self.gravity_y = 0.0;
        self.display.clear();
        self.cameras.reset();
        self.ready_signal = None;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.find_entity(id).map(|entity| entity.transform.position)
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.find_entity(id).and_then(|entity| entity.body.as_ref())
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.find_entity_mut(id)
            .and_then(|entity| entity.body.as_mut())
    }

    pub fn set_gravity(&mut self, gravity_y: f32) {
        self.gravity_y = gravity_y;
    }

    /// Bodies are kept inside `[0, width]` horizontally and land on `height`.
    pub fn set_physics_bounds(&mut self, width: f32, height: f32) {
        self.physics_bounds = Some(PhysicsBounds { width, height });
    }

    pub fn physics_bounds(&self) -> Option<PhysicsBounds> {
        self.physics_bounds
    }

    pub fn add_overlap(&mut self, a: EntityId, b: EntityId) {
        if a == b || self.overlap_pairs.contains(&(a, b)) || self.overlap_pairs.contains(&(b, a))
        {
            return;
        }
        self.overlap_pairs.push((a, b));
    }

    pub fn bodies_overlap(&self, a: EntityId, b: EntityId) -> bool {
        let (Some(first), Some(second)) = (self.find_entity(a), self.find_entity(b)) else {
            return false;
        };
        match (first.body, second.body) {
            (Some(first_body), Some(second_body)) => aabb_overlap(
                first.transform.position,
                first_body.half_size,
                second.transform.position,
                second_body.half_size,
            ),
            _ => false,
        }
    }

    pub fn step_physics(&mut self, fixed_dt_seconds: f32) {
        let gravity_y = self.gravity_y;
        let bounds = self.physics_bounds;
        for entity in &mut self.entities {
            let Some(body) = entity.body.as_mut() else {
                continue;
            };
            body.was_touching = body.touching;
            body.touching = false;
            if body.allow_gravity {
                body.velocity.y += gravity_y * fixed_dt_seconds;
            }
            let position = &mut entity.transform.position;
            position.x += body.velocity.x * fixed_dt_seconds;
            position.y += body.velocity.y * fixed_dt_seconds;

            body.on_ground = false;
            if let Some(bounds) = bounds {
                let min_x = body.half_size.x;
                let max_x = (bounds.width - body.half_size.x).max(min_x);
                position.x = position.x.clamp(min_x, max_x);
                let floor_y = bounds.height - body.half_size.y;
                if position.y >= floor_y {
                    position.y = floor_y;
                    if body.velocity.y > 0.0 {
                        body.velocity.y = 0.0;
                    }
                    body.on_ground = true;
                }
            }
        }

        for index in 0..self.overlap_pairs.len() {
            let (a, b) = self.overlap_pairs[index];
            if !self.bodies_overlap(a, b) {
                continue;
            }
            for id in [a, b] {
                if let Some(body) = self.body_mut(id) {
                    body.touching = true;
                }
            }
        }
    }

    pub fn display(&self) -> &DisplayList {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayList {
        &mut self.display
    }

    pub fn cameras(&self) -> &CameraRig {
        &self.cameras
    }

    pub fn cameras_mut(&mut self) -> &mut CameraRig {
        &mut self.cameras
    }

    /// Advances camera pans and re-centres following cameras.
    pub fn update_cameras(&mut self, fixed_dt_seconds: f32) {
        let entities = &self.entities;
        self.cameras.update(fixed_dt_seconds, |id| {
            entities
                .iter()
                .find(|entity| entity.id == id)
                .map(|entity| entity.transform.position)
        });
    }

    /// Drops camera ignores of display objects that have been destroyed.
    /// Returns how many entries were removed.
    pub fn prune_camera_ignores(&mut self) -> usize {
        let display = &self.display;
        self.cameras.retain_ignored(|target| match target {
            IgnoreTarget::Display(id) => display.contains(*id),
            _ => true,
        })
    }

    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        self.cameras.resize_main(width, height);
    }

    pub fn is_ready(&self) -> bool {
        self.ready_signal.is_some()
    }

    /// Arguments published with the scene's readiness signal, once ready.
    pub fn ready_signal(&self) -> Option<&[EventArg]> {
        self.ready_signal.as_deref()
    }

    pub(crate) fn set_ready_signal(&mut self, args: Vec<EventArg>) {
        self.ready_signal = Some(args);
    }
}

fn aabb_overlap(a: Vec2, a_half: Vec2, b: Vec2, b_half: Vec2) -> bool {
    (a.x - b.x).abs() < a_half.x + b_half.x && (a.y - b.y).abs() < a_half.y + b_half.y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_box(world: &mut SceneWorld, x: f32, y: f32, gravity: bool) -> EntityId {
        let body = Body::new(Vec2::new(10.0, 10.0));
        let body = if gravity { body } else { body.without_gravity() };
        world.spawn_body(
            Transform::at(Vec2::new(x, y)),
            RenderableDesc::placeholder([255, 255, 255, 255], "box"),
            body,
        )
    }

    #[test]
    fn spawns_and_despawns_apply_at_boundary() {
        let mut world = SceneWorld::default();
        let id = spawn_box(&mut world, 0.0, 0.0, false);
        assert_eq!(world.entity_count(), 0);
        world.apply_pending();
        assert_eq!(world.entity_count(), 1);

        assert!(world.despawn(id));
        assert_eq!(world.entity_count(), 1);
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
        assert!(!world.despawn(id));
    }

    #[test]
    fn touching_flags_shift_each_step() {
        let mut world = SceneWorld::default();
        let a = spawn_box(&mut world, 0.0, 0.0, false);
        let b = spawn_box(&mut world, 5.0, 0.0, false);
        world.apply_pending();
        world.add_overlap(a, b);

        world.step_physics(0.016);
        let body = world.body(a).expect("body");
        assert!(body.is_touching());
        assert!(!body.was_touching());

        world.find_entity_mut(b).expect("b").transform.position.x = 100.0;
        world.step_physics(0.016);
        let body = world.body(a).expect("body");
        assert!(!body.is_touching());
        assert!(body.was_touching());

        world.step_physics(0.016);
        let body = world.body(a).expect("body");
        assert!(!body.is_touching());
        assert!(!body.was_touching());
    }

    #[test]
    fn gravity_lands_bodies_on_bounds_floor() {
        let mut world = SceneWorld::default();
        world.set_gravity(1000.0);
        world.set_physics_bounds(500.0, 200.0);
        let falling = spawn_box(&mut world, 50.0, 0.0, true);
        let floating = spawn_box(&mut world, 80.0, 0.0, false);
        world.apply_pending();

        for _ in 0..120 {
            world.step_physics(1.0 / 60.0);
        }

        let falling_entity = world.find_entity(falling).expect("falling");
        assert!((falling_entity.transform.position.y - 190.0).abs() < 0.001);
        assert!(falling_entity.body.expect("body").on_ground());
        assert_eq!(world.position(floating), Some(Vec2::new(80.0, 0.0)));
    }

    #[test]
    fn bounds_clamp_horizontal_motion() {
        let mut world = SceneWorld::default();
        world.set_physics_bounds(100.0, 100.0);
        let id = spawn_box(&mut world, 50.0, 50.0, false);
        world.apply_pending();
        world.body_mut(id).expect("body").set_velocity_x(-10_000.0);
        world.step_physics(1.0);
        assert_eq!(world.position(id).map(|p| p.x), Some(10.0));
    }

    #[test]
    fn despawn_drops_overlap_pairs() {
        let mut world = SceneWorld::default();
        let a = spawn_box(&mut world, 0.0, 0.0, false);
        let b = spawn_box(&mut world, 0.0, 0.0, false);
        world.apply_pending();
        world.add_overlap(a, b);
        world.add_overlap(b, a);
        world.despawn(b);
        world.apply_pending();
        world.step_physics(0.016);
        assert!(!world.body(a).expect("body").is_touching());
    }

    #[test]
    fn ready_signal_survives_until_clear() {
        let mut world = SceneWorld::default();
        assert!(!world.is_ready());
        world.set_ready_signal(vec![EventArg::Int(7)]);
        assert_eq!(world.ready_signal(), Some(&[EventArg::Int(7)][..]));
        world.clear();
        assert!(!world.is_ready());
    }

    #[test]
    fn pruning_forgets_destroyed_display_objects_only() {
        let mut world = SceneWorld::default();
        let kept = world.display_mut().add_image(0.0, 0.0, "textBox");
        let gone = world.display_mut().add_image(0.0, 0.0, "interact");
        world
            .cameras_mut()
            .main_mut()
            .ignore(IgnoreTarget::Display(kept))
            .ignore(IgnoreTarget::Display(gone))
            .ignore(IgnoreTarget::Tag("below_layer"));
        world.display_mut().destroy(gone);

        assert_eq!(world.prune_camera_ignores(), 1);
        let main = world.cameras().main();
        assert!(main.is_ignored(IgnoreTarget::Display(kept)));
        assert!(!main.is_ignored(IgnoreTarget::Display(gone)));
        assert!(main.is_ignored(IgnoreTarget::Tag("below_layer")));
        assert_eq!(world.prune_camera_ignores(), 0);
    }
}
