use std::collections::HashSet;

use super::display::{DisplayId, Rect};
use super::world::{EntityId, Vec2};

pub const MIN_CAMERA_ZOOM: f32 = 0.05;
pub const MAX_CAMERA_ZOOM: f32 = 20.0;
const DEFAULT_CAMERA_ZOOM: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub u32);

/// Screen-space circle; anything the camera draws outside it is discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleMask {
    pub center: Vec2,
    pub radius: f32,
}

impl CircleMask {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let dx = x - self.center.x;
        let dy = y - self.center.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreTarget {
    Entity(EntityId),
    Display(DisplayId),
    Tag(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanTween {
    from: Vec2,
    to: Vec2,
    elapsed: f32,
    duration: f32,
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub id: CameraId,
    pub name: Option<String>,
    pub viewport: Rect,
    /// World position drawn at the viewport's top-left when zoom is 1.
    pub scroll: Vec2,
    zoom: f32,
    bounds: Option<Rect>,
    follow: Option<EntityId>,
    pan: Option<PanTween>,
    mask: Option<CircleMask>,
    ignored: HashSet<IgnoreTarget>,
    background: Option<[u8; 4]>,
}

pub(crate) fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() || zoom <= 0.0 {
        return DEFAULT_CAMERA_ZOOM;
    }
    zoom.clamp(MIN_CAMERA_ZOOM, MAX_CAMERA_ZOOM)
}

pub fn color_from_hex(color: u32) -> [u8; 4] {
    [
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
        255,
    ]
}

impl Camera {
    fn new(id: CameraId, viewport: Rect) -> Self {
        Self {
            id,
            name: None,
            viewport,
            scroll: Vec2::ZERO,
            zoom: DEFAULT_CAMERA_ZOOM,
            bounds: None,
            follow: None,
            pan: None,
            mask: None,
            ignored: HashSet::new(),
            background: None,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) -> &mut Self {
        self.zoom = clamp_camera_zoom(zoom);
        self
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn set_bounds(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.bounds = Some(Rect::new(x, y, width, height));
        self.clamp_scroll_to_bounds();
        self
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn set_background_color(&mut self, color: u32) -> &mut Self {
        self.background = Some(color_from_hex(color));
        self
    }

    pub fn background(&self) -> Option<[u8; 4]> {
        self.background
    }

    pub fn set_mask(&mut self, mask: CircleMask) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn mask(&self) -> Option<CircleMask> {
        self.mask
    }

    pub fn ignore(&mut self, target: IgnoreTarget) -> &mut Self {
        self.ignored.insert(target);
        self
    }

    pub(crate) fn retain_ignored(&mut self, keep: impl Fn(&IgnoreTarget) -> bool) -> usize {
        let before = self.ignored.len();
        self.ignored.retain(keep);
        before - self.ignored.len()
    }

    pub fn is_ignored(&self, target: IgnoreTarget) -> bool {
        self.ignored.contains(&target)
    }

    pub fn ignores_entity(&self, id: EntityId, tag: Option<&'static str>) -> bool {
        self.is_ignored(IgnoreTarget::Entity(id))
            || tag.is_some_and(|tag| self.is_ignored(IgnoreTarget::Tag(tag)))
    }

    pub fn start_follow(&mut self, target: EntityId) -> &mut Self {
        self.follow = Some(target);
        self
    }

    pub fn stop_follow(&mut self) -> &mut Self {
        self.follow = None;
        self
    }

    pub fn follow_target(&self) -> Option<EntityId> {
        self.follow
    }

    /// World point at the centre of the viewport.
    pub fn mid_point(&self) -> Vec2 {
        Vec2::new(
            self.scroll.x + self.viewport.width * 0.5,
            self.scroll.y + self.viewport.height * 0.5,
        )
    }

    pub fn center_on(&mut self, x: f32, y: f32) -> &mut Self {
        self.scroll = Vec2::new(
            x - self.viewport.width * 0.5,
            y - self.viewport.height * 0.5,
        );
        self.clamp_scroll_to_bounds();
        self
    }

    /// Linearly moves the mid point to `(x, y)` over `duration_ms`.
    pub fn pan(&mut self, x: f32, y: f32, duration_ms: u64) -> &mut Self {
        let duration = duration_ms as f32 / 1000.0;
        if duration <= 0.0 {
            self.pan = None;
            return self.center_on(x, y);
        }
        self.pan = Some(PanTween {
            from: self.mid_point(),
            to: Vec2::new(x, y),
            elapsed: 0.0,
            duration,
        });
        self
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    pub(crate) fn update(&mut self, dt_seconds: f32, follow_position: Option<Vec2>) {
        if let Some(mut tween) = self.pan {
            tween.elapsed = (tween.elapsed + dt_seconds).min(tween.duration);
            let t = tween.elapsed / tween.duration;
            let x = tween.from.x + (tween.to.x - tween.from.x) * t;
            let y = tween.from.y + (tween.to.y - tween.from.y) * t;
            self.center_on(x, y);
            self.pan = (tween.elapsed < tween.duration).then_some(tween);
            return;
        }
        if let Some(position) = follow_position {
            self.center_on(position.x, position.y);
        }
    }

    fn clamp_scroll_to_bounds(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let visible_w = self.viewport.width / self.zoom;
        let visible_h = self.viewport.height / self.zoom;
        let mid = self.mid_point();
        let mid_x = clamp_axis(mid.x, bounds.x, bounds.width, visible_w);
        let mid_y = clamp_axis(mid.y, bounds.y, bounds.height, visible_h);
        self.scroll = Vec2::new(
            mid_x - self.viewport.width * 0.5,
            mid_y - self.viewport.height * 0.5,
        );
    }

    pub fn world_to_screen(&self, world: Vec2, scroll_factor: f32) -> Vec2 {
        let half_w = self.viewport.width * 0.5;
        let half_h = self.viewport.height * 0.5;
        Vec2::new(
            self.viewport.x + half_w + (world.x - self.scroll.x * scroll_factor - half_w) * self.zoom,
            self.viewport.y + half_h + (world.y - self.scroll.y * scroll_factor - half_h) * self.zoom,
        )
    }

    pub fn screen_to_world(&self, screen: Vec2, scroll_factor: f32) -> Vec2 {
        let half_w = self.viewport.width * 0.5;
        let half_h = self.viewport.height * 0.5;
        Vec2::new(
            (screen.x - self.viewport.x - half_w) / self.zoom + half_w + self.scroll.x * scroll_factor,
            (screen.y - self.viewport.y - half_h) / self.zoom + half_h + self.scroll.y * scroll_factor,
        )
    }
}

fn clamp_axis(mid: f32, start: f32, extent: f32, visible: f32) -> f32 {
    if extent <= visible {
        return start + extent * 0.5;
    }
    mid.clamp(start + visible * 0.5, start + extent - visible * 0.5)
}

/// Cameras of one scene. The main camera always exists and covers the window.
#[derive(Debug, Clone)]
pub struct CameraRig {
    cameras: Vec<Camera>,
    next_id: u32,
}

impl CameraRig {
    pub const MAIN: CameraId = CameraId(0);

    pub fn new(viewport: (u32, u32)) -> Self {
        let main = Camera::new(
            Self::MAIN,
            Rect::new(0.0, 0.0, viewport.0 as f32, viewport.1 as f32),
        );
        Self {
            cameras: vec![main],
            next_id: 1,
        }
    }

    pub fn add(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Camera {
        let id = CameraId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.cameras
            .push(Camera::new(id, Rect::new(x, y, width, height)));
        let last = self.cameras.len() - 1;
        &mut self.cameras[last]
    }

    pub fn main(&self) -> &Camera {
        &self.cameras[0]
    }

    pub fn main_mut(&mut self) -> &mut Camera {
        &mut self.cameras[0]
    }

    pub fn get(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.iter().find(|camera| camera.id == id)
    }

    pub fn get_mut(&mut self, id: CameraId) -> Option<&mut Camera> {
        self.cameras.iter_mut().find(|camera| camera.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Camera> {
        self.cameras
            .iter()
            .find(|camera| camera.name.as_deref() == Some(name))
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Camera> {
        self.cameras
            .iter_mut()
            .find(|camera| camera.name.as_deref() == Some(name))
    }

    pub fn remove(&mut self, id: CameraId) -> bool {
        if id == Self::MAIN {
            return false;
        }
        let before = self.cameras.len();
        self.cameras.retain(|camera| camera.id != id);
        self.cameras.len() != before
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Drawing order: main camera first, added cameras on top.
    pub fn iter(&self) -> impl Iterator<Item = &Camera> {
        self.cameras.iter()
    }

    pub(crate) fn retain_ignored(&mut self, keep: impl Fn(&IgnoreTarget) -> bool) -> usize {
        self.cameras
            .iter_mut()
            .map(|camera| camera.retain_ignored(&keep))
            .sum()
    }

    pub(crate) fn update(&mut self, dt_seconds: f32, lookup: impl Fn(EntityId) -> Option<Vec2>) {
        for camera in &mut self.cameras {
            let follow_position = camera.follow.and_then(&lookup);
            camera.update(dt_seconds, follow_position);
        }
    }

    pub(crate) fn resize_main(&mut self, width: u32, height: u32) {
        let main = self.main_mut();
        main.viewport.width = width as f32;
        main.viewport.height = height as f32;
    }

    pub(crate) fn reset(&mut self) {
        let viewport = self.main().viewport;
        self.cameras.truncate(1);
        self.cameras[0] = Camera::new(Self::MAIN, viewport);
        self.next_id = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn zoom_is_clamped_and_non_finite_resets() {
        assert_eq!(clamp_camera_zoom(100.0), MAX_CAMERA_ZOOM);
        assert_eq!(clamp_camera_zoom(0.001), MIN_CAMERA_ZOOM);
        assert_eq!(clamp_camera_zoom(f32::NAN), 1.0);
        assert_eq!(clamp_camera_zoom(-2.0), 1.0);
        assert_eq!(clamp_camera_zoom(0.6), 0.6);
    }

    #[test]
    fn world_to_screen_respects_viewport_zoom_and_scroll_factor() {
        let mut rig = CameraRig::new((800, 600));
        let camera = rig.add(640.0, 10.0, 150.0, 150.0);
        camera.set_zoom(0.6);
        camera.center_on(75.0, 75.0);

        let centre = camera.world_to_screen(Vec2::new(75.0, 75.0), 1.0);
        assert!(approx(centre.x, 715.0) && approx(centre.y, 85.0));

        let offset = camera.world_to_screen(Vec2::new(175.0, 75.0), 1.0);
        assert!(approx(offset.x, 775.0));

        let pinned = rig.main().world_to_screen(Vec2::new(10.0, 10.0), 0.0);
        assert_eq!(pinned, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen() {
        let mut rig = CameraRig::new((800, 600));
        let camera = rig.add(625.0, 0.0, 175.0, 175.0);
        camera.set_zoom(10.0);
        camera.scroll = Vec2::new(300.0, 120.0);
        let world = Vec2::new(320.0, 130.0);
        let back = camera.screen_to_world(camera.world_to_screen(world, 1.0), 1.0);
        assert!(approx(back.x, world.x) && approx(back.y, world.y));
    }

    #[test]
    fn pan_reaches_target_after_duration() {
        let mut rig = CameraRig::new((800, 600));
        let camera = rig.main_mut();
        camera.pan(473.0, 176.0, 3000);
        assert!(camera.is_panning());

        for _ in 0..90 {
            camera.update(1.0 / 60.0, None);
        }
        assert!(camera.is_panning());
        let halfway = camera.mid_point();
        assert!(approx(halfway.x, 400.0 + (473.0 - 400.0) * 0.5));

        for _ in 0..100 {
            camera.update(1.0 / 60.0, None);
        }
        assert!(!camera.is_panning());
        let done = camera.mid_point();
        assert!(approx(done.x, 473.0) && approx(done.y, 176.0));
    }

    #[test]
    fn follow_recentres_and_bounds_clamp() {
        let mut rig = CameraRig::new((800, 600));
        rig.main_mut().set_bounds(0.0, 0.0, 3000.0, 1000.0);
        rig.main_mut().start_follow(EntityId(1));

        rig.update(0.016, |_| Some(Vec2::new(1500.0, 500.0)));
        assert_eq!(rig.main().mid_point(), Vec2::new(1500.0, 500.0));

        rig.update(0.016, |_| Some(Vec2::new(10.0, 990.0)));
        assert_eq!(rig.main().scroll, Vec2::new(0.0, 400.0));

        rig.main_mut().stop_follow();
        rig.update(0.016, |_| Some(Vec2::new(1500.0, 500.0)));
        assert_eq!(rig.main().scroll, Vec2::new(0.0, 400.0));
    }

    #[test]
    fn bounds_clamp_uses_zoomed_visible_area() {
        let mut rig = CameraRig::new((800, 600));
        let minimap = rig.add(640.0, 10.0, 150.0, 150.0);
        minimap.set_zoom(0.6).set_bounds(0.0, 0.0, 3000.0, 1000.0);
        minimap.center_on(0.0, 0.0);
        let visible = 150.0 / 0.6;
        assert!(approx(minimap.mid_point().x, visible / 2.0));
        assert!(approx(minimap.mid_point().y, visible / 2.0));
    }

    #[test]
    fn ignore_list_matches_entity_or_tag() {
        let mut rig = CameraRig::new((800, 600));
        let camera = rig.add(0.0, 0.0, 10.0, 10.0);
        camera
            .ignore(IgnoreTarget::Entity(EntityId(4)))
            .ignore(IgnoreTarget::Tag("below_layer"));
        assert!(camera.ignores_entity(EntityId(4), None));
        assert!(camera.ignores_entity(EntityId(9), Some("below_layer")));
        assert!(!camera.ignores_entity(EntityId(9), Some("enemy")));
    }

    #[test]
    fn named_cameras_are_found_and_main_is_never_removed() {
        let mut rig = CameraRig::new((800, 600));
        let id = rig.add(640.0, 10.0, 150.0, 150.0).set_name("minimap").id;
        assert_eq!(rig.by_name("minimap").map(|camera| camera.id), Some(id));
        assert!(!rig.remove(CameraRig::MAIN));
        assert!(rig.remove(id));
        assert_eq!(rig.len(), 1);
    }

    #[test]
    fn mask_contains_points_inside_radius() {
        let mask = CircleMask {
            center: Vec2::new(715.0, 85.0),
            radius: 75.0,
        };
        assert!(mask.contains(715.0, 10.0));
        assert!(!mask.contains(640.0, 10.0));
    }
}
