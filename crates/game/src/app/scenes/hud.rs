use engine::{
    CameraId, CircleMask, DisplayId, EntityId, EventArg, Graphics, IgnoreTarget, InputSnapshot,
    LaunchPayload, Rect, Scene, SceneCommand, SceneContext, SceneEvent, SceneKey, Vec2,
    SCENE_READY_EVENT,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{BELOW_LAYER_TAG, HUD_SCENE, MAIN_SCENE, PLAYER_PROJECTILE_TAG};
use crate::app::events::{DIALOGUE, TAKE_DAMAGE};

const BAR_X: f32 = 10.0;
const BAR_Y: f32 = 10.0;
const BAR_WIDTH: f32 = 150.0;
const BAR_HEIGHT: f32 = 10.0;
const BAR_MARGIN: f32 = 2.0;

const BORDER_COLOR: u32 = 0x000000;
const BACKGROUND_COLOR: u32 = 0xffffff;
const LOW_COLOR: u32 = 0xff0000;
const MEDIUM_COLOR: u32 = 0xfee12b;
const HIGH_COLOR: u32 = 0x00ff00;

const MINIMAP_NAME: &str = "minimap";
const MINIMAP_MASK_CENTER: Vec2 = Vec2::new(715.0, 85.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum HealthBarError {
    #[error("health {current} is outside 0..={max}")]
    OutOfRange { current: i64, max: i64 },
    #[error("max health must be positive")]
    ZeroMax,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HealthBarLayout {
    pub(crate) border: Rect,
    pub(crate) background: Rect,
    pub(crate) fill_color: u32,
    pub(crate) fill: Option<Rect>,
}

pub(crate) fn health_bar_layout(current: i64, max: i64) -> Result<HealthBarLayout, HealthBarError> {
    if max <= 0 {
        return Err(HealthBarError::ZeroMax);
    }
    if !(0..=max).contains(&current) {
        return Err(HealthBarError::OutOfRange { current, max });
    }
    let pixels_per_health = f64::from(BAR_WIDTH) / max as f64;
    let filled = (current as f64 * pixels_per_health).floor() as f32;
    let fill_color = if filled <= BAR_WIDTH / 4.0 {
        LOW_COLOR
    } else if filled <= BAR_WIDTH / 2.0 {
        MEDIUM_COLOR
    } else {
        HIGH_COLOR
    };
    let fill = (filled > 0.0).then(|| {
        Rect::new(
            BAR_X + BAR_MARGIN,
            BAR_Y + BAR_MARGIN,
            filled - BAR_MARGIN,
            BAR_HEIGHT - BAR_MARGIN,
        )
    });
    Ok(HealthBarLayout {
        border: Rect::new(BAR_X, BAR_Y, BAR_WIDTH + BAR_MARGIN, BAR_HEIGHT + BAR_MARGIN),
        background: Rect::new(
            BAR_X + BAR_MARGIN,
            BAR_Y + BAR_MARGIN,
            BAR_WIDTH - BAR_MARGIN,
            BAR_HEIGHT - BAR_MARGIN,
        ),
        fill_color,
        fill,
    })
}

fn paint_health_bar(graphics: &mut Graphics, layout: &HealthBarLayout) {
    graphics.clear();
    let border = layout.border;
    graphics
        .fill_style(BORDER_COLOR)
        .fill_rect(border.x, border.y, border.width, border.height);
    let background = layout.background;
    graphics
        .fill_style(BACKGROUND_COLOR)
        .fill_rect(background.x, background.y, background.width, background.height);
    graphics.fill_style(layout.fill_color);
    if let Some(fill) = layout.fill {
        graphics.fill_rect(fill.x, fill.y, fill.width, fill.height);
    }
}

/// `(player, enemy, health, max_health)` published by the main scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReadySignal {
    player: EntityId,
    enemy: EntityId,
    health: i64,
    max_health: i64,
}

impl ReadySignal {
    fn parse(args: &[EventArg]) -> Option<Self> {
        let event = SceneEvent::new(SCENE_READY_EVENT, args.to_vec());
        Some(Self {
            player: event.entity_arg(0)?,
            enemy: event.entity_arg(1)?,
            health: event.int_arg(2)?,
            max_health: event.int_arg(3)?,
        })
    }
}

/// Health bar overlay. Also installs the minimap cameras into the main
/// scene once that scene reports ready.
#[derive(Debug, Default)]
pub(crate) struct HudScene {
    bar: Option<DisplayId>,
    provisioned: bool,
    border_camera: Option<CameraId>,
    minimap_camera: Option<CameraId>,
}

impl HudScene {
    fn draw(&mut self, ctx: &mut SceneContext<'_>, current: i64, max: i64) {
        let layout = match health_bar_layout(current, max) {
            Ok(layout) => layout,
            Err(error) => {
                warn!(error = %error, current, max, "health_bar_rejected");
                return;
            }
        };
        let Some(bar) = self.bar else {
            return;
        };
        let display = ctx.world_mut().display_mut();
        if let Some(graphics) = display.graphics_mut(bar) {
            paint_health_bar(graphics, &layout);
        }
        if let Some(object) = display.get_mut(bar) {
            object.set_scroll_factor(0.0);
        }
        debug!(current, max, "health_bar_drawn");
    }

    fn provision(&mut self, ctx: &mut SceneContext<'_>, args: &[EventArg]) {
        if self.provisioned {
            return;
        }
        let Some(signal) = ReadySignal::parse(args) else {
            warn!(arg_count = args.len(), "hud_ready_signal_malformed");
            return;
        };
        self.provisioned = true;
        self.draw(ctx, signal.health, signal.max_health);
        ctx.subscribe(MAIN_SCENE, TAKE_DAMAGE);
        ctx.subscribe(MAIN_SCENE, DIALOGUE);

        let Some(main_world) = ctx.peer_world_mut(MAIN_SCENE) else {
            warn!("hud_main_scene_not_running");
            return;
        };
        let cameras = main_world.cameras_mut();
        let border = cameras
            .add(625.0, 0.0, 175.0, 175.0)
            .set_zoom(10.0)
            .ignore(IgnoreTarget::Entity(signal.player))
            .ignore(IgnoreTarget::Entity(signal.enemy))
            .ignore(IgnoreTarget::Tag(BELOW_LAYER_TAG))
            .ignore(IgnoreTarget::Tag(PLAYER_PROJECTILE_TAG))
            .set_background_color(0x000000)
            .set_mask(CircleMask {
                center: MINIMAP_MASK_CENTER,
                radius: 80.0,
            })
            .id;
        let minimap = cameras
            .add(640.0, 10.0, 150.0, 150.0)
            .set_zoom(0.6)
            .set_bounds(0.0, 0.0, 3000.0, 1000.0)
            .set_name(MINIMAP_NAME)
            .set_background_color(0x000000)
            .start_follow(signal.player)
            .set_mask(CircleMask {
                center: MINIMAP_MASK_CENTER,
                radius: 75.0,
            })
            .id;
        self.border_camera = Some(border);
        self.minimap_camera = Some(minimap);
        info!(border = border.0, minimap = minimap.0, "hud_cameras_provisioned");
    }

    fn hide_from_minimap(&self, ctx: &mut SceneContext<'_>, event: &SceneEvent) {
        let Some(minimap) = self.minimap_camera else {
            return;
        };
        let Some(world) = ctx.peer_world_mut(MAIN_SCENE) else {
            return;
        };
        let pruned = world.prune_camera_ignores();
        if pruned > 0 {
            debug!(pruned, "minimap_ignores_pruned");
        }
        let Some(camera) = world.cameras_mut().get_mut(minimap) else {
            return;
        };
        for id in event.display_args() {
            camera.ignore(IgnoreTarget::Display(id));
        }
    }
}

impl Scene for HudScene {
    fn key(&self) -> SceneKey {
        HUD_SCENE
    }

    fn create(&mut self, _payload: &LaunchPayload, ctx: &mut SceneContext<'_>) {
        *self = Self::default();
        self.bar = Some(ctx.world_mut().display_mut().add_graphics());

        let ready = ctx
            .peer_world(MAIN_SCENE)
            .and_then(|world| world.ready_signal())
            .map(<[EventArg]>::to_vec);
        match ready {
            Some(args) => self.provision(ctx, &args),
            None => {
                debug!("hud_waiting_for_main_scene");
                ctx.subscribe(MAIN_SCENE, SCENE_READY_EVENT);
            }
        }
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        _input: &InputSnapshot,
        _ctx: &mut SceneContext<'_>,
    ) -> SceneCommand {
        SceneCommand::None
    }

    fn on_event(&mut self, source: SceneKey, event: &SceneEvent, ctx: &mut SceneContext<'_>) {
        if source != MAIN_SCENE {
            return;
        }
        if event.is(SCENE_READY_EVENT) {
            self.provision(ctx, &event.args);
        } else if event.is(TAKE_DAMAGE) {
            match (event.int_arg(0), event.int_arg(1)) {
                (Some(current), Some(max)) => self.draw(ctx, current, max),
                _ => warn!(arg_count = event.args.len(), "take_damage_malformed"),
            }
        } else if event.is(DIALOGUE) {
            self.hide_from_minimap(ctx, event);
        }
    }

    fn shutdown(&mut self, ctx: &mut SceneContext<'_>) {
        let added = [self.border_camera.take(), self.minimap_camera.take()];
        if let Some(main_world) = ctx.peer_world_mut(MAIN_SCENE) {
            for id in added.into_iter().flatten() {
                main_world.cameras_mut().remove(id);
            }
        }
        self.provisioned = false;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use engine::{DisplayKind, GraphicsCommand, RenderableDesc, SceneMachine, SceneWorld, Transform};

    use super::*;

    #[test]
    fn full_health_is_a_green_bar_inside_the_border() {
        let layout = health_bar_layout(100, 100).expect("layout");
        assert_eq!(layout.border, Rect::new(10.0, 10.0, 152.0, 12.0));
        assert_eq!(layout.background, Rect::new(12.0, 12.0, 148.0, 8.0));
        assert_eq!(layout.fill_color, HIGH_COLOR);
        assert_eq!(layout.fill, Some(Rect::new(12.0, 12.0, 148.0, 8.0)));
    }

    #[test]
    fn colour_thresholds_follow_filled_width() {
        let colour = |current| health_bar_layout(current, 100).expect("layout").fill_color;
        assert_eq!(colour(25), LOW_COLOR);
        assert_eq!(colour(26), MEDIUM_COLOR);
        assert_eq!(colour(50), MEDIUM_COLOR);
        assert_eq!(colour(51), HIGH_COLOR);
    }

    #[test]
    fn empty_bar_has_no_fill() {
        let layout = health_bar_layout(0, 100).expect("layout");
        assert_eq!(layout.fill, None);
        assert_eq!(layout.fill_color, LOW_COLOR);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(health_bar_layout(5, 0), Err(HealthBarError::ZeroMax));
        assert_eq!(
            health_bar_layout(101, 100),
            Err(HealthBarError::OutOfRange {
                current: 101,
                max: 100
            })
        );
        assert_eq!(
            health_bar_layout(-1, 100),
            Err(HealthBarError::OutOfRange {
                current: -1,
                max: 100
            })
        );
    }

    #[test]
    fn repainting_replaces_previous_commands() {
        let mut graphics = Graphics::default();
        paint_health_bar(&mut graphics, &health_bar_layout(100, 100).expect("layout"));
        paint_health_bar(&mut graphics, &health_bar_layout(0, 100).expect("layout"));
        assert_eq!(graphics.commands().len(), 2);
    }

    /// Stand-in main scene: publishes readiness in `create` or on its
    /// first update, and emits queued events on update.
    struct StubMain {
        ready_on_create: bool,
        pending: Vec<(&'static str, Vec<EventArg>)>,
        launch_hud: bool,
        cast: Option<(EntityId, EntityId)>,
        /// Updates left that replace the previous prompt marker with a new one.
        marker_swaps: u32,
        markers: Rc<RefCell<Vec<DisplayId>>>,
    }

    impl StubMain {
        fn new(ready_on_create: bool, launch_hud: bool) -> Self {
            Self {
                ready_on_create,
                pending: Vec::new(),
                launch_hud,
                cast: None,
                marker_swaps: 0,
                markers: Rc::default(),
            }
        }

        fn ready_args(&self) -> Vec<EventArg> {
            let (player, enemy) = self.cast.unwrap_or((EntityId(0), EntityId(1)));
            vec![
                EventArg::Entity(player),
                EventArg::Entity(enemy),
                EventArg::Int(100),
                EventArg::Int(100),
            ]
        }
    }

    impl Scene for StubMain {
        fn key(&self) -> SceneKey {
            MAIN_SCENE
        }

        fn create(&mut self, _payload: &LaunchPayload, ctx: &mut SceneContext<'_>) {
            let world = ctx.world_mut();
            let player = world.spawn(
                Transform::default(),
                RenderableDesc::placeholder([0, 255, 0, 255], "player"),
            );
            let enemy = world.spawn(
                Transform::default(),
                RenderableDesc::placeholder([255, 0, 0, 255], "enemy"),
            );
            self.cast = Some((player, enemy));
            if self.ready_on_create {
                ctx.mark_ready(self.ready_args());
            }
            if self.launch_hud {
                ctx.issue(SceneCommand::Launch(HUD_SCENE, LaunchPayload::new()));
            }
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            ctx: &mut SceneContext<'_>,
        ) -> SceneCommand {
            if !ctx.world().is_ready() {
                ctx.mark_ready(self.ready_args());
            }
            for (name, args) in self.pending.drain(..) {
                ctx.emit(name, args);
            }
            if self.marker_swaps > 0 {
                self.marker_swaps -= 1;
                let display = ctx.world_mut().display_mut();
                if let Some(previous) = self.markers.borrow().last() {
                    display.destroy(*previous);
                }
                let marker = display.add_image(0.0, 0.0, "interact");
                self.markers.borrow_mut().push(marker);
                ctx.emit(DIALOGUE, vec![EventArg::Display(marker)]);
            }
            SceneCommand::None
        }
    }

    fn machine(main: StubMain) -> SceneMachine {
        SceneMachine::new(vec![Box::new(main), Box::new(HudScene::default())], (800, 600))
            .expect("machine")
    }

    fn bar_commands(world: &SceneWorld) -> Vec<GraphicsCommand> {
        world
            .display()
            .iter()
            .find_map(|object| match &object.kind {
                DisplayKind::Graphics(graphics) => Some(graphics.commands().to_vec()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn assert_provisioned(machine: &SceneMachine) {
        let main = machine.world(MAIN_SCENE).expect("main world");
        assert_eq!(main.cameras().len(), 3);
        let minimap = main.cameras().by_name(MINIMAP_NAME).expect("minimap");
        assert_eq!(minimap.zoom(), 0.6);
        assert_eq!(minimap.viewport, Rect::new(640.0, 10.0, 150.0, 150.0));
        assert_eq!(
            minimap.mask(),
            Some(CircleMask {
                center: Vec2::new(715.0, 85.0),
                radius: 75.0
            })
        );
        assert!(minimap.follow_target().is_some());
        let border = main
            .cameras()
            .iter()
            .find(|camera| camera.zoom() == 10.0)
            .expect("border camera");
        assert!(border.is_ignored(IgnoreTarget::Tag(BELOW_LAYER_TAG)));
        assert!(border.is_ignored(IgnoreTarget::Tag(PLAYER_PROJECTILE_TAG)));
        let hud = machine.world(HUD_SCENE).expect("hud world");
        assert_eq!(bar_commands(hud).len(), 3);
    }

    #[test]
    fn hud_provisions_when_main_is_already_ready() {
        let mut machine = machine(StubMain::new(true, true));
        machine.start(MAIN_SCENE).expect("start main");
        assert!(machine.is_running(HUD_SCENE));
        assert_provisioned(&machine);
    }

    #[test]
    fn hud_waits_for_late_readiness() {
        let mut machine = machine(StubMain::new(false, false));
        machine.start(HUD_SCENE).expect("start hud");
        machine.start(MAIN_SCENE).expect("start main");
        assert_eq!(machine.world(MAIN_SCENE).expect("main").cameras().len(), 1);

        machine.tick(1.0 / 60.0, &InputSnapshot::empty());
        assert_provisioned(&machine);

        machine.tick(1.0 / 60.0, &InputSnapshot::empty());
        assert_eq!(machine.world(MAIN_SCENE).expect("main").cameras().len(), 3);
    }

    #[test]
    fn take_damage_redraws_and_invalid_values_are_ignored() {
        let mut main = StubMain::new(true, true);
        main.pending.push((TAKE_DAMAGE, vec![EventArg::Int(20), EventArg::Int(100)]));
        main.pending.push((TAKE_DAMAGE, vec![EventArg::Int(120), EventArg::Int(100)]));
        let mut machine = machine(main);
        machine.start(MAIN_SCENE).expect("start main");

        machine.tick(1.0 / 60.0, &InputSnapshot::empty());

        let commands = bar_commands(machine.world(HUD_SCENE).expect("hud"));
        assert_eq!(
            commands.last(),
            Some(&GraphicsCommand::FillRect {
                rect: Rect::new(12.0, 12.0, 28.0, 8.0),
                color: LOW_COLOR
            })
        );
    }

    #[test]
    fn dialogue_objects_are_hidden_from_the_minimap() {
        let mut main = StubMain::new(true, true);
        main.pending
            .push((DIALOGUE, vec![EventArg::Display(DisplayId(42))]));
        let mut machine = machine(main);
        machine.start(MAIN_SCENE).expect("start main");

        machine.tick(1.0 / 60.0, &InputSnapshot::empty());

        let minimap = machine
            .world(MAIN_SCENE)
            .and_then(|world| world.cameras().by_name(MINIMAP_NAME))
            .expect("minimap");
        assert!(minimap.is_ignored(IgnoreTarget::Display(DisplayId(42))));
    }

    #[test]
    fn replaced_prompt_markers_do_not_accumulate_in_the_minimap() {
        let mut main = StubMain::new(true, true);
        main.marker_swaps = 3;
        let markers = Rc::clone(&main.markers);
        let mut machine = machine(main);
        machine.start(MAIN_SCENE).expect("start main");

        for _ in 0..3 {
            machine.tick(1.0 / 60.0, &InputSnapshot::empty());
        }

        let markers = markers.borrow();
        assert_eq!(markers.len(), 3);
        let minimap = machine
            .world(MAIN_SCENE)
            .and_then(|world| world.cameras().by_name(MINIMAP_NAME))
            .expect("minimap");
        assert!(!minimap.is_ignored(IgnoreTarget::Display(markers[0])));
        assert!(!minimap.is_ignored(IgnoreTarget::Display(markers[1])));
        assert!(minimap.is_ignored(IgnoreTarget::Display(markers[2])));
    }

    #[test]
    fn stopping_the_hud_removes_its_cameras() {
        let mut machine = machine(StubMain::new(true, true));
        machine.start(MAIN_SCENE).expect("start main");
        machine.stop(HUD_SCENE).expect("stop hud");
        assert_eq!(machine.world(MAIN_SCENE).expect("main").cameras().len(), 1);
    }
}
