use engine::{DisplayId, DisplayList, SceneWorld, TextStyle, TimerHandle, TimerToken, Vec2};
use tracing::{debug, info};

use super::control::ControlState;
use super::CutsceneCast;

const TOKEN_BASE: u64 = 0x100;

const PAN_TARGET: Vec2 = Vec2::new(473.0, 176.0);
const PAN_DURATION_MS: u64 = 3000;
const SHOW_BUBBLES_AT_MS: u64 = 2000;
const BUBBLES_VISIBLE_MS: u64 = 3500;
const PAN_BACK_AT_MS: u64 = 5000;
const FINISH_AT_MS: u64 = 8000;
const PAN_BACK_CENTRE: Vec2 = Vec2::new(400.0, 300.0);

pub(crate) const BUBBLE_KEY: &str = "bubble";
const BUBBLE_SCALE: f32 = 0.045;
const BUBBLE_TEXT_SCALE: f32 = 0.25;
const BUBBLE_TEXT_CELL_PX: f32 = 4.0;
const BUBBLE_TEXT_WRAP: f32 = 30.0;
const DOCTOR_BUBBLE_OFFSET: Vec2 = Vec2::new(15.0, -10.0);
const DOCTOR_TEXT_OFFSET: Vec2 = Vec2::new(-5.0, -4.0);
const VILLAGER_BUBBLE_OFFSET: Vec2 = Vec2::new(10.0, -15.0);
const VILLAGER_TEXT_OFFSET: Vec2 = Vec2::new(-10.0, -5.0);
const DOCTOR_LINE: &str = "Help us!";
const VILLAGER_LINE: &str = "Noooo, pleaseeeee";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CutsceneStep {
    ShowBubbles,
    HideBubbles,
    PanBack,
    Finish,
}

impl CutsceneStep {
    const ALL: [CutsceneStep; 4] = [
        CutsceneStep::ShowBubbles,
        CutsceneStep::HideBubbles,
        CutsceneStep::PanBack,
        CutsceneStep::Finish,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub(crate) fn token(self) -> TimerToken {
        TimerToken(TOKEN_BASE + self as u64)
    }

    pub(crate) fn from_token(token: TimerToken) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.token() == token)
    }

    fn label(self) -> &'static str {
        match self {
            CutsceneStep::ShowBubbles => "show_bubbles",
            CutsceneStep::HideBubbles => "hide_bubbles",
            CutsceneStep::PanBack => "pan_back",
            CutsceneStep::Finish => "finish",
        }
    }
}

/// Timer the owning scene must schedule for the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StepRequest {
    pub(crate) delay_ms: u64,
    pub(crate) step: CutsceneStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReactionBubbles {
    doctor_bubble: DisplayId,
    doctor_text: DisplayId,
    villager_bubble: DisplayId,
    villager_text: DisplayId,
}

impl ReactionBubbles {
    fn show(display: &mut DisplayList, doctor: Vec2, villager: Vec2) -> Self {
        let (doctor_bubble, doctor_text) =
            add_bubble(display, doctor, DOCTOR_BUBBLE_OFFSET, DOCTOR_TEXT_OFFSET, DOCTOR_LINE);
        let (villager_bubble, villager_text) = add_bubble(
            display,
            villager,
            VILLAGER_BUBBLE_OFFSET,
            VILLAGER_TEXT_OFFSET,
            VILLAGER_LINE,
        );
        Self {
            doctor_bubble,
            doctor_text,
            villager_bubble,
            villager_text,
        }
    }

    fn hide(self, display: &mut DisplayList) {
        for id in [
            self.doctor_bubble,
            self.doctor_text,
            self.villager_bubble,
            self.villager_text,
        ] {
            display.destroy(id);
        }
    }
}

fn add_bubble(
    display: &mut DisplayList,
    speaker: Vec2,
    bubble_offset: Vec2,
    text_offset: Vec2,
    line: &str,
) -> (DisplayId, DisplayId) {
    let bubble_at = Vec2::new(speaker.x + bubble_offset.x, speaker.y + bubble_offset.y);
    let bubble = display.add_image(bubble_at.x, bubble_at.y, BUBBLE_KEY);
    if let Some(object) = display.get_mut(bubble) {
        object.set_scale(BUBBLE_SCALE).set_depth(20);
    }
    let style = TextStyle {
        cell_size: BUBBLE_TEXT_CELL_PX,
        color: [0, 0, 0, 255],
        wrap_width: None,
    }
    .with_wrap_width(BUBBLE_TEXT_WRAP);
    let text = display.add_text(
        bubble_at.x + text_offset.x,
        bubble_at.y + text_offset.y,
        line,
        style,
    );
    if let Some(object) = display.get_mut(text) {
        object.set_scale(BUBBLE_TEXT_SCALE).set_depth(21);
    }
    (bubble, text)
}

/// Intro camera sequence: pan to the victims, show their reactions, pan
/// back, then hand control back to the player. Every step runs at most
/// once and the timeline cannot be restarted while it runs.
#[derive(Debug, Default)]
pub(crate) struct CutsceneTimeline {
    cast: Option<CutsceneCast>,
    saved_scroll: Vec2,
    done: u8,
    bubbles: Option<ReactionBubbles>,
    handles: Vec<TimerHandle>,
}

impl CutsceneTimeline {
    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.done & CutsceneStep::Finish.bit() != 0
    }

    /// Freezes the player, detaches the main camera and starts the first
    /// pan. Returns the timers to schedule; empty when already started.
    pub(crate) fn start(
        &mut self,
        world: &mut SceneWorld,
        controls: &mut ControlState,
        cast: CutsceneCast,
    ) -> Vec<StepRequest> {
        if self.cast.is_some() {
            debug!("cutscene_restart_ignored");
            return Vec::new();
        }
        controls.freeze(world, cast.player);
        let camera = world.cameras_mut().main_mut();
        camera.stop_follow();
        self.saved_scroll = camera.scroll;
        camera.pan(PAN_TARGET.x, PAN_TARGET.y, PAN_DURATION_MS);
        self.cast = Some(cast);
        info!(
            scroll_x = self.saved_scroll.x,
            scroll_y = self.saved_scroll.y,
            "cutscene_started"
        );
        vec![
            StepRequest {
                delay_ms: SHOW_BUBBLES_AT_MS,
                step: CutsceneStep::ShowBubbles,
            },
            StepRequest {
                delay_ms: PAN_BACK_AT_MS,
                step: CutsceneStep::PanBack,
            },
            StepRequest {
                delay_ms: FINISH_AT_MS,
                step: CutsceneStep::Finish,
            },
        ]
    }

    pub(crate) fn track(&mut self, handle: TimerHandle) {
        self.handles.push(handle);
    }

    /// Runs `step` once. Returns follow-up timers to schedule.
    pub(crate) fn run_step(
        &mut self,
        step: CutsceneStep,
        world: &mut SceneWorld,
        controls: &mut ControlState,
    ) -> Vec<StepRequest> {
        let Some(cast) = self.cast else {
            return Vec::new();
        };
        if self.done & step.bit() != 0 {
            debug!(step = step.label(), "cutscene_step_repeated");
            return Vec::new();
        }
        self.done |= step.bit();
        info!(step = step.label(), "cutscene_step");

        match step {
            CutsceneStep::ShowBubbles => {
                let doctor = cast.doctor.and_then(|id| world.position(id));
                let villager = cast.dead_npc.and_then(|id| world.position(id));
                if let (Some(doctor), Some(villager)) = (doctor, villager) {
                    self.bubbles = Some(ReactionBubbles::show(world.display_mut(), doctor, villager));
                    return vec![StepRequest {
                        delay_ms: BUBBLES_VISIBLE_MS,
                        step: CutsceneStep::HideBubbles,
                    }];
                }
            }
            CutsceneStep::HideBubbles => {
                if let Some(bubbles) = self.bubbles.take() {
                    bubbles.hide(world.display_mut());
                }
            }
            CutsceneStep::PanBack => {
                world.cameras_mut().main_mut().pan(
                    PAN_BACK_CENTRE.x + self.saved_scroll.x,
                    PAN_BACK_CENTRE.y + self.saved_scroll.y,
                    PAN_DURATION_MS,
                );
            }
            CutsceneStep::Finish => {
                controls.release();
                world.cameras_mut().main_mut().start_follow(cast.player);
                self.handles.clear();
            }
        }
        Vec::new()
    }

    pub(crate) fn bubble_ids(&self) -> Vec<DisplayId> {
        self.bubbles.map_or_else(Vec::new, |bubbles| {
            vec![
                bubbles.doctor_bubble,
                bubbles.doctor_text,
                bubbles.villager_bubble,
                bubbles.villager_text,
            ]
        })
    }

    /// Handles of timers still owned by the timeline.
    pub(crate) fn take_handles(&mut self) -> Vec<TimerHandle> {
        std::mem::take(&mut self.handles)
    }
}
