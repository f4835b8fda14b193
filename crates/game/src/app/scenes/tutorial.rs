use std::rc::Rc;

use engine::{
    EventArg, InputSnapshot, LaunchPayload, Scene, SceneCommand, SceneContext, SceneKey, Vec2,
};
use tracing::{info, warn};

use super::{MAIN_SCENE, TUTORIAL_CUT_SCENE};
use crate::app::cutscene::{
    CutsceneLaunch, DialogueLibrary, DialogueSession, SessionProgress, ROBOT_KILLED_SCRIPT,
    TUTORIAL_SCRIPT,
};
use crate::app::events::CUTSCENE_FINISHED;

const FALLBACK_ANCHOR: Vec2 = Vec2::new(400.0, 120.0);
/// Where the text box centre may sit, in screen pixels.
const BOX_MIN_X: f32 = 260.0;
const BOX_MAX_X: f32 = 540.0;
const BOX_Y: f32 = 480.0;
const BOX_ANCHOR_DX: f32 = -10.0;
const BOX_ANCHOR_DY: f32 = 330.0;

/// Offset that keeps the dialogue box on screen for a given anchor.
pub(crate) fn dialogue_offset(anchor: Vec2) -> Vec2 {
    let box_x = (anchor.x + BOX_ANCHOR_DX).clamp(BOX_MIN_X, BOX_MAX_X);
    Vec2::new(
        box_x - (anchor.x + BOX_ANCHOR_DX),
        BOX_Y - (anchor.y + BOX_ANCHOR_DY),
    )
}

/// Dialogue session launched by the main scene; reports back with
/// `cutsceneFinished` and stops itself.
pub(crate) struct TutorialScene {
    library: Rc<DialogueLibrary>,
    session: DialogueSession,
    final_scene: bool,
}

impl TutorialScene {
    pub(crate) fn new(library: Rc<DialogueLibrary>) -> Self {
        Self {
            library,
            session: DialogueSession::default(),
            final_scene: false,
        }
    }

    fn player_anchor(ctx: &SceneContext<'_>, source: SceneKey, launch: &CutsceneLaunch) -> Vec2 {
        let Some(world) = ctx.peer_world(source) else {
            return FALLBACK_ANCHOR;
        };
        match (world.cameras().get(launch.camera), world.position(launch.player)) {
            (Some(camera), Some(position)) => camera.world_to_screen(position, 1.0),
            _ => FALLBACK_ANCHOR,
        }
    }
}

impl Scene for TutorialScene {
    fn key(&self) -> SceneKey {
        TUTORIAL_CUT_SCENE
    }

    fn create(&mut self, payload: &LaunchPayload, ctx: &mut SceneContext<'_>) {
        self.session = DialogueSession::default();
        let launch = match CutsceneLaunch::from_payload(payload) {
            Ok(launch) => launch,
            Err(error) => {
                warn!(error = %error, "cutscene_payload_rejected");
                ctx.issue(SceneCommand::StopSelf);
                return;
            }
        };
        self.final_scene = launch.final_scene;

        let source = payload.source().unwrap_or(MAIN_SCENE);
        let anchor = Self::player_anchor(ctx, source, &launch);
        let script_name = if launch.final_scene {
            ROBOT_KILLED_SCRIPT
        } else {
            TUTORIAL_SCRIPT
        };
        let Some(script) = self.library.script(script_name) else {
            warn!(script = script_name, "dialogue_script_missing");
            ctx.emit(CUTSCENE_FINISHED, vec![EventArg::Bool(self.final_scene)]);
            ctx.issue(SceneCommand::StopSelf);
            return;
        };
        match self
            .session
            .start(ctx.world_mut(), script, anchor, dialogue_offset(anchor))
        {
            Ok(_) => info!(script = script_name, final_scene = launch.final_scene, "cutscene_dialogue_started"),
            Err(error) => {
                warn!(error = %error, "cutscene_dialogue_failed");
                ctx.emit(CUTSCENE_FINISHED, vec![EventArg::Bool(self.final_scene)]);
                ctx.issue(SceneCommand::StopSelf);
            }
        }
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        ctx: &mut SceneContext<'_>,
    ) -> SceneCommand {
        match self.session.handle_input(input, ctx.world_mut()) {
            Ok(SessionProgress::Finished) => {
                info!(final_scene = self.final_scene, "cutscene_finished");
                ctx.emit(CUTSCENE_FINISHED, vec![EventArg::Bool(self.final_scene)]);
                SceneCommand::StopSelf
            }
            Ok(_) => SceneCommand::None,
            Err(error) => {
                warn!(error = %error, "cutscene_dialogue_failed");
                ctx.emit(CUTSCENE_FINISHED, vec![EventArg::Bool(self.final_scene)]);
                SceneCommand::StopSelf
            }
        }
    }
}
