use std::rc::Rc;

use engine::{InputSnapshot, LaunchPayload, Scene, SceneCommand, SceneContext, SceneKey, Vec2};
use tracing::{info, warn};

use super::{MAIN_SCENE, PRE_GAME_SCENE};
use crate::app::cutscene::{DialogueLibrary, DialogueSession, SessionProgress, PRE_GAME_SCRIPT};

const BACKGROUND_KEY: &str = "apocalypse";
const DIALOGUE_ANCHOR: Vec2 = Vec2::new(410.0, 120.0);

/// Story intro shown after "New Game"; hands over to the main scene.
pub(crate) struct PreGameScene {
    library: Rc<DialogueLibrary>,
    session: DialogueSession,
}

impl PreGameScene {
    pub(crate) fn new(library: Rc<DialogueLibrary>) -> Self {
        Self {
            library,
            session: DialogueSession::default(),
        }
    }
}

impl Scene for PreGameScene {
    fn key(&self) -> SceneKey {
        PRE_GAME_SCENE
    }

    fn create(&mut self, _payload: &LaunchPayload, ctx: &mut SceneContext<'_>) {
        self.session = DialogueSession::default();
        let display = ctx.world_mut().display_mut();
        let background = display.add_image(400.0, 300.0, BACKGROUND_KEY);
        if let Some(object) = display.get_mut(background) {
            object.set_scroll_factor(0.0).set_depth(-10);
        }

        let Some(script) = self.library.script(PRE_GAME_SCRIPT) else {
            warn!(script = PRE_GAME_SCRIPT, "dialogue_script_missing");
            ctx.issue(SceneCommand::Start(MAIN_SCENE));
            return;
        };
        if let Err(error) = self
            .session
            .start(ctx.world_mut(), script, DIALOGUE_ANCHOR, Vec2::ZERO)
        {
            warn!(error = %error, "pre_game_dialogue_failed");
            ctx.issue(SceneCommand::Start(MAIN_SCENE));
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
                info!("pre_game_finished");
                SceneCommand::Start(MAIN_SCENE)
            }
            Ok(_) => SceneCommand::None,
            Err(error) => {
                warn!(error = %error, "pre_game_dialogue_failed");
                SceneCommand::Start(MAIN_SCENE)
            }
        }
    }
}
