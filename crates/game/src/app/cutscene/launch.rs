use engine::{CameraId, EntityId, LaunchPayload, PayloadValue, SceneCommand, SceneContext};
use thiserror::Error;
use tracing::info;

use super::control::ControlState;
use crate::app::scenes::TUTORIAL_CUT_SCENE;

pub(crate) const PLAYER_FIELD: &str = "player";
pub(crate) const ENEMY_FIELD: &str = "enemy";
pub(crate) const CAMERA_FIELD: &str = "camera";
pub(crate) const DEAD_NPC_FIELD: &str = "deadNPC";
pub(crate) const DOCTOR_FIELD: &str = "doctor";
pub(crate) const FINAL_SCENE_FIELD: &str = "finalScene";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum PayloadError {
    #[error("cutscene payload is missing '{0}'")]
    MissingField(&'static str),
}

/// Typed view of the payload handed to the tutorial cutscene. Entity and
/// camera ids refer to the launching scene's world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CutsceneLaunch {
    pub(crate) player: EntityId,
    pub(crate) enemy: EntityId,
    pub(crate) camera: CameraId,
    pub(crate) dead_npc: Option<EntityId>,
    pub(crate) doctor: Option<EntityId>,
    pub(crate) final_scene: bool,
}

impl CutsceneLaunch {
    pub(crate) fn to_payload(&self) -> LaunchPayload {
        let mut payload = LaunchPayload::new()
            .with(PLAYER_FIELD, PayloadValue::Entity(self.player))
            .with(ENEMY_FIELD, PayloadValue::Entity(self.enemy))
            .with(CAMERA_FIELD, PayloadValue::Camera(self.camera));
        if let Some(dead_npc) = self.dead_npc {
            payload.insert(DEAD_NPC_FIELD, PayloadValue::Entity(dead_npc));
        }
        if let Some(doctor) = self.doctor {
            payload.insert(DOCTOR_FIELD, PayloadValue::Entity(doctor));
        }
        if self.final_scene {
            payload.insert(FINAL_SCENE_FIELD, PayloadValue::Flag(true));
        }
        payload
    }

    pub(crate) fn from_payload(payload: &LaunchPayload) -> Result<Self, PayloadError> {
        Ok(Self {
            player: payload
                .entity(PLAYER_FIELD)
                .ok_or(PayloadError::MissingField(PLAYER_FIELD))?,
            enemy: payload
                .entity(ENEMY_FIELD)
                .ok_or(PayloadError::MissingField(ENEMY_FIELD))?,
            camera: payload
                .camera(CAMERA_FIELD)
                .ok_or(PayloadError::MissingField(CAMERA_FIELD))?,
            dead_npc: payload.entity(DEAD_NPC_FIELD),
            doctor: payload.entity(DOCTOR_FIELD),
            final_scene: payload.flag(FINAL_SCENE_FIELD).unwrap_or(false),
        })
    }
}

/// Doctor conversation: freeze, then run the tutorial script.
pub(crate) fn play_cut_scene(
    ctx: &mut SceneContext<'_>,
    controls: &mut ControlState,
    player: EntityId,
    enemy: EntityId,
    camera: CameraId,
    dead_npc: EntityId,
) {
    controls.freeze(ctx.world_mut(), player);
    let launch = CutsceneLaunch {
        player,
        enemy,
        camera,
        dead_npc: Some(dead_npc),
        doctor: None,
        final_scene: false,
    };
    info!(final_scene = false, "cutscene_launch");
    ctx.issue(SceneCommand::Launch(TUTORIAL_CUT_SCENE, launch.to_payload()));
}

/// Enemy defeat: freeze, then run the closing script.
pub(crate) fn robot_killed(
    ctx: &mut SceneContext<'_>,
    controls: &mut ControlState,
    player: EntityId,
    enemy: EntityId,
    camera: CameraId,
    doctor: EntityId,
) {
    controls.freeze(ctx.world_mut(), player);
    let launch = CutsceneLaunch {
        player,
        enemy,
        camera,
        dead_npc: None,
        doctor: Some(doctor),
        final_scene: true,
    };
    info!(final_scene = true, "cutscene_launch");
    ctx.issue(SceneCommand::Launch(TUTORIAL_CUT_SCENE, launch.to_payload()));
}
