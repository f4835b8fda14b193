//! The playable level: player, melee robot, the doctor and the intro
//! camera timeline.

use std::path::{Path, PathBuf};

use engine::{
    Body, CameraRig, EntityId, EventArg, InputAction, InputSnapshot, LaunchPayload,
    RenderableDesc, Scene, SceneCommand, SceneContext, SceneEvent, SceneKey, SceneWorld,
    TiledError, TiledMap, TimerHandle, TimerToken, Transform, Vec2,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    BELOW_LAYER_TAG, HUD_SCENE, MAIN_SCENE, PLAYER_PROJECTILE_TAG, TITLE_SCENE, TUTORIAL_CUT_SCENE,
};
use crate::app::config::{EnemyTuning, GameConfig, PlayerTuning};
use crate::app::cutscene::{
    play_cut_scene, robot_killed, ControlState, CutsceneCast, CutsceneStep, CutsceneTimeline,
    StepRequest,
};
use crate::app::events::{CUTSCENE_FINISHED, DIALOGUE, TAKE_DAMAGE};
use crate::app::npc::Npc;
use crate::app::player::PlayerState;

const WORLD_WIDTH: f32 = 3000.0;
const WORLD_HEIGHT: f32 = 1000.0;
/// Physics floor; bodies rest with their bottom edge on this line.
const GROUND_Y: f32 = 260.0;
const MAP_KEY: &str = "map";
const FALLBACK_TILE_PX: f32 = 32.0;
const TILE_COLOR: [u8; 4] = [96, 78, 60, 255];

const PLAYER_SPAWN: Vec2 = Vec2::new(100.0, 235.0);
const PLAYER_HALF_SIZE: Vec2 = Vec2::new(12.0, 25.0);
const ENEMY_SPAWN: Vec2 = Vec2::new(1200.0, 236.0);
const ENEMY_HALF_SIZE: Vec2 = Vec2::new(12.0, 24.0);
const DOCTOR_SPAWN: Vec2 = Vec2::new(500.0, 235.0);
const DOCTOR_HALF_SIZE: Vec2 = Vec2::new(12.0, 25.0);
const DEAD_NPC_SPAWN: Vec2 = Vec2::new(440.0, 248.0);

/// The enemy stops walking once it is this close to the player.
const ENEMY_STOP_DISTANCE: f32 = 20.0;
/// Added to the melee range to reach past the target's half width.
const MELEE_REACH_PAD: f32 = 24.0;
const MELEE_VERTICAL_REACH: f32 = 40.0;
const PROJECTILE_HALF_SIZE: Vec2 = Vec2::new(6.0, 3.0);
const PROJECTILE_LIFETIME_SECONDS: f32 = 1.5;
const PROJECTILE_SCALE: f32 = 0.3;

const GAME_OVER_KEY: &str = "gameOver";
const GAME_OVER_DELAY_MS: u64 = 3000;
const GAME_OVER_TOKEN: TimerToken = TimerToken(1);
const GAME_OVER_DEPTH: i32 = 1000;

include!("types.rs");
include!("systems.rs");
include!("scene_impl.rs");

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
