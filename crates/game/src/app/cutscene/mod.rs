//! Player freeze, scripted dialogue and the intro camera timeline.

mod control;
mod dialogue;
mod launch;
mod library;
mod session;
mod timeline;
mod ui;

use engine::EntityId;

pub(crate) use control::ControlState;
pub(crate) use launch::{play_cut_scene, robot_killed, CutsceneLaunch};
pub(crate) use library::{DialogueLibrary, LibraryError, PRE_GAME_SCRIPT, ROBOT_KILLED_SCRIPT, TUTORIAL_SCRIPT};
pub(crate) use session::{DialogueSession, SessionProgress};
pub(crate) use timeline::{CutsceneStep, CutsceneTimeline, StepRequest};
#[cfg(test)]
pub(crate) use timeline::BUBBLE_KEY;

/// Entities of the main scene that take part in a cutscene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CutsceneCast {
    pub(crate) player: EntityId,
    pub(crate) doctor: Option<EntityId>,
    pub(crate) dead_npc: Option<EntityId>,
}
