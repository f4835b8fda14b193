//! Event names shared between the gameplay scenes.

/// `(current_health: Int, max_health: Int)`, emitted by the main scene.
pub(crate) const TAKE_DAMAGE: &str = "takeDamage";
/// Display objects that should stay off the minimap.
pub(crate) const DIALOGUE: &str = "dialogue";
/// `(final_scene: Bool)`, emitted by the tutorial session when it ends.
pub(crate) const CUTSCENE_FINISHED: &str = "cutsceneFinished";
