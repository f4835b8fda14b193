//! Scene keys and registration order. Scenes update and draw in this order,
//! so overlays come after the world they decorate.

mod gameplay;
mod hud;
mod pre_game;
mod title;
mod tutorial;

use std::path::PathBuf;
use std::rc::Rc;

use engine::{Scene, SceneKey};

use super::config::GameConfig;
use super::cutscene::DialogueLibrary;

pub(crate) const TITLE_SCENE: SceneKey = SceneKey("TitleScene");
pub(crate) const PRE_GAME_SCENE: SceneKey = SceneKey("PreGameScene");
pub(crate) const MAIN_SCENE: SceneKey = SceneKey("MainScene");
pub(crate) const HUD_SCENE: SceneKey = SceneKey("HUDScene");
pub(crate) const TUTORIAL_CUT_SCENE: SceneKey = SceneKey("TutorialCutScene");

/// Tiles of the map layer drawn below the actors.
pub(crate) const BELOW_LAYER_TAG: &str = "below_layer";
pub(crate) const PLAYER_PROJECTILE_TAG: &str = "player_projectile";

pub(crate) fn build_scenes(
    config: &GameConfig,
    asset_root: PathBuf,
    library: Rc<DialogueLibrary>,
) -> Vec<Box<dyn Scene>> {
    vec![
        Box::new(title::TitleScene::default()),
        Box::new(pre_game::PreGameScene::new(Rc::clone(&library))),
        Box::new(gameplay::MainScene::new(config, asset_root)),
        Box::new(hud::HudScene::default()),
        Box::new(tutorial::TutorialScene::new(library)),
    ]
}
