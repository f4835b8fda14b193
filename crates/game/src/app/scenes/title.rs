use engine::{
    AssetError, AssetRegistry, DisplayId, InputSnapshot, LaunchPayload, Rect, Scene, SceneCommand,
    SceneContext, SceneKey, TextStyle,
};
use tracing::info;

use super::{MAIN_SCENE, PRE_GAME_SCENE, TITLE_SCENE};

const BUTTON_CELL_PX: f32 = 3.0;
const NEW_GAME_AT: (f32, f32) = (350.0, 250.0);
const LOAD_GAME_AT: (f32, f32) = (350.0, 350.0);

/// Every asset the game uses, registered once for all scenes.
pub(crate) fn register_manifest(assets: &mut AssetRegistry) -> Result<(), AssetError> {
    assets.image("apocalypse", "assets/backgrounds/apocalypse.png")?;
    assets.image("forest", "assets/backgrounds/forest.png")?;
    assets.image("bigBlast", "assets/sprites/bigBlast.png")?;
    assets.tilemap_json("map", "assets/backgrounds/robot-test-map.json")?;
    assets.spritesheet("player", "assets/sprites/cyborg.png", 47, 50)?;
    assets.spritesheet("meleeRobot", "assets/sprites/Walk.png", 46, 48)?;
    assets.spritesheet("meleeRobotAttack", "assets/sprites/Punch_RightHand.png", 48, 48)?;
    assets.spritesheet("upgradeStation", "assets/sprites/upgrade-station.png", 144, 144)?;
    assets.spritesheet("wolf", "assets/sprites/wolf.png", 68, 68)?;
    assets.audio("gg", "assets/audio/SadTrombone.mp3")?;
    assets.image("potion", "assets/items/potion.png")?;
    assets.image("iron", "assets/items/iron.png")?;
    assets.image("textBox", "assets/sprites/PngItem_5053532.png")?;
    assets.image("upgrade", "assets/backgrounds/upgrade.jpg")?;
    assets.image("gameOver", "assets/backgrounds/gg.jpg")?;
    assets.image("arrow", "assets/backgrounds/arrow.png")?;
    assets.image("interact", "assets/backgrounds/interact.png")?;
    assets.image("bubble", "assets/sprites/bubble.png")?;
    assets.image("doctor", "assets/sprites/doctor.png")?;
    assets.image("villager", "assets/sprites/villager.png")?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    NewGame,
    LoadGame,
}

impl MenuChoice {
    fn target(self) -> SceneKey {
        match self {
            MenuChoice::NewGame => PRE_GAME_SCENE,
            MenuChoice::LoadGame => MAIN_SCENE,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct TitleScene {
    buttons: Vec<(DisplayId, MenuChoice)>,
}

impl TitleScene {
    fn add_button(
        &mut self,
        ctx: &mut SceneContext<'_>,
        at: (f32, f32),
        label: &str,
        choice: MenuChoice,
    ) {
        let style = TextStyle {
            cell_size: BUTTON_CELL_PX,
            ..TextStyle::default()
        };
        let display = ctx.world_mut().display_mut();
        let id = display.add_text(at.0, at.1, label, style);
        if let Some(object) = display.get_mut(id) {
            let size = object.frame_size();
            object.set_interactive(Rect::new(0.0, 0.0, size.x, size.y));
        }
        self.buttons.push((id, choice));
    }

    /// Buttons act when the pointer is released over them.
    fn clicked_choice(&self, input: &InputSnapshot, ctx: &SceneContext<'_>) -> Option<MenuChoice> {
        let release = input.release_position_px()?;
        let world = ctx.world();
        let point = world.cameras().main().screen_to_world(release, 1.0);
        self.buttons.iter().find_map(|(id, choice)| {
            world
                .display()
                .get(*id)
                .is_some_and(|object| object.hit_test(point))
                .then_some(*choice)
        })
    }
}

impl Scene for TitleScene {
    fn key(&self) -> SceneKey {
        TITLE_SCENE
    }

    fn preload(&mut self, assets: &mut AssetRegistry) -> Result<(), AssetError> {
        register_manifest(assets)
    }

    fn create(&mut self, _payload: &LaunchPayload, ctx: &mut SceneContext<'_>) {
        self.buttons.clear();
        self.add_button(ctx, NEW_GAME_AT, "New Game", MenuChoice::NewGame);
        self.add_button(ctx, LOAD_GAME_AT, "Load Game", MenuChoice::LoadGame);
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        ctx: &mut SceneContext<'_>,
    ) -> SceneCommand {
        match self.clicked_choice(input, ctx) {
            Some(choice) => {
                info!(choice = ?choice, "title_choice");
                SceneCommand::Start(choice.target())
            }
            None => SceneCommand::None,
        }
    }
}
