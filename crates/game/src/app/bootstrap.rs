use std::rc::Rc;

use engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::config::{load_game_config, GameConfig};
use super::cutscene::{DialogueLibrary, LibraryError};
use super::scenes::{build_scenes, TITLE_SCENE};

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("embedded dialogue is invalid: {0}")]
    Dialogue(#[from] LibraryError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scenes: Vec<Box<dyn Scene>>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Robot Rumble Startup ===");

    let paths = resolve_app_paths()?;
    let game = match load_game_config(Some(paths.config_dir.as_path())) {
        Ok(game) => game,
        Err(error) => {
            warn!(error = %error, "game_config_fallback");
            GameConfig::default()
        }
    };
    let library = Rc::new(DialogueLibrary::embedded()?);

    let mut config = LoopConfig::new(TITLE_SCENE);
    config.window_title = game.window_title.clone();
    config.target_tps = game.target_tps;
    config.max_render_fps = game.max_render_fps;
    let scenes = build_scenes(&game, paths.root, library);

    Ok(AppWiring { config, scenes })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
