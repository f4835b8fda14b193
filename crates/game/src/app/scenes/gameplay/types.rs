#[derive(Debug, Error)]
enum LevelError {
    #[error("no tilemap registered under '{0}'")]
    Unregistered(&'static str),
    #[error(transparent)]
    Map(#[from] TiledError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EnemyState {
    entity: EntityId,
    health: u32,
    max_health: u32,
}

impl EnemyState {
    fn new(entity: EntityId, tuning: &EnemyTuning) -> Self {
        Self {
            entity,
            health: tuning.max_health,
            max_health: tuning.max_health,
        }
    }

    fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Returns true only for the hit that kills.
    fn take_hit(&mut self, damage: u32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health = self.health.saturating_sub(damage);
        !self.is_alive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Projectile {
    entity: EntityId,
    remaining_seconds: f32,
}

/// Everything spawned by `create`; absent before the first run.
#[derive(Debug)]
struct Stage {
    player: PlayerState,
    enemy: EnemyState,
    doctor: Npc,
    dead_npc: EntityId,
    projectiles: Vec<Projectile>,
    doctor_talked: bool,
    /// Pending return to the title once the player has died.
    game_over: Option<TimerHandle>,
}

impl Stage {
    fn cast(&self) -> CutsceneCast {
        CutsceneCast {
            player: self.player.entity(),
            doctor: Some(self.doctor.entity()),
            dead_npc: Some(self.dead_npc),
        }
    }
}

pub(crate) struct MainScene {
    config: GameConfig,
    asset_root: PathBuf,
    controls: ControlState,
    timeline: CutsceneTimeline,
    stage: Option<Stage>,
}

impl MainScene {
    pub(crate) fn new(config: &GameConfig, asset_root: PathBuf) -> Self {
        Self {
            config: config.clone(),
            asset_root,
            controls: ControlState::default(),
            timeline: CutsceneTimeline::default(),
            stage: None,
        }
    }
}
