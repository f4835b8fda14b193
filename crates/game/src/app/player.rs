use engine::{EntityId, InputAction, InputSnapshot, SceneWorld};

use super::config::PlayerTuning;
use super::cutscene::ControlState;

/// Health, facing and action cooldowns of the player character.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlayerState {
    entity: EntityId,
    health: u32,
    max_health: u32,
    facing: f32,
    melee_cooldown: f32,
    shot_cooldown: f32,
    invulnerable_for: f32,
}

impl PlayerState {
    pub(crate) fn new(entity: EntityId, tuning: &PlayerTuning) -> Self {
        Self {
            entity,
            health: tuning.max_health,
            max_health: tuning.max_health,
            facing: 1.0,
            melee_cooldown: 0.0,
            shot_cooldown: 0.0,
            invulnerable_for: 0.0,
        }
    }

    pub(crate) fn entity(&self) -> EntityId {
        self.entity
    }

    pub(crate) fn health(&self) -> u32 {
        self.health
    }

    pub(crate) fn max_health(&self) -> u32 {
        self.max_health
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// `1.0` facing right, `-1.0` facing left.
    pub(crate) fn facing(&self) -> f32 {
        self.facing
    }

    pub(crate) fn tick(&mut self, fixed_dt_seconds: f32) {
        self.melee_cooldown = (self.melee_cooldown - fixed_dt_seconds).max(0.0);
        self.shot_cooldown = (self.shot_cooldown - fixed_dt_seconds).max(0.0);
        self.invulnerable_for = (self.invulnerable_for - fixed_dt_seconds).max(0.0);
    }

    /// Applies walking and jumping; a frozen player stands still.
    pub(crate) fn steer(
        &mut self,
        world: &mut SceneWorld,
        input: &InputSnapshot,
        controls: &ControlState,
        tuning: &PlayerTuning,
    ) {
        let Some(entity) = world.find_entity_mut(self.entity) else {
            return;
        };
        let Some(body) = entity.body.as_mut() else {
            return;
        };
        if controls.dialogue_in_progress() || self.is_dead() {
            body.set_velocity_x(0.0);
            return;
        }

        let mut direction = 0.0;
        if input.is_down(InputAction::MoveLeft) {
            direction -= 1.0;
        }
        if input.is_down(InputAction::MoveRight) {
            direction += 1.0;
        }
        body.set_velocity_x(direction * tuning.move_speed);
        if input.was_pressed(InputAction::Jump) && body.on_ground() {
            body.set_velocity_y(-tuning.jump_speed);
        }
        if direction != 0.0 {
            self.facing = direction;
            entity.transform.flip_x = direction < 0.0;
        }
    }

    pub(crate) fn try_melee(
        &mut self,
        input: &InputSnapshot,
        controls: &ControlState,
        tuning: &PlayerTuning,
    ) -> bool {
        if !input.was_pressed(InputAction::Melee)
            || !controls.can_melee()
            || self.melee_cooldown > 0.0
            || self.is_dead()
        {
            return false;
        }
        self.melee_cooldown = tuning.melee_cooldown_ms as f32 / 1000.0;
        true
    }

    pub(crate) fn try_shoot(
        &mut self,
        input: &InputSnapshot,
        controls: &ControlState,
        tuning: &PlayerTuning,
    ) -> bool {
        if !input.was_pressed(InputAction::Shoot)
            || controls.shooting()
            || self.shot_cooldown > 0.0
            || self.is_dead()
        {
            return false;
        }
        self.shot_cooldown = tuning.shot_cooldown_ms as f32 / 1000.0;
        true
    }

    /// Returns the new health, or `None` when the hit was absorbed by the
    /// invulnerability window.
    pub(crate) fn take_damage(&mut self, amount: u32, invulnerability_ms: u64) -> Option<u32> {
        if self.invulnerable_for > 0.0 || self.is_dead() {
            return None;
        }
        self.health = self.health.saturating_sub(amount);
        self.invulnerable_for = invulnerability_ms as f32 / 1000.0;
        Some(self.health)
    }
}
