use engine::{EntityId, SceneWorld};

/// Player-control flags owned by the gameplay scene. `freeze` remembers the
/// flags it overrides so `release` can put them back exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ControlState {
    dialogue_in_progress: bool,
    can_melee: bool,
    shooting: bool,
    saved: Option<SavedControls>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SavedControls {
    can_melee: bool,
    shooting: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            dialogue_in_progress: false,
            can_melee: true,
            shooting: false,
            saved: None,
        }
    }
}

impl ControlState {
    pub(crate) fn dialogue_in_progress(&self) -> bool {
        self.dialogue_in_progress
    }

    pub(crate) fn can_melee(&self) -> bool {
        self.can_melee
    }

    /// `true` blocks firing a new shot.
    pub(crate) fn shooting(&self) -> bool {
        self.shooting
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.saved.is_some()
    }

    /// Stops the player and blocks melee and shooting. Freezing twice keeps
    /// the values saved by the first call.
    pub(crate) fn freeze(&mut self, world: &mut SceneWorld, player: EntityId) {
        if let Some(body) = world.body_mut(player) {
            body.set_velocity_x(0.0);
            body.set_velocity_y(0.0);
        }
        if self.saved.is_none() {
            self.saved = Some(SavedControls {
                can_melee: self.can_melee,
                shooting: self.shooting,
            });
        }
        self.can_melee = false;
        self.shooting = true;
        self.dialogue_in_progress = true;
    }

    pub(crate) fn release(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.can_melee = saved.can_melee;
            self.shooting = saved.shooting;
        }
        self.dialogue_in_progress = false;
    }
}

#[cfg(test)]
mod tests {
    use engine::{Body, RenderableDesc, Transform, Vec2};

    use super::*;

    fn world_with_moving_player() -> (SceneWorld, EntityId) {
        let mut world = SceneWorld::default();
        let mut body = Body::new(Vec2::new(10.0, 10.0));
        body.velocity = Vec2::new(120.0, -40.0);
        let player = world.spawn_body(
            Transform::at(Vec2::new(50.0, 50.0)),
            RenderableDesc::placeholder([0, 255, 0, 255], "player"),
            body,
        );
        world.apply_pending();
        (world, player)
    }

    #[test]
    fn freeze_stops_player_and_blocks_actions() {
        let (mut world, player) = world_with_moving_player();
        let mut controls = ControlState::default();

        controls.freeze(&mut world, player);

        let body = world.body(player).expect("body");
        assert_eq!(body.velocity, Vec2::ZERO);
        assert!(controls.dialogue_in_progress());
        assert!(!controls.can_melee());
        assert!(controls.shooting());
    }

    #[test]
    fn release_restores_pre_freeze_controls() {
        let (mut world, player) = world_with_moving_player();
        let mut controls = ControlState::default();

        controls.freeze(&mut world, player);
        controls.freeze(&mut world, player);
        controls.release();

        assert_eq!(controls, ControlState::default());
        assert!(!controls.is_frozen());
    }

    #[test]
    fn release_without_freeze_only_clears_dialogue_flag() {
        let mut controls = ControlState::default();
        controls.release();
        assert!(controls.can_melee());
        assert!(!controls.shooting());
        assert!(!controls.dialogue_in_progress());
    }
}
