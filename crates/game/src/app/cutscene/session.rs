use engine::{DisplayId, InputAction, InputSnapshot, SceneWorld, Vec2};
use tracing::debug;

use super::dialogue::{AdvanceOutcome, DialogueScript, DialogueSequencer, SequencerError};
use super::ui::DialogueBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionProgress {
    Idle,
    Waiting,
    Advanced(usize),
    Finished,
}

/// A running script together with the dialogue box that shows it.
#[derive(Debug, Default)]
pub(crate) struct DialogueSession {
    sequencer: DialogueSequencer,
    ui: Option<DialogueBox>,
    tick: u64,
    armed: bool,
}

impl DialogueSession {
    pub(crate) fn is_active(&self) -> bool {
        self.sequencer.is_active()
    }

    /// Renders the first line and returns the ids of the dialogue box.
    pub(crate) fn start(
        &mut self,
        world: &mut SceneWorld,
        script: &DialogueScript,
        anchor: Vec2,
        offset: Vec2,
    ) -> Result<[DisplayId; 3], SequencerError> {
        let first = self.sequencer.begin(script.clone())?;
        let ui = DialogueBox::generate(world.display_mut(), anchor, offset, first);
        self.ui = Some(ui);
        self.armed = false;
        Ok(ui.ids())
    }

    /// One advance intent per tick: confirm or a click on the line text.
    /// The tick that started the session never advances it.
    pub(crate) fn handle_input(
        &mut self,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> Result<SessionProgress, SequencerError> {
        if !self.is_active() {
            return Ok(SessionProgress::Idle);
        }
        self.tick = self.tick.wrapping_add(1);
        if !self.armed {
            self.armed = true;
            return Ok(SessionProgress::Waiting);
        }
        if !self.wants_advance(input, world) {
            return Ok(SessionProgress::Waiting);
        }
        self.advance(world)
    }

    fn wants_advance(&self, input: &InputSnapshot, world: &SceneWorld) -> bool {
        if input.was_pressed(InputAction::Confirm) {
            return true;
        }
        let (Some(ui), Some(click)) = (self.ui.as_ref(), input.click_position_px()) else {
            return false;
        };
        let point = world.cameras().main().screen_to_world(click, 0.0);
        ui.line_hit(world.display(), point)
    }

    pub(crate) fn advance(&mut self, world: &mut SceneWorld) -> Result<SessionProgress, SequencerError> {
        match self.sequencer.advance(self.tick)? {
            AdvanceOutcome::Advanced(index) => {
                if let (Some(ui), Some(line)) = (self.ui.as_ref(), self.sequencer.current_line()) {
                    ui.show_line(world.display_mut(), line);
                }
                debug!(line = index, "dialogue_advanced");
                Ok(SessionProgress::Advanced(index))
            }
            AdvanceOutcome::Finished => {
                if let Some(ui) = self.ui.take() {
                    ui.destroy(world.display_mut());
                }
                debug!("dialogue_finished");
                Ok(SessionProgress::Finished)
            }
            AdvanceOutcome::AlreadyAdvanced => Ok(SessionProgress::Waiting),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(lines: &[&str]) -> DialogueScript {
        let names = vec!["Doc".to_string(); lines.len()];
        let texts = lines.iter().map(|line| line.to_string()).collect();
        DialogueScript::from_parallel(names, texts).expect("script")
    }

    fn confirm() -> InputSnapshot {
        InputSnapshot::empty().with_action_pressed(InputAction::Confirm)
    }

    #[test]
    fn starting_tick_is_ignored_then_confirm_walks_script() {
        let mut world = SceneWorld::default();
        let mut session = DialogueSession::default();
        let ids = session
            .start(&mut world, &script(&["Help!", "Run!"]), Vec2::new(400.0, 100.0), Vec2::ZERO)
            .expect("start");
        assert_eq!(world.display().text(ids[1]), Some("Help!"));

        assert_eq!(session.handle_input(&confirm(), &mut world), Ok(SessionProgress::Waiting));
        assert_eq!(session.handle_input(&confirm(), &mut world), Ok(SessionProgress::Advanced(1)));
        assert_eq!(world.display().text(ids[1]), Some("Run!"));
        assert_eq!(session.handle_input(&confirm(), &mut world), Ok(SessionProgress::Finished));
        assert!(world.display().is_empty());
        assert_eq!(session.handle_input(&confirm(), &mut world), Ok(SessionProgress::Idle));
        assert_eq!(session.advance(&mut world), Err(SequencerError::NoActiveSession));
    }

    #[test]
    fn click_on_line_advances_and_click_elsewhere_does_not() {
        let mut world = SceneWorld::default();
        let mut session = DialogueSession::default();
        let ids = session
            .start(&mut world, &script(&["a", "b", "c"]), Vec2::new(400.0, 100.0), Vec2::ZERO)
            .expect("start");
        session
            .handle_input(&InputSnapshot::empty(), &mut world)
            .expect("arm");

        let miss = InputSnapshot::empty()
            .with_cursor_position_px(Some(Vec2::new(5.0, 5.0)))
            .with_left_click_pressed(true);
        assert_eq!(session.handle_input(&miss, &mut world), Ok(SessionProgress::Waiting));

        let centre = world.display().get(ids[1]).expect("line").bounds().center();
        let hit = InputSnapshot::empty()
            .with_cursor_position_px(Some(centre))
            .with_left_click_pressed(true);
        assert_eq!(session.handle_input(&hit, &mut world), Ok(SessionProgress::Advanced(1)));
    }

    #[test]
    fn confirm_and_click_in_one_tick_advance_once() {
        let mut world = SceneWorld::default();
        let mut session = DialogueSession::default();
        let ids = session
            .start(&mut world, &script(&["a", "b", "c"]), Vec2::new(400.0, 100.0), Vec2::ZERO)
            .expect("start");
        session
            .handle_input(&InputSnapshot::empty(), &mut world)
            .expect("arm");
        let centre = world.display().get(ids[1]).expect("line").bounds().center();
        let both = confirm()
            .with_cursor_position_px(Some(centre))
            .with_left_click_pressed(true);

        assert_eq!(session.handle_input(&both, &mut world), Ok(SessionProgress::Advanced(1)));
        assert_eq!(session.advance(&mut world), Ok(SessionProgress::Waiting));
        assert_eq!(world.display().text(ids[1]), Some("b"));
    }
}
