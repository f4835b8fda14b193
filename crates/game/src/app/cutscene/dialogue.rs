use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum SequencerError {
    #[error("dialogue script has {names} speaker names but {lines} lines")]
    ScriptLengthMismatch { names: usize, lines: usize },
    #[error("dialogue script is empty")]
    EmptyScript,
    #[error("no dialogue session is active")]
    NoActiveSession,
    #[error("a dialogue session is already active")]
    AlreadyActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DialogueLine {
    pub(crate) speaker: String,
    pub(crate) text: String,
}

/// Ordered `(speaker, line)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DialogueScript {
    lines: Vec<DialogueLine>,
}

impl DialogueScript {
    /// Zips the two parallel sequences of the script files.
    pub(crate) fn from_parallel(
        name_text_lines: Vec<String>,
        text_lines: Vec<String>,
    ) -> Result<Self, SequencerError> {
        if name_text_lines.len() != text_lines.len() {
            return Err(SequencerError::ScriptLengthMismatch {
                names: name_text_lines.len(),
                lines: text_lines.len(),
            });
        }
        if text_lines.is_empty() {
            return Err(SequencerError::EmptyScript);
        }
        let lines = name_text_lines
            .into_iter()
            .zip(text_lines)
            .map(|(speaker, text)| DialogueLine { speaker, text })
            .collect();
        Ok(Self { lines })
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    pub(crate) fn line(&self, index: usize) -> Option<&DialogueLine> {
        self.lines.get(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SequencerState {
    Idle,
    Active(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdvanceOutcome {
    Advanced(usize),
    Finished,
    /// A second advance arrived in a tick that already advanced.
    AlreadyAdvanced,
}

/// `Idle -> Active(0) -> ... -> Active(n - 1) -> Idle`, at most one step per
/// tick.
#[derive(Debug, Clone)]
pub(crate) struct DialogueSequencer {
    state: SequencerState,
    script: Option<DialogueScript>,
    last_advance_tick: Option<u64>,
}

impl Default for DialogueSequencer {
    fn default() -> Self {
        Self {
            state: SequencerState::Idle,
            script: None,
            last_advance_tick: None,
        }
    }
}

impl DialogueSequencer {
    #[cfg(test)]
    pub(crate) fn state(&self) -> SequencerState {
        self.state
    }

    pub(crate) fn is_active(&self) -> bool {
        matches!(self.state, SequencerState::Active(_))
    }

    pub(crate) fn begin(&mut self, script: DialogueScript) -> Result<&DialogueLine, SequencerError> {
        if self.is_active() {
            return Err(SequencerError::AlreadyActive);
        }
        self.state = SequencerState::Active(0);
        self.last_advance_tick = None;
        let script = self.script.insert(script);
        script.line(0).ok_or(SequencerError::EmptyScript)
    }

    pub(crate) fn current_line(&self) -> Option<&DialogueLine> {
        match self.state {
            SequencerState::Active(index) => self.script.as_ref().and_then(|script| script.line(index)),
            SequencerState::Idle => None,
        }
    }

    pub(crate) fn advance(&mut self, tick: u64) -> Result<AdvanceOutcome, SequencerError> {
        let SequencerState::Active(index) = self.state else {
            return Err(SequencerError::NoActiveSession);
        };
        if self.last_advance_tick == Some(tick) {
            return Ok(AdvanceOutcome::AlreadyAdvanced);
        }
        self.last_advance_tick = Some(tick);
        let len = self.script.as_ref().map_or(0, DialogueScript::len);
        let next = index + 1;
        if next >= len {
            self.state = SequencerState::Idle;
            self.script = None;
            return Ok(AdvanceOutcome::Finished);
        }
        self.state = SequencerState::Active(next);
        Ok(AdvanceOutcome::Advanced(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn script(lines: &[&str]) -> DialogueScript {
        let names = vec!["Doc".to_string(); lines.len()];
        DialogueScript::from_parallel(names, strings(lines)).expect("script")
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let error = DialogueScript::from_parallel(strings(&["Doc"]), strings(&["Help!", "Run!"]))
            .expect_err("mismatch");
        assert_eq!(
            error,
            SequencerError::ScriptLengthMismatch { names: 1, lines: 2 }
        );
    }

    #[test]
    fn empty_script_is_rejected() {
        let error = DialogueScript::from_parallel(Vec::new(), Vec::new()).expect_err("empty");
        assert_eq!(error, SequencerError::EmptyScript);
    }

    #[test]
    fn two_line_script_reaches_idle_after_two_advances() {
        let mut sequencer = DialogueSequencer::default();
        let first = sequencer.begin(script(&["Help!", "Run!"])).expect("begin");
        assert_eq!(first.text, "Help!");
        assert_eq!(sequencer.state(), SequencerState::Active(0));

        assert_eq!(sequencer.advance(1), Ok(AdvanceOutcome::Advanced(1)));
        assert_eq!(sequencer.current_line().map(|line| line.text.as_str()), Some("Run!"));
        assert_eq!(sequencer.advance(2), Ok(AdvanceOutcome::Finished));
        assert_eq!(sequencer.state(), SequencerState::Idle);
        assert_eq!(sequencer.advance(3), Err(SequencerError::NoActiveSession));
    }

    #[test]
    fn n_line_script_walks_every_index_in_order() {
        let mut sequencer = DialogueSequencer::default();
        sequencer.begin(script(&["a", "b", "c", "d"])).expect("begin");
        let mut visited = vec![0];
        for tick in 1..=3 {
            match sequencer.advance(tick).expect("advance") {
                AdvanceOutcome::Advanced(index) => visited.push(index),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(visited, vec![0, 1, 2, 3]);
        assert_eq!(sequencer.advance(4), Ok(AdvanceOutcome::Finished));
        assert_eq!(sequencer.advance(5), Err(SequencerError::NoActiveSession));
    }

    #[test]
    fn second_advance_in_same_tick_is_ignored() {
        let mut sequencer = DialogueSequencer::default();
        sequencer.begin(script(&["a", "b", "c"])).expect("begin");

        assert_eq!(sequencer.advance(7), Ok(AdvanceOutcome::Advanced(1)));
        assert_eq!(sequencer.advance(7), Ok(AdvanceOutcome::AlreadyAdvanced));
        assert_eq!(sequencer.state(), SequencerState::Active(1));
    }

    #[test]
    fn begin_while_active_is_rejected() {
        let mut sequencer = DialogueSequencer::default();
        sequencer.begin(script(&["a"])).expect("begin");
        assert_eq!(
            sequencer.begin(script(&["b"])).map(|line| line.text.clone()),
            Err(SequencerError::AlreadyActive)
        );
    }
}
