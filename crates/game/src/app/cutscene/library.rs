use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use super::dialogue::{DialogueScript, SequencerError};

pub(crate) const PRE_GAME_SCRIPT: &str = "preGame";
pub(crate) const TUTORIAL_SCRIPT: &str = "tutorial";
pub(crate) const ROBOT_KILLED_SCRIPT: &str = "robotKilled";

const EMBEDDED_SCRIPTS: &str = include_str!("../../../dialogue/scripts.json");

#[derive(Debug, Error)]
pub(crate) enum LibraryError {
    #[error("failed to parse dialogue scripts at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("dialogue script '{name}' is invalid: {source}")]
    Script {
        name: String,
        #[source]
        source: SequencerError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScript {
    #[serde(rename = "textLines")]
    text_lines: Vec<String>,
    #[serde(rename = "nameTextLines")]
    name_text_lines: Vec<String>,
}

/// Named dialogue scripts.
#[derive(Debug, Clone, Default)]
pub(crate) struct DialogueLibrary {
    scripts: BTreeMap<String, DialogueScript>,
}

impl DialogueLibrary {
    pub(crate) fn embedded() -> Result<Self, LibraryError> {
        Self::from_json_str(EMBEDDED_SCRIPTS)
    }

    pub(crate) fn from_json_str(raw: &str) -> Result<Self, LibraryError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let raw_scripts: BTreeMap<String, RawScript> =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
                LibraryError::Parse {
                    path: error.path().to_string(),
                    source: error.into_inner(),
                }
            })?;

        let mut scripts = BTreeMap::new();
        for (name, raw_script) in raw_scripts {
            let script =
                DialogueScript::from_parallel(raw_script.name_text_lines, raw_script.text_lines)
                    .map_err(|source| LibraryError::Script {
                        name: name.clone(),
                        source,
                    })?;
            scripts.insert(name, script);
        }
        Ok(Self { scripts })
    }

    pub(crate) fn script(&self, name: &str) -> Option<&DialogueScript> {
        self.scripts.get(name)
    }
}
