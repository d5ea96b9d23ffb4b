//! Runtime options
//!
//! Options are deserialized from JSON and validated with garde before any
//! flow uses them. Every participant of a challenge must run with the same
//! `question_count`, otherwise their samples diverge.

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    constants,
    error::{Error, Result},
};

/// How a finishing participant writes the outcome of a challenge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizePolicy {
    /// Complete the challenge only once both ledgers are full, and only if
    /// it is not already completed
    #[default]
    AwaitBoth,
    /// Every finisher unconditionally marks the challenge completed with the
    /// winner it computed; the last write wins
    LastWriterWins,
}

/// Whether repeating a solo quiz awards points again
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatAwards {
    /// Every completion adds points
    #[default]
    Always,
    /// Points are awarded once per user and question set
    OncePerQuestionSet,
}

/// Options shared by the challenge and solo quiz flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Options {
    /// Number of questions in every sample
    #[garde(range(
        min = constants::config::MIN_QUESTION_COUNT,
        max = constants::config::MAX_QUESTION_COUNT
    ))]
    pub question_count: usize,
    /// Profile points awarded per correct solo answer
    #[garde(range(max = constants::config::MAX_POINTS_PER_CORRECT))]
    pub points_per_correct: u64,
    /// Challenge completion policy
    #[garde(skip)]
    pub finalize: FinalizePolicy,
    /// Solo quiz repeat award policy
    #[garde(skip)]
    pub repeat_awards: RepeatAwards,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            question_count: constants::quiz::QUESTION_COUNT,
            points_per_correct: constants::quiz::POINTS_PER_CORRECT,
            finalize: FinalizePolicy::default(),
            repeat_awards: RepeatAwards::default(),
        }
    }
}

impl Options {
    /// Parses and validates options from a JSON document
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the document is malformed or a value is
    /// out of bounds.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        options.validated()
    }

    /// Validates the options, returning them unchanged when valid
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` with the garde report when a value is out of
    /// bounds.
    pub fn validated(self) -> Result<Self> {
        self.validate().map_err(|e| Error::Config(e.to_string()))?;
        Ok(self)
    }
}
