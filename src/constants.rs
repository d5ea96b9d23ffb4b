//! Configuration constants for the quiz and challenge flows
//!
//! This module contains the fixed limits used throughout the crate so that
//! both participants of a challenge, and every solo quiz, agree on the same
//! boundaries.

/// Quiz question constants
pub mod quiz {
    /// Number of questions sampled for a solo quiz or a challenge
    pub const QUESTION_COUNT: usize = 5;
    /// Number of answer options every question carries
    pub const OPTION_COUNT: usize = 4;
    /// Points added to a profile for every correct solo answer
    pub const POINTS_PER_CORRECT: u64 = 10;
    /// Maximum length of a question prompt in characters
    pub const MAX_PROMPT_LENGTH: usize = 500;
    /// Maximum length of a single answer option in characters
    pub const MAX_OPTION_LENGTH: usize = 200;
}

/// Bounds for the runtime [`Options`](crate::config::Options)
pub mod config {
    /// Minimum number of questions in a sample
    pub const MIN_QUESTION_COUNT: usize = 1;
    /// Maximum number of questions in a sample
    pub const MAX_QUESTION_COUNT: usize = 50;
    /// Maximum points that may be awarded per correct answer
    pub const MAX_POINTS_PER_CORRECT: u64 = 1000;
}

/// Result message thresholds for the solo quiz, as fractions of the total
pub mod tiers {
    /// Fraction of correct answers for the "great" tier
    pub const GREAT: f64 = 0.7;
    /// Fraction of correct answers for the "good" tier
    pub const GOOD: f64 = 0.5;
}
