//! Typed records exchanged with the record store
//!
//! Rows arrive from the store as loosely typed JSON. These models are the
//! boundary where they become strongly typed: the serialized option list is
//! decoded into a fixed-size array and the correct answer index is range
//! checked, so a malformed question fails on ingestion rather than while a
//! user is answering it.

use heck::ToTitleCase;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::SystemTime;

use crate::{
    constants::quiz::{MAX_OPTION_LENGTH, MAX_PROMPT_LENGTH, OPTION_COUNT},
    ids::{ChallengeId, QuestionId, UserId},
};

/// Error produced when an answer index is outside `0..OPTION_COUNT`
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("answer index {0} is out of range")]
pub struct AnswerIndexError(pub usize);

/// Index of an answer option, always within `0..OPTION_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct AnswerIndex(u8);

impl AnswerIndex {
    /// Returns the index as a `usize`
    pub fn get(self) -> usize {
        usize::from(self.0)
    }

    /// Letter shown next to the option ("A" to "D")
    pub fn letter(self) -> char {
        char::from(b'A' + self.0)
    }

    /// All valid indices in display order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..OPTION_COUNT as u8).map(Self)
    }
}

impl TryFrom<usize> for AnswerIndex {
    type Error = AnswerIndexError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        if value < OPTION_COUNT {
            Ok(Self(value as u8))
        } else {
            Err(AnswerIndexError(value))
        }
    }
}

impl From<AnswerIndex> for usize {
    fn from(value: AnswerIndex) -> Self {
        value.get()
    }
}

/// Difficulty of a quiz question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Easy question
    Easy,
    /// Medium question
    Medium,
    /// Hard question
    Hard,
}

impl Difficulty {
    /// Lowercase name used by the store
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Badge text, e.g. "Medium"
    pub fn label(self) -> String {
        self.as_str().to_title_case()
    }
}

fn validate_options(options: &[String; OPTION_COUNT], _ctx: &()) -> garde::Result {
    match options
        .iter()
        .position(|o| o.trim().is_empty() || o.chars().count() > MAX_OPTION_LENGTH)
    {
        None => Ok(()),
        Some(i) => Err(garde::Error::new(format!(
            "option {i} must be between 1 and {MAX_OPTION_LENGTH} characters"
        ))),
    }
}

/// A multiple choice question as stored in the question source
///
/// The `options` column holds a JSON-encoded list of exactly four strings.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, garde::Validate)]
pub struct QuizQuestion {
    /// Question identifier
    #[garde(skip)]
    pub id: QuestionId,
    /// The prompt shown to the user
    #[garde(length(min = 1, max = MAX_PROMPT_LENGTH))]
    pub question: String,
    /// The answer options in display order
    #[serde_as(as = "serde_with::json::JsonString")]
    #[garde(custom(validate_options))]
    pub options: [String; OPTION_COUNT],
    /// Index of the correct option
    #[garde(skip)]
    pub correct_answer: AnswerIndex,
    /// Difficulty badge
    #[garde(skip)]
    pub difficulty: Difficulty,
    /// Category badge
    #[garde(skip)]
    pub category: String,
}

impl QuizQuestion {
    /// Whether `answer` is the correct option
    pub fn is_correct(&self, answer: AnswerIndex) -> bool {
        self.correct_answer == answer
    }

    /// Text of the option at `answer`
    pub fn option(&self, answer: AnswerIndex) -> &str {
        &self.options[answer.get()]
    }
}

/// Lifecycle state of a challenge record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// Created, nobody has finished yet
    #[default]
    Pending,
    /// One participant has finished
    InProgress,
    /// Scored and settled
    Completed,
}

impl ChallengeStatus {
    /// Name used by the store
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Badge text, e.g. "In Progress"
    pub fn label(self) -> String {
        self.as_str().to_title_case()
    }
}

impl From<ChallengeStatus> for serde_json::Value {
    fn from(value: ChallengeStatus) -> Self {
        serde_json::Value::String(value.as_str().to_string())
    }
}

/// A head-to-head challenge between two users
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge identifier
    pub id: ChallengeId,
    /// The user who issued the challenge
    pub challenger_id: UserId,
    /// The user who was challenged
    pub opponent_id: UserId,
    /// Current lifecycle state
    pub status: ChallengeStatus,
    /// Winner once completed; `None` for a draw or an unsettled challenge
    pub winner_id: Option<UserId>,
    /// Creation time
    #[serde_as(as = "serde_with::TimestampMilliSeconds<i64>")]
    pub created_at: SystemTime,
}

impl Challenge {
    /// Whether `user` is the challenger or the opponent
    pub fn is_participant(&self, user: UserId) -> bool {
        self.challenger_id == user || self.opponent_id == user
    }

    /// Whether `user` issued this challenge
    pub fn is_challenger(&self, user: UserId) -> bool {
        self.challenger_id == user
    }

    /// The other participant from `user`'s point of view
    ///
    /// Returns `None` when `user` is not a participant.
    pub fn counterpart(&self, user: UserId) -> Option<UserId> {
        if self.challenger_id == user {
            Some(self.opponent_id)
        } else if self.opponent_id == user {
            Some(self.challenger_id)
        } else {
            None
        }
    }

    /// Whether `user` may start this challenge from the directory
    ///
    /// Only the opponent of a pending challenge is offered a start action.
    pub fn can_start(&self, user: UserId) -> bool {
        self.status == ChallengeStatus::Pending && self.opponent_id == user
    }
}

/// One participant's answer to one question of a challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// The challenge being played
    pub challenge_id: ChallengeId,
    /// The answering participant
    pub user_id: UserId,
    /// The answered question
    pub question_id: QuestionId,
    /// The option the participant picked
    pub selected_answer: AnswerIndex,
    /// Whether the pick was correct
    pub is_correct: bool,
}

/// A user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile identifier, shared with the auth user
    pub id: UserId,
    /// Display name
    pub username: String,
    /// Accumulated solo quiz points
    pub points: u64,
}

impl Profile {
    /// Upper-cased first character of the username, for avatars
    pub fn initial(&self) -> Option<char> {
        self.username.chars().next().map(|c| c.to_ascii_uppercase())
    }
}

/// Display fields of a profile embedded in another record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRef {
    /// Display name
    pub username: String,
    /// Points, when the embed selected them
    #[serde(default)]
    pub points: Option<u64>,
}

/// Marks that a user has been awarded points for a question set
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizCompletion {
    /// The awarded user
    pub user_id: UserId,
    /// Key of the question set, see [`question_set_key`]
    pub question_set: String,
    /// Correct answers in that run
    pub score: usize,
    /// When the award happened
    #[serde_as(as = "serde_with::TimestampMilliSeconds<i64>")]
    pub completed_at: SystemTime,
}

/// Stable key identifying a sample of questions regardless of order
pub fn question_set_key(questions: &[QuizQuestion]) -> String {
    use itertools::Itertools;

    questions
        .iter()
        .map(|q| q.id.to_string())
        .sorted()
        .join(",")
}

/// Formats a points amount, e.g. "1 point" or "30 points"
pub fn points_label(points: u64) -> String {
    pluralizer::pluralize("point", isize::try_from(points).unwrap_or(isize::MAX), true)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use garde::Validate;
    use serde_json::json;

    fn question_json(options: &str, correct: usize) -> serde_json::Value {
        json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "question": "Which planet is known as the red planet?",
            "options": options,
            "correct_answer": correct,
            "difficulty": "easy",
            "category": "science",
        })
    }

    #[test]
    fn test_question_decodes_serialized_options() {
        let question: QuizQuestion = serde_json::from_value(question_json(
            r#"["Venus","Mars","Jupiter","Saturn"]"#,
            1,
        ))
        .unwrap();

        assert_eq!(question.options[1], "Mars");
        assert_eq!(question.difficulty, Difficulty::Easy);
        assert!(question.is_correct(AnswerIndex::try_from(1).unwrap()));
        assert!(!question.is_correct(AnswerIndex::try_from(0).unwrap()));
        assert!(question.validate().is_ok());
    }

    #[test]
    fn test_question_rejects_wrong_option_count() {
        let result: Result<QuizQuestion, _> =
            serde_json::from_value(question_json(r#"["Venus","Mars","Jupiter"]"#, 1));
        assert!(result.is_err());
    }

    #[test]
    fn test_question_rejects_unparseable_options() {
        let result: Result<QuizQuestion, _> =
            serde_json::from_value(question_json("Venus, Mars, Jupiter, Saturn", 1));
        assert!(result.is_err());
    }

    #[test]
    fn test_question_rejects_out_of_range_answer() {
        let result: Result<QuizQuestion, _> = serde_json::from_value(question_json(
            r#"["Venus","Mars","Jupiter","Saturn"]"#,
            4,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_question_validation_rejects_blank_option() {
        let question: QuizQuestion = serde_json::from_value(question_json(
            r#"["Venus","  ","Jupiter","Saturn"]"#,
            0,
        ))
        .unwrap();
        assert!(question.validate().is_err());
    }

    #[test]
    fn test_question_serializes_options_as_text() {
        let question: QuizQuestion = serde_json::from_value(question_json(
            r#"["Venus","Mars","Jupiter","Saturn"]"#,
            1,
        ))
        .unwrap();
        let value = serde_json::to_value(&question).unwrap();
        assert!(value["options"].is_string());
    }

    #[test]
    fn test_answer_index_bounds_and_letters() {
        assert!(AnswerIndex::try_from(3).is_ok());
        assert_eq!(AnswerIndex::try_from(4), Err(AnswerIndexError(4)));
        let letters: String = AnswerIndex::all().map(AnswerIndex::letter).collect();
        assert_eq!(letters, "ABCD");
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ChallengeStatus::Pending.label(), "Pending");
        assert_eq!(ChallengeStatus::InProgress.label(), "In Progress");
        assert_eq!(ChallengeStatus::Completed.label(), "Completed");
        assert_eq!(
            serde_json::to_value(ChallengeStatus::InProgress).unwrap(),
            json!("in_progress")
        );
    }

    fn challenge(challenger: UserId, opponent: UserId) -> Challenge {
        Challenge {
            id: ChallengeId::new(),
            challenger_id: challenger,
            opponent_id: opponent,
            status: ChallengeStatus::Pending,
            winner_id: None,
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn test_counterpart_from_either_side() {
        let alice = UserId::new();
        let bob = UserId::new();
        let c = challenge(alice, bob);

        assert_eq!(c.counterpart(alice), Some(bob));
        assert_eq!(c.counterpart(bob), Some(alice));
        assert_eq!(c.counterpart(UserId::new()), None);
    }

    #[test]
    fn test_only_opponent_can_start_pending() {
        let alice = UserId::new();
        let bob = UserId::new();
        let mut c = challenge(alice, bob);

        assert!(c.can_start(bob));
        assert!(!c.can_start(alice));

        c.status = ChallengeStatus::Completed;
        assert!(!c.can_start(bob));
    }

    #[test]
    fn test_challenge_timestamp_round_trip() {
        let c = challenge(UserId::new(), UserId::new());
        let value = serde_json::to_value(&c).unwrap();
        assert!(value["created_at"].is_i64());
        assert_eq!(value["winner_id"], serde_json::Value::Null);
    }

    #[test]
    fn test_points_label() {
        assert_eq!(points_label(1), "1 point");
        assert_eq!(points_label(30), "30 points");
    }

    #[test]
    fn test_profile_initial() {
        let profile = Profile {
            id: UserId::new(),
            username: "bob".to_string(),
            points: 0,
        };
        assert_eq!(profile.initial(), Some('B'));
    }
}
