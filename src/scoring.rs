//! Challenge scoring
//!
//! Scores are never stored on the challenge record. They are derived from
//! the response ledger every time they are needed: a participant's score is
//! the number of their ledger rows marked correct, counting each question at
//! most once.

use std::collections::HashSet;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    ids::{QuestionId, UserId},
    model::{Challenge, ChallengeResponse},
};

/// One participant's answers as read from the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers {
    questions: HashSet<QuestionId>,
    correct: usize,
}

impl Answers {
    fn collect<'a>(responses: impl Iterator<Item = &'a ChallengeResponse>) -> Self {
        let unique = responses.unique_by(|r| r.question_id).collect_vec();
        Self {
            questions: unique.iter().map(|r| r.question_id).collect(),
            correct: unique.iter().filter(|r| r.is_correct).count(),
        }
    }

    /// Number of correct answers
    pub fn score(&self) -> usize {
        self.correct
    }

    /// Number of distinct questions answered
    pub fn answered(&self) -> usize {
        self.questions.len()
    }

    /// Whether `question` has been answered
    pub fn has_answered(&self, question: QuestionId) -> bool {
        self.questions.contains(&question)
    }
}

/// The ledger of one challenge, split by participant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    /// The viewing user's answers
    pub user: Answers,
    /// The other participant's answers
    pub opponent: Answers,
}

impl Tally {
    /// Splits `responses` into the viewer's rows and everyone else's
    pub fn from_ledger(responses: &[ChallengeResponse], user: UserId) -> Self {
        let (mine, theirs): (Vec<_>, Vec<_>) =
            responses.iter().partition(|r| r.user_id == user);
        Self {
            user: Answers::collect(mine.into_iter()),
            opponent: Answers::collect(theirs.into_iter()),
        }
    }

    /// The outcome from the viewer's perspective
    pub fn outcome(&self) -> Outcome {
        Outcome::from_scores(self.user.score(), self.opponent.score())
    }
}

/// Result of a challenge from one participant's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    /// The viewer scored higher
    Won,
    /// Equal scores
    Draw,
    /// The other participant scored higher
    Lost,
}

impl Outcome {
    /// Compares the viewer's score with the other participant's
    pub fn from_scores(user: usize, opponent: usize) -> Self {
        match user.cmp(&opponent) {
            std::cmp::Ordering::Greater => Self::Won,
            std::cmp::Ordering::Equal => Self::Draw,
            std::cmp::Ordering::Less => Self::Lost,
        }
    }

    /// Result banner text
    pub fn message(self) -> &'static str {
        match self {
            Self::Won => "You Won!",
            Self::Draw => "It's a Draw!",
            Self::Lost => "You Lost",
        }
    }
}

/// Resolves the winner to store on `challenge` when `user` finishes
///
/// A higher user score names `user`; a higher opponent score names the other
/// participant, whichever role `user` holds; equal scores are a draw. The
/// result is always `None` or one of the two participants.
pub fn resolve_winner(
    challenge: &Challenge,
    user: UserId,
    user_score: usize,
    opponent_score: usize,
) -> Option<UserId> {
    match Outcome::from_scores(user_score, opponent_score) {
        Outcome::Won => challenge.is_participant(user).then_some(user),
        Outcome::Lost => challenge.counterpart(user),
        Outcome::Draw => None,
    }
}
