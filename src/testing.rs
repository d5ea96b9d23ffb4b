//! Fixtures shared by the test modules

use std::time::Duration;

use itertools::Itertools;
use serde::Serialize;
use web_time::SystemTime;

use crate::{
    ids::{ChallengeId, QuestionId, UserId},
    model::{AnswerIndex, Challenge, ChallengeStatus, Difficulty, Profile, QuizQuestion},
    store::{MemoryStore, RecordStore, Row, Table},
};

pub fn to_row<T: Serialize>(value: &T) -> Row {
    match serde_json::to_value(value).unwrap() {
        serde_json::Value::Object(row) => row,
        other => panic!("expected an object, got {other}"),
    }
}

/// `count` questions sorted by id, the order the store samples them in
pub fn questions(count: usize) -> Vec<QuizQuestion> {
    (0..count)
        .map(|i| QuizQuestion {
            id: QuestionId::new(),
            question: format!("Question {i}?"),
            options: ["A", "B", "C", "D"].map(|o| format!("Option {o}")),
            correct_answer: AnswerIndex::try_from(i % 4).unwrap(),
            difficulty: Difficulty::Medium,
            category: "general".to_string(),
        })
        .sorted_by_key(|q| q.id.to_string())
        .collect()
}

/// Any answer other than the correct one
pub fn wrong(question: &QuizQuestion) -> AnswerIndex {
    AnswerIndex::all()
        .find(|a| *a != question.correct_answer)
        .unwrap()
}

pub async fn seed_questions(store: &MemoryStore, count: usize) -> Vec<QuizQuestion> {
    let questions = questions(count);
    for question in &questions {
        store
            .insert(Table::QuizQuestions, to_row(question))
            .await
            .unwrap();
    }
    questions
}

pub async fn seed_profile(store: &MemoryStore, username: &str, points: u64) -> Profile {
    let profile = Profile {
        id: UserId::new(),
        username: username.to_string(),
        points,
    };
    store.insert(Table::Profiles, to_row(&profile)).await.unwrap();
    profile
}

/// Alice (30 points) and Bob (50 points)
pub async fn seed_pair(store: &MemoryStore) -> (Profile, Profile) {
    (
        seed_profile(store, "alice", 30).await,
        seed_profile(store, "bob", 50).await,
    )
}

/// A fixed point in time, `millis` after the epoch
pub fn at_millis(millis: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_millis(millis)
}

/// A pending challenge with an explicit creation time
pub async fn seed_challenge(
    store: &MemoryStore,
    challenger: UserId,
    opponent: UserId,
    created_at: SystemTime,
) -> Challenge {
    let challenge = Challenge {
        id: ChallengeId::new(),
        challenger_id: challenger,
        opponent_id: opponent,
        status: ChallengeStatus::Pending,
        winner_id: None,
        created_at,
    };
    store
        .insert(Table::Challenges, to_row(&challenge))
        .await
        .unwrap();
    challenge
}
