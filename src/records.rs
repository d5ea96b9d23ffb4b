//! Typed data access
//!
//! `Records` wraps a [`RecordStore`] and exposes one method per backend call
//! the application makes. Rows are decoded into the typed models here, so a
//! malformed row fails as `Error::Decode` (or `Error::Invalid` for questions
//! that decode but fail validation) before it reaches any flow.

use garde::Validate;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use web_time::SystemTime;

use crate::{
    error::{Error, Result},
    ids::{ChallengeId, UserId},
    model::{
        Challenge, ChallengeResponse, ChallengeStatus, Profile, ProfileRef, QuizCompletion,
        QuizQuestion,
    },
    store::{Direction, Embed, Filter, Query, RecordStore, Row, Table},
};

/// A challenge joined with the display names of its participants
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ChallengeRow {
    /// The challenge itself
    #[serde(flatten)]
    pub challenge: Challenge,
    /// Challenger display fields
    pub challenger: Option<ProfileRef>,
    /// Opponent display fields
    pub opponent: Option<ProfileRef>,
    /// Winner display fields
    pub winner: Option<ProfileRef>,
}

fn decode<T: DeserializeOwned>(entity: &'static str, row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row)).map_err(|source| Error::Decode { entity, source })
}

fn decode_all<T: DeserializeOwned>(entity: &'static str, rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter().map(|row| decode(entity, row)).collect()
}

fn encode<T: Serialize>(entity: &'static str, value: &T) -> Result<Row> {
    match serde_json::to_value(value).map_err(|source| Error::Decode { entity, source })? {
        Value::Object(row) => Ok(row),
        _ => Err(Error::Invalid {
            entity,
            reason: "did not serialize to a record".to_string(),
        }),
    }
}

fn patch(value: Value) -> Row {
    match value {
        Value::Object(row) => row,
        _ => Row::new(),
    }
}

/// Typed access to the application's tables
#[derive(Debug)]
pub struct Records<'a, S: ?Sized> {
    store: &'a S,
}

impl<S: ?Sized> Clone for Records<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for Records<'_, S> {}

impl<'a, S: RecordStore + ?Sized> Records<'a, S> {
    /// Wraps a store
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The wrapped store
    pub fn store(self) -> &'a S {
        self.store
    }

    /// Fetches the fixed question sample
    ///
    /// Questions are ordered by id so that every participant requesting a
    /// sample of the same size receives the same questions in the same order.
    pub async fn question_sample(&self, count: usize) -> Result<Vec<QuizQuestion>> {
        let rows = self
            .store
            .select(
                &Query::from(Table::QuizQuestions)
                    .order("id", Direction::Ascending)
                    .limit(count),
            )
            .await?;

        let questions: Vec<QuizQuestion> = decode_all("quiz question", rows)?;
        for question in &questions {
            question.validate().map_err(|report| Error::Invalid {
                entity: "quiz question",
                reason: report.to_string(),
            })?;
        }
        Ok(questions)
    }

    /// Fetches every ledger row of a challenge
    pub async fn responses(&self, challenge: ChallengeId) -> Result<Vec<ChallengeResponse>> {
        let rows = self
            .store
            .select(&Query::from(Table::ChallengeResponses).eq("challenge_id", challenge))
            .await?;
        decode_all("challenge response", rows)
    }

    /// Appends one ledger row
    pub async fn record_response(&self, response: &ChallengeResponse) -> Result<()> {
        let row = encode("challenge response", response)?;
        self.store.insert(Table::ChallengeResponses, row).await?;
        tracing::debug!(
            challenge = %response.challenge_id,
            user = %response.user_id,
            question = %response.question_id,
            is_correct = response.is_correct,
            "response recorded"
        );
        Ok(())
    }

    /// Fetches a single challenge
    pub async fn challenge(&self, id: ChallengeId) -> Result<Challenge> {
        let row = self
            .store
            .select(&Query::from(Table::Challenges).eq("id", id).limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or(Error::ChallengeNotFound(id))?;
        decode("challenge", row)
    }

    /// Inserts a pending challenge issued by `challenger`
    pub async fn create_challenge(
        &self,
        challenger: UserId,
        opponent: UserId,
    ) -> Result<Challenge> {
        let challenge = Challenge {
            id: ChallengeId::new(),
            challenger_id: challenger,
            opponent_id: opponent,
            status: ChallengeStatus::Pending,
            winner_id: None,
            created_at: SystemTime::now(),
        };
        let row = self
            .store
            .insert(Table::Challenges, encode("challenge", &challenge)?)
            .await?;
        decode("challenge", row)
    }

    /// Every challenge `user` takes part in, newest first, with display names
    pub async fn challenges_for(&self, user: UserId) -> Result<Vec<ChallengeRow>> {
        let rows = self
            .store
            .select(
                &Query::from(Table::Challenges)
                    .any(vec![
                        Filter::eq("challenger_id", user),
                        Filter::eq("opponent_id", user),
                    ])
                    .order("created_at", Direction::Descending)
                    .embed(Embed {
                        alias: "challenger",
                        column: "challenger_id",
                        table: Table::Profiles,
                        fields: &["username", "points"],
                    })
                    .embed(Embed {
                        alias: "opponent",
                        column: "opponent_id",
                        table: Table::Profiles,
                        fields: &["username", "points"],
                    })
                    .embed(Embed {
                        alias: "winner",
                        column: "winner_id",
                        table: Table::Profiles,
                        fields: &["username"],
                    }),
            )
            .await?;
        decode_all("challenge", rows)
    }

    /// Sets status and winner unconditionally
    pub async fn complete_challenge(
        &self,
        id: ChallengeId,
        winner: Option<UserId>,
    ) -> Result<Option<Challenge>> {
        self.update_challenge(
            &[Filter::eq("id", id)],
            json!({"status": ChallengeStatus::Completed, "winner_id": winner}),
        )
        .await
    }

    /// Sets status and winner unless the challenge is already completed
    ///
    /// Returns `None` when another writer completed it first.
    pub async fn complete_challenge_once(
        &self,
        id: ChallengeId,
        winner: Option<UserId>,
    ) -> Result<Option<Challenge>> {
        self.update_challenge(
            &[
                Filter::eq("id", id),
                Filter::neq("status", ChallengeStatus::Completed),
            ],
            json!({"status": ChallengeStatus::Completed, "winner_id": winner}),
        )
        .await
    }

    /// Moves a pending challenge to in progress
    ///
    /// Returns `None` when the challenge was no longer pending.
    pub async fn mark_in_progress(&self, id: ChallengeId) -> Result<Option<Challenge>> {
        self.update_challenge(
            &[
                Filter::eq("id", id),
                Filter::eq("status", ChallengeStatus::Pending),
            ],
            json!({"status": ChallengeStatus::InProgress}),
        )
        .await
    }

    async fn update_challenge(&self, filters: &[Filter], values: Value) -> Result<Option<Challenge>> {
        self.store
            .update(Table::Challenges, filters, patch(values))
            .await?
            .into_iter()
            .next()
            .map(|row| decode("challenge", row))
            .transpose()
    }

    /// Fetches a profile
    pub async fn profile(&self, id: UserId) -> Result<Profile> {
        let row = self
            .store
            .select(&Query::from(Table::Profiles).eq("id", id).limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or(Error::ProfileNotFound(id))?;
        decode("profile", row)
    }

    /// Every profile except `user`, highest points first
    pub async fn opponents_of(&self, user: UserId) -> Result<Vec<Profile>> {
        let rows = self
            .store
            .select(
                &Query::from(Table::Profiles)
                    .neq("id", user)
                    .order("points", Direction::Descending),
            )
            .await?;
        decode_all("profile", rows)
    }

    /// Overwrites a profile's points
    pub async fn set_points(&self, id: UserId, points: u64) -> Result<Profile> {
        let row = self
            .store
            .update(
                Table::Profiles,
                &[Filter::eq("id", id)],
                patch(json!({"points": points})),
            )
            .await?
            .into_iter()
            .next()
            .ok_or(Error::ProfileNotFound(id))?;
        decode("profile", row)
    }

    /// Whether `user` was already awarded points for `question_set`
    pub async fn has_completion(&self, user: UserId, question_set: &str) -> Result<bool> {
        let rows = self
            .store
            .select(
                &Query::from(Table::QuizCompletions)
                    .eq("user_id", user)
                    .eq("question_set", question_set)
                    .limit(1),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Logs a solo quiz award
    pub async fn record_completion(&self, completion: &QuizCompletion) -> Result<()> {
        self.store
            .insert(
                Table::QuizCompletions,
                encode("quiz completion", completion)?,
            )
            .await?;
        Ok(())
    }
}
