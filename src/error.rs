//! Crate-wide error type

use thiserror::Error;

use crate::{
    ids::{ChallengeId, UserId},
    store::StoreError,
};

/// Errors surfaced by the quiz and challenge flows
#[derive(Error, Debug)]
pub enum Error {
    /// The record store rejected or failed a request
    #[error("record store request failed: {0}")]
    Store(#[from] StoreError),
    /// A row could not be decoded into its typed model
    #[error("malformed {entity} record: {source}")]
    Decode {
        /// The kind of record being decoded
        entity: &'static str,
        /// The underlying deserialization failure
        source: serde_json::Error,
    },
    /// A row decoded but failed validation
    #[error("invalid {entity} record: {reason}")]
    Invalid {
        /// The kind of record being validated
        entity: &'static str,
        /// Human readable validation report
        reason: String,
    },
    /// The question source returned an empty sample
    #[error("no questions available")]
    NoQuestions,
    /// The challenge does not exist in the store
    #[error("challenge {0} not found")]
    ChallengeNotFound(ChallengeId),
    /// The profile does not exist in the store
    #[error("profile {0} not found")]
    ProfileNotFound(UserId),
    /// The current user is neither the challenger nor the opponent
    #[error("user is not a participant of this challenge")]
    NotParticipant,
    /// A user tried to challenge themselves
    #[error("cannot challenge yourself")]
    SelfChallenge,
    /// The runtime options are out of bounds or malformed
    #[error("invalid options: {0}")]
    Config(String),
}

/// Result alias defaulting to the crate [`enum@Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;
