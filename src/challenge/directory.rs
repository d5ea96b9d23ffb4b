//! Opponent and challenge listings
//!
//! The directory is where a signed-in user finds someone to challenge,
//! issues the challenge, and later picks a challenge to play or review.
//! Listing failures are logged and show as empty lists; creating a challenge
//! reports its failure to the caller.

use serde::Serialize;

use crate::{
    config::Options,
    error::{Error, Result},
    ids::UserId,
    model::{Challenge, ChallengeStatus, Profile},
    records::{ChallengeRow, Records},
    scoring::Outcome,
    session::UserSession,
    store::RecordStore,
};

use super::ChallengeSession;

/// A challenge as listed for one viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeListing {
    viewer: UserId,
    row: ChallengeRow,
}

impl ChallengeListing {
    fn new(viewer: UserId, row: ChallengeRow) -> Self {
        Self { viewer, row }
    }

    /// The underlying record
    pub fn challenge(&self) -> &Challenge {
        &self.row.challenge
    }

    /// Whether the viewer issued the challenge
    pub fn is_challenger(&self) -> bool {
        self.row.challenge.is_challenger(self.viewer)
    }

    /// Display name of the other participant
    pub fn counterpart(&self) -> Option<&str> {
        let other = if self.is_challenger() {
            &self.row.opponent
        } else {
            &self.row.challenger
        };
        other.as_ref().map(|p| p.username.as_str())
    }

    /// Display name of the winner, if one is stored
    pub fn winner(&self) -> Option<&str> {
        self.row.winner.as_ref().map(|p| p.username.as_str())
    }

    /// "vs X" for issued challenges, "from X" for received ones
    pub fn heading(&self) -> String {
        let name = self.counterpart().unwrap_or("Unknown");
        if self.is_challenger() {
            format!("vs {name}")
        } else {
            format!("from {name}")
        }
    }

    /// Status badge text
    pub fn badge(&self) -> String {
        self.row.challenge.status.label()
    }

    /// Whether the viewer is offered a start action
    pub fn can_start(&self) -> bool {
        self.row.challenge.can_start(self.viewer)
    }

    /// The viewer's result once the challenge is completed
    pub fn result(&self) -> Option<Outcome> {
        let challenge = &self.row.challenge;
        if challenge.status != ChallengeStatus::Completed {
            return None;
        }
        Some(match challenge.winner_id {
            None => Outcome::Draw,
            Some(winner) if winner == self.viewer => Outcome::Won,
            Some(_) => Outcome::Lost,
        })
    }
}

/// A listing flattened for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingView {
    /// The challenge
    pub challenge: Challenge,
    /// "vs X" or "from X"
    pub heading: String,
    /// Status badge text
    pub badge: String,
    /// Whether a start action is shown
    pub can_start: bool,
    /// The viewer's result, once completed
    pub result: Option<Outcome>,
}

impl From<&ChallengeListing> for ListingView {
    fn from(listing: &ChallengeListing) -> Self {
        Self {
            challenge: listing.challenge().clone(),
            heading: listing.heading(),
            badge: listing.badge(),
            can_start: listing.can_start(),
            result: listing.result(),
        }
    }
}

/// Challenge listings and creation for the signed-in user
#[derive(Debug)]
pub struct Directory<'a, S: ?Sized> {
    records: Records<'a, S>,
    session: &'a UserSession,
    options: Options,
}

impl<'a, S: RecordStore + ?Sized> Directory<'a, S> {
    /// Opens the directory for `session`
    pub fn new(store: &'a S, session: &'a UserSession, options: Options) -> Self {
        Self {
            records: Records::new(store),
            session,
            options,
        }
    }

    /// Every other user, highest points first
    pub async fn list_opponents(&self) -> Vec<Profile> {
        self.records
            .opponents_of(self.session.user_id())
            .await
            .unwrap_or_else(|e| {
                tracing::error!(user = %self.session.user_id(), error = %e, "failed to list opponents");
                Vec::new()
            })
    }

    /// Every challenge the user takes part in, newest first
    pub async fn list_my_challenges(&self) -> Vec<ChallengeListing> {
        let viewer = self.session.user_id();
        match self.records.challenges_for(viewer).await {
            Ok(rows) => rows
                .into_iter()
                .map(|row| ChallengeListing::new(viewer, row))
                .collect(),
            Err(e) => {
                tracing::error!(user = %viewer, error = %e, "failed to list challenges");
                Vec::new()
            }
        }
    }

    /// Issues a pending challenge to `opponent`
    ///
    /// # Errors
    ///
    /// Returns `Error::SelfChallenge` when `opponent` is the signed-in user,
    /// `Error::ProfileNotFound` when no such user exists, or the store error
    /// if the challenge could not be written.
    pub async fn create_challenge(&self, opponent: UserId) -> Result<Challenge> {
        let challenger = self.session.user_id();

        let created = async {
            if opponent == challenger {
                return Err(Error::SelfChallenge);
            }
            self.records.profile(opponent).await?;
            self.records.create_challenge(challenger, opponent).await
        }
        .await;

        match &created {
            Ok(challenge) => {
                tracing::info!(challenge = %challenge.id, %challenger, %opponent, "challenge created");
            }
            Err(e) => {
                tracing::error!(%challenger, %opponent, error = %e, "failed to create challenge");
            }
        }
        created
    }

    /// Prepares a session for playing or reviewing `challenge`
    ///
    /// # Errors
    ///
    /// Returns `Error::NotParticipant` when the user is not part of it.
    pub fn open(&self, challenge: Challenge) -> Result<ChallengeSession<'a, S>> {
        ChallengeSession::new(self.records.store(), self.session, challenge, self.options)
    }
}
