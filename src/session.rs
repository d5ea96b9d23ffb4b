//! Signed-in user context
//!
//! A `UserSession` is created when a user signs in and handed explicitly to
//! every flow that acts on their behalf. Signing out consumes it, so no flow
//! can keep acting for a user who has left.

use web_time::SystemTime;

use crate::{
    error::Result,
    ids::UserId,
    model::Profile,
    records::Records,
    store::RecordStore,
};

/// The profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    profile: Profile,
    signed_in_at: SystemTime,
}

impl UserSession {
    /// Starts a session for an authenticated user by loading their profile
    ///
    /// # Errors
    ///
    /// Returns `Error::ProfileNotFound` when the user has no profile, or the
    /// store error if the profile could not be read.
    pub async fn sign_in<S: RecordStore + ?Sized>(store: &S, user: UserId) -> Result<Self> {
        let profile = Records::new(store).profile(user).await?;
        tracing::info!(user = %profile.id, username = %profile.username, "signed in");
        Ok(Self::from_profile(profile))
    }

    /// Starts a session from an already loaded profile
    pub fn from_profile(profile: Profile) -> Self {
        Self {
            profile,
            signed_in_at: SystemTime::now(),
        }
    }

    /// The signed-in user's id
    pub fn user_id(&self) -> UserId {
        self.profile.id
    }

    /// The cached profile
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// When the session started
    pub fn signed_in_at(&self) -> SystemTime {
        self.signed_in_at
    }

    /// Re-reads the profile from the store
    ///
    /// # Errors
    ///
    /// Returns the store or decode error; the cached profile is kept.
    pub async fn refresh<S: RecordStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        self.profile = Records::new(store).profile(self.profile.id).await?;
        Ok(())
    }

    /// Replaces the cached profile after a write made on the user's behalf
    pub(crate) fn update_profile(&mut self, profile: Profile) {
        if profile.id == self.profile.id {
            self.profile = profile;
        }
    }

    /// Ends the session
    pub fn sign_out(self) -> UserId {
        tracing::info!(user = %self.profile.id, "signed out");
        self.profile.id
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        records::Records,
        store::MemoryStore,
        testing,
    };

    #[tokio::test]
    async fn test_sign_in_loads_profile() {
        let store = MemoryStore::new();
        let alice = testing::seed_profile(&store, "alice", 30).await;

        let session = UserSession::sign_in(&store, alice.id).await.unwrap();
        assert_eq!(session.profile(), &alice);
        assert_eq!(session.user_id(), alice.id);
    }

    #[tokio::test]
    async fn test_sign_in_unknown_user() {
        let store = MemoryStore::new();
        let result = UserSession::sign_in(&store, UserId::new()).await;
        assert!(matches!(result, Err(Error::ProfileNotFound(_))));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_changes() {
        let store = MemoryStore::new();
        let alice = testing::seed_profile(&store, "alice", 30).await;
        let mut session = UserSession::sign_in(&store, alice.id).await.unwrap();

        Records::new(&store).set_points(alice.id, 80).await.unwrap();
        assert_eq!(session.profile().points, 30);

        session.refresh(&store).await.unwrap();
        assert_eq!(session.profile().points, 80);
    }

    #[test]
    fn test_update_ignores_other_profiles() {
        let alice = Profile {
            id: UserId::new(),
            username: "alice".to_string(),
            points: 0,
        };
        let mut session = UserSession::from_profile(alice.clone());
        session.update_profile(Profile {
            id: UserId::new(),
            username: "mallory".to_string(),
            points: 999,
        });
        assert_eq!(session.profile(), &alice);
    }

    #[test]
    fn test_sign_out_returns_user() {
        let id = UserId::new();
        let session = UserSession::from_profile(Profile {
            id,
            username: "alice".to_string(),
            points: 0,
        });
        assert_eq!(session.sign_out(), id);
    }
}
