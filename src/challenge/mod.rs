//! Head-to-head challenges
//!
//! Two users answer the same question sample independently. Each answer is
//! appended to a shared response ledger, and the challenge record is settled
//! from that ledger once both have finished.

pub mod directory;
pub mod session;

pub use directory::{ChallengeListing, Directory, ListingView};
pub use session::{AnswerFeedback, ChallengeResult, ChallengeSession, Phase, SessionView};
