//! Challenge session controller
//!
//! A `ChallengeSession` is one participant's view of a challenge. It owns no
//! persistent state: everything it shows is rebuilt from the challenge record
//! and the response ledger on [`load`](ChallengeSession::load), which is what
//! lets a participant reload in the middle of a challenge and resume at their
//! first unanswered question.
//!
//! The session moves through `Loading`, then either `Unavailable` (the data
//! could not be fetched), `InProgress` (answering) or `Completed` (showing the
//! result). Answers are appended to the ledger as they are picked; after
//! every successful write both scores are re-derived from the ledger.

use serde::Serialize;

use crate::{
    config::{FinalizePolicy, Options},
    cursor::{Advance, QuestionCursor, QuestionView, Selection},
    error::{Error, Result},
    ids::UserId,
    model::{AnswerIndex, Challenge, ChallengeResponse, ChallengeStatus},
    records::Records,
    scoring::{Outcome, Tally, resolve_winner},
    session::UserSession,
    store::RecordStore,
};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Data has not been fetched yet
    Loading,
    /// Fetching failed or no questions exist
    Unavailable,
    /// Answering the question at `index`
    InProgress {
        /// Zero-based index of the current question
        index: usize,
        /// The answer picked for it, if any
        selected: Option<AnswerIndex>,
    },
    /// The participant has answered every question
    Completed,
}

/// The effect of picking an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    /// The pick and its correctness
    #[serde(flatten)]
    pub selection: Selection,
    /// Whether the pick reached the response ledger
    pub synced: bool,
}

/// The result screen of a challenge from the viewer's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChallengeResult {
    /// The viewer's correct answers
    pub user_score: usize,
    /// The other participant's correct answers
    pub opponent_score: usize,
    /// Number of questions in the challenge
    pub total: usize,
    /// Win, draw or loss, recomputed from the two scores
    pub outcome: Outcome,
    /// Whether the other participant has answered every question
    pub opponent_finished: bool,
    /// Status of the challenge record as last read or written
    pub status: ChallengeStatus,
    /// Winner stored on the challenge record
    pub winner_id: Option<UserId>,
}

impl ChallengeResult {
    /// Result banner text
    pub fn message(&self) -> &'static str {
        self.outcome.message()
    }
}

/// A serializable snapshot of the session for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionView {
    /// Data is being fetched
    Loading,
    /// Nothing can be shown
    Unavailable,
    /// A question is being answered
    Question(QuestionView),
    /// The result screen
    Result(ChallengeResult),
}

#[derive(Debug)]
enum Stage {
    Loading,
    Unavailable,
    Playing(QuestionCursor),
    Finished,
}

/// One participant's controller for a challenge
#[derive(Debug)]
pub struct ChallengeSession<'a, S: ?Sized> {
    records: Records<'a, S>,
    user: UserId,
    challenge: Challenge,
    options: Options,
    stage: Stage,
    question_count: usize,
    ledger: Vec<ChallengeResponse>,
    unsynced: Vec<ChallengeResponse>,
}

impl<'a, S: RecordStore + ?Sized> ChallengeSession<'a, S> {
    /// Prepares a session for the signed-in user
    ///
    /// # Errors
    ///
    /// Returns `Error::NotParticipant` when the user is neither the
    /// challenger nor the opponent.
    pub fn new(
        store: &'a S,
        session: &UserSession,
        challenge: Challenge,
        options: Options,
    ) -> Result<Self> {
        let user = session.user_id();
        if !challenge.is_participant(user) {
            return Err(Error::NotParticipant);
        }

        Ok(Self {
            records: Records::new(store),
            user,
            challenge,
            options,
            stage: Stage::Loading,
            question_count: 0,
            ledger: Vec::new(),
            unsynced: Vec::new(),
        })
    }

    /// Fetches the questions, the ledger and the latest challenge record,
    /// then resumes where the user left off
    ///
    /// Failures are logged and leave the session `Unavailable`; calling
    /// `load` again retries from scratch.
    pub async fn load(&mut self) {
        self.stage = Stage::Loading;
        self.unsynced.clear();

        let records = self.records;
        let id = self.challenge.id;
        let count = self.options.question_count;
        let fetched = async move {
            let questions = records.question_sample(count).await?;
            let ledger = records.responses(id).await?;
            let challenge = records.challenge(id).await?;
            Ok::<_, Error>((questions, ledger, challenge))
        }
        .await;

        let (questions, ledger, challenge) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::error!(challenge = %self.challenge.id, error = %e, "failed to load challenge");
                self.stage = Stage::Unavailable;
                return;
            }
        };

        if questions.is_empty() {
            tracing::warn!(challenge = %self.challenge.id, "no questions available");
            self.stage = Stage::Unavailable;
            return;
        }

        self.challenge = challenge;
        self.ledger = ledger;
        self.question_count = questions.len();

        let tally = self.tally();
        let resume_at = questions.iter().position(|q| !tally.user.has_answered(q.id));

        match resume_at {
            Some(index) => {
                tracing::debug!(challenge = %self.challenge.id, user = %self.user, index, "resuming challenge");
                self.stage = Stage::Playing(QuestionCursor::starting_at(questions, index));
            }
            None => {
                self.stage = Stage::Finished;
                if self.options.finalize == FinalizePolicy::AwaitBoth
                    && self.opponent_finished()
                    && self.challenge.status != ChallengeStatus::Completed
                {
                    self.settle().await;
                }
            }
        }
    }

    /// Picks an answer for the current question
    ///
    /// Returns `None`, changing nothing, if the current question was already
    /// answered or no question is being shown. A failed ledger write is
    /// logged and the response is kept as unsynced; the session still
    /// proceeds.
    pub async fn select_answer(&mut self, answer: AnswerIndex) -> Option<AnswerFeedback> {
        let Stage::Playing(cursor) = &mut self.stage else {
            return None;
        };
        let selection = cursor.select(answer)?;

        let response = ChallengeResponse {
            challenge_id: self.challenge.id,
            user_id: self.user,
            question_id: selection.question_id,
            selected_answer: selection.selected,
            is_correct: selection.is_correct,
        };

        let synced = match self.records.record_response(&response).await {
            Ok(()) => {
                self.reload_ledger(Some(response)).await;
                true
            }
            Err(e) => {
                tracing::warn!(
                    challenge = %self.challenge.id,
                    question = %response.question_id,
                    error = %e,
                    "failed to record response"
                );
                self.unsynced.push(response);
                false
            }
        };

        Some(AnswerFeedback { selection, synced })
    }

    /// Moves to the next question, or finalizes after the last one
    ///
    /// Does nothing until the current question has been answered.
    pub async fn advance(&mut self) {
        let Stage::Playing(cursor) = &mut self.stage else {
            return;
        };
        match cursor.advance() {
            Advance::Unanswered | Advance::Next(_) => {}
            Advance::Finished => self.finalize().await,
        }
    }

    /// Re-reads the ledger; on failure applies `written` locally instead
    async fn reload_ledger(&mut self, written: Option<ChallengeResponse>) {
        match self.records.responses(self.challenge.id).await {
            Ok(ledger) => self.ledger = ledger,
            Err(e) => {
                tracing::warn!(challenge = %self.challenge.id, error = %e, "failed to re-read responses");
                self.ledger.extend(written);
            }
        }
    }

    async fn finalize(&mut self) {
        self.stage = Stage::Finished;
        self.reload_ledger(None).await;

        match self.options.finalize {
            FinalizePolicy::LastWriterWins => {
                let tally = self.tally();
                let winner = resolve_winner(
                    &self.challenge,
                    self.user,
                    tally.user.score(),
                    tally.opponent.score(),
                );
                match self.records.complete_challenge(self.challenge.id, winner).await {
                    Ok(Some(challenge)) => self.challenge = challenge,
                    Ok(None) => {
                        tracing::warn!(challenge = %self.challenge.id, "challenge disappeared before completion");
                    }
                    Err(e) => {
                        tracing::error!(challenge = %self.challenge.id, error = %e, "failed to complete challenge");
                    }
                }
            }
            FinalizePolicy::AwaitBoth if self.opponent_finished() => self.settle().await,
            // A challenger finishing first leaves the record pending for the
            // opponent to start.
            FinalizePolicy::AwaitBoth if self.challenge.is_challenger(self.user) => {
                tracing::debug!(challenge = %self.challenge.id, "waiting for the opponent to play");
            }
            FinalizePolicy::AwaitBoth => {
                match self.records.mark_in_progress(self.challenge.id).await {
                    Ok(Some(challenge)) => self.challenge = challenge,
                    Ok(None) => {
                        tracing::debug!(challenge = %self.challenge.id, "challenge already past pending");
                    }
                    Err(e) => {
                        tracing::error!(challenge = %self.challenge.id, error = %e, "failed to mark challenge in progress");
                    }
                }
            }
        }
    }

    /// Completes the challenge once both ledgers are full
    async fn settle(&mut self) {
        let tally = self.tally();
        let winner = resolve_winner(
            &self.challenge,
            self.user,
            tally.user.score(),
            tally.opponent.score(),
        );

        match self
            .records
            .complete_challenge_once(self.challenge.id, winner)
            .await
        {
            Ok(Some(challenge)) => {
                tracing::info!(
                    challenge = %challenge.id,
                    winner = ?challenge.winner_id,
                    "challenge completed"
                );
                self.challenge = challenge;
            }
            Ok(None) => {
                tracing::warn!(challenge = %self.challenge.id, "challenge was already completed by the other participant");
                match self.records.challenge(self.challenge.id).await {
                    Ok(challenge) => self.challenge = challenge,
                    Err(e) => {
                        tracing::warn!(challenge = %self.challenge.id, error = %e, "failed to re-read challenge");
                    }
                }
            }
            Err(e) => {
                tracing::error!(challenge = %self.challenge.id, error = %e, "failed to complete challenge");
            }
        }
    }

    fn tally(&self) -> Tally {
        Tally::from_ledger(&self.ledger, self.user)
    }

    fn opponent_finished(&self) -> bool {
        self.question_count > 0 && self.tally().opponent.answered() >= self.question_count
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        match &self.stage {
            Stage::Loading => Phase::Loading,
            Stage::Unavailable => Phase::Unavailable,
            Stage::Playing(cursor) => Phase::InProgress {
                index: cursor.index(),
                selected: cursor.selected(),
            },
            Stage::Finished => Phase::Completed,
        }
    }

    /// The challenge record as last read or written
    pub fn challenge(&self) -> &Challenge {
        &self.challenge
    }

    /// The viewer's score according to the ledger
    pub fn user_score(&self) -> usize {
        self.tally().user.score()
    }

    /// The other participant's score according to the ledger
    pub fn opponent_score(&self) -> usize {
        self.tally().opponent.score()
    }

    /// Whether every picked answer reached the ledger
    pub fn is_synced(&self) -> bool {
        self.unsynced.is_empty()
    }

    /// Responses whose ledger write failed
    pub fn unsynced(&self) -> &[ChallengeResponse] {
        &self.unsynced
    }

    /// The result screen, once the viewer has answered every question
    pub fn result(&self) -> Option<ChallengeResult> {
        if !matches!(self.stage, Stage::Finished) {
            return None;
        }
        let tally = self.tally();
        Some(ChallengeResult {
            user_score: tally.user.score(),
            opponent_score: tally.opponent.score(),
            total: self.question_count,
            outcome: tally.outcome(),
            opponent_finished: self.opponent_finished(),
            status: self.challenge.status,
            winner_id: self.challenge.winner_id,
        })
    }

    /// Snapshot for rendering
    pub fn view(&self) -> SessionView {
        match &self.stage {
            Stage::Loading => SessionView::Loading,
            Stage::Unavailable => SessionView::Unavailable,
            Stage::Playing(cursor) => cursor
                .view(self.user_score())
                .map_or(SessionView::Unavailable, SessionView::Question),
            Stage::Finished => self
                .result()
                .map_or(SessionView::Unavailable, SessionView::Result),
        }
    }
}
