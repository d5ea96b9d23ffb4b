//! Solo quiz
//!
//! The same sample and stepping as a challenge, for a single player. Answers
//! stay in memory; the only write is the points award once the last question
//! is passed.

use serde::Serialize;
use web_time::SystemTime;

use crate::{
    config::{Options, RepeatAwards},
    constants::tiers,
    cursor::{Advance, QuestionCursor, QuestionView, Selection},
    error::{Error, Result},
    model::{AnswerIndex, QuizCompletion, QuizQuestion, points_label, question_set_key},
    records::Records,
    session::UserSession,
    store::RecordStore,
};

/// Where the quiz is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Questions have not been fetched yet
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
    /// Every question has been answered
    Completed,
}

/// What happened to the points of a finished quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Award {
    /// Points were added; `total` is the profile's new balance
    Granted {
        /// Points added
        points: u64,
        /// Balance after the award
        total: u64,
    },
    /// This question set was already rewarded for the user
    AlreadyAwarded,
    /// The award could not be written
    Failed,
}

/// One answered question on the result screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerReview {
    /// The prompt
    pub question: String,
    /// The picked option
    pub selected: AnswerIndex,
    /// Text of the picked option
    pub selected_text: String,
    /// The correct option
    pub correct_answer: AnswerIndex,
    /// Text of the correct option
    pub correct_text: String,
    /// Whether the pick was correct
    pub is_correct: bool,
}

/// The result screen of a solo quiz
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoloResult {
    /// Correct answers
    pub score: usize,
    /// Number of questions
    pub total: usize,
    /// `score` times the per-answer reward
    pub points_earned: u64,
    /// Outcome of the points write
    pub award: Award,
    /// Every answer with its correct counterpart
    pub review: Vec<AnswerReview>,
}

impl SoloResult {
    /// Fraction of correct answers
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.score as f64 / self.total as f64
        }
    }

    /// Encouragement shown under the score
    pub fn message(&self) -> &'static str {
        let ratio = self.percentage();
        if self.total > 0 && self.score == self.total {
            "Perfect score! Outstanding!"
        } else if ratio >= tiers::GREAT {
            "Great job! Well done!"
        } else if ratio >= tiers::GOOD {
            "Good effort! Keep practicing!"
        } else {
            "Keep learning and try again!"
        }
    }

    /// E.g. "+30 points"
    pub fn points_banner(&self) -> String {
        format!("+{}", points_label(self.points_earned))
    }
}

/// A serializable snapshot of the quiz for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QuizView {
    /// Questions are being fetched
    Loading,
    /// Nothing can be shown
    Unavailable,
    /// A question is being answered
    Question(QuestionView),
    /// The result screen
    Result(SoloResult),
}

#[derive(Debug)]
enum Stage {
    Loading,
    Unavailable,
    Playing(QuestionCursor),
    Finished(Vec<QuizQuestion>, Award),
}

/// A single player's quiz run
#[derive(Debug)]
pub struct SoloQuiz<'a, S: ?Sized> {
    records: Records<'a, S>,
    options: Options,
    stage: Stage,
    answers: Vec<Selection>,
}

impl<'a, S: RecordStore + ?Sized> SoloQuiz<'a, S> {
    /// Prepares a quiz; call [`load`](Self::load) to fetch questions
    pub fn new(store: &'a S, options: Options) -> Self {
        Self {
            records: Records::new(store),
            options,
            stage: Stage::Loading,
            answers: Vec::new(),
        }
    }

    async fn fetch(&self) -> Result<Vec<QuizQuestion>> {
        let questions = self
            .records
            .question_sample(self.options.question_count)
            .await?;
        if questions.is_empty() {
            return Err(Error::NoQuestions);
        }
        Ok(questions)
    }

    /// Fetches the sample and starts at the first question
    pub async fn load(&mut self) {
        self.stage = Stage::Loading;
        self.answers.clear();

        self.stage = match self.fetch().await {
            Ok(questions) => Stage::Playing(QuestionCursor::new(questions)),
            Err(e) => {
                tracing::error!(error = %e, "failed to load quiz");
                Stage::Unavailable
            }
        };
    }

    /// Discards all progress and loads a fresh run
    pub async fn restart(&mut self) {
        self.load().await;
    }

    /// Picks an answer for the current question
    ///
    /// Returns `None` if the question was already answered or no question
    /// is being shown.
    pub fn select_answer(&mut self, answer: AnswerIndex) -> Option<Selection> {
        let Stage::Playing(cursor) = &mut self.stage else {
            return None;
        };
        let selection = cursor.select(answer)?;
        self.answers.push(selection);
        Some(selection)
    }

    /// Moves to the next question, or awards points after the last one
    pub async fn advance(&mut self, user: &mut UserSession) {
        let Stage::Playing(cursor) = &mut self.stage else {
            return;
        };
        if cursor.advance() != Advance::Finished {
            return;
        }

        let questions = cursor.questions().to_vec();
        let award = self.award(&questions, user).await;
        self.stage = Stage::Finished(questions, award);
    }

    async fn award(&self, questions: &[QuizQuestion], user: &mut UserSession) -> Award {
        let score = self.score();
        let points = score as u64 * self.options.points_per_correct;
        let once = self.options.repeat_awards == RepeatAwards::OncePerQuestionSet;
        let question_set = question_set_key(questions);

        if once {
            match self.records.has_completion(user.user_id(), &question_set).await {
                Ok(false) => {}
                Ok(true) => {
                    tracing::info!(user = %user.user_id(), "question set already rewarded");
                    return Award::AlreadyAwarded;
                }
                Err(e) => {
                    tracing::error!(user = %user.user_id(), error = %e, "failed to check quiz completion");
                    return Award::Failed;
                }
            }
        }

        let granted = async {
            let current = self.records.profile(user.user_id()).await?;
            self.records
                .set_points(user.user_id(), current.points.saturating_add(points))
                .await
        }
        .await;

        let profile = match granted {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(user = %user.user_id(), error = %e, "failed to award quiz points");
                return Award::Failed;
            }
        };
        tracing::info!(user = %profile.id, points, total = profile.points, "quiz points awarded");
        let total = profile.points;
        user.update_profile(profile);

        // Only a successful award is recorded.
        if once {
            let completion = QuizCompletion {
                user_id: user.user_id(),
                question_set,
                score,
                completed_at: SystemTime::now(),
            };
            if let Err(e) = self.records.record_completion(&completion).await {
                tracing::warn!(user = %user.user_id(), error = %e, "failed to record quiz completion");
            }
        }

        Award::Granted { points, total }
    }

    /// Correct answers so far
    pub fn score(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
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
            Stage::Finished(..) => Phase::Completed,
        }
    }

    /// The result screen, once every question has been answered
    pub fn result(&self) -> Option<SoloResult> {
        let Stage::Finished(questions, award) = &self.stage else {
            return None;
        };
        let score = self.score();

        let review = questions
            .iter()
            .zip(&self.answers)
            .map(|(question, answer)| AnswerReview {
                question: question.question.clone(),
                selected: answer.selected,
                selected_text: question.option(answer.selected).to_string(),
                correct_answer: question.correct_answer,
                correct_text: question.option(question.correct_answer).to_string(),
                is_correct: answer.is_correct,
            })
            .collect();

        Some(SoloResult {
            score,
            total: questions.len(),
            points_earned: score as u64 * self.options.points_per_correct,
            award: *award,
            review,
        })
    }

    /// Snapshot for rendering
    pub fn view(&self) -> QuizView {
        match &self.stage {
            Stage::Loading => QuizView::Loading,
            Stage::Unavailable => QuizView::Unavailable,
            Stage::Playing(cursor) => cursor
                .view(self.score())
                .map_or(QuizView::Unavailable, QuizView::Question),
            Stage::Finished(..) => self.result().map_or(QuizView::Unavailable, QuizView::Result),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        store::{MemoryStore, Operation, Table},
        testing,
    };
    use assert_matches::assert_matches;

    async fn play(
        quiz: &mut SoloQuiz<'_, MemoryStore>,
        questions: &[QuizQuestion],
        user: &mut UserSession,
        correct: usize,
    ) {
        while let Phase::InProgress { index, .. } = quiz.phase() {
            let question = &questions[index];
            let answer = if index < correct {
                question.correct_answer
            } else {
                testing::wrong(question)
            };
            quiz.select_answer(answer).unwrap();
            quiz.advance(user).await;
        }
    }

    fn result_with(score: usize, total: usize) -> SoloResult {
        SoloResult {
            score,
            total,
            points_earned: 0,
            award: Award::Failed,
            review: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_full_run_awards_points() {
        let store = MemoryStore::new();
        let questions = testing::seed_questions(&store, 5).await;
        let (alice, _) = testing::seed_pair(&store).await;
        let mut user = UserSession::from_profile(alice.clone());

        let mut quiz = SoloQuiz::new(&store, Options::default());
        quiz.load().await;
        assert_matches!(quiz.view(), QuizView::Question(view) if view.index == 0 && view.count == 5);

        play(&mut quiz, &questions, &mut user, 3).await;

        let result = quiz.result().unwrap();
        assert_eq!(result.score, 3);
        assert_eq!(result.total, 5);
        assert_eq!(result.points_earned, 30);
        assert_eq!(result.points_banner(), "+30 points");
        assert_eq!(result.award, Award::Granted { points: 30, total: 60 });
        assert_eq!(result.message(), "Good effort! Keep practicing!");
        assert_eq!(user.profile().points, 60);

        let stored = Records::new(&store).profile(alice.id).await.unwrap();
        assert_eq!(stored.points, 60);
    }

    #[tokio::test]
    async fn test_review_lists_every_answer() {
        let store = MemoryStore::new();
        let questions = testing::seed_questions(&store, 2).await;
        let (alice, _) = testing::seed_pair(&store).await;
        let mut user = UserSession::from_profile(alice);
        let options = Options {
            question_count: 2,
            ..Options::default()
        };

        let mut quiz = SoloQuiz::new(&store, options);
        quiz.load().await;
        play(&mut quiz, &questions, &mut user, 1).await;

        let review = quiz.result().unwrap().review;
        assert_eq!(review.len(), 2);
        assert!(review[0].is_correct);
        assert_eq!(review[0].selected, questions[0].correct_answer);
        assert!(!review[1].is_correct);
        assert_eq!(review[1].question, questions[1].question);
        assert_eq!(
            review[1].correct_text,
            questions[1].option(questions[1].correct_answer)
        );
    }

    #[tokio::test]
    async fn test_repeat_play_adds_points_again() {
        let store = MemoryStore::new();
        let questions = testing::seed_questions(&store, 5).await;
        let (alice, _) = testing::seed_pair(&store).await;
        let mut user = UserSession::from_profile(alice);

        let mut quiz = SoloQuiz::new(&store, Options::default());
        quiz.load().await;
        play(&mut quiz, &questions, &mut user, 5).await;
        quiz.restart().await;
        assert_matches!(quiz.phase(), Phase::InProgress { index: 0, selected: None });
        assert_eq!(quiz.score(), 0);
        play(&mut quiz, &questions, &mut user, 5).await;

        assert_eq!(user.profile().points, 130);
        assert_eq!(quiz.result().unwrap().message(), "Perfect score! Outstanding!");
    }

    #[tokio::test]
    async fn test_once_per_question_set() {
        let store = MemoryStore::new();
        let questions = testing::seed_questions(&store, 5).await;
        let (alice, _) = testing::seed_pair(&store).await;
        let mut user = UserSession::from_profile(alice);
        let options = Options {
            repeat_awards: RepeatAwards::OncePerQuestionSet,
            ..Options::default()
        };

        let mut quiz = SoloQuiz::new(&store, options);
        quiz.load().await;
        play(&mut quiz, &questions, &mut user, 4).await;
        assert_eq!(
            quiz.result().unwrap().award,
            Award::Granted { points: 40, total: 70 }
        );

        quiz.restart().await;
        play(&mut quiz, &questions, &mut user, 5).await;
        assert_eq!(quiz.result().unwrap().award, Award::AlreadyAwarded);
        assert_eq!(user.profile().points, 70);
        assert_eq!(store.rows(Table::QuizCompletions).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_award_still_shows_result() {
        let store = MemoryStore::new();
        let questions = testing::seed_questions(&store, 5).await;
        let (alice, _) = testing::seed_pair(&store).await;
        let mut user = UserSession::from_profile(alice);
        store.fail(Table::Profiles, Operation::Update);

        let mut quiz = SoloQuiz::new(&store, Options::default());
        quiz.load().await;
        play(&mut quiz, &questions, &mut user, 2).await;

        let result = quiz.result().unwrap();
        assert_eq!(result.award, Award::Failed);
        assert_eq!(result.points_earned, 20);
        assert_eq!(user.profile().points, 30);
    }

    #[tokio::test]
    async fn test_failed_award_can_be_retried_once_per_set() {
        let store = MemoryStore::new();
        let questions = testing::seed_questions(&store, 5).await;
        let (alice, _) = testing::seed_pair(&store).await;
        let mut user = UserSession::from_profile(alice);
        let options = Options {
            repeat_awards: RepeatAwards::OncePerQuestionSet,
            ..Options::default()
        };
        store.fail(Table::Profiles, Operation::Update);

        let mut quiz = SoloQuiz::new(&store, options);
        quiz.load().await;
        play(&mut quiz, &questions, &mut user, 2).await;
        assert_eq!(quiz.result().unwrap().award, Award::Failed);
        assert!(store.rows(Table::QuizCompletions).is_empty());

        store.recover(Table::Profiles, Operation::Update);
        quiz.restart().await;
        play(&mut quiz, &questions, &mut user, 2).await;
        assert_eq!(
            quiz.result().unwrap().award,
            Award::Granted { points: 20, total: 50 }
        );
        assert_eq!(user.profile().points, 50);
        assert_eq!(store.rows(Table::QuizCompletions).len(), 1);
    }

    #[tokio::test]
    async fn test_select_only_once() {
        let store = MemoryStore::new();
        let questions = testing::seed_questions(&store, 5).await;
        let mut quiz = SoloQuiz::new(&store, Options::default());
        quiz.load().await;

        assert!(quiz.select_answer(questions[0].correct_answer).is_some());
        assert!(quiz.select_answer(testing::wrong(&questions[0])).is_none());
        assert_eq!(quiz.score(), 1);
    }

    #[tokio::test]
    async fn test_empty_sample_is_unavailable() {
        let store = MemoryStore::new();
        let mut quiz = SoloQuiz::new(&store, Options::default());
        assert_eq!(quiz.phase(), Phase::Loading);

        quiz.load().await;
        assert_eq!(quiz.phase(), Phase::Unavailable);
        assert_eq!(quiz.view(), QuizView::Unavailable);
        assert!(quiz.select_answer(AnswerIndex::try_from(0).unwrap()).is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_unavailable() {
        let store = MemoryStore::new();
        testing::seed_questions(&store, 5).await;
        store.fail(Table::QuizQuestions, Operation::Select);

        let mut quiz = SoloQuiz::new(&store, Options::default());
        quiz.load().await;
        assert_eq!(quiz.phase(), Phase::Unavailable);
    }

    #[test]
    fn test_message_tiers() {
        assert_eq!(result_with(5, 5).message(), "Perfect score! Outstanding!");
        assert_eq!(result_with(4, 5).message(), "Great job! Well done!");
        assert_eq!(result_with(7, 10).message(), "Great job! Well done!");
        assert_eq!(result_with(3, 5).message(), "Good effort! Keep practicing!");
        assert_eq!(result_with(2, 5).message(), "Keep learning and try again!");
        assert_eq!(result_with(0, 0).message(), "Keep learning and try again!");
    }
}
