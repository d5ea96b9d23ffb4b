//! Question stepping shared by the solo quiz and challenges
//!
//! A cursor walks a fixed sample of questions. Each question accepts exactly
//! one answer; the cursor only moves forward once the current question has
//! been answered.

use serde::Serialize;

use crate::{
    constants::quiz::OPTION_COUNT,
    ids::QuestionId,
    model::{AnswerIndex, Difficulty, QuizQuestion},
};

/// Content that is only revealed once the viewer is allowed to see it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PossiblyHidden<T> {
    /// Content is visible to the viewer
    Visible(T),
    /// Content is hidden from the viewer
    Hidden,
}

/// Everything needed to render the current question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// Zero-based index of the question
    pub index: usize,
    /// Number of questions in the sample
    pub count: usize,
    /// The prompt
    pub question: String,
    /// The answer options in display order
    pub options: [String; OPTION_COUNT],
    /// Difficulty of the question
    pub difficulty: Difficulty,
    /// Difficulty badge text
    pub difficulty_label: String,
    /// Category badge
    pub category: String,
    /// The option picked, if any
    pub selected: Option<AnswerIndex>,
    /// The correct option, revealed once an answer is picked
    pub correct_answer: PossiblyHidden<AnswerIndex>,
    /// Correct answers so far
    pub score: usize,
    /// Whether advancing will finish the quiz
    pub is_last: bool,
}

/// The effect of selecting an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// The answered question
    pub question_id: QuestionId,
    /// The option that was picked
    pub selected: AnswerIndex,
    /// The correct option
    pub correct_answer: AnswerIndex,
    /// Whether the pick was correct
    pub is_correct: bool,
}

/// The effect of advancing past the current question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The current question has not been answered yet
    Unanswered,
    /// Moved to the question at this index
    Next(usize),
    /// The last question was answered
    Finished,
}

/// Position within a fixed question sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionCursor {
    questions: Vec<QuizQuestion>,
    index: usize,
    selected: Option<AnswerIndex>,
}

impl QuestionCursor {
    /// Starts at the first question
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self::starting_at(questions, 0)
    }

    /// Starts at `index`, clamped to the last question
    pub fn starting_at(questions: Vec<QuizQuestion>, index: usize) -> Self {
        let index = index.min(questions.len().saturating_sub(1));
        Self {
            questions,
            index,
            selected: None,
        }
    }

    /// The full sample
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// The question being shown, `None` for an empty sample
    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index)
    }

    /// Zero-based index of the current question
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of questions in the sample
    pub fn count(&self) -> usize {
        self.questions.len()
    }

    /// The answer picked for the current question, if any
    pub fn selected(&self) -> Option<AnswerIndex> {
        self.selected
    }

    /// Whether the current question is the last one
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    /// Picks `answer` for the current question
    ///
    /// Returns `None`, changing nothing, when the question was already
    /// answered or the sample is empty.
    pub fn select(&mut self, answer: AnswerIndex) -> Option<Selection> {
        if self.selected.is_some() {
            return None;
        }
        let question = self.questions.get(self.index)?;
        self.selected = Some(answer);

        Some(Selection {
            question_id: question.id,
            selected: answer,
            correct_answer: question.correct_answer,
            is_correct: question.is_correct(answer),
        })
    }

    /// Snapshot of the current question for rendering
    pub fn view(&self, score: usize) -> Option<QuestionView> {
        let question = self.current()?;
        Some(QuestionView {
            index: self.index,
            count: self.count(),
            question: question.question.clone(),
            options: question.options.clone(),
            difficulty: question.difficulty,
            difficulty_label: question.difficulty.label(),
            category: question.category.clone(),
            selected: self.selected,
            correct_answer: match self.selected {
                Some(_) => PossiblyHidden::Visible(question.correct_answer),
                None => PossiblyHidden::Hidden,
            },
            score,
            is_last: self.is_last(),
        })
    }

    /// Moves past the answered current question
    pub fn advance(&mut self) -> Advance {
        if self.selected.is_none() {
            Advance::Unanswered
        } else if self.is_last() {
            Advance::Finished
        } else {
            self.index += 1;
            self.selected = None;
            Advance::Next(self.index)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::testing::questions;

    fn answer(i: usize) -> AnswerIndex {
        AnswerIndex::try_from(i).unwrap()
    }

    #[test]
    fn test_select_once_per_question() {
        let mut cursor = QuestionCursor::new(questions(3));
        let correct = cursor.current().unwrap().correct_answer;

        let selection = cursor.select(correct).unwrap();
        assert!(selection.is_correct);
        assert_eq!(cursor.selected(), Some(correct));

        assert_eq!(cursor.select(answer(3)), None);
        assert_eq!(cursor.selected(), Some(correct));
    }

    #[test]
    fn test_advance_requires_answer() {
        let mut cursor = QuestionCursor::new(questions(2));
        assert_eq!(cursor.advance(), Advance::Unanswered);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_walk_to_finish() {
        let mut cursor = QuestionCursor::new(questions(2));

        cursor.select(answer(0)).unwrap();
        assert!(!cursor.is_last());
        assert_eq!(cursor.advance(), Advance::Next(1));
        assert_eq!(cursor.selected(), None);

        cursor.select(answer(1)).unwrap();
        assert!(cursor.is_last());
        assert_eq!(cursor.advance(), Advance::Finished);
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn test_starting_at_is_clamped() {
        let cursor = QuestionCursor::starting_at(questions(5), 2);
        assert_eq!(cursor.index(), 2);

        let cursor = QuestionCursor::starting_at(questions(5), 9);
        assert_eq!(cursor.index(), 4);
    }

    #[test]
    fn test_view_hides_answer_until_selected() {
        let mut cursor = QuestionCursor::new(questions(2));

        let view = cursor.view(0).unwrap();
        assert_eq!(view.correct_answer, PossiblyHidden::Hidden);
        assert_eq!(view.count, 2);
        assert_eq!(view.difficulty_label, "Medium");
        assert!(!view.is_last);

        let correct = cursor.current().unwrap().correct_answer;
        cursor.select(answer(3)).unwrap();
        let view = cursor.view(0).unwrap();
        assert_eq!(view.correct_answer, PossiblyHidden::Visible(correct));
        assert_eq!(view.selected, Some(answer(3)));
    }

    #[test]
    fn test_empty_sample() {
        let mut cursor = QuestionCursor::new(Vec::new());
        assert!(cursor.current().is_none());
        assert!(cursor.view(0).is_none());
        assert_eq!(cursor.select(answer(0)), None);
        assert_eq!(cursor.advance(), Advance::Unanswered);
    }
}
