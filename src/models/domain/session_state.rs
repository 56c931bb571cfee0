use std::collections::BTreeMap;

use chrono::Utc;

use crate::models::domain::{ModuleProgress, Question, QuizResult};

/// In-memory state of one attempt at a module. Answers are keyed by question id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub user_answers: BTreeMap<i64, usize>,
    pub selected_option: Option<usize>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub correct_count: u32,
    pub skipped_count: u32,
    pub is_answer_revealed: bool,
    pub is_finished: bool,
    pub is_loading: bool,
    pub is_review: bool,
    pub load_error: Option<String>,
}

/// What `answer` recorded, for the caller to persist.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: i64,
    pub selected_option_index: usize,
    pub is_correct: bool,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved,
    Finished,
    Unchanged,
}

impl SessionState {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            load_error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn fresh(questions: Vec<Question>) -> Self {
        let mut state = Self {
            questions,
            ..Default::default()
        };
        state.show_question(0);
        state.refresh_skipped();
        state
    }

    /// Rehydrates an incomplete attempt at its last visited question.
    pub fn resumed(
        questions: Vec<Question>,
        answers: BTreeMap<i64, usize>,
        progress: &ModuleProgress,
    ) -> Self {
        let mut state = Self {
            user_answers: retain_known_answers(&questions, answers),
            questions,
            correct_count: progress.score,
            longest_streak: progress.longest_streak,
            ..Default::default()
        };
        let last = (progress.last_question_index as usize).min(state.questions.len().saturating_sub(1));
        state.show_question(last);
        state.refresh_skipped();
        state
    }

    /// Read-only view of a completed attempt: every question is locked.
    pub fn review(
        questions: Vec<Question>,
        answers: BTreeMap<i64, usize>,
        progress: &ModuleProgress,
    ) -> Self {
        let mut state = Self {
            user_answers: retain_known_answers(&questions, answers),
            questions,
            correct_count: progress.score,
            longest_streak: progress.longest_streak,
            is_review: true,
            is_finished: true,
            ..Default::default()
        };
        state.show_question(0);
        state.refresh_skipped();
        state
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn is_current_answered(&self) -> bool {
        self.current_question()
            .is_some_and(|q| self.user_answers.contains_key(&q.id))
    }

    pub fn is_last_question(&self) -> bool {
        !self.questions.is_empty() && self.current_index + 1 == self.questions.len()
    }

    /// Whether this state may be written over the stored record. Loading, failed
    /// and review states never are.
    pub fn is_persistable(&self) -> bool {
        !self.is_loading && !self.is_review && self.load_error.is_none() && !self.questions.is_empty()
    }

    pub fn total_questions(&self) -> u32 {
        self.questions.len() as u32
    }

    /// Locks in `option_index` for the current question. Returns `None` when the
    /// question is already answered, revealed, out of range or read-only.
    pub fn answer(&mut self, option_index: usize) -> Option<AnswerOutcome> {
        if self.is_review || self.is_finished || self.is_answer_revealed {
            return None;
        }
        let (question_id, is_correct) = {
            let question = self.current_question()?;
            if !question.has_option(option_index) || self.user_answers.contains_key(&question.id) {
                return None;
            }
            (question.id, question.is_correct(option_index))
        };

        self.user_answers.insert(question_id, option_index);
        self.selected_option = Some(option_index);
        self.is_answer_revealed = true;

        if is_correct {
            self.correct_count += 1;
            self.current_streak += 1;
            self.longest_streak = self.longest_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
        self.refresh_skipped();

        Some(AnswerOutcome {
            question_id,
            selected_option_index: option_index,
            is_correct,
        })
    }

    /// Moves forward one question. On the last question this finishes the quiz.
    pub fn advance(&mut self) -> Navigation {
        if self.questions.is_empty() {
            return Navigation::Unchanged;
        }
        if self.current_index + 1 < self.questions.len() {
            self.show_question(self.current_index + 1);
            Navigation::Moved
        } else if !self.is_finished {
            self.finish();
            Navigation::Finished
        } else {
            Navigation::Unchanged
        }
    }

    pub fn retreat(&mut self) -> Navigation {
        if self.current_index == 0 || self.questions.is_empty() {
            return Navigation::Unchanged;
        }
        self.show_question(self.current_index - 1);
        Navigation::Moved
    }

    pub fn finish(&mut self) {
        self.is_finished = true;
    }

    /// Positions on `index` and re-derives the reveal/lock state from the answers.
    pub fn show_question(&mut self, index: usize) -> bool {
        let Some(question) = self.questions.get(index) else {
            return false;
        };
        let selected = self.user_answers.get(&question.id).copied();

        self.current_index = index;
        self.selected_option = selected;
        self.is_answer_revealed = selected.is_some() || self.is_review;
        true
    }

    pub fn refresh_skipped(&mut self) {
        self.skipped_count = self
            .questions
            .len()
            .saturating_sub(self.user_answers.len()) as u32;
    }

    pub fn progress_snapshot(&self, module_id: &str, completed: bool) -> ModuleProgress {
        ModuleProgress {
            module_id: module_id.to_string(),
            score: self.correct_count,
            total_questions: self.total_questions(),
            longest_streak: self.longest_streak,
            skipped_questions: self.skipped_count,
            is_completed: completed,
            completed_at: completed.then(Utc::now),
            last_question_index: self.current_index as u32,
            answered_question_keys: None,
            answered_option_indices: None,
        }
    }

    pub fn result(&self) -> QuizResult {
        QuizResult::new(
            self.correct_count,
            self.total_questions(),
            self.skipped_count,
            self.longest_streak,
        )
    }
}

fn retain_known_answers(
    questions: &[Question],
    mut answers: BTreeMap<i64, usize>,
) -> BTreeMap<i64, usize> {
    answers.retain(|id, option| {
        questions
            .iter()
            .any(|q| q.id == *id && q.has_option(*option))
    });
    answers
}
