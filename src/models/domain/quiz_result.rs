use serde::Serialize;

use crate::models::domain::ModuleProgress;

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize)]
pub enum Feedback {
    Excellent,  // >= 80%
    Good,       // >= 60%
    NotBad,     // >= 40%
    KeepTrying,
}

impl Feedback {
    pub fn for_percentage(percentage: f32) -> Self {
        if percentage >= 80.0 {
            Feedback::Excellent
        } else if percentage >= 60.0 {
            Feedback::Good
        } else if percentage >= 40.0 {
            Feedback::NotBad
        } else {
            Feedback::KeepTrying
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Feedback::Excellent => "Excellent work!",
            Feedback::Good => "Good job!",
            Feedback::NotBad => "Not bad, keep practicing!",
            Feedback::KeepTrying => "Keep trying, you'll do better next time!",
        }
    }
}

/// Summary shown once a module attempt is over.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuizResult {
    pub correct: u32,
    pub total: u32,
    pub skipped: u32,
    pub longest_streak: u32,
    pub percentage: f32,
    pub feedback: Feedback,
}

impl QuizResult {
    pub fn new(correct: u32, total: u32, skipped: u32, longest_streak: u32) -> Self {
        let percentage = if total > 0 {
            correct as f32 / total as f32 * 100.0
        } else {
            0.0
        };
        Self {
            correct,
            total,
            skipped,
            longest_streak,
            percentage,
            feedback: Feedback::for_percentage(percentage),
        }
    }

    pub fn from_progress(progress: &ModuleProgress) -> Self {
        Self::new(
            progress.score,
            progress.total_questions,
            progress.skipped_questions,
            progress.longest_streak,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_tiers_follow_percentage_thresholds() {
        assert_eq!(QuizResult::new(4, 5, 0, 4).feedback, Feedback::Excellent);
        assert_eq!(QuizResult::new(3, 5, 0, 2).feedback, Feedback::Good);
        assert_eq!(QuizResult::new(2, 5, 1, 1).feedback, Feedback::NotBad);
        assert_eq!(QuizResult::new(1, 5, 2, 1).feedback, Feedback::KeepTrying);
    }

    #[test]
    fn empty_quiz_scores_zero_percent() {
        let result = QuizResult::new(0, 0, 0, 0);
        assert_eq!(result.percentage, 0.0);
        assert_eq!(result.feedback, Feedback::KeepTrying);
    }

    #[test]
    fn result_from_progress_uses_persisted_counters() {
        let mut progress = ModuleProgress::fresh("m1", 4);
        progress.score = 2;
        progress.skipped_questions = 1;
        progress.longest_streak = 2;

        let result = QuizResult::from_progress(&progress);
        assert_eq!(result.correct, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.percentage, 50.0);
        assert_eq!(result.feedback.message(), "Not bad, keep practicing!");
    }
}
