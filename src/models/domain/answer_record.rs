use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{AnswerOutcome, Question};

/// One persisted answer, keyed by (module_id, question_id).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnswerRecord {
    pub module_id: String,
    pub question_id: i64,
    pub selected_option_index: usize,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

impl AnswerRecord {
    pub fn new(module_id: &str, question: &Question, selected_option_index: usize) -> Self {
        Self {
            module_id: module_id.to_string(),
            question_id: question.id,
            selected_option_index,
            is_correct: question.is_correct(selected_option_index),
            answered_at: Utc::now(),
        }
    }

    pub fn from_outcome(module_id: &str, outcome: &AnswerOutcome) -> Self {
        Self {
            module_id: module_id.to_string(),
            question_id: outcome.question_id,
            selected_option_index: outcome.selected_option_index,
            is_correct: outcome.is_correct,
            answered_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_computes_correctness_from_question() {
        let question = Question {
            id: 11,
            text: "Capital of France?".to_string(),
            options: vec!["Paris".to_string(), "Lyon".to_string()],
            correct_option_index: 0,
        };

        let right = AnswerRecord::new("geo", &question, 0);
        let wrong = AnswerRecord::new("geo", &question, 1);

        assert_eq!(right.module_id, "geo");
        assert_eq!(right.question_id, 11);
        assert!(right.is_correct);
        assert!(!wrong.is_correct);
        assert_eq!(wrong.selected_option_index, 1);
    }

    #[test]
    fn record_round_trip_serialization_preserves_fields() {
        let record = AnswerRecord {
            module_id: "m1".to_string(),
            question_id: 4,
            selected_option_index: 2,
            is_correct: false,
            answered_at: Utc::now(),
        };

        let json = serde_json::to_string(&record).expect("record should serialize");
        let parsed: AnswerRecord = serde_json::from_str(&json).expect("record should deserialize");

        assert_eq!(parsed, record);
    }
}
