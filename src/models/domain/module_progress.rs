use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;
use crate::models::domain::answer_encoding::decode_answer_map;
use std::collections::BTreeMap;

/// Persisted summary of one module attempt. Upserted by `module_id`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleProgress {
    pub module_id: String,
    pub score: u32,
    pub total_questions: u32,
    pub longest_streak: u32,
    pub skipped_questions: u32,
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_question_index: u32,
    // Older records kept the answer map inline as two comma-joined lists.
    // Read for migration only, never written back.
    #[serde(default, skip_serializing)]
    pub answered_question_keys: Option<String>,
    #[serde(default, skip_serializing)]
    pub answered_option_indices: Option<String>,
}

impl ModuleProgress {
    pub fn fresh(module_id: &str, total_questions: u32) -> Self {
        Self {
            module_id: module_id.to_string(),
            score: 0,
            total_questions,
            longest_streak: 0,
            skipped_questions: total_questions,
            is_completed: false,
            completed_at: None,
            last_question_index: 0,
            answered_question_keys: None,
            answered_option_indices: None,
        }
    }

    pub fn has_legacy_answers(&self) -> bool {
        self.answered_question_keys
            .as_deref()
            .is_some_and(|keys| !keys.trim().is_empty())
    }

    /// Decodes the inline answer lists of an older record, keyed by question position.
    pub fn legacy_answers(&self) -> AppResult<BTreeMap<i64, usize>> {
        decode_answer_map(
            self.answered_question_keys.as_deref().unwrap_or(""),
            self.answered_option_indices.as_deref().unwrap_or(""),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_progress_counts_every_question_as_skipped() {
        let progress = ModuleProgress::fresh("m1", 5);

        assert_eq!(progress.score, 0);
        assert_eq!(progress.total_questions, 5);
        assert_eq!(progress.skipped_questions, 5);
        assert!(!progress.is_completed);
        assert!(progress.completed_at.is_none());
        assert_eq!(progress.last_question_index, 0);
    }

    #[test]
    fn legacy_lists_are_read_but_not_written() {
        let json = r#"{
            "module_id": "m1",
            "score": 1,
            "total_questions": 3,
            "longest_streak": 1,
            "skipped_questions": 1,
            "is_completed": false,
            "last_question_index": 2,
            "answered_question_keys": "0,2",
            "answered_option_indices": "1,3"
        }"#;

        let parsed: ModuleProgress = serde_json::from_str(json).expect("progress should deserialize");
        assert!(parsed.has_legacy_answers());
        let answers = parsed.legacy_answers().expect("legacy lists should decode");
        assert_eq!(answers.get(&0), Some(&1));
        assert_eq!(answers.get(&2), Some(&3));

        let written = serde_json::to_string(&parsed).expect("progress should serialize");
        assert!(!written.contains("answered_question_keys"));
        assert!(!written.contains("answered_option_indices"));
    }

    #[test]
    fn record_without_legacy_lists_has_no_legacy_answers() {
        let progress = ModuleProgress::fresh("m1", 2);
        assert!(!progress.has_legacy_answers());
        assert!(progress.legacy_answers().expect("empty decode").is_empty());
    }
}
