use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_correct_option"))]
pub struct Question {
    pub id: i64,
    #[serde(rename = "question")]
    pub text: String,
    #[validate(length(min = 2, message = "A question needs at least two options"))]
    pub options: Vec<String>,
    #[serde(rename = "correctOptionIndex")]
    pub correct_option_index: usize,
}

fn validate_correct_option(question: &Question) -> Result<(), ValidationError> {
    if question.correct_option_index < question.options.len() {
        Ok(())
    } else {
        Err(ValidationError::new("correct_option_out_of_range"))
    }
}

impl Question {
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_option_index
    }

    pub fn has_option(&self, option_index: usize) -> bool {
        option_index < self.options.len()
    }

    pub fn option_text(&self, option_index: usize) -> Option<&str> {
        self.options.get(option_index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], correct: usize) -> Question {
        Question {
            id: 7,
            text: "Which keyword declares a read-only variable?".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_option_index: correct,
        }
    }

    #[test]
    fn question_deserializes_endpoint_field_names() {
        let json = r#"{
            "id": 3,
            "question": "2 + 2?",
            "options": ["3", "4", "5"],
            "correctOptionIndex": 1
        }"#;

        let parsed: Question = serde_json::from_str(json).expect("question should deserialize");
        assert_eq!(parsed.id, 3);
        assert_eq!(parsed.text, "2 + 2?");
        assert_eq!(parsed.option_text(1), Some("4"));
        assert!(parsed.is_correct(1));
        assert!(!parsed.is_correct(0));
    }

    #[test]
    fn valid_question_passes_validation() {
        assert!(question(&["val", "var"], 0).validate().is_ok());
    }

    #[test]
    fn single_option_question_is_rejected() {
        assert!(question(&["val"], 0).validate().is_err());
    }

    #[test]
    fn out_of_range_correct_index_is_rejected() {
        let q = question(&["val", "var"], 2);
        assert!(!q.has_option(2));
        assert!(q.validate().is_err());
    }
}
