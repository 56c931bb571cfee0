use crate::models::domain::{Module, Question};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// A four-option question whose correct answer is `correct`.
    pub fn question(id: i64, correct: usize) -> Question {
        Question {
            id,
            text: format!("Question {}", id),
            options: vec![
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ],
            correct_option_index: correct,
        }
    }

    /// Ids 100, 101, 102 with correct options 1, 0 and 2.
    pub fn three_questions() -> Vec<Question> {
        vec![question(100, 1), question(101, 0), question(102, 2)]
    }

    pub fn module(id: &str) -> Module {
        Module {
            id: id.to_string(),
            title: Some(format!("Module {}", id)),
            description: None,
            questions_url: format!("https://example.com/{}.json", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use validator::Validate;

    #[test]
    fn test_fixture_questions_are_valid() {
        for q in three_questions() {
            assert!(q.validate().is_ok());
        }
        assert_eq!(three_questions()[2].correct_option_index, 2);
    }

    #[test]
    fn test_fixture_module() {
        let m = module("m1");
        assert_eq!(m.display_title(), "Module m1");
        assert!(m.questions_url.ends_with("m1.json"));
    }
}
