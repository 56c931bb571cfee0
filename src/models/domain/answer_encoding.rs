//! Flat encoding of an answer map as two comma-joined integer lists
//! (`"0,2"` / `"1,3"`). Only older progress records use it.

use std::collections::BTreeMap;

use crate::errors::{AppError, AppResult};

pub fn encode_answer_map(answers: &BTreeMap<i64, usize>) -> (String, String) {
    let keys = answers
        .keys()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let values = answers
        .values()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    (keys, values)
}

pub fn decode_answer_map(keys: &str, values: &str) -> AppResult<BTreeMap<i64, usize>> {
    let keys = split_list::<i64>(keys)?;
    let values = split_list::<usize>(values)?;

    if keys.len() != values.len() {
        return Err(AppError::Validation(format!(
            "Answer lists differ in length ({} keys, {} values)",
            keys.len(),
            values.len()
        )));
    }

    Ok(keys.into_iter().zip(values).collect())
}

fn split_list<T: std::str::FromStr>(list: &str) -> AppResult<Vec<T>> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    list.split(',')
        .map(|item| {
            item.trim()
                .parse::<T>()
                .map_err(|_| AppError::Validation(format!("Invalid answer list entry '{}'", item)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_round_trip_yields_identical_map() {
        let answers = BTreeMap::from([(0, 1), (2, 3)]);

        let (keys, values) = encode_answer_map(&answers);
        assert_eq!(keys, "0,2");
        assert_eq!(values, "1,3");

        let decoded = decode_answer_map(&keys, &values).expect("lists should decode");
        assert_eq!(decoded, answers);
    }

    #[test]
    fn empty_lists_decode_to_empty_map() {
        assert!(decode_answer_map("", "").expect("empty decode").is_empty());
        assert_eq!(encode_answer_map(&BTreeMap::new()), (String::new(), String::new()));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = decode_answer_map("0,1,2", "1,3").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn non_integer_entries_are_rejected() {
        assert!(decode_answer_map("0,x", "1,2").is_err());
        assert!(decode_answer_map("0", "-1").is_err());
    }
}
