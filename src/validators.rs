use std::sync::OnceLock;

use regex::Regex;

use crate::validator::Validator;
use crate::value::FieldValue;

fn is_present(value: &FieldValue) -> bool {
    match value {
        FieldValue::Bool(_) | FieldValue::Number(_) => true,
        other => other.is_truthy(),
    }
}

/// Valid if the value is present. `false` and `0` count as present;
/// null and empty text do not.
pub fn required() -> Validator {
    Validator::sync("required", is_present)
}

/// Valid if the value is numeric: a number, or text in plain decimal form.
pub fn numeric() -> Validator {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"^\d+(\.\d+)?$").expect("numeric pattern must compile"));

    Validator::sync("numeric", move |value| match value {
        FieldValue::Number(_) => true,
        FieldValue::Text(text) => pattern.is_match(text),
        _ => false,
    })
}

/// Text/list validator. Valid if the value has a length and it is not
/// under the given bound.
pub fn min_length(length: usize) -> Validator {
    Validator::sync("min_length", move |value| {
        value.length().is_some_and(|len| len > 0 && len >= length)
    })
}

/// Text/list validator. Valid if the value has a length and it is not
/// over the given bound.
pub fn max_length(length: usize) -> Validator {
    Validator::sync("max_length", move |value| {
        value.length().is_some_and(|len| len > 0 && len <= length)
    })
}

/// Valid if the pattern matches the text value.
pub fn must_match(pattern: Regex) -> Validator {
    Validator::sync("must_match", move |value| {
        value.as_text().is_some_and(|text| pattern.is_match(text))
    })
}

/// Valid if the pattern does _not_ match the text value.
pub fn must_not_match(pattern: Regex) -> Validator {
    Validator::sync("must_not_match", move |value| {
        value
            .as_text()
            .is_none_or(|text| !pattern.is_match(text))
    })
}

/// Record validator (shallow). Valid if all entry values are equal.
pub fn all_equal() -> Validator {
    Validator::sync("all_equal", |value| {
        value.as_record().is_some_and(|entries| {
            let mut values = entries.values();
            match values.next() {
                Some(first) => values.all(|entry| entry == first),
                None => true,
            }
        })
    })
}

/// Record validator (shallow). Valid if all entry values are present.
pub fn all_required() -> Validator {
    Validator::sync("all_required", |value| {
        value
            .as_record()
            .is_some_and(|entries| entries.values().all(is_present))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use super::*;
    use crate::validator::ValidatorTest;

    fn run(validator: &Validator, value: &FieldValue) -> bool {
        match validator.test() {
            ValidatorTest::Sync(test) => test(value),
            _ => panic!("built-in validators are synchronous"),
        }
    }

    fn record(entries: &[(&str, FieldValue)]) -> FieldValue {
        FieldValue::Record(
            entries
                .iter()
                .map(|(key, value)| ((*key).to_owned(), value.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn required_accepts_false_and_zero() {
        let validator = required();
        assert!(run(&validator, &FieldValue::Bool(false)));
        assert!(run(&validator, &FieldValue::Number(Decimal::ZERO)));
        assert!(run(&validator, &FieldValue::from("x")));
        assert!(!run(&validator, &FieldValue::Null));
        assert!(!run(&validator, &FieldValue::from("")));
    }

    #[test]
    fn numeric_accepts_numbers_and_plain_decimal_text() {
        let validator = numeric();
        assert!(run(&validator, &FieldValue::Number(Decimal::ONE)));
        assert!(run(&validator, &FieldValue::from("42")));
        assert!(run(&validator, &FieldValue::from("42.5")));
        assert!(!run(&validator, &FieldValue::from("42.")));
        assert!(!run(&validator, &FieldValue::from("four")));
        assert!(!run(&validator, &FieldValue::Bool(true)));
    }

    #[test]
    fn length_bounds_require_a_length_at_all() {
        assert!(run(&min_length(3), &FieldValue::from("abc")));
        assert!(!run(&min_length(3), &FieldValue::from("ab")));
        assert!(!run(&min_length(0), &FieldValue::from("")));
        assert!(!run(&min_length(1), &FieldValue::Bool(true)));

        assert!(run(&max_length(3), &FieldValue::from("abc")));
        assert!(!run(&max_length(3), &FieldValue::from("abcd")));
        assert!(!run(&max_length(3), &FieldValue::from("")));
    }

    #[test]
    fn regex_pair_is_complementary_on_text() {
        let pattern = || Regex::new(r"^\d+$").expect("pattern must compile");
        assert!(run(&must_match(pattern()), &FieldValue::from("123")));
        assert!(!run(&must_match(pattern()), &FieldValue::from("12a")));
        assert!(!run(&must_match(pattern()), &FieldValue::Null));

        assert!(run(&must_not_match(pattern()), &FieldValue::from("12a")));
        assert!(!run(&must_not_match(pattern()), &FieldValue::from("123")));
        assert!(run(&must_not_match(pattern()), &FieldValue::Null));
    }

    #[test]
    fn all_equal_compares_record_values() {
        let same = record(&[("a", FieldValue::from("x")), ("b", FieldValue::from("x"))]);
        let mixed = record(&[("a", FieldValue::from("x")), ("b", FieldValue::from("y"))]);

        assert!(run(&all_equal(), &same));
        assert!(!run(&all_equal(), &mixed));
        assert!(run(&all_equal(), &record(&[])));
        assert!(!run(&all_equal(), &FieldValue::Null));
    }

    #[test]
    fn all_required_checks_every_record_value() {
        let complete = record(&[
            ("a", FieldValue::from("x")),
            ("b", FieldValue::Bool(false)),
        ]);
        let incomplete = record(&[("a", FieldValue::from("x")), ("b", FieldValue::Null)]);

        assert!(run(&all_required(), &complete));
        assert!(!run(&all_required(), &incomplete));
        assert!(!run(&all_required(), &FieldValue::from("not a record")));
    }
}
