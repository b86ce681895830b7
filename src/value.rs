use std::collections::BTreeMap;

use rust_decimal::Decimal;

/// Dynamic payload carried by a field. Forms own values of mixed shapes,
/// so the value model is a tagged union rather than a generic parameter.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(Decimal),
    Text(String),
    List(Vec<FieldValue>),
    Record(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Record(entries) => Some(entries),
            _ => None,
        }
    }

    /// Truthiness in the presentation sense: empty text and null are
    /// falsy, `Bool(false)` is falsy, zero is falsy, containers are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(value) => *value,
            FieldValue::Number(value) => !value.is_zero(),
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::List(_) | FieldValue::Record(_) => true,
        }
    }

    /// Length for the shapes that have one: text (in characters) and lists.
    pub fn length(&self) -> Option<usize> {
        match self {
            FieldValue::Text(text) => Some(text.chars().count()),
            FieldValue::List(items) => Some(items.len()),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Decimal::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

impl From<BTreeMap<String, FieldValue>> for FieldValue {
    fn from(value: BTreeMap<String, FieldValue>) -> Self {
        FieldValue::Record(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_null() {
        assert_eq!(FieldValue::default(), FieldValue::Null);
    }

    #[test]
    fn truthiness_follows_presentation_rules() {
        assert!(!FieldValue::Null.is_truthy());
        assert!(!FieldValue::Bool(false).is_truthy());
        assert!(FieldValue::Bool(true).is_truthy());
        assert!(!FieldValue::Number(Decimal::ZERO).is_truthy());
        assert!(FieldValue::Number(Decimal::ONE).is_truthy());
        assert!(!FieldValue::from("").is_truthy());
        assert!(FieldValue::from("a").is_truthy());
        assert!(FieldValue::List(Vec::new()).is_truthy());
        assert!(FieldValue::Record(BTreeMap::new()).is_truthy());
    }

    #[test]
    fn length_counts_characters_and_items() {
        assert_eq!(FieldValue::from("héllo").length(), Some(5));
        assert_eq!(
            FieldValue::List(vec![FieldValue::Null, FieldValue::Null]).length(),
            Some(2)
        );
        assert_eq!(FieldValue::Bool(true).length(), None);
        assert_eq!(FieldValue::Null.length(), None);
    }
}
