use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::value::FieldValue;

pub type ValidatorMessage = Cow<'static, str>;

pub type ValidatorFuture = Pin<Box<dyn Future<Output = bool> + Send + 'static>>;
pub type SyncValidatorFn = Arc<dyn Fn(&FieldValue) -> bool + Send + Sync>;
pub type AsyncValidatorFn = Arc<dyn Fn(FieldValue) -> ValidatorFuture + Send + Sync>;

/// How a validator decides pass or fail. `Literal` carries an externally
/// controlled condition: the caller re-supplies it on every binding call
/// and a changed value (not a re-invocation) is what triggers revalidation.
#[derive(Clone)]
pub enum ValidatorTest {
    Literal(bool),
    Sync(SyncValidatorFn),
    Async(AsyncValidatorFn),
}

impl PartialEq for ValidatorTest {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValidatorTest::Literal(left), ValidatorTest::Literal(right)) => left == right,
            (ValidatorTest::Sync(left), ValidatorTest::Sync(right)) => Arc::ptr_eq(left, right),
            (ValidatorTest::Async(left), ValidatorTest::Async(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl Debug for ValidatorTest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorTest::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            ValidatorTest::Sync(_) => f.write_str("Sync(..)"),
            ValidatorTest::Async(_) => f.write_str("Async(..)"),
        }
    }
}

/// A named pass/fail test over a field value, with an optional failure
/// message. Names must be unique within one field's active validator set;
/// on collision the later entry wins when results merge.
#[derive(Clone, Debug, PartialEq)]
pub struct Validator {
    pub(crate) name: &'static str,
    pub(crate) test: ValidatorTest,
    pub(crate) message: Option<ValidatorMessage>,
}

impl Validator {
    pub fn new(name: &'static str, test: ValidatorTest) -> Self {
        Self {
            name,
            test,
            message: None,
        }
    }

    /// An externally controlled condition, e.g. driven by state that lives
    /// outside the form.
    pub fn literal(name: &'static str, value: bool) -> Self {
        Self::new(name, ValidatorTest::Literal(value))
    }

    pub fn sync<F>(name: &'static str, test: F) -> Self
    where
        F: Fn(&FieldValue) -> bool + Send + Sync + 'static,
    {
        Self::new(name, ValidatorTest::Sync(Arc::new(test)))
    }

    pub fn future<F, Fut>(name: &'static str, test: F) -> Self
    where
        F: Fn(FieldValue) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self::new(
            name,
            ValidatorTest::Async(Arc::new(move |value| Box::pin(test(value)))),
        )
    }

    pub fn message(mut self, message: impl Into<ValidatorMessage>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn test(&self) -> &ValidatorTest {
        &self.test
    }

    pub fn failure_message(&self) -> Option<&ValidatorMessage> {
        self.message.as_ref()
    }
}

/// The literal-boolean subset of a validator set, order preserved.
pub fn boolean_validators(validators: &[Validator]) -> Vec<Validator> {
    validators
        .iter()
        .filter(|validator| matches!(validator.test, ValidatorTest::Literal(_)))
        .cloned()
        .collect()
}

/// Replaces validators in `full` whose names collide with an entry in
/// `fresh`, keeping `full`'s order. Literal validators can go stale between
/// a binding call and a debounced run firing; merging re-injects the latest
/// literal values right before execution.
pub fn merge_validators(fresh: &[Validator], full: &[Validator]) -> Vec<Validator> {
    full.iter()
        .map(|validator| {
            fresh
                .iter()
                .find(|candidate| candidate.name == validator.name)
                .unwrap_or(validator)
                .clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_tests_compare_by_value() {
        let first = Validator::literal("gate", true);
        let second = Validator::literal("gate", true);
        let third = Validator::literal("gate", false);

        assert_eq!(first, second);
        assert_ne!(first, third);
    }

    #[test]
    fn function_tests_compare_by_identity() {
        let shared = Validator::sync("required", |value| value.is_truthy());
        let rebuilt = Validator::sync("required", |value| value.is_truthy());

        assert_eq!(shared, shared.clone());
        assert_ne!(shared, rebuilt);
    }

    #[test]
    fn message_participates_in_equality() {
        let bare = Validator::literal("gate", true);
        let with_message = Validator::literal("gate", true).message("nope");

        assert_ne!(bare, with_message);
    }

    #[test]
    fn boolean_subset_preserves_order_and_messages() {
        let validators = vec![
            Validator::sync("required", |value| value.is_truthy()),
            Validator::literal("first", false).message("first message"),
            Validator::literal("second", true),
        ];

        let booleans = boolean_validators(&validators);
        assert_eq!(booleans.len(), 2);
        assert_eq!(booleans[0].name(), "first");
        assert_eq!(
            booleans[0].failure_message().map(AsRef::as_ref),
            Some("first message")
        );
        assert_eq!(booleans[1].name(), "second");
    }

    #[test]
    fn merge_replaces_colliding_names_in_place() {
        let full = vec![
            Validator::sync("required", |value| value.is_truthy()),
            Validator::literal("gate", false),
        ];
        let fresh = vec![Validator::literal("gate", true)];

        let merged = merge_validators(&fresh, &full);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name(), "required");
        assert_eq!(merged[1], Validator::literal("gate", true));
    }

    #[test]
    fn merge_without_collisions_is_identity() {
        let full = vec![Validator::literal("gate", false)];
        let merged = merge_validators(&[], &full);
        assert_eq!(merged, full);
    }
}
