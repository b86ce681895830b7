use futures::future;

use crate::state::{ValidationOutcome, ValidationState};
use crate::validator::{Validator, ValidatorTest};
use crate::value::FieldValue;

/// Identifies one invocation of a field's full validator set. Allocated
/// monotonically per field by the caller; the runner only echoes it back
/// so stale results can be discarded.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BatchId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct BatchOutcome {
    pub batch: BatchId,
    pub validation: ValidationState,
}

/// Runs every validator against `value` concurrently and resolves once all
/// of them have settled. There is no short-circuit on first failure: the
/// full validation state is always computed.
pub async fn run_validators(
    validators: &[Validator],
    value: &FieldValue,
    batch: BatchId,
) -> BatchOutcome {
    let settled =
        future::join_all(validators.iter().map(|validator| evaluate(validator, value))).await;

    let mut validation = ValidationState::new();
    for (name, outcome) in settled {
        // Duplicate validator names: last write wins.
        validation.insert(name, outcome);
    }

    BatchOutcome { batch, validation }
}

async fn evaluate(validator: &Validator, value: &FieldValue) -> (&'static str, ValidationOutcome) {
    let valid = match validator.test() {
        ValidatorTest::Literal(literal) => *literal,
        ValidatorTest::Sync(test) => test(value),
        ValidatorTest::Async(test) => test(value.clone()).await,
    };
    (
        validator.name(),
        ValidationOutcome {
            valid,
            message: validator.failure_message().cloned(),
        },
    )
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use futures_timer::Delay;
    use std::time::Duration;

    use super::*;

    #[test]
    fn runner_settles_every_validator_and_echoes_the_batch() {
        let validators = vec![
            Validator::sync("required", |value| value.is_truthy()).message("must have a value"),
            Validator::literal("gate", true),
            Validator::future("lookup", |_value| async {
                Delay::new(Duration::from_millis(5)).await;
                false
            }),
        ];

        let outcome = block_on(run_validators(
            &validators,
            &FieldValue::from("hello"),
            BatchId(7),
        ));

        assert_eq!(outcome.batch, BatchId(7));
        assert_eq!(outcome.validation.len(), 3);
        assert!(outcome.validation["required"].valid);
        assert!(outcome.validation["gate"].valid);
        assert!(!outcome.validation["lookup"].valid);
        assert_eq!(
            outcome.validation["required"].message.as_deref(),
            Some("must have a value")
        );
    }

    #[test]
    fn duplicate_names_resolve_last_write_wins() {
        let validators = vec![
            Validator::literal("gate", false).message("first"),
            Validator::literal("gate", true).message("second"),
        ];

        let outcome = block_on(run_validators(&validators, &FieldValue::Null, BatchId(1)));

        assert_eq!(outcome.validation.len(), 1);
        assert!(outcome.validation["gate"].valid);
        assert_eq!(outcome.validation["gate"].message.as_deref(), Some("second"));
    }

    #[test]
    fn empty_validator_set_yields_empty_state() {
        let outcome = block_on(run_validators(&[], &FieldValue::Null, BatchId(3)));
        assert!(outcome.validation.is_empty());
        assert_eq!(outcome.batch, BatchId(3));
    }
}
