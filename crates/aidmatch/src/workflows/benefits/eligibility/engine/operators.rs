use std::cmp::Ordering;

use super::super::domain::{ConditionOperator, ConditionValue};

/// Apply one operator to an optional actual value and an expected value.
///
/// Fail-closed on missing data: when `actual` is absent only `notExists`
/// succeeds. Every other failure mode (non-numeric operand for an ordering
/// operator, non-list expected for a membership operator) resolves to
/// `false`, never to an error.
pub(crate) fn apply(
    operator: ConditionOperator,
    actual: Option<&ConditionValue>,
    expected: &ConditionValue,
) -> bool {
    let Some(actual) = actual else {
        return operator == ConditionOperator::NotExists;
    };

    match operator {
        ConditionOperator::Equals => loose_eq(actual, expected),
        ConditionOperator::NotEquals => !loose_eq(actual, expected),
        ConditionOperator::GreaterThan => {
            matches!(numeric_cmp(actual, expected), Some(Ordering::Greater))
        }
        ConditionOperator::GreaterOrEqual => matches!(
            numeric_cmp(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        ConditionOperator::LessThan => {
            matches!(numeric_cmp(actual, expected), Some(Ordering::Less))
        }
        ConditionOperator::LessOrEqual => matches!(
            numeric_cmp(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ConditionOperator::In => {
            matches!(expected, ConditionValue::List(items) if items.contains(actual))
        }
        ConditionOperator::NotIn => {
            matches!(expected, ConditionValue::List(items) if !items.contains(actual))
        }
        ConditionOperator::Exists => true,
        ConditionOperator::NotExists => false,
    }
}

/// Canonicalizing loose equality: same-type text and lists compare directly,
/// everything else compares through numeric coercion so `"30"` equals `30`.
pub(crate) fn loose_eq(actual: &ConditionValue, expected: &ConditionValue) -> bool {
    match (actual, expected) {
        (ConditionValue::Text(left), ConditionValue::Text(right)) => left == right,
        (ConditionValue::List(left), ConditionValue::List(right)) => left == right,
        (left, right) => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn numeric_cmp(actual: &ConditionValue, expected: &ConditionValue) -> Option<Ordering> {
    let left = actual.as_number()?;
    let right = expected.as_number()?;
    left.partial_cmp(&right)
}
