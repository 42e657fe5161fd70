use serde_json::Value;

use super::super::domain::{
    CombinationLogic, Condition, CriterionResult, Profile, RuleGroup, RuleNode,
};
use super::operators;

/// Parse a catalog-authored rule payload into the typed tree. Catalog rows
/// store the tree either as a JSON object or as a JSON-encoded string; a
/// missing or malformed definition collapses to the empty AND group so one
/// bad catalog entry degrades to "eligible, no criteria" instead of failing
/// the batch.
pub(crate) fn parse_rule_tree(raw: Option<&Value>) -> RuleGroup {
    let Some(raw) = raw else {
        return RuleGroup::empty();
    };

    let parsed = match raw {
        Value::String(text) => serde_json::from_str::<RuleGroup>(text),
        other => serde_json::from_value::<RuleGroup>(other.clone()),
    };

    parsed.unwrap_or_else(|_| RuleGroup::empty())
}

/// Evaluate a rule group against a profile, appending one entry per leaf
/// condition to `criteria` in pre-order. Nesting depth is deliberately not
/// encoded in the collected list.
///
/// `AND` over zero children passes vacuously; `OR` over zero children fails.
pub(crate) fn evaluate_group(
    group: &RuleGroup,
    profile: &Profile,
    criteria: &mut Vec<CriterionResult>,
) -> bool {
    let mut verdicts = Vec::with_capacity(group.conditions.len());

    for node in &group.conditions {
        match node {
            RuleNode::Group(nested) => {
                verdicts.push(evaluate_group(nested, profile, criteria));
            }
            RuleNode::Condition(condition) => {
                let result = evaluate_condition(condition, profile);
                verdicts.push(result.passed);
                criteria.push(result);
            }
        }
    }

    match group.logic {
        CombinationLogic::And => verdicts.iter().all(|passed| *passed),
        CombinationLogic::Or => verdicts.iter().any(|passed| *passed),
    }
}

fn evaluate_condition(condition: &Condition, profile: &Profile) -> CriterionResult {
    let actual = profile.field(&condition.field);
    let passed = operators::apply(condition.operator, actual.as_ref(), &condition.value);

    let message = if passed {
        condition
            .success_message
            .clone()
            .unwrap_or_else(|| format!("criterion {} satisfied", condition.field))
    } else {
        condition
            .failure_message
            .clone()
            .unwrap_or_else(|| format!("criterion {} not satisfied", condition.field))
    };

    CriterionResult {
        criterion: format!(
            "{} {} {}",
            condition.field,
            condition.operator.symbol(),
            condition.value
        ),
        passed,
        message,
        field: condition.field.clone(),
        expected: condition.value.clone(),
        actual,
    }
}
