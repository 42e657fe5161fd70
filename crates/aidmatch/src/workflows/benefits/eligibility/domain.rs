use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored citizen profiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of a citizen's self-reported situation, treated as immutable for
/// the duration of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub age: u32,
    pub professional_status: String,
    pub family_status: String,
    pub children_count: u32,
    pub annual_income: f64,
    pub postal_code: String,
    pub department: String,
    pub region: String,
    pub housing_type: String,
    pub housing_status: String,
    #[serde(default)]
    pub housing_construction_year: Option<i32>,
    pub has_renovation_project: bool,
    pub has_business_project: bool,
    pub is_student: bool,
}

impl Profile {
    /// Rule-facing field names accepted by [`Profile::field`].
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "age",
        "professionalStatus",
        "familyStatus",
        "childrenCount",
        "annualIncome",
        "postalCode",
        "department",
        "region",
        "housingType",
        "housingStatus",
        "housingConstructionYear",
        "hasRenovationProject",
        "hasBusinessProject",
        "isStudent",
    ];

    /// Static accessor from a rule-facing field name to the profile value.
    ///
    /// Unknown names and unanswered optional fields both resolve to `None`,
    /// which the operator library treats as "absent" (only `notExists`
    /// succeeds against it).
    pub fn field(&self, name: &str) -> Option<ConditionValue> {
        match name {
            "age" => Some(ConditionValue::Number(f64::from(self.age))),
            "professionalStatus" => Some(ConditionValue::Text(self.professional_status.clone())),
            "familyStatus" => Some(ConditionValue::Text(self.family_status.clone())),
            "childrenCount" => Some(ConditionValue::Number(f64::from(self.children_count))),
            "annualIncome" => Some(ConditionValue::Number(self.annual_income)),
            "postalCode" => Some(ConditionValue::Text(self.postal_code.clone())),
            "department" => Some(ConditionValue::Text(self.department.clone())),
            "region" => Some(ConditionValue::Text(self.region.clone())),
            "housingType" => Some(ConditionValue::Text(self.housing_type.clone())),
            "housingStatus" => Some(ConditionValue::Text(self.housing_status.clone())),
            "housingConstructionYear" => self
                .housing_construction_year
                .map(|year| ConditionValue::Number(f64::from(year))),
            "hasRenovationProject" => Some(ConditionValue::Bool(self.has_renovation_project)),
            "hasBusinessProject" => Some(ConditionValue::Bool(self.has_business_project)),
            "isStudent" => Some(ConditionValue::Bool(self.is_student)),
            _ => None,
        }
    }
}

/// Value carried by a rule condition or read from a profile field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ConditionValue>),
}

impl ConditionValue {
    /// Numeric canonicalization used by the ordering operators and by loose
    /// equality: numbers pass through, numeric strings parse, booleans map
    /// to 1/0, lists never coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConditionValue::Number(value) => Some(*value),
            ConditionValue::Text(text) => text.trim().parse::<f64>().ok(),
            ConditionValue::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            ConditionValue::List(_) => None,
        }
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Bool(value) => write!(f, "{value}"),
            ConditionValue::Number(value) => {
                if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{value}")
                }
            }
            ConditionValue::Text(text) => f.write_str(text),
            ConditionValue::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// The closed comparison vocabulary available to rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    #[serde(rename = "==")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "notIn")]
    NotIn,
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "notExists")]
    NotExists,
}

impl ConditionOperator {
    pub const fn symbol(self) -> &'static str {
        match self {
            ConditionOperator::Equals => "==",
            ConditionOperator::NotEquals => "!=",
            ConditionOperator::GreaterThan => ">",
            ConditionOperator::GreaterOrEqual => ">=",
            ConditionOperator::LessThan => "<",
            ConditionOperator::LessOrEqual => "<=",
            ConditionOperator::In => "in",
            ConditionOperator::NotIn => "notIn",
            ConditionOperator::Exists => "exists",
            ConditionOperator::NotExists => "notExists",
        }
    }
}

/// Leaf comparison between one profile field and an expected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: ConditionValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
}

/// AND/OR combination logic for a rule group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CombinationLogic {
    And,
    Or,
}

/// Internal node of the eligibility rule tree. Constructed once from catalog
/// data and never mutated afterwards, so the tree is finite by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub logic: CombinationLogic,
    pub conditions: Vec<RuleNode>,
}

impl RuleGroup {
    /// The degraded form malformed or missing rule definitions collapse to:
    /// an AND over nothing, which passes vacuously.
    pub fn empty() -> Self {
        Self {
            logic: CombinationLogic::And,
            conditions: Vec::new(),
        }
    }

    /// Number of leaf conditions across all nesting levels.
    pub fn leaf_count(&self) -> usize {
        self.conditions
            .iter()
            .map(|node| match node {
                RuleNode::Group(group) => group.leaf_count(),
                RuleNode::Condition(_) => 1,
            })
            .sum()
    }
}

/// Sealed node type: either a nested group or a leaf condition. Untagged on
/// the wire because catalog JSON distinguishes the two by shape
/// (`logic`/`conditions` vs `field`/`operator`/`value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleNode {
    Group(RuleGroup),
    Condition(Condition),
}

/// Geographic reach of a benefit program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GeographicScope {
    National,
    Regional,
    Local,
}

/// Benefit program definition as owned by the external catalog. The rule and
/// estimation payloads stay raw JSON here; the engine parses them per
/// evaluation and degrades gracefully on malformed entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub short_description: String,
    pub authority: String,
    pub geographic_scope: GeographicScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility_rules: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimation_rules: Option<serde_json::Value>,
    pub is_active: bool,
}

impl Program {
    pub fn summary(&self) -> ProgramSummary {
        ProgramSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            category: self.category.clone(),
            short_description: self.short_description.clone(),
            authority: self.authority.clone(),
            geographic_scope: self.geographic_scope,
            is_active: self.is_active,
        }
    }
}

/// Program projection embedded in evaluation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub short_description: String,
    pub authority: String,
    pub geographic_scope: GeographicScope,
    pub is_active: bool,
}

/// Income-based reduction declared on formula estimations. Part of the
/// catalog schema; not applied by the baseline calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeModifier {
    pub threshold: f64,
    pub reduction_percent: f64,
}

/// How a program's expected amount is computed once a profile is eligible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EstimationRule {
    #[serde(rename_all = "camelCase")]
    Fixed {
        amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Range {
        min: f64,
        max: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Formula {
        base_amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        per_child_bonus: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_amount: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_amount: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        income_modifier: Option<IncomeModifier>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// Recorded outcome of evaluating one leaf condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionResult {
    pub criterion: String,
    pub passed: bool,
    pub message: String,
    pub field: String,
    pub expected: ConditionValue,
    #[serde(default)]
    pub actual: Option<ConditionValue>,
}

/// Per-program outcome of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramEligibility {
    pub program_id: String,
    pub program: ProgramSummary,
    pub is_eligible: bool,
    pub probability_score: f64,
    pub estimated_amount_min: Option<f64>,
    pub estimated_amount_max: Option<f64>,
    pub criteria_results: Vec<CriterionResult>,
    pub explanation: String,
}

/// Evaluation request accepted at the service boundary. Caller identity is
/// carried separately by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_data: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<ProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persist_results: Option<bool>,
}

/// Full response of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub results: Vec<ProgramEligibility>,
    pub total_programs_evaluated: usize,
    pub eligible_count: usize,
    pub evaluated_at: DateTime<Utc>,
    pub persisted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<ProfileId>,
}
