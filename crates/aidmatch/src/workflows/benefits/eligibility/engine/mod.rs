mod estimate;
mod operators;
mod rules;

use super::domain::{CriterionResult, Profile, Program, ProgramEligibility};

/// Stateless evaluator turning one program definition and one profile into a
/// per-program eligibility result.
///
/// Evaluation is a pure function of its inputs: neither the program nor the
/// profile is mutated, and repeated calls return identical results.
#[derive(Debug, Default)]
pub struct EligibilityEngine;

impl EligibilityEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate_program(&self, profile: &Profile, program: &Program) -> ProgramEligibility {
        let rule_tree = rules::parse_rule_tree(program.eligibility_rules.as_ref());
        let estimation = estimate::parse_estimation(program.estimation_rules.as_ref());

        let mut criteria: Vec<CriterionResult> = Vec::new();
        let is_eligible = rules::evaluate_group(&rule_tree, profile, &mut criteria);

        let probability_score = if is_eligible { 1.0 } else { 0.0 };
        let (estimated_amount_min, estimated_amount_max) =
            estimate::estimate(estimation.as_ref(), is_eligible);

        let explanation = if is_eligible {
            format!("You are eligible for {}.", program.name)
        } else {
            format!("You are not eligible for {}.", program.name)
        };

        ProgramEligibility {
            program_id: program.id.clone(),
            program: program.summary(),
            is_eligible,
            probability_score,
            estimated_amount_min,
            estimated_amount_max,
            criteria_results: criteria,
            explanation,
        }
    }
}
