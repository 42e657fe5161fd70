use crate::infra::{build_service, demo_profile, InMemoryProgramCatalog};
use aidmatch::error::AppError;
use aidmatch::workflows::benefits::eligibility::{
    EligibilityServiceError, EvaluationRequest, ProgramCatalog, ProgramEligibility, ProgramFilter,
    UserId,
};
use clap::Args;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Age of the sample applicant
    #[arg(long, default_value_t = 22)]
    pub(crate) age: u32,
    /// Annual income of the sample applicant
    #[arg(long, default_value_t = 8000.0)]
    pub(crate) annual_income: f64,
    /// Number of dependent children
    #[arg(long, default_value_t = 0)]
    pub(crate) children_count: u32,
    /// Housing occupancy status (e.g. RENTER, OWNER)
    #[arg(long, default_value = "RENTER")]
    pub(crate) housing_status: String,
    /// Declare a business creation project
    #[arg(long)]
    pub(crate) business_project: bool,
    /// Restrict the evaluation to one program category
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Skip the persistence walkthrough with the seeded profile
    #[arg(long)]
    pub(crate) skip_persistence: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ProgramsArgs {
    /// Restrict the listing to one program category
    #[arg(long)]
    pub(crate) category: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        age,
        annual_income,
        children_count,
        housing_status,
        business_project,
        category,
        skip_persistence,
    } = args;

    let service = build_service();

    let mut profile = demo_profile();
    profile.age = age;
    profile.annual_income = annual_income;
    profile.children_count = children_count;
    profile.housing_status = housing_status;
    profile.has_business_project = business_project;

    println!("Eligibility demo");
    println!(
        "Applicant: age {}, income {:.0}/year, {} child(ren), housing {}",
        profile.age, profile.annual_income, profile.children_count, profile.housing_status
    );

    let request = EvaluationRequest {
        profile_data: Some(profile),
        category,
        ..EvaluationRequest::default()
    };
    let response = service.evaluate(None, &request)?;

    println!(
        "\nEvaluated {} program(s), {} eligible (at {})",
        response.total_programs_evaluated,
        response.eligible_count,
        response.evaluated_at.to_rfc3339()
    );
    for result in &response.results {
        render_result(result);
    }

    if skip_persistence {
        return Ok(());
    }

    println!("\nPersistence walkthrough (seeded profile owned by user-demo)");
    let caller = UserId("user-demo".to_string());
    let first = service.evaluate(Some(&caller), &EvaluationRequest::default())?;
    let profile_id = match &first.profile_id {
        Some(id) => id.clone(),
        None => {
            println!("  No stable profile id resolved; nothing was persisted");
            return Ok(());
        }
    };
    println!(
        "- First run: persisted={}, {} row(s) stored",
        first.persisted,
        service.stored_results(&profile_id)?.len()
    );

    let second = service.evaluate(Some(&caller), &EvaluationRequest::default())?;
    let rows = service.stored_results(&profile_id)?;
    println!(
        "- Second run: persisted={}, still {} row(s) (overwritten, not appended)",
        second.persisted,
        rows.len()
    );

    Ok(())
}

pub(crate) fn run_programs(args: ProgramsArgs) -> Result<(), AppError> {
    let catalog = InMemoryProgramCatalog::seeded();
    let filter = ProgramFilter {
        category: args.category,
        program_ids: None,
    };
    let programs = catalog
        .list_active(&filter)
        .map_err(EligibilityServiceError::from)?;

    println!("Active programs ({})", programs.len());
    for program in &programs {
        println!(
            "- {} [{}] {} -- {}",
            program.id, program.category, program.name, program.short_description
        );
    }

    Ok(())
}

fn render_result(result: &ProgramEligibility) {
    let marker = if result.is_eligible { "ELIGIBLE" } else { "not eligible" };
    println!("\n{} -- {}", result.program.name, marker);

    match (result.estimated_amount_min, result.estimated_amount_max) {
        (Some(min), Some(max)) if min == max => println!("  Estimated amount: {min:.0}"),
        (Some(min), Some(max)) => println!("  Estimated amount: between {min:.0} and {max:.0}"),
        _ => println!("  Estimated amount: none"),
    }

    for criterion in &result.criteria_results {
        let check = if criterion.passed { "ok" } else { "KO" };
        println!("  [{check}] {} ({})", criterion.message, criterion.criterion);
    }
}
