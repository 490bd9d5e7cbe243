//! Plan Generator: suggests concrete development actions toward a selected path.

use tracing::{info, warn};

use crate::catalog::ORGANIZATION_SHORT_NAME;
use crate::llm_client::extract::extract_json;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{ModelGateway, ResponseFormat};
use crate::models::{CareerPath, DevelopmentAction, EmployeeProfile};
use crate::pipeline::ids::IdAllocator;
use crate::pipeline::prompts::PLAN_PROMPT_TEMPLATE;
use crate::pipeline::{fill_template, StageError};

/// Runs the plan stage. Empty list in mock mode; an empty array from the backend is a
/// valid "no suggestions" result.
pub async fn generate_plan(
    gateway: &ModelGateway,
    profile: &EmployeeProfile,
    path: &CareerPath,
    ids: &IdAllocator,
) -> Result<Vec<DevelopmentAction>, StageError> {
    if !gateway.is_available() {
        return Ok(Vec::new());
    }

    let prompt = build_plan_prompt(profile, path);
    let text = gateway.generate(&prompt, ResponseFormat::Json).await?;

    let Some(mut actions) = extract_json::<Vec<DevelopmentAction>>(&text) else {
        warn!(
            "Plan output not usable: {:?}",
            text.chars().take(120).collect::<String>()
        );
        return Err(StageError::Extraction("development action list"));
    };

    let backfilled = ids.backfill(&mut actions);
    info!(
        "Generated {} development actions for {:?} ({} ids backfilled)",
        actions.len(),
        path.title,
        backfilled
    );
    Ok(actions)
}

fn build_plan_prompt(profile: &EmployeeProfile, path: &CareerPath) -> String {
    let required_skills = path.required_skills.join(", ");
    let skills_to_develop = path.skills_to_develop.join(", ");
    let current_skills = match profile.skills_input.trim() {
        "" => "Not specified",
        skills => skills,
    };

    fill_template(
        PLAN_PROMPT_TEMPLATE,
        &[
            ("organization", ORGANIZATION_SHORT_NAME),
            ("name", profile.name.as_str()),
            ("title", path.title.as_str()),
            ("required_skills", required_skills.as_str()),
            ("skills_to_develop", skills_to_develop.as_str()),
            ("current_skills", current_skills),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}
