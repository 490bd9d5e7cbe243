//! Path Recommender: proposes 2-3 internal career paths grounded in the role catalog.

use tracing::{info, warn};

use crate::catalog::{roles_json, ORGANIZATION_SHORT_NAME};
use crate::llm_client::extract::extract_json;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{ModelGateway, ResponseFormat};
use crate::models::{AnalyzedSkills, CareerPath, EmployeeProfile, UNREADABLE_SCORE};
use crate::pipeline::ids::IdAllocator;
use crate::pipeline::prompts::RECOMMENDATION_PROMPT_TEMPLATE;
use crate::pipeline::{fill_template, join_or, StageError};

/// Runs the recommendation stage.
///
/// Mock mode yields an empty list, which is a displayable state distinct from failure.
/// An empty array from the backend is likewise a success; only unreadable output fails.
/// Returned paths always have unique ids and scores within 0..=100; a path whose score
/// is unreadable is kept with a flagged score of 0.
pub async fn recommend_paths(
    gateway: &ModelGateway,
    profile: &EmployeeProfile,
    analysis: &AnalyzedSkills,
    ids: &IdAllocator,
) -> Result<Vec<CareerPath>, StageError> {
    if !gateway.is_available() {
        return Ok(Vec::new());
    }

    let prompt = build_recommendation_prompt(profile, analysis);
    let text = gateway.generate(&prompt, ResponseFormat::Json).await?;

    let Some(mut paths) = extract_json::<Vec<CareerPath>>(&text) else {
        warn!(
            "Recommendation output not usable: {:?}",
            text.chars().take(120).collect::<String>()
        );
        return Err(StageError::Extraction("career path list"));
    };

    for path in &mut paths {
        let raw = path.match_score;
        if !path.clamp_match_score() {
            continue;
        }
        if raw == UNREADABLE_SCORE {
            warn!("Unreadable matchScore for path {:?}; showing 0", path.title);
        } else {
            warn!(
                "Clamped matchScore {} to {} for path {:?}",
                raw, path.match_score, path.title
            );
        }
    }

    let backfilled = ids.backfill(&mut paths);
    info!(
        "Recommended {} career paths ({} ids backfilled)",
        paths.len(),
        backfilled
    );
    Ok(paths)
}

fn build_recommendation_prompt(profile: &EmployeeProfile, analysis: &AnalyzedSkills) -> String {
    let roles = roles_json();
    let extracted_skills = join_or(&analysis.extracted_skills, "None");
    let extracted_aspirations = join_or(&analysis.extracted_aspirations, "None");

    fill_template(
        RECOMMENDATION_PROMPT_TEMPLATE,
        &[
            ("organization", ORGANIZATION_SHORT_NAME),
            ("roles_json", roles.as_str()),
            ("name", profile.name.as_str()),
            ("current_role", profile.current_role.as_str()),
            ("skills", profile.skills_input.as_str()),
            ("interests", profile.interests_input.as_str()),
            ("aspirations", profile.aspirations_input.as_str()),
            ("extracted_skills", extracted_skills.as_str()),
            ("extracted_aspirations", extracted_aspirations.as_str()),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}
