//! Profile Analyzer: extracts skills and aspirations from the free-text profile.

use tracing::{info, warn};

use crate::catalog::ORGANIZATION_SHORT_NAME;
use crate::llm_client::extract::extract_json;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{ModelGateway, ResponseFormat};
use crate::models::{AnalyzedSkills, EmployeeProfile};
use crate::pipeline::prompts::ANALYSIS_PROMPT_TEMPLATE;
use crate::pipeline::{fill_template, StageError};

/// Runs the analysis stage.
///
/// In mock mode this returns a fixed placeholder so the flow can continue; callers
/// do not distinguish it from a real result.
pub async fn analyze_profile(
    gateway: &ModelGateway,
    profile: &EmployeeProfile,
) -> Result<AnalyzedSkills, StageError> {
    if !gateway.is_available() {
        return Ok(placeholder_analysis());
    }

    let prompt = build_analysis_prompt(profile);
    let text = gateway.generate(&prompt, ResponseFormat::Json).await?;

    let Some(analysis) = extract_json::<AnalyzedSkills>(&text) else {
        warn!(
            "Analysis output not usable: {:?}",
            text.chars().take(120).collect::<String>()
        );
        return Err(StageError::Extraction("AnalyzedSkills"));
    };
    let analysis = analysis.normalized();
    if analysis.is_empty() {
        warn!("Analysis found no skills or aspirations in the profile");
    }

    info!(
        "Analysis extracted {} skills and {} aspirations",
        analysis.extracted_skills.len(),
        analysis.extracted_aspirations.len()
    );
    Ok(analysis)
}

pub fn placeholder_analysis() -> AnalyzedSkills {
    AnalyzedSkills {
        extracted_skills: vec!["Mock Skill 1".to_string(), "Mock Skill 2".to_string()],
        extracted_aspirations: vec!["Mock Aspiration 1".to_string()],
    }
}

fn build_analysis_prompt(profile: &EmployeeProfile) -> String {
    fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("organization", ORGANIZATION_SHORT_NAME),
            ("name", profile.name.as_str()),
            ("current_role", profile.current_role.as_str()),
            ("department", profile.department.as_str()),
            ("career_level", profile.current_career_level.as_str()),
            ("skills", profile.skills_input.as_str()),
            ("certifications", profile.certifications_input.as_str()),
            ("interests", profile.interests_input.as_str()),
            ("aspirations", profile.aspirations_input.as_str()),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    )
}
