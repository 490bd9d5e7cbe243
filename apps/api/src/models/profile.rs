use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Employee profile as submitted from the profile form.
///
/// Immutable once submitted for a pipeline run: the orchestrator keeps its own copy
/// and every stage reads from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeProfile {
    pub name: String,
    pub current_role: String,
    pub department: String,
    pub current_career_level: String,
    pub skills_input: String,
    pub certifications_input: String,
    pub interests_input: String,
    pub aspirations_input: String,
}

impl EmployeeProfile {
    /// Name and current role are required; every free-text field may be empty.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name cannot be empty".to_string()));
        }
        if self.current_role.trim().is_empty() {
            return Err(AppError::Validation(
                "currentRole cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Output of the profile analysis stage.
///
/// Both keys are required in backend output. A response missing either one is
/// treated as an extraction failure, not filled with defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedSkills {
    pub extracted_skills: Vec<String>,
    pub extracted_aspirations: Vec<String>,
}

impl AnalyzedSkills {
    /// Trims entries, drops blanks and removes case-insensitive duplicate skills,
    /// keeping the first occurrence so the backend's ordering survives.
    pub fn normalized(self) -> Self {
        let mut seen = HashSet::new();
        let extracted_skills = self
            .extracted_skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
            .collect();

        let extracted_aspirations = self
            .extracted_aspirations
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            extracted_skills,
            extracted_aspirations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extracted_skills.is_empty() && self.extracted_aspirations.is_empty()
    }
}
