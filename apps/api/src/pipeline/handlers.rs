//! Axum route handlers for the career pathing pipeline.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{
    AnalyzedSkills, BadgeTone, CareerPath, DevelopmentAction, EmployeeProfile, ScoreBand,
};
use crate::pipeline::orchestrator::{PipelineSnapshot, StageSlot, Step};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub step: Step,
}

/// A career path plus the display hints a client needs to render its badges.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathView {
    #[serde(flatten)]
    pub path: CareerPath,
    pub score_band: ScoreBand,
    pub score_tone: BadgeTone,
    pub growth_tone: BadgeTone,
    pub interest_tone: BadgeTone,
}

impl From<CareerPath> for CareerPathView {
    fn from(path: CareerPath) -> Self {
        let band = path.score_band();
        Self {
            score_band: band,
            score_tone: band.tone(),
            growth_tone: path.growth_potential.tone(),
            interest_tone: path.interest_alignment.tone(),
            path,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentActionView {
    #[serde(flatten)]
    pub action: DevelopmentAction,
    pub icon: &'static str,
}

impl From<DevelopmentAction> for DevelopmentActionView {
    fn from(action: DevelopmentAction) -> Self {
        Self {
            icon: action.action_type.icon(),
            action,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResponse {
    pub step: Step,
    pub profile: Option<EmployeeProfile>,
    pub analysis: StageSlot<AnalyzedSkills>,
    pub paths: StageSlot<Vec<CareerPathView>>,
    pub selected_path: Option<CareerPathView>,
    pub plan: StageSlot<Vec<DevelopmentActionView>>,
}

fn map_slot<T, U>(slot: StageSlot<Vec<T>>, f: impl Fn(T) -> U) -> StageSlot<Vec<U>> {
    StageSlot {
        loading: slot.loading,
        error: slot.error,
        result: slot.result.map(|items| items.into_iter().map(&f).collect()),
    }
}

impl From<PipelineSnapshot> for PipelineResponse {
    fn from(snapshot: PipelineSnapshot) -> Self {
        Self {
            step: snapshot.step,
            profile: snapshot.profile,
            analysis: snapshot.analysis,
            paths: map_slot(snapshot.paths, CareerPathView::from),
            selected_path: snapshot.selected_path.map(CareerPathView::from),
            plan: map_slot(snapshot.plan, DevelopmentActionView::from),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/pipeline
pub async fn handle_get_pipeline(State(state): State<AppState>) -> Json<PipelineResponse> {
    Json(state.pipeline.snapshot().await.into())
}

/// POST /api/v1/profile
///
/// Starts a new run. Responds once analysis and recommendation have settled;
/// stage failures are reported in the body, not as HTTP errors.
pub async fn handle_submit_profile(
    State(state): State<AppState>,
    Json(profile): Json<EmployeeProfile>,
) -> Result<Json<PipelineResponse>, AppError> {
    let snapshot = state.pipeline.submit_profile(profile).await?;
    Ok(Json(snapshot.into()))
}

/// POST /api/v1/paths/retry
pub async fn handle_retry_paths(
    State(state): State<AppState>,
) -> Result<Json<PipelineResponse>, AppError> {
    let snapshot = state.pipeline.retry_recommendations().await?;
    Ok(Json(snapshot.into()))
}

/// POST /api/v1/paths/:id/select
pub async fn handle_select_path(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PipelineResponse>, AppError> {
    let snapshot = state.pipeline.select_path(&id).await?;
    Ok(Json(snapshot.into()))
}

/// POST /api/v1/navigate
pub async fn handle_navigate(
    State(state): State<AppState>,
    Json(request): Json<NavigateRequest>,
) -> Json<PipelineResponse> {
    Json(state.pipeline.navigate(request.step).await.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionType, Tier};

    fn path(score: i64, growth: Tier) -> CareerPath {
        CareerPath {
            id: "p-1".to_string(),
            title: "AI Product Manager".to_string(),
            description: "d".to_string(),
            required_skills: vec![],
            skills_to_develop: vec![],
            estimated_time_to_reach: "1-2 years".to_string(),
            match_score: score,
            growth_potential: growth,
            interest_alignment: Tier::Other("Unclear".to_string()),
            match_score_adjusted: false,
        }
    }

    #[test]
    fn test_path_view_carries_display_hints() {
        let json = serde_json::to_value(CareerPathView::from(path(80, Tier::Low))).unwrap();
        assert_eq!(json["id"], "p-1");
        assert_eq!(json["matchScore"], 80);
        assert_eq!(json["scoreBand"], "strong");
        assert_eq!(json["scoreTone"], "positive");
        assert_eq!(json["growthTone"], "negative");
        assert_eq!(json["interestAlignment"], "Unclear");
        assert_eq!(json["interestTone"], "neutral");
    }

    #[test]
    fn test_action_view_has_icon() {
        let view = DevelopmentActionView::from(DevelopmentAction {
            id: "a-1".to_string(),
            action_type: ActionType::Mentorship,
            description: "d".to_string(),
            suggested_resource: "r".to_string(),
            estimated_effort: "e".to_string(),
        });
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["actionType"], "Mentorship");
        assert_eq!(json["icon"], "🤝");
    }

    #[test]
    fn test_response_keeps_stage_flags() {
        let mut snapshot = PipelineSnapshot::default();
        snapshot.paths = StageSlot {
            loading: false,
            error: Some("failed".to_string()),
            result: None,
        };
        let json = serde_json::to_value(PipelineResponse::from(snapshot)).unwrap();
        assert_eq!(json["step"], "profile");
        assert_eq!(json["paths"]["error"], "failed");
        assert_eq!(json["paths"]["loading"], false);
        assert!(json["plan"]["result"].is_null());
    }
}
