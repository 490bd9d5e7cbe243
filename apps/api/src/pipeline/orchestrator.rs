//! Orchestrator: sequences analyze → recommend → plan and owns per-stage state.
//!
//! State lives behind a `tokio::sync::RwLock` that is never held across a backend
//! call. Each mutation that starts work bumps an epoch; a stage result is applied
//! only if the epoch it was started under is still current, so a resubmitted profile
//! or a newer path selection always wins over late results.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::ModelGateway;
use crate::models::{AnalyzedSkills, CareerPath, DevelopmentAction, EmployeeProfile};
use crate::pipeline::analyzer::analyze_profile;
use crate::pipeline::ids::IdAllocator;
use crate::pipeline::planner::generate_plan;
use crate::pipeline::recommender::recommend_paths;
use crate::pipeline::StageError;

pub const ANALYSIS_FAILED: &str = "Could not analyze profile. Please check your input or try again.";
pub const PATHS_FAILED: &str = "Could not retrieve career path recommendations. Please try again.";
pub const PLAN_FAILED: &str =
    "Could not generate a development plan for this path. You can still explore the dashboard.";

// ────────────────────────────────────────────────────────────────────────────
// State types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Profile,
    Paths,
    Plan,
    Dashboard,
}

/// The three independent flags one stage exposes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSlot<T> {
    pub loading: bool,
    pub error: Option<String>,
    pub result: Option<T>,
}

impl<T> Default for StageSlot<T> {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            result: None,
        }
    }
}

impl<T> StageSlot<T> {
    fn start(&mut self) {
        self.loading = true;
        self.error = None;
        self.result = None;
    }

    fn succeed(&mut self, value: T) {
        self.loading = false;
        self.error = None;
        self.result = Some(value);
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
        self.result = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSnapshot {
    pub step: Step,
    pub profile: Option<EmployeeProfile>,
    pub analysis: StageSlot<AnalyzedSkills>,
    pub paths: StageSlot<Vec<CareerPath>>,
    pub selected_path: Option<CareerPath>,
    pub plan: StageSlot<Vec<DevelopmentAction>>,
}

impl PipelineSnapshot {
    /// Where a request for `requested` actually lands given what exists so far.
    fn gate(&self, requested: Step) -> Step {
        match requested {
            Step::Plan | Step::Dashboard if self.selected_path.is_none() => {
                if self.profile.is_none() {
                    Step::Profile
                } else {
                    Step::Paths
                }
            }
            Step::Paths if self.profile.is_none() => Step::Profile,
            step => step,
        }
    }
}

#[derive(Debug, Default)]
struct PipelineState {
    snapshot: PipelineSnapshot,
    run_epoch: u64,
    selection_epoch: u64,
    ids: IdAllocator,
    plan_cancel: Option<CancellationToken>,
}

impl PipelineState {
    fn cancel_plan(&mut self) {
        if let Some(token) = self.plan_cancel.take() {
            token.cancel();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StageKind {
    Analysis,
    Paths,
    Plan,
}

impl StageKind {
    fn name(self) -> &'static str {
        match self {
            StageKind::Analysis => "profile analysis",
            StageKind::Paths => "career path recommendation",
            StageKind::Plan => "development plan",
        }
    }

    fn failure_message(self, err: &StageError) -> String {
        match err {
            StageError::TimedOut(_) => format!(
                "The {} step took too long to respond. Please try again.",
                self.name()
            ),
            _ => match self {
                StageKind::Analysis => ANALYSIS_FAILED.to_string(),
                StageKind::Paths => PATHS_FAILED.to_string(),
                StageKind::Plan => PLAN_FAILED.to_string(),
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct Orchestrator {
    gateway: ModelGateway,
    stage_timeout: Duration,
    state: RwLock<PipelineState>,
}

impl Orchestrator {
    pub fn new(gateway: ModelGateway, stage_timeout: Duration) -> Self {
        Self {
            gateway,
            stage_timeout,
            state: RwLock::new(PipelineState::default()),
        }
    }

    pub async fn snapshot(&self) -> PipelineSnapshot {
        self.state.read().await.snapshot.clone()
    }

    /// Starts a fresh run: discards everything downstream, analyzes, then recommends.
    /// Analysis failure stops the run on the profile step; a recommendation failure
    /// still lands on the paths step so the caller can retry.
    pub async fn submit_profile(
        &self,
        profile: EmployeeProfile,
    ) -> Result<PipelineSnapshot, AppError> {
        profile.validate()?;

        let (epoch, ids) = {
            let mut state = self.state.write().await;
            state.cancel_plan();
            state.run_epoch += 1;
            state.selection_epoch += 1;
            state.ids = IdAllocator::new();
            state.snapshot = PipelineSnapshot {
                profile: Some(profile.clone()),
                ..Default::default()
            };
            state.snapshot.analysis.start();
            (state.run_epoch, state.ids.clone())
        };
        info!("Pipeline run {epoch} started for {:?}", profile.name);

        let outcome = self
            .timed(analyze_profile(&self.gateway, &profile))
            .await;

        let analysis = {
            let mut state = self.state.write().await;
            if state.run_epoch != epoch {
                debug!("Discarding analysis from superseded run {epoch}");
                return Ok(state.snapshot.clone());
            }
            match outcome {
                Ok(analysis) => {
                    state.snapshot.analysis.succeed(analysis.clone());
                    state.snapshot.paths.start();
                    analysis
                }
                Err(e) => {
                    warn!("Profile analysis failed: {e}");
                    state
                        .snapshot
                        .analysis
                        .fail(StageKind::Analysis.failure_message(&e));
                    return Ok(state.snapshot.clone());
                }
            }
        };

        Ok(self.recommend(epoch, &profile, &analysis, &ids).await)
    }

    /// Re-runs only the recommendation stage against the current profile and analysis.
    pub async fn retry_recommendations(&self) -> Result<PipelineSnapshot, AppError> {
        let (epoch, profile, analysis, ids) = {
            let mut state = self.state.write().await;
            let (Some(profile), Some(analysis)) = (
                state.snapshot.profile.clone(),
                state.snapshot.analysis.result.clone(),
            ) else {
                return Err(AppError::Conflict(
                    "Submit a profile before requesting recommendations".to_string(),
                ));
            };
            if state.snapshot.paths.loading {
                return Err(AppError::Conflict(
                    "Recommendations are already being generated".to_string(),
                ));
            }
            state.cancel_plan();
            state.selection_epoch += 1;
            state.snapshot.selected_path = None;
            state.snapshot.plan = StageSlot::default();
            state.snapshot.paths.start();
            (state.run_epoch, profile, analysis, state.ids.clone())
        };

        Ok(self.recommend(epoch, &profile, &analysis, &ids).await)
    }

    /// Selects a recommended path and regenerates the plan for it. Analysis and
    /// recommendations are untouched. A newer selection cancels this one. Rejected
    /// with `Conflict` while recommendations are still loading.
    pub async fn select_path(&self, path_id: &str) -> Result<PipelineSnapshot, AppError> {
        let (run_epoch, selection_epoch, profile, path, ids, token) = {
            let mut state = self.state.write().await;
            if state.snapshot.paths.loading {
                return Err(AppError::Conflict(
                    "Recommendations are still being generated".to_string(),
                ));
            }
            let Some(path) = state
                .snapshot
                .paths
                .result
                .as_ref()
                .and_then(|paths| paths.iter().find(|p| p.id == path_id))
                .cloned()
            else {
                return Err(AppError::NotFound(format!("Career path {path_id} not found")));
            };
            let Some(profile) = state.snapshot.profile.clone() else {
                return Err(AppError::Conflict(
                    "User profile not found. Cannot generate development plan.".to_string(),
                ));
            };

            state.cancel_plan();
            state.selection_epoch += 1;
            let token = CancellationToken::new();
            state.plan_cancel = Some(token.clone());
            state.snapshot.selected_path = Some(path.clone());
            state.snapshot.step = Step::Plan;
            state.snapshot.plan.start();
            (
                state.run_epoch,
                state.selection_epoch,
                profile,
                path,
                state.ids.clone(),
                token,
            )
        };
        info!("Generating plan for {:?} (selection {selection_epoch})", path.title);

        let outcome = tokio::select! {
            _ = token.cancelled() => Err(StageError::Cancelled),
            result = self.timed(generate_plan(&self.gateway, &profile, &path, &ids)) => result,
        };

        let mut state = self.state.write().await;
        if state.run_epoch != run_epoch || state.selection_epoch != selection_epoch {
            debug!("Discarding plan for {:?}: superseded", path.title);
            return Ok(state.snapshot.clone());
        }
        state.plan_cancel = None;
        match outcome {
            Ok(plan) => state.snapshot.plan.succeed(plan),
            Err(e) => {
                warn!("Plan generation failed for {:?}: {e}", path.title);
                state
                    .snapshot
                    .plan
                    .fail(StageKind::Plan.failure_message(&e));
            }
        }
        Ok(state.snapshot.clone())
    }

    /// Moves to `requested`, falling back to the furthest step whose inputs exist.
    pub async fn navigate(&self, requested: Step) -> PipelineSnapshot {
        let mut state = self.state.write().await;
        let step = state.snapshot.gate(requested);
        if step != requested {
            debug!("Navigation to {requested:?} redirected to {step:?}");
        }
        state.snapshot.step = step;
        state.snapshot.clone()
    }

    async fn recommend(
        &self,
        epoch: u64,
        profile: &EmployeeProfile,
        analysis: &AnalyzedSkills,
        ids: &IdAllocator,
    ) -> PipelineSnapshot {
        let outcome = self
            .timed(recommend_paths(&self.gateway, profile, analysis, ids))
            .await;

        let mut state = self.state.write().await;
        if state.run_epoch != epoch {
            debug!("Discarding recommendations from superseded run {epoch}");
            return state.snapshot.clone();
        }
        match outcome {
            Ok(paths) => state.snapshot.paths.succeed(paths),
            Err(e) => {
                warn!("Career path recommendation failed: {e}");
                state
                    .snapshot
                    .paths
                    .fail(StageKind::Paths.failure_message(&e));
            }
        }
        state.snapshot.step = Step::Paths;
        state.snapshot.clone()
    }

    async fn timed<T>(
        &self,
        stage: impl Future<Output = Result<T, StageError>>,
    ) -> Result<T, StageError> {
        tokio::time::timeout(self.stage_timeout, stage)
            .await
            .unwrap_or(Err(StageError::TimedOut(self.stage_timeout)))
    }
}
