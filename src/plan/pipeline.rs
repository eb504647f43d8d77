//! Two-Stage Action Plan Pipeline
//!
//! ## Stages
//!
//! 1. **Skeleton**: one call returns the day-by-day plan with identity and
//!    classification fields only
//! 2. **Details**: every action is enriched by its own call, fanned out
//!    through the bounded executor
//! 3. **Merge**: details are written back at each action's pre-assigned
//!    (day, action) coordinates
//!
//! A failed detail call degrades that action to a placeholder; it never
//! removes the action or fails the plan. Only a skeleton failure is fatal.

use std::fmt;

use tracing::{info, instrument, warn};

use super::full_analysis_json;
use super::prompts::{self, render};
use super::validators::{is_action_item_details, is_plan_skeleton};
use crate::ai::client::AiClient;
use crate::ai::executor::{Progress, TaskOutcome, execute_concurrent};
use crate::ai::provider::CallOptions;
use crate::config::Config;
use crate::constants::pipeline as pipeline_constants;
use crate::types::{
    ActionItem, ActionItemDetails, DailyActionPlan, PlanDay, Result, SeoAnalysisResult,
    SitewideAnalysis, SkeletonResponse, count_actions,
};

// =============================================================================
// Observer
// =============================================================================

/// Pipeline state, reported on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStage {
    SkeletonPending,
    SkeletonReady,
    DetailsPending,
    /// Terminal
    Merged,
}

impl fmt::Display for PlanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkeletonPending => write!(f, "skeleton pending"),
            Self::SkeletonReady => write!(f, "skeleton ready"),
            Self::DetailsPending => write!(f, "details pending"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEvent {
    Stage(PlanStage),
    Log(String),
    DetailProgress(Progress),
}

impl fmt::Display for PlanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage(stage) => write!(f, "Action plan: {}", stage),
            Self::Log(message) => write!(f, "{}", message),
            Self::DetailProgress(p) => write!(
                f,
                "Generating details for task {} of {}...",
                p.completed, p.total
            ),
        }
    }
}

/// Receives pipeline events; any `Fn(&PlanEvent)` closure works
pub trait PlanObserver: Send + Sync {
    fn notify(&self, event: &PlanEvent);
}

impl<F> PlanObserver for F
where
    F: Fn(&PlanEvent) + Send + Sync,
{
    fn notify(&self, event: &PlanEvent) {
        self(event)
    }
}

/// Observer that drops every event
pub struct SilentObserver;

impl PlanObserver for SilentObserver {
    fn notify(&self, _event: &PlanEvent) {}
}

// =============================================================================
// Pipeline
// =============================================================================

/// Generates a fully detailed plan from the sitewide and page analyses
#[derive(Debug, Clone)]
pub struct ActionPlanPipeline {
    client: AiClient,
    detail_concurrency: usize,
    detail_max_tokens: u32,
}

impl ActionPlanPipeline {
    pub fn new(client: AiClient) -> Self {
        Self {
            client,
            detail_concurrency: pipeline_constants::DETAIL_CONCURRENCY,
            detail_max_tokens: pipeline_constants::DETAIL_MAX_TOKENS,
        }
    }

    pub fn from_config(client: AiClient, config: &Config) -> Self {
        Self::new(client)
            .with_detail_concurrency(config.pipeline.detail_concurrency)
            .with_detail_max_tokens(config.ai.detail_max_tokens)
    }

    pub fn with_detail_concurrency(mut self, concurrency: usize) -> Self {
        self.detail_concurrency = concurrency.max(1);
        self
    }

    pub fn with_detail_max_tokens(mut self, max_tokens: u32) -> Self {
        self.detail_max_tokens = max_tokens;
        self
    }

    #[instrument(skip_all, fields(backend = %self.client.target().backend))]
    pub async fn generate(
        &self,
        sitewide: &SitewideAnalysis,
        analysis: &SeoAnalysisResult,
        observer: &dyn PlanObserver,
    ) -> Result<Vec<DailyActionPlan>> {
        let log = |message: String| observer.notify(&PlanEvent::Log(message));
        let analysis_json = full_analysis_json(sitewide, analysis)?;

        // Stage 1: skeleton
        observer.notify(&PlanEvent::Stage(PlanStage::SkeletonPending));
        log(format!(
            "Requesting plan skeleton from {}...",
            self.client.target().backend
        ));
        let skeleton: SkeletonResponse = self
            .client
            .generate_json(
                prompts::ACTION_PLAN_SKELETON_SYSTEM,
                &render(
                    prompts::ACTION_PLAN_SKELETON_USER,
                    &[("analysisJson", analysis_json.as_str())],
                ),
                CallOptions::json(),
                is_plan_skeleton,
                "FullActionPlanSkeleton",
            )
            .await?;
        observer.notify(&PlanEvent::Stage(PlanStage::SkeletonReady));

        let total = count_actions(&skeleton.action_plan);
        info!(
            days = skeleton.action_plan.len(),
            actions = total,
            "Plan skeleton validated"
        );

        if skeleton.action_plan.is_empty() {
            observer.notify(&PlanEvent::Stage(PlanStage::Merged));
            return Ok(Vec::new());
        }

        // Stage 2: details, one call per action
        observer.notify(&PlanEvent::Stage(PlanStage::DetailsPending));
        log("Generating implementation details for all action items...".to_string());

        let coordinates: Vec<(usize, usize, &str)> = skeleton
            .action_plan
            .iter()
            .enumerate()
            .flat_map(|(day_index, day)| {
                day.actions
                    .iter()
                    .enumerate()
                    .map(move |(action_index, action)| {
                        (day_index, action_index, action.title.as_str())
                    })
            })
            .collect();

        let on_progress = |progress: Progress| observer.notify(&PlanEvent::DetailProgress(progress));
        let outcomes = execute_concurrent(
            coordinates.iter().map(|&(_, _, title)| title).collect(),
            |title, _| self.generate_details(&analysis_json, title),
            self.detail_concurrency,
            Some(&on_progress),
        )
        .await;

        // Stage 3: merge. Every slot starts as a placeholder and is replaced
        // by its details when the call succeeded.
        let mut plan: Vec<DailyActionPlan> = skeleton
            .action_plan
            .iter()
            .map(|day| PlanDay {
                day: day.day,
                focus: day.focus.clone(),
                actions: day
                    .actions
                    .iter()
                    .cloned()
                    .map(ActionItem::placeholder)
                    .collect(),
            })
            .collect();

        let mut failed = 0;
        for (&(day_index, action_index, title), outcome) in coordinates.iter().zip(outcomes) {
            let Some(slot) = plan
                .get_mut(day_index)
                .and_then(|day| day.actions.get_mut(action_index))
            else {
                continue;
            };
            match outcome {
                TaskOutcome::Succeeded(details) => {
                    *slot = ActionItem::from_parts(slot.skeleton.clone(), details);
                }
                TaskOutcome::Failed(err) => {
                    failed += 1;
                    warn!(title, error = %err, "Failed to generate action details");
                }
            }
        }

        observer.notify(&PlanEvent::Stage(PlanStage::Merged));
        if failed > 0 {
            log(format!(
                "Assembled the action plan; {} of {} tasks have no implementation details.",
                failed, total
            ));
        } else {
            log("Successfully assembled the full day-by-day action plan.".to_string());
        }

        Ok(plan)
    }

    async fn generate_details(&self, analysis_json: &str, title: &str) -> Result<ActionItemDetails> {
        let user_prompt = render(
            prompts::ACTION_ITEM_DETAIL_USER,
            &[("actionItemTitle", title), ("analysisJson", analysis_json)],
        );
        self.client
            .generate_json(
                prompts::ACTION_ITEM_DETAIL_SYSTEM,
                &user_prompt,
                CallOptions::json().with_max_tokens(self.detail_max_tokens),
                is_action_item_details,
                &format!("ActionItemDetails for \"{}\"", title),
            )
            .await
    }
}
