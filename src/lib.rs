//! seoplan - Resilient AI Orchestration for SEO Action Plans
//!
//! Turns the output of pluggable generative-AI backends into a validated,
//! structured, day-by-day SEO action plan.
//!
//! ## Core Features
//!
//! - **Bounded Fan-out**: ordered results with at most N calls in flight
//! - **Selective Retry**: exponential backoff with jitter for rate limits,
//!   malformed JSON and timeouts only
//! - **Tolerant JSON**: fences, prose and wrapper objects are peeled off
//!   before validation
//! - **Model Race**: first valid answer among several candidate models wins
//! - **Two-Stage Plan**: skeleton, then per-action details merged back with
//!   placeholders for failures
//!
//! ## Quick Start
//!
//! ```ignore
//! use seoplan::{ActionPlanPipeline, AiClient, AiGateway, AiTarget, Config, RetryPolicy};
//! use seoplan::plan::SilentObserver;
//!
//! let config = Config::default();
//! let client = AiClient::new(
//!     AiGateway::http(Duration::from_secs(config.ai.timeout_secs))?,
//!     RetryPolicy::new(config.retry.clone()),
//!     AiTarget::new(Backend::Gemini, api_key),
//! );
//! let plan = ActionPlanPipeline::from_config(client, &config)
//!     .generate(&sitewide, &analysis, &SilentObserver)
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: executor, retry, JSON extraction, race, gateway and providers
//! - [`plan`]: analysis services, action plan pipeline and batch run
//! - [`config`]: layered configuration
//! - [`storage`]: report snapshots
//! - [`types`]: data model and errors

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod plan;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, Result, SeoError};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    AiClient, AiGateway, AiTarget, RetryPolicy, execute_concurrent, first_success,
    robust_parse,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use plan::{
    ActionPlanPipeline, AnalysisRequest, AnalysisRun, AnalysisService, PlanEvent, PlanObserver,
};
pub use storage::ReportStore;
