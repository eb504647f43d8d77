//! Full Analysis Run
//!
//! ## Phases
//!
//! 1. Truncate the URL list to the configured maximum
//! 2. Sitewide audit over all URLs and competitors
//! 3. Page analysis in fixed-size batches through the bounded executor;
//!    failed batches are logged, counted and skipped
//! 4. Action plan and executive summary, concurrently. A plan failure
//!    fails the run; a summary failure is logged and omitted.

use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::analysis::AnalysisService;
use super::pipeline::{ActionPlanPipeline, PlanEvent, PlanObserver};
use crate::ai::client::AiClient;
use crate::ai::executor::{Progress, TaskOutcome, execute_concurrent};
use crate::ai::provider::dedupe_sources;
use crate::config::{Config, PipelineConfig};
use crate::types::{AnalysisReport, AnalysisType, Result, SeoAnalysisResult, SeoError};

/// Inputs of one run. URLs are expected ranked, most important first.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub urls: Vec<String>,
    pub competitor_urls: Vec<String>,
    pub analysis_type: AnalysisType,
    pub location: Option<String>,
}

/// Orchestrates the analysis services into one [`AnalysisReport`]
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    service: AnalysisService,
    pipeline: ActionPlanPipeline,
    limits: PipelineConfig,
}

impl AnalysisRun {
    pub fn new(client: AiClient, config: &Config) -> Self {
        Self {
            pipeline: ActionPlanPipeline::from_config(client.clone(), config),
            service: AnalysisService::new(client),
            limits: config.pipeline.clone(),
        }
    }

    pub fn service(&self) -> &AnalysisService {
        &self.service
    }

    #[instrument(skip_all, fields(urls = request.urls.len()))]
    pub async fn execute(
        &self,
        request: AnalysisRequest,
        observer: &dyn PlanObserver,
    ) -> Result<AnalysisReport> {
        let log = |message: String| observer.notify(&PlanEvent::Log(message));

        if request.urls.is_empty() {
            return Err(SeoError::pipeline("input", "No URLs to analyze"));
        }

        let mut urls = request.urls;
        if urls.len() > self.limits.max_urls {
            warn!(
                total = urls.len(),
                kept = self.limits.max_urls,
                "Truncating URL list"
            );
            urls.truncate(self.limits.max_urls);
        }
        log(format!("Prioritized {} pages for analysis.", urls.len()));

        // Sitewide audit
        log("Initiating sitewide strategic audit...".to_string());
        let sitewide = self
            .service
            .generate_sitewide_audit(
                &urls,
                &request.competitor_urls,
                request.analysis_type,
                request.location.as_deref(),
            )
            .await?;
        log("Sitewide strategic audit complete.".to_string());

        // Page analysis, batched
        let strategic_goals = sitewide.strategic_goals();
        let batches: Vec<&[String]> = urls.chunks(self.limits.batch_size.max(1)).collect();
        log(format!(
            "Analyzing {} pages in {} batches...",
            urls.len(),
            batches.len()
        ));

        let on_progress = |p: Progress| {
            observer.notify(&PlanEvent::Log(format!(
                "Analyzing page batch {} of {}...",
                p.completed, p.total
            )))
        };
        let outcomes = execute_concurrent(
            batches,
            |batch, _| {
                self.service.generate_page_analysis(
                    batch,
                    request.analysis_type,
                    request.location.as_deref(),
                    &strategic_goals,
                )
            },
            self.limits.batch_concurrency,
            Some(&on_progress),
        )
        .await;

        let mut analysis = SeoAnalysisResult::default();
        let mut sources = Vec::new();
        let mut failed_batches = 0;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                TaskOutcome::Succeeded((batch_analysis, batch_sources)) => {
                    analysis.extend(batch_analysis);
                    sources.extend(batch_sources);
                }
                TaskOutcome::Failed(err) => {
                    failed_batches += 1;
                    error!(batch = index + 1, error = %err, "Page analysis batch failed");
                    log("A page analysis batch failed. Continuing with partial data...".to_string());
                }
            }
        }
        let sources = dedupe_sources(sources);
        info!(
            page_actions = analysis.page_actions.len(),
            keywords = analysis.keywords.len(),
            sources = sources.len(),
            failed_batches,
            "Page-level analysis complete"
        );

        // Plan and summary, concurrently
        log("Generating the action plan and executive summary...".to_string());
        let (plan, summary) = tokio::join!(
            self.pipeline.generate(&sitewide, &analysis, observer),
            self.service.generate_executive_summary(&sitewide, &analysis)
        );

        let action_plan = plan.map_err(|err| {
            SeoError::pipeline(
                "action plan",
                format!("Failed to generate the action plan: {}", err),
            )
        })?;

        let executive_summary = match summary {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(error = %err, "Executive summary failed");
                log(format!(
                    "Failed to generate the executive summary: {}. Continuing without it.",
                    err
                ));
                None
            }
        };

        Ok(AnalysisReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            urls,
            competitor_sitemaps: request.competitor_urls,
            analysis_type: request.analysis_type,
            location: request.location,
            sitewide_analysis: sitewide,
            analysis,
            sources,
            action_plan,
            executive_summary,
            failed_batches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gateway::{AiGateway, AiTarget};
    use crate::ai::mock::MockFactory;
    use crate::ai::provider::{Backend, Completion, CompletionRequest, GroundingSource};
    use crate::ai::retry::RetryPolicy;
    use crate::config::RetryConfig;
    use crate::plan::prompts;
    use crate::types::{ErrorCategory, LlmError, count_actions};
    use secrecy::SecretString;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const SITEWIDE: &str = r#"{
        "strategicRoadmap": {"projectedImpactScore": 7, "actionPlan": [{"title": "Own pricing"}]},
        "technicalHealth": {}, "contentGaps": [], "topicClusters": [],
        "siteArchitectureGraph": {}, "localBusinessAudit": {}, "zeroToOneInitiatives": [],
        "internalLinkingAnalysis": {}, "cannibalizationAnalysis": {}
    }"#;

    const SKELETON: &str = r#"{"actionPlan": [{"day": 1, "focus": "Quick wins",
        "actions": [{"id": "fix-titles", "title": "Fix titles"}]}]}"#;

    const DETAILS: &str = r#"{"toolsRequired": [], "stepByStepImplementation": ["Do it"],
        "prompts": [], "verificationChecklist": [], "successVerification": [], "nextSteps": []}"#;

    const SUMMARY: &str = r#"{"summaryTitle": "t", "summaryIntroduction": "i", "rewrites": [],
        "optimizations": [], "newContent": [], "redirects": [], "contentDecay": []}"#;

    fn fatal() -> SeoError {
        SeoError::Llm(LlmError::with_provider(ErrorCategory::Auth, "bad key", "gemini").status(401))
    }

    /// Scripted backend. Page batches echo their first URL as a page action and
    /// cite a shared source plus one per batch.
    fn respond(
        req: &CompletionRequest,
        fail_batch_with: Option<&str>,
        fail_summary: bool,
    ) -> Result<Completion> {
        let system = req.system_instruction.as_str();
        if system == prompts::ACTION_PLAN_SKELETON_SYSTEM {
            return Ok(Completion::text_only(SKELETON));
        }
        if system == prompts::ACTION_ITEM_DETAIL_SYSTEM {
            return Ok(Completion::text_only(DETAILS));
        }
        if system == prompts::EXECUTIVE_SUMMARY_SYSTEM {
            return if fail_summary {
                Err(fatal())
            } else {
                Ok(Completion::text_only(SUMMARY))
            };
        }
        if req.user_prompt.starts_with("Run a sitewide strategic audit") {
            return Ok(Completion::text_only(SITEWIDE));
        }

        // Page analysis batch
        assert!(system.contains("- Own pricing"));
        let first_url = req
            .user_prompt
            .lines()
            .find(|l| l.starts_with("https://"))
            .unwrap_or_default()
            .to_string();
        if fail_batch_with.is_some_and(|url| url == first_url) {
            return Err(fatal());
        }
        Ok(Completion {
            text: json!({"pageActions": [{"url": first_url}], "keywords": []}).to_string(),
            sources: vec![
                GroundingSource { uri: "https://shared.example".to_string(), title: String::new() },
                GroundingSource { uri: format!("{}#src", first_url), title: String::new() },
            ],
            ..Completion::default()
        })
    }

    fn run(factory: MockFactory, config: &Config) -> AnalysisRun {
        let client = AiClient::new(
            AiGateway::new(Arc::new(factory), Duration::from_secs(30)),
            RetryPolicy::new(RetryConfig {
                max_attempts: 2,
                base_delay_ms: 10,
                max_jitter_ms: 0,
            }),
            AiTarget::new(Backend::Gemini, SecretString::from("k".to_string())),
        );
        AnalysisRun::new(client, config)
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://site.example/p{}", i)).collect()
    }

    fn small_batches() -> Config {
        let mut config = Config::default();
        config.pipeline.batch_size = 2;
        config.pipeline.max_urls = 5;
        config
    }

    #[tokio::test]
    async fn test_full_run_batches_and_merges() {
        let factory = MockFactory::new(|req| respond(req, None, false));
        let events = Mutex::new(Vec::new());
        let observer = |e: &PlanEvent| events.lock().unwrap().push(e.to_string());

        let report = run(factory, &small_batches())
            .execute(
                AnalysisRequest {
                    urls: urls(7),
                    ..Default::default()
                },
                &observer,
            )
            .await
            .unwrap();

        // 7 urls truncated to 5, batches of 2 → 3 batches, in order
        assert_eq!(report.urls.len(), 5);
        let pages: Vec<&str> = report
            .analysis
            .page_actions
            .iter()
            .filter_map(|a| a["url"].as_str())
            .collect();
        assert_eq!(
            pages,
            vec![
                "https://site.example/p0",
                "https://site.example/p2",
                "https://site.example/p4"
            ]
        );
        // one shared source + one per batch
        assert_eq!(report.sources.len(), 4);
        assert_eq!(report.sources[0].uri, "https://shared.example");
        assert_eq!(report.failed_batches, 0);
        assert_eq!(count_actions(&report.action_plan), 1);
        assert!(report.executive_summary.is_some());

        let events = events.into_inner().unwrap();
        assert!(events.iter().any(|e| e == "Analyzing page batch 3 of 3..."));
    }

    #[tokio::test]
    async fn test_failed_batch_is_counted_not_fatal() {
        let factory =
            MockFactory::new(|req| respond(req, Some("https://site.example/p2"), false));

        let report = run(factory, &small_batches())
            .execute(
                AnalysisRequest {
                    urls: urls(5),
                    ..Default::default()
                },
                &|_: &PlanEvent| {},
            )
            .await
            .unwrap();

        assert_eq!(report.failed_batches, 1);
        assert_eq!(report.analysis.page_actions.len(), 2);
    }

    #[tokio::test]
    async fn test_summary_failure_is_omitted() {
        let factory = MockFactory::new(|req| respond(req, None, true));

        let report = run(factory, &small_batches())
            .execute(
                AnalysisRequest {
                    urls: urls(2),
                    ..Default::default()
                },
                &|_: &PlanEvent| {},
            )
            .await
            .unwrap();
        assert!(report.executive_summary.is_none());
        assert_eq!(count_actions(&report.action_plan), 1);
    }

    #[tokio::test]
    async fn test_plan_failure_fails_the_run() {
        let factory = MockFactory::new(|req| {
            if req.system_instruction == prompts::ACTION_PLAN_SKELETON_SYSTEM {
                return Err(fatal());
            }
            respond(req, None, false)
        });

        let err = run(factory, &small_batches())
            .execute(
                AnalysisRequest {
                    urls: urls(2),
                    ..Default::default()
                },
                &|_: &PlanEvent| {},
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SeoError::Pipeline { ref stage, .. } if stage == "action plan"));
        assert!(err.to_string().contains("Failed to generate the action plan"));
    }

    #[tokio::test]
    async fn test_empty_url_list_is_rejected() {
        let err = run(MockFactory::text("{}"), &Config::default())
            .execute(AnalysisRequest::default(), &|_: &PlanEvent| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SeoError::Pipeline { .. }));
    }
}
