//! Analysis Services
//!
//! One method per AI-backed analysis. Structured methods are a retried,
//! validated call through [`AiClient`]; text methods skip JSON extraction.
//!
//! Search-grounded services need live Google Search and are only offered
//! on backends that support grounding.

use serde_json::Value;
use tracing::{info, instrument, warn};

use super::full_analysis_json;
use super::prompts::{self, render};
use super::validators;
use crate::ai::client::AiClient;
use crate::ai::gateway::ProviderCallSpec;
use crate::ai::provider::{CallOptions, GroundingSource};
use crate::ai::validation::robust_parse_as;
use crate::types::{
    AnalysisType, CompetitorSitemaps, ExecutiveSummary, GscPerformanceData, PagePerformance,
    PostImplementationReport, Result, SeoAnalysisResult, SeoError, SerpInsights, SitewideAnalysis,
    SnippetOpportunity,
};

/// Analysis calls bound to one AI client
#[derive(Debug, Clone)]
pub struct AnalysisService {
    client: AiClient,
}

impl AnalysisService {
    pub fn new(client: AiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &AiClient {
        &self.client
    }

    fn require_grounding(&self, feature: &str) -> Result<()> {
        if self.client.target().backend.supports_search_grounding() {
            Ok(())
        } else {
            Err(SeoError::Config(format!(
                "{} analysis requires the Gemini provider for live Google Search.",
                feature
            )))
        }
    }

    // =========================================================================
    // Full-run services
    // =========================================================================

    /// Find competitor sitemaps for `user_url`.
    ///
    /// Needs search grounding; other backends get an empty list. Single attempt.
    #[instrument(skip(self))]
    pub async fn discover_competitors(&self, user_url: &str) -> Result<Vec<String>> {
        let backend = self.client.target().backend;
        if !backend.supports_search_grounding() {
            warn!(%backend, "Competitor discovery is only available with search grounding");
            return Ok(Vec::new());
        }

        let spec = ProviderCallSpec::new(
            self.client.target(),
            prompts::COMPETITOR_DISCOVERY_SYSTEM,
            render(prompts::COMPETITOR_DISCOVERY_USER, &[("USER_URL", user_url)]),
            CallOptions::grounded_json(),
        );
        let completion = self.client.gateway().call(&spec).await?;
        let found: CompetitorSitemaps = robust_parse_as(
            &completion.text,
            validators::is_competitor_sitemaps,
            "CompetitorSitemaps",
        )?;
        info!(count = found.sitemaps.len(), "Discovered competitor sitemaps");
        Ok(found.sitemaps)
    }

    #[instrument(skip_all, fields(urls = urls.len(), competitors = competitor_urls.len()))]
    pub async fn generate_sitewide_audit(
        &self,
        urls: &[String],
        competitor_urls: &[String],
        analysis_type: AnalysisType,
        location: Option<&str>,
    ) -> Result<SitewideAnalysis> {
        let system = prompts::sitewide_audit_system(
            self.client.target().backend,
            analysis_type,
            location,
        );
        let user = render(
            prompts::SITEWIDE_AUDIT_USER,
            &[
                ("USER_URL_LIST", urls.join("\n").as_str()),
                ("COMPETITOR_URL_LIST", competitor_urls.join("\n").as_str()),
            ],
        );
        self.client
            .generate_json(
                &system,
                &user,
                CallOptions::grounded_json(),
                validators::is_sitewide_analysis,
                "SitewideAnalysis",
            )
            .await
    }

    /// Page-level analysis of one batch of URLs, with its citations
    #[instrument(skip_all, fields(urls = urls.len()))]
    pub async fn generate_page_analysis(
        &self,
        urls: &[String],
        analysis_type: AnalysisType,
        location: Option<&str>,
        strategic_goals: &[String],
    ) -> Result<(SeoAnalysisResult, Vec<GroundingSource>)> {
        let system = prompts::page_analysis_system(
            self.client.target().backend,
            analysis_type,
            location,
            strategic_goals,
        );
        let user = render(prompts::PAGE_ANALYSIS_USER, &[("URL_LIST", urls.join("\n").as_str())]);
        let structured = self
            .client
            .generate_structured(
                &system,
                &user,
                CallOptions::grounded_json(),
                validators::is_seo_analysis,
                "SeoAnalysisResult",
            )
            .await?;
        Ok((structured.value, structured.sources))
    }

    #[instrument(skip_all)]
    pub async fn generate_executive_summary(
        &self,
        sitewide: &SitewideAnalysis,
        analysis: &SeoAnalysisResult,
    ) -> Result<ExecutiveSummary> {
        let analysis_json = full_analysis_json(sitewide, analysis)?;
        self.client
            .generate_json(
                prompts::EXECUTIVE_SUMMARY_SYSTEM,
                &render(
                    prompts::EXECUTIVE_SUMMARY_USER,
                    &[("analysisJson", analysis_json.as_str())],
                ),
                CallOptions::json(),
                validators::is_executive_summary,
                "ExecutiveSummary",
            )
            .await
    }

    // =========================================================================
    // On-demand services
    // =========================================================================

    #[instrument(skip(self, gsc_data))]
    pub async fn diagnose_page_performance(
        &self,
        url: &str,
        gsc_data: &GscPerformanceData,
    ) -> Result<PagePerformance> {
        let user = render(
            prompts::PERFORMANCE_DIAGNOSIS_USER,
            &[
                ("URL", url),
                ("GSC_JSON", serde_json::to_string_pretty(gsc_data)?.as_str()),
            ],
        );
        self.client
            .generate_json(
                prompts::PERFORMANCE_DIAGNOSIS_SYSTEM,
                &user,
                CallOptions::json(),
                validators::is_page_performance,
                &format!("PagePerformance for {}", url),
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn generate_snippet_opportunity(&self, url: &str) -> Result<SnippetOpportunity> {
        self.require_grounding("Snippet Opportunity")?;
        self.client
            .generate_json(
                prompts::SNIPPET_OPPORTUNITY_SYSTEM,
                &render(prompts::SNIPPET_OPPORTUNITY_USER, &[("URL", url)]),
                CallOptions::grounded_json(),
                validators::is_snippet_opportunity,
                &format!("SnippetOpportunity for {}", url),
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn generate_serp_insights(&self, keyword: &str) -> Result<SerpInsights> {
        self.require_grounding("SERP Insights")?;
        self.client
            .generate_json(
                prompts::SERP_INSIGHTS_SYSTEM,
                &render(prompts::SERP_INSIGHTS_USER, &[("KEYWORD", keyword)]),
                CallOptions::grounded_json(),
                validators::is_serp_insights,
                &format!("SerpInsights for \"{}\"", keyword),
            )
            .await
    }

    /// Markdown commentary on how a results page changed
    #[instrument(skip_all)]
    pub async fn generate_serp_comparison(
        &self,
        baseline: &SerpInsights,
        latest: &SerpInsights,
    ) -> Result<String> {
        let user = render(
            prompts::SERP_COMPARISON_USER,
            &[
                ("BASELINE_JSON", serde_json::to_string_pretty(baseline)?.as_str()),
                ("LATEST_JSON", serde_json::to_string_pretty(latest)?.as_str()),
            ],
        );
        let text = self
            .client
            .generate_text(
                prompts::SERP_COMPARISON_SYSTEM,
                &user,
                CallOptions::default(),
                "SERP comparison",
                true,
            )
            .await?;
        Ok(text.trim().to_string())
    }

    /// Verdict on a change; `before`/`after` in the report are the inputs
    #[instrument(skip_all)]
    pub async fn generate_post_implementation_verdict(
        &self,
        before: &GscPerformanceData,
        after: &GscPerformanceData,
    ) -> Result<PostImplementationReport> {
        let user = render(
            prompts::POST_IMPLEMENTATION_VERDICT_USER,
            &[
                ("BEFORE_JSON", serde_json::to_string(before)?.as_str()),
                ("AFTER_JSON", serde_json::to_string(after)?.as_str()),
            ],
        );
        let report: PostImplementationReport = self
            .client
            .generate_json(
                prompts::POST_IMPLEMENTATION_VERDICT_SYSTEM,
                &user,
                CallOptions::json(),
                validators::is_post_implementation_report,
                "PostImplementationReport",
            )
            .await?;
        Ok(PostImplementationReport {
            before: *before,
            after: *after,
            ..report
        })
    }

    /// Markdown article written from a keyword brief. Returned as-is.
    #[instrument(skip_all)]
    pub async fn generate_article_draft(&self, brief: &Value) -> Result<String> {
        let user = render(
            prompts::ARTICLE_DRAFT_USER,
            &[("BRIEF_JSON", serde_json::to_string_pretty(brief)?.as_str())],
        );
        self.client
            .generate_text(
                prompts::ARTICLE_DRAFT_SYSTEM,
                &user,
                CallOptions::default(),
                "Article draft",
                false,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gateway::{AiGateway, AiTarget};
    use crate::ai::mock::MockFactory;
    use crate::ai::provider::{Backend, Completion};
    use crate::ai::retry::RetryPolicy;
    use crate::config::RetryConfig;
    use secrecy::SecretString;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn service(backend: Backend, factory: MockFactory) -> AnalysisService {
        AnalysisService::new(AiClient::new(
            AiGateway::new(Arc::new(factory), Duration::from_secs(30)),
            RetryPolicy::new(RetryConfig {
                max_attempts: 2,
                base_delay_ms: 10,
                max_jitter_ms: 0,
            }),
            AiTarget::new(backend, SecretString::from("k".to_string())),
        ))
    }

    #[tokio::test]
    async fn test_competitor_discovery_needs_grounding() {
        let factory = MockFactory::text(r#"{"sitemaps": ["https://rival.com/sitemap.xml"]}"#);
        let calls = factory.clone();

        let none = service(Backend::OpenAi, factory.clone())
            .discover_competitors("https://me.com")
            .await
            .unwrap();
        assert!(none.is_empty());
        assert_eq!(calls.calls(), 0);

        let found = service(Backend::Gemini, factory)
            .discover_competitors("https://me.com")
            .await
            .unwrap();
        assert_eq!(found, vec!["https://rival.com/sitemap.xml"]);
        assert_eq!(calls.calls(), 1);
    }

    #[tokio::test]
    async fn test_grounded_services_reject_other_backends() {
        let svc = service(Backend::Anthropic, MockFactory::text("{}"));
        let err = svc.generate_serp_insights("crm software").await.unwrap_err();
        assert!(matches!(err, SeoError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Config error: SERP Insights analysis requires the Gemini provider for live Google Search."
        );
        assert!(svc.generate_snippet_opportunity("https://a.com").await.is_err());
    }

    #[tokio::test]
    async fn test_page_analysis_requests_grounding_and_returns_sources() {
        let factory = MockFactory::new(|req| {
            assert!(req.options.search_grounding);
            assert!(req.user_prompt.contains("https://a.com\nhttps://b.com"));
            Ok(Completion {
                text: r#"{"pageActions": [{"url": "https://a.com"}], "keywords": []}"#.to_string(),
                sources: vec![GroundingSource {
                    uri: "https://serp.example".to_string(),
                    title: String::new(),
                }],
                ..Completion::default()
            })
        });
        let urls = vec!["https://a.com".to_string(), "https://b.com".to_string()];

        let (analysis, sources) = service(Backend::Gemini, factory)
            .generate_page_analysis(&urls, AnalysisType::Global, None, &[])
            .await
            .unwrap();
        assert_eq!(analysis.page_actions.len(), 1);
        assert_eq!(sources.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_serp_comparison_rejects_empty_and_trims() {
        let err = service(Backend::Gemini, MockFactory::text("  \n"))
            .generate_serp_comparison(&SerpInsights::default(), &SerpInsights::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "LLM API error: SERP comparison AI returned an empty response."
        );

        let text = service(Backend::Gemini, MockFactory::text("\n  Rankings moved.  \n"))
            .generate_serp_comparison(&SerpInsights::default(), &SerpInsights::default())
            .await
            .unwrap();
        assert_eq!(text, "Rankings moved.");
    }

    #[tokio::test]
    async fn test_post_implementation_keeps_input_metrics() {
        let factory = MockFactory::text(
            r#"{"verdict": "Worked", "nextStepsSummary": "Keep going",
                "before": {"clicks": 999}, "after": {}}"#,
        );
        let before = GscPerformanceData {
            clicks: 10.0,
            impressions: 100.0,
            ctr: 0.1,
            position: 12.0,
        };
        let after = GscPerformanceData {
            clicks: 30.0,
            ..before
        };

        let report = service(Backend::OpenAi, factory)
            .generate_post_implementation_verdict(&before, &after)
            .await
            .unwrap();
        assert_eq!(report.verdict, "Worked");
        assert_eq!(report.before, before);
        assert_eq!(report.after.clicks, 30.0);
    }

    #[tokio::test]
    async fn test_performance_diagnosis_and_article_draft() {
        let factory = MockFactory::new(|req| {
            if req.system_instruction == prompts::ARTICLE_DRAFT_SYSTEM {
                assert!(!req.options.json_mode);
                return Ok(Completion::text_only("# Title\n\nBody"));
            }
            assert!(req.options.json_mode);
            Ok(Completion::text_only(
                r#"{"summary": "CTR is low", "metrics": {"clicks": 5}, "recommendations": []}"#,
            ))
        });
        let svc = service(Backend::OpenAi, factory);

        let perf = svc
            .diagnose_page_performance("https://a.com", &GscPerformanceData::default())
            .await
            .unwrap();
        assert_eq!(perf.summary, "CTR is low");
        assert_eq!(perf.metrics.clicks, 5.0);

        let draft = svc
            .generate_article_draft(&json!({"phrase": "crm pricing"}))
            .await
            .unwrap();
        assert_eq!(draft, "# Title\n\nBody");
    }
}
