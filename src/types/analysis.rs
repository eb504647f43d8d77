//! Analysis Payload Types
//!
//! Most analysis payloads are opaque JSON: they are structurally validated and
//! passed through to the caller untouched. Only the fields the orchestration
//! layer reads are typed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::plan::DailyActionPlan;
use super::utils::json_string_array;
use crate::ai::provider::GroundingSource;

/// Whether the audit targets a global or a local audience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    Global,
    Local,
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisType::Global => write!(f, "global"),
            AnalysisType::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" => Ok(AnalysisType::Global),
            "local" => Ok(AnalysisType::Local),
            _ => Err(format!(
                "Unknown analysis type: {}. Valid values: global, local",
                s
            )),
        }
    }
}

/// Sitewide strategic audit (opaque payload)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SitewideAnalysis(pub Value);

impl SitewideAnalysis {
    /// Titles of the strategic roadmap's action plan, fed to page analysis
    pub fn strategic_goals(&self) -> Vec<String> {
        self.0
            .get("strategicRoadmap")
            .and_then(|r| r.get("actionPlan"))
            .and_then(|p| p.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("title").and_then(|t| t.as_str()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Page-level analysis: per-page actions and keyword ideas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoAnalysisResult {
    pub page_actions: Vec<Value>,
    pub keywords: Vec<Value>,
}

impl SeoAnalysisResult {
    /// Append another batch's results, preserving order
    pub fn extend(&mut self, other: SeoAnalysisResult) {
        self.page_actions.extend(other.page_actions);
        self.keywords.extend(other.keywords);
    }
}

/// Executive summary (opaque payload)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutiveSummary(pub Value);

/// Search Console metrics for a page
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GscPerformanceData {
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}

/// Diagnosis of one page's search performance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePerformance {
    pub summary: String,
    pub metrics: GscPerformanceData,
    pub recommendations: Vec<Value>,
}

/// Featured snippet / rich result opportunity for a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetOpportunity {
    pub opportunity_found: bool,
    pub opportunity_type: String,
    pub reasoning: String,
    /// Ready-to-paste JSON-LD
    pub json_ld_schema: Value,
}

/// Snapshot of a keyword's results page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerpInsights {
    pub target_keyword: String,
    pub ai_overview: String,
    pub people_also_ask: Vec<Value>,
    pub related_searches: Vec<Value>,
    pub lsi_keywords: Value,
}

/// Verdict on a completed change, comparing metrics before and after
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostImplementationReport {
    pub verdict: String,
    pub next_steps_summary: String,
    pub before: GscPerformanceData,
    pub after: GscPerformanceData,
}

/// Competitor discovery response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitorSitemaps {
    pub sitemaps: Vec<String>,
}

impl CompetitorSitemaps {
    pub fn from_value(value: &Value) -> Self {
        Self {
            sitemaps: json_string_array(value, "sitemaps"),
        }
    }
}

/// Everything produced by one full analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub urls: Vec<String>,
    pub competitor_sitemaps: Vec<String>,
    pub analysis_type: AnalysisType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub sitewide_analysis: SitewideAnalysis,
    pub analysis: SeoAnalysisResult,
    pub sources: Vec<GroundingSource>,
    pub action_plan: Vec<DailyActionPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive_summary: Option<ExecutiveSummary>,
    /// Page batches whose analysis failed and were skipped
    #[serde(default)]
    pub failed_batches: usize,
}
