//! SEO Plan Generation
//!
//! Analysis services, the two-stage action plan pipeline, and the batch run
//! that ties them together.
//!
//! ## Flow
//!
//! ```text
//! URLs ─▶ sitewide audit ─▶ page analysis (batched) ─┬─▶ action plan (skeleton → details → merge)
//!                                                     └─▶ executive summary
//! ```

pub mod analysis;
pub mod pipeline;
pub mod prompts;
pub mod run;
pub mod validators;

pub use analysis::AnalysisService;
pub use pipeline::{ActionPlanPipeline, PlanEvent, PlanObserver, PlanStage, SilentObserver};
pub use run::{AnalysisRequest, AnalysisRun};

use serde::Serialize;

use crate::types::{Result, SeoAnalysisResult, SitewideAnalysis};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FullAnalysis<'a> {
    sitewide_analysis: &'a SitewideAnalysis,
    seo_analysis: &'a SeoAnalysisResult,
}

/// Both analyses as the pretty-printed context the plan and summary prompts embed
pub(crate) fn full_analysis_json(
    sitewide: &SitewideAnalysis,
    analysis: &SeoAnalysisResult,
) -> Result<String> {
    Ok(serde_json::to_string_pretty(&FullAnalysis {
        sitewide_analysis: sitewide,
        seo_analysis: analysis,
    })?)
}
