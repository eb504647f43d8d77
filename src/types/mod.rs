pub mod analysis;
pub mod error;
pub mod plan;
pub mod utils;

pub use analysis::{
    AnalysisReport, AnalysisType, CompetitorSitemaps, ExecutiveSummary, GscPerformanceData,
    PagePerformance, PostImplementationReport, SeoAnalysisResult, SerpInsights,
    SitewideAnalysis, SnippetOpportunity,
};
pub use error::{
    AggregateError, CandidateFailure, ErrorCategory, ErrorClassifier, JsonParseKind, LlmError,
    Result, SeoError,
};
pub use plan::{
    ActionItem, ActionItemDetails, ActionItemSkeleton, ActionType, ChecklistItem,
    DETAILS_FAILED_STEP, DailyActionPlan, NextStep, PlanDay, Priority, PromptTemplate,
    SkeletonDay, SkeletonResponse, SuccessMetric, ToolRef, count_actions,
};
pub use utils::{json_string_array, preview, slugify};
