//! Response Validators
//!
//! Shape predicates for every structured AI response. Each checks only the
//! fields the rest of the pipeline reads; extra fields pass through.

use serde_json::Value;

use crate::ai::validation::shape::{
    array_all, has_array, has_bool, has_key, has_number, has_object, has_string,
    has_string_array, is_object,
};

/// `{ sitemaps: [string] }`
pub fn is_competitor_sitemaps(v: &Value) -> bool {
    has_string_array(v, "sitemaps")
}

/// Sitewide strategic audit
pub fn is_sitewide_analysis(v: &Value) -> bool {
    is_object(v)
        && v.get("strategicRoadmap")
            .is_some_and(|r| has_number(r, "projectedImpactScore"))
        && has_key(v, "technicalHealth")
        && has_array(v, "contentGaps")
        && has_array(v, "topicClusters")
        && has_key(v, "siteArchitectureGraph")
        && has_key(v, "localBusinessAudit")
        && has_array(v, "zeroToOneInitiatives")
        && has_key(v, "internalLinkingAnalysis")
        && has_key(v, "cannibalizationAnalysis")
}

/// Page-level analysis: `{ pageActions: [], keywords: [] }`
pub fn is_seo_analysis(v: &Value) -> bool {
    has_array(v, "pageActions") && has_array(v, "keywords")
}

pub fn is_executive_summary(v: &Value) -> bool {
    has_string(v, "summaryTitle")
        && has_string(v, "summaryIntroduction")
        && ["rewrites", "optimizations", "newContent", "redirects", "contentDecay"]
            .iter()
            .all(|key| has_array(v, key))
}

pub fn is_page_performance(v: &Value) -> bool {
    has_string(v, "summary")
        && has_array(v, "recommendations")
        && v.get("metrics").is_some_and(|m| has_number(m, "clicks"))
}

pub fn is_snippet_opportunity(v: &Value) -> bool {
    has_bool(v, "opportunityFound")
        && has_string(v, "opportunityType")
        && has_string(v, "reasoning")
        && has_object(v, "jsonLdSchema")
}

pub fn is_serp_insights(v: &Value) -> bool {
    has_string(v, "targetKeyword")
        && has_string(v, "aiOverview")
        && has_array(v, "peopleAlsoAsk")
        && has_array(v, "relatedSearches")
        && has_object(v, "lsiKeywords")
}

pub fn is_post_implementation_report(v: &Value) -> bool {
    has_string(v, "verdict")
        && has_string(v, "nextStepsSummary")
        && has_object(v, "before")
        && has_object(v, "after")
}

/// Plan skeleton: every day numbered and focused, every action with id and title
pub fn is_plan_skeleton(v: &Value) -> bool {
    array_all(v, "actionPlan", |day| {
        has_number(day, "day")
            && has_string(day, "focus")
            && array_all(day, "actions", |action| {
                has_string(action, "id") && has_string(action, "title")
            })
    })
}

/// Detail stage: the six enrichment lists
pub fn is_action_item_details(v: &Value) -> bool {
    [
        "toolsRequired",
        "stepByStepImplementation",
        "prompts",
        "verificationChecklist",
        "successVerification",
        "nextSteps",
    ]
    .iter()
    .all(|key| has_array(v, key))
}
