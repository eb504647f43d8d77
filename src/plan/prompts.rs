//! Plan Prompts
//!
//! System instructions and user templates for every analysis call.
//! User templates carry `${NAME}` placeholders filled by [`render`].
//!
//! ## Design Principles
//!
//! 1. **Role first**: each instruction opens with the role the model plays
//! 2. **Schema last**: the expected JSON shape closes the instruction
//! 3. **JSON only**: structured calls forbid prose and code fences
//! 4. **Audience aware**: local audits carry the target location

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::ai::provider::Backend;
use crate::types::AnalysisType;

static PLACEHOLDER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").ok());

/// Replace every `${NAME}` placeholder with its value in one pass.
///
/// Values are inserted verbatim and never rescanned; placeholders without a
/// value are left as-is.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let Some(re) = PLACEHOLDER_RE.as_ref() else {
        return template.to_string();
    };
    re.replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        values
            .iter()
            .find(|(key, _)| *key == name)
            .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
    })
    .into_owned()
}

const JSON_ONLY_RULE: &str = "Respond with a single JSON object only. \
Do not wrap it in markdown code fences and do not add commentary before or after it. \
Escape every double quote inside string values.";

// =============================================================================
// Shared context builders
// =============================================================================

fn audience_section(analysis_type: AnalysisType, location: Option<&str>) -> String {
    match (analysis_type, location.filter(|l| !l.trim().is_empty())) {
        (AnalysisType::Local, Some(location)) => format!(
            "# Audience\n\nThe business serves a local audience in {}. \
Weigh local intent, Google Business Profile signals, NAP consistency and \
location pages heavily.\n\n",
            location
        ),
        (AnalysisType::Local, None) => "# Audience\n\nThe business serves a local audience. \
Weigh local intent and local pack visibility heavily.\n\n"
            .to_string(),
        (AnalysisType::Global, _) => "# Audience\n\nThe business targets a global audience. \
Focus on topical authority and non-local search intent.\n\n"
            .to_string(),
    }
}

fn research_section(backend: Backend) -> &'static str {
    if backend.supports_search_grounding() {
        "# Research\n\nUse Google Search to inspect the live pages and current results \
before you answer. Base every finding on what you observed.\n\n"
    } else {
        "# Research\n\nYou cannot browse. Infer page purpose and content from the URL \
structure and your own knowledge, and say so where a finding is an inference.\n\n"
    }
}

// =============================================================================
// Competitor discovery
// =============================================================================

pub const COMPETITOR_DISCOVERY_SYSTEM: &str = r#"You are a competitive research analyst.

Given a website, use Google Search to find its three to five closest organic search competitors and locate the XML sitemap of each one (check robots.txt and common locations such as /sitemap.xml and /sitemap_index.xml).

Output shape:
{ "sitemaps": ["https://competitor.example/sitemap.xml"] }

Only include sitemap URLs you have confirmed exist. Respond with a single JSON object only."#;

pub const COMPETITOR_DISCOVERY_USER: &str = "The user's website is: ${USER_URL}";

// =============================================================================
// Sitewide audit
// =============================================================================

pub fn sitewide_audit_system(
    backend: Backend,
    analysis_type: AnalysisType,
    location: Option<&str>,
) -> String {
    let mut prompt = String::from(
        "You are a senior SEO strategist producing a sitewide strategic audit. \
You compare the user's full sitemap against key competitors and identify the \
highest-leverage opportunities and risks for the whole site.\n\n",
    );
    prompt.push_str(&audience_section(analysis_type, location));
    prompt.push_str(research_section(backend));
    prompt.push_str(
        r#"# Output

Return one JSON object with exactly these top-level keys:
- "strategicRoadmap": { "missionStatement": string, "projectedImpactScore": number (1-10), "actionPlan": [{ "title": string, "description": string }] }
- "technicalHealth": { "summary": string, "actionItems": [{ "issue": string, "recommendation": string, "priority": "high" | "medium" | "low" }] }
- "contentGaps": [{ "topic": string, "reasoning": string, "competitorUrls": [string] }]
- "topicClusters": [{ "pillar": string, "clusters": [string] }]
- "siteArchitectureGraph": { "nodes": [{ "id": string, "label": string }], "edges": [{ "source": string, "target": string }] }
- "localBusinessAudit": object (empty object for global audits)
- "zeroToOneInitiatives": [{ "title": string, "rationale": string }]
- "internalLinkingAnalysis": { "summary": string, "opportunities": [object] }
- "cannibalizationAnalysis": { "summary": string, "conflicts": [object] }

"#,
    );
    prompt.push_str(JSON_ONLY_RULE);
    prompt
}

pub const SITEWIDE_AUDIT_USER: &str = r#"Run a sitewide strategic audit.

User site URLs:
${USER_URL_LIST}

Competitor URLs:
${COMPETITOR_URL_LIST}"#;

// =============================================================================
// Page analysis
// =============================================================================

pub fn page_analysis_system(
    backend: Backend,
    analysis_type: AnalysisType,
    location: Option<&str>,
    strategic_goals: &[String],
) -> String {
    let mut prompt = String::from(
        "You are an on-page SEO specialist. For every URL you receive, decide whether \
the page should be rewritten, optimized, merged or left alone, and surface new \
keyword opportunities the site is missing.\n\n",
    );
    prompt.push_str(&audience_section(analysis_type, location));
    prompt.push_str(research_section(backend));

    if !strategic_goals.is_empty() {
        prompt.push_str("# Strategic Goals\n\nEvery recommendation should serve one of these goals:\n");
        for goal in strategic_goals {
            prompt.push_str(&format!("- {}\n", goal));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        r#"# Output

Return one JSON object with these keys:
- "pageActions": [{ "url": string, "action": "rewrite" | "optimize" | "merge" | "keep", "reasoning": string, "recommendations": [string] }]
- "keywords": [{ "phrase": string, "intent": string, "difficulty": number, "contentBrief": string }]

"#,
    );
    prompt.push_str(JSON_ONLY_RULE);
    prompt
}

pub const PAGE_ANALYSIS_USER: &str = r#"Analyze the following pages:

${URL_LIST}"#;

// =============================================================================
// Action plan
// =============================================================================

pub const ACTION_PLAN_SKELETON_SYSTEM: &str = r#"You are an SEO program manager. Turn a full site analysis into a day-by-day implementation plan.

# Steps

1. Collect every actionable task: technical fixes from sitewideAnalysis.technicalHealth, page work from seoAnalysis.pageActions, and new content from seoAnalysis.keywords and sitewideAnalysis.contentGaps.
2. Put the highest-impact, lowest-effort work on day 1. Group the rest into themed days with a clear focus.
3. Give each task a concrete, actionable title. Vague tasks are not allowed.

# Output

{
  "actionPlan": [
    {
      "day": number,
      "focus": string,
      "actions": [
        {
          "id": string (slug of the title),
          "title": string,
          "type": "technical" | "content_update" | "new_content",
          "priority": "high" | "medium" | "low",
          "url": string,
          "primaryKeyword": string (empty for sitewide technical work),
          "impact": number (1-10),
          "estimatedTime": string,
          "dependencies": [string] (titles of blocking tasks)
        }
      ]
    }
  ]
}

Only these skeleton fields. Respond with a single JSON object only, starting with { and ending with }."#;

pub const ACTION_PLAN_SKELETON_USER: &str = r#"Build the day-by-day plan skeleton for this analysis.

<analysis_data>
${analysisJson}
</analysis_data>"#;

pub const ACTION_ITEM_DETAIL_SYSTEM: &str = r#"You are an SEO implementation specialist. Expand one planned task into a guide a junior team member could follow without asking questions.

# Output

{
  "toolsRequired": [{ "name": string, "url": string (optional) }],
  "stepByStepImplementation": [string] (one granular, verifiable step per entry),
  "prompts": [{ "title": string, "prompt": string (copy-paste ready, with audience, keywords and tone) }],
  "verificationChecklist": [{ "item": string, "checked": false }],
  "successVerification": [{ "method": string, "metric": string (measurable KPI) }],
  "nextSteps": [{ "action": string, "rationale": string }]
}

Respond with a single JSON object only, starting with { and ending with }. Escape every double quote inside string values."#;

pub const ACTION_ITEM_DETAIL_USER: &str = r#"Write the implementation details for this task.

Task title: "${actionItemTitle}"

<analysis_data>
${analysisJson}
</analysis_data>"#;

// =============================================================================
// Executive summary
// =============================================================================

pub const EXECUTIVE_SUMMARY_SYSTEM: &str = r#"You are an SEO consultant writing for a business owner. Condense the analysis into a prioritized summary.

# Output

{
  "summaryTitle": string,
  "summaryIntroduction": string,
  "rewrites": [{ "url": string, "reason": string }],
  "optimizations": [{ "url": string, "reason": string }],
  "newContent": [{ "title": string, "targetKeyword": string, "reason": string }],
  "redirects": [{ "from": string, "to": string, "reason": string }],
  "contentDecay": [{ "url": string, "reason": string }]
}

Use empty arrays where a category has nothing to report. Respond with a single JSON object only."#;

pub const EXECUTIVE_SUMMARY_USER: &str = r#"Summarize this analysis.

<analysis_data>
${analysisJson}
</analysis_data>"#;

// =============================================================================
// On-demand services
// =============================================================================

pub const PERFORMANCE_DIAGNOSIS_SYSTEM: &str = r#"You are a search performance analyst. Diagnose why a page performs the way it does from its Google Search Console metrics.

# Output

{
  "summary": string,
  "metrics": { "clicks": number, "impressions": number, "ctr": number, "position": number },
  "recommendations": [{ "title": string, "detail": string }]
}

Echo the metrics you were given. Respond with a single JSON object only."#;

pub const PERFORMANCE_DIAGNOSIS_USER: &str = r#"Diagnose the performance for the URL: ${URL}

Search Console data:
${GSC_JSON}"#;

pub const SNIPPET_OPPORTUNITY_SYSTEM: &str = r#"You are a rich results specialist. Use Google Search to read the page and the current results for its topic, then decide whether it can win a featured snippet or rich result.

# Output

{
  "opportunityFound": boolean,
  "opportunityType": string (e.g. "FAQPage", "HowTo", "Paragraph", "None"),
  "reasoning": string,
  "jsonLdSchema": object (ready-to-paste JSON-LD, empty object when none)
}

Respond with a single JSON object only."#;

pub const SNIPPET_OPPORTUNITY_USER: &str =
    "Analyze the content of this URL for snippet opportunities: ${URL}";

pub const SERP_INSIGHTS_SYSTEM: &str = r#"You are a SERP researcher. Use Google Search to capture the current results page for a keyword.

# Output

{
  "targetKeyword": string,
  "aiOverview": string (summary of the AI overview, or "None"),
  "peopleAlsoAsk": [string],
  "relatedSearches": [string],
  "lsiKeywords": { "<theme>": [string] }
}

Respond with a single JSON object only."#;

pub const SERP_INSIGHTS_USER: &str = r#"Generate SERP insights for the keyword: "${KEYWORD}""#;

pub const POST_IMPLEMENTATION_VERDICT_SYSTEM: &str = r#"You are a search performance analyst judging whether a completed SEO change worked.

# Output

{
  "verdict": string (one short sentence),
  "nextStepsSummary": string,
  "before": object (the before metrics, echoed),
  "after": object (the after metrics, echoed)
}

Respond with a single JSON object only."#;

pub const POST_IMPLEMENTATION_VERDICT_USER: &str = r#"Before data: ${BEFORE_JSON}

After data: ${AFTER_JSON}"#;

pub const SERP_COMPARISON_SYSTEM: &str = "You are a SERP analyst. Compare two snapshots of the same \
results page and explain in a few short markdown paragraphs what changed and what it means for the \
site. Plain text only, no JSON.";

pub const SERP_COMPARISON_USER: &str = r#"Analyze the difference between the two SERP snapshots provided.

Baseline snapshot:
${BASELINE_JSON}

Latest snapshot:
${LATEST_JSON}"#;

pub const ARTICLE_DRAFT_SYSTEM: &str = "You are a senior content writer. Write a complete, \
well-structured article in markdown from the brief you are given. Use the target keyword \
naturally, answer the searcher's intent early, and use descriptive H2/H3 headings. \
Return only the article.";

pub const ARTICLE_DRAFT_USER: &str = r#"Generate an article based on this brief:

${BRIEF_JSON}"#;
