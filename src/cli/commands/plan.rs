//! Plan Command
//!
//! Generate the day-by-day action plan from an existing analysis.
//!
//! Usage:
//!   seoplan plan analysis.json [-o plan.json]
//!
//! The input is either a saved report or `{ sitewideAnalysis, seoAnalysis }`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::runtime::Runtime;
use tracing::info;

use crate::cli::progress::ConsoleObserver;
use crate::cli::ui::Output;
use crate::cli::util::{AiOverrides, CommandContext};
use crate::plan::ActionPlanPipeline;
use crate::types::{DailyActionPlan, Result, SeoAnalysisResult, SitewideAnalysis, count_actions};

/// Plan command options
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub input: PathBuf,
    /// Plan destination; stdout when absent
    pub output: Option<PathBuf>,
    pub ai: AiOverrides,
    pub quiet: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanInput {
    sitewide_analysis: SitewideAnalysis,
    #[serde(alias = "analysis")]
    seo_analysis: SeoAnalysisResult,
}

fn read_input(path: &Path) -> Result<PlanInput> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn run(options: PlanOptions) -> Result<()> {
    let out = Output::quiet(options.quiet);
    let input = read_input(&options.input)?;
    let ctx = CommandContext::load(&options.ai)?;

    out.header("Action Plan");
    out.field("Input", options.input.display());
    out.field("Backend", ctx.client.target().backend);

    let pipeline = ActionPlanPipeline::from_config(ctx.client.clone(), &ctx.config);
    // Progress goes to stdout only when the plan itself does not
    let observer = ConsoleObserver::new(options.quiet || options.output.is_none());

    let rt = Runtime::new()?;
    let plan = rt.block_on(pipeline.generate(
        &input.sitewide_analysis,
        &input.seo_analysis,
        &observer,
    ))?;

    let content = if ctx.config.output.pretty {
        serde_json::to_string_pretty(&plan)?
    } else {
        serde_json::to_string(&plan)?
    };

    match &options.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
            info!("Wrote plan to {}", path.display());
            print_summary(&out, &plan, &observer);
            out.success(&format!("Plan written to {}", path.display()));
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn print_summary(out: &Output, plan: &[DailyActionPlan], observer: &ConsoleObserver) {
    let placeholders = plan
        .iter()
        .flat_map(|d| &d.actions)
        .filter(|a| a.is_placeholder())
        .count();

    out.field("Days", plan.len());
    out.field("Actions", count_actions(plan));
    out.field("Elapsed", observer.elapsed());
    if placeholders > 0 {
        out.warning(&format!(
            "{} action(s) are missing details. Re-run to retry them.",
            placeholders
        ));
    }
}
