//! Audit Command
//!
//! Full analysis run over a ranked URL list: sitewide audit, batched page
//! analysis, action plan and executive summary. The report is saved as a
//! snapshot in the output directory.
//!
//! Usage:
//!   seoplan audit urls.txt [--competitor URL]... [--discover-competitors]
//!                 [--type local --location "Austin, TX"]

use std::path::PathBuf;

use tokio::runtime::Runtime;
use tracing::warn;

use crate::cli::progress::ConsoleObserver;
use crate::cli::ui::Output;
use crate::cli::util::{AiOverrides, CommandContext, read_url_list};
use crate::plan::{AnalysisRequest, AnalysisRun};
use crate::storage::ReportStore;
use crate::types::{AnalysisReport, AnalysisType, Result, SeoError, count_actions};

/// Audit command options
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// File with one URL per line, most important first
    pub urls_file: PathBuf,
    pub competitors: Vec<String>,
    /// Ask the backend for competitor sitemaps of the first URL
    pub discover_competitors: bool,
    pub analysis_type: AnalysisType,
    pub location: Option<String>,
    /// Report directory override
    pub output: Option<PathBuf>,
    pub ai: AiOverrides,
    pub quiet: bool,
}

pub fn run(options: AuditOptions) -> Result<()> {
    let out = Output::quiet(options.quiet);

    if options.analysis_type == AnalysisType::Local && options.location.is_none() {
        return Err(SeoError::Config(
            "A local audit needs --location".to_string(),
        ));
    }

    let urls = read_url_list(&options.urls_file)?;
    let ctx = CommandContext::load(&options.ai)?;

    let mut output_config = ctx.config.output.clone();
    if let Some(dir) = &options.output {
        output_config.directory = dir.clone();
    }
    let store = ReportStore::from_config(&output_config);

    out.header("SEO Audit");
    out.field("URLs", urls.len());
    out.field("Backend", ctx.client.target().backend);
    out.field("Type", options.analysis_type);

    let run = AnalysisRun::new(ctx.client.clone(), &ctx.config);
    let observer = ConsoleObserver::new(options.quiet);
    let rt = Runtime::new()?;

    let report = rt.block_on(async {
        let mut competitors = options.competitors.clone();
        if options.discover_competitors {
            match run.service().discover_competitors(&urls[0]).await {
                Ok(found) => {
                    out.info(&format!("Discovered {} competitor sitemap(s)", found.len()));
                    competitors.extend(found);
                }
                Err(e) => warn!("Competitor discovery failed: {}", e),
            }
        }

        let report = run
            .execute(
                AnalysisRequest {
                    urls,
                    competitor_urls: competitors,
                    analysis_type: options.analysis_type,
                    location: options.location.clone(),
                },
                &observer,
            )
            .await?;
        let path = store.save(&report).await?;
        Ok::<_, SeoError>((report, path))
    });
    let (report, path) = report?;

    print_summary(&out, &report, &observer);
    out.success(&format!("Report saved to {}", path.display()));
    Ok(())
}

fn print_summary(out: &Output, report: &AnalysisReport, observer: &ConsoleObserver) {
    out.header("Summary");
    out.field("Report", report.id);
    out.field("Pages", report.urls.len());
    out.field("Page actions", report.analysis.page_actions.len());
    out.field("Keywords", report.analysis.keywords.len());
    out.field("Sources", report.sources.len());
    out.field("Plan days", report.action_plan.len());
    out.field("Plan actions", count_actions(&report.action_plan));
    out.field("Elapsed", observer.elapsed());

    if report.failed_batches > 0 {
        out.warning(&format!(
            "{} page batch(es) failed; the report covers the remaining pages.",
            report.failed_batches
        ));
    }
    if report.executive_summary.is_none() {
        out.warning("The executive summary could not be generated.");
    }
}
