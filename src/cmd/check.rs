use crate::reports;
use clap::Args;
use sslc::api::{self, LayoutReport};
use sslc::config::Config;
use sslc::error::{SslcError, SslcResult};
use sslc::optimizer::ProgressCallback;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Exit status when `--fail-on-optimizable` finds a struct that could be smaller.
pub const EXIT_OPTIMIZABLE: i32 = 2;

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Solidity files to analyze; glob patterns are expanded
    #[arg(short = 'f', long = "file", value_name = "PATH", num_args = 1.., required = true)]
    pub files: Vec<String>,

    #[command(flatten)]
    pub config: Config,

    /// Write the annotated layout to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_text: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    pub output_json: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    pub output_csv: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub fail_on_optimizable: bool,
}

struct CliLogger;
impl ProgressCallback for CliLogger {
    fn on_progress(&self, evaluated: u64, best: u32) -> bool {
        info!("   ... {:>12} orderings evaluated | best: {} slots", evaluated, best);
        true
    }
}

pub fn run(args: CheckArgs, config: &Config) -> SslcResult<i32> {
    let paths = api::expand_inputs(&args.files)?;
    if paths.is_empty() {
        return Err(SslcError::Config("no input files to analyze".to_string()));
    }

    info!(
        "🔎 Checking {} file(s), search timeout {}s per struct",
        paths.len(),
        config.search.timeout
    );
    let analyses = api::analyze_files(&paths, config, &CliLogger)?;

    let text = reports::render_text(&analyses);
    match &args.output_text {
        Some(path) => {
            fs::write(path, &text)?;
            info!("📝 Layout report written to {}", path.display());
        }
        None => print!("{}", text),
    }

    let layout_reports: Vec<LayoutReport> = analyses
        .iter()
        .flat_map(|file| file.structs.iter().map(|s| s.report.clone()))
        .collect();

    reports::print_summary_table(&layout_reports);

    if let Some(path) = &args.output_json {
        reports::write_json(path, &layout_reports)?;
        info!("📝 JSON report written to {}", path.display());
    }
    if let Some(path) = &args.output_csv {
        reports::write_csv(path, &layout_reports)?;
        info!("📝 CSV report written to {}", path.display());
    }

    let optimizable = layout_reports
        .iter()
        .filter(|r| r.can_be_optimized())
        .count();
    info!(
        "🏁 {} struct(s) analyzed, {} can be packed tighter",
        layout_reports.len(),
        optimizable
    );

    if args.fail_on_optimizable && optimizable > 0 {
        Ok(EXIT_OPTIMIZABLE)
    } else {
        Ok(0)
    }
}
