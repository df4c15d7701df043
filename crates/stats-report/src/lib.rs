//! Report layer for chat-stats.
//!
//! Turns an [`AnalysisResult`] into files under one output directory:
//! the totals CSV and text table, the monthly pivot CSV, and the two
//! PNG charts.

pub mod charts;
pub mod csv_export;
pub mod error;
pub mod text_table;

use std::io::Write;
use std::path::{Path, PathBuf};

use stats_core::models::Metric;
use stats_core::settings::Settings;
use stats_data::analysis::AnalysisResult;
use tracing::{debug, info};

pub use charts::ChartOptions;
pub use error::{ReportError, Result};

pub const TOTALS_CSV: &str = "all_friends_total.csv";
pub const TOTALS_TXT: &str = "all_friends_total.txt";
pub const MONTHLY_CSV: &str = "selected_friends_monthly.csv";
pub const STACKED_PNG: &str = "stacked.png";
pub const LINES_PNG: &str = "lines.png";

/// Where and what to write.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub outdir: PathBuf,
    pub metric: Metric,
    /// `None` skips chart rendering.
    pub charts: Option<ChartOptions>,
}

impl ReportOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let charts = (!settings.no_charts).then_some(ChartOptions {
            width: settings.chart_width,
            height: settings.chart_height,
        });
        Self {
            outdir: settings.outdir.clone(),
            metric: settings.metric,
            charts,
        }
    }
}

/// Paths of every file written by [`write_reports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub totals_csv: PathBuf,
    pub totals_txt: PathBuf,
    pub monthly_csv: PathBuf,
    pub stacked_png: Option<PathBuf>,
    pub lines_png: Option<PathBuf>,
}

/// Create the output directory and any missing parents.
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| ReportError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Write every report for `result` into `options.outdir`.
pub fn write_reports(result: &AnalysisResult, options: &ReportOptions) -> Result<ReportPaths> {
    ensure_output_dir(&options.outdir)?;
    let outdir = options.outdir.as_path();

    let totals_csv = outdir.join(TOTALS_CSV);
    csv_export::write_totals_csv(csv_export::create_file(&totals_csv)?, &result.totals)?;
    debug!("Wrote {}", totals_csv.display());

    let totals_txt = outdir.join(TOTALS_TXT);
    let mut file = csv_export::create_file(&totals_txt)?;
    file.write_all(text_table::render_totals(&result.totals).as_bytes())
        .map_err(|source| ReportError::Write {
            path: totals_txt.clone(),
            source,
        })?;
    debug!("Wrote {}", totals_txt.display());

    let pivot = result.monthly.pivot(options.metric);
    let monthly_csv = outdir.join(MONTHLY_CSV);
    csv_export::write_monthly_csv(csv_export::create_file(&monthly_csv)?, &pivot)?;
    debug!("Wrote {}", monthly_csv.display());

    let (stacked_png, lines_png) = match &options.charts {
        Some(chart_options) => {
            let stacked = outdir.join(STACKED_PNG);
            charts::render_stacked(&stacked, &pivot, chart_options)?;
            let lines = outdir.join(LINES_PNG);
            charts::render_lines(&lines, &pivot, chart_options)?;
            debug!("Rendered {} and {}", stacked.display(), lines.display());
            (Some(stacked), Some(lines))
        }
        None => (None, None),
    };

    info!(
        "Reports written to {} ({} contacts, {} months)",
        outdir.display(),
        result.totals.rows.len(),
        pivot.months.len()
    );

    Ok(ReportPaths {
        totals_csv,
        totals_txt,
        monthly_csv,
        stacked_png,
        lines_png,
    })
}
