mod bootstrap;

use anyhow::{Context, Result};
use stats_core::settings::Settings;
use stats_data::analysis::{analyze, AnalysisRequest};
use stats_report::text_table::render_monthly;
use stats_report::{write_reports, ReportOptions};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("chat-stats v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Owner: {}, Friends: {}, Metric: {}, Timezone: {}",
        settings.name,
        settings.friends.join(", "),
        settings.metric,
        settings.timezone
    );

    let request = AnalysisRequest::from_settings(&settings)?;
    let result = analyze(&request)
        .with_context(|| format!("Failed to analyse {}", request.source.path().display()))?;

    let contacts: Vec<&str> = result.totals.counterparties().collect();
    tracing::info!("Found {} contacts: {}", contacts.len(), contacts.join(", "));

    let options = ReportOptions::from_settings(&settings);
    let pivot = result.monthly.pivot(options.metric);
    if pivot.is_empty() {
        tracing::warn!("No messages matched the selected friends");
    }
    print!("{}", render_monthly(&pivot));

    let paths = write_reports(&result, &options)
        .with_context(|| format!("Failed to write reports to {}", options.outdir.display()))?;

    tracing::info!("Totals: {}", paths.totals_csv.display());
    tracing::info!("Monthly: {}", paths.monthly_csv.display());
    if let (Some(stacked), Some(lines)) = (&paths.stacked_png, &paths.lines_png) {
        tracing::info!("Charts: {}, {}", stacked.display(), lines.display());
    }

    Ok(())
}
