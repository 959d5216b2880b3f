//! Export command implementation

use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cli::error::CliError;
use crate::cli::output::format_export;
use crate::config::AnomalyzeConfig;
use crate::export::{ChartRegion, ReportExporter, period_regions};
use crate::models::ReportPeriod;
use crate::storage::FileSystemStorageBackend;

/// Options for the export command
#[derive(Debug, Clone)]
pub struct ExportArgs {
    pub period: ReportPeriod,
    pub single: bool,
    pub seed: Option<u64>,
}

/// Render the period's charts from mock series and write the PDF into `out_dir`
pub async fn handle_export(
    config: &AnomalyzeConfig,
    args: &ExportArgs,
    out_dir: &Path,
) -> Result<(), CliError> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let regions = period_regions(args.period, &mut rng);
    let regions: Vec<&dyn ChartRegion> = regions.iter().map(|r| r.as_ref()).collect();

    let storage = Arc::new(FileSystemStorageBackend::new(out_dir));
    let exporter = ReportExporter::new(config.export.clone())?.with_storage(storage);
    let filename = args.period.filename();
    let title = args.period.title();

    let result = if args.single {
        let region = regions
            .first()
            .ok_or_else(|| CliError::ExportFailed("No charts found to export".to_string()))?;
        exporter
            .export_single(*region, Some(&filename), Some(&title))
            .await
    } else {
        exporter
            .export_multiple(&regions, Some(&filename), Some(&title))
            .await
    };

    let result =
        result.ok_or_else(|| CliError::ExportFailed("Failed to generate PDF report".to_string()))?;
    print!(
        "{}",
        format_export(&result, &out_dir.join(&result.filename).display().to_string())
    );
    Ok(())
}
