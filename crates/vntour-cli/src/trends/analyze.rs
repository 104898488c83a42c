use vntour_core::AppConfig;
use vntour_trends::{analyze, find_duplicate_keywords, render_summary, AnalyzeOptions};

use super::AnalyzeArgs;

/// Analyzes the raw directory, writes the monthly and summary CSVs, and
/// prints the ranking.
///
/// # Errors
///
/// Returns an error if there are no raw files or an output cannot be written.
/// An unreadable `--keywords-file` only produces a warning.
pub(crate) fn run_trends_analyze(config: &AppConfig, args: &AnalyzeArgs) -> anyhow::Result<()> {
    if let Some(path) = &args.keywords_file {
        match vntour_core::read_mapping(path) {
            Ok(entries) => {
                let duplicates = find_duplicate_keywords(&entries);
                if !duplicates.is_empty() {
                    let merged: usize = duplicates.iter().map(|d| d.originals.len() - 1).sum();
                    println!(
                        "warning: {} keywords merge {} destinations after sanitization",
                        duplicates.len(),
                        merged
                    );
                }
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot check keyword duplicates"),
        }
    }

    let anchor = args.anchor.trim();
    let options = AnalyzeOptions {
        raw_dir: args.raw_dir.clone(),
        anchor: (!anchor.is_empty()).then(|| anchor.to_owned()),
        normalize: args.normalize,
        reference: args.reference.unwrap_or(config.trends_reference),
    };
    let analysis = analyze(&options)?;

    analysis.write_monthly(&args.monthly_output)?;
    analysis.write_summary(&args.summary_output)?;
    if let Some(rows_output) = &args.rows_output {
        analysis.write_rows(rows_output)?;
    }

    print!("{}", render_summary(&analysis, args.top));
    println!();
    println!(
        "analyzed {} files, {} destinations (scale: {})",
        analysis.files_loaded,
        analysis.stats.len(),
        analysis.scale
    );
    println!("monthly trends: {}", args.monthly_output.display());
    println!("summary stats:  {}", args.summary_output.display());
    if let Some(rows_output) = &args.rows_output {
        println!("rows:           {}", rows_output.display());
    }
    Ok(())
}
