//! `keywords` command handlers.

use std::path::{Path, PathBuf};

use clap::Subcommand;

/// Sub-commands available under `keywords`.
#[derive(Debug, Subcommand)]
pub enum KeywordsCommands {
    /// Clean raw destination names into a keyword mapping CSV
    Normalize {
        /// Raw tourism CSV with a `name` column (and optional `province`)
        #[arg(long)]
        input: PathBuf,
        /// Field delimiter of the input CSV
        #[arg(long, default_value_t = ';')]
        delimiter: char,
        /// Mapping CSV to write
        #[arg(long, default_value = "keyword_mapping.csv")]
        output: PathBuf,
    },
}

pub(crate) fn run(command: KeywordsCommands) -> anyhow::Result<()> {
    match command {
        KeywordsCommands::Normalize {
            input,
            delimiter,
            output,
        } => run_keywords_normalize(&input, delimiter, &output),
    }
}

/// Converts a `--delimiter` character into the single byte the CSV reader needs.
///
/// # Errors
///
/// Returns an error for non-ASCII delimiters.
pub(crate) fn delimiter_byte(delimiter: char) -> anyhow::Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| anyhow::anyhow!("delimiter must be a single ASCII character, got {delimiter:?}"))
}

/// Normalizes `input` into the keyword mapping at `output` and prints the report.
///
/// # Errors
///
/// Returns an error if the input cannot be read, lacks a `name` column, or
/// the mapping cannot be written.
pub(crate) fn run_keywords_normalize(
    input: &Path,
    delimiter: char,
    output: &Path,
) -> anyhow::Result<()> {
    let report = vntour_core::normalize_keywords(input, delimiter_byte(delimiter)?, output)?;
    println!(
        "normalized {} rows -> {} keywords ({} skipped, {} collision groups, {} duplicates removed)",
        report.rows_read, report.written, report.skipped, report.collision_groups, report.duplicates_removed
    );
    println!("mapping written to {}", output.display());
    Ok(())
}
