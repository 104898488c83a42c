//! Tourism keyword normalizer.
//!
//! Turns raw destination names ("Khu du lịch sinh thái Tràng An (Ninh Bình)")
//! into short search keywords ("Tràng An") and writes the
//! `original_name -> normalized_name` mapping consumed by the trends fetcher.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::{collapse_whitespace, fold_accents, trim_trailing_punctuation};
use crate::CoreError;

/// Administrative prefixes stripped from destination names, longest first.
/// Only the first match is removed.
const PREFIXES: &[&str] = &[
    "Khu di tích lịch sử và Danh thắng",
    "Di tích lịch sử quốc gia đặc biệt",
    "Khu di tích lịch sử - Văn hóa",
    "Khu du lịch và vườn Quốc gia",
    "Điểm du lịch Di tích Lịch sử",
    "Di tích lịch sử - văn hóa",
    "Du lịch Suối khoáng nóng",
    "Khu bảo tồn thiên nhiên",
    "Khu du lịch sinh thái",
    "Khu du lich sinh thái",
    "Khu vui chơi giải trí",
    "Làng nghề truyền thống",
    "Quần thể khu di tích",
    "Cụm di tích lịch sử",
    "Trung tâm thương mại",
    "Trung tâm văn hóa",
    "Di tích lịch sử",
    "Khu nghỉ dưỡng",
    "Khu trung tâm",
    "Vườn Quốc gia",
    "Khu sinh thái",
    "Khu lưu niệm",
    "Điểm du lịch",
    "Khu du lịch",
    "Khu di tích",
    "Cụm di tích",
    "Trung tâm",
    "Quán Café",
    "Quần thể",
    "Di tích",
];

static PREFIX_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PREFIXES
        .iter()
        .map(|prefix| {
            let words: Vec<String> = prefix.split_whitespace().map(regex::escape).collect();
            Regex::new(&format!(r"(?i)^{}\s+", words.join(r"\s+"))).expect("valid prefix regex")
        })
        .collect()
});

static DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*-\s*").expect("valid dash regex"));

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthesis regex"));

/// One row of the keyword mapping CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMappingEntry {
    /// 1-based data row number in the source CSV.
    pub row_index: usize,
    pub original_name: String,
    pub normalized_name: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub removed_prefix: String,
}

/// Counters produced by a normalizer run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rows_read: usize,
    /// Rows skipped because the name was empty or the record was unreadable.
    pub skipped: usize,
    /// Number of normalized names shared by more than one source row.
    pub collision_groups: usize,
    /// Rows dropped because an identical name + province was already kept.
    pub duplicates_removed: usize,
    pub written: usize,
}

/// Normalizes a single destination name.
///
/// Returns the cleaned name and the prefix that was stripped, if any.
#[must_use]
pub fn normalize_name(name: &str) -> (String, Option<String>) {
    let mut s = name.trim().to_string();
    let mut removed = None;

    for pattern in PREFIX_PATTERNS.iter() {
        if let Some(m) = pattern.find(&s) {
            removed = Some(m.as_str().trim_end().to_string());
            s = s[m.end()..].trim().to_string();
            break;
        }
    }

    let s = DASH.replace_all(&s, " - ");
    let s = PARENTHESIZED.replace_all(&s, "");
    let s = trim_trailing_punctuation(s.trim());
    (collapse_whitespace(s), removed)
}

/// Builds the deduplicated mapping from `(row_index, name, province)` rows.
///
/// Names that collapse to the same normalized keyword (compared accent-folded)
/// get their province appended so each stays a distinct search term; rows that
/// are still identical on name and province afterwards are dropped.
#[must_use]
pub fn build_mapping(rows: &[(usize, String, String)]) -> (Vec<KeywordMappingEntry>, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<KeywordMappingEntry>> = HashMap::new();

    for (row_index, name, province) in rows {
        report.rows_read += 1;
        let original_name = name.trim();
        if original_name.is_empty() {
            report.skipped += 1;
            continue;
        }
        let (normalized_name, removed) = normalize_name(original_name);
        if normalized_name.is_empty() {
            report.skipped += 1;
            continue;
        }
        let key = fold_accents(&normalized_name);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(KeywordMappingEntry {
            row_index: *row_index,
            original_name: original_name.to_string(),
            normalized_name,
            province: province.trim().to_string(),
            removed_prefix: removed.unwrap_or_default(),
        });
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut entries = Vec::new();
    for key in order {
        let Some(group) = groups.remove(&key) else {
            continue;
        };
        let collides = group.len() > 1;
        if collides {
            report.collision_groups += 1;
        }
        for mut entry in group {
            if collides && !entry.province.is_empty() {
                entry.normalized_name = format!("{} {}", entry.normalized_name, entry.province);
            }
            let dedup_key = (
                fold_accents(&entry.normalized_name),
                fold_accents(&entry.province),
            );
            if seen.insert(dedup_key) {
                if collides {
                    tracing::debug!(
                        original = %entry.original_name,
                        normalized = %entry.normalized_name,
                        "kept colliding keyword"
                    );
                }
                entries.push(entry);
            } else {
                tracing::debug!(original = %entry.original_name, "removed duplicate keyword");
                report.duplicates_removed += 1;
            }
        }
    }

    report.written = entries.len();
    (entries, report)
}

/// Reads `input`, normalizes every `name`, and writes the mapping CSV to `output`.
///
/// # Errors
///
/// - [`CoreError::Io`] / [`CoreError::Csv`] if either file cannot be opened or written.
/// - [`CoreError::MissingColumn`] if the input has no `name` column.
pub fn normalize_keywords(
    input: &Path,
    delimiter: u8,
    output: &Path,
) -> Result<NormalizeReport, CoreError> {
    let path = input.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(input)
        .map_err(|e| csv_error(&path, e))?;

    let headers = reader.headers().map_err(|e| csv_error(&path, e))?.clone();
    let name_idx = column_index(&headers, "name").ok_or_else(|| CoreError::MissingColumn {
        path: path.clone(),
        column: "name".to_string(),
    })?;
    let province_idx = column_index(&headers, "province");

    let mut rows = Vec::new();
    let mut unreadable = 0usize;
    for (idx, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                let name = record.get(name_idx).unwrap_or_default().to_string();
                let province = province_idx
                    .and_then(|i| record.get(i))
                    .unwrap_or_default()
                    .to_string();
                rows.push((idx + 1, name, province));
            }
            Err(e) => {
                tracing::warn!(row = idx + 1, error = %e, "skipping unreadable row");
                unreadable += 1;
            }
        }
    }

    let (entries, mut report) = build_mapping(&rows);
    report.rows_read += unreadable;
    report.skipped += unreadable;

    if report.collision_groups > 0 {
        tracing::warn!(
            collision_groups = report.collision_groups,
            duplicates_removed = report.duplicates_removed,
            written = report.written,
            rows_read = report.rows_read,
            "resolved colliding keywords by appending province"
        );
    }

    write_mapping(output, &entries)?;
    tracing::info!(
        output = %output.display(),
        written = report.written,
        skipped = report.skipped,
        "saved keyword mapping"
    );
    Ok(report)
}

/// Writes mapping entries with a header row.
///
/// # Errors
///
/// Returns [`CoreError::Csv`] if the file cannot be created or written.
pub fn write_mapping(output: &Path, entries: &[KeywordMappingEntry]) -> Result<(), CoreError> {
    let path = output.display().to_string();
    let mut writer = csv::Writer::from_path(output).map_err(|e| csv_error(&path, e))?;
    for entry in entries {
        writer.serialize(entry).map_err(|e| csv_error(&path, e))?;
    }
    writer.flush().map_err(|e| CoreError::Io { path, source: e })
}

/// Reads a mapping CSV written by [`write_mapping`].
///
/// # Errors
///
/// Returns [`CoreError::Csv`] if the file cannot be opened or a row does not parse.
pub fn read_mapping(input: &Path) -> Result<Vec<KeywordMappingEntry>, CoreError> {
    let path = input.display().to_string();
    let mut reader = csv::Reader::from_path(input).map_err(|e| csv_error(&path, e))?;
    strip_bom_from_headers(&mut reader).map_err(|e| csv_error(&path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<KeywordMappingEntry>, _>>()
        .map_err(|e| csv_error(&path, e))
}

/// Reads the first present column out of `candidates`, dropping blank cells.
///
/// # Errors
///
/// - [`CoreError::Csv`] if the file cannot be opened.
/// - [`CoreError::MissingColumn`] if none of the candidate columns exist.
pub fn read_keyword_column(
    input: &Path,
    delimiter: u8,
    candidates: &[&str],
) -> Result<Vec<String>, CoreError> {
    let path = input.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(input)
        .map_err(|e| csv_error(&path, e))?;
    let headers = reader.headers().map_err(|e| csv_error(&path, e))?.clone();

    let idx = candidates
        .iter()
        .find_map(|c| column_index(&headers, c))
        .ok_or_else(|| CoreError::MissingColumn {
            path: path.clone(),
            column: candidates.join("|"),
        })?;

    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                if let Some(value) = record.get(idx).map(str::trim).filter(|v| !v.is_empty()) {
                    values.push(value.to_string());
                }
            }
            Err(e) => tracing::warn!(row = row + 1, error = %e, "skipping unreadable row"),
        }
    }
    Ok(values)
}

fn column_index(headers: &csv::StringRecord, column: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
}

fn strip_bom_from_headers<R: std::io::Read>(reader: &mut csv::Reader<R>) -> csv::Result<()> {
    let headers = reader.headers()?.clone();
    let cleaned: csv::StringRecord = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect();
    reader.set_headers(cleaned);
    Ok(())
}

fn csv_error(path: &str, source: csv::Error) -> CoreError {
    CoreError::Csv {
        path: path.to_string(),
        source,
    }
}

#[cfg(test)]
#[path = "keywords_test.rs"]
mod tests;
