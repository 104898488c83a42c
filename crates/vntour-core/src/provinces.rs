//! Province reference table and free-text province detection.
//!
//! The built-in table lists the 34 provincial-level units in force since the
//! July 2025 merger, each with aliases covering common spellings, hashtags,
//! and the former provinces and landmarks now inside it.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::text::fold_accents;
use crate::CoreError;

/// Label written for videos whose text matched no registered alias.
pub const UNMATCHED: &str = "unmatched";

/// `(name, region, aliases)` for the built-in table; ids follow row order.
const BUILTIN: &[(&str, &str, &[&str])] = &[
    ("Hà Nội", "Miền Bắc", &["Hanoi", "HN", "Thủ đô Hà Nội"]),
    ("Hải Phòng", "Miền Bắc", &["Haiphong", "Hải Dương"]),
    ("Quảng Ninh", "Miền Bắc", &["Hạ Long", "Halong", "Vịnh Hạ Long"]),
    ("Cao Bằng", "Miền Bắc", &["Bản Giốc"]),
    ("Lạng Sơn", "Miền Bắc", &[]),
    ("Lai Châu", "Miền Bắc", &[]),
    ("Điện Biên", "Miền Bắc", &["Điện Biên Phủ"]),
    ("Sơn La", "Miền Bắc", &["Mộc Châu"]),
    ("Tuyên Quang", "Miền Bắc", &["Hà Giang"]),
    ("Lào Cai", "Miền Bắc", &["Sa Pa", "Sapa", "Yên Bái"]),
    ("Thái Nguyên", "Miền Bắc", &["Bắc Kạn"]),
    ("Phú Thọ", "Miền Bắc", &["Vĩnh Phúc", "Hòa Bình"]),
    ("Bắc Ninh", "Miền Bắc", &["Bắc Giang"]),
    ("Hưng Yên", "Miền Bắc", &["Thái Bình"]),
    ("Ninh Bình", "Miền Bắc", &["Tràng An", "Hà Nam", "Nam Định"]),
    ("Thanh Hóa", "Miền Trung", &["Sầm Sơn"]),
    ("Nghệ An", "Miền Trung", &["Vinh"]),
    ("Hà Tĩnh", "Miền Trung", &[]),
    ("Quảng Trị", "Miền Trung", &["Quảng Bình", "Phong Nha"]),
    ("Huế", "Miền Trung", &["Thừa Thiên Huế", "Cố đô Huế"]),
    ("Đà Nẵng", "Miền Trung", &["Danang", "Quảng Nam", "Hội An"]),
    ("Quảng Ngãi", "Miền Trung", &["Kon Tum", "Lý Sơn"]),
    ("Gia Lai", "Miền Trung", &["Bình Định", "Quy Nhơn"]),
    ("Đắk Lắk", "Miền Trung", &["Daklak", "Buôn Ma Thuột", "Phú Yên"]),
    ("Khánh Hòa", "Miền Trung", &["Nha Trang", "Ninh Thuận"]),
    ("Lâm Đồng", "Miền Trung", &["Đà Lạt", "Dalat", "Bình Thuận", "Mũi Né", "Đắk Nông"]),
    (
        "Hồ Chí Minh",
        "Miền Nam",
        &[
            "TP Hồ Chí Minh",
            "Thành phố Hồ Chí Minh",
            "TP.HCM",
            "TPHCM",
            "HCM",
            "Sài Gòn",
            "Saigon",
            "SG",
            "Vũng Tàu",
            "Bà Rịa - Vũng Tàu",
            "Bình Dương",
        ],
    ),
    ("Đồng Nai", "Miền Nam", &["Bình Phước"]),
    ("Tây Ninh", "Miền Nam", &["Long An"]),
    ("Cần Thơ", "Miền Nam", &["Sóc Trăng", "Hậu Giang"]),
    ("Vĩnh Long", "Miền Nam", &["Bến Tre", "Trà Vinh"]),
    ("Đồng Tháp", "Miền Nam", &["Tiền Giang"]),
    ("An Giang", "Miền Nam", &["Phú Quốc", "Kiên Giang"]),
    ("Cà Mau", "Miền Nam", &["Bạc Liêu"]),
];

/// One provincial-level administrative unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvinceRecord {
    pub id: String,
    pub name: String,
    pub region: String,
    pub aliases: Vec<String>,
}

impl ProvinceRecord {
    #[must_use]
    pub fn new(id: &str, name: &str, region: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            region: region.to_string(),
            aliases: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| (*a).to_string()));
        self
    }

    /// Hashtag form of the name: folded, spaces removed (`"Đắk Nông"` -> `"daknong"`).
    #[must_use]
    pub fn hashtag(&self) -> String {
        fold_accents(&self.name).replace(' ', "")
    }

    /// The built-in 34-unit table.
    #[must_use]
    pub fn builtin() -> Vec<ProvinceRecord> {
        BUILTIN
            .iter()
            .enumerate()
            .map(|(idx, (name, region, aliases))| {
                ProvinceRecord::new(&(idx + 1).to_string(), name, region).with_aliases(aliases)
            })
            .collect()
    }

    /// Loads `id,name,region` rows from a header-less CSV.
    ///
    /// Rows with fewer than three fields are skipped, as is a leading header
    /// row. Built-in aliases are attached to any province whose folded name
    /// matches a built-in entry.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Csv`] if the file cannot be read.
    /// - [`CoreError::InvalidProvinceTable`] if no usable rows are found.
    pub fn load_csv(path: &Path) -> Result<Vec<ProvinceRecord>, CoreError> {
        let display = path.display().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| CoreError::Csv {
                path: display.clone(),
                source: e,
            })?;

        let builtin_aliases: HashMap<String, &[&str]> = BUILTIN
            .iter()
            .map(|(name, _, aliases)| (fold_accents(name), *aliases))
            .collect();

        let mut records = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(row = row + 1, error = %e, "skipping unreadable province row");
                    continue;
                }
            };
            if record.len() < 3 {
                continue;
            }
            let id = record[0].trim_start_matches('\u{feff}').trim();
            let name = record[1].trim();
            let region = record[2].trim();
            if name.is_empty() || (row == 0 && is_header_cell(name)) {
                continue;
            }
            let mut province = ProvinceRecord::new(id, name, region);
            if let Some(aliases) = builtin_aliases.get(&fold_accents(name)) {
                province = province.with_aliases(aliases);
            }
            records.push(province);
        }

        if records.is_empty() {
            return Err(CoreError::InvalidProvinceTable {
                path: display,
                reason: "no rows with id,name,region".to_string(),
            });
        }
        Ok(records)
    }
}

fn is_header_cell(cell: &str) -> bool {
    matches!(
        cell.to_lowercase().as_str(),
        "name" | "province" | "tinh" | "tỉnh"
    )
}

/// The result of a successful province detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvinceMatch {
    pub province: String,
    pub region: String,
}

/// Detects which province a piece of free text refers to.
///
/// Every province contributes its folded name, the name with spaces removed
/// (hashtag form), and its folded aliases. Matching is on whole words of the
/// folded text; the earliest match wins and ties go to the longer alias.
#[derive(Debug, Clone)]
pub struct ProvinceMatcher {
    provinces: Vec<ProvinceRecord>,
    /// `(folded alias, index into provinces)`, longest alias first.
    aliases: Vec<(String, usize)>,
}

impl ProvinceMatcher {
    #[must_use]
    pub fn new(provinces: Vec<ProvinceRecord>) -> Self {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (idx, province) in provinces.iter().enumerate() {
            let folded_name = fold_accents(&province.name);
            let candidates = std::iter::once(folded_name.clone())
                .chain(std::iter::once(folded_name.replace(' ', "")))
                .chain(province.aliases.iter().map(|a| fold_accents(a)));
            for alias in candidates {
                if alias.is_empty() {
                    continue;
                }
                // First registration wins so a later alias cannot steal a
                // province's own name.
                seen.entry(alias).or_insert(idx);
            }
        }

        let mut aliases: Vec<(String, usize)> = seen.into_iter().collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { provinces, aliases }
    }

    /// Matcher over the built-in table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(ProvinceRecord::builtin())
    }

    #[must_use]
    pub fn provinces(&self) -> &[ProvinceRecord] {
        &self.provinces
    }

    /// Returns the province referenced earliest in `text`, if any.
    #[must_use]
    pub fn detect(&self, text: &str) -> Option<&ProvinceRecord> {
        let folded = fold_accents(text);
        if folded.is_empty() {
            return None;
        }
        let haystack = format!(" {folded} ");

        let mut best: Option<(usize, usize, usize)> = None;
        for (alias, idx) in &self.aliases {
            let needle = format!(" {alias} ");
            if let Some(pos) = haystack.find(&needle) {
                let better = match best {
                    None => true,
                    Some((best_pos, best_len, _)) => {
                        pos < best_pos || (pos == best_pos && alias.len() > best_len)
                    }
                };
                if better {
                    best = Some((pos, alias.len(), *idx));
                }
            }
        }
        best.map(|(_, _, idx)| &self.provinces[idx])
    }

    /// Like [`detect`](Self::detect) but returns an owned name/region pair.
    #[must_use]
    pub fn detect_match(&self, text: &str) -> Option<ProvinceMatch> {
        self.detect(text).map(|p| ProvinceMatch {
            province: p.name.clone(),
            region: p.region.clone(),
        })
    }

    /// Province name for `text`, or [`UNMATCHED`].
    #[must_use]
    pub fn label(&self, text: &str) -> String {
        self.detect(text)
            .map_or_else(|| UNMATCHED.to_string(), |p| p.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_has_34_units_with_unique_ids() {
        let table = ProvinceRecord::builtin();
        assert_eq!(table.len(), 34);
        let mut ids: Vec<&str> = table.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 34);
    }

    #[test]
    fn sai_gon_alias_maps_to_ho_chi_minh() {
        let matcher = ProvinceMatcher::builtin();
        let label = matcher.label("Ăn gì ở Sài Gòn cuối tuần này?");
        assert_eq!(label, "Hồ Chí Minh");
    }

    #[test]
    fn unregistered_alias_is_unmatched() {
        let table = vec![ProvinceRecord::new("1", "Hồ Chí Minh", "Miền Nam")];
        let matcher = ProvinceMatcher::new(table);
        assert_eq!(matcher.label("Một ngày ở Sài Gòn"), UNMATCHED);
        assert_eq!(matcher.label("Du lịch Hồ Chí Minh"), "Hồ Chí Minh");
    }

    #[test]
    fn matches_folded_name_and_hashtag_form() {
        let matcher = ProvinceMatcher::builtin();
        assert_eq!(matcher.label("#danang #travel"), "Đà Nẵng");
        assert_eq!(matcher.label("review HA NOI mùa thu"), "Hà Nội");
        assert_eq!(matcher.label("#hanoi"), "Hà Nội");
    }

    #[test]
    fn requires_whole_word_matches() {
        let matcher = ProvinceMatcher::builtin();
        // "hnx" and "sgk" must not hit the "hn" and "sg" aliases.
        assert_eq!(matcher.label("hnx sgk vinhomes"), UNMATCHED);
    }

    #[test]
    fn earliest_mention_wins() {
        let matcher = ProvinceMatcher::builtin();
        assert_eq!(matcher.label("Từ Đà Lạt về Nha Trang"), "Lâm Đồng");
        assert_eq!(matcher.label("Từ Nha Trang lên Đà Lạt"), "Khánh Hòa");
    }

    #[test]
    fn empty_text_is_unmatched() {
        let matcher = ProvinceMatcher::builtin();
        assert!(matcher.detect("").is_none());
        assert!(matcher.detect("!!! ...").is_none());
    }

    #[test]
    fn detect_match_carries_region() {
        let matcher = ProvinceMatcher::builtin();
        let m = matcher.detect_match("Phố cổ Hội An về đêm").unwrap();
        assert_eq!(m.province, "Đà Nẵng");
        assert_eq!(m.region, "Miền Trung");
    }

    #[test]
    fn hashtag_form_drops_spaces_and_accents() {
        let p = ProvinceRecord::new("1", "Đắk Nông", "Miền Trung");
        assert_eq!(p.hashtag(), "daknong");
    }

    #[test]
    fn load_csv_skips_header_and_short_rows() {
        let dir = std::env::temp_dir().join(format!("vntour-provinces-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("provinces.csv");
        std::fs::write(
            &path,
            "id,name,region\n1,Hà Nội,Miền Bắc\nbroken\n2,Hồ Chí Minh,Miền Nam\n",
        )
        .unwrap();

        let table = ProvinceRecord::load_csv(&path).expect("table should load");
        assert_eq!(table.len(), 2);
        assert_eq!(table[1].name, "Hồ Chí Minh");
        assert!(table[1].aliases.iter().any(|a| a == "Sài Gòn"));
    }

    #[test]
    fn load_csv_rejects_empty_table() {
        let dir = std::env::temp_dir().join(format!("vntour-provinces-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.csv");
        std::fs::write(&path, "id,name,region\n").unwrap();
        let err = ProvinceRecord::load_csv(&path).unwrap_err();
        assert!(matches!(err, CoreError::InvalidProvinceTable { .. }));
    }
}
