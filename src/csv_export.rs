//! CSV serialization for lead and search-history exports.
//!
//! Quoting is deliberately simple: every text cell is wrapped in double
//! quotes, numeric and flag cells are written bare, and embedded quotes are
//! not escaped.

use crate::errors::{AppError, ResultExt};
use crate::list_engine::ListItem;
use crate::models::{Lead, LeadTableItem, SearchResult};
use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// One extracted cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Quoted. `None` renders as `""`.
    Text(Option<String>),
    /// Bare. `None` renders as an empty cell.
    Number(Option<i64>),
    /// Bare, written as-is.
    Raw(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(Some(value.into()))
    }

    fn render(&self) -> String {
        match self {
            Cell::Text(value) => format!("\"{}\"", value.as_deref().unwrap_or("")),
            Cell::Number(Some(n)) => n.to_string(),
            Cell::Number(None) => String::new(),
            Cell::Raw(value) => value.clone(),
        }
    }
}

/// A header paired with the extractor producing its cell for each record.
pub struct Column<T> {
    pub header: &'static str,
    extract: Box<dyn Fn(&T) -> Cell + Send + Sync>,
}

impl<T> Column<T> {
    pub fn new(header: &'static str, extract: impl Fn(&T) -> Cell + Send + Sync + 'static) -> Self {
        Self {
            header,
            extract: Box::new(extract),
        }
    }
}

/// Serializes `records` with `columns`: a header line, then one line per
/// record, joined with `\n`.
pub fn serialize<T>(records: &[T], columns: &[Column<T>]) -> String {
    let header = columns
        .iter()
        .map(|c| c.header)
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(header);
    for record in records {
        let line = columns
            .iter()
            .map(|c| (c.extract)(record).render())
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }
    lines.join("\n")
}

fn yes_no(flag: bool) -> Cell {
    Cell::Raw(if flag { "Yes" } else { "No" }.to_string())
}

/// Optional trailing columns of the per-lead export.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadColumnExtras {
    pub lighthouse_score: bool,
    pub source: bool,
    pub google_search_ranking: bool,
}

impl LeadColumnExtras {
    pub fn all() -> Self {
        Self {
            lighthouse_score: true,
            source: true,
            google_search_ranking: true,
        }
    }
}

/// Per-lead export columns. Works for anything the list engine can render.
pub fn result_columns<T: ListItem + 'static>(extras: LeadColumnExtras) -> Vec<Column<T>> {
    let mut columns: Vec<Column<T>> = vec![
        Column::new("Business Name", |r: &T| Cell::text(&r.lead().business_name)),
        Column::new("Category", |r: &T| Cell::text(&r.lead().category)),
        Column::new("Phone", |r: &T| Cell::Text(r.lead().phone.clone())),
        Column::new("Email", |r: &T| Cell::Text(r.lead().email.clone())),
        Column::new("Website", |r: &T| Cell::Text(r.lead().website.clone())),
        Column::new("Address", |r: &T| Cell::text(&r.lead().address)),
        Column::new("Lead Score", |r: &T| Cell::Number(Some(r.lead().lead_score))),
        Column::new("Lead Type", |r: &T| Cell::text(r.lead().lead_type.label())),
    ];
    if extras.lighthouse_score {
        columns.push(Column::new("Lighthouse Score", |r: &T| {
            Cell::Number(r.lead().lighthouse_score.map(i64::from))
        }));
    }
    if extras.source {
        columns.push(Column::new("Source", |r: &T| {
            Cell::text(r.lead().source.label())
        }));
    }
    if extras.google_search_ranking {
        columns.push(Column::new("Google Search Ranking", |r: &T| {
            Cell::Number(r.lead().google_search_ranking.map(i64::from))
        }));
    }
    columns
}

/// Columns of a stored search's export: the base lead columns, with the
/// lead type as its wire id.
pub fn search_entry_columns() -> Vec<Column<Lead>> {
    let mut columns = result_columns::<Lead>(LeadColumnExtras::default());
    if let Some(lead_type) = columns.iter_mut().find(|c| c.header == "Lead Type") {
        *lead_type = Column::new("Lead Type", |r: &Lead| Cell::text(r.lead_type.as_str()));
    }
    columns
}

/// Columns of the all-leads export.
pub fn all_leads_columns() -> Vec<Column<LeadTableItem>> {
    vec![
        Column::new("Business Name", |r: &LeadTableItem| {
            Cell::text(&r.lead.business_name)
        }),
        Column::new("Category", |r: &LeadTableItem| Cell::text(&r.lead.category)),
        Column::new("Location", |r: &LeadTableItem| {
            Cell::Text(r.location_label())
        }),
        Column::new("Phone", |r: &LeadTableItem| Cell::Text(r.lead.phone.clone())),
        Column::new("Email", |r: &LeadTableItem| Cell::Text(r.lead.email.clone())),
        Column::new("Website", |r: &LeadTableItem| {
            Cell::Text(r.lead.website.clone())
        }),
        Column::new("Lead Score", |r: &LeadTableItem| {
            Cell::Number(Some(r.lead.lead_score))
        }),
        Column::new("Lead Type", |r: &LeadTableItem| {
            Cell::text(r.lead.lead_type.label())
        }),
        Column::new("Lighthouse Score", |r: &LeadTableItem| {
            Cell::Number(r.lead.lighthouse_score.map(i64::from))
        }),
        Column::new("In Zoho", |r: &LeadTableItem| yes_no(r.lead.is_in_zoho)),
        Column::new("Date Added", |r: &LeadTableItem| {
            Cell::Raw(r.date_added.format("%Y-%m-%d").to_string())
        }),
    ]
}

/// One row of the search-history export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub query: String,
    pub location: String,
    pub max_results: u32,
    pub search_google: bool,
    pub search_local: bool,
    pub search_maps: bool,
    pub category: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&SearchResult> for HistoryRow {
    fn from(result: &SearchResult) -> Self {
        let params = &result.search_params;
        Self {
            query: params
                .custom_search_query
                .clone()
                .filter(|q| !q.trim().is_empty())
                .unwrap_or_else(|| params.business_type.clone()),
            location: params.locations.join("; "),
            max_results: params.number_of_businesses,
            search_google: params.include_google_search,
            search_local: false,
            search_maps: true,
            category: params.business_type.clone(),
            status: "COMPLETED".to_string(),
            created_at: result.date,
        }
    }
}

/// `Jan 15, 2024, 10:30 AM`
pub fn format_created_at(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y, %I:%M %p").to_string()
}

pub fn history_columns() -> Vec<Column<HistoryRow>> {
    vec![
        Column::new("Query", |r: &HistoryRow| Cell::text(&r.query)),
        Column::new("Location", |r: &HistoryRow| Cell::text(&r.location)),
        Column::new("Max Results", |r: &HistoryRow| {
            Cell::Number(Some(i64::from(r.max_results)))
        }),
        Column::new("Search Google", |r: &HistoryRow| yes_no(r.search_google)),
        Column::new("Search Local", |r: &HistoryRow| yes_no(r.search_local)),
        Column::new("Search Maps", |r: &HistoryRow| yes_no(r.search_maps)),
        Column::new("Category", |r: &HistoryRow| Cell::text(&r.category)),
        Column::new("Status", |r: &HistoryRow| Cell::text(&r.status)),
        Column::new("Created At", |r: &HistoryRow| {
            Cell::text(format_created_at(&r.created_at))
        }),
    ]
}

/// Serializes plain leads with the full per-lead column set.
pub fn leads_to_csv(leads: &[Lead]) -> String {
    serialize(leads, &result_columns(LeadColumnExtras::all()))
}

// ============ Filenames ============

fn slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static slug regex"))
}

/// Lowercases and collapses every run of non-alphanumerics into `-`.
pub fn slugify(value: &str) -> String {
    slug_regex()
        .replace_all(&value.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

pub fn leads_filename(business_type: &str, date: NaiveDate) -> String {
    format!("leads-{}-{}.csv", slugify(business_type), date.format("%Y-%m-%d"))
}

pub fn search_filename(search_id: &str, date: NaiveDate) -> String {
    format!("search-{}-{}.csv", search_id, date.format("%Y-%m-%d"))
}

pub fn all_leads_filename(date: NaiveDate) -> String {
    format!("all-leads-{}.csv", date.format("%Y-%m-%d"))
}

pub fn history_filename(date: NaiveDate) -> String {
    format!("search-history-{}.csv", date.format("%Y-%m-%d"))
}

// ============ Delivery ============

/// A serialized CSV ready to be handed to the user as a file.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvFile {
    pub filename: String,
    pub content: String,
}

impl CsvFile {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Writes the file into `dir` through a temporary file that is renamed
    /// into place, so readers never observe a partial export.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, AppError> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating export directory {}", dir.display()))?;
        let target = dir.join(&self.filename);
        let tmp = dir.join(format!(".{}.tmp", self.filename));
        std::fs::write(&tmp, self.content.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &target) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("moving export into {}", target.display()));
        }
        tracing::info!("Exported {} ({} bytes)", target.display(), self.content.len());
        Ok(target)
    }
}

impl IntoResponse for CsvFile {
    /// Offers the CSV as a file download.
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        (
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.content,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Hair Salon"), "hair-salon");
        assert_eq!(slugify("  Auto   Mechanic!! "), "auto-mechanic");
        assert_eq!(slugify("bakery"), "bakery");
    }

    #[test]
    fn filenames_follow_conventions() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(leads_filename("Hair Salon", date), "leads-hair-salon-2024-01-15.csv");
        assert_eq!(
            search_filename("search_1_abc", date),
            "search-search_1_abc-2024-01-15.csv"
        );
        assert_eq!(all_leads_filename(date), "all-leads-2024-01-15.csv");
        assert_eq!(history_filename(date), "search-history-2024-01-15.csv");
    }

    #[test]
    fn created_at_uses_us_short_format() {
        let at = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_created_at(&at), "Jan 15, 2024, 10:30 AM");
    }

    #[test]
    fn csv_file_response_is_an_attachment() {
        let response = CsvFile::new("all-leads-2024-01-15.csv", "a,b").into_response();
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"all-leads-2024-01-15.csv\""
        );
    }

    #[test]
    fn write_to_dir_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = CsvFile::new("x.csv", "Header\n\"v\"")
            .write_to_dir(dir.path())
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Header\n\"v\"");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }
}
