//! Filter, sort and paginate lead collections for display.
//!
//! Every lead-listing view (search results, all leads) goes through
//! [`render`]. It is a pure function: the input slice is never touched and
//! the same inputs always produce the same output.

use crate::models::{Lead, LeadTableItem, LeadType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Fields the free-text query can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextField {
    BusinessName,
    Category,
    Address,
    City,
    State,
}

impl TextField {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "businessName" => Some(TextField::BusinessName),
            "category" => Some(TextField::Category),
            "address" => Some(TextField::Address),
            "city" => Some(TextField::City),
            "state" => Some(TextField::State),
            _ => None,
        }
    }
}

/// CRM membership filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZohoStatus {
    InZoho,
    NotInZoho,
    #[default]
    All,
}

impl ZohoStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in-zoho" => Some(ZohoStatus::InZoho),
            "not-in-zoho" => Some(ZohoStatus::NotInZoho),
            "all" => Some(ZohoStatus::All),
            _ => None,
        }
    }
}

/// Conjunction of filter clauses. Every clause defaults to permissive.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    /// Case-insensitive substring; empty or `None` disables the clause.
    pub query: Option<String>,
    /// Fields the query is matched against. A lead matches if any field does.
    pub search_fields: Vec<TextField>,
    /// `None` means "all".
    pub lead_type: Option<LeadType>,
    /// Exact category match; `None` means "all".
    pub category: Option<String>,
    /// Accepted "City, ST" labels; empty disables the clause.
    pub locations: BTreeSet<String>,
    pub zoho_status: ZohoStatus,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            query: None,
            search_fields: vec![
                TextField::BusinessName,
                TextField::Category,
                TextField::Address,
            ],
            lead_type: None,
            category: None,
            locations: BTreeSet::new(),
            zoho_status: ZohoStatus::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    BusinessName,
    LeadScore,
    DateAdded,
    LeadType,
}

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "businessName" => Some(SortField::BusinessName),
            "leadScore" => Some(SortField::LeadScore),
            "dateAdded" => Some(SortField::DateAdded),
            "leadType" => Some(SortField::LeadType),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(SortField::LeadScore, SortOrder::Desc)
    }
}

/// Derives a "City, ST" label from a free-form address.
///
/// The second-to-last `", "` segment is the city and the leading token of the
/// last segment is the state. Addresses with fewer than three segments yield
/// `None`.
pub fn location_label(address: &str) -> Option<String> {
    let (city, state) = city_and_state(address)?;
    Some(format!("{}, {}", city, state))
}

/// Splits an address into `(city, state)` using the same heuristic as
/// [`location_label`].
pub fn city_and_state(address: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = address.split(", ").collect();
    if parts.len() < 3 {
        return None;
    }
    let city = parts[parts.len() - 2];
    let state = parts[parts.len() - 1].split(' ').next().unwrap_or("");
    if city.is_empty() || state.is_empty() {
        return None;
    }
    Some((city, state))
}

/// Anything the list engine can filter and sort.
pub trait ListItem {
    fn lead(&self) -> &Lead;

    /// "City, ST" label used by the location filter.
    fn location_label(&self) -> Option<String> {
        location_label(&self.lead().address)
    }

    fn date_added(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn text_field(&self, field: TextField) -> Option<Cow<'_, str>> {
        lead_text_field(self.lead(), field)
    }
}

fn lead_text_field(lead: &Lead, field: TextField) -> Option<Cow<'_, str>> {
    match field {
        TextField::BusinessName => Some(Cow::Borrowed(lead.business_name.as_str())),
        TextField::Category => Some(Cow::Borrowed(lead.category.as_str())),
        TextField::Address => Some(Cow::Borrowed(lead.address.as_str())),
        TextField::City => city_and_state(&lead.address).map(|(c, _)| Cow::Borrowed(c)),
        TextField::State => city_and_state(&lead.address).map(|(_, s)| Cow::Borrowed(s)),
    }
}

impl ListItem for Lead {
    fn lead(&self) -> &Lead {
        self
    }
}

impl ListItem for LeadTableItem {
    fn lead(&self) -> &Lead {
        &self.lead
    }

    fn location_label(&self) -> Option<String> {
        if self.city.is_empty() || self.state.is_empty() {
            return location_label(&self.lead.address);
        }
        Some(format!("{}, {}", self.city, self.state))
    }

    fn date_added(&self) -> Option<DateTime<Utc>> {
        Some(self.date_added)
    }

    fn text_field(&self, field: TextField) -> Option<Cow<'_, str>> {
        match field {
            TextField::City if !self.city.is_empty() => Some(Cow::Borrowed(self.city.as_str())),
            TextField::State if !self.state.is_empty() => Some(Cow::Borrowed(self.state.as_str())),
            _ => lead_text_field(&self.lead, field),
        }
    }
}

/// Returns whether `item` satisfies every active clause of `filter`.
pub fn matches<T: ListItem>(item: &T, filter: &FilterSpec) -> bool {
    let lead = item.lead();

    if let Some(query) = filter.query.as_deref().filter(|q| !q.is_empty()) {
        let needle = query.to_lowercase();
        let hit = filter.search_fields.iter().any(|field| {
            item.text_field(*field)
                .map(|value| value.to_lowercase().contains(&needle))
                .unwrap_or(false)
        });
        if !hit {
            return false;
        }
    }

    if let Some(lead_type) = filter.lead_type {
        if lead.lead_type != lead_type {
            return false;
        }
    }

    if let Some(ref category) = filter.category {
        if &lead.category != category {
            return false;
        }
    }

    if !filter.locations.is_empty() {
        match item.location_label() {
            Some(label) if filter.locations.contains(&label) => {}
            _ => return false,
        }
    }

    match filter.zoho_status {
        ZohoStatus::All => true,
        ZohoStatus::InZoho => lead.is_in_zoho,
        ZohoStatus::NotInZoho => !lead.is_in_zoho,
    }
}

/// Natural ascending ordering of two items on `field`.
pub fn compare<T: ListItem>(a: &T, b: &T, field: SortField) -> Ordering {
    match field {
        SortField::BusinessName => a
            .lead()
            .business_name
            .to_lowercase()
            .cmp(&b.lead().business_name.to_lowercase()),
        SortField::LeadScore => a.lead().lead_score.cmp(&b.lead().lead_score),
        SortField::DateAdded => a.date_added().cmp(&b.date_added()),
        // Lexicographic on the wire id, not by severity.
        SortField::LeadType => a.lead().lead_type.as_str().cmp(b.lead().lead_type.as_str()),
    }
}

/// Produces the display sequence: filtered by `filter`, ordered by `sort`.
///
/// The sort is stable, so items with equal keys keep their input order in
/// both directions.
pub fn render<T: ListItem + Clone>(items: &[T], filter: &FilterSpec, sort: &SortSpec) -> Vec<T> {
    let mut out: Vec<T> = items
        .iter()
        .filter(|item| matches(*item, filter))
        .cloned()
        .collect();

    match sort.order {
        SortOrder::Asc => out.sort_by(|a, b| compare(a, b, sort.field)),
        SortOrder::Desc => out.sort_by(|a, b| compare(b, a, sort.field)),
    }

    out
}

/// Default page size of the lead tables.
pub const DEFAULT_PER_PAGE: usize = 50;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub per_page: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Page {
    /// Builds a page request, clamping zero values to the first page / default size.
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: if per_page == 0 {
                DEFAULT_PER_PAGE
            } else {
                per_page
            },
        }
    }

    pub fn skip(&self) -> usize {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }
}

/// One page of a rendered list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub has_more: bool,
}

pub fn paginate<T>(items: Vec<T>, page: Page) -> Paginated<T> {
    let total = items.len();
    let skip = page.skip();
    let items: Vec<T> = items.into_iter().skip(skip).take(page.per_page).collect();
    let has_more = skip.saturating_add(items.len()) < total;

    Paginated {
        items,
        total,
        page: page.page,
        per_page: page.per_page,
        has_more,
    }
}

/// Distinct location labels in first-seen order, for populating filter choices.
pub fn unique_locations<T: ListItem>(items: &[T]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .iter()
        .filter_map(|item| item.location_label())
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

/// Distinct categories in first-seen order.
pub fn unique_categories<T: ListItem>(items: &[T]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .iter()
        .map(|item| item.lead().category.clone())
        .filter(|category| seen.insert(category.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_label_takes_city_and_state_token() {
        assert_eq!(
            location_label("123 Main St, Atlanta, GA 30309").as_deref(),
            Some("Atlanta, GA")
        );
        assert_eq!(
            location_label("Suite 4, 9 Elm Rd, Austin, TX").as_deref(),
            Some("Austin, TX")
        );
    }

    #[test]
    fn location_label_tolerates_short_addresses() {
        assert_eq!(location_label(""), None);
        assert_eq!(location_label("Atlanta"), None);
        assert_eq!(location_label("Atlanta, GA"), None);
        assert_eq!(location_label("Main St,Atlanta,GA"), None);
    }

    #[test]
    fn page_skip_is_zero_based() {
        assert_eq!(Page::new(1, 50).skip(), 0);
        assert_eq!(Page::new(3, 10).skip(), 20);
        assert_eq!(Page::new(0, 0), Page::new(1, DEFAULT_PER_PAGE));
    }

    #[test]
    fn paginate_reports_has_more() {
        let page = paginate((1..=7).collect::<Vec<_>>(), Page::new(2, 3));
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 7);
        assert!(page.has_more);

        let last = paginate((1..=7).collect::<Vec<_>>(), Page::new(3, 3));
        assert_eq!(last.items, vec![7]);
        assert!(!last.has_more);

        let past_end = paginate((1..=7).collect::<Vec<_>>(), Page::new(9, 3));
        assert!(past_end.items.is_empty());
        assert!(!past_end.has_more);
    }
}
