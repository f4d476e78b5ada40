//! Bounded, most-recent-first record of executed searches.
//!
//! One store is built at startup and shared by `Arc`. All mutations take a
//! single write lock for their whole read-modify-write. When a snapshot path
//! is configured, the new state is serialized under that lock and written to
//! disk after it is released; inside a tokio runtime the write runs on the
//! blocking pool. Writes carry a generation number so a late, older write
//! never replaces a newer file.

use crate::config::{Config, DEFAULT_HISTORY_CAPACITY};
use crate::errors::{AppError, ResultExt};
use crate::list_engine::city_and_state;
use crate::models::{DerivedAnalytics, Lead, LeadTableItem, SearchParams, SearchResult};
use crate::snapshot::ValidatedSnapshot;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Default)]
struct HistoryState {
    /// Most recent first.
    entries: VecDeque<SearchResult>,
    /// Every id this store has handed out or accepted. Never shrinks.
    issued: HashSet<String>,
    /// Bumped on every staged snapshot.
    generation: u64,
}

/// Persisted form of the store, kept inside a [`ValidatedSnapshot`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Most recent first.
    pub entries: Vec<SearchResult>,
    /// Ids that must never be handed out again, including deleted ones.
    #[serde(default)]
    pub issued: Vec<String>,
}

#[derive(Serialize)]
struct SnapshotView<'a> {
    entries: &'a VecDeque<SearchResult>,
    issued: Vec<&'a str>,
}

struct PendingWrite {
    generation: u64,
    body: String,
}

#[derive(Debug)]
struct SnapshotWriter {
    path: PathBuf,
    /// Generation of the file currently on disk.
    written: Mutex<u64>,
}

impl SnapshotWriter {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            written: Mutex::new(0),
        }
    }

    fn write(&self, pending: PendingWrite) {
        let mut written = self.written.lock().unwrap_or_else(|p| p.into_inner());
        if pending.generation <= *written {
            tracing::debug!(
                "Skipping history snapshot generation {} (generation {} already on disk)",
                pending.generation,
                *written
            );
            return;
        }
        match write_snapshot(&self.path, &pending.body) {
            Ok(()) => *written = pending.generation,
            Err(e) => tracing::error!("Failed to persist search history: {}", e),
        }
    }
}

#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    writer: Option<Arc<SnapshotWriter>>,
    fresh: bool,
    state: RwLock<HistoryState>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    /// Creates an empty in-memory store. A zero capacity is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            writer: None,
            fresh: true,
            state: RwLock::new(HistoryState::default()),
        }
    }

    /// Creates a store backed by the snapshot file at `path`.
    ///
    /// Entries and the set of issued ids are restored from the snapshot. A
    /// missing, unreadable or corrupt snapshot yields an empty store; the
    /// problem is logged and the file is overwritten on the next mutation.
    pub fn open(capacity: usize, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self::new(capacity);
        store.fresh = !path.exists();
        let snapshot = read_snapshot(&path).unwrap_or_default();
        {
            let capacity = store.capacity;
            let state = store.state.get_mut().unwrap_or_else(|p| p.into_inner());
            state.issued.extend(snapshot.issued);

            let mut seen = HashSet::new();
            for entry in snapshot.entries {
                state.issued.insert(entry.id.clone());
                if state.entries.len() < capacity && seen.insert(entry.id.clone()) {
                    state.entries.push_back(entry);
                }
            }
            tracing::info!(
                "History store opened with {} entries ({} issued ids) from {}",
                state.entries.len(),
                state.issued.len(),
                path.display()
            );
        }
        store.writer = Some(Arc::new(SnapshotWriter::new(path)));
        store
    }

    pub fn from_config(config: &Config) -> Self {
        match config.history_path {
            Some(ref path) => Self::open(config.history_capacity, path),
            None => Self::new(config.history_capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `false` when the store was opened over an existing snapshot file.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    fn read(&self) -> RwLockReadGuard<'_, HistoryState> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HistoryState> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Records a completed search at the head of the history.
    ///
    /// Entries beyond the capacity are evicted oldest-first without notice.
    pub fn save(
        &self,
        params: SearchParams,
        leads: Vec<Lead>,
        analytics: Option<DerivedAnalytics>,
    ) -> SearchResult {
        let analytics = analytics.unwrap_or_default();
        let (result, held, pending) = {
            let mut state = self.write();

            let now = Utc::now();
            let id = loop {
                let candidate = generate_search_id(now.timestamp_millis());
                if state.issued.insert(candidate.clone()) {
                    break candidate;
                }
                tracing::debug!("Search id collision on {}, regenerating", candidate);
            };

            let result = SearchResult {
                id,
                search_params: params,
                total_leads: leads.len(),
                leads,
                date: now,
                trend_data: analytics.trend_data,
                competitor_analysis: analytics.competitor_analysis,
            };

            state.entries.push_front(result.clone());
            self.evict_overflow(&mut state);
            (result, state.entries.len(), self.stage(&mut state))
        };
        self.dispatch(pending);

        tracing::info!(
            "Saved search {} ({} leads, {} in history)",
            result.id,
            result.total_leads,
            held
        );
        result
    }

    /// Places a pre-built entry at the head of the history.
    ///
    /// Returns `false` without changing anything if the id was already
    /// issued by this store.
    pub fn insert(&self, entry: SearchResult) -> bool {
        let pending = {
            let mut state = self.write();
            if !state.issued.insert(entry.id.clone()) {
                tracing::warn!("Refusing to insert search {}: id already issued", entry.id);
                return false;
            }
            state.entries.push_front(entry);
            self.evict_overflow(&mut state);
            self.stage(&mut state)
        };
        self.dispatch(pending);
        true
    }

    fn evict_overflow(&self, state: &mut HistoryState) {
        while state.entries.len() > self.capacity {
            if let Some(evicted) = state.entries.pop_back() {
                tracing::debug!("Evicted search {} from history", evicted.id);
            }
        }
    }

    /// Snapshot of the history, most recent first.
    pub fn list(&self) -> Vec<SearchResult> {
        self.read().entries.iter().cloned().collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<SearchResult> {
        self.read().entries.iter().find(|e| e.id == id).cloned()
    }

    /// Removes the entry with `id`. Returns whether anything was removed.
    pub fn delete_by_id(&self, id: &str) -> bool {
        let pending = {
            let mut state = self.write();
            let Some(index) = state.entries.iter().position(|e| e.id == id) else {
                return false;
            };
            state.entries.remove(index);
            self.stage(&mut state)
        };
        self.dispatch(pending);
        tracing::info!("Deleted search {}", id);
        true
    }

    /// Empties the history. Issued ids stay reserved.
    pub fn clear(&self) {
        let (removed, pending) = {
            let mut state = self.write();
            let removed = state.entries.len();
            state.entries.clear();
            (removed, self.stage(&mut state))
        };
        self.dispatch(pending);
        tracing::info!("Cleared search history ({} entries)", removed);
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Every stored lead projected for the all-leads table, in history order.
    pub fn all_leads(&self) -> Vec<LeadTableItem> {
        let state = self.read();
        state
            .entries
            .iter()
            .flat_map(|entry| {
                entry.leads.iter().map(move |lead| {
                    let (city, st) = city_and_state(&lead.address).unwrap_or(("", ""));
                    LeadTableItem {
                        lead: lead.clone(),
                        date_added: entry.date,
                        city: city.to_string(),
                        state: st.to_string(),
                    }
                })
            })
            .collect()
    }

    /// The most recently stored copy of the lead with `lead_id`.
    pub fn find_lead(&self, lead_id: &str) -> Option<Lead> {
        self.read()
            .entries
            .iter()
            .flat_map(|e| e.leads.iter())
            .find(|l| l.id == lead_id)
            .cloned()
    }

    /// Flags every stored copy of `lead_id` as pushed to the CRM.
    ///
    /// Returns how many copies flipped from `false` to `true`.
    pub fn mark_in_crm(&self, lead_id: &str) -> usize {
        let (flipped, pending) = {
            let mut state = self.write();
            let mut flipped = 0;
            for lead in state
                .entries
                .iter_mut()
                .flat_map(|e| e.leads.iter_mut())
                .filter(|l| l.id == lead_id && !l.is_in_zoho)
            {
                lead.is_in_zoho = true;
                flipped += 1;
            }
            let pending = if flipped > 0 {
                self.stage(&mut state)
            } else {
                None
            };
            (flipped, pending)
        };
        self.dispatch(pending);
        flipped
    }

    /// Serializes the state for the snapshot file, if this store has one.
    fn stage(&self, state: &mut HistoryState) -> Option<PendingWrite> {
        self.writer.as_ref()?;

        let mut issued: Vec<&str> = state.issued.iter().map(String::as_str).collect();
        issued.sort_unstable();
        let view = SnapshotView {
            entries: &state.entries,
            issued,
        };
        let body = match ValidatedSnapshot::from_value(&view) {
            Ok(snapshot) => snapshot.serialize(),
            Err(e) => {
                tracing::error!("Failed to serialize search history: {}", e);
                return None;
            }
        };

        state.generation += 1;
        Some(PendingWrite {
            generation: state.generation,
            body,
        })
    }

    /// Writes a staged snapshot. Failures are logged; the in-memory state
    /// stays authoritative.
    fn dispatch(&self, pending: Option<PendingWrite>) {
        let (Some(writer), Some(pending)) = (self.writer.as_ref(), pending) else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let writer = Arc::clone(writer);
                handle.spawn_blocking(move || writer.write(pending));
            }
            Err(_) => writer.write(pending),
        }
    }
}

/// `search_<millis>_<9 base36 chars>`, the suffix drawn from a v4 UUID.
pub fn generate_search_id(millis: i64) -> String {
    let mut bits = uuid::Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        suffix.push(BASE36[(bits % 36) as usize] as char);
        bits /= 36;
    }
    format!("search_{}_{}", millis, suffix)
}

/// Reads a snapshot file. `None` when it is missing, unreadable or corrupt.
pub fn read_snapshot(path: &Path) -> Option<HistorySnapshot> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No history snapshot at {}", path.display());
            return None;
        }
        Err(e) => {
            tracing::warn!(
                "Could not read history snapshot {}: {}. Starting empty",
                path.display(),
                e
            );
            return None;
        }
    };

    let snapshot = ValidatedSnapshot::decode::<HistorySnapshot>(&raw);
    if snapshot.is_none() {
        tracing::warn!(
            "History snapshot {} is corrupt. Starting empty",
            path.display()
        );
    }
    snapshot
}

/// Entries of a snapshot file, failing open to an empty list.
pub fn load_snapshot(path: &Path) -> Vec<SearchResult> {
    read_snapshot(path)
        .map(|snapshot| snapshot.entries)
        .unwrap_or_default()
}

fn write_snapshot(path: &Path, body: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeadSource, LeadType};

    fn params(business_type: &str) -> SearchParams {
        SearchParams {
            business_type: business_type.to_string(),
            locations: vec!["atlanta".to_string()],
            number_of_businesses: 10,
            include_google_search: false,
            custom_search_query: None,
            include_competitor_analysis: false,
            include_trend_analysis: false,
        }
    }

    fn lead(id: &str, address: &str) -> Lead {
        Lead {
            id: id.to_string(),
            business_name: format!("Business {}", id),
            category: "Bakery".to_string(),
            address: address.to_string(),
            website: None,
            phone: None,
            email: None,
            lead_score: 70,
            lead_type: LeadType::Good,
            source: LeadSource::GoogleMaps,
            lighthouse_score: None,
            google_maps_listing: Some(true),
            google_search_ranking: None,
            search_snippet: None,
            local_seo_score: None,
            notes: None,
            is_in_zoho: false,
        }
    }

    #[test]
    fn generated_ids_have_expected_shape() {
        let id = generate_search_id(1_700_000_000_000);
        let parts: Vec<&str> = id.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "search");
        assert_eq!(parts[1], "1700000000000");
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn save_counts_leads_and_prepends() {
        let store = HistoryStore::new(5);
        let first = store.save(params("bakery"), vec![lead("a", "x")], None);
        let second = store.save(params("dentist"), vec![], None);

        assert_eq!(first.total_leads, 1);
        let ids: Vec<_> = store.list().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn insert_rejects_reissued_id_even_after_delete() {
        let store = HistoryStore::new(5);
        let saved = store.save(params("bakery"), vec![], None);
        assert!(store.delete_by_id(&saved.id));

        assert!(!store.insert(saved.clone()));
        assert!(store.get_by_id(&saved.id).is_none());
    }

    #[test]
    fn all_leads_derives_city_and_state() {
        let store = HistoryStore::new(5);
        let saved = store.save(
            params("bakery"),
            vec![lead("a", "123 Main St, Atlanta, GA 30309"), lead("b", "nowhere")],
            None,
        );

        let items = store.all_leads();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].city, "Atlanta");
        assert_eq!(items[0].state, "GA");
        assert_eq!(items[0].date_added, saved.date);
        assert_eq!(items[1].city, "");
    }

    #[test]
    fn mark_in_crm_flips_every_copy_once() {
        let store = HistoryStore::new(5);
        store.save(params("bakery"), vec![lead("a", "x")], None);
        store.save(params("bakery"), vec![lead("a", "x"), lead("b", "y")], None);

        assert_eq!(store.mark_in_crm("a"), 2);
        assert_eq!(store.mark_in_crm("a"), 0);
        assert!(store.find_lead("a").unwrap().is_in_zoho);
        assert!(!store.find_lead("b").unwrap().is_in_zoho);
    }

    #[test]
    fn older_snapshot_generation_never_overwrites_newer() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let writer = SnapshotWriter::new(path.clone());

        writer.write(PendingWrite {
            generation: 2,
            body: "newer".to_string(),
        });
        writer.write(PendingWrite {
            generation: 1,
            body: "older".to_string(),
        });

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "newer");
    }

    #[tokio::test]
    async fn snapshot_is_written_off_the_async_worker() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let store = HistoryStore::open(5, &path);
        let saved = store.save(params("bakery"), vec![], None);

        let mut stored = Vec::new();
        for _ in 0..50 {
            stored = load_snapshot(&path);
            if !stored.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, saved.id);
    }
}
