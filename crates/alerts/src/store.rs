//! JSON-file-backed alert store.

use pricewatch_core::{Alert, AlertCondition};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid alert index")]
    InvalidIndex,
}

struct Inner {
    alerts: HashMap<i64, Vec<Alert>>,
    next_id: u64,
}

/// Mapping from chat id to that chat's ordered alert list.
///
/// The whole mapping is rewritten to disk after every mutation. Users refer
/// to alerts by 1-based position in the list; internally every alert
/// carries a generated id so that batch removal by the checker is immune to
/// positional shifting.
///
/// All mutation goes through one mutex, so the read-modify-write-persist
/// cycle is atomic with respect to concurrent handlers.
pub struct AlertStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl AlertStore {
    /// Load the store from `path`. A missing file or malformed content
    /// initializes an empty mapping; this never fails the process.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let alerts = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => HashMap::new(),
            Ok(content) => match serde_json::from_str::<BTreeMap<String, Vec<Alert>>>(&content) {
                Ok(raw) => {
                    let mut alerts: HashMap<i64, Vec<Alert>> = HashMap::new();
                    for (key, list) in raw {
                        match key.parse::<i64>() {
                            Ok(chat_id) => {
                                alerts.insert(chat_id, list);
                            }
                            Err(_) => warn!("Skipping non-numeric chat id in {:?}: {}", path, key),
                        }
                    }
                    alerts
                }
                Err(e) => {
                    warn!("Malformed alerts file {:?}, starting empty: {}", path, e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("Failed to read alerts file {:?}, starting empty: {}", path, e);
                HashMap::new()
            }
        };

        let mut inner = Inner { alerts, next_id: 1 };
        // Ids are process-local; reassign after every load.
        for list in inner.alerts.values_mut() {
            for alert in list.iter_mut() {
                alert.id = inner.next_id;
                inner.next_id += 1;
            }
        }

        let count: usize = inner.alerts.values().map(Vec::len).sum();
        info!("Loaded {} alerts for {} chats from {:?}", count, inner.alerts.len(), path);

        Self {
            path,
            inner: Mutex::new(inner),
        }
    }

    /// Append an alert for a chat and persist. Returns the stored record.
    pub fn add(&self, chat_id: i64, symbol: String, condition: AlertCondition, price: f64) -> Alert {
        let mut inner = self.lock();
        let alert = Alert {
            id: inner.next_id,
            symbol,
            condition,
            price,
        };
        inner.next_id += 1;
        inner.alerts.entry(chat_id).or_default().push(alert.clone());
        self.save(&inner);
        alert
    }

    /// The chat's alerts in insertion order (possibly empty).
    pub fn list(&self, chat_id: i64) -> Vec<Alert> {
        self.lock().alerts.get(&chat_id).cloned().unwrap_or_default()
    }

    /// Remove by the 1-based position users see, then persist.
    pub fn remove(&self, chat_id: i64, position: usize) -> Result<Alert, StoreError> {
        let mut inner = self.lock();
        let (removed, now_empty) = {
            let list = inner.alerts.get_mut(&chat_id).ok_or(StoreError::InvalidIndex)?;
            if position == 0 || position > list.len() {
                return Err(StoreError::InvalidIndex);
            }
            (list.remove(position - 1), list.is_empty())
        };
        if now_empty {
            inner.alerts.remove(&chat_id);
        }
        self.save(&inner);
        Ok(removed)
    }

    /// Remove alerts by id for many chats in one pass, persisting once.
    /// Returns the number of alerts removed. Unknown ids are ignored.
    pub fn remove_many(&self, removals: &HashMap<i64, Vec<u64>>) -> usize {
        let mut inner = self.lock();
        let mut removed = 0;
        for (chat_id, ids) in removals {
            let mut now_empty = false;
            if let Some(list) = inner.alerts.get_mut(chat_id) {
                let before = list.len();
                list.retain(|a| !ids.contains(&a.id));
                removed += before - list.len();
                now_empty = list.is_empty();
            }
            if now_empty {
                inner.alerts.remove(chat_id);
            }
        }
        if removed > 0 {
            self.save(&inner);
        }
        removed
    }

    /// A consistent clone of the full mapping, for the periodic checker.
    pub fn snapshot(&self) -> HashMap<i64, Vec<Alert>> {
        self.lock().alerts.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().alerts.is_empty()
    }

    /// Serialize the full mapping to disk. An I/O failure is logged and
    /// the in-memory state keeps serving until the next successful save.
    fn save(&self, inner: &Inner) {
        let serialized: BTreeMap<String, &Vec<Alert>> = inner
            .alerts
            .iter()
            .map(|(chat_id, list)| (chat_id.to_string(), list))
            .collect();
        let result = serde_json::to_string_pretty(&serialized)
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(&self.path, json));
        if let Err(e) = result {
            error!("Failed to persist alerts to {:?}: {}", self.path, e);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("alert store lock poisoned")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
