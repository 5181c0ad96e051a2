//! In-memory marker collection.
//!
//! Markers are keyed by their client [`MarkerId`] and kept in creation
//! order, which is also their draw order. The store tracks how many
//! persistence requests are outstanding per marker so that server
//! responses never overwrite newer local edits. A marker being dragged or
//! resized is held, which protects it the same way.

use std::collections::HashMap;

use floorplan_core::{Marker, MarkerId, SyncState};

#[derive(Debug, Default)]
pub struct MarkerStore {
    markers: HashMap<MarkerId, Marker>,
    order: Vec<MarkerId>,
    pending: HashMap<MarkerId, usize>,
    held: Option<MarkerId>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn contains(&self, key: &MarkerId) -> bool {
        self.markers.contains_key(key)
    }

    pub fn get(&self, key: &MarkerId) -> Option<&Marker> {
        self.markers.get(key)
    }

    pub fn get_mut(&mut self, key: &MarkerId) -> Option<&mut Marker> {
        self.markers.get_mut(key)
    }

    /// Inserts or replaces a marker. New markers go on top.
    pub fn insert(&mut self, marker: Marker) {
        let key = marker.key;
        if self.markers.insert(key, marker).is_none() {
            self.order.push(key);
        }
    }

    pub fn remove(&mut self, key: &MarkerId) -> Option<Marker> {
        let removed = self.markers.remove(key)?;
        self.order.retain(|k| k != key);
        if self.held.as_ref() == Some(key) {
            self.held = None;
        }
        Some(removed)
    }

    /// Markers of `page`, bottom to top.
    pub fn on_page(&self, page: u32) -> impl DoubleEndedIterator<Item = &Marker> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.markers.get(key))
            .filter(move |m| m.page == page)
    }

    pub fn by_remote_id(&self, remote_id: i64) -> Option<&Marker> {
        self.markers
            .values()
            .find(|m| m.remote_id == Some(remote_id))
    }

    /// Records that a request for `key` was issued.
    pub fn begin_request(&mut self, key: MarkerId) {
        *self.pending.entry(key).or_insert(0) += 1;
        if let Some(marker) = self.markers.get_mut(&key) {
            marker.sync = SyncState::Pending;
        }
    }

    /// Records that a request for `key` finished; returns how many remain.
    pub fn finish_request(&mut self, key: MarkerId) -> usize {
        let remaining = match self.pending.get_mut(&key) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            self.pending.remove(&key);
        }
        remaining
    }

    pub fn has_pending(&self, key: &MarkerId) -> bool {
        self.pending.get(key).is_some_and(|count| *count > 0)
    }

    /// Protects `key` from server records while a gesture edits it.
    pub fn hold(&mut self, key: MarkerId) {
        self.held = Some(key);
    }

    pub fn release(&mut self) {
        self.held = None;
    }

    /// True when local state for `key` is ahead of the server.
    fn is_busy(&self, key: &MarkerId) -> bool {
        self.held.as_ref() == Some(key) || self.has_pending(key)
    }

    /// Applies an authoritative record returned for `key`.
    ///
    /// The server id is always taken. Geometry and version are only taken
    /// once no further request for the marker is outstanding and it is not
    /// held; otherwise the newer local edit stays visible until its own
    /// response arrives.
    pub fn apply_saved(&mut self, key: MarkerId, saved: Marker) -> bool {
        let settled = !self.is_busy(&key);
        let Some(local) = self.markers.get_mut(&key) else {
            return false;
        };
        local.remote_id = saved.remote_id.or(local.remote_id);
        if settled {
            let mut saved = saved;
            saved.key = key;
            saved.remote_id = local.remote_id;
            saved.sync = SyncState::Synced;
            *local = saved;
        }
        true
    }

    pub fn mark_failed(&mut self, key: &MarkerId) {
        if let Some(marker) = self.markers.get_mut(key) {
            marker.sync = SyncState::Failed;
        }
    }

    /// Replaces the markers of `page` with the server's list.
    ///
    /// Server records are matched to local markers by server id and keep the
    /// local key. Busy local markers, and local markers the server has never
    /// seen, are kept as they are. Synced markers missing
    /// from the list are dropped. Returns the keys that were dropped.
    ///
    /// While a create on `page` is still unanswered, unknown server records
    /// are skipped: one of them may be that create's own record, which the
    /// create response will attach to the local marker.
    pub fn reconcile_page(&mut self, page: u32, server: Vec<Marker>) -> Vec<MarkerId> {
        let mut seen = Vec::with_capacity(server.len());
        let creating = self
            .on_page(page)
            .any(|m| m.remote_id.is_none() && self.has_pending(&m.key));

        for record in server {
            let Some(remote_id) = record.remote_id else {
                continue;
            };
            let existing = self.by_remote_id(remote_id).map(|m| m.key);
            match existing {
                Some(key) => {
                    seen.push(key);
                    if !self.is_busy(&key) {
                        let mut record = record;
                        record.key = key;
                        record.sync = SyncState::Synced;
                        self.markers.insert(key, record);
                    }
                }
                None if creating => {
                    tracing::debug!("deferring unknown marker #{} until creates settle", remote_id);
                }
                None => {
                    let mut record = record;
                    record.key = MarkerId::new();
                    record.sync = SyncState::Synced;
                    seen.push(record.key);
                    self.insert(record);
                }
            }
        }

        let dropped: Vec<MarkerId> = self
            .on_page(page)
            .filter(|m| {
                m.remote_id.is_some() && !seen.contains(&m.key) && !self.is_busy(&m.key)
            })
            .map(|m| m.key)
            .collect();
        for key in &dropped {
            self.remove(key);
        }
        dropped
    }
}
