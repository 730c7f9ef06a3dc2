// lockmeshd - Peer-to-peer distributed lock manager daemon
// Copyright (C) 2026 lockmeshd contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};

use crate::message::LockMode;

/// One pending or granted request against a named resource.
///
/// The table as a whole — not each resource independently — is one totally
/// ordered sequence; only the single record at the tail of the *entire*
/// table (across every resource) may hold pending_replies == 0 and be
/// granted. This mirrors the original daemon's actual behavior: it
/// generalizes Lamport's 1978 mutual-exclusion algorithm, which serializes
/// entry to one shared critical section, rather than arbitrating each
/// resource independently. It is a real limitation (two unrelated resources
/// cannot be held concurrently) and is kept deliberately rather than
/// "fixed", since fixing it would depart from the system being specified.
#[derive(Debug, Clone)]
pub struct LockRecord {
    pub resource: String,
    pub lock_id: u64,
    pub timestamp: u64,
    pub origin_id: u32,
    pub mode: LockMode,
    pub local: bool,
    pub remote: bool,
    pub holders: Vec<u32>,
    pub pending_replies: usize,
}

/// What a caller needs in order to broadcast a message about a record.
#[derive(Debug, Clone, Copy)]
pub struct RecordHandle {
    pub lock_id: u64,
    pub timestamp: u64,
}

pub struct LockTable {
    records: Mutex<Vec<LockRecord>>,
    condvar: Condvar,
    next_id: AtomicU64,
}

impl LockTable {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            condvar: Condvar::new(),
            next_id: AtomicU64::new(0),
        }
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Insert a freshly built record, applying the coalesce-then-tie-break
    /// insertion rule described in the spec. Returns the id of the record
    /// that now represents this request — which, on coalescing, is the id
    /// of the *pre-existing* record, not a freshly allocated one.
    fn insert(&self, mut record: LockRecord) -> RecordHandle {
        let mut table = self.records.lock().unwrap();

        if let Some(existing) = table
            .iter_mut()
            .find(|r| r.resource == record.resource && record.mode.compatible_with(r.mode))
        {
            for holder in &record.holders {
                if !existing.holders.contains(holder) {
                    existing.holders.push(*holder);
                }
            }
            existing.local |= record.local;
            existing.remote |= record.remote;
            let handle = RecordHandle {
                lock_id: existing.lock_id,
                timestamp: existing.timestamp,
            };
            drop(table);
            self.condvar.notify_all();
            return handle;
        }

        record.lock_id = self.alloc_id();
        let handle = RecordHandle {
            lock_id: record.lock_id,
            timestamp: record.timestamp,
        };

        match table.iter().position(|r| r.timestamp == record.timestamp) {
            // Greater origin id sorts earlier (toward the head); lower
            // origin id sorts later (toward the tail, granted sooner).
            Some(pos) if record.origin_id > table[pos].origin_id => {
                table.insert(pos, record);
            }
            Some(pos) => {
                table.insert(pos + 1, record);
            }
            None => table.insert(0, record),
        }

        drop(table);
        self.condvar.notify_all();
        handle
    }

    /// Insert a locally originated request. `pending_replies` is captured
    /// by the caller from the peer registry's live remote count at this
    /// instant and is not adjusted later if a peer dies.
    pub fn insert_local(
        &self,
        resource: String,
        mode: LockMode,
        timestamp: u64,
        origin_id: u32,
        pending_replies: usize,
    ) -> RecordHandle {
        self.insert(LockRecord {
            resource,
            lock_id: 0,
            timestamp,
            origin_id,
            mode,
            local: true,
            remote: false,
            holders: vec![origin_id],
            pending_replies,
        })
    }

    /// Insert a record for a peer's `request`. Remote records never wait
    /// on replies of their own.
    pub fn insert_remote(
        &self,
        resource: String,
        mode: LockMode,
        timestamp: u64,
        origin_id: u32,
    ) -> RecordHandle {
        self.insert(LockRecord {
            resource,
            lock_id: 0,
            timestamp,
            origin_id,
            mode,
            local: false,
            remote: true,
            holders: vec![origin_id],
            pending_replies: 0,
        })
    }

    /// Block until `lock_id`'s record has no pending replies and is the
    /// tail of the whole table.
    pub fn wait_for_grant(&self, lock_id: u64) {
        let mut table = self.records.lock().unwrap();
        loop {
            let tail_idx = table.len().checked_sub(1);
            let satisfied = match table.iter().position(|r| r.lock_id == lock_id) {
                Some(idx) => table[idx].pending_replies == 0 && Some(idx) == tail_idx,
                // The record is gone: either released already or
                // coalesced away. Treat as satisfied rather than hang.
                None => true,
            };

            if satisfied {
                return;
            }

            table = self.condvar.wait(table).unwrap();
        }
    }

    /// Decrement pending-replies on the local record matching (resource,
    /// timestamp). Returns `false` if no such record exists (the reply is
    /// logged and dropped by the caller).
    pub fn on_reply(&self, resource: &str, timestamp: u64) -> bool {
        let mut table = self.records.lock().unwrap();
        let found = table
            .iter_mut()
            .find(|r| r.local && r.resource == resource && r.timestamp == timestamp);

        match found {
            Some(record) => {
                if record.pending_replies > 0 {
                    record.pending_replies -= 1;
                }
                drop(table);
                self.condvar.notify_all();
                true
            }
            None => false,
        }
    }

    /// Remove `origin_id` from the holders of the remote record for
    /// `resource` on receipt of an `unlock`. Returns `false` if no such
    /// record exists.
    pub fn on_unlock(&self, resource: &str, origin_id: u32) -> bool {
        let mut table = self.records.lock().unwrap();
        let idx = table
            .iter()
            .position(|r| r.resource == resource && r.holders.contains(&origin_id));

        match idx {
            Some(idx) => {
                table[idx].holders.retain(|h| *h != origin_id);
                if table[idx].holders.is_empty() {
                    table.remove(idx);
                }
                drop(table);
                self.condvar.notify_all();
                true
            }
            None => false,
        }
    }

    /// Release `local_peer_id`'s hold on `lock_id`. Returns the record's
    /// (resource, mode) so the caller can broadcast `unlock`, regardless of
    /// whether the record was actually removed (another peer may still
    /// hold a coalesced compatible-mode grant). Returns `None` if no
    /// record with this id exists.
    pub fn release_local(&self, lock_id: u64, local_peer_id: u32) -> Option<(String, LockMode)> {
        let mut table = self.records.lock().unwrap();
        let idx = table.iter().position(|r| r.lock_id == lock_id)?;

        table[idx].holders.retain(|h| *h != local_peer_id);
        let info = (table[idx].resource.clone(), table[idx].mode);

        if table[idx].holders.is_empty() {
            table.remove(idx);
        }

        drop(table);
        self.condvar.notify_all();
        Some(info)
    }

    /// Number of records currently in the table, for tests and diagnostics.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of holders for the (single, coalesced) record on `resource`,
    /// for tests.
    #[cfg(test)]
    pub fn holders_of(&self, resource: &str) -> Option<Vec<u32>> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.resource == resource)
            .map(|r| r.holders.clone())
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}
