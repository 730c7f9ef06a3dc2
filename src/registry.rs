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

use std::collections::HashMap;
use std::net::SocketAddrV4;
use std::sync::Mutex;

use crate::peer::{Peer, PeerKind, LIVENESS_CEILING};
use crate::transport::Transport;

struct Entry {
    peer: Peer,
    liveness: i32,
}

struct Inner {
    by_id: HashMap<u32, Entry>,
}

/// Known peers and their liveness, plus broadcast/unicast over a `Transport`.
///
/// The peer set is fixed at startup (no dynamic membership); everything
/// that changes afterward is the per-peer liveness counter.
pub struct PeerRegistry<T: Transport> {
    inner: Mutex<Inner>,
    transport: T,
}

impl<T: Transport> PeerRegistry<T> {
    pub fn new(transport: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                by_id: HashMap::new(),
            }),
            transport,
        }
    }

    /// Register a peer at startup. Liveness starts at -1 (dead) until the
    /// first heartbeat or message from that peer refreshes it.
    pub fn add(&self, peer: Peer) {
        let mut inner = self.inner.lock().unwrap();
        inner.by_id.insert(
            peer.id,
            Entry {
                peer,
                liveness: -1,
            },
        );
    }

    pub fn find_by_address(&self, addr: SocketAddrV4) -> Option<Peer> {
        let id = u32::from_be_bytes(addr.ip().octets());
        self.inner
            .lock()
            .unwrap()
            .by_id
            .get(&id)
            .map(|e| e.peer.clone())
    }

    pub fn find_by_name(&self, name: &str) -> Option<Peer> {
        self.inner
            .lock()
            .unwrap()
            .by_id
            .values()
            .find(|e| e.peer.name == name)
            .map(|e| e.peer.clone())
    }

    /// Set `peer`'s liveness to the ceiling. Called on receipt of any
    /// message (not only `keepalive`) from that peer.
    pub fn refresh(&self, id: u32) {
        if let Some(entry) = self.inner.lock().unwrap().by_id.get_mut(&id) {
            entry.liveness = LIVENESS_CEILING;
        }
    }

    /// Aging sweep: decrement every live remote peer's liveness by one.
    /// Called once per heartbeat tick.
    pub fn decrement_all_liveness(&self) {
        for entry in self.inner.lock().unwrap().by_id.values_mut() {
            if entry.peer.kind == PeerKind::Remote && entry.liveness > 0 {
                entry.liveness -= 1;
            }
        }
    }

    /// Number of remote peers currently considered alive.
    pub fn live_remote_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .by_id
            .values()
            .filter(|e| e.peer.kind == PeerKind::Remote && e.liveness > 0)
            .count()
    }

    fn live_remote_addresses(&self) -> Vec<SocketAddrV4> {
        self.inner
            .lock()
            .unwrap()
            .by_id
            .values()
            .filter(|e| e.peer.kind == PeerKind::Remote && e.liveness > 0)
            .map(|e| e.peer.address)
            .collect()
    }

    /// Send `buf` to every peer whose liveness > 0 and whose kind != local.
    /// Best-effort: a send failure is logged, not retried, and does not
    /// stop delivery to the remaining peers.
    pub fn broadcast(&self, buf: &[u8]) {
        for addr in self.live_remote_addresses() {
            if let Err(e) = self.transport.send_to(addr, buf) {
                log::error!("broadcast send to {} failed: {}", addr, e);
            }
        }
    }

    /// Send `buf` to a single peer, subject to the same liveness predicate
    /// as `broadcast`.
    pub fn unicast(&self, peer: &Peer, buf: &[u8]) {
        let alive = self
            .inner
            .lock()
            .unwrap()
            .by_id
            .get(&peer.id)
            .map(|e| e.liveness > 0 && e.peer.kind == PeerKind::Remote)
            .unwrap_or(false);

        if !alive {
            return;
        }

        if let Err(e) = self.transport.send_to(peer.address, buf) {
            log::error!("unicast send to {} failed: {}", peer.address, e);
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
