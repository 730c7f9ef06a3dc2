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

use std::net::SocketAddrV4;

/// Maximum size, in bytes, of a peer's display name.
pub const MAX_NAME_LEN: usize = 128;

/// Number of heartbeat ticks a peer's liveness is refreshed to on contact.
///
/// Also the maximum number of consecutive missed ticks before a peer is
/// considered dead (liveness decays to zero after this many ticks of
/// silence).
pub const LIVENESS_CEILING: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerKind {
    Local,
    Remote,
}

/// Immutable identity of one cluster member.
///
/// The numeric id is the big-endian u32 form of the peer's IPv4 address,
/// used as the tiebreaker in the lock table's total order.
#[derive(Debug, Clone)]
pub struct Peer {
    pub name: String,
    pub address: SocketAddrV4,
    pub id: u32,
    pub kind: PeerKind,
}

impl Peer {
    pub fn new(name: String, address: SocketAddrV4, kind: PeerKind) -> Self {
        let id = u32::from_be_bytes(address.ip().octets());
        Self {
            name,
            address,
            id,
            kind,
        }
    }

    pub fn is_local(&self) -> bool {
        self.kind == PeerKind::Local
    }
}
