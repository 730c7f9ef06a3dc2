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

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::lock_table::LockTable;
use crate::message::{Codec, JsonCodec, LockMode, Message};
use crate::peer::Peer;
use crate::registry::PeerRegistry;
use crate::transport::Transport;

/// The coordination engine: everything a single node needs to participate
/// in the cluster, shared behind an `Arc` across the listener and heartbeat
/// threads and any client-facing API surface.
pub struct CoreState<T: Transport> {
    pub clock: Clock,
    pub registry: PeerRegistry<T>,
    pub lock_table: LockTable,
    codec: JsonCodec,
    local: Peer,
}

impl<T: Transport> CoreState<T> {
    pub fn new(local: Peer, transport: T) -> Self {
        Self {
            clock: Clock::new(),
            registry: PeerRegistry::new(transport),
            lock_table: LockTable::new(),
            codec: JsonCodec,
            local,
        }
    }

    pub fn local(&self) -> &Peer {
        &self.local
    }

    /// Acquire `mode` on `resource`. Ticks the clock, registers the
    /// request, broadcasts it to every live peer, then blocks until this
    /// node's record reaches the tail of the lock table with no replies
    /// outstanding. Returns the lock id to present to `release`.
    pub fn acquire(&self, resource: &str, mode: LockMode) -> u64 {
        let timestamp = self.clock.tick();
        let pending_replies = self.registry.live_remote_count();

        let handle = self.lock_table.insert_local(
            resource.to_string(),
            mode,
            timestamp,
            self.local.id,
            pending_replies,
        );

        let request = Message::Request {
            node_name: self.local.name.clone(),
            resource: resource.to_string(),
            event: timestamp,
            mode,
            origin_id: self.local.id,
        };
        self.registry.broadcast(&self.codec.encode(&request));

        self.lock_table.wait_for_grant(handle.lock_id);
        handle.lock_id
    }

    /// Release a lock previously returned by `acquire`.
    pub fn release(&self, lock_id: u64) -> CoreResult<()> {
        let (resource, mode) = self
            .lock_table
            .release_local(lock_id, self.local.id)
            .ok_or(CoreError::NotFound(lock_id))?;

        let unlock = Message::Unlock {
            node_name: self.local.name.clone(),
            resource,
            event: self.clock.tick(),
            mode,
        };
        self.registry.broadcast(&self.codec.encode(&unlock));
        Ok(())
    }

    /// Dispatch a datagram received from `from`, already decoded into a
    /// `Message`. Any message from an address not in the peer table is
    /// logged and dropped.
    pub fn on_message(&self, from: SocketAddrV4, message: Message) {
        let sender = match self.registry.find_by_address(from) {
            Some(peer) => peer,
            None => {
                log::warn!("dropping {:?} from unknown peer {}", message, from);
                return;
            }
        };
        self.registry.refresh(sender.id);

        match message {
            Message::KeepAlive { .. } => {}

            Message::Request {
                resource,
                event,
                mode,
                origin_id,
                ..
            } => {
                self.clock.observe(event);
                self.lock_table
                    .insert_remote(resource.clone(), mode, event, origin_id);

                let reply = Message::Reply {
                    node_name: self.local.name.clone(),
                    resource,
                    event,
                    mode,
                };
                self.registry.unicast(&sender, &self.codec.encode(&reply));
            }

            Message::Reply {
                resource, event, ..
            } => {
                self.clock.observe(event);
                if !self.lock_table.on_reply(&resource, event) {
                    log::warn!(
                        "reply for ({}, {}) from {} matched no pending local request",
                        resource,
                        event,
                        sender.name
                    );
                }
            }

            Message::Unlock {
                resource, event, ..
            } => {
                self.clock.observe(event);
                if !self.lock_table.on_unlock(&resource, sender.id) {
                    log::warn!(
                        "unlock for {} from {} matched no held record",
                        resource,
                        sender.name
                    );
                }
            }
        }
    }

    pub fn encode(&self, message: &Message) -> Vec<u8> {
        self.codec.encode(message)
    }

    pub fn decode(&self, bytes: &[u8]) -> crate::error::CodecResult<Message> {
        self.codec.decode(bytes)
    }
}
