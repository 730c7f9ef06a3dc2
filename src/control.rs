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

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core_state::CoreState;
use crate::message::Message;
use crate::transport::{Transport, UdpTransport};

/// Spawn the background thread that broadcasts `keepalive` and ages every
/// peer's liveness once per interval. Runs for the lifetime of the process;
/// there is no clean shutdown signal, matching the daemon's own lifecycle
/// (it runs until killed).
pub fn spawn_heartbeat<T: Transport + 'static>(
    core: Arc<CoreState<T>>,
    interval: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        thread::sleep(interval);

        let keepalive = Message::KeepAlive {
            node_name: core.local().name.clone(),
        };
        core.registry.broadcast(&core.encode(&keepalive));
        core.registry.decrement_all_liveness();
    })
}

/// Blocking receive loop. Runs on the calling thread (the main thread, in
/// practice) until the socket errors out.
pub fn run_listener<T: Transport>(
    core: &Arc<CoreState<T>>,
    socket: &UdpTransport,
) -> io::Result<()> {
    let mut buf = [0u8; 65_536];

    loop {
        let (n, from) = socket.recv_from(&mut buf)?;

        let from = match from {
            SocketAddr::V4(v4) => v4,
            SocketAddr::V6(addr) => {
                log::warn!("dropping datagram from IPv6 sender {}", addr);
                continue;
            }
        };

        match core.decode(&buf[..n]) {
            Ok(message) => core.on_message(from, message),
            Err(e) => log::warn!("dropping malformed datagram from {}: {}", from, e),
        }
    }
}
