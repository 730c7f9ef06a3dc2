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

//! Synthetic lock-manager client: reads resource names from stdin in a
//! loop, acquires a concurrent-read lock on each, holds it briefly, then
//! releases it. Exercises a running `lockmeshd` cluster the way a real
//! application caller would, without any application logic of its own.

#[macro_use]
extern crate log;

use std::env::var;
use std::io::{self, BufRead, Write};
use std::net::SocketAddrV4;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lockmeshd::config::Config;
use lockmeshd::core_state::CoreState;
use lockmeshd::message::LockMode;
use lockmeshd::peer::{Peer, PeerKind};
use lockmeshd::transport::UdpTransport;
use lockmeshd::control;

const HOLD_TIME: Duration = Duration::from_secs(5);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config_loc = var("LOCKMESHD_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config: Config = toml::from_str(&std::fs::read_to_string(&config_loc)?)?;

    let local_addr: SocketAddrV4 =
        format!("{}:{}", config.local_address, config.local_port).parse()?;
    let local = Peer::new(config.local_name.clone(), local_addr, PeerKind::Local);

    let send_socket = UdpTransport::bind(local_addr)?;
    let recv_socket = send_socket.try_clone()?;

    let core = Arc::new(CoreState::new(local.clone(), send_socket));
    core.registry.add(local);
    for node in &config.nodes {
        let addr: SocketAddrV4 = format!("{}:{}", node.address, config.local_port).parse()?;
        core.registry
            .add(Peer::new(node.name.clone(), addr, PeerKind::Remote));
    }

    let heartbeat_interval = Duration::from_secs(config.heartbeat_interval_secs);
    let _heartbeat = control::spawn_heartbeat(Arc::clone(&core), heartbeat_interval);
    {
        let core = Arc::clone(&core);
        thread::spawn(move || {
            if let Err(e) = control::run_listener(&core, &recv_socket) {
                error!("loadgen listener stopped: {}", e);
            }
        });
    }

    let stdin = io::stdin();
    loop {
        print!("resource: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let resource = line.trim();
        if resource.is_empty() {
            continue;
        }

        let lock_id = core.acquire(resource, LockMode::ConcurrentRead);
        println!("entering CR section on {}", resource);
        thread::sleep(HOLD_TIME);
        println!("leaving CR section on {}", resource);
        core.release(lock_id)?;
    }

    Ok(())
}
