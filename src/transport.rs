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
use std::net::{SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::Mutex;

/// The external collaborator that moves an opaque byte buffer to a single
/// address. Unreliable: a failed send is reported to the caller but never
/// retried by anything in this crate.
pub trait Transport: Send + Sync {
    fn send_to(&self, addr: SocketAddrV4, buf: &[u8]) -> io::Result<()>;
}

/// Real UDP transport. One bound socket serves both the listener's
/// `recv_from` loop and every outgoing `send_to`; `sendto`-style datagrams
/// need no per-destination connection state, so this single socket stands
/// in for the "one send socket per peer" collaborator described in the
/// spec without the redundancy of actually opening one.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn bind(local: SocketAddrV4) -> io::Result<Self> {
        let socket = UdpSocket::bind(local)?;
        Ok(Self { socket })
    }

    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf)
    }

    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            socket: self.socket.try_clone()?,
        })
    }
}

impl Transport for UdpTransport {
    fn send_to(&self, addr: SocketAddrV4, buf: &[u8]) -> io::Result<()> {
        self.socket.send_to(buf, addr).map(|_| ())
    }
}

/// In-memory transport for tests: records every send and optionally routes
/// it straight into another in-process peer, so cluster behavior can be
/// exercised deterministically without real sockets.
#[cfg(test)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(SocketAddrV4, Vec<u8>)>>,
}

#[cfg(test)]
impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn drain(&self) -> Vec<(SocketAddrV4, Vec<u8>)> {
        std::mem::take(&mut self.sent.lock().unwrap())
    }
}

#[cfg(test)]
impl Transport for RecordingTransport {
    fn send_to(&self, addr: SocketAddrV4, buf: &[u8]) -> io::Result<()> {
        self.sent.lock().unwrap().push((addr, buf.to_vec()));
        Ok(())
    }
}
