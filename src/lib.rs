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

//! Coordination engine for a peer-to-peer distributed lock manager.
//!
//! The `lockmeshd` binary wires this engine to a real UDP socket and a
//! TOML config file; `lockmesh-loadgen` drives it synthetically for
//! exercising a running cluster. Both live on top of the same library.

pub mod clock;
pub mod config;
pub mod control;
pub mod core_state;
pub mod error;
pub mod lock_table;
pub mod message;
pub mod peer;
pub mod registry;
pub mod transport;
