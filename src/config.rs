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

use serde::Deserialize;

use crate::peer::MAX_NAME_LEN;

/// Heartbeat interval used when the descriptor doesn't specify one,
/// matching the original daemon's hardcoded 300 seconds.
fn default_heartbeat_interval_secs() -> u64 {
    300
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub local_name: String,

    pub local_address: String,

    pub local_port: u16,

    pub nodes: Vec<NodeConfig>,

    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
}

#[derive(Deserialize, Debug)]
pub struct NodeConfig {
    pub name: String,

    pub address: String,

    /// Accepted for fidelity to the original descriptor. Unused beyond
    /// being carried around: the numeric peer id is derived from `address`
    /// alone.
    #[serde(default)]
    pub netmask: Option<String>,
}

impl Config {
    pub fn validate_names(&self) -> Result<(), (String, usize)> {
        if self.local_name.len() > MAX_NAME_LEN {
            return Err((self.local_name.clone(), MAX_NAME_LEN));
        }
        for node in &self.nodes {
            if node.name.len() > MAX_NAME_LEN {
                return Err((node.name.clone(), MAX_NAME_LEN));
            }
        }
        Ok(())
    }
}
