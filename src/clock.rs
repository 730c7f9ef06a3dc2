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

use std::sync::Mutex;

/// Process-wide Lamport logical clock.
///
/// Every originated event ticks the clock before it leaves the process;
/// every received event observes the clock, which never lets it decrease.
pub struct Clock {
    counter: Mutex<u64>,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            counter: Mutex::new(0),
        }
    }

    /// Current value, without advancing it.
    pub fn get(&self) -> u64 {
        *self.counter.lock().unwrap()
    }

    /// Advance for a locally originated event, return the new value.
    pub fn tick(&self) -> u64 {
        let mut cnt = self.counter.lock().unwrap();
        *cnt += 1;
        *cnt
    }

    /// Merge in a timestamp observed on an incoming message: set to
    /// max(local, incoming) then advance by one, return the new value.
    pub fn observe(&self, incoming: u64) -> u64 {
        let mut cnt = self.counter.lock().unwrap();
        if incoming > *cnt {
            *cnt = incoming;
        }
        *cnt += 1;
        *cnt
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
