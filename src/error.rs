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

use thiserror::Error;

/// Fatal at startup: a malformed or incomplete configuration descriptor.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid local address {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    #[error("node name {0:?} exceeds the {1}-byte name limit")]
    NameTooLong(String, usize),
}

/// Errors surfaced by the coordination engine at runtime.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unable to bind listener socket: {0}")]
    Bind(#[from] std::io::Error),

    #[error("no lock held with id {0}")]
    NotFound(u64),
}

/// Errors from decoding a datagram into a logical [`crate::message::Message`].
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed message payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message is missing required field {0:?} for its kind")]
    MissingField(&'static str),

    #[error("unrecognized message type {0:?}")]
    UnknownType(String),

    #[error("unrecognized lock mode {0}")]
    UnknownMode(u32),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type CoreResult<T> = std::result::Result<T, CoreError>;
pub type CodecResult<T> = std::result::Result<T, CodecError>;
