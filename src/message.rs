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

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Lock mode requested or held against a resource.
///
/// Only concurrent-read/concurrent-read is treated as compatible; every
/// other pairing (including protected-read/protected-read) is incompatible,
/// matching the original implementation's actual behavior rather than its
/// aspirational mode set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LockMode {
    Null = 1 << 0,
    ConcurrentRead = 1 << 1,
    ConcurrentWrite = 1 << 2,
    ProtectedRead = 1 << 3,
    ProtectedWrite = 1 << 4,
    Exclusive = 1 << 5,
}

impl LockMode {
    pub fn from_flags(flags: u32) -> CodecResult<Self> {
        match flags {
            x if x == LockMode::Null as u32 => Ok(LockMode::Null),
            x if x == LockMode::ConcurrentRead as u32 => Ok(LockMode::ConcurrentRead),
            x if x == LockMode::ConcurrentWrite as u32 => Ok(LockMode::ConcurrentWrite),
            x if x == LockMode::ProtectedRead as u32 => Ok(LockMode::ProtectedRead),
            x if x == LockMode::ProtectedWrite as u32 => Ok(LockMode::ProtectedWrite),
            x if x == LockMode::Exclusive as u32 => Ok(LockMode::Exclusive),
            other => Err(CodecError::UnknownMode(other)),
        }
    }

    /// Two requests for the same resource in these modes may share one
    /// lock record instead of serializing against each other.
    pub fn compatible_with(self, other: LockMode) -> bool {
        matches!(
            (self, other),
            (LockMode::ConcurrentRead, LockMode::ConcurrentRead)
        )
    }
}

/// The four message kinds exchanged between peers, carrying exactly the
/// fields the logical schema requires for that kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    KeepAlive {
        node_name: String,
    },
    Request {
        node_name: String,
        resource: String,
        event: u64,
        mode: LockMode,
        origin_id: u32,
    },
    Reply {
        node_name: String,
        resource: String,
        event: u64,
        mode: LockMode,
    },
    Unlock {
        node_name: String,
        resource: String,
        event: u64,
        mode: LockMode,
    },
}

impl Message {
    pub fn node_name(&self) -> &str {
        match self {
            Message::KeepAlive { node_name }
            | Message::Request { node_name, .. }
            | Message::Reply { node_name, .. }
            | Message::Unlock { node_name, .. } => node_name,
        }
    }
}

/// The wire-level document this particular codec encodes `Message` into.
/// Mirrors the field names of the logical schema (`type`, `node_name`,
/// `resource`, `event`, `flags`, `id`) so a captured datagram reads exactly
/// like the schema table in the spec.
#[derive(Serialize, Deserialize)]
struct Document {
    #[serde(rename = "type")]
    kind: String,
    node_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u32>,
}

/// Abstracts the byte-level wire representation away from the logical
/// `Message` schema, so the engine never needs to know how a message is
/// actually serialized.
pub trait Codec {
    fn encode(&self, message: &Message) -> Vec<u8>;
    fn decode(&self, bytes: &[u8]) -> CodecResult<Message>;
}

/// Self-describing JSON-object wire encoding, one object per datagram.
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, message: &Message) -> Vec<u8> {
        let doc = match message {
            Message::KeepAlive { node_name } => Document {
                kind: "keepalive".to_string(),
                node_name: node_name.clone(),
                resource: None,
                event: None,
                flags: None,
                id: None,
            },
            Message::Request {
                node_name,
                resource,
                event,
                mode,
                origin_id,
            } => Document {
                kind: "request".to_string(),
                node_name: node_name.clone(),
                resource: Some(resource.clone()),
                event: Some(*event),
                flags: Some(*mode as u32),
                id: Some(*origin_id),
            },
            Message::Reply {
                node_name,
                resource,
                event,
                mode,
            } => Document {
                kind: "request_reply".to_string(),
                node_name: node_name.clone(),
                resource: Some(resource.clone()),
                event: Some(*event),
                flags: Some(*mode as u32),
                id: None,
            },
            Message::Unlock {
                node_name,
                resource,
                event,
                mode,
            } => Document {
                kind: "unlock".to_string(),
                node_name: node_name.clone(),
                resource: Some(resource.clone()),
                event: Some(*event),
                flags: Some(*mode as u32),
                id: None,
            },
        };

        serde_json::to_vec(&doc).expect("Document serialization is infallible")
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Message> {
        let doc: Document = serde_json::from_slice(bytes)?;

        let resource = || doc.resource.clone().ok_or(CodecError::MissingField("resource"));
        let event = || doc.event.ok_or(CodecError::MissingField("event"));
        let mode = || {
            doc.flags
                .ok_or(CodecError::MissingField("flags"))
                .and_then(LockMode::from_flags)
        };

        match doc.kind.as_str() {
            "keepalive" => Ok(Message::KeepAlive {
                node_name: doc.node_name,
            }),
            "request" => Ok(Message::Request {
                node_name: doc.node_name,
                resource: resource()?,
                event: event()?,
                mode: mode()?,
                origin_id: doc.id.ok_or(CodecError::MissingField("id"))?,
            }),
            "request_reply" => Ok(Message::Reply {
                node_name: doc.node_name,
                resource: resource()?,
                event: event()?,
                mode: mode()?,
            }),
            "unlock" => Ok(Message::Unlock {
                node_name: doc.node_name,
                resource: resource()?,
                event: event()?,
                mode: mode()?,
            }),
            other => Err(CodecError::UnknownType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> JsonCodec {
        JsonCodec
    }

    #[test]
    fn round_trips_keepalive() {
        let msg = Message::KeepAlive {
            node_name: "a".into(),
        };
        let bytes = codec().encode(&msg);
        assert_eq!(codec().decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn round_trips_request() {
        let msg = Message::Request {
            node_name: "a".into(),
            resource: "R".into(),
            event: 5,
            mode: LockMode::Exclusive,
            origin_id: 10,
        };
        let bytes = codec().encode(&msg);
        assert_eq!(codec().decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn round_trips_reply_and_unlock() {
        let reply = Message::Reply {
            node_name: "b".into(),
            resource: "R".into(),
            event: 5,
            mode: LockMode::Exclusive,
        };
        assert_eq!(codec().decode(&codec().encode(&reply)).unwrap(), reply);

        let unlock = Message::Unlock {
            node_name: "b".into(),
            resource: "R".into(),
            event: 6,
            mode: LockMode::Exclusive,
        };
        assert_eq!(codec().decode(&codec().encode(&unlock)).unwrap(), unlock);
    }

    #[test]
    fn rejects_unknown_type() {
        let bytes = br#"{"type":"bogus","node_name":"a"}"#;
        assert!(matches!(
            codec().decode(bytes),
            Err(CodecError::UnknownType(_))
        ));
    }

    #[test]
    fn rejects_request_missing_resource() {
        let bytes = br#"{"type":"request","node_name":"a","event":1,"flags":2,"id":1}"#;
        assert!(matches!(
            codec().decode(bytes),
            Err(CodecError::MissingField("resource"))
        ));
    }

    #[test]
    fn rejects_truncated_json() {
        let bytes = b"{not json";
        assert!(matches!(codec().decode(bytes), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn rejects_unknown_mode() {
        let bytes = br#"{"type":"request","node_name":"a","resource":"R","event":1,"flags":9999,"id":1}"#;
        assert!(matches!(
            codec().decode(bytes),
            Err(CodecError::UnknownMode(9999))
        ));
    }
}
