//! Change notifications pushed by the note service.
use crate::note::{Note, NoteID, NoteRef};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// A push channel of the note service.
///
/// There is one channel per kind of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Created,
    Updated,
    Deleted,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Created, Channel::Updated, Channel::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Created => "created",
            Channel::Updated => "updated",
            Channel::Deleted => "deleted",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Channel::Created),
            "updated" => Ok(Channel::Updated),
            "deleted" => Ok(Channel::Deleted),
            other => Err(format!("unknown channel `{}`", other)),
        }
    }
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteEvent {
    Created(Note),
    Updated(Note),
    Deleted(NoteRef),
}

impl NoteEvent {
    pub fn channel(&self) -> Channel {
        match self {
            NoteEvent::Created(_) => Channel::Created,
            NoteEvent::Updated(_) => Channel::Updated,
            NoteEvent::Deleted(_) => Channel::Deleted,
        }
    }

    pub fn id(&self) -> &NoteID {
        match self {
            NoteEvent::Created(note) | NoteEvent::Updated(note) => &note.id,
            NoteEvent::Deleted(note_ref) => &note_ref.id,
        }
    }

    /// Encode the payload carried on the event's channel.
    ///
    /// Created and updated events carry `{id, text}`, deleted events carry `{id}`.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        match self {
            NoteEvent::Created(note) | NoteEvent::Updated(note) => serde_json::to_string(note),
            NoteEvent::Deleted(note_ref) => serde_json::to_string(note_ref),
        }
    }

    /// Decode a payload received on `channel`.
    pub fn from_payload(channel: Channel, payload: &str) -> Result<Self, serde_json::Error> {
        Ok(match channel {
            Channel::Created => NoteEvent::Created(serde_json::from_str(payload)?),
            Channel::Updated => NoteEvent::Updated(serde_json::from_str(payload)?),
            Channel::Deleted => NoteEvent::Deleted(serde_json::from_str(payload)?),
        })
    }
}
