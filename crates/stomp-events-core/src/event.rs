//! Game event record and its wire-body form.
//!
//! The wire body is line oriented:
//!
//! ```text
//! user: <username>
//! team a: <name>
//! team b: <name>
//! event name: <name>
//! time: <integer>
//! general game updates:
//! <key>:<value>
//! team a updates:
//! <key>:<value>
//! team b updates:
//! <key>:<value>
//! description:
//! <free text to end of body>
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Update mapping. Ordered so serialization is deterministic.
///
/// Only entries accepted by [`is_wire_safe_update`] come back unchanged from
/// the wire body: a key may not contain `:` or a newline, a value may not
/// contain a newline, and `key:value` may not read as a section header.
pub type Updates = BTreeMap<String, String>;

const FIELD_USER: &str = "user";
const FIELD_TEAM_A: &str = "team a";
const FIELD_TEAM_B: &str = "team b";
const FIELD_EVENT_NAME: &str = "event name";
const FIELD_TIME: &str = "time";

const SECTION_GENERAL: &str = "general game updates:";
const SECTION_TEAM_A: &str = "team a updates:";
const SECTION_TEAM_B: &str = "team b updates:";
const SECTION_DESCRIPTION: &str = "description:";

/// Wire-body parse error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventParseError {
    #[error("Invalid event time: {0:?}")]
    InvalidTime(String),
}

/// One structured game-update record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub team_a: String,
    pub team_b: String,
    pub name: String,
    pub time: u64,
    pub general_updates: Updates,
    pub team_a_updates: Updates,
    pub team_b_updates: Updates,
    pub description: String,
}

impl Event {
    /// Channel the event belongs to: `teamA_teamB`.
    #[must_use]
    pub fn channel(&self) -> String {
        channel_name(&self.team_a, &self.team_b)
    }

    /// Render the wire body published on behalf of `user`.
    #[must_use]
    pub fn to_wire_body(&self, user: &str) -> String {
        let mut body = String::new();
        push_field(&mut body, FIELD_USER, user);
        push_field(&mut body, FIELD_TEAM_A, &self.team_a);
        push_field(&mut body, FIELD_TEAM_B, &self.team_b);
        push_field(&mut body, FIELD_EVENT_NAME, &self.name);
        push_field(&mut body, FIELD_TIME, &self.time.to_string());
        push_section(&mut body, SECTION_GENERAL, &self.general_updates);
        push_section(&mut body, SECTION_TEAM_A, &self.team_a_updates);
        push_section(&mut body, SECTION_TEAM_B, &self.team_b_updates);
        body.push_str(SECTION_DESCRIPTION);
        body.push('\n');
        body.push_str(&self.description);
        body.push('\n');
        body
    }

    /// Parse a wire body. The `user:` line is recognized and discarded.
    ///
    /// # Errors
    /// Returns error if the `time:` field is not a non-negative integer.
    pub fn from_wire_body(body: &str) -> Result<Self, EventParseError> {
        WireBody::parse(body).map(|wire| wire.event)
    }
}

/// Whether the update line `key:value` parses back to the same entry.
#[must_use]
pub fn is_wire_safe_update(key: &str, value: &str) -> bool {
    if key.contains([':', '\n']) || value.contains('\n') {
        return false;
    }
    Section::from_header(&format!("{key}:{value}")).is_none()
}

/// Channel name for a pair of teams.
#[must_use]
pub fn channel_name(team_a: &str, team_b: &str) -> String {
    format!("{team_a}_{team_b}")
}

fn push_field(body: &mut String, field: &str, value: &str) {
    body.push_str(field);
    body.push_str(": ");
    body.push_str(value);
    body.push('\n');
}

fn push_section(body: &mut String, header: &str, updates: &Updates) {
    body.push_str(header);
    body.push('\n');
    for (key, value) in updates {
        body.push_str(key);
        body.push(':');
        body.push_str(value);
        body.push('\n');
    }
}

/// A parsed wire body together with the sender it names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireBody {
    /// Value of the `user:` line, if present.
    pub user: Option<String>,
    pub event: Event,
}

/// Parser position within the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Before any section header: `field: value` lines.
    None,
    GeneralUpdates,
    TeamAUpdates,
    TeamBUpdates,
    /// Terminal: absorbs the rest of the body.
    Description,
}

impl Section {
    fn from_header(line: &str) -> Option<Self> {
        match line {
            SECTION_GENERAL => Some(Self::GeneralUpdates),
            SECTION_TEAM_A => Some(Self::TeamAUpdates),
            SECTION_TEAM_B => Some(Self::TeamBUpdates),
            SECTION_DESCRIPTION => Some(Self::Description),
            _ => None,
        }
    }
}

impl WireBody {
    /// Parse a wire body.
    ///
    /// Lines that match no field and no section are skipped.
    ///
    /// # Errors
    /// Returns error if the `time:` field is not a non-negative integer.
    pub fn parse(body: &str) -> Result<Self, EventParseError> {
        let mut wire = Self::default();
        let mut section = Section::None;
        let mut rest = body;

        while !rest.is_empty() {
            let (line, after) = rest.split_once('\n').unwrap_or((rest, ""));
            rest = after;
            if line.is_empty() {
                continue;
            }

            if section == Section::None {
                if let Some((field, value)) = line.split_once(": ") {
                    wire.set_field(field, value)?;
                    continue;
                }
            }

            if let Some(next) = Section::from_header(line) {
                section = next;
                if section == Section::Description {
                    let description = rest.strip_suffix('\n').unwrap_or(rest);
                    wire.event.description = description.to_string();
                    break;
                }
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let updates = match section {
                Section::GeneralUpdates => &mut wire.event.general_updates,
                Section::TeamAUpdates => &mut wire.event.team_a_updates,
                Section::TeamBUpdates => &mut wire.event.team_b_updates,
                Section::None | Section::Description => continue,
            };
            updates.insert(key.to_string(), value.to_string());
        }

        Ok(wire)
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), EventParseError> {
        match field {
            FIELD_USER => self.user = Some(value.to_string()),
            FIELD_TEAM_A => self.event.team_a = value.to_string(),
            FIELD_TEAM_B => self.event.team_b = value.to_string(),
            FIELD_EVENT_NAME => self.event.name = value.to_string(),
            FIELD_TIME => {
                self.event.time = value
                    .trim()
                    .parse()
                    .map_err(|_| EventParseError::InvalidTime(value.to_string()))?;
            }
            _ => {}
        }
        Ok(())
    }
}
