//! Append-only log of received and published events.

use std::collections::HashMap;

use stomp_events_core::Event;

/// Events grouped by channel, then by sender, in arrival order.
///
/// Entries are never mutated or removed; the log lives as long as the
/// session.
#[derive(Debug, Default)]
pub struct EventLog {
    channels: HashMap<String, HashMap<String, Vec<Event>>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` to the `(channel, sender)` bucket.
    pub fn append(&mut self, channel: &str, sender: &str, event: Event) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .entry(sender.to_string())
            .or_default()
            .push(event);
    }

    /// Events logged for `(channel, sender)`, oldest first.
    #[must_use]
    pub fn events(&self, channel: &str, sender: &str) -> &[Event] {
        self.channels
            .get(channel)
            .and_then(|senders| senders.get(sender))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Event {
        Event {
            name: name.to_string(),
            ..Event::default()
        }
    }

    #[test]
    fn test_buckets_are_independent() {
        let mut log = EventLog::new();
        log.append("a_b", "alice", named("kickoff"));
        log.append("a_b", "bob", named("foul"));
        log.append("a_b", "alice", named("goal"));
        log.append("c_d", "alice", named("kickoff"));

        let names: Vec<&str> = log
            .events("a_b", "alice")
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, ["kickoff", "goal"]);
        assert_eq!(log.events("a_b", "bob").len(), 1);
        assert_eq!(log.events("c_d", "alice").len(), 1);
        assert!(log.events("c_d", "bob").is_empty());
    }

    #[test]
    fn test_unknown_bucket_is_empty() {
        let log = EventLog::new();
        assert!(log.events("x_y", "nobody").is_empty());
    }
}
