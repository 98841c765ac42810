//! Game summary report rendering.

use std::fmt::Write as _;

use crate::event::{Event, Updates};

/// Merge each update mapping across `events`; later events overwrite earlier values.
#[must_use]
pub fn merge_updates<'a>(
    events: impl IntoIterator<Item = &'a Event>,
) -> (Updates, Updates, Updates) {
    let mut general = Updates::new();
    let mut team_a = Updates::new();
    let mut team_b = Updates::new();
    for event in events {
        general.extend(event.general_updates.clone());
        team_a.extend(event.team_a_updates.clone());
        team_b.extend(event.team_b_updates.clone());
    }
    (general, team_a, team_b)
}

/// Render the summary for one user's events in one channel.
///
/// `events` is in log order. Stats are merged along that order with sorted
/// keys, and the team header comes from the first logged event. Event blocks
/// are printed by ascending time (stable on ties). Returns an empty string
/// when there are no events.
#[must_use]
pub fn render_summary(events: &[Event]) -> String {
    let Some(first) = events.first() else {
        return String::new();
    };
    let (general, team_a, team_b) = merge_updates(events);

    let mut ordered: Vec<&Event> = events.iter().collect();
    ordered.sort_by_key(|event| event.time);

    let mut out = String::new();
    let _ = writeln!(out, "{} vs {}", first.team_a, first.team_b);
    out.push_str("Game stats:\n");
    write_stats(&mut out, "General", &general);
    write_stats(&mut out, &first.team_a, &team_a);
    write_stats(&mut out, &first.team_b, &team_b);

    out.push_str("Game event reports:\n");
    for event in ordered {
        let _ = write!(
            out,
            "{} - {}:\n\n{}\n\n\n",
            event.time, event.name, event.description
        );
    }
    out
}

fn write_stats(out: &mut String, title: &str, stats: &Updates) {
    let _ = writeln!(out, "{title} stats:");
    for (key, value) in stats {
        let _ = writeln!(out, "{key}: {value}");
    }
}
