//! Rendered message content: embed layouts and the user-visible strings.
//!
//! The survey side is English, the result side German ("KW" is
//! Kalenderwoche, calendar week). Both sets of strings live here only.

use crate::{
    messaging::types::{EmbedField, OutgoingEmbed},
    tally::ResultPayload,
    week::DayInfo,
};

/// Accent colour for all embeds.
pub const EMBED_COLOUR: u32 = 0x0099FF;

/// Reaction markers for voting, index-aligned with day index 0-6.
pub const DAY_MARKERS: [&str; 7] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣"];

/// Result messages are recognized during channel cleanup by this word in
/// their embed title. Rendering and matching both live here so the title
/// format and the cleanup predicate cannot drift apart.
pub const RESULT_TITLE_MARKER: &str = "Ergebnis";

pub fn survey_title(week: u32) -> String {
    format!("KW {week}")
}

pub fn result_title(week: u32) -> String {
    format!("{RESULT_TITLE_MARKER}: KW {week}")
}

/// The weekly poll: one field per weekday, each tagged with the reaction
/// marker that casts a vote for it.
pub fn survey_embed(week: u32, days: &[DayInfo]) -> OutgoingEmbed {
    let range = match (days.first(), days.last()) {
        (Some(first), Some(last)) => format!("{} - {}", first.date_label(), last.date_label()),
        _ => String::new(),
    };

    let fields = DAY_MARKERS
        .iter()
        .zip(days)
        .map(|(marker, day)| EmbedField {
            name: format!("{marker} {}", day.label),
            value: "React to this message if you are available".to_string(),
            inline: true,
        })
        .collect();

    OutgoingEmbed {
        title: survey_title(week),
        description: format!(
            "Please react to indicate which days you are available next week {range}:"
        ),
        colour: EMBED_COLOUR,
        fields,
    }
}

/// The result summary, or the "no consensus yet" variant when the payload
/// carries no entries.
pub fn result_embed(payload: &ResultPayload) -> OutgoingEmbed {
    let description = if payload.entries.is_empty() {
        "Noch keine Einigung, es fehlen Stimmen.".to_string()
    } else {
        "Mögliche Termine:".to_string()
    };

    let fields = payload
        .entries
        .iter()
        .map(|e| EmbedField {
            name: e.label.clone(),
            value: e.date.clone(),
            inline: false,
        })
        .collect();

    OutgoingEmbed {
        title: payload.title.clone(),
        description,
        colour: EMBED_COLOUR,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::week::days_of_week;
    use chrono::NaiveDate;

    #[test]
    fn survey_embed_has_one_marked_field_per_weekday() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
        let days = days_of_week(14, today).unwrap();
        let embed = survey_embed(14, &days);

        assert_eq!(embed.title, "KW 14");
        assert_eq!(embed.fields.len(), 7);
        assert_eq!(embed.fields[0].name, "1️⃣ Monday");
        assert_eq!(embed.fields[6].name, "7️⃣ Sunday");
        assert!(embed.description.contains("31.03.2025 - 06.04.2025"));
    }

    #[test]
    fn result_title_carries_the_cleanup_marker() {
        assert!(result_title(14).contains(RESULT_TITLE_MARKER));
        assert_eq!(result_title(14), "Ergebnis: KW 14");
    }

    #[test]
    fn empty_payload_renders_the_no_consensus_variant() {
        let payload = ResultPayload {
            week: 14,
            title: result_title(14),
            entries: Vec::new(),
        };
        let embed = result_embed(&payload);
        assert!(embed.fields.is_empty());
        assert!(embed.description.contains("Noch keine Einigung"));
    }
}
