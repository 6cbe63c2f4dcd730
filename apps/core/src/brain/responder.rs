//! Pattern Responder - deterministic answers straight from cached data.
//!
//! Handles the high-confidence cases (named attraction, district info, park
//! hours) without calling out to the language model. Anything else is reported
//! as [`PatternMatch::NoMatch`] so the caller can fall through to the composer.

use chrono::{Days, NaiveDate};
use tracing::debug;

use super::analyzer::QueryAnalysis;
use super::keywords::{normalize, ATTRACTION_PARKS};
use super::park_info::{district_answer, park_location_hint, title_case, to_12_hour, typical_hours};
use crate::data::cache::CacheSnapshot;
use crate::models::{Attraction, ParkData, ParkHoursEntry, ParkId};

/// Outcome of the deterministic branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternMatch {
    Matched(String),
    NoMatch,
}

impl PatternMatch {
    pub fn is_match(&self) -> bool {
        matches!(self, PatternMatch::Matched(_))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PatternResponder;

impl PatternResponder {
    pub fn new() -> Self {
        Self
    }

    /// Try to answer `text` from `snapshot`.
    ///
    /// `current` is the session's selected park. It is switched when the message
    /// names a known attraction from another park or names a park outright.
    pub fn respond(
        &self,
        text: &str,
        analysis: &QueryAnalysis,
        snapshot: &CacheSnapshot,
        today: NaiveDate,
        current: &mut ParkId,
    ) -> PatternMatch {
        let lower = normalize(text);

        // 1. Known attraction names.
        if let Some((keyword, park)) = ATTRACTION_PARKS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
        {
            let switched = *current != *park;
            if switched {
                debug!("Attraction '{}' switches park {} -> {}", keyword, current, park);
            }
            *current = *park;

            let answer = match find_attraction(snapshot.park(*park), *park, keyword) {
                Some(attraction) => describe_attraction(attraction),
                None => describe_unknown_attraction(keyword, *park, switched),
            };
            return PatternMatch::Matched(answer);
        }

        // 2. Explicit park switch, then the static districts.
        if let Some(park) = analysis.park {
            if *current != park {
                debug!("Message names park {}, switching from {}", park, current);
            }
            *current = park;
        }
        let target = *current;

        if let Some(answer) = district_answer(target, analysis.time_query) {
            return PatternMatch::Matched(answer);
        }

        // 3. Park hours. Venue-specific time questions go to the composer.
        if analysis.time_query && !analysis.location_time_query {
            return PatternMatch::Matched(describe_hours(snapshot.park(target), target, today));
        }

        PatternMatch::NoMatch
    }
}

fn find_attraction<'a>(data: &'a ParkData, park: ParkId, keyword: &str) -> Option<&'a Attraction> {
    data.attractions
        .iter()
        .find(|a| a.park == park && normalize(&a.name).contains(keyword))
}

fn describe_attraction(attraction: &Attraction) -> String {
    let park = attraction.park.display_name();
    let mut answer = if attraction.is_open {
        format!(
            "{} at {} currently has a {} minute wait.",
            attraction.name, park, attraction.wait_time
        )
    } else {
        format!("{} at {} is currently closed.", attraction.name, park)
    };

    if attraction.is_open && attraction.has_lightning_lane {
        answer.push_str(" Lightning Lane is available for this ride.");
    }
    if let Some(area) = &attraction.area {
        answer.push_str(&format!(" It's located in {}.", area));
    }
    answer
}

fn describe_unknown_attraction(keyword: &str, park: ParkId, switched: bool) -> String {
    let mut answer = format!("{} is {}.", title_case(keyword), park_location_hint(park));
    if switched {
        answer.push_str(&format!(" I've switched you to {}.", park.display_name()));
    }
    answer.push_str(" I don't have a live wait time for it right now, so ask me again in a moment for the latest.");
    answer
}

fn opening_window(entry: &ParkHoursEntry) -> Option<(String, String)> {
    if !entry.is_open {
        return None;
    }
    match (&entry.opening_time, &entry.closing_time) {
        (Some(open), Some(close)) => Some((to_12_hour(open), to_12_hour(close))),
        _ => None,
    }
}

fn describe_hours(data: &ParkData, park: ParkId, today: NaiveDate) -> String {
    let name = park.display_name();

    let Some(today_entry) = data.hours_on(today) else {
        return format!(
            "{} typically operates {}. Hours vary by season and special events, so double-check \
             today's schedule before you go.",
            name,
            typical_hours(park)
        );
    };

    let mut answer = match opening_window(today_entry) {
        Some((open, close)) => format!("{} is open today from {} to {}.", name, open, close),
        None if today_entry.is_open => format!(
            "{} is open today, but I don't have exact times yet. It typically operates {}.",
            name,
            typical_hours(park)
        ),
        None => format!("{} is closed today.", name),
    };

    let tomorrow = today.checked_add_days(Days::new(1));
    if let Some(entry) = tomorrow.and_then(|date| data.hours_on(date)) {
        match opening_window(entry) {
            Some((open, close)) => {
                answer.push_str(&format!(" Tomorrow it's open {} to {}.", open, close))
            }
            None if !entry.is_open => answer.push_str(" It's closed tomorrow."),
            None => {}
        }
    }
    answer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_unknown_attraction_without_switch() {
        let text = describe_unknown_attraction("test track", ParkId::Epcot, false);
        assert!(text.starts_with("Test Track is at EPCOT."));
        assert!(!text.contains("switched"));
    }

    #[test]
    fn test_closed_attraction_has_no_lightning_lane_line() {
        let attraction = Attraction {
            id: "tot".to_string(),
            name: "Tower of Terror".to_string(),
            wait_time: 0,
            is_open: false,
            has_lightning_lane: true,
            park: ParkId::HollywoodStudios,
            area: Some("Sunset Boulevard".to_string()),
        };
        let text = describe_attraction(&attraction);
        assert!(text.contains("is currently closed"));
        assert!(!text.contains("Lightning Lane"));
        assert!(text.contains("Sunset Boulevard"));
    }

    #[test]
    fn test_hours_with_tomorrow() {
        let data = ParkData {
            hours: vec![
                ParkHoursEntry {
                    date: today(),
                    opening_time: Some("08:00".to_string()),
                    closing_time: Some("22:00".to_string()),
                    is_open: true,
                },
                ParkHoursEntry {
                    date: today().succ_opt().unwrap(),
                    opening_time: None,
                    closing_time: None,
                    is_open: false,
                },
            ],
            ..ParkData::default()
        };
        let text = describe_hours(&data, ParkId::MagicKingdom, today());
        assert!(text.contains("from 8:00 AM to 10:00 PM"));
        assert!(text.contains("closed tomorrow"));
    }

    #[test]
    fn test_open_without_times_uses_typical() {
        let data = ParkData {
            hours: vec![ParkHoursEntry {
                date: today(),
                opening_time: Some("09:00".to_string()),
                closing_time: None,
                is_open: true,
            }],
            ..ParkData::default()
        };
        let text = describe_hours(&data, ParkId::AnimalKingdom, today());
        assert!(text.contains("8:00 AM - 7:00 PM"));
    }
}
