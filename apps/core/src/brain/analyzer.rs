//! Query Analyzer - classifies a user question into intent flags.
//!
//! Pure keyword matching over the tables in [`super::keywords`]. Flags are
//! independent: a single message can be both an entertainment and a character
//! question. The location-specific flags are computed on their own and callers
//! must consult them before the general flag they refine.

use serde::{Deserialize, Serialize};

use super::keywords::{
    contains_any, contains_word, normalize, ATTRACTION_KEYWORDS, CHARACTER_EXCLUSIONS, CHARACTER_KEYWORDS,
    CHARACTER_VENUE_KEYWORDS, CROSS_PARK_KEYWORDS, ENTERTAINMENT_KEYWORDS, FIREWORKS_KEYWORDS,
    PARADE_KEYWORDS, PARK_KEYWORDS, SHOW_KEYWORDS, SUB_VENUE_KEYWORDS, TIME_KEYWORDS,
};
use crate::models::ParkId;

/// Fixed-shape classification of one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    /// Asks about opening/closing times.
    pub time_query: bool,
    /// Time question about a parade, show, restaurant or other sub-venue.
    pub location_time_query: bool,
    pub character_query: bool,
    /// Names a specific character meet venue.
    pub character_location_query: bool,
    pub entertainment_query: bool,
    pub fireworks_query: bool,
    pub show_query: bool,
    pub parade_query: bool,
    pub attraction_query: bool,
    pub cross_park_query: bool,
    /// Park named in the message, if any.
    pub park: Option<ParkId>,
}

impl QueryAnalysis {
    /// Short flag summary for logging
    pub fn summary(&self) -> String {
        let flags = [
            ("time", self.time_query),
            ("location_time", self.location_time_query),
            ("character", self.character_query),
            ("character_location", self.character_location_query),
            ("entertainment", self.entertainment_query),
            ("fireworks", self.fireworks_query),
            ("show", self.show_query),
            ("parade", self.parade_query),
            ("attraction", self.attraction_query),
            ("cross_park", self.cross_park_query),
        ];
        let set: Vec<&str> = flags
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| *name)
            .collect();
        format!(
            "flags=[{}] park={}",
            set.join(","),
            self.park.map(|p| p.as_str()).unwrap_or("none")
        )
    }
}

/// Stateless classifier over the static keyword tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryAnalyzer;

impl QueryAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Classify a raw message. Never fails; empty input yields the default record.
    pub fn analyze(&self, text: &str) -> QueryAnalysis {
        let text = normalize(text);
        if text.is_empty() {
            return QueryAnalysis::default();
        }

        let time_query = contains_any(&text, TIME_KEYWORDS);

        QueryAnalysis {
            time_query,
            location_time_query: time_query && contains_any(&text, SUB_VENUE_KEYWORDS),
            character_query: Self::mentions_character(&text),
            character_location_query: contains_any(&text, CHARACTER_VENUE_KEYWORDS),
            entertainment_query: contains_any(&text, ENTERTAINMENT_KEYWORDS),
            fireworks_query: contains_any(&text, FIREWORKS_KEYWORDS),
            show_query: contains_any(&text, SHOW_KEYWORDS),
            parade_query: contains_any(&text, PARADE_KEYWORDS),
            attraction_query: contains_any(&text, ATTRACTION_KEYWORDS),
            cross_park_query: contains_any(&text, CROSS_PARK_KEYWORDS),
            park: Self::resolve_park(&text),
        }
    }

    /// First park keyword found in table order. Expects lower-cased text.
    pub fn resolve_park(text: &str) -> Option<ParkId> {
        PARK_KEYWORDS
            .iter()
            .find(|(keyword, _, whole_word)| {
                if *whole_word {
                    contains_word(text, keyword)
                } else {
                    text.contains(keyword)
                }
            })
            .map(|(_, park, _)| *park)
    }

    fn mentions_character(text: &str) -> bool {
        // Ride and landmark names like "cinderella castle" don't count.
        let mut stripped = text.to_string();
        for phrase in CHARACTER_EXCLUSIONS {
            if stripped.contains(phrase) {
                stripped = stripped.replace(phrase, " ");
            }
        }
        contains_any(&stripped, CHARACTER_KEYWORDS)
    }
}
