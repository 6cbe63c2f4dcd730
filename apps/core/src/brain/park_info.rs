//! Static park facts and clock formatting used by the pattern responder.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::ParkId;

// NOTE: expect() is acceptable here, the pattern is a compile-time constant.
static CLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|T|\s)(\d{1,2}):(\d{2})").expect("Invalid regex: clock time pattern")
});

/// Formats "09:00", "21:30" or an ISO date-time as a 12-hour clock string.
///
/// Strings without a recognizable `HH:MM` are returned unchanged.
pub fn to_12_hour(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    if lower.ends_with("am") || lower.ends_with("pm") {
        return trimmed.to_string();
    }
    let Some(caps) = CLOCK_PATTERN.captures(trimmed) else {
        return trimmed.to_string();
    };
    let (Ok(hour), Ok(minute)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
        return trimmed.to_string();
    };
    if hour > 23 || minute > 59 {
        return trimmed.to_string();
    }

    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, suffix)
}

/// Usual operating window per data park, used when no schedule is cached.
pub fn typical_hours(park: ParkId) -> &'static str {
    match park {
        ParkId::MagicKingdom => "9:00 AM - 10:00 PM",
        ParkId::Epcot => "9:00 AM - 9:00 PM",
        ParkId::HollywoodStudios => "9:00 AM - 9:00 PM",
        ParkId::AnimalKingdom => "8:00 AM - 7:00 PM",
        ParkId::DisneySprings => "10:00 AM - 11:00 PM",
        ParkId::Resorts => "24 hours",
    }
}

/// Static answer for the non-ride districts. `None` for theme parks.
pub fn district_answer(park: ParkId, time_query: bool) -> Option<String> {
    let text = match (park, time_query) {
        (ParkId::DisneySprings, true) => {
            "Disney Springs shops are generally open 10:00 AM - 11:00 PM, and many restaurants \
             and lounges stay open later. There's no park ticket needed, and parking is free."
        }
        (ParkId::DisneySprings, false) => {
            "Disney Springs is the shopping, dining and entertainment district. It's split into \
             the Marketplace, The Landing, Town Center and West Side, with spots like World of \
             Disney, the Aerophile balloon and plenty of table-service restaurants. No park ticket \
             is needed."
        }
        (ParkId::Resorts, true) => {
            "Resort lobbies and front desks are open 24 hours. Pools usually run from about \
             9:00 AM to 10:00 PM, and quick-service food courts typically open around 6:30 AM. \
             Check-in is usually 3:00 PM and check-out 11:00 AM."
        }
        (ParkId::Resorts, false) => {
            "The Disney Resort hotels are grouped into Value, Moderate and Deluxe tiers. Guests \
             get Early Theme Park Entry, free transportation by bus, Skyliner, monorail or boat \
             depending on the resort, and can book dining and Lightning Lane in advance."
        }
        _ => return None,
    };
    Some(text.to_string())
}

/// Where a known attraction sits, for answers without live data.
pub fn park_location_hint(park: ParkId) -> &'static str {
    match park {
        ParkId::MagicKingdom => "at Magic Kingdom",
        ParkId::Epcot => "at EPCOT",
        ParkId::HollywoodStudios => "at Hollywood Studios",
        ParkId::AnimalKingdom => "at Animal Kingdom",
        ParkId::DisneySprings => "in Disney Springs",
        ParkId::Resorts => "at the resorts",
    }
}

/// Title-cases a lower-case keyword for display ("space mountain" -> "Space Mountain").
pub fn title_case(keyword: &str) -> String {
    keyword
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
