//! Keyword tables driving query classification.
//!
//! All entries are lower-case. Order matters wherever a table is scanned for
//! the first hit (park names, attraction names).

use crate::models::ParkId;

/// Park names and abbreviations, scanned in order; the first hit wins.
/// Entries flagged `true` are short abbreviations that must match a whole word.
pub const PARK_KEYWORDS: &[(&str, ParkId, bool)] = &[
    ("magic kingdom", ParkId::MagicKingdom, false),
    ("mk", ParkId::MagicKingdom, true),
    ("epcot", ParkId::Epcot, false),
    ("hollywood studios", ParkId::HollywoodStudios, false),
    ("dhs", ParkId::HollywoodStudios, true),
    ("hs", ParkId::HollywoodStudios, true),
    ("animal kingdom", ParkId::AnimalKingdom, false),
    ("dak", ParkId::AnimalKingdom, true),
    ("ak", ParkId::AnimalKingdom, true),
    ("disney springs", ParkId::DisneySprings, false),
    ("springs", ParkId::DisneySprings, false),
    ("resort", ParkId::Resorts, false),
    ("hotel", ParkId::Resorts, false),
];

/// Known attraction names and the park that owns them, scanned in order.
pub const ATTRACTION_PARKS: &[(&str, ParkId)] = &[
    // Magic Kingdom
    ("space mountain", ParkId::MagicKingdom),
    ("seven dwarfs mine train", ParkId::MagicKingdom),
    ("haunted mansion", ParkId::MagicKingdom),
    ("pirates of the caribbean", ParkId::MagicKingdom),
    ("jungle cruise", ParkId::MagicKingdom),
    ("big thunder mountain", ParkId::MagicKingdom),
    ("tron lightcycle", ParkId::MagicKingdom),
    ("peter pan's flight", ParkId::MagicKingdom),
    ("tiana's bayou adventure", ParkId::MagicKingdom),
    ("it's a small world", ParkId::MagicKingdom),
    ("buzz lightyear", ParkId::MagicKingdom),
    // EPCOT
    ("guardians of the galaxy", ParkId::Epcot),
    ("cosmic rewind", ParkId::Epcot),
    ("test track", ParkId::Epcot),
    ("frozen ever after", ParkId::Epcot),
    ("soarin", ParkId::Epcot),
    ("remy's ratatouille", ParkId::Epcot),
    ("spaceship earth", ParkId::Epcot),
    ("mission: space", ParkId::Epcot),
    // Hollywood Studios
    ("rise of the resistance", ParkId::HollywoodStudios),
    ("slinky dog dash", ParkId::HollywoodStudios),
    ("tower of terror", ParkId::HollywoodStudios),
    ("rock 'n' roller coaster", ParkId::HollywoodStudios),
    ("smugglers run", ParkId::HollywoodStudios),
    ("runaway railway", ParkId::HollywoodStudios),
    ("toy story mania", ParkId::HollywoodStudios),
    // Animal Kingdom
    ("flight of passage", ParkId::AnimalKingdom),
    ("expedition everest", ParkId::AnimalKingdom),
    ("kilimanjaro safaris", ParkId::AnimalKingdom),
    ("na'vi river journey", ParkId::AnimalKingdom),
    ("kali river rapids", ParkId::AnimalKingdom),
    ("dinosaur", ParkId::AnimalKingdom),
];

pub const TIME_KEYWORDS: &[&str] = &[
    "hours",
    "what time",
    "when does",
    "when do",
    "when is",
    "open",
    "close",
    "closing",
    "opening",
    "schedule",
    "tonight",
    "start",
];

/// A time question about one of these is about a venue, not the park gate.
pub const SUB_VENUE_KEYWORDS: &[&str] = &[
    "parade",
    "fireworks",
    "show",
    "meet",
    "character",
    "restaurant",
    "dining",
    "lounge",
    "bar",
    "shop",
    "store",
    "ride",
    "attraction",
    "lightning lane",
];

pub const CHARACTER_KEYWORDS: &[&str] = &[
    "character",
    "meet",
    "princess",
    "mickey",
    "minnie",
    "goofy",
    "donald",
    "pluto",
    "chip",
    "dale",
    "stitch",
    "cinderella",
    "belle",
    "ariel",
    "elsa",
    "anna",
    "tiana",
    "moana",
    "peter pan",
    "buzz",
    "woody",
    "autograph",
];

/// Phrases that contain a character keyword but name a ride or landmark.
/// They are removed before the character check.
pub const CHARACTER_EXCLUSIONS: &[&str] = &[
    "cinderella castle",
    "peter pan's flight",
    "tiana's bayou adventure",
    "buzz lightyear",
    "mickey & minnie's runaway railway",
    "mickey and minnie's runaway railway",
];

/// Venues where characters are met; raise the location-specific character flag.
pub const CHARACTER_VENUE_KEYWORDS: &[&str] = &[
    "princess fairytale hall",
    "town square theater",
    "pete's silly sideshow",
    "adventurers outpost",
    "royal sommerhus",
    "character spot",
    "celebrity spotlight",
    "wilderness explorers",
];

pub const ENTERTAINMENT_KEYWORDS: &[&str] = &[
    "show",
    "parade",
    "fireworks",
    "entertainment",
    "performance",
    "spectacular",
    "nighttime",
    "happily ever after",
    "fantasmic",
    "luminous",
    "festival of the lion king",
    "cavalcade",
];

pub const FIREWORKS_KEYWORDS: &[&str] = &[
    "fireworks",
    "happily ever after",
    "luminous",
    "nighttime spectacular",
    "drone show",
];

pub const SHOW_KEYWORDS: &[&str] = &[
    "show",
    "fantasmic",
    "performance",
    "festival of the lion king",
    "theater",
];

pub const PARADE_KEYWORDS: &[&str] = &["parade", "cavalcade", "procession"];

pub const ATTRACTION_KEYWORDS: &[&str] = &[
    "ride",
    "attraction",
    "wait",
    "line",
    "queue",
    "lightning lane",
    "coaster",
    "busy",
    "busiest",
    "shortest",
    "longest",
];

pub const CROSS_PARK_KEYWORDS: &[&str] = &[
    "all parks",
    "all the parks",
    "every park",
    "each park",
    "which park",
    "other park",
    "across",
    "compare",
    "park hop",
];

/// Lower-cases `text` and folds typographic apostrophes to ASCII so
/// "Peter Pan’s Flight" matches the tables.
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace(['\u{2019}', '\u{2018}', '\u{02BC}'], "'")
}

/// True when any keyword is a substring of `text`.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// True when `word` appears as a whole word in `text`.
pub fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}
