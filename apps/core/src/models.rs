use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// The fixed set of park contexts a conversation can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParkId {
    MagicKingdom,
    Epcot,
    HollywoodStudios,
    AnimalKingdom,
    DisneySprings,
    Resorts,
}

impl ParkId {
    /// Every park, theme parks first.
    pub const ALL: [ParkId; 6] = [
        ParkId::MagicKingdom,
        ParkId::Epcot,
        ParkId::HollywoodStudios,
        ParkId::AnimalKingdom,
        ParkId::DisneySprings,
        ParkId::Resorts,
    ];

    /// Theme parks that publish ride, show and hours data.
    pub const DATA_PARKS: [ParkId; 4] = [
        ParkId::MagicKingdom,
        ParkId::Epcot,
        ParkId::HollywoodStudios,
        ParkId::AnimalKingdom,
    ];

    /// Identifier used on the wire and in data-provider paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParkId::MagicKingdom => "magicKingdom",
            ParkId::Epcot => "epcot",
            ParkId::HollywoodStudios => "hollywoodStudios",
            ParkId::AnimalKingdom => "animalKingdom",
            ParkId::DisneySprings => "disneySprings",
            ParkId::Resorts => "resorts",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ParkId::MagicKingdom => "Magic Kingdom",
            ParkId::Epcot => "EPCOT",
            ParkId::HollywoodStudios => "Hollywood Studios",
            ParkId::AnimalKingdom => "Animal Kingdom",
            ParkId::DisneySprings => "Disney Springs",
            ParkId::Resorts => "the Disney Resorts",
        }
    }

    /// Shopping/dining district or hotels, answered from static text.
    pub fn is_district(&self) -> bool {
        matches!(self, ParkId::DisneySprings | ParkId::Resorts)
    }
}

impl fmt::Display for ParkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// Accepts either a single string or a list of strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}

/// A ride or attraction with its live wait time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attraction {
    pub id: String,
    pub name: String,
    /// Posted standby wait in minutes.
    #[serde(default)]
    pub wait_time: u32,
    #[serde(default = "default_true")]
    pub is_open: bool,
    #[serde(default)]
    pub has_lightning_lane: bool,
    pub park: ParkId,
    /// Themed land or sub-area, when the provider knows it.
    #[serde(default, alias = "land")]
    pub area: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntertainmentCategory {
    Parade,
    Fireworks,
    Show,
    CharacterMeet,
}

impl<'de> Deserialize<'de> for EntertainmentCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.to_lowercase().replace(['_', ' '], "-").as_str() {
            "parade" => EntertainmentCategory::Parade,
            "fireworks" | "nighttime-spectacular" => EntertainmentCategory::Fireworks,
            "character-meet" | "charactermeet" | "meet" => EntertainmentCategory::CharacterMeet,
            _ => EntertainmentCategory::Show,
        })
    }
}

fn default_category() -> EntertainmentCategory {
    EntertainmentCategory::Show
}

/// A scheduled parade, show, fireworks or meet with one or more showtimes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntertainmentEvent {
    pub name: String,
    #[serde(default, alias = "showtimes", deserialize_with = "one_or_many")]
    pub times: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(rename = "type", alias = "category", default = "default_category")]
    pub category: EntertainmentCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterMeet {
    #[serde(default, alias = "character", deserialize_with = "one_or_many")]
    pub characters: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub times: Vec<String>,
    pub park: ParkId,
}

/// Operating hours for one park on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkHoursEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub opening_time: Option<String>,
    #[serde(default)]
    pub closing_time: Option<String>,
    #[serde(default = "default_true")]
    pub is_open: bool,
}

/// All cached data for a single park. Replaced as a unit on refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParkData {
    pub attractions: Vec<Attraction>,
    pub entertainment: Vec<EntertainmentEvent>,
    pub character_meets: Vec<CharacterMeet>,
    pub hours: Vec<ParkHoursEntry>,
}

impl ParkData {
    pub fn is_empty(&self) -> bool {
        self.attractions.is_empty()
            && self.entertainment.is_empty()
            && self.character_meets.is_empty()
            && self.hours.is_empty()
    }

    pub fn hours_on(&self, date: NaiveDate) -> Option<&ParkHoursEntry> {
        self.hours.iter().find(|entry| entry.date == date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackRating {
    ThumbsUp,
    ThumbsDown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageFeedback {
    pub rating: FeedbackRating,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A single message within the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    /// The only field that changes after creation.
    pub feedback: Option<MessageFeedback>,
}

impl ChatMessage {
    pub fn new(author: Author, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            author,
            created_at: Utc::now(),
            feedback: None,
        }
    }
}
