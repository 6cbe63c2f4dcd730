//! AI Fallback Composer.
//!
//! Builds a context block from cached park data and asks the completion
//! provider for an answer. Any provider failure degrades to a templated
//! summary of the same data, so callers always get text back.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::analyzer::QueryAnalysis;
use super::keywords::{normalize, CHARACTER_VENUE_KEYWORDS};
use super::park_info::title_case;
use crate::actors::messages::{CompletionRequest, PromptMessage};
use crate::actors::traits::CompletionProvider;
use crate::config::CallPolicy;
use crate::data::cache::CacheSnapshot;
use crate::models::{
    Attraction, CharacterMeet, EntertainmentCategory, EntertainmentEvent, ParkData, ParkId,
};

/// Returned when the provider answers with no content.
pub const PROCESSING_PLACEHOLDER: &str =
    "I'm still working on that one. Could you ask again in a moment?";

const SYSTEM_PREAMBLE: &str = "You are a friendly theme park assistant inside a park guide app. \
The conversation is already in progress: do not greet the user again and do not ask clarifying \
questions. Answer directly and concisely using the live park data provided. If the data does not \
cover the question, say so briefly and suggest what the user could ask instead.";

const TOP_ATTRACTIONS: usize = 5;

/// Everything the composer needs for one message.
#[derive(Debug, Clone, Copy)]
pub struct ComposeInput<'a> {
    pub text: &'a str,
    pub park: ParkId,
    pub snapshot: &'a CacheSnapshot,
    pub analysis: &'a QueryAnalysis,
    /// Earlier user inputs, oldest first.
    pub recent_inputs: &'a [String],
}

impl<'a> ComposeInput<'a> {
    /// Parks whose data answers this message: every theme park for a
    /// cross-park question, otherwise just the target park.
    fn scope(&self) -> Vec<(ParkId, &'a ParkData)> {
        if self.analysis.cross_park_query {
            ParkId::ALL
                .into_iter()
                .filter(|park| !park.is_district())
                .map(|park| (park, self.snapshot.park(park)))
                .collect()
        } else {
            vec![(self.park, self.snapshot.park(self.park))]
        }
    }

    fn scope_label(&self) -> String {
        if self.analysis.cross_park_query {
            "across the parks".to_string()
        } else {
            format!("at {}", self.park.display_name())
        }
    }
}

pub struct FallbackComposer<C: CompletionProvider> {
    provider: Arc<C>,
    policy: CallPolicy,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl<C: CompletionProvider> FallbackComposer<C> {
    pub fn new(provider: Arc<C>, policy: CallPolicy) -> Self {
        Self {
            provider,
            policy,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Overrides the provider's configured sampling settings.
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = Some(temperature);
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Produce an answer. Never fails and never returns an empty string.
    #[instrument(skip(self, input), fields(park = %input.park))]
    pub async fn compose(&self, input: ComposeInput<'_>) -> String {
        let request = self.build_request(&input);

        let result = self
            .policy
            .run("completion", || self.provider.complete(request.clone()))
            .await;

        match result {
            Ok(text) if text.trim().is_empty() => {
                info!("Completion returned no content");
                PROCESSING_PLACEHOLDER.to_string()
            }
            Ok(text) => text,
            Err(e) => {
                warn!("Completion failed, using templated answer: {}", e);
                templated_answer(&input)
            }
        }
    }

    fn build_request(&self, input: &ComposeInput<'_>) -> CompletionRequest {
        let user = format!(
            "{}\n\nUser question: {}",
            build_context(input),
            input.text.trim()
        );
        CompletionRequest {
            messages: vec![PromptMessage::system(SYSTEM_PREAMBLE), PromptMessage::user(user)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Natural-language dump of the cached data in scope for `input`.
pub fn build_context(input: &ComposeInput<'_>) -> String {
    let mut sections = vec![format!("Current park: {}", input.park.display_name())];
    if let Some(at) = input.snapshot.refreshed_at() {
        sections.push(format!("Live data as of {} UTC", at.format("%H:%M")));
    }

    for (park, data) in input.scope() {
        sections.extend(park_sections(park, data));
    }

    if !input.recent_inputs.is_empty() {
        sections.push(format!("Recent questions: {}", input.recent_inputs.join(" | ")));
    }

    sections.join("\n\n")
}

fn park_sections(park: ParkId, data: &ParkData) -> Vec<String> {
    let name = park.display_name();
    let mut sections = Vec::new();

    if !data.attractions.is_empty() {
        let lines: Vec<String> = data
            .attractions
            .iter()
            .map(|a| {
                if !a.is_open {
                    format!("- {}: closed", a.name)
                } else {
                    format!(
                        "- {}: {} min wait{}",
                        a.name,
                        a.wait_time,
                        if a.has_lightning_lane {
                            ", Lightning Lane available"
                        } else {
                            ""
                        }
                    )
                }
            })
            .collect();
        sections.push(format!("Attractions at {}:\n{}", name, lines.join("\n")));
    }

    if !data.entertainment.is_empty() {
        let lines: Vec<String> = data.entertainment.iter().map(event_line).collect();
        sections.push(format!("Entertainment at {}:\n{}", name, lines.join("\n")));
    }

    if !data.character_meets.is_empty() {
        let lines: Vec<String> = data.character_meets.iter().map(meet_line).collect();
        sections.push(format!("Character meets at {}:\n{}", name, lines.join("\n")));
    }

    sections
}

fn join_times(times: &[String]) -> String {
    if times.is_empty() {
        "times not posted".to_string()
    } else {
        times.join(", ")
    }
}

fn event_line(event: &EntertainmentEvent) -> String {
    let mut line = format!("- {}: {}", event.name, join_times(&event.times));
    if !event.location.is_empty() {
        line.push_str(&format!(" at {}", event.location));
    }
    if let Some(duration) = &event.duration {
        line.push_str(&format!(" ({})", duration));
    }
    line
}

fn meet_line(meet: &CharacterMeet) -> String {
    format!(
        "- {}: {} at {}",
        meet.characters.join(" & "),
        join_times(&meet.times),
        meet.location
    )
}

/// Appends "(EPCOT)" and the like when answering across parks.
fn tagged(line: String, park: ParkId, cross_park: bool) -> String {
    if cross_park {
        format!("{} ({})", line, park.display_name())
    } else {
        line
    }
}

/// Deterministic answer from cached data, used when the provider is unavailable.
pub fn templated_answer(input: &ComposeInput<'_>) -> String {
    let analysis = input.analysis;
    let cross_park = analysis.cross_park_query;
    let scope = input.scope();
    let label = input.scope_label();

    if analysis.entertainment_query {
        let events: Vec<(ParkId, &EntertainmentEvent)> = scope
            .iter()
            .flat_map(|(park, data)| data.entertainment.iter().map(move |e| (*park, e)))
            .collect();
        if !events.is_empty() {
            let lines: Vec<String> = filter_events(events, analysis)
                .into_iter()
                .map(|(park, e)| tagged(event_line(e), park, cross_park))
                .collect();
            return format!("Here's the entertainment {}:\n{}", label, lines.join("\n"));
        }
    }

    if analysis.character_query || analysis.character_location_query {
        let meets: Vec<(ParkId, &CharacterMeet)> = scope
            .iter()
            .flat_map(|(park, data)| data.character_meets.iter().map(move |m| (*park, m)))
            .collect();

        if analysis.character_location_query {
            if let Some((venue, at_venue)) = meets_at_named_venue(input.text, &meets) {
                let lines: Vec<String> = at_venue.iter().map(|(_, m)| meet_line(m)).collect();
                return format!(
                    "Here's who's meeting guests at {}:\n{}",
                    title_case(venue),
                    lines.join("\n")
                );
            }
        }

        if analysis.character_query && !meets.is_empty() {
            let lines: Vec<String> = meets
                .iter()
                .map(|(park, m)| tagged(meet_line(m), *park, cross_park))
                .collect();
            return format!("Here's where to meet characters {}:\n{}", label, lines.join("\n"));
        }
    }

    if analysis.attraction_query {
        let shortest = shortest_waits(&scope);
        if !shortest.is_empty() {
            let lines: Vec<String> = shortest
                .iter()
                .map(|a| {
                    let ll = if a.has_lightning_lane { " (Lightning Lane)" } else { "" };
                    let line = format!("- {}: {} min{}", a.name, a.wait_time, ll);
                    tagged(line, a.park, cross_park)
                })
                .collect();
            return format!("Shortest waits right now {}:\n{}", label, lines.join("\n"));
        }
    }

    let count = |f: fn(&ParkData) -> usize| scope.iter().map(|(_, data)| f(data)).sum::<usize>();
    format!(
        "I have live info for {} attractions, {} shows and {} character meets {}. \
         Ask me about a specific ride's wait time, showtimes, or where to meet characters!",
        count(|d| d.attractions.len()),
        count(|d| d.entertainment.len()),
        count(|d| d.character_meets.len()),
        label
    )
}

/// The character venue named in `text` and the meets held there, if any.
fn meets_at_named_venue<'a>(
    text: &str,
    meets: &[(ParkId, &'a CharacterMeet)],
) -> Option<(&'static str, Vec<(ParkId, &'a CharacterMeet)>)> {
    let text = normalize(text);
    let venue = CHARACTER_VENUE_KEYWORDS
        .iter()
        .copied()
        .find(|venue| text.contains(*venue))?;
    let at_venue: Vec<(ParkId, &CharacterMeet)> = meets
        .iter()
        .filter(|(_, m)| normalize(&m.location).contains(venue))
        .copied()
        .collect();
    if at_venue.is_empty() {
        None
    } else {
        Some((venue, at_venue))
    }
}

/// Narrows to the sub-category the user asked about, unless that leaves nothing.
fn filter_events<'a>(
    events: Vec<(ParkId, &'a EntertainmentEvent)>,
    analysis: &QueryAnalysis,
) -> Vec<(ParkId, &'a EntertainmentEvent)> {
    let wanted: Vec<EntertainmentCategory> = [
        (analysis.fireworks_query, EntertainmentCategory::Fireworks),
        (analysis.parade_query, EntertainmentCategory::Parade),
        (analysis.show_query, EntertainmentCategory::Show),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, category)| *category)
    .collect();

    let filtered: Vec<(ParkId, &EntertainmentEvent)> = events
        .iter()
        .filter(|(_, e)| wanted.contains(&e.category))
        .copied()
        .collect();

    if filtered.is_empty() {
        events
    } else {
        filtered
    }
}

fn shortest_waits<'a>(scope: &[(ParkId, &'a ParkData)]) -> Vec<&'a Attraction> {
    let mut open: Vec<&Attraction> = scope
        .iter()
        .flat_map(|(_, data)| data.attractions.iter())
        .filter(|a| a.is_open)
        .collect();
    open.sort_by(|a, b| a.wait_time.cmp(&b.wait_time).then_with(|| a.name.cmp(&b.name)));
    open.truncate(TOP_ATTRACTIONS);
    open
}
