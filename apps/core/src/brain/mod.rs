//! # Brain Module
//!
//! Deterministic answering for park questions, run BEFORE any completion call.
//!
//! ## Components
//! - `keywords`: fixed keyword tables (parks, attractions, query flags)
//! - `analyzer`: turns text into a `QueryAnalysis`
//! - `park_info`: static park facts and time formatting
//! - `responder`: rule-based answers from cached data
//! - `composer`: completion-backed fallback with a templated last resort

pub mod analyzer;
pub mod composer;
pub mod keywords;
pub mod park_info;
pub mod responder;

pub use analyzer::{QueryAnalysis, QueryAnalyzer};
pub use composer::{ComposeInput, FallbackComposer, PROCESSING_PLACEHOLDER};
pub use responder::{PatternMatch, PatternResponder};
