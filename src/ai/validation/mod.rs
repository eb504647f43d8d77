//! AI Response Validation
//!
//! Single choke point deciding whether an AI response is usable:
//! - Tolerant extraction of JSON from fenced or prose-polluted text
//! - Structural validation with composable predicates
//! - Resilient unwrap of payloads nested under an envelope key

mod extract;
pub mod shape;

pub use extract::{Validator, extract_json_candidate, robust_parse, robust_parse_as};
