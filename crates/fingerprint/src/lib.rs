//! Fingerprint Engine - definition-driven HTTP server identification
//!
//! This crate provides:
//! - `DefinitionStore`: declarative rule files loaded from a directory
//! - `RuleIndex`: compiled header/body patterns in store order
//! - `IdentityResolver`: first-match-wins resolution of one response
//! - `DefinitionSynthesizer`: derives a new rule file from a live host

mod index;
mod resolver;
mod store;
mod synthesizer;

pub use index::{Rule, RuleIndex};
pub use resolver::{resolve, IdentityResolver};
pub use store::{load_definition, DefinitionStore, DEFINITION_EXTENSION, TEMPLATE_NAME};
pub use synthesizer::{to_json_pretty, DefinitionSynthesizer};
