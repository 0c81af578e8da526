//! Identity resolution - turns one HTTP response into an identity

use std::sync::Arc;
use tracing::trace;

use httpscan_common::{HttpResponse, Identity};

use crate::index::{Rule, RuleIndex};
use crate::store::DefinitionStore;

/// Read-only after construction; share it across workers behind an `Arc`.
pub struct IdentityResolver {
    store: Arc<DefinitionStore>,
    index: RuleIndex,
}

impl IdentityResolver {
    /// Build the rule index for `store`.
    pub fn new(store: Arc<DefinitionStore>) -> Self {
        let index = RuleIndex::build(&store);
        Self { store, index }
    }

    pub fn resolve(&self, response: &HttpResponse) -> Identity {
        resolve(response, &self.index, &self.store)
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn definition_count(&self) -> usize {
        self.store.len()
    }
}

/// Resolve `response` against the index.
///
/// 1. `Server` header against header rules, first match wins.
/// 2. Only if that found nothing and the body is non-empty, body rules.
/// 3. Otherwise a fallback identity named after the raw header.
///
/// A match always yields a fresh copy of the definition's plugins and meta.
pub fn resolve(response: &HttpResponse, index: &RuleIndex, store: &DefinitionStore) -> Identity {
    let server = response.server();

    if !server.is_empty() {
        if let Some(identity) = first_match(index.header_rules(), server, store) {
            trace!("header {:?} matched {}", server, identity.name);
            return identity;
        }
    }

    if !response.body.is_empty() {
        if let Some(identity) = first_match(index.body_rules(), &response.body, store) {
            trace!("body matched {}", identity.name);
            return identity;
        }
    }

    Identity::unmatched(server)
}

fn first_match(rules: &[Rule], haystack: &str, store: &DefinitionStore) -> Option<Identity> {
    rules
        .iter()
        .filter(|rule| rule.is_match(haystack))
        .find_map(|rule| {
            store
                .get(rule.definition())
                .map(|definition| Identity::from_definition(rule.definition(), definition))
        })
}
