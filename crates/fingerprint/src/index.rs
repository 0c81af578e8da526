//! Rule index - compiled header and body patterns in store order

use regex::Regex;
use tracing::{debug, warn};

use httpscan_common::HttpScanError;

use crate::store::DefinitionStore;

/// One compiled pattern and the store key of the definition it belongs to.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    definition: String,
}

impl Rule {
    pub fn new(pattern: &str, definition: &str) -> Result<Self, HttpScanError> {
        let compiled = Regex::new(pattern).map_err(|e| HttpScanError::Pattern {
            definition: definition.to_string(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern: compiled,
            definition: definition.to_string(),
        })
    }

    /// Search semantics: matches anywhere in `haystack`.
    #[inline]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.pattern.is_match(haystack)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }
}

/// Header and body rules, each in definition-store order.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    header_rules: Vec<Rule>,
    body_rules: Vec<Rule>,
}

impl RuleIndex {
    /// Compile every pattern of every definition. Invalid patterns are
    /// skipped with a warning.
    pub fn build(store: &DefinitionStore) -> Self {
        let mut index = Self::default();
        for (key, definition) in store.iter() {
            compile_into(&mut index.header_rules, key, &definition.rules.headers.server);
            compile_into(&mut index.body_rules, key, &definition.rules.body);
        }
        debug!(
            "Rule index built: {} header rules, {} body rules",
            index.header_rules.len(),
            index.body_rules.len()
        );
        index
    }

    pub fn header_rules(&self) -> &[Rule] {
        &self.header_rules
    }

    pub fn body_rules(&self) -> &[Rule] {
        &self.body_rules
    }

    pub fn len(&self) -> usize {
        self.header_rules.len() + self.body_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header_rules.is_empty() && self.body_rules.is_empty()
    }
}

fn compile_into(rules: &mut Vec<Rule>, key: &str, patterns: &[String]) {
    for pattern in patterns {
        match Rule::new(pattern, key) {
            Ok(rule) => rules.push(rule),
            Err(e) => warn!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpscan_common::Definition;

    #[test]
    fn builds_rules_in_store_order() {
        let store = DefinitionStore::from_definitions(vec![
            Definition::new("nginx").with_server_pattern("nginx"),
            Definition::new("apache")
                .with_server_pattern("Apache")
                .with_server_pattern("httpd")
                .with_body_pattern("It works!"),
        ]);
        let index = RuleIndex::build(&store);

        let owners: Vec<&str> = index.header_rules().iter().map(Rule::definition).collect();
        assert_eq!(owners, vec!["apache", "apache", "nginx"]);
        assert_eq!(index.body_rules().len(), 1);
        assert_eq!(index.body_rules()[0].pattern(), "It works!");
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn invalid_pattern_skips_only_that_entry() {
        let store = DefinitionStore::from_definitions(vec![Definition::new("mixed")
            .with_server_pattern("(unclosed")
            .with_server_pattern("fine")]);
        let index = RuleIndex::build(&store);

        assert_eq!(index.header_rules().len(), 1);
        assert_eq!(index.header_rules()[0].pattern(), "fine");
    }

    #[test]
    fn rules_use_search_semantics() {
        let rule = Rule::new("nginx", "nginx").unwrap();
        assert!(rule.is_match("nginx/1.18.0 (Ubuntu)"));
        assert!(rule.is_match("openresty-nginx"));
        assert!(!rule.is_match("Apache"));

        let anchored = Rule::new("^Microsoft-IIS/", "iis").unwrap();
        assert!(anchored.is_match("Microsoft-IIS/7.5"));
        assert!(!anchored.is_match("not Microsoft-IIS/7.5"));
    }

    #[test]
    fn empty_store_builds_empty_index() {
        let index = RuleIndex::build(&DefinitionStore::default());
        assert!(index.is_empty());
    }
}
