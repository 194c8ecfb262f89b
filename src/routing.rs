//! Partition routing for responses written by the fetch handler.
//!
//! Rules are kept as data: an ordered list of `(predicate, partition)` pairs
//! evaluated top to bottom, first match wins, with a fallback partition when
//! nothing matches.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Logical cache partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Versioned app shell assets.
    Static,
    /// API and appointment responses.
    Api,
    /// Image responses.
    Images,
}

static IMAGE_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpg|jpeg|gif|svg|webp)$").expect("valid image extension regex")
});

/// Condition on a request URL's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Path contains the given substring.
    PathContains(String),
    /// Path ends with a known image extension.
    ImageExtension,
}

impl Predicate {
    /// Evaluates the predicate against `url`.
    #[must_use]
    pub fn matches(&self, url: &Url) -> bool {
        match self {
            Self::PathContains(needle) => url.path().contains(needle.as_str()),
            Self::ImageExtension => IMAGE_EXTENSION.is_match(url.path()),
        }
    }
}

/// A single routing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    /// Condition.
    pub predicate: Predicate,
    /// Partition selected when the condition holds.
    pub partition: Partition,
}

impl RoutingRule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(predicate: Predicate, partition: Partition) -> Self {
        Self {
            predicate,
            partition,
        }
    }
}

/// Ordered rule list with a fallback partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    rules: Vec<RoutingRule>,
    fallback: Partition,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(
            vec![
                RoutingRule::new(Predicate::PathContains("/api/".to_string()), Partition::Api),
                RoutingRule::new(
                    Predicate::PathContains("/appointments".to_string()),
                    Partition::Api,
                ),
                RoutingRule::new(Predicate::ImageExtension, Partition::Images),
            ],
            Partition::Static,
        )
    }
}

impl Router {
    /// Creates a router from explicit rules.
    #[must_use]
    pub const fn new(rules: Vec<RoutingRule>, fallback: Partition) -> Self {
        Self { rules, fallback }
    }

    /// The rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// Selects the partition for `url`.
    #[must_use]
    pub fn route(&self, url: &Url) -> Partition {
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(url))
            .map_or(self.fallback, |rule| rule.partition)
    }
}
