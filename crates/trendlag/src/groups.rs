//! Entity → group label lookup.
//!
//! Entities missing from the table fall into [`DEFAULT_GROUP`].

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Label for entities without an explicit group.
pub const DEFAULT_GROUP: &str = "Other";

/// Static entity → group table, serialized as a flat JSON object
/// (`{ "AAPL": "Tech", ... }`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupAssignment {
    labels: BTreeMap<String, String>,
}

impl GroupAssignment {
    /// Empty table: every entity maps to [`DEFAULT_GROUP`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (entity, group) pairs. Later pairs win.
    pub fn from_pairs<I, E, G>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (E, G)>,
        E: Into<String>,
        G: Into<String>,
    {
        Self {
            labels: pairs
                .into_iter()
                .map(|(e, g)| (e.into(), g.into()))
                .collect(),
        }
    }

    /// The 24 Fortune-25 tickers used by the sector study.
    pub fn fortune25_sectors() -> Self {
        Self::from_pairs([
            ("WMT", "General Merchandisers"),
            ("COST", "General Merchandisers"),
            ("HD", "General Merchandisers"),
            ("KR", "General Merchandisers"),
            ("AMZN", "Internet Retail"),
            ("GOOG", "Internet Retail"),
            ("AAPL", "Tech"),
            ("MSFT", "Tech"),
            ("UNH", "Health Insurance"),
            ("CI", "Health Insurance"),
            ("CNC", "Health Insurance"),
            ("ELV", "Health Insurance"),
            ("BRK-B", "Financial Services"),
            ("JPM", "Financial Services"),
            ("BAC", "Financial Services"),
            ("C", "Financial Services"),
            ("XOM", "Petroleum"),
            ("CVX", "Petroleum"),
            ("MPC", "Petroleum"),
            ("CAH", "Wholesale HC"),
            ("MCK", "Wholesale HC"),
            ("CVS", "Pharmacy"),
            ("F", "Auto"),
            ("GM", "Auto"),
        ])
    }

    /// Parse a JSON object of entity → group.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read [`Self::from_json_str`] input from a file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Assign `entity` to `group`, returning the previous group if any.
    pub fn insert(&mut self, entity: impl Into<String>, group: impl Into<String>) -> Option<String> {
        self.labels.insert(entity.into(), group.into())
    }

    /// Group of `entity`, [`DEFAULT_GROUP`] if unmapped.
    pub fn label_for(&self, entity: &str) -> &str {
        self.labels
            .get(entity)
            .map_or(DEFAULT_GROUP, String::as_str)
    }

    /// Whether `entity` has an explicit group.
    pub fn contains(&self, entity: &str) -> bool {
        self.labels.contains_key(entity)
    }

    /// Distinct explicit group labels, sorted.
    pub fn groups(&self) -> BTreeSet<&str> {
        self.labels.values().map(String::as_str).collect()
    }

    /// Entities explicitly assigned to `group`, sorted.
    pub fn entities_in(&self, group: &str) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|(_, g)| g.as_str() == group)
            .map(|(e, _)| e.as_str())
            .collect()
    }

    /// Number of mapped entities.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no entity is mapped.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
