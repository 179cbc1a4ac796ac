//! Store that answers queries from a fixed set of series held in memory.

use crate::prompb::{LabelMatcher, MatchType, Query, TimeSeries};
use crate::reader::{HealthChecker, Querier};
use async_trait::async_trait;
use regex::Regex;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("failed to read fixture '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse fixture '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid regex '{pattern}' for label '{label}': {source}")]
    InvalidRegex {
        label: String,
        pattern: String,
        source: regex::Error,
    },
}

pub struct MemoryStore {
    series: Vec<TimeSeries>,
}

impl MemoryStore {
    pub fn new(series: Vec<TimeSeries>) -> Self {
        Self { series }
    }

    /// Loads a JSON array of series from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MemoryStoreError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| MemoryStoreError::Io {
            path: shown.clone(),
            source,
        })?;
        let series: Vec<TimeSeries> =
            serde_json::from_str(&raw).map_err(|source| MemoryStoreError::Parse {
                path: shown.clone(),
                source,
            })?;
        let store = Self::new(series);
        if store.is_empty() {
            warn!("Fixture '{}' holds no series, every query will come back empty", shown);
        } else {
            info!("Loaded {} series from fixture '{}'", store.len(), shown);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// A label matcher with its regex compiled, if it needs one.
enum Compiled<'a> {
    Equal(&'a str, &'a str, bool),
    Regex(&'a str, Regex, bool),
}

impl<'a> Compiled<'a> {
    fn new(m: &'a LabelMatcher) -> Result<Self, MemoryStoreError> {
        let compile = || {
            // Label regexes match the whole value
            Regex::new(&format!("^(?:{})$", m.value)).map_err(|source| {
                MemoryStoreError::InvalidRegex {
                    label: m.name.clone(),
                    pattern: m.value.clone(),
                    source,
                }
            })
        };
        Ok(match m.match_type {
            MatchType::Eq => Compiled::Equal(&m.name, &m.value, true),
            MatchType::Neq => Compiled::Equal(&m.name, &m.value, false),
            MatchType::Re => Compiled::Regex(&m.name, compile()?, true),
            MatchType::Nre => Compiled::Regex(&m.name, compile()?, false),
        })
    }

    fn matches(&self, ts: &TimeSeries) -> bool {
        match self {
            Compiled::Equal(name, value, want) => (ts.label_value(name) == *value) == *want,
            Compiled::Regex(name, re, want) => re.is_match(ts.label_value(name)) == *want,
        }
    }
}

#[async_trait]
impl Querier for MemoryStore {
    async fn query(&self, query: &Query) -> anyhow::Result<Vec<TimeSeries>> {
        let matchers = query
            .matchers
            .iter()
            .map(Compiled::new)
            .collect::<Result<Vec<_>, _>>()?;

        let (start, end) = (query.start_timestamp_ms, query.end_timestamp_ms);
        let out: Vec<TimeSeries> = self
            .series
            .iter()
            .filter(|ts| matchers.iter().all(|m| m.matches(ts)))
            .filter_map(|ts| {
                let samples: Vec<_> = ts
                    .samples
                    .iter()
                    .filter(|s| s.timestamp >= start && s.timestamp <= end)
                    .cloned()
                    .collect();
                if samples.is_empty() {
                    return None;
                }
                Some(TimeSeries {
                    labels: ts.labels.clone(),
                    samples,
                })
            })
            .collect();

        debug!(
            "Memory store matched {} of {} series in [{}, {}]",
            out.len(),
            self.series.len(),
            start,
            end
        );
        Ok(out)
    }
}

#[async_trait]
impl HealthChecker for MemoryStore {
    async fn health_check(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
