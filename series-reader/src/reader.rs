//! Batch reader: fans a multi-query read request out to a store one query at a time.

use crate::prompb::{Query, QueryResult, ReadRequest, ReadResponse, TimeSeries};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads the data described by a read request.
#[async_trait]
pub trait Reader: Send + Sync {
    async fn read(&self, req: Option<&ReadRequest>) -> anyhow::Result<Option<ReadResponse>>;
}

/// Runs a single query against a store and returns the matching series.
#[async_trait]
pub trait Querier: Send + Sync {
    async fn query(&self, query: &Query) -> anyhow::Result<Vec<TimeSeries>>;
}

/// Reports whether the store behind it is usable.
#[async_trait]
pub trait HealthChecker: Send + Sync {
    async fn health_check(&self) -> anyhow::Result<()>;
}

/// A store that can both answer queries and report its own health.
pub trait QueryHealthChecker: Querier + HealthChecker {}

impl<T: Querier + HealthChecker + ?Sized> QueryHealthChecker for T {}

/// Reads batches from a shared store handle.
///
/// The store is shared with whoever built the reader and lives as long as the last `Arc`
/// pointing at it. The reader keeps no state between calls.
#[derive(Clone)]
pub struct DbReader {
    db: Arc<dyn QueryHealthChecker>,
}

impl DbReader {
    pub fn new(db: Arc<dyn QueryHealthChecker>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Reader for DbReader {
    /// Answers every query of `req` in order.
    ///
    /// An absent request yields `Ok(None)`. The first failing query aborts the whole read:
    /// its error is returned as-is, later queries are never sent and earlier results are
    /// dropped.
    async fn read(&self, req: Option<&ReadRequest>) -> anyhow::Result<Option<ReadResponse>> {
        let Some(req) = req else {
            return Ok(None);
        };

        debug!("Reading {} quer(ies)", req.queries.len());

        let mut results = Vec::with_capacity(req.queries.len());
        for (i, q) in req.queries.iter().enumerate() {
            let timeseries = match self.db.query(q).await {
                Ok(ts) => ts,
                Err(e) => {
                    warn!(index = i, error = %e, "Query failed, aborting read");
                    return Err(e);
                }
            };
            debug!(index = i, series = timeseries.len(), "Query answered");
            results.push(QueryResult { timeseries });
        }

        Ok(Some(ReadResponse { results }))
    }
}

#[async_trait]
impl HealthChecker for DbReader {
    async fn health_check(&self) -> anyhow::Result<()> {
        self.db.health_check().await
    }
}
