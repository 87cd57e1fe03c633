//! Pack search: provider contract, concurrent aggregation, size parsing.
//!
//! A [`SearchProvider`] is any backend that can turn keywords into candidate
//! packs. The [`ProviderAggregator`] fans a query out to every registered
//! provider concurrently, bounds the whole call with a soft deadline,
//! deduplicates by locator, and returns the merged set sorted by size
//! descending.

pub mod packlist;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::xdcc::locator::IrcFile;

/// Registrations beyond this are ignored.
pub const MAX_PROVIDERS: usize = 100;

/// Allocation cap for a single call's result set. Governs pre-allocated
/// capacity only; collected results are never truncated.
pub const MAX_RESULTS: usize = 1024;

const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One candidate pack reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Where the pack lives; dedup identity for the aggregator.
    pub file: IrcFile,
    /// Display name reported by the provider.
    pub name: String,
    /// Size in bytes, -1 when the provider could not determine it.
    pub size: i64,
    /// Slot index reported by the provider.
    pub slot: usize,
}

/// A search backend. Implementations are queried concurrently and must
/// tolerate an empty keyword list (interpreting it however suits the
/// backend).
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Boxed-future form so providers stay object-safe behind `dyn`.
    fn search<'a>(&'a self, keywords: &'a [String]) -> BoxFuture<'a, Result<Vec<FileRecord>>>;
}

/// Fans a search out to every registered provider.
///
/// Provider failures are isolated: a failing provider contributes nothing and
/// never fails the call. The returned error is reserved for aggregator-level
/// faults and is currently never produced.
pub struct ProviderAggregator {
    providers: Vec<Arc<dyn SearchProvider>>,
    timeout: Duration,
}

impl ProviderAggregator {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_SEARCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            providers: Vec::new(),
            timeout,
        }
    }

    /// Register a provider. Registrations beyond [`MAX_PROVIDERS`] are
    /// dropped with a warning.
    pub fn add_provider(&mut self, provider: Arc<dyn SearchProvider>) {
        if self.providers.len() >= MAX_PROVIDERS {
            warn!(provider = provider.name(), "provider cap reached, ignoring");
            return;
        }
        self.providers.push(provider);
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Query every provider concurrently and merge the results.
    ///
    /// The whole call is bounded by the aggregator's deadline; providers that
    /// have not answered by then are abandoned and whatever they produce
    /// later is discarded. Duplicate locators collapse to a single record —
    /// which provider's metadata survives a collision is unspecified.
    /// The output is sorted by size descending.
    pub async fn search(&self, keywords: &[String]) -> Result<Vec<FileRecord>> {
        if self.providers.is_empty() {
            return Ok(Vec::new());
        }

        let mut tasks = JoinSet::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let keywords = keywords.to_vec();
            tasks.spawn(async move {
                let name = provider.name().to_string();
                (name, provider.search(&keywords).await)
            });
        }

        // Each task returns its own batch; merging happens here,
        // sequentially, so no lock is shared between provider tasks.
        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut merged: HashMap<IrcFile, FileRecord> = HashMap::new();
        loop {
            let joined = tokio::time::timeout_at(deadline, tasks.join_next()).await;
            match joined {
                Ok(Some(Ok((_, Ok(records))))) => {
                    for record in records {
                        // Last write wins on duplicate locators.
                        merged.insert(record.file.clone(), record);
                    }
                }
                Ok(Some(Ok((name, Err(e))))) => {
                    debug!(provider = %name, error = %e, "provider failed, skipping");
                }
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "provider task panicked, skipping");
                }
                Ok(None) => break,
                Err(_) => {
                    // Soft deadline: keep what arrived, drop the rest.
                    debug!(pending = tasks.len(), "search deadline hit, returning partial results");
                    tasks.abort_all();
                    break;
                }
            }
        }

        let mut results = Vec::with_capacity(merged.len().min(MAX_RESULTS));
        results.extend(merged.into_values());
        results.sort_by(|a, b| b.size.cmp(&a.size));
        Ok(results)
    }
}

impl Default for ProviderAggregator {
    fn default() -> Self {
        Self::new()
    }
}

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("empty size string")]
    Empty,
    #[error("invalid number in size string: {0}")]
    BadNumber(String),
    #[error("unrecognized size unit in {0:?} (expected K, M, or G)")]
    BadUnit(String),
}

/// Parse a human size token like `1.5G` into a byte count.
///
/// The token is a decimal number (optionally fractional) immediately followed
/// by a single unit letter: `K` = 1024, `M` = 1024^2, `G` = 1024^3.
/// Fractional sizes are scaled and truncated. A missing or unknown unit is an
/// error.
pub fn parse_file_size(token: &str) -> Result<i64, SizeError> {
    let Some(unit) = token.chars().last() else {
        return Err(SizeError::Empty);
    };
    let number = &token[..token.len() - unit.len_utf8()];
    let value: f64 = number
        .parse()
        .map_err(|_| SizeError::BadNumber(number.to_string()))?;
    let scale = match unit {
        'K' => KIB,
        'M' => MIB,
        'G' => GIB,
        _ => return Err(SizeError::BadUnit(token.to_string())),
    };
    Ok((value * scale) as i64)
}
