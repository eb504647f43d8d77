//! Provider Race Selector
//!
//! Issues several candidate calls for one logical request at once and keeps
//! the first success. When every candidate fails, the individual errors are
//! returned together as an [`AggregateError`], in candidate order.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use crate::types::{AggregateError, CandidateFailure, Result, SeoError};

/// First successful result among `futures`; losers are dropped.
///
/// Candidates are labelled by their 1-based position in error reports.
pub async fn first_success<T, Fut>(futures: Vec<Fut>) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    let labeled = futures
        .into_iter()
        .enumerate()
        .map(|(i, fut)| (format!("#{}", i + 1), fut))
        .collect();
    first_success_labeled(labeled).await
}

/// First successful result among labelled candidates
pub async fn first_success_labeled<T, Fut>(candidates: Vec<(String, Fut)>) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    if candidates.is_empty() {
        return Err(AggregateError::new("No candidates provided", Vec::new()).into());
    }

    let total = candidates.len();
    let mut labels = Vec::with_capacity(total);
    let mut pending: FuturesUnordered<_> = candidates
        .into_iter()
        .enumerate()
        .map(|(index, (label, fut))| {
            labels.push(label);
            async move { (index, fut.await) }
        })
        .collect();

    let mut errors: Vec<Option<SeoError>> = (0..total).map(|_| None).collect();

    while let Some((index, result)) = pending.next().await {
        match result {
            Ok(value) => {
                debug!(candidate = %labels[index], "Race won");
                return Ok(value);
            }
            Err(err) => {
                debug!(candidate = %labels[index], error = %err, "Race candidate failed");
                errors[index] = Some(err);
            }
        }
    }

    let failures = labels
        .into_iter()
        .zip(errors)
        .filter_map(|(candidate, error)| error.map(|error| CandidateFailure { candidate, error }))
        .collect();

    Err(AggregateError::new("All candidates failed", failures).into())
}
