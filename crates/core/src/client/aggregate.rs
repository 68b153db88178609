//! Fan-in of per-partition listings
//!
//! Sub-queries run one partition at a time in listing order. A partition the
//! caller may not read contributes nothing; any other failure aborts the
//! whole query and discards what was gathered so far.

use std::future::Future;

use storectl_domain::{ErrorKind, Resource, Result};
use tracing::debug;

/// Concatenate `fetch(partition)` over every partition
///
/// # Errors
///
/// Returns the first error whose kind is not `Unauthorised`.
pub async fn fetch_across_partitions<P, T, F, Fut>(
    partitions: Vec<P>,
    mut fetch: F,
) -> Result<Vec<T>>
where
    P: Resource,
    F: FnMut(&P) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut gathered = Vec::new();

    for partition in &partitions {
        match fetch(partition).await {
            Ok(items) => gathered.extend(items),
            Err(err) if err.kind() == ErrorKind::Unauthorised => {
                debug!(
                    partition = %partition.id(),
                    name = partition.name(),
                    error = %err,
                    "skipping partition without access"
                );
            }
            Err(err) => return Err(err),
        }
    }

    Ok(gathered)
}
