//! Paginated fetch-and-cast.
//!
//! A logical window (`limit`, `offset`) larger than the server's per-request cap
//! is split into sequential capped requests. Each page's offset depends on how
//! many items the previous one actually returned, so pages are never fetched
//! concurrently.

use tracing::{debug, info};

use super::envelope::{ensure_ok, page_items};
use super::query::{Limit, QueryParams};
use super::{Client, CredentialGuard, Transport};
use crate::entity::Entity;
use crate::error::Result;

/// The catalog's usual per-request maximum.
pub const DEFAULT_SERVER_CAP: u64 = 100;

/// Window size used when the caller gives no `limit`.
pub const DEFAULT_LIMIT: u64 = 10;

/// Fetch `params.limit` items of `E` from `path`, starting at `params.offset`.
///
/// Stops early as soon as a page comes back shorter than requested. Any failed
/// page fails the whole call; partial results are discarded.
pub async fn fetch_page<E, T, G>(
    client: &Client<T, G>,
    path: &str,
    params: &QueryParams,
    server_cap: u64,
    default_limit: u64,
) -> Result<Vec<E>>
where
    E: Entity,
    T: Transport,
    G: CredentialGuard,
{
    let mut remaining = match params.limit.unwrap_or(Limit::Count(default_limit)) {
        Limit::Count(n) => Some(n),
        Limit::Unbounded => None,
    };
    if server_cap == 0 || remaining == Some(0) {
        return Ok(Vec::new());
    }

    let mut offset = params.offset;
    let mut items = Vec::new();
    let mut pages = 0u32;

    loop {
        let requested = remaining.map_or(server_cap, |r| r.min(server_cap));
        let page_params = params.clone().limit(Limit::Count(requested)).offset(offset);

        debug!(path, offset, requested, "Fetching page");
        let raw = client.parameterized_request(path, &page_params).await?;
        ensure_ok(&raw, &format!("Request to {path} returned error"))?;
        let page = page_items(&raw)?;
        pages += 1;

        let returned = (page.len() as u64).min(requested);
        items.extend(page.iter().take(requested as usize).map(E::from_envelope));
        offset += returned;
        if let Some(r) = remaining.as_mut() {
            *r -= returned;
        }

        if returned < requested || remaining == Some(0) {
            break;
        }
    }

    info!(path, pages, items = items.len(), "Paginated fetch complete");
    Ok(items)
}
