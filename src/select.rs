//! Candidate selection: first eligible feed item, recorded before it is returned.

use crate::feed::FeedClient;
use crate::ledger::{LedgerError, SeenLedger};
use crate::types::Candidate;

/// Eligible means safe (not adult, not video) and never selected before.
pub fn is_eligible(candidate: &Candidate, ledger: &(impl SeenLedger + ?Sized)) -> bool {
    candidate.is_safe_image() && !ledger.contains(&candidate.id)
}

/// Pick the first eligible candidate among the top `limit` feed items.
///
/// The winner's id is recorded in the ledger *before* it is returned, so a
/// crash later in the run still marks it seen and it is never retried.
///
/// A feed failure is logged and reported as `Ok(None)`; the next scheduled
/// run simply tries again. Only a ledger write failure is an error, because
/// without it the no-duplicate guarantee cannot hold.
pub fn select_next(
    feed: &(impl FeedClient + ?Sized),
    ledger: &mut (impl SeenLedger + ?Sized),
    limit: usize,
) -> Result<Option<Candidate>, LedgerError> {
    tracing::info!(limit, "fetching ranked feed");
    let candidates = match feed.fetch_ranked(limit) {
        Ok(c) => c,
        Err(error) => {
            tracing::error!(operation = "fetch_feed", %error, "feed fetch failed");
            return Ok(None);
        }
    };

    let Some(chosen) = candidates
        .into_iter()
        .take(limit)
        .find(|c| is_eligible(c, &*ledger))
    else {
        tracing::info!("no eligible candidate in feed window");
        return Ok(None);
    };

    ledger.record(&chosen.id)?;
    tracing::info!(candidate = %chosen.id, title = %chosen.title, "candidate selected");
    Ok(Some(chosen))
}
