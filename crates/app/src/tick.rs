//! The recurring one-second maintenance pass (§5): debounced persistence
//! saves, auto-priority re-scoring, hub presence refresh, alternate-source
//! search dispatch, and SUDP key expiry.
//!
//! Auto-kick and MCN rebalancing (§4.6.2) need live per-connection upload
//! telemetry - which user currently holds which slot, at what measured
//! speed - that only exists once a connection pool is tracking running
//! transfers. This driver stops at the handshake/negotiation layer (see
//! [`crate::connect`]'s module doc), so those two ticks are left for
//! whatever owns that pool to drive directly against
//! [`upload::UploadManager::auto_kick_candidates`]/`mcn_rebalance_victim`
//! rather than invented here against data this crate doesn't have.

use crate::state::App;
use core::Clock;
use std::sync::Arc;
use std::time::Duration;

/// How often [`run_once`] should be called.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Runs every recurring maintenance step once. Intended to be called
/// from a `tokio::time::interval(TICK_INTERVAL)` loop for the process's
/// lifetime.
pub fn run_once<C: Clock>(app: &Arc<App<C>>) {
    flush_dirty_bundles(app);
    app.queue.run_progress_autoprio();
    refresh_hub_presence(app);
    dispatch_alternate_source_search(app);
    app.search.key_store().sweep_expired();
}

/// Saves every bundle [`queue::persist::SaveScheduler`] has marked due
/// since the last tick (§4.5.10: "debounced to once per bundle per
/// 20 s").
fn flush_dirty_bundles<C: Clock>(app: &Arc<App<C>>) {
    for token in app.save_scheduler.take_due() {
        save_bundle(app, token);
    }
}

fn save_bundle<C: Clock>(app: &Arc<App<C>>, token: u32) {
    let Some(record) = app.queue.record_for_bundle(token) else {
        return;
    };
    if let Err(error) = app.bundle_store.save(&record) {
        logging::info_log(|f| f.queue > 0, || format!("failed to save bundle {token}: {error}"));
    }
}

/// Re-pushes our own presence (`BINF`/`$MyINFO`) on every hub whose
/// throttle interval has elapsed (§4.2: "at most one per 60 s" unless
/// forced).
fn refresh_hub_presence<C: Clock>(app: &Arc<App<C>>) {
    for hub_url in app.hubs.hub_urls().collect::<Vec<_>>() {
        app.hubs.with_hub(&hub_url, |session| session.refresh_info(false));
    }
}

/// Issues the next due alternate-source search (§4.5.9: "a `TTH`-typed
/// search is sent ... for the first-queued file of the bundle"), cycling
/// through queued bundles one per tick so no single bundle monopolises
/// the pacing window [`search::SearchManager`] already enforces per hub.
fn dispatch_alternate_source_search<C: Clock>(app: &Arc<App<C>>) {
    let Some(token) = app.queue.next_search_candidate() else {
        return;
    };
    let Some(tth) = app.queue.first_queued_file_tth(token) else {
        app.queue.mark_searched(token);
        return;
    };
    let query = search::SearchQuery {
        tth: Some(tth.to_base32()),
        ..search::SearchQuery::default()
    };
    let hub_urls: Vec<String> = app.hubs.hub_urls().filter(|hub_url| app.hubs.is_active_hub(hub_url)).collect();
    for (hub_url, search_token) in app.search.queue_search(&hub_urls, query.clone(), format!("bundle:{token}"), false) {
        let token_str = search_token.to_string();
        app.hubs.with_hub(&hub_url, |session| session.queue_search(&query, &token_str));
    }
    app.queue.mark_searched(token);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{test_config, EmptyShare};
    use checksums::tth::hash_leaf;
    use core::clock::FakeClock;
    use identity::cid::synthetic_nmdc_cid;
    use queue::priority::Priority;
    use queue::source::Source;
    use test_support::TempWorkspace;

    fn source(seed: &str) -> Source {
        Source::new(synthetic_nmdc_cid(seed, "dchub://hub.example:411"), seed, "dchub://hub.example:411")
    }

    #[test]
    fn an_empty_queue_ticks_without_saving_or_searching_anything() {
        let workspace = TempWorkspace::new();
        let app = Arc::new(App::new(test_config(&workspace), Arc::new(FakeClock::new()), Arc::new(EmptyShare)));
        run_once(&app);
        assert_eq!(app.queue.bundle_count(), 0);
    }

    #[test]
    fn a_dirty_bundle_is_saved_once_the_scheduler_marks_it_due() {
        let workspace = TempWorkspace::new();
        let app = Arc::new(App::new(test_config(&workspace), Arc::new(FakeClock::new()), Arc::new(EmptyShare)));
        let (token, errors) = app
            .queue
            .add_bundle_directory("/downloads/release", &[("/downloads/release/a.bin".to_string(), 100, hash_leaf(b"a"), source("alice"))], Priority::Normal, None)
            .unwrap();
        assert!(errors.is_empty());

        app.save_scheduler.mark_dirty(token);
        flush_dirty_bundles(&app);

        let saved = app.bundle_store.load_all().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].token, token);
    }

    #[test]
    fn dispatch_with_no_queued_bundles_and_no_hubs_is_a_no_op() {
        let workspace = TempWorkspace::new();
        let app = Arc::new(App::new(test_config(&workspace), Arc::new(FakeClock::new()), Arc::new(EmptyShare)));
        dispatch_alternate_source_search(&app);
    }
}
