//! Graceful process teardown (§5): flush every dirty bundle, announce our
//! departure on each hub, then let the caller join the tasks
//! [`crate::startup::join_configured_hubs`] handed back.

use crate::state::App;
use core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long [`run`] waits for spawned hub/accept tasks to notice the
/// disconnect and return before giving up on them.
const TASK_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Flushes every bundle [`queue::persist::SaveScheduler`] still considers
/// dirty, disconnects every hub session with a graceful quit, then waits
/// briefly for `handles` (as returned by
/// [`crate::startup::join_configured_hubs`]) to finish on their own.
///
/// A handle still running after [`TASK_JOIN_TIMEOUT`] is abandoned rather
/// than awaited forever - the sockets it owns close when the process
/// exits regardless.
pub async fn run<C: Clock>(app: &Arc<App<C>>, handles: Vec<JoinHandle<()>>) {
    flush_all_dirty_bundles(app);
    disconnect_all_hubs(app);

    let join_all = async {
        for handle in handles {
            let _ = handle.await;
        }
    };
    if tokio::time::timeout(TASK_JOIN_TIMEOUT, join_all).await.is_err() {
        logging::info_log(|f| f.hub > 0, || "timed out waiting for hub/accept tasks to exit".to_string());
    }
}

fn flush_all_dirty_bundles<C: Clock>(app: &Arc<App<C>>) {
    for token in app.save_scheduler.take_all_dirty() {
        let Some(record) = app.queue.record_for_bundle(token) else {
            continue;
        };
        if let Err(error) = app.bundle_store.save(&record) {
            logging::info_log(|f| f.queue > 0, || format!("failed to save bundle {token} during shutdown: {error}"));
        }
    }
}

fn disconnect_all_hubs<C: Clock>(app: &Arc<App<C>>) {
    for hub_url in app.hubs.hub_urls().collect::<Vec<_>>() {
        app.hubs.with_hub(&hub_url, |session| session.disconnect(true));
    }
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

    #[tokio::test]
    async fn shutdown_with_no_hubs_or_pending_tasks_returns_immediately() {
        let workspace = TempWorkspace::new();
        let app = Arc::new(App::new(test_config(&workspace), Arc::new(FakeClock::new()), Arc::new(EmptyShare)));
        run(&app, Vec::new()).await;
    }

    #[tokio::test]
    async fn flushes_every_dirty_bundle_before_returning() {
        let workspace = TempWorkspace::new();
        let app = Arc::new(App::new(test_config(&workspace), Arc::new(FakeClock::new()), Arc::new(EmptyShare)));
        let source = Source::new(synthetic_nmdc_cid("alice", "dchub://hub.example:411"), "alice", "dchub://hub.example:411");
        let (token, errors) = app
            .queue
            .add_bundle_directory("/downloads/release", &[("/downloads/release/a.bin".to_string(), 100, hash_leaf(b"a"), source)], Priority::Normal, None)
            .unwrap();
        assert!(errors.is_empty());
        app.save_scheduler.mark_dirty(token);

        run(&app, Vec::new()).await;

        let saved = app.bundle_store.load_all().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].token, token);
    }
}
