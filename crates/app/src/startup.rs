//! One-shot bootstrap: reloading the persisted queue, importing a legacy
//! `Queue.xml` once, and joining every configured hub (§4.5.10, §9).

use crate::state::App;
use core::Clock;
use persistence::{legacy, BundleRecord};
use queue::persist::from_record;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Reloads every on-disk bundle record into the live queue, then imports
/// a legacy monolithic `Queue.xml` exactly once and deletes it (§4.5.10:
/// "Loading is parallel over all bundle files" / §6.4's one-time
/// migration).
///
/// A record whose token collides with one already restored is discarded
/// with a log line, mirroring the per-file skip-and-continue policy
/// [`queue::persist::from_record`] already applies within one bundle.
pub fn reload_queue<C: Clock>(app: &Arc<App<C>>) {
    let mut records = match app.bundle_store.load_all() {
        Ok(records) => records,
        Err(error) => {
            logging::info_log(|f| f.queue > 0, || format!("failed to load bundle store: {error}"));
            Vec::new()
        }
    };

    if app.config.legacy_queue_xml.exists() {
        match legacy::import(&app.config.legacy_queue_xml) {
            Ok(legacy_records) => {
                for record in &legacy_records {
                    if let Err(error) = app.bundle_store.save(record) {
                        logging::info_log(|f| f.queue > 0, || format!("failed to migrate legacy bundle {}: {error}", record.token));
                        continue;
                    }
                }
                records.extend(legacy_records);
                if let Err(error) = legacy::delete(&app.config.legacy_queue_xml) {
                    logging::info_log(|f| f.queue > 0, || format!("failed to remove migrated legacy queue file: {error}"));
                }
            }
            Err(error) => {
                logging::info_log(|f| f.queue > 0, || format!("failed to import legacy queue file: {error}"));
            }
        }
    }

    restore_all(app, records);
}

fn restore_all<C: Clock>(app: &Arc<App<C>>, records: Vec<BundleRecord>) {
    for record in records {
        let token = record.token;
        let (bundle, files) = from_record(&record);
        if !app.queue.restore_bundle(bundle, files) {
            logging::info_log(|f| f.queue > 0, || format!("discarding bundle {token}: a bundle with that token is already queued"));
        }
    }
    logging::info_log(|f| f.queue > 0, || format!("restored {} bundles from disk", app.queue.bundle_count()));
}

/// Registers and connects every hub in `app.config.hubs`, each on its own
/// task (§5: "driven from a single task"), plus the inbound C-C accept
/// loop on `app.config.listen_port`.
///
/// Returns the spawned tasks' handles; a caller that wants to await
/// shutdown can join them, but [`crate::shutdown::run`] is the normal
/// way to tear them down.
pub fn join_configured_hubs<C: Clock>(app: &Arc<App<C>>) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(app.config.hubs.len() + 1);

    for entry in &app.config.hubs {
        let hub_config = app.config.hub_config(entry);
        if let Err(error) = app.hubs.create_hub(hub_config.clone()) {
            logging::info_log(|f| f.hub > 0, || format!("could not register hub {}: {error}", entry.hub_url));
            continue;
        }
        let app = Arc::clone(app);
        handles.push(tokio::spawn(async move {
            if let Err(error) = crate::hub_task::run(app, hub_config.clone()).await {
                logging::info_log(|f| f.hub > 0, || format!("hub task for {} ended: {error}", hub_config.hub_url));
            }
        }));
    }

    let accept_app = Arc::clone(app);
    handles.push(tokio::spawn(async move {
        if let Err(error) = crate::connect::accept_loop(accept_app).await {
            logging::info_log(|f| f.conn > 0, || format!("C-C accept loop ended: {error}"));
        }
    }));

    handles
}
