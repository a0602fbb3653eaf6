//! Concrete payload types for the hook points and listener events named in
//! §4.8, and the [`HookRegistry`]/[`ListenerRegistry`] that collect them.
//!
//! Payloads here use plain strings/numbers rather than `queue`'s or
//! `hub`'s domain types (`QueueFile`, `Bundle`, `OnlineUser`) to keep this
//! crate at the bottom of the dependency graph - those crates build a
//! payload from their own state at the call site.

use crate::bus::{Hook, Listener};

/// Input to the `source_validation` hook: a newly proposed source for a
/// queued file.
#[derive(Clone, Debug)]
pub struct SourceValidationInput {
    /// The source's CID, base32-encoded.
    pub cid: String,
    /// The target file path the source would attach to.
    pub target_path: String,
    /// The hub URL the source was observed on.
    pub hub_hint: String,
}

/// Input to the `bundle_file_validation` hook: one file inside a bundle
/// that has just finished downloading, before the whole bundle is
/// considered.
#[derive(Clone, Debug)]
pub struct BundleFileValidationInput {
    /// The bundle's persistent token.
    pub bundle_token: u32,
    /// The file's final on-disk path.
    pub target_path: String,
    /// The file's TTH, base32-encoded.
    pub tth: String,
}

/// Input to the `bundle_validation` hook: a bundle whose files are all
/// present, prior to being marked fully downloaded.
#[derive(Clone, Debug)]
pub struct BundleValidationInput {
    /// The bundle's persistent token.
    pub bundle_token: u32,
    /// The bundle's target directory or file path.
    pub target: String,
}

/// Input to the `bundle_completion` hook: a bundle whose files have all
/// finished and passed per-file validation.
#[derive(Clone, Debug)]
pub struct BundleCompletionInput {
    /// The bundle's persistent token.
    pub bundle_token: u32,
    /// The bundle's target directory or file path.
    pub target: String,
}

/// Input to the `file_completion` hook: one file that has just moved from
/// its temp path to its final target.
#[derive(Clone, Debug)]
pub struct FileCompletionInput {
    /// The file's final on-disk path.
    pub target_path: String,
    /// The file's TTH, base32-encoded.
    pub tth: String,
    /// The file's size in bytes.
    pub size: u64,
}

/// Input to the `outgoing_private_message` hook: a PM about to be sent,
/// which a subscriber may annotate (e.g. third-person formatting) or veto
/// (e.g. a muted recipient).
#[derive(Clone, Debug)]
pub struct OutgoingPrivateMessageInput {
    /// The recipient's CID, base32-encoded.
    pub to_cid: String,
    /// The hub this message is being sent through.
    pub hub_url: String,
    /// The message text.
    pub text: String,
}

/// Input to the `slot_type` hook: an upload request about to be classified
/// (§4.6.1), letting a subscriber override the class the engine would
/// otherwise pick (e.g. a reserved-slot list).
#[derive(Clone, Debug)]
pub struct SlotTypeInput {
    /// The requesting user's CID, base32-encoded.
    pub cid: String,
    /// The requested file path.
    pub file_path: String,
    /// The file size in bytes, if known.
    pub file_size: Option<u64>,
}

/// A subscriber's requested override of the slot class `upload` would
/// otherwise assign, by name (e.g. `"standard"`, `"mcn"`). `None` means the
/// subscriber has no opinion and the engine's own classification stands.
pub type SlotTypeOverride = Option<String>;

/// Input to the `incoming_chat_message` hook: a hub or PM chat line, which
/// a subscriber may annotate (e.g. highlight keywords) or veto (e.g.
/// an ignore list).
#[derive(Clone, Debug)]
pub struct IncomingChatMessageInput {
    /// The hub this message arrived on.
    pub hub_url: String,
    /// The sender's nick.
    pub from_nick: String,
    /// The message text.
    pub text: String,
}

/// Bundle-lifecycle listener events (added/removed/priority/status/sources
/// changed).
#[derive(Clone, Debug)]
pub enum BundleEvent {
    /// A bundle was added to the queue.
    Added {
        /// The bundle's persistent token.
        token: u32,
    },
    /// A bundle was removed from the queue.
    Removed {
        /// The bundle's persistent token.
        token: u32,
    },
    /// A bundle's priority changed.
    PriorityChanged {
        /// The bundle's persistent token.
        token: u32,
    },
    /// A bundle's status changed.
    StatusChanged {
        /// The bundle's persistent token.
        token: u32,
    },
    /// A bundle's source set changed.
    SourcesChanged {
        /// The bundle's persistent token.
        token: u32,
    },
    /// A bundle finished downloading and passed validation.
    Completed {
        /// The bundle's persistent token.
        token: u32,
    },
}

/// File-lifecycle listener events.
#[derive(Clone, Debug)]
pub enum FileEvent {
    /// A file was added to the queue.
    Added {
        /// The file's target path.
        target_path: String,
    },
    /// A file finished downloading.
    Finished {
        /// The file's target path.
        target_path: String,
    },
    /// A file's source set changed.
    SourcesChanged {
        /// The file's target path.
        target_path: String,
    },
    /// A file's status changed.
    StatusChanged {
        /// The file's target path.
        target_path: String,
    },
    /// A periodic progress tick for a file with an active transfer.
    Tick {
        /// The file's target path.
        target_path: String,
        /// Bytes transferred so far.
        done_bytes: u64,
    },
}

/// User-presence listener events.
#[derive(Clone, Debug)]
pub enum UserEvent {
    /// A user came online on some hub.
    Connected {
        /// The user's CID, base32-encoded.
        cid: String,
    },
    /// A user went offline on the hub it was last seen on.
    Disconnected {
        /// The user's CID, base32-encoded.
        cid: String,
    },
    /// A user's `INF`/`$MyINFO` fields changed.
    Updated {
        /// The user's CID, base32-encoded.
        cid: String,
    },
}

/// Search-traffic listener events.
#[derive(Clone, Debug)]
pub enum SearchEvent {
    /// An outgoing search was queued to a hub.
    Outgoing {
        /// The hub the search was sent to.
        hub_url: String,
        /// The correlation token attached to the search.
        token: String,
    },
    /// A search result arrived, matching `token`.
    Incoming {
        /// The correlation token the result matched.
        token: String,
        /// The responding user's CID, base32-encoded.
        from_cid: String,
    },
}

/// Chat listener event, fired after [`IncomingChatMessageInput`] passes the
/// veto hook, for subscribers that only want to observe.
#[derive(Clone, Debug)]
pub struct ChatEvent {
    /// The hub this message arrived on.
    pub hub_url: String,
    /// The sender's nick.
    pub from_nick: String,
    /// The message text.
    pub text: String,
}

/// Every validation [`Hook`] named in §4.8, collected so a caller can pass
/// one `Arc<HookRegistry>` around instead of eight separate hook handles.
#[derive(Default)]
pub struct HookRegistry {
    /// Vetoes or annotates a newly proposed download source.
    pub source_validation: Hook<SourceValidationInput, ()>,
    /// Vetoes or annotates one file finishing inside a bundle.
    pub bundle_file_validation: Hook<BundleFileValidationInput, ()>,
    /// Vetoes or annotates a bundle becoming fully downloaded.
    pub bundle_validation: Hook<BundleValidationInput, ()>,
    /// Vetoes or annotates a bundle's completion (e.g. missing-file scan).
    pub bundle_completion: Hook<BundleCompletionInput, ()>,
    /// Vetoes or annotates a single file's completion (e.g. SFV CRC check).
    pub file_completion: Hook<FileCompletionInput, ()>,
    /// Vetoes or annotates an outgoing private message.
    pub outgoing_private_message: Hook<OutgoingPrivateMessageInput, ()>,
    /// Lets a subscriber override the upload slot class an engine would
    /// otherwise assign.
    pub slot_type: Hook<SlotTypeInput, SlotTypeOverride>,
    /// Vetoes or annotates an incoming chat message.
    pub incoming_chat_message: Hook<IncomingChatMessageInput, ()>,
}

impl HookRegistry {
    /// Builds a fresh registry with every hook point empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source_validation: Hook::new("source_validation"),
            bundle_file_validation: Hook::new("bundle_file_validation"),
            bundle_validation: Hook::new("bundle_validation"),
            bundle_completion: Hook::new("bundle_completion"),
            file_completion: Hook::new("file_completion"),
            outgoing_private_message: Hook::new("outgoing_private_message"),
            slot_type: Hook::new("slot_type"),
            incoming_chat_message: Hook::new("incoming_chat_message"),
        }
    }
}

/// Every observe-only [`Listener`] named in §4.8.
#[derive(Default)]
pub struct ListenerRegistry {
    /// Bundle added/removed/priority/status/sources/completed.
    pub bundle: Listener<BundleEvent>,
    /// File added/finished/sources/status/tick.
    pub file: Listener<FileEvent>,
    /// User connected/disconnected/updated.
    pub user: Listener<UserEvent>,
    /// Search outgoing/incoming.
    pub search: Listener<SearchEvent>,
    /// Chat messages, post-veto.
    pub chat: Listener<ChatEvent>,
}

impl ListenerRegistry {
    /// Builds a fresh registry with every listener empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_hooks_are_independently_addressable() {
        let registry = HookRegistry::new();
        registry.bundle_completion.subscribe("test", |_input: &BundleCompletionInput| Ok(()));
        assert_eq!(registry.bundle_completion.subscriber_count(), 1);
        assert_eq!(registry.file_completion.subscriber_count(), 0);
    }

    #[test]
    fn listener_registry_events_are_independent() {
        let registry = ListenerRegistry::new();
        registry.bundle.subscribe("test", |_event: &BundleEvent| {});
        assert_eq!(registry.bundle.subscriber_count(), 1);
        assert_eq!(registry.file.subscriber_count(), 0);
    }
}
