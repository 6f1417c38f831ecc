//! Transcript replay for the `hangouts-replay` binary.
//!
//! A transcript is a JSON document describing one conversation: its record,
//! the events already known, live pushes to deliver afterwards, and messages
//! to send. The replay runs everything through a [`ConversationStore`] backed
//! by the [`OfflineClient`] and logs the resulting timeline.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use futures::future::join_all;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::conversation::{
    ChatClient, Conversation, ConversationEvent, ConversationId, ConversationList,
    ConversationObserver, ConversationResult, ConversationStore, EventKind, MessageDraft, OfflineClient,
    StoreConfig, TypingStatus, UserId, WatermarkNotification, WireEvent, init_tracing,
};

/// Replay input.
#[derive(Clone, Debug, Deserialize)]
pub struct Transcript {
    /// Local user.
    pub self_user: UserId,
    /// Store configuration.
    #[serde(default)]
    pub config: StoreConfig,
    /// Conversation record.
    pub conversation: Conversation,
    /// Events known before the replay starts.
    #[serde(default)]
    pub events: Vec<WireEvent>,
    /// Events pushed while the conversation is open.
    #[serde(default)]
    pub live: Vec<WireEvent>,
    /// Plain-text messages to send, in order.
    #[serde(default)]
    pub outgoing: Vec<String>,
    /// Mark everything read at the end.
    #[serde(default)]
    pub mark_read: bool,
}

impl Transcript {
    /// Parse a transcript from JSON.
    ///
    /// # Errors
    /// Returns `Serialization` if the JSON is malformed.
    pub fn from_json_str(json: &str) -> ConversationResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a transcript from a file.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read or `Serialization` if it is
    /// malformed.
    pub fn from_path(path: impl AsRef<Path>) -> ConversationResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Outcome of a replay.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplaySummary {
    /// Conversation display name.
    pub display_name: String,
    /// Cached events after the replay.
    pub events: usize,
    /// Cached chat messages after the replay.
    pub messages: usize,
    /// Unread events after the replay.
    pub unread: usize,
    /// Messages the client accepted.
    pub sent: usize,
}

struct TimelineLogger;

impl ConversationObserver for TimelineLogger {
    fn on_typing_changed(&self, conversation: &ConversationId, user: &UserId, status: TypingStatus) {
        info!(conversation = %conversation, user = %user, ?status, "typing");
    }

    fn on_event(&self, conversation: &ConversationId, event: &ConversationEvent) {
        info!(
            conversation = %conversation,
            event = %event.id,
            sender = %event.sender,
            kind = %event.kind,
            "live event"
        );
    }

    fn on_watermark_notification(
        &self,
        conversation: &ConversationId,
        notification: &WatermarkNotification,
    ) {
        info!(
            conversation = %conversation,
            user = %notification.user_id,
            read = %notification.read_timestamp,
            "watermark"
        );
    }
}

fn describe(event: &ConversationEvent) -> String {
    match &event.kind {
        EventKind::ChatMessage(message) => message.text(),
        EventKind::Rename(rename) => format!("renamed to {}", rename.new_name),
        EventKind::MembershipChange(change) => {
            format!("{:?} {} user(s)", change.change_type, change.participant_ids.len())
        }
        EventKind::Generic => String::new(),
    }
}

/// Feed a transcript through a store and report the result.
///
/// # Errors
/// Returns an error if the config is invalid, no runtime is available, or a
/// client call fails.
pub async fn replay(transcript: Transcript) -> ConversationResult<ReplaySummary> {
    let Transcript {
        self_user,
        config,
        conversation,
        events,
        live,
        outgoing,
        mark_read,
    } = transcript;

    let client: Arc<dyn ChatClient> = Arc::new(OfflineClient::new());
    let list = ConversationList::new();
    let store = list.insert(ConversationStore::new(
        client,
        self_user,
        conversation,
        events,
        config.with_env_overrides()?,
    )?);
    let logger: Arc<dyn ConversationObserver> = Arc::new(TimelineLogger);
    store.set_observer(Some(logger));

    for event in live {
        if let Err(err) = list.route_event(event) {
            warn!(%err, "skipping live event");
        }
    }

    let sends: Vec<_> = outgoing
        .iter()
        .map(|text| store.send_message(MessageDraft::text(text)))
        .collect();
    let sent = join_all(sends)
        .await
        .into_iter()
        .filter(Result::is_ok)
        .count();

    for event in store.events().iter() {
        info!(
            at = %event.timestamp,
            sender = %event.sender,
            kind = %event.kind,
            "{}",
            describe(event)
        );
    }

    if mark_read {
        store.update_read_timestamp(None).await?;
    }

    let summary = ReplaySummary {
        display_name: store.display_name(),
        events: store.events().len(),
        messages: store.messages().len(),
        unread: store.unread_events().len(),
        sent,
    };
    info!(
        conversation = %summary.display_name,
        events = summary.events,
        unread = summary.unread,
        sent = summary.sent,
        "replay finished"
    );
    Ok(summary)
}

/// Binary entry: replay the transcript named by the first argument.
///
/// An optional second argument names a config file that replaces the
/// transcript's own `config`.
///
/// # Returns
/// `ExitCode::SUCCESS` when the replay completes, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        init_tracing(&StoreConfig::default().log_filter);
        error!("usage: hangouts-replay <transcript.json> [config.json]");
        return ExitCode::from(1);
    };

    let loaded = Transcript::from_path(&path).and_then(|mut transcript| {
        if let Some(config_path) = std::env::args().nth(2) {
            transcript.config = StoreConfig::from_path(config_path)?;
        }
        Ok(transcript)
    });
    let transcript = match loaded {
        Ok(transcript) => transcript,
        Err(e) => {
            init_tracing(&StoreConfig::default().log_filter);
            error!("Failed to load transcript {path}: {e}");
            return ExitCode::from(1);
        }
    };
    init_tracing(&transcript.config.log_filter);
    info!("Replaying {path} with hangouts_store v{}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(replay(transcript)) {
        error!("Replay failed: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
