//! Conversation store, registry, observers and the outgoing send queue.

pub mod list;
pub mod observer;
pub mod send_queue;
pub mod store;

pub use list::ConversationList;
pub use observer::{ConversationListObserver, ConversationObserver};
pub use send_queue::SendQueue;
pub use store::{ConversationStore, SendFuture};
