//! Chat client abstraction.

pub mod chat_client;
pub mod offline;

pub use chat_client::{ChatClient, ClientFuture, HistoryResponse, ResponseStatus, SendMessageRequest};
pub use offline::OfflineClient;
