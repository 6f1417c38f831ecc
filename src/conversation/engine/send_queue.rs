//! Per-conversation FIFO queue for outgoing messages.
//!
//! Jobs run one at a time on a spawned tokio task, in the order they were
//! enqueued. A job is finished (success or failure) before the next starts,
//! so an image upload followed by its send can never interleave with another
//! message of the same conversation.

use std::future::Future;
use std::pin::Pin;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::conversation::core::errors::{ConversationError, ConversationResult};
use crate::conversation::core::ids::ConversationId;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Sequential job queue bound to one conversation.
#[derive(Debug)]
pub struct SendQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl SendQueue {
    /// Spawn the queue worker on the current tokio runtime.
    ///
    /// The worker drains already-queued jobs and exits once the queue is
    /// dropped.
    ///
    /// # Errors
    /// Returns `NoRuntime` when called outside a tokio runtime.
    pub fn spawn(conversation_id: ConversationId) -> ConversationResult<Self> {
        let handle = Handle::try_current().map_err(|_| ConversationError::NoRuntime)?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        handle.spawn(async move {
            debug!(conversation = %conversation_id, "send queue started");
            while let Some(job) = rx.recv().await {
                job.await;
            }
            debug!(conversation = %conversation_id, "send queue stopped");
        });

        Ok(Self { tx })
    }

    /// Enqueue a job now and return a future resolving to its result.
    ///
    /// The position in the queue is fixed by this call, not by when the
    /// returned future is first polled.
    pub fn enqueue<F, T>(&self, job: F) -> impl Future<Output = ConversationResult<T>> + Send + use<F, T>
    where
        F: Future<Output = ConversationResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let wrapped: Job = Box::pin(async move {
            let _ = reply_tx.send(job.await);
        });
        let queued = self.tx.send(wrapped).is_ok();

        async move {
            if !queued {
                return Err(ConversationError::QueueClosed);
            }
            reply_rx.await.map_err(|_| ConversationError::QueueClosed)?
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_jobs_run_in_enqueue_order() {
        let Ok(queue) = SendQueue::spawn(ConversationId::new("c")) else {
            panic!("runtime available in tokio test");
        };
        let log = Arc::new(Mutex::new(Vec::new()));

        let slow_log = Arc::clone(&log);
        let slow = queue.enqueue(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            slow_log.lock().map(|mut v| v.push("slow")).ok();
            Ok(1)
        });
        let fast_log = Arc::clone(&log);
        let fast = queue.enqueue(async move {
            fast_log.lock().map(|mut v| v.push("fast")).ok();
            Ok(2)
        });

        let (fast_result, slow_result) = tokio::join!(fast, slow);
        assert_eq!(fast_result.ok(), Some(2));
        assert_eq!(slow_result.ok(), Some(1));
        let order = log.lock().map(|v| v.clone()).unwrap_or_default();
        assert_eq!(order, vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_failed_job_does_not_block_next() {
        let Ok(queue) = SendQueue::spawn(ConversationId::new("c")) else {
            panic!("runtime available in tokio test");
        };
        let failing = queue.enqueue(async { Err::<(), _>(ConversationError::Client("down".to_string())) });
        let next = queue.enqueue(async { Ok(()) });
        assert!(failing.await.is_err());
        assert!(next.await.is_ok());
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        assert!(matches!(
            SendQueue::spawn(ConversationId::new("c")),
            Err(ConversationError::NoRuntime)
        ));
    }
}
