//! Async history executor configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the async history pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// History jobs are delivered through an external message queue instead of
    /// the in-process job table.
    ///
    /// In message-queue mode the broker owns redelivery, so recovering an
    /// expired job only clears the server-side lock expiration.
    #[serde(default)]
    pub async_history_executor_message_queue_mode: bool,
}

impl HistoryConfig {
    /// Whether history jobs are dispatched through an external message queue.
    pub fn is_async_history_executor_message_queue_mode(&self) -> bool {
        self.async_history_executor_message_queue_mode
    }
}
