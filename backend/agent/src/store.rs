use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use parley_core::ConversationTurn;

use crate::window::RollingWindow;

pub type SharedWindow = Arc<Mutex<RollingWindow<ConversationTurn>>>;

/// Conversation key to rolling window. Windows are created on first contact
/// and live as long as the store.
pub struct ConversationStore {
    capacity: usize,
    windows: RwLock<HashMap<String, SharedWindow>>,
}

impl ConversationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Capacity given to new and reset windows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The window for `key`, created empty if this is the first message.
    pub async fn window(&self, key: &str) -> SharedWindow {
        if let Some(window) = self.windows.read().await.get(key) {
            return Arc::clone(window);
        }
        let mut windows = self.windows.write().await;
        Arc::clone(windows.entry(key.to_string()).or_insert_with(|| {
            debug!(key = %key, capacity = self.capacity, "New conversation");
            Arc::new(Mutex::new(RollingWindow::new(self.capacity)))
        }))
    }

    /// Number of known conversations.
    pub async fn len(&self) -> usize {
        self.windows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.windows.read().await.is_empty()
    }
}
