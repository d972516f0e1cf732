//! Per-view state holders.
//!
//! Every screen owns its slots; nothing is shared between screens. A slot
//! takes whatever response arrives last (no ordering token), and once its
//! view is torn down every late response is dropped on the floor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::api::ApiError;

/// Liveness flag shared by all slots of one view.
#[derive(Debug, Clone)]
pub struct MountToken(Arc<AtomicBool>);

impl MountToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for MountToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of a slot for rendering.
#[derive(Debug, Clone)]
pub struct SlotSnapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Default for SlotSnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
            last_updated: None,
        }
    }
}

/// One fetched value of a view.
#[derive(Debug)]
pub struct ViewSlot<T> {
    state: Arc<RwLock<SlotSnapshot<T>>>,
    token: MountToken,
}

impl<T> Clone for ViewSlot<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            token: self.token.clone(),
        }
    }
}

impl<T: Clone> ViewSlot<T> {
    pub fn new(token: &MountToken) -> Self {
        Self {
            state: Arc::new(RwLock::new(SlotSnapshot::default())),
            token: token.clone(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.token.is_mounted()
    }

    /// Store a response. On success the data is replaced; on failure the
    /// previous data stays and `failure` becomes the visible error.
    /// Returns `false` when the view is gone and nothing was written.
    pub async fn apply(&self, result: Result<T, ApiError>, failure: &str) -> bool {
        if !self.token.is_mounted() {
            tracing::debug!("dropping response for unmounted view");
            return false;
        }
        let mut state = self.state.write().await;
        // Re-check under the lock so an unmount racing the write wins.
        if !self.token.is_mounted() {
            return false;
        }
        state.loading = false;
        match result {
            Ok(data) => {
                state.data = Some(data);
                state.error = None;
                state.last_updated = Some(Utc::now());
            }
            Err(e) => {
                tracing::warn!(error = %e, "view fetch failed");
                state.error = Some(failure.to_string());
            }
        }
        true
    }

    /// Mutate loaded data in place, e.g. after the server confirmed a change.
    /// No-op when unmounted or nothing has loaded yet.
    pub async fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        if !self.token.is_mounted() {
            return false;
        }
        let mut state = self.state.write().await;
        match state.data.as_mut() {
            Some(data) => {
                f(data);
                true
            }
            None => false,
        }
    }

    pub async fn mark_loading(&self) {
        if self.token.is_mounted() {
            self.state.write().await.loading = true;
        }
    }

    pub async fn snapshot(&self) -> SlotSnapshot<T> {
        self.state.read().await.clone()
    }

    /// Loaded data, or `T::default()` when nothing has arrived.
    pub async fn data_or_default(&self) -> T
    where
        T: Default,
    {
        self.state.read().await.data.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error() -> ApiError {
        ApiError::Server { status: 500, message: None }
    }

    #[tokio::test]
    async fn last_write_wins() {
        let token = MountToken::new();
        let slot: ViewSlot<Vec<u32>> = ViewSlot::new(&token);
        assert!(slot.apply(Ok(vec![1]), "x").await);
        assert!(slot.apply(Ok(vec![2, 3]), "x").await);
        assert_eq!(slot.snapshot().await.data, Some(vec![2, 3]));
    }

    #[tokio::test]
    async fn failure_keeps_previous_data() {
        let token = MountToken::new();
        let slot: ViewSlot<Vec<u32>> = ViewSlot::new(&token);
        slot.apply(Ok(vec![1]), "x").await;
        slot.apply(Err(server_error()), "Failed to load").await;
        let snap = slot.snapshot().await;
        assert_eq!(snap.data, Some(vec![1]));
        assert_eq!(snap.error.as_deref(), Some("Failed to load"));
        assert!(!snap.loading);
    }

    #[tokio::test]
    async fn late_response_after_unmount_is_dropped() {
        let token = MountToken::new();
        let slot: ViewSlot<Vec<u32>> = ViewSlot::new(&token);
        slot.apply(Ok(vec![1]), "x").await;
        token.unmount();
        assert!(!slot.apply(Ok(vec![9]), "x").await);
        assert!(!slot.update(|v| v.push(9)).await);
        assert_eq!(slot.snapshot().await.data, Some(vec![1]));
    }

    #[tokio::test]
    async fn update_before_load_is_noop() {
        let token = MountToken::new();
        let slot: ViewSlot<Vec<u32>> = ViewSlot::new(&token);
        assert!(!slot.update(|v| v.push(1)).await);
        assert_eq!(slot.data_or_default().await, Vec::<u32>::new());
    }
}
