// SPDX-License-Identifier: MIT

//! Single source of truth: the current snapshot plus its subscribers

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::command::Command;
use super::snapshot::{Snapshot, SnapshotProvider};
use crate::kit::error::StoreError;

/// Called with every committed snapshot
pub type Subscriber = Arc<dyn Fn(&Snapshot) + Send + Sync>;

const HISTORY_LIMIT: usize = 100;

struct Inner {
    current: Arc<Snapshot>,
    history: VecDeque<Arc<Snapshot>>,
}

#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<Inner>>,
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
}

impl Store {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                current: Arc::new(initial),
                history: VecDeque::with_capacity(HISTORY_LIMIT),
            })),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn subscribe(&self, subscriber: Subscriber) {
        self.subscribers.write().await.push(subscriber);
    }

    /// Apply `command` and record the previous snapshot for undo
    pub async fn commit(&self, command: Command) -> Result<Arc<Snapshot>, StoreError> {
        self.commit_with(command, true).await
    }

    /// Apply `command` atomically. On error the current snapshot is kept.
    pub async fn commit_with(
        &self,
        command: Command,
        record_history: bool,
    ) -> Result<Arc<Snapshot>, StoreError> {
        let committed = {
            let mut inner = self.inner.write().await;
            let mut next = command.apply(&inner.current)?;
            next.revision = inner.current.revision + 1;
            next.committed_at = Utc::now();
            let next = Arc::new(next);

            let previous = std::mem::replace(&mut inner.current, next.clone());
            if record_history {
                if inner.history.len() == HISTORY_LIMIT {
                    inner.history.pop_front();
                }
                inner.history.push_back(previous);
            }
            next
        };
        log::debug!(
            "Committed {} at revision {}",
            command.kind(),
            committed.revision
        );
        self.notify(&committed).await;
        Ok(committed)
    }

    /// Restore the snapshot before the last recorded commit. The restored
    /// state gets a new revision number.
    pub async fn undo(&self) -> Option<Arc<Snapshot>> {
        let restored = {
            let mut inner = self.inner.write().await;
            let previous = inner.history.pop_back()?;
            let mut restored = (*previous).clone();
            restored.revision = inner.current.revision + 1;
            restored.committed_at = Utc::now();
            let restored = Arc::new(restored);
            inner.current = restored.clone();
            restored
        };
        self.notify(&restored).await;
        Some(restored)
    }

    pub async fn can_undo(&self) -> bool {
        !self.inner.read().await.history.is_empty()
    }

    async fn notify(&self, snapshot: &Snapshot) {
        let subscribers = self.subscribers.read().await.clone();
        for subscriber in subscribers {
            subscriber(snapshot);
        }
    }
}

#[async_trait]
impl SnapshotProvider for Store {
    async fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.read().await.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stagecraft::model::{Node, Project};
    use serde_json::json;
    use std::sync::Mutex;

    fn store() -> Store {
        let mut project: Project = serde_json::from_value(json!({
            "pages": [{"id": "home"}, {"id": "about"}]
        }))
        .unwrap();
        project.add_node(Node::new("btn", "Button"));
        Store::new(Snapshot::new(project))
    }

    fn set(path: &str, value: serde_json::Value) -> Command {
        Command::SetData {
            path: path.to_string(),
            value,
        }
    }

    #[tokio::test]
    async fn test_commit_bumps_revision() {
        let store = store();
        let first = store.commit(set("a", json!(1))).await.unwrap();
        let second = store.commit(set("b", json!(2))).await.unwrap();
        assert_eq!(first.revision, 1);
        assert_eq!(second.revision, 2);
        assert!(second.committed_at >= first.committed_at);
        assert_eq!(store.snapshot().await.data, json!({"a": 1, "b": 2}));
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_state() {
        let store = store();
        store.commit(set("a", json!(1))).await.unwrap();
        let err = store
            .commit(Command::Navigate {
                page_id: "missing".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::PageNotFound("missing".to_string()));
        let current = store.snapshot().await;
        assert_eq!(current.revision, 1);
        assert_eq!(current.ui.active_page.as_deref(), Some("home"));
    }

    #[tokio::test]
    async fn test_subscribers_see_each_commit() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store
            .subscribe(Arc::new(move |s: &Snapshot| {
                sink.lock().unwrap().push(s.revision);
            }))
            .await;

        store.commit(set("a", json!(1))).await.unwrap();
        store
            .commit(Command::Navigate {
                page_id: "about".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_undo_restores_previous_state() {
        let store = store();
        store.commit(set("a", json!(1))).await.unwrap();
        store
            .commit_with(set("scratch", json!(true)), false)
            .await
            .unwrap();
        store.commit(set("a", json!(2))).await.unwrap();

        let restored = store.undo().await.unwrap();
        assert_eq!(restored.data, json!({"a": 1, "scratch": true}));
        assert_eq!(restored.revision, 4);

        let restored = store.undo().await.unwrap();
        assert_eq!(restored.data, json!({}));
        assert!(!store.can_undo().await);
        assert!(store.undo().await.is_none());
    }

    #[tokio::test]
    async fn test_history_keeps_the_latest_snapshots() {
        let store = store();
        for i in 0..HISTORY_LIMIT + 5 {
            store.commit(set("n", json!(i))).await.unwrap();
        }

        let mut undone = 0;
        let mut oldest = None;
        while let Some(snapshot) = store.undo().await {
            undone += 1;
            oldest = Some(snapshot);
        }
        assert_eq!(undone, HISTORY_LIMIT);
        // The first five commits fell off the front
        assert_eq!(oldest.unwrap().data, json!({"n": 4}));
    }
}
