//! services/api/src/web/persist_task.rs
//!
//! This module contains the background "worker" that writes game records to the
//! durable store. Handlers hand records off and never wait for the write.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wikidle_core::ports::GameStore;
use wikidle_core::GameRecord;

/// Records waiting beyond this are dropped rather than queued.
pub const PERSIST_QUEUE_CAPACITY: usize = 1024;

/// The sending half of the persistence worker.
#[derive(Clone)]
pub struct PersistQueue {
    sender: mpsc::Sender<GameRecord>,
}

impl PersistQueue {
    /// Starts the worker. It stops once every `PersistQueue` clone is dropped.
    pub fn spawn(store: Arc<dyn GameStore>) -> (Self, JoinHandle<()>) {
        let (queue, receiver) = Self::bounded(PERSIST_QUEUE_CAPACITY);
        let handle = tokio::spawn(persist_process(store, receiver));
        (queue, handle)
    }

    fn bounded(capacity: usize) -> (Self, mpsc::Receiver<GameRecord>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Queues a record for writing. Never waits: a full queue drops the record.
    pub fn dispatch(&self, record: GameRecord) {
        match self.sender.try_send(record) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(record)) => warn!(
                "Persistence queue is full; dropping game {} for player {}",
                record.day, record.player_id
            ),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Persistence worker is gone; dropping game record.")
            }
        }
    }
}

/// The main loop of the persistence worker.
async fn persist_process(
    store: Arc<dyn GameStore>,
    mut receiver: mpsc::Receiver<GameRecord>,
) {
    info!("Persistence worker started.");

    while let Some(record) = receiver.recv().await {
        let GameRecord {
            player_id,
            day,
            game_data,
        } = record;

        match store.save_game_record(player_id, day, game_data).await {
            Ok(()) => debug!("Saved game {} for player {}", day, player_id),
            Err(e) => error!("Failed to save game {} for player {}: {:?}", day, player_id, e),
        }
    }

    info!("Persistence worker stopped.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn dispatched_records_reach_the_store() {
        let store = Arc::new(MemoryStore::new());
        let (queue, handle) = PersistQueue::spawn(store.clone());
        let player_id = Uuid::new_v4();
        let day = "20240310".parse().unwrap();

        queue.dispatch(GameRecord {
            player_id,
            day,
            game_data: json!({"i": "20240310", "s": ["sol"], "w": true}),
        });
        drop(queue);
        handle.await.unwrap();

        assert_eq!(store.count_wins(day).await.unwrap(), 1);
        assert!(store.game_record(player_id, day).await.is_some());
    }

    #[tokio::test]
    async fn a_full_queue_drops_records_without_waiting() {
        let (queue, mut receiver) = PersistQueue::bounded(2);
        let day = "20240310".parse().unwrap();
        let players: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        for player_id in &players {
            queue.dispatch(GameRecord {
                player_id: *player_id,
                day,
                game_data: json!({"i": "20240310", "s": [], "w": false}),
            });
        }
        drop(queue);

        let mut received = Vec::new();
        while let Some(record) = receiver.recv().await {
            received.push(record.player_id);
        }
        assert_eq!(received, players[..2].to_vec());
    }
}
