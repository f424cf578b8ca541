//! Periodic per-subscriber analysis broadcast
//!
//! Every subscriber gets its own loop: sleep for the configured interval,
//! run the multi-timeframe analysis, push the update through an mpsc
//! channel. The transport only adapts that channel to its socket. A closed
//! channel ends the loop and drops the subscriber from the registry.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::WsMessage;
use crate::wave_core::{AnalysisService, ProviderError};

/// Updates buffered per subscriber before a push waits
const PUSH_BUFFER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No subscribers
    Idle,
    /// At least one subscriber loop running
    Active,
}

/// Running subscriber loops keyed by subscriber id
#[derive(Default)]
pub struct SubscriberRegistry {
    tasks: RwLock<HashMap<Uuid, JoinHandle<()>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn contains(&self, id: &Uuid) -> bool {
        self.tasks.read().await.contains_key(id)
    }

    pub async fn state(&self) -> SchedulerState {
        if self.tasks.read().await.is_empty() {
            SchedulerState::Idle
        } else {
            SchedulerState::Active
        }
    }

    async fn remove(&self, id: &Uuid) -> Option<JoinHandle<()>> {
        self.tasks.write().await.remove(id)
    }
}

/// Handle returned to the transport for one subscriber
pub struct Subscription {
    pub id: Uuid,
    pub updates: mpsc::Receiver<WsMessage>,
}

pub struct BroadcastScheduler {
    service: Arc<AnalysisService>,
    registry: Arc<SubscriberRegistry>,
}

impl BroadcastScheduler {
    pub fn new(service: Arc<AnalysisService>, registry: Arc<SubscriberRegistry>) -> Self {
        Self { service, registry }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Register a subscriber and start its loop
    pub async fn subscribe(self: &Arc<Self>) -> Subscription {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(PUSH_BUFFER);

        // Hold the lock across spawn so the loop cannot deregister before it is registered
        let mut tasks = self.registry.tasks.write().await;
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move { scheduler.run_subscriber(id, tx).await });
        tasks.insert(id, handle);
        let active = tasks.len();
        drop(tasks);

        info!("Subscriber {} connected ({} active)", id, active);
        Subscription { id, updates: rx }
    }

    /// Stop a subscriber's loop and drop it from the registry
    pub async fn unsubscribe(&self, id: Uuid) {
        if let Some(handle) = self.registry.remove(&id).await {
            handle.abort();
            info!("Subscriber {} unsubscribed ({} active)", id, self.registry.len().await);
        }
    }

    /// Ticker plus the configured multi-timeframe analysis
    pub async fn build_update(&self) -> Result<WsMessage, ProviderError> {
        let ticker = self.service.ticker().await?;
        let report = self
            .service
            .aggregate_configured(self.service.config().stream_limit)
            .await;

        Ok(WsMessage::Update {
            price: ticker.last,
            analysis: report.results,
            timestamp: Utc::now(),
        })
    }

    async fn run_subscriber(self: Arc<Self>, id: Uuid, tx: mpsc::Sender<WsMessage>) {
        let interval = self.service.config().interval();
        let mut alive = true;

        if self.service.config().push_on_connect {
            alive = self.push_cycle(id, &tx).await;
        }

        while alive {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = tx.closed() => {
                    info!("Subscriber {} disconnected", id);
                    break;
                }
            }
            alive = self.push_cycle(id, &tx).await;
        }

        if self.registry.remove(&id).await.is_some() {
            info!("Subscriber {} removed ({} active)", id, self.registry.len().await);
        }
    }

    /// Build and push one update; false once the subscriber is unreachable
    async fn push_cycle(&self, id: Uuid, tx: &mpsc::Sender<WsMessage>) -> bool {
        let update = match self.build_update().await {
            Ok(update) => update,
            Err(e) => {
                warn!("Skipping update cycle for {}: {}", id, e);
                return true;
            }
        };

        if tx.send(update).await.is_err() {
            info!("Subscriber {} unreachable", id);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wave_core::provider::testing::{rising_staircase, FakeProvider};
    use crate::wave_core::{Action, AnalyzerConfig};
    use std::time::Duration;

    fn scheduler_with(provider: FakeProvider, push_on_connect: bool) -> Arc<BroadcastScheduler> {
        let config = AnalyzerConfig {
            timeframes: vec!["1h".to_string()],
            stream_limit: 500,
            push_on_connect,
            ..Default::default()
        };
        let service = Arc::new(AnalysisService::new(Arc::new(provider), config));
        Arc::new(BroadcastScheduler::new(service, Arc::new(SubscriberRegistry::new())))
    }

    fn scheduler() -> Arc<BroadcastScheduler> {
        scheduler_with(FakeProvider::new().with_candles("1h", rising_staircase()), false)
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_after_interval() {
        let scheduler = scheduler();
        assert_eq!(scheduler.registry().state().await, SchedulerState::Idle);

        let mut sub = scheduler.subscribe().await;
        assert_eq!(scheduler.registry().state().await, SchedulerState::Active);

        // Nothing before the first interval elapses
        let early = tokio::time::timeout(Duration::from_secs(29), sub.updates.recv()).await;
        assert!(early.is_err());

        let msg = sub.updates.recv().await.unwrap();
        let WsMessage::Update { price, analysis, .. } = msg else {
            panic!("expected an update");
        };
        assert_eq!(price, 115.5);
        assert_eq!(analysis.len(), 1);
        assert_eq!(analysis[0].signal.as_ref().unwrap().action, Some(Action::Buy));
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_on_connect() {
        let provider = FakeProvider::new().with_candles("1h", rising_staircase());
        let scheduler = scheduler_with(provider, true);
        let mut sub = scheduler.subscribe().await;

        let first = tokio::time::timeout(Duration::from_secs(1), sub.updates.recv()).await;
        assert!(matches!(first, Ok(Some(WsMessage::Update { .. }))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_subscriber_is_removed() {
        let scheduler = scheduler();
        let sub = scheduler.subscribe().await;
        assert!(scheduler.registry().contains(&sub.id).await);

        drop(sub.updates);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(scheduler.registry().len().await, 0);
        assert_eq!(scheduler.registry().state().await, SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_subscriber_does_not_affect_others() {
        let scheduler = scheduler();
        let gone = scheduler.subscribe().await;
        let mut stays = scheduler.subscribe().await;
        assert_eq!(scheduler.registry().len().await, 2);

        drop(gone.updates);
        let msg = stays.updates.recv().await.unwrap();
        assert!(matches!(msg, WsMessage::Update { .. }));

        assert_eq!(scheduler.registry().len().await, 1);
        assert!(scheduler.registry().contains(&stays.id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_stops_loop() {
        let scheduler = scheduler();
        let mut sub = scheduler.subscribe().await;

        scheduler.unsubscribe(sub.id).await;
        assert_eq!(scheduler.registry().state().await, SchedulerState::Idle);

        // Aborted task drops its sender, closing the channel
        assert!(sub.updates.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_failure_skips_cycle() {
        let provider = FakeProvider::new()
            .with_candles("1h", rising_staircase())
            .without_ticker();
        let scheduler = scheduler_with(provider, false);
        let mut sub = scheduler.subscribe().await;

        let waited = tokio::time::timeout(Duration::from_secs(95), sub.updates.recv()).await;
        assert!(waited.is_err());
        assert_eq!(scheduler.registry().len().await, 1);
    }
}
