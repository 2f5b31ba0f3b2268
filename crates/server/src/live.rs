// Per-coin live pollers. Each poller refreshes the quote on an interval and
// regenerates the simulated trade list; pollers are started on demand and
// torn down when nobody has asked for them within the idle timeout.

use chrono::Utc;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use shared::trades::generate_mock_trades;
use shared::{LiveQuote, Trade};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::client::CoinGeckoClient;
use crate::data::fetch_live_quote;

#[derive(Debug, Clone, Serialize)]
pub struct LiveSnapshot {
    pub coin_id: String,
    pub quote: LiveQuote,
    /// Simulated, regenerated on every successful poll.
    pub trades: Vec<Trade>,
    pub updated_at: i64,
}

pub struct LivePoller {
    snapshot: watch::Receiver<Option<LiveSnapshot>>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    last_access: Mutex<Instant>,
}

impl LivePoller {
    fn start(client: CoinGeckoClient, coin_id: String, interval: Duration) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(poll_loop(client, coin_id, interval, snapshot_tx, shutdown_rx));

        LivePoller {
            snapshot: snapshot_rx,
            shutdown: shutdown_tx,
            task,
            last_access: Mutex::new(Instant::now()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<LiveSnapshot>> {
        self.snapshot.clone()
    }

    pub fn latest(&self) -> Option<LiveSnapshot> {
        self.snapshot.borrow().clone()
    }

    fn touch(&self) {
        *self.last_access.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_access.lock().unwrap_or_else(PoisonError::into_inner).elapsed()
    }

    /// Signals the poll task to stop. An in-flight request is dropped.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for LivePoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    client: CoinGeckoClient,
    coin_id: String,
    interval: Duration,
    snapshot: watch::Sender<Option<LiveSnapshot>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(interval);
    let mut rng = StdRng::from_entropy();
    debug!("Live poller for {} started ({:?} interval)", coin_id, interval);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = shutdown.changed() => break,
            result = fetch_live_quote(&client, &coin_id) => result,
        };

        match result {
            Ok(Some(quote)) => {
                let now = Utc::now().timestamp_millis();
                let trades = generate_mock_trades(&mut rng, quote.price_usd, now);
                snapshot.send_replace(Some(LiveSnapshot {
                    coin_id: coin_id.clone(),
                    quote,
                    trades,
                    updated_at: now,
                }));
            }
            // the upstream does not know this id: nothing to keep polling for
            Ok(None) if snapshot.borrow().is_none() => {
                warn!("No live quote available for {}, stopping poller", coin_id);
                break;
            }
            Ok(None) => warn!("No live quote available for {}", coin_id),
            Err(e) => warn!("Live poll failed for {}: {}", coin_id, e),
        }
    }

    debug!("Live poller for {} stopped", coin_id);
}

/// Registry of running pollers keyed by coin id.
pub struct LiveFeeds {
    client: CoinGeckoClient,
    poll_interval: Duration,
    idle_timeout: Duration,
    pollers: Mutex<HashMap<String, Arc<LivePoller>>>,
}

impl LiveFeeds {
    pub fn new(client: CoinGeckoClient, poll_interval: Duration, idle_timeout: Duration) -> Self {
        LiveFeeds {
            client,
            poll_interval,
            idle_timeout,
            pollers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the poller for `coin_id`, starting one if needed.
    pub fn poller(&self, coin_id: &str) -> Arc<LivePoller> {
        let mut pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = pollers.get(coin_id).filter(|p| !p.is_finished()) {
            existing.touch();
            return existing.clone();
        }

        info!("Starting live poller for {}", coin_id);
        let poller = Arc::new(LivePoller::start(self.client.clone(), coin_id.to_string(), self.poll_interval));
        pollers.insert(coin_id.to_string(), poller.clone());
        poller
    }

    /// Latest snapshot for `coin_id`, waiting up to `wait` for the first
    /// poll of a freshly started poller.
    pub async fn snapshot(&self, coin_id: &str, wait: Duration) -> Option<LiveSnapshot> {
        let poller = self.poller(coin_id);
        if let Some(snapshot) = poller.latest() {
            return Some(snapshot);
        }

        let mut rx = poller.subscribe();
        let closed = match time::timeout(wait, rx.wait_for(Option::is_some)).await {
            Ok(Ok(snapshot)) => return snapshot.clone(),
            Ok(Err(_)) => true,
            Err(_) => false,
        };

        // poller ended without ever producing a quote
        if closed {
            self.forget(coin_id, &poller);
        }
        None
    }

    fn forget(&self, coin_id: &str, poller: &Arc<LivePoller>) {
        let mut pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        if pollers.get(coin_id).map_or(false, |current| Arc::ptr_eq(current, poller)) {
            debug!("Forgetting live poller for {}", coin_id);
            pollers.remove(coin_id);
        }
    }

    /// Stops and forgets pollers nobody asked for within the idle timeout.
    pub fn sweep_idle(&self) -> usize {
        let mut pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = pollers.len();
        pollers.retain(|coin_id, poller| {
            let keep = !poller.is_finished() && poller.idle_for() < self.idle_timeout;
            if !keep {
                debug!("Dropping idle live poller for {}", coin_id);
                poller.stop();
            }
            keep
        });
        before - pollers.len()
    }

    pub fn shutdown(&self) {
        let mut pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        info!("Stopping {} live pollers", pollers.len());
        for (_, poller) in pollers.drain() {
            poller.stop();
        }
    }

    pub fn active(&self) -> Vec<String> {
        let pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = pollers.keys().cloned().collect();
        ids.sort();
        ids
    }
}

pub async fn sweep_idle_periodically(feeds: Arc<LiveFeeds>, every: Duration) {
    let mut ticker = time::interval(every);
    loop {
        ticker.tick().await;
        let removed = feeds.sweep_idle();
        if removed > 0 {
            info!("Stopped {} idle live pollers", removed);
        }
    }
}
