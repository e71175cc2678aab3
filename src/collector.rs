//! The neighbor supervisor
//!
//! [`Collector`] owns a table of neighbors, each driven by its own
//! [`tokio::task`] running [`crate::fsm::Session`], and a single bounded
//! event channel all of them publish to. Backpressure is deliberate: a slow
//! consumer of [`crate::Event`] stalls neighbor tasks rather than having
//! events silently dropped, since a collector that quietly loses link-state
//! updates is worse than one that temporarily falls behind.

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::error::CollectorError;
use crate::event::{Event, NeighborConfig};
use crate::fsm::Session;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Tunables for a [`Collector`] instance
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CollectorConfig {
    /// This collector's own ASN, sent in the OPEN to every neighbor.
    pub asn: u32,
    /// This collector's own BGP identifier, sent in the OPEN to every neighbor.
    pub router_id: Ipv4Addr,
    /// Capacity of the bounded event channel shared by every neighbor
    pub events_capacity: usize,
}

struct Neighbor {
    config: NeighborConfig,
    task: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

/// Supervises a set of BGP-LS neighbor sessions and publishes a shared event stream.
pub struct Collector {
    config: CollectorConfig,
    neighbors: RwLock<HashMap<SocketAddr, Neighbor>>,
    events_tx: mpsc::Sender<Event>,
    events_rx: RwLock<Option<mpsc::Receiver<Event>>>,
    stopped: AtomicBool,
}

impl Collector {
    /// Construct a new, empty collector. Call [`Collector::events`] once to take the receiver.
    #[must_use]
    pub fn new(config: CollectorConfig) -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::channel(config.events_capacity.max(1));
        Arc::new(Self {
            config,
            neighbors: RwLock::new(HashMap::new()),
            events_tx,
            events_rx: RwLock::new(Some(events_rx)),
            stopped: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub const fn config(&self) -> CollectorConfig {
        self.config
    }

    /// Take ownership of the collector's event stream. Only the first caller
    /// gets the receiver; any other call, or any call after [`Collector::stop`],
    /// errors with [`CollectorError::CollectorStopped`].
    pub async fn events(&self) -> Result<mpsc::Receiver<Event>, CollectorError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(CollectorError::CollectorStopped);
        }
        self.events_rx
            .write()
            .await
            .take()
            .ok_or(CollectorError::CollectorStopped)
    }

    /// List the configuration of every currently configured neighbor.
    ///
    /// Errors with [`CollectorError::CollectorStopped`] once [`Collector::stop`]
    /// has been called.
    pub async fn neighbors(&self) -> Result<Vec<NeighborConfig>, CollectorError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(CollectorError::CollectorStopped);
        }
        Ok(self
            .neighbors
            .read()
            .await
            .values()
            .map(|n| n.config.clone())
            .collect())
    }

    /// Add and start a neighbor session.
    ///
    /// Errors with [`CollectorError::CollectorStopped`] if [`Collector::stop`] was already
    /// called, or [`CollectorError::NeighborExists`] if the address is already configured.
    pub async fn add_neighbor(
        self: &Arc<Self>,
        config: NeighborConfig,
    ) -> Result<(), CollectorError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(CollectorError::CollectorStopped);
        }
        let mut neighbors = self.neighbors.write().await;
        if neighbors.contains_key(&config.address) {
            return Err(CollectorError::NeighborExists);
        }
        let (stop_tx, stop_rx) = watch::channel(false);
        let collector = Arc::clone(self);
        let address = config.address;
        let task_config = config.clone();
        let _ = self
            .events_tx
            .send(Event::Added { address })
            .await;
        let task = tokio::spawn(async move {
            collector.run_neighbor(task_config, stop_rx).await;
        });
        neighbors.insert(
            address,
            Neighbor {
                config,
                task,
                stop: stop_tx,
            },
        );
        Ok(())
    }

    /// Stop and remove a neighbor session.
    ///
    /// Waits for the session to run its shutdown path (sending a Cease
    /// NOTIFICATION if one is established) before returning.
    pub async fn delete_neighbor(&self, address: SocketAddr) -> Result<(), CollectorError> {
        let neighbor = self.neighbors.write().await.remove(&address);
        match neighbor {
            Some(n) => {
                let _ = n.stop.send(true);
                let _ = n.task.await;
                let _ = self.events_tx.send(Event::Removed { address }).await;
                Ok(())
            }
            None => Err(CollectorError::NeighborNotFound),
        }
    }

    /// Stop every neighbor session and mark the collector stopped.
    ///
    /// Idempotent: calling this more than once is a no-op after the first call.
    /// Every neighbor task is given a chance to run its shutdown path (sending
    /// a Cease NOTIFICATION if established) before this returns.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let removed: Vec<_> = self.neighbors.write().await.drain().map(|(_, n)| n).collect();
        for n in &removed {
            let _ = n.stop.send(true);
        }
        join_all(removed.into_iter().map(|n| n.task)).await;
    }

    async fn run_neighbor(self: Arc<Self>, config: NeighborConfig, mut stop: watch::Receiver<bool>) {
        let address = config.address;
        while !*stop.borrow() {
            let connected = tokio::select! {
                biased;
                _ = stop.changed() => break,
                result = TcpStream::connect(address) => result,
            };
            match connected {
                Ok(stream) => {
                    let session = Session::new(
                        self.config,
                        config.clone(),
                        self.events_tx.clone(),
                        stop.clone(),
                    );
                    if let Err(e) = session.run(stream).await {
                        log::warn!("{address}: session ended: {e}");
                    }
                }
                Err(e) => {
                    log::debug!("{address}: connect failed: {e}");
                    let _ = self
                        .events_tx
                        .send(Event::Error {
                            address,
                            message: e.to_string(),
                        })
                        .await;
                }
            }
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                biased;
                _ = stop.changed() => break,
                () = sleep(crate::fsm::CONNECT_RETRY_TIME) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CollectorConfig {
        CollectorConfig {
            asn: 1234,
            router_id: "172.16.1.106".parse().unwrap(),
            events_capacity: 1024,
        }
    }

    #[tokio::test]
    async fn test_add_neighbor_rejects_duplicate() {
        let collector = Collector::new(test_config());
        let _rx = collector.events().await.unwrap();
        let config = NeighborConfig {
            address: "127.0.0.1:0".parse().unwrap(),
            asn: 65000,
            hold_time: 90,
        };
        collector.add_neighbor(config.clone()).await.unwrap();
        assert!(matches!(
            collector.add_neighbor(config).await,
            Err(CollectorError::NeighborExists)
        ));
        collector.stop().await;
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let collector = Collector::new(test_config());
        let _rx = collector.events().await.unwrap();
        collector.stop().await;
        collector.stop().await;
        assert!(matches!(
            collector
                .add_neighbor(NeighborConfig {
                    address: "127.0.0.1:0".parse().unwrap(),
                    asn: 65000,
                    hold_time: 90,
                })
                .await,
            Err(CollectorError::CollectorStopped)
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_neighbor_errors() {
        let collector = Collector::new(test_config());
        let _rx = collector.events().await.unwrap();
        assert!(matches!(
            collector.delete_neighbor("127.0.0.1:1".parse().unwrap()).await,
            Err(CollectorError::NeighborNotFound)
        ));
    }

    #[tokio::test]
    async fn test_neighbors_reports_configured_sessions() {
        let collector = Collector::new(test_config());
        let _rx = collector.events().await.unwrap();
        let config = NeighborConfig {
            address: "127.0.0.1:0".parse().unwrap(),
            asn: 65000,
            hold_time: 90,
        };
        collector.add_neighbor(config.clone()).await.unwrap();
        assert_eq!(collector.neighbors().await.unwrap(), vec![config]);
        collector.stop().await;
    }

    #[tokio::test]
    async fn test_stopped_collector_rejects_events_and_neighbors() {
        let collector = Collector::new(test_config());
        let _rx = collector.events().await.unwrap();
        collector.stop().await;
        assert!(matches!(
            collector.neighbors().await,
            Err(CollectorError::CollectorStopped)
        ));
        let fresh = Collector::new(test_config());
        fresh.stop().await;
        assert!(matches!(
            fresh.events().await,
            Err(CollectorError::CollectorStopped)
        ));
    }
}
