use crate::contract::{EchoMessage, PingRequest};
use crate::{Broker, Consumer};
use async_trait::async_trait;
use monitor_common::{MonitorError, MonitorResult};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

const CHANNEL_CAPACITY: usize = 256;

/// Tokio-mpsc-backed [`Broker`], standing in for the external message
/// broker. Receivers are shared behind a `Mutex` so a worker pool of
/// [`InMemoryConsumer`] handles can all pull from the same two queues
/// (§5: "N `tokio::spawn`ed worker tasks pulling from the in-memory
/// broker's mpsc receiver").
#[derive(Clone)]
pub struct InMemoryBroker {
    ping_tx: mpsc::Sender<PingRequest>,
    ping_rx: Arc<Mutex<mpsc::Receiver<PingRequest>>>,
    echo_tx: mpsc::Sender<EchoMessage>,
    echo_rx: Arc<Mutex<mpsc::Receiver<EchoMessage>>>,
}

impl InMemoryBroker {
    /// Construct a fresh broker with both queues empty.
    pub fn new() -> Self {
        let (ping_tx, ping_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (echo_tx, echo_rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            ping_tx,
            ping_rx: Arc::new(Mutex::new(ping_rx)),
            echo_tx,
            echo_rx: Arc::new(Mutex::new(echo_rx)),
        }
    }

    /// Hand out a consumer handle. Clone the returned handle (or call this
    /// again) once per worker in the consumer pool — all handles share the
    /// same underlying queues.
    pub fn consumer(&self) -> InMemoryConsumer {
        InMemoryConsumer {
            ping_rx: self.ping_rx.clone(),
            echo_rx: self.echo_rx.clone(),
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn publish_ping(&self, request: PingRequest) -> MonitorResult<()> {
        self.ping_tx
            .send(request)
            .await
            .map_err(|e| MonitorError::BrokerUnavailable(e.to_string()))
    }

    async fn publish_echo(&self, echo: EchoMessage) -> MonitorResult<()> {
        self.echo_tx
            .send(echo)
            .await
            .map_err(|e| MonitorError::BrokerUnavailable(e.to_string()))
    }

    async fn self_check(&self) -> bool {
        // The in-memory stand-in has no network path to fail; it is "up"
        // for as long as the process holding it is alive. A real broker
        // implementation would dial out here instead.
        !self.ping_tx.is_closed()
    }
}

/// A consumer handle over [`InMemoryBroker`]'s two queues. Cheap to clone;
/// every clone competes for the same underlying messages (each message is
/// delivered to exactly one consumer, mirroring at-least-once FIFO
/// delivery to a worker pool).
#[derive(Clone)]
pub struct InMemoryConsumer {
    ping_rx: Arc<Mutex<mpsc::Receiver<PingRequest>>>,
    echo_rx: Arc<Mutex<mpsc::Receiver<EchoMessage>>>,
}

#[async_trait]
impl Consumer for InMemoryConsumer {
    async fn next_ping(&mut self) -> Option<PingRequest> {
        self.ping_rx.lock().await.recv().await
    }

    async fn next_echo(&mut self) -> Option<EchoMessage> {
        self.echo_rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ping_published_is_received() {
        let broker = InMemoryBroker::new();
        let mut consumer = broker.consumer();
        broker
            .publish_ping(PingRequest {
                request_id: "ping-aaaaaaaa".into(),
            })
            .await
            .unwrap();
        let received = consumer.next_ping().await.unwrap();
        assert_eq!(received.request_id, "ping-aaaaaaaa");
    }

    #[tokio::test]
    async fn two_consumers_split_the_queue() {
        let broker = InMemoryBroker::new();
        let mut a = broker.consumer();
        let mut b = broker.consumer();
        for i in 0..4 {
            broker
                .publish_ping(PingRequest {
                    request_id: format!("ping-{i}"),
                })
                .await
                .unwrap();
        }
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2 {
            seen.insert(a.next_ping().await.unwrap().request_id);
        }
        for _ in 0..2 {
            seen.insert(b.next_ping().await.unwrap().request_id);
        }
        assert_eq!(seen.len(), 4);
    }

    #[tokio::test]
    async fn echo_roundtrip() {
        use crate::contract::EchoResult;
        use chrono::Utc;
        use monitor_common::{CheckStatus, ServiceName};

        let broker = InMemoryBroker::new();
        let mut consumer = broker.consumer();
        let echo = EchoMessage {
            request_id: "ping-bbbbbbbb".into(),
            ts: Utc::now(),
            results: vec![EchoResult {
                service: ServiceName::from("reserves"),
                status: CheckStatus::Up,
                latency_ms: Some(4.2),
                http_code: Some(200),
                is_failure: false,
            }],
        };
        broker.publish_echo(echo.clone()).await.unwrap();
        let received = consumer.next_echo().await.unwrap();
        assert_eq!(received.request_id, echo.request_id);
        assert_eq!(received.results.len(), 1);
    }
}
