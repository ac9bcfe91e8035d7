//! Best-effort push of metrics and logs to remote backends.
//!
//! # Responsibilities
//! - Queue metric points and log events without blocking request handlers
//! - Deliver them from background tasks (OTLP/JSON metrics, Loki logs)
//! - Swallow delivery failures after logging them locally
//!
//! # Design Decisions
//! - One bounded queue and one worker per sink; a slow sink never delays the other
//! - Each worker keeps up to `push_concurrency` deliveries in flight
//! - A full queue drops the item instead of applying backpressure
//! - Pushes are not awaited by callers and never retried
//! - A sink with no credentials configured gets no queue at all
//! - On shutdown each worker drains what is already queued, waits for the
//!   deliveries in flight, then exits

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use crate::config::{AppConfig, GrafanaConfig, LokiConfig};
use crate::observability::logging::LogEvent;
use crate::observability::metrics::{MetricKind, MetricPoint};

/// Something waiting to be pushed.
#[derive(Debug, Clone)]
pub enum PushItem {
    Metric(MetricPoint),
    Log(LogEvent),
}

/// Errors from a single delivery attempt.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Handle used by request handlers to enqueue pushes.
#[derive(Clone, Debug, Default)]
pub struct PushDispatcher {
    metrics_tx: Option<mpsc::Sender<PushItem>>,
    logs_tx: Option<mpsc::Sender<PushItem>>,
}

impl PushDispatcher {
    /// A dispatcher that discards everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Start a worker per enabled sink and return the dispatcher feeding them.
    ///
    /// The returned handle completes once every worker has drained.
    pub fn spawn(
        config: &AppConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(Self, JoinHandle<()>), PushError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.observability.push_timeout_secs))
            .build()?;

        let sink = Arc::new(Sink {
            client,
            loki: config.loki.clone(),
            grafana: config.grafana.clone(),
            service: config.observability.service_name.clone(),
            environment: config.observability.environment.clone(),
        });

        let mut workers = Vec::new();
        let mut queue = |name: &'static str| {
            let (tx, rx) = mpsc::channel(config.observability.push_queue_capacity);
            let worker = PushWorker {
                name,
                rx,
                sink: sink.clone(),
                permits: Arc::new(Semaphore::new(config.observability.push_concurrency)),
                in_flight: JoinSet::new(),
            };
            workers.push(tokio::spawn(worker.run(shutdown.resubscribe())));
            tx
        };

        let dispatcher = Self {
            metrics_tx: config.grafana.is_enabled().then(|| queue("otlp")),
            logs_tx: config.loki.is_enabled().then(|| queue("loki")),
        };

        tracing::info!(
            metrics_push = dispatcher.metrics_tx.is_some(),
            logs_push = dispatcher.logs_tx.is_some(),
            concurrency = config.observability.push_concurrency,
            "Remote push dispatcher starting"
        );

        let handle = tokio::spawn(async move {
            for worker in workers {
                if let Err(e) = worker.await {
                    tracing::error!(error = %e, "Push worker panicked");
                }
            }
        });
        Ok((dispatcher, handle))
    }

    pub fn push_metric(&self, point: MetricPoint) {
        Self::enqueue(&self.metrics_tx, PushItem::Metric(point));
    }

    pub fn push_log(&self, event: LogEvent) {
        Self::enqueue(&self.logs_tx, PushItem::Log(event));
    }

    fn enqueue(tx: &Option<mpsc::Sender<PushItem>>, item: PushItem) {
        let Some(tx) = tx else { return };
        match tx.try_send(item) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Push queue full, dropping item");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Push worker stopped, dropping item");
            }
        }
    }
}

/// Background task feeding one sink.
pub struct PushWorker {
    name: &'static str,
    rx: mpsc::Receiver<PushItem>,
    sink: Arc<Sink>,
    permits: Arc<Semaphore>,
    in_flight: JoinSet<()>,
}

impl PushWorker {
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                item = self.rx.recv() => match item {
                    Some(item) => self.dispatch(item).await,
                    None => break,
                },
                _ = shutdown.recv() => {
                    self.rx.close();
                    while let Some(item) = self.rx.recv().await {
                        self.dispatch(item).await;
                    }
                    break;
                }
            }
        }

        while self.in_flight.join_next().await.is_some() {}
        tracing::info!(sink = self.name, "Remote push worker stopped");
    }

    /// Start delivering `item` once a concurrency slot is free.
    async fn dispatch(&mut self, item: PushItem) {
        let Ok(permit) = self.permits.clone().acquire_owned().await else {
            return;
        };
        let sink = self.sink.clone();
        self.in_flight.spawn(async move {
            sink.deliver(item).await;
            drop(permit);
        });

        while self.in_flight.try_join_next().is_some() {}
    }
}

/// HTTP client and destinations shared by all deliveries.
struct Sink {
    client: reqwest::Client,
    loki: LokiConfig,
    grafana: GrafanaConfig,
    service: String,
    environment: String,
}

impl Sink {
    async fn deliver(&self, item: PushItem) {
        let result = match &item {
            PushItem::Metric(point) => self.push_metric(point).await,
            PushItem::Log(event) => self.push_log(event).await,
        };

        if let Err(e) = result {
            match item {
                PushItem::Metric(point) => {
                    tracing::warn!(error = %e, metric = point.name, "Failed to push metric")
                }
                PushItem::Log(_) => tracing::warn!(error = %e, "Failed to push log"),
            }
        }
    }

    async fn push_metric(&self, point: &MetricPoint) -> Result<(), PushError> {
        let payload = otlp_payload(point, &self.service, &self.environment, unix_nanos());
        self.client
            .post(&self.grafana.metrics_url)
            .basic_auth(&self.grafana.username, Some(&self.grafana.api_key))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn push_log(&self, event: &LogEvent) -> Result<(), PushError> {
        let payload = loki_payload(event, &self.service, &self.environment, unix_nanos());
        let mut request = self.client.post(self.loki.push_url()).json(&payload);
        if !self.loki.username.is_empty() && !self.loki.password.is_empty() {
            request = request.basic_auth(&self.loki.username, Some(&self.loki.password));
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }
}

fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}

/// OTLP/JSON export request carrying a single data point.
pub fn otlp_payload(point: &MetricPoint, service: &str, environment: &str, now_nanos: u128) -> Value {
    let mut attributes: Vec<Value> = point
        .labels
        .iter()
        .map(|(key, value)| json!({ "key": key, "value": { "stringValue": value } }))
        .collect();
    attributes.push(json!({ "key": "service", "value": { "stringValue": service } }));

    let data_points = json!([{
        "asDouble": point.value,
        "timeUnixNano": now_nanos.to_string(),
        "attributes": attributes,
    }]);

    let mut metric = json!({
        "name": point.name,
        "description": "",
    });
    match point.kind {
        MetricKind::Counter => {
            metric["unit"] = json!("1");
            metric["sum"] = json!({
                "dataPoints": data_points,
                // 2 = AGGREGATION_TEMPORALITY_CUMULATIVE
                "aggregationTemporality": 2,
                "isMonotonic": true,
            });
        }
        MetricKind::Gauge => {
            metric["unit"] = json!("s");
            metric["gauge"] = json!({ "dataPoints": data_points });
        }
    }

    json!({
        "resourceMetrics": [{
            "resource": {
                "attributes": [
                    { "key": "service.name", "value": { "stringValue": service } },
                    { "key": "environment", "value": { "stringValue": environment } },
                ]
            },
            "scopeMetrics": [{
                "scope": { "name": service },
                "metrics": [metric],
            }]
        }]
    })
}

#[derive(Debug, Serialize)]
pub struct LokiPush {
    pub streams: Vec<LokiStream>,
}

#[derive(Debug, Serialize)]
pub struct LokiStream {
    pub stream: BTreeMap<String, String>,
    /// `[timestamp_ns, line]` pairs.
    pub values: Vec<[String; 2]>,
}

/// Loki push request with one stream holding one line.
pub fn loki_payload(event: &LogEvent, service: &str, environment: &str, now_nanos: u128) -> LokiPush {
    let mut stream = BTreeMap::new();
    stream.insert("service".to_string(), service.to_string());
    stream.insert("level".to_string(), event.level.as_str().to_string());
    stream.insert("environment".to_string(), environment.to_string());
    stream.extend(event.labels.clone());

    let mut line = serde_json::Map::new();
    line.insert("message".to_string(), Value::from(event.message.clone()));
    line.extend(event.metadata.clone());

    LokiPush {
        streams: vec![LokiStream {
            stream,
            values: vec![[now_nanos.to_string(), Value::Object(line).to_string()]],
        }],
    }
}
