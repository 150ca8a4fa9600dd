//! Prometheus Exposition
//!
//! Renders group statistics in the Prometheus text format. Every metric is
//! a gauge labelled by group name and refreshed from a [`StatsSnapshot`] on
//! each scrape. [`serve`] exposes them over HTTP at `/metrics`.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, GaugeVec, IntGaugeVec, Opts, Registry, TextEncoder};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::cache::{GroupRegistry, StatsSnapshot};
use crate::error::{Error, Result};

const NAMESPACE: &str = "cachegroup";

/// Group statistics exporter with its own registry
pub struct Exporter {
    registry: Registry,
    gets: IntGaugeVec,
    hits: IntGaugeVec,
    misses: IntGaugeVec,
    loads: IntGaugeVec,
    load_errors: IntGaugeVec,
    shared_loads: IntGaugeVec,
    evictions: IntGaugeVec,
    cached_entries: IntGaugeVec,
    cached_bytes: IntGaugeVec,
    in_flight_loads: IntGaugeVec,
    hit_ratio: GaugeVec,
}

impl Exporter {
    /// Create an exporter and register its gauges
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let int_gauge = |name: &str, help: &str| -> Result<IntGaugeVec> {
            let gauge = IntGaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), &["group"])?;
            registry.register(Box::new(gauge.clone()))?;
            Ok(gauge)
        };

        let gets = int_gauge("gets_total", "Lookups with a non-empty key")?;
        let hits = int_gauge("hits_total", "Lookups answered from the cache")?;
        let misses = int_gauge("misses_total", "Lookups that missed the cache")?;
        let loads = int_gauge("loads_total", "Loader invocations")?;
        let load_errors = int_gauge("load_errors_total", "Failed loader invocations")?;
        let shared_loads = int_gauge(
            "shared_loads_total",
            "Misses served by a concurrent in-flight load",
        )?;
        let evictions = int_gauge("evictions_total", "Entries evicted to stay within budget")?;
        let cached_entries = int_gauge("cached_entries", "Entries currently cached")?;
        let cached_bytes = int_gauge("cached_bytes", "Bytes charged against the cache budget")?;
        let in_flight_loads = int_gauge("in_flight_loads", "Keys with a loader call running")?;

        let hit_ratio = GaugeVec::new(
            Opts::new("hit_ratio", "Cache hit ratio (0.0 - 1.0)").namespace(NAMESPACE),
            &["group"],
        )?;
        registry.register(Box::new(hit_ratio.clone()))?;

        Ok(Self {
            registry,
            gets,
            hits,
            misses,
            loads,
            load_errors,
            shared_loads,
            evictions,
            cached_entries,
            cached_bytes,
            in_flight_loads,
            hit_ratio,
        })
    }

    /// Record one group's snapshot
    pub fn observe(&self, group: &str, stats: &StatsSnapshot) {
        let labels = &[group];
        self.gets.with_label_values(labels).set(stats.gets as i64);
        self.hits.with_label_values(labels).set(stats.hits as i64);
        self.misses
            .with_label_values(labels)
            .set(stats.misses as i64);
        self.loads.with_label_values(labels).set(stats.loads as i64);
        self.load_errors
            .with_label_values(labels)
            .set(stats.load_errors as i64);
        self.shared_loads
            .with_label_values(labels)
            .set(stats.shared_loads as i64);
        self.evictions
            .with_label_values(labels)
            .set(stats.evictions as i64);
        self.cached_entries
            .with_label_values(labels)
            .set(stats.cached_entries as i64);
        self.cached_bytes
            .with_label_values(labels)
            .set(stats.cached_bytes);
        self.in_flight_loads
            .with_label_values(labels)
            .set(stats.in_flight_loads as i64);
        self.hit_ratio
            .with_label_values(labels)
            .set(stats.hit_ratio);
    }

    /// Refresh every group in `registry`
    pub fn observe_registry(&self, registry: &GroupRegistry) {
        for name in registry.names() {
            if let Some(group) = registry.get(&name) {
                self.observe(&name, &group.stats());
            }
        }
    }

    /// Render all gauges in the text exposition format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| Error::Internal(format!("metrics are not UTF-8: {}", e)))
    }

    /// Content type of [`render`](Self::render) output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter").finish_non_exhaustive()
    }
}

// =============================================================================
// Metrics Server
// =============================================================================

/// Serve `/metrics` and `/healthz` on `listener` until `shutdown` resolves
pub async fn serve<S>(
    listener: TcpListener,
    exporter: Arc<Exporter>,
    groups: &'static GroupRegistry,
    shutdown: S,
) -> Result<()>
where
    S: Future<Output = ()>,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Metrics server listening on {}", addr);
    }

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = accepted
                    .map_err(|e| Error::Internal(format!("Metrics server accept error: {}", e)))?;
                let io = TokioIo::new(stream);
                let exporter = Arc::clone(&exporter);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let exporter = Arc::clone(&exporter);
                        async move { handle(req, &exporter, groups) }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Metrics server connection error: {}", e);
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Metrics server shutting down");
                return Ok(());
            }
        }
    }
}

fn handle(
    req: Request<Incoming>,
    exporter: &Exporter,
    groups: &GroupRegistry,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let response = match req.uri().path() {
        "/metrics" => {
            exporter.observe_registry(groups);
            match exporter.render() {
                Ok(body) => Response::builder()
                    .status(StatusCode::OK)
                    .header(header::CONTENT_TYPE, exporter.content_type())
                    .body(Full::new(Bytes::from(body))),
                Err(e) => Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Full::new(Bytes::from(e.to_string()))),
            }
        }
        "/healthz" => Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("ok"))),
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found"))),
    };

    Ok(response.unwrap_or_else(|e| {
        error!("Failed to build metrics response: {}", e);
        Response::new(Full::new(Bytes::from("internal error")))
    }))
}

// =============================================================================
// Tests
// =============================================================================
