//! Prometheus exporter
//!
//! Counters are emitted inline where events happen (`feed_ticks_total`,
//! `signals_evaluated_total`, `orders_placed_total`, `orders_skipped_total`,
//! `ticks_dropped_total`, `cycle_errors_total`); this module only hosts the
//! scrape endpoint.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Install the Prometheus recorder and serve /metrics on the given port
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}
