//! Prometheus metrics exposed on `/metrics`

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Process-wide metric handles, registered on a private registry.
pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub upstream_requests_total: IntCounter,
    pub upstream_failures_total: IntCounterVec,
    pub breakdowns_computed_total: IntCounterVec,
    pub others_entries_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests served")?;
        let http_request_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0]),
        )?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently in flight")?;
        let upstream_requests_total = IntCounter::new(
            "upstream_requests_total",
            "Comparison fetches issued to the tagging API",
        )?;
        let upstream_failures_total = IntCounterVec::new(
            Opts::new(
                "upstream_failures_total",
                "Comparison fetches that failed, by failure kind",
            ),
            &["kind"],
        )?;
        let breakdowns_computed_total = IntCounterVec::new(
            Opts::new("breakdowns_computed_total", "Breakdowns computed, by partition mode"),
            &["mode"],
        )?;
        let others_entries_total = IntCounter::new(
            "others_entries_total",
            "Keys routed to the Others bucket",
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(upstream_requests_total.clone()))?;
        registry.register(Box::new(upstream_failures_total.clone()))?;
        registry.register(Box::new(breakdowns_computed_total.clone()))?;
        registry.register(Box::new(others_entries_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            upstream_requests_total,
            upstream_failures_total,
            breakdowns_computed_total,
            others_entries_total,
        })
    }

    /// Text exposition format of every registered metric.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
