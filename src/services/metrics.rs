use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::{Duration, Instant};

lazy_static! {
    pub static ref CHALLENGES_GENERATED_TOTAL: IntCounter = IntCounter::new(
        "challenges_generated_total",
        "Challenges generated and stored"
    ).expect("Failed to create challenges generated metric");

    pub static ref QUOTA_REJECTIONS_TOTAL: IntCounter = IntCounter::new(
        "quota_rejections_total",
        "Generation requests refused because the quota was exhausted"
    ).expect("Failed to create quota rejections metric");

    pub static ref GENERATION_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("generation_failures_total", "Failed calls to the completion provider"),
        &["kind"]
    ).expect("Failed to create generation failures metric");

    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "HTTP requests by route and status"),
        &["method", "route", "status"]
    ).expect("Failed to create HTTP requests metric");

    pub static ref REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("request_duration_seconds", "HTTP request duration in seconds"),
        &["method", "route"]
    ).expect("Failed to create request duration metric");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        registry.register(Box::new(CHALLENGES_GENERATED_TOTAL.clone())).expect("register challenges_generated_total");
        registry.register(Box::new(QUOTA_REJECTIONS_TOTAL.clone())).expect("register quota_rejections_total");
        registry.register(Box::new(GENERATION_FAILURES_TOTAL.clone())).expect("register generation_failures_total");
        registry.register(Box::new(HTTP_REQUESTS_TOTAL.clone())).expect("register http_requests_total");
        registry.register(Box::new(REQUEST_DURATION_SECONDS.clone())).expect("register request_duration_seconds");
        registry
    };
}

#[derive(Debug, Default)]
pub struct MetricsService;

impl MetricsService {
    pub fn new() -> Self {
        Self
    }

    pub fn record_generation(&self) {
        CHALLENGES_GENERATED_TOTAL.inc();
    }

    pub fn record_quota_rejection(&self) {
        QUOTA_REJECTIONS_TOTAL.inc();
    }

    pub fn record_generation_failure(&self, kind: &str) {
        GENERATION_FAILURES_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn record_request(&self, method: &str, route: &str, status: u16, duration: Duration) {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&[method, route, &status.to_string()])
            .inc();
        REQUEST_DURATION_SECONDS
            .with_label_values(&[method, route])
            .observe(duration.as_secs_f64());
    }

    /// Renders every registered metric in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
