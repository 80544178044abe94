/// Request counters
///
/// One [`Metrics`] value is built at startup and shared through `AppState`.
/// It owns its own prometheus [`Registry`], so independent routers (and
/// tests) never share counters.
///
/// # Exposition
///
/// ```text
/// # HELP http_requests_total Number of HTTP requests by status code, method and route.
/// # TYPE http_requests_total counter
/// http_requests_total{code="200",method="GET",path="/tasks"} 3
/// ```

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Label value used for requests that matched no route
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Name of the request counter family
pub const REQUESTS_TOTAL: &str = "http_requests_total";

/// Request counters plus the route they are served on
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    route: String,
}

impl Metrics {
    /// Creates the counters and registers them
    ///
    /// The series for successful task listing is created up front so it is
    /// present from the first scrape.
    ///
    /// # Errors
    ///
    /// Returns an error if the collector cannot be registered.
    pub fn new(route: impl Into<String>) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let requests = IntCounterVec::new(
            Opts::new(
                REQUESTS_TOTAL,
                "Number of HTTP requests by status code, method and route.",
            ),
            &["code", "method", "path"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        requests.with_label_values(&["200", "GET", "/tasks"]);

        Ok(Self {
            registry,
            requests,
            route: route.into(),
        })
    }

    /// Route the exposition is served on
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Counts one finished request; requests to the metrics route are skipped
    pub fn observe(&self, code: u16, method: &str, path: &str) {
        if path == self.route {
            return;
        }

        let code = code.to_string();
        self.requests
            .with_label_values(&[code.as_str(), method, path])
            .inc();
    }

    /// Current value of one series, read from a gathered snapshot
    ///
    /// Reading never creates the series, so it does not show up in the
    /// exposition until a request is observed with those labels.
    pub fn count(&self, code: u16, method: &str, path: &str) -> u64 {
        let code = code.to_string();
        let wanted = [("code", code.as_str()), ("method", method), ("path", path)];

        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == REQUESTS_TOTAL)
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                wanted.iter().all(|(name, value)| {
                    metric
                        .get_label()
                        .iter()
                        .any(|pair| pair.get_name() == *name && pair.get_value() == *value)
                })
            })
            .map(|metric| metric.get_counter().get_value() as u64)
            .unwrap_or(0)
    }

    /// Encodes every registered family in the text exposition format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
