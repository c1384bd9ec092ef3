use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bookings_total: IntCounterVec,
    pub booking_latency_seconds: HistogramVec,
    pub booking_compensations_total: IntCounter,
    pub available_drivers: IntGauge,
    pub searches_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bookings_total = IntCounterVec::new(
            Opts::new("bookings_total", "Total booking attempts by outcome"),
            &["outcome"],
        )
        .expect("valid bookings_total metric");

        let booking_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "booking_latency_seconds",
                "Latency of booking attempts in seconds",
            ),
            &["outcome"],
        )
        .expect("valid booking_latency_seconds metric");

        let booking_compensations_total = IntCounter::new(
            "booking_compensations_total",
            "Drivers released because the booking could not be persisted",
        )
        .expect("valid booking_compensations_total metric");

        let available_drivers =
            IntGauge::new("available_drivers", "Drivers currently available for booking")
                .expect("valid available_drivers metric");

        let searches_total = IntCounterVec::new(
            Opts::new("searches_total", "Proximity searches by kind and outcome"),
            &["kind", "outcome"],
        )
        .expect("valid searches_total metric");

        registry
            .register(Box::new(bookings_total.clone()))
            .expect("register bookings_total");
        registry
            .register(Box::new(booking_latency_seconds.clone()))
            .expect("register booking_latency_seconds");
        registry
            .register(Box::new(booking_compensations_total.clone()))
            .expect("register booking_compensations_total");
        registry
            .register(Box::new(available_drivers.clone()))
            .expect("register available_drivers");
        registry
            .register(Box::new(searches_total.clone()))
            .expect("register searches_total");

        Self {
            registry,
            bookings_total,
            booking_latency_seconds,
            booking_compensations_total,
            available_drivers,
            searches_total,
        }
    }

    pub fn record_booking(&self, outcome: &str, elapsed_seconds: f64) {
        self.bookings_total.with_label_values(&[outcome]).inc();
        self.booking_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed_seconds);
    }

    pub fn record_search(&self, kind: &str, hits: usize) {
        let outcome = if hits == 0 { "empty" } else { "hit" };
        self.searches_total.with_label_values(&[kind, outcome]).inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
