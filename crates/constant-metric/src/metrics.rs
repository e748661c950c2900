//! Instrument registration and the counter ticker.
//!
//! Instruments:
//! - `wave_sin`, `wave_cos`: f64 observable gauges reading the shared [`Wave`].
//! - `simple_counter`: u64 counter incremented once per second.
//! - `simple_request`: u64 counter incremented once per `GET /`.
//!
//! Every observation carries the same attribute set built by
//! [`common_attributes`].

use std::{sync::Arc, time::Duration};

use opentelemetry::{
    metrics::{Counter, Meter, ObservableGauge},
    KeyValue,
};
use opentelemetry_sdk::Resource;
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::wave::Wave;

/// Name of the meter all instruments are created on.
pub const METER_NAME: &str = "cloudmonitoring/cloudrun";

const COUNTER_TICK: Duration = Duration::from_secs(1);

/// Attributes attached to every observation: runtime and language labels
/// followed by every attribute of the detected resource.
pub fn common_attributes(resource: &Resource) -> Vec<KeyValue> {
    let mut attrs = vec![
        KeyValue::new("runtime", "cloud-run"),
        KeyValue::new("language", "rust"),
    ];
    attrs.extend(
        resource
            .iter()
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
    );
    attrs
}

/// Handles to the registered instruments.
///
/// Cloning is cheap; all clones report into the same instruments.
#[derive(Clone)]
pub struct Instruments {
    counter: Counter<u64>,
    requests: Counter<u64>,
    attributes: Arc<[KeyValue]>,
    // Held so the gauge callbacks stay registered for the process lifetime.
    _gauges: Arc<[ObservableGauge<f64>; 2]>,
}

impl Instruments {
    /// Create all instruments on `meter`; the gauges observe `wave`.
    pub fn register(meter: &Meter, wave: &Wave, attributes: Vec<KeyValue>) -> Self {
        let attributes: Arc<[KeyValue]> = attributes.into();

        let sin_wave = wave.clone();
        let sin_attrs = attributes.clone();
        let wave_sin = meter
            .f64_observable_gauge("wave_sin")
            .with_description("Sine component of the demo oscillator")
            .with_callback(move |observer| observer.observe(sin_wave.load().sin, &sin_attrs))
            .init();

        let cos_wave = wave.clone();
        let cos_attrs = attributes.clone();
        let wave_cos = meter
            .f64_observable_gauge("wave_cos")
            .with_description("Cosine component of the demo oscillator")
            .with_callback(move |observer| observer.observe(cos_wave.load().cos, &cos_attrs))
            .init();

        let counter = meter
            .u64_counter("simple_counter")
            .with_description("Incremented once per second")
            .init();
        let requests = meter
            .u64_counter("simple_request")
            .with_description("Requests served on /")
            .init();

        Self {
            counter,
            requests,
            attributes,
            _gauges: Arc::new([wave_sin, wave_cos]),
        }
    }

    /// Add one to `simple_counter`.
    pub fn record_tick(&self) {
        self.counter.add(1, &self.attributes);
    }

    /// Add one to `simple_request`.
    pub fn record_request(&self) {
        self.requests.add(1, &self.attributes);
    }
}

impl std::fmt::Debug for Instruments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruments")
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

/// Spawn the counter ticker: add one to `simple_counter` every second until
/// `cancel` fires.
///
/// The first increment happens after one full second.
pub fn record_counter(instruments: Instruments, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(COUNTER_TICK);
        // First tick fires immediately; skip it so the count tracks elapsed seconds.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => instruments.record_tick(),
            }
        }
        debug!("counter ticker stopped");
    })
}
