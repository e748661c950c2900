//! Shared application state injected into every Axum handler.

use crate::metrics::Instruments;
use crate::wave::Wave;

/// Application state shared across all request handlers.
///
/// Both fields are `Arc`-backed, so Axum's per-request clone is cheap.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Oscillator read by `GET /`.
    pub wave: Wave,
    /// Instruments; handlers bump `simple_request`.
    pub instruments: Instruments,
}

impl AppState {
    /// Create a new [`AppState`].
    pub fn new(wave: Wave, instruments: Instruments) -> Self {
        Self { wave, instruments }
    }
}

impl Default for AppState {
    /// Fresh oscillator with instruments on the global (no-op until
    /// installed) meter provider, suitable for tests.
    fn default() -> Self {
        let wave = Wave::new();
        let meter = opentelemetry::global::meter(crate::metrics::METER_NAME);
        let instruments = Instruments::register(&meter, &wave, Vec::new());
        Self::new(wave, instruments)
    }
}
