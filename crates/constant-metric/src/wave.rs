//! Shared sine/cosine oscillator sampled from wall-clock time.
//!
//! The wave ticker is the only writer; gauge callbacks and HTTP handlers
//! read. The pair lives behind an [`ArcSwap`] so a reader always sees the
//! `sin` and `cos` of the same tick.

use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use arc_swap::ArcSwap;
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Amplitude of both components.
pub const MAGNIFIER: f64 = 10.0;

/// Length of one period, in seconds of wall-clock time.
pub const ACCELERATOR: u64 = 1000;

/// How often the ticker recomputes the sample.
pub const TICK: Duration = Duration::from_secs(1);

/// Phase reached at `unix_secs`: the position inside the current period,
/// normalised to `[0, 1)`.
pub fn phase(unix_secs: u64) -> f64 {
    (unix_secs % ACCELERATOR) as f64 / ACCELERATOR as f64
}

/// One `(sin, cos)` reading of the oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSample {
    pub sin: f64,
    pub cos: f64,
}

impl WaveSample {
    /// Sample for the wall-clock second `unix_secs`.
    pub fn at(unix_secs: u64) -> Self {
        let x = phase(unix_secs);
        Self {
            sin: MAGNIFIER * x.sin(),
            cos: MAGNIFIER * x.cos(),
        }
    }
}

impl Default for WaveSample {
    /// Value reported before the first tick.
    fn default() -> Self {
        Self {
            sin: 1.0 * MAGNIFIER,
            cos: 0.0 * MAGNIFIER,
        }
    }
}

/// Source of wall-clock seconds.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn unix_seconds(&self) -> u64;
}

/// [`Clock`] backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> u64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Cheaply cloneable handle to the shared oscillator.
#[derive(Clone, Debug)]
pub struct Wave {
    inner: Arc<ArcSwap<WaveSample>>,
}

impl Wave {
    /// Create an oscillator holding [`WaveSample::default`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(WaveSample::default())),
        }
    }

    /// Current reading.
    pub fn load(&self) -> WaveSample {
        **self.inner.load()
    }

    /// Replace the current reading.
    pub fn store(&self, sample: WaveSample) {
        self.inner.store(Arc::new(sample));
    }

    /// Recompute the reading for the time reported by `clock` and store it.
    pub fn update(&self, clock: &impl Clock) -> WaveSample {
        let sample = WaveSample::at(clock.unix_seconds());
        self.store(sample);
        sample
    }
}

impl Default for Wave {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the wave ticker: recompute the oscillator every [`TICK`] until
/// `cancel` fires.
///
/// The first update happens immediately.
pub fn record_wave<C>(wave: Wave, clock: C, cancel: CancellationToken) -> JoinHandle<()>
where
    C: Clock + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval(TICK);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let sample = wave.update(&clock);
                    trace!(sin = sample.sin, cos = sample.cos, "wave updated");
                }
            }
        }
        debug!("wave ticker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn initial_sample_is_peak_sine() {
        let wave = Wave::new();
        assert_eq!(wave.load(), WaveSample { sin: 10.0, cos: 0.0 });
    }

    #[test]
    fn phase_wraps_every_period() {
        assert_eq!(phase(0), 0.0);
        assert_eq!(phase(500), 0.5);
        assert_eq!(phase(999), 0.999);
        assert_eq!(phase(1000), 0.0);
        assert_eq!(phase(1_650_000_250), 0.25);
    }

    #[test]
    fn sample_at_period_start() {
        let s = WaveSample::at(3000);
        assert!(close(s.sin, 0.0));
        assert!(close(s.cos, MAGNIFIER));
    }

    #[test]
    fn update_stores_clock_sample() {
        let mut clock = MockClock::new();
        clock.expect_unix_seconds().times(1).return_const(1_700_000_123u64);

        let wave = Wave::new();
        let sample = wave.update(&clock);
        assert_eq!(sample, WaveSample::at(123));
        assert_eq!(wave.load(), sample);
    }

    #[test]
    fn clones_share_state() {
        let wave = Wave::new();
        let reader = wave.clone();
        wave.store(WaveSample { sin: 1.5, cos: -2.5 });
        assert_eq!(reader.load(), WaveSample { sin: 1.5, cos: -2.5 });
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_updates_until_cancelled() {
        let mut clock = MockClock::new();
        clock.expect_unix_seconds().return_const(250u64);

        let wave = Wave::new();
        let cancel = CancellationToken::new();
        let handle = record_wave(wave.clone(), clock, cancel.clone());

        time::sleep(TICK * 2).await;
        assert_eq!(wave.load(), WaveSample::at(250));

        cancel.cancel();
        handle.await.unwrap();
    }

    proptest! {
        #[test]
        fn sample_matches_scaled_trig(t in any::<u64>()) {
            let x = (t % ACCELERATOR) as f64 / ACCELERATOR as f64;
            let s = WaveSample::at(t);
            prop_assert!(close(s.sin, MAGNIFIER * x.sin()));
            prop_assert!(close(s.cos, MAGNIFIER * x.cos()));
            prop_assert!(s.sin >= 0.0 && s.sin < MAGNIFIER);
            prop_assert!(s.cos > 0.0 && s.cos <= MAGNIFIER);
        }

        #[test]
        fn stored_sample_reads_back_as_pair(t in any::<u64>()) {
            let wave = Wave::new();
            let sample = WaveSample::at(t);
            wave.store(sample);
            prop_assert_eq!(wave.load(), sample);
        }
    }
}
