//! Tick loop that emits one random log record per interval.

use std::{io::Write, time::Duration};

use rand::Rng;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::entry::{EntryError, LogEntry};
use crate::severity::Severity;

/// Build the next record: `hello <n>` tagged with severity code `n`, where
/// `n` is drawn uniformly from the defined codes.
pub fn next_entry<R: Rng>(rng: &mut R) -> LogEntry {
    let code = rng.gen_range(0..Severity::COUNT);
    LogEntry::new(format!("hello {code}"), Severity::from(code))
}

/// Emit one record to `out` every `interval` until `cancel` fires.
///
/// The first record is written after one full interval. Returns the number
/// of records written.
///
/// # Errors
///
/// Stops at the first record that cannot be serialised or written.
pub async fn run<R, W>(
    interval: Duration,
    rng: &mut R,
    out: &mut W,
    cancel: CancellationToken,
) -> Result<u64, EntryError>
where
    R: Rng,
    W: Write,
{
    let mut ticker = time::interval(interval);
    // First tick fires immediately; skip it.
    ticker.tick().await;
    info!(interval_ms = interval.as_millis() as u64, "emitting log records");

    let mut written = 0u64;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let entry = next_entry(rng);
                entry.write_line(out)?;
                out.flush()?;
                written += 1;
                debug!(severity = %entry.severity, "record emitted");
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::Value;

    #[test]
    fn message_matches_severity_code() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let entry = next_entry(&mut rng);
            let code: i32 = entry
                .message
                .strip_prefix("hello ")
                .unwrap()
                .parse()
                .unwrap();
            assert!((0..Severity::COUNT).contains(&code));
            assert_eq!(entry.severity, Severity::from(code));
        }
    }

    #[test]
    fn every_level_is_drawn() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(next_entry(&mut rng).severity);
        }
        assert_eq!(seen.len(), Severity::COUNT as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_one_line_per_tick() {
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(3500)).await;
            stopper.cancel();
        });

        let mut out = Vec::new();
        let written = run(
            Duration::from_secs(1),
            &mut StdRng::seed_from_u64(7),
            &mut out,
            cancel,
        )
        .await
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(written, 3);
        assert_eq!(lines.len(), 3);
        for line in lines {
            let v: Value = serde_json::from_str(line).unwrap();
            assert!(v["message"].as_str().unwrap().starts_with("hello "));
            assert!(v["timestamp"].is_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_tick_writes_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut out = Vec::new();
        let written = run(
            Duration::from_secs(1),
            &mut StdRng::seed_from_u64(7),
            &mut out,
            cancel,
        )
        .await
        .unwrap();
        assert_eq!(written, 0);
        assert!(out.is_empty());
    }
}
