//! Measurement source
//!
//! Runs on its own thread and hands samples to the UI loop through a
//! lock-free ring buffer. Samples come as one JSON object per line, either
//! from stdin or replayed from a file, or from a synthetic demo signal.

use anyhow::{Context, Result};
use rand::Rng;
use rtrb::{Consumer, Producer, RingBuffer};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::history::Sample;

/// Size of the ring buffer for samples
const SAMPLE_RING_BUFFER_SIZE: usize = 1024;

/// Where samples come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// JSON lines on standard input, as fast as they arrive
    Stdin,
    /// JSON lines from a file, replayed at the measurement interval
    File(PathBuf),
    /// Synthetic loudness around a target level
    Demo { target: i32 },
}

impl SourceKind {
    /// Pick the source from the command line, falling back to stdin
    ///
    /// A terminal on stdin is refused: the UI reads its keys from there.
    pub fn select(demo: bool, input: Option<PathBuf>, target: i32, stdin_is_terminal: bool) -> Result<Self> {
        if demo {
            return Ok(SourceKind::Demo { target });
        }
        if let Some(path) = input {
            return Ok(SourceKind::File(path));
        }
        if stdin_is_terminal {
            anyhow::bail!("stdin is a terminal; pipe measurements in, or use --input <FILE> or --demo");
        }
        Ok(SourceKind::Stdin)
    }
}

/// Handle on the reader thread
pub struct SampleSource {
    /// Consumer for receiving samples from the reader thread
    consumer: Consumer<Sample>,

    /// Flag to signal the reader thread to quit
    quit_flag: Arc<AtomicBool>,
}

impl SampleSource {
    /// Start reading samples on a background thread
    pub fn spawn(kind: SourceKind, interval: Duration) -> Result<Self> {
        let (mut producer, consumer) = RingBuffer::new(SAMPLE_RING_BUFFER_SIZE);
        let quit_flag = Arc::new(AtomicBool::new(false));
        let quit = quit_flag.clone();

        let builder = thread::Builder::new().name("sample-source".into());
        let spawned = match kind {
            SourceKind::Stdin => {
                log::info!("Reading samples from stdin");
                builder.spawn(move || {
                    let lines = io::stdin().lock().lines();
                    pump(lines, &mut producer, &quit, None);
                })
            }
            SourceKind::File(path) => {
                let file = File::open(&path)
                    .with_context(|| format!("Failed to open input file: {}", path.display()))?;
                log::info!("Replaying samples from {}", path.display());
                builder.spawn(move || {
                    let lines = BufReader::new(file).lines();
                    pump(lines, &mut producer, &quit, Some(interval));
                })
            }
            SourceKind::Demo { target } => {
                log::info!("Generating demo samples around {} LUFS", target);
                builder.spawn(move || {
                    let mut signal = DemoSignal::new(target as f64, interval);
                    let mut rng = rand::rng();
                    while !quit.load(Ordering::Relaxed) {
                        push(&mut producer, signal.next_sample(&mut rng));
                        thread::sleep(interval);
                    }
                })
            }
        };
        spawned.context("Failed to spawn sample source thread")?;

        Ok(Self { consumer, quit_flag })
    }

    /// Try to receive the next sample from the reader thread
    pub fn try_recv(&mut self) -> Option<Sample> {
        self.consumer.pop().ok()
    }

    /// Request the reader thread to quit
    pub fn quit(&mut self) {
        self.quit_flag.store(true, Ordering::SeqCst);
    }
}

impl Drop for SampleSource {
    fn drop(&mut self) {
        self.quit();
    }
}

/// Forward parsed lines until the input ends or quit is requested
fn pump<I>(lines: I, producer: &mut Producer<Sample>, quit: &AtomicBool, pace: Option<Duration>)
where
    I: Iterator<Item = io::Result<String>>,
{
    for (number, line) in lines.enumerate() {
        if quit.load(Ordering::Relaxed) {
            return;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to read sample input: {}", e);
                return;
            }
        };

        match parse_line(&line) {
            Ok(Some(sample)) => {
                push(producer, sample);
                if let Some(pace) = pace {
                    thread::sleep(pace);
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("Skipping line {}: {:#}", number + 1, e),
        }
    }
    log::info!("Sample input ended");
}

fn push(producer: &mut Producer<Sample>, sample: Sample) {
    if producer.push(sample).is_err() {
        log::warn!("Sample queue full, dropping sample at {}", sample.timestamp);
    }
}

/// Parse one input line; blank lines and `#` comments carry no sample
pub fn parse_line(line: &str) -> Result<Option<Sample>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let sample: Sample = serde_json::from_str(line).context("invalid sample")?;
    if sample.range < 0.0 {
        anyhow::bail!("negative loudness range {}", sample.range);
    }
    Ok(Some(sample))
}

/// Random walk resembling programme loudness
struct DemoSignal {
    target: f64,
    step_ns: u64,
    tick: u64,
    momentary: f64,
    shortterm: f64,
    energy_sum: f64,
    lowest: f64,
    highest: f64,
}

impl DemoSignal {
    fn new(target: f64, interval: Duration) -> Self {
        Self {
            target,
            step_ns: interval.as_nanos().max(1) as u64,
            tick: 0,
            momentary: target,
            shortterm: target,
            energy_sum: 0.0,
            lowest: target,
            highest: target,
        }
    }

    fn next_sample<R: Rng>(&mut self, rng: &mut R) -> Sample {
        self.tick += 1;

        // Drift back towards the target, with the odd loud burst
        let pull = (self.target - self.momentary) * 0.1;
        let burst = if rng.random_range(0.0..1.0) < 0.02 {
            rng.random_range(4.0..12.0)
        } else {
            0.0
        };
        self.momentary = (self.momentary + pull + rng.random_range(-1.5..1.5) + burst).clamp(-70.0, 0.0);
        self.shortterm += (self.momentary - self.shortterm) * 0.15;

        self.energy_sum += 10f64.powf(self.shortterm / 10.0);
        let global = 10.0 * (self.energy_sum / self.tick as f64).log10();

        self.lowest = self.lowest.min(self.shortterm);
        self.highest = self.highest.max(self.shortterm);

        let sample_peak = (self.momentary + rng.random_range(8.0..14.0)).min(0.0);
        let true_peak = (sample_peak + rng.random_range(0.0..0.6)).min(0.0);

        Sample {
            timestamp: self.tick * self.step_ns,
            momentary: self.momentary,
            shortterm: self.shortterm,
            global,
            range: self.highest - self.lowest,
            sample_peak,
            true_peak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let sample = parse_line(
            r#"{"timestamp": 100000000, "momentary": -20.5, "shortterm": -22.0, "global": -23.1, "range": 4.2, "sample_peak": -3.0, "true_peak": -2.7}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(sample.timestamp, 100_000_000);
        assert_eq!(sample.momentary, -20.5);
        assert_eq!(sample.true_peak, -2.7);
    }

    #[test]
    fn test_parse_line_skips_blank_and_comments() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# recorded 2024-03-01").unwrap().is_none());
    }

    #[test]
    fn test_parse_line_silence() {
        let sample = parse_line(r#"{"timestamp": 1, "momentary": null, "short_term": null, "integrated": null}"#)
            .unwrap()
            .unwrap();

        assert_eq!(sample.momentary, f64::NEG_INFINITY);
        assert_eq!(sample.shortterm, f64::NEG_INFINITY);
        assert_eq!(sample.global, f64::NEG_INFINITY);
        assert_eq!(sample.range, 0.0);
    }

    #[test]
    fn test_parse_line_rejects_bad_input() {
        assert!(parse_line("not json").is_err());
        assert!(parse_line(r#"{"timestamp": 1}"#).is_err());
        assert!(parse_line(r#"{"timestamp": 1, "momentary": -20, "shortterm": -20, "global": -20, "range": -1}"#).is_err());
    }

    #[test]
    fn test_pump_forwards_valid_lines() {
        let (mut producer, mut consumer) = RingBuffer::new(8);
        let quit = AtomicBool::new(false);
        let input = "{\"timestamp\": 1, \"momentary\": -20, \"shortterm\": -21, \"global\": -22}\n\
                     garbage\n\
                     \n\
                     {\"timestamp\": 2, \"momentary\": -19, \"shortterm\": -20, \"global\": -22}\n";

        pump(input.as_bytes().lines(), &mut producer, &quit, None);

        assert_eq!(consumer.pop().unwrap().timestamp, 1);
        assert_eq!(consumer.pop().unwrap().timestamp, 2);
        assert!(consumer.pop().is_err());
    }

    #[test]
    fn test_pump_stops_on_quit() {
        let (mut producer, mut consumer) = RingBuffer::new(8);
        let quit = AtomicBool::new(true);

        pump("{\"timestamp\": 1, \"momentary\": -20, \"shortterm\": -21, \"global\": -22}\n".as_bytes().lines(), &mut producer, &quit, None);

        assert!(consumer.pop().is_err());
    }

    #[test]
    fn test_demo_signal() {
        let mut signal = DemoSignal::new(-23.0, Duration::from_millis(100));
        let mut rng = rand::rng();

        let mut last = 0;
        for _ in 0..200 {
            let sample = signal.next_sample(&mut rng);
            assert!(sample.timestamp > last);
            assert!(sample.range >= 0.0);
            assert!(sample.momentary <= 0.0 && sample.momentary >= -70.0);
            assert!(sample.true_peak >= sample.sample_peak);
            last = sample.timestamp;
        }
        assert_eq!(last, 200 * 100_000_000);
    }

    #[test]
    fn test_select_source() {
        assert_eq!(
            SourceKind::select(true, None, -23, true).unwrap(),
            SourceKind::Demo { target: -23 }
        );
        assert_eq!(
            SourceKind::select(false, Some(PathBuf::from("log.jsonl")), -23, true).unwrap(),
            SourceKind::File(PathBuf::from("log.jsonl"))
        );
        assert_eq!(SourceKind::select(false, None, -23, false).unwrap(), SourceKind::Stdin);
    }

    #[test]
    fn test_select_refuses_terminal_stdin() {
        let err = SourceKind::select(false, None, -23, true).unwrap_err();
        assert!(err.to_string().contains("stdin is a terminal"));
    }

    #[test]
    fn test_missing_input_file() {
        let result = SampleSource::spawn(
            SourceKind::File(PathBuf::from("/nonexistent/r128view/input.jsonl")),
            Duration::from_millis(10),
        );
        assert!(result.is_err());
    }
}
