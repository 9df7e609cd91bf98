//! Light sensor readings from the ADC board on the serial port.
//!
//! The board prints one reading per line, either tagged with its channel
//! (`ADC[36]=1234`) or bare (`1234`). Everything else is ignored.

use std::{
    io::{BufRead, BufReader},
    path::Path,
    thread,
    time::Duration,
};

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Pause after a failed read before trying again.
const READ_ERROR_DELAY: Duration = Duration::from_secs(1);

/// Consecutive failed reads after which the sensor is given up.
const MAX_READ_ERRORS: u32 = 30;

/// Source of raw light samples.
pub trait SampleSource: Send {
    /// The most recent reading, `None` if nothing was read yet.
    fn latest(&self) -> Option<u16>;

    /// Whether the source will never deliver another sample.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Sensor attached via serial port. A background thread keeps reading lines
/// and publishes the newest sample for the configured channel.
pub struct SerialSensor {
    latest: watch::Receiver<Option<u16>>,
}

impl SerialSensor {
    pub fn open(port: &Path, baudrate: u32, channel: u8) -> anyhow::Result<Self> {
        let raw_port = serialport::new(port.to_string_lossy(), baudrate)
            .timeout(Duration::from_secs(30))
            .open()
            .context(format!("Failed to open serial port at {:?}", port))?;
        info!("Reading light sensor channel {} from {:?}", channel, port);
        Self::spawn(BufReader::new(raw_port), channel)
    }

    /// Start the reader thread on an arbitrary line source.
    pub fn spawn<R: BufRead + Send + 'static>(reader: R, channel: u8) -> anyhow::Result<Self> {
        let (tx, rx) = watch::channel(None);
        thread::Builder::new()
            .name("sensor".into())
            .spawn(move || read_loop(reader, channel, tx, READ_ERROR_DELAY))
            .context("Failed to spawn sensor thread")?;
        Ok(Self { latest: rx })
    }
}

impl SampleSource for SerialSensor {
    fn latest(&self) -> Option<u16> {
        *self.latest.borrow()
    }

    fn is_closed(&self) -> bool {
        // The reader thread drops the sender when it stops
        self.latest.has_changed().is_err()
    }
}

fn read_loop<R: BufRead>(
    mut port: R,
    channel: u8,
    tx: watch::Sender<Option<u16>>,
    retry_delay: Duration,
) {
    let mut line_buffer = String::new();
    let mut errors = 0;
    loop {
        match port.read_line(&mut line_buffer) {
            Ok(0) => {
                warn!("Sensor stream closed");
                return;
            }
            Ok(_size) => match parse_line(line_buffer.trim(), channel) {
                Some(sample) => {
                    if tx.send(Some(sample)).is_err() {
                        // Nobody is listening anymore
                        return;
                    }
                }
                None => debug!("Ignoring sensor line {:?}", line_buffer.trim()),
            },
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                debug!("No sensor data within timeout")
            }
            Err(e) => {
                errors += 1;
                if errors >= MAX_READ_ERRORS {
                    error!("Giving up on sensor after {} failed reads: {}", errors, e);
                    return;
                }
                warn!("Error while reading sensor: {}", e);
                line_buffer.clear();
                thread::sleep(retry_delay);
                continue;
            }
        }
        errors = 0;
        line_buffer.clear();
    }
}

/// Parse a line and return the sample for `channel`, if any.
pub fn parse_line(line: &str, channel: u8) -> Option<u16> {
    lazy_static! {
        static ref TAGGED_RE: Regex =
            Regex::new(r"^ADC\[(?P<pin>[0-9]+)\]\s*=\s*(?P<value>[0-9]+)$").unwrap();
        static ref BARE_RE: Regex = Regex::new(r"^(?P<value>[0-9]+)$").unwrap();
    }

    if let Some(capture) = TAGGED_RE.captures(line) {
        if capture["pin"].parse::<u8>().ok()? != channel {
            return None;
        }
        return capture["value"].parse().ok();
    }
    if let Some(capture) = BARE_RE.captures(line) {
        return capture["value"].parse().ok();
    }

    None
}
