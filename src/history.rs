//! Light history recorder, writes one CSV row per period.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::{controller::MIN_PERIOD, sensor::SampleSource};

pub const HEADER: &str = "date, light\n";

pub fn format_row(time: &DateTime<Local>, light: u16) -> String {
    format!("{},{}\n", time.format("%Y/%m/%d %H:%M:%S"), light)
}

pub struct Recorder {
    path: PathBuf,
}

impl Recorder {
    /// Truncate the file at `path` and write the CSV header.
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let mut file =
            File::create(path).context(format!("Failed to create history file at {:?}", path))?;
        file.write_all(HEADER.as_bytes())
            .context("Failed to write history header")?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn append(&self, time: &DateTime<Local>, light: u16) -> anyhow::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .context(format!("Failed to open history file at {:?}", self.path))?;
        file.write_all(format_row(time, light).as_bytes())
            .context("Failed to append history row")?;
        Ok(())
    }
}

/// Record the latest reading of `source` once per `period` until the source closes.
pub async fn record<S: SampleSource>(
    source: S,
    recorder: Recorder,
    period: Duration,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(period.max(MIN_PERIOD));
    loop {
        interval.tick().await;
        if source.is_closed() {
            anyhow::bail!("Light sensor stopped delivering samples");
        }
        let Some(light) = source.latest() else {
            warn!("No light reading available, skipping");
            continue;
        };
        let now = Local::now();
        info!("{}: \t{}", now.format("%Y/%m/%d %H:%M:%S"), light);
        recorder.append(&now, light)?;
    }
}
