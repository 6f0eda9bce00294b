//! Tracing setup shared by the server and the pipeline CLI
//!
//! Events go to stdout and to an append-only file per calendar day,
//! `<dir>/log_YYYY-MM-DD.log`.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{Local, NaiveDate};
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Log file name for a given day
pub fn log_file_name(day: NaiveDate) -> String {
    format!("log_{}.log", day.format("%Y-%m-%d"))
}

struct OpenLog {
    day: NaiveDate,
    file: File,
}

/// Append-only log file that rolls over when the local date changes
pub struct DailyLogFile {
    dir: PathBuf,
    current: Mutex<OpenLog>,
}

impl DailyLogFile {
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let day = Local::now().date_naive();
        let file = Self::open(&dir, day)?;
        Ok(Self {
            dir,
            current: Mutex::new(OpenLog { day, file }),
        })
    }

    fn open(dir: &Path, day: NaiveDate) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(log_file_name(day)))
    }

    fn write_today(&self, buf: &[u8]) -> io::Result<usize> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;

        let today = Local::now().date_naive();
        if current.day != today {
            current.file = Self::open(&self.dir, today)?;
            current.day = today;
        }
        current.file.write(buf)
    }
}

/// Writer handed out per event
pub struct DailyLogWriter<'a>(&'a DailyLogFile);

impl Write for DailyLogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_today(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DailyLogFile {
    type Writer = DailyLogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        DailyLogWriter(self)
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let log_file = DailyLogFile::new(&config.dir)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(log_file),
        )
        .try_init()?;

    Ok(())
}
