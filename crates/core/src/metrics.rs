//! JSON-lines event log for model construction and Poisson solves.
//!
//! Each event is one line: `{"timestamp_ms": .., "event": "phi_solve", ..}`.
//! A single recorder can be shared by several models through an `Arc`.

use std::{
    fmt,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::precision::{ComplexType, Precision, RealType};

/// `[metrics]` table of the model config. `output` is required once
/// `enabled` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub output: Option<PathBuf>,
}

pub struct MetricsRecorder {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl MetricsRecorder {
    /// Truncate or create `path`, making parent directories as needed.
    pub fn create(path: &Path) -> io::Result<Self> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)?,
            _ => {}
        }
        let file = BufWriter::new(File::create(path)?);
        Ok(Self::from_writer(Box::new(file)))
    }

    pub fn from_writer(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Append `event`. Write failures are logged, never returned.
    pub fn emit(&self, event: MetricsEvent) {
        let line = EventLine {
            timestamp_ms: now_millis(),
            event,
        };
        if let Err(err) = self.write_line(&line) {
            log::warn!("[metrics] failed to write event: {err}");
        }
    }

    fn write_line(&self, line: &EventLine) -> io::Result<()> {
        let mut sink = self.sink.lock();
        serde_json::to_writer(&mut *sink, line)?;
        sink.write_all(b"\n")?;
        sink.flush()
    }
}

impl fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRecorder").finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EventLine {
    timestamp_ms: f64,
    #[serde(flatten)]
    event: MetricsEvent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MetricsEvent {
    ModelConstructed {
        precision: Precision,
        float_type: RealType,
        complex_type: ComplexType,
        solver: &'static str,
    },
    PhiSolve {
        grid_nx: usize,
        grid_ny: usize,
        input_type: RealType,
        output_type: RealType,
        solver: &'static str,
        duration_ms: f64,
    },
}

fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|dur| dur.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

impl MetricsConfig {
    pub fn build_recorder(&self) -> io::Result<Option<MetricsRecorder>> {
        if !self.enabled {
            return Ok(None);
        }
        let path = self.output.as_ref().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "metrics.output must be set when metrics are enabled",
            )
        })?;
        MetricsRecorder::create(path).map(Some)
    }
}
