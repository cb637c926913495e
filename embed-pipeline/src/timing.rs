//! Wall-clock measurement of pipeline stages.

use std::fmt;
use std::future::Future;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Shared writer receiving report lines as stages complete (stdout in the binary).
pub type ReportSink = Arc<Mutex<dyn Write + Send>>;

/// Writes one line to `sink`. Write failures are logged, never propagated.
pub fn emit_line(sink: Option<&ReportSink>, line: &str) {
    let Some(sink) = sink else { return };
    let Ok(mut w) = sink.lock() else {
        debug!("report sink poisoned, dropping line: {line}");
        return;
    };
    if let Err(e) = writeln!(w, "{line}").and_then(|()| w.flush()) {
        debug!("failed to write report line: {e}");
    }
}

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    InitEmbedder,
    Embed,
    Connect,
    EnsureCollection,
    Upsert,
    Search,
}

/// Unit a stage's elapsed time is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millis,
    Micros,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::InitEmbedder => "Model initialization",
            Stage::Embed => "Embedding generation",
            Stage::Connect => "Vector store connection",
            Stage::EnsureCollection => "Collection creation",
            Stage::Upsert => "Upsert operation",
            Stage::Search => "Similarity search",
        }
    }

    /// Connecting only builds a handle, so it is reported at finer resolution.
    pub fn unit(self) -> TimeUnit {
        match self {
            Stage::Connect => TimeUnit::Micros,
            _ => TimeUnit::Millis,
        }
    }
}

/// Elapsed time of one stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

impl fmt::Display for StageTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed.as_secs_f64();
        match self.stage.unit() {
            TimeUnit::Millis => write!(f, "{} took: {:.2}ms", self.stage.label(), secs * 1e3),
            TimeUnit::Micros => write!(f, "{} took: {:.2}µs", self.stage.label(), secs * 1e6),
        }
    }
}

/// Records stage timings in the order stages complete.
///
/// Timing is observational: the measured closure/future's output is returned
/// untouched, errors included. With a sink, each timing line is written as
/// soon as its stage ends, so a later failure cannot lose it.
#[derive(Default)]
pub struct StageTimer {
    timings: Vec<StageTiming>,
    sink: Option<ReportSink>,
}

impl StageTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Option<ReportSink>) -> Self {
        Self {
            timings: Vec::new(),
            sink,
        }
    }

    /// Times a synchronous operation.
    pub fn measure<T>(&mut self, stage: Stage, op: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = op();
        self.record(stage, start.elapsed());
        out
    }

    /// Times a future from first poll to completion.
    pub async fn measure_async<F: Future>(&mut self, stage: Stage, fut: F) -> F::Output {
        let start = Instant::now();
        let out = fut.await;
        self.record(stage, start.elapsed());
        out
    }

    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }

    pub fn into_timings(self) -> Vec<StageTiming> {
        self.timings
    }

    fn record(&mut self, stage: Stage, elapsed: Duration) {
        let timing = StageTiming { stage, elapsed };
        info!("{timing}");
        emit_line(self.sink.as_ref(), &timing.to_string());
        self.timings.push(timing);
    }
}
