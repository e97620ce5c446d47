use derive_more::Deref;
use enum_dispatch::enum_dispatch;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// Fire-and-forget observability sink. Nothing the sink does feeds back
/// into the loop's control flow.
#[enum_dispatch]
pub trait ScalarSink {
    fn record_scalar(&mut self, series: &str, value: f32, step: usize);
}

#[enum_dispatch(ScalarSink)]
pub enum SinkKind {
    Noop(NoopSink),
    Memory(MemorySink),
    Jsonl(JsonlSink),
}

impl Default for SinkKind {
    fn default() -> Self {
        Self::Noop(NoopSink)
    }
}

/// Discards every scalar.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ScalarSink for NoopSink {
    fn record_scalar(&mut self, _series: &str, _value: f32, _step: usize) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarRecord {
    pub series: String,
    pub value: f32,
    pub step: usize,
}

/// Keeps every scalar in memory, for test inspection.
#[derive(Debug, Default, Deref)]
pub struct MemorySink(pub Vec<ScalarRecord>);

impl ScalarSink for MemorySink {
    fn record_scalar(&mut self, series: &str, value: f32, step: usize) {
        self.0.push(ScalarRecord {
            series: series.to_string(),
            value,
            step,
        });
    }
}

/// One JSON object per scalar, one line each. The payload is small enough
/// to encode by hand.
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl ScalarSink for JsonlSink {
    fn record_scalar(&mut self, series: &str, value: f32, step: usize) {
        let res = writeln!(
            self.writer,
            "{{\"series\":\"{series}\",\"value\":{value},\"step\":{step}}}"
        );
        if let Err(err) = res {
            warn!("scalar sink write failed: {err}");
        }
    }
}
