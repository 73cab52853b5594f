//! Browser console logging.
//!
//! `tracing` events are formatted by the regular `fmt` layer and each
//! finished line is handed to `console.log`.

use std::io;

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

type Sink = fn(&str);

fn console_sink(line: &str) {
    web_sys::console::log_1(&line.into());
}

/// Buffers one formatted event and emits it when dropped.
pub struct ConsoleWriter {
    buf: Vec<u8>,
    sink: Sink,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end_matches('\n');
        if !line.is_empty() {
            (self.sink)(line);
        }
        self.buf.clear();
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

#[derive(Clone, Copy)]
pub struct ConsoleMakeWriter {
    sink: Sink,
}

impl Default for ConsoleMakeWriter {
    fn default() -> Self {
        Self { sink: console_sink }
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            buf: Vec::new(),
            sink: self.sink,
        }
    }
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn subscriber(level: &str, writer: ConsoleMakeWriter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry().with(filter(level)).with(
        tracing_subscriber::fmt::layer()
            .without_time()
            .with_ansi(false)
            .with_writer(writer),
    )
}

/// Install the console subscriber at `level`, an `EnvFilter` directive such
/// as `CheckoutConfig::log_level`. Later calls are no-ops.
pub fn init(level: &str) {
    let result = subscriber(level, ConsoleMakeWriter::default()).try_init();
    if result.is_ok() {
        tracing::debug!(level, "console logging ready");
    }
}
