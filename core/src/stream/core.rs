//! stream/core.rs
//! One-call compress/decompress of whole streams.
use std::io::{self, Read, Write};

use tracing::debug;

use crate::stream::config::{ReaderConfig, WriterConfig};
use crate::stream::reader::Reader;
use crate::stream::writer::Writer;
use crate::telemetry::TelemetrySnapshot;
use crate::types::StreamError;

/// Compress everything from `input` into `output` as one framed stream.
pub fn compress_stream<R: Read, W: Write>(
    input: R,
    output: W,
    config: WriterConfig,
) -> Result<TelemetrySnapshot, StreamError> {
    let mut writer = Writer::with_config(output, config)?;
    let n = writer.read_from(input)?;
    writer.close()?;
    let snapshot = writer.telemetry();
    debug!(input = n, output = writer.written(), "compress_stream finished");
    Ok(snapshot)
}

/// Decode a framed stream from `input` into `output`.
pub fn decompress_stream<R: Read, W: Write>(
    input: R,
    mut output: W,
    config: ReaderConfig,
) -> Result<TelemetrySnapshot, StreamError> {
    let mut reader = Reader::with_config(input, config);
    // Prefer the reader's own error over its io::Error wrapping.
    let n = io::copy(&mut reader, &mut output)
        .map_err(|e| reader.last_error().cloned().unwrap_or_else(|| e.into()))?;
    output.flush()?;
    debug!(output = n, "decompress_stream finished");
    Ok(reader.telemetry())
}
