//! Joystick telemetry publishers.

use std::io::Write;
use std::time::{Duration, Instant};

use falcon_common::telemetry::JoystickMessage;
use serde::Serialize;

use super::TransportError;

/// Sink for per-tick joystick messages.
pub trait TelemetryPublisher {
    /// Publish `message` on `topic`.
    fn publish(&mut self, topic: &str, message: &JoystickMessage) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct JsonLine<'a> {
    topic: &'a str,
    stamp_ms: u64,
    buttons: u32,
    axes: [f64; 3],
}

/// Writes one JSON object per message, newline-terminated.
///
/// ```text
/// {"topic":"/falcon/joystick","stamp_ms":100,"buttons":0,"axes":[0.0,0.0,0.11]}
/// ```
pub struct JsonLinesPublisher<W: Write> {
    writer: W,
    epoch: Instant,
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            epoch: Instant::now(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetryPublisher for JsonLinesPublisher<W> {
    fn publish(&mut self, topic: &str, message: &JoystickMessage) -> Result<(), TransportError> {
        let line = JsonLine {
            topic,
            stamp_ms: stamp_ms(self.epoch.elapsed()),
            buttons: message.buttons,
            axes: message.axes,
        };
        serde_json::to_writer(&mut self.writer, &line)
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}

/// Milliseconds since the publisher started, saturating.
fn stamp_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Keeps every published message in memory.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    messages: Vec<(String, JoystickMessage)>,
    /// Fail this many upcoming publishes.
    fail_next: u32,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` publishes fail.
    pub fn fail_next(&mut self, count: u32) {
        self.fail_next = count;
    }

    pub fn messages(&self) -> &[(String, JoystickMessage)] {
        &self.messages
    }

    pub fn last(&self) -> Option<&JoystickMessage> {
        self.messages.last().map(|(_, m)| m)
    }
}

impl TelemetryPublisher for RecordingPublisher {
    fn publish(&mut self, topic: &str, message: &JoystickMessage) -> Result<(), TransportError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(TransportError::Io("recording publisher told to fail".to_string()));
        }
        self.messages.push((topic.to_string(), *message));
        Ok(())
    }
}
