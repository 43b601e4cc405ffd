use crate::protocol::{MAX_SERIAL_LINE_BYTES, TRIP_EVENT_TOKEN};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Tripped,
    Reading(f64),
    Malformed,
}

/// Buffers serial input and emits one line per `\n`, carrying partial
/// lines across reads. A trailing `\r` is stripped.
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    max_line: usize,
    discarding: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_max_line(MAX_SERIAL_LINE_BYTES)
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_line.min(1024)),
            max_line,
            discarding: false,
        }
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in bytes {
            if byte == b'\n' {
                if !self.discarding {
                    if self.buffer.last() == Some(&b'\r') {
                        self.buffer.pop();
                    }
                    lines.push(String::from_utf8_lossy(&self.buffer).into_owned());
                }
                self.buffer.clear();
                self.discarding = false;
                continue;
            }

            if self.discarding {
                continue;
            }

            // A trailing `\r` before the terminator does not count toward the limit.
            let limit = if byte == b'\r' {
                self.max_line + 1
            } else {
                self.max_line
            };
            if self.buffer.len() >= limit {
                // Overlong line: drop it through the next terminator.
                self.buffer.clear();
                self.discarding = true;
                continue;
            }

            self.buffer.push(byte);
        }

        lines
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }
}

pub fn classify_line(line: &str) -> Event {
    let trimmed = line.trim();
    if trimmed.starts_with(TRIP_EVENT_TOKEN) {
        return Event::Tripped;
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Event::Reading(value),
        _ => Event::Malformed,
    }
}
