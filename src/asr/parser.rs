//! Line-oriented stderr protocol parser for the recognizer child.
//!
//! Mirrors the inline scanner loop in `examples/original_source/src/asr.go`'s
//! `Run()` goroutine as a standalone state machine so it can be unit tested
//! without spawning a process.

pub const WAITING_MARKER: &str = "[Inference tutorial for CTC]: Waiting the input";
pub const PREDICTED_MARKER: &str = "[Inference tutorial for CTC]: predicted output for ";

/// A completed prediction block.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub input_file: String,
    pub text: String,
}

/// What a line fed to the parser resulted in.
#[derive(Debug, PartialEq)]
pub enum LineEvent {
    /// The worker is ready for another path. Carries the just-completed
    /// prediction if one was being accumulated.
    Waiting { completed: Option<RawPrediction> },
    /// The protocol was violated: a `predicted output for` marker arrived
    /// while already reading a prediction block.
    ProtocolViolation(String),
    /// Unrelated log noise, to be forwarded verbatim to the host's stdout.
    Forwarded(String),
    /// The line was consumed into the in-progress accumulator; no event.
    Accumulating,
}

/// Two fields plus a text accumulator, exactly as specified: `reading_pred`
/// and `prediction_file`.
#[derive(Debug, Default)]
pub struct ParserState {
    reading_pred: bool,
    prediction_file: String,
    accumulator: String,
}

impl ParserState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_line(&mut self, line: &str) -> LineEvent {
        if line.contains(WAITING_MARKER) {
            let completed = if self.reading_pred {
                let prediction = RawPrediction {
                    input_file: std::mem::take(&mut self.prediction_file),
                    text: std::mem::take(&mut self.accumulator),
                };
                self.reading_pred = false;
                Some(prediction)
            } else {
                None
            };
            return LineEvent::Waiting { completed };
        }

        if let Some(pos) = line.rfind(PREDICTED_MARKER) {
            if self.reading_pred {
                return LineEvent::ProtocolViolation(line.to_string());
            }
            self.prediction_file = line[pos + PREDICTED_MARKER.len()..].trim().to_string();
            self.reading_pred = true;
            return LineEvent::Accumulating;
        }

        if self.reading_pred {
            if !self.accumulator.is_empty() {
                self.accumulator.push('\n');
            }
            self.accumulator.push_str(line);
            return LineEvent::Accumulating;
        }

        LineEvent::Forwarded(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_before_any_prediction_carries_nothing() {
        let mut parser = ParserState::new();
        let event = parser.feed_line(WAITING_MARKER);
        assert_eq!(event, LineEvent::Waiting { completed: None });
    }

    #[test]
    fn accumulates_until_next_waiting() {
        let mut parser = ParserState::new();
        parser.feed_line(WAITING_MARKER);
        assert_eq!(
            parser.feed_line("[Inference tutorial for CTC]: predicted output for /a.wav"),
            LineEvent::Accumulating
        );
        assert_eq!(parser.feed_line("hello"), LineEvent::Accumulating);
        assert_eq!(parser.feed_line("world"), LineEvent::Accumulating);
        let event = parser.feed_line(WAITING_MARKER);
        assert_eq!(
            event,
            LineEvent::Waiting {
                completed: Some(RawPrediction {
                    input_file: "/a.wav".to_string(),
                    text: "hello\nworld".to_string(),
                })
            }
        );
    }

    #[test]
    fn predicted_output_while_reading_is_a_protocol_violation() {
        let mut parser = ParserState::new();
        parser.feed_line("[Inference tutorial for CTC]: predicted output for /a.wav");
        let event = parser.feed_line("[Inference tutorial for CTC]: predicted output for /b.wav");
        assert!(matches!(event, LineEvent::ProtocolViolation(_)));
    }

    #[test]
    fn unrelated_lines_are_forwarded() {
        let mut parser = ParserState::new();
        let event = parser.feed_line("some unrelated log line");
        assert_eq!(event, LineEvent::Forwarded("some unrelated log line".to_string()));
    }
}
