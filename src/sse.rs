//! # Event-Stream Parser
//!
//! Reassembles the provider's Server-Sent-Events protocol from raw network
//! chunks. The wire gives no alignment guarantees: a chunk may end in the
//! middle of a line, an event, or a multi-byte UTF-8 sequence, so both the
//! text decoder and the event scanner carry state across pushes.
//!
//! Events are surfaced as an explicit tagged enum: a `[DONE]` payload is a
//! [`ProviderEvent::Done`] value, not an error, and it latches the parser
//! closed so bytes buffered behind it are dropped.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;

use crate::{error::RelayError, schemas::CompletionChunk};

/// One discrete unit from the upstream protocol.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// A data event carrying a (possibly empty) text delta.
    Data(CompletionChunk),
    /// The provider's end-of-stream sentinel.
    Done,
}

/// Incremental SSE parser with chunk-boundary-safe UTF-8 decoding.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    /// Decoded text not yet consumed as a complete event.
    buf: String,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last chunk.
    partial: Vec<u8>,
    /// Latched once `[DONE]` has been parsed.
    finished: bool,
}

impl EventStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one network chunk, returning every event it completes.
    ///
    /// After the terminator has been parsed the stream is logically complete
    /// and further input is ignored.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<ProviderEvent>, RelayError> {
        if self.finished {
            return Ok(Vec::new());
        }

        self.decode(chunk)?;

        let mut events = Vec::new();
        while let Some(raw) = self.take_event() {
            if let Some(event) = parse_event(&raw)? {
                let done = matches!(event, ProviderEvent::Done);
                events.push(event);
                if done {
                    self.finished = true;
                    self.buf.clear();
                    self.partial.clear();
                    break;
                }
            }
        }

        Ok(events)
    }

    /// Decode a chunk as UTF-8, carrying an incomplete trailing sequence
    /// over to the next push instead of resetting per chunk.
    fn decode(&mut self, chunk: &[u8]) -> Result<(), RelayError> {
        let owned;
        let bytes: &[u8] = if self.partial.is_empty() {
            chunk
        } else {
            let mut joined = std::mem::take(&mut self.partial);
            joined.extend_from_slice(chunk);
            owned = joined;
            &owned
        };

        match std::str::from_utf8(bytes) {
            Ok(text) => self.buf.push_str(text),
            Err(err) => {
                if err.error_len().is_some() {
                    return Err(RelayError::Parse(
                        "invalid UTF-8 in event stream".to_string(),
                    ));
                }
                // The error is an incomplete sequence at the end of input;
                // everything before it is valid text.
                let valid_up_to = err.valid_up_to();
                let text = std::str::from_utf8(&bytes[..valid_up_to])
                    .map_err(|_| RelayError::Internal("UTF-8 revalidation failed".to_string()))?;
                self.buf.push_str(text);
                self.partial = bytes[valid_up_to..].to_vec();
            }
        }

        Ok(())
    }

    /// Remove and return the earliest complete event block, if any.
    ///
    /// Events are terminated by a blank line; both `\n` and `\r\n` line
    /// endings occur in the wild, so all three separator shapes are scanned
    /// and the earliest match wins.
    fn take_event(&mut self) -> Option<String> {
        let (start, sep_len) = ["\r\n\r\n", "\n\r\n", "\n\n"]
            .iter()
            .filter_map(|sep| self.buf.find(sep).map(|idx| (idx, sep.len())))
            .min_by_key(|&(idx, _)| idx)?;

        let raw = self.buf[..start].to_string();
        self.buf.drain(..start + sep_len);
        Some(raw)
    }
}

/// Parse one complete event block into a [`ProviderEvent`].
///
/// Returns `None` for blocks with no `data:` field (comments, `event:`/`id:`
/// directives). Multiple `data:` lines are joined with `\n` per the SSE
/// format.
fn parse_event(raw: &str) -> Result<Option<ProviderEvent>, RelayError> {
    let mut data_lines: Vec<&str> = Vec::new();
    for line in raw.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if data_lines.is_empty() {
        return Ok(None);
    }

    let payload = data_lines.join("\n");
    if payload == "[DONE]" {
        return Ok(Some(ProviderEvent::Done));
    }

    let chunk: CompletionChunk = serde_json::from_str(&payload)
        .map_err(|err| RelayError::Parse(format!("malformed event payload: {}", err)))?;
    Ok(Some(ProviderEvent::Data(chunk)))
}

/// Pull-based adapter from a byte stream to a stream of provider events.
///
/// The downstream consumer polls this; this polls the network. Nothing is
/// buffered beyond the bytes of whatever chunk arrived last, which is how
/// backpressure propagates all the way to the upstream socket.
pub struct EventStream<S> {
    inner: S,
    parser: EventStreamParser,
    queued: VecDeque<ProviderEvent>,
    errored: bool,
}

impl<S> EventStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            parser: EventStreamParser::new(),
            queued: VecDeque::new(),
            errored: false,
        }
    }
}

impl<S> Stream for EventStream<S>
where
    S: Stream<Item = Result<Bytes, RelayError>> + Unpin,
{
    type Item = Result<ProviderEvent, RelayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(event) = this.queued.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if this.errored || this.parser.is_finished() {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => match this.parser.push(&chunk) {
                    Ok(events) => this.queued.extend(events),
                    Err(err) => {
                        this.errored = true;
                        return Poll::Ready(Some(Err(err)));
                    }
                },
                Poll::Ready(Some(Err(err))) => {
                    this.errored = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(events: &[ProviderEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                ProviderEvent::Data(chunk) => Some(chunk.delta_text().to_string()),
                ProviderEvent::Done => None,
            })
            .collect()
    }

    #[test]
    fn parses_a_complete_event() {
        let mut parser = EventStreamParser::new();
        let events = parser
            .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n")
            .unwrap();
        assert_eq!(deltas(&events), vec!["Hi"]);
    }

    #[test]
    fn holds_incomplete_event_until_terminated() {
        let mut parser = EventStreamParser::new();
        let events = parser
            .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}")
            .unwrap();
        assert!(events.is_empty());

        let events = parser.push(b"\n\n").unwrap();
        assert_eq!(deltas(&events), vec!["Hi"]);
    }

    #[test]
    fn done_latches_the_parser() {
        let mut parser = EventStreamParser::new();
        let events = parser.push(b"data: [DONE]\n\n").unwrap();
        assert!(matches!(events.as_slice(), [ProviderEvent::Done]));
        assert!(parser.is_finished());

        let events = parser
            .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n")
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let mut parser = EventStreamParser::new();
        let events = parser
            .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\r\n\r\n")
            .unwrap();
        assert_eq!(deltas(&events), vec!["Hi"]);
    }

    #[test]
    fn non_data_fields_are_ignored() {
        let mut parser = EventStreamParser::new();
        let events = parser.push(b"event: ping\nid: 42\n\n").unwrap();
        assert!(events.is_empty());

        let events = parser.push(b": keep-alive comment\n\n").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn multiple_data_lines_join_with_newline() {
        let mut parser = EventStreamParser::new();
        // A payload split across two data lines reassembles into one JSON
        // document; the joining newline lands in insignificant whitespace.
        let events = parser
            .push(b"data: {\"choices\":[{\"delta\":\ndata: {\"content\":\"Hi\"}}]}\n\n")
            .unwrap();
        assert_eq!(deltas(&events), vec!["Hi"]);
    }

    #[test]
    fn malformed_payload_is_fatal() {
        let mut parser = EventStreamParser::new();
        let result = parser.push(b"data: {not json}\n\n");
        assert!(matches!(result, Err(RelayError::Parse(_))));
    }

    #[test]
    fn invalid_utf8_is_fatal() {
        let mut parser = EventStreamParser::new();
        let result = parser.push(b"data: \xff\xfe\n\n");
        assert!(matches!(result, Err(RelayError::Parse(_))));
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let text = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n\n";
        let bytes = text.as_bytes();
        // Split inside the two-byte encoding of 'é'.
        let split = text.find('é').unwrap() + 1;

        let mut parser = EventStreamParser::new();
        assert!(parser.push(&bytes[..split]).unwrap().is_empty());
        let events = parser.push(&bytes[split..]).unwrap();
        assert_eq!(deltas(&events), vec!["héllo"]);
    }
}
