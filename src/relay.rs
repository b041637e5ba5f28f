//! # Relay Transformer
//!
//! Consumes parsed provider events in arrival order and produces the
//! outbound byte stream. Some providers prepend blank-line chatter before
//! the real completion; those artifacts are dropped while the stream is
//! still young, after which every delta passes through verbatim.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;

use crate::{error::RelayError, sse::ProviderEvent};

/// Leading blank-only deltas are suppressed until this many non-empty
/// deltas have been forwarded.
const LEADING_BLANK_WINDOW: u32 = 2;

/// Transforms provider events into outbound text bytes.
///
/// The stream closes on the terminator event, on upstream end, or after
/// yielding a single error; deltas are forwarded in exactly the order they
/// were extracted.
pub struct RelayStream<S> {
    events: S,
    forwarded: u32,
    closed: bool,
}

impl<S> RelayStream<S> {
    pub fn new(events: S) -> Self {
        Self {
            events,
            forwarded: 0,
            closed: false,
        }
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| matches!(c, '\n' | '\r'))
}

impl<S> Stream for RelayStream<S>
where
    S: Stream<Item = Result<ProviderEvent, RelayError>> + Unpin,
{
    type Item = Result<Bytes, RelayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.closed {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.events).poll_next(cx) {
                Poll::Ready(Some(Ok(ProviderEvent::Data(chunk)))) => {
                    let text = chunk.into_delta_text();
                    if text.is_empty() {
                        continue;
                    }
                    if this.forwarded < LEADING_BLANK_WINDOW && is_blank(&text) {
                        continue;
                    }
                    if this.forwarded < LEADING_BLANK_WINDOW {
                        this.forwarded += 1;
                    }
                    return Poll::Ready(Some(Ok(Bytes::from(text))));
                }
                Poll::Ready(Some(Ok(ProviderEvent::Done))) => {
                    this.closed = true;
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Err(err))) => {
                    this.closed = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    this.closed = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
