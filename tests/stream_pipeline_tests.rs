//! # Stream Pipeline Tests
//!
//! Drives the parser and relay transformer together over simulated network
//! chunk sequences, checking the bytes that would reach the client.

use bytes::Bytes;
use futures_util::StreamExt;
use report_relay::{EventStream, RelayError, RelayStream};

/// Run a chunk sequence through the full parse-and-relay pipeline.
async fn relay(chunks: Vec<&[u8]>) -> Vec<Result<Bytes, RelayError>> {
    let byte_stream = futures_util::stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<_, RelayError>(Bytes::copy_from_slice(chunk)))
            .collect::<Vec<_>>(),
    );
    RelayStream::new(EventStream::new(byte_stream.boxed()))
        .collect()
        .await
}

fn concat_ok(items: &[Result<Bytes, RelayError>]) -> String {
    items
        .iter()
        .map(|item| String::from_utf8(item.as_ref().unwrap().to_vec()).unwrap())
        .collect()
}

#[tokio::test]
async fn split_event_relays_as_hello() {
    let out = relay(vec![
        b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel",
        b"lo\"}}]}\n\n",
        b"data: [DONE]\n\n",
    ])
    .await;

    assert_eq!(concat_ok(&out), "Hello");
}

#[tokio::test]
async fn output_equals_deltas_in_order() {
    let out = relay(vec![
        b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        b"data: {\"choices\":[{\"delta\":{\"content\":\"This week \"}}]}\n\n",
        b"data: {\"choices\":[{\"delta\":{\"content\":\"I shipped\"}}]}\n\n",
        b"data: {\"choices\":[{\"delta\":{\"content\":\" the relay.\"}}]}\n\n",
        b"data: [DONE]\n\n",
    ])
    .await;

    assert_eq!(concat_ok(&out), "This week I shipped the relay.");
}

#[tokio::test]
async fn leading_blank_deltas_are_suppressed_end_to_end() {
    let out = relay(vec![
        b"data: {\"choices\":[{\"delta\":{\"content\":\"\\n\\n\"}}]}\n\n",
        b"data: {\"choices\":[{\"delta\":{\"content\":\"\\n\"}}]}\n\n",
        b"data: {\"choices\":[{\"delta\":{\"content\":\"Report:\"}}]}\n\n",
        b"data: {\"choices\":[{\"delta\":{\"content\":\"\\n- item\"}}]}\n\n",
        b"data: [DONE]\n\n",
    ])
    .await;

    // The two blank-only prefixes disappear; the embedded newline in the
    // fourth delta survives because it is not blank-only.
    assert_eq!(concat_ok(&out), "Report:\n- item");
}

#[tokio::test]
async fn nothing_is_emitted_after_done() {
    let out = relay(vec![
        b"data: {\"choices\":[{\"delta\":{\"content\":\"kept\"}}]}\n\n",
        b"data: [DONE]\n\n",
        b"data: {\"choices\":[{\"delta\":{\"content\":\"dropped\"}}]}\n\n",
    ])
    .await;

    assert_eq!(concat_ok(&out), "kept");
}

#[tokio::test]
async fn parse_failure_surfaces_after_prior_output() {
    let chunks = vec![
        &b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n"[..],
        &b"data: {broken\n\n"[..],
    ];
    let out = relay(chunks).await;

    assert_eq!(out.len(), 2);
    assert_eq!(
        String::from_utf8(out[0].as_ref().unwrap().to_vec()).unwrap(),
        "partial"
    );
    assert!(matches!(out[1], Err(RelayError::Parse(_))));
}

#[tokio::test]
async fn upstream_end_without_done_closes_cleanly() {
    let out = relay(vec![
        b"data: {\"choices\":[{\"delta\":{\"content\":\"unterminated\"}}]}\n\n",
    ])
    .await;

    assert_eq!(concat_ok(&out), "unterminated");
}

#[tokio::test]
async fn transport_error_mid_stream_is_propagated() {
    let byte_stream = futures_util::stream::iter(vec![
        Ok(Bytes::from_static(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n",
        )),
        Err(RelayError::Upstream {
            status: None,
            detail: "connection reset".to_string(),
        }),
    ]);
    let out: Vec<_> = RelayStream::new(EventStream::new(byte_stream.boxed()))
        .collect()
        .await;

    assert_eq!(out.len(), 2);
    assert!(out[0].is_ok());
    assert!(matches!(out[1], Err(RelayError::Upstream { .. })));
}
