//! Stdout sink tests

use super::StdoutSink;
use crate::common::Sink;

#[tokio::test]
async fn test_each_event_is_one_line() {
    let mut sink = StdoutSink::with_writer(Vec::new());

    sink.deliver(r#"{"a":1}"#).await.unwrap();
    sink.deliver(r#"{"b":2}"#).await.unwrap();
    sink.close().await.unwrap();

    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.events_written, 2);
    assert_eq!(snapshot.bytes_written, 16);
    assert_eq!(snapshot.write_errors, 0);

    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(out, "{\"a\":1}\n{\"b\":2}\n");
}

#[tokio::test]
async fn test_name() {
    let sink = StdoutSink::with_writer(Vec::new());
    assert_eq!(sink.name(), "stdout");
}
