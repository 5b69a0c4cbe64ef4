#![allow(missing_docs)]

use bytes::Bytes;
use futures::{stream, TryStreamExt};
use http::{Response, StatusCode};
use mlrest::{
    lines_from_iter, IterLines, LineSource, MlError, MultipartConfig, MultipartPart, ParseError,
    ResponseAdapter, UNKNOWN_MIMETYPE,
};

/// Line source that fails the test when read.
struct Untouchable;

impl LineSource for Untouchable {
    fn next_line(&mut self) -> Option<Result<Bytes, MlError>> {
        panic!("body must not be read");
    }
}

fn multipart_response<B>(body: B) -> Response<B> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "multipart/mixed; boundary=1176113105d6eaed")
        .body(body)
        .expect("response should build")
}

fn three_parts() -> IterLines<std::vec::IntoIter<&'static str>> {
    lines_from_iter(vec![
        "--1176113105d6eaed",
        "Content-Type: text/plain",
        "X-Primitive: untypedAtomic",
        "",
        "hello",
        "--1176113105d6eaed",
        "Content-Type: text/plain",
        "X-Primitive: untypedAtomic",
        "",
        "world",
        "--1176113105d6eaed",
        "Content-Type: text/plain",
        "X-Primitive: untypedAtomic",
        "",
        "héllo",
        "world",
        "--1176113105d6eaed--",
    ])
}

#[test]
fn exposes_parsed_content_type() {
    let adapter = ResponseAdapter::new(multipart_response(three_parts()));

    assert_eq!(adapter.main_type(), "multipart");
    assert_eq!(adapter.sub_type(), "mixed");
    assert_eq!(adapter.boundary(), Some("1176113105d6eaed"));
    assert!(adapter.is_multipart_mixed());
    assert_eq!(adapter.status(), StatusCode::OK);
    assert_eq!(adapter.content_length(), None);
}

#[test]
fn iterates_parts_of_multipart_response() {
    let parts: Vec<MultipartPart> = ResponseAdapter::new(multipart_response(three_parts()))
        .iter_parts()
        .collect::<Result<_, _>>()
        .expect("body should parse");

    let bodies: Vec<String> = parts
        .iter()
        .map(|part| part.text().expect("utf-8 body"))
        .collect();
    assert_eq!(bodies, vec!["hello", "world", "héllo\nworld"]);
}

#[test]
fn missing_content_type_defaults_to_octet_stream() {
    let response = Response::new(Untouchable);
    let adapter = ResponseAdapter::new(response);

    assert_eq!(adapter.content_type().essence(), UNKNOWN_MIMETYPE);
    assert!(!adapter.is_multipart_mixed());
    assert_eq!(adapter.boundary(), None);
}

#[test]
fn zero_content_length_yields_nothing_without_reading() {
    let response = Response::builder()
        .header("Content-Type", "multipart/mixed; boundary=B")
        .header("Content-Length", "0")
        .body(Untouchable)
        .expect("response should build");

    let adapter = ResponseAdapter::new(response);
    assert_eq!(adapter.content_length(), Some(0));
    assert_eq!(adapter.iter_parts().count(), 0);
}

#[test]
fn unparseable_content_length_is_ignored() {
    let response = Response::builder()
        .header("Content-Type", "multipart/mixed; boundary=1176113105d6eaed")
        .header("Content-Length", "lots")
        .body(three_parts())
        .expect("response should build");

    let adapter = ResponseAdapter::new(response);
    assert_eq!(adapter.content_length(), None);
    assert_eq!(adapter.iter_parts().count(), 3);
}

#[test]
fn missing_boundary_is_empty_when_lenient() {
    let response = Response::builder()
        .header("Content-Type", "application/json")
        .body(Untouchable)
        .expect("response should build");

    assert_eq!(ResponseAdapter::new(response).iter_parts().count(), 0);
}

#[test]
fn empty_boundary_parameter_counts_as_missing() {
    let lenient = Response::builder()
        .header("Content-Type", "multipart/mixed; boundary=")
        .body(Untouchable)
        .expect("response should build");
    let adapter = ResponseAdapter::new(lenient);
    assert_eq!(adapter.boundary(), None);
    assert_eq!(adapter.iter_parts().count(), 0);

    let strict = Response::builder()
        .header("Content-Type", "multipart/mixed; boundary=\"\"")
        .body(Untouchable)
        .expect("response should build");
    let mut parts = ResponseAdapter::with_config(strict, MultipartConfig::strict())
        .expect("config should be valid")
        .iter_parts();
    assert!(matches!(
        parts.next(),
        Some(Err(MlError::Parse(ParseError::MissingBoundary)))
    ));
}

#[test]
fn missing_boundary_is_an_error_when_strict() {
    let response = Response::builder()
        .header("Content-Type", "multipart/mixed")
        .body(Untouchable)
        .expect("response should build");

    let mut parts = ResponseAdapter::with_config(response, MultipartConfig::strict())
        .expect("config should be valid")
        .iter_parts();

    assert!(matches!(
        parts.next(),
        Some(Err(MlError::Parse(ParseError::MissingBoundary)))
    ));
    assert!(parts.next().is_none());
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = MultipartConfig::default();
    config.limits.max_line_size = 0;

    let err = ResponseAdapter::with_config(multipart_response(three_parts()), config)
        .expect_err("zero line size rejected");
    assert_eq!(err.to_string(), "limit `max_line_size` must be greater than 0");
}

#[test]
fn buffered_response_is_read_line_by_line() {
    let body = Bytes::from_static(
        b"--B\r\nContent-Type: application/xml\r\n\r\n<a/>\r\n--B\r\n\r\n<b/>\r\n--B--\r\n",
    );
    let response = Response::builder()
        .header("Content-Type", "multipart/mixed; boundary=B")
        .body(body)
        .expect("response should build");

    let parts: Vec<MultipartPart> = ResponseAdapter::from_buffered(response)
        .iter_parts()
        .collect::<Result<_, _>>()
        .expect("body should parse");

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].content_type().essence(), "application/xml");
    assert!(parts[1].content_type().is_empty());
    assert_eq!(parts[1].body, Bytes::from_static(b"<b/>"));
}

#[tokio::test]
async fn streams_parts_of_chunked_body() {
    let chunks = stream::iter(vec![
        Ok::<_, MlError>(Bytes::from_static(b"--B\nX-Uri: /a.json\n\n{}")),
        Ok(Bytes::from_static(b"\n--B--\n")),
    ]);
    let response = Response::builder()
        .header("Content-Type", "multipart/mixed; boundary=B")
        .body(chunks)
        .expect("response should build");

    let parts: Vec<MultipartPart> = ResponseAdapter::new(response)
        .stream_parts()
        .try_collect()
        .await
        .expect("body should parse");

    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].headers.get("x-uri"), Some("/a.json"));
    assert_eq!(parts[0].body, Bytes::from_static(b"{}"));
}

#[tokio::test]
async fn streaming_honors_zero_content_length() {
    let chunks = stream::iter(vec![Err::<Bytes, _>(MlError::transport("must not be polled"))]);
    let response = Response::builder()
        .header("Content-Type", "multipart/mixed; boundary=B")
        .header("Content-Length", "0")
        .body(chunks)
        .expect("response should build");

    let parts: Vec<MultipartPart> = ResponseAdapter::new(response)
        .stream_parts()
        .try_collect()
        .await
        .expect("empty body should not be polled");
    assert!(parts.is_empty());
}
