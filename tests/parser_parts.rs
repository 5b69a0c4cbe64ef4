#![allow(missing_docs)]

use bytes::Bytes;
use mlrest::{
    lines_from_iter, BoundedLines, IncompletePolicy, Limits, LineSource, MlError, MultipartConfig,
    ParseError, Parts,
};

const BOUNDARY: &str = "1176113105d6eaed";

fn three_part_lines() -> Vec<&'static str> {
    vec![
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
    ]
}

/// Counts how many lines were pulled from the wrapped source.
struct CountingLines<L> {
    inner: L,
    pulled: usize,
}

impl<L: LineSource> LineSource for CountingLines<L> {
    fn next_line(&mut self) -> Option<Result<Bytes, MlError>> {
        let line = self.inner.next_line();
        if line.is_some() {
            self.pulled += 1;
        }
        line
    }
}

#[test]
fn extracts_three_parts_with_case_insensitive_headers() {
    let parts: Vec<_> = Parts::new(
        BOUNDARY,
        lines_from_iter(three_part_lines()),
        &MultipartConfig::default(),
    )
    .collect::<Result<_, _>>()
    .expect("body should parse");

    assert_eq!(parts.len(), 3);
    for part in &parts {
        assert_eq!(part.headers.len(), 2);
        assert_eq!(part.headers.get("content-type"), Some("text/plain"));
        assert_eq!(part.headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(part.headers.get("x-primitive"), Some("untypedAtomic"));
    }

    assert_eq!(parts[0].body, Bytes::from_static(b"hello"));
    assert_eq!(parts[1].body, Bytes::from_static(b"world"));
    assert_eq!(parts[2].body, Bytes::from("héllo\nworld"));
    assert_eq!(parts[2].text().expect("utf-8 body"), "héllo\nworld");
}

#[test]
fn header_names_keep_server_case() {
    let mut parts = Parts::new(
        BOUNDARY,
        lines_from_iter(three_part_lines()),
        &MultipartConfig::default(),
    );
    let first = parts
        .next()
        .expect("first item should exist")
        .expect("first part should parse");

    let names: Vec<&str> = first.headers.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Content-Type", "X-Primitive"]);
}

#[test]
fn preamble_and_epilogue_are_discarded() {
    let lines = vec![
        "This is a preamble",
        "--B",
        "",
        "payload",
        "--B--",
        "This is an epilogue",
        "--B",
        "",
        "ghost",
    ];
    let parts: Vec<_> = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default())
        .collect::<Result<_, _>>()
        .expect("body should parse");

    assert_eq!(parts.len(), 1);
    assert!(parts[0].headers.is_empty());
    assert_eq!(parts[0].body, Bytes::from_static(b"payload"));
}

#[test]
fn stops_reading_after_terminal_boundary() {
    let mut source = CountingLines {
        inner: lines_from_iter(vec!["--B", "", "one", "--B--", "epilogue", "more"]),
        pulled: 0,
    };

    let count = Parts::new("B", &mut source, &MultipartConfig::default()).count();
    assert_eq!(count, 1);
    assert_eq!(source.pulled, 4);
}

#[test]
fn body_is_trimmed_once_at_edges_only() {
    let lines = vec!["--B", "", "", "  first  ", "", "  second", "  ", "--B--"];
    let parts: Vec<_> = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default())
        .collect::<Result<_, _>>()
        .expect("body should parse");

    assert_eq!(parts[0].body, Bytes::from_static(b"first  \n\n  second"));
}

#[test]
fn vertical_tab_is_trimmed_like_other_whitespace() {
    let lines = vec!["--B", "", "\x0bpayload\x0b", "\x0b--B--\x0c"];
    let part = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default())
        .next()
        .expect("item expected")
        .expect("part should parse");

    assert_eq!(part.body, Bytes::from_static(b"payload"));
}

#[test]
fn boundary_lines_match_after_trimming() {
    let lines = vec!["  --B  ", "A: 1", "", "x", "--B\t", "A: 2", "", "y", " --B-- "];
    let bodies: Vec<Bytes> = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default())
        .map(|part| part.expect("part should parse").body)
        .collect();

    assert_eq!(bodies, vec![Bytes::from_static(b"x"), Bytes::from_static(b"y")]);
}

#[test]
fn duplicate_headers_overwrite() {
    let lines = vec!["--B", "X-Tag: one", "x-tag: two", "", "body", "--B--"];
    let part = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default())
        .next()
        .expect("item expected")
        .expect("part should parse");

    assert_eq!(part.headers.len(), 1);
    assert_eq!(part.headers.get("X-TAG"), Some("two"));
}

#[test]
fn duplicate_header_takes_latest_spelling_in_first_position() {
    let lines = vec![
        "--B",
        "X-Tag: one",
        "Content-Type: text/plain",
        "x-TAG: two",
        "",
        "body",
        "--B--",
    ];
    let part = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default())
        .next()
        .expect("item expected")
        .expect("part should parse");

    let headers: Vec<(&str, &str)> = part.headers.iter().collect();
    assert_eq!(
        headers,
        vec![("x-TAG", "two"), ("Content-Type", "text/plain")]
    );
}

#[test]
fn header_value_keeps_colons_after_the_first() {
    let lines = vec!["--B", "X-Uri: http://example.com/a", "", "body", "--B--"];
    let part = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default())
        .next()
        .expect("item expected")
        .expect("part should parse");

    assert_eq!(part.headers.get("x-uri"), Some("http://example.com/a"));
}

#[test]
fn empty_part_body_is_empty() {
    let lines = vec!["--B", "Content-Type: text/plain", "", "--B--"];
    let part = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default())
        .next()
        .expect("item expected")
        .expect("part should parse");

    assert!(part.body.is_empty());
}

#[test]
fn header_line_without_colon_is_an_error_and_ends_iteration() {
    let lines = vec!["--B", "not a header", "", "body", "--B--"];
    let mut parts = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default());

    let item = parts.next().expect("item expected");
    assert!(matches!(
        item,
        Err(MlError::Parse(ParseError::InvalidHeaderLine { .. }))
    ));
    assert!(parts.next().is_none());
}

#[test]
fn lenient_policy_drops_truncated_part() {
    let lines = vec!["--B", "", "complete", "--B", "", "truncated"];
    let parts: Vec<_> = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default())
        .collect::<Result<_, _>>()
        .expect("lenient parse should not fail");

    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].body, Bytes::from_static(b"complete"));
}

#[test]
fn lenient_policy_yields_nothing_without_boundary_line() {
    let lines = vec!["no", "boundary", "here"];
    let mut parts = Parts::new("B", lines_from_iter(lines), &MultipartConfig::default());
    assert!(parts.next().is_none());
}

#[test]
fn strict_policy_reports_incomplete_stream() {
    let lines = vec!["--B", "", "complete", "--B", "", "truncated"];
    let mut parts = Parts::new("B", lines_from_iter(lines), &MultipartConfig::strict());

    let first = parts
        .next()
        .expect("first item should exist")
        .expect("first part should parse");
    assert_eq!(first.body, Bytes::from_static(b"complete"));

    let item = parts.next().expect("error item expected");
    assert!(matches!(
        item,
        Err(MlError::Parse(ParseError::IncompleteStream))
    ));
    assert!(parts.next().is_none());
}

#[test]
fn strict_policy_accepts_complete_body() {
    let parts: Vec<_> = Parts::new(
        BOUNDARY,
        lines_from_iter(three_part_lines()),
        &MultipartConfig::strict(),
    )
    .collect::<Result<_, _>>()
    .expect("complete body should parse");
    assert_eq!(parts.len(), 3);
}

#[test]
fn part_size_limit_is_enforced() {
    let config = MultipartConfig {
        limits: Limits {
            max_part_size: Some(8),
            ..Limits::default()
        },
        incomplete_policy: IncompletePolicy::Lenient,
    };
    let lines = vec!["--B", "", "1234", "5678", "--B--"];
    let mut parts = Parts::new("B", lines_from_iter(lines), &config);

    let item = parts.next().expect("item expected");
    assert!(matches!(
        item,
        Err(MlError::Parse(ParseError::PartTooLarge { max: 8 }))
    ));
    assert!(parts.next().is_none());
}

#[test]
fn reads_crlf_lines_from_buffered_reader() {
    let body = concat!(
        "\r\n",
        "--B\r\n",
        "Content-Type: application/json\r\n",
        "X-Path: /a.json\r\n",
        "\r\n",
        "{\"a\": 1}\r\n",
        "--B\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "line one\r\n",
        "line two\r\n",
        "--B--\r\n"
    );
    let parts: Vec<_> = Parts::new(
        "B",
        BoundedLines::from_bytes(body),
        &MultipartConfig::default(),
    )
    .collect::<Result<_, _>>()
    .expect("body should parse");

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].content_type().essence(), "application/json");
    assert_eq!(parts[0].body, Bytes::from_static(b"{\"a\": 1}"));
    assert_eq!(parts[1].body, Bytes::from_static(b"line one\nline two"));
}

#[test]
fn non_utf8_body_bytes_survive() {
    let body: &[u8] = b"--B\n\n\xff\xfe raw\n--B--\n";
    let part = Parts::new(
        "B",
        BoundedLines::from_bytes(body.to_vec()),
        &MultipartConfig::default(),
    )
    .next()
    .expect("item expected")
    .expect("part should parse");

    assert_eq!(&part.body[..], b"\xff\xfe raw");
    assert!(matches!(
        part.text(),
        Err(MlError::Parse(ParseError::NonUtf8Body))
    ));
}

#[test]
fn bounded_lines_reject_overlong_line() {
    let mut lines = BoundedLines::with_max_line_size(std::io::Cursor::new(b"abc\nabcdef\nx\n".to_vec()), 4);

    let first = lines
        .next_line()
        .expect("first line expected")
        .expect("first line within bound");
    assert_eq!(first, Bytes::from_static(b"abc"));

    let second = lines.next_line().expect("second item expected");
    assert!(matches!(
        second,
        Err(MlError::Parse(ParseError::LineTooLong { max: 4 }))
    ));
    assert!(lines.next_line().is_none());
}

#[test]
fn bounded_lines_accept_line_at_bound_with_crlf() {
    let mut lines = BoundedLines::with_max_line_size(std::io::Cursor::new(b"abcd\r\nlast".to_vec()), 4);

    let first = lines
        .next_line()
        .expect("first line expected")
        .expect("line at bound accepted");
    assert_eq!(first, Bytes::from_static(b"abcd"));

    let last = lines
        .next_line()
        .expect("last line expected")
        .expect("unterminated last line accepted");
    assert_eq!(last, Bytes::from_static(b"last"));
    assert!(lines.next_line().is_none());
}
