#![allow(missing_docs)]

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, Criterion};
use futures::{stream, TryStreamExt};
use mlrest::{BoundedLines, MlError, MultipartConfig, MultipartPart, MultipartStream, Parts};

const PARTS: usize = 256;

fn benchmark_sync_demux(c: &mut Criterion) {
    let body = Bytes::from(build_body(PARTS, 1024));
    let config = MultipartConfig::default();

    c.bench_function("iter_parts_256x1kb", |b| {
        b.iter(|| {
            let count = Parts::new("BOUND", BoundedLines::from_bytes(body.clone()), &config)
                .map(|part| part.expect("part should parse"))
                .count();
            assert_eq!(count, PARTS);
        });
    });
}

fn benchmark_stream_demux(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let body = Bytes::from(build_body(PARTS, 1024));
    let config = MultipartConfig::default();

    c.bench_function("stream_parts_256x1kb_8kb_chunks", |b| {
        b.to_async(&runtime).iter(|| async {
            let chunks: Vec<Result<Bytes, MlError>> = body
                .chunks(8 * 1024)
                .map(|chunk| Ok(body.slice_ref(chunk)))
                .collect();
            let parts: Vec<MultipartPart> =
                MultipartStream::new("BOUND", stream::iter(chunks), &config)
                    .try_collect()
                    .await
                    .expect("stream should parse");
            assert_eq!(parts.len(), PARTS);
        });
    });
}

fn build_body(parts: usize, part_size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts * (part_size + 96));
    for _ in 0..parts {
        out.extend_from_slice(
            b"--BOUND\r\nContent-Type: text/plain\r\nX-Primitive: string\r\n\r\n",
        );
        for line in 0..part_size / 64 {
            out.extend(std::iter::repeat(b'a' + (line % 26) as u8).take(63));
            out.extend_from_slice(b"\n");
        }
    }
    out.extend_from_slice(b"--BOUND--\r\n");
    out
}

criterion_group!(benches, benchmark_sync_demux, benchmark_stream_demux);
criterion_main!(benches);
