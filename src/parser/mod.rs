/// Multipart boundary helpers.
pub mod boundary;
/// Part header mapping and header line parsing.
pub mod headers;
/// Line sources feeding the demultiplexer.
pub mod lines;
/// Synchronous part iterator.
pub mod parts;
mod scanner;
/// Asynchronous part stream.
pub mod stream;

pub use boundary::{extract_boundary, BoundaryMarkers};
pub use headers::{parse_header_line, PartHeaders};
pub use lines::{lines_from_iter, BoundedLines, IterLines, LineSource};
pub use parts::Parts;
pub use stream::MultipartStream;
#[cfg(feature = "tokio-rt")]
pub use stream::ReaderChunks;
