//! Asynchronous COPY reader over Tokio's `AsyncRead`.

mod reader;

pub use reader::CopyOutReader;
