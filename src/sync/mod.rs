//! Blocking COPY reader over [`std::io::Read`].

mod reader;

pub use reader::CopyOutReader;
