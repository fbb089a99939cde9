//! Presents a sequence of individually keyed chunks as one byte stream.

pub mod manifest;
pub mod reader;
pub mod writer;

pub use manifest::ChunkManifest;
pub use reader::ChunkReader;
pub use writer::ChunkWriter;
