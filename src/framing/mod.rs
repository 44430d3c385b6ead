mod decoder;
mod framer;
mod io;

pub use decoder::Frame;
pub use decoder::LineDecoder;
pub use decoder::ReadOutcome;
pub use framer::LineFramer;
pub use io::ChunkSink;
pub use io::ChunkSource;
pub use io::StreamSink;
pub use io::StreamSource;
