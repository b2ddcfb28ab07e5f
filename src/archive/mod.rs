pub mod codec;
pub mod workspace;

pub use codec::{detect_format, repack, unpack, Format};
pub use workspace::WorkingDirectory;
