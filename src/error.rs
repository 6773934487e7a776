use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;


#[derive(Error, Debug)]
pub enum SpriteError {
	/// Bad signature, unsupported bit depth/compression/planes, palette size
	/// mismatch, mask geometry mismatch.
	#[error("format error: {0}")]
	Format(String),

	/// An offset or slice computed from header fields exceeds the data.
	#[error("bounds error: {0}")]
	Bounds(String),

	#[error("could not access '{}': {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("stream error: {0}")]
	Stream(#[source] io::Error),
}


impl SpriteError {
	pub fn io(path: &Path, source: io::Error) -> SpriteError {
		SpriteError::Io {
			path: path.to_path_buf(),
			source,
		}
	}
}


// In-memory readers only hit EOF when a header field points past the buffer.
impl From<io::Error> for SpriteError {
	fn from(error: io::Error) -> SpriteError {
		match error.kind() {
			io::ErrorKind::UnexpectedEof => SpriteError::Bounds("unexpected end of data".to_string()),
			_ => SpriteError::Stream(error),
		}
	}
}
