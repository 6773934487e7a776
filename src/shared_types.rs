use std::path::PathBuf;

/// 256 entries, 4 bytes each (blue, green, red, reserved).
pub const PALETTE_SIZE: usize = 1024;
pub const PALETTE_ENTRIES: usize = 256;

/// Pixel value written for every pixel of a transparent run.
pub const TRANSPARENT_INDEX: u8 = 255;


#[derive(Debug, Clone)]
pub struct Parameters {
	pub operation: Operation,
	/// Single-file mode when set, batch scan of `root_path` otherwise.
	pub source_path: Option<PathBuf>,
	pub root_path: PathBuf,
	pub container_format: ContainerFormat,
	pub write_mask: bool,
	pub rgba: bool,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Operation {
	Pack,
	Unpack,
}

/// Framing variant of the on-disk container.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub enum ContainerFormat {
	/// "libr" tag block and row-offset table between palette and stream.
	#[default]
	Extended,
	/// 12 reserved bytes between palette and stream, no row-offset table.
	Legacy,
}


#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum PixelClass {
	Transparent,
	Absolute,
	Literal,
}

impl PixelClass {
	/// Longest run a single record of this class can carry.
	pub fn max_chunk(self) -> usize {
		match self {
			PixelClass::Transparent | PixelClass::Absolute => 255,
			PixelClass::Literal => 253,
		}
	}

	/// Value stored in the role grid (and the mask raster) for this class.
	pub fn role_marker(self) -> u8 {
		match self {
			PixelClass::Transparent => 0,
			PixelClass::Absolute => 128,
			PixelClass::Literal => 255,
		}
	}

	pub fn from_role_marker(marker: u8) -> Option<PixelClass> {
		match marker {
			0 => Some(PixelClass::Transparent),
			128 => Some(PixelClass::Absolute),
			255 => Some(PixelClass::Literal),
			_ => None,
		}
	}
}

/// Class of every mask palette index.
pub type ClassTable = [PixelClass; PALETTE_ENTRIES];


/// 8-bit indexed raster, rows top-down and unpadded.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedImage {
	pub width: u32,
	pub height: u32,
	/// Always `PALETTE_SIZE` bytes.
	pub palette: Vec<u8>,
	pub pixels: Vec<u8>,
}

impl IndexedImage {
	pub fn row(&self, y: usize) -> &[u8] {
		let width: usize = self.width as usize;
		&self.pixels[y * width..(y + 1) * width]
	}
}

/// Same layout as `IndexedImage`; pixel values are only used to look up
/// their class through the mask's own palette.
pub type MaskImage = IndexedImage;


/// Output of the run-length decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSprite {
	pub width: u32,
	pub height: u32,
	pub pixels: Vec<u8>,
	/// Role marker per pixel, see `PixelClass::role_marker`.
	pub roles: Vec<u8>,
}

impl DecodedSprite {
	pub fn role(&self, x: usize, y: usize) -> Option<PixelClass> {
		PixelClass::from_role_marker(self.roles[y * self.width as usize + x])
	}
}


/// Encoded stream plus the byte length of each row inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedData {
	pub stream: Vec<u8>,
	pub row_lengths: Vec<usize>,
}


#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct BatchSummary {
	pub succeeded: usize,
	pub failed: usize,
}
