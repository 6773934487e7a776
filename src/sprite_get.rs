use std::cmp::min;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use bitstream_io::{ByteRead, ByteReader, LittleEndian};
use bmp_rust::bmp::{BMP, BITMAPFILEHEADER};
use log::{debug, warn};

use crate::{
	bmp_rows,
	error::SpriteError,
	rle_header::{self, RleHeader, EXTENDED_FIXED_SIZE, PALETTE_OFFSET, TAG_OFFSET},
	shared_types::{ContainerFormat, DecodedSprite, IndexedImage, MaskImage, PALETTE_ENTRIES, PALETTE_SIZE},
	sprite_compress,
};

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;
const BI_RGB: u32 = 0;
const MAX_PIXELS_PER_BYTE: u64 = 128;


pub fn read_source(source_file: &Path) -> Result<Vec<u8>, SpriteError> {
	fs::read(source_file).map_err(|error| SpriteError::io(source_file, error))
}


/// The BITMAPINFOHEADER fields every DIB header of 40 bytes or more starts
/// with. Later header versions only append to it.
struct InfoCore {
	size: u32,
	width: i32,
	height: i32,
	planes: u16,
	bit_count: u16,
	compression: u32,
	colors_used: u32,
}


fn read_info_core(contents: &[u8]) -> Result<InfoCore, SpriteError> {
	let mut reader = ByteReader::endian(Cursor::new(&contents[FILE_HEADER_SIZE..]), LittleEndian);

	let size: u32 = reader.read::<u32>()?;
	let width: i32 = reader.read::<i32>()?;
	let height: i32 = reader.read::<i32>()?;
	let planes: u16 = reader.read::<u16>()?;
	let bit_count: u16 = reader.read::<u16>()?;
	let compression: u32 = reader.read::<u32>()?;

	// biSizeImage, biXPelsPerMeter, biYPelsPerMeter
	reader.skip(12)?;
	let colors_used: u32 = reader.read::<u32>()?;

	Ok(InfoCore {
		size,
		width,
		height,
		planes,
		bit_count,
		compression,
		colors_used,
	})
}


/// Parses an uncompressed 8 bpp bitmap into top-down rows and a 1024-byte
/// palette.
pub fn get_bmp(bytes: Vec<u8>) -> Result<IndexedImage, SpriteError> {
	if bytes.len() < 2 || &bytes[0..2] != b"BM" {
		return Err(SpriteError::Format("not a BMP (missing 'BM' signature)".to_string()));
	}

	if bytes.len() < FILE_HEADER_SIZE + INFO_HEADER_SIZE {
		return Err(SpriteError::Bounds(format!("BMP of {} bytes is shorter than its headers", bytes.len())));
	}

	let core: InfoCore = read_info_core(&bytes)?;
	let dib_size: usize = core.size as usize;

	if dib_size < INFO_HEADER_SIZE {
		return Err(SpriteError::Format(format!("unsupported DIB header of {} bytes", dib_size)));
	}

	if bytes.len() < FILE_HEADER_SIZE + dib_size {
		return Err(SpriteError::Bounds(format!(
			"{}-byte DIB header runs past the end of a {}-byte file",
			dib_size, bytes.len()
		)));
	}

	if core.planes != 1 {
		return Err(SpriteError::Format(format!("unsupported plane count {}", core.planes)));
	}

	if core.bit_count != 8 || core.compression != BI_RGB {
		return Err(SpriteError::Format(format!(
			"expected 8 bpp BI_RGB, found {} bpp with compression {}",
			core.bit_count, core.compression
		)));
	}

	if core.width <= 0 {
		return Err(SpriteError::Format(format!("invalid width {}", core.width)));
	}
	let width: u32 = core.width as u32;

	// Not using BMP::new_from_file as it panics when the file can't be read
	let mut bmp: BMP = BMP::new(50i32, 50u32, Some([0u8, 0u8, 0u8, 0u8]));
	bmp.contents = bytes;

	let file_header: BITMAPFILEHEADER = BMP::get_header(&bmp);
	let contents: &[u8] = &bmp.contents;

	let height: u32 = core.height.unsigned_abs();
	if height == 0 {
		return Err(SpriteError::Format("image height is zero".to_string()));
	}

	// Palette read, zero-padded to 256 entries
	let color_count: usize = match core.colors_used {
		0 => PALETTE_ENTRIES,
		value => min(value as usize, PALETTE_ENTRIES),
	};

	let palette_start: usize = FILE_HEADER_SIZE + dib_size;
	let palette_end: usize = palette_start + color_count * 4;

	if palette_end > contents.len() {
		return Err(SpriteError::Bounds(format!(
			"palette of {} colors ends at {} past the file end {}",
			color_count, palette_end, contents.len()
		)));
	}

	let mut palette: Vec<u8> = contents[palette_start..palette_end].to_vec();
	palette.resize(PALETTE_SIZE, 0u8);

	// Pixel rows, bottom-up unless the height is negative
	let pixel_start: usize = file_header.bfOffBits as usize;
	if pixel_start > contents.len() {
		return Err(SpriteError::Bounds(format!(
			"pixel data offset {} is past the file end {}",
			pixel_start, contents.len()
		)));
	}

	let pixels: Vec<u8> = bmp_rows::unpack_rows(
		&contents[pixel_start..],
		width as usize,
		height as usize,
		1,
		core.height > 0,
	)?;

	debug!("BMP {}x{}, {} palette colors", width, height, color_count);

	Ok(IndexedImage {
		width,
		height,
		palette,
		pixels,
	})
}


/// Same as `get_bmp`, and the geometry must match the image it tags.
pub fn get_mask(bytes: Vec<u8>, expected_width: u32, expected_height: u32) -> Result<MaskImage, SpriteError> {
	let mask: MaskImage = get_bmp(bytes)?;

	if mask.width != expected_width || mask.height != expected_height {
		return Err(SpriteError::Format(format!(
			"mask BMP is {}x{}, expected {}x{}",
			mask.width, mask.height, expected_width, expected_height
		)));
	}

	Ok(mask)
}


/// A parsed container, borrowing palette and stream from the file bytes.
#[derive(Debug, Clone)]
pub struct RleContainer<'a> {
	pub header: RleHeader,
	pub palette: &'a [u8],
	/// End of each row inside `stream`. Empty when the file has no table.
	pub row_offsets: Vec<u32>,
	pub stream: &'a [u8],
}

impl<'a> RleContainer<'a> {
	pub fn format(&self) -> ContainerFormat {
		self.header.format
	}

	pub fn width(&self) -> u32 {
		self.header.width
	}

	pub fn height(&self) -> u32 {
		self.header.height
	}

	pub fn decode(&self) -> Result<DecodedSprite, SpriteError> {
		sprite_compress::decompress(self.stream, self.header.width, self.header.height)
	}

	/// Encoded bytes of row `y`, located through the row-offset table.
	pub fn row_stream(&self, y: u32) -> Result<&'a [u8], SpriteError> {
		if y >= self.header.height {
			return Err(SpriteError::Bounds(format!("row {} of {}", y, self.header.height)));
		}

		if self.row_offsets.len() + 1 != self.header.height as usize {
			return Err(SpriteError::Format(format!(
				"row-offset table has {} entries for {} rows",
				self.row_offsets.len(), self.header.height
			)));
		}

		let y: usize = y as usize;
		let start: usize = if y == 0 { 0 } else { self.row_offsets[y - 1] as usize };
		let end: usize = if y == self.row_offsets.len() { self.stream.len() } else { self.row_offsets[y] as usize };

		if start > end || end > self.stream.len() {
			return Err(SpriteError::Bounds(format!(
				"row {} spans {}..{} outside a {}-byte stream",
				y, start, end, self.stream.len()
			)));
		}

		Ok(&self.stream[start..end])
	}

	pub fn decode_row(&self, y: u32) -> Result<DecodedSprite, SpriteError> {
		sprite_compress::decompress(self.row_stream(y)?, self.header.width, 1)
	}
}


pub fn get_rle(data: &[u8]) -> Result<RleContainer<'_>, SpriteError> {
	let header: RleHeader = rle_header::get_header(data)?;

	if data.len() < TAG_OFFSET {
		return Err(SpriteError::Bounds(format!("{}-byte file ends inside the palette", data.len())));
	}

	let stream_offset: usize = header.stream_offset as usize;
	let total_size: usize = header.total_size as usize;

	if stream_offset < header.fixed_size() || stream_offset > data.len() {
		return Err(SpriteError::Bounds(format!(
			"stream offset {} outside {}..={}",
			stream_offset, header.fixed_size(), data.len()
		)));
	}

	if total_size < stream_offset {
		return Err(SpriteError::Bounds(format!(
			"declared size {} is smaller than the stream offset {}",
			total_size, stream_offset
		)));
	}

	if total_size > data.len() {
		warn!("Container declares {} bytes but holds {}, decoding what is there", total_size, data.len());
	}

	// Every two stream bytes fill at most 255 pixels
	let stream_len: usize = min(total_size, data.len()) - stream_offset;
	let pixel_count: u64 = u64::from(header.width) * u64::from(header.height);

	if pixel_count > MAX_PIXELS_PER_BYTE * stream_len as u64 {
		return Err(SpriteError::Bounds(format!(
			"{}x{} pixels cannot come from a {}-byte stream",
			header.width, header.height, stream_len
		)));
	}

	let mut row_offsets: Vec<u32> = Vec::with_capacity(header.table_entries());
	if header.table_entries() > 0 {
		let mut reader = ByteReader::endian(Cursor::new(&data[EXTENDED_FIXED_SIZE..stream_offset]), LittleEndian);
		for _ in 0..header.table_entries() {
			row_offsets.push(reader.read::<u32>()?);
		}
	}

	debug!(
		"{:?} container {}x{}, stream {} bytes at {}, {} row offsets",
		header.format, header.width, header.height, total_size - stream_offset, stream_offset, row_offsets.len()
	);

	Ok(RleContainer {
		palette: &data[PALETTE_OFFSET..TAG_OFFSET],
		stream: &data[stream_offset..min(total_size, data.len())],
		row_offsets,
		header,
	})
}
