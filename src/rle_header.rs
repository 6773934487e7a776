use std::io::Cursor;

use bitstream_io::{BitRead, BitReader, ByteRead, ByteReader, ByteWrite, ByteWriter, LittleEndian};

use crate::{
	error::SpriteError,
	shared_types::{ContainerFormat, PALETTE_SIZE},
};

pub const SIGNATURE: [u8; 2] = *b"BM";
pub const INFO_HEADER_SIZE: u32 = 40;
pub const PALETTE_OFFSET: usize = 54;
pub const TAG_OFFSET: usize = PALETTE_OFFSET + PALETTE_SIZE;
pub const EXTENDED_TAG: [u8; 4] = *b"libr";

/// Everything before the row-offset table of an extended container.
pub const EXTENDED_FIXED_SIZE: usize = TAG_OFFSET + 16;
/// Everything before the stream of a legacy container.
pub const LEGACY_FIXED_SIZE: usize = TAG_OFFSET + 12;

pub const BIT_COUNT: u16 = 8;
pub const PLANES: u16 = 1;
/// BI_RLE4 in a BMP; here it only marks the custom run encoding.
pub const RLE_COMPRESSION: u32 = 4;
pub const PIXELS_PER_METRE: i32 = 2835;

const LEGACY_FIELD_LIMIT: u64 = 1 << 24;


/// Every size and offset of a container, computed before any byte is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerLayout {
	pub format: ContainerFormat,
	pub width: u32,
	pub height: u32,
	/// End of each row inside the stream, rows 0..height-1. Empty for legacy.
	pub row_offsets: Vec<u32>,
	pub stream_offset: u32,
	pub stream_len: u32,
	pub total_size: u32,
}

impl ContainerLayout {
	pub fn plan(
		format: ContainerFormat,
		width: u32,
		height: u32,
		row_lengths: &[usize],
		stream_len: usize,
	) -> Result<ContainerLayout, SpriteError> {
		if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
			return Err(SpriteError::Format(format!("unsupported geometry {}x{}", width, height)));
		}

		if row_lengths.len() != height as usize {
			return Err(SpriteError::Format(format!(
				"{} row lengths for a height of {}",
				row_lengths.len(), height
			)));
		}

		let mut row_offsets: Vec<u32> = Vec::new();
		let fixed_size: usize;

		match format {
			ContainerFormat::Extended => {
				let mut cumulative: usize = 0;
				for length in &row_lengths[..row_lengths.len() - 1] {
					cumulative += length;
					row_offsets.push(to_u32(cumulative, "row offset")?);
				}
				fixed_size = EXTENDED_FIXED_SIZE;
			},

			ContainerFormat::Legacy => fixed_size = LEGACY_FIXED_SIZE,
		}

		let stream_offset: u32 = to_u32(fixed_size + 4 * row_offsets.len(), "stream offset")?;
		let stream_len: u32 = to_u32(stream_len, "stream length")?;
		let total_size: u32 = stream_offset
			.checked_add(stream_len)
			.ok_or_else(|| SpriteError::Format("container exceeds 4 GiB".to_string()))?;

		if format == ContainerFormat::Legacy {
			for (name, value) in [("size", total_size), ("width", width), ("height", height)] {
				if u64::from(value) >= LEGACY_FIELD_LIMIT {
					return Err(SpriteError::Format(format!(
						"legacy container {} {} does not fit in 3 bytes",
						name, value
					)));
				}
			}
		}

		Ok(ContainerLayout {
			format,
			width,
			height,
			row_offsets,
			stream_offset,
			stream_len,
			total_size,
		})
	}
}


fn to_u32(value: usize, what: &str) -> Result<u32, SpriteError> {
	u32::try_from(value).map_err(|_| SpriteError::Format(format!("{} {} exceeds 32 bits", what, value)))
}


/// File header and geometry block, the 54 bytes in front of the palette.
pub fn get_bytes(layout: &ContainerLayout) -> Result<Vec<u8>, SpriteError> {
	let mut header: Vec<u8> = Vec::with_capacity(PALETTE_OFFSET);
	let mut writer = ByteWriter::endian(&mut header, LittleEndian);

	// BITMAPFILEHEADER
	writer.write_bytes(&SIGNATURE)?;
	writer.write::<u32>(layout.total_size)?;
	writer.write::<u16>(0)?;
	writer.write::<u16>(0)?;
	writer.write::<u32>(layout.stream_offset)?;

	// Geometry block
	writer.write::<u32>(INFO_HEADER_SIZE)?;
	writer.write::<i32>(layout.width as i32)?;
	writer.write::<i32>(layout.height as i32)?;
	writer.write::<u16>(PLANES)?;
	writer.write::<u16>(BIT_COUNT)?;
	writer.write::<u32>(RLE_COMPRESSION)?;
	writer.write::<u32>(layout.stream_len)?;
	writer.write::<i32>(PIXELS_PER_METRE)?;
	writer.write::<i32>(PIXELS_PER_METRE)?;
	writer.write::<u32>(0)?;
	writer.write::<u32>(0)?;

	Ok(header)
}


/// Section between palette and stream: tag block plus row-offset table for
/// extended containers, 12 reserved bytes for legacy ones.
pub fn get_section_bytes(layout: &ContainerLayout) -> Result<Vec<u8>, SpriteError> {
	let mut section: Vec<u8> = Vec::new();
	let mut writer = ByteWriter::endian(&mut section, LittleEndian);

	match layout.format {
		ContainerFormat::Extended => {
			writer.write_bytes(&EXTENDED_TAG)?;
			writer.write::<u32>(layout.width)?;
			writer.write::<u32>(layout.height)?;
			writer.write::<u32>(0)?;

			for offset in &layout.row_offsets {
				writer.write::<u32>(*offset)?;
			}
		},

		ContainerFormat::Legacy => writer.write_bytes(&[0u8; LEGACY_FIXED_SIZE - TAG_OFFSET])?,
	}

	Ok(section)
}


#[derive(Debug, Clone, PartialEq)]
pub struct RleHeader {
	pub format: ContainerFormat,
	pub total_size: u32,
	pub stream_offset: u32,
	pub width: u32,
	pub height: u32,
	pub planes: u16,
	pub bit_count: u16,
	pub compression: u32,
}

impl RleHeader {
	pub fn fixed_size(&self) -> usize {
		match self.format {
			ContainerFormat::Extended => EXTENDED_FIXED_SIZE,
			ContainerFormat::Legacy => LEGACY_FIXED_SIZE,
		}
	}

	/// Number of row-offset table entries between the tag block and the stream.
	pub fn table_entries(&self) -> usize {
		match self.format {
			ContainerFormat::Extended => (self.stream_offset as usize).saturating_sub(EXTENDED_FIXED_SIZE) / 4,
			ContainerFormat::Legacy => 0,
		}
	}
}


/// Variant is told apart by the tag right after the palette.
pub fn detect_format(data: &[u8]) -> ContainerFormat {
	match data.get(TAG_OFFSET..TAG_OFFSET + EXTENDED_TAG.len()) {
		Some(tag) if tag == EXTENDED_TAG => ContainerFormat::Extended,
		_ => ContainerFormat::Legacy,
	}
}


pub fn get_header(data: &[u8]) -> Result<RleHeader, SpriteError> {
	if data.len() < SIGNATURE.len() || data[..SIGNATURE.len()] != SIGNATURE {
		return Err(SpriteError::Format("missing 'BM' signature".to_string()));
	}

	if data.len() < PALETTE_OFFSET {
		return Err(SpriteError::Bounds(format!(
			"{} bytes is shorter than the {}-byte header",
			data.len(), PALETTE_OFFSET
		)));
	}

	let header: RleHeader = match detect_format(data) {
		ContainerFormat::Extended => get_extended_header(data)?,
		ContainerFormat::Legacy => get_legacy_header(data)?,
	};

	if header.planes != PLANES {
		return Err(SpriteError::Format(format!("unsupported plane count {}", header.planes)));
	}

	if header.bit_count != BIT_COUNT {
		return Err(SpriteError::Format(format!("unsupported bit depth {}", header.bit_count)));
	}

	if header.compression != RLE_COMPRESSION {
		return Err(SpriteError::Format(format!("unsupported compression code {}", header.compression)));
	}

	if header.width == 0 || header.height == 0 {
		return Err(SpriteError::Format(format!("empty geometry {}x{}", header.width, header.height)));
	}

	Ok(header)
}


fn get_extended_header(data: &[u8]) -> Result<RleHeader, SpriteError> {
	let mut reader = ByteReader::endian(Cursor::new(data), LittleEndian);

	reader.skip(2)?;
	let total_size: u32 = reader.read::<u32>()?;
	reader.skip(4)?;
	let stream_offset: u32 = reader.read::<u32>()?;
	reader.skip(4)?;
	let width: i32 = reader.read::<i32>()?;
	let height: i32 = reader.read::<i32>()?;
	let planes: u16 = reader.read::<u16>()?;
	let bit_count: u16 = reader.read::<u16>()?;
	let compression: u32 = reader.read::<u32>()?;

	if width <= 0 {
		return Err(SpriteError::Format(format!("invalid width {}", width)));
	}

	Ok(RleHeader {
		format: ContainerFormat::Extended,
		total_size,
		stream_offset,
		width: width as u32,
		height: height.unsigned_abs(),
		planes,
		bit_count,
		compression,
	})
}


// Legacy fields are 3 bytes wide, each followed by padding the reader skips.
fn get_legacy_header(data: &[u8]) -> Result<RleHeader, SpriteError> {
	let mut reader = BitReader::endian(Cursor::new(data), LittleEndian);

	reader.skip(16)?;
	let total_size: u32 = reader.read::<u32>(24)?;
	reader.skip(40)?;
	let stream_offset: u32 = reader.read::<u32>(24)?;
	reader.skip(40)?;
	let width: u32 = reader.read::<u32>(24)?;
	reader.skip(8)?;
	let height: u32 = reader.read::<u32>(24)?;
	reader.skip(8)?;
	let planes: u16 = reader.read::<u16>(16)?;
	let bit_count: u16 = reader.read::<u16>(16)?;
	let compression: u32 = reader.read::<u32>(32)?;

	Ok(RleHeader {
		format: ContainerFormat::Legacy,
		total_size,
		stream_offset,
		width,
		height,
		planes,
		bit_count,
		compression,
	})
}


#[cfg(test)]
mod tests {
	use super::*;

	fn container_prefix(layout: &ContainerLayout) -> Vec<u8> {
		let mut data: Vec<u8> = get_bytes(layout).unwrap();
		data.extend_from_slice(&[0u8; PALETTE_SIZE]);
		data.extend(get_section_bytes(layout).unwrap());
		data
	}

	#[test]
	fn extended_layout_offsets() {
		let layout = ContainerLayout::plan(ContainerFormat::Extended, 8, 3, &[10, 9, 4], 23).unwrap();

		assert_eq!(layout.row_offsets, vec![10, 19]);
		assert_eq!(layout.stream_offset as usize, EXTENDED_FIXED_SIZE + 8);
		assert_eq!(layout.total_size, layout.stream_offset + 23);
	}

	#[test]
	fn row_offsets_are_cumulative_row_lengths() {
		let row_lengths: Vec<usize> = vec![3, 0, 255, 17, 40, 2];
		let layout = ContainerLayout::plan(ContainerFormat::Extended, 5, 6, &row_lengths, 317).unwrap();

		assert_eq!(layout.row_offsets.len(), 5);
		for (index, offset) in layout.row_offsets.iter().enumerate() {
			assert_eq!(*offset as usize, row_lengths[..=index].iter().sum::<usize>());
		}
	}

	#[test]
	fn single_row_has_no_table() {
		let layout = ContainerLayout::plan(ContainerFormat::Extended, 8, 1, &[9], 9).unwrap();
		assert!(layout.row_offsets.is_empty());
		assert_eq!(layout.stream_offset as usize, EXTENDED_FIXED_SIZE);
	}

	#[test]
	fn legacy_layout_offsets() {
		let layout = ContainerLayout::plan(ContainerFormat::Legacy, 8, 3, &[10, 9, 4], 23).unwrap();

		assert!(layout.row_offsets.is_empty());
		assert_eq!(layout.stream_offset as usize, LEGACY_FIXED_SIZE);
		assert_eq!(layout.total_size as usize, LEGACY_FIXED_SIZE + 23);
	}

	#[test]
	fn legacy_rejects_wide_fields() {
		let result = ContainerLayout::plan(ContainerFormat::Legacy, 1 << 24, 1, &[0], 0);
		assert!(matches!(result, Err(SpriteError::Format(_))));
	}

	#[test]
	fn plan_rejects_wrong_row_count() {
		let result = ContainerLayout::plan(ContainerFormat::Extended, 4, 2, &[5], 5);
		assert!(matches!(result, Err(SpriteError::Format(_))));
	}

	#[test]
	fn fixed_header_bytes() {
		let layout = ContainerLayout::plan(ContainerFormat::Extended, 8, 2, &[10, 9], 19).unwrap();
		let header = get_bytes(&layout).unwrap();

		assert_eq!(header.len(), PALETTE_OFFSET);
		assert_eq!(&header[0..2], b"BM");
		assert_eq!(u32::from_le_bytes([header[2], header[3], header[4], header[5]]), layout.total_size);
		assert_eq!(u32::from_le_bytes([header[10], header[11], header[12], header[13]]), layout.stream_offset);
		assert_eq!(i32::from_le_bytes([header[18], header[19], header[20], header[21]]), 8);
		assert_eq!(u16::from_le_bytes([header[28], header[29]]), 8);
		assert_eq!(u32::from_le_bytes([header[30], header[31], header[32], header[33]]), RLE_COMPRESSION);
		assert_eq!(u32::from_le_bytes([header[34], header[35], header[36], header[37]]), 19);
	}

	#[test]
	fn extended_section_bytes() {
		let layout = ContainerLayout::plan(ContainerFormat::Extended, 8, 3, &[10, 9, 4], 23).unwrap();
		let section = get_section_bytes(&layout).unwrap();

		assert_eq!(
			section,
			vec![
				b'l', b'i', b'b', b'r', 8, 0, 0, 0, 3, 0, 0, 0, 0, 0, 0, 0,
				10, 0, 0, 0, 19, 0, 0, 0,
			]
		);
	}

	#[test]
	fn headers_read_back_for_both_variants() {
		for format in [ContainerFormat::Extended, ContainerFormat::Legacy] {
			let layout = ContainerLayout::plan(format, 300, 4, &[6, 6, 6, 6], 24).unwrap();
			let header = get_header(&container_prefix(&layout)).unwrap();

			assert_eq!(header.format, format);
			assert_eq!(header.width, 300);
			assert_eq!(header.height, 4);
			assert_eq!(header.total_size, layout.total_size);
			assert_eq!(header.stream_offset, layout.stream_offset);
			assert_eq!(header.table_entries(), layout.row_offsets.len());
		}
	}

	#[test]
	fn bad_signature_is_a_format_error() {
		let layout = ContainerLayout::plan(ContainerFormat::Legacy, 2, 2, &[3, 3], 6).unwrap();
		let mut data = container_prefix(&layout);
		data[0] = b'X';
		assert!(matches!(get_header(&data), Err(SpriteError::Format(_))));
	}

	#[test]
	fn unsupported_bit_depth_is_a_format_error() {
		let layout = ContainerLayout::plan(ContainerFormat::Extended, 2, 2, &[3, 3], 6).unwrap();
		let mut data = container_prefix(&layout);
		data[28] = 24;
		assert!(matches!(get_header(&data), Err(SpriteError::Format(_))));
	}

	#[test]
	fn short_header_is_a_bounds_error() {
		assert!(matches!(get_header(b"BM\x10\x00"), Err(SpriteError::Bounds(_))));
	}
}
