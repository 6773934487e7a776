use std::fs;
use std::path::Path;

use bitstream_io::{ByteWrite, ByteWriter, LittleEndian};
use log::debug;

use crate::{
	bmp_rows,
	error::SpriteError,
	mask_classifier,
	rle_header::{self, ContainerLayout},
	shared_types::{ClassTable, CompressedData, ContainerFormat, IndexedImage, MaskImage, PALETTE_SIZE},
	sprite_compress,
};

const BMP_HEADERS_SIZE: u32 = 14 + 40;


pub fn write_target(target_path: &Path, bytes: &[u8]) -> Result<(), SpriteError> {
	fs::write(target_path, bytes).map_err(|error| SpriteError::io(target_path, error))
}


/// BITMAPFILEHEADER + BITMAPINFOHEADER for an uncompressed, bottom-up bitmap.
fn bmp_header(width: u32, height: u32, bit_count: u16, color_count: u32, pixel_bytes: usize) -> Result<Vec<u8>, SpriteError> {
	let signed_width: i32 = i32::try_from(width)
		.map_err(|_| SpriteError::Format(format!("BMP width {} exceeds 31 bits", width)))?;
	let signed_height: i32 = i32::try_from(height)
		.map_err(|_| SpriteError::Format(format!("BMP height {} exceeds 31 bits", height)))?;

	let pixel_offset: u32 = BMP_HEADERS_SIZE + color_count * 4;
	let pixel_bytes: u32 = u32::try_from(pixel_bytes)
		.map_err(|_| SpriteError::Format(format!("pixel array of {} bytes exceeds 4 GiB", pixel_bytes)))?;
	let file_size: u32 = pixel_offset
		.checked_add(pixel_bytes)
		.ok_or_else(|| SpriteError::Format("BMP exceeds 4 GiB".to_string()))?;

	let mut header: Vec<u8> = Vec::with_capacity(BMP_HEADERS_SIZE as usize);
	let mut writer = ByteWriter::endian(&mut header, LittleEndian);

	// BITMAPFILEHEADER
	writer.write_bytes(b"BM")?;
	writer.write::<u32>(file_size)?;
	writer.write::<u16>(0)?;
	writer.write::<u16>(0)?;
	writer.write::<u32>(pixel_offset)?;

	// BITMAPINFOHEADER
	writer.write::<u32>(40)?;
	writer.write::<i32>(signed_width)?;
	writer.write::<i32>(signed_height)?;
	writer.write::<u16>(1)?;
	writer.write::<u16>(bit_count)?;
	writer.write::<u32>(0)?;
	writer.write::<u32>(pixel_bytes)?;
	writer.write::<i32>(0)?;
	writer.write::<i32>(0)?;
	writer.write::<u32>(color_count)?;
	writer.write::<u32>(0)?;

	Ok(header)
}


/// 8 bpp indexed bitmap. Palettes shorter than 256 entries are zero-padded.
pub fn get_indexed_bmp_bytes(width: u32, height: u32, palette: &[u8], pixels: &[u8]) -> Result<Vec<u8>, SpriteError> {
	if palette.len() > PALETTE_SIZE {
		return Err(SpriteError::Format(format!("palette of {} bytes exceeds {}", palette.len(), PALETTE_SIZE)));
	}

	check_pixel_count(width, height, 1, pixels)?;

	let pixel_array: Vec<u8> = bmp_rows::pack_rows(pixels, width as usize, height as usize, 1);
	let mut bmp_data: Vec<u8> = bmp_header(width, height, 8, 256, pixel_array.len())?;

	bmp_data.extend_from_slice(palette);
	bmp_data.resize(bmp_data.len() + PALETTE_SIZE - palette.len(), 0u8);
	bmp_data.extend(pixel_array);

	Ok(bmp_data)
}


/// 32 bpp bitmap from top-down BGRA pixels.
pub fn get_bgra_bmp_bytes(width: u32, height: u32, bgra: &[u8]) -> Result<Vec<u8>, SpriteError> {
	check_pixel_count(width, height, 4, bgra)?;

	let pixel_array: Vec<u8> = bmp_rows::pack_rows(bgra, width as usize, height as usize, 4);
	let mut bmp_data: Vec<u8> = bmp_header(width, height, 32, 0, pixel_array.len())?;
	bmp_data.extend(pixel_array);

	Ok(bmp_data)
}


fn check_pixel_count(width: u32, height: u32, bytes_per_pixel: usize, pixels: &[u8]) -> Result<(), SpriteError> {
	let expected: usize = width as usize * height as usize * bytes_per_pixel;

	if pixels.len() != expected {
		return Err(SpriteError::Format(format!(
			"{} pixel bytes for a {}x{} image, expected {}",
			pixels.len(), width, height, expected
		)));
	}

	Ok(())
}


/// Lays out and serializes a container around an already encoded stream.
pub fn assemble_container(
	format: ContainerFormat,
	width: u32,
	height: u32,
	palette: &[u8],
	compressed: &CompressedData,
) -> Result<Vec<u8>, SpriteError> {
	if palette.len() != PALETTE_SIZE {
		return Err(SpriteError::Format(format!(
			"palette must be {} bytes, got {}",
			PALETTE_SIZE, palette.len()
		)));
	}

	// Pass one: every offset and size
	let layout: ContainerLayout = ContainerLayout::plan(
		format,
		width,
		height,
		&compressed.row_lengths,
		compressed.stream.len(),
	)?;

	// Pass two: write straight from the layout
	let mut container: Vec<u8> = Vec::with_capacity(layout.total_size as usize);
	container.extend(rle_header::get_bytes(&layout)?);
	container.extend_from_slice(palette);
	container.extend(rle_header::get_section_bytes(&layout)?);
	container.extend_from_slice(&compressed.stream);

	debug!(
		"{:?} container: stream at {}, {} bytes total",
		format, layout.stream_offset, container.len()
	);

	Ok(container)
}


/// Encodes an image (and optional mask) into container bytes.
pub fn get_rle_bytes(image: &IndexedImage, mask: Option<&MaskImage>, format: ContainerFormat) -> Result<Vec<u8>, SpriteError> {
	let classes: ClassTable = match mask {
		Some(mask_image) => mask_classifier::classify(mask_image),
		None => mask_classifier::unmasked(),
	};

	let compressed: CompressedData = sprite_compress::compress(image, mask, &classes)?;
	assemble_container(format, image.width, image.height, &image.palette, &compressed)
}


#[cfg(test)]
mod tests {
	use super::*;

	fn sample_image() -> IndexedImage {
		let mut palette: Vec<u8> = vec![0; PALETTE_SIZE];
		palette[4..8].copy_from_slice(&[10, 20, 30, 0]);
		IndexedImage { width: 8, height: 2, palette, pixels: [vec![5; 8], vec![9; 8]].concat() }
	}

	#[test]
	fn container_embeds_palette_and_stream() {
		let image = sample_image();
		let data = get_rle_bytes(&image, None, ContainerFormat::Extended).unwrap();

		let stream_offset: usize = rle_header::EXTENDED_FIXED_SIZE + 4;
		assert_eq!(data.len(), stream_offset + 18);
		assert_eq!(&data[54..54 + PALETTE_SIZE], &image.palette[..]);
		assert_eq!(&data[rle_header::TAG_OFFSET..rle_header::TAG_OFFSET + 4], b"libr");
		// Row table: end of row 0
		assert_eq!(&data[rle_header::EXTENDED_FIXED_SIZE..stream_offset], &[9, 0, 0, 0]);
		assert_eq!(&data[stream_offset..stream_offset + 2], &[8, 5]);
	}

	#[test]
	fn legacy_container_skips_table() {
		let image = sample_image();
		let data = get_rle_bytes(&image, None, ContainerFormat::Legacy).unwrap();

		assert_eq!(data.len(), rle_header::LEGACY_FIXED_SIZE + 18);
		assert!(data[rle_header::TAG_OFFSET..rle_header::LEGACY_FIXED_SIZE].iter().all(|byte| *byte == 0));
	}

	#[test]
	fn wrong_palette_size_is_rejected() {
		let compressed = CompressedData { stream: vec![1, 0], row_lengths: vec![2] };
		let result = assemble_container(ContainerFormat::Extended, 1, 1, &[0; 768], &compressed);
		assert!(matches!(result, Err(SpriteError::Format(_))));
	}

	#[test]
	fn oversized_bmp_is_a_format_error() {
		assert!(matches!(bmp_header(1, 1, 8, 256, u32::MAX as usize), Err(SpriteError::Format(_))));
		assert!(matches!(bmp_header(u32::MAX, 1, 8, 256, 4), Err(SpriteError::Format(_))));
	}

	#[test]
	fn indexed_bmp_layout() {
		let bytes = get_indexed_bmp_bytes(3, 2, &[1, 2, 3, 0], &[1, 2, 3, 4, 5, 6]).unwrap();

		assert_eq!(bytes.len(), 54 + PALETTE_SIZE + 8);
		assert_eq!(u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]), 54 + 1024);
		assert_eq!(u32::from_le_bytes([bytes[46], bytes[47], bytes[48], bytes[49]]), 256);
		assert_eq!(&bytes[54..58], &[1, 2, 3, 0]);
		// Bottom row first
		assert_eq!(&bytes[54 + PALETTE_SIZE..], &[4, 5, 6, 0, 1, 2, 3, 0]);
	}

	#[test]
	fn bgra_bmp_has_no_palette() {
		let bytes = get_bgra_bmp_bytes(1, 2, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

		assert_eq!(bytes.len(), 54 + 8);
		assert_eq!(u16::from_le_bytes([bytes[28], bytes[29]]), 32);
		assert_eq!(&bytes[54..], &[5, 6, 7, 8, 1, 2, 3, 4]);
	}
}
