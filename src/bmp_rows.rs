use crate::error::SpriteError;


/// Bytes per stored row, padded to a 4-byte boundary.
pub fn row_stride(width: usize, bits_per_pixel: usize) -> usize {
	// Cheers Wikipedia
	((bits_per_pixel * width + 31) / 32) * 4
}


/// On-disk pixel array -> logical top-down rows without padding.
///
/// `bottom_up` is true when the file's height field is positive.
pub fn unpack_rows(
	pixel_array: &[u8],
	width: usize,
	height: usize,
	bytes_per_pixel: usize,
	bottom_up: bool,
) -> Result<Vec<u8>, SpriteError> {
	let byte_width: usize = width * bytes_per_pixel;
	let stride: usize = row_stride(width, bytes_per_pixel * 8);
	let needed: usize = stride * height;

	if pixel_array.len() < needed {
		return Err(SpriteError::Bounds(format!(
			"pixel array holds {} bytes, {}x{} needs {}",
			pixel_array.len(), width, height, needed
		)));
	}

	let mut pixels: Vec<u8> = Vec::with_capacity(byte_width * height);

	for y in 0..height {
		let stored_row: usize = if bottom_up { height - 1 - y } else { y };
		let start: usize = stored_row * stride;
		pixels.extend_from_slice(&pixel_array[start..start + byte_width]);
	}

	Ok(pixels)
}


/// Logical top-down rows -> bottom-up, padded pixel array.
pub fn pack_rows(pixels: &[u8], width: usize, height: usize, bytes_per_pixel: usize) -> Vec<u8> {
	let byte_width: usize = width * bytes_per_pixel;
	let stride: usize = row_stride(width, bytes_per_pixel * 8);
	let padding: usize = stride - byte_width;

	let mut pixel_array: Vec<u8> = Vec::with_capacity(stride * height);

	// Upside-down write with padding
	for y in (0..height).rev() {
		let row_start: usize = y * byte_width;
		pixel_array.extend_from_slice(&pixels[row_start..row_start + byte_width]);
		pixel_array.resize(pixel_array.len() + padding, 0u8);
	}

	pixel_array
}
