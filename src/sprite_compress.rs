use std::cmp::min;

use log::debug;

use crate::{
	error::SpriteError,
	shared_types::{ClassTable, CompressedData, DecodedSprite, IndexedImage, MaskImage, PixelClass, TRANSPARENT_INDEX},
};

const TRANSPARENT_MARKER: u8 = 0xFF;
const ABSOLUTE_MARKER: u8 = 0xFE;


/// One encoded record. A record never spans two rows.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum RunRecord<'a> {
	/// `FF <count>`, no payload.
	Transparent(u8),
	/// `FE <count> <pixels>`
	Absolute(&'a [u8]),
	/// `<count> <pixels>`, the count byte doubles as the control byte.
	Literal(&'a [u8]),
}

impl<'a> RunRecord<'a> {
	pub fn write_to(&self, stream: &mut Vec<u8>) {
		match self {
			RunRecord::Transparent(count) => {
				stream.push(TRANSPARENT_MARKER);
				stream.push(*count);
			},

			RunRecord::Absolute(pixels) => {
				stream.push(ABSOLUTE_MARKER);
				stream.push(pixels.len() as u8);
				stream.extend_from_slice(pixels);
			},

			RunRecord::Literal(pixels) => {
				stream.push(pixels.len() as u8);
				stream.extend_from_slice(pixels);
			},
		}
	}
}


/// Splits one row into records. Without a mask row every pixel is literal.
pub fn row_records<'a>(row: &'a [u8], mask_row: Option<&[u8]>, classes: &ClassTable) -> Vec<RunRecord<'a>> {
	let class_at = |x: usize| -> PixelClass {
		match mask_row {
			Some(mask_pixels) => classes[mask_pixels[x] as usize],
			None => PixelClass::Literal,
		}
	};

	let width: usize = row.len();
	let mut records: Vec<RunRecord<'a>> = Vec::new();
	let mut x: usize = 0;

	while x < width {
		let class: PixelClass = class_at(x);

		// Grow the run while the class holds, never past the row end
		let mut run: usize = 1;
		while x + run < width && class_at(x + run) == class {
			run += 1;
		}

		let run_end: usize = x + run;
		while x < run_end {
			let chunk: usize = min(class.max_chunk(), run_end - x);
			let pixels: &'a [u8] = &row[x..x + chunk];

			records.push(match class {
				PixelClass::Transparent => RunRecord::Transparent(chunk as u8),
				PixelClass::Absolute => RunRecord::Absolute(pixels),
				PixelClass::Literal => RunRecord::Literal(pixels),
			});

			x += chunk;
		}
	}

	records
}


pub fn compress(image: &IndexedImage, mask: Option<&MaskImage>, classes: &ClassTable) -> Result<CompressedData, SpriteError> {
	if let Some(mask_image) = mask {
		if mask_image.width != image.width || mask_image.height != image.height {
			return Err(SpriteError::Format(format!(
				"mask is {}x{} but image is {}x{}",
				mask_image.width, mask_image.height, image.width, image.height
			)));
		}
	}

	let height: usize = image.height as usize;
	let mut stream: Vec<u8> = Vec::with_capacity(image.pixels.len() + 2 * height);
	let mut row_lengths: Vec<usize> = Vec::with_capacity(height);

	for y in 0..height {
		let row_start: usize = stream.len();
		let mask_row: Option<&[u8]> = mask.map(|mask_image| mask_image.row(y));

		for record in row_records(image.row(y), mask_row, classes) {
			record.write_to(&mut stream);
		}

		row_lengths.push(stream.len() - row_start);
	}

	debug!("Encoded {}x{} into {} bytes", image.width, image.height, stream.len());

	Ok(CompressedData {
		stream,
		row_lengths,
	})
}


/// Rebuilds pixels and roles from an encoded stream.
///
/// Stops at the end of `stream` or once the grid is full. A truncated tail is
/// not an error: whatever was reconstructed is returned, the rest stays zero.
/// A grid that cannot be allocated is a `Bounds` error.
pub fn decompress(stream: &[u8], width: u32, height: u32) -> Result<DecodedSprite, SpriteError> {
	let pixel_count: usize = (width as usize)
		.checked_mul(height as usize)
		.ok_or_else(|| SpriteError::Bounds(format!("{}x{} grid overflows", width, height)))?;

	let mut pixels: Vec<u8> = zeroed_grid(pixel_count)?;
	let mut roles: Vec<u8> = zeroed_grid(pixel_count)?;

	// Row-major cursor, y * width + x, so runs wrap onto the next row for free
	let mut position: usize = 0;
	let mut pointer: usize = 0;

	while pointer < stream.len() && position < pixel_count {
		let control: u8 = stream[pointer];
		pointer += 1;

		let class: PixelClass;
		let count: usize;

		match control {
			TRANSPARENT_MARKER | ABSOLUTE_MARKER => {
				let Some(&length) = stream.get(pointer) else {
					break;
				};
				pointer += 1;
				count = length as usize;

				if control == TRANSPARENT_MARKER {
					class = PixelClass::Transparent;
				} else {
					class = PixelClass::Absolute;
				}
			},

			length => {
				class = PixelClass::Literal;
				count = length as usize;
			},
		}

		let mut take: usize = min(count, pixel_count - position);

		if class == PixelClass::Transparent {
			pixels[position..position + take].fill(TRANSPARENT_INDEX);
		} else {
			take = min(take, stream.len() - pointer);
			pixels[position..position + take].copy_from_slice(&stream[pointer..pointer + take]);
			pointer += take;
		}

		roles[position..position + take].fill(class.role_marker());
		position += take;
	}

	if position < pixel_count {
		debug!("Stream ended after {} of {} pixels", position, pixel_count);
	}

	Ok(DecodedSprite {
		width,
		height,
		pixels,
		roles,
	})
}


fn zeroed_grid(pixel_count: usize) -> Result<Vec<u8>, SpriteError> {
	let mut grid: Vec<u8> = Vec::new();
	grid.try_reserve_exact(pixel_count)
		.map_err(|_| SpriteError::Bounds(format!("cannot allocate a {}-pixel grid", pixel_count)))?;
	grid.resize(pixel_count, 0u8);

	Ok(grid)
}
