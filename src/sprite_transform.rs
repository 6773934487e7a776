use crate::shared_types::{DecodedSprite, PALETTE_ENTRIES, PALETTE_SIZE};


/// Grayscale palette for the mask raster: entry `i` is `(i, i, i, 0)`, so
/// role markers 0/128/255 classify back to transparent/absolute/literal.
pub fn role_palette() -> Vec<u8> {
	let mut palette: Vec<u8> = vec![0; PALETTE_SIZE];

	for index in 0..PALETTE_ENTRIES {
		palette[4 * index + 0] = index as u8;
		palette[4 * index + 1] = index as u8;
		palette[4 * index + 2] = index as u8;
	}

	palette
}


/// Looks every pixel up in the palette and stores its role marker as alpha.
pub fn indexed_as_bgra(sprite: &DecodedSprite, palette: &[u8]) -> Vec<u8> {
	let mut bgra: Vec<u8> = Vec::with_capacity(sprite.pixels.len() * 4);

	for (pixel, role) in sprite.pixels.iter().zip(&sprite.roles) {
		let entry: usize = *pixel as usize * 4;
		bgra.extend_from_slice(&palette[entry..entry + 3]);
		bgra.push(*role);
	}

	bgra
}
