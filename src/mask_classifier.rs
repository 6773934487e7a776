use log::{debug, warn};

use crate::shared_types::{ClassTable, MaskImage, PixelClass, PALETTE_ENTRIES};


/// Palette entry colour -> class: black is transparent, white is literal,
/// anything else is absolute.
pub fn classify(mask: &MaskImage) -> ClassTable {
	let mut classes: ClassTable = [PixelClass::Absolute; PALETTE_ENTRIES];

	for (index, class) in classes.iter_mut().enumerate() {
		let entry: &[u8] = &mask.palette[4 * index..4 * index + 4];
		let (blue, green, red) = (entry[0], entry[1], entry[2]);

		*class = match (red, green, blue) {
			(0, 0, 0) => PixelClass::Transparent,
			(255, 255, 255) => PixelClass::Literal,
			_ => PixelClass::Absolute,
		};
	}

	let literal_count: usize = classes.iter().filter(|class| **class == PixelClass::Literal).count();
	if literal_count == 0 {
		warn!("Mask palette has no white entry, no pixel will be encoded as literal");
	}
	debug!("Mask classes: {} literal of {}", literal_count, PALETTE_ENTRIES);

	classes
}


/// Class table used when no mask accompanies the image.
pub fn unmasked() -> ClassTable {
	[PixelClass::Literal; PALETTE_ENTRIES]
}
