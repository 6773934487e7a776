//! Converts legacy engine sprites between an editable 8-bit BMP (plus an
//! optional role mask) and the engine's run-length encoded `.RLE` container.
//!
//! Pack: BMP + mask -> `mask_classifier` -> `sprite_compress` -> `sprite_make`.
//! Unpack: `.RLE` -> `sprite_get` -> `sprite_compress` -> BMP (+ mask or RGBA).

pub mod bmp_rows;
pub mod error;
pub mod mask_classifier;
pub mod param_validator;
pub mod rle_header;
pub mod shared_types;
pub mod sprite_compress;
pub mod sprite_get;
pub mod sprite_make;
pub mod sprite_process;
pub mod sprite_transform;

use std::io::Write;

use log::LevelFilter;

pub use crate::error::SpriteError;
pub use crate::shared_types::{ContainerFormat, DecodedSprite, IndexedImage, MaskImage, Parameters, PixelClass};
pub use crate::sprite_compress::{compress, decompress};


/// Logs to stderr, `Info` by default, `Debug` when verbose. `RUST_LOG`
/// overrides both.
pub fn init_logging(verbose: bool) {
	let level: LevelFilter = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

	env_logger::Builder::new()
		.filter(Some("sprite_rle"), level)
		.parse_default_env()
		.format(|buf, record| {
			writeln!(
				buf,
				"[{} {}:{}] {}",
				record.level(),
				record.file().unwrap_or("unknown"),
				record.line().unwrap_or(0),
				record.args()
			)
		})
		.init();
}
