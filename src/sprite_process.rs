use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::{
	error::SpriteError,
	shared_types::{BatchSummary, ContainerFormat, DecodedSprite, IndexedImage, MaskImage, Operation, Parameters},
	sprite_get::{self, RleContainer},
	sprite_make,
	sprite_transform,
};

const FOLDER_SUFFIX: &str = "_RLE";


/// `NAME_RLE` -> `NAME`; other names pass through.
fn strip_folder_suffix(name: &str) -> &str {
	let split: usize = name.len().saturating_sub(FOLDER_SUFFIX.len());

	match (name.get(..split), name.get(split..)) {
		(Some(base), Some(suffix)) if !base.is_empty() && suffix.eq_ignore_ascii_case(FOLDER_SUFFIX) => base,
		_ => name,
	}
}


fn file_name_of(path: &Path) -> Result<String, SpriteError> {
	match path.file_name() {
		Some(name) => Ok(name.to_string_lossy().into_owned()),
		None => Err(SpriteError::Format(format!("'{}' has no file name", path.display()))),
	}
}


/// Packs `<NAME>_RLE/<NAME>.bmp` (+ optional `<NAME>.mask.bmp`) into
/// `<NAME>.RLE` next to the folder, then removes the folder.
pub fn pack_folder(folder: &Path, format: ContainerFormat) -> Result<PathBuf, SpriteError> {
	let folder_name: String = file_name_of(folder)?;
	let base_name: &str = strip_folder_suffix(&folder_name);
	let parent: &Path = folder.parent().unwrap_or(Path::new("."));

	let bmp_path: PathBuf = folder.join(format!("{}.bmp", base_name));
	let mask_path: PathBuf = folder.join(format!("{}.mask.bmp", base_name));

	let image: IndexedImage = sprite_get::get_bmp(sprite_get::read_source(&bmp_path)?)?;

	let mask: Option<MaskImage> = if mask_path.is_file() {
		Some(sprite_get::get_mask(sprite_get::read_source(&mask_path)?, image.width, image.height)?)
	} else {
		None
	};

	let container: Vec<u8> = sprite_make::get_rle_bytes(&image, mask.as_ref(), format)?;

	let target_path: PathBuf = parent.join(format!("{}.RLE", base_name));
	sprite_make::write_target(&target_path, &container)?;

	fs::remove_dir_all(folder).map_err(|error| SpriteError::io(folder, error))?;

	Ok(target_path)
}


/// Unpacks `<NAME>.rle` into the folder `<NAME>_RLE` beside it, then removes
/// the source file.
pub fn unpack_file(source_file: &Path, parameters: &Parameters) -> Result<PathBuf, SpriteError> {
	let data: Vec<u8> = sprite_get::read_source(source_file)?;
	let container: RleContainer = sprite_get::get_rle(&data)?;
	let sprite: DecodedSprite = container.decode()?;

	let name: String = match source_file.file_stem() {
		Some(stem) => stem.to_string_lossy().into_owned(),
		None => return Err(SpriteError::Format(format!("'{}' has no file name", source_file.display()))),
	};

	let parent: &Path = source_file.parent().unwrap_or(Path::new("."));
	let target_folder: PathBuf = parent.join(format!("{}{}", name, FOLDER_SUFFIX));
	fs::create_dir_all(&target_folder).map_err(|error| SpriteError::io(&target_folder, error))?;

	if parameters.rgba {
		let bgra: Vec<u8> = sprite_transform::indexed_as_bgra(&sprite, container.palette);
		let bytes: Vec<u8> = sprite_make::get_bgra_bmp_bytes(sprite.width, sprite.height, &bgra)?;
		sprite_make::write_target(&target_folder.join(format!("{}.rgba.bmp", name)), &bytes)?;
	}

	else {
		let bytes: Vec<u8> = sprite_make::get_indexed_bmp_bytes(sprite.width, sprite.height, container.palette, &sprite.pixels)?;
		sprite_make::write_target(&target_folder.join(format!("{}.bmp", name)), &bytes)?;

		if parameters.write_mask {
			let mask_bytes: Vec<u8> = sprite_make::get_indexed_bmp_bytes(
				sprite.width,
				sprite.height,
				&sprite_transform::role_palette(),
				&sprite.roles,
			)?;
			sprite_make::write_target(&target_folder.join(format!("{}.mask.bmp", name)), &mask_bytes)?;
		}
	}

	fs::remove_file(source_file).map_err(|error| SpriteError::io(source_file, error))?;

	Ok(target_folder)
}


pub fn process_file(parameters: &Parameters, source_path: &Path) -> Result<PathBuf, SpriteError> {
	match parameters.operation {
		Operation::Pack => pack_folder(source_path, parameters.container_format),
		Operation::Unpack => unpack_file(source_path, parameters),
	}
}


fn sorted_entries(directory: &Path) -> Result<Vec<PathBuf>, SpriteError> {
	let mut entries: Vec<PathBuf> = Vec::new();

	for item in fs::read_dir(directory).map_err(|error| SpriteError::io(directory, error))? {
		let item = item.map_err(|error| SpriteError::io(directory, error))?;
		entries.push(item.path());
	}

	entries.sort();
	Ok(entries)
}


/// Every folder under `root` whose name ends in `_RLE`, at any depth.
pub fn find_pack_folders(root: &Path) -> Result<Vec<PathBuf>, SpriteError> {
	let mut folders: Vec<PathBuf> = Vec::new();

	for path in sorted_entries(root)? {
		if !path.is_dir() {
			continue;
		}

		let name: String = file_name_of(&path)?;
		if strip_folder_suffix(&name).len() != name.len() {
			folders.push(path.clone());
		}

		folders.extend(find_pack_folders(&path)?);
	}

	Ok(folders)
}


/// Every `.rle` file under `root`, extension matched in any case.
pub fn find_rle_files(root: &Path) -> Result<Vec<PathBuf>, SpriteError> {
	let mut files: Vec<PathBuf> = Vec::new();

	for path in sorted_entries(root)? {
		if path.is_dir() {
			files.extend(find_rle_files(&path)?);
		}

		else if path.is_file() && type_matches(&path) {
			files.push(path);
		}
	}

	Ok(files)
}


fn type_matches(path: &Path) -> bool {
	match path.extension() {
		Some(extension) => extension.eq_ignore_ascii_case("rle"),
		None => false,
	}
}


/// Scans the root, then handles every candidate in turn. A failing file is
/// logged and skipped.
pub fn process_directory(parameters: &Parameters) -> Result<BatchSummary, SpriteError> {
	let root: &Path = &parameters.root_path;
	fs::create_dir_all(root).map_err(|error| SpriteError::io(root, error))?;

	// Collect everything first, outputs land in the scanned tree
	let candidates: Vec<PathBuf> = match parameters.operation {
		Operation::Pack => find_pack_folders(root)?,
		Operation::Unpack => find_rle_files(root)?,
	};

	let mut summary: BatchSummary = BatchSummary::default();

	if candidates.is_empty() {
		match parameters.operation {
			Operation::Pack => info!("No folders ending with \"{}\" found under: {}", FOLDER_SUFFIX, root.display()),
			Operation::Unpack => info!("No .rle files found under: {}", root.display()),
		}
		return Ok(summary);
	}

	info!("Found {} candidate(s) under {}", candidates.len(), root.display());

	for candidate in &candidates {
		match process_file(parameters, candidate) {
			Ok(output) => {
				info!("OK: {} -> {}", candidate.display(), output.display());
				summary.succeeded += 1;
			},

			Err(error) => {
				error!("FAIL: {} - {}", candidate.display(), error);
				summary.failed += 1;
			},
		}
	}

	Ok(summary)
}
