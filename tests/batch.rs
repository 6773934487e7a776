use std::fs;
use std::path::{Path, PathBuf};

use sprite_rle::shared_types::{Operation, PALETTE_SIZE};
use sprite_rle::sprite_transform::role_palette;
use sprite_rle::*;

fn parameters(operation: Operation, root: &Path) -> Parameters {
	Parameters {
		operation,
		source_path: None,
		root_path: root.to_path_buf(),
		container_format: ContainerFormat::Extended,
		write_mask: true,
		rgba: false,
	}
}

fn write_sprite_folder(parent: &Path, name: &str, with_mask: bool) -> PathBuf {
	let folder = parent.join(format!("{}_RLE", name));
	fs::create_dir_all(&folder).unwrap();

	let mut palette: Vec<u8> = vec![0; PALETTE_SIZE];
	palette[4..8].copy_from_slice(&[10, 20, 30, 0]);
	let pixels: Vec<u8> = (0..40).map(|index| (index % 6) as u8).collect();
	let bmp = sprite_make::get_indexed_bmp_bytes(8, 5, &palette, &pixels).unwrap();
	fs::write(folder.join(format!("{}.bmp", name)), bmp).unwrap();

	if with_mask {
		let roles: Vec<u8> = (0..40).map(|index| [0u8, 128, 255][index % 3]).collect();
		let mask = sprite_make::get_indexed_bmp_bytes(8, 5, &role_palette(), &roles).unwrap();
		fs::write(folder.join(format!("{}.mask.bmp", name)), mask).unwrap();
	}

	folder
}

#[test]
fn pack_writes_container_and_removes_folder() {
	let root = tempfile::tempdir().unwrap();
	let folder = write_sprite_folder(root.path(), "SOLDIER", true);

	let output = sprite_process::pack_folder(&folder, ContainerFormat::Extended).unwrap();

	assert_eq!(output, root.path().join("SOLDIER.RLE"));
	assert!(!folder.exists());
	let data = fs::read(&output).unwrap();
	let container = sprite_get::get_rle(&data).unwrap();
	assert_eq!((container.width(), container.height()), (8, 5));
	assert_eq!(container.row_offsets.len(), 4);
}

#[test]
fn unpack_then_pack_reproduces_container() {
	let root = tempfile::tempdir().unwrap();
	let folder = write_sprite_folder(root.path(), "TANK", true);
	let container_path = sprite_process::pack_folder(&folder, ContainerFormat::Extended).unwrap();
	let original = fs::read(&container_path).unwrap();

	let unpacked = sprite_process::unpack_file(&container_path, &parameters(Operation::Unpack, root.path())).unwrap();
	assert_eq!(unpacked, root.path().join("TANK_RLE"));
	assert!(!container_path.exists());
	assert!(unpacked.join("TANK.bmp").is_file());
	assert!(unpacked.join("TANK.mask.bmp").is_file());

	let repacked = sprite_process::pack_folder(&unpacked, ContainerFormat::Extended).unwrap();
	assert_eq!(fs::read(repacked).unwrap(), original);
}

#[test]
fn unpack_rgba_writes_single_image() {
	let root = tempfile::tempdir().unwrap();
	let folder = write_sprite_folder(root.path(), "PLANE", true);
	let container_path = sprite_process::pack_folder(&folder, ContainerFormat::Legacy).unwrap();

	let mut options = parameters(Operation::Unpack, root.path());
	options.rgba = true;
	let unpacked = sprite_process::unpack_file(&container_path, &options).unwrap();

	let rgba = fs::read(unpacked.join("PLANE.rgba.bmp")).unwrap();
	assert!(!unpacked.join("PLANE.bmp").exists());
	assert_eq!(rgba.len(), 54 + 8 * 5 * 4);
	assert_eq!(u16::from_le_bytes([rgba[28], rgba[29]]), 32);
}

#[test]
fn unpack_without_mask() {
	let root = tempfile::tempdir().unwrap();
	let folder = write_sprite_folder(root.path(), "JEEP", false);
	let container_path = sprite_process::pack_folder(&folder, ContainerFormat::Extended).unwrap();

	let mut options = parameters(Operation::Unpack, root.path());
	options.write_mask = false;
	let unpacked = sprite_process::unpack_file(&container_path, &options).unwrap();

	assert!(unpacked.join("JEEP.bmp").is_file());
	assert!(!unpacked.join("JEEP.mask.bmp").exists());
}

#[test]
fn pack_without_bmp_is_an_io_error() {
	let root = tempfile::tempdir().unwrap();
	let folder = root.path().join("EMPTY_RLE");
	fs::create_dir_all(&folder).unwrap();

	let result = sprite_process::pack_folder(&folder, ContainerFormat::Extended);
	assert!(matches!(result, Err(SpriteError::Io { .. })));
	assert!(folder.exists());
}

#[test]
fn batch_skips_broken_files_and_continues() {
	let root = tempfile::tempdir().unwrap();
	let nested = root.path().join("units");
	write_sprite_folder(&nested, "A", true);
	write_sprite_folder(&nested, "B", false);
	let broken = root.path().join("BROKEN_RLE");
	fs::create_dir_all(&broken).unwrap();
	fs::write(broken.join("BROKEN.bmp"), b"not a bitmap").unwrap();

	let summary = sprite_process::process_directory(&parameters(Operation::Pack, root.path())).unwrap();
	assert_eq!(summary.succeeded, 2);
	assert_eq!(summary.failed, 1);
	assert!(nested.join("A.RLE").is_file());
	assert!(nested.join("B.RLE").is_file());
	assert!(broken.exists());

	fs::write(nested.join("JUNK.rle"), b"BM").unwrap();
	let summary = sprite_process::process_directory(&parameters(Operation::Unpack, root.path())).unwrap();
	assert_eq!(summary.succeeded, 2);
	assert_eq!(summary.failed, 1);
	assert!(nested.join("A_RLE").join("A.bmp").is_file());
	assert!(nested.join("JUNK.rle").exists());
}

#[test]
fn batch_on_empty_root_finds_nothing() {
	let root = tempfile::tempdir().unwrap();
	let summary = sprite_process::process_directory(&parameters(Operation::Unpack, root.path())).unwrap();
	assert_eq!(summary, shared_types::BatchSummary::default());
}

#[test]
fn batch_survives_oversized_geometry() {
	let root = tempfile::tempdir().unwrap();
	let image = IndexedImage { width: 4, height: 2, palette: vec![0; PALETTE_SIZE], pixels: vec![5; 8] };

	let mut bad = sprite_make::get_rle_bytes(&image, None, ContainerFormat::Legacy).unwrap();
	bad[18..21].copy_from_slice(&[0xFF, 0xFF, 0xFF]);
	bad[22..25].copy_from_slice(&[0xFF, 0xFF, 0xFF]);
	fs::write(root.path().join("A_BAD.rle"), bad).unwrap();

	let good = sprite_make::get_rle_bytes(&image, None, ContainerFormat::Legacy).unwrap();
	fs::write(root.path().join("B_GOOD.rle"), good).unwrap();

	let summary = sprite_process::process_directory(&parameters(Operation::Unpack, root.path())).unwrap();
	assert_eq!(summary.succeeded, 1);
	assert_eq!(summary.failed, 1);
	assert!(root.path().join("A_BAD.rle").exists());
	assert!(root.path().join("B_GOOD_RLE").join("B_GOOD.bmp").is_file());
}
