use std::fs;
use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
	error::SpriteError,
	shared_types::{ContainerFormat, Operation, Parameters},
};


/// Converts engine RLE sprites to and from editable 8-bit BMP + mask pairs.
#[derive(Debug, Parser)]
#[command(name = "sprite_rle", version, about)]
pub struct Args {
	#[command(subcommand)]
	pub command: Command,

	/// Folder scanned recursively when no path is given
	#[arg(long, global = true, default_value = "output")]
	pub root: PathBuf,

	/// Log per-section details
	#[arg(short, long, global = true)]
	pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Pack `<NAME>_RLE` folders (BMP + optional mask) into `<NAME>.RLE`
	Pack {
		/// A single `<NAME>_RLE` folder
		path: Option<PathBuf>,

		/// Container framing to write
		#[arg(long, value_enum, default_value_t = FormatArg::Extended)]
		format: FormatArg,
	},

	/// Unpack `.rle` files into `<NAME>_RLE` folders
	Unpack {
		/// A single `.rle` file
		path: Option<PathBuf>,

		/// Do not write `<NAME>.mask.bmp`
		#[arg(long)]
		no_mask: bool,

		/// Write one 32-bit `<NAME>.rgba.bmp` instead of the indexed pair
		#[arg(long)]
		rgba: bool,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
	/// "libr" block and row-offset table
	Extended,
	/// No row-offset table
	Legacy,
}

impl FormatArg {
	pub fn to_container_format(self) -> ContainerFormat {
		match self {
			FormatArg::Extended => ContainerFormat::Extended,
			FormatArg::Legacy => ContainerFormat::Legacy,
		}
	}
}


pub fn validate(args: Args) -> Result<Parameters, SpriteError> {
	let (operation, source_path, container_format, write_mask, rgba) = match args.command {
		Command::Pack { path, format } => (Operation::Pack, path, format.to_container_format(), false, false),
		Command::Unpack { path, no_mask, rgba } => (Operation::Unpack, path, ContainerFormat::default(), !no_mask, rgba),
	};

	if let Some(path) = &source_path {
		match path.try_exists() {
			Ok(true) => (),
			Ok(false) => return Err(SpriteError::io(path, io::Error::from(io::ErrorKind::NotFound))),
			Err(error) => return Err(SpriteError::io(path, error)),
		}
	}

	// Batch mode works inside the root, make sure it is there
	else {
		fs::create_dir_all(&args.root).map_err(|error| SpriteError::io(&args.root, error))?;
	}

	Ok(Parameters {
		operation,
		source_path,
		root_path: args.root,
		container_format,
		write_mask,
		rgba,
	})
}
