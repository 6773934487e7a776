use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use sprite_rle::{
	param_validator::{self, Args},
	shared_types::Parameters,
	sprite_process,
};


pub fn main() -> ExitCode {
	let args: Args = Args::parse();
	sprite_rle::init_logging(args.verbose);

	let parameters: Parameters = match param_validator::validate(args) {
		Ok(parameters) => parameters,
		Err(e) => {
			error!("Error: {}", e);
			return ExitCode::FAILURE;
		},
	};

	info!("Working...");
	let instant = Instant::now();

	match &parameters.source_path {
		Some(source_path) => match sprite_process::process_file(&parameters, source_path) {
			Ok(output) => {
				info!("Converted: {} -> {}", source_path.display(), output.display());
				info!("Processed 1 sprite in {}ms.", instant.elapsed().as_millis());
			},

			Err(e) => {
				error!("Error: {}", e);
				return ExitCode::FAILURE;
			},
		},

		None => match sprite_process::process_directory(&parameters) {
			Ok(summary) => {
				info!(
					"Processed {} sprite(s), {} failed, in {}ms.",
					summary.succeeded,
					summary.failed,
					instant.elapsed().as_millis()
				);
			},

			Err(e) => {
				error!("Error: {}", e);
				return ExitCode::FAILURE;
			},
		},
	}

	ExitCode::SUCCESS
}
