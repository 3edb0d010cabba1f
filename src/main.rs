#![allow(missing_docs)]

use std::path::PathBuf;

use clap::Parser;
use onedoc::one::OneFile;

mod cmd;

#[derive(Parser)]
#[command(name = "onedoc", about = "OneNote .one / .onetoc2 inspection and extraction tools")]
struct Cli {
	/// File to analyze.
	#[arg(short = 'f', long = "file")]
	file: PathBuf,
	/// Directory extracted files are written to.
	#[arg(short = 'o', long = "output-dir", default_value = ".")]
	output_dir: PathBuf,
	/// Extension appended to every extracted filename.
	#[arg(short = 'e', long = "extension", default_value = "")]
	extension: String,
	/// Emit the JSON report; written to PATH, or stdout when no PATH is given.
	#[arg(short = 'j', long = "json", value_name = "PATH", num_args = 0..=1, default_missing_value = "-")]
	json: Option<PathBuf>,
	/// Comma list of report sections (headers, properties, links, files).
	#[arg(long = "json-include", value_delimiter = ',')]
	json_include: Vec<String>,
	/// Replace file content bytes with their SHA-256 digest.
	#[arg(long = "json-files-no-content")]
	json_files_no_content: bool,
	/// Log verbosity.
	#[arg(long = "log-level", default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
	log_level: String,
}

fn main() {
	let cli = Cli::parse();

	let level = match cli.log_level.as_str() {
		"error" => log::LevelFilter::Error,
		"warn" => log::LevelFilter::Warn,
		"debug" => log::LevelFilter::Debug,
		"trace" => log::LevelFilter::Trace,
		_ => log::LevelFilter::Info,
	};
	env_logger::Builder::new().filter_level(level).init();

	if let Err(err) = run(cli) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run(cli: Cli) -> onedoc::one::Result<()> {
	let file = OneFile::open(&cli.file)?;
	let document = file.parse()?;

	for diagnostic in &document.diagnostics {
		log::warn!("offset {}: {}", diagnostic.offset, diagnostic.message);
	}

	match cli.json {
		Some(path) => {
			let sections = cmd::report::parse_sections(&cli.json_include)?;
			let options = cmd::report::ReportOptions {
				sections,
				files_no_content: cli.json_files_no_content,
			};
			let report = cmd::report::build(file.header(), &document, &options);
			let target = if path.as_os_str() == "-" { None } else { Some(path.as_path()) };
			cmd::report::emit(&report, target)
		}
		None => {
			cmd::report::print_text(file.header(), &document);
			cmd::extract::run(&document, &cli.output_dir, &cli.extension)
		}
	}
}
