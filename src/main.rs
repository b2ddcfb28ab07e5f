use anyhow::Context;
use clap::Parser;
use pencil_text::{
    Cli, Command, OutputFormatter, OutputMode, PencilText, PencilTextError, UserFriendlyError,
};
use std::path::PathBuf;
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(cli.verbosity_level(), cli.quiet);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let pencil = match PencilText::from_cli(&cli) {
        Ok(pencil) => pencil,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let formatter = pencil.output_formatter();
    let outcome = match cli.command {
        Some(Command::Extract { ref archive, ref out }) => pencil
            .extract(archive, out)
            .map(|report| formatter.print_extraction_report(&report)),
        Some(Command::Translate { ref csv, ref out }) => pencil
            .translate(csv, out)
            .map(|report| formatter.print_translation_report(&report)),
        Some(Command::Replace {
            ref archive,
            ref csv,
            ref out,
        }) => pencil
            .replace(archive, csv, out)
            .map(|report| formatter.print_replace_report(&report)),
        None => pencil
            .run_auto()
            .map(|report| formatter.print_auto_report(&report)),
    };

    match outcome {
        Ok(()) => 0,
        Err(e) => {
            log::debug!("Command failed: {:?}", e);
            pencil.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &PencilTextError) -> i32 {
    match error {
        PencilTextError::Cancelled => 130, // Interrupted (SIGINT)
        PencilTextError::Config { .. } => 2,
        PencilTextError::UnrecognizedFormat { .. } => 3,
        PencilTextError::PathTraversal { .. } => 4,
        PencilTextError::MissingFile { .. }
        | PencilTextError::InvalidHeader { .. }
        | PencilTextError::EmptySubstitutionSet { .. } => 5,
        PencilTextError::ArchiveNotFound { .. } | PencilTextError::AmbiguousArchive { .. } => 6,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("pencil-text.toml"));

    match write_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path.display());
            println!("\nTo use this configuration:");
            println!("  pencil-text --config {} extract <file.epgz>", config_path.display());
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {:#}", e);
            1
        }
    }
}

fn write_sample_config(path: &std::path::Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists; remove it first", path.display());
    }
    PencilText::generate_sample_config(path)
        .with_context(|| format!("writing {}", path.display()))
}

fn print_startup_error(error: &PencilTextError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
    if error.suggestion().is_none() {
        log::debug!("Startup failed: {:?}", error);
    }
}

fn setup_logging(verbosity: u8, quiet: bool) {
    let default_filter = match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "pencil_text=info",
        (false, 2) => "pencil_text=debug",
        (false, _) => "debug",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
