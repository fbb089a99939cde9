use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use binstore::{
    LowLevelCacheEntry,
    config::{Config, ConfigError},
    error::CacheError,
    fixity::{DigestUri, FixityReader, digest::sha1, digest_for_algorithm},
    storage::ContentKey,
    util::logging::init_logging,
};
use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{error, info};

// clap exits with 2 on usage errors
const EXIT_FIXITY_MISMATCH: u8 = 3;

#[derive(Parser)]
#[command(name = "binstore")]
#[command(about = "Store binaries in chunked or direct backends and check their fixity", long_about = None)]
struct Cli {
    /// JSON backend configuration.
    #[arg(short, long, value_name = "CONFIG_JSON")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Store a file under the SHA-1 of its content")]
    Store {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    #[command(about = "Check a stored value against a digest URI and size")]
    Check {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "DIGEST_URI")]
        digest: DigestUri,
        #[arg(value_name = "SIZE")]
        size: u64,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("unsupported digest algorithm `{0}`")]
    UnsupportedAlgorithm(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FIXITY_MISMATCH),
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool, CliError> {
    let config = Config::load(&cli.config)?;
    match cli.command {
        Commands::Store { path } => store_file(&config, &path),
        Commands::Check { key, digest, size } => check(&config, ContentKey::from(key), &digest, size),
    }
}

fn store_file(config: &Config, path: &Path) -> Result<bool, CliError> {
    // content key = SHA-1 of the bytes, computed without buffering the file
    let mut reader = FixityReader::new(File::open(path)?, &sha1())?;
    io::copy(&mut reader, &mut io::sink())?;
    let key = ContentKey::new(hex::encode(reader.current_digest()));

    let entry = LowLevelCacheEntry::new(config.open_backend()?, key);
    let stored = entry.store(&mut File::open(path)?)?;
    let entry = LowLevelCacheEntry::new(entry.backend().clone(), stored);

    info!(key = %entry.key(), bytes = reader.bytes_read(), "file stored");
    println!("{}\t{}\t{}\t{}", entry.key(), reader.digest_uri(), reader.bytes_read(), entry.external_location());
    Ok(true)
}

fn check(config: &Config, key: ContentKey, expected: &DigestUri, size: u64) -> Result<bool, CliError> {
    let digest = digest_for_algorithm(expected.algorithm())
        .ok_or_else(|| CliError::UnsupportedAlgorithm(expected.algorithm().to_string()))?;
    let entry = LowLevelCacheEntry::new(config.open_backend()?, key);
    let result = entry.check_fixity(expected, size, digest.as_ref())?;
    println!("{result}");
    Ok(result.is_success())
}
