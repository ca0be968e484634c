use clap::{ArgGroup, Args, Parser, Subcommand};
use log::{info, warn, LevelFilter};
use spotlight_archiver_core::listing::{format_entry_urls, UrlLister};
use spotlight_archiver_core::locale::{is_all, LocaleCatalog};
use spotlight_archiver_core::logging::{init_logger, LOG_ENV_VAR};
use spotlight_archiver_core::pacing::CountdownPacer;
use spotlight_archiver_core::retry::RetryPolicy;
use spotlight_archiver_core::upstream::SpotlightClient;
use spotlight_archiver_core::{ApiVersion, Config, LogLevel, Orientation, SpotlightArchiver};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "spotlight-archiver")]
#[command(about = "Archive, manage and preserve Windows Spotlight images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that queries the delivery API
#[derive(Args)]
struct QueryArgs {
    /// API version to use (3 for 1080p, 4 for 4K) [default: 3]
    #[arg(long, value_parser = clap::value_parser!(u8).range(3..=4))]
    api_ver: Option<u8>,

    /// Locale code (e.g. 'en-us'), or 'all' for every known locale
    #[arg(long, default_value = "en-us")]
    locale: String,

    /// Image orientation: landscape, portrait or both [default: landscape]
    #[arg(long, value_parser = parse_orientation)]
    orientation: Option<Orientation>,

    /// Verbose output
    #[arg(long)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available Spotlight picture URLs
    ListUrl {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Download Spotlight pictures
    #[command(group(ArgGroup::new("mode").required(true).args(["single", "multiple"])))]
    Download {
        #[command(flatten)]
        query: QueryArgs,

        /// Download a single image (a random locale is picked for 'all')
        #[arg(long)]
        single: bool,

        /// Download every image, repeating until nothing new turns up
        #[arg(long)]
        multiple: bool,

        /// With --multiple, stop after one pass
        #[arg(long, requires = "multiple")]
        once: bool,

        /// Directory to save the images [default: downloaded_spotlight]
        #[arg(long)]
        save_dir: Option<PathBuf>,

        /// Embed EXIF metadata in the images (ignored for locale 'all')
        #[arg(long)]
        embed_exif: bool,

        /// Path to the exiftool executable or its directory [default: search PATH]
        #[arg(long)]
        exiftool_path: Option<PathBuf>,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "spotlight-archiver.json")]
        path: PathBuf,
    },
}

fn parse_orientation(value: &str) -> Result<Orientation, String> {
    value.parse().map_err(|e: spotlight_archiver_core::Error| e.to_string())
}

/// Load the config file, if any, and apply the query overrides
fn load_config(query: &QueryArgs) -> anyhow::Result<Config> {
    let mut config = match &query.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(api_ver) = query.api_ver {
        config.api_version = ApiVersion::try_from(api_ver)?;
    }
    if let Some(orientation) = query.orientation {
        config.orientation = orientation;
    }
    if query.verbose {
        config.verbose = true;
        config.log_level = LogLevel::Debug;
    }
    Ok(config)
}

/// Log to console and file, or to the console only when the file can't be set up
fn init_logging(config: &Config, to_file: bool) {
    let level = config.log_level.to_level_filter();
    if to_file {
        match init_logger(&config.log_dir(), level) {
            Ok(()) => return,
            Err(e) => eprintln!("File logging unavailable ({}), using console only", e),
        }
    }
    env_logger::Builder::new()
        .filter_level(level.max(LevelFilter::Info))
        .parse_env(LOG_ENV_VAR)
        .init();
}

fn list_urls(query: &QueryArgs, config: &Config) -> anyhow::Result<()> {
    let catalog = LocaleCatalog::load(&config.locale_cache_dir, config.api_version)?;
    let source = SpotlightClient::new(config.request_timeout(), config.download_deadline())?;
    let pacer = CountdownPacer;
    let lister = UrlLister::new(&source, &catalog, &pacer)
        .with_retry_policy(RetryPolicy::from_config(config))
        .with_chunking(
            config.chunk_size,
            Duration::from_secs(config.max_chunk_delay_secs),
        );

    println!("Listing URLs...");
    let total = lister.list(
        config.api_version,
        &query.locale,
        config.orientation,
        |_, entries| {
            for entry in entries {
                println!("{}", format_entry_urls(entry, config.orientation));
            }
            println!("Found {} URLs", entries.len());
        },
    )?;
    println!("Done. Found {} URLs.", total);
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::ListUrl { query } => {
            let config = load_config(&query)?;
            config.validate()?;
            init_logging(&config, false);

            list_urls(&query, &config)
        }

        Commands::Download {
            query,
            single,
            multiple: _,
            once,
            save_dir,
            embed_exif,
            exiftool_path,
        } => {
            // Set up configuration
            let mut config = load_config(&query)?;
            if let Some(save_dir) = save_dir {
                config.save_dir = save_dir;
            }
            if exiftool_path.is_some() {
                config.exiftool_path = exiftool_path;
            }
            config.embed_exif |= embed_exif;

            init_logging(&config, true);

            if is_all(&query.locale) && config.embed_exif {
                warn!("When --locale is 'all', --embed-exif is automatically set to false.");
                config.embed_exif = false;
            }

            let mut archiver = SpotlightArchiver::build(config)?;
            let locale = query.locale.as_str();

            if single {
                if !archiver.download_single(locale)? {
                    warn!("No image was downloaded");
                }
            } else if once {
                let tally = archiver.download_multiple(locale)?;
                info!(
                    "Done: {} downloaded, {} already downloaded",
                    tally.downloaded, tally.already_downloaded
                );
            } else {
                let summary = archiver.download_multiple_until_exhausted(locale)?;
                info!(
                    "Done after {} calls: {} downloaded, {} already downloaded",
                    summary.calls, summary.totals.downloaded, summary.totals.already_downloaded
                );
            }

            Ok(())
        }

        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}
