use anyhow::{anyhow, Result};
use clap::Parser;
use lyra_etl::Config;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "lyra", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: <data dir>/Songs.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Data directory holding SongBook/, PdfSources/ and status.toml
    /// (default: ~/.local/share/lyra)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Prepare the data directory and database
    ///
    /// Creates the data directory layout, brings the database schema up to
    /// the current version and reconciles the status file with what is on
    /// disk. Safe to run any number of times.
    Init,
    /// Import songbooks into the database
    ///
    /// Reads every XML file of each configured songbook directory under
    /// <data dir>/SongBook and replaces the songs previously imported for
    /// that songbook. Files that fail to parse are reported and skipped.
    ///
    /// Missing supplemental PDFs are downloaded into <data dir>/PdfSources
    /// while the import runs.
    Import {
        /// Import only this songbook (e.g. EZ, KK)
        #[arg(long)]
        songbook: Option<String>,

        /// Do not download supplemental PDFs
        #[arg(long)]
        skip_pdfs: bool,

        /// Import at most 25 files per songbook
        #[arg(long)]
        test_run: bool,
    },
    /// List or search songs
    ///
    /// Search text is matched without regard to case or diacritics against
    /// titles, authors and verses. Digits alone match the entry number
    /// exactly. Text of one or two characters does not filter.
    List {
        /// Sort order: entry, title, authorMusic or authorLyric
        /// (default: the stored preference)
        #[arg(long)]
        sort: Option<String>,

        /// Search text
        #[arg(long)]
        search: Option<String>,

        /// List one line per song without verses
        #[arg(long)]
        headers: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the authors of a song
    Authors {
        /// Song id
        id: i64,
    },
    /// Show the verses of a song
    Verses {
        /// Song id
        id: i64,
    },
    /// Print the projection payload of a song as JSON
    Projection {
        /// Song id
        id: i64,
    },
    /// Show readiness flags and song counts
    Status,
    /// Store the preferred sort order
    Sort {
        /// entry, title, authorMusic or authorLyric
        key: String,
    },
    /// Drop all tables, recreate the schema and import the songbooks again
    Reset {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the current effective configuration
    Show,
    /// Print one value, or the whole config file
    Get {
        /// Key such as data_dir or logging.level
        key: Option<String>,
    },
    /// Set a value in the config file
    Set {
        /// Key such as data_dir or logging.level
        key: String,
        value: String,
    },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    if let Some(db) = cli.db {
        config = config.with_database_path(db);
    }

    twyg::setup(config.logging.opts()?).map_err(|e| anyhow!("Failed to set up logging: {e}"))?;

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Get { key } => commands::config::get_config(&config, key)?,
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
        Commands::Init => commands::run_init(config)?,
        Commands::Import {
            songbook,
            skip_pdfs,
            test_run,
        } => {
            if test_run {
                config.test_run = true;
            }
            commands::run_import(config, songbook, skip_pdfs).await?;
        }
        Commands::List {
            sort,
            search,
            headers,
            json,
        } => {
            let options = commands::list::ListOptions {
                sort,
                search: search.unwrap_or_default(),
                headers,
                json,
            };
            commands::list::run_list(config, &options)?;
        }
        Commands::Authors { id } => commands::show::show_authors(config, id)?,
        Commands::Verses { id } => commands::show::show_verses(config, id)?,
        Commands::Projection { id } => commands::show::show_projection(config, id)?,
        Commands::Status => commands::show_status(config)?,
        Commands::Sort { key } => commands::sort::set_sort(config, &key)?,
        Commands::Reset { yes } => commands::reset::run_reset(config, yes)?,
    }

    Ok(())
}
