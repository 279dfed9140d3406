use anyhow::{Context, Result};
use lyra_etl::Config;

use super::{yes_no, App};

pub fn run_init(config: Config) -> Result<()> {
    for dir in [config.songbook_dir(), config.pdf_dir()] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let app = App::start(config)?;

    println!("✓ Data directory ready: {}", app.config.data_dir.display());
    println!("  Database: {}", app.config.database_path().display());
    println!("  Songs downloaded: {}", yes_no(app.status.songs_ready));
    println!("  Database imported: {}", yes_no(app.status.database_ready));

    if app.status.songs_ready && !app.status.database_ready {
        println!("\n  Run `lyra import` to import the songbooks");
    } else if !app.status.songs_ready {
        println!(
            "\n  Place the songbook XML files under {}",
            app.config.songbook_dir().display()
        );
    }

    Ok(())
}
