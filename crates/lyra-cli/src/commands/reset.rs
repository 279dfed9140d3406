use anyhow::{bail, Result};
use lyra_core::model::AppStatus;
use lyra_etl::Config;
use std::io::{BufRead, Write};

use super::import::{import_songbooks, importer};
use super::App;

/// Wipe the database and the status flags, then import the songbooks on
/// disk again.
pub fn run_reset(config: Config, yes: bool) -> Result<()> {
    let db_path = config.database_path();
    if !yes && !confirm(&format!("Delete every song in {}?", db_path.display()))? {
        bail!("Reset cancelled");
    }

    let mut app = App::start(config)?;
    app.status = AppStatus::default();
    app.save()?;

    let importer = importer(&app.config);
    let report = import_songbooks(&mut app, &importer, true)?;

    app.reconciler().reconcile(&mut app.status);
    app.save()?;

    println!("\n✓ Database reset: {}", db_path.display());
    println!(
        "  Re-imported {} songs, {} failed",
        report.imported(),
        report.failed()
    );
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
