use anyhow::Result;
use lyra_core::schema::Database;
use lyra_etl::{supplemental, Config};

use super::{yes_no, App};

pub fn show_status(config: Config) -> Result<()> {
    let app = App::start(config)?;
    let status = &app.status;

    println!("\n📊 Lyra Status\n");
    println!("  Data directory: {}", app.config.data_dir.display());
    println!("  Database: {}", app.config.database_path().display());
    println!("  Songs downloaded: {}", yes_no(status.songs_ready));
    println!("  Database imported: {}", yes_no(status.database_ready));
    println!("  Supplemental PDFs: {}", yes_no(status.web_resources_ready));
    println!("  Sorting: {}", status.sort_key());
    if !status.last_search.is_empty() {
        println!("  Last search: {}", status.last_search);
    }
    if status.is_progress {
        println!(
            "  In progress: {} ({}%)",
            status.progress_message, status.progress_percent
        );
    }
    if !status.last_save.is_empty() {
        println!("  Last saved: {}", status.last_save);
    }

    let db = Database::open_existing(app.config.database_path())?;
    println!("\n  Songbooks:");
    for songbook in db.list_songbooks()? {
        let count = db.count_songs(Some(&songbook.acronym))?;
        println!("    {:<4} {:>5} songs  {}", songbook.acronym, count, songbook.name);
    }

    let missing = supplemental::missing(&app.config.pdf_dir(), &app.config.supplemental_pdfs);
    for pdf in &missing {
        println!("\n  Missing PDF: {}", pdf.target_name());
    }

    if !status.database_ready {
        println!("\n  Run `lyra import` to import the songbooks");
    } else if app.reconciliation.needs_supplemental_fetch {
        println!("\n  Run `lyra import` to download the missing PDFs");
    }

    Ok(())
}
