use anyhow::{Context, Result};
use lyra_core::schema::Database;
use lyra_etl::{supplemental, Config, ImportOptions, ImportReport, Importer, Progress};

use super::App;

pub async fn run_import(config: Config, songbook: Option<String>, skip_pdfs: bool) -> Result<()> {
    let mut app = App::start(config)?;

    // PDFs download while the import runs
    let fetch = if skip_pdfs || app.status.web_resources_ready {
        None
    } else {
        let client = reqwest::Client::new();
        Some(supplemental::spawn_background(
            client,
            app.config.pdf_dir(),
            app.config.supplemental_pdfs.clone(),
        ))
    };

    let mut importer = importer(&app.config);
    if let Some(acronym) = songbook.as_deref() {
        importer = importer.only(acronym)?;
    }

    let report = import_songbooks(&mut app, &importer, false)?;

    if let Some(fetch) = fetch {
        match fetch.join().await {
            Ok(fetched) => {
                for name in &fetched.downloaded {
                    println!("  ✓ Downloaded {name}");
                }
            }
            Err(e) => eprintln!("  ✗ Supplemental PDF download failed: {e}"),
        }
    }

    app.reconciler().reconcile(&mut app.status);
    app.save()?;

    println!(
        "\n✓ Import complete: {} songs, {} failed",
        report.imported(),
        report.failed()
    );
    if !app.status.database_ready {
        println!("  The database does not hold the expected number of songs yet");
    }

    Ok(())
}

pub(crate) fn importer(config: &Config) -> Importer {
    Importer::new(
        config.songbook_dir(),
        config.songbooks.clone(),
        ImportOptions {
            test_run: config.test_run,
        },
    )
}

/// Run `importer` with its progress recorded in the status file, then print
/// one line per songbook. With `reset` the schema is recreated first.
pub(crate) fn import_songbooks(
    app: &mut App,
    importer: &Importer,
    reset: bool,
) -> Result<ImportReport> {
    let db_path = app.config.database_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let message = if reset {
        "Resetting and importing songs..."
    } else {
        "Importing songs..."
    };
    app.store.start_progress(&mut app.status, message)?;
    let store = &app.store;
    let status = &mut app.status;
    let mut record = |progress: &Progress| {
        log::info!("{} {}%", progress.message, progress.percent);
        if let Err(e) = store.update_progress(status, progress.message.clone(), progress.percent) {
            log::warn!("Failed to record progress: {e}");
        }
    };
    let result = if reset {
        importer.reset_and_run(&db, &mut record)
    } else {
        importer.run(&db, &mut record)
    };
    drop(db);
    app.store.clear_progress(&mut app.status)?;
    let report = result?;

    for songbook in &report.songbooks {
        if songbook.skipped {
            println!("  - {}: not present, skipped", songbook.acronym);
        } else {
            println!(
                "  ✓ {}: {} imported, {} failed",
                songbook.acronym, songbook.imported, songbook.failed
            );
        }
    }

    Ok(report)
}
