pub mod config;
pub mod import;
pub mod init;
pub mod list;
pub mod reset;
pub mod show;
pub mod sort;
pub mod status;

pub use import::run_import;
pub use init::run_init;
pub use status::show_status;

use anyhow::{Context, Result};
use lyra_core::model::AppStatus;
use lyra_core::schema::Database;
use lyra_etl::{Config, Reconciliation, StatusReconciler, StatusStore};

/// Configuration plus the loaded status, after the startup checks ran.
#[derive(Debug)]
pub struct App {
    pub config: Config,
    pub store: StatusStore,
    pub status: AppStatus,
    pub reconciliation: Reconciliation,
}

impl App {
    /// Bring the schema up to date, load the status file and reconcile it
    /// with the files on disk.
    pub fn start(config: Config) -> Result<Self> {
        let db_path = config.database_path();
        let db = Database::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        log::debug!("Database schema at version {}", db.schema_version()?);
        drop(db);

        let store = StatusStore::new(config.status_path());
        let mut status = store.load()?;
        let reconciliation = reconciler(&config).reconcile(&mut status);
        if reconciliation.changed {
            store.save(&mut status)?;
        }

        Ok(Self {
            config,
            store,
            status,
            reconciliation,
        })
    }

    pub fn save(&mut self) -> Result<()> {
        self.store.save(&mut self.status)?;
        Ok(())
    }

    pub fn reconciler(&self) -> StatusReconciler {
        reconciler(&self.config)
    }
}

fn reconciler(config: &Config) -> StatusReconciler {
    StatusReconciler::new(config.songbook_dir(), config.database_path(), config.pdf_dir())
        .with_sources(config.songbooks.clone())
        .with_supplemental(config.supplemental_pdfs.clone())
        .with_test_run(config.test_run)
        .with_build_version(env!("CARGO_PKG_VERSION"))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
