//! Supplemental sheet-music PDFs fetched next to the song data.
//!
//! Each file is downloaded once; there is no retry. The fetch runs as a
//! single background task whose result is delivered over a one-slot
//! channel.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::FetchError;

/// A PDF to keep in the PDF directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementalPdf {
    pub url: String,

    /// Local file name. Empty means the last segment of the URL path.
    #[serde(default)]
    pub file_name: String,
}

impl SupplementalPdf {
    #[must_use]
    pub fn new(url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_name: file_name.into(),
        }
    }

    /// Guitar chords and chorale books for the EZ songbook.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "https://www.evangelickyzpevnik.cz.www.e-cirkev.cz/res/archive/001/000234.pdf",
                "kytara.pdf",
            ),
            Self::new(
                "https://www.evangelickyzpevnik.cz.www.e-cirkev.cz/res/archive/001/000208.pdf",
                "choralnik.pdf",
            ),
        ]
    }

    /// The local file name.
    #[must_use]
    pub fn target_name(&self) -> &str {
        if !self.file_name.is_empty() {
            return &self.file_name;
        }
        let path = self.url.split(['?', '#']).next().unwrap_or(&self.url);
        path.rsplit('/').next().unwrap_or(path)
    }

    #[must_use]
    pub fn target_path(&self, pdf_dir: &Path) -> PathBuf {
        pdf_dir.join(self.target_name())
    }
}

/// Entries of `list` whose file is not in `pdf_dir`.
pub fn missing(pdf_dir: &Path, list: &[SupplementalPdf]) -> Vec<SupplementalPdf> {
    list.iter()
        .filter(|pdf| !pdf.target_path(pdf_dir).is_file())
        .cloned()
        .collect()
}

/// What a fetch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// File names written during this fetch.
    pub downloaded: Vec<String>,
    pub already_present: usize,
}

/// Download every missing file of `list` into `pdf_dir`, stopping at the
/// first failure.
pub async fn fetch_missing(
    client: &reqwest::Client,
    pdf_dir: &Path,
    list: &[SupplementalPdf],
) -> Result<FetchReport, FetchError> {
    let todo = missing(pdf_dir, list);
    let mut report = FetchReport {
        already_present: list.len() - todo.len(),
        ..FetchReport::default()
    };
    if todo.is_empty() {
        return Ok(report);
    }

    tokio::fs::create_dir_all(pdf_dir)
        .await
        .map_err(|source| FetchError::Io {
            path: pdf_dir.to_path_buf(),
            source,
        })?;

    for pdf in &todo {
        log::info!("Downloading {} to {}", pdf.url, pdf.target_name());
        download(client, pdf, pdf_dir).await?;
        report.downloaded.push(pdf.target_name().to_string());
    }
    Ok(report)
}

async fn download(
    client: &reqwest::Client,
    pdf: &SupplementalPdf,
    pdf_dir: &Path,
) -> Result<(), FetchError> {
    let response = client.get(&pdf.url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: pdf.url.clone(),
            status: status.as_u16(),
        });
    }
    let body = response.bytes().await?;

    // a partial download must never carry the final name
    let target = pdf.target_path(pdf_dir);
    let partial = target.with_extension("part");
    tokio::fs::write(&partial, &body)
        .await
        .map_err(|source| FetchError::Io {
            path: partial.clone(),
            source,
        })?;
    tokio::fs::rename(&partial, &target)
        .await
        .map_err(|source| FetchError::Io {
            path: target.clone(),
            source,
        })?;
    Ok(())
}

/// Handle to a fetch running in the background.
#[derive(Debug)]
pub struct BackgroundFetch {
    result: mpsc::Receiver<Result<FetchReport, FetchError>>,
    task: JoinHandle<()>,
}

impl BackgroundFetch {
    /// Wait for the fetch to finish.
    pub async fn join(mut self) -> Result<FetchReport, FetchError> {
        let result = self.result.recv().await;
        if let Err(e) = self.task.await {
            return Err(FetchError::Interrupted(e.to_string()));
        }
        result.unwrap_or_else(|| Err(FetchError::Interrupted("no result".to_string())))
    }
}

/// Start fetching the missing files of `list` on the tokio runtime.
pub fn spawn_background(
    client: reqwest::Client,
    pdf_dir: PathBuf,
    list: Vec<SupplementalPdf>,
) -> BackgroundFetch {
    let (tx, rx) = mpsc::channel(1);
    let task = tokio::spawn(async move {
        let result = fetch_missing(&client, &pdf_dir, &list).await;
        if let Err(e) = &result {
            log::warn!("Supplemental PDF download failed: {e}");
        }
        if tx.send(result).await.is_err() {
            log::debug!("Supplemental PDF result dropped, nobody is waiting");
        }
    });
    BackgroundFetch { result: rx, task }
}
