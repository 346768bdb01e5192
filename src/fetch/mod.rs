//! Remote document fetching
//!
//! Downloads a source locator into `{data_dir}/{fingerprint}/raw.{ext}` at
//! most once per fingerprint at a time, however many callers ask for it.
//!
//! No timeout is applied to a transfer: it runs until it completes or fails.

mod fingerprint;
mod flight;

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::document::{DocumentError, Result};
use crate::storage::StorageLayout;

pub use fingerprint::{fingerprint, is_fingerprint, FINGERPRINT_LEN};
pub use flight::SingleFlight;

/// Suffix of the file a transfer streams into before it is complete
const PARTIAL_SUFFIX: &str = "part";

/// A fetched document on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// `{data_dir}/{fingerprint}/raw.{ext}`
    pub file_path: PathBuf,
    /// `{data_dir}/{fingerprint}`
    pub extraction_dir: PathBuf,
}

/// Deduplicating downloader
#[derive(Clone)]
pub struct FetchCoordinator {
    client: reqwest::Client,
    layout: StorageLayout,
    flights: SingleFlight<()>,
}

impl FetchCoordinator {
    pub fn new(layout: StorageLayout) -> Self {
        Self::with_client(layout, reqwest::Client::new())
    }

    pub fn with_client(layout: StorageLayout, client: reqwest::Client) -> Self {
        Self {
            client,
            layout,
            flights: SingleFlight::new(),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Number of transfers currently running
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    /// Fetch `locator` to local storage, or return the copy already there
    pub async fn fetch(&self, locator: &str) -> Result<FetchedFile> {
        let fp = fingerprint(locator);
        let fetched = FetchedFile {
            file_path: self.layout.raw_file(&fp, locator),
            extraction_dir: self.layout.extraction_dir(&fp),
        };

        if tokio::fs::try_exists(&fetched.file_path).await.unwrap_or(false) {
            tracing::debug!(fingerprint = %fp, "Using previously fetched file");
            return Ok(fetched);
        }

        let client = self.client.clone();
        let url = locator.to_string();
        let target = fetched.clone();
        self.flights
            .run(&fp, async move { download(&client, &url, &target).await })
            .await?;

        Ok(fetched)
    }
}

/// Stream the response body to `{file_path}.part`, then rename into place
async fn download(client: &reqwest::Client, url: &str, target: &FetchedFile) -> Result<()> {
    tokio::fs::create_dir_all(&target.extraction_dir).await?;

    let partial = partial_path(&target.file_path);
    tracing::info!(locator = %url, path = %target.file_path.display(), "Fetching document");

    match stream_to_file(client, url, &partial).await {
        Ok(bytes) => {
            tokio::fs::rename(&partial, &target.file_path).await?;
            tracing::info!(locator = %url, bytes, "Fetch complete");
            Ok(())
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %partial.display(),
                        error = %cleanup,
                        "Failed to remove partial download"
                    );
                }
            }
            tracing::warn!(locator = %url, error = %e, "Fetch failed");
            Err(e)
        }
    }
}

async fn stream_to_file(client: &reqwest::Client, url: &str, path: &Path) -> Result<u64> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DocumentError::Network(format!("http status: {}", status)));
    }

    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

fn partial_path(file_path: &Path) -> PathBuf {
    let mut name = file_path.as_os_str().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
