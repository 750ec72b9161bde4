//! Fetch backends for the three source variants
//!
//! One backend per variant, behind a single dispatching [`Fetcher`].
//! Every fetch stages its content next to the destination and publishes
//! only on success, so a failed fetch leaves no observably-partial
//! result. Distinct sources may be fetched concurrently as long as their
//! destinations are distinct; the fetcher holds no per-source state.

use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use tar::Archive as TarArchive;
use tracing::Instrument;

use stagehand_core::{Archive, HelmChart, Manifest, Source};

use crate::error::{FetchError, Result};
use crate::stage::Staging;

/// Contract of a fetch backend
///
/// Given a source and an existing, writable destination directory,
/// populate the directory with the source's content or fail without
/// partially populating it.
#[async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, source: &Source, dest_dir: &Path) -> Result<()>;
}

/// HTTP-backed fetcher for all source variants
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self { client })
    }

    /// Reuse an existing client (connection pooling across fetchers)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Auth {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch a manifest: the body lands as `<name>.yaml`
    async fn fetch_manifest(&self, manifest: &Manifest, dest_dir: &Path) -> Result<()> {
        tracing::debug!(url = manifest.url(), "fetching manifest");
        let body = self.get_bytes(manifest.url()).await?;

        let staging = Staging::for_dest(dest_dir)?;
        staging.write_file(&format!("{}.yaml", manifest.name()), &body)?;
        staging.publish(dest_dir)?;

        tracing::info!(bytes = body.len(), "manifest fetched");
        Ok(())
    }

    /// Fetch a Helm chart archive from its repository
    ///
    /// Uses the standard Helm repo layout: `{repo}/{name}-{version}.tgz`.
    /// The chart is unpacked as-is; template rendering is not this
    /// crate's job.
    async fn fetch_chart(&self, chart: &HelmChart, dest_dir: &Path) -> Result<()> {
        let url = format!(
            "{}/{}-{}.tgz",
            chart.repo().trim_end_matches('/'),
            chart.name(),
            chart.version()
        );
        tracing::debug!(url = %url, "fetching chart");
        let body = self.get_bytes(&url).await?;

        let staging = Staging::for_dest(dest_dir)?;
        let count = unpack_targz(&body, &staging, |path| Some(path.to_string()))?;
        staging.publish(dest_dir)?;

        tracing::info!(files = count, "chart fetched");
        Ok(())
    }

    /// Fetch an archive and extract the subset selected by its paths
    async fn fetch_archive(&self, archive: &Archive, dest_dir: &Path) -> Result<()> {
        tracing::debug!(url = archive.url(), "fetching archive");
        let body = self.get_bytes(archive.url()).await?;

        let staging = Staging::for_dest(dest_dir)?;
        let count = unpack_targz(&body, &staging, |path| archive.route(path))?;
        staging.publish(dest_dir)?;

        tracing::info!(files = count, "archive fetched");
        Ok(())
    }
}

#[async_trait]
impl FetchBackend for Fetcher {
    async fn fetch(&self, source: &Source, dest_dir: &Path) -> Result<()> {
        let span = source.logger().clone();
        async {
            match source {
                Source::Manifest(m) => self.fetch_manifest(m, dest_dir).await,
                Source::Chart(c) => self.fetch_chart(c, dest_dir).await,
                Source::Archive(a) => self.fetch_archive(a, dest_dir).await,
            }
        }
        .instrument(span)
        .await
    }
}

/// Unpack a tar.gz stream into the staging directory
///
/// `route` maps each regular-file entry path to its destination path, or
/// `None` to skip the entry. Returns the number of files written.
fn unpack_targz<F>(data: &[u8], staging: &Staging, route: F) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let decoder = GzDecoder::new(data);
    let mut tar = TarArchive::new(decoder);
    let mut count = 0;

    let entries = tar.entries().map_err(decompression)?;
    for entry in entries {
        let mut entry = entry.map_err(decompression)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry
            .path()
            .map_err(decompression)?
            .to_string_lossy()
            .into_owned();

        let Some(dest_path) = route(&path) else {
            continue;
        };

        let mut content = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut content).map_err(decompression)?;
        staging.write_file(&dest_path, &content)?;
        count += 1;
    }

    Ok(count)
}

fn decompression(e: std::io::Error) -> FetchError {
    FetchError::Decompression {
        message: e.to_string(),
    }
}
