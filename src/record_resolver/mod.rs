//! RecordResolver - Ordered Equipment Lookup
//!
//! ## Responsibilities
//!
//! - Resolve an equipment identifier through an ordered source chain:
//!   remote public endpoint first, local fallback store second
//! - Treat any remote failure (network, non-2xx, malformed body) as
//!   "source unavailable" and fall through, never as a fatal error
//!
//! The remote result is authoritative, so the two sources are awaited
//! sequentially, never in parallel.

mod fallback_store;

pub use fallback_store::FallbackStore;

use crate::equipment::{normalize_record, EquipmentRecord};
use crate::error::{Error, Result};
use reqwest::header::ACCEPT;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Which source produced a resolved record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// Remote public lookup endpoint
    Remote,
    /// Local fallback store
    Local,
}

impl RecordSource {
    /// Convert to string for logging/serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::Remote => "remote",
            RecordSource::Local => "local",
        }
    }
}

/// Result of a successful resolution
#[derive(Debug, Clone)]
pub struct ResolvedRecord {
    pub record: EquipmentRecord,
    pub source: RecordSource,
}

/// RecordResolver instance
pub struct RecordResolver {
    client: reqwest::Client,
    base_url: Option<Url>,
    store: Arc<FallbackStore>,
}

impl RecordResolver {
    /// Create a resolver
    ///
    /// `base_url` is the remote lookup base; `None` or an unparseable value
    /// leaves the remote source unconfigured and lookups go straight to the
    /// fallback store.
    pub fn new(base_url: Option<String>, store: Arc<FallbackStore>) -> Self {
        Self::with_timeout(base_url, store, Duration::from_secs(10))
    }

    /// Create a resolver with a custom remote timeout
    pub fn with_timeout(
        base_url: Option<String>,
        store: Arc<FallbackStore>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        let base_url = base_url.and_then(|raw| match Url::parse(raw.trim_end_matches('/')) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(base_url = %raw, error = %e, "Ignoring unparseable lookup base URL");
                None
            }
        });

        Self {
            client,
            base_url,
            store,
        }
    }

    /// Whether the remote source is configured
    pub fn remote_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Resolve an identifier to an equipment record
    ///
    /// The identifier is untrusted external input; an unknown or empty value
    /// yields `Error::NotFound`, never anything fatal.
    pub async fn resolve(&self, id: &str) -> Result<ResolvedRecord> {
        if id.trim().is_empty() {
            return Err(Error::NotFound("empty equipment identifier".to_string()));
        }

        if let Some(ref base) = self.base_url {
            match self.fetch_remote(base, id).await {
                Ok(record) => {
                    tracing::debug!(id = %id, source = "remote", "Equipment resolved");
                    return Ok(ResolvedRecord {
                        record,
                        source: RecordSource::Remote,
                    });
                }
                Err(e) => {
                    tracing::debug!(
                        id = %id,
                        error = %e,
                        "Remote lookup unavailable, falling back to local store"
                    );
                }
            }
        }

        if let Some(record) = self.store.get(id).await {
            tracing::debug!(id = %id, source = "local", "Equipment resolved");
            return Ok(ResolvedRecord {
                record,
                source: RecordSource::Local,
            });
        }

        Err(Error::NotFound(format!("equipment {} not found", id)))
    }

    /// Unauthenticated GET against the public equipment endpoint
    async fn fetch_remote(&self, base: &Url, id: &str) -> Result<EquipmentRecord> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::SourceUnavailable("lookup base URL cannot take a path".to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", "public", "equipment", id]);

        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::SourceUnavailable(format!(
                "remote lookup returned {}",
                resp.status()
            )));
        }

        let body: serde_json::Value = resp.json().await?;
        normalize_record(body)
    }
}
