//! Pinecone serverless REST client.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::retry::{error_for_status, with_retries};
use crate::store::{
    check_dimension, IndexProvisioner, IndexSpec, IndexStats, IndexStatus, Metric,
    ProvisionPolicy, QueryMatch, VectorIndex, VectorRecord, DEFAULT_UPSERT_BATCH,
};
use crate::{Error, Result};

/// Default control-plane base URL.
pub const DEFAULT_CONTROL_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";

/// Control-plane client; hands out [`PineconeIndex`] data-plane handles.
#[derive(Clone)]
pub struct PineconeClient {
    client: Client,
    control_url: String,
    max_retries: usize,
    upsert_batch: usize,
    provision: ProvisionPolicy,
}

impl PineconeClient {
    /// Builds a client authenticated with `api_key`.
    pub fn new(
        api_key: &str,
        control_url: &str,
        timeout: Duration,
        max_retries: usize,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::config("missing Pinecone API key"));
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key.trim())
                .map_err(|_| Error::config("invalid Pinecone API key"))?,
        );
        headers.insert("X-Pinecone-API-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        tracing::info!("Pinecone client initialized");
        Ok(Self {
            client,
            control_url: control_url.trim_end_matches('/').to_string(),
            max_retries: max_retries.max(1),
            upsert_batch: DEFAULT_UPSERT_BATCH,
            provision: ProvisionPolicy::default(),
        })
    }

    /// Overrides the readiness polling policy used by `ensure_index`.
    pub fn with_provision_policy(mut self, policy: ProvisionPolicy) -> Self {
        self.provision = policy;
        self
    }

    /// Overrides the number of records per upsert request.
    pub fn with_upsert_batch(mut self, batch: usize) -> Self {
        self.upsert_batch = batch.max(1);
        self
    }

    /// Describes `name`, or `None` when the index does not exist.
    pub fn describe(&self, name: &str) -> Result<Option<IndexDescription>> {
        let url = format!("{}/indexes/{}", self.control_url, name);
        with_retries("describe index", self.max_retries, || {
            let resp = self.client.get(&url).send()?;
            if resp.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !resp.status().is_success() {
                return Err(error_for_status("Pinecone", resp));
            }
            Ok(Some(resp.json()?))
        })
    }

    /// Opens the data plane of an existing index.
    pub fn index(&self, name: &str) -> Result<PineconeIndex> {
        let description = self.describe(name)?.ok_or_else(|| {
            Error::config(format!(
                "Pinecone index '{name}' does not exist; run the ingestion first"
            ))
        })?;
        Ok(PineconeIndex {
            client: self.client.clone(),
            base_url: data_plane_url(&description.host),
            dimension: description.dimension,
            max_retries: self.max_retries,
            upsert_batch: self.upsert_batch,
        })
    }

    fn create(&self, spec: &IndexSpec) -> Result<()> {
        let body = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: spec.metric,
            spec: CreateSpec {
                serverless: ServerlessSpec {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        };
        let resp = self
            .client
            .post(format!("{}/indexes", self.control_url))
            .json(&body)
            .send()?;
        match resp.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => {
                tracing::warn!("index '{}' was created concurrently", spec.name);
                Ok(())
            }
            _ => Err(error_for_status("Pinecone", resp)),
        }
    }

    fn wait_until_ready(&self, name: &str) -> Result<()> {
        self.provision.wait_until_ready(name, || {
            Ok(self.describe(name)?.is_some_and(|d| d.status.ready))
        })
    }
}

impl IndexProvisioner for PineconeClient {
    fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexStatus> {
        if let Some(existing) = self.describe(&spec.name)? {
            if existing.dimension != spec.dimension {
                return Err(Error::config(format!(
                    "index '{}' has dimension {} but the embedder produces {}",
                    spec.name, existing.dimension, spec.dimension
                )));
            }
            if !existing.status.ready {
                tracing::info!("index '{}' exists but is not ready yet", spec.name);
                self.wait_until_ready(&spec.name)?;
            }
            tracing::info!("index '{}' already exists", spec.name);
            return Ok(IndexStatus::Existing);
        }

        tracing::info!(
            "index '{}' does not exist; creating ({} dims, {}/{})",
            spec.name,
            spec.dimension,
            spec.cloud,
            spec.region
        );
        self.create(spec)?;
        self.wait_until_ready(&spec.name)?;
        tracing::info!("index '{}' created", spec.name);
        Ok(IndexStatus::Created)
    }
}

/// Data-plane handle for one index.
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    client: Client,
    base_url: String,
    dimension: usize,
    max_retries: usize,
    upsert_batch: usize,
}

impl VectorIndex for PineconeIndex {
    fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        check_dimension(self.dimension, records)?;
        let url = format!("{}/vectors/upsert", self.base_url);
        let mut written = 0usize;
        for batch in records.chunks(self.upsert_batch) {
            let count = with_retries("upsert", self.max_retries, || {
                let resp = self
                    .client
                    .post(&url)
                    .json(&UpsertRequest { vectors: batch })
                    .send()?;
                if !resp.status().is_success() {
                    return Err(error_for_status("Pinecone", resp));
                }
                let parsed: UpsertResponse = resp.json()?;
                Ok(parsed.upserted_count)
            })?;
            tracing::debug!("upserted batch of {count} records");
            written += count;
        }
        Ok(written)
    }

    fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let url = format!("{}/query", self.base_url);
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };
        let mut matches = with_retries("query", self.max_retries, || {
            let resp = self.client.post(&url).json(&request).send()?;
            if !resp.status().is_success() {
                return Err(error_for_status("Pinecone", resp));
            }
            let parsed: QueryResponse = resp.json()?;
            Ok(parsed.matches)
        })?;
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    fn stats(&self) -> Result<IndexStats> {
        let url = format!("{}/describe_index_stats", self.base_url);
        let parsed: StatsResponse = with_retries("describe stats", self.max_retries, || {
            let resp = self
                .client
                .post(&url)
                .json(&serde_json::json!({}))
                .send()?;
            if !resp.status().is_success() {
                return Err(error_for_status("Pinecone", resp));
            }
            Ok(resp.json()?)
        })?;
        Ok(IndexStats {
            dimension: parsed.dimension,
            total_vector_count: parsed.total_vector_count,
        })
    }
}

fn data_plane_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// Control-plane view of an index.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDescription {
    /// Vector dimension.
    pub dimension: usize,
    /// Data-plane host name.
    #[serde(default)]
    pub host: String,
    /// Provisioning state.
    pub status: IndexState,
}

/// Provisioning state reported by the control plane.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexState {
    /// Whether the index accepts queries.
    pub ready: bool,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: Metric,
    spec: CreateSpec<'a>,
}

#[derive(Serialize)]
struct CreateSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    total_vector_count: u64,
}
