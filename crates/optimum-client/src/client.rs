//! Remote client for the optimum service.
//!
//! Stateless request/response mapping: every method issues exactly one
//! request and interprets exactly one response. No retries, no caching.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use optimum_types::{
    Cask, Instances, Job, JobStatus, Query, QueryResult, Receipt, Sentence, Settings, TextQuery,
    TextResult, Vector,
};

use crate::error::ClientError;
use crate::transport::Transport;

/// Client for managing casks, uploading batches and polling jobs.
///
/// Cheap to clone and safe to share between writers and pollers.
#[derive(Debug, Clone)]
pub struct OptimumClient {
    transport: Transport,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    name: &'a str,
    opts: &'a Map<String, Value>,
}

#[derive(Serialize)]
struct CommitRequest {
    cursor: &'static str,
}

#[derive(Serialize)]
struct ObjectRequest<T: Serialize> {
    object: T,
}

#[derive(Serialize)]
struct QueryRequest<'a, T: Serialize> {
    query: &'a T,
}

impl OptimumClient {
    /// Create a client over an existing transport.
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Build a client from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        Ok(Self::new(Transport::from_settings(settings)?))
    }

    fn class_url(&self, class: &str) -> String {
        self.transport.url(&format!("/ds/{}", class))
    }

    fn cask_url(&self, cask: &Cask) -> String {
        self.transport
            .url(&format!("/ds/{}/{}", cask.class(), cask.name()))
    }

    /// List all instances of a class.
    pub async fn list(&self, class: &str) -> Result<Instances, ClientError> {
        debug!(class, "List instances");
        let req = self.transport.request(Method::GET, &self.class_url(class));
        let response = self.transport.send(req, StatusCode::OK).await?;
        Ok(response.json().await?)
    }

    /// Create a new cask. `opts` is passed to the service verbatim.
    ///
    /// Not idempotent: repeated calls may start concurrent jobs.
    pub async fn create(
        &self,
        cask: &Cask,
        opts: &Map<String, Value>,
    ) -> Result<Receipt, ClientError> {
        info!(cask = %cask, "Creating cask");
        let req = self
            .transport
            .request(Method::POST, &self.class_url(cask.class()))
            .json(&CreateRequest {
                name: cask.name(),
                opts,
            });
        let response = self.transport.send(req, StatusCode::ACCEPTED).await?;
        let receipt: Receipt = response.json().await?;
        debug!(cask = %cask, version = %receipt.version, job = %receipt.job, "Create accepted");
        Ok(receipt)
    }

    /// Publish uploaded but uncommitted data. The cursor is always `latest`.
    pub async fn commit(&self, cask: &Cask) -> Result<Receipt, ClientError> {
        info!(cask = %cask, "Committing cask");
        let req = self
            .transport
            .request(Method::POST, &self.cask_url(cask))
            .json(&CommitRequest { cursor: "latest" });
        let response = self.transport.send(req, StatusCode::ACCEPTED).await?;
        let receipt: Receipt = response.json().await?;
        debug!(cask = %cask, version = %receipt.version, job = %receipt.job, "Commit accepted");
        Ok(receipt)
    }

    /// Remove a cask and all of its data. Irreversible.
    pub async fn remove(&self, cask: &Cask) -> Result<(), ClientError> {
        info!(cask = %cask, "Removing cask");
        let req = self.transport.request(Method::DELETE, &self.cask_url(cask));
        self.transport.send(req, StatusCode::ACCEPTED).await?;
        Ok(())
    }

    /// Upload a compressed binary batch to the bulk endpoint.
    pub async fn write(&self, cask: &Cask, batch: Bytes) -> Result<(), ClientError> {
        debug!(cask = %cask, bytes = batch.len(), "Bulk write");
        let req = self
            .transport
            .request(Method::PUT, &self.cask_url(cask))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(batch);
        self.transport.send(req, StatusCode::ACCEPTED).await?;
        Ok(())
    }

    /// Append a compressed JSON-lines segment through the objects endpoint.
    pub async fn append_objects(&self, cask: &Cask, segment: Bytes) -> Result<(), ClientError> {
        debug!(cask = %cask, bytes = segment.len(), "Append objects");
        let url = format!("{}/objects", self.cask_url(cask));
        let req = self
            .transport
            .request(Method::POST, &url)
            .json(&ObjectRequest {
                object: STANDARD.encode(&segment),
            });
        self.transport.send(req, StatusCode::ACCEPTED).await?;
        Ok(())
    }

    /// Write a small bag of vectors uncompressed. An empty bag is a no-op.
    pub async fn put_vectors(&self, cask: &Cask, bag: &[Vector]) -> Result<(), ClientError> {
        self.put_object(cask, bag).await
    }

    /// Write a small bag of sentences uncompressed. An empty bag is a no-op.
    pub async fn put_sentences(&self, cask: &Cask, bag: &[Sentence]) -> Result<(), ClientError> {
        self.put_object(cask, bag).await
    }

    async fn put_object<T: Serialize>(&self, cask: &Cask, bag: &[T]) -> Result<(), ClientError> {
        if bag.is_empty() {
            return Ok(());
        }

        debug!(cask = %cask, count = bag.len(), "Put object");
        let url = format!("{}/object", self.cask_url(cask));
        let req = self
            .transport
            .request(Method::POST, &url)
            .json(&ObjectRequest { object: bag });
        self.transport.send(req, StatusCode::ACCEPTED).await?;
        Ok(())
    }

    /// Nearest neighbors of a vector. Hits keep the server's order.
    pub async fn query(&self, cask: &Cask, query: &Query) -> Result<QueryResult, ClientError> {
        self.run_query(cask, query).await
    }

    /// Nearest text blocks of a sample text.
    pub async fn query_text(
        &self,
        cask: &Cask,
        query: &TextQuery,
    ) -> Result<TextResult, ClientError> {
        self.run_query(cask, query).await
    }

    async fn run_query<Q, R>(&self, cask: &Cask, query: &Q) -> Result<R, ClientError>
    where
        Q: Serialize,
        R: serde::de::DeserializeOwned,
    {
        debug!(cask = %cask, "Query");
        let req = self
            .transport
            .request(Method::GET, &self.cask_url(cask))
            .json(&QueryRequest { query });
        let response = self.transport.send(req, StatusCode::OK).await?;
        Ok(response.json().await?)
    }

    /// Single-shot status of a job.
    pub async fn status(&self, job: &Job) -> Result<JobStatus, ClientError> {
        let url = self.transport.job_url(job)?;
        let req = self.transport.request(Method::GET, &url);
        let response = self.transport.send(req, StatusCode::OK).await?;
        Ok(response.json().await?)
    }
}
