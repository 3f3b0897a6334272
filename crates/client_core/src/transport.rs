//! Directory service seam and its HTTP implementation.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    domain::{EmployeeId, FilterCriteria},
    error::ApiException,
};
use tracing::warn;
use url::Url;

use crate::settings::ClientSettings;

/// Read operations of the remote employee directory.
///
/// Both calls hand back the raw JSON body; shaping it into result sets and
/// detail records is up to the caller.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn list_employees(&self, filter: &FilterCriteria) -> Result<Value>;
    async fn employee_detail(&self, employee_id: &EmployeeId) -> Result<Value>;
}

pub struct UnavailableDirectoryService;

#[async_trait]
impl DirectoryService for UnavailableDirectoryService {
    async fn list_employees(&self, _filter: &FilterCriteria) -> Result<Value> {
        Err(anyhow!("directory service is unavailable"))
    }

    async fn employee_detail(&self, employee_id: &EmployeeId) -> Result<Value> {
        Err(anyhow!(
            "directory service is unavailable for employee {employee_id}"
        ))
    }
}

pub struct HttpDirectoryService {
    http: Client,
    base_url: Url,
}

impl HttpDirectoryService {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let base_url = settings.parsed_server_url()?;
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build directory http client")?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("server url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch_body(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<Vec<u8>> {
        let body = request
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?
            .error_for_status()
            .with_context(|| format!("{what} request was rejected"))?
            .bytes()
            .await
            .with_context(|| format!("{what} response body could not be read"))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl DirectoryService for HttpDirectoryService {
    /// A successful response whose body is not JSON (empty, or an HTML page
    /// from a proxy) reads as `null`, which the list normalizes to no rows.
    async fn list_employees(&self, filter: &FilterCriteria) -> Result<Value> {
        let url = self.endpoint(&["employees"])?;
        let body = self
            .fetch_body(self.http.get(url).query(filter), "employee list")
            .await?;
        Ok(serde_json::from_slice(&body).unwrap_or_else(|err| {
            warn!(
                bytes = body.len(),
                error = %err,
                "directory: employee list body is not JSON; treating as empty"
            );
            Value::Null
        }))
    }

    async fn employee_detail(&self, employee_id: &EmployeeId) -> Result<Value> {
        let url = self.endpoint(&["employees", employee_id.as_str()])?;
        let body = self.fetch_body(self.http.get(url), "employee detail").await?;
        serde_json::from_slice(&body).map_err(|err| {
            anyhow::Error::from(ApiException::malformed(format!(
                "employee detail response is not valid JSON: {err}"
            )))
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
