//! HTTP client for the lead service.

use std::time::Duration;

use nexdoor_core::{Lead, LeadFields, OwnerId};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::error::{ClientInitError, FetchError, LoginError, StoreError};
use super::types::{
    CreateLeadRequest, CreateLeadResponse, ListResponse, LoginRequest, LoginResponse,
    UploadResponse, decode_lead,
};
use super::{ImportBatch, ImportSummary, LeadStore};
use crate::config::LeadsConfig;
use crate::session::SessionUser;

/// Resolved endpoint URLs.
#[derive(Debug, Clone)]
struct Endpoints {
    leads: Url,
    upload: Url,
    login: Url,
}

impl Endpoints {
    fn new(base_url: &Url) -> Result<Self, url::ParseError> {
        // `join` replaces the last path segment unless the base ends in '/'.
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            leads: base.join("leads")?,
            upload: base.join("upload")?,
            login: base.join("login")?,
        })
    }
}

/// Lead service client.
#[derive(Debug, Clone)]
pub struct HttpLeadStore {
    client: Client,
    endpoints: Endpoints,
}

impl HttpLeadStore {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the endpoint URLs
    /// cannot be derived.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ClientInitError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoints: Endpoints::new(base_url)?,
        })
    }

    /// Create a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// See [`HttpLeadStore::new`].
    pub fn from_config(config: &LeadsConfig) -> Result<Self, ClientInitError> {
        Self::new(&config.api_url, config.request_timeout)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::InvalidCredentials`] when the service does not
    /// report success or omits the user record.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionUser, LoginError> {
        let request = LoginRequest {
            email,
            password: password.expose_secret(),
        };

        let response = self
            .client
            .post(self.endpoints.login.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| LoginError::Network(e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| LoginError::Network(e.to_string()))?;

        let result: LoginResponse =
            serde_json::from_slice(&body).map_err(|e| LoginError::Decode(e.to_string()))?;

        let user = match (result.success, result.user) {
            (true, Some(user)) => user,
            _ => {
                warn!("Login refused by lead service");
                return Err(LoginError::InvalidCredentials);
            }
        };

        let user: SessionUser =
            serde_json::from_value(user).map_err(|e| LoginError::Decode(e.to_string()))?;

        debug!(user_id = %user.id, "Signed in");

        Ok(user)
    }

    /// Read a JSON envelope from a write endpoint.
    ///
    /// The service reports rejections as `{ error }`, sometimes with a
    /// success status, so the body is inspected before the status.
    async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let value: serde_json::Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(StoreError::Server {
                    status: status.as_u16(),
                });
            }
            Err(e) => return Err(StoreError::Decode(e.to_string())),
        };

        if let Some(message) = value.get("error").and_then(serde_json::Value::as_str) {
            warn!(%status, error = %message, "Lead service rejected request");
            return Err(StoreError::Rejected(message.to_owned()));
        }

        if !status.is_success() {
            error!(%status, "Lead service error");
            return Err(StoreError::Server {
                status: status.as_u16(),
            });
        }

        serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

impl LeadStore for HttpLeadStore {
    #[instrument(skip(self), fields(owner = %owner))]
    async fn list_leads(&self, owner: &OwnerId) -> Result<Vec<Lead>, FetchError> {
        let mut url = self.endpoints.leads.clone();
        url.query_pairs_mut().append_pair("idd", owner.as_str());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "Lead service error listing leads");
            return Err(FetchError::Server {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let result: ListResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        let records = result.data.unwrap_or_default();
        let total = records.len();
        let leads: Vec<Lead> = records
            .iter()
            .filter_map(|record| match decode_lead(record, owner) {
                Ok(lead) => Some(lead),
                Err(reason) => {
                    warn!(%reason, "Skipping lead record");
                    None
                }
            })
            .collect();

        debug!(total, kept = leads.len(), "Fetched leads");

        Ok(leads)
    }

    #[instrument(skip(self, fields), fields(owner = %owner))]
    async fn create_lead(
        &self,
        fields: &LeadFields,
        owner: &OwnerId,
    ) -> Result<Option<Lead>, StoreError> {
        let request = CreateLeadRequest { fields, idd: owner };

        let response = self
            .client
            .post(self.endpoints.leads.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let result: CreateLeadResponse = Self::read_envelope(response).await?;

        let created = result.data.and_then(|data| match decode_lead(&data, owner) {
            Ok(lead) => Some(lead),
            Err(reason) => {
                debug!(%reason, "Ignoring echoed lead");
                None
            }
        });

        debug!(echoed = created.is_some(), "Lead created");

        Ok(created)
    }

    #[instrument(skip(self, batch), fields(owner = %owner, file = %batch.file_name(), rows = batch.len()))]
    async fn bulk_import(
        &self,
        batch: &ImportBatch,
        owner: &OwnerId,
    ) -> Result<ImportSummary, StoreError> {
        let bytes = batch.to_csv().map_err(|e| StoreError::Encode(e.to_string()))?;

        let file = Part::bytes(bytes)
            .file_name(batch.file_name().to_owned())
            .mime_str("text/csv")
            .map_err(|e| StoreError::Encode(e.to_string()))?;

        let form = Form::new()
            .part("file", file)
            .text("user_id", owner.to_string());

        let response = self
            .client
            .post(self.endpoints.upload.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let result: UploadResponse = Self::read_envelope(response).await?;

        let summary = ImportSummary {
            file: result.file,
            accepted: result.accepted.unwrap_or(batch.len()),
            rejected: result.rejected.unwrap_or(0),
            skipped: 0,
        };

        debug!(
            file = ?summary.file,
            accepted = summary.accepted,
            rejected = summary.rejected,
            "Upload accepted"
        );

        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_from_bare_host() {
        let endpoints = Endpoints::new(&Url::parse("https://leads.example.dev").unwrap()).unwrap();
        assert_eq!(endpoints.leads.as_str(), "https://leads.example.dev/leads");
        assert_eq!(endpoints.upload.as_str(), "https://leads.example.dev/upload");
        assert_eq!(endpoints.login.as_str(), "https://leads.example.dev/login");
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let endpoints =
            Endpoints::new(&Url::parse("http://127.0.0.1:9000/api/v1").unwrap()).unwrap();
        assert_eq!(endpoints.leads.as_str(), "http://127.0.0.1:9000/api/v1/leads");

        let endpoints =
            Endpoints::new(&Url::parse("http://127.0.0.1:9000/api/v1/").unwrap()).unwrap();
        assert_eq!(endpoints.upload.as_str(), "http://127.0.0.1:9000/api/v1/upload");
    }
}
