use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{
        Alternant, Dossier, DossierId, Entreprise, NewAlternant, NewDossier, NewEntreprise,
        NewTuteur, Status, Tuteur,
    },
    error::{ApiError, ErrorCode},
    protocol::{
        dossier_route, dossier_status_route, UpdateStatusRequest, ALTERNANTS_ROUTE,
        DOSSIERS_ROUTE, ENTREPRISES_ROUTE, TUTEURS_ROUTE,
    },
};
use tracing::debug;
use url::Url;

use crate::store::{CaseStore, StoreError};

/// [`CaseStore`] over the case store's JSON HTTP API.
#[derive(Clone)]
pub struct HttpCaseStore {
    http: Client,
    base_url: Url,
}

impl HttpCaseStore {
    pub fn new(server_url: &str) -> Result<Self, url::ParseError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(server_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(route.trim_start_matches('/'))
            .map_err(|e| StoreError::Unavailable(format!("invalid route {route}: {e}")))
    }

    pub async fn list_alternants(&self) -> Result<Vec<Alternant>, StoreError> {
        let response = self.http.get(self.endpoint(ALTERNANTS_ROUTE)?).send().await?;
        decode(response).await
    }

    pub async fn create_alternant(&self, new: &NewAlternant) -> Result<Alternant, StoreError> {
        let response = self
            .http
            .post(self.endpoint(ALTERNANTS_ROUTE)?)
            .json(new)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn list_entreprises(&self) -> Result<Vec<Entreprise>, StoreError> {
        let response = self
            .http
            .get(self.endpoint(ENTREPRISES_ROUTE)?)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn create_entreprise(&self, new: &NewEntreprise) -> Result<Entreprise, StoreError> {
        let response = self
            .http
            .post(self.endpoint(ENTREPRISES_ROUTE)?)
            .json(new)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn list_tuteurs(&self) -> Result<Vec<Tuteur>, StoreError> {
        let response = self.http.get(self.endpoint(TUTEURS_ROUTE)?).send().await?;
        decode(response).await
    }

    pub async fn create_tuteur(&self, new: &NewTuteur) -> Result<Tuteur, StoreError> {
        let response = self
            .http
            .post(self.endpoint(TUTEURS_ROUTE)?)
            .json(new)
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl CaseStore for HttpCaseStore {
    async fn list(&self) -> Result<Vec<Dossier>, StoreError> {
        let response = self.http.get(self.endpoint(DOSSIERS_ROUTE)?).send().await?;
        let dossiers: Vec<Dossier> = decode(response).await?;
        debug!(count = dossiers.len(), "store: dossiers listed");
        Ok(dossiers)
    }

    async fn update_status(
        &self,
        dossier_id: &DossierId,
        status: Status,
    ) -> Result<Dossier, StoreError> {
        let response = self
            .http
            .patch(self.endpoint(&dossier_status_route(dossier_id))?)
            .json(&UpdateStatusRequest { status })
            .send()
            .await?;
        decode(response).await
    }

    async fn create(&self, new: &NewDossier) -> Result<Dossier, StoreError> {
        let response = self
            .http
            .post(self.endpoint(DOSSIERS_ROUTE)?)
            .json(new)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete(&self, dossier_id: &DossierId) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(self.endpoint(&dossier_route(dossier_id))?)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let error = serde_json::from_str::<ApiError>(&body)
        .unwrap_or_else(|_| ApiError::new(fallback_code(status), body.trim()));
    Err(StoreError::Api {
        status: status.as_u16(),
        error,
    })
}

fn fallback_code(status: StatusCode) -> ErrorCode {
    match status {
        StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
        StatusCode::FORBIDDEN => ErrorCode::Forbidden,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::CONFLICT => ErrorCode::Conflict,
        s if s.is_client_error() => ErrorCode::Validation,
        _ => ErrorCode::Internal,
    }
}

#[cfg(test)]
#[path = "tests/http_store_tests.rs"]
mod tests;
