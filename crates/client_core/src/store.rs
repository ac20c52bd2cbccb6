//! The case store seam: the remote collection of dossiers the client syncs with.

use std::time::Duration;

use async_trait::async_trait;
use shared::{
    domain::{Dossier, DossierId, NewDossier, Status},
    error::ApiError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("case store unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("case store rejected the request ({status}): {}", error.message)]
    Api { status: u16, error: ApiError },
    #[error("case store did not answer within {0:?}")]
    Timeout(Duration),
    #[error("case store returned an unreadable payload: {0}")]
    Decode(String),
    #[error("case store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Api { status: 404, .. })
    }
}

/// Remote dossier collection.
///
/// Every operation is a single asynchronous unit that either resolves with
/// the described value or fails with a [`StoreError`].
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Every dossier, in store order, with resolved party summaries.
    async fn list(&self) -> Result<Vec<Dossier>, StoreError>;
    async fn update_status(
        &self,
        dossier_id: &DossierId,
        status: Status,
    ) -> Result<Dossier, StoreError>;
    async fn create(&self, new: &NewDossier) -> Result<Dossier, StoreError>;
    async fn delete(&self, dossier_id: &DossierId) -> Result<(), StoreError>;
}
