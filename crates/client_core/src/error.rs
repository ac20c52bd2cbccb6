use shared::domain::{DossierId, InvalidStatus};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Rejected at the boundary; nothing local or remote was touched.
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),
    /// The id is absent from the local collection; nothing was touched.
    #[error("dossier {0} is not in the local collection")]
    NotFound(DossierId),
    /// The remote call failed after any optimistic change was applied.
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("transition task for dossier {dossier_id} ended abnormally: {reason}")]
    Aborted { dossier_id: DossierId, reason: String },
}

impl SyncError {
    /// Local errors are raised before any mutation or remote call.
    pub fn is_local(&self) -> bool {
        matches!(self, SyncError::InvalidStatus(_) | SyncError::NotFound(_))
    }
}
