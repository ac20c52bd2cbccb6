use serde::{Deserialize, Serialize};

use crate::domain::{DossierId, Status};

pub const DOSSIERS_ROUTE: &str = "/dossiers";
pub const ALTERNANTS_ROUTE: &str = "/alternants";
pub const ENTREPRISES_ROUTE: &str = "/entreprises";
pub const TUTEURS_ROUTE: &str = "/tuteurs";

pub fn dossier_route(dossier_id: &DossierId) -> String {
    format!("{DOSSIERS_ROUTE}/{dossier_id}")
}

pub fn dossier_status_route(dossier_id: &DossierId) -> String {
    format!("{DOSSIERS_ROUTE}/{dossier_id}/status")
}

/// Body of `PATCH /dossiers/:id/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Status,
}
