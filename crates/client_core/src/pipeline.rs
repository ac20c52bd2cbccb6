//! Dossier pipeline: the four status columns and the transition rule.
//!
//! Every status is reachable from every other in one step, so the state
//! machine reduces to "replace the status". The projection is a pure
//! function of the dossier collection and is rebuilt after each change.

use shared::domain::{Dossier, DossierId, Status};

/// One board column: a status and its dossiers in collection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub status: Status,
    pub dossiers: Vec<Dossier>,
}

impl Column {
    pub fn title(&self) -> &'static str {
        self.status.label()
    }

    pub fn len(&self) -> usize {
        self.dossiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dossiers.is_empty()
    }

    pub fn contains(&self, dossier_id: &DossierId) -> bool {
        self.dossiers.iter().any(|d| &d.id == dossier_id)
    }
}

/// Partition of a dossier collection into the four status columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    columns: [Column; 4],
}

impl Pipeline {
    pub fn column(&self, status: Status) -> &Column {
        &self.columns[status.column_index()]
    }

    pub fn dossiers(&self, status: Status) -> &[Dossier] {
        &self.column(status).dossiers
    }

    /// Columns in board order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn counts(&self) -> [(Status, usize); 4] {
        Status::ALL.map(|status| (status, self.column(status).len()))
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(Column::len).sum()
    }

    /// Column currently holding `dossier_id`.
    pub fn status_of(&self, dossier_id: &DossierId) -> Option<Status> {
        self.columns
            .iter()
            .find(|column| column.contains(dossier_id))
            .map(|column| column.status)
    }
}

/// Groups `dossiers` by status, keeping their relative order.
pub fn partition<'a, I>(dossiers: I) -> Pipeline
where
    I: IntoIterator<Item = &'a Dossier>,
{
    let mut columns = Status::ALL.map(|status| Column {
        status,
        dossiers: Vec::new(),
    });
    for dossier in dossiers {
        columns[dossier.status.column_index()]
            .dossiers
            .push(dossier.clone());
    }
    Pipeline { columns }
}

/// Copy of `dossier` moved to `to_status`; every other field is untouched.
pub fn transition(dossier: &Dossier, to_status: Status) -> Dossier {
    Dossier {
        status: to_status,
        ..dossier.clone()
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
