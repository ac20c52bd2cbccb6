//! Drag-and-drop surface of the pipeline board.
//!
//! Gesture capture lives outside this crate; it only reports which card was
//! dragged, from which column, and what it was released over.

use std::sync::Arc;

use shared::domain::{DossierId, Status};
use tracing::debug;

use crate::{
    error::SyncError,
    pipeline::Pipeline,
    sync::{PendingTransition, SyncController},
};

const DROPPABLE_PREFIX: &str = "droppable-";

/// Droppable identifier of a status column, as exposed to gesture capture.
pub fn droppable_id(status: Status) -> String {
    format!("{DROPPABLE_PREFIX}{status}")
}

/// What a card was released over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Column(Status),
    /// Another card; the drop lands in that card's column.
    Card(DossierId),
}

impl DropTarget {
    /// Reads a droppable identifier. Column identifiers carry a known status;
    /// anything else is taken as a card id.
    pub fn parse(raw: &str) -> Self {
        raw.strip_prefix(DROPPABLE_PREFIX)
            .and_then(|status| status.parse().ok())
            .map(DropTarget::Column)
            .unwrap_or_else(|| DropTarget::Card(DossierId::from(raw)))
    }

    fn resolve(&self, pipeline: &Pipeline) -> Option<Status> {
        match self {
            DropTarget::Column(status) => Some(*status),
            DropTarget::Card(dossier_id) => pipeline.status_of(dossier_id),
        }
    }
}

/// A completed drag. `target` is `None` when the card was released outside
/// every droppable area or the drag was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragGesture {
    pub card: DossierId,
    pub source: Status,
    pub target: Option<DropTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub dossier_id: DossierId,
    pub from_status: Status,
    pub to_status: Status,
}

/// At most one request per gesture; same-column drops yield none.
pub fn gesture_to_request(
    gesture: &DragGesture,
    pipeline: &Pipeline,
) -> Option<TransitionRequest> {
    let to_status = gesture.target.as_ref()?.resolve(pipeline)?;
    if to_status == gesture.source {
        return None;
    }
    Some(TransitionRequest {
        dossier_id: gesture.card.clone(),
        from_status: gesture.source,
        to_status,
    })
}

#[must_use]
pub enum DropOutcome {
    Ignored,
    Requested(PendingTransition),
}

impl DropOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, DropOutcome::Ignored)
    }
}

/// Board view bound to a controller.
#[derive(Clone)]
pub struct Board {
    controller: Arc<SyncController>,
}

impl Board {
    pub fn new(controller: Arc<SyncController>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &Arc<SyncController> {
        &self.controller
    }

    pub async fn pipeline(&self) -> Pipeline {
        self.controller.pipeline().await
    }

    pub async fn on_drag_end(&self, gesture: DragGesture) -> Result<DropOutcome, SyncError> {
        let pipeline = self.controller.pipeline().await;
        let Some(request) = gesture_to_request(&gesture, &pipeline) else {
            debug!(
                dossier_id = %gesture.card,
                source = %gesture.source,
                target = ?gesture.target,
                "board: drop ignored"
            );
            return Ok(DropOutcome::Ignored);
        };

        let pending = self
            .controller
            .request_transition(&request.dossier_id, request.to_status)
            .await?;
        Ok(DropOutcome::Requested(pending))
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
