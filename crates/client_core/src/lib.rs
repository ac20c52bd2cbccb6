//! Client side of the dossier pipeline: the case store seam, the board
//! projection and the optimistic sync controller.

pub mod board;
pub mod error;
pub mod http_store;
pub mod pipeline;
pub mod query;
pub mod store;
pub mod sync;

pub use board::{
    gesture_to_request, Board, DragGesture, DropOutcome, DropTarget, TransitionRequest,
};
pub use error::SyncError;
pub use http_store::HttpCaseStore;
pub use pipeline::{partition, transition, Column, Pipeline};
pub use query::{DossierFilter, SortOrder};
pub use store::{CaseStore, StoreError};
pub use sync::{PendingTransition, SyncConfig, SyncController, SyncEvent};
