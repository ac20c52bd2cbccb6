use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use shared::domain::{Dossier, NewDossier};

use crate::{
    pipeline::partition,
    store::{CaseStore, StoreError},
};

fn dossier(id: &str, status: Status) -> Dossier {
    Dossier {
        id: DossierId::from(id),
        alternant_id: "alt".into(),
        entreprise_id: "ent".into(),
        tuteur_id: "tut".into(),
        alternant: None,
        entreprise: None,
        tuteur: None,
        status,
        date_debut: NaiveDate::from_ymd_opt(2025, 9, 1).expect("date"),
        date_fin: NaiveDate::from_ymd_opt(2026, 8, 31).expect("date"),
        commentaires: String::new(),
        created_at: Utc::now(),
    }
}

fn board_pipeline() -> Pipeline {
    partition(&[
        dossier("1", Status::Request),
        dossier("2", Status::Created),
        dossier("3", Status::Processing),
    ])
}

fn drag(card: &str, source: Status, target: Option<&str>) -> DragGesture {
    DragGesture {
        card: DossierId::from(card),
        source,
        target: target.map(DropTarget::parse),
    }
}

#[test]
fn droppable_ids_parse_back_to_columns() {
    for status in Status::ALL {
        assert_eq!(
            DropTarget::parse(&droppable_id(status)),
            DropTarget::Column(status)
        );
    }
    assert_eq!(
        DropTarget::parse("droppable-UNKNOWN"),
        DropTarget::Card(DossierId::from("droppable-UNKNOWN"))
    );
    assert_eq!(DropTarget::parse("2"), DropTarget::Card(DossierId::from("2")));
}

#[test]
fn drop_on_other_column_yields_one_request() {
    let request = gesture_to_request(
        &drag("1", Status::Request, Some("droppable-VERIFICATION")),
        &board_pipeline(),
    );
    assert_eq!(
        request,
        Some(TransitionRequest {
            dossier_id: DossierId::from("1"),
            from_status: Status::Request,
            to_status: Status::Verification,
        })
    );
}

#[test]
fn drop_on_card_uses_that_cards_column() {
    let request =
        gesture_to_request(&drag("1", Status::Request, Some("3")), &board_pipeline())
            .expect("request");
    assert_eq!(request.to_status, Status::Processing);
}

#[test]
fn same_column_drop_yields_no_request() {
    let pipeline = board_pipeline();
    assert_eq!(
        gesture_to_request(
            &drag("2", Status::Created, Some("droppable-CREATED")),
            &pipeline
        ),
        None
    );
    assert_eq!(
        gesture_to_request(&drag("1", Status::Request, Some("1")), &pipeline),
        None
    );
}

#[test]
fn cancelled_or_invalid_drops_yield_no_request() {
    let pipeline = board_pipeline();
    assert_eq!(
        gesture_to_request(&drag("1", Status::Request, None), &pipeline),
        None
    );
    assert_eq!(
        gesture_to_request(
            &drag("1", Status::Request, Some("droppable-ARCHIVED")),
            &pipeline
        ),
        None
    );
    assert_eq!(
        gesture_to_request(
            &drag("1", Status::Request, Some("no-such-card")),
            &pipeline
        ),
        None
    );
}

#[derive(Default)]
struct CountingStore {
    updates: AtomicUsize,
}

#[async_trait]
impl CaseStore for CountingStore {
    async fn list(&self) -> Result<Vec<Dossier>, StoreError> {
        Ok(vec![
            dossier("1", Status::Request),
            dossier("2", Status::Created),
        ])
    }

    async fn update_status(
        &self,
        dossier_id: &DossierId,
        status: Status,
    ) -> Result<Dossier, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(dossier(dossier_id.as_str(), status))
    }

    async fn create(&self, _new: &NewDossier) -> Result<Dossier, StoreError> {
        Err(StoreError::Unavailable("read-only".to_string()))
    }

    async fn delete(&self, _dossier_id: &DossierId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only".to_string()))
    }
}

async fn loaded_board() -> (Board, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    let controller = SyncController::new(store.clone());
    controller.load().await.expect("load");
    (Board::new(controller), store)
}

#[tokio::test]
async fn same_column_drop_issues_zero_requests() {
    let (board, store) = loaded_board().await;

    let outcome = board
        .on_drag_end(drag("2", Status::Created, Some("droppable-CREATED")))
        .await
        .expect("drop");

    assert!(outcome.is_ignored());
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_drag_has_no_effect() {
    let (board, store) = loaded_board().await;
    let before = board.pipeline().await;

    let outcome = board
        .on_drag_end(drag("1", Status::Request, None))
        .await
        .expect("drop");

    assert!(outcome.is_ignored());
    assert_eq!(board.pipeline().await, before);
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cross_column_drop_forwards_one_transition() {
    let (board, store) = loaded_board().await;

    let outcome = board
        .on_drag_end(drag("1", Status::Request, Some("droppable-PROCESSING")))
        .await
        .expect("drop");

    let DropOutcome::Requested(pending) = outcome else {
        panic!("drop should have been forwarded");
    };
    assert_eq!(pending.to_status(), Status::Processing);
    pending.settled().await.expect("settled");
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
    assert_eq!(
        board.pipeline().await.status_of(&DossierId::from("1")),
        Some(Status::Processing)
    );
}
