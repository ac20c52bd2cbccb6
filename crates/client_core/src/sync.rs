//! Optimistic synchronisation between the local dossier collection and the
//! remote case store.
//!
//! A transition is applied to the local collection before the remote call is
//! issued. When the store confirms, its record is merged back; when it fails
//! or times out, the whole collection is reloaded from the store so the board
//! converges on ground truth. Requests are never retried automatically.

use std::{future::Future, sync::Arc, time::Duration};

use shared::domain::{Dossier, DossierId, NewDossier, Status};
use tokio::{
    sync::{broadcast, RwLock},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    error::SyncError,
    pipeline::{partition, transition, Pipeline},
    store::{CaseStore, StoreError},
};

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Upper bound on every case store call; expiry counts as a failure.
    pub remote_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }
}

/// Notifications for the operator; every error path produces one.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Reloaded {
        count: usize,
    },
    TransitionApplied {
        dossier_id: DossierId,
        from: Status,
        to: Status,
    },
    TransitionConfirmed {
        dossier: Dossier,
    },
    TransitionRolledBack {
        dossier_id: DossierId,
        attempted: Status,
        reason: String,
    },
    DossierCreated {
        dossier: Dossier,
    },
    DossierDeleted {
        dossier_id: DossierId,
    },
    Error(String),
}

/// Owner of the local dossier collection.
///
/// All mutation goes through this type; readers receive clones.
pub struct SyncController {
    store: Arc<dyn CaseStore>,
    config: SyncConfig,
    dossiers: RwLock<Vec<Dossier>>,
    events: broadcast::Sender<SyncEvent>,
}

/// Handle on an issued transition.
///
/// The optimistic change is already visible when this is returned; awaiting
/// [`PendingTransition::settled`] yields the remote outcome.
#[must_use = "the remote outcome is only observable through `settled`"]
pub struct PendingTransition {
    dossier_id: DossierId,
    from: Status,
    to: Status,
    outcome: PendingOutcome,
}

enum PendingOutcome {
    Unchanged(Dossier),
    Remote(JoinHandle<Result<Dossier, SyncError>>),
}

impl PendingTransition {
    pub fn dossier_id(&self) -> &DossierId {
        &self.dossier_id
    }

    pub fn from_status(&self) -> Status {
        self.from
    }

    pub fn to_status(&self) -> Status {
        self.to
    }

    /// True when no remote call was issued because the status was unchanged.
    pub fn is_noop(&self) -> bool {
        matches!(self.outcome, PendingOutcome::Unchanged(_))
    }

    pub async fn settled(self) -> Result<Dossier, SyncError> {
        match self.outcome {
            PendingOutcome::Unchanged(dossier) => Ok(dossier),
            PendingOutcome::Remote(handle) => match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(SyncError::Aborted {
                    dossier_id: self.dossier_id,
                    reason: join_err.to_string(),
                }),
            },
        }
    }
}

impl SyncController {
    pub fn new(store: Arc<dyn CaseStore>) -> Arc<Self> {
        Self::with_config(store, SyncConfig::default())
    }

    pub fn with_config(store: Arc<dyn CaseStore>, config: SyncConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            store,
            config,
            dossiers: RwLock::new(Vec::new()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    /// Replaces the local collection with the store's current list.
    pub async fn load(&self) -> Result<usize, SyncError> {
        match self.reload().await {
            Ok(count) => Ok(count),
            Err(err) => {
                let _ = self
                    .events
                    .send(SyncEvent::Error(format!("loading dossiers failed: {err}")));
                Err(err.into())
            }
        }
    }

    pub async fn snapshot(&self) -> Vec<Dossier> {
        self.dossiers.read().await.clone()
    }

    pub async fn get(&self, dossier_id: &DossierId) -> Option<Dossier> {
        self.dossiers
            .read()
            .await
            .iter()
            .find(|d| &d.id == dossier_id)
            .cloned()
    }

    /// Board projection of the current collection.
    pub async fn pipeline(&self) -> Pipeline {
        partition(self.dossiers.read().await.iter())
    }

    /// Moves `dossier_id` to `to_status`.
    ///
    /// The local collection reflects the new status before this returns. An
    /// unknown id fails with [`SyncError::NotFound`] without touching
    /// anything; a transition to the current status settles immediately
    /// without a remote call.
    pub async fn request_transition(
        self: &Arc<Self>,
        dossier_id: &DossierId,
        to_status: Status,
    ) -> Result<PendingTransition, SyncError> {
        let (previous, optimistic) = {
            let mut dossiers = self.dossiers.write().await;
            let Some(slot) = dossiers.iter_mut().find(|d| &d.id == dossier_id) else {
                debug!(dossier_id = %dossier_id, "pipeline: transition for unknown dossier");
                return Err(SyncError::NotFound(dossier_id.clone()));
            };

            if slot.status == to_status {
                debug!(
                    dossier_id = %dossier_id,
                    status = %to_status,
                    "pipeline: transition to current status skipped"
                );
                return Ok(PendingTransition {
                    dossier_id: dossier_id.clone(),
                    from: to_status,
                    to: to_status,
                    outcome: PendingOutcome::Unchanged(slot.clone()),
                });
            }

            let previous = slot.clone();
            *slot = transition(&previous, to_status);
            (previous, slot.clone())
        };

        info!(
            dossier_id = %dossier_id,
            from = %previous.status,
            to = %to_status,
            "pipeline: transition applied optimistically"
        );
        let _ = self.events.send(SyncEvent::TransitionApplied {
            dossier_id: dossier_id.clone(),
            from: previous.status,
            to: to_status,
        });

        let from = previous.status;
        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move { controller.settle(previous, optimistic).await });

        Ok(PendingTransition {
            dossier_id: dossier_id.clone(),
            from,
            to: to_status,
            outcome: PendingOutcome::Remote(handle),
        })
    }

    /// [`request_transition`](Self::request_transition) for a status named as
    /// on the wire. An unknown name fails before anything is touched.
    pub async fn request_transition_named(
        self: &Arc<Self>,
        dossier_id: &DossierId,
        to_status: &str,
    ) -> Result<PendingTransition, SyncError> {
        let to_status = to_status.parse::<Status>()?;
        self.request_transition(dossier_id, to_status).await
    }

    /// Issues a transition and waits for the store's answer.
    pub async fn transition_and_settle(
        self: &Arc<Self>,
        dossier_id: &DossierId,
        to_status: Status,
    ) -> Result<Dossier, SyncError> {
        self.request_transition(dossier_id, to_status)
            .await?
            .settled()
            .await
    }

    /// Creates a dossier in the store, then reloads the collection.
    pub async fn create_dossier(&self, new: &NewDossier) -> Result<Dossier, SyncError> {
        let created = match self.remote(self.store.create(new)).await {
            Ok(created) => created,
            Err(err) => {
                let _ = self
                    .events
                    .send(SyncEvent::Error(format!("creating dossier failed: {err}")));
                return Err(err.into());
            }
        };
        info!(dossier_id = %created.id, "pipeline: dossier created");

        if let Err(err) = self.reload().await {
            warn!(
                dossier_id = %created.id,
                error = %err,
                "pipeline: reload after create failed; appending created record"
            );
            let mut dossiers = self.dossiers.write().await;
            if !dossiers.iter().any(|d| d.id == created.id) {
                dossiers.push(created.clone());
            }
        }

        let _ = self.events.send(SyncEvent::DossierCreated {
            dossier: created.clone(),
        });
        Ok(created)
    }

    /// Deletes a dossier in the store, then drops it from the collection.
    pub async fn delete_dossier(&self, dossier_id: &DossierId) -> Result<(), SyncError> {
        if self.get(dossier_id).await.is_none() {
            return Err(SyncError::NotFound(dossier_id.clone()));
        }

        if let Err(err) = self.remote(self.store.delete(dossier_id)).await {
            let _ = self.events.send(SyncEvent::Error(format!(
                "deleting dossier {dossier_id} failed: {err}"
            )));
            if err.is_not_found() {
                // Gone remotely already; converge instead of keeping a ghost card.
                if let Err(reload_err) = self.reload().await {
                    warn!(error = %reload_err, "pipeline: reload after failed delete failed");
                }
            }
            return Err(err.into());
        }

        self.dossiers.write().await.retain(|d| &d.id != dossier_id);
        info!(dossier_id = %dossier_id, "pipeline: dossier deleted");
        let _ = self.events.send(SyncEvent::DossierDeleted {
            dossier_id: dossier_id.clone(),
        });
        Ok(())
    }

    async fn settle(&self, previous: Dossier, optimistic: Dossier) -> Result<Dossier, SyncError> {
        let dossier_id = previous.id.clone();
        let to_status = optimistic.status;
        match self
            .remote(self.store.update_status(&dossier_id, to_status))
            .await
        {
            Ok(confirmed) => {
                let merged = self.merge_confirmed(confirmed, to_status).await;
                info!(
                    dossier_id = %dossier_id,
                    status = %to_status,
                    "pipeline: transition confirmed"
                );
                let _ = self.events.send(SyncEvent::TransitionConfirmed {
                    dossier: merged.clone(),
                });
                Ok(merged)
            }
            Err(err) => {
                warn!(
                    dossier_id = %dossier_id,
                    attempted = %to_status,
                    error = %err,
                    "pipeline: transition failed; reloading from store"
                );
                if let Err(reload_err) = self.reload().await {
                    warn!(
                        dossier_id = %dossier_id,
                        error = %reload_err,
                        "pipeline: reload failed; restoring pre-transition record"
                    );
                    // Only undo our own optimistic write; a later transition
                    // or reload owns the slot otherwise.
                    let mut dossiers = self.dossiers.write().await;
                    match dossiers.iter_mut().find(|d| d.id == dossier_id) {
                        Some(slot) if *slot == optimistic => *slot = previous,
                        Some(_) => debug!(
                            dossier_id = %dossier_id,
                            "pipeline: dossier changed since transition; keeping current record"
                        ),
                        None => {}
                    }
                }
                let _ = self.events.send(SyncEvent::TransitionRolledBack {
                    dossier_id,
                    attempted: to_status,
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Takes the store's record, keeping the status the client sent and any
    /// party summary the store left out. A dossier that left the collection
    /// in the meantime is not re-inserted.
    async fn merge_confirmed(&self, confirmed: Dossier, sent_status: Status) -> Dossier {
        let mut dossiers = self.dossiers.write().await;
        let Some(slot) = dossiers.iter_mut().find(|d| d.id == confirmed.id) else {
            debug!(dossier_id = %confirmed.id, "pipeline: confirmed dossier no longer local");
            return Dossier {
                status: sent_status,
                ..confirmed
            };
        };

        let merged = Dossier {
            status: sent_status,
            alternant: confirmed.alternant.or_else(|| slot.alternant.take()),
            entreprise: confirmed.entreprise.or_else(|| slot.entreprise.take()),
            tuteur: confirmed.tuteur.or_else(|| slot.tuteur.take()),
            ..confirmed
        };
        *slot = merged.clone();
        merged
    }

    async fn reload(&self) -> Result<usize, StoreError> {
        let fresh = self.remote(self.store.list()).await?;
        let count = fresh.len();
        *self.dossiers.write().await = fresh;
        debug!(count, "pipeline: collection reloaded");
        let _ = self.events.send(SyncEvent::Reloaded { count });
        Ok(count)
    }

    async fn remote<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.config.remote_timeout)),
        }
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
