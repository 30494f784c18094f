//! High-level pipeline: roster → clients → remote upload.
//!
//! This module drives every accepted client through the three remote steps
//! exposed by a [`Connector`]:
//!   1. resolve the remote account id from the roster id
//!   2. upload the image into the account's file storage
//!   3. bind the uploaded file as the account's avatar
//!
//! A client stops at its first failing step and is reported as skipped; the
//! next client is processed regardless. Clients are handled one at a time, in
//! roster order.
//!
//! # Run-level failures
//! [`synchronise`] only gives up on the whole run when no client could be built
//! or when the connector cannot be established. Nothing is retried.

use std::future::Future;
use std::path::Path;

use tracing::{error, info};

use crate::clients::build_clients;
use crate::contract::{
    Client, ConnectError, Connector, RemoteId, RosterRecord, SkippedRecord, UploadOutcome,
};

/// User-facing progress events, delivered as the run advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    ClientCreated {
        external_id: String,
        image_name: String,
    },
    ClientsBuilt {
        accepted: usize,
        skipped: usize,
    },
    ClientFinished {
        done: usize,
        total: usize,
        external_id: String,
        outcome: UploadOutcome,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SynchroniseError {
    #[error("no users were created ({skipped} roster records skipped)")]
    NoClients { skipped: usize },
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientReport {
    pub external_id: String,
    pub remote_id: Option<RemoteId>,
    pub outcome: UploadOutcome,
}

/// Everything that happened during one run.
#[derive(Debug, Default)]
pub struct SynchroniseReport {
    pub skipped_records: Vec<SkippedRecord>,
    pub clients: Vec<ClientReport>,
}

impl SynchroniseReport {
    pub fn uploaded(&self) -> usize {
        self.clients.iter().filter(|c| c.outcome.is_success()).count()
    }

    /// Roster records and clients that were skipped without an error.
    pub fn skipped(&self) -> usize {
        self.skipped_records.len()
            + self
                .clients
                .iter()
                .filter(|c| {
                    matches!(
                        c.outcome,
                        UploadOutcome::SkippedIdNotFound | UploadOutcome::SkippedUploadFailed
                    )
                })
                .count()
    }

    pub fn failed(&self) -> usize {
        self.clients
            .iter()
            .filter(|c| c.outcome == UploadOutcome::FailedAvatarSet)
            .count()
    }
}

/// Runs the three remote steps for one client, stopping at the first failure.
pub async fn process_client<C>(connector: &C, client: &mut Client) -> UploadOutcome
where
    C: Connector + ?Sized,
{
    if !connector.resolve_remote_id(client).await {
        info!(client_id = %client.external_id(), "Skipping user, id not found");
        return UploadOutcome::SkippedIdNotFound;
    }

    if !connector.upload_file(client).await {
        info!(client = %client, "Skipping user, file not uploaded");
        return UploadOutcome::SkippedUploadFailed;
    }

    if !connector.set_avatar(client).await {
        error!(client = %client, "Error changing profile picture");
        return UploadOutcome::FailedAvatarSet;
    }

    info!(client = %client, image = %client.image().name(), "Avatar set");
    UploadOutcome::AvatarSet
}

/// Processes every client in order and reports progress after each one.
pub async fn upload_all<C, P>(
    connector: &C,
    clients: &mut [Client],
    mut on_progress: P,
) -> Vec<ClientReport>
where
    C: Connector + ?Sized,
    P: FnMut(Progress),
{
    let total = clients.len();
    let mut reports = Vec::with_capacity(total);

    for (index, client) in clients.iter_mut().enumerate() {
        let outcome = process_client(connector, client).await;
        let done = index + 1;
        info!(done, total, ?outcome, "Finished {} of {} users", done, total);
        on_progress(Progress::ClientFinished {
            done,
            total,
            external_id: client.external_id().to_string(),
            outcome,
        });
        reports.push(ClientReport {
            external_id: client.external_id().to_string(),
            remote_id: client.remote_id(),
            outcome,
        });
    }

    reports
}

/// Builds clients from the roster and uploads them through the connector
/// produced by `connect`.
///
/// `connect` is only invoked once at least one client exists; a failed
/// connection ends the run before any client is processed.
pub async fn synchronise<C, F, Fut, P>(
    records: &[RosterRecord],
    images_dir: &Path,
    connect: F,
    mut on_progress: P,
) -> Result<SynchroniseReport, SynchroniseError>
where
    C: Connector,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<C, ConnectError>>,
    P: FnMut(Progress),
{
    info!(records = records.len(), "[SYNC] Starting client generation");
    let batch = build_clients(records, images_dir);

    for client in &batch.accepted {
        on_progress(Progress::ClientCreated {
            external_id: client.external_id().to_string(),
            image_name: client.image().name().to_string(),
        });
    }
    on_progress(Progress::ClientsBuilt {
        accepted: batch.accepted.len(),
        skipped: batch.skipped_count(),
    });

    if batch.accepted.is_empty() {
        error!(skipped = batch.skipped_count(), "[SYNC] No users were created");
        return Err(SynchroniseError::NoClients {
            skipped: batch.skipped_count(),
        });
    }

    info!(
        accepted = batch.accepted.len(),
        "[SYNC] All possible users have been created, connecting"
    );
    let connector = match connect().await {
        Ok(connector) => connector,
        Err(e) => {
            error!(error = %e, "[SYNC] Error connecting to remote service");
            return Err(e.into());
        }
    };
    info!("[SYNC] Connection established, commencing upload");

    let mut clients = batch.accepted;
    let reports = upload_all(&connector, &mut clients, &mut on_progress).await;

    Ok(SynchroniseReport {
        skipped_records: batch.skipped,
        clients: reports,
    })
}
