//! Asynchronous request pipeline between the editor and a [`MarkerBackend`].
//!
//! Every submission returns immediately. Marker mutations go to a worker
//! task owned by the marker's key, so requests for one marker are applied
//! in issue order while different markers proceed in parallel. Layer,
//! calibration and list requests share a single ordered worker.
//!
//! Each submitted request produces exactly one [`Outcome`]. The gateway
//! counts requests in flight so the owner can tell when it has caught up.

use floorplan_core::{CalibrationLine, Layer, LayerId, Marker, MarkerId, PersistenceError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::backend::{BackendResult, MarkerBackend};

/// Which marker mutation an outcome refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

/// Completion of one gateway request
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The service stored a new marker; `marker` is the authoritative record.
    Created { key: MarkerId, marker: Marker },
    /// The service accepted an update; `marker` is the authoritative record.
    Updated { key: MarkerId, marker: Marker },
    Deleted { key: MarkerId, page: u32 },
    MarkerFailed {
        key: MarkerId,
        mutation: MutationKind,
        page: u32,
        error: PersistenceError,
    },
    MarkersLoaded { page: u32, markers: Vec<Marker> },
    CalibrationLoaded {
        page: u32,
        calibration: Option<CalibrationLine>,
    },
    CalibrationSaved(CalibrationLine),
    LayersLoaded(Vec<Layer>),
    LayerCreated(Layer),
    LayerUpdated(Layer),
    LayerDeleted(LayerId),
    /// A non-marker request failed.
    RequestFailed {
        request: Request,
        error: PersistenceError,
    },
}

/// Identifies a non-marker request in a failure outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ListMarkers { page: u32 },
    GetCalibration { page: u32 },
    SaveCalibration { page: u32 },
    ListLayers,
    CreateLayer { name: String },
    UpdateLayer { id: LayerId },
    DeleteLayer { id: LayerId },
    /// The request could not be queued at all
    Queue,
}

impl Request {
    /// Layer mutations whose failure leaves the local layer list suspect.
    pub fn is_layer_mutation(&self) -> bool {
        matches!(
            self,
            Request::CreateLayer { .. } | Request::UpdateLayer { .. } | Request::DeleteLayer { .. }
        )
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::ListMarkers { page } => write!(f, "loading markers for page {}", page),
            Request::GetCalibration { page } => write!(f, "loading calibration for page {}", page),
            Request::SaveCalibration { page } => write!(f, "saving calibration for page {}", page),
            Request::ListLayers => write!(f, "loading layers"),
            Request::CreateLayer { name } => write!(f, "creating layer '{}'", name),
            Request::UpdateLayer { id } => write!(f, "updating layer {}", id),
            Request::DeleteLayer { id } => write!(f, "deleting layer {}", id),
            Request::Queue => write!(f, "queueing request"),
        }
    }
}

enum MarkerJob {
    Create(Marker),
    Update(Marker),
    Delete {
        page: u32,
        remote_id: Option<i64>,
    },
}

enum GeneralJob {
    ListMarkers(u32),
    GetCalibration(u32),
    SaveCalibration(CalibrationLine),
    ListLayers,
    CreateLayer(Layer),
    UpdateLayer(Layer),
    DeleteLayer(LayerId),
}

/// Runs `request` under the gateway timeout.
async fn bounded<T>(
    timeout: Duration,
    request: impl Future<Output = BackendResult<T>>,
) -> BackendResult<T> {
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(PersistenceError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Per-key worker loop. Remembers the server id once the create succeeds so
/// that updates queued before the owner saw the `Created` outcome still
/// address the right record.
async fn run_marker_queue(
    key: MarkerId,
    backend: Arc<dyn MarkerBackend>,
    timeout: Duration,
    mut jobs: mpsc::UnboundedReceiver<MarkerJob>,
    outcomes: mpsc::UnboundedSender<Outcome>,
) {
    let mut remote_id: Option<i64> = None;

    while let Some(job) = jobs.recv().await {
        let outcome = match job {
            MarkerJob::Create(marker) => {
                let page = marker.page;
                match bounded(timeout, backend.create_marker(&marker)).await {
                    Ok(stored) => {
                        tracing::debug!("marker {} created as #{:?}", key, stored.remote_id);
                        remote_id = stored.remote_id;
                        Outcome::Created { key, marker: stored }
                    }
                    Err(error) => Outcome::MarkerFailed {
                        key,
                        mutation: MutationKind::Create,
                        page,
                        error,
                    },
                }
            }
            MarkerJob::Update(marker) => {
                let page = marker.page;
                match marker.remote_id.or(remote_id) {
                    Some(id) => match bounded(timeout, backend.update_marker(id, &marker)).await {
                        Ok(stored) => {
                            remote_id = Some(id);
                            Outcome::Updated { key, marker: stored }
                        }
                        Err(error) => Outcome::MarkerFailed {
                            key,
                            mutation: MutationKind::Update,
                            page,
                            error,
                        },
                    },
                    None => Outcome::MarkerFailed {
                        key,
                        mutation: MutationKind::Update,
                        page,
                        error: PersistenceError::NotPersisted {
                            marker: key.to_string(),
                        },
                    },
                }
            }
            MarkerJob::Delete { page, remote_id: id } => match id.or(remote_id) {
                Some(id) => match bounded(timeout, backend.delete_marker(id)).await {
                    Ok(()) => Outcome::Deleted { key, page },
                    Err(error) => Outcome::MarkerFailed {
                        key,
                        mutation: MutationKind::Delete,
                        page,
                        error,
                    },
                },
                // Never reached the service, so there is nothing to remove.
                None => Outcome::Deleted { key, page },
            },
        };

        if let Outcome::MarkerFailed { mutation, error, .. } = &outcome {
            tracing::warn!("marker {} {} failed: {}", key, mutation, error);
        }
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
    tracing::trace!("marker queue {} closed", key);
}

async fn run_general_queue(
    backend: Arc<dyn MarkerBackend>,
    timeout: Duration,
    mut jobs: mpsc::UnboundedReceiver<GeneralJob>,
    outcomes: mpsc::UnboundedSender<Outcome>,
) {
    while let Some(job) = jobs.recv().await {
        let outcome = match job {
            GeneralJob::ListMarkers(page) => {
                match bounded(timeout, backend.list_markers(page)).await {
                    Ok(markers) => Outcome::MarkersLoaded { page, markers },
                    Err(error) => failed(Request::ListMarkers { page }, error),
                }
            }
            GeneralJob::GetCalibration(page) => {
                match bounded(timeout, backend.get_calibration(page)).await {
                    Ok(calibration) => Outcome::CalibrationLoaded { page, calibration },
                    Err(error) => failed(Request::GetCalibration { page }, error),
                }
            }
            GeneralJob::SaveCalibration(calibration) => {
                let page = calibration.page;
                match bounded(timeout, backend.save_calibration(&calibration)).await {
                    Ok(saved) => Outcome::CalibrationSaved(saved),
                    Err(error) => failed(Request::SaveCalibration { page }, error),
                }
            }
            GeneralJob::ListLayers => match bounded(timeout, backend.list_layers()).await {
                Ok(layers) => Outcome::LayersLoaded(layers),
                Err(error) => failed(Request::ListLayers, error),
            },
            GeneralJob::CreateLayer(layer) => {
                match bounded(timeout, backend.create_layer(&layer)).await {
                    Ok(saved) => Outcome::LayerCreated(saved),
                    Err(error) => failed(Request::CreateLayer { name: layer.name }, error),
                }
            }
            GeneralJob::UpdateLayer(layer) => {
                match bounded(timeout, backend.update_layer(&layer)).await {
                    Ok(saved) => Outcome::LayerUpdated(saved),
                    Err(error) => failed(Request::UpdateLayer { id: layer.id }, error),
                }
            }
            GeneralJob::DeleteLayer(id) => match bounded(timeout, backend.delete_layer(id)).await {
                Ok(()) => Outcome::LayerDeleted(id),
                Err(error) => failed(Request::DeleteLayer { id }, error),
            },
        };

        if outcomes.send(outcome).is_err() {
            break;
        }
    }
}

fn failed(request: Request, error: PersistenceError) -> Outcome {
    tracing::warn!("{} failed: {}", request, error);
    Outcome::RequestFailed { request, error }
}

/// Fire-and-forget front end of the storage service.
///
/// Workers are spawned on first use, so the gateway must be used from
/// within a tokio runtime.
pub struct PersistenceGateway {
    backend: Arc<dyn MarkerBackend>,
    timeout: Duration,
    marker_queues: HashMap<MarkerId, mpsc::UnboundedSender<MarkerJob>>,
    general_queue: Option<mpsc::UnboundedSender<GeneralJob>>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
    in_flight: usize,
}

impl PersistenceGateway {
    pub fn new(backend: Arc<dyn MarkerBackend>, timeout: Duration) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            timeout,
            marker_queues: HashMap::new(),
            general_queue: None,
            outcome_tx,
            outcome_rx,
            in_flight: 0,
        }
    }

    pub fn backend(&self) -> &Arc<dyn MarkerBackend> {
        &self.backend
    }

    /// Requests submitted whose outcome has not been taken yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    pub fn create(&mut self, marker: Marker) {
        tracing::debug!("queue create {} ({} on page {})", marker.key, marker.kind, marker.page);
        let key = marker.key;
        self.submit_marker(key, MarkerJob::Create(marker));
    }

    pub fn update(&mut self, marker: Marker) {
        tracing::debug!("queue update {} v{}", marker.key, marker.version);
        let key = marker.key;
        self.submit_marker(key, MarkerJob::Update(marker));
    }

    /// Queues the delete behind any pending request for the marker, then
    /// retires the marker's queue.
    pub fn delete(&mut self, key: MarkerId, page: u32, remote_id: Option<i64>) {
        tracing::debug!("queue delete {}", key);
        self.submit_marker(key, MarkerJob::Delete { page, remote_id });
        self.marker_queues.remove(&key);
    }

    pub fn fetch_markers(&mut self, page: u32) {
        self.submit_general(GeneralJob::ListMarkers(page));
    }

    pub fn fetch_calibration(&mut self, page: u32) {
        self.submit_general(GeneralJob::GetCalibration(page));
    }

    pub fn save_calibration(&mut self, calibration: CalibrationLine) {
        self.submit_general(GeneralJob::SaveCalibration(calibration));
    }

    pub fn fetch_layers(&mut self) {
        self.submit_general(GeneralJob::ListLayers);
    }

    pub fn create_layer(&mut self, layer: Layer) {
        self.submit_general(GeneralJob::CreateLayer(layer));
    }

    pub fn update_layer(&mut self, layer: Layer) {
        self.submit_general(GeneralJob::UpdateLayer(layer));
    }

    pub fn delete_layer(&mut self, id: LayerId) {
        self.submit_general(GeneralJob::DeleteLayer(id));
    }

    /// Next finished outcome, without waiting.
    pub fn try_next(&mut self) -> Option<Outcome> {
        let outcome = self.outcome_rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    /// Waits for the next outcome. Returns `None` once nothing is in flight.
    pub async fn next(&mut self) -> Option<Outcome> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.outcome_rx.recv().await?;
        self.in_flight -= 1;
        Some(outcome)
    }

    fn submit_marker(&mut self, key: MarkerId, job: MarkerJob) {
        let existing = self
            .marker_queues
            .get(&key)
            .filter(|sender| !sender.is_closed())
            .cloned();
        let sender = match existing {
            Some(sender) => sender,
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(run_marker_queue(
                    key,
                    self.backend.clone(),
                    self.timeout,
                    rx,
                    self.outcome_tx.clone(),
                ));
                self.marker_queues.insert(key, tx.clone());
                tx
            }
        };
        if sender.send(job).is_ok() {
            self.in_flight += 1;
        } else {
            tracing::error!("marker queue {} is gone", key);
            self.report_closed(Outcome::RequestFailed {
                request: Request::Queue,
                error: PersistenceError::ChannelClosed,
            });
        }
    }

    fn submit_general(&mut self, job: GeneralJob) {
        let existing = self
            .general_queue
            .as_ref()
            .filter(|sender| !sender.is_closed())
            .cloned();
        let sender = match existing {
            Some(sender) => sender,
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(run_general_queue(
                    self.backend.clone(),
                    self.timeout,
                    rx,
                    self.outcome_tx.clone(),
                ));
                self.general_queue = Some(tx.clone());
                tx
            }
        };
        if sender.send(job).is_ok() {
            self.in_flight += 1;
        } else {
            self.report_closed(Outcome::RequestFailed {
                request: Request::Queue,
                error: PersistenceError::ChannelClosed,
            });
        }
    }

    /// A request that could not be queued still produces an outcome.
    fn report_closed(&mut self, outcome: Outcome) {
        if self.outcome_tx.send(outcome).is_ok() {
            self.in_flight += 1;
        }
    }
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("in_flight", &self.in_flight)
            .field("marker_queues", &self.marker_queues.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}
