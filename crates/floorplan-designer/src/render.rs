//! Asynchronous page rendering with supersession.
//!
//! Every request bumps a generation counter. Renders run on the blocking
//! pool and check their [`RenderToken`] between stages; a result whose
//! generation is no longer the latest is dropped, so a slow stale render
//! can never replace newer content. Cancellation is never reported as a
//! failure.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use floorplan_core::{AppEvent, EventBus, RenderError, RenderEvent};
use tokio::sync::mpsc;

use crate::document::{Document, RenderToken, RenderedPage};

type RenderResult = (u64, u32, Result<RenderedPage, RenderError>);

/// Issues renders for one document and filters their results.
pub struct RenderScheduler {
    document: Arc<Document>,
    latest: Arc<AtomicU64>,
    results_tx: mpsc::UnboundedSender<RenderResult>,
    results_rx: mpsc::UnboundedReceiver<RenderResult>,
    outstanding: usize,
    bus: Arc<EventBus>,
}

impl RenderScheduler {
    pub fn new(document: Arc<Document>, bus: Arc<EventBus>) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            document,
            latest: Arc::new(AtomicU64::new(0)),
            results_tx,
            results_rx,
            outstanding: 0,
            bus,
        }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    /// Starts rendering `page` at `scale`, superseding any earlier request.
    pub fn request(&mut self, page: u32, scale: f64) -> RenderToken {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        let token = RenderToken::new(generation, self.latest.clone());
        tracing::debug!("render #{} page {} at {:.2}x", generation, page, scale);

        let document = self.document.clone();
        let worker_token = token.clone();
        let tx = self.results_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = document.render_page(page, scale, &worker_token);
            let _ = tx.send((generation, page, result));
        });
        self.outstanding += 1;
        token
    }

    /// Supersedes every in-flight render without starting a new one.
    pub fn cancel(&mut self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }

    /// Renders still running, including superseded ones.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Takes finished renders without waiting and returns the current one, if
    /// it has arrived.
    pub fn poll(&mut self) -> Option<RenderedPage> {
        let mut current = None;
        while let Ok(result) = self.results_rx.try_recv() {
            self.outstanding = self.outstanding.saturating_sub(1);
            if let Some(page) = self.accept(result) {
                current = Some(page);
            }
        }
        current
    }

    /// Waits for all outstanding renders and returns the current one, if any
    /// succeeded.
    pub async fn settle(&mut self) -> Option<RenderedPage> {
        let mut current = None;
        while self.outstanding > 0 {
            let Some(result) = self.results_rx.recv().await else {
                break;
            };
            self.outstanding -= 1;
            if let Some(page) = self.accept(result) {
                current = Some(page);
            }
        }
        current
    }

    fn accept(&self, (generation, page, result): RenderResult) -> Option<RenderedPage> {
        if generation != self.latest.load(Ordering::Acquire) {
            tracing::trace!("dropping stale render #{}", generation);
            return None;
        }
        match result {
            Ok(rendered) => {
                self.bus.publish(AppEvent::Render(RenderEvent::PageReady {
                    page,
                    scale: rendered.scale,
                    generation,
                }));
                Some(rendered)
            }
            Err(e) if e.is_cancellation() => {
                tracing::debug!("render #{} cancelled", generation);
                None
            }
            Err(e) => {
                tracing::warn!("render of page {} failed: {}", page, e);
                self.bus.publish(AppEvent::Render(RenderEvent::Failed {
                    page,
                    reason: e.to_string(),
                }));
                self.bus
                    .publish(AppEvent::error(format!("Could not display page {}: {}", page + 1, e)));
                None
            }
        }
    }
}

impl std::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("pages", &self.document.page_count())
            .field("generation", &self.latest.load(Ordering::Relaxed))
            .field("outstanding", &self.outstanding)
            .finish()
    }
}
