//! REST backend for the storage service.
//!
//! Endpoints are resolved against `{base_url}/floorplans/{floorplan_id}`:
//!
//! | call | request |
//! |---|---|
//! | list markers | `GET markers?page=N` |
//! | create marker | `POST markers` |
//! | update marker | `PUT markers/{id}` |
//! | delete marker | `DELETE markers/{id}` |
//! | calibration | `GET`/`POST calibration?page=N` |
//! | layers | `GET`/`POST layers`, `PUT`/`DELETE layers/{id}` |

use async_trait::async_trait;
use floorplan_core::{CalibrationLine, Layer, LayerId, Marker, PersistenceError};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::backend::{BackendResult, MarkerBackend};

/// Connection parameters for [`HttpBackend`]
#[derive(Debug, Clone, PartialEq)]
pub struct HttpBackendConfig {
    /// Service root, e.g. `https://api.example.com/v1`
    pub base_url: String,
    /// Floorplan whose records are read and written
    pub floorplan_id: i64,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            floorplan_id: 0,
            timeout_ms: 10_000,
        }
    }
}

/// [`MarkerBackend`] over HTTP/JSON.
pub struct HttpBackend {
    client: Client,
    config: HttpBackendConfig,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| PersistenceError::Transport {
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/floorplans/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.floorplan_id,
            path
        )
    }

    fn transport_error(&self, err: reqwest::Error) -> PersistenceError {
        if err.is_timeout() {
            PersistenceError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }
        } else {
            PersistenceError::Transport {
                reason: err.to_string(),
            }
        }
    }

    /// Maps non-success statuses onto [`PersistenceError`].
    async fn check(&self, response: Response, resource: &str) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(PersistenceError::NotFound {
                resource: resource.to_string(),
            });
        }
        let reason = response
            .text()
            .await
            .ok()
            .filter(|body| !body.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        Err(PersistenceError::Status {
            status: status.as_u16(),
            reason,
        })
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response, resource: &str) -> BackendResult<T> {
        let response = self.check(response, resource).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PersistenceError::Decode {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl MarkerBackend for HttpBackend {
    async fn list_markers(&self, page: u32) -> BackendResult<Vec<Marker>> {
        let url = self.url(&format!("markers?page={}", page));
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response, "markers").await
    }

    async fn create_marker(&self, marker: &Marker) -> BackendResult<Marker> {
        let url = self.url("markers");
        let mut body = marker.clone();
        body.remote_id = None;
        tracing::debug!("POST {} ({} on page {})", url, body.kind, body.page);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response, "marker").await
    }

    async fn update_marker(&self, remote_id: i64, marker: &Marker) -> BackendResult<Marker> {
        let url = self.url(&format!("markers/{}", remote_id));
        let mut body = marker.clone();
        body.remote_id = Some(remote_id);
        tracing::debug!("PUT {}", url);
        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response, &format!("marker {}", remote_id)).await
    }

    async fn delete_marker(&self, remote_id: i64) -> BackendResult<()> {
        let url = self.url(&format!("markers/{}", remote_id));
        tracing::debug!("DELETE {}", url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.check(response, &format!("marker {}", remote_id))
            .await
            .map(|_| ())
    }

    async fn get_calibration(&self, page: u32) -> BackendResult<Option<CalibrationLine>> {
        let url = self.url(&format!("calibration?page={}", page));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        match self.decode(response, "calibration").await {
            Err(PersistenceError::NotFound { .. }) => Ok(None),
            other => other,
        }
    }

    async fn save_calibration(
        &self,
        calibration: &CalibrationLine,
    ) -> BackendResult<CalibrationLine> {
        let url = self.url(&format!("calibration?page={}", calibration.page));
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(calibration)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response, "calibration").await
    }

    async fn list_layers(&self) -> BackendResult<Vec<Layer>> {
        let response = self
            .client
            .get(self.url("layers"))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response, "layers").await
    }

    async fn create_layer(&self, layer: &Layer) -> BackendResult<Layer> {
        let body = serde_json::json!({
            "name": layer.name,
            "color": layer.color,
            "visible": layer.visible,
            "order_index": layer.order_index,
        });
        let response = self
            .client
            .post(self.url("layers"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response, "layer").await
    }

    async fn update_layer(&self, layer: &Layer) -> BackendResult<Layer> {
        let response = self
            .client
            .put(self.url(&format!("layers/{}", layer.id)))
            .json(layer)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response, &format!("layer {}", layer.id)).await
    }

    async fn delete_layer(&self, id: LayerId) -> BackendResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("layers/{}", id)))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.check(response, &format!("layer {}", id)).await.map(|_| ())
    }
}
