use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::models::{BoardSnapshot, ConfirmedProduct, Lead, LeadId, Product, Stage, StageChange};
use crate::auth::TokenSource;
use crate::errors::BackendError;

const LEAD_TRACKING_PATH: &str = "/api/leads/leadtracking";
const PRODUCTS_PATH: &str = "/api/products";

/// Backend operations the board depends on.
/// Real implementation: `HttpLeadApi`. Tests supply in-memory doubles.
#[async_trait]
pub trait LeadApi: Send + Sync {
    /// All leads grouped by stage, each list in board order.
    async fn fetch_board(&self) -> Result<BoardSnapshot, BackendError>;

    async fn update_stage(&self, change: &StageChange) -> Result<(), BackendError>;

    /// Move a lead into won together with its confirmed products, as one call.
    async fn confirm_won(
        &self,
        lead_id: &LeadId,
        index: usize,
        products: &[ConfirmedProduct],
    ) -> Result<(), BackendError>;

    async fn fetch_products(&self) -> Result<Vec<Product>, BackendError>;
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LeadTrackingResponse {
    #[serde(default)]
    data: BTreeMap<String, Vec<Lead>>,
}

#[derive(Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WonRequest<'a> {
    confirmed_products: &'a [ConfirmedProduct],
    status: Stage,
    index: usize,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Convert the stage-keyed payload, skipping stages this client does not know.
fn parse_board(raw: BTreeMap<String, Vec<Lead>>) -> BoardSnapshot {
    let mut snapshot = BoardSnapshot::new();
    for (key, leads) in raw {
        match key.parse::<Stage>() {
            Ok(stage) => {
                snapshot.entry(stage).or_default().extend(leads);
            }
            Err(_) => {
                warn!(stage = %key, count = leads.len(), "skipping unknown stage in lead tracking payload");
            }
        }
    }
    snapshot
}

// ── HTTP client ──────────────────────────────────────────────────────

/// `LeadApi` over the CRM REST backend.
pub struct HttpLeadApi {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl HttpLeadApi {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("leadboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `base_url` followed by `segments`, each percent-encoded as one path segment.
    fn segment_url(&self, segments: &[&str]) -> Result<reqwest::Url, BackendError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| BackendError::Network {
            message: format!("Invalid backend url '{}': {}", self.base_url, e),
        })?;
        url.path_segments_mut()
            .map_err(|_| BackendError::Network {
                message: format!("Backend url '{}' cannot take a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.bearer_token() {
            Some(token) => req.bearer_auth(token),
            None => {
                debug!("no bearer token available; sending unauthenticated request");
                req
            }
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let resp = self.authorize(req).send().await.map_err(transport_error)?;
        check_status(resp).await
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_decode() {
        return BackendError::Unknown {
            status: e.status().map(|s| s.as_u16()),
            message: Some(format!("Malformed response: {}", e)),
        };
    }
    BackendError::Network {
        message: e.to_string(),
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body: ErrorBody = resp.json().await.unwrap_or_default();
    let message = body.message.or(body.error);
    debug!(status = status.as_u16(), message = ?message, "backend rejected request");

    if status.is_client_error() {
        Err(BackendError::Validation {
            status: Some(status.as_u16()),
            message,
        })
    } else {
        Err(BackendError::Unknown {
            status: Some(status.as_u16()),
            message,
        })
    }
}

#[async_trait]
impl LeadApi for HttpLeadApi {
    async fn fetch_board(&self) -> Result<BoardSnapshot, BackendError> {
        let resp = self.send(self.client.get(self.url(LEAD_TRACKING_PATH))).await?;
        let body: LeadTrackingResponse = resp.json().await.map_err(transport_error)?;
        Ok(parse_board(body.data))
    }

    async fn update_stage(&self, change: &StageChange) -> Result<(), BackendError> {
        let url = self.segment_url(&["api", "leads", change.lead_id.as_str()])?;
        self.send(self.client.patch(url).json(change)).await?;
        Ok(())
    }

    async fn confirm_won(
        &self,
        lead_id: &LeadId,
        index: usize,
        products: &[ConfirmedProduct],
    ) -> Result<(), BackendError> {
        let url = self.segment_url(&["api", "leads", "won", lead_id.as_str()])?;
        let body = WonRequest {
            confirmed_products: products,
            status: Stage::Won,
            index,
        };
        self.send(self.client.patch(url).json(&body)).await?;
        Ok(())
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, BackendError> {
        let resp = self.send(self.client.get(self.url(PRODUCTS_PATH))).await?;
        let body: ProductsResponse = resp.json().await.map_err(transport_error)?;
        Ok(body.products)
    }
}
