//! HTTP client for the observer's query API.
//!
//! Every response body is decoded against its fixed schema through
//! [`crate::codec::decode_response`]. Failures are typed: transport problems
//! are [`ApiError::Request`], non-2xx answers are [`ApiError::Status`], and
//! schema violations are [`ApiError::Decode`].
//!
//! # Endpoints
//!
//! | Method | Path | Record |
//! |--------|------|--------|
//! | `GET` | `/api/world` | [`WorldResponse`] |
//! | `GET` | `/api/agents` | [`AgentList`] |
//! | `GET` | `/api/agents/{id}` | [`AgentDetail`] |
//! | `GET` | `/api/locations` | [`LocationList`] |
//! | `GET` | `/api/locations/{id}` | [`LocationDetail`] |
//! | `GET` | `/api/routes` | [`RouteList`] |
//! | `GET` | `/api/events` | [`EventList`] |
//! | `GET` | `/api/decisions` | [`DecisionList`] |
//! | `GET` | `/api/social/{beliefs,governance,families,economy,crime}` | social snapshots |
//! | `GET` | `/api/operator/status` | [`SimulationStatus`] |
//! | `POST` | `/api/operator/{pause,resume,stop}` | [`OperatorAck`] |
//! | `POST` | `/api/operator/speed` | [`SpeedChange`] |
//! | `POST` | `/api/operator/inject-event` | [`OperatorAck`] |

use std::future::Future;
use std::time::Duration;

use emergence_types::{
    AgentDetail, AgentId, AgentList, AgentStatus, BeliefSnapshot, CrimeSnapshot, DecisionList,
    EconomySnapshot, EventList, FamilySnapshot, GovernanceSnapshot, InjectEventRequest,
    LocationDetail, LocationId, LocationList, OperatorAck, RouteList, SetSpeedRequest,
    SimulationStatus, SpeedChange, WorldResponse,
};
use reqwest::{RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec::decode_response;
use crate::config::ObserverConfig;
use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Query filters
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/agents`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgentFilter {
    /// Alive, dead, or all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Page offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// Query parameters for `GET /api/events`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventFilter {
    /// Only events from this tick.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    /// Only events involving this agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    /// Maximum rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Query parameters for `GET /api/decisions`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionFilter {
    /// Only decisions by this agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    /// Only decisions for this tick.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    /// Maximum rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Queries trait
// ---------------------------------------------------------------------------

/// The snapshot queries the sync coordinator refreshes.
///
/// [`ApiClient`] is the HTTP implementation; tests substitute canned
/// responses.
pub trait Queries: Send + Sync + 'static {
    /// `GET /api/world`.
    fn world(&self) -> impl Future<Output = Result<WorldResponse, ApiError>> + Send;

    /// `GET /api/agents`.
    fn agents(&self, filter: &AgentFilter) -> impl Future<Output = Result<AgentList, ApiError>> + Send;

    /// `GET /api/locations`.
    fn locations(&self) -> impl Future<Output = Result<LocationList, ApiError>> + Send;

    /// `GET /api/routes`.
    fn routes(&self) -> impl Future<Output = Result<RouteList, ApiError>> + Send;

    /// `GET /api/events`.
    fn events(&self, filter: &EventFilter) -> impl Future<Output = Result<EventList, ApiError>> + Send;

    /// `GET /api/decisions`.
    fn decisions(
        &self,
        filter: &DecisionFilter,
    ) -> impl Future<Output = Result<DecisionList, ApiError>> + Send;

    /// `GET /api/social/beliefs`.
    fn beliefs(&self) -> impl Future<Output = Result<BeliefSnapshot, ApiError>> + Send;

    /// `GET /api/social/governance`.
    fn governance(&self) -> impl Future<Output = Result<GovernanceSnapshot, ApiError>> + Send;

    /// `GET /api/social/families`.
    fn families(&self) -> impl Future<Output = Result<FamilySnapshot, ApiError>> + Send;

    /// `GET /api/social/economy`.
    fn economy(&self) -> impl Future<Output = Result<EconomySnapshot, ApiError>> + Send;

    /// `GET /api/social/crime`.
    fn crime(&self) -> impl Future<Output = Result<CrimeSnapshot, ApiError>> + Send;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// HTTP client bound to one observer.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Shared connection pool.
    http: reqwest::Client,
    /// Base URL without a trailing slash.
    base_url: String,
}

impl ApiClient {
    /// Create a client for the observer at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Url::parse(base_url).map_err(|e| ApiError::Url {
            endpoint: base_url.to_owned(),
            message: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Request {
                endpoint: base_url.to_owned(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a client from the `observer` config section.
    pub fn from_config(config: &ObserverConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, config.request_timeout())
    }

    /// The observer base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- single-entity detail ------------------------------------------------

    /// `GET /api/agents/{id}`.
    pub async fn agent(&self, id: AgentId) -> Result<AgentDetail, ApiError> {
        self.get(&format!("/api/agents/{id}")).await
    }

    /// `GET /api/locations/{id}`.
    pub async fn location(&self, id: LocationId) -> Result<LocationDetail, ApiError> {
        self.get(&format!("/api/locations/{id}")).await
    }

    // -- operator ------------------------------------------------------------

    /// `GET /api/operator/status`.
    pub async fn operator_status(&self) -> Result<SimulationStatus, ApiError> {
        self.get("/api/operator/status").await
    }

    /// `POST /api/operator/pause`.
    pub async fn pause(&self) -> Result<OperatorAck, ApiError> {
        self.post_empty("/api/operator/pause").await
    }

    /// `POST /api/operator/resume`.
    pub async fn resume(&self) -> Result<OperatorAck, ApiError> {
        self.post_empty("/api/operator/resume").await
    }

    /// `POST /api/operator/stop`.
    pub async fn stop(&self) -> Result<OperatorAck, ApiError> {
        self.post_empty("/api/operator/stop").await
    }

    /// `POST /api/operator/speed`.
    pub async fn set_speed(&self, tick_interval_ms: u64) -> Result<SpeedChange, ApiError> {
        self.post("/api/operator/speed", &SetSpeedRequest { tick_interval_ms })
            .await
    }

    /// `POST /api/operator/inject-event`.
    pub async fn inject_event(&self, request: &InjectEventRequest) -> Result<OperatorAck, ApiError> {
        self.post("/api/operator/inject-event", request).await
    }

    // -- plumbing ------------------------------------------------------------

    /// Absolute URL for `path`.
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET` without query parameters.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.http.get(self.url(path));
        self.execute(path, request).await
    }

    /// `GET` with query parameters.
    async fn get_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + Sync,
    {
        let request = self.http.get(self.url(path)).query(query);
        self.execute(path, request).await
    }

    /// `POST` with a JSON body.
    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let request = self.http.post(self.url(path)).json(body);
        self.execute(path, request).await
    }

    /// `POST` without a body.
    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.http.post(self.url(path));
        self.execute(path, request).await
    }

    /// Send, check the status, and decode the body.
    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Request {
            endpoint: endpoint.to_owned(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(ApiError::Status {
                endpoint: endpoint.to_owned(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| ApiError::Request {
            endpoint: endpoint.to_owned(),
            message: format!("failed to read body: {e}"),
        })?;
        debug!(endpoint, bytes = bytes.len(), "query response received");

        decode_response(&bytes).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_owned(),
            source,
        })
    }
}

impl Queries for ApiClient {
    fn world(&self) -> impl Future<Output = Result<WorldResponse, ApiError>> + Send {
        self.get("/api/world")
    }

    fn agents(&self, filter: &AgentFilter) -> impl Future<Output = Result<AgentList, ApiError>> + Send {
        self.get_with("/api/agents", filter)
    }

    fn locations(&self) -> impl Future<Output = Result<LocationList, ApiError>> + Send {
        self.get("/api/locations")
    }

    fn routes(&self) -> impl Future<Output = Result<RouteList, ApiError>> + Send {
        self.get("/api/routes")
    }

    fn events(&self, filter: &EventFilter) -> impl Future<Output = Result<EventList, ApiError>> + Send {
        self.get_with("/api/events", filter)
    }

    fn decisions(
        &self,
        filter: &DecisionFilter,
    ) -> impl Future<Output = Result<DecisionList, ApiError>> + Send {
        self.get_with("/api/decisions", filter)
    }

    fn beliefs(&self) -> impl Future<Output = Result<BeliefSnapshot, ApiError>> + Send {
        self.get("/api/social/beliefs")
    }

    fn governance(&self) -> impl Future<Output = Result<GovernanceSnapshot, ApiError>> + Send {
        self.get("/api/social/governance")
    }

    fn families(&self) -> impl Future<Output = Result<FamilySnapshot, ApiError>> + Send {
        self.get("/api/social/families")
    }

    fn economy(&self) -> impl Future<Output = Result<EconomySnapshot, ApiError>> + Send {
        self.get("/api/social/economy")
    }

    fn crime(&self) -> impl Future<Output = Result<CrimeSnapshot, ApiError>> + Send {
        self.get("/api/social/crime")
    }
}
