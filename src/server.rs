use crate::config::{AppConfig, ServerConfig};
use crate::dashboard::Dashboard;
use crate::error::ValidationError;
use crate::export::map_feature_collection;
use crate::layout::DashboardView;
use crate::processing::MapSummary;
use crate::render;
use crate::state::FilterState;
use crate::types::Dimension;
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use geojson::FeatureCollection;
use rand::Rng;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

// Wrapper for RTree indexing of map markers
pub struct ProvinceIndex {
    index: usize,
    point: [f64; 2], // [lon, lat]
}

impl RTreeObject for ProvinceIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for ProvinceIndex {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

pub fn build_province_index(map: &MapSummary) -> RTree<ProvinceIndex> {
    let items = map
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let location = row.location();
            ProvinceIndex {
                index,
                point: [location.x(), location.y()],
            }
        })
        .collect();
    RTree::bulk_load(items)
}

struct Session {
    state: FilterState,
    last_seen: Instant,
}

/// Filter states of every live session, keyed by session id.
///
/// Sessions idle for longer than `idle` are dropped, and the store never
/// holds more than `capacity` of them; the least recently used one goes first.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    capacity: usize,
    idle: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        let config = ServerConfig::default();
        Self::new(config.max_sessions, Duration::from_secs(config.session_idle_secs))
    }
}

impl SessionStore {
    pub fn new(capacity: usize, idle: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            idle,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.max_sessions, Duration::from_secs(config.session_idle_secs))
    }

    pub fn insert(&self, state: FilterState) -> String {
        let id = format!("{:032x}", rand::thread_rng().gen::<u128>());
        let now = Instant::now();
        let mut sessions = self.lock();

        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_seen) < self.idle);
        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_seen)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest) => sessions.remove(&oldest),
                None => break,
            };
        }
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, live = sessions.len(), "Sessions evicted");
        }

        sessions.insert(
            id.clone(),
            Session {
                state,
                last_seen: now,
            },
        );
        id
    }

    pub fn get(&self, id: &str) -> Option<FilterState> {
        let mut sessions = self.lock();
        self.touch(&mut sessions, id).map(|s| s.state.clone())
    }

    /// Applies `change` to the session's state while holding the lock.
    pub fn update<F>(&self, id: &str, change: F) -> Result<FilterState, ApiError>
    where
        F: FnOnce(&mut FilterState) -> Result<(), ValidationError>,
    {
        let mut sessions = self.lock();
        let session = self
            .touch(&mut sessions, id)
            .ok_or(ApiError::UnknownSession)?;
        change(&mut session.state)?;
        Ok(session.state.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Refreshes a live session, or drops it when it has been idle too long.
    fn touch<'a>(
        &self,
        sessions: &'a mut HashMap<String, Session>,
        id: &str,
    ) -> Option<&'a mut Session> {
        let now = Instant::now();
        let expired = now.duration_since(sessions.get(id)?.last_seen) >= self.idle;
        if expired {
            sessions.remove(id);
            return None;
        }
        let session = sessions.get_mut(id)?;
        session.last_seen = now;
        Some(session)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug)]
pub enum ApiError {
    UnknownSession,
    Validation(ValidationError),
    Render(anyhow::Error),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::UnknownSession => (StatusCode::NOT_FOUND, "Unknown session").into_response(),
            ApiError::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
            ApiError::Render(e) => {
                tracing::error!(error = %e, "Failed to render page");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
        }
    }
}

pub struct AppState {
    pub dashboard: Dashboard,
    pub sessions: SessionStore,
    pub tree: RTree<ProvinceIndex>,
}

#[derive(Debug, Deserialize)]
pub struct SelectionUpdate {
    pub dimension: Dimension,
    pub variable: String,
}

#[derive(Debug, Deserialize)]
pub struct AgeRangeUpdate {
    pub min: u32,
    pub max: u32,
}

#[derive(Deserialize)]
pub struct QueryParams {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
pub struct ProvinceResponse {
    pub province: String,
    pub latitude: f64,
    pub longitude: f64,
    pub summary: BTreeMap<String, f64>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        let tree = build_province_index(dashboard.map_summary());
        Self {
            dashboard,
            sessions: SessionStore::default(),
            tree,
        }
    }

    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn open_session(&self) -> (String, DashboardView) {
        let state = self.dashboard.new_session();
        let view = self.dashboard.render(&state.snapshot());
        let id = self.sessions.insert(state);
        debug!(session = %id, "Session opened");
        (id, view)
    }

    pub fn view(&self, id: &str) -> Result<DashboardView, ApiError> {
        let state = self.sessions.get(id).ok_or(ApiError::UnknownSession)?;
        Ok(self.dashboard.render(&state.snapshot()))
    }

    pub fn select(&self, id: &str, update: &SelectionUpdate) -> Result<DashboardView, ApiError> {
        let state = self
            .sessions
            .update(id, |s| s.update(update.dimension, &update.variable))?;
        Ok(self.dashboard.render(&state.snapshot()))
    }

    pub fn set_age_range(&self, id: &str, update: &AgeRangeUpdate) -> Result<DashboardView, ApiError> {
        let state = self
            .sessions
            .update(id, |s| s.update_age_range(update.min, update.max))?;
        Ok(self.dashboard.render(&state.snapshot()))
    }

    /// The map marker closest to `lat`/`lon`.
    pub fn nearest_province(&self, lat: f64, lon: f64) -> Option<ProvinceResponse> {
        let map = self.dashboard.map_summary();
        let found = self.tree.nearest_neighbor(&[lon, lat])?;
        let row = map.rows.get(found.index)?;
        let summary = map
            .variables()
            .into_iter()
            .filter_map(|v| map.value(row, &v).map(|value| (v, value)))
            .collect();
        Some(ProvinceResponse {
            province: row.province.clone(),
            latitude: row.latitude,
            longitude: row.longitude,
            summary,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/sessions/:id/view", get(view_handler))
        .route("/api/sessions/:id/selection", post(selection_handler))
        .route("/api/sessions/:id/age-range", post(age_range_handler))
        .route("/api/map.geojson", get(geojson_handler))
        .route("/api/province", get(province_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, dashboard: Dashboard) -> Result<()> {
    let sessions = SessionStore::from_config(&config.server);
    let state = Arc::new(AppState::new(dashboard).with_sessions(sessions));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Starting server on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let (id, view) = state.open_session();
    let html = render::page(&view, Some(&id)).map_err(ApiError::Render)?;
    Ok(Html(html))
}

async fn view_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DashboardView>, ApiError> {
    state.view(&id).map(Json)
}

async fn selection_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<SelectionUpdate>,
) -> Result<Json<DashboardView>, ApiError> {
    state.select(&id, &update).map(Json)
}

async fn age_range_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<AgeRangeUpdate>,
) -> Result<Json<DashboardView>, ApiError> {
    state.set_age_range(&id, &update).map(Json)
}

async fn geojson_handler(State(state): State<Arc<AppState>>) -> Json<FeatureCollection> {
    Json(map_feature_collection(state.dashboard.map_summary()))
}

async fn province_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<ProvinceResponse>> {
    Json(state.nearest_province(params.lat, params.lon))
}
