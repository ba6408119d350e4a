use super::health::{health_handler, liveness_handler, readiness_handler};
use super::state::AppState;
use crate::models::{Destination, Favorite, Notification, Package, SearchFilters, Session};
use crate::{Error, Result};
use axum::async_trait;
use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Optional header carrying the user's display name
pub const USER_NAME_HEADER: &str = "x-user-name";

const DEFAULT_FEATURED_LIMIT: usize = 6;

/// Build the HTTP router over the shared services
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/api/packages", get(search_packages))
        .route("/api/packages/featured", get(featured_packages))
        .route("/api/packages/:id", get(get_package))
        .route("/api/destinations", get(list_destinations))
        .route("/api/destinations/:id", get(get_destination))
        .route("/api/favorites", get(list_favorites))
        .route(
            "/api/favorites/:package_id",
            post(add_favorite).delete(remove_favorite),
        )
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/read-all", post(mark_all_notifications_read))
        .route("/api/notifications/:id/read", post(mark_notification_read))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Backend { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if self.is_client_error() {
            debug!("Request rejected: {}", self);
        } else {
            error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidInput {
            field: "query".to_string(),
            reason: rejection.body_text(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(String::from)
        };

        let user_id = header(USER_ID_HEADER)
            .ok_or_else(|| Error::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;

        let mut session = Self::new(user_id);
        if let Some(name) = header(USER_NAME_HEADER) {
            session = session.with_display_name(name);
        }
        Ok(session)
    }
}

/// Query-string form of [`SearchFilters`]; list fields are comma-separated
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub destination_id: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_duration: Option<u32>,
    pub max_duration: Option<u32>,
    pub ratings: Option<String>,
    pub tags: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub travelers: Option<u32>,
}

fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
}

impl TryFrom<SearchParams> for SearchFilters {
    type Error = Error;

    fn try_from(params: SearchParams) -> Result<Self> {
        let ratings = split_list(params.ratings.as_deref())
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        item.parse::<f64>().map_err(|_| Error::InvalidInput {
                            field: "ratings".to_string(),
                            reason: format!("'{item}' is not a number"),
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        Ok(Self {
            query: params.query,
            destination_id: params.destination_id,
            min_price: params.min_price,
            max_price: params.max_price,
            min_duration: params.min_duration,
            max_duration: params.max_duration,
            ratings,
            tags: split_list(params.tags.as_deref()),
            sort_by: params.sort_by,
            page: params.page,
            limit: params.limit,
            travelers: params.travelers,
        })
    }
}

async fn search_packages(
    State(state): State<AppState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Package>>> {
    let Query(params) = params?;
    let filters = SearchFilters::try_from(params)?;
    Ok(Json(state.search.search_packages(&filters).await?))
}

#[derive(Debug, Deserialize)]
struct FeaturedParams {
    limit: Option<usize>,
}

async fn featured_packages(
    State(state): State<AppState>,
    params: std::result::Result<Query<FeaturedParams>, QueryRejection>,
) -> Result<Json<Vec<Package>>> {
    let Query(params) = params?;
    let limit = params.limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
    Ok(Json(state.catalog.featured_packages(limit).await?))
}

async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Package>> {
    Ok(Json(state.catalog.get_package(&id).await?))
}

async fn list_destinations(State(state): State<AppState>) -> Result<Json<Vec<Destination>>> {
    Ok(Json(state.catalog.list_destinations().await?))
}

async fn get_destination(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Destination>> {
    Ok(Json(state.catalog.get_destination(&id).await?))
}

async fn list_favorites(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Package>>> {
    Ok(Json(state.favorites.list(&session).await?))
}

async fn add_favorite(
    State(state): State<AppState>,
    session: Session,
    Path(package_id): Path<String>,
) -> Result<(StatusCode, Json<Favorite>)> {
    let favorite = state.favorites.add(&session, &package_id).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

async fn remove_favorite(
    State(state): State<AppState>,
    session: Session,
    Path(package_id): Path<String>,
) -> Result<StatusCode> {
    if state.favorites.remove(&session, &package_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Favorite", package_id))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationList {
    notifications: Vec<Notification>,
    unread_count: usize,
}

async fn list_notifications(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<NotificationList>> {
    let notifications = state.notifications.list(&session).await?;
    let unread_count = notifications.iter().filter(|n| !n.read).count();
    Ok(Json(NotificationList {
        notifications,
        unread_count,
    }))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<Notification>> {
    Ok(Json(state.notifications.mark_read(&session, &id).await?))
}

async fn mark_all_notifications_read(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<serde_json::Value>> {
    let updated = state.notifications.mark_all_read(&session).await?;
    Ok(Json(json!({ "updated": updated })))
}
