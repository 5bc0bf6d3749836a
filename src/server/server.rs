use anyhow::{Context, Result};
use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use super::{log_requests, state::ServerState, ServerConfig};
use crate::config::{DerivedSeries, RawTable};
use crate::query::{QueryError, QueryService, RowRecord};

const YEAR_FROM_PARAM: &str = "da_anno";
const YEAR_TO_PARAM: &str = "a_anno";

#[derive(Serialize)]
struct HomeResponse {
    message: &'static str,
    uptime: String,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match &self {
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            QueryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}

/// Parses the optional year bounds. Unknown parameters are ignored.
fn parse_year_range(params: &HashMap<String, String>) -> Result<(Option<i64>, Option<i64>), Response> {
    let parse = |name: &str| -> Result<Option<i64>, Response> {
        match params.get(name) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
                error_response(
                    StatusCode::BAD_REQUEST,
                    format!("'{}' must be an integer, got '{}'", name, raw),
                )
            }),
        }
    };
    Ok((parse(YEAR_FROM_PARAM)?, parse(YEAR_TO_PARAM)?))
}

async fn run_query<F>(query: QueryService, fetch: F) -> Response
where
    F: FnOnce(&QueryService) -> Result<Vec<RowRecord>, QueryError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || fetch(&query)).await {
        Ok(Ok(rows)) => Json(rows).into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(err) => {
            error!("Query task failed: {}", err);
            QueryError::Internal("Internal server error".to_string()).into_response()
        }
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    info!("Home requested");
    Json(HomeResponse {
        message: "Welcome to the fishery data API. Raw tables are under /tabelle_originali, derived series under /serie-calcolate.",
        uptime: format_uptime(state.start_time.elapsed()),
    })
}

async fn get_raw_table(
    State(query): State<QueryService>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(table) = RawTable::ALL.into_iter().find(|t| t.slug() == slug) else {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown table '{}'", slug));
    };
    let (year_from, year_to) = match parse_year_range(&params) {
        Ok(range) => range,
        Err(response) => return response,
    };
    run_query(query, move |q| q.fetch_raw(table, year_from, year_to)).await
}

async fn get_derived_series(
    State(query): State<QueryService>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(series) = DerivedSeries::ALL.into_iter().find(|s| s.slug() == slug) else {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown series '{}'", slug));
    };
    let (year_from, year_to) = match parse_year_range(&params) {
        Ok(range) => range,
        Err(response) => return response,
    };
    run_query(query, move |q| q.fetch_derived(series, year_from, year_to)).await
}

pub fn make_app(config: ServerConfig, query: QueryService) -> Router {
    let state = ServerState::new(config, query);

    let data_routes: Router = Router::new()
        .route("/tabelle_originali/{table}", get(get_raw_table))
        .route("/serie-calcolate/{series}", get(get_derived_series))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .merge(data_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(config: ServerConfig, query: QueryService) -> Result<()> {
    let port = config.port;
    let app = make_app(config, query);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
