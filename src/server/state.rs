use axum::extract::FromRef;
use std::time::Instant;

use super::ServerConfig;
use crate::query::QueryService;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub query: QueryService,
}

impl ServerState {
    pub fn new(config: ServerConfig, query: QueryService) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            query,
        }
    }
}

impl FromRef<ServerState> for QueryService {
    fn from_ref(input: &ServerState) -> Self {
        input.query.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
