//! HTTP front-end.
//!
//! Stores sit behind a single `RwLock` each: any number of concurrent searches,
//! one writer at a time. Locks are released before any model call.

pub mod assistant;
pub mod error;
pub mod recipes;
pub mod users;

use anyhow::{Context, Result};
use axum::extract::FromRequest;
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::llm::Assistant;
use crate::recipes::{Recipe, RecipeStore, SearchTerms};
use crate::users::UserStore;

pub use error::{AppError, AppResult, ErrorCode};

#[derive(Clone)]
pub struct AppState {
    pub recipes: Arc<RwLock<RecipeStore>>,
    pub users: Arc<RwLock<UserStore>>,
    pub assistant: Arc<Assistant>,
    /// Upper bound on the number of recipes a search returns.
    pub result_limit: usize,
}

impl AppState {
    pub fn new(recipes: RecipeStore, users: UserStore, assistant: Assistant, result_limit: usize) -> Self {
        Self {
            recipes: Arc::new(RwLock::new(recipes)),
            users: Arc::new(RwLock::new(users)),
            assistant: Arc::new(assistant),
            result_limit,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let recipes = RecipeStore::open(&config.recipes_path)
            .with_context(|| format!("Failed to open recipe catalog '{}'", config.recipes_path.display()))?;
        let users = UserStore::open(&config.users_path)
            .with_context(|| format!("Failed to open user profiles '{}'", config.users_path.display()))?;
        Ok(Self::new(recipes, users, Assistant::from_config(&config.llm), config.result_limit))
    }
}

/// JSON request body whose parse failures answer with the usual error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Ranks the catalog off the async workers and returns the total number of
/// matches with the first `limit` of them.
pub(crate) async fn search_catalog(
    state: &AppState,
    terms: SearchTerms,
    limit: usize,
) -> AppResult<(usize, Vec<Recipe>)> {
    let recipes = Arc::clone(&state.recipes);
    tokio::task::spawn_blocking(move || -> AppResult<(usize, Vec<Recipe>)> {
        let store = recipes.blocking_read();
        let ranked = store.rank(&terms)?;
        let total = ranked.len();
        let page: Vec<Recipe> = ranked.into_iter().take(limit).map(|r| r.recipe.clone()).collect();
        Ok((total, page))
    })
    .await
    .map_err(|err| AppError::Internal(format!("search task failed: {}", err)))?
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(users::routes())
        .merge(recipes::routes())
        .merge(assistant::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the API until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("HTTP server failed")
}
