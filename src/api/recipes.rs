use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{search_catalog, ApiJson, AppError, AppResult, AppState};
use crate::recipes::{Recipe, RecipePatch, SearchTerms};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Free text of ingredients to favor.
    #[serde(default)]
    pub include: String,
    /// Free text of ingredients or keywords to avoid.
    #[serde(default)]
    pub exclude: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matches before truncation to the page size.
    pub total: usize,
    pub recipes: Vec<Recipe>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(search_recipes).post(add_recipe))
        .route(
            "/recipes/:name",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
}

async fn search_recipes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    let terms = SearchTerms::from_text(&query.include, &query.exclude);
    let limit = query.limit.unwrap_or(state.result_limit).min(state.result_limit);

    let (total, recipes) = search_catalog(&state, terms, limit).await?;
    Ok(Json(SearchResponse { total, recipes }))
}

async fn add_recipe(
    State(state): State<AppState>,
    ApiJson(recipe): ApiJson<Recipe>,
) -> AppResult<(StatusCode, Json<Recipe>)> {
    let mut store = state.recipes.write().await;
    let name = recipe.name.trim().to_string();
    store.add(recipe)?;
    let stored = store
        .get(&name)
        .cloned()
        .ok_or_else(|| AppError::not_found("recipe", &name))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn get_recipe(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<Json<Recipe>> {
    let store = state.recipes.read().await;
    store
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("recipe", name))
}

async fn update_recipe(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiJson(patch): ApiJson<RecipePatch>,
) -> AppResult<Json<Recipe>> {
    if patch.is_empty() {
        return Err(AppError::InvalidInput("patch has no fields".to_string()));
    }
    let new_name = patch.name.as_deref().map(str::trim).unwrap_or(&name).to_string();

    let mut store = state.recipes.write().await;
    if store.update(&name, patch)? == 0 {
        return Err(AppError::not_found("recipe", name));
    }
    store
        .get(&new_name)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("recipe", new_name))
}

async fn delete_recipe(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<StatusCode> {
    let mut store = state.recipes.write().await;
    if store.delete(&name)? == 0 {
        return Err(AppError::not_found("recipe", name));
    }
    Ok(StatusCode::NO_CONTENT)
}
