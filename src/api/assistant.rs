use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use super::{search_catalog, ApiJson, AppError, AppResult, AppState};
use crate::llm::{MealPlan, MealPlanRequest, PersonalizeRequest, PersonalizedRecipe};
use crate::recipes::{tokenize, SearchTerms};
use crate::users::UserProfile;

/// Ingredient preferences for a request. Fields left out fall back to the
/// user's stored `food_preferences` and `food_allergies`.
#[derive(Debug, Default, Deserialize)]
pub struct PreferenceOverrides {
    pub include: Option<String>,
    pub exclude: Option<String>,
}

impl PreferenceOverrides {
    fn terms_for(&self, user: &UserProfile) -> SearchTerms {
        let include = self
            .include
            .as_deref()
            .or(user.food_preferences.as_deref())
            .unwrap_or_default();
        let exclude = self
            .exclude
            .as_deref()
            .or(user.food_allergies.as_deref())
            .unwrap_or_default();
        SearchTerms::new(tokenize(include), tokenize(exclude))
    }

    /// An empty body means no overrides; anything else must be valid JSON.
    fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|err| AppError::InvalidInput(format!("invalid preferences: {}", err)))
    }
}

#[derive(Debug, Deserialize)]
pub struct PersonalizeBody {
    pub recipe: String,
    #[serde(flatten)]
    pub preferences: PreferenceOverrides,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/:name/meal-plan", post(meal_plan))
        .route("/users/:name/personalize", post(personalize))
}

async fn load_user(state: &AppState, name: String) -> AppResult<UserProfile> {
    let users = state.users.read().await;
    users
        .get(&name)
        .cloned()
        .ok_or_else(|| AppError::not_found("user", name))
}

async fn meal_plan(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> AppResult<Json<MealPlan>> {
    let preferences = PreferenceOverrides::from_body(&body)?;
    let user = load_user(&state, name).await?;
    let terms = preferences.terms_for(&user);

    let (_, candidates) = search_catalog(&state, terms, state.result_limit).await?;
    info!(user = %user.name, candidates = candidates.len(), "generating meal plan");

    let plan = state.assistant.ask(&MealPlanRequest::new(user, candidates)).await?;
    Ok(Json(plan))
}

async fn personalize(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiJson(body): ApiJson<PersonalizeBody>,
) -> AppResult<Json<PersonalizedRecipe>> {
    let user = load_user(&state, name).await?;
    let store = state.recipes.read().await;
    let recipe = store.get(&body.recipe).cloned();
    drop(store);
    let recipe = recipe.ok_or_else(|| AppError::not_found("recipe", &body.recipe))?;
    let terms = body.preferences.terms_for(&user);
    info!(user = %user.name, recipe = %recipe.name, "personalizing recipe");

    let request = PersonalizeRequest::for_user(
        &user,
        recipe,
        terms.positive().to_vec(),
        terms.negative().to_vec(),
    );
    let personalized = state.assistant.ask(&request).await?;
    Ok(Json(personalized))
}
