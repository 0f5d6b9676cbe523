use anyhow::{Context, Result};
use nutri_assist::api::{self, AppState};
use nutri_assist::cli::{parse_args, Command};
use nutri_assist::config::AppConfig;
use nutri_assist::llm::{Assistant, MealPlanRequest, PersonalizeRequest};
use nutri_assist::logging;
use nutri_assist::recipes::{tokenize, RecipeStore, SearchTerms};
use nutri_assist::users::{UserProfile, UserStore};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct RankedSummary<'a> {
    name: &'a str,
    positive_count: usize,
}

fn load_user(config: &AppConfig, name: &str) -> Result<UserProfile> {
    let users = UserStore::open(&config.users_path)
        .with_context(|| format!("Failed to open user profiles '{}'", config.users_path.display()))?;
    users
        .get(name)
        .cloned()
        .with_context(|| format!("User '{}' not found", name))
}

fn open_recipes(config: &AppConfig) -> Result<RecipeStore> {
    RecipeStore::open(&config.recipes_path)
        .with_context(|| format!("Failed to open recipe catalog '{}'", config.recipes_path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = parse_args();
    logging::init(&cli.log_level, cli.log_format)?;

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    cli.apply_overrides(&mut config);

    match cli.command {
        Command::Serve { .. } => {
            let state = AppState::from_config(&config)?;
            api::serve(state, config.bind_addr).await?;
        }
        Command::Filter { include, exclude, limit } => {
            let store = open_recipes(&config)?;
            let terms = SearchTerms::from_text(&include, &exclude);
            let ranked = store.rank(&terms).context("Recipe search failed")?;
            info!(matches = ranked.len(), "search complete");

            let limit = limit.unwrap_or(config.result_limit);
            let summary: Vec<RankedSummary> = ranked
                .iter()
                .take(limit)
                .map(|r| RankedSummary {
                    name: &r.recipe.name,
                    positive_count: r.positive_count,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::MealPlan { user, include, exclude } => {
            let user = load_user(&config, &user)?;
            let include = include.or_else(|| user.food_preferences.clone()).unwrap_or_default();
            let exclude = exclude.or_else(|| user.food_allergies.clone()).unwrap_or_default();

            let store = open_recipes(&config)?;
            let candidates: Vec<_> = store
                .rank(&SearchTerms::from_text(&include, &exclude))
                .context("Recipe search failed")?
                .into_iter()
                .take(config.result_limit)
                .map(|r| r.recipe.clone())
                .collect();

            let assistant = Assistant::from_config(&config.llm);
            let plan = assistant
                .ask(&MealPlanRequest::new(user, candidates))
                .await
                .context("Meal plan generation failed")?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Personalize { user, recipe } => {
            let user = load_user(&config, &user)?;
            let store = open_recipes(&config)?;
            let recipe = store
                .get(&recipe)
                .cloned()
                .with_context(|| format!("Recipe '{}' not found", recipe))?;

            let positive = tokenize(user.food_preferences.as_deref().unwrap_or_default());
            let negative = tokenize(user.food_allergies.as_deref().unwrap_or_default());
            let request = PersonalizeRequest::for_user(&user, recipe, positive, negative);

            let assistant = Assistant::from_config(&config.llm);
            let personalized = assistant
                .ask(&request)
                .await
                .context("Recipe personalization failed")?;
            println!("{}", serde_json::to_string_pretty(&personalized)?);
        }
    }

    Ok(())
}
