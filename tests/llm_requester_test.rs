use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use nutri_assist::api::{router, AppState};
use nutri_assist::api_connection::{ApiConnectionError, ChatCompletionRequest, ChatMessage, GenerationConfig, Provider};
use nutri_assist::llm::{Assistant, LlmError, MealPlanRequest, PersonalizeRequest};
use nutri_assist::recipes::{Ingredient, Quantity, Recipe, RecipeStore};
use nutri_assist::users::{UserProfile, UserStore};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::tempdir;
use tokio::net::TcpListener;
use tower::ServiceExt;

const MOCK_KEY_VAR: &str = "NUTRI_ASSIST_MOCK_API_KEY";

/// What the fake completion endpoint answers with.
#[derive(Clone)]
enum Reply {
    Content(String),
    Status(StatusCode),
}

async fn fake_completion(State(reply): State<Reply>, Json(request): Json<Value>) -> (StatusCode, Json<Value>) {
    assert!(request["messages"][0]["content"].as_str().is_some());
    match reply {
        Reply::Content(content) => (
            StatusCode::OK,
            Json(json!({
                "id": "gen-test",
                "model": request["model"],
                "choices": [{ "index": 0, "finish_reason": "stop", "message": { "role": "assistant", "content": content } }]
            })),
        ),
        Reply::Status(status) => (status, Json(json!({ "error": { "message": "rejected" } }))),
    }
}

/// Starts a fake chat completion endpoint and returns its base URL.
async fn spawn_model(reply: Reply) -> String {
    std::env::set_var(MOCK_KEY_VAR, "test-key");
    let app = Router::new()
        .route("/chat/completions", post(fake_completion))
        .with_state(reply);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn assistant_for(base_url: String) -> Assistant {
    let provider = Provider::openrouter(MOCK_KEY_VAR)
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(5));
    Assistant::new(provider, "test-model")
}

fn sample_user() -> UserProfile {
    UserProfile {
        specific_diet: Some("low sodium".to_string()),
        food_preferences: Some("garlic".to_string()),
        food_allergies: Some("peanut".to_string()),
        ..UserProfile::new("alice", "1990-04-12")
    }
}

fn sample_recipe() -> Recipe {
    Recipe::new(
        "Garlic Soup",
        vec![
            Ingredient::new("garlic", Quantity::Amount(3.0), "cloves"),
            Ingredient::named("onion"),
        ],
        "Simmer everything.",
    )
}

const PLAN_REPLY: &str = r#"Here you go!
<start>
{"meal_plan": {
  "breakfast": {"dish_name": "Oats", "ingredients": ["oats", "milk"], "portion_size": "1 bowl"},
  "lunch": {"dish_name": "Garlic Soup", "ingredients": ["garlic", "onion"], "portion_size": "2 cups"},
  "dinner": {"dish_name": "Rice Bowl", "ingredients": ["rice"], "portion_size": "1 plate"}
}}
<end>"#;

#[tokio::test]
async fn test_missing_api_key_error() {
    let provider = Provider::openrouter("THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ");
    let request = ChatCompletionRequest::new("test-model", vec![ChatMessage::user("Hello")], GenerationConfig::default());

    let result = provider.call_chat_completion(request).await;
    match result {
        Err(ApiConnectionError::MissingApiKey(key_name)) => {
            assert_eq!(key_name, "THIS_KEY_SHOULD_NOT_EXIST_IN_ENV_ABXYZ")
        }
        other => panic!("expected MissingApiKey, got {:?}", other),
    }
}

#[tokio::test]
async fn test_meal_plan_is_extracted_from_tagged_reply() {
    let base_url = spawn_model(Reply::Content(PLAN_REPLY.to_string())).await;
    let assistant = assistant_for(base_url);

    let plan = assistant
        .ask(&MealPlanRequest::new(sample_user(), vec![sample_recipe()]))
        .await
        .unwrap();
    assert_eq!(plan.meal_plan.breakfast.dish_name, "Oats");
    assert_eq!(plan.meal_plan.lunch.ingredients, ["garlic", "onion"]);
    assert_eq!(plan.meal_plan.dinner.portion_size, "1 plate");
}

#[tokio::test]
async fn test_personalized_recipe_is_extracted() {
    let reply = r#"<start>{"recipe_name": "Garlic Soup (no onion)", "ingredients": ["garlic"], "instructions": "Simmer."}<end>"#;
    let base_url = spawn_model(Reply::Content(reply.to_string())).await;
    let assistant = assistant_for(base_url);

    let user = sample_user();
    let request = PersonalizeRequest::for_user(&user, sample_recipe(), vec!["garlic".into()], vec!["onion".into()]);
    let personalized = assistant.ask(&request).await.unwrap();
    assert_eq!(personalized.recipe_name, "Garlic Soup (no onion)");
    assert_eq!(personalized.ingredients, ["garlic"]);
}

#[tokio::test]
async fn test_reply_without_tags_is_a_format_error() {
    let base_url = spawn_model(Reply::Content("I cannot help with that.".to_string())).await;
    let assistant = assistant_for(base_url);

    let err = assistant
        .ask(&MealPlanRequest::new(sample_user(), Vec::new()))
        .await
        .unwrap_err();
    match err {
        LlmError::ResponseFormat(inner) => assert_eq!(inner.raw(), "I cannot help with that."),
        other => panic!("expected ResponseFormat, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_request_surfaces_status() {
    let base_url = spawn_model(Reply::Status(StatusCode::UNAUTHORIZED)).await;
    let assistant = assistant_for(base_url);

    let err = assistant
        .ask(&MealPlanRequest::new(sample_user(), Vec::new()))
        .await
        .unwrap_err();
    match err {
        LlmError::Connection(ApiConnectionError::ApiError { status, error_body }) => {
            assert_eq!(status.as_u16(), 401);
            assert!(error_body.contains("rejected"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

async fn meal_plan_over_http(reply: &str) -> (StatusCode, Value) {
    let base_url = spawn_model(Reply::Content(reply.to_string())).await;
    let dir = tempdir().unwrap();
    let mut recipes = RecipeStore::open(dir.path().join("recipes.csv")).unwrap();
    recipes.add(sample_recipe()).unwrap();
    let mut users = UserStore::open(dir.path().join("users.csv")).unwrap();
    users.create(sample_user()).unwrap();

    let app = router(AppState::new(recipes, users, assistant_for(base_url), 5));
    let response = app
        .oneshot(
            Request::post("/users/alice/meal-plan")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "exclude": "onion" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_meal_plan_route_returns_plan() {
    let (status, body) = meal_plan_over_http(PLAN_REPLY).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meal_plan"]["lunch"]["dish_name"], "Garlic Soup");
}

#[tokio::test]
async fn test_meal_plan_route_reports_raw_reply_on_bad_json() {
    let (status, body) = meal_plan_over_http("<start>{not json}<end>").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "RESPONSE_FORMAT");
    assert_eq!(body["error"]["details"]["raw_response"], "<start>{not json}<end>");
}
