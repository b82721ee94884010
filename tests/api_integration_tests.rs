use meal_planner::api_connection::{ApiConnectionError, ChatClient, ChatMessage};
use meal_planner::config::{AppConfig, API_KEY_ENV_VAR};
use meal_planner::credentials::{InMemoryCredentialStore, API_KEY_NAME};
use meal_planner::customize::customize_plan;
use meal_planner::data_types::MealPlanRequest;
use meal_planner::plan_generator::{AiMealPlanner, MealPlanGenerator, PlanError};
use dotenv::dotenv;
use reqwest::StatusCode;
use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const TEST_KEY: &str = "sk-test-key";

fn setup_test_environment() {
    dotenv().ok();
}

/// Serves exactly one HTTP response and hands back the raw request text.
async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&received);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if received.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&received).into_owned()
    });

    (url, handle)
}

fn client_for(url: &str, key: Option<&str>) -> (AppConfig, ChatClient) {
    let config = AppConfig {
        api_url: url.to_string(),
        progress_delay: Duration::ZERO,
        ..AppConfig::default()
    };
    let store = match key {
        Some(key) => InMemoryCredentialStore::with_value(API_KEY_NAME, key),
        None => InMemoryCredentialStore::new(),
    };
    let client = ChatClient::new(&config, Arc::new(store));
    (config, client)
}

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "model": "gpt-4.1-nano",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn test_missing_api_key_error() {
    let (_, client) = client_for("http://127.0.0.1:9/unused", None);
    let request = client.request(vec![ChatMessage::user("Hello")], 0.7, 10);
    let result = client.call_chat_completion(request).await;
    assert!(matches!(result, Err(ApiConnectionError::MissingApiKey)));
}

#[tokio::test]
async fn test_request_carries_bearer_token_and_body() {
    let (url, server) = serve_once("200 OK", completion_body("Hi there")).await;
    let (_, client) = client_for(&url, Some(TEST_KEY));

    let request = client.request(vec![ChatMessage::system("Be brief"), ChatMessage::user("Hello")], 0.5, 42);
    let text = client.complete_text(request).await.unwrap();
    assert_eq!(text, "Hi there");

    let raw = server.await.unwrap();
    let lowered = raw.to_lowercase();
    assert!(raw.starts_with("POST /v1/chat/completions"));
    assert!(lowered.contains(&format!("authorization: bearer {}", TEST_KEY)));
    assert!(lowered.contains("content-type: application/json"));
    assert!(raw.contains("\"max_tokens\":42"));
    assert!(raw.contains("\"model\":\"gpt-4.1-nano\""));
}

#[tokio::test]
async fn test_api_error_carries_status_and_message() {
    let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
    let (url, server) = serve_once("401 Unauthorized", body.to_string()).await;
    let (_, client) = client_for(&url, Some("sk-bad"));

    let request = client.request(vec![ChatMessage::user("Hello")], 0.7, 10);
    let result = client.call_chat_completion(request).await;
    match result {
        Err(ApiConnectionError::ApiError { status, message }) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected ApiError, got {:?}", other.map(|r| r.choices.len())),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_error_without_body_uses_unknown_message() {
    let (url, server) = serve_once("429 Too Many Requests", String::new()).await;
    let (_, client) = client_for(&url, Some(TEST_KEY));

    let request = client.request(vec![ChatMessage::user("Hello")], 0.7, 10);
    let err = client.call_chat_completion(request).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert!(err.to_string().ends_with("Unknown error"));
    server.await.unwrap();
}

#[tokio::test]
async fn test_empty_content_is_reported() {
    let (url, server) = serve_once("200 OK", completion_body("   ")).await;
    let (_, client) = client_for(&url, Some(TEST_KEY));

    let request = client.request(vec![ChatMessage::user("Hello")], 0.7, 10);
    let result = client.complete_text(request).await;
    assert!(matches!(result, Err(ApiConnectionError::EmptyResponse)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_planner_normalizes_fenced_plan_and_reports_progress() {
    let plan = serde_json::json!({
        "meals": [
            { "mealType": "Breakfast", "name": "Bircher Muesli", "dessert": "Fruit salad" },
            { "mealType": "Lunch", "name": "Chicken Wrap", "prepTime": "15" },
            { "mealType": "Dinner", "name": "Lamb Stir-fry", "ingredients": [{ "name": "Lamb strips", "quantity": 400, "unit": "g" }] }
        ],
        "planSummary": "Quick weeknight day"
    });
    let content = format!("```json\n{}\n```", plan);
    let (url, server) = serve_once("200 OK", completion_body(&content)).await;
    let (config, client) = client_for(&url, Some(TEST_KEY));
    let planner = AiMealPlanner::new(client, &config);

    let seen = Mutex::new(Vec::new());
    let record = |p: meal_planner::data_types::GenerationProgress| seen.lock().unwrap().push(p.progress);
    let response = planner.generate(&MealPlanRequest::default(), &record).await.unwrap();

    assert_eq!(response.meals.len(), 3);
    assert_eq!(response.plan_summary, "Quick weeknight day");
    assert!(!response.is_partial);
    assert_eq!(response.meals[0].dessert.name, "Fruit salad");
    assert_eq!(response.meals[1].prep_time, 15);
    assert_eq!(response.meals[2].ingredients[0].quantity, "400");
    assert_eq!(*seen.lock().unwrap(), vec![20, 50, 80, 100]);
    let list = response.shopping_list.expect("shopping list requested by default");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Lamb strips");

    let raw = server.await.unwrap();
    assert!(raw.contains("EXACTLY 3 meals"));
}

#[tokio::test]
async fn test_planner_surfaces_unrecoverable_text_as_format_error() {
    let (url, server) = serve_once("200 OK", completion_body("I cannot plan meals today.")).await;
    let (config, client) = client_for(&url, Some(TEST_KEY));
    let planner = AiMealPlanner::new(client, &config);

    let result = planner.generate(&MealPlanRequest::default(), &|_| {}).await;
    assert!(matches!(result, Err(PlanError::Format(_))));
    server.await.unwrap();
}

#[tokio::test]
async fn test_planner_omits_shopping_list_when_not_requested() {
    let plan = serde_json::json!({
        "meals": [{ "name": "Lamb Stir-fry", "ingredients": [{ "name": "Lamb strips", "quantity": "400", "unit": "g" }] }]
    });
    let (url, server) = serve_once("200 OK", completion_body(&plan.to_string())).await;
    let (config, client) = client_for(&url, Some(TEST_KEY));
    let planner = AiMealPlanner::new(client, &config);

    let request = MealPlanRequest {
        generate_shopping_list: false,
        ..MealPlanRequest::default()
    };
    let response = planner.generate(&request, &|_| {}).await.unwrap();
    assert_eq!(response.meals.len(), 1);
    assert!(response.shopping_list.is_none());
    server.await.unwrap();
}

#[tokio::test]
async fn test_plan_chat_sends_prior_turns_in_order() {
    let (url, server) = serve_once("200 OK", completion_body("Swap the cream for yoghurt.")).await;
    let (_, client) = client_for(&url, Some(TEST_KEY));

    let history = [
        ChatMessage::user("less dairy please"),
        ChatMessage::assistant("Which meal should change first?"),
        ChatMessage::user("the dinner"),
    ];
    let reply = customize_plan(&client, &history).await;
    assert_eq!(reply, "Swap the cream for yoghurt.");

    let raw = server.await.unwrap();
    let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
    let sent: serde_json::Value = serde_json::from_str(body).unwrap();
    let roles: Vec<&str> = sent["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(sent["messages"][2]["content"], "Which meal should change first?");
    assert_eq!(sent["model"], client.model());
}

#[tokio::test]
#[ignore]
async fn test_live_meal_plan_generation() {
    setup_test_environment();
    let Ok(key) = env::var(API_KEY_ENV_VAR) else {
        println!("Skipping test_live_meal_plan_generation: {} not set.", API_KEY_ENV_VAR);
        return;
    };

    let config = AppConfig {
        progress_delay: Duration::ZERO,
        ..AppConfig::from_env()
    };
    let client = ChatClient::new(&config, Arc::new(InMemoryCredentialStore::with_value(API_KEY_NAME, &key)));
    let planner = AiMealPlanner::new(client, &config);

    let result = planner.generate(&MealPlanRequest::default(), &|_| {}).await;
    assert!(result.is_ok(), "Live generation failed: {:?}", result.err());
    let response = result.unwrap();
    assert!(!response.meals.is_empty());
    assert!(response.meals.iter().all(|m| !m.name.is_empty()));
}
