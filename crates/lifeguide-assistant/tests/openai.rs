use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::post,
};
use serde_json::{Value, json};

use lifeguide_assistant::{Assistant, AssistantError, OpenAiClient, ReportContext, fallback_response};
use lifeguide_types::models::{Mode, ReportType, Urgency};

/// Canned completion endpoint that records what it was sent.
struct Upstream {
    status: StatusCode,
    reply: Value,
    seen: Mutex<Vec<Seen>>,
}

struct Seen {
    authorization: Option<String>,
    body: Value,
}

async fn completions(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    upstream.seen.lock().unwrap().push(Seen { authorization, body });
    (upstream.status, Json(upstream.reply.clone()))
}

async fn spawn_upstream(status: StatusCode, reply: Value) -> (OpenAiClient, Arc<Upstream>) {
    let upstream = Arc::new(Upstream {
        status,
        reply,
        seen: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = OpenAiClient::new("test-key".into(), format!("http://{addr}/v1/"), "gpt-4o".into()).unwrap();
    (client, upstream)
}

fn completion(content: Value) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content.to_string() } }] })
}

#[tokio::test]
async fn chat_posts_a_json_mode_completion() {
    let (client, upstream) = spawn_upstream(
        StatusCode::OK,
        completion(json!({
            "content": "Keep a regular bedtime.",
            "confidence": 0.85,
            "suggestions": ["Limit caffeine"],
            "urgency": "low",
        })),
    )
    .await;

    let context = vec!["user: I sleep badly".to_string()];
    let response = client.chat(Mode::Health, "Any tips?", &context).await.unwrap();
    assert_eq!(response.content, "Keep a regular bedtime.");
    assert_eq!(response.metadata.mode, Mode::Health);
    assert_eq!(response.metadata.confidence, 0.85);
    assert_eq!(response.metadata.suggestions, Some(vec!["Limit caffeine".to_string()]));
    assert_eq!(response.metadata.urgency, Urgency::Low);

    let seen = upstream.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer test-key"));

    let body = &seen[0].body;
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["response_format"], json!({ "type": "json_object" }));
    assert_eq!(body["temperature"].as_f64(), Some(0.6));
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(body["messages"][0]["content"].as_str().unwrap().contains("user: I sleep badly"));
    assert_eq!(body["messages"][1], json!({ "role": "user", "content": "Any tips?" }));
}

#[tokio::test]
async fn temperature_follows_the_persona() {
    let (client, upstream) = spawn_upstream(StatusCode::OK, completion(json!({ "content": "ok" }))).await;

    client.chat(Mode::Career, "resume", &[]).await.unwrap();
    client.chat(Mode::Dual, "anything", &[]).await.unwrap();
    client.report(ReportType::Combined, &ReportContext::default()).await.unwrap();

    let temperatures: Vec<Option<f64>> = upstream
        .seen
        .lock()
        .unwrap()
        .iter()
        .map(|s| s.body["temperature"].as_f64())
        .collect();
    assert_eq!(temperatures, vec![Some(0.7), Some(0.7), Some(0.5)]);
}

#[tokio::test]
async fn error_status_is_reported_and_falls_back() {
    let (client, _upstream) = spawn_upstream(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": { "message": "overloaded" } }),
    )
    .await;

    let err = client.chat(Mode::Career, "resume", &[]).await.unwrap_err();
    match err {
        AssistantError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("overloaded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let assistant = Assistant::OpenAi(client);
    let response = assistant.respond(Mode::Career, "resume", &[]).await;
    assert_eq!(response, fallback_response(Mode::Career));
}

#[tokio::test]
async fn empty_choices_is_an_empty_completion() {
    let (client, _upstream) = spawn_upstream(StatusCode::OK, json!({ "choices": [] })).await;

    let err = client.chat(Mode::Health, "hello", &[]).await.unwrap_err();
    assert!(matches!(err, AssistantError::EmptyCompletion), "got {err:?}");
}

#[tokio::test]
async fn non_json_content_is_invalid() {
    let (client, _upstream) = spawn_upstream(
        StatusCode::OK,
        json!({ "choices": [{ "message": { "content": "plain prose" } }] }),
    )
    .await;

    let err = client.chat(Mode::Dual, "hello", &[]).await.unwrap_err();
    assert!(matches!(err, AssistantError::InvalidJson(_)), "got {err:?}");
}

#[tokio::test]
async fn report_reads_title_and_content() {
    let (client, _upstream) = spawn_upstream(
        StatusCode::OK,
        completion(json!({ "title": "Your Career Snapshot", "content": { "summary": "Steady growth" } })),
    )
    .await;

    let report = client.report(ReportType::Career, &ReportContext::default()).await.unwrap();
    assert_eq!(report.title, "Your Career Snapshot");
    assert_eq!(report.content, json!({ "summary": "Steady growth" }));
}
