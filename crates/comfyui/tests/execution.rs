//! End-to-end client tests against an in-process mock backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use cina_comfyui::{
    build_workflow, ClientOptions, ComfyUIClient, GenerationFailure, WorkflowGraph,
};
use cina_core::prompt;
use cina_core::request::GenerationRequest;
use cina_core::scene::SceneType;

const MODEL: &str = "epicrealismXL_v10.safetensors";

/// Bind an ephemeral port, serve `app` in the background, and return
/// the base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn fast_options() -> ClientOptions {
    ClientOptions {
        poll_interval: Duration::from_millis(20),
        probe_timeout: Duration::from_secs(2),
        ..ClientOptions::default()
    }
}

fn test_graph() -> WorkflowGraph {
    let request = GenerationRequest::new("rooftop duel", SceneType::FightScene);
    let prompts = prompt::enhance(&request.prompt, &request.scene);
    build_workflow(&request, MODEL, &prompts, 42).unwrap()
}

/// History payload reporting completed output on the save node.
fn completed_history(save_node: &str, filename: &str) -> serde_json::Value {
    json!({
        "abc123": {
            "status": {"status_str": "success", "completed": true},
            "outputs": {
                save_node: {
                    "images": [{"filename": filename, "type": "output"}]
                }
            }
        }
    })
}

fn save_node_id(graph: &WorkflowGraph) -> String {
    graph.terminal_save_node().unwrap().as_u32().to_string()
}

#[tokio::test]
async fn completes_after_a_few_polls() {
    let graph = test_graph();
    let history = completed_history(&save_node_id(&graph), "action_fight_scene_00001_.png");
    let polls = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route(
            "/prompt",
            post(|| async { Json(json!({"prompt_id": "abc123", "number": 0})) }),
        )
        .route(
            "/history/{id}",
            get(move |State(polls): State<Arc<AtomicUsize>>| {
                let history = history.clone();
                async move {
                    // Two pending polls before the job completes.
                    if polls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Json(json!({}))
                    } else {
                        Json(history)
                    }
                }
            }),
        )
        .with_state(polls.clone());

    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());
    let result = client
        .submit_and_wait(&graph, Duration::from_secs(5), &CancellationToken::new())
        .await;

    assert!(result.is_success(), "unexpected failure: {:?}", result.error);
    assert_eq!(result.prompt_id.as_deref(), Some("abc123"));
    assert_eq!(
        result.artifact,
        format!("{base}/view?filename=action_fight_scene_00001_.png&type=output")
    );
    assert!(result.generation_secs > 0.0);
    assert!(polls.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn never_completing_job_times_out() {
    let app = Router::new()
        .route(
            "/prompt",
            post(|| async { Json(json!({"prompt_id": "abc123"})) }),
        )
        .route("/history/{id}", get(|| async { Json(json!({})) }));

    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());
    let result = client
        .submit_and_wait(
            &test_graph(),
            Duration::from_millis(150),
            &CancellationToken::new(),
        )
        .await;

    assert!(!result.is_success());
    assert!(matches!(
        result.error,
        Some(GenerationFailure::TimedOut { .. })
    ));
    assert_eq!(result.artifact, "/static/images/placeholder_action.jpg");
    assert_eq!(result.prompt_id.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn rejected_submission_is_embedded_not_raised() {
    let app = Router::new().route(
        "/prompt",
        post(|| async {
            (StatusCode::BAD_REQUEST, "invalid prompt: missing node").into_response()
        }),
    );

    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());
    let result = client
        .submit_and_wait(&test_graph(), Duration::from_secs(5), &CancellationToken::new())
        .await;

    assert!(result.prompt_id.is_none());
    match result.error {
        Some(GenerationFailure::SubmissionRejected { status, detail }) => {
            assert_eq!(status, Some(400));
            assert!(detail.contains("missing node"));
        }
        other => panic!("Expected SubmissionRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn remote_failure_report_resolves_the_attempt() {
    let app = Router::new()
        .route(
            "/prompt",
            post(|| async { Json(json!({"prompt_id": "abc123"})) }),
        )
        .route(
            "/history/{id}",
            get(|| async {
                Json(json!({
                    "abc123": {
                        "status": {
                            "status_str": "error",
                            "messages": [
                                ["execution_error", {"exception_message": "CUDA out of memory"}]
                            ]
                        }
                    }
                }))
            }),
        );

    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());
    let result = client
        .submit_and_wait(&test_graph(), Duration::from_secs(5), &CancellationToken::new())
        .await;

    match result.error {
        Some(GenerationFailure::RemoteJobFailed { message }) => {
            assert_eq!(message, "CUDA out of memory");
        }
        other => panic!("Expected RemoteJobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn transient_poll_errors_are_retried() {
    let graph = test_graph();
    let history = completed_history(&save_node_id(&graph), "out.png");
    let polls = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route(
            "/prompt",
            post(|| async { Json(json!({"prompt_id": "abc123"})) }),
        )
        .route(
            "/history/{id}",
            get(move |State(polls): State<Arc<AtomicUsize>>| {
                let history = history.clone();
                async move {
                    // Busy pods 502 between submissions.
                    if polls.fetch_add(1, Ordering::SeqCst) < 2 {
                        (StatusCode::BAD_GATEWAY, "upstream busy").into_response()
                    } else {
                        Json(history).into_response()
                    }
                }
            }),
        )
        .with_state(polls);

    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());
    let result = client
        .submit_and_wait(&graph, Duration::from_secs(5), &CancellationToken::new())
        .await;

    assert!(result.is_success(), "unexpected failure: {:?}", result.error);
}

#[tokio::test]
async fn stalled_poll_does_not_defeat_the_timeout() {
    // The backend accepts the history request but never answers.
    let app = Router::new()
        .route(
            "/prompt",
            post(|| async { Json(json!({"prompt_id": "abc123"})) }),
        )
        .route(
            "/history/{id}",
            get(|| async { std::future::pending::<String>().await }),
        );

    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());
    let result = tokio::time::timeout(
        Duration::from_secs(2),
        client.submit_and_wait(
            &test_graph(),
            Duration::from_millis(200),
            &CancellationToken::new(),
        ),
    )
    .await
    .expect("wait must resolve within its wall-clock budget");

    assert!(matches!(
        result.error,
        Some(GenerationFailure::TimedOut { .. })
    ));
    assert_eq!(result.prompt_id.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn cancellation_interrupts_a_stalled_poll() {
    let app = Router::new()
        .route(
            "/prompt",
            post(|| async { Json(json!({"prompt_id": "abc123"})) }),
        )
        .route(
            "/history/{id}",
            get(|| async { std::future::pending::<String>().await }),
        )
        .route("/queue", post(|| async { Json(json!({})) }))
        .route("/interrupt", post(|| async { StatusCode::OK }));

    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        client.submit_and_wait(&test_graph(), Duration::from_secs(30), &cancel),
    )
    .await
    .expect("cancellation must resolve the wait promptly");

    assert!(matches!(result.error, Some(GenerationFailure::Cancelled)));
}

#[tokio::test]
async fn cancellation_aborts_the_wait() {
    let app = Router::new()
        .route(
            "/prompt",
            post(|| async { Json(json!({"prompt_id": "abc123"})) }),
        )
        .route("/history/{id}", get(|| async { Json(json!({})) }))
        .route("/queue", post(|| async { Json(json!({})) }))
        .route("/interrupt", post(|| async { StatusCode::OK }));

    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = client
        .submit_and_wait(&test_graph(), Duration::from_secs(5), &cancel)
        .await;

    assert!(matches!(result.error, Some(GenerationFailure::Cancelled)));
    assert_eq!(result.prompt_id.as_deref(), Some("abc123"));
    assert_eq!(result.artifact, "/static/images/placeholder_action.jpg");
}

#[tokio::test]
async fn health_check_reports_liveness() {
    let app = Router::new().route(
        "/system_stats",
        get(|| async { Json(json!({"system": {"os": "posix"}})) }),
    );
    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());
    assert!(client.health_check().await);
}

#[tokio::test]
async fn health_check_is_false_for_dead_backends() {
    // Port from a listener we immediately drop; nothing is serving.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = ComfyUIClient::with_options(&base, fast_options());
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn list_models_parses_object_info() {
    let app = Router::new().route(
        "/object_info",
        get(|| async {
            Json(json!({
                "CheckpointLoaderSimple": {
                    "input": {
                        "required": {
                            "ckpt_name": [["epicrealismXL_v10.safetensors", "wan2_1_t2v.safetensors"]]
                        }
                    }
                }
            }))
        }),
    );
    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());
    let catalog = client.list_models().await;
    assert_eq!(
        catalog.models(),
        &["epicrealismXL_v10.safetensors", "wan2_1_t2v.safetensors"]
    );
}

#[tokio::test]
async fn list_models_is_empty_when_discovery_fails() {
    let app = Router::new().route(
        "/object_info",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response() }),
    );
    let base = serve(app).await;
    let client = ComfyUIClient::with_options(&base, fast_options());
    assert!(client.list_models().await.is_empty());
}
