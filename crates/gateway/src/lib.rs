//! HTTP API gateway for Crabdesk.
//!
//! Endpoints:
//!
//! - `POST /message`       — Handle a customer message through the agent
//! - `GET  /health`        — Liveness plus a knowledge base probe
//! - `GET  /kb/search`     — Query the knowledge base directly
//! - `POST /kb`            — Add a knowledge base entry
//! - `GET  /tickets`       — List open tickets
//! - `POST /tickets`       — Create a ticket directly
//! - `PUT  /tickets/{id}`  — Update a ticket's status
//!
//! Built on Axum; the gateway owns input validation and status codes,
//! the agent and stores own everything else.

use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info};

use crabdesk_agent::SupportAgent;
use crabdesk_core::error::AgentError;
use crabdesk_core::message::{CustomerMetadata, InboundMessage};
use crabdesk_core::store::{KnowledgeEntry, KnowledgeStore, Ticket, TicketStatus, TicketStore};
use crabdesk_core::trace::TraceEntry;

/// Inbound message length cap, in characters after trimming.
const MAX_MESSAGE_CHARS: usize = 2_000;

/// Cap on `top_k` for direct knowledge base queries.
const MAX_SEARCH_TOP_K: usize = 20;

/// Shared application state for the gateway.
pub struct AppState {
    pub agent: Arc<SupportAgent>,
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub tickets: Arc<dyn TicketStore>,
}

pub type SharedState = Arc<AppState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/message", post(message_handler))
        .route("/health", get(health_handler))
        .route("/kb/search", get(kb_search_handler))
        .route("/kb", post(kb_add_handler))
        .route("/tickets", get(list_tickets_handler))
        .route("/tickets", post(create_ticket_handler))
        .route("/tickets/{id}", put(update_ticket_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors_layer(cors_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok()),
        )
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

/// Start the gateway HTTP server on the configured address.
pub async fn start(
    config: &crabdesk_config::GatewayConfig,
    state: SharedState,
) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = build_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Gateway listening");
    axum::serve(listener, router).await
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct MessageRequest {
    text: String,
    #[serde(default)]
    customer_name: Option<String>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct MessageResponse {
    reply: String,
    trace: Vec<TraceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    kb: String,
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize, Deserialize)]
struct SearchResponse {
    results: Vec<crabdesk_core::store::KbHit>,
    count: usize,
}

#[derive(Deserialize)]
struct KbAddRequest {
    title: String,
    content: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    tags: String,
}

#[derive(Deserialize)]
struct CreateTicketRequest {
    customer_name: String,
    customer_email: String,
    subject: String,
    #[serde(default)]
    body: String,
}

#[derive(Serialize, Deserialize)]
struct CreateTicketResponse {
    ticket_id: i64,
}

#[derive(Deserialize)]
struct UpdateTicketRequest {
    status: String,
}

#[derive(Serialize, Deserialize)]
struct TicketListResponse {
    tickets: Vec<Ticket>,
    count: usize,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn message_handler(
    State(state): State<SharedState>,
    Json(req): Json<MessageRequest>,
) -> Response {
    let text = req.text.trim();
    if text.is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "message text is empty");
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("message text exceeds {MAX_MESSAGE_CHARS} characters"),
        );
    }

    let session_id = req.session_id.clone();
    let message = InboundMessage::new(text).with_metadata(CustomerMetadata {
        customer_name: req.customer_name,
        customer_email: req.customer_email,
        session_id: req.session_id,
    });

    match state.agent.handle(&message).await {
        // The gateway carries no session state; it only echoes the id back.
        Ok(reply) => Json(MessageResponse {
            reply: reply.final_text,
            trace: reply.trace,
            session_id,
        })
        .into_response(),
        Err(AgentError::NoReplyAvailable(detail)) => {
            error!(%detail, "No reply available for message");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "no reply available")
        }
    }
}

async fn health_handler(State(state): State<SharedState>) -> Response {
    // A 1-result search exercises the same path `/message` depends on.
    match state.knowledge.search("health", 1).await {
        Ok(_) => Json(HealthResponse {
            status: "ok".into(),
            kb: "reachable".into(),
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Knowledge base probe failed");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "knowledge base unreachable")
        }
    }
}

async fn kb_search_handler(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = params.q.trim();
    if query.is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "query is empty");
    }
    let top_k = params.top_k.unwrap_or(5).clamp(1, MAX_SEARCH_TOP_K);

    match state.knowledge.search(query, top_k).await {
        Ok(results) => {
            let count = results.len();
            Json(SearchResponse { results, count }).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn kb_add_handler(
    State(state): State<SharedState>,
    Json(req): Json<KbAddRequest>,
) -> Response {
    let entry = KnowledgeEntry {
        title: req.title,
        content: req.content,
        category: req.category,
        tags: req.tags,
    };
    match state.knowledge.add(entry).await {
        Ok(_) => StatusCode::CREATED.into_response(),
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

async fn list_tickets_handler(State(state): State<SharedState>) -> Response {
    match state.tickets.list_open().await {
        Ok(tickets) => {
            let count = tickets.len();
            Json(TicketListResponse { tickets, count }).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn create_ticket_handler(
    State(state): State<SharedState>,
    Json(req): Json<CreateTicketRequest>,
) -> Response {
    match state
        .tickets
        .create(
            &req.customer_name,
            &req.customer_email,
            &req.subject,
            &req.body,
        )
        .await
    {
        Ok(ticket_id) => {
            (StatusCode::CREATED, Json(CreateTicketResponse { ticket_id })).into_response()
        }
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

async fn update_ticket_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTicketRequest>,
) -> Response {
    let Some(status) = TicketStatus::parse(&req.status) else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("'{}' is not a valid ticket status", req.status),
        );
    };

    match state.tickets.update_status(id, status).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, format!("ticket {id} not found")),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crabdesk_agent::{Executor, Planner, Synthesizer};
    use crabdesk_core::error::{FetchError, OracleError};
    use crabdesk_core::fetch::{FetchResponse, Fetcher};
    use crabdesk_core::oracle::{Oracle, OracleRequest, OracleResponse};
    use crabdesk_stores::InMemoryStores;

    /// Oracle stub for gateway tests: always plans a direct response.
    struct CannedOracle;

    #[async_trait::async_trait]
    impl Oracle for CannedOracle {
        fn name(&self) -> &str {
            "gateway_canned"
        }

        async fn complete(&self, _request: OracleRequest) -> Result<OracleResponse, OracleError> {
            Ok(OracleResponse {
                text: r#"{"plan": [{"action": "respond", "args": {"text": "Canned reply"}}]}"#
                    .into(),
                model: "mock-model".into(),
                usage: None,
            })
        }
    }

    struct NoFetcher;

    #[async_trait::async_trait]
    impl Fetcher for NoFetcher {
        async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
            Err(FetchError::DisallowedUrl(url.to_string()))
        }
    }

    fn test_state() -> SharedState {
        let stores = Arc::new(InMemoryStores::new());
        let oracle: Arc<dyn Oracle> = Arc::new(CannedOracle);
        let catalog = Arc::new(crabdesk_tools::standard_catalog());

        let planner = Planner::new(oracle.clone(), catalog, "mock-model");
        let executor = Executor::new(
            stores.clone(),
            stores.clone(),
            Arc::new(NoFetcher),
            Synthesizer::new(oracle, "mock-model"),
        );

        Arc::new(AppState {
            agent: Arc::new(SupportAgent::new(planner, executor)),
            knowledge: stores.clone(),
            tickets: stores,
        })
    }

    fn app() -> Router {
        build_router(test_state(), &[])
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn message_round_trip() {
        let req = Request::builder()
            .method("POST")
            .uri("/message")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "Where is my order?"}"#))
            .unwrap();

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let parsed: MessageResponse = body_json(response).await;
        assert_eq!(parsed.reply, "Canned reply");
        assert_eq!(parsed.trace.len(), 1);
    }

    #[tokio::test]
    async fn blank_message_is_unprocessable() {
        let req = Request::builder()
            .method("POST")
            .uri("/message")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "   "}"#))
            .unwrap();

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn oversized_message_is_unprocessable() {
        let text = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let body = serde_json::json!({ "text": text });
        let req = Request::builder()
            .method("POST")
            .uri("/message")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_probes_knowledge_store() {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let parsed: HealthResponse = body_json(response).await;
        assert_eq!(parsed.status, "ok");
        assert_eq!(parsed.kb, "reachable");
    }

    #[tokio::test]
    async fn message_echoes_session_id() {
        let req = Request::builder()
            .method("POST")
            .uri("/message")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "hi", "session_id": "s-42"}"#))
            .unwrap();

        let response = app().oneshot(req).await.unwrap();
        let parsed: MessageResponse = body_json(response).await;
        assert_eq!(parsed.session_id.as_deref(), Some("s-42"));
    }

    #[tokio::test]
    async fn kb_add_then_search() {
        let state = test_state();

        let req = Request::builder()
            .method("POST")
            .uri("/kb")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"title": "Loyalty Program", "content": "Earn points on every purchase.", "tags": "loyalty points"}"#,
            ))
            .unwrap();
        let response = build_router(state.clone(), &[]).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let req = Request::builder()
            .uri("/kb/search?q=loyalty%20points&top_k=3")
            .body(Body::empty())
            .unwrap();
        let response = build_router(state, &[]).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let parsed: SearchResponse = body_json(response).await;
        assert_eq!(parsed.count, 1);
        assert_eq!(parsed.results[0].title, "Loyalty Program");
    }

    #[tokio::test]
    async fn empty_search_query_is_unprocessable() {
        let req = Request::builder()
            .uri("/kb/search?q=%20")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn ticket_lifecycle() {
        let state = test_state();

        let req = Request::builder()
            .method("POST")
            .uri("/tickets")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"customer_name": "Ada", "customer_email": "ada@example.com", "subject": "Broken item"}"#,
            ))
            .unwrap();
        let response = build_router(state.clone(), &[]).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: CreateTicketResponse = body_json(response).await;

        let req = Request::builder()
            .uri("/tickets")
            .body(Body::empty())
            .unwrap();
        let response = build_router(state.clone(), &[]).oneshot(req).await.unwrap();
        let listed: TicketListResponse = body_json(response).await;
        assert_eq!(listed.count, 1);

        let req = Request::builder()
            .method("PUT")
            .uri(format!("/tickets/{}", created.ticket_id))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"status": "closed"}"#))
            .unwrap();
        let response = build_router(state.clone(), &[]).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let req = Request::builder()
            .uri("/tickets")
            .body(Body::empty())
            .unwrap();
        let response = build_router(state, &[]).oneshot(req).await.unwrap();
        let listed: TicketListResponse = body_json(response).await;
        assert_eq!(listed.count, 0);
    }

    #[tokio::test]
    async fn unknown_ticket_update_is_not_found() {
        let req = Request::builder()
            .method("PUT")
            .uri("/tickets/999")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"status": "closed"}"#))
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bogus_ticket_status_is_unprocessable() {
        let req = Request::builder()
            .method("PUT")
            .uri("/tickets/1")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"status": "vanished"}"#))
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
