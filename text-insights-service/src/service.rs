use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use analysis_flow::{BUSY_KEY, InMemorySessionStorage, PipelineRunner, Session, SessionStorage};

use crate::client::{AnalysisClient, RigAnalysisClient};
use crate::extract::DocumentExtractor;
use crate::locale::Localizer;
use crate::models::{
    AnalysisJob, AnalysisStateResponse, AnalyzeRequest, JOB_KEY, SetLanguageRequest,
};
use crate::workflow::{build_analysis_pipeline, create_analysis_session, run_analysis};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn SessionStorage>,
    pub runner: PipelineRunner,
    pub locale: Arc<Localizer>,
}

pub async fn create_app() -> Router {
    let app_state = create_app_state();
    build_router(app_state)
}

fn create_app_state() -> AppState {
    let locale = Arc::new(Localizer::new());
    let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
    let client: Arc<dyn AnalysisClient> = Arc::new(RigAnalysisClient::new());

    let pipeline = Arc::new(build_analysis_pipeline(
        locale.clone(),
        Arc::new(DocumentExtractor),
        client,
    ));
    let runner = PipelineRunner::new(pipeline, storage.clone());

    AppState {
        storage,
        runner,
        locale,
    }
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/analysis", post(start_analysis))
        .route("/analysis/{session_id}", get(get_analysis_state))
        .route("/language", put(set_language))
        .route("/strings", get(get_strings))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Text Insights Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Bilingual AI summarization and keyword extraction for text and documents",
        "endpoints": {
            "POST /analysis": "Run an analysis for pasted text or a document",
            "GET /analysis/{session_id}": "Get the state of an analysis session",
            "PUT /language": "Switch the interface language (en/ar)",
            "GET /strings": "Resolved interface strings for the active language",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn start_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<AnalysisStateResponse> {
    info!(mode = ?request.mode, "starting analysis request");

    let session = create_analysis_session(request);
    let session_id = session.id.clone();

    save_session(&state, session).await?;

    // Lifecycle failures land in the job state; only infrastructure errors
    // surface as transport errors.
    if let Err(e) = run_analysis(&state.runner, &state.storage, &session_id).await {
        error!("Analysis lifecycle error for session {}: {}", session_id, e);
        return Err(internal_error("Failed to run analysis", &e.to_string()));
    }

    load_state_response(&state, &session_id).await
}

async fn get_analysis_state(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<AnalysisStateResponse> {
    load_state_response(&state, &session_id).await
}

async fn set_language(
    State(state): State<AppState>,
    Json(request): Json<SetLanguageRequest>,
) -> Json<Value> {
    state.locale.set_language(request.language);
    let document = state.locale.document();

    info!(language = document.lang, direction = document.dir.attribute(), "language switched");

    Json(json!({
        "language": document.lang,
        "direction": document.dir
    }))
}

async fn get_strings(State(state): State<AppState>) -> Json<Value> {
    let document = state.locale.document();
    Json(json!({
        "language": document.lang,
        "direction": document.dir,
        "strings": state.locale.strings()
    }))
}

async fn save_session(state: &AppState, session: Session) -> Result<(), ApiError> {
    state.storage.save(session).await.map_err(|e| {
        error!("Failed to create session: {}", e);
        internal_error("Failed to create analysis session", &e.to_string())
    })
}

async fn load_state_response(
    state: &AppState,
    session_id: &str,
) -> ApiResult<AnalysisStateResponse> {
    match state.storage.get(session_id).await {
        Ok(Some(session)) => Ok(Json(build_state_response(state, &session))),
        Ok(None) => Err(not_found_error("Session not found", session_id)),
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

fn build_state_response(state: &AppState, session: &Session) -> AnalysisStateResponse {
    let job: Option<AnalysisJob> = session.context.get(JOB_KEY);
    let loading = session.context.get::<bool>(BUSY_KEY).unwrap_or(false);

    let (status, summary, keywords, error) = match &job {
        Some(job) if job.error.is_some() => ("failed", None, None, job.error.clone()),
        Some(AnalysisJob {
            result: Some(result),
            ..
        }) => (
            "completed",
            Some(result.summary.clone()),
            Some(result.keywords.clone()),
            None,
        ),
        _ if loading => ("processing", None, None, None),
        _ => ("pending", None, None, None),
    };

    AnalysisStateResponse {
        session_id: session.id.clone(),
        status: status.to_string(),
        loading,
        current_stage: Some(session.current_stage_id.clone()),
        status_message: session.status_message.clone(),
        summary,
        keywords,
        error,
        language: state.locale.language(),
        direction: state.locale.document().dir,
    }
}
