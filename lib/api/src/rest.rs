use crate::SessionRegistry;
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tropex_core::{
    Answer, Error, Item, ItemId, NarrowingEngine, Trait, TraitCondition, TraitFilter,
    TraitId, DEFAULT_CANDIDATE_LIMIT,
};
use uuid::Uuid;

/// Shared state behind every handler
pub struct ApiState {
    pub engine: NarrowingEngine,
    pub sessions: SessionRegistry,
    /// Candidate count at which a session reports itself converged
    pub converge_at: usize,
}

impl ApiState {
    pub fn new(engine: NarrowingEngine, converge_at: usize) -> Self {
        Self {
            engine,
            sessions: SessionRegistry::new(),
            converge_at,
        }
    }

    /// Expire sessions left idle for longer than `ttl`
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = SessionRegistry::with_ttl(ttl);
        self
    }
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct AnswerRequest {
    trait_id: String,
    answer: Answer,
}

#[derive(Deserialize)]
struct ItemQueryRequest {
    filter: TraitCondition,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct CandidateResponse<'a> {
    id: &'a ItemId,
    name: &'a str,
    url: &'a str,
}

impl<'a> From<&'a Item> for CandidateResponse<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            id: &item.id,
            name: &item.name,
            url: &item.url,
        }
    }
}

#[derive(Serialize)]
struct RankedQuestion<'a> {
    #[serde(flatten)]
    question: &'a Trait,
    count: usize,
}

#[derive(Serialize)]
struct AnswerEntry<'a> {
    trait_id: &'a TraitId,
    answer: Answer,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: Arc<ApiState>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(RestApi::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Register all routes; state must be provided as `web::Data<Arc<ApiState>>`
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/dataset", web::get().to(dataset_info))
            .route("/traits/{id}", web::get().to(get_trait))
            .route("/items/query", web::post().to(query_items))
            .route("/items/{id}", web::get().to(get_item))
            .route("/sessions", web::post().to(create_session))
            .route("/sessions/{id}", web::get().to(get_session))
            .route("/sessions/{id}", web::delete().to(delete_session))
            .route("/sessions/{id}/candidates", web::get().to(get_candidates))
            .route("/sessions/{id}/question", web::get().to(get_question))
            .route("/sessions/{id}/questions", web::get().to(rank_questions))
            .route("/sessions/{id}/answers", web::post().to(record_answer));
    }
}

fn session_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Session not found"
    }))
}

async fn dataset_info(state: web::Data<Arc<ApiState>>) -> ActixResult<HttpResponse> {
    let dataset = state.engine.dataset();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "result": {
            "items": dataset.item_count(),
            "traits": dataset.trait_count(),
            "relations": dataset.relation_count(),
            "sessions": state.sessions.len(),
        }
    })))
}

async fn get_trait(
    state: web::Data<Arc<ApiState>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match state.engine.dataset().trait_by_id(&id) {
        Some(t) => Ok(HttpResponse::Ok().json(serde_json::json!({ "result": t }))),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Trait not found"
        }))),
    }
}

async fn get_item(
    state: web::Data<Arc<ApiState>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match state.engine.dataset().item(&id) {
        Some(item) => Ok(HttpResponse::Ok().json(serde_json::json!({ "result": item }))),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Item not found"
        }))),
    }
}

async fn query_items(
    state: web::Data<Arc<ApiState>>,
    req: web::Json<ItemQueryRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    let limit = req.limit.unwrap_or(DEFAULT_CANDIDATE_LIMIT);
    let filter = TraitFilter::new(req.filter);
    let items: Vec<CandidateResponse> = filter
        .apply(state.engine.dataset(), Some(limit))
        .into_iter()
        .map(CandidateResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "result": items })))
}

async fn create_session(state: web::Data<Arc<ApiState>>) -> ActixResult<HttpResponse> {
    let id = state.sessions.create();
    tracing::debug!(%id, "session created");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "result": { "id": id }
    })))
}

async fn get_session(
    state: web::Data<Arc<ApiState>>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    let Some(session) = state.sessions.get(&id) else {
        return Ok(session_not_found());
    };
    let session = session.lock();

    let answers: Vec<AnswerEntry> = session
        .answers()
        .iter()
        .map(|(trait_id, answer)| AnswerEntry { trait_id, answer: *answer })
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "result": {
            "id": id,
            "phase": state.engine.phase(&session, state.converge_at),
            "candidates": state.engine.candidate_count(&session),
            "answers": answers,
        }
    })))
}

async fn delete_session(
    state: web::Data<Arc<ApiState>>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    if state.sessions.remove(&id) {
        tracing::debug!(%id, "session closed");
        Ok(HttpResponse::Ok().json(serde_json::json!({ "result": true })))
    } else {
        Ok(session_not_found())
    }
}

async fn get_candidates(
    state: web::Data<Arc<ApiState>>,
    path: web::Path<Uuid>,
    query: web::Query<LimitQuery>,
) -> ActixResult<HttpResponse> {
    let Some(session) = state.sessions.get(&path.into_inner()) else {
        return Ok(session_not_found());
    };
    let session = session.lock();
    let limit = query.limit.unwrap_or(DEFAULT_CANDIDATE_LIMIT);
    let candidates: Vec<CandidateResponse> = state
        .engine
        .get_candidates(&session, limit)
        .into_iter()
        .map(CandidateResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "result": candidates })))
}

async fn get_question(
    state: web::Data<Arc<ApiState>>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let Some(session) = state.sessions.get(&path.into_inner()) else {
        return Ok(session_not_found());
    };
    let session = session.lock();
    let question = state.engine.get_next_question(&session);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "result": question })))
}

async fn rank_questions(
    state: web::Data<Arc<ApiState>>,
    path: web::Path<Uuid>,
    query: web::Query<LimitQuery>,
) -> ActixResult<HttpResponse> {
    let Some(session) = state.sessions.get(&path.into_inner()) else {
        return Ok(session_not_found());
    };
    let session = session.lock();
    let ranked: Vec<RankedQuestion> = state
        .engine
        .rank_questions(&session, query.limit.unwrap_or(5))
        .into_iter()
        .map(|(question, count)| RankedQuestion { question, count })
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "result": ranked })))
}

async fn record_answer(
    state: web::Data<Arc<ApiState>>,
    path: web::Path<Uuid>,
    req: web::Json<AnswerRequest>,
) -> ActixResult<HttpResponse> {
    let Some(session) = state.sessions.get(&path.into_inner()) else {
        return Ok(session_not_found());
    };
    let mut session = session.lock();

    match state.engine.record_answer(&mut session, &req.trait_id, req.answer) {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({ "result": true }))),
        Err(e @ (Error::InvalidAnswer(_) | Error::AlreadyAnswered(_))) => {
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": e.to_string()
            })))
        }
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}
