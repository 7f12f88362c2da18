//! API routes for Agora endpoints

use agora_core::{
    Argument, Debate, DebateAnalytics, DebateStatus, EngagementMetrics, LeaderboardEntry,
    Personality, PersonalityStats, PersonalityUpdate, RankBy,
};
use agora_debate::{AdvanceOutcome, PlatformStats};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

use crate::auth::Admin;
use crate::error::{ApiError, ApiResult, ErrorBody, ErrorResponse};
use crate::sanitize::{sanitize_text, validate_identifier, validate_reasoning, validate_topic};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;
const MAX_SHORT_LIST: usize = 50;

fn clamp_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
    limit.unwrap_or(default).clamp(1, max)
}

fn parse_debate_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("'{}' is not a valid debate id", raw)))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<ComponentHealth>,
}

/// Component health status
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub storage: ComponentStatus,
    pub generator: ComponentStatus,
}

/// Individual component status
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Basic health check handler (lightweight)
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Basic health check", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        components: None,
    })
}

/// Detailed health check with storage connectivity
#[utoipa::path(
    get,
    path = "/health/detailed",
    responses(
        (status = 200, description = "Detailed health check with component status", body = HealthResponse)
    )
)]
pub async fn health_detailed(State(state): State<AppState>) -> Json<HealthResponse> {
    let start = std::time::Instant::now();
    let storage_healthy = state.engine().storage_healthy().await;
    let storage_latency = start.elapsed().as_millis() as u64;

    Json(HealthResponse {
        status: if storage_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        components: Some(ComponentHealth {
            storage: ComponentStatus {
                status: if storage_healthy { "healthy" } else { "unhealthy" }.to_string(),
                latency_ms: Some(storage_latency),
                detail: None,
            },
            generator: ComponentStatus {
                status: "healthy".to_string(),
                latency_ms: None,
                detail: Some(state.engine().generator_name().to_string()),
            },
        }),
    })
}

// ---------------------------------------------------------------------------
// Debates
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<usize>,
    /// Page size, clamped to 1..=100
    pub limit: Option<usize>,
    /// created, in_progress, completed or judged
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DebateListResponse {
    pub debates: Vec<Debate>,
    pub pagination: Pagination,
}

/// List debates handler
#[utoipa::path(
    get,
    path = "/api/v1/debates",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of debates, newest first", body = DebateListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorResponse)
    )
)]
pub async fn list_debates(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<DebateListResponse>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<DebateStatus>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = clamp_limit(query.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);

    let result = state.engine().list(page, limit, status).await?;
    let pages = result.pages();
    Ok(Json(DebateListResponse {
        pagination: Pagination {
            page: result.page,
            limit: result.limit,
            total: result.total,
            pages,
        },
        debates: result.debates,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDebateRequest {
    pub topic: String,
    pub creator_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DebateResponse {
    pub debate: Debate,
    pub message: String,
}

/// Create debate handler
#[utoipa::path(
    post,
    path = "/api/v1/debates",
    request_body = CreateDebateRequest,
    responses(
        (status = 201, description = "Debate created with the current roster", body = DebateResponse),
        (status = 422, description = "Invalid topic", body = ErrorResponse)
    )
)]
pub async fn create_debate(
    State(state): State<AppState>,
    Json(req): Json<CreateDebateRequest>,
) -> ApiResult<(StatusCode, Json<DebateResponse>)> {
    let topic = validate_topic(&req.topic)?;
    let creator_id = req
        .creator_id
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(|c| validate_identifier("creator_id", c))
        .transpose()?;

    let debate = state.engine().create(&topic, creator_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(DebateResponse {
            debate,
            message: "Debate created successfully".to_string(),
        }),
    ))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive topic substring
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DebatesResponse {
    pub debates: Vec<Debate>,
}

/// Recent debates handler
#[utoipa::path(
    get,
    path = "/api/v1/debates/recent",
    params(RecentQuery),
    responses(
        (status = 200, description = "Most recently created debates", body = DebatesResponse)
    )
)]
pub async fn recent_debates(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<DebatesResponse>> {
    let limit = clamp_limit(query.limit, DEFAULT_PAGE_SIZE, MAX_SHORT_LIST);
    let debates = state.engine().recent(limit).await?;
    Ok(Json(DebatesResponse { debates }))
}

/// Search debates handler
#[utoipa::path(
    get,
    path = "/api/v1/debates/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Debates whose topic matches", body = DebatesResponse),
        (status = 400, description = "Missing query", body = ErrorResponse)
    )
)]
pub async fn search_debates(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<DebatesResponse>> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("query parameter 'q' is required".to_string()))?;
    let limit = clamp_limit(query.limit, DEFAULT_PAGE_SIZE, MAX_SHORT_LIST);
    let debates = state.engine().search(q, limit).await?;
    Ok(Json(DebatesResponse { debates }))
}

/// Get debate handler
#[utoipa::path(
    get,
    path = "/api/v1/debates/{id}",
    params(("id" = String, Path, description = "Debate ID")),
    responses(
        (status = 200, description = "The debate with its arguments", body = Debate),
        (status = 404, description = "Debate not found", body = ErrorResponse)
    )
)]
pub async fn get_debate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Debate>> {
    let id = parse_debate_id(&id)?;
    Ok(Json(state.engine().get(id).await?))
}

/// Delete debate handler
#[utoipa::path(
    delete,
    path = "/api/v1/debates/{id}",
    params(("id" = String, Path, description = "Debate ID")),
    responses(
        (status = 204, description = "Debate deleted"),
        (status = 403, description = "Admin routes disabled", body = ErrorResponse),
        (status = 404, description = "Debate not found", body = ErrorResponse)
    ),
    security(("admin_token" = []))
)]
pub async fn delete_debate(
    _admin: Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_debate_id(&id)?;
    state.engine().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoundResponse {
    pub round: u32,
    pub debate: Debate,
    pub arguments: Vec<Argument>,
    pub message: String,
}

/// Start debate handler
#[utoipa::path(
    post,
    path = "/api/v1/debates/{id}/start",
    params(("id" = String, Path, description = "Debate ID")),
    responses(
        (status = 200, description = "Debate started and round one generated", body = RoundResponse),
        (status = 409, description = "Debate already started", body = ErrorResponse),
        (status = 504, description = "Round generation timed out", body = ErrorResponse)
    )
)]
pub async fn start_debate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RoundResponse>> {
    let id = parse_debate_id(&id)?;
    let report = state.engine().start(id).await?;
    Ok(Json(RoundResponse {
        round: report.round,
        debate: report.debate,
        arguments: report.arguments,
        message: "Debate started successfully".to_string(),
    }))
}

/// Either the next round, or the notice that the debate has ended
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum NextRoundResponse {
    Round(RoundResponse),
    Ended {
        debate_ended: bool,
        debate: Debate,
        message: String,
    },
}

/// Next round handler
#[utoipa::path(
    post,
    path = "/api/v1/debates/{id}/next-round",
    params(("id" = String, Path, description = "Debate ID")),
    responses(
        (status = 200, description = "Next round generated, or the debate completed", body = NextRoundResponse),
        (status = 409, description = "Debate is not in progress", body = ErrorResponse),
        (status = 504, description = "Round generation timed out", body = ErrorResponse)
    )
)]
pub async fn next_round(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<NextRoundResponse>> {
    let id = parse_debate_id(&id)?;
    let response = match state.engine().advance_round(id).await? {
        AdvanceOutcome::Round(report) => NextRoundResponse::Round(RoundResponse {
            round: report.round,
            message: format!("Round {} completed", report.round),
            debate: report.debate,
            arguments: report.arguments,
        }),
        AdvanceOutcome::Ended(debate) => NextRoundResponse::Ended {
            debate_ended: true,
            debate,
            message: "Debate completed - all rounds finished".to_string(),
        },
    };
    Ok(Json(response))
}

/// End debate handler
#[utoipa::path(
    post,
    path = "/api/v1/debates/{id}/end",
    params(("id" = String, Path, description = "Debate ID")),
    responses(
        (status = 200, description = "Debate completed", body = DebateResponse),
        (status = 409, description = "Debate is not in progress", body = ErrorResponse)
    )
)]
pub async fn end_debate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DebateResponse>> {
    let id = parse_debate_id(&id)?;
    let debate = state.engine().end(id).await?;
    Ok(Json(DebateResponse {
        debate,
        message: "Debate ended".to_string(),
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JudgeRequest {
    pub winner: String,
    pub reasoning: Option<String>,
    pub judge_id: Option<String>,
}

/// Judge debate handler
#[utoipa::path(
    post,
    path = "/api/v1/debates/{id}/judge",
    params(("id" = String, Path, description = "Debate ID")),
    request_body = JudgeRequest,
    responses(
        (status = 200, description = "Verdict recorded and statistics updated", body = DebateResponse),
        (status = 409, description = "Not judgeable or already judged", body = ErrorResponse),
        (status = 422, description = "Winner is not a participant", body = ErrorResponse)
    )
)]
pub async fn judge_debate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<JudgeRequest>,
) -> ApiResult<Json<DebateResponse>> {
    let id = parse_debate_id(&id)?;
    let winner = validate_identifier("winner", &req.winner)?;
    let reasoning = validate_reasoning(req.reasoning.as_deref())?;
    let judge_id = req
        .judge_id
        .as_deref()
        .filter(|j| !j.trim().is_empty())
        .map(|j| validate_identifier("judge_id", j))
        .transpose()?;

    let debate = state
        .engine()
        .judge(id, &winner, reasoning, judge_id)
        .await?;
    Ok(Json(DebateResponse {
        debate,
        message: format!("{} declared the winner", winner),
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VoteRequest {
    pub personality_id: String,
    pub voter_id: String,
    pub argument_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResponse {
    pub debate_id: Uuid,
    pub personality_id: String,
    /// Votes this participant now holds
    pub votes: u64,
    pub total_votes: u64,
    pub message: String,
}

/// Vote handler
#[utoipa::path(
    post,
    path = "/api/v1/debates/{id}/vote",
    params(("id" = String, Path, description = "Debate ID")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = VoteResponse),
        (status = 409, description = "Voting closed or duplicate vote", body = ErrorResponse),
        (status = 422, description = "Unknown participant", body = ErrorResponse)
    )
)]
pub async fn vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<Json<VoteResponse>> {
    let id = parse_debate_id(&id)?;
    let personality_id = validate_identifier("personality_id", &req.personality_id)?;
    let voter_id = validate_identifier("voter_id", &req.voter_id)?;

    let debate = state
        .engine()
        .vote(id, &personality_id, &voter_id, req.argument_id)
        .await?;
    Ok(Json(VoteResponse {
        debate_id: debate.id,
        votes: debate.votes_for(&personality_id),
        total_votes: debate.total_votes,
        personality_id,
        message: "Vote recorded successfully".to_string(),
    }))
}

/// Debate analytics handler
#[utoipa::path(
    get,
    path = "/api/v1/debates/{id}/analytics",
    params(("id" = String, Path, description = "Debate ID")),
    responses(
        (status = 200, description = "Scores, engagement and summary", body = DebateAnalytics),
        (status = 404, description = "Debate not found", body = ErrorResponse)
    )
)]
pub async fn debate_analytics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DebateAnalytics>> {
    let id = parse_debate_id(&id)?;
    Ok(Json(state.engine().analytics(id).await?))
}

// ---------------------------------------------------------------------------
// Personalities
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct PersonalitiesResponse {
    pub personalities: Vec<Personality>,
}

/// List personalities handler
#[utoipa::path(
    get,
    path = "/api/v1/personalities",
    responses(
        (status = 200, description = "Every registered personality", body = PersonalitiesResponse)
    )
)]
pub async fn list_personalities(
    State(state): State<AppState>,
) -> ApiResult<Json<PersonalitiesResponse>> {
    let personalities = state.engine().registry().list_all().await?;
    Ok(Json(PersonalitiesResponse { personalities }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePersonalityRequest {
    pub name: String,
    pub description: String,
    pub personality_traits: Vec<String>,
    pub debate_style: String,
    pub system_prompt: String,
}

fn clean_traits(traits: &[String]) -> Vec<String> {
    traits
        .iter()
        .map(|t| sanitize_text(t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Create personality handler
#[utoipa::path(
    post,
    path = "/api/v1/personalities",
    request_body = CreatePersonalityRequest,
    responses(
        (status = 201, description = "Personality created", body = Personality),
        (status = 403, description = "Admin routes disabled", body = ErrorResponse),
        (status = 422, description = "Invalid profile or duplicate name", body = ErrorResponse)
    ),
    security(("admin_token" = []))
)]
pub async fn create_personality(
    _admin: Admin,
    State(state): State<AppState>,
    Json(req): Json<CreatePersonalityRequest>,
) -> ApiResult<(StatusCode, Json<Personality>)> {
    let name = validate_identifier("name", &req.name)?;
    let personality = Personality::new(
        sanitize_text(&name),
        sanitize_text(&req.description),
        clean_traits(&req.personality_traits),
        sanitize_text(&req.debate_style),
        req.system_prompt.trim(),
    );
    let created = state.engine().registry().create(personality).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Leaderboard handler
#[utoipa::path(
    get,
    path = "/api/v1/personalities/leaderboard",
    responses(
        (status = 200, description = "Personalities ranked by win rate", body = LeaderboardResponse)
    )
)]
pub async fn leaderboard(State(state): State<AppState>) -> ApiResult<Json<LeaderboardResponse>> {
    let leaderboard = state.engine().registry().leaderboard().await?;
    Ok(Json(LeaderboardResponse { leaderboard }))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopQuery {
    pub limit: Option<usize>,
    /// wins, total_debates or average_votes
    pub sort_by: Option<String>,
}

/// Top personalities handler
#[utoipa::path(
    get,
    path = "/api/v1/personalities/top",
    params(TopQuery),
    responses(
        (status = 200, description = "Top personalities by the chosen key", body = PersonalitiesResponse)
    )
)]
pub async fn top_personalities(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> ApiResult<Json<PersonalitiesResponse>> {
    let limit = clamp_limit(query.limit, 5, MAX_SHORT_LIST);
    let sort_by = RankBy::from_key(query.sort_by.as_deref().unwrap_or("wins"));
    let personalities = state.engine().registry().top(limit, sort_by).await?;
    Ok(Json(PersonalitiesResponse { personalities }))
}

/// Get personality handler
#[utoipa::path(
    get,
    path = "/api/v1/personalities/{name}",
    params(("name" = String, Path, description = "Personality name")),
    responses(
        (status = 200, description = "The personality profile", body = Personality),
        (status = 404, description = "Personality not found", body = ErrorResponse)
    )
)]
pub async fn get_personality(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Personality>> {
    Ok(Json(state.engine().registry().get(&name).await?))
}

/// Personality statistics handler
#[utoipa::path(
    get,
    path = "/api/v1/personalities/{name}/stats",
    params(("name" = String, Path, description = "Personality name")),
    responses(
        (status = 200, description = "Derived statistics", body = PersonalityStats),
        (status = 404, description = "Personality not found", body = ErrorResponse)
    )
)]
pub async fn personality_stats(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<PersonalityStats>> {
    Ok(Json(state.engine().registry().stats(&name).await?))
}

/// Update personality handler
#[utoipa::path(
    put,
    path = "/api/v1/personalities/{name}",
    params(("name" = String, Path, description = "Personality name")),
    request_body = PersonalityUpdate,
    responses(
        (status = 200, description = "Updated profile", body = Personality),
        (status = 404, description = "Personality not found", body = ErrorResponse),
        (status = 422, description = "Invalid profile", body = ErrorResponse)
    ),
    security(("admin_token" = []))
)]
pub async fn update_personality(
    _admin: Admin,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(update): Json<PersonalityUpdate>,
) -> ApiResult<Json<Personality>> {
    let update = PersonalityUpdate {
        description: update.description.as_deref().map(sanitize_text),
        personality_traits: update.personality_traits.as_deref().map(clean_traits),
        debate_style: update.debate_style.as_deref().map(sanitize_text),
        system_prompt: update.system_prompt.map(|p| p.trim().to_string()),
    };
    Ok(Json(state.engine().registry().update(&name, update).await?))
}

/// Delete personality handler
#[utoipa::path(
    delete,
    path = "/api/v1/personalities/{name}",
    params(("name" = String, Path, description = "Personality name")),
    responses(
        (status = 204, description = "Personality deleted"),
        (status = 404, description = "Personality not found", body = ErrorResponse)
    ),
    security(("admin_token" = []))
)]
pub async fn delete_personality(
    _admin: Admin,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    state.engine().registry().delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ResetStatsRequest {
    /// Reset one personality; all of them when absent
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetStatsResponse {
    pub reset: usize,
}

/// Reset statistics handler
#[utoipa::path(
    post,
    path = "/api/v1/personalities/reset-stats",
    request_body = ResetStatsRequest,
    responses(
        (status = 200, description = "Number of personalities reset", body = ResetStatsResponse),
        (status = 404, description = "Personality not found", body = ErrorResponse)
    ),
    security(("admin_token" = []))
)]
pub async fn reset_stats(
    _admin: Admin,
    State(state): State<AppState>,
    Json(req): Json<ResetStatsRequest>,
) -> ApiResult<Json<ResetStatsResponse>> {
    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let reset = state.engine().registry().reset_stats(name).await?;
    Ok(Json(ResetStatsResponse { reset }))
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub stats: PlatformStats,
}

/// Platform statistics handler
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    responses(
        (status = 200, description = "Platform-wide counts", body = StatsResponse)
    )
)]
pub async fn platform_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = state.engine().platform_stats().await?;
    Ok(Json(StatsResponse { stats }))
}

/// Metrics response
#[derive(Debug, Serialize, ToSchema)]
pub struct MetricsResponse {
    pub llm_calls: u64,
    pub llm_errors: u64,
    pub tokens_used: u64,
    pub debates_created: u64,
    pub rounds_generated: u64,
    pub fallback_arguments: u64,
    pub votes_cast: u64,
    pub debates_judged: u64,
    pub http_requests: u64,
    pub http_errors: u64,
    pub llm_error_rate: f64,
}

/// Get metrics handler
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    responses(
        (status = 200, description = "Current platform counters", body = MetricsResponse)
    )
)]
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let snapshot = state.metrics().snapshot();
    Json(MetricsResponse {
        llm_error_rate: snapshot.llm_error_rate(),
        llm_calls: snapshot.llm_calls,
        llm_errors: snapshot.llm_errors,
        tokens_used: snapshot.tokens_used,
        debates_created: snapshot.debates_created,
        rounds_generated: snapshot.rounds_generated,
        fallback_arguments: snapshot.fallback_arguments,
        votes_cast: snapshot.votes_cast,
        debates_judged: snapshot.debates_judged,
        http_requests: snapshot.http_requests,
        http_errors: snapshot.http_errors,
    })
}

/// Prometheus metrics handler
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus formatted metrics", body = String)
    )
)]
pub async fn get_prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics().snapshot().to_prometheus(),
    )
}

/// OpenAPI document handler
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        health_detailed,
        list_debates,
        create_debate,
        recent_debates,
        search_debates,
        get_debate,
        delete_debate,
        start_debate,
        next_round,
        end_debate,
        judge_debate,
        vote,
        debate_analytics,
        list_personalities,
        create_personality,
        leaderboard,
        top_personalities,
        get_personality,
        personality_stats,
        update_personality,
        delete_personality,
        reset_stats,
        platform_stats,
        get_metrics,
        get_prometheus_metrics,
    ),
    components(
        schemas(
            HealthResponse, ComponentHealth, ComponentStatus,
            ErrorResponse, ErrorBody,
            Debate, DebateStatus, Argument, DebateAnalytics, EngagementMetrics,
            Personality, PersonalityUpdate, PersonalityStats, LeaderboardEntry,
            PlatformStats,
            Pagination, DebateListResponse, DebatesResponse, DebateResponse,
            CreateDebateRequest, RoundResponse, NextRoundResponse,
            JudgeRequest, VoteRequest, VoteResponse,
            PersonalitiesResponse, CreatePersonalityRequest, LeaderboardResponse,
            ResetStatsRequest, ResetStatsResponse,
            StatsResponse, MetricsResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_token",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .build(),
                ),
            )
        }
    }
}

/// Build the API router
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Documentation
        .route("/api-docs/openapi.json", get(openapi_json))
        // Public endpoints
        .route("/health", get(health))
        .route("/health/detailed", get(health_detailed))
        // Debates
        .route("/api/v1/debates", get(list_debates).post(create_debate))
        .route("/api/v1/debates/recent", get(recent_debates))
        .route("/api/v1/debates/search", get(search_debates))
        .route("/api/v1/debates/{id}", get(get_debate).delete(delete_debate))
        .route("/api/v1/debates/{id}/start", post(start_debate))
        .route("/api/v1/debates/{id}/next-round", post(next_round))
        .route("/api/v1/debates/{id}/end", post(end_debate))
        .route("/api/v1/debates/{id}/judge", post(judge_debate))
        .route("/api/v1/debates/{id}/vote", post(vote))
        .route("/api/v1/debates/{id}/analytics", get(debate_analytics))
        // Personalities
        .route(
            "/api/v1/personalities",
            get(list_personalities).post(create_personality),
        )
        .route("/api/v1/personalities/leaderboard", get(leaderboard))
        .route("/api/v1/personalities/top", get(top_personalities))
        .route("/api/v1/personalities/reset-stats", post(reset_stats))
        .route(
            "/api/v1/personalities/{name}",
            get(get_personality)
                .put(update_personality)
                .delete(delete_personality),
        )
        .route("/api/v1/personalities/{name}/stats", get(personality_stats))
        // Platform
        .route("/api/v1/stats", get(platform_stats))
        .route("/api/v1/metrics", get(get_metrics))
        .route("/metrics", get(get_prometheus_metrics))
        .with_state(state)
}
