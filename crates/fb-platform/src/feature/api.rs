//! Features API
//!
//! REST endpoints for the feature board: listing, search, sorting,
//! voting, and comments. Voter and comment listings resolve author
//! usernames at read time; authors that no longer exist come back with
//! `username: null`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::feature::entity::{Comment, Feature};
use crate::feature::repository::{FeatureRepository, SortMode};
use crate::shared::api_common::{CountResponse, PageParams, SuccessResponse};
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use crate::shared::tsid::TsidGenerator;
use crate::user::repository::UserRepository;

/// Create feature request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeatureRequest {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
}

/// Partial feature update; only supplied fields change
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeatureRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// New comment request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub text: String,
}

/// Search query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteDto {
    pub user: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReactionDto {
    pub user: String,
    #[serde(rename = "type")]
    pub reaction_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: String,
    pub user: String,
    pub text: String,
    pub reactions: Vec<ReactionDto>,
    pub created_at: String,
}

impl From<Comment> for CommentDto {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            user: c.user,
            text: c.text,
            reactions: c
                .reactions
                .into_iter()
                .map(|r| ReactionDto {
                    user: r.user,
                    reaction_type: r.reaction_type,
                })
                .collect(),
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Feature response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub user: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub votes: Vec<VoteDto>,
    pub comments: Vec<CommentDto>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Feature> for FeatureResponse {
    fn from(f: Feature) -> Self {
        Self {
            id: f.id,
            title: f.title,
            description: f.description,
            user: f.user,
            status: f.status,
            image_url: f.image_url,
            votes: f.votes.into_iter().map(|v| VoteDto { user: v.user }).collect(),
            comments: f.comments.into_iter().map(CommentDto::from).collect(),
            created_at: f.created_at.to_rfc3339(),
            updated_at: f.updated_at.to_rfc3339(),
        }
    }
}

/// Paginated feature listing
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureListResponse {
    pub features: Vec<FeatureResponse>,
    pub total_pages: u32,
    pub current_page: u32,
}

/// Unpaginated feature listing (search and sort)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeaturesResponse {
    pub features: Vec<FeatureResponse>,
    pub total: usize,
}

/// A voter with their username resolved; null when the account is gone
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoterResponse {
    pub user: String,
    pub username: Option<String>,
}

/// Voter listing
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VotersResponse {
    pub voters: Vec<VoterResponse>,
    pub total: usize,
}

/// A comment with its author's username resolved
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub user: String,
    pub username: Option<String>,
    pub text: String,
    pub reactions: Vec<ReactionDto>,
    pub created_at: String,
}

impl CommentResponse {
    fn new(comment: Comment, username: Option<String>) -> Self {
        let dto = CommentDto::from(comment);
        Self {
            id: dto.id,
            user: dto.user,
            username,
            text: dto.text,
            reactions: dto.reactions,
            created_at: dto.created_at,
        }
    }
}

/// Comment listing
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentsResponse {
    pub comments: Vec<CommentResponse>,
    pub total: usize,
}

/// Features service state
#[derive(Clone)]
pub struct FeaturesState {
    pub feature_repo: Arc<FeatureRepository>,
    pub user_repo: Arc<UserRepository>,
}

fn require_valid_id(id: &str) -> Result<(), PlatformError> {
    if !TsidGenerator::is_valid(id) {
        return Err(PlatformError::invalid_identifier(id));
    }
    Ok(())
}

async fn load_feature(state: &FeaturesState, id: &str) -> Result<Feature, PlatformError> {
    require_valid_id(id)?;
    state
        .feature_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Feature", id))
}

/// List features, paginated
#[utoipa::path(
    get,
    path = "",
    tag = "features",
    params(PageParams),
    responses(
        (status = 200, description = "One page of features", body = FeatureListResponse)
    )
)]
pub async fn list_features(
    State(state): State<FeaturesState>,
    Query(params): Query<PageParams>,
) -> Result<Json<FeatureListResponse>, PlatformError> {
    let total = state.feature_repo.count().await?;
    let features = state
        .feature_repo
        .find_page(params.skip(), params.limit())
        .await?;

    Ok(Json(FeatureListResponse {
        features: features.into_iter().map(FeatureResponse::from).collect(),
        total_pages: params.total_pages(total),
        current_page: params.page(),
    }))
}

/// Create a feature
#[utoipa::path(
    post,
    path = "",
    tag = "features",
    request_body = CreateFeatureRequest,
    responses(
        (status = 201, description = "Feature created", body = FeatureResponse),
        (status = 400, description = "Missing title or description"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_feature(
    State(state): State<FeaturesState>,
    auth: Authenticated,
    Json(req): Json<CreateFeatureRequest>,
) -> Result<(StatusCode, Json<FeatureResponse>), PlatformError> {
    if req.title.trim().is_empty() {
        return Err(PlatformError::validation("title is required"));
    }
    if req.description.trim().is_empty() {
        return Err(PlatformError::validation("description is required"));
    }

    let mut feature = Feature::new(req.title.trim(), req.description.trim(), &auth.user_id);
    if let Some(image_url) = req.image_url {
        feature = feature.with_image_url(image_url);
    }

    state.feature_repo.insert(&feature).await?;
    tracing::info!(feature_id = %feature.id, user_id = %auth.user_id, "Feature created");

    Ok((StatusCode::CREATED, Json(feature.into())))
}

/// Search features by title or description, case-insensitive
#[utoipa::path(
    get,
    path = "/search",
    tag = "features",
    params(("query" = String, Query, description = "Search text")),
    responses(
        (status = 200, description = "Matching features", body = FeaturesResponse),
        (status = 400, description = "Missing query")
    )
)]
pub async fn search_features(
    State(state): State<FeaturesState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<FeaturesResponse>, PlatformError> {
    let query = match params.query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => return Err(PlatformError::validation("query is required")),
    };

    let features = state.feature_repo.search(&query).await?;
    let total = features.len();

    Ok(Json(FeaturesResponse {
        features: features.into_iter().map(FeatureResponse::from).collect(),
        total,
    }))
}

/// List features in a requested order. An unrecognized option falls back
/// to default ordering rather than erroring.
#[utoipa::path(
    get,
    path = "/sort/{option}",
    tag = "features",
    params(("option" = String, Path, description = "votes | comments | new | top")),
    responses(
        (status = 200, description = "Ordered features", body = FeaturesResponse)
    )
)]
pub async fn sort_features(
    State(state): State<FeaturesState>,
    Path(option): Path<String>,
) -> Result<Json<FeaturesResponse>, PlatformError> {
    let features = match SortMode::parse(&option) {
        Some(mode) => state.feature_repo.find_sorted(mode).await?,
        None => state.feature_repo.find_all().await?,
    };
    let total = features.len();

    Ok(Json(FeaturesResponse {
        features: features.into_iter().map(FeatureResponse::from).collect(),
        total,
    }))
}

/// Total votes across all features
#[utoipa::path(
    get,
    path = "/votes/count",
    tag = "features",
    responses(
        (status = 200, description = "Vote total", body = CountResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn count_votes(
    State(state): State<FeaturesState>,
    _auth: Authenticated,
) -> Result<Json<CountResponse>, PlatformError> {
    let total_count = state.feature_repo.count_all_votes().await?;
    Ok(Json(CountResponse { total_count }))
}

/// Total comments across all features
#[utoipa::path(
    get,
    path = "/comments/count",
    tag = "features",
    responses(
        (status = 200, description = "Comment total", body = CountResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn count_comments(
    State(state): State<FeaturesState>,
    _auth: Authenticated,
) -> Result<Json<CountResponse>, PlatformError> {
    let total_count = state.feature_repo.count_all_comments().await?;
    Ok(Json(CountResponse { total_count }))
}

/// Get one feature
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "features",
    params(("id" = String, Path, description = "Feature ID")),
    responses(
        (status = 200, description = "Feature found", body = FeatureResponse),
        (status = 400, description = "Malformed ID"),
        (status = 404, description = "Feature not found")
    )
)]
pub async fn get_feature(
    State(state): State<FeaturesState>,
    Path(id): Path<String>,
) -> Result<Json<FeatureResponse>, PlatformError> {
    let feature = load_feature(&state, &id).await?;
    Ok(Json(feature.into()))
}

/// Update a feature's title and/or description
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "features",
    params(("id" = String, Path, description = "Feature ID")),
    request_body = UpdateFeatureRequest,
    responses(
        (status = 200, description = "Feature updated", body = FeatureResponse),
        (status = 404, description = "Feature not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_feature(
    State(state): State<FeaturesState>,
    _auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateFeatureRequest>,
) -> Result<Json<FeatureResponse>, PlatformError> {
    require_valid_id(&id)?;

    if let Some(ref title) = req.title {
        if title.trim().is_empty() {
            return Err(PlatformError::validation("title must not be empty"));
        }
    }
    if let Some(ref description) = req.description {
        if description.trim().is_empty() {
            return Err(PlatformError::validation("description must not be empty"));
        }
    }

    let feature = state
        .feature_repo
        .update_fields(&id, req.title.as_deref(), req.description.as_deref())
        .await?
        .ok_or_else(|| PlatformError::not_found("Feature", &id))?;

    Ok(Json(feature.into()))
}

/// Delete a feature; its votes and comments go with it
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "features",
    params(("id" = String, Path, description = "Feature ID")),
    responses(
        (status = 200, description = "Feature deleted", body = SuccessResponse),
        (status = 404, description = "Feature not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_feature(
    State(state): State<FeaturesState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    require_valid_id(&id)?;

    if !state.feature_repo.delete(&id).await? {
        return Err(PlatformError::not_found("Feature", &id));
    }

    tracing::info!(feature_id = %id, user_id = %auth.user_id, "Feature deleted");
    Ok(Json(SuccessResponse::with_message("Feature deleted")))
}

/// Toggle the authenticated user's vote on a feature. Voting twice
/// removes the vote; the response is the persisted feature state.
#[utoipa::path(
    post,
    path = "/{id}/vote",
    tag = "features",
    params(("id" = String, Path, description = "Feature ID")),
    responses(
        (status = 200, description = "Vote toggled", body = FeatureResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Feature not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_vote(
    State(state): State<FeaturesState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<FeatureResponse>, PlatformError> {
    require_valid_id(&id)?;

    let feature = state
        .feature_repo
        .toggle_vote(&id, &auth.user_id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Feature", &id))?;

    tracing::info!(
        feature_id = %id,
        user_id = %auth.user_id,
        voted = feature.has_voted(&auth.user_id),
        "Vote toggled"
    );
    Ok(Json(feature.into()))
}

/// List a feature's voters with usernames resolved
#[utoipa::path(
    get,
    path = "/{id}/vote",
    tag = "features",
    params(("id" = String, Path, description = "Feature ID")),
    responses(
        (status = 200, description = "Voters", body = VotersResponse),
        (status = 404, description = "Feature not found")
    )
)]
pub async fn list_voters(
    State(state): State<FeaturesState>,
    Path(id): Path<String>,
) -> Result<Json<VotersResponse>, PlatformError> {
    let feature = load_feature(&state, &id).await?;

    let ids: Vec<String> = feature.votes.iter().map(|v| v.user.clone()).collect();
    let usernames = state.user_repo.find_usernames(&ids).await?;

    let voters: Vec<VoterResponse> = feature
        .votes
        .into_iter()
        .map(|v| VoterResponse {
            username: usernames.get(&v.user).cloned(),
            user: v.user,
        })
        .collect();

    let total = voters.len();
    Ok(Json(VotersResponse { voters, total }))
}

/// Comment on a feature
#[utoipa::path(
    post,
    path = "/{id}/comments",
    tag = "features",
    params(("id" = String, Path, description = "Feature ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentDto),
        (status = 400, description = "Empty comment text"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Feature not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_comment(
    State(state): State<FeaturesState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentDto>), PlatformError> {
    require_valid_id(&id)?;

    if req.text.trim().is_empty() {
        return Err(PlatformError::validation("comment text is required"));
    }

    let comment = Comment::new(&auth.user_id, req.text.trim());
    if !state.feature_repo.push_comment(&id, &comment).await? {
        return Err(PlatformError::not_found("Feature", &id));
    }

    tracing::info!(feature_id = %id, comment_id = %comment.id, user_id = %auth.user_id, "Comment added");
    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// List a feature's comments with author usernames resolved
#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = "features",
    params(("id" = String, Path, description = "Feature ID")),
    responses(
        (status = 200, description = "Comments", body = CommentsResponse),
        (status = 404, description = "Feature not found")
    )
)]
pub async fn list_comments(
    State(state): State<FeaturesState>,
    Path(id): Path<String>,
) -> Result<Json<CommentsResponse>, PlatformError> {
    let feature = load_feature(&state, &id).await?;

    let ids: Vec<String> = feature.comments.iter().map(|c| c.user.clone()).collect();
    let usernames = state.user_repo.find_usernames(&ids).await?;

    let comments: Vec<CommentResponse> = feature
        .comments
        .into_iter()
        .map(|c| {
            let username = usernames.get(&c.user).cloned();
            CommentResponse::new(c, username)
        })
        .collect();

    let total = comments.len();
    Ok(Json(CommentsResponse { comments, total }))
}

/// Get one comment of a feature
#[utoipa::path(
    get,
    path = "/{id}/comments/{comment_id}",
    tag = "features",
    params(
        ("id" = String, Path, description = "Feature ID"),
        ("comment_id" = String, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment found", body = CommentResponse),
        (status = 404, description = "Feature or comment not found")
    )
)]
pub async fn get_comment(
    State(state): State<FeaturesState>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Json<CommentResponse>, PlatformError> {
    require_valid_id(&comment_id)?;
    let feature = load_feature(&state, &id).await?;

    let comment = feature
        .comment(&comment_id)
        .cloned()
        .ok_or_else(|| PlatformError::not_found("Comment", &comment_id))?;

    let usernames = state.user_repo.find_usernames(&[comment.user.clone()]).await?;
    let username = usernames.get(&comment.user).cloned();

    Ok(Json(CommentResponse::new(comment, username)))
}

/// Edit a comment's text in place
#[utoipa::path(
    patch,
    path = "/{id}/comments/{comment_id}",
    tag = "features",
    params(
        ("id" = String, Path, description = "Feature ID"),
        ("comment_id" = String, Path, description = "Comment ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentDto),
        (status = 400, description = "Empty comment text"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn edit_comment(
    State(state): State<FeaturesState>,
    _auth: Authenticated,
    Path((id, comment_id)): Path<(String, String)>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<CommentDto>, PlatformError> {
    require_valid_id(&id)?;
    require_valid_id(&comment_id)?;

    if req.text.trim().is_empty() {
        return Err(PlatformError::validation("comment text is required"));
    }

    let comment = state
        .feature_repo
        .update_comment_text(&comment_id, req.text.trim())
        .await?
        .ok_or_else(|| PlatformError::not_found("Comment", &comment_id))?;

    Ok(Json(comment.into()))
}

/// Create features router
pub fn features_router(state: FeaturesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_features, create_feature))
        .routes(routes!(search_features))
        .routes(routes!(sort_features))
        .routes(routes!(count_votes))
        .routes(routes!(count_comments))
        .routes(routes!(get_feature, update_feature, delete_feature))
        .routes(routes!(toggle_vote, list_voters))
        .routes(routes!(add_comment, list_comments))
        .routes(routes!(get_comment, edit_comment))
        .with_state(state)
}
