// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public catalog routes: books and business plans.

use crate::error::{AppError, Result};
use crate::extract::{ValidPath, ValidQuery};
use crate::middleware::identity::caller_id;
use crate::models::{Book, BookListing, BusinessPlan, BusinessPlanListing, ContentRef};
use crate::services::catalog::{group_counts, CategoryCount};
use crate::services::recommendation::clamp_limit;
use crate::services::{CatalogQuery, Page, Recommendation, RecommendationService};
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Listings are identical for every caller, so clients may cache them briefly.
const PUBLIC_CACHE_CONTROL: &str = "public, max-age=300";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/books", get(list_books))
        .route("/api/books/categories", get(book_categories))
        .route("/api/books/{id}", get(get_book))
        .route("/api/books/{id}/similar", get(similar_books))
        .route("/api/business-plans", get(list_business_plans))
        .route("/api/business-plans/industries", get(plan_industries))
        .route("/api/business-plans/{id}", get(get_business_plan))
        .route("/api/business-plans/{id}/similar", get(similar_plans))
}

fn cacheable<T: Serialize>(body: T) -> Response {
    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static(PUBLIC_CACHE_CONTROL),
        )],
        Json(body),
    )
        .into_response()
}

/// Whether the caller may read the premium part of `content`.
///
/// Unknown and suspended callers are treated as anonymous.
fn caller_has_access(state: &AppState, headers: &HeaderMap, content: &ContentRef) -> bool {
    caller_id(headers)
        .and_then(|user_id| state.db.get_user(user_id))
        .filter(|user| !user.is_suspended())
        .map(|user| state.db.get_library(user.id).has_purchased(content))
        .unwrap_or(false)
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    /// Filter by category (books)
    category: Option<String>,
    /// Filter by industry (business plans)
    industry: Option<String>,
    search: Option<String>,
    premium: Option<bool>,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    crate::services::catalog::DEFAULT_PER_PAGE
}

impl ListQuery {
    fn into_catalog_query(self, group: Option<String>) -> CatalogQuery {
        CatalogQuery {
            group,
            search: self.search,
            premium: self.premium,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

async fn list_books(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<ListQuery>,
) -> Result<Response> {
    tracing::debug!(
        category = ?params.category,
        search = ?params.search,
        page = params.page,
        "Listing books"
    );

    let group = params.category.clone();
    let page: Page<BookListing> = params
        .into_catalog_query(group)
        .apply(state.db.list_books(), Book::listing)?;
    Ok(cacheable(page))
}

async fn list_business_plans(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<ListQuery>,
) -> Result<Response> {
    tracing::debug!(
        industry = ?params.industry,
        search = ?params.search,
        page = params.page,
        "Listing business plans"
    );

    let group = params.industry.clone();
    let page: Page<BusinessPlanListing> = params
        .into_catalog_query(group)
        .apply(state.db.list_business_plans(), BusinessPlan::listing)?;
    Ok(cacheable(page))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GroupsResponse {
    pub groups: Vec<CategoryCount>,
}

async fn book_categories(State(state): State<Arc<AppState>>) -> Response {
    cacheable(GroupsResponse {
        groups: group_counts(&state.db.list_books()),
    })
}

async fn plan_industries(State(state): State<Arc<AppState>>) -> Response {
    cacheable(GroupsResponse {
        groups: group_counts(&state.db.list_business_plans()),
    })
}

// ─── Detail ──────────────────────────────────────────────────

/// Detail response; premium fields are emptied when `locked` is set.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DetailResponse<T> {
    #[serde(flatten)]
    pub item: T,
    pub locked: bool,
}

async fn get_book(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
    headers: HeaderMap,
) -> Result<Json<DetailResponse<Book>>> {
    let book = state
        .db
        .get_book(id)
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

    let locked =
        book.requires_purchase() && !caller_has_access(&state, &headers, &ContentRef::book(id));
    let item = if locked { book.locked() } else { book };

    Ok(Json(DetailResponse { item, locked }))
}

async fn get_business_plan(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
    headers: HeaderMap,
) -> Result<Json<DetailResponse<BusinessPlan>>> {
    let plan = state
        .db
        .get_business_plan(id)
        .ok_or_else(|| AppError::NotFound(format!("Business plan {} not found", id)))?;

    let locked = plan.requires_purchase()
        && !caller_has_access(&state, &headers, &ContentRef::business_plan(id));
    let item = if locked { plan.locked() } else { plan };

    Ok(Json(DetailResponse { item, locked }))
}

// ─── Similar Items ───────────────────────────────────────────

#[derive(Deserialize)]
struct SimilarQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
}

fn similar(
    state: &AppState,
    content: ContentRef,
    limit: Option<usize>,
) -> Result<Json<RecommendationsResponse>> {
    let index =
        RecommendationService::from_catalog(&state.db.list_books(), &state.db.list_business_plans());
    let recommendations = index
        .similar_to(&content, clamp_limit(limit))
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", content.kind, content.id)))?;

    Ok(Json(RecommendationsResponse { recommendations }))
}

async fn similar_books(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
    ValidQuery(params): ValidQuery<SimilarQuery>,
) -> Result<Json<RecommendationsResponse>> {
    similar(&state, ContentRef::book(id), params.limit)
}

async fn similar_plans(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<u64>,
    ValidQuery(params): ValidQuery<SimilarQuery>,
) -> Result<Json<RecommendationsResponse>> {
    similar(&state, ContentRef::business_plan(id), params.limit)
}
