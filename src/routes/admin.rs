// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel routes: catalog management, users, payments and stats.
//!
//! Identity and admin middleware are applied in routes/mod.rs.

use crate::error::{AppError, Result};
use crate::extract::{ValidJson, ValidPath, ValidQuery};
use crate::middleware::identity::AuthUser;
use crate::models::{Book, BusinessPlan, Payment, PaymentStatus, User, UserRole, UserStatus};
use crate::routes::SuccessResponse;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/books", get(list_books).post(create_book))
        .route(
            "/api/admin/books/{id}",
            put(update_book).delete(delete_book),
        )
        .route(
            "/api/admin/business-plans",
            get(list_business_plans).post(create_business_plan),
        )
        .route(
            "/api/admin/business-plans/{id}",
            put(update_business_plan).delete(delete_business_plan),
        )
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}", put(update_user).delete(delete_user))
        .route("/api/admin/payments", get(list_payments))
        .route("/api/admin/stats", get(get_stats))
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn trimmed_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// ─── Books ───────────────────────────────────────────────────

/// Admins see full books, including premium fields.
async fn list_books(State(state): State<Arc<AppState>>) -> Json<Vec<Book>> {
    Json(state.db.list_books())
}

#[derive(Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: String,
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub author: String,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_takeaways: Vec<String>,
    #[validate(url)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f32,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub is_premium: bool,
    #[validate(range(min = 1000, max = 2100))]
    pub published_year: Option<u16>,
}

async fn create_book(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateBookRequest>,
) -> (StatusCode, Json<Book>) {
    let now = now_rfc3339();
    let book = state.db.create_book(|id| {
        let mut book = Book {
            id,
            title: req.title.trim().to_string(),
            author: req.author.trim().to_string(),
            category: req.category.trim().to_string(),
            description: req.description,
            summary: req.summary,
            key_takeaways: req.key_takeaways,
            cover_image: req.cover_image,
            pages: req.pages,
            word_count: 0,
            reading_time_minutes: 0,
            rating: req.rating,
            tags: trimmed_tags(req.tags),
            price: req.price,
            is_premium: req.is_premium,
            published_year: req.published_year,
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        book.normalize(&now);
        book
    });

    tracing::info!(admin_id = auth.id(), book_id = book.id, title = %book.title, "Book created");
    (StatusCode::CREATED, Json(book))
}

/// Partial book update; absent fields are left unchanged.
#[derive(Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub category: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub summary: Option<String>,
    pub key_takeaways: Option<Vec<String>>,
    #[validate(url)]
    pub cover_image: Option<String>,
    pub pages: Option<u32>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f32>,
    #[validate(length(max = 30))]
    pub tags: Option<Vec<String>>,
    pub price: Option<u32>,
    pub is_premium: Option<bool>,
    #[validate(range(min = 1000, max = 2100))]
    pub published_year: Option<u16>,
}

async fn update_book(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath(id): ValidPath<u64>,
    ValidJson(req): ValidJson<UpdateBookRequest>,
) -> Result<Json<Book>> {
    let now = now_rfc3339();
    let book = state
        .db
        .update_book(id, |book| {
            if let Some(title) = req.title {
                book.title = title.trim().to_string();
            }
            if let Some(author) = req.author {
                book.author = author.trim().to_string();
            }
            if let Some(category) = req.category {
                book.category = category.trim().to_string();
            }
            if let Some(description) = req.description {
                book.description = description;
            }
            if let Some(summary) = req.summary {
                // Recount from the new text
                book.summary = summary;
                book.word_count = 0;
                book.reading_time_minutes = 0;
            }
            if let Some(key_takeaways) = req.key_takeaways {
                book.key_takeaways = key_takeaways;
            }
            if req.cover_image.is_some() {
                book.cover_image = req.cover_image;
            }
            if let Some(pages) = req.pages {
                book.pages = pages;
            }
            if let Some(rating) = req.rating {
                book.rating = rating;
            }
            if let Some(tags) = req.tags {
                book.tags = trimmed_tags(tags);
            }
            if let Some(price) = req.price {
                book.price = price;
            }
            if let Some(is_premium) = req.is_premium {
                book.is_premium = is_premium;
            }
            if req.published_year.is_some() {
                book.published_year = req.published_year;
            }
            book.updated_at = now.clone();
            book.normalize(&now);
        })
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

    tracing::info!(admin_id = auth.id(), book_id = id, "Book updated");
    Ok(Json(book))
}

async fn delete_book(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath(id): ValidPath<u64>,
) -> Result<Json<SuccessResponse>> {
    let book = state
        .db
        .delete_book(id)
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

    tracing::info!(admin_id = auth.id(), book_id = id, title = %book.title, "Book deleted");
    Ok(SuccessResponse::new(format!("Book {} deleted", id)))
}

// ─── Business Plans ──────────────────────────────────────────

async fn list_business_plans(State(state): State<Arc<AppState>>) -> Json<Vec<BusinessPlan>> {
    Json(state.db.list_business_plans())
}

fn check_investment_range(min: u64, max: u64) -> Result<()> {
    if min > max {
        return Err(AppError::BadRequest(format!(
            "min_investment ({}) must not exceed max_investment ({})",
            min, max
        )));
    }
    Ok(())
}

#[derive(Deserialize, Validate)]
pub struct CreateBusinessPlanRequest {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: String,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub industry: String,
    #[validate(length(min = 1, max = 2000), custom(function = "not_blank"))]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub sections: Vec<String>,
    #[serde(default)]
    pub min_investment: u64,
    #[serde(default)]
    pub max_investment: u64,
    #[validate(length(max = 100))]
    pub expected_roi: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f32,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub is_premium: bool,
}

async fn create_business_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateBusinessPlanRequest>,
) -> Result<(StatusCode, Json<BusinessPlan>)> {
    check_investment_range(req.min_investment, req.max_investment)?;

    let now = now_rfc3339();
    let plan = state.db.create_business_plan(|id| {
        let mut plan = BusinessPlan {
            id,
            title: req.title.trim().to_string(),
            industry: req.industry.trim().to_string(),
            description: req.description,
            content: req.content,
            sections: req.sections,
            min_investment: req.min_investment,
            max_investment: req.max_investment,
            expected_roi: req.expected_roi,
            rating: req.rating,
            tags: trimmed_tags(req.tags),
            price: req.price,
            is_premium: req.is_premium,
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        plan.normalize(&now);
        plan
    });

    tracing::info!(admin_id = auth.id(), plan_id = plan.id, title = %plan.title, "Business plan created");
    Ok((StatusCode::CREATED, Json(plan)))
}

#[derive(Deserialize, Validate)]
pub struct UpdateBusinessPlanRequest {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub industry: Option<String>,
    #[validate(length(min = 1, max = 2000), custom(function = "not_blank"))]
    pub description: Option<String>,
    pub content: Option<String>,
    #[validate(length(max = 50))]
    pub sections: Option<Vec<String>>,
    pub min_investment: Option<u64>,
    pub max_investment: Option<u64>,
    #[validate(length(max = 100))]
    pub expected_roi: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f32>,
    #[validate(length(max = 30))]
    pub tags: Option<Vec<String>>,
    pub price: Option<u32>,
    pub is_premium: Option<bool>,
}

async fn update_business_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath(id): ValidPath<u64>,
    ValidJson(req): ValidJson<UpdateBusinessPlanRequest>,
) -> Result<Json<BusinessPlan>> {
    let now = now_rfc3339();
    let plan = state
        .db
        .update_business_plan(id, |plan| {
            check_investment_range(
                req.min_investment.unwrap_or(plan.min_investment),
                req.max_investment.unwrap_or(plan.max_investment),
            )?;
            if let Some(title) = req.title {
                plan.title = title.trim().to_string();
            }
            if let Some(industry) = req.industry {
                plan.industry = industry.trim().to_string();
            }
            if let Some(description) = req.description {
                plan.description = description;
            }
            if let Some(content) = req.content {
                plan.content = content;
            }
            if let Some(sections) = req.sections {
                plan.sections = sections;
            }
            if let Some(min) = req.min_investment {
                plan.min_investment = min;
            }
            if let Some(max) = req.max_investment {
                plan.max_investment = max;
            }
            if req.expected_roi.is_some() {
                plan.expected_roi = req.expected_roi;
            }
            if let Some(rating) = req.rating {
                plan.rating = rating;
            }
            if let Some(tags) = req.tags {
                plan.tags = trimmed_tags(tags);
            }
            if let Some(price) = req.price {
                plan.price = price;
            }
            if let Some(is_premium) = req.is_premium {
                plan.is_premium = is_premium;
            }
            plan.updated_at = now.clone();
            plan.normalize(&now);
            Ok(())
        })
        .ok_or_else(|| AppError::NotFound(format!("Business plan {} not found", id)))??;

    tracing::info!(admin_id = auth.id(), plan_id = id, "Business plan updated");
    Ok(Json(plan))
}

async fn delete_business_plan(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath(id): ValidPath<u64>,
) -> Result<Json<SuccessResponse>> {
    let plan = state
        .db
        .delete_business_plan(id)
        .ok_or_else(|| AppError::NotFound(format!("Business plan {} not found", id)))?;

    tracing::info!(admin_id = auth.id(), plan_id = id, title = %plan.title, "Business plan deleted");
    Ok(SuccessResponse::new(format!("Business plan {} deleted", id)))
}

// ─── Users ───────────────────────────────────────────────────

async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<User>> {
    Json(state.db.list_users())
}

#[derive(Deserialize, Validate)]
pub struct UpdateUserRequest {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath(id): ValidPath<u64>,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> Result<Json<User>> {
    if req.role.is_none() && req.status.is_none() {
        return Err(AppError::BadRequest(
            "Nothing to update; set role and/or status".to_string(),
        ));
    }

    let user = state
        .db
        .update_user(id, |u| {
            if let Some(role) = req.role {
                u.role = role;
            }
            if let Some(status) = req.status {
                u.status = status;
            }
        })
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    tracing::info!(
        admin_id = auth.id(),
        user_id = id,
        role = ?user.role,
        status = ?user.status,
        "User updated"
    );
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath(id): ValidPath<u64>,
) -> Result<Json<SuccessResponse>> {
    if id == auth.id() {
        return Err(AppError::Conflict(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    state
        .db
        .delete_user(id)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    tracing::info!(admin_id = auth.id(), user_id = id, "User deleted");
    Ok(SuccessResponse::new(format!("User {} deleted", id)))
}

// ─── Payments & Stats ────────────────────────────────────────

#[derive(Deserialize)]
struct PaymentFilter {
    status: Option<PaymentStatus>,
}

async fn list_payments(
    State(state): State<Arc<AppState>>,
    ValidQuery(filter): ValidQuery<PaymentFilter>,
) -> Json<Vec<Payment>> {
    Json(state.db.list_payments(None, filter.status))
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatsResponse {
    pub books: usize,
    pub business_plans: usize,
    pub users: usize,
    pub admins: usize,
    pub suspended_users: usize,
    /// Payment count per status name
    pub payments: BTreeMap<String, usize>,
    /// Sum of completed payments in birr
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub revenue: u64,
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let users = state.db.list_users();
    let payments = state.db.list_payments(None, None);

    let mut by_status: BTreeMap<String, usize> = [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Cancelled,
    ]
    .iter()
    .map(|s| (s.as_str().to_string(), 0))
    .collect();
    let mut revenue = 0u64;
    for payment in &payments {
        *by_status
            .entry(payment.status.as_str().to_string())
            .or_default() += 1;
        if payment.status == PaymentStatus::Completed {
            revenue += u64::from(payment.amount);
        }
    }

    Json(StatsResponse {
        books: state.db.list_books().len(),
        business_plans: state.db.list_business_plans().len(),
        users: users.len(),
        admins: users.iter().filter(|u| u.is_admin()).count(),
        suspended_users: users.iter().filter(|u| u.is_suspended()).count(),
        payments: by_status,
        revenue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Lean Startup").is_ok());
        assert!(not_blank("   ").is_err());
    }

    #[test]
    fn test_investment_range() {
        assert!(check_investment_range(0, 0).is_ok());
        assert!(check_investment_range(10_000, 50_000).is_ok());
        assert!(matches!(
            check_investment_range(50_000, 10_000),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_create_book_request_validation() {
        let req: CreateBookRequest = serde_json::from_value(serde_json::json!({
            "title": "  ",
            "author": "Eric Ries",
            "category": "Business"
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: CreateBookRequest = serde_json::from_value(serde_json::json!({
            "title": "The Lean Startup",
            "author": "Eric Ries",
            "category": "Business",
            "rating": 4.5
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }
}
