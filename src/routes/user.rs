// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User routes: profile, bookmarks, notes, reading stats, offline copies.

use crate::db::memory::NewUser;
use crate::error::{AppError, Result};
use crate::extract::{ValidJson, ValidPath, ValidQuery};
use crate::middleware::identity::AuthUser;
use crate::models::{
    Bookmark, ContentKind, ContentRef, Note, OfflineItem, Purchase, ReadingStats, User, UserRole,
};
use crate::routes::catalog::RecommendationsResponse;
use crate::routes::SuccessResponse;
use crate::services::reading::{record_session, ReadingSession};
use crate::services::recommendation::clamp_limit;
use crate::services::RecommendationService;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Routes that don't need an identity.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/user", post(register))
}

/// Routes for the calling user (identity middleware applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user", get(get_me).put(update_me))
        .route(
            "/api/user/bookmarks",
            get(list_bookmarks).post(add_bookmark),
        )
        .route(
            "/api/user/bookmarks/{kind}/{id}",
            axum::routing::delete(remove_bookmark),
        )
        .route("/api/user/notes", get(list_notes).post(create_note))
        .route("/api/user/notes/{id}", put(update_note).delete(delete_note))
        .route("/api/user/reading-sessions", post(record_reading_session))
        .route("/api/user/reading-stats", get(get_reading_stats))
        .route("/api/user/offline", get(list_offline))
        .route(
            "/api/user/offline/{kind}/{id}",
            put(save_offline).delete(remove_offline),
        )
        .route("/api/user/purchases", get(list_purchases))
        .route("/api/user/recommendations", get(get_recommendations))
}

/// Library entry joined with the title of the item it points at.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LibraryEntry<T> {
    #[serde(flatten)]
    pub entry: T,
    /// `None` if the item has been removed from the catalog
    pub title: Option<String>,
}

fn with_titles<T>(
    state: &AppState,
    entries: Vec<T>,
    content: impl Fn(&T) -> ContentRef,
) -> Vec<LibraryEntry<T>> {
    entries
        .into_iter()
        .map(|entry| {
            let title = state
                .db
                .get_content(&content(&entry))
                .map(|item| item.title().to_string());
            LibraryEntry { entry, title }
        })
        .collect()
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub preferred_categories: Vec<String>,
}

/// Register a new user.
async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name must not be blank".to_string()));
    }

    let user = state.db.create_user(NewUser {
        name: req.name,
        email: req.email,
        role: UserRole::User,
        preferred_categories: req.preferred_categories,
    })?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Counts shown on the profile page.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LibrarySummary {
    pub bookmarks: usize,
    pub notes: usize,
    pub purchases: usize,
    pub offline: usize,
    pub average_wpm: f64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub user: User,
    pub library: LibrarySummary,
}

fn profile(state: &AppState, user: User) -> ProfileResponse {
    let library = state.db.get_library(user.id);
    ProfileResponse {
        user,
        library: LibrarySummary {
            bookmarks: library.bookmarks.len(),
            notes: library.notes.len(),
            purchases: library.purchases.len(),
            offline: library.offline.len(),
            average_wpm: library.reading.average_wpm,
        },
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<ProfileResponse> {
    Json(profile(&state, auth.user))
}

#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 20))]
    pub preferred_categories: Option<Vec<String>>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("Name must not be blank".to_string()));
    }

    let user = state
        .db
        .update_user(auth.id(), |u| {
            if let Some(name) = req.name {
                u.name = name.trim().to_string();
            }
            if let Some(categories) = req.preferred_categories {
                u.preferred_categories = categories;
            }
        })
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.id())))?;

    Ok(Json(profile(&state, user)))
}

// ─── Bookmarks ───────────────────────────────────────────────

async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<Vec<LibraryEntry<Bookmark>>> {
    let bookmarks = state.db.get_library(auth.id()).bookmarks;
    Json(with_titles(&state, bookmarks, |b| b.content))
}

#[derive(Deserialize, Validate)]
pub struct BookmarkRequest {
    pub content: ContentRef,
}

async fn add_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<BookmarkRequest>,
) -> Result<(StatusCode, Json<Bookmark>)> {
    let bookmark = state
        .db
        .with_library_content(auth.id(), &req.content, |library, _| {
            if library.is_bookmarked(&req.content) {
                return Err(AppError::Conflict(format!(
                    "{} is already bookmarked",
                    req.content
                )));
            }
            let bookmark = Bookmark {
                content: req.content,
                created_at: now_rfc3339(),
            };
            library.bookmarks.push(bookmark.clone());
            Ok(bookmark)
        })?;

    tracing::debug!(user_id = auth.id(), content = %req.content, "Bookmark added");
    Ok((StatusCode::CREATED, Json(bookmark)))
}

async fn remove_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath((kind, id)): ValidPath<(ContentKind, u64)>,
) -> Result<Json<SuccessResponse>> {
    let content = ContentRef { kind, id };
    let removed = state.db.with_library(auth.id(), |library| {
        let before = library.bookmarks.len();
        library.bookmarks.retain(|b| b.content != content);
        library.bookmarks.len() != before
    });

    if !removed {
        return Err(AppError::NotFound(format!("{} is not bookmarked", content)));
    }
    Ok(SuccessResponse::new("Bookmark removed"))
}

// ─── Notes ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct NotesQuery {
    kind: Option<ContentKind>,
    id: Option<u64>,
}

async fn list_notes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidQuery(params): ValidQuery<NotesQuery>,
) -> Json<Vec<Note>> {
    let notes = state
        .db
        .get_library(auth.id())
        .notes
        .into_iter()
        .filter(|n| params.kind.map_or(true, |k| n.content.kind == k))
        .filter(|n| params.id.map_or(true, |id| n.content.id == id))
        .collect();
    Json(notes)
}

#[derive(Deserialize, Validate)]
pub struct CreateNoteRequest {
    pub content: ContentRef,
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    #[validate(length(max = 1000))]
    pub highlight: Option<String>,
    pub position: Option<u32>,
}

async fn create_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>)> {
    state.db.require_content(&req.content)?;

    let now = now_rfc3339();
    let note = Note {
        id: state.db.next_note_id(),
        content: req.content,
        text: req.text,
        highlight: req.highlight,
        position: req.position,
        created_at: now.clone(),
        updated_at: now,
    };
    state
        .db
        .with_library(auth.id(), |library| library.notes.push(note.clone()));

    tracing::debug!(user_id = auth.id(), note_id = note.id, "Note created");
    Ok((StatusCode::CREATED, Json(note)))
}

#[derive(Deserialize, Validate)]
pub struct UpdateNoteRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: Option<String>,
    #[validate(length(max = 1000))]
    pub highlight: Option<String>,
}

async fn update_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath(note_id): ValidPath<u64>,
    ValidJson(req): ValidJson<UpdateNoteRequest>,
) -> Result<Json<Note>> {
    let updated = state.db.with_library(auth.id(), |library| {
        let note = library.notes.iter_mut().find(|n| n.id == note_id)?;
        if let Some(text) = req.text {
            note.text = text;
        }
        if let Some(highlight) = req.highlight {
            note.highlight = Some(highlight);
        }
        note.updated_at = now_rfc3339();
        Some(note.clone())
    });

    updated
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Note {} not found", note_id)))
}

async fn delete_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath(note_id): ValidPath<u64>,
) -> Result<Json<SuccessResponse>> {
    let removed = state.db.with_library(auth.id(), |library| {
        let before = library.notes.len();
        library.notes.retain(|n| n.id != note_id);
        library.notes.len() != before
    });

    if !removed {
        return Err(AppError::NotFound(format!("Note {} not found", note_id)));
    }
    Ok(SuccessResponse::new("Note deleted"))
}

// ─── Reading Stats ───────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct ReadingSessionRequest {
    pub content: ContentRef,
    pub words_read: u32,
    pub seconds: u32,
    pub progress_percent: Option<u8>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReadingSessionResponse {
    /// Speed of the recorded session
    pub session_wpm: f64,
    pub stats: ReadingStats,
}

async fn record_reading_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<ReadingSessionRequest>,
) -> Result<Json<ReadingSessionResponse>> {
    let session = ReadingSession {
        content: req.content,
        words_read: req.words_read,
        seconds: req.seconds,
        progress_percent: req.progress_percent,
    };
    let now = now_rfc3339();

    let (session_wpm, stats) =
        state
            .db
            .with_library_content(auth.id(), &session.content, |library, _| {
                let wpm = record_session(&mut library.reading, &session, &now)?;
                Ok((wpm, library.reading.clone()))
            })?;

    tracing::debug!(
        user_id = auth.id(),
        content = %session.content,
        session_wpm,
        average_wpm = stats.average_wpm,
        "Reading session recorded"
    );
    Ok(Json(ReadingSessionResponse { session_wpm, stats }))
}

async fn get_reading_stats(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<ReadingStats> {
    Json(state.db.get_library(auth.id()).reading)
}

// ─── Offline Copies ──────────────────────────────────────────

async fn list_offline(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<Vec<LibraryEntry<OfflineItem>>> {
    let offline = state.db.get_library(auth.id()).offline;
    Json(with_titles(&state, offline, |o| o.content))
}

async fn save_offline(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath((kind, id)): ValidPath<(ContentKind, u64)>,
) -> Result<(StatusCode, Json<OfflineItem>)> {
    let content = ContentRef { kind, id };
    let limit = state.config.offline_limit;

    state.db.with_library_content(auth.id(), &content, |library, item| {
        if item.requires_purchase() && !library.has_purchased(&content) {
            return Err(AppError::Forbidden(format!(
                "{} must be purchased before saving offline",
                content
            )));
        }
        if let Some(existing) = library.offline.iter().find(|o| o.content == content) {
            return Ok((StatusCode::OK, Json(existing.clone())));
        }
        if library.offline.len() >= limit {
            return Err(AppError::Conflict(format!(
                "Offline limit of {} items reached",
                limit
            )));
        }

        let offline = OfflineItem {
            content,
            saved_at: now_rfc3339(),
        };
        library.offline.push(offline.clone());
        Ok((StatusCode::CREATED, Json(offline)))
    })
}

async fn remove_offline(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath((kind, id)): ValidPath<(ContentKind, u64)>,
) -> Result<Json<SuccessResponse>> {
    let content = ContentRef { kind, id };
    let removed = state.db.with_library(auth.id(), |library| {
        let before = library.offline.len();
        library.offline.retain(|o| o.content != content);
        library.offline.len() != before
    });

    if !removed {
        return Err(AppError::NotFound(format!("{} is not saved offline", content)));
    }
    Ok(SuccessResponse::new("Offline copy removed"))
}

// ─── Purchases & Recommendations ─────────────────────────────

async fn list_purchases(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<Vec<LibraryEntry<Purchase>>> {
    let purchases = state.db.get_library(auth.id()).purchases;
    Json(with_titles(&state, purchases, |p| p.content))
}

#[derive(Deserialize)]
struct RecommendationsQuery {
    limit: Option<usize>,
}

async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidQuery(params): ValidQuery<RecommendationsQuery>,
) -> Json<RecommendationsResponse> {
    let index =
        RecommendationService::from_catalog(&state.db.list_books(), &state.db.list_business_plans());
    let library = state.db.get_library(auth.id());
    let recommendations = index.for_user(&auth.user, &library, clamp_limit(params.limit));

    Json(RecommendationsResponse { recommendations })
}
