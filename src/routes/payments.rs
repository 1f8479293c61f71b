// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkout routes.
//!
//! Flow:
//! 1. The user starts a checkout and is sent to the gateway's checkout URL
//! 2. The gateway posts a signed confirmation to `/api/payments/verify`
//! 3. The payment is completed and the item is added to the user's purchases

use crate::error::{AppError, Result};
use crate::extract::{ValidJson, ValidPath};
use crate::middleware::identity::AuthUser;
use crate::models::{ContentRef, Payment, PaymentMethod, PaymentStatus, Purchase};
use crate::services::payment::Confirmation;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Gateway callback routes (authenticated by signature, not by user).
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/payments/verify", post(verify_payment))
}

/// Routes for the calling user (identity middleware applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/payments", get(list_payments).post(start_checkout))
        .route("/api/payments/{reference}", get(get_payment))
        .route("/api/payments/{reference}/cancel", post(cancel_payment))
}

// ─── Checkout ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CheckoutRequest {
    pub content: ContentRef,
    pub method: PaymentMethod,
    #[validate(length(min = 9, max = 20))]
    pub phone_number: Option<String>,
}

/// Start a checkout for a premium item.
async fn start_checkout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(req): ValidJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Payment>)> {
    let item = state.db.require_content(&req.content)?;

    if !item.requires_purchase() {
        return Err(AppError::BadRequest(format!(
            "{} is free and does not need to be purchased",
            req.content
        )));
    }
    if state.db.get_library(auth.id()).has_purchased(&req.content) {
        return Err(AppError::Conflict(format!(
            "{} has already been purchased",
            req.content
        )));
    }

    let payment = state.payment_service.create_payment(
        auth.id(),
        req.content,
        item.price(),
        req.method,
        req.phone_number,
        &now_rfc3339(),
    )?;
    state.db.insert_payment(payment.clone())?;

    tracing::info!(
        user_id = auth.id(),
        reference = %payment.reference,
        content = %payment.content,
        amount = payment.amount,
        method = ?payment.method,
        "Checkout started"
    );

    Ok((StatusCode::CREATED, Json(payment)))
}

// ─── Gateway Confirmation ────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(length(min = 1, max = 64))]
    pub reference: String,
    #[validate(length(min = 1, max = 128))]
    pub transaction_id: String,
    #[validate(length(min = 1, max = 128))]
    pub signature: String,
}

/// Apply a signed gateway confirmation.
///
/// Replaying the same confirmation returns the completed payment again.
async fn verify_payment(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<VerifyRequest>,
) -> Result<Json<Payment>> {
    let payment = state
        .db
        .get_payment(&req.reference)
        .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", req.reference)))?;

    let signature_ok = state.payment_service.verify_signature(
        &payment.reference,
        &req.transaction_id,
        payment.amount,
        &req.signature,
    )?;
    if !signature_ok {
        tracing::warn!(
            reference = %req.reference,
            "Payment confirmation signature mismatch"
        );
        return Err(AppError::InvalidSignature);
    }

    let now = chrono::Utc::now();
    let (confirmation, payment) = state
        .db
        .with_payment(&req.reference, |p| {
            let confirmation = state.payment_service.confirm(p, &req.transaction_id, now)?;
            Ok::<_, AppError>((confirmation, p.clone()))
        })
        .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", req.reference)))??;

    if confirmation == Confirmation::Completed {
        let purchase = Purchase {
            content: payment.content,
            payment_reference: payment.reference.clone(),
            amount: payment.amount,
            purchased_at: now_rfc3339(),
        };
        let recorded = state.db.with_user_library(payment.user_id, |library| {
            if !library.has_purchased(&purchase.content) {
                library.purchases.push(purchase);
            }
        });
        if recorded.is_none() {
            tracing::warn!(
                user_id = payment.user_id,
                reference = %payment.reference,
                "Payment completed for a deleted user; purchase not recorded"
            );
            return Ok(Json(payment));
        }

        tracing::info!(
            user_id = payment.user_id,
            reference = %payment.reference,
            transaction_id = %req.transaction_id,
            content = %payment.content,
            "Payment completed"
        );
    } else {
        tracing::debug!(reference = %payment.reference, "Duplicate payment confirmation");
    }

    Ok(Json(payment))
}

// ─── Payment History ─────────────────────────────────────────

async fn list_payments(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Json<Vec<Payment>> {
    Json(state.db.list_payments(Some(auth.id()), None))
}

/// Look up one of the caller's payments. Other users' payments are reported as missing.
fn owned_payment(state: &AppState, auth: &AuthUser, reference: &str) -> Result<Payment> {
    state
        .db
        .get_payment(reference)
        .filter(|p| p.user_id == auth.id())
        .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", reference)))
}

async fn get_payment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath(reference): ValidPath<String>,
) -> Result<Json<Payment>> {
    owned_payment(&state, &auth, &reference).map(Json)
}

async fn cancel_payment(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidPath(reference): ValidPath<String>,
) -> Result<Json<Payment>> {
    owned_payment(&state, &auth, &reference)?;

    let payment = state
        .db
        .with_payment(&reference, |p| {
            if p.status != PaymentStatus::Pending {
                return Err(AppError::Conflict(format!(
                    "Only pending payments can be cancelled; payment is {}",
                    p.status.as_str()
                )));
            }
            p.status = PaymentStatus::Cancelled;
            Ok(p.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", reference)))??;

    tracing::info!(user_id = auth.id(), reference = %reference, "Payment cancelled");
    Ok(Json(payment))
}
