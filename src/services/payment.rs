// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkout service for the Telebirr and CBE gateways.
//!
//! No network calls are made. A checkout produces a reference and a gateway
//! URL; the gateway (or a test harness standing in for it) confirms by
//! posting the reference and its transaction id signed with the shared
//! HMAC-SHA256 key.

use crate::config::Config;
use crate::error::AppError;
use crate::models::payment::CURRENCY;
use crate::models::{ContentRef, Payment, PaymentMethod, PaymentStatus};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const REFERENCE_PREFIX: &str = "SW-";
const REFERENCE_RANDOM_BYTES: usize = 8;

/// Creates checkouts and checks gateway confirmations.
#[derive(Clone)]
pub struct PaymentService {
    signing_key: Vec<u8>,
    telebirr_checkout_url: String,
    cbe_checkout_url: String,
    return_url: String,
    ttl: chrono::Duration,
    rng: SystemRandom,
}

/// Result of applying a gateway confirmation to a payment.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    /// Payment moved from pending to completed
    Completed,
    /// Same confirmation seen before
    AlreadyCompleted,
}

impl PaymentService {
    pub fn new(config: &Config) -> Self {
        Self {
            signing_key: config.payment_signing_key.clone(),
            telebirr_checkout_url: config.telebirr_checkout_url.clone(),
            cbe_checkout_url: config.cbe_checkout_url.clone(),
            return_url: format!(
                "{}/payment/complete",
                config.frontend_url.trim_end_matches('/')
            ),
            ttl: chrono::Duration::minutes(config.payment_ttl_minutes),
            rng: SystemRandom::new(),
        }
    }

    /// Fresh merchant reference, e.g. `SW-9f86d081884c7d65`.
    pub fn new_reference(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; REFERENCE_RANDOM_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        Ok(format!("{}{}", REFERENCE_PREFIX, hex::encode(bytes)))
    }

    /// Gateway page the client is redirected to.
    pub fn checkout_url(&self, method: PaymentMethod, reference: &str, amount: u32) -> String {
        let base = match method {
            PaymentMethod::Telebirr => &self.telebirr_checkout_url,
            PaymentMethod::Cbe => &self.cbe_checkout_url,
        };
        format!(
            "{}/checkout?reference={}&amount={}&currency={}&return_url={}",
            base,
            urlencoding::encode(reference),
            amount,
            CURRENCY,
            urlencoding::encode(&self.return_url)
        )
    }

    /// Build a pending payment for `content`.
    pub fn create_payment(
        &self,
        user_id: u64,
        content: ContentRef,
        amount: u32,
        method: PaymentMethod,
        phone_number: Option<String>,
        now: &str,
    ) -> Result<Payment, AppError> {
        if method == PaymentMethod::Telebirr {
            match phone_number.as_deref() {
                Some(phone) if is_ethiopian_mobile(phone) => {}
                Some(_) => {
                    return Err(AppError::BadRequest(
                        "Telebirr requires an Ethiopian mobile number".to_string(),
                    ))
                }
                None => {
                    return Err(AppError::BadRequest(
                        "Telebirr payments require a phone number".to_string(),
                    ))
                }
            }
        }

        let reference = self.new_reference()?;
        let checkout_url = self.checkout_url(method, &reference, amount);

        Ok(Payment {
            reference,
            user_id,
            content,
            amount,
            currency: CURRENCY.to_string(),
            method,
            phone_number,
            status: PaymentStatus::Pending,
            checkout_url,
            transaction_id: None,
            created_at: now.to_string(),
            completed_at: None,
        })
    }

    /// Hex HMAC-SHA256 over `reference|transaction_id|amount`.
    pub fn sign(
        &self,
        reference: &str,
        transaction_id: &str,
        amount: u32,
    ) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(format!("{}|{}|{}", reference, transaction_id, amount).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time check of a gateway signature.
    pub fn verify_signature(
        &self,
        reference: &str,
        transaction_id: &str,
        amount: u32,
        signature: &str,
    ) -> Result<bool, AppError> {
        let expected = self.sign(reference, transaction_id, amount)?;
        let provided = signature.trim().to_ascii_lowercase();
        Ok(expected.as_bytes().ct_eq(provided.as_bytes()).into())
    }

    /// Apply a verified confirmation to a payment.
    ///
    /// Fails with 409 if the payment can no longer be completed or was
    /// completed by a different transaction.
    pub fn confirm(
        &self,
        payment: &mut Payment,
        transaction_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Confirmation, AppError> {
        match payment.status {
            PaymentStatus::Completed => {
                if payment.transaction_id.as_deref() == Some(transaction_id) {
                    Ok(Confirmation::AlreadyCompleted)
                } else {
                    Err(AppError::Conflict(format!(
                        "Payment {} was already completed by another transaction",
                        payment.reference
                    )))
                }
            }
            PaymentStatus::Failed | PaymentStatus::Cancelled => Err(AppError::Conflict(format!(
                "Payment {} is {}",
                payment.reference,
                payment.status.as_str()
            ))),
            PaymentStatus::Pending => {
                if self.is_expired(payment, now) {
                    payment.status = PaymentStatus::Failed;
                    return Err(AppError::Conflict(format!(
                        "Payment {} expired",
                        payment.reference
                    )));
                }
                payment.status = PaymentStatus::Completed;
                payment.transaction_id = Some(transaction_id.to_string());
                payment.completed_at = Some(crate::time_utils::format_utc_rfc3339(now));
                Ok(Confirmation::Completed)
            }
        }
    }

    fn is_expired(&self, payment: &Payment, now: chrono::DateTime<chrono::Utc>) -> bool {
        chrono::DateTime::parse_from_rfc3339(&payment.created_at)
            .map(|created| now.signed_duration_since(created.with_timezone(&chrono::Utc)) > self.ttl)
            .unwrap_or(false)
    }
}

/// `+2519XXXXXXXX`, `2519XXXXXXXX`, `09XXXXXXXX` or the `07` equivalents.
pub fn is_ethiopian_mobile(phone: &str) -> bool {
    let digits: String = phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    let local = if let Some(rest) = digits.strip_prefix("+251") {
        rest
    } else if let Some(rest) = digits.strip_prefix("251") {
        rest
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest
    } else {
        return false;
    };

    local.len() == 9
        && (local.starts_with('9') || local.starts_with('7'))
        && local.chars().all(|c| c.is_ascii_digit())
}
