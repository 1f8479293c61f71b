// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod payment;
pub mod reading;
pub mod recommendation;

pub use catalog::{CatalogQuery, Page};
pub use payment::PaymentService;
pub use recommendation::{Recommendation, RecommendationService};
