// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod book;
pub mod business_plan;
pub mod content;
pub mod library;
pub mod payment;
pub mod user;

pub use book::{Book, BookListing};
pub use business_plan::{BusinessPlan, BusinessPlanListing};
pub use content::{CatalogItem, ContentKind, ContentRef};
pub use library::{Bookmark, Note, OfflineItem, Purchase, ReadingStats, UserLibrary};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use user::{User, UserRole, UserStatus};
