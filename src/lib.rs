// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shelfwise: book summaries and business plans for sale
//!
//! This crate provides the backend API for browsing the catalog, keeping a
//! personal library (bookmarks, notes, reading stats, offline copies),
//! checking out through Telebirr or CBE, and administering the catalog.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::MemoryDb;
use services::PaymentService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: MemoryDb,
    pub payment_service: PaymentService,
}

impl AppState {
    pub fn new(config: Config, db: MemoryDb) -> Self {
        let payment_service = PaymentService::new(&config);
        Self {
            config,
            db,
            payment_service,
        }
    }
}
