// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog seed loading.

use crate::models::{Book, BusinessPlan, User};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// Initial store contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub business_plans: Vec<BusinessPlan>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl Seed {
    /// Load a seed from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load a seed from a JSON string, rejecting duplicate ids or emails.
    pub fn load_from_json(json_data: &str) -> Result<Self, CatalogError> {
        let seed: Seed =
            serde_json::from_str(json_data).map_err(|e| CatalogError::ParseError(e.to_string()))?;
        seed.check_unique()?;

        tracing::info!(
            books = seed.books.len(),
            business_plans = seed.business_plans.len(),
            users = seed.users.len(),
            "Loaded catalog seed"
        );
        Ok(seed)
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::load_from_json(BUILTIN_CATALOG)
    }

    fn check_unique(&self) -> Result<(), CatalogError> {
        let mut ids = HashSet::new();
        if let Some(book) = self.books.iter().find(|b| !ids.insert(b.id)) {
            return Err(CatalogError::Duplicate(format!("book id {}", book.id)));
        }

        ids.clear();
        if let Some(plan) = self.business_plans.iter().find(|p| !ids.insert(p.id)) {
            return Err(CatalogError::Duplicate(format!(
                "business plan id {}",
                plan.id
            )));
        }

        ids.clear();
        if let Some(user) = self.users.iter().find(|u| !ids.insert(u.id)) {
            return Err(CatalogError::Duplicate(format!("user id {}", user.id)));
        }

        let mut emails = HashSet::new();
        if let Some(user) = self
            .users
            .iter()
            .find(|u| !emails.insert(crate::models::user::email_key(&u.email)))
        {
            return Err(CatalogError::Duplicate(format!("email {}", user.email)));
        }

        Ok(())
    }
}

/// Errors from seed loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse catalog: {0}")]
    ParseError(String),

    #[error("Duplicate entry in catalog: {0}")]
    Duplicate(String),
}
