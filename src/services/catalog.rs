// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog filtering, search and pagination.

use crate::error::{AppError, Result};
use crate::models::{Book, BusinessPlan};
use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;
pub const MAX_SEARCH_LEN: usize = 100;

/// Filters shared by the book and business plan listings.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    /// Category (books) or industry (business plans), case-insensitive
    pub group: Option<String>,
    /// Case-insensitive substring search
    pub search: Option<String>,
    pub premium: Option<bool>,
    pub page: u32,
    pub per_page: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            group: None,
            search: None,
            premium: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of results.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    /// Number of items matching the filters across all pages
    pub total: u32,
}

/// Fields the listing filters look at.
pub trait Listable {
    fn group(&self) -> &str;
    fn is_premium(&self) -> bool;
    /// Whether `needle` (already lowercased) occurs in any searchable field.
    fn matches(&self, needle: &str) -> bool;
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Listable for Book {
    fn group(&self) -> &str {
        &self.category
    }

    fn is_premium(&self) -> bool {
        self.is_premium
    }

    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
            || contains_ci(&self.author, needle)
            || contains_ci(&self.description, needle)
            || self.tags.iter().any(|t| contains_ci(t, needle))
    }
}

impl Listable for BusinessPlan {
    fn group(&self) -> &str {
        &self.industry
    }

    fn is_premium(&self) -> bool {
        self.is_premium
    }

    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
            || contains_ci(&self.industry, needle)
            || contains_ci(&self.description, needle)
            || self.tags.iter().any(|t| contains_ci(t, needle))
    }
}

impl CatalogQuery {
    /// Apply the filters and cut out the requested page.
    ///
    /// `items` must already be in display order.
    pub fn apply<T, L>(&self, items: Vec<T>, to_listing: impl Fn(&T) -> L) -> Result<Page<L>>
    where
        T: Listable,
    {
        if self.page < 1 {
            return Err(AppError::BadRequest(
                "Page must be greater than 0".to_string(),
            ));
        }

        let needle = match self.search.as_deref().map(str::trim) {
            Some(s) if s.chars().count() > MAX_SEARCH_LEN => {
                return Err(AppError::BadRequest(format!(
                    "Search term must be at most {} characters",
                    MAX_SEARCH_LEN
                )))
            }
            Some(s) if !s.is_empty() => Some(s.to_lowercase()),
            _ => None,
        };
        let group = self
            .group
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty());

        let matching: Vec<&T> = items
            .iter()
            .filter(|item| group.map_or(true, |g| item.group().eq_ignore_ascii_case(g)))
            .filter(|item| self.premium.map_or(true, |p| item.is_premium() == p))
            .filter(|item| needle.as_deref().map_or(true, |n| item.matches(n)))
            .collect();

        let limit = self.per_page.clamp(1, MAX_PER_PAGE);
        let total = matching.len() as u32;

        // Use checked multiplication to prevent overflow on large page numbers
        let start = (self.page as usize - 1)
            .checked_mul(limit as usize)
            .ok_or_else(|| AppError::BadRequest("Page number causes overflow".to_string()))?;

        let page_items = if start < matching.len() {
            let end = start.saturating_add(limit as usize).min(matching.len());
            matching[start..end]
                .iter()
                .map(|item| to_listing(item))
                .collect()
        } else {
            vec![]
        };

        Ok(Page {
            items: page_items,
            page: self.page,
            per_page: limit,
            total,
        })
    }
}

/// Category name with the number of books in it.
#[derive(Debug, Serialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CategoryCount {
    pub name: String,
    pub count: u32,
}

/// Distinct groups with counts, sorted by name.
pub fn group_counts<T: Listable>(items: &[T]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for item in items {
        *counts.entry(item.group()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(name, count)| CategoryCount {
            name: name.to_string(),
            count,
        })
        .collect()
}
