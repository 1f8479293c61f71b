// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! References to catalog items shared by bookmarks, notes, purchases and payments.

use crate::models::{Book, BusinessPlan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The two kinds of sellable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ContentKind {
    Book,
    BusinessPlan,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Book => "book",
            ContentKind::BusinessPlan => "business_plan",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a single catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ContentRef {
    pub kind: ContentKind,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
}

impl ContentRef {
    pub fn book(id: u64) -> Self {
        Self {
            kind: ContentKind::Book,
            id,
        }
    }

    pub fn business_plan(id: u64) -> Self {
        Self {
            kind: ContentKind::BusinessPlan,
            id,
        }
    }

    /// Stable string key, e.g. `book:3`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for ContentRef {
    type Err = String;

    /// Parse a key produced by [`ContentRef::key`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid content key: {s}"))?;
        let kind = match kind {
            "book" => ContentKind::Book,
            "business_plan" => ContentKind::BusinessPlan,
            other => return Err(format!("unknown content kind: {other}")),
        };
        let id = id
            .parse()
            .map_err(|_| format!("invalid content id in key: {s}"))?;
        Ok(Self { kind, id })
    }
}

/// A catalog item of either kind.
#[derive(Debug, Clone)]
pub enum CatalogItem {
    Book(Book),
    BusinessPlan(BusinessPlan),
}

impl CatalogItem {
    pub fn content_ref(&self) -> ContentRef {
        match self {
            CatalogItem::Book(b) => ContentRef::book(b.id),
            CatalogItem::BusinessPlan(p) => ContentRef::business_plan(p.id),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            CatalogItem::Book(b) => &b.title,
            CatalogItem::BusinessPlan(p) => &p.title,
        }
    }

    pub fn price(&self) -> u32 {
        match self {
            CatalogItem::Book(b) => b.price,
            CatalogItem::BusinessPlan(p) => p.price,
        }
    }

    pub fn requires_purchase(&self) -> bool {
        match self {
            CatalogItem::Book(b) => b.requires_purchase(),
            CatalogItem::BusinessPlan(p) => p.requires_purchase(),
        }
    }
}
