// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user library: bookmarks, notes, purchases, offline copies and reading stats.

use crate::models::ContentRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Bookmark {
    pub content: ContentRef,
    pub created_at: String,
}

/// A highlight or annotation attached to a catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Note {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub content: ContentRef,
    pub text: String,
    /// Highlighted passage the note refers to
    pub highlight: Option<String>,
    /// Character offset of the highlight within the text
    pub position: Option<u32>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Purchase {
    pub content: ContentRef,
    pub payment_reference: String,
    pub amount: u32,
    pub purchased_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OfflineItem {
    pub content: ContentRef,
    pub saved_at: String,
}

/// Aggregated reading sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReadingStats {
    pub sessions: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_words: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_seconds: u64,
    /// Words per minute across all sessions
    pub average_wpm: f64,
    /// Latest progress percentage keyed by content key (`book:3`)
    pub progress: HashMap<String, u8>,
    pub last_read_at: Option<String>,
}

/// Everything a user has accumulated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserLibrary {
    pub bookmarks: Vec<Bookmark>,
    pub notes: Vec<Note>,
    pub purchases: Vec<Purchase>,
    pub offline: Vec<OfflineItem>,
    pub reading: ReadingStats,
}

impl UserLibrary {
    pub fn has_purchased(&self, content: &ContentRef) -> bool {
        self.purchases.iter().any(|p| &p.content == content)
    }

    pub fn is_bookmarked(&self, content: &ContentRef) -> bool {
        self.bookmarks.iter().any(|b| &b.content == content)
    }

    pub fn is_offline(&self, content: &ContentRef) -> bool {
        self.offline.iter().any(|o| &o.content == content)
    }

    /// Drop references to a catalog item that no longer exists.
    ///
    /// Purchases are kept as a record of what was paid for.
    pub fn forget_content(&mut self, content: &ContentRef) {
        self.bookmarks.retain(|b| &b.content != content);
        self.offline.retain(|o| &o.content != content);
        self.reading.progress.remove(&content.key());
    }
}
