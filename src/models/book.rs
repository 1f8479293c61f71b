// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Book summary model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Average adult reading speed used when a book has no explicit reading time.
pub const DEFAULT_READING_WPM: u32 = 200;

/// A book summary in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Book {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    /// Full summary text (premium for paid books)
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_takeaways: Vec<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub reading_time_minutes: u32,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Price in whole birr; 0 for free books
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub published_year: Option<u16>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Book without premium fields, used in list responses.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BookListing {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    pub cover_image: Option<String>,
    pub reading_time_minutes: u32,
    pub rating: f32,
    pub tags: Vec<String>,
    pub price: u32,
    pub is_premium: bool,
}

impl Book {
    /// Whether reading the summary requires a purchase.
    pub fn requires_purchase(&self) -> bool {
        self.is_premium && self.price > 0
    }

    pub fn listing(&self) -> BookListing {
        BookListing {
            id: self.id,
            title: self.title.clone(),
            author: self.author.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            cover_image: self.cover_image.clone(),
            reading_time_minutes: self.reading_time_minutes,
            rating: self.rating,
            tags: self.tags.clone(),
            price: self.price,
            is_premium: self.is_premium,
        }
    }

    /// Copy with premium fields cleared.
    pub fn locked(&self) -> Self {
        Self {
            summary: String::new(),
            key_takeaways: Vec::new(),
            ..self.clone()
        }
    }

    /// Fill derived fields that the catalog file may leave out.
    pub fn normalize(&mut self, now: &str) {
        if self.word_count == 0 && !self.summary.is_empty() {
            self.word_count = self.summary.split_whitespace().count() as u32;
        }
        if self.reading_time_minutes == 0 {
            self.reading_time_minutes = estimated_reading_minutes(self.word_count);
        }
        if self.created_at.is_empty() {
            self.created_at = now.to_string();
        }
        if self.updated_at.is_empty() {
            self.updated_at = self.created_at.clone();
        }
    }
}

/// Minutes needed to read `word_count` words at the default speed (at least 1).
pub fn estimated_reading_minutes(word_count: u32) -> u32 {
    word_count.div_ceil(DEFAULT_READING_WPM).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Book {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "Atomic Habits",
            "author": "James Clear",
            "category": "Self-Help",
            "description": "Tiny changes, remarkable results.",
            "summary": "one two three four five",
            "key_takeaways": ["Habits compound"],
            "price": 150,
            "is_premium": true
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_derives_counts() {
        let mut book = sample();
        book.normalize("2026-01-01T00:00:00Z");

        assert_eq!(book.word_count, 5);
        assert_eq!(book.reading_time_minutes, 1);
        assert_eq!(book.created_at, "2026-01-01T00:00:00Z");
        assert_eq!(book.updated_at, book.created_at);
    }

    #[test]
    fn test_locked_clears_premium_fields() {
        let book = sample();
        let locked = book.locked();
        assert!(locked.summary.is_empty());
        assert!(locked.key_takeaways.is_empty());
        assert_eq!(locked.title, book.title);
    }

    #[test]
    fn test_reading_minutes_rounds_up() {
        assert_eq!(estimated_reading_minutes(0), 1);
        assert_eq!(estimated_reading_minutes(200), 1);
        assert_eq!(estimated_reading_minutes(201), 2);
        assert_eq!(estimated_reading_minutes(3000), 15);
    }
}
