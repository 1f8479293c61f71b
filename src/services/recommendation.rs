// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Content similarity and personalised recommendations.
//!
//! Items are compared on three features:
//! - tag overlap (Jaccard index), weight 0.6
//! - same category / industry, weight 0.3
//! - same author, weight 0.1
//!
//! A user's seeds are the items they bookmarked, bought, saved offline,
//! annotated or started reading. Every other item is scored by its best
//! similarity to any seed, plus a boost when its group is one of the user's
//! preferred categories.

use crate::models::{Book, BusinessPlan, ContentRef, User, UserLibrary};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const TAG_WEIGHT: f64 = 0.6;
const GROUP_WEIGHT: f64 = 0.3;
const AUTHOR_WEIGHT: f64 = 0.1;
const PREFERENCE_BOOST: f64 = 0.15;

pub const DEFAULT_LIMIT: usize = 5;
pub const MAX_LIMIT: usize = 20;

/// Normalized features of one catalog item.
#[derive(Debug, Clone)]
pub struct ContentFeatures {
    pub content: ContentRef,
    pub title: String,
    group: String,
    author: Option<String>,
    tags: HashSet<String>,
    rating: f32,
}

impl From<&Book> for ContentFeatures {
    fn from(book: &Book) -> Self {
        Self {
            content: ContentRef::book(book.id),
            title: book.title.clone(),
            group: book.category.trim().to_lowercase(),
            author: Some(book.author.trim().to_lowercase()).filter(|a| !a.is_empty()),
            tags: normalize_tags(&book.tags),
            rating: book.rating,
        }
    }
}

impl From<&BusinessPlan> for ContentFeatures {
    fn from(plan: &BusinessPlan) -> Self {
        Self {
            content: ContentRef::business_plan(plan.id),
            title: plan.title.clone(),
            group: plan.industry.trim().to_lowercase(),
            author: None,
            tags: normalize_tags(&plan.tags),
            rating: plan.rating,
        }
    }
}

fn normalize_tags(tags: &[String]) -> HashSet<String> {
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Similarity score in `[0, 1]`.
pub fn similarity(a: &ContentFeatures, b: &ContentFeatures) -> f64 {
    let mut score = TAG_WEIGHT * jaccard(&a.tags, &b.tags);
    if !a.group.is_empty() && a.group == b.group {
        score += GROUP_WEIGHT;
    }
    if a.author.is_some() && a.author == b.author {
        score += AUTHOR_WEIGHT;
    }
    score
}

/// A recommended catalog item.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Recommendation {
    pub content: ContentRef,
    pub title: String,
    pub score: f64,
    /// Human-readable explanation, e.g. "Similar to Atomic Habits"
    pub reason: String,
}

/// Scores catalog items against each other.
#[derive(Debug, Clone, Default)]
pub struct RecommendationService {
    items: Vec<ContentFeatures>,
}

struct Scored<'a> {
    item: &'a ContentFeatures,
    score: f64,
    reason: String,
}

fn rank(a: &Scored<'_>, b: &Scored<'_>) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.item
                .rating
                .partial_cmp(&a.item.rating)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.item.content.cmp(&b.item.content))
}

fn finish(mut scored: Vec<Scored<'_>>, limit: usize) -> Vec<Recommendation> {
    scored.sort_by(rank);
    scored
        .into_iter()
        .take(limit)
        .map(|s| Recommendation {
            content: s.item.content,
            title: s.item.title.clone(),
            score: (s.score * 1000.0).round() / 1000.0,
            reason: s.reason,
        })
        .collect()
}

impl RecommendationService {
    /// Build the feature index from a catalog snapshot.
    pub fn from_catalog(books: &[Book], business_plans: &[BusinessPlan]) -> Self {
        let items = books
            .iter()
            .map(ContentFeatures::from)
            .chain(business_plans.iter().map(ContentFeatures::from))
            .collect();
        Self { items }
    }

    fn find(&self, content: &ContentRef) -> Option<&ContentFeatures> {
        self.items.iter().find(|i| &i.content == content)
    }

    /// Items most similar to `content`, excluding itself.
    ///
    /// Returns `None` if `content` is not in the index.
    pub fn similar_to(&self, content: &ContentRef, limit: usize) -> Option<Vec<Recommendation>> {
        let target = self.find(content)?;

        let scored = self
            .items
            .iter()
            .filter(|i| &i.content != content)
            .map(|i| Scored {
                item: i,
                score: similarity(target, i),
                reason: format!("Similar to {}", target.title),
            })
            .filter(|s| s.score > 0.0)
            .collect();

        Some(finish(scored, limit))
    }

    /// Personalised recommendations for a user.
    pub fn for_user(
        &self,
        user: &User,
        library: &UserLibrary,
        limit: usize,
    ) -> Vec<Recommendation> {
        let seeds = seed_refs(library);
        let seed_items: Vec<&ContentFeatures> =
            seeds.iter().filter_map(|c| self.find(c)).collect();
        let preferred: HashSet<String> = user
            .preferred_categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();

        let candidates = self.items.iter().filter(|i| !seeds.contains(&i.content));

        let scored: Vec<Scored<'_>> = candidates
            .clone()
            .filter_map(|item| {
                let best = seed_items
                    .iter()
                    .map(|seed| (similarity(seed, item), *seed))
                    .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

                let mut score = 0.0;
                let mut reason = None;
                if let Some((sim, seed)) = best.filter(|(sim, _)| *sim > 0.0) {
                    score = sim;
                    reason = Some(format!("Similar to {}", seed.title));
                }
                if preferred.contains(&item.group) {
                    score += PREFERENCE_BOOST;
                    reason.get_or_insert_with(|| "Matches your interests".to_string());
                }

                reason.map(|reason| Scored {
                    item,
                    score,
                    reason,
                })
            })
            .collect();

        if !scored.is_empty() || !seed_items.is_empty() || !preferred.is_empty() {
            return finish(scored, limit);
        }

        // Nothing to go on yet: fall back to the best-rated books.
        let popular = candidates
            .filter(|i| i.content.kind == crate::models::ContentKind::Book)
            .map(|item| Scored {
                item,
                score: 0.0,
                reason: "Popular with readers".to_string(),
            })
            .collect();
        finish(popular, limit)
    }
}

/// Items the user has already engaged with.
fn seed_refs(library: &UserLibrary) -> HashSet<ContentRef> {
    library
        .bookmarks
        .iter()
        .map(|b| b.content)
        .chain(library.purchases.iter().map(|p| p.content))
        .chain(library.offline.iter().map(|o| o.content))
        .chain(library.notes.iter().map(|n| n.content))
        .chain(
            library
                .reading
                .progress
                .keys()
                .filter_map(|k| k.parse::<ContentRef>().ok()),
        )
        .collect()
}

/// Clamp a caller-supplied limit.
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bookmark, UserRole, UserStatus};

    fn book(id: u64, author: &str, category: &str, rating: f32, tags: &[&str]) -> Book {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Book {}", id),
            "author": author,
            "category": category,
            "description": "",
            "rating": rating,
            "tags": tags,
        }))
        .unwrap()
    }

    fn plan(id: u64, industry: &str, tags: &[&str]) -> BusinessPlan {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Plan {}", id),
            "industry": industry,
            "description": "",
            "tags": tags,
        }))
        .unwrap()
    }

    fn user(prefs: &[&str]) -> User {
        User {
            id: 1,
            name: "Hana".to_string(),
            email: "hana@example.com".to_string(),
            role: UserRole::User,
            status: UserStatus::Active,
            preferred_categories: prefs.iter().map(|s| s.to_string()).collect(),
            created_at: String::new(),
            last_active: String::new(),
        }
    }

    fn service() -> RecommendationService {
        RecommendationService::from_catalog(
            &[
                book(1, "Clear", "Self-Help", 4.8, &["habits", "productivity"]),
                book(2, "Newport", "Self-Help", 4.5, &["focus", "productivity"]),
                book(3, "Kiyosaki", "Finance", 4.1, &["money"]),
                book(4, "Clear", "Psychology", 3.9, &["habits"]),
            ],
            &[plan(1, "Agriculture", &["farming"]), plan(2, "Finance", &["money", "lending"])],
        )
    }

    #[test]
    fn test_similarity_weights() {
        let a = ContentFeatures::from(&book(1, "Clear", "Self-Help", 0.0, &["a", "b"]));
        let b = ContentFeatures::from(&book(2, "Clear", "self-help ", 0.0, &["b", "c"]));

        // Jaccard 1/3, same group, same author
        let expected = TAG_WEIGHT / 3.0 + GROUP_WEIGHT + AUTHOR_WEIGHT;
        assert!((similarity(&a, &b) - expected).abs() < 1e-9);
        assert!((similarity(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_similar_to_excludes_self_and_orders_by_score() {
        let recs = service().similar_to(&ContentRef::book(1), 5).unwrap();
        let ids: Vec<ContentRef> = recs.iter().map(|r| r.content).collect();

        assert!(!ids.contains(&ContentRef::book(1)));
        // Book 2 shares category + a tag; book 4 shares author + a tag
        assert_eq!(ids, vec![ContentRef::book(2), ContentRef::book(4)]);
        assert!(recs[0].score >= recs[1].score);
    }

    #[test]
    fn test_similar_to_crosses_content_kinds() {
        let recs = service().similar_to(&ContentRef::book(3), 5).unwrap();
        assert_eq!(recs[0].content, ContentRef::business_plan(2));
    }

    #[test]
    fn test_similar_to_unknown_content() {
        assert!(service().similar_to(&ContentRef::book(99), 5).is_none());
    }

    #[test]
    fn test_for_user_uses_bookmarks_and_skips_seen() {
        let mut library = UserLibrary::default();
        library.bookmarks.push(Bookmark {
            content: ContentRef::book(3),
            created_at: String::new(),
        });

        let recs = service().for_user(&user(&[]), &library, 5);
        assert!(recs.iter().all(|r| r.content != ContentRef::book(3)));
        assert_eq!(recs[0].content, ContentRef::business_plan(2));
        assert_eq!(recs[0].reason, "Similar to Book 3");
    }

    #[test]
    fn test_for_user_preference_boost() {
        let recs = service().for_user(&user(&["agriculture"]), &UserLibrary::default(), 5);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].content, ContentRef::business_plan(1));
        assert_eq!(recs[0].reason, "Matches your interests");
    }

    #[test]
    fn test_for_user_falls_back_to_top_rated_books() {
        let recs = service().for_user(&user(&[]), &UserLibrary::default(), 2);
        let ids: Vec<ContentRef> = recs.iter().map(|r| r.content).collect();
        assert_eq!(ids, vec![ContentRef::book(1), ContentRef::book(2)]);
    }

    #[test]
    fn test_for_user_with_unrelated_seed_gets_nothing() {
        let service = service();
        assert!(service
            .similar_to(&ContentRef::business_plan(1), 5)
            .unwrap()
            .is_empty());

        let mut library = UserLibrary::default();
        library.bookmarks.push(Bookmark {
            content: ContentRef::business_plan(1),
            created_at: String::new(),
        });
        assert!(service.for_user(&user(&[]), &library, 5).is_empty());

        // Same for a preference that matches nothing in the catalog
        assert!(service
            .for_user(&user(&["gardening"]), &UserLibrary::default(), 5)
            .is_empty());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), MAX_LIMIT);
    }
}
