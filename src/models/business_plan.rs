// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Business plan model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A business plan template in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BusinessPlan {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub title: String,
    pub industry: String,
    pub description: String,
    /// Full plan text (premium for paid plans)
    #[serde(default)]
    pub content: String,
    /// Section headings, e.g. "Market Analysis"
    #[serde(default)]
    pub sections: Vec<String>,
    /// Required starting capital in birr
    #[serde(default)]
    pub min_investment: u64,
    #[serde(default)]
    pub max_investment: u64,
    /// Expected return on investment, e.g. "25-35% per year"
    #[serde(default)]
    pub expected_roi: Option<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Business plan without premium fields, used in list responses.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BusinessPlanListing {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub title: String,
    pub industry: String,
    pub description: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub min_investment: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub max_investment: u64,
    pub expected_roi: Option<String>,
    pub rating: f32,
    pub tags: Vec<String>,
    pub price: u32,
    pub is_premium: bool,
}

impl BusinessPlan {
    pub fn requires_purchase(&self) -> bool {
        self.is_premium && self.price > 0
    }

    pub fn listing(&self) -> BusinessPlanListing {
        BusinessPlanListing {
            id: self.id,
            title: self.title.clone(),
            industry: self.industry.clone(),
            description: self.description.clone(),
            min_investment: self.min_investment,
            max_investment: self.max_investment,
            expected_roi: self.expected_roi.clone(),
            rating: self.rating,
            tags: self.tags.clone(),
            price: self.price,
            is_premium: self.is_premium,
        }
    }

    /// Copy with premium fields cleared. Section headings stay visible.
    pub fn locked(&self) -> Self {
        Self {
            content: String::new(),
            ..self.clone()
        }
    }

    pub fn normalize(&mut self, now: &str) {
        if self.max_investment < self.min_investment {
            self.max_investment = self.min_investment;
        }
        if self.created_at.is_empty() {
            self.created_at = now.to_string();
        }
        if self.updated_at.is_empty() {
            self.updated_at = self.created_at.clone();
        }
    }
}
