// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public catalog endpoint tests.

use axum::http::{header, StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::{get, put, ADMIN_ID, READER_ID};

#[tokio::test]
async fn test_list_books_hides_premium_fields() {
    let (app, _) = common::create_test_app();

    let (status, body) = get(&app, "/api/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 6);
    assert_eq!(body["page"], 1);

    let first = &body["items"][0];
    assert_eq!(first["title"], "Atomic Habits");
    assert!(first.get("summary").is_none());
    assert!(first.get("key_takeaways").is_none());
}

#[tokio::test]
async fn test_list_responses_are_cacheable() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(common::request("GET", "/api/business-plans", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=300"
    );
}

#[tokio::test]
async fn test_book_filters() {
    let (app, _) = common::create_test_app();

    let (_, body) = get(&app, "/api/books?category=finance", None).await;
    assert_eq!(body["total"], 2);

    let (_, body) = get(&app, "/api/books?premium=true", None).await;
    assert_eq!(body["total"], 3);

    let (_, body) = get(&app, "/api/books?search=NEWPORT", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "Deep Work");

    let (_, body) = get(&app, "/api/books?per_page=2&page=3", None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["id"], 5);

    let (_, body) = get(&app, "/api/books?page=99", None).await;
    assert_eq!(body["total"], 6);
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_listing_parameters() {
    let (app, _) = common::create_test_app();

    let (status, _) = get(&app, "/api/books?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long_search = "a".repeat(101);
    let (status, _) = get(&app, &format!("/api/books?search={}", long_search), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/business-plans?premium=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_group_counts() {
    let (app, _) = common::create_test_app();

    let (status, body) = get(&app, "/api/books/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    let groups = body["groups"].as_array().unwrap();
    let self_help = groups.iter().find(|g| g["name"] == "Self-Help").unwrap();
    assert_eq!(self_help["count"], 2);

    let (_, body) = get(&app, "/api/business-plans/industries", None).await;
    let agriculture = body["groups"]
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["name"] == "Agriculture")
        .cloned()
        .unwrap();
    assert_eq!(agriculture["count"], 2);
}

#[tokio::test]
async fn test_premium_book_is_locked_for_anonymous_and_non_buyers() {
    let (app, _) = common::create_test_app();

    let (status, body) = get(&app, "/api/books/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locked"], true);
    assert_eq!(body["summary"], "");
    assert_eq!(body["key_takeaways"], json!([]));
    assert_eq!(body["title"], "Atomic Habits");

    let (_, body) = get(&app, "/api/books/1", Some(READER_ID)).await;
    assert_eq!(body["locked"], true);
}

#[tokio::test]
async fn test_suspended_buyer_sees_locked_book() {
    let (app, state) = common::create_test_app();

    common::purchase(&app, &state, READER_ID, json!({ "kind": "book", "id": 1 })).await;
    let (_, body) = get(&app, "/api/books/1", Some(READER_ID)).await;
    assert_eq!(body["locked"], false);
    assert!(!body["summary"].as_str().unwrap().is_empty());

    let (status, _) = put(
        &app,
        &format!("/api/admin/users/{}", READER_ID),
        Some(ADMIN_ID),
        json!({ "status": "suspended" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/api/books/1", Some(READER_ID)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locked"], true);
    assert_eq!(body["summary"], "");

    // Unknown ids are anonymous too
    let (_, body) = get(&app, "/api/books/1", Some(9999)).await;
    assert_eq!(body["locked"], true);
}

#[tokio::test]
async fn test_free_book_is_unlocked() {
    let (app, _) = common::create_test_app();

    let (status, body) = get(&app, "/api/books/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locked"], false);
    assert!(!body["summary"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_locked_plan_keeps_section_headings() {
    let (app, _) = common::create_test_app();

    let (_, body) = get(&app, "/api/business-plans/1", None).await;
    assert_eq!(body["locked"], true);
    assert_eq!(body["content"], "");
    assert_eq!(body["sections"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_unknown_items_are_404() {
    let (app, _) = common::create_test_app();

    for uri in [
        "/api/books/999",
        "/api/business-plans/999",
        "/api/books/999/similar",
        "/api/business-plans/999/similar",
    ] {
        let (status, body) = get(&app, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "not_found");
    }
}

#[tokio::test]
async fn test_non_numeric_id_is_400() {
    let (app, _) = common::create_test_app();

    for uri in [
        "/api/books/abc",
        "/api/business-plans/-1/similar",
        "/api/books?page=abc",
        "/api/books/1/similar?limit=lots",
    ] {
        let (status, body) = get(&app, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "bad_request", "{uri}");
        assert!(body["details"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_similar_books() {
    let (app, _) = common::create_test_app();

    let (status, body) = get(&app, "/api/books/1/similar?limit=3", None).await;
    assert_eq!(status, StatusCode::OK);

    let recs = body["recommendations"].as_array().unwrap();
    assert!(!recs.is_empty() && recs.len() <= 3);
    assert!(recs
        .iter()
        .all(|r| !(r["content"]["kind"] == "book" && r["content"]["id"] == 1)));
    assert!(recs
        .windows(2)
        .all(|w| w[0]["score"].as_f64() >= w[1]["score"].as_f64()));
    assert_eq!(recs[0]["reason"], "Similar to Atomic Habits");
}
