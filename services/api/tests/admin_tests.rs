//! Integration tests for the admin user-management endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{test_app, TestApp, ADMIN_EMAIL, PASSWORD};
use serde_json::json;

async fn set_ban(app: &TestApp, cookie: &str, user_id: &str, banned: bool) -> common::TestResponse {
    app.send(
        Method::PUT,
        &format!("/admin/users/{}/ban", user_id),
        Some(json!({ "banned": banned })),
        Some(cookie),
    )
    .await
}

#[tokio::test]
async fn students_cannot_reach_admin_routes() {
    let app = test_app();
    let cookie = app.signed_in("Asha", "asha@gmail.com").await;

    let res = app.get("/admin/users", Some(&cookie)).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_lists_every_user() {
    let app = test_app();
    let admin = app.signed_in("Head Teacher", ADMIN_EMAIL).await;
    app.signup("Asha", "asha@gmail.com").await;

    let res = app.get("/admin/users", Some(&admin)).await;

    assert_eq!(res.status, StatusCode::OK);
    let users = res.body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u["email"] == "asha@gmail.com" && u["isBanned"] == false));
}

#[tokio::test]
async fn toggling_ban_twice_restores_the_original_state() {
    let app = test_app();
    let admin = app.signed_in("Head Teacher", ADMIN_EMAIL).await;
    let student = app.signed_in("Asha", "asha@gmail.com").await;
    let user_id = app.db.find_by_email("asha@gmail.com").unwrap().user_id.to_string();

    let banned = set_ban(&app, &admin, &user_id, true).await;
    assert_eq!(banned.status, StatusCode::OK);
    assert_eq!(banned.body["isBanned"], true);
    assert_eq!(app.get("/auth/me", Some(&student)).await.status, StatusCode::FORBIDDEN);

    let restored = set_ban(&app, &admin, &user_id, false).await;
    assert_eq!(restored.status, StatusCode::OK);
    assert_eq!(restored.body["isBanned"], false);

    assert_eq!(app.get("/auth/me", Some(&student)).await.status, StatusCode::OK);
    assert_eq!(app.login("asha@gmail.com", PASSWORD).await.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_cannot_ban_themselves() {
    let app = test_app();
    let admin = app.signed_in("Head Teacher", ADMIN_EMAIL).await;
    let admin_id = app.db.find_by_email(ADMIN_EMAIL).unwrap().user_id.to_string();

    let res = set_ban(&app, &admin, &admin_id, true).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(!app.db.find_by_email(ADMIN_EMAIL).unwrap().is_banned);
}

#[tokio::test]
async fn banning_unknown_user_is_not_found() {
    let app = test_app();
    let admin = app.signed_in("Head Teacher", ADMIN_EMAIL).await;

    let res = set_ban(&app, &admin, "7f0c3a52-2d4e-4b8e-9a51-3c2f1d0e9b11", true).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn students_cannot_ban_anyone() {
    let app = test_app();
    let student = app.signed_in("Asha", "asha@gmail.com").await;
    app.signup("Ravi", "ravi@yahoo.com").await;
    let ravi = app.db.find_by_email("ravi@yahoo.com").unwrap().user_id.to_string();

    let res = set_ban(&app, &student, &ravi, true).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(!app.db.find_by_email("ravi@yahoo.com").unwrap().is_banned);
}
