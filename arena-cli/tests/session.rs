use crate::server::{bearer, jwt, TestApi};
use arena_cli::{
    api::{PROFILE_PATHS, TOURNAMENTS_PATH},
    error::ApiError,
    navigation::Location,
    session::REFRESH_PATH,
    storage::{keys, Storage},
};
use arena_core::{common::TournamentQuery, messages::MessageKey};
use assert_matches::assert_matches;
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;
use testresult::TestResult;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, ResponseTemplate,
};

const PROTECTED: &str = "/api/protected/";

#[test_log::test(tokio::test)]
async fn test_expired_access_token_is_refreshed_and_retried_once() -> TestResult {
    let t = TestApi::start().await?;
    let (old, new, refresh) = (jwt("old"), jwt("new"), jwt("refresh"));
    t.sign_in(&old, &refresh);

    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .and(header("authorization", bearer(&old).as_str()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&t.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({ "refresh": refresh })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": new })))
        .expect(1)
        .mount(&t.server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .and(header("authorization", bearer(&new).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&t.server)
        .await;

    let request = reqwest::Client::new().get(t.url(PROTECTED)).build()?;
    let response = t.session.authenticated_fetch(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(t.storage.get(keys::ACCESS_TOKEN), Some(new));
    // Refreshing keeps the refresh token
    assert_eq!(t.storage.get(keys::REFRESH_TOKEN), Some(refresh));
    assert!(t.navigator.visited().is_empty());

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_failed_refresh_returns_original_401_and_logs_out() -> TestResult {
    let t = TestApi::start().await?;
    t.sign_in(&jwt("old"), &jwt("refresh"));
    t.storage.set(keys::USER_DATA, r#"{"username":"player1"}"#);

    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .expect(1)
        .mount(&t.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&t.server)
        .await;

    let request = reqwest::Client::new().get(t.url(PROTECTED)).build()?;
    let response = t.session.authenticated_fetch(request).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<serde_json::Value>().await?["detail"], "expired");
    assert!(t.storage.keys().is_empty());
    assert_eq!(t.navigator.visited(), vec![Location::Login]);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_retry_is_returned_even_if_unauthorized_again() -> TestResult {
    let t = TestApi::start().await?;
    t.sign_in(&jwt("old"), &jwt("refresh"));

    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&t.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": jwt("new") })))
        .expect(1)
        .mount(&t.server)
        .await;

    let request = reqwest::Client::new().get(t.url(PROTECTED)).build()?;
    let response = t.session.authenticated_fetch(request).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(t.request_count().await, 3);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_missing_refresh_token_never_calls_refresh() -> TestResult {
    let t = TestApi::start().await?;
    t.storage.set(keys::ACCESS_TOKEN, &jwt("old"));

    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&t.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&t.server)
        .await;

    let request = reqwest::Client::new().get(t.url(PROTECTED)).build()?;
    let response = t.session.authenticated_fetch(request).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!t.session.is_authenticated());
    assert_eq!(t.navigator.visited(), vec![Location::Login]);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_caller_headers_are_kept() -> TestResult {
    let t = TestApi::start().await?;
    let access = jwt("user");
    t.sign_in(&access, &jwt("refresh"));

    Mock::given(method("POST"))
        .and(path(PROTECTED))
        .and(header("authorization", bearer(&access).as_str()))
        .and(header("x-client", "arena-cli-tests"))
        .and(body_json(json!({ "name": "Spring Cup" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&t.server)
        .await;

    let request = reqwest::Client::new()
        .post(t.url(PROTECTED))
        .header("x-client", "arena-cli-tests")
        .json(&json!({ "name": "Spring Cup" }))
        .build()?;
    let response = t.session.authenticated_fetch(request).await?;

    assert_eq!(response.status(), StatusCode::CREATED);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_unreadable_refresh_response_logs_out() -> TestResult {
    let t = TestApi::start().await?;
    t.sign_in(&jwt("old"), &jwt("refresh"));

    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&t.server)
        .await;

    assert_eq!(t.session.refresh_access_token().await, None);
    assert!(t.storage.keys().is_empty());
    assert_eq!(t.navigator.visited(), vec![Location::Login]);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_rejected_retry_expires_the_session() -> TestResult {
    let t = TestApi::start().await?;
    t.sign_in(&jwt("old"), &jwt("refresh"));

    Mock::given(method("GET"))
        .and(path(PROFILE_PATHS[0]))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&t.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": jwt("new") })))
        .expect(1)
        .mount(&t.server)
        .await;

    let result = t.api.fetch_profile().await;

    assert_matches!(&result, Err(ApiError::SessionExpired));
    let notices = result.expect_err("expired").notices();
    assert_eq!(notices[0].key, MessageKey::SessionExpired);
    assert_eq!(notices[0].dismiss_after(), None);
    assert!(!t.session.is_authenticated());
    assert!(t.storage.keys().is_empty());
    assert_eq!(t.navigator.visited(), vec![Location::Login]);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_failed_refresh_expires_the_session_once() -> TestResult {
    let t = TestApi::start().await?;
    t.sign_in(&jwt("old"), &jwt("refresh"));

    Mock::given(method("GET"))
        .and(path(TOURNAMENTS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&t.server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&t.server)
        .await;

    let query = TournamentQuery {
        page: 1,
        page_size: 12,
        ordering: None,
        status: None,
    };
    assert_matches!(t.api.tournaments(&query).await, Err(ApiError::SessionExpired));
    // The middleware already signed out, nothing navigates twice
    assert_eq!(t.navigator.visited(), vec![Location::Login]);

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_slow_server_is_a_network_error() -> TestResult {
    let t = TestApi::start_with(|settings| arena_cli::settings::Settings {
        request_timeout_ms: 200,
        ..settings
    })
    .await?;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&t.server)
        .await;

    let query = TournamentQuery {
        page: 1,
        page_size: 12,
        ordering: None,
        status: None,
    };
    assert_matches!(t.api.tournaments(&query).await, Err(ApiError::Network(_)));

    Ok(())
}
