use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::api::OptionalApiJson;
use crate::identity::{ActingUser, USER_ID_HEADER};
use crate::workflows::participation::router::{rsvp_handler, status_handler};
use crate::workflows::vetting::VettingStatus;

fn request(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, MEMBER)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .expect("request builds")
}

#[tokio::test]
async fn rsvp_route_returns_created_dto() {
    let fixture = fixture();
    let router = participation_router_with_service(fixture.service);

    let response = router
        .oneshot(request(
            "POST",
            &format!("/api/events/{SOCIAL}/rsvp"),
            Body::from(json!({ "notes": "See you there" }).to_string()),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], json!("RSVP confirmed"));
    assert_eq!(payload["data"]["participationType"], json!("Rsvp"));
    assert_eq!(payload["data"]["canCancel"], json!(true));
}

#[tokio::test]
async fn rsvp_route_is_forbidden_for_denied_member() {
    let fixture = fixture();
    seed_application(&fixture.vetting, MEMBER, VettingStatus::Denied, now());
    let router = participation_router_with_service(fixture.service);

    let response = router
        .oneshot(request(
            "POST",
            &format!("/api/events/{SOCIAL}/rsvp"),
            Body::empty(),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    let error = payload["error"].as_str().expect("error message");
    assert!(error.contains("Denied"));
}

#[tokio::test]
async fn ticket_route_returns_not_found_for_missing_event() {
    let fixture = fixture();
    let router = participation_router_with_service(fixture.service);

    let response = router
        .oneshot(request(
            "POST",
            "/api/events/evt-missing/tickets",
            Body::from(json!({}).to_string()),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_route_returns_no_content_then_bad_request() {
    let fixture = fixture();
    let router = participation_router_with_service(fixture.service);
    let uri = format!("/api/events/{SOCIAL}/participation");

    let created = router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/events/{SOCIAL}/rsvp"),
            Body::empty(),
        ))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);

    let cancelled = router
        .clone()
        .oneshot(request(
            "DELETE",
            &uri,
            Body::from(json!({ "reason": "Sick" }).to_string()),
        ))
        .await
        .expect("route executes");
    assert_eq!(cancelled.status(), StatusCode::NO_CONTENT);

    let repeated = router
        .oneshot(request("DELETE", &uri, Body::empty()))
        .await
        .expect("route executes");
    assert_eq!(repeated.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rsvp_handler_reports_duplicate_as_conflict() {
    let fixture = fixture();
    let service = Arc::new(fixture.service);

    let first = rsvp_handler(
        State(service.clone()),
        ActingUser(user(MEMBER)),
        Path(SOCIAL.to_string()),
        OptionalApiJson(None),
    )
    .await
    .into_response();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = rsvp_handler(
        State(service),
        ActingUser(user(MEMBER)),
        Path(SOCIAL.to_string()),
        OptionalApiJson(None),
    )
    .await
    .into_response();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_handler_returns_capacity_view() {
    let fixture = fixture();

    let response = status_handler(
        State(Arc::new(fixture.service)),
        ActingUser(user(MEMBER)),
        Path(CLASS.to_string()),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"]["canPurchaseTicket"], json!(true));
    assert_eq!(payload["data"]["canRsvp"], json!(false));
    assert_eq!(payload["data"]["capacity"]["total"], json!(20));
}
