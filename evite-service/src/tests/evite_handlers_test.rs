use axum::http::StatusCode;
use chrono::Duration;
use evite_shared::auth::create_test_request;
use evite_shared::error::RemoteError;
use evite_shared::models::GuestStatus;
use evite_shared::test_utils::fixtures::sample_evite;
use evite_shared::test_utils::http_test_utils::response_to_json;
use serde_json::json;
use tower::ServiceExt;

use super::create_test_app;

fn owned(id: &str, title: &str, owner: &str) -> evite_shared::models::Evite {
    let mut evite = sample_evite(id, title);
    evite.owner_id = Some(owner.to_string());
    evite
}

#[tokio::test]
async fn test_create_evite() {
    let t = create_test_app();

    let payload = json!({
        "title": "Birthday Party",
        "hostName": "Alex",
        "date": "2026-11-01",
        "time": "18:00",
        "location": "Backyard",
        "template": "kids",
        "guests": [
            { "name": "Sam", "email": "sam@x.com" },
            { "name": "Pat", "email": "pat@x.com", "phone": "555-0100" }
        ]
    });

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("POST", "/evites", "host-1", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["persistence"], "synced");

    let evite = &json_resp["evite"];
    assert_eq!(evite["title"], "Birthday Party");
    assert_eq!(evite["template"], "kids");
    assert_eq!(evite["ownerId"], "host-1");
    assert_eq!(evite["guests"].as_array().unwrap().len(), 2);
    assert_eq!(evite["guests"][0]["status"], "pending");

    let id = evite["id"].as_str().unwrap();
    let stored = t.remote.snapshot().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(t.storage.local().read_all(), stored);
}

#[tokio::test]
async fn test_create_evite_requires_title() {
    let t = create_test_app();

    let response = t
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/evites",
            "host-1",
            Some(json!({ "title": "   " })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(t.remote.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_create_evite_with_duplicate_guest_emails() {
    let t = create_test_app();

    let payload = json!({
        "title": "Party",
        "guests": [
            { "name": "Sam", "email": "sam@x.com" },
            { "name": "Sam Again", "email": "SAM@x.com" }
        ]
    });
    let response = t
        .app
        .clone()
        .oneshot(create_test_request("POST", "/evites", "host-1", Some(payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_evite_while_remote_down() {
    let t = create_test_app();
    t.remote
        .fail_with(RemoteError::Transport("connection reset".into()))
        .await;

    let response = t
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/evites",
            "host-1",
            Some(json!({ "title": "Offline Party" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["persistence"], "localOnly");

    // Listing degrades to the local copy.
    let response = t
        .app
        .clone()
        .oneshot(create_test_request("GET", "/evites", "host-1", None))
        .await
        .unwrap();
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["evites"][0]["title"], "Offline Party");
}

#[tokio::test]
async fn test_list_evites_only_returns_callers() {
    let t = create_test_app();
    t.remote.seed(owned("1", "Mine", "host-1")).await;
    t.remote.seed(owned("2", "Theirs", "host-2")).await;

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("GET", "/evites", "host-1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_resp = response_to_json(response).await;
    let evites = json_resp["evites"].as_array().unwrap();
    assert_eq!(evites.len(), 1);
    assert_eq!(evites[0]["id"], "1");
}

#[tokio::test]
async fn test_list_evites_requires_auth() {
    let t = create_test_app();

    let response = t
        .app
        .clone()
        .oneshot(evite_shared::auth::create_public_request("GET", "/evites", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_evite_of_other_host_is_forbidden() {
    let t = create_test_app();
    t.remote.seed(owned("1", "Theirs", "host-2")).await;

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("GET", "/evites/1", "host-1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_evite() {
    let t = create_test_app();
    t.remote.seed(owned("1", "Party", "host-1")).await;

    let response = t
        .app
        .clone()
        .oneshot(create_test_request(
            "PUT",
            "/evites/1",
            "host-1",
            Some(json!({ "title": "Bigger Party", "template": "elegant", "customImages": ["a.png"] })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["evite"]["title"], "Bigger Party");
    assert_eq!(json_resp["evite"]["location"], "123 Main St");

    let stored = t.storage.get("1").await.unwrap();
    assert_eq!(stored.title, "Bigger Party");
    assert_eq!(stored.custom_images, vec!["a.png".to_string()]);
}

#[tokio::test]
async fn test_update_evite_replaces_guests_and_clears_style() {
    let t = create_test_app();
    let mut evite = owned("1", "Party", "host-1");
    evite.custom_style = Some("gold".to_string());
    evite
        .add_guest(evite_shared::models::NewGuest {
            name: "Sam".to_string(),
            email: "sam@x.com".to_string(),
            phone: None,
        })
        .unwrap();
    t.remote.seed(evite).await;

    let response = t
        .app
        .clone()
        .oneshot(create_test_request(
            "PUT",
            "/evites/1",
            "host-1",
            Some(json!({
                "customStyle": null,
                "guests": [
                    { "name": "Sam", "email": "sam@x.com" },
                    { "name": "Kim", "email": "kim@x.com" }
                ]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = t.storage.get("1").await.unwrap();
    assert!(stored.custom_style.is_none());
    assert_eq!(stored.guests.len(), 2);
    assert_eq!(stored.title, "Party");

    let response = t
        .app
        .clone()
        .oneshot(create_test_request(
            "PUT",
            "/evites/1",
            "host-1",
            Some(json!({
                "guests": [
                    { "name": "Kim", "email": "kim@x.com" },
                    { "name": "Kim", "email": "KIM@x.com" }
                ]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(t.storage.get("1").await.unwrap().guests.len(), 2);
}

#[tokio::test]
async fn test_delete_evite_hides_it_immediately() {
    let t = create_test_app();
    t.remote.seed(owned("1", "Party", "host-1")).await;
    // The remote store keeps the row around after the delete.
    t.remote.ignore_removes(true).await;

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("DELETE", "/evites/1", "host-1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("GET", "/evites", "host-1", None))
        .await
        .unwrap();
    let json_resp = response_to_json(response).await;
    assert!(json_resp["evites"].as_array().unwrap().is_empty());

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("GET", "/evites/1", "host-1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Once the tombstone lapses the stale row is visible again.
    t.clock.advance(Duration::seconds(31));
    let response = t
        .app
        .clone()
        .oneshot(create_test_request("GET", "/evites", "host-1", None))
        .await
        .unwrap();
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["evites"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_evite_with_missing_table() {
    let t = create_test_app();
    t.storage
        .save(&owned("1", "Party", "host-1"))
        .await
        .unwrap();
    t.remote
        .fail_with(RemoteError::Configuration("table evites does not exist".into()))
        .await;

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("DELETE", "/evites/1", "host-1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("GET", "/evites/1", "host-1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_unknown_evite() {
    let t = create_test_app();

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("DELETE", "/evites/nope", "host-1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_guest_management() {
    let t = create_test_app();
    t.remote.seed(owned("1", "Party", "host-1")).await;

    let response = t
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/evites/1/guests",
            "host-1",
            Some(json!({ "name": "Sam", "email": "sam@x.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json_resp = response_to_json(response).await;
    let guest_id = json_resp["evite"]["guests"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = t
        .app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/evites/1/guests",
            "host-1",
            Some(json!({ "name": "Sam", "email": "Sam@X.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let path = format!("/evites/1/guests/{}", guest_id);
    let response = t
        .app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &path,
            "host-1",
            Some(json!({ "status": "accepted", "details": { "headcount": 2 } })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["evite"]["guests"][0]["status"], "accepted");
    assert_eq!(json_resp["evite"]["guests"][0]["details"]["headcount"], 2);

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("GET", "/evites/1/summary", "host-1", None))
        .await
        .unwrap();
    let json_resp = response_to_json(response).await;
    assert_eq!(json_resp["accepted"], 1);
    assert_eq!(json_resp["expectedHeadcount"], 2);

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("DELETE", &path, "host-1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("DELETE", &path, "host-1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert!(t.storage.get("1").await.unwrap().guests.is_empty());
}

#[tokio::test]
async fn test_update_guest_on_other_hosts_evite_is_forbidden() {
    let t = create_test_app();
    let mut evite = owned("1", "Party", "host-2");
    evite
        .add_guest(evite_shared::models::NewGuest {
            name: "Sam".to_string(),
            email: "sam@x.com".to_string(),
            phone: None,
        })
        .unwrap();
    let guest_id = evite.guests[0].id.clone();
    t.remote.seed(evite).await;

    let response = t
        .app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &format!("/evites/1/guests/{}", guest_id),
            "host-1",
            Some(json!({ "status": "declined" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let stored = t.storage.get("1").await.unwrap();
    assert_eq!(stored.guests[0].status, GuestStatus::Pending);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let t = create_test_app();

    let response = t
        .app
        .clone()
        .oneshot(create_test_request("GET", "/nowhere", "host-1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
