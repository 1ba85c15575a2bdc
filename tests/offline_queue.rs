//! Offline behavior: mutations wait for connectivity, reads go straight out.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{builder_for, wait_for_queue, TestSessionProvider};
use enterprise_api_client::offline::DEFAULT_QUEUE_CAPACITY;
use enterprise_api_client::{ApiResult, Error, RequestOptions};
use mockito::Matcher;
use serde_json::{json, Value};

#[tokio::test]
async fn offline_mutations_replay_when_back_online() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("PATCH", "/api/enterprises/ent_1")
        .match_body(mockito::Matcher::Json(json!({"name": "Acme"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{"id":"ent_1"}}"#)
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("DELETE", "/api/enterprises/ent_1/members/usr_2")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let client = builder_for(&server).build().unwrap();
    client.set_online(false);

    let patch = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .patch::<_, Value>(
                    "/api/enterprises/ent_1",
                    &json!({"name": "Acme"}),
                    RequestOptions::new(),
                )
                .await
        })
    };
    wait_for_queue(&client, 1).await;

    let delete = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .delete::<()>("/api/enterprises/ent_1/members/usr_2", RequestOptions::new())
                .await
        })
    };
    wait_for_queue(&client, 2).await;

    client.set_online(true);

    let patched = tokio::time::timeout(Duration::from_secs(5), patch)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let deleted = tokio::time::timeout(Duration::from_secs(5), delete)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(patched.data(), Some(&json!({"data": {"id": "ent_1"}})));
    assert_eq!(deleted.status(), 204);
    assert_eq!(client.queue_size(), 0);
}

#[tokio::test]
async fn queued_mutations_reach_the_server_in_enqueue_order() {
    let mut server = mockito::Server::new_async().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&arrivals);
    let mock = server
        .mock("PATCH", Matcher::Regex(r"^/api/enterprises/ent_\d+$".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body_from_request(move |request| {
            sink.lock().unwrap().push(request.path().to_string());
            b"{}".to_vec()
        })
        .expect(3)
        .create_async()
        .await;

    let client = builder_for(&server).build().unwrap();
    client.set_online(false);

    let mut pending = Vec::new();
    for n in 1..=3usize {
        let task_client = client.clone();
        pending.push(tokio::spawn(async move {
            task_client
                .patch::<_, Value>(
                    &format!("/api/enterprises/ent_{}", n),
                    &json!({"n": n}),
                    RequestOptions::new(),
                )
                .await
        }));
        wait_for_queue(&client, n).await;
    }

    client.set_online(true);
    for handle in pending {
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(result.is_success());
    }

    mock.assert_async().await;
    assert_eq!(
        *arrivals.lock().unwrap(),
        vec![
            "/api/enterprises/ent_1",
            "/api/enterprises/ent_2",
            "/api/enterprises/ent_3"
        ]
    );
}

#[tokio::test]
async fn request_beyond_default_capacity_is_rejected() {
    let server = mockito::Server::new_async().await;
    let client = builder_for(&server)
        .queue_max_size(DEFAULT_QUEUE_CAPACITY)
        .build()
        .unwrap();
    client.set_online(false);

    let pending: Vec<_> = (0..DEFAULT_QUEUE_CAPACITY)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .post::<_, Value>("/api/enterprises", &json!({"n": i}), RequestOptions::new())
                    .await
            })
        })
        .collect();
    wait_for_queue(&client, DEFAULT_QUEUE_CAPACITY).await;

    let err = client
        .post::<_, Value>("/api/enterprises", &json!({"n": 50}), RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::QueueFull { capacity: 50 }));
    assert_eq!(client.queue_size(), DEFAULT_QUEUE_CAPACITY);

    assert_eq!(client.clear_queue(), DEFAULT_QUEUE_CAPACITY);
    for handle in pending {
        assert!(matches!(handle.await.unwrap(), Err(Error::QueueCleared)));
    }
}

#[tokio::test]
async fn reads_are_not_queued_while_offline() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/currencies")
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let client = builder_for(&server).build().unwrap();
    client.set_online(false);

    let result: ApiResult<Value> = client
        .get("/api/currencies", RequestOptions::new().public())
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(result.is_success());
    assert_eq!(client.queue_size(), 0);
}

#[tokio::test]
async fn full_queue_rejects_new_mutations() {
    let server = mockito::Server::new_async().await;
    let client = builder_for(&server).queue_max_size(2).build().unwrap();
    client.set_online(false);

    let mut pending = Vec::new();
    for i in 0..2 {
        let task_client = client.clone();
        pending.push(tokio::spawn(async move {
            task_client
                .post::<_, Value>("/api/enterprises", &json!({"n": i}), RequestOptions::new())
                .await
        }));
        wait_for_queue(&client, i + 1).await;
    }

    let err = client
        .post::<_, Value>("/api/enterprises", &json!({"n": 2}), RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::QueueFull { capacity: 2 }));
    assert_eq!(
        err.to_string(),
        "Queue is full (max 2). Request rejected."
    );

    assert_eq!(client.clear_queue(), 2);
    for handle in pending {
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::QueueCleared));
    }
}

#[tokio::test]
async fn sign_out_clears_pending_mutations() {
    let server = mockito::Server::new_async().await;
    let provider = TestSessionProvider::new("token-1", None);
    let client = builder_for(&server)
        .session_provider(provider.clone())
        .build()
        .unwrap();
    client.set_online(false);

    let pending = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .post::<_, Value>(
                    "/api/enterprises/ent_1/members",
                    &json!({"email": "a@b.c"}),
                    RequestOptions::new(),
                )
                .await
        })
    };
    wait_for_queue(&client, 1).await;

    client.auth().teardown().await;

    assert_eq!(client.queue_size(), 0);
    assert_eq!(provider.sign_outs(), 1);
    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::QueueCleared));
}

#[tokio::test]
async fn disabled_queue_sends_immediately() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/enterprises/ent_1")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let client = builder_for(&server).queue_enabled(false).build().unwrap();
    client.set_online(false);

    let result: ApiResult<Value> = client
        .put("/api/enterprises/ent_1", &json!({}), RequestOptions::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(result.is_success());
}
