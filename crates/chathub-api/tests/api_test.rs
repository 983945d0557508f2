//! HTTP surface tests driving the router directly.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Request, StatusCode, header};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use chathub_api::{AppState, build_router};
use chathub_auth::{JwtDecoder, JwtEncoder};
use chathub_core::config::AppConfig;
use chathub_core::traits::{ChangeFeed, ChatStore};
use chathub_core::types::{MessageId, RoomId, RoomRecord, UserId};
use chathub_realtime::{MemoryChangeFeed, RealtimeEngine};
use chathub_realtime::message::{HubEvent, InboundMessage, OutboundMessage};
use chathub_realtime::relay::{RelayOutcome, Sender};
use chathub_storage::{ImageTranscoder, MemoryChatStore};

struct TestApp {
    router: Router,
    store: Arc<MemoryChatStore>,
    engine: Arc<RealtimeEngine>,
    encoder: JwtEncoder,
}

async fn test_app() -> TestApp {
    let config = Arc::new(AppConfig::default());
    let store = Arc::new(MemoryChatStore::new());
    let transcoder = Arc::new(ImageTranscoder::from_config(&config.attachments));
    let engine = Arc::new(RealtimeEngine::new(&config, store.clone(), transcoder.clone()));
    let change_feed: Arc<dyn ChangeFeed> = Arc::new(MemoryChangeFeed::default());
    engine
        .listen(change_feed.clone())
        .await
        .expect("listen");
    let state = AppState::new(
        config.clone(),
        store.clone(),
        transcoder,
        change_feed,
        Arc::new(JwtDecoder::new(&config.auth)),
        engine.clone(),
    );

    TestApp {
        router: build_router(state),
        store,
        engine,
        encoder: JwtEncoder::new(&config.auth),
    }
}

impl TestApp {
    fn bearer(&self, user_id: UserId) -> String {
        let token = self
            .encoder
            .generate_access_token(user_id)
            .expect("token");
        format!("Bearer {token}")
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    async fn call(&self, method: &str, uri: &str, user: Option<UserId>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, self.bearer(user));
        }
        self.send(builder.body(Body::empty()).expect("request")).await
    }

    async fn room(&self, author: UserId) -> RoomId {
        self.store
            .create_room(RoomRecord::new("general", author))
            .await
            .expect("room")
            .id
    }

    fn json(&self, method: &str, uri: &str, user: UserId, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, self.bearer(user))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn upload(&self, uri: &str, user: UserId, mime: &str, data: &[u8]) -> Request<Body> {
        let boundary = "chathubboundary";
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, self.bearer(user))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(multipart(boundary, mime, data)))
            .expect("request")
    }

    async fn post_message(&self, user: UserId, room: RoomId, has_attachment: bool) -> MessageId {
        let conn_id = self
            .engine
            .hub
            .lookup(user)
            .await
            .expect("lookup")
            .expect("connected");
        let outcome = self
            .engine
            .relay
            .relay(
                Sender { conn_id, user_id: user },
                InboundMessage {
                    content: "with file".to_string(),
                    has_attachment,
                    room_id: Some(room),
                },
            )
            .await
            .expect("relay");
        match outcome {
            RelayOutcome::Relayed { message_id, .. } => message_id,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}

async fn next_frame(rx: &mut mpsc::Receiver<OutboundMessage>) -> OutboundMessage {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("frame within timeout")
        .expect("queue open")
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut png = Vec::new();
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode png");
    png
}

fn drain(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<OutboundMessage> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

fn multipart(boundary: &str, mime: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn health_needs_no_auth() {
    let app = test_app().await;
    let (status, body) = app.call("GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["ws_connections"], 0);
}

#[tokio::test]
async fn missing_or_bad_token_is_unauthorized() {
    let app = test_app().await;
    let (status, body) = app.call("DELETE", "/api/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/users/me")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .expect("request");
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_query_parameter_is_accepted() {
    let app = test_app().await;
    let user = UserId::new();
    let room = app.room(user).await;
    let token = app.encoder.generate_access_token(user).expect("token");

    let (status, body) = app
        .call("GET", &format!("/api/rooms/{room}?token={token}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "general");
}

#[tokio::test]
async fn create_room_announces_to_others() {
    let app = test_app().await;
    let author = UserId::new();
    let mut watcher = app.engine.hub.register(UserId::new()).await.expect("register");

    let request = Request::builder()
        .method("POST")
        .uri("/api/rooms")
        .header(header::AUTHORIZATION, app.bearer(author))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"  lobby  "}"#))
        .expect("request");
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "lobby");
    assert_eq!(app.store.room_count(), 1);

    let frames = drain(&mut watcher.outbound);
    assert_eq!(frames.len(), 1);
    assert!(matches!(
        &frames[0],
        OutboundMessage::Event(HubEvent::ChatroomUpdate { name, author_id, .. })
            if name == "lobby" && *author_id == author
    ));
}

#[tokio::test]
async fn create_room_rejects_bad_names() {
    let app = test_app().await;
    for payload in [r#"{"name":""}"#, r#"{"name":"   "}"#, r#"{"name":"abcdefghijklmnopqrstuvwxyz"}"#] {
        let request = Request::builder()
            .method("POST")
            .uri("/api/rooms")
            .header(header::AUTHORIZATION, app.bearer(UserId::new()))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .expect("request");
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
    assert_eq!(app.store.room_count(), 0);
}

#[tokio::test]
async fn join_and_leave_round_trip() {
    let app = test_app().await;
    let user = UserId::new();
    let room = app.room(user).await;
    let _conn = app.engine.hub.register(user).await.expect("register");

    let (status, body) = app
        .call("POST", &format!("/api/rooms/{room}/join"), Some(user))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changed"], true);
    assert_eq!(app.engine.hub.rooms_of(user).await.expect("rooms"), vec![room]);

    let (status, body) = app
        .call("POST", &format!("/api/rooms/{room}/leave"), Some(user))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changed"], true);
    assert!(app.engine.hub.members_of(room).await.expect("members").is_empty());
}

#[tokio::test]
async fn join_unknown_room_is_not_found() {
    let app = test_app().await;
    let (status, _) = app
        .call(
            "POST",
            &format!("/api/rooms/{}/join", RoomId::new()),
            Some(UserId::new()),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_author_deletes_room() {
    let app = test_app().await;
    let author = UserId::new();
    let member = UserId::new();
    let room = app.room(author).await;
    let mut member_conn = app.engine.hub.register(member).await.expect("register");
    app.engine.hub.join(room, member).await.expect("join");

    let (status, _) = app
        .call("DELETE", &format!("/api/rooms/{room}"), Some(member))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.room_count(), 1);

    let (status, _) = app
        .call("DELETE", &format!("/api/rooms/{room}"), Some(author))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.store.room_count(), 0);
    assert_eq!(
        drain(&mut member_conn.outbound),
        vec![OutboundMessage::from(HubEvent::ChatroomDelete { id: room })]
    );
    assert!(app.engine.hub.rooms_of(member).await.expect("rooms").is_empty());
}

#[tokio::test]
async fn attachment_upload_and_download() {
    let app = test_app().await;
    let user = UserId::new();
    let room = app.room(user).await;
    let mut conn = app.engine.hub.register(user).await.expect("register");
    app.engine.hub.join(room, user).await.expect("join");

    let outcome = app
        .engine
        .relay
        .relay(
            Sender {
                conn_id: conn.conn_id,
                user_id: user,
            },
            InboundMessage {
                content: "notes".to_string(),
                has_attachment: true,
                room_id: Some(room),
            },
        )
        .await
        .expect("relay");
    let message_id = match outcome {
        RelayOutcome::Relayed { message_id, .. } => message_id,
        other => panic!("unexpected outcome {other:?}"),
    };
    drain(&mut conn.outbound);

    let boundary = "chathubboundary";
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/rooms/{room}/messages/{message_id}/attachment"))
        .header(header::AUTHORIZATION, app.bearer(user))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart(boundary, "text/plain", b"meeting notes")))
        .expect("request");
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["mime_type"], "text/plain");
    assert_eq!(
        drain(&mut conn.outbound),
        vec![OutboundMessage::from(HubEvent::AttachmentComplete {
            id: message_id,
            mime_type: "text/plain".to_string(),
        })]
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/attachments/{message_id}"))
                .header(header::AUTHORIZATION, app.bearer(user))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(&bytes[..], b"meeting notes");
}

#[tokio::test]
async fn upload_by_other_user_is_forbidden() {
    let app = test_app().await;
    let author = UserId::new();
    let room = app.room(author).await;
    let conn = app.engine.hub.register(author).await.expect("register");
    app.engine.hub.join(room, author).await.expect("join");
    let outcome = app
        .engine
        .relay
        .relay(
            Sender {
                conn_id: conn.conn_id,
                user_id: author,
            },
            InboundMessage {
                content: "mine".to_string(),
                has_attachment: true,
                room_id: Some(room),
            },
        )
        .await
        .expect("relay");
    let RelayOutcome::Relayed { message_id, .. } = outcome else {
        panic!("message rejected");
    };

    let boundary = "b";
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/rooms/{room}/messages/{message_id}/attachment"))
        .header(header::AUTHORIZATION, app.bearer(UserId::new()))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart(boundary, "text/plain", b"x")))
        .expect("request");
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn picture_update_is_announced_as_data_url() {
    let app = test_app().await;
    let user = UserId::new();
    let mut watcher = app.engine.hub.register(UserId::new()).await.expect("register");

    let request = app.upload("/api/users/me/picture", user, "image/png", &png(4, 4));
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let data_url = body["data"]["base64pfp"].as_str().expect("data url");
    assert!(data_url.starts_with("data:image/png;base64,"));

    assert_eq!(
        next_frame(&mut watcher.outbound).await,
        OutboundMessage::from(HubEvent::PfpUpdate {
            id: user,
            base64pfp: data_url.to_string(),
        })
    );
}

#[tokio::test]
async fn delete_me_cascades_and_notifies() {
    let app = test_app().await;
    let user = UserId::new();
    app.room(user).await;
    let _conn = app.engine.hub.register(user).await.expect("register");
    let mut other = app.engine.hub.register(UserId::new()).await.expect("register");

    let (status, body) = app.call("DELETE", "/api/users/me", Some(user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rooms_deleted"], 1);
    assert_eq!(app.store.room_count(), 0);
    assert_eq!(app.engine.hub.lookup(user).await.expect("lookup"), None);
    assert_eq!(
        drain(&mut other.outbound),
        vec![OutboundMessage::from(HubEvent::UserDelete { id: user })]
    );

    let (status, _) = app.call("DELETE", "/api/users/me", Some(user)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(drain(&mut other.outbound).is_empty());
}

#[tokio::test]
async fn list_rooms_can_filter_to_own() {
    let app = test_app().await;
    let user = UserId::new();
    let mine = app.room(user).await;
    app.room(UserId::new()).await;

    let (status, body) = app.call("GET", "/api/rooms", Some(user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().expect("rooms").len(), 2);
    assert!(body["data"][0].get("messages").is_none());

    let (status, body) = app.call("GET", "/api/rooms?own=true", Some(user)).await;
    assert_eq!(status, StatusCode::OK);
    let rooms = body["data"].as_array().expect("rooms");
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["ID"], mine.to_string());
}

#[tokio::test]
async fn rename_is_author_only_and_announced() {
    let app = test_app().await;
    let author = UserId::new();
    let member = UserId::new();
    let room = app.room(author).await;
    app.store
        .create_room(RoomRecord::new("Archive", author))
        .await
        .expect("second room");
    let mut watcher = app.engine.hub.register(member).await.expect("register");
    let uri = format!("/api/rooms/{room}");

    let (status, _) = app
        .send(app.json("PATCH", &uri, member, r#"{"name":"hijacked"}"#))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(app.json("PATCH", &uri, author, r#"{"name":"archive"}"#))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You already have a room by that name");

    let (status, body) = app
        .send(app.json("PATCH", &uri, author, r#"{"name":" lounge "}"#))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "lounge");

    assert_eq!(
        drain(&mut watcher.outbound),
        vec![OutboundMessage::from(HubEvent::ChatroomUpdate {
            id: room,
            name: "lounge".to_string(),
            author_id: author,
            img_url: None,
            img_blur: None,
        })]
    );
}

#[tokio::test]
async fn room_image_upload_is_stored_and_announced() {
    let app = test_app().await;
    let author = UserId::new();
    let room = app.room(author).await;
    let mut watcher = app.engine.hub.register(UserId::new()).await.expect("register");
    let uri = format!("/api/rooms/{room}/image");

    let (status, _) = app.call("GET", &uri, Some(author)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(app.upload(&uri, UserId::new(), "image/png", &png(8, 8)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(app.upload(&uri, author, "text/plain", b"not an image"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(app.upload(&uri, author, "image/png", &png(800, 200)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["img_url"], uri);
    let blur = body["data"]["img_blur"].as_str().expect("blur").to_string();
    assert!(blur.starts_with("data:image/jpeg;base64,"));

    assert_eq!(
        drain(&mut watcher.outbound),
        vec![OutboundMessage::from(HubEvent::ChatroomUpdate {
            id: room,
            name: "general".to_string(),
            author_id: author,
            img_url: Some(uri.clone()),
            img_blur: Some(blur.clone()),
        })]
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header(header::AUTHORIZATION, app.bearer(author))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let stored = image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg)
        .expect("decode stored image");
    assert_eq!((stored.width(), stored.height()), (400, 100));

    let (_, body) = app.call("GET", &format!("/api/rooms/{room}"), Some(author)).await;
    assert_eq!(body["data"]["img_url"], uri);
    assert_eq!(body["data"]["img_blur"], blur);
}

#[tokio::test]
async fn room_read_back_reports_attachment_outcome() {
    let app = test_app().await;
    let user = UserId::new();
    let room = app.room(user).await;
    let _conn = app.engine.hub.register(user).await.expect("register");
    app.engine.hub.join(room, user).await.expect("join");

    let completed = app.post_message(user, room, true).await;
    let failed = app.post_message(user, room, true).await;
    let plain = app.post_message(user, room, false).await;

    let (status, _) = app
        .send(app.upload(
            &format!("/api/rooms/{room}/messages/{completed}/attachment"),
            user,
            "text/plain",
            b"minutes",
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(app.upload(
            &format!("/api/rooms/{room}/messages/{failed}/attachment"),
            user,
            "image/png",
            b"definitely not a png",
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.call("GET", &format!("/api/rooms/{room}"), Some(user)).await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["data"]["messages"].as_array().expect("messages");
    let find = |id: MessageId| {
        messages
            .iter()
            .find(|m| m["ID"] == id.to_string())
            .expect("message present")
    };

    let done = find(completed);
    assert_eq!(done["has_attachment"], true);
    assert_eq!(done["attachment_pending"], false);
    assert_eq!(done["attachment_error"], false);
    assert_eq!(done["mime_type"], "text/plain");

    let broken = find(failed);
    assert_eq!(broken["has_attachment"], false);
    assert_eq!(broken["attachment_pending"], false);
    assert_eq!(broken["attachment_error"], true);
    assert!(broken.get("mime_type").is_none());

    let none = find(plain);
    assert_eq!(none["has_attachment"], false);
    assert_eq!(none["attachment_error"], false);
}
