//! Dispatch loop over a real socket

use bastion_core::config::BastionConfig;
use bastion_core::server::serve_listener;
use bastion_core::UserManager;
use bastion_core::store::MemoryUserStore;
use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

async fn get(addr: SocketAddr, path: &str, user: Option<&str>) -> (StatusCode, Value) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await.unwrap();
    tokio::spawn(conn);

    let mut builder = Request::builder().uri(path).header("host", addr.to_string());
    if let Some(user) = user {
        builder = builder.header("X-Auth-User", user);
    }
    let resp = sender.send_request(builder.body(Empty::<Bytes>::new()).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn serves_admin_routes_until_shutdown() {
    let config = BastionConfig::default();
    let manager = Arc::new(UserManager::with_store(&config, Arc::new(MemoryUserStore::new())).unwrap());
    manager.create_role("editor", &["read", "write"], "manage-users").unwrap();
    manager.create_user("alice", "editor").unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        serve_listener(manager, &config, listener, async {
            let _ = stopped.await;
        })
        .await
    });

    let (status, body) = get(addr, "/_admin/users/whoami", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rights"], serde_json::json!(["read", "write"]));

    let (status, body) = get(addr, "/elsewhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn disabled_admin_surface_is_not_found() {
    let mut config = BastionConfig::default();
    config.admin.enabled = false;
    let manager = Arc::new(UserManager::with_store(&config, Arc::new(MemoryUserStore::new())).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        serve_listener(manager, &config, listener, async {
            let _ = stopped.await;
        })
        .await
    });

    let (status, _) = get(addr, "/_admin/users/whoami", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
