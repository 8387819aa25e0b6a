//! Minimal HTTP dispatch loop
//!
//! One hyper HTTP/1 connection per accepted socket. Admin paths go to the
//! [`AdminHandlers`]; everything else gets a JSON 404.

use crate::admin::{not_found_response, AdminHandlers, Resp};
use crate::config::BastionConfig;
use crate::manager::UserManager;
use anyhow::{Context, Result};
use hyper::body::Incoming;
use hyper::Request;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Serve until `shutdown` resolves. In-flight connections are left to finish.
pub async fn serve<F>(manager: Arc<UserManager>, config: &BastionConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    serve_listener(manager, config, listener, shutdown).await
}

/// Like [`serve`] on an already bound listener
pub async fn serve_listener<F>(
    manager: Arc<UserManager>,
    config: &BastionConfig,
    listener: TcpListener,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let admin = if config.admin.enabled {
        log::info!("Admin endpoints mounted under {}", config.admin.prefix);
        Some(Arc::new(manager.admin_handlers(&config.admin.prefix)))
    } else {
        log::info!("Admin endpoints disabled");
        None
    };

    let local = listener.local_addr().context("Failed to read listener address")?;
    log::info!("Server listening on http://{}", local);

    tokio::pin!(shutdown);
    loop {
        let (stream, remote_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    accept_backoff(&err).await;
                    continue;
                }
            },
            _ = &mut shutdown => {
                log::info!("Shutdown requested, no longer accepting connections");
                return Ok(());
            }
        };
        let admin = admin.clone();

        tokio::spawn(async move {
            let io = hyper_util::rt::TokioIo::new(stream);

            let service = hyper::service::service_fn(move |req| {
                let admin = admin.clone();
                async move { Ok::<_, Infallible>(route(admin.as_deref(), req).await) }
            });

            if let Err(err) = hyper::server::conn::http1::Builder::new().serve_connection(io, service).await {
                log::error!("Connection error from {}: {}", remote_addr, err);
            }
        });
    }
}

async fn route(admin: Option<&AdminHandlers>, req: Request<Incoming>) -> Resp {
    let path = req.uri().path().to_string();
    match admin {
        Some(admin) if admin.matches(&path) => match admin.handle(req).await {
            Some(resp) => resp,
            None => not_found_response(&path),
        },
        _ => not_found_response(&path),
    }
}

/// Pause after a failed `accept`; errors like EMFILE persist until a connection closes
async fn accept_backoff(err: &std::io::Error) {
    log::warn!("Failed to accept connection: {}, retrying in {:?}", err, ACCEPT_BACKOFF);
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}
