use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use http::request::Parts;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Response;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use vite_assets::utils::{is_mounted, normalize_mount_prefix};
use vite_assets::{AssetHandler, AssetRequest, AssetResponse, ViteHandler};

/// The asset handler mounted under its configured `url_prefix`. Requests
/// outside the prefix get a not-found page without reaching the handler.
pub struct MountedAssets {
    prefix: String,
    handler: ViteHandler,
}

impl MountedAssets {
    pub fn new(handler: ViteHandler) -> Self {
        Self {
            prefix: normalize_mount_prefix(&handler.config().url_prefix),
            handler,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub async fn respond(&self, parts: &Parts, peer: SocketAddr) -> AssetResponse {
        let request = AssetRequest::from_parts(parts, peer);
        if !is_mounted(request.path(), &self.prefix) {
            debug!(target: "vite_assets::server", "request outside mount prefix");
            return AssetResponse::not_found();
        }
        self.handler
            .handle(request)
            .await
            .unwrap_or_else(AssetResponse::from)
    }
}

/// Accept connections until `shutdown` resolves.
pub async fn run<F>(listener: TcpListener, assets: Arc<MountedAssets>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received; terminating server");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(target: "vite_assets::server", error = %err, "failed to accept connection");
                        continue;
                    }
                };
                let assets = Arc::clone(&assets);
                tokio::spawn(async move {
                    if let Err(err) = serve_connection(stream, peer, assets).await {
                        debug!(target: "vite_assets::server", peer = %peer, error = %err, "connection closed with error");
                    }
                });
            }
        }
    }
    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    assets: Arc<MountedAssets>,
) -> Result<(), hyper::Error> {
    let service = service_fn(move |req: hyper::Request<Incoming>| {
        let assets = Arc::clone(&assets);
        async move {
            let (parts, _body) = req.into_parts();
            let response = assets.respond(&parts, peer).await;
            Ok::<_, Infallible>(into_hyper(response))
        }
    });

    hyper::server::conn::http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
}

fn into_hyper(response: AssetResponse) -> Response<Full<Bytes>> {
    let (status, headers, body) = response.into_parts();
    let mut hyper_response = Response::new(Full::new(body));
    *hyper_response.status_mut() = status;
    *hyper_response.headers_mut() = headers;
    hyper_response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;
    use vite_assets::{AssetServer, Environment, MemoryStore, ViteConfig};

    fn mounted(environment: Environment, prefix: &str) -> MountedAssets {
        let store = MemoryStore::new()
            .with_file("src/main.js", "dev source")
            .with_file("dist/assets/app-1a2b.js", "built");
        let mut config = ViteConfig::default();
        config.environment = environment;
        config.assets_path = "dist".into();
        config.url_prefix = prefix.into();
        let handler = AssetServer::new(Arc::new(config), Arc::new(store))
            .file_server()
            .expect("handler");
        MountedAssets::new(handler)
    }

    fn parts(target: &str) -> Parts {
        let (parts, ()) = http::Request::get(target).body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn requests_outside_prefix_are_not_found() {
        let assets = mounted(Environment::Production, "assets");
        assert_eq!(assets.prefix(), "/assets/");
        let peer: SocketAddr = "127.0.0.1:9000".parse().unwrap();

        let response = assets.respond(&parts("/assets/app-1a2b.js"), peer).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), b"built");

        let response = assets.respond(&parts("/src/main.js"), peer).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn serves_over_http() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let assets = Arc::new(mounted(Environment::Development, "/src/"));
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(run(listener, assets, async move {
            let _ = stopped.await;
        }));

        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream
            .write_all(b"GET /src/main.js HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .expect("write request");
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.expect("read response");
        let text = String::from_utf8_lossy(&raw);
        assert!(text.starts_with("HTTP/1.1 200 OK"), "{text}");
        assert!(text.ends_with("dev source"), "{text}");

        let _ = stop.send(());
        server.await.expect("join").expect("server result");
    }
}
