use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use tempfile::tempdir;
use vite_assets::{
    AssetError, AssetRequest, AssetServer, DirStore, DynStore, Environment, SharedConfig,
    ViteConfig,
};

fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, contents).expect("write fixture");
}

fn react_project(root: &Path) {
    write(
        root,
        "package.json",
        r#"{
            "name": "shop",
            "type": "module",
            "dependencies": { "react": "^18.2.0", "react-dom": "^18.2.0" },
            "devDependencies": { "vite": "^4.3.9", "typescript": "^5.0.2" }
        }"#,
    );
    write(root, "index.html", "<div id=\"root\"></div>");
    write(root, "src/main.tsx", "createRoot(el).render(<App />)");
    write(root, ".env.local", "TOKEN=abc");
    write(root, "dist/index.html", "<script src=\"/assets/index-9c1d.js\"></script>");
    write(root, "dist/assets/index-9c1d.js", "console.log('built')");
}

fn get(target: &str) -> AssetRequest {
    let peer: SocketAddr = "10.0.0.7:51234".parse().unwrap();
    AssetRequest::new(Method::GET, target, peer)
}

#[tokio::test]
async fn development_project_resolves_and_serves() {
    let temp = tempdir().expect("tempdir");
    react_project(temp.path());
    let store: DynStore = Arc::new(DirStore::new(temp.path()).expect("store"));

    let mut config = ViteConfig::default();
    config.resolve(store.as_ref()).await.expect("resolve");
    assert_eq!(config.platform, "react");
    assert_eq!(config.entry_point, "src/main.tsx");
    assert_eq!(config.vite_version, "4");
    assert_eq!(config.url_prefix, "/src/");
    assert_eq!(config.dev_server_base_url(), "http://localhost:5173");

    let handler = AssetServer::new(Arc::new(config), store)
        .file_server()
        .expect("handler");

    let response = handler.serve(get("/src/main.tsx")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), b"createRoot(el).render(<App />)");

    let response = handler.serve(get("/preamble.js")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/javascript"
    );
    assert!(String::from_utf8_lossy(response.body()).contains("@react-refresh"));

    let response = handler.serve(get("/.env.local")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn production_project_serves_build_output_only() {
    let temp = tempdir().expect("tempdir");
    react_project(temp.path());
    let store: DynStore = Arc::new(DirStore::new(temp.path()).expect("store"));

    let mut config = ViteConfig::default();
    config.environment = Environment::Production;
    config.resolve(store.as_ref()).await.expect("resolve");
    assert_eq!(config.assets_path, "dist");
    assert_eq!(config.url_prefix, "/assets/");
    assert!(config.profile().is_none());

    let handler = AssetServer::new(Arc::new(config), store)
        .file_server()
        .expect("handler");

    let response = handler.serve(get("/assets/index-9c1d.js")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), b"console.log('built')");

    let response = handler.serve(get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.body().starts_with(b"<script"));

    let response = handler.serve(get("/src/main.tsx")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn directories_without_index_are_not_listed() {
    let temp = tempdir().expect("tempdir");
    react_project(temp.path());
    write(temp.path(), "src/components/Button.tsx", "export {}");
    let store: DynStore = Arc::new(DirStore::new(temp.path()).expect("store"));

    let mut config = ViteConfig::default();
    config.resolve(store.as_ref()).await.expect("resolve");
    let handler = AssetServer::new(Arc::new(config), store)
        .file_server()
        .expect("handler");

    let response = handler.serve(get("/src/components/")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = handler.serve(get("/src/components/Button.tsx")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn shared_config_retries_after_failure() {
    let temp = tempdir().expect("tempdir");
    let store: DynStore = Arc::new(DirStore::new(temp.path()).expect("store"));
    let shared = SharedConfig::new(ViteConfig::default());

    let err = shared.get_or_resolve(store.as_ref()).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert!(shared.get().is_none());

    write(
        temp.path(),
        "package.json",
        r#"{"dependencies":{"react":"17.0.2","vue":"3.3.4"}}"#,
    );
    let err = shared.get_or_resolve(store.as_ref()).await.unwrap_err();
    assert!(matches!(err, AssetError::NotViteProject));

    write(
        temp.path(),
        "package.json",
        r#"{"dependencies":{"vue":"3.3.4"},"devDependencies":{"vite":"2.9.15"}}"#,
    );
    let resolved = shared.get_or_resolve(store.as_ref()).await.expect("resolve");
    assert_eq!(resolved.platform, "vue");
    assert_eq!(resolved.dev_server_port, "3000");
    assert!(Arc::ptr_eq(&resolved, &shared.get().expect("cached")));
}
