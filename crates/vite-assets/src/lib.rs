pub mod access_log;
pub mod config;
pub mod embedded;
pub mod error;
pub mod file_server;
pub mod guard;
pub mod handler;
pub mod manifest;
pub mod request;
pub mod response;
pub mod store;
pub mod support;
pub mod utils;

pub use access_log::AccessLog;
pub use config::{load_config, Environment, SharedConfig, ViteConfig};
pub use embedded::EmbeddedStore;
pub use error::{AssetError, AssetResult};
pub use file_server::FileServer;
pub use guard::GuardedStore;
pub use handler::{AssetHandler, AssetServer, ViteHandler};
pub use manifest::{analyze, Framework, FrameworkProfile, PackageJson};
pub use request::AssetRequest;
pub use response::AssetResponse;
pub use store::{sub_store, DirStore, DynStore, FileStore, MemoryStore};
pub use support::{BundledSupport, SupportFiles};
