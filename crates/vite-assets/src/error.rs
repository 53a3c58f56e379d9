use http::StatusCode;
use thiserror::Error;

pub type AssetResult<T> = Result<T, AssetError>;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("package.json does not list vite as a dev dependency")]
    NotViteProject,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AssetError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AssetError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            AssetError::NotViteProject | AssetError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AssetError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AssetError::Json(_) | AssetError::Yaml(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
