use std::path::{Path, PathBuf};

use axum::body::HttpBody;
use axum::Router;
use tower_http::services::ServeDir;

use super::Assets;
use crate::extract::RequestOrigin;
use crate::App;

/// Mount path for locally served static files.
pub const STATIC_PATH: &str = "/static";

/// Serves a directory from this process, for development.
#[derive(Debug, Clone)]
pub struct LocalAssets {
    dir: PathBuf,
}

impl LocalAssets {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        LocalAssets {
            dir: dir.as_ref().to_owned(),
        }
    }
}

impl Assets for LocalAssets {
    fn base_url(&self, origin: &RequestOrigin) -> String {
        format!("{}{STATIC_PATH}", origin.url())
    }

    fn mount<B>(&self, router: Router<App, B>) -> Router<App, B>
    where
        B: HttpBody + Send + 'static,
    {
        router.nest_service(STATIC_PATH, ServeDir::new(&self.dir))
    }
}
