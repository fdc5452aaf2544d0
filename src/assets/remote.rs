use axum::body::HttpBody;
use axum::Router;

use super::Assets;
use crate::extract::RequestOrigin;
use crate::App;

/// Points views at files hosted elsewhere, e.g. an object store bucket.
#[derive(Debug, Clone)]
pub struct RemoteAssets {
    base_url: String,
}

impl RemoteAssets {
    pub fn new(base_url: &str) -> Self {
        RemoteAssets {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl Assets for RemoteAssets {
    fn base_url(&self, _origin: &RequestOrigin) -> String {
        self.base_url.clone()
    }

    fn mount<B>(&self, router: Router<App, B>) -> Router<App, B>
    where
        B: HttpBody + Send + 'static,
    {
        router
    }
}
