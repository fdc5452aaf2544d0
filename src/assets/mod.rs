use axum::body::HttpBody;
use axum::Router;

use crate::config::{self, AssetMode};
use crate::extract::RequestOrigin;
use crate::App;

pub mod local;
pub mod remote;

pub use local::LocalAssets;
pub use remote::RemoteAssets;

/// How stylesheets and other static files reach the browser.
pub trait Assets {
    /// Base URL views prefix static file paths with. Never ends in a slash.
    fn base_url(&self, origin: &RequestOrigin) -> String;

    /// Add any routes the strategy needs to serve files itself.
    fn mount<B>(&self, router: Router<App, B>) -> Router<App, B>
    where
        B: HttpBody + Send + 'static;
}

#[derive(Debug, Clone)]
pub enum AnyAssets {
    Local(LocalAssets),
    Remote(RemoteAssets),
}

impl AnyAssets {
    pub fn from_config(config: &config::Assets) -> Self {
        match config.mode {
            AssetMode::Dev => LocalAssets::new(&config.dir).into(),
            AssetMode::Prod => RemoteAssets::new(&config.base_url).into(),
        }
    }
}

impl Assets for AnyAssets {
    fn base_url(&self, origin: &RequestOrigin) -> String {
        match self {
            AnyAssets::Local(local) => local.base_url(origin),
            AnyAssets::Remote(remote) => remote.base_url(origin),
        }
    }

    fn mount<B>(&self, router: Router<App, B>) -> Router<App, B>
    where
        B: HttpBody + Send + 'static,
    {
        match self {
            AnyAssets::Local(local) => local.mount(router),
            AnyAssets::Remote(remote) => remote.mount(router),
        }
    }
}

impl From<LocalAssets> for AnyAssets {
    fn from(value: LocalAssets) -> Self {
        AnyAssets::Local(value)
    }
}

impl From<RemoteAssets> for AnyAssets {
    fn from(value: RemoteAssets) -> Self {
        AnyAssets::Remote(value)
    }
}
