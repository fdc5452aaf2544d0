use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::assets::{AnyAssets, Assets};
use crate::controllers::paste::{self, SweepPolicy};
use crate::extract::{ClientAddr, RequestOrigin};
use crate::sweeper::ExpirySweeper;
use crate::types::api::{SavePaste, SavedPaste};
use crate::{views, App};

pub async fn run(app: App) -> anyhow::Result<()> {
    let server = &app.config.server;
    let addr = tokio::net::lookup_host((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("failed to resolve {}:{}", server.host, server.port))?
        .next()
        .with_context(|| format!("no address for {}", server.host))?;

    let sweeper = app.config.expiry.enabled.then(|| {
        ExpirySweeper::start(
            app.clone(),
            SweepPolicy::from(&app.config.expiry),
            Duration::from_secs(app.config.expiry.interval_secs),
        )
    });

    let router = router(app);

    info!("listening on http://{addr}");
    axum::Server::bind(&addr)
        .serve(router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drop(sweeper);
    Ok(())
}

pub fn router(app: App) -> Router {
    let router = Router::new()
        .route("/", get(index))
        .route("/api/save", post(save_paste))
        .route("/:key", get(show_paste));

    app.assets
        .mount(router)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            app.config.limits.max_upload_size,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn index(State(assets): State<AnyAssets>, origin: RequestOrigin) -> Html<String> {
    Html(views::index(&assets.base_url(&origin)))
}

async fn save_paste(
    State(app): State<App>,
    origin: RequestOrigin,
    ClientAddr(ip_address): ClientAddr,
    payload: Result<Json<SavePaste>, JsonRejection>,
) -> crate::ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let paste = paste::create(
        &app,
        &payload.data,
        payload.heading.as_deref(),
        &ip_address,
    )
    .await?;

    let path = format!("/{}", paste.key);
    let base_url = match &app.config.base_url {
        Some(base_url) => base_url.trim_end_matches('/').to_owned(),
        None => origin.url(),
    };
    let url = format!("{base_url}{path}");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, path)],
        Json(SavedPaste { url }),
    ))
}

async fn show_paste(
    State(app): State<App>,
    origin: RequestOrigin,
    Path(key): Path<String>,
) -> crate::ApiResult<Html<String>> {
    let paste = paste::open(&app, &key).await?;
    Ok(Html(views::paste(&paste, &app.assets.base_url(&origin))))
}
