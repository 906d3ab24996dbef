mod env;
mod routes;

use std::net::SocketAddr;

use axum::{Router, body::Body, extract::MatchedPath, http::Request};
use tower::ServiceBuilder;
use tower_http::{
    cors::{self, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::prelude::*;

use env::env;

fn app() -> Router {
    let state = routes::AppState { env: env() };

    Router::new()
        .route("/health", axum::routing::get(health))
        .route(
            "/stt/speechmatics",
            axum::routing::get(routes::stt::speechmatics),
        )
        .route(
            "/stt/assemblyai",
            axum::routing::get(routes::stt::assemblyai),
        )
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http().make_span_with(
                |request: &Request<Body>| {
                    let path = request.uri().path();
                    if path == "/health" {
                        return tracing::Span::none();
                    }

                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(path);

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        http.route = %matched_path,
                    )
                },
            )),
        )
}

fn main() -> std::io::Result<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let env = env();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let addr = SocketAddr::from(([0, 0, 0, 0], env.port));
            tracing::info!(addr = %addr, "server_listening");

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app())
                .with_graceful_shutdown(shutdown_signal())
                .await
        })?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("shutdown_signal_received");
}

async fn health() -> &'static str {
    "ok"
}
