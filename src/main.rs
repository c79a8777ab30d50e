use axum::http::{self, HeaderValue, Method};
use dotenvy::dotenv;
use env_logger::Builder;
use log::LevelFilter;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use werewolf_gm::{app, utils::config::CONFIG};

fn init_logger() {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .filter_module("tower_http", LevelFilter::Debug)
        .filter_module("werewolf_gm", LevelFilter::Debug)
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .format_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenv() {
        eprintln!("Warning: could not load .env file: {}", e);
    }

    init_logger();

    let origin = CONFIG.allowed_origin.parse::<HeaderValue>()?;
    let cors = CorsLayer::new()
        .allow_origin([origin])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([http::header::CONTENT_TYPE]);

    let app = app::create_app().layer(cors).layer(
        TraceLayer::new_for_http().make_span_with(|request: &http::Request<_>| {
            tracing::info_span!(
                "HTTP request",
                method = %request.method(),
                uri = %request.uri(),
            )
        }),
    );

    let listener = tokio::net::TcpListener::bind(&CONFIG.bind_addr).await?;

    println!("game master listening on http://{}", CONFIG.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
