use std::env;

use log::info;

mod error;
mod handlers;
mod models;
mod publish;
mod routes;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Evite Service");

    let router = routes::create_router().await;

    if env::var("AWS_LAMBDA_RUNTIME_API").is_ok() {
        info!("Running as a Lambda function");
        return lambda_http::run(router).await;
    }

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}
