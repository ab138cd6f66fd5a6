//! A throwaway backend for trying the balancer by hand.
//!
//! ```text
//! cargo run --example mock_backend -- 3001 one
//! cargo run --example mock_backend -- 3002 two
//! ```

use axum::{routing::get, Router};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port: u16 = args.next().as_deref().unwrap_or("3001").parse()?;
    let name = args.next().unwrap_or_else(|| format!("backend-{port}"));

    let greeting = format!("Hello from {name}");
    let app = Router::new()
        .route("/", get(move || {
            let greeting = greeting.clone();
            async move { greeting }
        }))
        .route("/status", get(|| async { "ok" }));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("{name} listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
