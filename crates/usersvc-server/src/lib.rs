//! usersvc server library entry.
//!
//! Wires config, state, policy and handlers into an axum service. Consumed by
//! the binary (`main.rs`) and by integration tests, which can serve the same
//! router on an ephemeral port.

pub mod api;
pub mod app_state;
pub mod config;
pub mod middleware;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

pub use app_state::AppState;

/// Serve the router on `listener` until `shutdown` resolves, then drain.
///
/// Peer addresses are exposed to middleware through `ConnectInfo`.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router::build_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
