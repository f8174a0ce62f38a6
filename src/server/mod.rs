//! HTTP front end: upload a PDF, download a CSV.
//!
//! | Route | Result |
//! |---|---|
//! | `GET /` | liveness message |
//! | `POST /convert_pdf_to_csv/` | `text/csv` attachment, or a JSON error |

mod error;
mod handlers;
mod routes;

pub use error::ApiError;
pub use routes::create_router;

use crate::convert::Converter;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Default request body limit: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
}

impl AppState {
    pub fn new(converter: Converter) -> Self {
        Self {
            converter: Arc::new(converter),
        }
    }
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    max_upload_bytes: usize,
) -> std::io::Result<()> {
    let app = create_router(state, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
