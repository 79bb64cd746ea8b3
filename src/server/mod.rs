//! TCP transport boundary.
//!
//! One connection at a time: accept, read the request, dispatch, write the
//! response, close. Keeping the loop sequential means a registry mutation
//! and its paired persistence save are never interleaved with another
//! request.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::api::Dispatcher;

/// Upper bound on a single request read. One request per connection, no
/// keep-alive, no pipelining.
const REQUEST_BUFFER_SIZE: usize = 4096;

/// Bind and serve until externally terminated.
pub async fn run(addr: &str, mut dispatcher: Dispatcher) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {addr}");
    log_routes();

    loop {
        let (mut socket, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "accept failed");
                continue;
            }
        };

        let mut buffer = vec![0u8; REQUEST_BUFFER_SIZE];
        let read = match socket.read(&mut buffer).await {
            Ok(0) => continue,
            Ok(n) => n,
            Err(e) => {
                warn!(peer = %peer, error = %e, "failed to read request");
                continue;
            }
        };

        let raw = String::from_utf8_lossy(&buffer[..read]);
        let response = dispatcher.handle(&raw);

        if let Err(e) = socket.write_all(response.as_bytes()).await {
            warn!(peer = %peer, error = %e, "failed to write response");
        }
        let _ = socket.shutdown().await;
    }
}

fn log_routes() {
    info!("available endpoints:");
    info!("  GET    /api/players       - all players");
    info!("  GET    /api/players/top   - top performers");
    info!("  GET    /api/players/form  - players in form");
    info!("  GET    /api/stats         - team statistics");
    info!("  POST   /api/players       - add a player");
    info!("  POST   /api/matches       - add match statistics");
    info!("  DELETE /api/players/{{id}}  - delete a player");
}
