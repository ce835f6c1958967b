//! Ephemeral server implementation.

use std::net::Ipv4Addr;
use std::path::Path;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind ephemeral port: {0}")]
    Bind(std::io::Error),

    #[error("Server task failed: {0}")]
    Serve(String),
}

/// A running ephemeral server, owned by one pipeline run.
///
/// Stop it exactly once at the end of the run, on the error path too; the
/// handle is consumed so a stopped server cannot be reused.
pub struct ServerHandle {
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// The OS-assigned port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Signal shutdown and wait for the server task to finish.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        match self.task.await {
            Ok(Ok(())) => {
                tracing::debug!("Stopped server on port {}", self.port);
                Ok(())
            }
            Ok(Err(e)) => Err(ServerError::Serve(e.to_string())),
            Err(e) => Err(ServerError::Serve(e.to_string())),
        }
    }
}

/// Serve static files rooted at `root` on an OS-chosen free port.
///
/// The returned handle must outlive every request made against the server;
/// the listener is bound before this function returns, so navigation can be
/// attempted as soon as the caller has the handle.
pub async fn start(root: &Path) -> Result<ServerHandle, ServerError> {
    let app = Router::new().fallback_service(ServeDir::new(root));

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .map_err(ServerError::Bind)?;
    let port = listener.local_addr().map_err(ServerError::Bind)?.port();

    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
    });

    tracing::debug!("Serving {} at http://localhost:{}", root.display(), port);

    Ok(ServerHandle {
        port,
        shutdown: Some(tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn get(port: u16, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost:{port}\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).to_string()
    }

    #[tokio::test]
    async fn assigns_an_ephemeral_port() {
        let temp = tempfile::tempdir().unwrap();

        let server = start(temp.path()).await.unwrap();
        assert_ne!(server.port(), 0);
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn serves_files_from_the_root_directory() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("index.html"), "<p>shell</p>").unwrap();

        let server = start(temp.path()).await.unwrap();
        let response = get(server.port(), "/").await;
        server.stop().await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("<p>shell</p>"));
    }

    #[tokio::test]
    async fn two_servers_get_distinct_ports() {
        let temp = tempfile::tempdir().unwrap();

        let a = start(temp.path()).await.unwrap();
        let b = start(temp.path()).await.unwrap();
        assert_ne!(a.port(), b.port());

        a.stop().await.unwrap();
        b.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_completes_and_releases_the_port() {
        let temp = tempfile::tempdir().unwrap();

        let server = start(temp.path()).await.unwrap();
        let port = server.port();
        server.stop().await.unwrap();

        // The port is free again once stop() returns.
        let rebound = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await;
        assert!(rebound.is_ok());
    }

    #[tokio::test]
    async fn missing_root_still_binds() {
        // ServeDir answers 404 for everything; binding does not touch disk.
        let server = start(&PathBuf::from("/nonexistent/snapshell-test")).await.unwrap();
        let response = get(server.port(), "/index.html").await;
        server.stop().await.unwrap();

        assert!(response.starts_with("HTTP/1.1 404"));
    }
}
