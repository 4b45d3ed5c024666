//! IPC transport via Unix domain sockets.

use compio::net::{UnixListener, UnixStream};
use std::io;
use std::path::Path;
use tracing::debug;

/// Connect to a Unix domain socket.
///
/// ```no_run
/// use tessera_core::ipc;
///
/// #[compio::main]
/// async fn main() -> std::io::Result<()> {
///     let _stream = ipc::connect("/tmp/tessera.sock").await?;
///     Ok(())
/// }
/// ```
pub async fn connect<P: AsRef<Path>>(path: P) -> io::Result<UnixStream> {
    UnixStream::connect(path).await
}

/// Bind a Unix domain socket listener, replacing a stale socket file.
pub async fn bind<P: AsRef<Path>>(path: P) -> io::Result<UnixListener> {
    let path = path.as_ref();
    remove_stale(path)?;
    UnixListener::bind(path).await
}

/// Accept one connection.
pub async fn accept(listener: &UnixListener) -> io::Result<UnixStream> {
    let (stream, _addr) = listener.accept().await?;
    Ok(stream)
}

/// Remove a leftover socket file. A missing file is not an error.
pub fn remove_stale(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "[IPC] removed stale socket file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[compio::test]
    async fn test_ipc_connect_bind() {
        let path = std::env::temp_dir().join(format!("tessera_core_ipc_{}.sock", std::process::id()));

        // A leftover file from an earlier run must not prevent binding.
        std::fs::write(&path, b"stale").unwrap();
        let listener = bind(&path).await.unwrap();

        let accept_handle = compio::runtime::spawn(async move { accept(&listener).await });
        let client = connect(&path).await.unwrap();
        let server = accept_handle.await.unwrap();

        assert!(client.peer_addr().is_ok());
        assert!(server.local_addr().is_ok());

        drop(client);
        drop(server);
        remove_stale(&path).unwrap();
        remove_stale(&path).unwrap();
    }
}
