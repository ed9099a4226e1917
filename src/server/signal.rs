//! # Señales del Proceso
//! src/server/signal.rs
//!
//! El servidor es bloqueante, así que la espera de Ctrl+C corre en un thread
//! propio con un runtime de tokio de un solo thread. Cuando llega la señal se
//! dispara el [`ShutdownHandle`] y [`Server::run`](super::Server::run) drena
//! el pool antes de retornar.

use super::tcp::ShutdownHandle;
use std::future::Future;
use std::io;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// Espera Ctrl+C y detiene el servidor
pub fn spawn_ctrl_c_listener(handle: ShutdownHandle) -> io::Result<JoinHandle<()>> {
    spawn_signal_listener(handle, tokio::signal::ctrl_c)
}

/// Espera a que `signal` se complete y llama a [`ShutdownHandle::shutdown`]
///
/// Si la señal no se puede escuchar, se loguea y el servidor sigue corriendo.
pub fn spawn_signal_listener<F, Fut>(handle: ShutdownHandle, signal: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = io::Result<()>>,
{
    thread::Builder::new()
        .name("signal".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to start signal runtime: {}", e);
                    return;
                }
            };

            match runtime.block_on(signal()) {
                Ok(()) => {
                    info!("Ctrl+C received, stopping server");
                    handle.shutdown();
                }
                Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::Server;
    use crate::testutil::TempDir;
    use std::future::ready;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    fn test_config(root: &TempDir) -> Config {
        Config {
            port: 0,
            workers: 2,
            document_root: root.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_signal_stops_server() {
        let root = TempDir::new("signal-stop");
        let server = Server::bind(&test_config(&root)).unwrap();
        let addr = server.local_addr();

        let listener = spawn_signal_listener(server.shutdown_handle(), || ready(Ok(()))).unwrap();
        server.run().unwrap();
        listener.join().unwrap();

        assert!(TcpStream::connect(addr).is_err());
    }

    #[test]
    fn test_signal_error_keeps_server_running() {
        let root = TempDir::new("signal-error");
        root.write("index.html", b"hi");
        let server = Server::bind(&test_config(&root)).unwrap();
        let addr = server.local_addr();
        let handle = server.shutdown_handle();

        let listener = spawn_signal_listener(handle.clone(), || {
            ready(Err(io::Error::new(io::ErrorKind::Unsupported, "no signals")))
        })
        .unwrap();
        listener.join().unwrap();

        let running = thread::spawn(move || server.run());

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        assert!(buf.starts_with(b"HTTP/1.0 200 OK\r\n"));

        handle.shutdown();
        running.join().unwrap().unwrap();
    }
}
