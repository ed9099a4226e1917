//! # Servidor TCP con Pool Acotado
//! src/server/tcp.rs
//!
//! Acceptor del servidor: un único loop secuencial que acepta conexiones,
//! les aplica el timeout de socket y las entrega al [`WorkerPool`]. El pool
//! se crea una sola vez en [`Server::bind`] y se drena al salir de
//! [`Server::run`].

use super::connection::ConnectionHandler;
use super::pool::{PoolError, WorkerPool};
use crate::config::Config;
use crate::files::{MimeTable, PathResolver};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Errores al levantar el servidor
#[derive(Debug)]
pub enum ServerError {
    /// No se pudo abrir el socket de escucha
    Bind(io::Error),

    /// El document root no existe o no es un directorio
    DocumentRoot(io::Error),

    /// No se pudo crear el pool de workers
    Pool(PoolError),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Bind(e) => write!(f, "Failed to bind listener: {}", e),
            ServerError::DocumentRoot(e) => write!(f, "Invalid document root: {}", e),
            ServerError::Pool(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Bind(e) | ServerError::DocumentRoot(e) => Some(e),
            ServerError::Pool(e) => Some(e),
        }
    }
}

impl From<PoolError> for ServerError {
    fn from(e: PoolError) -> Self {
        ServerError::Pool(e)
    }
}

/// Detiene el loop de [`Server::run`] desde otro thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    stop: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Marca el servidor para detenerse y despierta el `accept` bloqueado
    pub fn shutdown(&self) {
        if self.stop.swap(true, Ordering::SeqCst) {
            return;
        }

        // accept() no tiene timeout: una conexión local lo destraba
        if let Err(e) = TcpStream::connect_timeout(&self.wake_addr, Duration::from_secs(1)) {
            warn!("Failed to wake acceptor: {}", e);
        }
    }
}

/// Servidor HTTP/1.0 de archivos estáticos
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    handler: Arc<ConnectionHandler>,
    pool: WorkerPool,
    timeout: Duration,
    stop: Arc<AtomicBool>,
}

impl Server {
    /// Abre el socket, valida el document root y arranca el pool
    ///
    /// Usa la tabla MIME incluida; ver [`Server::bind_with_mime`].
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        Self::bind_with_mime(config, MimeTable::builtin())
    }

    /// Igual que [`Server::bind`] pero con una tabla MIME propia
    pub fn bind_with_mime(config: &Config, mime: MimeTable) -> Result<Self, ServerError> {
        let resolver = PathResolver::new(&config.document_root, config.index_file.clone(), mime)
            .map_err(ServerError::DocumentRoot)?;

        let listener = TcpListener::bind(config.address()).map_err(ServerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ServerError::Bind)?;

        let pool = WorkerPool::new(config.workers)?;
        let handler = ConnectionHandler::new(resolver, config.max_header_bytes);

        Ok(Self {
            listener,
            local_addr,
            handler: Arc::new(handler),
            pool,
            timeout: config.timeout(),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Dirección real en la que escucha (útil con puerto 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        let mut wake_addr = self.local_addr;
        if wake_addr.ip().is_unspecified() {
            wake_addr.set_ip(match wake_addr.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            });
        }

        ShutdownHandle {
            stop: Arc::clone(&self.stop),
            wake_addr,
        }
    }

    /// Acepta conexiones hasta que se llame a [`ShutdownHandle::shutdown`]
    ///
    /// Un error al aceptar una conexión se loguea y el loop sigue. La
    /// conexión que despierta el `accept` tras el shutdown se atiende igual
    /// (puede ser un cliente encolado antes que la del propio handle). Al
    /// salir cierra el socket de escucha y espera a que terminen las
    /// conexiones en curso.
    pub fn run(self) -> io::Result<()> {
        let Server {
            listener,
            local_addr,
            handler,
            pool,
            timeout,
            stop,
        } = self;

        info!("Listening on {} with {} workers", local_addr, pool.size());
        info!("Serving files from {}", handler.resolver().root().display());

        for stream in listener.incoming() {
            let stopping = stop.load(Ordering::SeqCst);

            match stream {
                Ok(stream) => Self::dispatch(stream, &handler, &pool, timeout),
                Err(e) => warn!("Failed to accept connection: {}", e),
            }

            if stopping {
                break;
            }
        }

        drop(listener);
        info!("Listener closed, waiting for in-flight connections");
        pool.shutdown();

        Ok(())
    }

    fn dispatch(stream: TcpStream, handler: &Arc<ConnectionHandler>, pool: &WorkerPool, timeout: Duration) {
        let peer = match stream.peer_addr() {
            Ok(peer) => peer,
            Err(e) => {
                warn!("Dropping connection without peer address: {}", e);
                return;
            }
        };

        if let Err(e) = stream
            .set_read_timeout(Some(timeout))
            .and_then(|()| stream.set_write_timeout(Some(timeout)))
        {
            warn!(%peer, "Failed to set socket timeout: {}", e);
            return;
        }

        info!(%peer, "Connection accepted");

        let handler = Arc::clone(handler);
        if let Err(e) = pool.submit(move || handler.handle(stream, peer)) {
            error!(%peer, "Failed to submit connection: {}", e);
        }
    }
}
