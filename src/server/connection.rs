//! # Manejo de una Conexión
//! src/server/connection.rs
//!
//! Ciclo de vida de una conexión como máquina de estados:
//!
//! ```text
//! Accepted → Reading → Parsed → Resolved → Responding → Closed
//!               │         │         │           ▲
//!               └─────────┴─────────┴── error ──┘   (400 / 404 / 405)
//! ```
//!
//! Los errores de transporte (timeout, peer que cierra, fallo al escribir)
//! saltan directo a cerrar sin respuesta. Cada conexión se parsea una sola
//! vez: no hay reintentos ni keep-alive.

use crate::files::{PathResolver, ResolvedFile};
use crate::http::{read_request_head, ReadError, Request, Response, StatusCode};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use tracing::{debug, error, info, warn};

/// Errores que terminan una conexión sin respuesta
#[derive(Debug)]
pub enum ConnectionError {
    /// Timeout, reset, o peer que cerró antes de CRLF CRLF
    Read(ReadError),

    /// No se pudo escribir la respuesta
    Write(io::Error),

    /// Fallo inesperado al servir (ej: archivo ilegible tras resolverlo)
    Internal(io::Error),
}

impl ConnectionError {
    /// `true` para fallas de red, `false` para errores internos del servidor
    pub fn is_transport(&self) -> bool {
        !matches!(self, ConnectionError::Internal(_))
    }
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::Read(e) => write!(f, "{}", e),
            ConnectionError::Write(e) => write!(f, "Write error: {}", e),
            ConnectionError::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::Read(e) => Some(e),
            ConnectionError::Write(e) | ConnectionError::Internal(e) => Some(e),
        }
    }
}

enum State {
    Accepted,
    Reading,
    Parsed(Request),
    Resolved(Request, ResolvedFile),
    Responding(Response),
    Closed(StatusCode),
}

/// Procesa conexiones de principio a fin
///
/// Es de solo lectura después de construido; los workers lo comparten
/// detrás de un `Arc`.
#[derive(Debug, Clone)]
pub struct ConnectionHandler {
    resolver: PathResolver,
    max_header_bytes: usize,
}

impl ConnectionHandler {
    pub fn new(resolver: PathResolver, max_header_bytes: usize) -> Self {
        Self {
            resolver,
            max_header_bytes,
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Atiende una conexión TCP y la cierra en ambas direcciones
    ///
    /// Nunca propaga errores: todo se loguea acá para que el worker quede
    /// libre para la próxima conexión.
    pub fn handle(&self, mut stream: TcpStream, peer: SocketAddr) {
        match self.serve(&mut stream) {
            Ok(status) => debug!(%peer, status = status.as_u16(), "Connection finished"),
            Err(e) if e.is_transport() => warn!(%peer, "Connection aborted: {}", e),
            Err(e) => error!(%peer, "{}", e),
        }

        // El peer pudo haber cerrado ya; no es un error nuestro
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            debug!(%peer, "Shutdown after response: {}", e);
        }
    }

    /// Corre la máquina de estados sobre cualquier transporte
    ///
    /// Retorna el status enviado al cliente, o el error que abortó la
    /// conexión antes de responder.
    pub fn serve<S: Read + Write>(&self, stream: &mut S) -> Result<StatusCode, ConnectionError> {
        let mut state = State::Accepted;

        loop {
            state = match state {
                State::Accepted => State::Reading,

                State::Reading => match read_request_head(stream, self.max_header_bytes) {
                    Ok(head) => match Request::parse(&head) {
                        Ok(request) => State::Parsed(request),
                        Err(e) => {
                            info!("{} ({})", e.status(), e);
                            State::Responding(Response::error(e.status()))
                        }
                    },
                    Err(e) if e.is_transport() => return Err(ConnectionError::Read(e)),
                    Err(e) => {
                        info!("{} ({})", StatusCode::BadRequest, e);
                        State::Responding(Response::error(StatusCode::BadRequest))
                    }
                },

                State::Parsed(request) => match self.resolver.resolve(request.decoded_path()) {
                    Ok(file) => State::Resolved(request, file),
                    Err(e) => {
                        info!(
                            "{} {} {} -> {} ({})",
                            request.method().as_str(),
                            request.raw_target(),
                            request.version(),
                            e.status(),
                            e
                        );
                        State::Responding(Response::error(e.status()))
                    }
                },

                State::Resolved(request, file) => {
                    info!(
                        "{} {} {} -> {}",
                        request.method().as_str(),
                        request.raw_target(),
                        request.version(),
                        StatusCode::Ok
                    );
                    let response = Response::build(StatusCode::Ok, Some(request.method()), Some(&file))
                        .map_err(ConnectionError::Internal)?;
                    State::Responding(response)
                }

                State::Responding(response) => {
                    stream
                        .write_all(&response.to_bytes())
                        .and_then(|()| stream.flush())
                        .map_err(ConnectionError::Write)?;
                    State::Closed(response.status())
                }

                State::Closed(status) => return Ok(status),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::MimeTable;
    use crate::testutil::TempDir;
    use std::io::{Cursor, ErrorKind};
    use std::net::TcpListener;
    use std::thread;

    const MAX_HEADER_BYTES: usize = 8192;

    /// Transporte en memoria: lee de `input`, escribe en `output`
    struct MockStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl MockStream {
        fn new(request: &[u8]) -> Self {
            Self {
                input: Cursor::new(request.to_vec()),
                output: Vec::new(),
            }
        }

        fn output_text(&self) -> String {
            String::from_utf8_lossy(&self.output).into_owned()
        }

        fn body(&self) -> &[u8] {
            let pos = self
                .output
                .windows(4)
                .position(|w| w == b"\r\n\r\n")
                .expect("response has a header terminator");
            &self.output[pos + 4..]
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Transporte cuyo lado de escritura está roto
    struct BrokenPipe {
        input: Cursor<Vec<u8>>,
    }

    impl Read for BrokenPipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "peer reset"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn fixture() -> (TempDir, ConnectionHandler) {
        let root = TempDir::new("connection");
        root.write("index.html", b"hi");
        root.write("docs/readme.txt", b"read me");
        let resolver = PathResolver::new(root.path(), "index.html", MimeTable::builtin()).unwrap();
        (root, ConnectionHandler::new(resolver, MAX_HEADER_BYTES))
    }

    fn serve(handler: &ConnectionHandler, request: &[u8]) -> (Result<StatusCode, ConnectionError>, MockStream) {
        let mut stream = MockStream::new(request);
        let result = handler.serve(&mut stream);
        (result, stream)
    }

    #[test]
    fn test_get_index() {
        let (_root, handler) = fixture();
        let (result, stream) = serve(&handler, b"GET /index.html HTTP/1.0\r\n\r\n");

        assert_eq!(result.unwrap(), StatusCode::Ok);
        let text = stream.output_text();
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert_eq!(stream.body(), b"hi");
    }

    #[test]
    fn test_traversal_is_bad_request() {
        let (_root, handler) = fixture();
        let (result, stream) = serve(&handler, b"GET /../secret HTTP/1.0\r\n\r\n");

        assert_eq!(result.unwrap(), StatusCode::BadRequest);
        assert!(stream.output_text().starts_with("HTTP/1.0 400 Bad Request\r\n"));
        assert!(stream.body().is_empty());
    }

    #[test]
    fn test_post_is_method_not_allowed() {
        let (_root, handler) = fixture();
        let (result, stream) = serve(&handler, b"POST /index.html HTTP/1.0\r\n\r\n");

        assert_eq!(result.unwrap(), StatusCode::MethodNotAllowed);
        assert!(stream.output_text().starts_with("HTTP/1.0 405 Method Not Allowed\r\n"));
    }

    #[test]
    fn test_method_checked_regardless_of_target() {
        let (_root, handler) = fixture();
        let (result, _) = serve(&handler, b"DELETE /../../etc/passwd HTTP/1.0\r\n\r\n");
        assert_eq!(result.unwrap(), StatusCode::MethodNotAllowed);
    }

    #[test]
    fn test_missing_file() {
        let (_root, handler) = fixture();
        let (result, stream) = serve(&handler, b"GET /missing.txt HTTP/1.0\r\n\r\n");

        assert_eq!(result.unwrap(), StatusCode::NotFound);
        assert!(stream.output_text().starts_with("HTTP/1.0 404 Not Found\r\n"));
    }

    #[test]
    fn test_head_has_no_body() {
        let (_root, handler) = fixture();
        let (result, stream) = serve(&handler, b"HEAD /index.html HTTP/1.0\r\n\r\n");

        assert_eq!(result.unwrap(), StatusCode::Ok);
        assert!(stream.output_text().contains("Content-Length: 2\r\n"));
        assert!(stream.body().is_empty());
    }

    #[test]
    fn test_root_serves_index() {
        let (_root, handler) = fixture();
        let (result, stream) = serve(&handler, b"GET / HTTP/1.0\r\n\r\n");

        assert_eq!(result.unwrap(), StatusCode::Ok);
        assert_eq!(stream.body(), b"hi");
    }

    #[test]
    fn test_malformed_request_line() {
        let (_root, handler) = fixture();
        let (result, stream) = serve(&handler, b"GET /index.html\r\n\r\n");

        assert_eq!(result.unwrap(), StatusCode::BadRequest);
        assert!(stream.output_text().contains("Content-Length: 0\r\n"));
    }

    #[test]
    fn test_query_and_encoding() {
        let (_root, handler) = fixture();
        let (result, stream) = serve(&handler, b"GET /docs/read%6De.txt?v=3 HTTP/1.0\r\n\r\n");

        assert_eq!(result.unwrap(), StatusCode::Ok);
        assert!(stream.output_text().contains("Content-Type: text/plain\r\n"));
        assert_eq!(stream.body(), b"read me");
    }

    #[test]
    fn test_oversized_head_is_bad_request() {
        let (root, _) = fixture();
        let resolver = PathResolver::new(root.path(), "index.html", MimeTable::builtin()).unwrap();
        let handler = ConnectionHandler::new(resolver, 32);

        let (result, stream) = serve(&handler, b"GET /index.html HTTP/1.0\r\nX-Long-Header: aaaaaaaaaaaaaaaa\r\n\r\n");

        assert_eq!(result.unwrap(), StatusCode::BadRequest);
        assert!(stream.output_text().starts_with("HTTP/1.0 400 Bad Request\r\n"));
    }

    #[test]
    fn test_peer_closed_early_sends_nothing() {
        let (_root, handler) = fixture();
        let (result, stream) = serve(&handler, b"GET /index.html HTTP/1.0\r\n");

        let err = result.unwrap_err();
        assert!(matches!(err, ConnectionError::Read(ReadError::Closed)));
        assert!(err.is_transport());
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_write_failure_is_transport_error() {
        let (_root, handler) = fixture();
        let mut stream = BrokenPipe {
            input: Cursor::new(b"GET / HTTP/1.0\r\n\r\n".to_vec()),
        };

        let err = handler.serve(&mut stream).unwrap_err();
        assert!(matches!(err, ConnectionError::Write(ref e) if e.kind() == ErrorKind::BrokenPipe));
        assert!(err.is_transport());
    }

    #[test]
    fn test_internal_error_is_not_transport() {
        let err = ConnectionError::Internal(io::Error::new(ErrorKind::PermissionDenied, "denied"));
        assert!(!err.is_transport());
        assert!(err.to_string().contains("Internal error"));
    }

    #[test]
    fn test_handle_closes_tcp_connection() {
        let (_root, handler) = fixture();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, peer) = listener.accept().unwrap();
            handler.handle(stream, peer);
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();

        // read_to_end solo termina si el servidor cerró su lado
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\nhi"));

        server.join().unwrap();
    }

    #[test]
    fn test_handle_survives_silent_peer() {
        let (_root, handler) = fixture();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, peer) = listener.accept().unwrap();
            handler.handle(stream, peer);
        });

        // Conecta y cierra sin mandar nada
        drop(TcpStream::connect(addr).unwrap());

        server.join().unwrap();
    }
}
