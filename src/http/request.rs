//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Lectura del bloque de headers desde la conexión y parsing de la
//! request line.
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! GET /docs/index.html?v=2 HTTP/1.0\r\n
//! Host: localhost:8080\r\n
//! User-Agent: curl/7.68.0\r\n
//! \r\n
//! ```
//!
//! Solo se interpreta la **Request Line** (`METHOD target VERSION`). El resto
//! de los headers se lee hasta la línea vacía pero se descarta.

use std::io::{ErrorKind, Read};

/// Secuencia que marca el fin del bloque de headers
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Tamaño de cada lectura del socket
const READ_CHUNK: usize = 1024;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un archivo
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,
}

impl Method {
    /// Parsea un método HTTP desde un string
    ///
    /// # Errores
    ///
    /// Retorna `UnsupportedMethod` para cualquier método distinto de GET/HEAD
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
        }
    }
}

/// Representa un request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP (GET o HEAD)
    method: Method,

    /// Target tal como llegó (ej: "/a%20b.txt?x=1")
    raw_target: String,

    /// Target decodificado y sin query (ej: "/a b.txt")
    decoded_path: String,

    /// Tercer token de la request line, no se valida
    version: String,
}

/// Errores de protocolo al parsear la request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// La request line no tiene exactamente 3 tokens, o no es UTF-8
    InvalidRequestLine,

    /// Método HTTP distinto de GET/HEAD
    UnsupportedMethod(String),

    /// El target no decodifica a UTF-8 válido
    InvalidTarget(String),
}

impl ParseError {
    /// Código de estado con el que se responde este error
    pub fn status(&self) -> super::StatusCode {
        match self {
            ParseError::UnsupportedMethod(_) => super::StatusCode::MethodNotAllowed,
            ParseError::InvalidRequestLine | ParseError::InvalidTarget(_) => {
                super::StatusCode::BadRequest
            }
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidRequestLine => write!(f, "Invalid request line format"),
            ParseError::UnsupportedMethod(m) => write!(f, "Unsupported HTTP method: {}", m),
            ParseError::InvalidTarget(t) => write!(f, "Invalid request target: {}", t),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errores al acumular el bloque de headers
#[derive(Debug)]
pub enum ReadError {
    /// El peer cerró antes de mandar CRLF CRLF
    Closed,

    /// Timeout o error de I/O del socket
    Io(std::io::Error),

    /// El bloque superó el límite de bytes sin terminar
    TooLarge { limit: usize },
}

impl ReadError {
    /// Solo `TooLarge` se responde al cliente (400); el resto cierra sin respuesta
    pub fn is_transport(&self) -> bool {
        !matches!(self, ReadError::TooLarge { .. })
    }
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Closed => write!(f, "Peer closed before a full header block"),
            ReadError::Io(e) => write!(f, "Read error: {}", e),
            ReadError::TooLarge { limit } => {
                write!(f, "Header block exceeds {} bytes", limit)
            }
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        ReadError::Io(e)
    }
}

/// Lee del stream hasta encontrar CRLF CRLF
///
/// Acumula lecturas de `READ_CHUNK` bytes. Retorna el bloque hasta el
/// terminador inclusive; los bytes que vengan después se descartan.
///
/// # Errores
///
/// * `ReadError::Closed` - el peer cerró antes del terminador
/// * `ReadError::Io` - timeout o error del socket
/// * `ReadError::TooLarge` - se acumularon más de `limit` bytes
pub fn read_request_head<R: Read>(reader: &mut R, limit: usize) -> Result<Vec<u8>, ReadError> {
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let bytes_read = match reader.read(&mut chunk) {
            Ok(0) => return Err(ReadError::Closed),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReadError::Io(e)),
        };

        // El terminador puede quedar partido entre dos lecturas
        let search_from = buffer.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        buffer.extend_from_slice(&chunk[..bytes_read]);

        if let Some(pos) = find_terminator(&buffer[search_from..]) {
            buffer.truncate(search_from + pos + HEADER_TERMINATOR.len());
            if buffer.len() > limit {
                return Err(ReadError::TooLarge { limit });
            }
            return Ok(buffer);
        }

        if buffer.len() > limit {
            return Err(ReadError::TooLarge { limit });
        }
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

impl Request {
    /// Parsea la request line de un bloque de headers
    ///
    /// El token count se valida antes que el método: `POST /` (2 tokens)
    /// es 400, no 405.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use static_httpd::http::Request;
    ///
    /// let raw = b"GET /a%20b.txt?v=1 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.raw_target(), "/a%20b.txt?v=1");
    /// assert_eq!(request.decoded_path(), "/a b.txt");
    /// ```
    pub fn parse(head: &[u8]) -> Result<Self, ParseError> {
        // Los headers no se interpretan: solo la primera línea tiene que ser UTF-8
        let line_end = head
            .windows(2)
            .position(|window| window == b"\r\n")
            .unwrap_or(head.len());
        let request_line =
            std::str::from_utf8(&head[..line_end]).map_err(|_| ParseError::InvalidRequestLine)?;

        let parts: Vec<&str> = request_line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD TARGET VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;
        let decoded_path = Self::decode_target(parts[1])?;

        Ok(Request {
            method,
            raw_target: parts[1].to_string(),
            decoded_path,
            version: parts[2].to_string(),
        })
    }

    /// Descarta todo desde el primer `?` (o `%3F`) y decodifica `%XX`
    ///
    /// Solo se decodifica el path: la query nunca puede invalidar el request.
    fn decode_target(target: &str) -> Result<String, ParseError> {
        let path = &target[..Self::query_start(target)];

        urlencoding::decode(path)
            .map(|decoded| decoded.into_owned())
            .map_err(|_| ParseError::InvalidTarget(target.to_string()))
    }

    /// Posición del primer `?` literal o codificado
    fn query_start(target: &str) -> usize {
        let bytes = target.as_bytes();

        (0..bytes.len())
            .find(|&i| match bytes[i] {
                b'?' => true,
                b'%' => bytes.get(i + 1..i + 3).is_some_and(|hex| hex.eq_ignore_ascii_case(b"3f")),
                _ => false,
            })
            .unwrap_or(bytes.len())
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Obtiene el target sin decodificar
    pub fn raw_target(&self) -> &str {
        &self.raw_target
    }

    /// Obtiene el path decodificado y sin query
    pub fn decoded_path(&self) -> &str {
        &self.decoded_path
    }

    /// Obtiene la versión HTTP tal como llegó
    pub fn version(&self) -> &str {
        &self.version
    }
}
