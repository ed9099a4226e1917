//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Lado protocolo del servidor de archivos:
//!
//! - Lectura del bloque de headers y parsing de la request line
//! - Construcción y serialización de responses
//! - Códigos de estado
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! Solo la primera línea se interpreta.
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 404 Not Found\r\n
//! Content-Type: application/octet-stream\r\n
//! Content-Length: 0\r\n
//! Server: static_httpd\r\n
//! Connection: close\r\n
//! Date: Sun, 18 Oct 2026 10:00:00 GMT\r\n
//! \r\n
//! ```

pub mod request;
pub mod response;
pub mod status;

pub use request::{read_request_head, Method, ParseError, ReadError, Request};
pub use response::Response;
pub use status::StatusCode;
