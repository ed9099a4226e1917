//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! Arma la respuesta a partir del código de estado, el método y el archivo
//! resuelto (si lo hay), y la serializa a bytes.
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 2\r\n
//! Server: static_httpd\r\n
//! Connection: close\r\n
//! Date: Sun, 18 Oct 2026 10:00:00 GMT\r\n
//! \r\n
//! hi
//! ```
//!
//! Después del body no va nada más: sin chunking ni terminador.

use super::{Method, StatusCode};
use crate::files::mime::DEFAULT_MIME_TYPE;
use crate::files::ResolvedFile;
use std::fs;
use std::io;

/// Versión de protocolo de todas las respuestas
pub const PROTOCOL: &str = "HTTP/1.0";

/// Valor fijo del header `Server`
pub const SERVER_NAME: &str = "static_httpd";

/// Formato del header `Date`
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP
    status: StatusCode,

    /// Headers en orden de inserción, sin claves repetidas
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (vacío salvo GET 200)
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Arma la respuesta completa con los headers estándar
    ///
    /// Solo un GET con status 200 y archivo lee el contenido del disco. Un
    /// HEAD reporta el tamaño del archivo en `Content-Length` sin body. Con
    /// cualquier otro status el body es vacío y `Content-Length` es 0.
    ///
    /// # Errores
    ///
    /// Retorna el error de I/O si el archivo no se puede leer (por ejemplo,
    /// si se borró después de resolverlo).
    pub fn build(
        status: StatusCode,
        method: Option<Method>,
        file: Option<&ResolvedFile>,
    ) -> io::Result<Self> {
        let content_type = file.map_or(DEFAULT_MIME_TYPE, |f| f.mime_type);

        let response = match (status, method, file) {
            (StatusCode::Ok, Some(Method::GET), Some(file)) => {
                let body = fs::read(&file.absolute_path)?;
                let content_length = body.len() as u64;
                Self::with_standard_headers(status, content_type, content_length, body)
            }
            (StatusCode::Ok, Some(Method::HEAD), Some(file)) => {
                Self::with_standard_headers(status, content_type, file.size_bytes, Vec::new())
            }
            _ => Self::with_standard_headers(status, content_type, 0, Vec::new()),
        };

        Ok(response)
    }

    /// Respuesta de error sin body
    ///
    /// # Ejemplo
    /// ```
    /// use static_httpd::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound);
    /// assert_eq!(response.header("Content-Length"), Some("0"));
    /// assert!(response.body().is_empty());
    /// ```
    pub fn error(status: StatusCode) -> Self {
        Self::with_standard_headers(status, DEFAULT_MIME_TYPE, 0, Vec::new())
    }

    fn with_standard_headers(
        status: StatusCode,
        content_type: &str,
        content_length: u64,
        body: Vec<u8>,
    ) -> Self {
        let date = chrono::Utc::now().format(DATE_FORMAT).to_string();

        let mut response = Self::new(status);
        response.add_header("Content-Type", content_type);
        response.add_header("Content-Length", &content_length.to_string());
        response.add_header("Server", SERVER_NAME);
        response.add_header("Connection", "close");
        response.add_header("Date", &date);
        response.body = body;
        response
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe, se sobrescribe conservando su posición.
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing_value)) => *existing_value = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.0 200 OK\r\n`
    /// - Headers: `Header-Name: Value\r\n`
    /// - Línea vacía: `\r\n`
    /// - Body: contenido binario
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(256 + self.body.len());

        result.extend_from_slice(format!("{} {}\r\n", PROTOCOL, self.status).as_bytes());

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene los headers en orden
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Obtiene el valor de un header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
