//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de archivos con soporte para argumentos CLI y
//! variables de entorno. El core la recibe explícitamente en
//! [`Server::bind`](crate::server::Server::bind); no hay estado global.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./static_httpd --host 0.0.0.0 --port 8080 \
//!   --workers 8 \
//!   --document-root /srv/www
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 DOCUMENT_ROOT=/srv/www ./static_httpd
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Configuración del servidor HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(name = "static_httpd")]
#[command(about = "Servidor HTTP/1.0 de archivos estáticos con pool de workers acotado")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(short = 'i', long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Número fijo de workers (conexiones atendidas en paralelo)
    #[arg(short, long, default_value = "5", env = "WORKERS")]
    pub workers: usize,

    /// Directorio raíz desde el que se sirven archivos
    #[arg(short = 'r', long = "document-root", default_value = ".", env = "DOCUMENT_ROOT")]
    pub document_root: PathBuf,

    // === Límites por conexión ===
    /// Timeout de lectura/escritura del socket en segundos
    #[arg(long = "timeout-secs", default_value = "5", env = "TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Tamaño máximo del bloque de headers del request
    #[arg(long = "max-header-bytes", default_value = "8192", env = "MAX_HEADER_BYTES")]
    pub max_header_bytes: usize,

    /// Archivo que se sirve cuando el path es un directorio
    #[arg(long = "index", default_value = "index.html", env = "INDEX_FILE")]
    pub index_file: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use static_httpd::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout de socket como `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }

        // Un timeout de 0 en set_read_timeout es un error de std
        if self.timeout_secs == 0 {
            return Err("Timeout must be > 0".to_string());
        }

        if self.max_header_bytes == 0 {
            return Err("Max header bytes must be > 0".to_string());
        }

        if self.index_file.is_empty() || self.index_file.contains('/') {
            return Err("Index file must be a plain file name".to_string());
        }

        Ok(())
    }

    /// Loguea un resumen de la configuración
    pub fn log_summary(&self) {
        info!(address = %self.address(), "Network");
        info!(document_root = %self.document_root.display(), index = %self.index_file, "Files");
        info!(
            workers = self.workers,
            timeout_secs = self.timeout_secs,
            max_header_bytes = self.max_header_bytes,
            "Limits"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 5,
            document_root: PathBuf::from("."),
            timeout_secs: 5,
            max_header_bytes: 8192,
            index_file: "index.html".to_string(),
        }
    }
}
