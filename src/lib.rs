//! # Static HTTPD
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de archivos estáticos con concurrencia acotada: un
//! único pool de N workers atiende las conexiones, y cada una se procesa de
//! principio a fin por un solo worker.
//!
//! ## Arquitectura
//!
//! - `http`: lectura del request, parsing de la request line, responses
//! - `files`: resolución de paths contra el document root y tipos MIME
//! - `server`: acceptor TCP, pool de workers y manejo de cada conexión
//! - `config`: argumentos CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use static_httpd::config::Config;
//! use static_httpd::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(&config).expect("Error al iniciar servidor");
//! server.run().expect("Error en el loop de accept");
//! ```

pub mod config;
pub mod files;
pub mod http;
pub mod server;

#[cfg(test)]
mod testutil;
