//! # Módulo de Archivos
//! src/files/mod.rs
//!
//! Todo lo que toca el filesystem antes de armar la respuesta:
//!
//! - `resolver`: path del request → archivo verificado dentro del document root
//! - `mime`: tabla estática extensión → Content-Type

pub mod mime;
pub mod resolver;

pub use mime::MimeTable;
pub use resolver::{PathResolver, ResolveError, ResolvedFile};
