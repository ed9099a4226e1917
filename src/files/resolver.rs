//! # Resolución de paths contra el document root
//! src/files/resolver.rs
//!
//! Convierte el path decodificado de un request en un archivo regular
//! verificado dentro del document root.
//!
//! ## Chequeo de contención
//!
//! La contención se verifica por segmentos con [`Path::starts_with`], nunca
//! comparando strings: con root `/srv/root`, el path `/srv/root-evil/x`
//! comparte prefijo de texto pero no de segmentos, y se rechaza.
//!
//! Se verifica dos veces:
//! 1. Sobre la forma léxica (`.`/`..` resueltos con `path-clean`), para que un
//!    `..` que escapa dé 400 aunque el destino no exista.
//! 2. Sobre la forma canónica, para atrapar symlinks que apuntan afuera.

use super::MimeTable;
use crate::http::StatusCode;
use path_clean::PathClean;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Archivo listo para servir
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Path canónico, siempre dentro del document root
    pub absolute_path: PathBuf,

    /// Tamaño al momento de resolver
    pub size_bytes: u64,

    /// Content-Type según la extensión
    pub mime_type: &'static str,
}

/// Errores de resolución (todos son errores de protocolo)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// El path sale del document root
    OutsideRoot(String),

    /// No existe o no es un archivo regular
    NotFound(String),
}

impl ResolveError {
    /// Código de estado con el que se responde este error
    pub fn status(&self) -> StatusCode {
        match self {
            ResolveError::OutsideRoot(_) => StatusCode::BadRequest,
            ResolveError::NotFound(_) => StatusCode::NotFound,
        }
    }
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::OutsideRoot(p) => write!(f, "Path escapes document root: {}", p),
            ResolveError::NotFound(p) => write!(f, "File not found: {}", p),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resuelve paths de requests contra un document root fijo
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Document root canónico
    root: PathBuf,

    /// Archivo que se sirve cuando el path es un directorio
    index_file: String,

    mime: MimeTable,
}

impl PathResolver {
    /// Crea un resolver canonicalizando el document root
    ///
    /// # Errores
    ///
    /// Falla si el root no existe o no es un directorio.
    pub fn new(
        root: impl AsRef<Path>,
        index_file: impl Into<String>,
        mime: MimeTable,
    ) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;

        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("document root is not a directory: {}", root.display()),
            ));
        }

        Ok(Self {
            root,
            index_file: index_file.into(),
            mime,
        })
    }

    /// Document root canónico
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resuelve `decoded_path` a un archivo regular dentro del root
    ///
    /// # Ejemplo
    ///
    /// ```no_run
    /// use static_httpd::files::{MimeTable, PathResolver};
    ///
    /// let resolver = PathResolver::new("/srv/www", "index.html", MimeTable::builtin()).unwrap();
    /// let file = resolver.resolve("/docs/").unwrap();
    /// assert!(file.absolute_path.ends_with("docs/index.html"));
    /// ```
    pub fn resolve(&self, decoded_path: &str) -> Result<ResolvedFile, ResolveError> {
        if decoded_path.contains('\0') {
            return Err(ResolveError::OutsideRoot(decoded_path.escape_default().to_string()));
        }

        // Sin el '/' inicial, join() reemplazaría el root completo
        let relative = decoded_path.trim_start_matches('/');
        let candidate = self.root.join(relative).clean();

        if !candidate.starts_with(&self.root) {
            return Err(ResolveError::OutsideRoot(decoded_path.to_string()));
        }

        let canonical = self.canonicalize_within(&candidate, decoded_path)?;
        let metadata = fs::metadata(&canonical)
            .map_err(|_| ResolveError::NotFound(decoded_path.to_string()))?;

        let (path, metadata) = if metadata.is_dir() {
            let index = self.canonicalize_within(&canonical.join(&self.index_file), decoded_path)?;
            let index_metadata = fs::metadata(&index)
                .map_err(|_| ResolveError::NotFound(decoded_path.to_string()))?;
            (index, index_metadata)
        } else {
            (canonical, metadata)
        };

        if !metadata.is_file() {
            return Err(ResolveError::NotFound(decoded_path.to_string()));
        }

        Ok(ResolvedFile {
            mime_type: self.mime.for_path(&path),
            size_bytes: metadata.len(),
            absolute_path: path,
        })
    }

    fn canonicalize_within(&self, path: &Path, requested: &str) -> Result<PathBuf, ResolveError> {
        let canonical = path
            .canonicalize()
            .map_err(|_| ResolveError::NotFound(requested.to_string()))?;

        if !canonical.starts_with(&self.root) {
            return Err(ResolveError::OutsideRoot(requested.to_string()));
        }

        Ok(canonical)
    }
}
