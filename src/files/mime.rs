//! # Tabla de tipos MIME
//! src/files/mime.rs
//!
//! Mapeo estático extensión → Content-Type. Se inyecta en el
//! [`PathResolver`](super::PathResolver); una extensión desconocida nunca es
//! error, cae en `application/octet-stream`.

use std::path::Path;

/// Content-Type para extensiones desconocidas o archivos sin extensión
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

static BUILTIN: &[(&str, &str)] = &[
    // Texto
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("md", "text/markdown"),
    ("xml", "application/xml"),
    // JavaScript/datos
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("wasm", "application/wasm"),
    // Imágenes
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/vnd.microsoft.icon"),
    ("webp", "image/webp"),
    ("swf", "application/x-shockwave-flash"),
    // Audio/video
    ("mp3", "audio/mpeg"),
    ("wav", "audio/x-wav"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    // Documentos
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
];

/// Tabla inmutable de tipos MIME, compartida de solo lectura entre workers
#[derive(Debug, Clone, Copy)]
pub struct MimeTable {
    entries: &'static [(&'static str, &'static str)],
}

impl MimeTable {
    /// Crea una tabla a partir de pares `(extensión, content-type)`
    ///
    /// Las extensiones van sin punto y en minúsculas.
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// Tabla por defecto con los tipos más comunes de un sitio estático
    pub const fn builtin() -> Self {
        Self::new(BUILTIN)
    }

    /// Busca el Content-Type de una extensión (sin importar mayúsculas)
    ///
    /// # Ejemplo
    /// ```
    /// use static_httpd::files::MimeTable;
    ///
    /// let table = MimeTable::builtin();
    /// assert_eq!(table.lookup(Some("HTML")), "text/html");
    /// assert_eq!(table.lookup(Some("xyz")), "application/octet-stream");
    /// assert_eq!(table.lookup(None), "application/octet-stream");
    /// ```
    pub fn lookup(&self, extension: Option<&str>) -> &'static str {
        let Some(extension) = extension else {
            return DEFAULT_MIME_TYPE;
        };

        self.entries
            .iter()
            .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
            .map_or(DEFAULT_MIME_TYPE, |(_, mime)| *mime)
    }

    /// Content-Type según la extensión de `path`
    pub fn for_path(&self, path: &Path) -> &'static str {
        self.lookup(path.extension().and_then(|ext| ext.to_str()))
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        let table = MimeTable::builtin();
        assert_eq!(table.lookup(Some("html")), "text/html");
        assert_eq!(table.lookup(Some("css")), "text/css");
        assert_eq!(table.lookup(Some("js")), "application/javascript");
        assert_eq!(table.lookup(Some("png")), "image/png");
        assert_eq!(table.lookup(Some("jpeg")), "image/jpeg");
    }

    #[test]
    fn test_case_insensitive() {
        let table = MimeTable::builtin();
        assert_eq!(table.lookup(Some("JPG")), "image/jpeg");
        assert_eq!(table.lookup(Some("Txt")), "text/plain");
    }

    #[test]
    fn test_unknown_defaults_to_octet_stream() {
        let table = MimeTable::builtin();
        assert_eq!(table.lookup(Some("unknown")), DEFAULT_MIME_TYPE);
        assert_eq!(table.lookup(None), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_for_path() {
        let table = MimeTable::default();
        assert_eq!(table.for_path(Path::new("/srv/www/index.html")), "text/html");
        assert_eq!(table.for_path(Path::new("/srv/www/archive.tar.gz")), "application/gzip");
        assert_eq!(table.for_path(Path::new("/srv/www/Makefile")), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_injected_table() {
        static ONLY_RUST: &[(&str, &str)] = &[("rs", "text/x-rust")];
        let table = MimeTable::new(ONLY_RUST);

        assert_eq!(table.lookup(Some("rs")), "text/x-rust");
        assert_eq!(table.lookup(Some("html")), DEFAULT_MIME_TYPE);
    }
}
