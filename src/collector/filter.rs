//! Admission filter applied to every candidate file before it is fetched.

use std::fmt;

/// Directory names that are never descended into nor collected from
pub const SKIP_DIRS: &[&str] = &[
    // Dependency managers
    "node_modules", "bower_components", "vendor", "venv", ".venv",
    // Build output
    "dist", "build", "out", "target", "obj", ".next", ".nuxt", ".gradle", ".terraform",
    // Caches and tooling state
    "__pycache__", ".cache", ".pytest_cache", ".mypy_cache", ".tox", ".turbo", ".parcel-cache",
    "coverage", ".idea", ".vscode",
    // Version control internals
    ".git", ".svn", ".hg",
];

/// Extensions of binary or generated assets
pub const BINARY_EXTENSIONS: &[&str] = &[
    // Images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "tiff", "tif", "psd", "avif",
    // Archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "jar", "war",
    // Executables and libraries
    "exe", "dll", "so", "dylib", "bin", "o", "a", "lib", "wasm", "apk", "dmg", "iso",
    // Fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // Media
    "mp3", "mp4", "wav", "ogg", "flac", "avi", "mov", "mkv", "webm",
    // Documents and data blobs
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "sqlite", "db",
    // Compiled bytecode
    "class", "pyc", "pyo", "beam",
    // Source maps
    "map",
];

/// Path fragments produced by minifiers and bundlers
pub const GENERATED_MARKERS: &[&str] = &[".min.js", ".min.css", ".bundle.", "-bundle.", ".chunk."];

/// Why a candidate file was not admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Declared size above the per-file ceiling
    TooLarge { size: u64, limit: u64 },
    /// A path segment is a skip-listed directory name
    SkippedDirectory(String),
    /// Binary or generated extension
    BinaryExtension(String),
    /// Minified, bundled or chunked build artifact
    GeneratedArtifact,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { size, limit } => write!(f, "size {} exceeds limit {}", size, limit),
            Self::SkippedDirectory(dir) => write!(f, "inside skipped directory '{}'", dir),
            Self::BinaryExtension(ext) => write!(f, "binary extension '.{}'", ext),
            Self::GeneratedArtifact => write!(f, "generated build artifact"),
        }
    }
}

/// Whether a directory with this base name should be skipped
pub fn is_skipped_dir(name: &str) -> bool {
    SKIP_DIRS.iter().any(|dir| dir.eq_ignore_ascii_case(name))
}

/// Lower-cased suffix after the last dot of the file name, if any
pub fn extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Decides whether a file may be fetched, from its path and declared size alone.
///
/// Pure: the answer does not depend on what has been collected so far.
pub fn admit(path: &str, size: u64, max_file_size: u64) -> Result<(), Rejection> {
    if size > max_file_size {
        return Err(Rejection::TooLarge { size, limit: max_file_size });
    }

    if let Some(dir) = path.split('/').find(|segment| is_skipped_dir(segment)) {
        return Err(Rejection::SkippedDirectory(dir.to_string()));
    }

    if let Some(ext) = extension(path) {
        if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            return Err(Rejection::BinaryExtension(ext));
        }
    }

    let lower = path.to_ascii_lowercase();
    if GENERATED_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return Err(Rejection::GeneratedArtifact);
    }

    Ok(())
}
