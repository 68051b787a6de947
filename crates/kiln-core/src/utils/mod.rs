pub mod fs;

use std::path::Path;

/// Get the file extension from a path, lowercased
pub fn file_extension<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}
