use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Find files recursively in a directory that match a predicate
pub fn find_files<P, F>(path: P, predicate: &F) -> io::Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
    F: Fn(&Path) -> bool + ?Sized,
{
    let mut result = Vec::new();

    if !path.as_ref().exists() {
        return Ok(result);
    }

    if path.as_ref().is_file() {
        if predicate(path.as_ref()) {
            result.push(path.as_ref().to_path_buf());
        }
        return Ok(result);
    }

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let entry_path = entry.path();

        if entry_path.is_file() {
            if predicate(&entry_path) {
                result.push(entry_path);
            }
        } else if entry_path.is_dir() {
            let mut sub_results = find_files(&entry_path, predicate)?;
            result.append(&mut sub_results);
        }
    }

    Ok(result)
}

/// Whether the file name of `path` starts with any of `prefixes`, ignoring case
pub fn file_name_has_prefix(path: &Path, prefixes: &[&str]) -> bool {
    match path.file_name() {
        Some(name) => {
            let name = name.to_string_lossy().to_lowercase();
            prefixes.iter().any(|prefix| name.starts_with(&prefix.to_lowercase()))
        }
        None => false,
    }
}
