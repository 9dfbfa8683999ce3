//! Pure helpers for slash-separated Drive paths.
//!
//! A path looks like `Root/folder/sub/file.csv`. The first segment names an
//! entry of the configured root mapping. A trailing `/` marks a folder.

/// Backslashes become `/`.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Split into `(folder, name)` at the last `/`.
///
/// The folder keeps no trailing slash unless it is made only of slashes.
/// `"Root/a/"` gives `("Root/a", "")`, `"file"` gives `("", "file")`.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => {
            let head = &path[..=i];
            let trimmed = head.trim_end_matches('/');
            let folder = if trimmed.is_empty() { head } else { trimmed };
            (folder, &path[i + 1..])
        }
        None => ("", path),
    }
}

/// Non-empty segments with `.` removed.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".").collect()
}

/// Join a child name onto a folder path.
pub fn join(folder: &str, name: &str) -> String {
    if folder.is_empty() || folder.ends_with('/') {
        format!("{}{}", folder, name)
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Whether the path designates a folder (ends with `/`).
pub fn is_folder(path: &str) -> bool {
    split(path).1.is_empty()
}
