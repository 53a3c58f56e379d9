/// Normalize a configured URL prefix into `/segment/.../` form.
///
/// Empty, `.` and `..` segments are dropped, so `"assets"`, `"/assets"` and
/// `"//assets/./"` all become `"/assets/"`. An empty prefix becomes `"/"`.
pub fn normalize_mount_prefix(prefix: &str) -> String {
    let mut normalized = String::from("/");
    for segment in prefix.trim().split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        normalized.push_str(segment);
        normalized.push('/');
    }
    normalized
}

/// Whether a request path falls under a prefix produced by
/// [`normalize_mount_prefix`]. The prefix without its trailing slash matches
/// as well.
pub fn is_mounted(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    path.starts_with(prefix) || path == prefix.trim_end_matches('/')
}
