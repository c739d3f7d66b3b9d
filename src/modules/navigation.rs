// Pure navigation logic - no Tauri imports allowed.
// Path helpers shared by the tab store and the synchronizer.

use url::Url;

/// Placeholder origin used to resolve router locations into absolute paths.
const RESOLVE_BASE: &str = "http://workspace.local/";

/// Turns whatever the router hands us into a canonical absolute pathname.
///
/// Router notifications may carry a query string, a fragment, a trailing slash,
/// dot segments, or be relative. None of that affects tab affinity, so two
/// notifications that differ only in those parts normalize to the same value:
///
/// - `"/payroll/runs?page=2#top"` -> `"/payroll/runs"`
/// - `"payroll/"` -> `"/payroll"`
/// - `""` -> `"/"`
pub fn normalize_path(location: &str) -> String {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }

    // "//payroll" would otherwise be read as a scheme-relative host, and
    // "payroll:runs" as a URL with its own scheme.
    let collapsed = if trimmed.starts_with('/') {
        format!("/{}", trimmed.trim_start_matches('/'))
    } else if is_http_url(trimmed) {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    let path = match Url::parse(RESOLVE_BASE).and_then(|base| base.join(&collapsed)) {
        Ok(u) => u.path().to_string(),
        Err(e) => {
            log::debug!("[Navigation] Could not resolve {:?}: {}", location, e);
            let cut = collapsed
                .find(|c| c == '?' || c == '#')
                .unwrap_or(collapsed.len());
            let raw = &collapsed[..cut];
            if raw.starts_with('/') {
                raw.to_string()
            } else {
                format!("/{}", raw)
            }
        }
    };

    let stripped = path.trim_end_matches('/');
    if stripped.is_empty() {
        "/".to_string()
    } else {
        stripped.to_string()
    }
}

fn is_http_url(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// First path segment, the unit of tab de-duplication.
pub fn module_root(path: &str) -> Option<&str> {
    path.split('/').find(|segment| !segment.is_empty())
}

/// Segment-aware prefix test: `/payroll` prefixes `/payroll/runs` but `/pay`
/// does not prefix `/payroll`. The root only prefixes itself.
pub fn is_segment_prefix(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Root and the configured dashboard path both mean "show the Dashboard".
pub fn is_dashboard_path(path: &str, dashboard_path: &str) -> bool {
    path == "/" || path == dashboard_path
}
