//! Mapping between URL paths and file-based route handlers.
//!
//! A handler lives at `<routes dir>/<segments>/route.<ext>`. Directory names
//! may be literal (`users`), dynamic (`[id]`), catch-all (`[...slug]`,
//! `[[...slug]]`) or route groups (`(admin)`) that never appear in URLs.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::source::{is_dependency_path, normalize_path};

/// File names recognised as route handlers, in lookup order.
pub const HANDLER_FILE_NAMES: &[&str] = &[
    "route.ts",
    "route.tsx",
    "route.js",
    "route.jsx",
    "route.mjs",
    "route.mts",
];

/// The kind of a handler directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentKind {
    Literal,
    Group,
    Dynamic,
    CatchAll,
    OptionalCatchAll,
}

fn segment_kind(name: &str) -> SegmentKind {
    if name.starts_with("[[...") && name.ends_with("]]") {
        SegmentKind::OptionalCatchAll
    } else if name.starts_with("[...") && name.ends_with(']') {
        SegmentKind::CatchAll
    } else if name.starts_with('[') && name.ends_with(']') {
        SegmentKind::Dynamic
    } else if name.starts_with('(') && name.ends_with(')') {
        SegmentKind::Group
    } else {
        SegmentKind::Literal
    }
}

/// Byte offset just past the `${...}` that opens `text`, honouring nested braces.
fn interpolation_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Offset of the first `?` or `#` outside any `${...}` interpolation.
fn query_start(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 2;
                continue;
            }
            b'{' if depth > 0 => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            b'?' | b'#' if depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Pathname of a URL as written in source.
///
/// Drops a leading `${...}` base URL, the query string and fragment, an
/// absolute or protocol-relative origin and any trailing slash.
pub fn url_pathname(url: &str) -> String {
    let mut rest = url.trim();

    if rest.starts_with("${") {
        rest = match interpolation_end(rest) {
            Some(end) => &rest[end..],
            None => "",
        };
    }

    if let Some(end) = query_start(rest) {
        rest = &rest[..end];
    }

    let after_origin = if let Some(idx) = rest.find("://") {
        Some(&rest[idx + 3..])
    } else {
        rest.strip_prefix("//")
    };
    if let Some(host_and_path) = after_origin {
        rest = match host_and_path.find('/') {
            Some(slash) => &host_and_path[slash..],
            None => "/",
        };
    }

    let trimmed = rest.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// A configured handler directory and the URL prefix it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLayout {
    routes_dir: PathBuf,
    /// Leading slash, no trailing slash. Empty when the directory serves `/`.
    url_prefix: String,
}

impl RouteLayout {
    pub fn new(routes_dir: impl Into<PathBuf>, url_prefix: &str) -> Self {
        let trimmed = url_prefix.trim().trim_matches('/');
        let url_prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        };
        Self {
            routes_dir: normalize_path(&routes_dir.into()),
            url_prefix,
        }
    }

    /// Layout for `config.api_routes_dir`, if one is configured.
    ///
    /// The prefix is `apiRoutePrefix` when set, otherwise `/` followed by the
    /// directory's last component.
    pub fn from_config(config: &ScanConfig) -> Option<Self> {
        let routes_dir = config.api_routes_path()?;
        let prefix = match &config.api_route_prefix {
            Some(prefix) => prefix.clone(),
            None => routes_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        Some(Self::new(routes_dir, &prefix))
    }

    pub fn routes_dir(&self) -> &Path {
        &self.routes_dir
    }

    pub fn url_prefix(&self) -> &str {
        if self.url_prefix.is_empty() {
            "/"
        } else {
            &self.url_prefix
        }
    }

    /// Path segments of `url` below the prefix, or None if the URL is not served here.
    pub fn url_to_segments(&self, url: &str) -> Option<Vec<String>> {
        let pathname = url_pathname(url);
        let rest = if self.url_prefix.is_empty() {
            pathname.as_str()
        } else {
            let rest = pathname.strip_prefix(&self.url_prefix)?;
            if !rest.is_empty() && !rest.starts_with('/') {
                return None;
            }
            rest
        };

        let segments: Vec<String> = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.iter().any(|s| s == "." || s == "..") {
            return None;
        }
        Some(segments)
    }

    /// Handler file serving `url`, if any.
    pub fn resolve_url(&self, url: &str) -> Option<PathBuf> {
        let segments = self.url_to_segments(url)?;
        self.find_handler_file(&segments)
    }

    /// Handler file for already split path segments.
    pub fn find_handler_file(&self, segments: &[String]) -> Option<PathBuf> {
        match_directory(&self.routes_dir, segments)
    }

    /// URL served by a handler file. Route groups are dropped; dynamic
    /// segments keep their bracketed directory names.
    pub fn url_for_handler(&self, file: &Path) -> Option<String> {
        let name = file.file_name()?.to_str()?;
        if !HANDLER_FILE_NAMES.contains(&name) {
            return None;
        }
        let dir = file.parent()?;
        let relative = dir.strip_prefix(&self.routes_dir).ok()?;

        let mut url = self.url_prefix.clone();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return None;
            };
            let part = part.to_string_lossy();
            if segment_kind(&part) == SegmentKind::Group {
                continue;
            }
            url.push('/');
            url.push_str(&part);
        }

        if url.is_empty() {
            url.push('/');
        }
        Some(url)
    }

    /// Every handler file below the routes directory, sorted.
    pub fn handler_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.routes_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_dependency_path(Path::new(e.file_name())))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|name| HANDLER_FILE_NAMES.contains(&name))
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }
}

fn handler_in(dir: &Path) -> Option<PathBuf> {
    HANDLER_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Sorted child directories with their name kinds.
fn child_directories(dir: &Path) -> Vec<(PathBuf, SegmentKind)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut dirs: Vec<(PathBuf, SegmentKind)> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| {
            let kind = segment_kind(&e.file_name().to_string_lossy());
            (e.path(), kind)
        })
        .collect();
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    dirs
}

fn match_directory(dir: &Path, segments: &[String]) -> Option<PathBuf> {
    let children = child_directories(dir);

    let Some((head, rest)) = segments.split_first() else {
        if let Some(file) = handler_in(dir) {
            return Some(file);
        }
        for (child, kind) in &children {
            let found = match kind {
                SegmentKind::Group => match_directory(child, segments),
                SegmentKind::OptionalCatchAll => handler_in(child),
                _ => None,
            };
            if found.is_some() {
                return found;
            }
        }
        return None;
    };

    if segment_kind(head) == SegmentKind::Literal {
        let exact = dir.join(head);
        if exact.is_dir() {
            if let Some(file) = match_directory(&exact, rest) {
                return Some(file);
            }
        }
    }

    for wanted in [
        SegmentKind::Group,
        SegmentKind::Dynamic,
        SegmentKind::CatchAll,
        SegmentKind::OptionalCatchAll,
    ] {
        for (child, kind) in children.iter().filter(|(_, k)| *k == wanted) {
            let found = match kind {
                SegmentKind::Group => match_directory(child, segments),
                SegmentKind::Dynamic => match_directory(child, rest),
                _ => handler_in(child),
            };
            if found.is_some() {
                return found;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "export async function GET() {}\n").unwrap();
        path
    }

    #[test]
    fn test_url_pathname() {
        assert_eq!(url_pathname("/api/users"), "/api/users");
        assert_eq!(url_pathname("/api/users/?page=2"), "/api/users");
        assert_eq!(url_pathname("https://example.com/api/x#top"), "/api/x");
        assert_eq!(url_pathname("//cdn.example.com/api/x"), "/api/x");
        assert_eq!(url_pathname("${BASE_URL}/api/items/${id}"), "/api/items/${id}");
        assert_eq!(url_pathname("https://example.com"), "/");
        assert_eq!(url_pathname("api/x"), "/api/x");
    }

    #[test]
    fn test_url_pathname_skips_interpolated_operators() {
        assert_eq!(url_pathname("/api/x/${a ? b : c}"), "/api/x/${a ? b : c}");
        assert_eq!(url_pathname("/api/x/${a ? b : c}?page=1"), "/api/x/${a ? b : c}");
        assert_eq!(url_pathname("/api/x/${tag ?? '#'}#top"), "/api/x/${tag ?? '#'}");
        assert_eq!(url_pathname("${env ? { a: 1 }.a : BASE}/api/x"), "/api/x");
    }

    #[test]
    fn test_from_config_prefix() {
        let mut config = ScanConfig::new("/repo");
        assert!(RouteLayout::from_config(&config).is_none());

        config.api_routes_dir = Some(PathBuf::from("app/api"));
        let layout = RouteLayout::from_config(&config).unwrap();
        assert_eq!(layout.routes_dir(), Path::new("/repo/app/api"));
        assert_eq!(layout.url_prefix(), "/api");

        config.api_route_prefix = Some("/v1/".to_string());
        assert_eq!(RouteLayout::from_config(&config).unwrap().url_prefix(), "/v1");
    }

    #[test]
    fn test_url_to_segments() {
        let layout = RouteLayout::new("/repo/api", "/api");
        assert_eq!(
            layout.url_to_segments("/api/users/42"),
            Some(vec!["users".to_string(), "42".to_string()])
        );
        assert_eq!(layout.url_to_segments("/api"), Some(Vec::new()));
        assert_eq!(layout.url_to_segments("/apis/users"), None);
        assert_eq!(layout.url_to_segments("/other"), None);
        assert_eq!(layout.url_to_segments("/api/../secrets"), None);
    }

    #[test]
    fn test_resolve_exact_dynamic_and_catch_all() {
        let dir = tempdir().unwrap();
        let api = dir.path().join("api");
        let widgets = touch(&api, "widgets/route.ts");
        let item = touch(&api, "items/[id]/route.ts");
        let latest = touch(&api, "items/latest/route.ts");
        let docs = touch(&api, "docs/[...slug]/route.js");
        let admin = touch(&api, "(admin)/settings/route.ts");

        let layout = RouteLayout::new(&api, "/api");
        assert_eq!(layout.resolve_url("/api/widgets"), Some(widgets));
        assert_eq!(layout.resolve_url("/api/items/${id}"), Some(item.clone()));
        assert_eq!(layout.resolve_url("/api/items/7?full=1"), Some(item.clone()));
        assert_eq!(layout.resolve_url("/api/items/${a ? b : c}"), Some(item));
        assert_eq!(layout.resolve_url("/api/items/latest"), Some(latest));
        assert_eq!(layout.resolve_url("/api/docs/a/b/c"), Some(docs));
        assert_eq!(layout.resolve_url("/api/settings"), Some(admin));
        assert_eq!(layout.resolve_url("/api/missing"), None);
        assert_eq!(layout.resolve_url("/elsewhere/widgets"), None);
    }

    #[test]
    fn test_url_for_handler_and_listing() {
        let dir = tempdir().unwrap();
        let api = dir.path().join("api");
        let root = touch(&api, "route.ts");
        let item = touch(&api, "items/[id]/route.ts");
        let admin = touch(&api, "(admin)/settings/route.ts");
        touch(&api, "items/helpers.ts");

        let layout = RouteLayout::new(&api, "api");
        assert_eq!(layout.url_for_handler(&root), Some("/api".to_string()));
        assert_eq!(layout.url_for_handler(&item), Some("/api/items/[id]".to_string()));
        assert_eq!(layout.url_for_handler(&admin), Some("/api/settings".to_string()));
        assert_eq!(layout.url_for_handler(&api.join("items/helpers.ts")), None);

        let mut expected = vec![root, item, admin];
        expected.sort();
        assert_eq!(layout.handler_files(), expected);
    }
}
