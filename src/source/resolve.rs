//! Module specifier resolution.
//!
//! Resolves import specifiers to files inside the project root: relative
//! paths, configured alias prefixes, and `compilerOptions.baseUrl`/`paths`
//! from a root `tsconfig.json` or `jsconfig.json`. Anything that would land
//! outside the root or inside a dependency directory resolves to `None`.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use super::language::{is_supported_file, RESOLVE_EXTENSIONS};

/// Directories holding installed dependencies. Never resolved into.
pub const DEPENDENCY_DIRS: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

/// Config files consulted for `baseUrl`/`paths`, in order.
const TS_CONFIG_FILES: &[&str] = &["tsconfig.json", "jsconfig.json"];

/// One `compilerOptions.paths` entry.
#[derive(Debug, Clone)]
struct PathMapping {
    pattern: String,
    targets: Vec<String>,
}

impl PathMapping {
    /// Returns the text matched by `*`, or an empty string for exact patterns.
    fn capture<'a>(&self, specifier: &'a str) -> Option<&'a str> {
        match self.pattern.split_once('*') {
            Some((prefix, suffix)) => specifier
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(suffix)),
            None => (specifier == self.pattern).then_some(""),
        }
    }
}

/// Resolves import specifiers to absolute file paths inside a root.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    root: PathBuf,
    /// Alias prefixes with their root-relative targets, longest prefix first.
    aliases: Vec<(String, Vec<String>)>,
    /// Directory `paths` targets and bare specifiers are relative to.
    base_url: Option<PathBuf>,
    paths: Vec<PathMapping>,
}

impl ModuleResolver {
    /// Create a resolver with only relative and alias resolution.
    pub fn new(root: impl Into<PathBuf>, aliases: &BTreeMap<String, Vec<String>>) -> Self {
        let mut aliases: Vec<(String, Vec<String>)> = aliases
            .iter()
            .map(|(prefix, targets)| (prefix.clone(), targets.clone()))
            .collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Self {
            root: normalize_path(&root.into()),
            aliases,
            base_url: None,
            paths: Vec::new(),
        }
    }

    /// Create a resolver and load `baseUrl`/`paths` from the root's tsconfig, if any.
    pub fn with_project_config(
        root: impl Into<PathBuf>,
        aliases: &BTreeMap<String, Vec<String>>,
    ) -> Self {
        let mut resolver = Self::new(root, aliases);
        for name in TS_CONFIG_FILES {
            let path = resolver.root.join(name);
            if !path.is_file() {
                continue;
            }
            match load_compiler_options(&path) {
                Some(options) => {
                    resolver.apply_compiler_options(&options);
                    debug!(config = %path.display(), "loaded module resolution options");
                }
                None => warn!(config = %path.display(), "could not read compiler options"),
            }
            break;
        }
        resolver
    }

    /// The root every resolution is confined to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn apply_compiler_options(&mut self, options: &Value) {
        let base = options
            .get("baseUrl")
            .and_then(Value::as_str)
            .map(|base| normalize_path(&self.root.join(base)));

        if let Some(paths) = options.get("paths").and_then(Value::as_object) {
            for (pattern, targets) in paths {
                let targets: Vec<String> = targets
                    .as_array()
                    .map(|list| {
                        list.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                if !targets.is_empty() {
                    self.paths.push(PathMapping {
                        pattern: pattern.clone(),
                        targets,
                    });
                }
            }
            // Longer literal prefixes are more specific.
            self.paths.sort_by(|a, b| {
                let a_len = a.pattern.split('*').next().map_or(0, str::len);
                let b_len = b.pattern.split('*').next().map_or(0, str::len);
                b_len.cmp(&a_len)
            });
        }

        self.base_url = base;
    }

    /// Resolve `specifier` as imported from `from_file`.
    pub fn resolve(&self, from_file: &Path, specifier: &str) -> Option<PathBuf> {
        if specifier.is_empty() {
            return None;
        }

        if is_relative(specifier) {
            let dir = from_file.parent()?;
            return self.try_candidate(&dir.join(specifier));
        }

        if specifier.starts_with('/') {
            return self.try_candidate(Path::new(specifier));
        }

        for mapping in &self.paths {
            let Some(captured) = mapping.capture(specifier) else {
                continue;
            };
            let base = self.base_url.as_deref().unwrap_or(&self.root);
            for target in &mapping.targets {
                let target = target.replacen('*', captured, 1);
                if let Some(found) = self.try_candidate(&base.join(target)) {
                    return Some(found);
                }
            }
        }

        for (prefix, targets) in &self.aliases {
            let Some(rest) = specifier.strip_prefix(prefix.as_str()) else {
                continue;
            };
            for target in targets {
                let candidate = self.root.join(target).join(rest);
                if let Some(found) = self.try_candidate(&candidate) {
                    return Some(found);
                }
            }
        }

        if let Some(base) = &self.base_url {
            return self.try_candidate(&base.join(specifier));
        }

        None
    }

    /// Returns true if `path` is inside the root and outside dependency directories.
    pub fn is_internal(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        path.starts_with(&self.root) && !is_dependency_path(&path)
    }

    /// Try a candidate path with extension inference and `index.*` fallback.
    fn try_candidate(&self, candidate: &Path) -> Option<PathBuf> {
        let candidate = normalize_path(candidate);
        if !self.is_internal(&candidate) {
            return None;
        }

        if candidate.is_file() && is_supported_file(&candidate) {
            return Some(candidate);
        }

        // `./client.js` written in TypeScript sources refers to `client.ts`.
        if let Some(ext) = candidate.extension().and_then(|e| e.to_str()) {
            let swapped: &[&str] = match ext {
                "js" => &["ts", "tsx"],
                "jsx" => &["tsx"],
                "mjs" => &["mts"],
                "cjs" => &["cts"],
                _ => &[],
            };
            for replacement in swapped {
                let path = candidate.with_extension(replacement);
                if path.is_file() {
                    return Some(path);
                }
            }
        }

        for ext in RESOLVE_EXTENSIONS {
            let path = append_extension(&candidate, ext);
            if path.is_file() {
                return Some(path);
            }
        }

        if candidate.is_dir() {
            for ext in RESOLVE_EXTENSIONS {
                let path = candidate.join(format!("index.{}", ext));
                if path.is_file() {
                    return Some(path);
                }
            }
        }

        None
    }
}

/// Returns true for `./x`, `../x`, `.` and `..`.
pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Returns true if any component of the path is a dependency directory.
pub fn is_dependency_path(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => DEPENDENCY_DIRS.iter().any(|d| name == *d),
        _ => false,
    })
}

/// Lexically normalize a path, resolving `.` and `..` without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

/// Read `compilerOptions` from a tsconfig-style file, tolerating comments and trailing commas.
fn load_compiler_options(path: &Path) -> Option<Value> {
    let content = fs::read_to_string(path).ok()?;
    let value: Value = serde_json::from_str(&clean_jsonc(&content)).ok()?;
    value.get("compilerOptions").cloned()
}

/// Remove comments and trailing commas outside of string literals.
fn clean_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    // Offset in `out` of a comma not yet followed by a value.
    let mut pending_comma: Option<usize> = None;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ if c.is_whitespace() => out.push(c),
            _ => {
                if let Some(at) = pending_comma.take() {
                    if c == '}' || c == ']' {
                        out.remove(at);
                    }
                }
                match c {
                    ',' => pending_comma = Some(out.len()),
                    '"' => in_string = true,
                    _ => {}
                }
                out.push(c);
            }
        }
    }
    out
}
