//! Candidate file discovery.
//!
//! Walks the root with include/exclude globs, then expands the scan set with
//! everything the API directory transitively imports.

use std::collections::{BTreeSet, VecDeque};
use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::error::ConfigError;
use crate::graph::ImportGraph;
use crate::source::{is_supported_file, normalize_path, Project};

/// Directories never scanned, whatever the configured patterns say.
pub const ALWAYS_IGNORED: &[&str] = &[
    "node_modules",
    "bower_components",
    "jspm_packages",
    ".git",
    ".svn",
    ".hg",
    "dist",
    "build",
    "out",
    ".next",
    ".nuxt",
    ".output",
    ".vercel",
    ".turbo",
    "coverage",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Files selected for a scan.
#[derive(Debug, Default)]
pub struct DiscoveredFiles {
    /// Absolute paths, sorted and unique.
    pub files: Vec<PathBuf>,
    /// Internal imports followed from the API directory.
    pub import_graph: ImportGraph,
    /// Files added only because the API directory reaches them.
    pub expanded: usize,
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    ALWAYS_IGNORED.contains(&&*name)
}

/// Returns true if any component of `path` below `root` is an ignored directory.
fn in_ignored_dir(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut components: Vec<Component> = relative.components().collect();
    components.pop();
    components.iter().any(|c| match c {
        Component::Normal(name) => ALWAYS_IGNORED.iter().any(|d| name == d),
        _ => false,
    })
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Supported source files below `dir`, skipping ignored directories.
fn walk_sources(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| normalize_path(e.path()))
        .filter(|path| is_supported_file(path))
        .collect()
}

/// Enumerates the files a scan covers.
#[derive(Debug)]
pub struct FileDiscoverer<'a> {
    config: &'a ScanConfig,
    root: PathBuf,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl<'a> FileDiscoverer<'a> {
    pub fn new(config: &'a ScanConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config,
            root: normalize_path(&config.root_dir),
            include: compile_patterns(&config.include)?,
            exclude: compile_patterns(&config.exclude)?,
        })
    }

    /// Root-relative path with `/` separators, as globs see it.
    fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Returns true if `path` passes the include and exclude patterns.
    pub fn matches_patterns(&self, path: &Path) -> bool {
        let relative = self.relative_path(path);
        let included = self.include.is_empty()
            || self
                .include
                .iter()
                .any(|p| p.matches_with(&relative, MATCH_OPTIONS));
        included
            && !self
                .exclude
                .iter()
                .any(|p| p.matches_with(&relative, MATCH_OPTIONS))
    }

    /// Collect the full scan set.
    pub fn discover(&self, project: &mut Project) -> DiscoveredFiles {
        let mut files: BTreeSet<PathBuf> = walk_sources(&self.root)
            .into_iter()
            .filter(|path| self.matches_patterns(path))
            .collect();
        let matched = files.len();
        debug!(files = matched, "pattern matched files");

        let mut import_graph = ImportGraph::new();
        let mut expanded = 0;
        if let Some(api_dir) = self.config.api_routes_path() {
            import_graph = self.expand_api_directory(&normalize_path(&api_dir), project);
            let reachable = import_graph.reachable_from(&walk_sources(&api_dir));
            for path in reachable {
                if !in_ignored_dir(&self.root, &path) && files.insert(path) {
                    expanded += 1;
                }
            }
        }

        for extra in &self.config.additional_include_files {
            let path = if extra.is_absolute() {
                normalize_path(extra)
            } else {
                normalize_path(&self.root.join(extra))
            };
            if !path.is_file() || !is_supported_file(&path) {
                warn!(file = %path.display(), "skipping additional include file");
                continue;
            }
            files.insert(path);
        }

        info!(
            files = files.len(),
            matched,
            expanded,
            "file discovery finished"
        );

        DiscoveredFiles {
            files: files.into_iter().collect(),
            import_graph,
            expanded,
        }
    }

    /// Follow internal imports from every file under the API directory until closure.
    fn expand_api_directory(&self, api_dir: &Path, project: &mut Project) -> ImportGraph {
        let mut graph = ImportGraph::new();
        let mut queue: VecDeque<PathBuf> = walk_sources(api_dir).into_iter().collect();
        for path in &queue {
            graph.add_file(path);
        }
        let mut seen: BTreeSet<PathBuf> = queue.iter().cloned().collect();

        while let Some(file) = queue.pop_front() {
            let model = match project.load(&file) {
                Ok(model) => model,
                Err(e) => {
                    debug!(file = %file.display(), error = %e, "skipping unparsable file during expansion");
                    continue;
                }
            };

            for import in model.imports().iter().filter(|i| !i.is_type_only) {
                let Some(target) = project.resolver().resolve(&file, &import.module_specifier)
                else {
                    continue;
                };
                graph.add_import(&file, &target);
                if seen.insert(target.clone()) {
                    queue.push_back(target);
                }
            }
        }

        debug!(
            api_dir = %api_dir.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "api directory import graph built"
        );
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ModuleResolver;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn discover(config: &ScanConfig) -> DiscoveredFiles {
        let mut project =
            Project::new(ModuleResolver::new(&config.root_dir, &config.path_aliases)).unwrap();
        FileDiscoverer::new(config).unwrap().discover(&mut project)
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_walk_skips_ignored_and_unsupported() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/a.ts", "");
        write(dir.path(), "src/b.jsx", "");
        write(dir.path(), "src/styles.css", "");
        write(dir.path(), "node_modules/axios/index.js", "");
        write(dir.path(), "dist/bundle.js", "");
        write(dir.path(), ".git/hooks/x.js", "");

        let result = discover(&ScanConfig::new(dir.path()));
        assert_eq!(names(dir.path(), &result.files), vec!["src/a.ts", "src/b.jsx"]);
    }

    #[test]
    fn test_include_exclude_patterns() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/a.ts", "");
        write(dir.path(), "src/a.test.ts", "");
        write(dir.path(), "scripts/seed.js", "");

        let mut config = ScanConfig::new(dir.path());
        config.include = vec!["src/**/*.ts".to_string()];
        config.exclude = vec!["**/*.test.ts".to_string()];

        let result = discover(&config);
        assert_eq!(names(dir.path(), &result.files), vec!["src/a.ts"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let mut config = ScanConfig::new(".");
        config.include = vec!["src/[".to_string()];
        assert!(matches!(
            FileDiscoverer::new(&config),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_api_directory_expansion_is_transitive() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "api/users/route.ts",
            "import { db } from '@/lib/db';\nimport axios from 'axios';\nimport type { User } from '../../types';\n",
        );
        write(dir.path(), "src/lib/db.ts", "import { pool } from './pool';\n");
        write(dir.path(), "src/lib/pool.ts", "import { db } from './db';\n");
        write(dir.path(), "types.ts", "export type User = {};\n");
        write(dir.path(), "web/page.tsx", "");

        let mut config = ScanConfig::new(dir.path());
        config.include = vec!["web/**".to_string()];
        config.api_routes_dir = Some(PathBuf::from("api"));

        let result = discover(&config);
        assert_eq!(
            names(dir.path(), &result.files),
            vec![
                "api/users/route.ts",
                "src/lib/db.ts",
                "src/lib/pool.ts",
                "web/page.tsx"
            ]
        );
        assert_eq!(result.expanded, 3);
        assert_eq!(result.import_graph.edge_count(), 3);
    }

    #[test]
    fn test_additional_include_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/a.ts", "");
        write(dir.path(), "vendor/client.js", "");

        let mut config = ScanConfig::new(dir.path());
        config.include = vec!["src/**".to_string()];
        config.additional_include_files = vec![
            PathBuf::from("vendor/client.js"),
            PathBuf::from("vendor/missing.js"),
            dir.path().join("src/a.ts"),
        ];

        let result = discover(&config);
        assert_eq!(
            names(dir.path(), &result.files),
            vec!["src/a.ts", "vendor/client.js"]
        );
    }
}
