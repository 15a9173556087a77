//! Loading every target of a Cargo package into a [`SyntaxForest`].
//!
//! ## Package layout
//!
//! Starting from the requested directory, the nearest `Cargo.toml` at or
//! above it names the package. Its targets become packages of the forest:
//!
//! - `src/**/*.rs`: the library, keyed by its library name (`my_crate`)
//!   and, when different, also by the package name (`my-crate`)
//! - `tests/<stem>.rs`, `benches/<stem>.rs`: one package per file, keyed
//!   `tests/<stem>` / `benches/<stem>`
//! - `tests/<dir>/**/*.rs`: one package per subdirectory
//!
//! Dependency sources are never parsed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{CodeError, Diagnostic};
use crate::items::{ImportMap, ItemIndex};
use crate::lower::{collect_calls, LowerContext};
use crate::syntax::{Package, SourceFile, SyntaxForest};
use crate::text::LineIndex;

/// Source of package syntax for a [`crate::PackageCache`].
pub trait SourceLoader: Send + Sync {
    fn load(&self, dir: &Path) -> Result<SyntaxForest, CodeError>;
}

/// Loads packages from disk following Cargo's target layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct CargoLoader;

impl SourceLoader for CargoLoader {
    fn load(&self, dir: &Path) -> Result<SyntaxForest, CodeError> {
        let dir = dir.canonicalize().map_err(|e| CodeError::load(dir, e))?;
        let manifest_path = find_manifest(&dir)
            .ok_or_else(|| CodeError::load(&dir, "no Cargo.toml found at or above directory"))?;
        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.clone());
        let manifest = read_manifest(&manifest_path)?;
        let package_name = manifest
            .package
            .map(|p| p.name)
            .ok_or_else(|| CodeError::load(&manifest_path, "manifest has no [package] section"))?;
        let lib_name = manifest
            .lib
            .and_then(|lib| lib.name)
            .unwrap_or_else(|| package_name.replace('-', "_"));

        debug!(
            root = %root.display(),
            package = %package_name,
            "loading package syntax"
        );

        let targets = discover_targets(&root, &lib_name)?;
        let mut forest = SyntaxForest {
            root: root.clone(),
            ..SyntaxForest::default()
        };
        let mut diagnostics = Vec::new();

        for target in targets {
            let mut sources = Vec::with_capacity(target.files.len());
            for path in target.files {
                let text = fs::read_to_string(&path).map_err(|e| CodeError::load(&path, e))?;
                sources.push((path, text));
            }
            match parse_package(&target.import_path, &target.crate_name, sources) {
                Ok(package) => {
                    let package = Arc::new(package);
                    if target.import_path == lib_name && package_name != lib_name {
                        forest
                            .packages
                            .insert(package_name.clone(), Arc::clone(&package));
                    }
                    forest.packages.insert(target.import_path, package);
                }
                Err(mut errors) => diagnostics.append(&mut errors),
            }
        }

        if !diagnostics.is_empty() {
            return Err(CodeError::PackageDiagnostics { dir, diagnostics });
        }
        Ok(forest)
    }
}

// ============================================================================
// Manifest
// ============================================================================

#[derive(Debug, Deserialize)]
struct Manifest {
    package: Option<ManifestPackage>,
    lib: Option<ManifestLib>,
}

#[derive(Debug, Deserialize)]
struct ManifestPackage {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ManifestLib {
    name: Option<String>,
}

fn find_manifest(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .map(|d| d.join("Cargo.toml"))
        .find(|candidate| candidate.is_file())
}

fn read_manifest(path: &Path) -> Result<Manifest, CodeError> {
    let text = fs::read_to_string(path).map_err(|e| CodeError::load(path, e))?;
    toml::from_str(&text).map_err(|e| CodeError::load(path, e))
}

// ============================================================================
// Targets
// ============================================================================

struct Target {
    import_path: String,
    crate_name: String,
    files: Vec<PathBuf>,
}

fn discover_targets(root: &Path, lib_name: &str) -> Result<Vec<Target>, CodeError> {
    let mut targets = Vec::new();

    let src = root.join("src");
    if src.is_dir() {
        targets.push(Target {
            import_path: lib_name.to_string(),
            crate_name: lib_name.to_string(),
            files: rust_files(&src)?,
        });
    }

    for kind in ["tests", "benches"] {
        let dir = root.join(kind);
        if !dir.is_dir() {
            continue;
        }
        let mut entries: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(|e| CodeError::load(&dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        for path in entries {
            let files = if path.is_dir() {
                rust_files(&path)?
            } else if is_rust_file(&path) {
                vec![path.clone()]
            } else {
                continue;
            };
            if files.is_empty() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            targets.push(Target {
                import_path: format!("{kind}/{stem}"),
                crate_name: stem.to_string(),
                files,
            });
        }
    }

    Ok(targets)
}

fn rust_files(dir: &Path) -> Result<Vec<PathBuf>, CodeError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| CodeError::load(dir, e))?;
        if entry.file_type().is_file() && is_rust_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_rust_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rs")
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse and lower one package from in-memory sources.
///
/// `crate_name` is what `crate::` paths expand to. All syntax errors of all
/// files are returned together.
pub fn parse_package(
    import_path: &str,
    crate_name: &str,
    sources: Vec<(PathBuf, String)>,
) -> Result<Package, Vec<Diagnostic>> {
    let mut parsed = Vec::with_capacity(sources.len());
    let mut diagnostics = Vec::new();

    for (path, text) in &sources {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        match syn::parse_file(text) {
            Ok(file) => parsed.push((path, text, file)),
            Err(err) => diagnostics.extend(err.into_iter().map(|e| {
                let start = e.span().start();
                Diagnostic {
                    file: path.clone(),
                    line: start.line as u32,
                    column: start.column as u32 + 1,
                    message: e.to_string(),
                }
            })),
        }
    }
    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    let file_items: Vec<ItemIndex> = parsed
        .iter()
        .map(|(_, _, file)| ItemIndex::from_file(file))
        .collect();
    let mut items = ItemIndex::default();
    for index in &file_items {
        items.merge(index);
    }

    let files = parsed
        .iter()
        .zip(&file_items)
        .map(|((path, text, file), file_items)| {
            let source = LineIndex::new(text);
            let imports = ImportMap::from_file(file, crate_name);
            let cx = LowerContext {
                source: &source,
                file_items,
                package_items: &items,
                imports: &imports,
            };
            SourceFile {
                path: (*path).clone(),
                calls: collect_calls(file, &cx),
            }
        })
        .collect();

    Ok(Package {
        import_path: import_path.to_string(),
        name: crate_name.to_string(),
        files,
        items,
    })
}
