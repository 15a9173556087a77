//! Warming the global package cache from suite setup.

use std::fs;
use std::panic::catch_unwind;

use assertive::code::PackageCache;
use assertive::init_package_cache;
use tempfile::TempDir;

fn fixture_package() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(
        dir.path().join("Cargo.toml"),
        "[package]\nname = \"fixture-pkg\"\nversion = \"0.1.0\"\n",
    )
    .expect("write manifest");
    fs::create_dir(dir.path().join("src")).expect("create src");
    fs::write(
        dir.path().join("src/lib.rs"),
        "pub fn ready() -> bool {\n    check(true)\n}\n",
    )
    .expect("write lib.rs");
    dir
}

#[test]
fn init_loads_the_package() {
    let dir = fixture_package();
    let src = dir.path().join("src");
    init_package_cache(&src);

    let cache = PackageCache::global();
    assert!(cache.contains(&src));

    let forest = cache.get(&src).expect("cached forest");
    let lib = forest.package("fixture_pkg").expect("lib package");
    assert!(std::sync::Arc::ptr_eq(
        lib,
        forest.package("fixture-pkg").expect("package name alias")
    ));
}

#[test]
fn init_panics_on_unloadable_packages() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let missing = dir.path().join("not-there");
    let result = catch_unwind(|| init_package_cache(&missing));
    assert!(result.is_err());
    assert!(!PackageCache::global().contains(&missing));
}
