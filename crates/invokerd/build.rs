//! Build script: compile the native module fixtures exercised by the loader
//! tests.
//!
//! The fixtures are plain `cdylib` builds of `tests/fixtures/native_module.rs`
//! made with the same `rustc` and target as the crate. Their directory is
//! exported as `INVOKERD_NATIVE_FIXTURES`. A failed fixture build only warns;
//! the tests that need the libraries report the missing directory.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::{env, fs};

const FIXTURE_SOURCE: &str = "tests/fixtures/native_module.rs";
const FIXTURE_DIR_VARIABLE: &str = "INVOKERD_NATIVE_FIXTURES";

/// Library stem and the `--cfg` flag selecting its variant.
const VARIANTS: [(&str, Option<&str>); 3] = [
    ("fixture_modules", None),
    ("fixture_abi_mismatch", Some("abi_mismatch")),
    ("fixture_null_table", Some("null_table")),
];

fn library_extension() -> &'static str {
    match env::var("CARGO_CFG_TARGET_OS").as_deref() {
        Ok("windows") => "dll",
        Ok("macos" | "ios") => "dylib",
        _ => "so",
    }
}

fn compile_variant(
    rustc: &str,
    source: &Path,
    fixture_dir: &Path,
    stem: &str,
    cfg: Option<&str>,
) -> Result<(), String> {
    let output = fixture_dir.join(format!("{stem}.{}", library_extension()));
    let mut command = Command::new(rustc);
    command
        .arg("--edition=2024")
        .arg("--crate-type=cdylib")
        .arg("--crate-name")
        .arg(stem)
        .arg("--cap-lints=allow")
        .arg("-o")
        .arg(&output);
    if let Ok(target) = env::var("TARGET") {
        command.arg("--target").arg(target);
    }
    if let Some(cfg) = cfg {
        command.arg("--cfg").arg(cfg);
    }
    command.arg(source);

    let result = command
        .output()
        .map_err(|error| format!("failed to run {rustc}: {error}"))?;
    if result.status.success() {
        Ok(())
    } else {
        Err(format!(
            "rustc exited with {} while building {stem}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        ))
    }
}

fn build_fixtures() -> Result<PathBuf, String> {
    let manifest_dir =
        env::var_os("CARGO_MANIFEST_DIR").ok_or("CARGO_MANIFEST_DIR is not set")?;
    let out_dir = env::var_os("OUT_DIR").ok_or("OUT_DIR is not set")?;
    let rustc = env::var("RUSTC").unwrap_or_else(|_| String::from("rustc"));

    let source = PathBuf::from(manifest_dir).join(FIXTURE_SOURCE);
    let fixture_dir = PathBuf::from(out_dir).join("native-fixtures");
    fs::create_dir_all(&fixture_dir)
        .map_err(|error| format!("failed to create {}: {error}", fixture_dir.display()))?;

    for (stem, cfg) in VARIANTS {
        compile_variant(&rustc, &source, &fixture_dir, stem, cfg)?;
    }
    Ok(fixture_dir)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={FIXTURE_SOURCE}");

    match build_fixtures() {
        Ok(dir) => println!("cargo:rustc-env={FIXTURE_DIR_VARIABLE}={}", dir.display()),
        Err(error) => println!("cargo:warning=native module fixtures unavailable: {error}"),
    }
}
