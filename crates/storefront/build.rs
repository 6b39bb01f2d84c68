//! Build script for storefront crate.
//!
//! Generates content-based hashes for static assets (CSS and the player
//! script) so they can be served with immutable caching.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    hash_asset("css", "main", "CSS_HASH");
    hash_asset("js", "player", "JS_HASH");
}

/// Hash `static/{kind}/{stem}.{kind}` and copy it to
/// `static/{kind}/derived/{stem}.{hash}.{kind}`.
///
/// Sets `env_var` for use with `env!(...)`.
fn hash_asset(kind: &str, stem: &str, env_var: &str) {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let asset_dir = Path::new(&manifest_dir).join("static").join(kind);
    let source = asset_dir.join(format!("{stem}.{kind}"));

    println!("cargo:rerun-if-changed={}", source.display());

    let content = match fs::read(&source) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", source.display());
            println!("cargo:rustc-env={env_var}=");
            return;
        }
    };

    // First 8 chars of SHA256
    let hash = format!("{:x}", Sha256::digest(&content));
    let short_hash = &hash[..8];

    println!("cargo:rustc-env={env_var}={short_hash}");

    let derived_dir = asset_dir.join("derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived asset directory");

    let derived_path = derived_dir.join(format!("{stem}.{short_hash}.{kind}"));
    fs::copy(&source, &derived_path).expect("Failed to copy asset to derived directory");
}
