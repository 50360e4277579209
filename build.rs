// Stages the demo page in `dist/` and, when targeting wasm32, packs the
// bundle into `dist/pkg/` next to it.
use std::process::Command;
use std::{env, fs, path::Path};

use fs_extra::dir::{copy, CopyOptions};

// Set on the nested wasm-pack run so it does not recurse into itself.
const NESTED: &str = "HERO_FX_NESTED_PACK";

fn main() {
    println!("cargo:rerun-if-changed=static");
    println!("cargo:rerun-if-changed=build.rs");

    if env::var_os(NESTED).is_some() {
        return;
    }

    let out_dir = Path::new("dist");
    if out_dir.exists() {
        fs::remove_dir_all(out_dir).ok();
    }
    if let Err(err) = fs::create_dir_all(out_dir) {
        println!("cargo:warning=cannot create dist/: {err}");
        return;
    }

    let static_dir = Path::new("static");
    if static_dir.exists() {
        let options = CopyOptions {
            overwrite: true,
            content_only: true,
            ..CopyOptions::new()
        };
        if let Err(err) = copy(static_dir, out_dir, &options) {
            println!("cargo:warning=copying static/ failed: {err}");
        }
    }

    let target = env::var("TARGET").unwrap_or_default();
    if target == "wasm32-unknown-unknown" {
        let status = Command::new("wasm-pack")
            .args(["build", "--release", "--target", "web", "--out-dir", "dist/pkg"])
            .env(NESTED, "1")
            .status();

        match status {
            Ok(st) if !st.success() => println!("cargo:warning=wasm-pack build failed"),
            Ok(_) => {}
            Err(_) => println!("cargo:warning=wasm-pack not installed, skipping bundle"),
        }
    }
}
