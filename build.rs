//! Build script for the sensor node firmware
//!
//! Handles:
//! - Memory layout configuration
//! - Linker arguments for defmt and cortex-m-rt (target builds only)

fn main() {
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    if let Ok(dir) = std::env::var("CARGO_MANIFEST_DIR") {
        println!("cargo:rustc-link-search={dir}");
    }

    // Host test builds link against std and must not see the embedded linker scripts
    if std::env::var_os("CARGO_FEATURE_EMBEDDED").is_some()
        && std::env::var("TARGET").is_ok_and(|t| t.starts_with("thumb"))
    {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }
}
