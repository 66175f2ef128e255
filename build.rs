//! Build script for apo-provision
//!
//! Embeds the Windows application manifest that requests elevation, since the
//! installer and `config.txt` both live under Program Files.

fn main() {
    // Only run on Windows
    if std::env::var("CARGO_CFG_TARGET_OS").map_or(true, |os| os != "windows") {
        return;
    }

    // Only the binary gets the manifest; test harnesses stay asInvoker
    embed_resource::compile_for("resources/app.rc", ["apo-provision"], embed_resource::NONE)
        .manifest_required()
        .unwrap_or_else(|e| panic!("Failed to embed elevation manifest: {e}"));

    println!("cargo:rerun-if-changed=resources/app.rc");
    println!("cargo:rerun-if-changed=resources/app.manifest");
}
