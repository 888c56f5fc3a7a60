use std::{env, path::PathBuf};
use walkdir::WalkDir;

fn main() {
    println!("cargo:rustc-check-cfg=cfg(lnrpc_generated)");
    println!("cargo:rerun-if-env-changed=LND_TAG");

    // Generate lnrpc from protos/lnd/<tag>/lightning.proto when present. Without it the
    // checked-in subset in src/proto.rs is used.
    let protos_root = PathBuf::from("protos/lnd");
    println!("cargo:rerun-if-changed={}", protos_root.display());

    let tag = env::var("LND_TAG").ok().or_else(|| {
        let mut dirs: Vec<String> = WalkDir::new(&protos_root)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path() != protos_root && e.file_type().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        dirs.sort();
        dirs.pop()
    });
    let Some(tag) = tag else {
        return;
    };

    let proto_dir = protos_root.join(&tag);
    let proto_file = proto_dir.join("lightning.proto");
    if !proto_file.exists() {
        println!(
            "cargo:warning=Expected {} but it was not found. Using checked-in lnrpc.",
            proto_file.display()
        );
        return;
    }
    let Some(out_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        return;
    };

    let serde_attr = "#[derive(serde::Serialize, serde::Deserialize)]";
    let res = tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .out_dir(&out_dir)
        .type_attribute(".lnrpc", serde_attr)
        .compile_protos(&[proto_file], &[proto_dir]);
    match res {
        Ok(()) => println!("cargo:rustc-cfg=lnrpc_generated"),
        Err(e) => println!("cargo:warning=proto compile failed, using checked-in lnrpc: {e}"),
    }
}
