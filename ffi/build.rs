use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let Ok(crate_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let Some(output_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        return;
    };
    let header_path = output_dir.join("../../../bing_webmaster.h");

    // A missing header must not fail the library build.
    match cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("BING_WEBMASTER_H")
        .with_documentation(true)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(header_path);
        }
        Err(e) => println!("cargo:warning=C header not generated: {e}"),
    }
}
