// If QQVGA resolution not specified, use QVGA resolution
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rustc-check-cfg=cfg(feature, values(\"qvga\"))");
    if std::env::var_os("CARGO_FEATURE_QQVGA").is_none() {
        println!("cargo:rustc-cfg=feature=\"qvga\"");
    }
}
