// Build script for netmigctl - embeds version at compile time

fn main() {
    // Release pipelines set NETMIG_VERSION; local builds use Cargo.toml
    let version =
        std::env::var("NETMIG_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=NETMIG_VERSION={}", version);

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=NETMIG_VERSION");
}
