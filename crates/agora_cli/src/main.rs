//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `agora_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Tiny probe so core crate wiring can be checked without standing up
    // the request-handling layer.
    println!("agora_core ping={}", agora_core::ping());
    println!("agora_core version={}", agora_core::core_version());
}
