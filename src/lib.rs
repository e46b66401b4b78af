//! A Rust library for inspecting NSO executables and generating IPS patches
//! that replace a single call site in their text segment.
pub mod arm64;
pub mod error;
pub mod ext;
pub mod ips;
pub mod nso;
pub mod patcher;
pub mod types;
pub mod utils;
