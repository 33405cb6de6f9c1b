//! Adapters for key resolution.

pub mod did_web;
pub mod static_keys;

pub use did_web::DidWebKeyResolver;
pub use static_keys::StaticKeyResolver;
