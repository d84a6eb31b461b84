//! Portal API collaborators

pub mod client;
pub mod endpoints;
pub mod jar;

pub use client::{AuthApi, HttpAuthApi};
pub use jar::SessionJar;
