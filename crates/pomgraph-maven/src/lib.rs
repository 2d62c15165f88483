//! Maven repository protocol: repository negotiation and authentication,
//! memory of unproductive endpoints, descriptor download, POM parsing and
//! Gradle module metadata.

pub mod auth;
pub mod download;
pub mod module;
pub mod negotiate;
pub mod pom;
pub mod repository;
pub mod unresolvable;
