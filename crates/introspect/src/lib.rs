//! Remote schema introspection.
//!
//! Sends the standard introspection query to a GraphQL endpoint and renders
//! the answer as SDL so it can be built into a schema like any on-disk
//! type definitions.
//!
//! ```no_run
//! use graphql_introspect::{introspection_to_sdl, IntrospectionClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = IntrospectionClient::new()
//!     .fetch_schema("https://api.example.com/graphql")
//!     .await?;
//! let sdl = introspection_to_sdl(&schema);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod query;
mod sdl;
mod types;

pub use client::IntrospectionClient;
pub use error::{IntrospectionError, Result};
pub use query::{introspection_request_body, INTROSPECTION_QUERY};
pub use sdl::{introspection_to_sdl, BUILTIN_DIRECTIVES};
pub use types::*;
