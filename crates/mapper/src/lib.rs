//! confetti-mapper: map Confetti directive trees onto typed Rust values.
//!
//! A type opts in by implementing [`Configurable`]: it derives
//! `serde::Deserialize` and supplies a [`Descriptor`] listing the
//! directives it recognizes and what each holds.
//!
//! ```
//! use std::sync::{Arc, OnceLock};
//! use confetti_mapper::{Configurable, Descriptor, Field};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Server {
//!     host: String,
//!     #[serde(default)]
//!     port: u16,
//! }
//!
//! impl Configurable for Server {
//!     fn descriptor() -> Arc<Descriptor> {
//!         static CELL: OnceLock<Arc<Descriptor>> = OnceLock::new();
//!         Descriptor::cached(&CELL, || {
//!             Descriptor::new("server")
//!                 .field(Field::string("host").required())
//!                 .field(Field::integer("port"))
//!         })
//!     }
//! }
//!
//! let server: Server = confetti_mapper::from_str("server { host example.com; port 80 }").unwrap();
//! assert_eq!(server.host, "example.com");
//! assert_eq!(server.port, 80);
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;

pub mod descriptor;
pub mod error;
pub mod mapper;

pub use descriptor::{Descriptor, DescriptorFn, EnumDescriptor, Field, ScalarKind, Shape};
pub use error::MappingError;
pub use mapper::{from_root, from_str, from_str_with, map, map_block, map_value, MapOptions};

/// A type that can be populated from a directive block.
pub trait Configurable: DeserializeOwned {
    /// The type's mapping descriptor. Implementations should build it once
    /// (see [`Descriptor::cached`]).
    fn descriptor() -> Arc<Descriptor>;
}

/// Failure of a parse-then-map call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] confetti_core::ParseError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}
