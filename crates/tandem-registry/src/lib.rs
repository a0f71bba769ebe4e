//! Unit catalog and instantiation for tandem chains.
//!
//! A chain refers to units by string id. This crate turns an id into a
//! [`UnitDescriptor`] and a descriptor into a live
//! [`ProcessingUnit`](tandem_core::ProcessingUnit) instance.
//!
//! # Features
//!
//! - **Id schemes**: [`IdScheme::Native`] (`format-name-uid`) or
//!   [`IdScheme::Identifier`], selected host-wide
//! - **Resolution**: exact id, then alternate identifier, then file path
//! - **Loader thread**: [`LoaderThread`] runs every instantiation on one
//!   designated thread
//! - **Built-in units**: `gain`, `lookahead`, `echo`, `ducker`
//!
//! # Example
//!
//! ```rust
//! use tandem_registry::{IdScheme, UnitCatalog, UnitSource};
//!
//! let catalog = UnitCatalog::with_builtins();
//! for desc in catalog.iter() {
//!     print!("{}", desc.to_json_line(IdScheme::Native));
//! }
//!
//! let desc = catalog.find_descriptor("Builtin-Echo-1003", IdScheme::Native).unwrap();
//! let echo = catalog.instantiate(&desc, 44100.0, 256).unwrap();
//! assert!(echo.tail_seconds() > 0.0);
//! ```

pub mod builtin;
pub mod catalog;
pub mod descriptor;
pub mod loader;

pub use catalog::{BoxedUnit, UnitCatalog, UnitFactory, UnitSource};
pub use descriptor::{IdScheme, UnitDescriptor};
pub use loader::LoaderThread;
