//! Tandem Chain - a dynamically reconfigurable real-time processing chain.
//!
//! Units are added, removed, reordered and bypassed from a control thread
//! while a render thread pulls audio through the chain block by block.
//!
//! # Components
//!
//! - [`UnitProcessor`] - Owns one loaded unit; load, unload, suspend, render
//! - [`negotiate`] - Fits a unit to the chain's bus layout, widening for
//!   auxiliary buses
//! - [`ProcessorChain`] - Ordered wrappers, serialized mutation, render entry
//! - [`AggregateState`] - Latency, tail, precision support and extra channels
//!   derived from the whole chain
//!
//! # Threading
//!
//! Control-path operations take one chain-wide mutex. The render path never
//! does: it reads a copy-on-write unit list and waits at most
//! [`RENDER_LOCK_WAIT`] on each unit instance, passing audio through a unit
//! still busy after that. Snapshots and parameter reads use published copies
//! and take no lock the render path needs.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tandem_chain::ProcessorChain;
//! use tandem_core::{AudioBuffer, EventBuffer};
//! use tandem_registry::UnitCatalog;
//!
//! let chain = ProcessorChain::new(Arc::new(UnitCatalog::with_builtins()));
//! chain.prepare_to_play(44100.0, 128);
//! chain.add_plugin_processor("builtin:ducker").unwrap();
//! assert_eq!(chain.extra_channels(), 2);
//!
//! let mut buf = AudioBuffer::<f64>::new(chain.buffer_channels(), 128);
//! chain.process_block_f64(&mut buf, &mut EventBuffer::new());
//! ```

pub mod aggregate;
pub mod chain;
pub mod error;
pub mod negotiate;
pub mod processor;
pub mod shared;
pub mod snapshot;
pub mod stats;

pub use aggregate::{AggregateState, UnitReport};
pub use chain::ProcessorChain;
pub use error::ChainError;
pub use negotiate::{Negotiation, extra_channels_of, negotiate};
pub use processor::{RENDER_LOCK_WAIT, UnitProcessor, instance_count, loaded_count};
pub use shared::{ChainShared, DEFAULT_SLOW_BLOCK, NegotiatedLayout, RenderSettings, WARM_UP_SAMPLES};
pub use snapshot::{ChainSnapshot, UnitSnapshot};
pub use stats::TimeStatistics;
