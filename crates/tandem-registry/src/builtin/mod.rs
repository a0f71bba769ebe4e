//! Built-in reference units.
//!
//! Small, dependency-free units that exercise every capability the chain
//! negotiates: parameters ([`Gain`]), reported latency ([`Lookahead`]), tail
//! time without double-precision support ([`Echo`]) and an auxiliary
//! sidechain bus ([`Ducker`]).
//!
//! Their file identifiers are `builtin:<key>`, so `builtin:gain` resolves
//! under either id scheme.

mod ducker;
mod echo;
mod gain;
mod lookahead;

pub use ducker::Ducker;
pub use echo::Echo;
pub use gain::Gain;
pub use lookahead::Lookahead;

use crate::catalog::UnitCatalog;
use crate::descriptor::UnitDescriptor;
use tandem_core::{BusesLayout, ChannelSet, ParamDescriptor};

/// Format name of built-in units.
pub const BUILTIN_FORMAT: &str = "Builtin";

fn descriptor(key: &str, name: &str, category: &str, uid: u32) -> UnitDescriptor {
    UnitDescriptor {
        name: name.to_owned(),
        manufacturer: "Tandem".to_owned(),
        format: BUILTIN_FORMAT.to_owned(),
        category: category.to_owned(),
        uid,
        version: env!("CARGO_PKG_VERSION").to_owned(),
        file_or_identifier: format!("builtin:{key}"),
        is_instrument: false,
    }
}

pub(crate) fn register_all(catalog: &mut UnitCatalog) {
    catalog.register(descriptor("gain", "Gain", "Utility", 0x1001), |_, _| {
        Ok(Box::new(Gain::new()))
    });
    catalog.register(
        descriptor("lookahead", "Lookahead", "Utility", 0x1002),
        |sr, _| Ok(Box::new(Lookahead::new(sr))),
    );
    catalog.register(descriptor("echo", "Echo", "Delay", 0x1003), |sr, _| {
        Ok(Box::new(Echo::new(sr)))
    });
    catalog.register(descriptor("ducker", "Ducker", "Dynamics", 0x1004), |sr, _| {
        Ok(Box::new(Ducker::new(sr)))
    });
}

/// Main input equals main output, mono or stereo, no auxiliary buses.
fn is_plain_effect_layout(layout: &BusesLayout) -> bool {
    matches!(
        layout.main_input(),
        Some(ChannelSet::Mono | ChannelSet::Stereo)
    ) && layout.main_input() == layout.main_output()
        && layout.aux_inputs().is_empty()
        && layout.aux_outputs().is_empty()
}

/// Parameter values as little-endian `f32`s.
fn encode_params(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Restore values written by [`encode_params`], clamped to their
/// descriptors. Blobs of the wrong length are ignored.
fn decode_params(data: &[u8], descriptors: &[ParamDescriptor], values: &mut [f32]) -> bool {
    if data.len() != values.len() * 4 {
        tracing::warn!(
            "builtin: ignoring state of {} bytes, expected {}",
            data.len(),
            values.len() * 4
        );
        return false;
    }
    for ((chunk, value), desc) in data.chunks_exact(4).zip(values.iter_mut()).zip(descriptors) {
        let bytes = [chunk[0], chunk[1], chunk[2], chunk[3]];
        *value = desc.clamp(f32::from_le_bytes(bytes));
    }
    true
}
