//! Resolution and instantiation through the public API.

use std::sync::Arc;

use proptest::prelude::*;
use tandem_core::{AudioBuffer, BusesLayout, EventBuffer};
use tandem_registry::{IdScheme, LoaderThread, UnitCatalog, UnitDescriptor, UnitSource};

// ============================================================================
// Built-ins
// ============================================================================

#[test]
fn builtins_resolve_under_both_schemes() {
    let catalog = UnitCatalog::with_builtins();
    for desc in catalog.descriptors() {
        for scheme in [IdScheme::Native, IdScheme::Identifier] {
            let id = desc.plugin_id(scheme);
            assert_eq!(catalog.find_descriptor(&id, scheme).as_ref(), Some(&desc), "{id}");
        }
        assert_eq!(
            catalog.find_descriptor(&desc.file_or_identifier, IdScheme::Native).as_ref(),
            Some(&desc)
        );
    }
}

#[test]
fn listing_is_one_json_object_per_line() {
    let catalog = UnitCatalog::with_builtins();
    let listing: String = catalog.iter().map(|d| d.to_json_line(IdScheme::Native)).collect();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), catalog.len());
    for line in lines {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(v["type"], "Builtin");
        assert_eq!(v["company"], "Tandem");
    }
}

#[test]
fn builtins_render_their_preferred_layout() {
    let catalog = UnitCatalog::with_builtins();
    for desc in catalog.descriptors() {
        let mut unit = catalog.instantiate(&desc, 48000.0, 64).unwrap();
        let layout = unit.buses_layout();
        assert!(unit.check_buses_layout_supported(&layout), "{}", desc.name);
        unit.prepare(48000.0, 64);
        let channels = layout.total_input_channels().max(layout.total_output_channels());
        let mut buf = AudioBuffer::<f32>::new(channels, 64);
        unit.process_f32(&mut buf, &mut EventBuffer::new());
        assert_eq!(buf.peak(), 0.0, "{} made noise from silence", desc.name);
        unit.release();
    }
}

#[test]
fn only_ducker_rejects_plain_stereo() {
    let catalog = UnitCatalog::with_builtins();
    let stereo = BusesLayout::from_channel_counts(2, 2);
    for desc in catalog.descriptors() {
        let unit = catalog.instantiate(&desc, 48000.0, 64).unwrap();
        assert_eq!(unit.check_buses_layout_supported(&stereo), desc.name != "Ducker");
    }
}

#[test]
fn loader_thread_serves_catalog() {
    let loader = LoaderThread::spawn(Arc::new(UnitCatalog::with_builtins())).unwrap();
    assert_eq!(loader.descriptors().len(), 4);
    let desc = loader.find_descriptor("builtin:ducker", IdScheme::Identifier).unwrap();
    let unit = loader.instantiate(&desc, 48000.0, 64).unwrap();
    assert_eq!(unit.name(), "Ducker");
}

// ============================================================================
// Properties
// ============================================================================

fn arb_descriptor() -> impl Strategy<Value = UnitDescriptor> {
    ("[A-Za-z][A-Za-z0-9 ]{0,12}", "[A-Z0-9]{2,5}", any::<u32>(), "/[a-z]{1,8}/[a-z]{1,8}")
        .prop_map(|(name, format, uid, file)| UnitDescriptor {
            name,
            manufacturer: "Acme".to_owned(),
            format,
            category: "Fx".to_owned(),
            uid,
            version: "1".to_owned(),
            file_or_identifier: file,
            is_instrument: false,
        })
}

proptest! {
    #[test]
    fn registered_descriptor_resolves_by_own_id(desc in arb_descriptor(), native in any::<bool>()) {
        let scheme = if native { IdScheme::Native } else { IdScheme::Identifier };
        let mut catalog = UnitCatalog::new();
        catalog.register_descriptor(desc.clone());
        prop_assert_eq!(catalog.get(&desc.plugin_id(scheme), scheme), Some(&desc));
        prop_assert_eq!(catalog.get(&desc.identifier_string(), scheme), Some(&desc));
    }
}
