use brim_core::{NodeKind, testing::check_descriptions};
use brim_models::default_registry;
use integration_tests::assembled;

#[test]
fn every_registered_type_describes_its_symbols() {
    let registry = default_registry().unwrap();
    for entry in registry.entries() {
        let node = assembled(entry).unwrap();
        assert_eq!(node.kind(), entry.kind());
        let missing = check_descriptions(&node).unwrap();
        assert!(
            missing.is_empty(),
            "{} has undescribed symbols: {missing:?}",
            entry.type_name()
        );
    }
}

#[test]
fn registry_partitions_cover_every_entry() {
    let registry = default_registry().unwrap();
    let kinds = [NodeKind::Model, NodeKind::Connection, NodeKind::LoadGroup];
    let partitions = [
        registry.models(),
        registry.connections(),
        registry.load_groups(),
    ];
    for (kind, entries) in kinds.iter().zip(&partitions) {
        assert!(entries.iter().all(|e| e.kind() == *kind));
    }
    let total: usize = partitions.iter().map(Vec::len).sum();
    assert_eq!(total, registry.entries().len());
}
