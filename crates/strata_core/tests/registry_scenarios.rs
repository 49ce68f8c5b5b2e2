//! # Registry Scenario Tests
//!
//! End-to-end component lifecycles through the public API: attach, fetch,
//! remove, group promotion and demotion, compaction, hierarchy.
//!
//! Run with: cargo test --package strata_core --test registry_scenarios

use bytemuck::{Pod, Zeroable};
use strata_core::{
    Component, ComponentState, Health, Position, Registry, RegistryConfig, StrataError, Velocity,
};

/// A wider, oddly sized payload to exercise unaligned packing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Tint {
    rgb: [u8; 3],
}

impl Component for Tint {
    const NAME: &'static str = "Tint";
}

/// Zero-size tag component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
struct Marker;

impl Component for Marker {
    const NAME: &'static str = "Marker";
}

#[test]
fn test_position_lifecycle() {
    let mut registry = Registry::new();
    let e1 = registry.create_entity();

    registry.add_component(e1, Position::new(1.0, 2.0));
    assert!(registry.contains::<Position>(e1));
    assert_eq!(registry.component::<Position>(e1), Position::new(1.0, 2.0));

    registry.destroy_component::<Position>(e1);
    assert!(!registry.contains::<Position>(e1));
    assert_eq!(
        registry.try_component::<Position>(e1),
        Err(StrataError::MissingComponent {
            entity: e1,
            component: "Position"
        })
    );
}

#[test]
#[should_panic(expected = "has no Position component")]
fn test_fetch_after_removal_is_fatal() {
    let mut registry = Registry::new();
    let e1 = registry.create_entity();
    registry.add_component(e1, Position::new(1.0, 2.0));
    registry.destroy_component::<Position>(e1);

    let _ = registry.component::<Position>(e1);
}

#[test]
#[should_panic(expected = "already has a Health component")]
fn test_second_component_of_type_is_fatal() {
    let mut registry = Registry::new();
    let e = registry.create_entity();
    registry.add_component(e, Health::full(1));
    registry.add_component(e, Health::full(2));
}

#[test]
#[should_panic(expected = "does not exist")]
fn test_add_to_destroyed_entity_is_fatal() {
    let mut registry = Registry::new();
    let e = registry.create_entity();
    registry.destroy_entity(e);
    registry.add_component(e, Health::full(1));
}

#[test]
fn test_promotion_happens_exactly_when_set_completes() {
    let mut registry = Registry::new();
    let group = registry.declare_group::<(Position, Velocity)>();
    let e = registry.create_entity();

    registry.add_component(e, Position::new(3.0, 4.0));
    assert!(registry.contains::<Position>(e));
    assert_eq!(registry.component_state::<Position>(e), ComponentState::Pooled);
    assert_eq!(registry.group(group).unwrap().len(), 0);

    registry.add_component(e, Velocity::new(1.0, 0.0));
    assert!(registry.contains::<Position>(e));
    assert!(registry.contains::<Velocity>(e));
    assert_eq!(registry.component_state::<Position>(e), ComponentState::Grouped(group));
    assert_eq!(registry.component_state::<Velocity>(e), ComponentState::Grouped(group));
    assert_eq!(registry.stats().pooled, 0);
    assert_eq!(registry.stats().grouped, 2);

    // The row is Position then Velocity, packed back to back.
    let mut expected = bytemuck::bytes_of(&Position::new(3.0, 4.0)).to_vec();
    expected.extend_from_slice(bytemuck::bytes_of(&Velocity::new(1.0, 0.0)));
    assert_eq!(registry.group(group).unwrap().row(e).unwrap(), expected.as_slice());

    registry.destroy_component::<Velocity>(e);
    assert!(registry.contains::<Position>(e));
    assert!(!registry.contains::<Velocity>(e));
    assert_eq!(registry.component_state::<Position>(e), ComponentState::Pooled);
    assert_eq!(registry.component::<Position>(e), Position::new(3.0, 4.0));
    assert!(registry.group(group).unwrap().is_empty());
}

#[test]
fn test_ungrouped_types_stay_pooled_next_to_a_group() {
    let mut registry = Registry::new();
    let group = registry.declare_group::<(Position, Velocity)>();
    let e = registry.create_entity();
    registry.add_component(e, Health::full(9));
    registry.add_component(e, Position::default());
    registry.add_component(e, Velocity::default());

    assert_eq!(registry.component_state::<Health>(e), ComponentState::Pooled);
    assert_eq!(registry.component_state::<Position>(e), ComponentState::Grouped(group));

    // Removing the pooled extra leaves the row alone.
    assert_eq!(registry.remove_component::<Health>(e), Health::full(9));
    assert_eq!(registry.component_state::<Position>(e), ComponentState::Grouped(group));
}

#[test]
fn test_unaligned_component_in_group_row() {
    let mut registry = Registry::new();
    let group = registry.declare_group::<(Tint, Position)>();
    let entities: Vec<_> = (0..32u8)
        .map(|i| {
            let e = registry.create_entity();
            registry.add_component(e, Tint { rgb: [i, i, i] });
            registry.add_component(e, Position::new(f32::from(i), -f32::from(i)));
            e
        })
        .collect();

    assert_eq!(registry.group(group).unwrap().len(), 32);
    assert_eq!(registry.group(group).unwrap().raw().len(), 32 * 11);
    for (i, e) in entities.iter().enumerate() {
        let i = i as u8;
        let (tint, position) = registry.components::<(Tint, Position)>(*e);
        assert_eq!(tint.rgb, [i, i, i]);
        assert_eq!(position, Position::new(f32::from(i), -f32::from(i)));
    }
}

#[test]
fn test_group_compaction_keeps_handles_valid() {
    let config = RegistryConfig::from_toml_str(
        r#"
        group_initial_records = 4
        group_fragmentation_threshold = 0.05
        "#,
    )
    .unwrap();
    let mut registry = Registry::with_config(config).unwrap();
    let group = registry.declare_group::<(Position, Health)>();

    let entities: Vec<_> = (0..40u32)
        .map(|i| {
            let e = registry.create_entity();
            registry.add_component(e, Position::new(i as f32, 0.0));
            registry.add_component(e, Health::full(i));
            e
        })
        .collect();

    for e in entities.iter().step_by(3) {
        registry.destroy_entity(*e);
    }

    let stats = registry.group(group).unwrap().stats();
    assert!(stats.fragmentation() <= 0.05);
    for (i, e) in entities.iter().enumerate() {
        if i % 3 == 0 {
            assert!(!registry.is_alive(*e));
            continue;
        }
        let handle = registry.handle::<Health>(*e);
        let location = handle.location().unwrap();
        let row = registry.group(group).unwrap().raw();
        let bytes = &row[location.range()];
        assert_eq!(
            bytemuck::pod_read_unaligned::<Health>(bytes),
            Health::full(i as u32)
        );
    }
}

#[test]
fn test_explicit_defragment_reclaims_everything() {
    let mut registry = Registry::new();
    let entities: Vec<_> = (0..50u32)
        .map(|i| {
            let e = registry.create_entity();
            registry.add_component(e, Health::full(i));
            e
        })
        .collect();
    registry.destroy_entity(entities[0]);
    registry.destroy_entity(entities[10]);

    registry.defragment();

    let stats = registry.stats();
    assert_eq!(stats.pool.hole_bytes, 0);
    assert_eq!(stats.pool.used, stats.pool.live_bytes);
    assert_eq!(stats.pool.live_bytes, 48 * 8);
    assert_eq!(registry.component::<Health>(entities[49]), Health::full(49));
}

#[test]
fn test_destroying_parent_keeps_children() {
    let mut registry = Registry::new();
    let root = registry.create_named_entity("root");
    let left = registry.create_named_entity("left");
    let right = registry.create_named_entity("right");
    registry.add_child(root, left);
    registry.add_child(root, right);
    registry.add_component(left, Position::new(1.0, 0.0));

    let mut children: Vec<_> = registry.children(root).collect();
    children.sort();
    let mut expected = vec![left, right];
    expected.sort();
    assert_eq!(children, expected);

    registry.destroy_entity(root);

    assert!(registry.is_alive(left));
    assert!(registry.is_alive(right));
    assert_eq!(registry.parent(left), None);
    assert_eq!(registry.entity(left).unwrap().name(), Some("left"));
    assert_eq!(registry.component::<Position>(left), Position::new(1.0, 0.0));
}

#[test]
fn test_destroying_child_unlinks_from_parent() {
    let mut registry = Registry::new();
    let parent = registry.create_entity();
    let child = registry.create_entity();
    registry.add_child(parent, child);

    registry.destroy_entity(child);

    assert_eq!(registry.children(parent).count(), 0);
}

#[test]
fn test_late_group_declaration_migrates_population() {
    let mut registry = Registry::new();
    let mut full = Vec::new();
    for i in 0..20u32 {
        let e = registry.create_entity();
        registry.add_component(e, Position::new(i as f32, 0.0));
        if i % 2 == 0 {
            registry.add_component(e, Health::full(i));
            full.push(e);
        }
    }

    let group = registry.declare_group::<(Health, Position)>();

    assert_eq!(registry.group(group).unwrap().len(), full.len());
    for e in &full {
        assert_eq!(registry.component_state::<Health>(*e), ComponentState::Grouped(group));
    }
    assert_eq!(registry.stats().pooled, 10);
}

#[test]
fn test_marker_survives_removal_of_its_pool_neighbour() {
    let mut registry = Registry::new();
    let a = registry.create_entity();
    let b = registry.create_entity();
    registry.add_component(a, Health::full(3));
    registry.add_component(b, Marker);

    registry.destroy_component::<Health>(a);

    assert!(registry.contains::<Marker>(b));
    assert_eq!(registry.try_component::<Marker>(b), Ok(Marker));
    assert_eq!(registry.stats().pool.used, 0);

    registry.add_component(a, Tint { rgb: [1, 2, 3] });
    assert_eq!(registry.component::<Marker>(b), Marker);
    assert_eq!(registry.remove_component::<Marker>(b), Marker);
    assert_eq!(registry.component::<Tint>(a), Tint { rgb: [1, 2, 3] });
}

#[test]
fn test_marker_in_group_is_demoted_intact() {
    let mut registry = Registry::new();
    let group = registry.declare_group::<(Position, Marker)>();
    let e = registry.create_entity();
    registry.add_component(e, Marker);
    registry.add_component(e, Position::new(4.0, 5.0));
    assert_eq!(registry.component_state::<Marker>(e), ComponentState::Grouped(group));

    registry.destroy_component::<Position>(e);
    assert_eq!(registry.component_state::<Marker>(e), ComponentState::Pooled);
    assert_eq!(registry.component::<Marker>(e), Marker);

    registry.defragment();
    assert_eq!(registry.component::<Marker>(e), Marker);
}

#[test]
fn test_tail_removal_above_a_hole_keeps_lower_values() {
    let mut registry = Registry::new();
    let ids: Vec<_> = (0..3u32)
        .map(|i| {
            let e = registry.create_entity();
            registry.add_component(e, Health::full(i + 10));
            e
        })
        .collect();

    registry.destroy_component::<Health>(ids[1]);
    registry.destroy_component::<Health>(ids[2]);

    let pool = registry.stats().pool;
    assert_eq!(pool.records, 1);
    assert_eq!(pool.used, pool.live_bytes + pool.hole_bytes);
    assert_eq!(registry.component::<Health>(ids[0]), Health::full(10));

    registry.add_component(ids[2], Health::full(42));
    assert_eq!(registry.component::<Health>(ids[2]), Health::full(42));
    assert_eq!(registry.component::<Health>(ids[0]), Health::full(10));
}
