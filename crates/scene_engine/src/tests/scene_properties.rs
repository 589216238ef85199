//! Scene graph properties over random operation sequences

use crate::foundation::math::Vec3;
use crate::scene::{EntityId, EntityKind, Scene, SceneError};
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vec(rng: &mut StdRng, range: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
        rng.gen_range(-range..range),
    )
}

/// Apply one random local mutation to `id`
fn mutate(scene: &mut Scene, rng: &mut StdRng, id: EntityId) {
    match rng.gen_range(0..4) {
        0 => scene.translate(id, random_vec(rng, 3.0)),
        1 => scene.rotate(id, rng.gen_range(-3.0..3.0), random_vec(rng, 1.0)),
        2 => scene.scale(id, Vec3::new(rng.gen_range(0.5..1.5), rng.gen_range(0.5..1.5), 1.0)),
        _ => scene.reposition(id, random_vec(rng, 5.0)),
    }
    .unwrap();
}

#[test]
fn test_root_world_equals_local() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut scene = Scene::with_capacity(1);
    let root = scene.create_entity("root", None, EntityKind::Default).unwrap();

    for _ in 0..200 {
        mutate(&mut scene, &mut rng, root);
        let local = scene.entity(root).unwrap().transform().local_transform();
        let world = scene.world_transform(root).unwrap();
        assert_relative_eq!(world.position, local.position, epsilon = 1e-5);
        assert_relative_eq!(world.rotation, local.rotation, epsilon = 1e-5);
        assert_relative_eq!(world.scale, local.scale, epsilon = 1e-5);
    }
}

#[test]
fn test_child_position_is_parent_plus_local() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut scene = Scene::with_capacity(4);
    let chain: Vec<EntityId> = ["a", "b", "c", "d"]
        .iter()
        .enumerate()
        .map(|(depth, name)| {
            let parent = depth.checked_sub(1).map(|p| ["a", "b", "c", "d"][p]);
            scene.create_entity(name, parent, EntityKind::Default).unwrap()
        })
        .collect();

    for _ in 0..200 {
        let target = chain[rng.gen_range(0..chain.len())];
        mutate(&mut scene, &mut rng, target);

        // Read leaf first so laziness has to walk the whole chain
        let reads: Vec<Vec3> = chain.iter().rev().map(|&id| scene.world_position(id).unwrap()).collect();
        let reads: Vec<Vec3> = reads.into_iter().rev().collect();
        for depth in 1..chain.len() {
            let local = scene.entity(chain[depth]).unwrap().transform().local_position();
            assert_relative_eq!(reads[depth], reads[depth - 1] + local, epsilon = 1e-4);
        }
    }
}

#[test]
fn test_clean_node_implies_clean_ancestors() {
    let mut rng = StdRng::seed_from_u64(13);
    let mut scene = Scene::with_capacity(6);
    let names = ["r", "a", "b", "a1", "a2", "b1"];
    let parents = [None, Some("r"), Some("r"), Some("a"), Some("a"), Some("b")];
    let ids: Vec<EntityId> = names
        .iter()
        .zip(parents)
        .map(|(name, parent)| scene.create_entity(name, parent, EntityKind::Default).unwrap())
        .collect();

    for _ in 0..300 {
        if rng.gen_bool(0.5) {
            let target = ids[rng.gen_range(0..ids.len())];
            mutate(&mut scene, &mut rng, target);
        } else {
            scene.world_transform(ids[rng.gen_range(0..ids.len())]);
        }
        for &id in &ids {
            let dirty = scene.entity(id).unwrap().transform().is_dirty();
            if let Some(parent) = scene.parent(id) {
                let parent_dirty = scene.entity(parent).unwrap().transform().is_dirty();
                assert!(!parent_dirty || dirty, "dirty parent with clean child");
            }
        }
    }
}

#[test]
fn test_creation_never_exceeds_capacity() {
    let mut rng = StdRng::seed_from_u64(14);
    let capacity = 16;
    let mut scene = Scene::with_capacity(capacity);
    let mut created: Vec<String> = Vec::new();
    let mut successes = 0;

    for attempt in 0..100 {
        // Mix fresh names, duplicates and dangling parents
        let name = if !created.is_empty() && rng.gen_bool(0.2) {
            created[rng.gen_range(0..created.len())].clone()
        } else {
            format!("e{}", attempt)
        };
        let parent = match rng.gen_range(0..3) {
            0 => None,
            1 if !created.is_empty() => Some(created[rng.gen_range(0..created.len())].clone()),
            _ => Some("ghost".to_string()),
        };

        let duplicate = created.contains(&name);
        let dangling = parent.as_deref() == Some("ghost");
        match scene.create_entity(&name, parent.as_deref(), EntityKind::Default) {
            Ok(_) => {
                assert!(!duplicate && !dangling);
                created.push(name);
                successes += 1;
            }
            Err(SceneError::DuplicateId(_)) => assert!(duplicate),
            Err(SceneError::UnknownParent(_)) => assert!(dangling),
            Err(SceneError::CapacityExhausted { .. }) => assert_eq!(successes, capacity),
            Err(other) => panic!("unexpected error {other}"),
        }
    }
    assert!(successes <= capacity);
    assert_eq!(scene.len(), successes);
}

#[test]
fn test_reposition_is_exact() {
    let mut rng = StdRng::seed_from_u64(15);
    let mut scene = Scene::with_capacity(1);
    let id = scene.create_entity("e", None, EntityKind::Default).unwrap();
    for _ in 0..50 {
        mutate(&mut scene, &mut rng, id);
        let target = random_vec(&mut rng, 100.0);
        scene.reposition(id, target).unwrap();
        assert_eq!(scene.entity(id).unwrap().transform().local_position(), target);
    }
}
