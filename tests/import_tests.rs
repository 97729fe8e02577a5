//! Import Pipeline Tests
//!
//! Tests for:
//! - Armature synthesis (naming, placement, static meshes, multi-mesh policy)
//! - Bone stack identity and ordering
//! - Skeleton construction, empty bone names and shadow tree flags
//! - Shadow tree transforms, renames and output path resolution
//! - Resampling length, unusable durations, bind-pose correction and tick rates
//! - Track binding across several armatures, node tracks and morph tracks
//! - Playback through the shadow tree

use glam::{Affine3A, Quat, Vec3};

use myth_rig::animation::{TrackPath, TrackTarget};
use myth_rig::diagnostics::Diagnostic;
use myth_rig::import::{BoneStack, ImportedScene, SceneImporter, TickRate, resolve_tick_rate};
use myth_rig::scene::NodeKind;
use myth_rig::settings::{ImportSettings, MeshBonePolicy};
use myth_rig::source::{
    MorphChannel, MorphKey, NodeChannel, QuatKey, SceneMetadata, SourceAnimation, SourceBone, SourceMesh,
    SourceScene, VectorKey,
};
use myth_rig::RigError;

const EPSILON: f32 = 1e-4;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn translation(x: f32, y: f32, z: f32) -> Affine3A {
    Affine3A::from_translation(Vec3::new(x, y, z))
}

fn position_channel(node: &str, keys: &[(f64, Vec3)]) -> NodeChannel {
    let mut channel = NodeChannel::new(node);
    channel.position_keys = keys.iter().map(|&(t, v)| VectorKey::new(t, v)).collect();
    channel
}

/// Scene
/// ├── Body   (mesh "Body": bones Hips, Spine)
/// ├── Hips   (0, 1, 0)
/// │   └── Spine   (0, 1, 0)
/// │       └── Socket   (0, 0, 1)
/// └── Lamp
fn rig_scene() -> SourceScene {
    let mut scene = SourceScene::new();
    let root = scene.set_root("Scene", Affine3A::IDENTITY);
    let body = scene.add_child(root, "Body", Affine3A::IDENTITY).unwrap();
    let hips = scene.add_child(root, "Hips", translation(0.0, 1.0, 0.0)).unwrap();
    let spine = scene.add_child(hips, "Spine", translation(0.0, 1.0, 0.0)).unwrap();
    scene.add_child(spine, "Socket", translation(0.0, 0.0, 1.0)).unwrap();
    scene.add_child(root, "Lamp", Affine3A::IDENTITY).unwrap();

    let mesh = scene.add_mesh(SourceMesh::new("Body").with_bones(vec![
        SourceBone::new("Hips", Affine3A::IDENTITY),
        SourceBone::new("Spine", Affine3A::IDENTITY),
    ]));
    scene.attach_mesh(body, mesh).unwrap();
    scene
}

fn import(scene: &mut SourceScene) -> ImportedScene {
    init_logger();
    SceneImporter::new(&ImportSettings::default()).import(scene).unwrap()
}

// ============================================================================
// Armature Synthesis
// ============================================================================

#[test]
fn armature_is_synthesized_as_sibling_of_mesh_node() {
    let mut scene = rig_scene();
    let imported = import(&mut scene);

    let armature = imported.tree.find_by_name("Body_ArmatureNode").expect("armature node");
    let body = imported.tree.find_by_name("Body").unwrap();
    let armature_node = imported.tree.get(armature).unwrap();
    assert_eq!(armature_node.parent(), imported.tree.get(body).unwrap().parent());
    assert_eq!(armature_node.transform, Affine3A::IDENTITY);

    let NodeKind::Skeleton(key) = armature_node.kind else {
        panic!("armature node should anchor a skeleton, got {:?}", armature_node.kind);
    };
    assert_eq!(imported.skeleton(key).unwrap().name, "Body_ArmatureNode");
    assert_eq!(imported.armature_node(key), Some(armature));
    assert_eq!(imported.tree.get(body).unwrap().skeleton(), Some(key));
}

#[test]
fn reimport_reuses_synthesized_armature() {
    let mut scene = rig_scene();
    let first = import(&mut scene);
    let count = scene.node_count();
    let second = import(&mut scene);

    assert_eq!(scene.node_count(), count);
    assert_eq!(first.skeletons.len(), second.skeletons.len());
}

#[test]
fn same_named_meshes_get_one_armature_each() {
    let mut scene = SourceScene::new();
    let root = scene.set_root("Scene", Affine3A::IDENTITY);
    let a = scene.add_child(root, "A", Affine3A::IDENTITY).unwrap();
    scene.add_child(a, "BoneA", translation(1.0, 0.0, 0.0)).unwrap();
    let b = scene.add_child(root, "B", Affine3A::IDENTITY).unwrap();
    scene.add_child(b, "BoneB", translation(2.0, 0.0, 0.0)).unwrap();
    let mesh_a = scene.add_mesh(SourceMesh::new("Body").with_bones(vec![SourceBone::new("BoneA", Affine3A::IDENTITY)]));
    let mesh_b = scene.add_mesh(SourceMesh::new("Body").with_bones(vec![SourceBone::new("BoneB", Affine3A::IDENTITY)]));
    scene.attach_mesh(a, mesh_a).unwrap();
    scene.attach_mesh(b, mesh_b).unwrap();
    let count = scene.node_count();

    let imported = import(&mut scene);
    assert_eq!(scene.node_count(), count + 2);
    assert_eq!(imported.skeletons.len(), 2);

    let mut armature_nodes = Vec::new();
    for (key, skeleton) in &imported.skeletons {
        assert_eq!(skeleton.name, "Body_ArmatureNode");
        assert_eq!(skeleton.bone_count(), 1);
        armature_nodes.push(imported.armature_node(key).expect("armature node"));
    }
    assert_ne!(armature_nodes[0], armature_nodes[1]);

    let skeleton_of = |name: &str| {
        let node = imported.tree.get(imported.tree.find_by_name(name).unwrap()).unwrap();
        let key = node.skeleton().unwrap();
        imported.skeleton(key).unwrap().bone_name(0).map(str::to_string)
    };
    assert_eq!(skeleton_of("A").as_deref(), Some("BoneA"));
    assert_eq!(skeleton_of("B").as_deref(), Some("BoneB"));

    // A second import claims both leftovers instead of adding nodes.
    let again = import(&mut scene);
    assert_eq!(scene.node_count(), count + 2);
    assert!(again.skeletons.values().all(|s| s.bone_count() == 1));
}

#[test]
fn mesh_without_bones_stays_static() {
    let mut scene = SourceScene::new();
    let root = scene.set_root("Scene", Affine3A::IDENTITY);
    let crate_node = scene.add_child(root, "Crate", Affine3A::IDENTITY).unwrap();
    let mesh = scene.add_mesh(SourceMesh::new("Crate"));
    scene.attach_mesh(crate_node, mesh).unwrap();

    let imported = import(&mut scene);

    assert!(imported.skeletons.is_empty());
    assert!(imported.tree.find_by_name("Crate_ArmatureNode").is_none());
    let node = imported.tree.get(imported.tree.find_by_name("Crate").unwrap()).unwrap();
    assert!(matches!(node.kind, NodeKind::Mesh { skeleton: None, .. }));
}

fn multi_mesh_scene() -> SourceScene {
    let mut scene = SourceScene::new();
    let root = scene.set_root("Scene", Affine3A::IDENTITY);
    let node = scene.add_child(root, "Hero", Affine3A::IDENTITY).unwrap();
    scene.add_child(root, "A", Affine3A::IDENTITY).unwrap();
    scene.add_child(root, "B", Affine3A::IDENTITY).unwrap();
    let skinned = scene.add_mesh(SourceMesh::new("HeroSkin").with_bones(vec![
        SourceBone::new("A", Affine3A::IDENTITY),
        SourceBone::new("B", Affine3A::IDENTITY),
    ]));
    let partial = scene.add_mesh(SourceMesh::new("HeroHat").with_bones(vec![SourceBone::new("A", Affine3A::IDENTITY)]));
    scene.attach_mesh(node, skinned).unwrap();
    scene.attach_mesh(node, partial).unwrap();
    scene
}

#[test]
fn differing_bone_counts_first_mesh_wins_by_default() {
    let mut scene = multi_mesh_scene();
    let imported = import(&mut scene);

    assert!(imported.diagnostics.entries().contains(&Diagnostic::AmbiguousBoneCount {
        node: "Hero".into(),
        first: 2,
        other: 1,
    }));
    assert!(
        imported
            .diagnostics
            .matching(|d| matches!(d, Diagnostic::MultiMeshNode { count: 2, .. }))
            .next()
            .is_some()
    );
    let (_, skeleton) = imported.skeleton_by_name("HeroSkin_ArmatureNode").unwrap();
    assert_eq!(skeleton.bone_count(), 2);
}

#[test]
fn differing_bone_counts_fail_under_strict_policy() {
    let mut scene = multi_mesh_scene();
    let settings = ImportSettings {
        mesh_bone_policy: MeshBonePolicy::RequireEqual,
        ..Default::default()
    };
    let result = SceneImporter::new(&settings).import(&mut scene);
    assert_eq!(
        result.err(),
        Some(RigError::AmbiguousMeshBones {
            node: "Hero".into(),
            first: 2,
            other: 1,
        })
    );
}

#[test]
fn missing_root_is_an_error() {
    let mut scene = SourceScene::new();
    let result = SceneImporter::new(&ImportSettings::default()).import(&mut scene);
    assert_eq!(result.err(), Some(RigError::MissingRoot));
}

// ============================================================================
// Bone Stack
// ============================================================================

#[test]
fn bone_stack_deduplicates_by_identity_not_name() {
    let mut scene = SourceScene::new();
    scene.set_root("Scene", Affine3A::IDENTITY);
    scene.add_mesh(SourceMesh::new("A").with_bones(vec![
        SourceBone::new("Bone001", Affine3A::IDENTITY),
        SourceBone::new("Bone002", Affine3A::IDENTITY),
    ]));
    scene.add_mesh(SourceMesh::new("B").with_bones(vec![SourceBone::new("Bone001", Affine3A::IDENTITY)]));

    let stack = BoneStack::build(&scene, &[], &ImportSettings::default());
    let ids: Vec<(usize, usize)> = stack.entries().iter().map(|e| (e.id.mesh, e.id.bone)).collect();
    assert_eq!(ids, vec![(0, 0), (0, 1), (1, 0)]);
    assert!(stack.entries().iter().all(|e| e.armature.is_none()));

    // Same input, same order.
    let again = BoneStack::build(&scene, &[], &ImportSettings::default());
    assert_eq!(stack.entries(), again.entries());
}

#[test]
fn take_by_name_consumes_the_entry() {
    let scene = rig_scene();
    let mut stack = BoneStack::for_mesh(&scene, Some(0), None);
    assert!(stack.find_by_name("Hips").is_some());
    assert!(stack.take_by_name("Hips").is_some());
    assert!(stack.take_by_name("Hips").is_none());
    assert_eq!(stack.len(), 1);
}

// ============================================================================
// Skeleton and Shadow Tree
// ============================================================================

#[test]
fn skeleton_bones_follow_node_hierarchy() {
    let mut scene = rig_scene();
    let imported = import(&mut scene);
    let (_, skeleton) = imported.skeleton_by_name("Body_ArmatureNode").unwrap();

    assert_eq!(skeleton.bone_count(), 2);
    let hips = skeleton.find_bone("Hips").unwrap();
    let spine = skeleton.find_bone("Spine").unwrap();
    assert!(hips < spine);
    assert_eq!(skeleton.bone_parent(hips), None);
    assert_eq!(skeleton.bone_parent(spine), Some(hips));
    assert_eq!(skeleton.bone_rest(hips), Some(translation(0.0, 1.0, 0.0)));

    let global = skeleton.bone_global_pose(spine).unwrap();
    assert!(Vec3::from(global.translation).abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), EPSILON));
}

#[test]
fn shadow_tree_flags_bones_and_meshes() {
    let mut scene = rig_scene();
    scene.add_animation(SourceAnimation::new("idle", 1.0, 1.0).with_channel(position_channel("Lamp", &[(0.0, Vec3::ZERO)])));
    scene.add_animation(
        SourceAnimation::new("walk", 1.0, 1.0).with_channel(position_channel("Hips", &[(0.0, Vec3::ZERO)])),
    );
    let imported = import(&mut scene);
    let tree = &imported.anim_tree;

    let hips = tree.get(tree.find_by_name("Hips").unwrap()).unwrap();
    assert!(hips.is_bone());
    assert!(!hips.is_mesh());
    assert_eq!(hips.bone_num, 1);
    // Channel ids come from the first animation only.
    assert_eq!(hips.channel_id, None);

    let body = tree.get(tree.find_by_name("Body").unwrap()).unwrap();
    assert!(body.is_mesh());
    assert_eq!(body.bone_num, 2);
    assert_eq!(body.mesh_num, 1);

    let lamp = tree.get(tree.find_by_name("Lamp").unwrap()).unwrap();
    assert_eq!(lamp.channel_id, Some(0));

    assert!(tree.find_by_name("Body_ArmatureNode").is_some());
    assert!(
        imported
            .diagnostics
            .entries()
            .contains(&Diagnostic::MultipleAnimations { count: 2 })
    );
}

#[test]
fn empty_bone_name_gets_placeholder() {
    let mut scene = SourceScene::new();
    let root = scene.set_root("Scene", Affine3A::IDENTITY);
    let body = scene.add_child(root, "Body", Affine3A::IDENTITY).unwrap();
    let mesh = scene.add_mesh(SourceMesh::new("Body").with_bones(vec![
        SourceBone::new("", Affine3A::IDENTITY),
        SourceBone::new("Jaw", Affine3A::IDENTITY),
    ]));
    scene.attach_mesh(body, mesh).unwrap();

    let imported = import(&mut scene);
    let (_, skeleton) = imported.skeleton_by_name("Body_ArmatureNode").unwrap();
    assert_eq!(skeleton.bone_count(), 2);
    assert_eq!(skeleton.bone_name(0), Some("untitled_bone_name"));
    assert_eq!(skeleton.bone_rest(0), Some(Affine3A::IDENTITY));
    assert_eq!(skeleton.bone_parent(0), None);
    assert_eq!(skeleton.bone(0).unwrap().anim_node(), None);
    // Bones without a node are still kept.
    assert_eq!(skeleton.bone_name(1), Some("Jaw"));

    let diagnostics = imported.diagnostics.entries();
    assert!(diagnostics.contains(&Diagnostic::EmptyBoneName {
        placeholder: "untitled_bone_name".into(),
    }));
    assert!(diagnostics.contains(&Diagnostic::BoneWithoutNode {
        bone: "untitled_bone_name".into(),
    }));
    assert!(diagnostics.contains(&Diagnostic::BoneWithoutNode { bone: "Jaw".into() }));
}

#[test]
fn placeholder_name_resolves_to_a_matching_node() {
    let mut scene = SourceScene::new();
    let root = scene.set_root("Scene", Affine3A::IDENTITY);
    let body = scene.add_child(root, "Body", Affine3A::IDENTITY).unwrap();
    scene
        .add_child(root, "untitled_bone_name", translation(0.0, 0.0, 4.0))
        .unwrap();
    let mesh = scene.add_mesh(SourceMesh::new("Body").with_bones(vec![SourceBone::new("", Affine3A::IDENTITY)]));
    scene.attach_mesh(body, mesh).unwrap();

    let imported = import(&mut scene);
    let (_, skeleton) = imported.skeleton_by_name("Body_ArmatureNode").unwrap();
    assert_eq!(skeleton.bone_rest(0), Some(translation(0.0, 0.0, 4.0)));
    assert!(skeleton.bone(0).unwrap().anim_node().is_some());
    assert!(
        imported
            .diagnostics
            .matching(|d| matches!(d, Diagnostic::BoneWithoutNode { .. }))
            .next()
            .is_none()
    );
}

#[test]
fn shadow_tree_globals_follow_local_edits() {
    let mut scene = rig_scene();
    let mut imported = import(&mut scene);
    let tree = &mut imported.anim_tree;
    let hips = tree.find_by_name("Hips").unwrap();
    let socket = tree.find_by_name("Socket").unwrap();

    assert!(tree.set_local_transform(hips, translation(5.0, 1.0, 0.0)));
    let walked = tree.global_transform(socket).unwrap();
    assert!(Vec3::from(walked.translation).abs_diff_eq(Vec3::new(5.0, 2.0, 1.0), EPSILON));
    // Stored globals only move with the scene-wide pass.
    let stale = tree.get(socket).unwrap().global;
    assert!(Vec3::from(stale.translation).abs_diff_eq(Vec3::new(0.0, 2.0, 1.0), EPSILON));

    tree.update_world_transforms();
    let stored = tree.get(socket).unwrap().global;
    assert!(stored.abs_diff_eq(walked, EPSILON));
    assert!(stored.abs_diff_eq(tree.global_transform(socket).unwrap(), EPSILON));
}

#[test]
fn shadow_tree_rename_targets_the_first_match() {
    let mut scene = rig_scene();
    let mut imported = import(&mut scene);
    let tree = &mut imported.anim_tree;
    let lamp = tree.find_by_name("Lamp").unwrap();

    assert!(tree.rename("Lamp", "Light"));
    assert_eq!(tree.find_by_name("Lamp"), None);
    assert_eq!(tree.find_by_name("Light"), Some(lamp));
    assert_eq!(tree.get(lamp).unwrap().name, "Light");

    assert!(!tree.rename("Ghost", "Spirit"));
    assert_eq!(tree.find_by_name("Spirit"), None);
}

#[test]
fn output_paths_resolve_back_to_their_nodes() {
    let mut scene = rig_scene();
    let imported = import(&mut scene);
    let tree = &imported.tree;
    let socket = tree.find_by_name("Socket").unwrap();

    let path = tree.path_to(socket).unwrap();
    assert_eq!(path, "Hips/Spine/Socket");
    assert_eq!(tree.resolve_path(&path), Some(socket));
    assert_eq!(tree.resolve_path("."), tree.root());
    assert_eq!(tree.resolve_path("Hips/Ghost"), None);

    let world = tree.world_transform(socket).unwrap();
    assert!(Vec3::from(world.translation).abs_diff_eq(Vec3::new(0.0, 2.0, 1.0), EPSILON));
}

// ============================================================================
// Resampling
// ============================================================================

#[test]
fn resampled_track_covers_the_full_clip_length() {
    let mut scene = rig_scene();
    // Keys stop at 1 s, the clip lasts 2 s.
    scene.add_animation(SourceAnimation::new("walk", 1.0, 2.0).with_channel(position_channel(
        "Hips",
        &[(0.0, Vec3::new(0.0, 1.0, 0.0)), (1.0, Vec3::new(1.0, 1.0, 0.0))],
    )));
    let imported = import(&mut scene);

    let clip = imported.animation("walk").unwrap();
    assert!((clip.length - 2.0).abs() < EPSILON);
    let track = clip
        .track(&TrackPath::bone("Body_ArmatureNode", "Hips"))
        .and_then(|t| t.as_transform())
        .expect("bone track");

    let keys = track.keys();
    let last = keys.last().unwrap();
    assert!(last.time >= clip.length, "last key at {}", last.time);
    assert!(keys[keys.len() - 2].time < clip.length);
    // 30 fps bake
    assert!((keys[1].time - 1.0 / 30.0).abs() < EPSILON);
}

#[test]
fn bone_keys_are_relative_to_bind_pose() {
    let mut scene = rig_scene();
    scene.add_animation(SourceAnimation::new("walk", 1.0, 2.0).with_channel(position_channel(
        "Hips",
        &[(0.0, Vec3::new(0.0, 1.0, 0.0)), (1.0, Vec3::new(1.0, 1.0, 0.0))],
    )));
    let imported = import(&mut scene);

    let clip = imported.animation("walk").unwrap();
    let track = clip.tracks[0].as_transform().unwrap();
    let first = track.keys()[0].transform;
    assert!(first.position.abs_diff_eq(Vec3::ZERO, EPSILON), "key equal to rest must be identity");
    let end = track.sample(1.5).unwrap();
    assert!(end.position.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPSILON));
}

#[test]
fn tick_rate_resolution_order() {
    let settings = ImportSettings::default();
    let mut scene = rig_scene();

    let explicit = SourceAnimation::new("a", 48.0, 1.0);
    assert_eq!(resolve_tick_rate(&scene, &explicit, &settings), TickRate::Source(48.0));

    let unspecified = SourceAnimation::new("b", 0.0, 1.0);
    assert_eq!(resolve_tick_rate(&scene, &unspecified, &settings), TickRate::Fallback(25.0));

    scene.metadata = SceneMetadata {
        time_mode: Some(3),
        custom_frame_rate: None,
    };
    assert_eq!(resolve_tick_rate(&scene, &unspecified, &settings), TickRate::Metadata(60.0));
}

#[test]
fn missing_tick_rate_falls_back_with_diagnostic() {
    let mut scene = rig_scene();
    scene.add_animation(
        SourceAnimation::new("walk", 0.0, 50.0).with_channel(position_channel("Hips", &[(0.0, Vec3::ZERO)])),
    );
    let imported = import(&mut scene);

    let clip = imported.animation("walk").unwrap();
    assert!((clip.length - 2.0).abs() < EPSILON);
    assert!(imported.diagnostics.entries().contains(&Diagnostic::TickRateFallback {
        animation: "walk".into(),
        ticks_per_second: 25.0,
    }));
}

#[test]
fn unusable_duration_falls_back_to_last_key() {
    for duration in [f64::NAN, f64::INFINITY, -4.0] {
        let mut scene = rig_scene();
        scene.add_animation(SourceAnimation::new("a", 1.0, duration).with_channel(position_channel(
            "Lamp",
            &[(0.0, Vec3::ZERO), (1.0, Vec3::Y)],
        )));
        let imported = import(&mut scene);

        let clip = imported.animation("a").unwrap();
        assert!((clip.length - 1.0).abs() < EPSILON, "length {} for {duration}", clip.length);
        let track = clip
            .track(&TrackPath::node("Lamp"))
            .and_then(|t| t.as_transform())
            .unwrap();
        // 30 fps over one second, bounded by the frame cap.
        let keys = track.keys();
        assert!(keys.len() <= 32, "{} keys", keys.len());
        assert!(keys.last().unwrap().time >= clip.length);
        assert!(
            imported
                .diagnostics
                .matching(|d| matches!(d, Diagnostic::InvalidDuration { animation, length, .. }
                    if animation == "a" && (*length - 1.0).abs() < EPSILON))
                .next()
                .is_some()
        );
    }
}

#[test]
fn unusable_duration_without_keys_yields_an_empty_length() {
    let mut scene = rig_scene();
    // The only key lies before the start, so no positive length is recoverable.
    let mut animation = SourceAnimation::new("a", 1.0, f64::NAN);
    animation.channels.push(NodeChannel {
        node_name: "Lamp".into(),
        rotation_keys: vec![QuatKey::new(-1.0, Quat::IDENTITY)],
        ..Default::default()
    });
    scene.add_animation(animation);
    let imported = import(&mut scene);

    let clip = imported.animation("a").unwrap();
    assert_eq!(clip.length, 0.0);
    let track = clip.tracks[0].as_transform().unwrap();
    assert_eq!(track.keys().len(), 2);
}

// ============================================================================
// Track Binding
// ============================================================================

/// Two skinned meshes whose bones share the name `Bone001`; only mesh A
/// has a `Tip` bone.
fn twin_scene() -> SourceScene {
    let mut scene = SourceScene::new();
    let root = scene.set_root("Scene", Affine3A::IDENTITY);
    let a = scene.add_child(root, "MeshA", Affine3A::IDENTITY).unwrap();
    let bone_a = scene.add_child(a, "Bone001", translation(1.0, 0.0, 0.0)).unwrap();
    scene.add_child(bone_a, "Tip", translation(0.0, 1.0, 0.0)).unwrap();
    let b = scene.add_child(root, "MeshB", Affine3A::IDENTITY).unwrap();
    scene.add_child(b, "Bone001", translation(2.0, 0.0, 0.0)).unwrap();

    let mesh_a = scene.add_mesh(SourceMesh::new("A").with_bones(vec![
        SourceBone::new("Bone001", Affine3A::IDENTITY),
        SourceBone::new("Tip", Affine3A::IDENTITY),
    ]));
    let mesh_b = scene.add_mesh(SourceMesh::new("B").with_bones(vec![SourceBone::new("Bone001", Affine3A::IDENTITY)]));
    scene.attach_mesh(a, mesh_a).unwrap();
    scene.attach_mesh(b, mesh_b).unwrap();
    scene
}

#[test]
fn shared_bone_names_bind_to_their_own_skeleton() {
    let mut scene = twin_scene();
    scene.add_animation(
        SourceAnimation::new("wave", 1.0, 1.0)
            .with_channel(position_channel("Bone001", &[(0.0, Vec3::new(3.0, 0.0, 0.0))])),
    );
    let mut imported = import(&mut scene);

    let (key_a, skel_a) = imported.skeleton_by_name("A_ArmatureNode").unwrap();
    let (key_b, skel_b) = imported.skeleton_by_name("B_ArmatureNode").unwrap();
    assert_eq!(skel_a.bone_rest(0), Some(translation(1.0, 0.0, 0.0)));
    assert_eq!(skel_b.bone_rest(0), Some(translation(2.0, 0.0, 0.0)));

    // Both passes extend one clip.
    assert_eq!(imported.animations.len(), 1);
    let clip = &imported.animations[0];
    assert_eq!(clip.track_count(), 2);

    let track_a = clip.track(&TrackPath::bone("A_ArmatureNode", "Bone001")).unwrap();
    let track_b = clip.track(&TrackPath::bone("B_ArmatureNode", "Bone001")).unwrap();
    assert_eq!(track_a.target, TrackTarget::Bone { skeleton: key_a, bone: 0 });
    assert_eq!(track_b.target, TrackTarget::Bone { skeleton: key_b, bone: 0 });

    let first_a = track_a.as_transform().unwrap().keys()[0].transform.position;
    let first_b = track_b.as_transform().unwrap().keys()[0].transform.position;
    assert!(first_a.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), EPSILON));
    assert!(first_b.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPSILON));

    // Each pose is its own rest times its own key.
    imported.apply_clip(0, 0.0).unwrap();
    let pose_a = imported.skeleton(key_a).unwrap().bone_pose(0).unwrap();
    let pose_b = imported.skeleton(key_b).unwrap().bone_pose(0).unwrap();
    assert!(Vec3::from(pose_a.translation).abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), EPSILON));
    assert!(Vec3::from(pose_b.translation).abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), EPSILON));

    // Posing A's Bone001 leaves B's untouched.
    imported.set_bone_pose(key_a, 0, translation(9.0, 0.0, 0.0)).unwrap();
    imported.update_world_transforms();
    assert_eq!(imported.skeleton(key_b).unwrap().bone_pose(0), Some(pose_b));
}

#[test]
fn animating_one_armature_leaves_the_other_at_rest() {
    let mut scene = twin_scene();
    scene.add_animation(
        SourceAnimation::new("nod", 1.0, 1.0).with_channel(position_channel("Tip", &[(0.0, Vec3::new(0.0, 5.0, 0.0))])),
    );
    let mut imported = import(&mut scene);
    let (key_a, _) = imported.skeleton_by_name("A_ArmatureNode").unwrap();
    let (key_b, _) = imported.skeleton_by_name("B_ArmatureNode").unwrap();

    imported.apply_clip(0, 0.5).unwrap();

    let skel_a = imported.skeleton(key_a).unwrap();
    let tip = skel_a.find_bone("Tip").unwrap();
    assert!(Vec3::from(skel_a.bone_pose(tip).unwrap().translation).abs_diff_eq(Vec3::new(0.0, 5.0, 0.0), EPSILON));
    assert_eq!(skel_a.bone_pose(0), skel_a.bone_rest(0));

    let skel_b = imported.skeleton(key_b).unwrap();
    assert_eq!(skel_b.bone_count(), 1);
    assert_eq!(skel_b.bone_pose(0), skel_b.bone_rest(0));
    assert_eq!(skel_b.bone_rest(0), Some(translation(2.0, 0.0, 0.0)));
}

#[test]
fn node_channels_become_node_tracks() {
    let mut scene = rig_scene();
    scene.add_animation(
        SourceAnimation::new("flicker", 1.0, 1.0)
            .with_channel(position_channel("Lamp", &[(0.0, Vec3::ZERO), (1.0, Vec3::Y)]))
            .with_channel(position_channel("Ghost", &[(0.0, Vec3::ZERO)])),
    );
    let imported = import(&mut scene);

    let clip = imported.animation("flicker").unwrap();
    let lamp = clip.track(&TrackPath::node("Lamp")).expect("node track");
    let handle = imported.tree.find_by_name("Lamp").unwrap();
    assert_eq!(lamp.target, TrackTarget::Node(handle));

    assert!(imported.diagnostics.entries().contains(&Diagnostic::UnresolvedChannel {
        animation: "flicker".into(),
        channel: "Ghost".into(),
    }));
    assert!(imported.diagnostics.entries().contains(&Diagnostic::SkeletonWithoutBoneTracks {
        animation: "flicker".into(),
        skeleton: "Body_ArmatureNode".into(),
    }));
}

#[test]
fn clip_names_and_loop_hints() {
    let mut scene = rig_scene();
    scene.add_animation(
        SourceAnimation::new("", 1.0, 1.0).with_channel(position_channel("Lamp", &[(0.0, Vec3::ZERO)])),
    );
    scene.add_animation(
        SourceAnimation::new("run_cycle", 1.0, 1.0).with_channel(position_channel("Lamp", &[(0.0, Vec3::ZERO)])),
    );
    let imported = import(&mut scene);

    assert!(!imported.animation("Animation 1").unwrap().looping);
    assert!(imported.animation("run_cycle").unwrap().looping);
}

#[test]
fn morph_channels_become_blend_shape_tracks() {
    let mut scene = SourceScene::new();
    let root = scene.set_root("Scene", Affine3A::IDENTITY);
    let face = scene.add_child(root, "Face", Affine3A::IDENTITY).unwrap();
    let mesh = scene.add_mesh(SourceMesh::new("Face").with_blend_shapes(&["Smile", "Blink"]));
    scene.attach_mesh(face, mesh).unwrap();

    let mut animation = SourceAnimation::new("talk", 10.0, 10.0);
    animation.morph_channels.push(MorphChannel {
        name: "Face*0".into(),
        keys: vec![
            MorphKey {
                time: 0.0,
                values: vec![0, 1],
                weights: vec![0.0, 1.0],
            },
            MorphKey {
                time: 10.0,
                values: vec![0],
                weights: vec![1.0],
            },
        ],
    });
    animation.morph_channels.push(MorphChannel {
        name: "Nobody*0".into(),
        keys: Vec::new(),
    });
    scene.add_animation(animation);

    let mut imported = import(&mut scene);

    let clip = imported.animation("talk").unwrap();
    let smile = clip
        .track(&TrackPath::blend_shape("Face", "Smile"))
        .and_then(|t| t.as_value())
        .expect("smile track");
    assert_eq!(smile.times, vec![0.0, 1.0]);
    assert_eq!(smile.values, vec![0.0, 1.0]);
    let blink = clip.track(&TrackPath::blend_shape("Face", "Blink")).unwrap();
    assert_eq!(blink.as_value().unwrap().values, vec![1.0]);

    assert!(
        imported
            .diagnostics
            .matching(|d| matches!(d, Diagnostic::UnresolvedMorphChannel { channel, .. } if channel == "Nobody*0"))
            .next()
            .is_some()
    );

    let index = imported.animation_index("talk").unwrap();
    imported.apply_clip(index, 0.5).unwrap();
    let handle = imported.tree.find_by_name("Face").unwrap();
    assert!((imported.blend_shape_weight(handle, 0).unwrap() - 0.5).abs() < EPSILON);
    assert!((imported.blend_shape_weight(handle, 1).unwrap() - 1.0).abs() < EPSILON);
}

// ============================================================================
// Playback
// ============================================================================

#[test]
fn applying_a_clip_moves_bones_and_their_plain_children() {
    let mut scene = rig_scene();
    scene.add_animation(SourceAnimation::new("walk", 1.0, 2.0).with_channel(position_channel(
        "Hips",
        &[(0.0, Vec3::new(0.0, 1.0, 0.0)), (1.0, Vec3::new(1.0, 1.0, 0.0))],
    )));
    let mut imported = import(&mut scene);

    let index = imported.animation_index("walk").unwrap();
    imported.apply_clip(index, 1.5).unwrap();

    let (_, skeleton) = imported.skeleton_by_name("Body_ArmatureNode").unwrap();
    let hips_pose = skeleton.bone_pose(skeleton.find_bone("Hips").unwrap()).unwrap();
    assert!(Vec3::from(hips_pose.translation).abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), EPSILON));

    let tree = &imported.anim_tree;
    let socket = tree.get(tree.find_by_name("Socket").unwrap()).unwrap();
    assert!(!socket.is_bone());
    assert!(Vec3::from(socket.global.translation).abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), EPSILON));

    imported.reset_poses();
    let socket = imported.anim_tree.get(imported.anim_tree.find_by_name("Socket").unwrap()).unwrap();
    assert!(Vec3::from(socket.global.translation).abs_diff_eq(Vec3::new(0.0, 2.0, 1.0), EPSILON));
}

#[test]
fn looping_clips_wrap_time() {
    let mut scene = rig_scene();
    scene.add_animation(SourceAnimation::new("loop_sway", 1.0, 2.0).with_channel(position_channel(
        "Lamp",
        &[(0.0, Vec3::ZERO), (2.0, Vec3::new(2.0, 0.0, 0.0))],
    )));
    let mut imported = import(&mut scene);
    let index = imported.animation_index("loop_sway").unwrap();
    let lamp = imported.tree.find_by_name("Lamp").unwrap();

    imported.apply_clip(index, 2.5).unwrap();
    let wrapped = imported.tree.get(lamp).unwrap().transform.translation.x;
    imported.apply_clip(index, 0.5).unwrap();
    let direct = imported.tree.get(lamp).unwrap().transform.translation.x;
    assert!((wrapped - direct).abs() < EPSILON);
    assert!((direct - 0.5).abs() < EPSILON);
}

#[test]
fn unknown_clip_index_is_an_error() {
    let mut scene = rig_scene();
    let mut imported = import(&mut scene);
    assert!(imported.apply_clip(3, 0.0).is_err());
}
