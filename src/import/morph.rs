use crate::animation::{AnimationClip, InterpolationMode, KeyframeTrack, Track, TrackData, TrackPath, TrackTarget};
use crate::diagnostics::Diagnostic;
use crate::import::context::ImportContext;
use crate::import::imported::ImportedScene;
use crate::source::{MorphChannel, SourceAnimation, SourceScene};

/// Splits `<mesh-node>*<index>` into the node name.
fn morph_target_node(channel: &MorphChannel) -> Option<&str> {
    let mut parts = channel.name.split('*');
    let node = parts.next()?;
    parts.next()?;
    if parts.next().is_some() || node.is_empty() {
        return None;
    }
    Some(node)
}

/// Emits one value track per blend shape of each morph channel's mesh.
///
/// Weights are copied as they are, with times converted from ticks; no
/// resampling takes place. Parallel `values` name the blend shape each weight
/// drives; without them weights map to shapes by position.
pub(crate) fn import_blend_shapes(
    scene: &SourceScene,
    ctx: &ImportContext,
    out: &mut ImportedScene,
    animation: &SourceAnimation,
    clip: &mut AnimationClip,
    tps: f64,
) {
    for channel in &animation.morph_channels {
        let unresolved = |reason: &'static str| Diagnostic::UnresolvedMorphChannel {
            animation: clip.name.clone(),
            channel: channel.name.clone(),
            reason,
        };

        let Some(node_name) = morph_target_node(channel) else {
            out.diagnostics.push(unresolved("name is not <node>*<index>"));
            continue;
        };
        let Some(source) = ctx.node_by_name(scene, node_name) else {
            out.diagnostics.push(unresolved("no node with that name"));
            continue;
        };
        let Some(mesh) = scene
            .node(source)
            .and_then(|n| n.meshes.first())
            .and_then(|&m| scene.mesh(m))
        else {
            out.diagnostics.push(unresolved("node carries no mesh"));
            continue;
        };
        if mesh.blend_shapes.is_empty() {
            out.diagnostics.push(unresolved("mesh has no blend shapes"));
            continue;
        }
        let Some((handle, base_path)) = ctx
            .output
            .get(source)
            .and_then(|&h| Some((h, out.tree.path_to(h)?)))
        else {
            continue;
        };

        let mut track_indices = Vec::with_capacity(mesh.blend_shapes.len());
        for (index, shape) in mesh.blend_shapes.iter().enumerate() {
            let path = TrackPath::blend_shape(&base_path, shape);
            let track_index = match clip.find_track(&path) {
                Some(i) => i,
                None => clip.add_track(Track {
                    path,
                    target: TrackTarget::BlendShape { node: handle, index },
                    data: TrackData::Value(KeyframeTrack::new(Vec::new(), Vec::new(), InterpolationMode::Linear)),
                }),
            };
            track_indices.push(track_index);
        }

        for key in &channel.keys {
            let time = (key.time / tps) as f32;
            for (j, &weight) in key.weights.iter().enumerate() {
                let shape = key.values.get(j).map_or(j, |&v| v as usize);
                let Some(&track_index) = track_indices.get(shape) else {
                    log::warn!("{}: morph key targets blend shape {shape} of '{node_name}', which does not exist", clip.name);
                    continue;
                };
                if let TrackData::Value(track) = &mut clip.tracks[track_index].data {
                    track.insert_key(time, weight);
                }
            }
        }
    }
}
