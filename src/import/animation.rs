//! Animation Track Import
//!
//! Turns source channels into resampled transform tracks.
//!
//! Every animation is imported once per armature, with a bone stack scoped to
//! that armature's mesh so that bones sharing a name on different meshes never
//! bind to the wrong skeleton. Passes for the same animation extend one clip:
//!
//! - bone tracks are addressed `<armature-path>:<bone>` and are unique per
//!   skeleton,
//! - node tracks are addressed by node path and inserted once per clip,
//! - the blend shape pass runs once per clip.

use glam::{Affine3A, Quat, Vec3};
use rustc_hash::FxHashSet;

use crate::animation::{
    AnimationClip, InterpolationMode, KeyframeCursor, KeyframeTrack, Track, TrackData, TrackPath, TrackTarget,
    TransformTrack,
};
use crate::diagnostics::Diagnostic;
use crate::errors::{Result, RigError};
use crate::import::bone_stack::BoneStack;
use crate::import::context::ImportContext;
use crate::import::imported::ImportedScene;
use crate::import::morph::import_blend_shapes;
use crate::scene::{SkeletonKey, Transform};
use crate::settings::ImportSettings;
use crate::source::{BoneId, NodeChannel, SourceAnimation, SourceScene};

/// Ticks-per-second at or below this magnitude count as "not specified".
const TICK_RATE_EPSILON: f64 = 1e-5;

/// Name of the clip an animation imports into.
#[must_use]
pub fn clip_name(animation: &SourceAnimation, index: usize) -> String {
    if animation.name.is_empty() {
        format!("Animation {}", index + 1)
    } else {
        animation.name.clone()
    }
}

/// Whether a clip name asks for looping playback.
#[must_use]
pub fn has_loop_hint(name: &str) -> bool {
    name.starts_with("loop") || name.ends_with("loop") || name.starts_with("cycle") || name.ends_with("cycle")
}

/// Where a channel's tick rate came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickRate {
    Source(f64),
    Metadata(f64),
    Fallback(f64),
}

impl TickRate {
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Self::Source(v) | Self::Metadata(v) | Self::Fallback(v) => v,
        }
    }
}

/// Resolves the tick rate: the animation's own value, then the scene's time
/// mode, then the configured fallback.
#[must_use]
pub fn resolve_tick_rate(scene: &SourceScene, animation: &SourceAnimation, settings: &ImportSettings) -> TickRate {
    if animation.ticks_per_second.abs() > TICK_RATE_EPSILON {
        return TickRate::Source(animation.ticks_per_second);
    }
    match scene.metadata.frame_rate() {
        Some(rate) if rate.abs() > TICK_RATE_EPSILON => TickRate::Metadata(rate),
        _ => TickRate::Fallback(settings.fallback_ticks_per_second),
    }
}

/// Input of one resampling run.
struct ResampleJob<'c> {
    channel: &'c NodeChannel,
    ticks_per_second: f64,
    length: f32,
    /// Component defaults when the channel lacks keys for them.
    defaults: Transform,
    /// Bind pose the emitted keys are made relative to.
    bind_pose: Option<Affine3A>,
}

pub struct AnimationTrackImporter<'a> {
    settings: &'a ImportSettings,
    /// Clips whose blend shape pass already ran.
    morphs_done: FxHashSet<String>,
}

impl<'a> AnimationTrackImporter<'a> {
    #[must_use]
    pub fn new(settings: &'a ImportSettings) -> Self {
        Self {
            settings,
            morphs_done: FxHashSet::default(),
        }
    }

    /// Imports one animation for one armature (`None`: node tracks only).
    pub fn import(
        &mut self,
        scene: &SourceScene,
        ctx: &ImportContext,
        out: &mut ImportedScene,
        animation_index: usize,
        armature: Option<usize>,
    ) -> Result<()> {
        let Some(animation) = scene.animations.get(animation_index) else {
            return Ok(());
        };
        let name = clip_name(animation, animation_index);
        log::debug!("Import animation: {name}");

        let existing = out.animation_index(&name);
        let tick_rate = resolve_tick_rate(scene, animation, self.settings);
        let tps = tick_rate.value();

        let mut clip = match existing {
            Some(i) => std::mem::take(&mut out.animations[i]),
            None => {
                match tick_rate {
                    TickRate::Fallback(ticks_per_second) => out.diagnostics.push(Diagnostic::TickRateFallback {
                        animation: name.clone(),
                        ticks_per_second,
                    }),
                    TickRate::Metadata(rate) => log::debug!("{name}: tick rate {rate} from scene time mode"),
                    TickRate::Source(_) => {}
                }
                let length = animation.duration / tps;
                let length = if length.is_finite() && length >= 0.0 {
                    length as f32
                } else {
                    let fallback = animation
                        .last_key_time()
                        .map(|t| t / tps)
                        .filter(|l| l.is_finite() && *l >= 0.0)
                        .unwrap_or(0.0) as f32;
                    out.diagnostics.push(Diagnostic::InvalidDuration {
                        animation: name.clone(),
                        duration: animation.duration,
                        length: fallback,
                    });
                    fallback
                };
                AnimationClip::new(&name, length)
            }
        };
        if self.settings.loop_name_hints && has_loop_hint(&name) {
            clip.looping = true;
        }

        let result = self.import_into(scene, ctx, out, animation, &mut clip, tps, armature);

        match existing {
            Some(i) => out.animations[i] = clip,
            None if clip.track_count() > 0 => out.animations.push(clip),
            None => log::debug!("Animation '{name}' produced no tracks, dropped"),
        }
        result
    }

    fn import_into(
        &mut self,
        scene: &SourceScene,
        ctx: &ImportContext,
        out: &mut ImportedScene,
        animation: &SourceAnimation,
        clip: &mut AnimationClip,
        tps: f64,
        armature: Option<usize>,
    ) -> Result<()> {
        let mesh = armature.and_then(|a| ctx.armatures.get(a)).map(|a| a.mesh);
        let mut stack = BoneStack::for_mesh(scene, mesh, armature);

        // Skeleton and its path for bone tracks of this pass.
        let skeleton = match armature {
            Some(a) => {
                let info = &ctx.armatures[a];
                let key = ctx
                    .armature_skeletons
                    .get(a)
                    .copied()
                    .flatten()
                    .ok_or_else(|| RigError::MissingSkeleton(info.name.clone()))?;
                let path = ctx
                    .output
                    .get(info.node)
                    .and_then(|&h| out.tree.path_to(h))
                    .ok_or_else(|| RigError::NodeNotFound(info.name.clone()))?;
                Some((key, path))
            }
            None => None,
        };

        if let (Some(mesh), Some((key, _))) = (mesh, &skeleton) {
            let bones = &scene.meshes[mesh].bones;
            let referenced = animation
                .channels
                .iter()
                .any(|c| bones.iter().any(|b| b.name == c.node_name));
            if !referenced {
                out.diagnostics.push(Diagnostic::SkeletonWithoutBoneTracks {
                    animation: clip.name.clone(),
                    skeleton: out.skeletons[*key].name.clone(),
                });
            }
        }

        for channel in &animation.channels {
            if channel.is_empty() {
                continue;
            }
            if self.settings.skip_static_channels && channel.max_key_count() <= 1 {
                log::debug!("{}: static channel '{}' skipped", clip.name, channel.node_name);
                continue;
            }

            if let Some(entry) = stack.take_by_name(&channel.node_name) {
                self.insert_bone_track(ctx, out, clip, channel, tps, skeleton.as_ref(), entry.id);
                continue;
            }

            let target = ctx
                .node_by_name(scene, &channel.node_name)
                .and_then(|source| Some((source, *ctx.output.get(source)?)));
            let Some((source, handle)) = target else {
                out.diagnostics.push(Diagnostic::UnresolvedChannel {
                    animation: clip.name.clone(),
                    channel: channel.node_name.clone(),
                });
                continue;
            };
            let Some(path) = out.tree.path_to(handle).map(|p| TrackPath::node(&p)) else {
                continue;
            };
            if clip.find_track(&path).is_some() {
                continue;
            }

            let defaults = match (self.settings.fill_missing_from_rest, scene.node(source)) {
                (true, Some(node)) => Transform::from_affine(&node.transform),
                _ => Transform::IDENTITY,
            };
            let data = self.resample(&ResampleJob {
                channel,
                ticks_per_second: tps,
                length: clip.length,
                defaults,
                bind_pose: None,
            });
            log::debug!("{}: node track {path}", clip.name);
            clip.add_track(Track {
                path,
                target: TrackTarget::Node(handle),
                data: TrackData::Transform(data),
            });
        }

        if self.morphs_done.insert(clip.name.clone()) {
            import_blend_shapes(scene, ctx, out, animation, clip, tps);
        }
        Ok(())
    }

    fn insert_bone_track(
        &self,
        ctx: &ImportContext,
        out: &mut ImportedScene,
        clip: &mut AnimationClip,
        channel: &NodeChannel,
        tps: f64,
        skeleton: Option<&(SkeletonKey, String)>,
        bone_id: BoneId,
    ) {
        let slot = ctx.bone_slots.get(&bone_id).copied();
        let (Some((skeleton_key, skeleton_path)), Some((slot_skeleton, bone))) = (skeleton, slot) else {
            out.diagnostics.push(Diagnostic::UnresolvedChannel {
                animation: clip.name.clone(),
                channel: channel.node_name.clone(),
            });
            return;
        };
        if *skeleton_key != slot_skeleton {
            out.diagnostics.push(Diagnostic::UnresolvedChannel {
                animation: clip.name.clone(),
                channel: channel.node_name.clone(),
            });
            return;
        }
        let skel = &out.skeletons[slot_skeleton];
        let (Some(bone_name), Some(pose), Some(rest)) = (skel.bone_name(bone), skel.bone_pose(bone), skel.bone_rest(bone))
        else {
            return;
        };

        let defaults = if self.settings.fill_missing_from_rest {
            Transform::from_affine(&rest)
        } else {
            Transform::IDENTITY
        };
        let data = self.resample(&ResampleJob {
            channel,
            ticks_per_second: tps,
            length: clip.length,
            defaults,
            bind_pose: Some(pose),
        });

        let path = TrackPath::bone(skeleton_path, bone_name);
        log::debug!("{}: bone track {path}", clip.name);
        match clip.find_track(&path) {
            Some(i) => clip.tracks[i].data = TrackData::Transform(data),
            None => {
                clip.add_track(Track {
                    path,
                    target: TrackTarget::Bone {
                        skeleton: slot_skeleton,
                        bone,
                    },
                    data: TrackData::Transform(data),
                });
            }
        }
    }

    /// Samples the channel at `k / bake_fps` for `k = 0, 1, ...` up to and
    /// including the first time at or past the clip length.
    fn resample(&self, job: &ResampleJob<'_>) -> TransformTrack {
        let channel = job.channel;
        let tps = job.ticks_per_second;
        let positions = KeyframeTrack::new(
            channel.position_keys.iter().map(|k| (k.time / tps) as f32).collect(),
            channel.position_keys.iter().map(|k| k.value).collect::<Vec<Vec3>>(),
            InterpolationMode::Linear,
        );
        let rotations = KeyframeTrack::new(
            channel.rotation_keys.iter().map(|k| (k.time / tps) as f32).collect(),
            channel
                .rotation_keys
                .iter()
                .map(|k| k.value.normalize())
                .collect::<Vec<Quat>>(),
            InterpolationMode::Linear,
        );
        let scales = KeyframeTrack::new(
            channel.scaling_keys.iter().map(|k| (k.time / tps) as f32).collect(),
            channel.scaling_keys.iter().map(|k| k.value).collect::<Vec<Vec3>>(),
            InterpolationMode::Linear,
        );

        let mut pos_cursor = KeyframeCursor::default();
        let mut rot_cursor = KeyframeCursor::default();
        let mut scale_cursor = KeyframeCursor::default();

        let step = self.settings.frame_step();
        let last_frame = (job.length.max(0.0) * self.settings.bake_fps as f32).ceil() as u32 + 1;
        let mut track = TransformTrack::new();
        track.interpolation = InterpolationMode::Linear;

        let mut frame: u32 = 0;
        loop {
            let time = frame as f32 * step;

            let mut xform = job.defaults;
            if !positions.is_empty() {
                xform.position = positions.sample_with_cursor(time, &mut pos_cursor);
            }
            if !rotations.is_empty() {
                xform.rotation = rotations.sample_with_cursor(time, &mut rot_cursor).normalize();
            }
            if !scales.is_empty() {
                xform.scale = scales.sample_with_cursor(time, &mut scale_cursor);
            }
            if let Some(bind_pose) = &job.bind_pose {
                xform = xform.relative_to(bind_pose);
            }
            track.insert_key(time, xform);

            // The key at or past the end has just been written.
            if (frame > 0 && time >= job.length) || frame >= last_frame {
                break;
            }
            frame += 1;
        }
        track
    }
}
