//! Animation clips and their playback.
//!
//! A clip is a set of channels, each animating one transform property of one
//! node. [`AnimationMixer`] plays a single clip on a [`SceneAsset`], looping,
//! and [`PlaybackClock`] accumulates the wall-clock time fed into it.

use std::ops::{Add, Mul};

use instant::Duration;

use crate::data_structures::scene_graph::{NodeId, SceneAsset};

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
}

impl Keyframes {
    pub fn len(&self) -> usize {
        match self {
            Keyframes::Translation(values) | Keyframes::Scale(values) => values.len(),
            Keyframes::Rotation(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    /// Values are stored as `[in_tangent, value, out_tangent]` triplets.
    CubicSpline,
}

impl From<gltf::animation::Interpolation> for Interpolation {
    fn from(interpolation: gltf::animation::Interpolation) -> Self {
        match interpolation {
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        }
    }
}

/// Keyframes for one property of one node.
#[derive(Clone, Debug)]
pub struct Channel {
    pub target: NodeId,
    pub interpolation: Interpolation,
    pub timestamps: Vec<f32>,
    pub keyframes: Keyframes,
}

/// A sampled value of a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pose {
    Translation(cgmath::Vector3<f32>),
    Rotation(cgmath::Quaternion<f32>),
    Scale(cgmath::Vector3<f32>),
}

impl Channel {
    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }

    /// Sample the channel at `time` seconds. Times outside the keyframe range clamp to the ends.
    pub fn sample(&self, time: f32) -> Option<Pose> {
        match &self.keyframes {
            Keyframes::Translation(values) => {
                sample_track(&self.timestamps, values, self.interpolation, time, lerp_vector)
                    .map(Pose::Translation)
            }
            Keyframes::Scale(values) => {
                sample_track(&self.timestamps, values, self.interpolation, time, lerp_vector)
                    .map(Pose::Scale)
            }
            Keyframes::Rotation(values) => sample_track(
                &self.timestamps,
                values,
                self.interpolation,
                time,
                |a, b, t| a.slerp(b, t),
            )
            .map(|rotation| {
                use cgmath::InnerSpace;
                Pose::Rotation(rotation.normalize())
            }),
        }
    }
}

fn lerp_vector(a: cgmath::Vector3<f32>, b: cgmath::Vector3<f32>, t: f32) -> cgmath::Vector3<f32> {
    a + (b - a) * t
}

fn sample_track<T>(
    timestamps: &[f32],
    values: &[T],
    interpolation: Interpolation,
    time: f32,
    lerp: impl Fn(T, T, f32) -> T,
) -> Option<T>
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let stride = match interpolation {
        Interpolation::CubicSpline => 3,
        _ => 1,
    };
    let count = timestamps.len().min(values.len() / stride);
    if count == 0 {
        return None;
    }
    let value = |i: usize| match interpolation {
        Interpolation::CubicSpline => values[i * 3 + 1],
        _ => values[i],
    };
    if count == 1 || time <= timestamps[0] {
        return Some(value(0));
    }
    if time >= timestamps[count - 1] {
        return Some(value(count - 1));
    }
    // first keyframe strictly after `time`
    let next = timestamps[..count].partition_point(|&t| t <= time);
    let prev = next - 1;
    let span = timestamps[next] - timestamps[prev];
    let t = if span > 0.0 {
        (time - timestamps[prev]) / span
    } else {
        0.0
    };
    Some(match interpolation {
        Interpolation::Step => value(prev),
        Interpolation::Linear => lerp(value(prev), value(next), t),
        Interpolation::CubicSpline => {
            let out_tangent = values[prev * 3 + 2];
            let in_tangent = values[next * 3];
            hermite(value(prev), out_tangent, value(next), in_tangent, t, span)
        }
    })
}

fn hermite<T>(v0: T, b0: T, v1: T, a1: T, t: f32, span: f32) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let t2 = t * t;
    let t3 = t2 * t;
    v0 * (2.0 * t3 - 3.0 * t2 + 1.0)
        + b0 * ((t3 - 2.0 * t2 + t) * span)
        + v1 * (-2.0 * t3 + 3.0 * t2)
        + a1 * ((t3 - t2) * span)
}

/// A named, time-sampled set of transform changes.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }

    /// Length of the longest channel in seconds.
    pub fn duration(&self) -> f32 {
        self.channels
            .iter()
            .map(Channel::duration)
            .fold(0.0, f32::max)
    }

    /// Write the pose at `time` into the local transforms of the targeted nodes.
    pub fn apply(&self, time: f32, scene: &mut SceneAsset) {
        for channel in &self.channels {
            let Some(pose) = channel.sample(time) else {
                continue;
            };
            let Some(node) = scene.node_mut(channel.target) else {
                continue;
            };
            match pose {
                Pose::Translation(position) => node.local.position = position,
                Pose::Rotation(rotation) => node.local.rotation = rotation,
                Pose::Scale(scale) => node.local.scale = scale,
            }
        }
    }
}

/// Plays one clip in a loop.
#[derive(Clone, Debug)]
pub struct AnimationMixer {
    clip: AnimationClip,
    time: f32,
    duration: f32,
}

impl AnimationMixer {
    pub fn new(clip: AnimationClip) -> Self {
        let duration = clip.duration();
        Self {
            clip,
            time: 0.0,
            duration,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Local playback time in `[0, duration)`.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance by `dt` seconds, wrapping at the clip's end, and pose the scene.
    pub fn update(&mut self, dt: f32, scene: &mut SceneAsset) {
        self.time += dt.max(0.0);
        if self.duration > 0.0 {
            self.time = self.time.rem_euclid(self.duration);
        } else {
            self.time = 0.0;
        }
        self.clip.apply(self.time, scene);
    }
}

/// Monotonic elapsed-time accumulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaybackClock {
    elapsed: Duration,
    ticks: u64,
}

impl PlaybackClock {
    pub fn advance(&mut self, dt: Duration) -> Duration {
        self.elapsed += dt;
        self.ticks += 1;
        dt
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
