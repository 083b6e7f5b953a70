use std::time::Duration;

use cgmath::{Deg, InnerSpace, Quaternion, Rotation3, Vector3};
use flow_viewer::data_structures::animation::{
    AnimationClip, AnimationMixer, Channel, Interpolation, Keyframes, PlaybackClock, Pose,
};

use crate::common::test_utils::{box_asset, slide_clip};

mod common;

fn translation(interpolation: Interpolation) -> Channel {
    Channel {
        target: 1,
        interpolation,
        timestamps: vec![0.0, 1.0, 2.0],
        keyframes: Keyframes::Translation(vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 4.0, 0.0),
        ]),
    }
}

fn position(pose: Option<Pose>) -> Vector3<f32> {
    match pose {
        Some(Pose::Translation(position)) => position,
        other => panic!("expected a translation, got {:?}", other),
    }
}

#[test]
fn linear_samples_midway_between_keyframes() {
    let channel = translation(Interpolation::Linear);

    assert_eq!(position(channel.sample(0.5)), Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(position(channel.sample(1.5)), Vector3::new(2.0, 2.0, 0.0));
    assert_eq!(position(channel.sample(1.0)), Vector3::new(2.0, 0.0, 0.0));
}

#[test]
fn step_holds_the_previous_keyframe() {
    let channel = translation(Interpolation::Step);

    assert_eq!(position(channel.sample(0.99)), Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(position(channel.sample(1.0)), Vector3::new(2.0, 0.0, 0.0));
    assert_eq!(position(channel.sample(1.7)), Vector3::new(2.0, 0.0, 0.0));
}

#[test]
fn times_outside_the_track_clamp_to_its_ends() {
    let channel = translation(Interpolation::Linear);

    assert_eq!(position(channel.sample(-1.0)), Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(position(channel.sample(9.0)), Vector3::new(2.0, 4.0, 0.0));
    assert_eq!(channel.duration(), 2.0);
}

#[test]
fn cubic_spline_with_flat_tangents_passes_through_keyframes() {
    let zero = Vector3::new(0.0, 0.0, 0.0);
    let channel = Channel {
        target: 0,
        interpolation: Interpolation::CubicSpline,
        timestamps: vec![0.0, 1.0],
        keyframes: Keyframes::Scale(vec![
            zero,
            Vector3::new(1.0, 1.0, 1.0),
            zero,
            zero,
            Vector3::new(3.0, 3.0, 3.0),
            zero,
        ]),
    };

    let scale = |time| match channel.sample(time) {
        Some(Pose::Scale(scale)) => scale,
        other => panic!("expected a scale, got {:?}", other),
    };
    assert_eq!(scale(0.0), Vector3::new(1.0, 1.0, 1.0));
    assert_eq!(scale(1.0), Vector3::new(3.0, 3.0, 3.0));
    assert!((scale(0.5) - Vector3::new(2.0, 2.0, 2.0)).magnitude() < 1e-5);
}

#[test]
fn rotations_are_slerped() {
    let channel = Channel {
        target: 0,
        interpolation: Interpolation::Linear,
        timestamps: vec![0.0, 1.0],
        keyframes: Keyframes::Rotation(vec![
            Quaternion::from_angle_y(Deg(0.0)),
            Quaternion::from_angle_y(Deg(90.0)),
        ]),
    };

    let Some(Pose::Rotation(rotation)) = channel.sample(0.5) else {
        panic!("expected a rotation");
    };
    let expected = Quaternion::from_angle_y(Deg(45.0));
    assert!((rotation - expected).magnitude() < 1e-5);
    assert!((rotation.magnitude() - 1.0).abs() < 1e-5);
}

#[test]
fn empty_tracks_sample_nothing() {
    let channel = Channel {
        target: 0,
        interpolation: Interpolation::Linear,
        timestamps: Vec::new(),
        keyframes: Keyframes::Translation(Vec::new()),
    };

    assert_eq!(channel.sample(0.3), None);
    assert!(channel.keyframes.is_empty());
}

#[test]
fn clip_duration_is_its_longest_channel() {
    let mut long = translation(Interpolation::Linear);
    long.timestamps = vec![0.0, 1.0, 4.0];
    let clip = AnimationClip::new("walk", vec![translation(Interpolation::Step), long]);

    assert_eq!(clip.duration(), 4.0);
}

#[test]
fn mixer_wraps_around_the_clip_end() {
    let mut scene = box_asset([0.0; 3], [1.0; 3]);
    let mut mixer = AnimationMixer::new(slide_clip(1));

    mixer.update(0.75, &mut scene);
    mixer.update(0.5, &mut scene);

    assert!((mixer.time() - 0.25).abs() < 1e-5);
    let x = scene.node(1).expect("node").local.position.x;
    assert!((x - 0.5).abs() < 1e-5);
}

#[test]
fn mixer_on_an_empty_clip_stays_at_zero() {
    let mut scene = box_asset([0.0; 3], [1.0; 3]);
    let mut mixer = AnimationMixer::new(AnimationClip::new("still", Vec::new()));

    mixer.update(3.0, &mut scene);

    assert_eq!(mixer.time(), 0.0);
}

#[test]
fn channels_for_unknown_nodes_are_skipped() {
    let mut scene = box_asset([0.0; 3], [1.0; 3]);
    let clip = slide_clip(42);

    clip.apply(0.5, &mut scene);

    assert_eq!(scene.node(1).expect("node").local.position, Vector3::new(0.0, 0.0, 0.0));
}

#[test]
fn clock_only_moves_forward() {
    let mut clock = PlaybackClock::default();

    clock.advance(Duration::from_millis(16));
    clock.advance(Duration::ZERO);
    clock.advance(Duration::from_millis(34));

    assert_eq!(clock.elapsed(), Duration::from_millis(50));
    assert_eq!(clock.ticks(), 3);
}
