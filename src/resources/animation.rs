use crate::data_structures::animation::{AnimationClip, Channel, Keyframes};

/// Read every animation of the document into a clip.
///
/// Channel targets are glTF node indices, which equal the [`NodeId`](crate::data_structures::scene_graph::NodeId)s
/// of the loaded scene. Morph target weights are not supported and skipped.
pub fn load_clips(document: &gltf::Document, buffers: &[Vec<u8>]) -> Vec<AnimationClip> {
    document
        .animations()
        .map(|animation| {
            let name = animation
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("animation_{}", animation.index()));
            let channels = animation
                .channels()
                .filter_map(|channel| load_channel(&channel, buffers, &name))
                .collect();
            AnimationClip::new(name, channels)
        })
        .collect()
}

fn load_channel(channel: &gltf::animation::Channel, buffers: &[Vec<u8>], clip: &str) -> Option<Channel> {
    let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let Some(timestamps) = reader.read_inputs() else {
        log::warn!("Channel {} of {} has no keyframe times", channel.index(), clip);
        return None;
    };
    let timestamps: Vec<f32> = timestamps.collect();
    let keyframes = match reader.read_outputs()? {
        gltf::animation::util::ReadOutputs::Translations(translations) => {
            Keyframes::Translation(translations.map(cgmath::Vector3::from).collect())
        }
        gltf::animation::util::ReadOutputs::Rotations(rotations) => Keyframes::Rotation(
            rotations
                .into_f32()
                .map(|r| cgmath::Quaternion::new(r[3], r[0], r[1], r[2]))
                .collect(),
        ),
        gltf::animation::util::ReadOutputs::Scales(scales) => {
            Keyframes::Scale(scales.map(cgmath::Vector3::from).collect())
        }
        gltf::animation::util::ReadOutputs::MorphTargetWeights(_) => {
            log::debug!("Skipping morph target channel {} of {}", channel.index(), clip);
            return None;
        }
    };
    Some(Channel {
        target: channel.target().node().index(),
        interpolation: channel.sampler().interpolation().into(),
        timestamps,
        keyframes,
    })
}
