#![cfg(all(feature = "ktx2", not(target_arch = "wasm32")))]

use flow_viewer::{
    config::{DecoderConfig, ViewerConfig},
    resources::{
        decoders::{DecoderSet, TextureTranscoder},
        ktx2_transcoder::Ktx2Transcoder,
    },
};

const VK_FORMAT_UNDEFINED: u32 = 0;
const VK_FORMAT_R8G8B8A8_UNORM: u32 = 37;
const SUPERCOMPRESSION_NONE: u32 = 0;
const SUPERCOMPRESSION_BASIS_LZ: u32 = 1;

/// A single-level 2D KTX2 container holding `level` verbatim.
fn ktx2_file(vk_format: u32, supercompression: u32, width: u32, height: u32, level: &[u8]) -> Vec<u8> {
    const DFD_OFFSET: u32 = 80 + 24;
    const LEVEL_OFFSET: u64 = DFD_OFFSET as u64 + 4;

    let mut file = vec![0xab, 0x4b, 0x54, 0x58, 0x20, 0x32, 0x30, 0xbb, 0x0d, 0x0a, 0x1a, 0x0a];
    for value in [vk_format, 1, width, height, 0, 0, 1, 1, supercompression] {
        file.extend_from_slice(&value.to_le_bytes());
    }
    // dfd, kvd
    for value in [DFD_OFFSET, 4, 0, 0] {
        file.extend_from_slice(&value.to_le_bytes());
    }
    // sgd
    file.extend_from_slice(&0u64.to_le_bytes());
    file.extend_from_slice(&0u64.to_le_bytes());
    // level index
    for value in [LEVEL_OFFSET, level.len() as u64, level.len() as u64] {
        file.extend_from_slice(&value.to_le_bytes());
    }
    // an empty data format descriptor: only its total size
    file.extend_from_slice(&4u32.to_le_bytes());
    file.extend_from_slice(level);
    file
}

#[test]
fn uncompressed_rgba_levels_are_copied() {
    let pixels: Vec<u8> = (0..16).collect();
    let file = ktx2_file(VK_FORMAT_R8G8B8A8_UNORM, SUPERCOMPRESSION_NONE, 2, 2, &pixels);

    let image = Ktx2Transcoder::new().transcode(&file).expect("valid ktx2");

    assert_eq!(image.dimensions(), (2, 2));
    assert_eq!(image.get_pixel(1, 0).0, [4, 5, 6, 7]);
    assert_eq!(image.get_pixel(1, 1).0, [12, 13, 14, 15]);
}

#[test]
fn short_levels_are_rejected() {
    let file = ktx2_file(VK_FORMAT_R8G8B8A8_UNORM, SUPERCOMPRESSION_NONE, 4, 4, &[0; 16]);

    assert!(Ktx2Transcoder::new().transcode(&file).is_err());
}

#[test]
fn etc1s_payloads_are_rejected() {
    let file = ktx2_file(VK_FORMAT_UNDEFINED, SUPERCOMPRESSION_BASIS_LZ, 4, 4, &[0; 16]);

    let error = Ktx2Transcoder::new().transcode(&file).expect_err("BasisLZ is unsupported");

    assert!(error.to_string().contains("supercompression"), "{}", error);
}

#[test]
fn garbage_is_not_a_container() {
    let error = Ktx2Transcoder::new()
        .transcode(b"definitely not a ktx2 file")
        .expect_err("garbage");

    assert!(error.to_string().contains("KTX2"), "{}", error);
}

#[test]
fn bundled_decoders_follow_the_config() {
    let showcase = DecoderSet::bundled(ViewerConfig::showcase_animation().decoders);
    let tree = DecoderSet::bundled(ViewerConfig::tree_animation().decoders);
    let draco_only = DecoderSet::bundled(DecoderConfig::default());

    assert!(showcase.texture_transcoder().is_some());
    assert!(tree.texture_transcoder().is_none());
    // no Draco decoder ships with the crate
    assert!(showcase.geometry_decoder().is_none());
    assert!(draco_only.geometry_decoder().is_none());
}
