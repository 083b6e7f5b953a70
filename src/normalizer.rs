//! Cosmetic material fixes applied to a freshly loaded asset.
//!
//! Every mesh is visited once in traversal order. Each material slot ends up
//! either textured with a decoded albedo map or flat, so nothing is drawn
//! with a half-resolved material.

use crate::data_structures::{
    colour::Colour,
    material::{Material, SamplerSettings, Side, Surface, TextureSlot},
    scene_graph::SceneAsset,
};

/// Colours handed out to materials without a working texture, in order.
pub const PALETTE: [u32; 8] = [
    0x8844aa, 0x5588ee, 0x44bbdd, 0x66cc77, 0xaadd66, 0xffee58, 0xffbb33, 0xff8844,
];

pub const FALLBACK_ROUGHNESS: f32 = 0.7;
pub const FALLBACK_METALNESS: f32 = 0.3;
/// Alpha below which fragments of transparent materials are discarded.
pub const TRANSPARENT_ALPHA_TEST: f32 = 0.1;

/// What a normalization pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub meshes: usize,
    pub working_slots: usize,
    pub fallbacks: usize,
    pub enhanced_maps: usize,
}

/// Palette colour of the `index`-th fallback.
pub fn fallback_colour(index: usize) -> Colour {
    Colour::from_hex(PALETTE[index % PALETTE.len()])
}

/// Normalize every mesh of `asset`.
///
/// `max_anisotropy` is the highest anisotropy the draw surface supports. The
/// fallback counter starts at zero on every call, so running this twice
/// assigns the same colours.
pub fn normalize(asset: &mut SceneAsset, max_anisotropy: u16) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    for id in asset.mesh_ids() {
        let Some(node) = asset.node_mut(id) else {
            continue;
        };
        let node_name = node.name.clone();
        let Some(mesh) = node.as_mesh_mut() else {
            continue;
        };
        report.meshes += 1;

        for (slot, material) in mesh.materials.iter_mut().enumerate() {
            match material {
                Some(material) if material.has_working_texture() => {
                    report.working_slots += 1;
                    report.enhanced_maps += enhance_maps(material, max_anisotropy);
                    if material.transparent {
                        fix_transparency(material);
                    }
                    log::debug!(
                        "Mesh {:?} slot {}: keeping texture of {:?}",
                        node_name,
                        slot,
                        material.name
                    );
                }
                _ => {
                    let fallback = fallback_for(material.as_ref(), report.fallbacks);
                    log::debug!(
                        "Mesh {:?} slot {}: no working texture, fallback #{:06x}",
                        node_name,
                        slot,
                        fallback_colour(report.fallbacks).to_hex()
                    );
                    *material = Some(fallback);
                    report.fallbacks += 1;
                }
            }
        }

        mesh.cast_shadow = true;
        mesh.receive_shadow = true;
    }
    log::debug!(
        "Normalized {} meshes: {} textured slots ({} maps enhanced), {} fallbacks",
        report.meshes,
        report.working_slots,
        report.enhanced_maps,
        report.fallbacks
    );
    report
}

fn enhance_maps(material: &mut Material, max_anisotropy: u16) -> usize {
    let Surface::Textured(surface) = &mut material.surface else {
        return 0;
    };
    let mut enhanced = 0;
    for slot in TextureSlot::ALL {
        if let Some(map) = surface.map_mut(slot) {
            map.sampler = SamplerSettings::trilinear(max_anisotropy);
            map.colour_space = slot.colour_space();
            enhanced += 1;
        }
    }
    enhanced
}

fn fix_transparency(material: &mut Material) {
    material.side = Side::Double;
    material.alpha_test = TRANSPARENT_ALPHA_TEST;
}

/// Flat replacement for `original`, keeping its transparency and opacity.
fn fallback_for(original: Option<&Material>, index: usize) -> Material {
    let mut fallback = Material::flat(fallback_colour(index), FALLBACK_ROUGHNESS, FALLBACK_METALNESS);
    fallback.side = Side::Double;
    if let Some(original) = original {
        fallback.name = original.name.clone();
        fallback.transparent = original.transparent;
        fallback.opacity = original.opacity;
        if original.transparent {
            fix_transparency(&mut fallback);
        }
    }
    fallback
}
