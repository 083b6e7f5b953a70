//! Surface appearance of meshes.
//!
//! A [`Material`] is either textured or flat. Textured materials reference up
//! to five image maps; only the albedo map decides whether the material is
//! usable as-is (see [`Material::has_working_texture`]).

use std::sync::Arc;

use crate::data_structures::colour::Colour;

/// Which faces of a primitive are rasterized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Double,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColourSpace {
    Srgb,
    Linear,
}

/// Sampling state of a texture map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerSettings {
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    /// Generate a mip chain and blend between levels.
    pub mipmaps: bool,
    /// Anisotropy clamp, `1` disables anisotropic filtering.
    pub anisotropy: u16,
}

impl SamplerSettings {
    /// Linear filtering within and between mip levels.
    pub fn trilinear(anisotropy: u16) -> Self {
        Self {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmaps: true,
            anisotropy: anisotropy.max(1),
        }
    }
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmaps: false,
            anisotropy: 1,
        }
    }
}

/// An image-based surface map.
///
/// `image` is `None` when the map was referenced but could not be decoded.
#[derive(Clone, Debug)]
pub struct TextureMap {
    pub label: String,
    pub image: Option<Arc<image::RgbaImage>>,
    pub sampler: SamplerSettings,
    pub colour_space: ColourSpace,
}

impl TextureMap {
    pub fn new(label: impl Into<String>, image: Option<image::RgbaImage>, colour_space: ColourSpace) -> Self {
        Self {
            label: label.into(),
            image: image.map(Arc::new),
            sampler: SamplerSettings::default(),
            colour_space,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureSlot {
    Albedo,
    Normal,
    MetallicRoughness,
    Occlusion,
    Emissive,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 5] = [
        TextureSlot::Albedo,
        TextureSlot::Normal,
        TextureSlot::MetallicRoughness,
        TextureSlot::Occlusion,
        TextureSlot::Emissive,
    ];

    /// Colour data is stored in sRGB, everything else is linear.
    pub fn colour_space(&self) -> ColourSpace {
        match self {
            TextureSlot::Albedo | TextureSlot::Emissive => ColourSpace::Srgb,
            _ => ColourSpace::Linear,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TexturedSurface {
    pub albedo: Option<TextureMap>,
    pub normal: Option<TextureMap>,
    pub metallic_roughness: Option<TextureMap>,
    pub occlusion: Option<TextureMap>,
    pub emissive: Option<TextureMap>,
    pub base_colour: Colour,
    pub roughness: f32,
    pub metalness: f32,
}

impl TexturedSurface {
    pub fn map(&self, slot: TextureSlot) -> Option<&TextureMap> {
        match slot {
            TextureSlot::Albedo => self.albedo.as_ref(),
            TextureSlot::Normal => self.normal.as_ref(),
            TextureSlot::MetallicRoughness => self.metallic_roughness.as_ref(),
            TextureSlot::Occlusion => self.occlusion.as_ref(),
            TextureSlot::Emissive => self.emissive.as_ref(),
        }
    }

    pub fn map_mut(&mut self, slot: TextureSlot) -> Option<&mut TextureMap> {
        match slot {
            TextureSlot::Albedo => self.albedo.as_mut(),
            TextureSlot::Normal => self.normal.as_mut(),
            TextureSlot::MetallicRoughness => self.metallic_roughness.as_mut(),
            TextureSlot::Occlusion => self.occlusion.as_mut(),
            TextureSlot::Emissive => self.emissive.as_mut(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatSurface {
    pub colour: Colour,
    pub roughness: f32,
    pub metalness: f32,
}

#[derive(Clone, Debug)]
pub enum Surface {
    Textured(TexturedSurface),
    Flat(FlatSurface),
}

#[derive(Clone, Debug)]
pub struct Material {
    pub name: Option<String>,
    pub surface: Surface,
    pub transparent: bool,
    pub opacity: f32,
    pub side: Side,
    /// Fragments with alpha below this threshold are discarded, `0.0` disables the test.
    pub alpha_test: f32,
}

impl Material {
    pub fn flat(colour: Colour, roughness: f32, metalness: f32) -> Self {
        Self {
            name: None,
            surface: Surface::Flat(FlatSurface {
                colour,
                roughness,
                metalness,
            }),
            transparent: false,
            opacity: 1.0,
            side: Side::Front,
            alpha_test: 0.0,
        }
    }

    /// A material works as-is only if its albedo map is present and decoded.
    pub fn has_working_texture(&self) -> bool {
        match &self.surface {
            Surface::Textured(textured) => textured
                .albedo
                .as_ref()
                .is_some_and(TextureMap::is_loaded),
            Surface::Flat(_) => false,
        }
    }

    pub fn flat_colour(&self) -> Option<Colour> {
        match &self.surface {
            Surface::Flat(flat) => Some(flat.colour),
            Surface::Textured(_) => None,
        }
    }

    pub fn textured(&self) -> Option<&TexturedSurface> {
        match &self.surface {
            Surface::Textured(textured) => Some(textured),
            Surface::Flat(_) => None,
        }
    }
}
