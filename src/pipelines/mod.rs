//! Render pipelines.
//!
//! - `baked` draws the room meshes unlit with their baked texture
//! - `overlay` draws the fading curtain and the native loading bar on top

pub mod baked;
pub mod overlay;

pub struct Pipelines {
    pub baked: wgpu::RenderPipeline,
}

/// Highest multisample count up to `requested` that both `colour` and
/// `depth` format features allow. `1` disables multisampling.
pub fn sample_count(
    colour: wgpu::TextureFormatFeatureFlags,
    depth: wgpu::TextureFormatFeatureFlags,
    requested: u32,
) -> u32 {
    [16, 8, 4, 2]
        .into_iter()
        .filter(|count| *count <= requested)
        .find(|count| colour.sample_count_supported(*count) && depth.sample_count_supported(*count))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use wgpu::TextureFormatFeatureFlags as Flags;

    use super::*;

    #[test]
    fn picks_the_requested_count_when_supported() {
        let flags = Flags::MULTISAMPLE_X2 | Flags::MULTISAMPLE_X4;
        assert_eq!(sample_count(flags, flags, 4), 4);
    }

    #[test]
    fn lowers_to_what_both_formats_support() {
        let colour = Flags::MULTISAMPLE_X2 | Flags::MULTISAMPLE_X4 | Flags::MULTISAMPLE_X8;
        let depth = Flags::MULTISAMPLE_X2 | Flags::MULTISAMPLE_X4;
        assert_eq!(sample_count(colour, depth, 8), 4);
        assert_eq!(sample_count(colour, Flags::MULTISAMPLE_X2, 8), 2);
    }

    #[test]
    fn falls_back_to_single_sampling() {
        assert_eq!(sample_count(Flags::empty(), Flags::empty(), 4), 1);
        assert_eq!(sample_count(Flags::MULTISAMPLE_X4, Flags::MULTISAMPLE_X4, 1), 1);
    }
}
