use crate::models::AspectLabel;

/// Absolute tolerance applied to the width/height ratio.
pub const ASPECT_TOLERANCE: f64 = 0.05;

const LANDSCAPE_RATIO: f64 = 1.778; // 16:9
const PORTRAIT_RATIO: f64 = 0.5625; // 9:16

pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    f64::from(width) / f64::from(height)
}

/// Maps stream dimensions to the aspect family used as a key prefix.
pub fn classify(width: u32, height: u32) -> AspectLabel {
    if width == 0 || height == 0 {
        return AspectLabel::Other;
    }

    let ratio = aspect_ratio(width, height);
    if (ratio - LANDSCAPE_RATIO).abs() < ASPECT_TOLERANCE {
        AspectLabel::Landscape
    } else if (ratio - PORTRAIT_RATIO).abs() < ASPECT_TOLERANCE {
        AspectLabel::Portrait
    } else {
        AspectLabel::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_resolutions() {
        assert_eq!(classify(1920, 1080), AspectLabel::Landscape);
        assert_eq!(classify(1280, 720), AspectLabel::Landscape);
        assert_eq!(classify(1080, 1920), AspectLabel::Portrait);
        assert_eq!(classify(720, 1280), AspectLabel::Portrait);
        assert_eq!(classify(1080, 1080), AspectLabel::Other);
        assert_eq!(classify(640, 480), AspectLabel::Other);
    }

    #[test]
    fn test_landscape_band_edges() {
        // 1.828 sits exactly on the upper edge and is excluded
        assert_eq!(classify(1828, 1000), AspectLabel::Other);
        assert_eq!(classify(1827, 1000), AspectLabel::Landscape);
        assert_eq!(classify(1729, 1000), AspectLabel::Landscape);
        assert_eq!(classify(1727, 1000), AspectLabel::Other);
    }

    #[test]
    fn test_portrait_band_edges() {
        assert_eq!(classify(612, 1000), AspectLabel::Portrait);
        assert_eq!(classify(613, 1000), AspectLabel::Other);
        assert_eq!(classify(513, 1000), AspectLabel::Portrait);
        assert_eq!(classify(512, 1000), AspectLabel::Other);
    }

    #[test]
    fn test_degenerate_dimensions() {
        assert_eq!(classify(1920, 0), AspectLabel::Other);
        assert_eq!(classify(0, 1080), AspectLabel::Other);
    }
}
