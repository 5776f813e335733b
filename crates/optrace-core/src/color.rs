//! Display colour for traced paths.

use crate::types::RayPath;

/// Approximate sRGB colour of monochromatic light, each channel in [0, 1].
///
/// Piecewise-linear fit of the visible spectrum over 380–780 nm, dimmed
/// towards both ends of the range. Wavelengths outside it map to black.
pub fn wavelength_to_rgb(wavelength_nm: f64) -> [f64; 3] {
    let w = wavelength_nm;
    let (r, g, b) = match w {
        w if (380.0..440.0).contains(&w) => (-(w - 440.0) / 60.0, 0.0, 1.0),
        w if (440.0..490.0).contains(&w) => (0.0, (w - 440.0) / 50.0, 1.0),
        w if (490.0..510.0).contains(&w) => (0.0, 1.0, -(w - 510.0) / 20.0),
        w if (510.0..580.0).contains(&w) => ((w - 510.0) / 70.0, 1.0, 0.0),
        w if (580.0..645.0).contains(&w) => (1.0, -(w - 645.0) / 65.0, 0.0),
        w if (645.0..=780.0).contains(&w) => (1.0, 0.0, 0.0),
        _ => return [0.0; 3],
    };
    let fade = if w < 420.0 {
        0.3 + 0.7 * (w - 380.0) / 40.0
    } else if w > 700.0 {
        0.3 + 0.7 * (780.0 - w) / 80.0
    } else {
        1.0
    };
    [r * fade, g * fade, b * fade]
}

/// RGBA for drawing a path: spectral colour with the branch intensity as alpha.
pub fn path_rgba(path: &RayPath) -> [f64; 4] {
    let [r, g, b] = wavelength_to_rgb(path.wavelength_nm);
    [r, g, b, path.intensity.clamp(0.0, 1.0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_wavelengths() {
        assert_eq!(wavelength_to_rgb(700.0), [1.0, 0.0, 0.0]);
        let green = wavelength_to_rgb(510.0);
        assert_eq!(green[1], 1.0);
        let blue = wavelength_to_rgb(450.0);
        assert_eq!(blue[2], 1.0);
    }

    #[test]
    fn test_outside_visible_is_black() {
        assert_eq!(wavelength_to_rgb(1064.0), [0.0; 3]);
        assert_eq!(wavelength_to_rgb(250.0), [0.0; 3]);
    }
}
