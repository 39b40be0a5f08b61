//! Perceptually ordered colour schemes.
//!
//! Each scheme is sampled at ten evenly spaced anchors from the matplotlib
//! colormap of the same name and linearly interpolated in between. Endpoints
//! are exact; interior colours stay within a few units per channel of
//! matplotlib's 256-entry tables.

use hsm_common::{HsmError, HsmResult};

/// An RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

type Anchors = [[u8; 3]; 10];

const VIRIDIS: Anchors = [
    [0x44, 0x01, 0x54],
    [0x48, 0x28, 0x78],
    [0x3e, 0x49, 0x89],
    [0x31, 0x68, 0x8e],
    [0x26, 0x82, 0x8e],
    [0x1f, 0x9e, 0x89],
    [0x35, 0xb7, 0x79],
    [0x6e, 0xce, 0x58],
    [0xb5, 0xde, 0x2b],
    [0xfd, 0xe7, 0x25],
];

const MAGMA: Anchors = [
    [0x00, 0x00, 0x04],
    [0x18, 0x0f, 0x3d],
    [0x44, 0x0f, 0x76],
    [0x72, 0x1f, 0x81],
    [0x9e, 0x2f, 0x7f],
    [0xcd, 0x40, 0x71],
    [0xf1, 0x60, 0x5d],
    [0xfd, 0x96, 0x68],
    [0xfe, 0xca, 0x8d],
    [0xfc, 0xfd, 0xbf],
];

const INFERNO: Anchors = [
    [0x00, 0x00, 0x04],
    [0x1b, 0x0c, 0x41],
    [0x4a, 0x0c, 0x6b],
    [0x78, 0x1c, 0x6d],
    [0xa5, 0x2c, 0x60],
    [0xcf, 0x44, 0x46],
    [0xed, 0x69, 0x25],
    [0xfb, 0x9b, 0x06],
    [0xf7, 0xd1, 0x3d],
    [0xfc, 0xff, 0xa4],
];

const PLASMA: Anchors = [
    [0x0d, 0x08, 0x87],
    [0x46, 0x03, 0x9f],
    [0x72, 0x01, 0xa8],
    [0x9c, 0x17, 0x9e],
    [0xbd, 0x37, 0x86],
    [0xd8, 0x57, 0x6b],
    [0xed, 0x79, 0x53],
    [0xfb, 0x9f, 0x3a],
    [0xfd, 0xca, 0x26],
    [0xf0, 0xf9, 0x21],
];

const CIVIDIS: Anchors = [
    [0x00, 0x22, 0x4e],
    [0x12, 0x35, 0x70],
    [0x3b, 0x49, 0x6c],
    [0x57, 0x5d, 0x6d],
    [0x70, 0x71, 0x73],
    [0x8a, 0x86, 0x78],
    [0xa5, 0x9c, 0x74],
    [0xc3, 0xb3, 0x69],
    [0xe1, 0xcc, 0x55],
    [0xfe, 0xe8, 0x38],
];

/// A named colour scheme, optionally reversed (`viridis_r`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    name: String,
    anchors: &'static Anchors,
    reversed: bool,
}

impl ColorScheme {
    /// Base scheme names; each also exists with a `_r` suffix.
    pub const NAMES: [&'static str; 5] = ["viridis", "magma", "inferno", "plasma", "cividis"];

    /// Look up a scheme by name (case-insensitive).
    pub fn from_name(name: &str) -> HsmResult<Self> {
        let lower = name.trim().to_lowercase();
        let (base, reversed) = match lower.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };

        let anchors = match base {
            "viridis" => &VIRIDIS,
            "magma" => &MAGMA,
            "inferno" => &INFERNO,
            "plasma" => &PLASMA,
            "cividis" => &CIVIDIS,
            _ => {
                return Err(HsmError::Render(format!(
                    "unknown colour scheme '{}', expected one of {:?} (optionally with _r)",
                    name,
                    Self::NAMES
                )))
            }
        };

        Ok(Self {
            name: lower.clone(),
            anchors,
            reversed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Opaque colour for a normalised value; `t` is clamped to [0, 1].
    pub fn color_at(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let t = if self.reversed { 1.0 - t } else { t };

        let last = self.anchors.len() - 1;
        let position = t * last as f32;
        let index = (position.floor() as usize).min(last - 1);
        let frac = position - index as f32;

        let lo = self.anchors[index];
        let hi = self.anchors[index + 1];
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * frac).round() as u8;

        Color::new(mix(lo[0], hi[0]), mix(lo[1], hi[1]), mix(lo[2], hi[2]), 255)
    }

    /// 256-entry lookup table spanning [0, 1].
    pub fn lookup_table(&self) -> Vec<Color> {
        (0..256).map(|i| self.color_at(i as f32 / 255.0)).collect()
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            name: "viridis".to_string(),
            anchors: &VIRIDIS,
            reversed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_match_anchors() {
        let viridis = ColorScheme::from_name("viridis").unwrap();
        assert_eq!(viridis.color_at(0.0), Color::new(0x44, 0x01, 0x54, 255));
        assert_eq!(viridis.color_at(1.0), Color::new(0xfd, 0xe7, 0x25, 255));
    }

    #[test]
    fn test_endpoints_match_matplotlib_tables() {
        let expected = [
            ("viridis", [0x44, 0x01, 0x54], [0xfd, 0xe7, 0x25]),
            ("magma", [0x00, 0x00, 0x04], [0xfc, 0xfd, 0xbf]),
            ("inferno", [0x00, 0x00, 0x04], [0xfc, 0xff, 0xa4]),
            ("plasma", [0x0d, 0x08, 0x87], [0xf0, 0xf9, 0x21]),
            ("cividis", [0x00, 0x22, 0x4e], [0xfe, 0xe8, 0x38]),
        ];
        for (name, first, last) in expected {
            let table = ColorScheme::from_name(name).unwrap().lookup_table();
            assert_eq!(table[0].to_rgba()[..3], first, "{} first entry", name);
            assert_eq!(table[255].to_rgba()[..3], last, "{} last entry", name);
        }
    }

    #[test]
    fn test_interior_close_to_matplotlib() {
        // viridis(0.5) in matplotlib is #21918c
        let mid = ColorScheme::from_name("viridis").unwrap().color_at(0.5);
        for (actual, expected) in mid.to_rgba()[..3].iter().zip([0x21u8, 0x91, 0x8c]) {
            assert!(actual.abs_diff(expected) <= 2, "{:?} vs #21918c", mid);
        }
    }

    #[test]
    fn test_reversed_scheme() {
        let forward = ColorScheme::from_name("magma").unwrap();
        let reversed = ColorScheme::from_name("magma_r").unwrap();
        assert!(reversed.is_reversed());
        assert_eq!(forward.color_at(0.25), reversed.color_at(0.75));
        assert_eq!(reversed.color_at(0.0), Color::new(0xfc, 0xfd, 0xbf, 255));
    }

    #[test]
    fn test_values_are_clamped() {
        let plasma = ColorScheme::from_name("Plasma").unwrap();
        assert_eq!(plasma.color_at(-3.0), plasma.color_at(0.0));
        assert_eq!(plasma.color_at(7.0), plasma.color_at(1.0));
    }

    #[test]
    fn test_interpolates_between_anchors() {
        let cividis = ColorScheme::from_name("cividis").unwrap();
        // Halfway between the first two anchors
        let mid = cividis.color_at(0.5 / 9.0);
        assert_eq!(mid.r, 9);
        assert!((43..=44).contains(&mid.g), "green was {}", mid.g);
        assert_eq!(mid.b, 95);
        assert_eq!(mid.a, 255);
    }

    #[test]
    fn test_unknown_scheme() {
        let err = ColorScheme::from_name("rainbow").unwrap_err();
        assert_eq!(err.kind(), "RenderError");
    }

    #[test]
    fn test_all_names_resolve() {
        for name in ColorScheme::NAMES {
            assert!(ColorScheme::from_name(name).is_ok());
            assert!(ColorScheme::from_name(&format!("{}_r", name)).is_ok());
        }
        assert_eq!(ColorScheme::from_name("inferno").unwrap().lookup_table().len(), 256);
    }
}
