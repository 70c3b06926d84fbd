//! Named false-colour gradients.
//!
//! A gradient is a list of colour stops on `[0, 1]`, linearly interpolated.

/// Gradient used when a requested name is not known.
pub const DEFAULT_GRADIENT: &str = "Gray";

type Stop = (f64, [u8; 3]);

const GRAY: &[Stop] = &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])];

const REI_GREEN: &[Stop] = &[
    (0.0, [0, 0, 0]),
    (0.35, [15, 90, 30]),
    (0.7, [110, 200, 80]),
    (1.0, [255, 255, 255]),
];

const GWYDDION_NET: &[Stop] = &[
    (0.0, [0, 0, 0]),
    (0.34, [168, 40, 15]),
    (0.75, [243, 194, 93]),
    (1.0, [255, 255, 255]),
];

const SKY: &[Stop] = &[
    (0.0, [0, 0, 0]),
    (0.3, [20, 40, 140]),
    (0.7, [100, 170, 230]),
    (1.0, [255, 255, 255]),
];

const RAINBOW: &[Stop] = &[
    (0.0, [0, 0, 255]),
    (0.25, [0, 255, 255]),
    (0.5, [0, 255, 0]),
    (0.75, [255, 255, 0]),
    (1.0, [255, 0, 0]),
];

const GRADIENTS: &[(&str, &[Stop])] = &[
    ("Gray", GRAY),
    ("ReiGreen", REI_GREEN),
    ("Gwyddion.net", GWYDDION_NET),
    ("Sky", SKY),
    ("Rainbow", RAINBOW),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    name: &'static str,
    stops: &'static [Stop],
}

impl Gradient {
    /// Look up a gradient by its exact name.
    pub fn by_name(name: &str) -> Option<Self> {
        GRADIENTS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(name, stops)| Self { name, stops })
    }

    /// The gradient every unknown name falls back to.
    pub fn default_gradient() -> Self {
        Self {
            name: DEFAULT_GRADIENT,
            stops: GRAY,
        }
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        GRADIENTS.iter().map(|(n, _)| *n)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Colour at position `t`, clamped to `[0, 1]`. NaN maps to the first stop.
    pub fn color_at(&self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let upper = self
            .stops
            .iter()
            .position(|(pos, _)| *pos >= t)
            .unwrap_or(self.stops.len() - 1);
        if upper == 0 {
            return self.stops[0].1;
        }
        let (p0, c0) = self.stops[upper - 1];
        let (p1, c1) = self.stops[upper];
        let f = (t - p0) / (p1 - p0);
        std::array::from_fn(|i| (c0[i] as f64 + f * (c1[i] as f64 - c0[i] as f64)).round() as u8)
    }
}
