//! SI units and value formatting.
//!
//! A [`SiUnit`] stores only the base symbol (`m`, `V`, ...). Prefixed symbols
//! found in files (`nm`, `µm`) are split by [`SiUnit::parse`] into the base
//! unit plus a power of ten, so all physical values inside a field are kept in
//! base units.

/// SI prefixes for powers of ten that are multiples of 3.
const PREFIXES: &[(i32, &str)] = &[
    (-24, "y"),
    (-21, "z"),
    (-18, "a"),
    (-15, "f"),
    (-12, "p"),
    (-9, "n"),
    (-6, "µ"),
    (-3, "m"),
    (0, ""),
    (3, "k"),
    (6, "M"),
    (9, "G"),
    (12, "T"),
    (15, "P"),
    (18, "E"),
    (21, "Z"),
    (24, "Y"),
];

/// Base symbols we are willing to strip a prefix from.
///
/// Without this list `m` (metre) would be read as milli-nothing.
const BASE_SYMBOLS: &[&str] = &["m", "V", "A", "N", "s", "Hz", "F", "T", "W", "deg", "Ohm"];

/// A physical unit, stored as its base symbol. Empty for dimensionless data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiUnit(String);

/// How to print a value at a fixed power of ten.
///
/// Print `value / magnitude` with `precision` decimals, followed by `units`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFormat {
    pub magnitude: f64,
    pub precision: usize,
    pub units: String,
}

impl ValueFormat {
    /// Render a value in this format, e.g. `"400 nm"`.
    pub fn format(&self, value: f64) -> String {
        format!(
            "{:.*} {}",
            self.precision,
            value / self.magnitude,
            self.units
        )
        .trim_end()
        .to_string()
    }
}

impl SiUnit {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }

    /// Parse a possibly prefixed unit symbol.
    ///
    /// Returns the base unit and the power of ten the prefix stood for:
    /// - `"nm"` → (`m`, -9)
    /// - `"m"` → (`m`, 0)
    /// - `"kV"` → (`V`, 3)
    /// - `"counts"` → (`counts`, 0)
    pub fn parse(symbol: &str) -> (Self, i32) {
        let symbol = symbol.trim();
        if BASE_SYMBOLS.contains(&symbol) {
            return (Self::new(symbol), 0);
        }
        // "u" is the common ASCII stand-in for micro
        let normalized = symbol.strip_prefix('u').map(|rest| format!("µ{rest}"));
        let candidate = normalized.as_deref().unwrap_or(symbol);

        for &(power, prefix) in PREFIXES {
            if prefix.is_empty() {
                continue;
            }
            match candidate.strip_prefix(prefix) {
                Some(base) if BASE_SYMBOLS.contains(&base) => return (Self::new(base), power),
                _ => {}
            }
        }
        (Self::new(symbol), 0)
    }

    /// Format for showing values of this unit at the given power of ten.
    ///
    /// Powers that are a multiple of 3 inside the SI prefix range get a prefix
    /// (`-9` + `m` → `nm`); anything else falls back to `10^p` notation.
    pub fn format_for_power10(&self, power10: i32) -> ValueFormat {
        let units = match PREFIXES.iter().find(|(p, _)| *p == power10) {
            Some((_, prefix)) => format!("{prefix}{}", self.0),
            None => format!("10^{power10} {}", self.0).trim_end().to_string(),
        };
        ValueFormat {
            magnitude: 10f64.powi(power10),
            precision: 0,
            units,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // parse
    // =========================================================================

    #[test]
    fn parse_plain_metre() {
        assert_eq!(SiUnit::parse("m"), (SiUnit::new("m"), 0));
    }

    #[test]
    fn parse_prefixed_symbols() {
        assert_eq!(SiUnit::parse("nm"), (SiUnit::new("m"), -9));
        assert_eq!(SiUnit::parse("µm"), (SiUnit::new("m"), -6));
        assert_eq!(SiUnit::parse("um"), (SiUnit::new("m"), -6));
        assert_eq!(SiUnit::parse("kV"), (SiUnit::new("V"), 3));
        assert_eq!(SiUnit::parse("mV"), (SiUnit::new("V"), -3));
    }

    #[test]
    fn parse_unknown_symbol_kept_verbatim() {
        assert_eq!(SiUnit::parse("counts"), (SiUnit::new("counts"), 0));
        assert_eq!(SiUnit::parse(""), (SiUnit::new(""), 0));
    }

    // =========================================================================
    // format_for_power10
    // =========================================================================

    #[test]
    fn nanometre_format() {
        let fmt = SiUnit::new("m").format_for_power10(-9);
        assert_eq!(fmt.units, "nm");
        assert_eq!(fmt.precision, 0);
        assert_eq!(fmt.format(4e-7), "400 nm");
    }

    #[test]
    fn micrometre_format() {
        let fmt = SiUnit::new("m").format_for_power10(-6);
        assert_eq!(fmt.format(2e-6), "2 µm");
    }

    #[test]
    fn dimensionless_has_no_trailing_space() {
        let fmt = SiUnit::default().format_for_power10(0);
        assert_eq!(fmt.format(30.0), "30");
    }

    #[test]
    fn out_of_range_power_uses_exponent() {
        let fmt = SiUnit::new("m").format_for_power10(-30);
        assert_eq!(fmt.units, "10^-30 m");
    }
}
