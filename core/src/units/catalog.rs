//! Known unit symbols and SI prefixes.

use super::dimension::Dimension;

/// A named unit atom with its scale to the SI base of its dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDef {
    pub symbol: &'static str,
    pub dimension: Dimension,
    pub scale: f64,
    pub prefixable: bool,
}

const fn def(symbol: &'static str, dimension: Dimension, scale: f64, prefixable: bool) -> UnitDef {
    UnitDef {
        symbol,
        dimension,
        scale,
        prefixable,
    }
}

pub const UNITS: &[UnitDef] = &[
    def("m", Dimension::LENGTH, 1.0, true),
    def("g", Dimension::MASS, 1e-3, true),
    def("s", Dimension::TIME, 1.0, true),
    def("A", Dimension::CURRENT, 1.0, true),
    def("K", Dimension::TEMPERATURE, 1.0, true),
    def("mol", Dimension::AMOUNT, 1.0, true),
    def("cd", Dimension::LUMINOSITY, 1.0, true),
    def("N", Dimension::FORCE, 1.0, true),
    def("J", Dimension::ENERGY, 1.0, true),
    def("W", Dimension::POWER, 1.0, true),
    def("Pa", Dimension::PRESSURE, 1.0, true),
    def("Hz", Dimension::FREQUENCY, 1.0, true),
    def("C", Dimension::CHARGE, 1.0, true),
    def("V", Dimension::VOLTAGE, 1.0, true),
    def("Ω", Dimension::RESISTANCE, 1.0, true),
    def("S", Dimension::CONDUCTANCE, 1.0, true),
    def("F", Dimension::CAPACITANCE, 1.0, true),
    def("T", Dimension::MAGNETIC_FLUX_DENSITY, 1.0, true),
    def("Wb", Dimension::MAGNETIC_FLUX, 1.0, true),
    def("H", Dimension::INDUCTANCE, 1.0, true),
    def("L", Dimension::VOLUME, 1e-3, true),
    def("min", Dimension::TIME, 60.0, false),
    def("h", Dimension::TIME, 3600.0, false),
    def("rad", Dimension::DIMENSIONLESS, 1.0, true),
    def("deg", Dimension::DIMENSIONLESS, std::f64::consts::PI / 180.0, false),
    def("in", Dimension::LENGTH, 0.0254, false),
    def("ft", Dimension::LENGTH, 0.3048, false),
    def("bar", Dimension::PRESSURE, 1e5, true),
    def("eV", Dimension::ENERGY, 1.602_176_634e-19, true),
];

/// Alternate spellings resolved to a canonical symbol.
const ALIASES: &[(&str, &str)] = &[("ohm", "Ω"), ("°", "deg"), ("l", "L")];

/// Two-letter prefixes come first so "da" is tried before "d".
pub const PREFIXES: &[(&str, f64)] = &[
    ("da", 1e1),
    ("p", 1e-12),
    ("n", 1e-9),
    ("u", 1e-6),
    ("μ", 1e-6),
    ("µ", 1e-6),
    ("m", 1e-3),
    ("c", 1e-2),
    ("d", 1e-1),
    ("h", 1e2),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
];

fn exact(symbol: &str) -> Option<&'static UnitDef> {
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == symbol)
        .map(|(_, target)| *target)
        .unwrap_or(symbol);
    UNITS.iter().find(|u| u.symbol == canonical)
}

/// Resolve a written unit symbol to `(dimension, scale)`.
/// An exact symbol wins over a prefixed reading ("cd" is candela, "min" is minute).
pub fn lookup(symbol: &str) -> Option<(Dimension, f64)> {
    if let Some(unit) = exact(symbol) {
        return Some((unit.dimension, unit.scale));
    }
    PREFIXES.iter().find_map(|(prefix, factor)| {
        let rest = symbol.strip_prefix(prefix)?;
        let unit = exact(rest).filter(|u| u.prefixable)?;
        Some((unit.dimension, unit.scale * factor))
    })
}
