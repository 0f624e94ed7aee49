/// Per-element display data: covalent radius (Angstroms) and CPK color.
#[derive(Clone, Copy, Debug)]
pub struct ElementDisplay {
    pub radius: f64,
    pub color: (f64, f64, f64),
}

struct Entry {
    symbol: &'static str,
    number: i32,
    radius: f64,
    color: (f64, f64, f64),
}

// Covalent radii with standard CPK coloring, periods 1-4 plus a few common
// heavier elements.
const ELEMENTS: &[Entry] = &[
    Entry { symbol: "H", number: 1, radius: 0.37, color: (1.00, 1.00, 1.00) },
    Entry { symbol: "He", number: 2, radius: 0.32, color: (0.85, 1.00, 1.00) },
    Entry { symbol: "Li", number: 3, radius: 1.34, color: (0.80, 0.50, 1.00) },
    Entry { symbol: "Be", number: 4, radius: 0.90, color: (0.76, 1.00, 0.00) },
    Entry { symbol: "B", number: 5, radius: 0.82, color: (1.00, 0.70, 0.70) },
    Entry { symbol: "C", number: 6, radius: 0.77, color: (0.20, 0.20, 0.20) },
    Entry { symbol: "N", number: 7, radius: 0.75, color: (0.19, 0.31, 0.97) },
    Entry { symbol: "O", number: 8, radius: 0.73, color: (1.00, 0.05, 0.05) },
    Entry { symbol: "F", number: 9, radius: 0.71, color: (0.56, 0.88, 0.31) },
    Entry { symbol: "Ne", number: 10, radius: 0.69, color: (0.70, 0.89, 0.96) },
    Entry { symbol: "Na", number: 11, radius: 1.54, color: (0.67, 0.36, 0.95) },
    Entry { symbol: "Mg", number: 12, radius: 1.30, color: (0.54, 1.00, 0.00) },
    Entry { symbol: "Al", number: 13, radius: 1.18, color: (0.75, 0.65, 0.65) },
    Entry { symbol: "Si", number: 14, radius: 1.11, color: (0.94, 0.78, 0.63) },
    Entry { symbol: "P", number: 15, radius: 1.06, color: (1.00, 0.50, 0.00) },
    Entry { symbol: "S", number: 16, radius: 1.02, color: (1.00, 1.00, 0.19) },
    Entry { symbol: "Cl", number: 17, radius: 0.99, color: (0.12, 0.94, 0.12) },
    Entry { symbol: "Ar", number: 18, radius: 0.97, color: (0.50, 0.82, 0.89) },
    Entry { symbol: "K", number: 19, radius: 1.96, color: (0.56, 0.25, 0.83) },
    Entry { symbol: "Ca", number: 20, radius: 1.74, color: (0.24, 1.00, 0.00) },
    Entry { symbol: "Sc", number: 21, radius: 1.44, color: (0.90, 0.90, 0.90) },
    Entry { symbol: "Ti", number: 22, radius: 1.36, color: (0.75, 0.76, 0.78) },
    Entry { symbol: "V", number: 23, radius: 1.25, color: (0.65, 0.65, 0.67) },
    Entry { symbol: "Cr", number: 24, radius: 1.27, color: (0.54, 0.60, 0.78) },
    Entry { symbol: "Mn", number: 25, radius: 1.39, color: (0.61, 0.48, 0.78) },
    Entry { symbol: "Fe", number: 26, radius: 1.25, color: (0.88, 0.40, 0.20) },
    Entry { symbol: "Co", number: 27, radius: 1.26, color: (0.94, 0.56, 0.63) },
    Entry { symbol: "Ni", number: 28, radius: 1.21, color: (0.31, 0.82, 0.31) },
    Entry { symbol: "Cu", number: 29, radius: 1.38, color: (0.78, 0.50, 0.20) },
    Entry { symbol: "Zn", number: 30, radius: 1.31, color: (0.49, 0.50, 0.69) },
    Entry { symbol: "Ga", number: 31, radius: 1.26, color: (0.76, 0.56, 0.56) },
    Entry { symbol: "Ge", number: 32, radius: 1.22, color: (0.40, 0.56, 0.56) },
    Entry { symbol: "As", number: 33, radius: 1.19, color: (0.74, 0.50, 0.89) },
    Entry { symbol: "Se", number: 34, radius: 1.16, color: (1.00, 0.63, 0.00) },
    Entry { symbol: "Br", number: 35, radius: 1.14, color: (0.65, 0.16, 0.16) },
    Entry { symbol: "Kr", number: 36, radius: 1.10, color: (0.36, 0.72, 0.82) },
    Entry { symbol: "Sr", number: 38, radius: 1.92, color: (0.00, 1.00, 0.00) },
    Entry { symbol: "Zr", number: 40, radius: 1.48, color: (0.58, 0.88, 0.88) },
    Entry { symbol: "Ag", number: 47, radius: 1.53, color: (0.75, 0.75, 0.75) },
    Entry { symbol: "Sn", number: 50, radius: 1.41, color: (0.40, 0.50, 0.50) },
    Entry { symbol: "I", number: 53, radius: 1.33, color: (0.58, 0.00, 0.58) },
    Entry { symbol: "Ba", number: 56, radius: 1.98, color: (0.00, 0.79, 0.00) },
    Entry { symbol: "W", number: 74, radius: 1.46, color: (0.13, 0.58, 0.84) },
    Entry { symbol: "Pt", number: 78, radius: 1.28, color: (0.82, 0.82, 0.88) },
    Entry { symbol: "Au", number: 79, radius: 1.44, color: (1.00, 0.82, 0.14) },
    Entry { symbol: "Pb", number: 82, radius: 1.47, color: (0.34, 0.35, 0.38) },
];

fn lookup(element: &str) -> Option<&'static Entry> {
    ELEMENTS.iter().find(|e| e.symbol == element)
}

/// Atomic number Z, or 0 for unknown symbols.
pub fn atomic_number(element: &str) -> i32 {
    lookup(element).map(|e| e.number).unwrap_or(0)
}

/// Display radius and color. Unknown species fall back to a neutral marker
/// that still renders visibly.
pub fn display_properties(element: &str) -> ElementDisplay {
    match lookup(element) {
        Some(e) => ElementDisplay {
            radius: e.radius,
            color: e.color,
        },
        None => ElementDisplay {
            radius: 1.00,
            color: (1.00, 0.08, 0.58),
        },
    }
}

/// CSS hex color for the HTML renderer, e.g. "#ff0d0d" for oxygen.
pub fn hex_color(element: &str) -> String {
    let (r, g, b) = display_properties(element).color;
    format!(
        "#{:02x}{:02x}{:02x}",
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8
    )
}
