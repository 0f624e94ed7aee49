use crate::error::{Error, Result};
use nalgebra::Matrix3;
use serde::Serialize;
use std::collections::BTreeMap;

/// Determinants below this are treated as a degenerate (collapsed) cell.
const MIN_CELL_VOLUME: f64 = 1e-8;

/// Unit cell basis. Rows are the lattice vectors a, b, c in Angstroms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Lattice {
    pub vectors: [[f64; 3]; 3],
}

impl Lattice {
    pub fn new(vectors: [[f64; 3]; 3]) -> Result<Self> {
        let lat = Lattice { vectors };
        let vol = lat.matrix().determinant();
        if !vol.is_finite() || vol.abs() < MIN_CELL_VOLUME {
            return Err(Error::MalformedInput(format!(
                "degenerate lattice (cell volume {:.3e})",
                vol
            )));
        }
        Ok(lat)
    }

    /// Build the basis from cell lengths (Angstroms) and angles (degrees),
    /// a along x and b in the xy plane.
    pub fn from_parameters(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self> {
        if a <= 0.0 || b <= 0.0 || c <= 0.0 {
            return Err(Error::MalformedInput(format!(
                "non-positive cell lengths a={} b={} c={}",
                a, b, c
            )));
        }
        let (cos_a, cos_b, cos_g) = (
            alpha.to_radians().cos(),
            beta.to_radians().cos(),
            gamma.to_radians().cos(),
        );
        let sin_g = gamma.to_radians().sin();
        if sin_g.abs() < 1e-10 {
            return Err(Error::MalformedInput(format!("gamma = {} degrees", gamma)));
        }
        // Squared reduced volume; non-positive means the angles cannot close a cell.
        let v2 = 1.0 - cos_a * cos_a - cos_b * cos_b - cos_g * cos_g + 2.0 * cos_a * cos_b * cos_g;
        if v2 <= 0.0 {
            return Err(Error::MalformedInput(format!(
                "cell angles ({}, {}, {}) do not define a valid cell",
                alpha, beta, gamma
            )));
        }
        let v = v2.sqrt();
        Lattice::new([
            [a, 0.0, 0.0],
            [b * cos_g, b * sin_g, 0.0],
            [c * cos_b, c * (cos_a - cos_b * cos_g) / sin_g, c * v / sin_g],
        ])
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        let v = self.vectors;
        Matrix3::new(
            v[0][0], v[0][1], v[0][2], //
            v[1][0], v[1][1], v[1][2], //
            v[2][0], v[2][1], v[2][2],
        )
    }

    pub fn volume(&self) -> f64 {
        self.matrix().determinant().abs()
    }

    /// Cell lengths (a, b, c) and angles (alpha, beta, gamma) in degrees.
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [av, bv, cv] = self.vectors;
        let norm = |v: [f64; 3]| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        let dot = |u: [f64; 3], v: [f64; 3]| u[0] * v[0] + u[1] * v[1] + u[2] * v[2];
        let (a, b, c) = (norm(av), norm(bv), norm(cv));
        let alpha = (dot(bv, cv) / (b * c)).clamp(-1.0, 1.0).acos().to_degrees();
        let beta = (dot(av, cv) / (a * c)).clamp(-1.0, 1.0).acos().to_degrees();
        let gamma = (dot(av, bv) / (a * b)).clamp(-1.0, 1.0).acos().to_degrees();
        (a, b, c, alpha, beta, gamma)
    }

    pub fn to_cartesian(&self, frac: [f64; 3]) -> [f64; 3] {
        let v = self.vectors;
        [
            frac[0] * v[0][0] + frac[1] * v[1][0] + frac[2] * v[2][0],
            frac[0] * v[0][1] + frac[1] * v[1][1] + frac[2] * v[2][1],
            frac[0] * v[0][2] + frac[1] * v[1][2] + frac[2] * v[2][2],
        ]
    }

    pub fn to_fractional(&self, cart: [f64; 3]) -> [f64; 3] {
        // Non-degeneracy is enforced at construction, so the inverse exists.
        let inv = self.matrix().try_inverse().unwrap_or_else(Matrix3::zeros);
        [
            cart[0] * inv[(0, 0)] + cart[1] * inv[(1, 0)] + cart[2] * inv[(2, 0)],
            cart[0] * inv[(0, 1)] + cart[1] * inv[(1, 1)] + cart[2] * inv[(2, 1)],
            cart[0] * inv[(0, 2)] + cart[1] * inv[(1, 2)] + cart[2] * inv[(2, 2)],
        ]
    }
}

/// Wrap a fractional coordinate into [0, 1).
pub fn wrap_frac(x: f64) -> f64 {
    let w = x.rem_euclid(1.0);
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}

/// One atomic site: species label plus fractional coordinates. Structured
/// input comes through the constructors (CIF parsing, moyo output), so the
/// serde derive is serialize-only; deserializing would skip the wrapping
/// and occupancy checks.
#[derive(Clone, Debug, Serialize)]
pub struct Site {
    pub species: String,
    pub frac: [f64; 3],
    pub occupancy: f64,
}

impl Site {
    pub fn new(species: impl Into<String>, frac: [f64; 3]) -> Self {
        Site {
            species: species.into(),
            frac: [wrap_frac(frac[0]), wrap_frac(frac[1]), wrap_frac(frac[2])],
            occupancy: 1.0,
        }
    }

    pub fn with_occupancy(mut self, occupancy: f64) -> Self {
        self.occupancy = if occupancy > 0.0 && occupancy <= 1.0 {
            occupancy
        } else {
            1.0
        };
        self
    }
}

/// An immutable crystal structure. Reduction never mutates in place; it
/// produces a new `Structure` so the original stays available for
/// comparison renders.
#[derive(Clone, Debug, Serialize)]
pub struct Structure {
    pub lattice: Lattice,
    pub sites: Vec<Site>,
    /// Space-group label carried through from the input file. Advisory only;
    /// symmetry is always re-derived numerically.
    pub space_group_hint: Option<String>,
}

impl Structure {
    pub fn new(lattice: Lattice, sites: Vec<Site>) -> Result<Self> {
        if sites.is_empty() {
            return Err(Error::MalformedInput("structure has no sites".into()));
        }
        let sites = sites
            .into_iter()
            .map(|s| {
                let occ = s.occupancy;
                Site::new(s.species, s.frac).with_occupancy(occ)
            })
            .collect();
        Ok(Structure {
            lattice,
            sites,
            space_group_hint: None,
        })
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.space_group_hint = hint;
        self
    }

    pub fn volume(&self) -> f64 {
        self.lattice.volume()
    }

    /// Alphabetically sorted element counts, e.g. "Cl1 Na2".
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for site in &self.sites {
            *counts.entry(site.species.as_str()).or_insert(0) += 1;
        }
        counts
            .iter()
            .map(|(el, n)| format!("{}{}", el, n))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn cartesian_positions(&self) -> Vec<[f64; 3]> {
        self.sites
            .iter()
            .map(|s| self.lattice.to_cartesian(s.frac))
            .collect()
    }
}
