//! Geometry shared by the static and interactive renderers: cell wireframe,
//! Cartesian site markers and periodic ghost images near cell boundaries.

use crate::error::{Error, Result};
use crate::model::Structure;

/// Fractional distance to a cell face below which a site gets a ghost image
/// on the opposite face, for visual continuity of the wireframe.
const BOUNDARY_EPS: f64 = 0.05;

/// Corner index is the bit pattern (x << 2) | (y << 1) | z over {0, 1}.
pub const CELL_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (0, 2),
    (0, 4),
    (1, 3),
    (1, 5),
    (2, 3),
    (2, 6),
    (3, 7),
    (4, 5),
    (4, 6),
    (5, 7),
    (6, 7),
];

pub struct SceneSite {
    pub position: [f64; 3],
    pub species: String,
    /// True for periodic images added at cell boundaries.
    pub is_image: bool,
}

pub struct Scene {
    pub corners: [[f64; 3]; 8],
    pub sites: Vec<SceneSite>,
    /// Sorted unique species, legend order.
    pub species: Vec<String>,
    pub min: [f64; 3],
    pub max: [f64; 3],
}

pub fn build(structure: &Structure, periodic_images: bool) -> Result<Scene> {
    if structure.sites.is_empty() {
        return Err(Error::EmptyStructure);
    }

    let lattice = &structure.lattice;
    let mut corners = [[0.0; 3]; 8];
    for (idx, corner) in corners.iter_mut().enumerate() {
        let frac = [
            ((idx >> 2) & 1) as f64,
            ((idx >> 1) & 1) as f64,
            (idx & 1) as f64,
        ];
        *corner = lattice.to_cartesian(frac);
    }

    let mut sites = Vec::new();
    for site in &structure.sites {
        for frac in image_candidates(site.frac, periodic_images) {
            let is_image = (0..3).any(|k| (frac[k] - site.frac[k]).abs() > 1e-9);
            sites.push(SceneSite {
                position: lattice.to_cartesian(frac),
                species: site.species.clone(),
                is_image,
            });
        }
    }

    let mut species: Vec<String> = sites.iter().map(|s| s.species.clone()).collect();
    species.sort();
    species.dedup();

    let mut min = [f64::MAX; 3];
    let mut max = [f64::MIN; 3];
    for p in corners.iter().chain(sites.iter().map(|s| &s.position)) {
        for k in 0..3 {
            min[k] = min[k].min(p[k]);
            max[k] = max[k].max(p[k]);
        }
    }

    Ok(Scene {
        corners,
        sites,
        species,
        min,
        max,
    })
}

/// Every fractional position a site occupies once boundary images are
/// added. Coordinates are wrapped to [0, 1), so only the low face needs
/// checking: a site at ~0 also sits at ~1 of the previous cell.
fn image_candidates(frac: [f64; 3], periodic_images: bool) -> Vec<[f64; 3]> {
    if !periodic_images {
        return vec![frac];
    }
    let axis_values = |f: f64| {
        if f < BOUNDARY_EPS {
            vec![f, f + 1.0]
        } else if f > 1.0 - BOUNDARY_EPS {
            vec![f, f - 1.0]
        } else {
            vec![f]
        }
    };
    let mut out = Vec::new();
    for &fx in &axis_values(frac[0]) {
        for &fy in &axis_values(frac[1]) {
            for &fz in &axis_values(frac[2]) {
                out.push([fx, fy, fz]);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Lattice, Site};

    fn cubic(a: f64) -> Lattice {
        Lattice::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]).unwrap()
    }

    #[test]
    fn empty_structure_is_rejected() {
        let s = Structure {
            lattice: cubic(5.0),
            sites: vec![],
            space_group_hint: None,
        };
        assert!(matches!(build(&s, false), Err(Error::EmptyStructure)));
    }

    #[test]
    fn wireframe_has_eight_corners_and_twelve_edges() {
        let s = Structure::new(cubic(2.0), vec![Site::new("C", [0.5, 0.5, 0.5])]).unwrap();
        let scene = build(&s, false).unwrap();
        assert_eq!(scene.corners.len(), 8);
        assert_eq!(CELL_EDGES.len(), 12);
        // Every edge of a cube has length a.
        for (i, j) in CELL_EDGES {
            let d: f64 = (0..3)
                .map(|k| (scene.corners[i][k] - scene.corners[j][k]).powi(2))
                .sum::<f64>()
                .sqrt();
            assert!((d - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn interior_site_has_no_images() {
        let s = Structure::new(cubic(4.0), vec![Site::new("Fe", [0.5, 0.5, 0.5])]).unwrap();
        let scene = build(&s, true).unwrap();
        assert_eq!(scene.sites.len(), 1);
        assert!(!scene.sites[0].is_image);
    }

    #[test]
    fn corner_site_gets_seven_images() {
        let s = Structure::new(cubic(4.0), vec![Site::new("Fe", [0.0, 0.0, 0.0])]).unwrap();
        let scene = build(&s, true).unwrap();
        assert_eq!(scene.sites.len(), 8);
        assert_eq!(scene.sites.iter().filter(|x| x.is_image).count(), 7);
    }

    #[test]
    fn species_list_sorted_unique() {
        let s = Structure::new(
            cubic(4.0),
            vec![
                Site::new("O", [0.5, 0.5, 0.5]),
                Site::new("Fe", [0.25, 0.25, 0.25]),
                Site::new("O", [0.75, 0.75, 0.75]),
            ],
        )
        .unwrap();
        let scene = build(&s, false).unwrap();
        assert_eq!(scene.species, vec!["Fe".to_string(), "O".to_string()]);
    }
}
