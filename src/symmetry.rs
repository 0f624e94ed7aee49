//! Primitive-cell reduction behind a narrow interface.
//!
//! The symmetry search itself is delegated to moyo; this module only
//! converts between our `Structure` and moyo's cell representation and
//! enforces the reduction contract (never return a larger cell, report
//! whether anything changed).

use crate::error::{Error, Result};
use crate::model::{Lattice, Site, Structure};
use moyo::base::{AngleTolerance, Cell};
use moyo::data::Setting;
use moyo::MoyoDataset;
use nalgebra::Vector3;

/// Default symprec, matching the usual CIF coordinate precision.
pub const DEFAULT_TOLERANCE: f64 = 1e-2;

#[derive(Clone, Debug)]
pub struct ReductionResult {
    pub structure: Structure,
    /// False means the input was already primitive at this tolerance.
    pub changed: bool,
    pub tolerance: f64,
}

/// Swappable reduction backend. The batch driver and renderers only see
/// this trait, so the underlying library can be replaced without touching
/// them.
pub trait PrimitiveReducer: Sync {
    fn reduce(&self, structure: &Structure, tolerance: f64) -> Result<ReductionResult>;
}

/// Detected space group, for logs and reports.
#[derive(Clone, Debug)]
pub struct SymmetryInfo {
    pub number: i32,
    pub symbol: String,
    pub system: String,
}

/// Production reducer backed by moyo.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoyoReducer;

impl PrimitiveReducer for MoyoReducer {
    fn reduce(&self, structure: &Structure, tolerance: f64) -> Result<ReductionResult> {
        let (cell, species_table) = to_moyo_cell(structure);
        let dataset = run_moyo(&cell, tolerance)?;
        let prim = &dataset.prim_std_cell;

        if prim.numbers.is_empty() || prim.numbers.len() >= structure.sites.len() {
            return Ok(ReductionResult {
                structure: structure.clone(),
                changed: false,
                tolerance,
            });
        }

        let basis = prim.lattice.basis;
        let lattice = Lattice::new([
            [basis.m11, basis.m12, basis.m13],
            [basis.m21, basis.m22, basis.m23],
            [basis.m31, basis.m32, basis.m33],
        ])
        .map_err(|e| Error::SymmetryDetection(format!("degenerate primitive cell: {}", e)))?;

        let mut sites = Vec::with_capacity(prim.numbers.len());
        for (pos, id) in prim.positions.iter().zip(&prim.numbers) {
            let (species, occupancy) = species_table
                .get((id - 1) as usize)
                .cloned()
                .unwrap_or_else(|| ("X".to_string(), 1.0));
            sites.push(Site::new(species, [pos.x, pos.y, pos.z]).with_occupancy(occupancy));
        }

        let reduced = Structure::new(lattice, sites)
            .map_err(|e| Error::SymmetryDetection(e.to_string()))?
            .with_hint(Some(space_group_symbol(dataset.number)));

        // The contract forbids returning an equal-volume-but-different cell.
        if reduced.volume() >= structure.volume() * (1.0 - 1e-6) {
            return Ok(ReductionResult {
                structure: structure.clone(),
                changed: false,
                tolerance,
            });
        }

        Ok(ReductionResult {
            structure: reduced,
            changed: true,
            tolerance,
        })
    }
}

/// Read-only space-group check of a structure.
pub fn analyze(structure: &Structure, tolerance: f64) -> Result<SymmetryInfo> {
    let (cell, _) = to_moyo_cell(structure);
    let dataset = run_moyo(&cell, tolerance)?;
    Ok(SymmetryInfo {
        number: dataset.number,
        symbol: space_group_symbol(dataset.number),
        system: crystal_system(dataset.number).to_string(),
    })
}

fn run_moyo(cell: &Cell, tolerance: f64) -> Result<MoyoDataset> {
    MoyoDataset::new(cell, tolerance, AngleTolerance::Default, Setting::Spglib, true)
        .map_err(|e| Error::SymmetryDetection(format!("{:?}", e)))
}

/// Moyo identifies sites by integer type. Distinct (species, occupancy)
/// pairs get distinct types so partially occupied sites never merge with
/// fully occupied ones of the same element.
fn to_moyo_cell(structure: &Structure) -> (Cell, Vec<(String, f64)>) {
    let mut table: Vec<(String, f64)> = Vec::new();
    let mut positions = Vec::with_capacity(structure.sites.len());
    let mut numbers = Vec::with_capacity(structure.sites.len());

    for site in &structure.sites {
        positions.push(Vector3::new(site.frac[0], site.frac[1], site.frac[2]));
        let id = match table
            .iter()
            .position(|(sp, occ)| *sp == site.species && (occ - site.occupancy).abs() < 1e-6)
        {
            Some(i) => i,
            None => {
                table.push((site.species.clone(), site.occupancy));
                table.len() - 1
            }
        };
        numbers.push(id as i32 + 1);
    }

    let lattice = moyo::base::Lattice::new(structure.lattice.matrix());
    (Cell::new(lattice, positions, numbers), table)
}

fn crystal_system(number: i32) -> &'static str {
    match number {
        1..=2 => "Triclinic",
        3..=15 => "Monoclinic",
        16..=74 => "Orthorhombic",
        75..=142 => "Tetragonal",
        143..=167 => "Trigonal",
        168..=194 => "Hexagonal",
        195..=230 => "Cubic",
        _ => "Unknown",
    }
}

fn space_group_symbol(number: i32) -> String {
    if (1..=230).contains(&number) {
        SG_SYMBOLS[number as usize].to_string()
    } else {
        "Unknown".to_string()
    }
}

const SG_SYMBOLS: [&str; 231] = ["","P1", "P-1", "P121", "P12_11", "C121", "P1m1", "P1c1", "C1m1", "C1c1", "P12/m1", "P12_1/m1", "C12/m1", "P12/c1", "P12_1/c1", "C12/c1", "P222", "P222_1", "P2_12_12", "P2_12_12_1", "C222_1", "C222", "F222", "I222", "I2_12_12_1", "Pmm2", "Pmc2_1", "Pcc2", "Pma2", "Pca2_1", "Pnc2", "Pmn2_1", "Pba2", "Pna2_1", "Pnn2", "Cmm2", "Cmc2_1", "Ccc2", "Amm2", "Aem2", "Ama2", "Aea2", "Fmm2", "Fdd2", "Imm2", "Iba2", "Ima2", "Pmmm", "Pnnn", "Pccm", "Pban", "Pmma", "Pnna", "Pmna", "Pcca", "Pbam", "Pccn", "Pbcm", "Pnnm", "Pmmn", "Pbcn", "Pbca", "Pnma", "Cmcm", "Cmce", "Cmmm", "Cccm", "Cmme", "Ccce", "Fmmm", "Fddd", "Immm", "Ibam", "Ibca", "Imma", "P4", "P4_1", "P4_2", "P4_3", "I4", "I4_1", "P-4", "I-4", "P4/m", "P4_2/m", "P4/n", "P4_2/n", "I4/m", "I4_1/a", "P422", "P42_12", "P4_122", "P4_12_12", "P4_222", "P4_22_12", "P4_322", "P4_32_12", "I422", "I4_122", "P4mm", "P4bm", "P4_2cm", "P4_2nm", "P4cc", "P4nc", "P4_2mc", "P4_2bc", "I4mm", "I4cm", "I4_1md", "I4_1cd", "P-42m", "P42c", "P-42_1m", "P-42_1c", "P-4m2", "P-4c2", "P-4b2", "P-4n2", "I-4m2", "I-4c2", "I-42m", "I-42d", "P4/mmm", "P4/mcc", "P4/nbm", "P4/nnc", "P4/mbm", "P4/mnc", "P4/nmm", "P4/ncc", "P4_2/mmc", "P4_2/mcm", "P4_2/nbc", "P4_2/nnm", "P4_2/mbc", "P4_2/mnm", "P4_2/nmc", "P4_2/ncm", "I4/mmm", "I4/mcm", "I4_1/amd", "I4_1/acd", "P3", "P3_1", "P3_2", "R3", "P-3", "R-3", "P312", "P321", "P3_112", "P3_121", "P3_212", "P3_221", "R32", "P3m1", "P31m", "P3c1", "P31c", "R3m", "R3c", "P-31m", "P-31c", "P-3m1", "P-3c1", "R-3m", "R-3c", "P6", "P6_1", "P6_5", "P6_2", "P6_4", "P6_3", "P-6", "P6/m", "P6_3/m", "P622", "P6_122", "P6_522", "P6_222", "P6_422", "P6_322", "P6mm", "P6cc", "P6_3cm", "P6_3mc", "P-6m2", "P-6c2", "P-62m", "P-62c", "P6/mmm", "P6/mcc", "P6_3/mcm", "P6_3/mmc", "P23", "F23", "I23", "P2_13", "I2_13", "Pm-3", "Pn-3", "Fm-3", "Fd-3", "Im-3", "Pa-3", "Ia-3", "P432", "P4_232", "F432", "F4_132", "I432", "P4_332", "P4_132", "I4_132", "P-43m", "F-43m", "I-43m", "P-43n", "F-43c", "I-43d", "Pm-3m", "Pn-3n", "Pm-3n", "Pn-3m", "Fm-3m", "Fm-3c", "Fd-3m", "Fd-3c", "Im-3m", "Ia-3d"];

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic_lattice(a: f64) -> Lattice {
        Lattice::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]]).unwrap()
    }

    /// Conventional FCC copper: 4 atoms, one primitive.
    fn fcc_copper() -> Structure {
        Structure::new(
            cubic_lattice(3.615),
            vec![
                Site::new("Cu", [0.0, 0.0, 0.0]),
                Site::new("Cu", [0.0, 0.5, 0.5]),
                Site::new("Cu", [0.5, 0.0, 0.5]),
                Site::new("Cu", [0.5, 0.5, 0.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn fcc_reduces_by_factor_four() {
        let original = fcc_copper();
        let result = MoyoReducer.reduce(&original, DEFAULT_TOLERANCE).unwrap();
        assert!(result.changed);
        assert_eq!(result.structure.sites.len(), 1);
        let ratio = original.volume() / result.structure.volume();
        assert!((ratio - 4.0).abs() < 1e-3, "volume ratio was {}", ratio);
    }

    #[test]
    fn reduced_volume_never_exceeds_original() {
        let original = fcc_copper();
        let result = MoyoReducer.reduce(&original, DEFAULT_TOLERANCE).unwrap();
        assert!(result.structure.volume() <= original.volume() + 1e-9);
    }

    #[test]
    fn single_site_cubic_is_already_primitive() {
        let s = Structure::new(cubic_lattice(5.0), vec![Site::new("Po", [0.0, 0.0, 0.0])])
            .unwrap();
        let result = MoyoReducer.reduce(&s, DEFAULT_TOLERANCE).unwrap();
        assert!(!result.changed);
        assert_eq!(result.structure.sites.len(), 1);
        assert!((result.structure.volume() - 125.0).abs() < 1e-6);
    }

    #[test]
    fn reduction_is_idempotent() {
        let first = MoyoReducer.reduce(&fcc_copper(), DEFAULT_TOLERANCE).unwrap();
        assert!(first.changed);
        let second = MoyoReducer
            .reduce(&first.structure, DEFAULT_TOLERANCE)
            .unwrap();
        assert!(!second.changed);
    }

    #[test]
    fn rock_salt_reduces_to_two_sites() {
        let s = Structure::new(
            cubic_lattice(5.64),
            vec![
                Site::new("Na", [0.0, 0.0, 0.0]),
                Site::new("Na", [0.0, 0.5, 0.5]),
                Site::new("Na", [0.5, 0.0, 0.5]),
                Site::new("Na", [0.5, 0.5, 0.0]),
                Site::new("Cl", [0.5, 0.5, 0.5]),
                Site::new("Cl", [0.5, 0.0, 0.0]),
                Site::new("Cl", [0.0, 0.5, 0.0]),
                Site::new("Cl", [0.0, 0.0, 0.5]),
            ],
        )
        .unwrap();
        let result = MoyoReducer.reduce(&s, DEFAULT_TOLERANCE).unwrap();
        assert!(result.changed);
        assert_eq!(result.structure.sites.len(), 2);
        assert_eq!(result.structure.formula(), "Cl1 Na1");
    }

    #[test]
    fn analyze_detects_cubic_system() {
        let info = analyze(&fcc_copper(), DEFAULT_TOLERANCE).unwrap();
        assert_eq!(info.system, "Cubic");
        assert_eq!(info.number, 225);
        assert_eq!(info.symbol, "Fm-3m");
    }
}
