//! End-to-end pipeline checks: parse -> reduce -> write -> re-parse, plus
//! artifact generation from the batch outputs.

use primcell::io::cif;
use primcell::{batch, rendering, BatchConfig, MoyoReducer, PrimitiveReducer};
use std::fs;
use std::path::Path;

/// Conventional FCC copper: 4-fold redundant sites.
const FCC_COPPER: &str = "\
data_Cu
_cell_length_a 3.615
_cell_length_b 3.615
_cell_length_c 3.615
_cell_angle_alpha 90.0
_cell_angle_beta 90.0
_cell_angle_gamma 90.0
_symmetry_space_group_name_H-M 'F m -3 m'
loop_
 _atom_site_type_symbol
 _atom_site_fract_x
 _atom_site_fract_y
 _atom_site_fract_z
 Cu 0.0 0.0 0.0
 Cu 0.0 0.5 0.5
 Cu 0.5 0.0 0.5
 Cu 0.5 0.5 0.0
";

/// Simple cubic, one site: already primitive.
const CUBIC_PO: &str = "\
data_Po
_cell_length_a 5.0
_cell_length_b 5.0
_cell_length_c 5.0
_cell_angle_alpha 90.0
_cell_angle_beta 90.0
_cell_angle_gamma 90.0
loop_
 _atom_site_type_symbol
 _atom_site_fract_x
 _atom_site_fract_y
 _atom_site_fract_z
 Po 0.0 0.0 0.0
";

fn seed_inputs(dir: &Path) {
    fs::write(dir.join("cu_fcc.cif"), FCC_COPPER).unwrap();
    fs::write(dir.join("po_cubic.cif"), CUBIC_PO).unwrap();
    fs::write(dir.join("junk.cif"), "definitely not a CIF\n").unwrap();
}

#[test]
fn batch_reduces_and_survives_bad_input() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    seed_inputs(input.path());

    let config = BatchConfig::new(input.path(), output.path());
    let report = batch::run(&config, &MoyoReducer).unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.already_primitive, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, "junk.cif");
    assert_eq!(report.failures[0].kind, "malformed-input");

    // FCC conventional cell collapses to the 1-atom primitive cell,
    // volume divided by the centering factor 4.
    let cu = cif::read_file(&output.path().join("cu_fcc.cif")).unwrap();
    assert_eq!(cu.sites.len(), 1);
    let expected = 3.615f64.powi(3) / 4.0;
    assert!(
        (cu.volume() - expected).abs() / expected < 1e-3,
        "primitive Cu volume {} vs expected {}",
        cu.volume(),
        expected
    );

    // The already-primitive cell passes through unchanged.
    let po = cif::read_file(&output.path().join("po_cubic.cif")).unwrap();
    assert_eq!(po.sites.len(), 1);
    assert!((po.volume() - 125.0).abs() < 1e-3);

    // The malformed file produced no output.
    assert!(!output.path().join("junk.cif").exists());
}

#[test]
fn written_primitive_cell_is_stable_under_rereduction() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("cu.cif"), FCC_COPPER).unwrap();

    let config = BatchConfig::new(input.path(), output.path());
    batch::run(&config, &MoyoReducer).unwrap();

    let primitive = cif::read_file(&output.path().join("cu.cif")).unwrap();
    let again = MoyoReducer
        .reduce(&primitive, primcell::DEFAULT_TOLERANCE)
        .unwrap();
    assert!(!again.changed);
    assert!(again.structure.volume() <= primitive.volume() + 1e-9);
}

#[test]
fn second_run_produces_identical_outputs() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    seed_inputs(input.path());

    let config = BatchConfig::new(input.path(), output.path());
    batch::run(&config, &MoyoReducer).unwrap();
    let first = fs::read_to_string(output.path().join("cu_fcc.cif")).unwrap();
    batch::run(&config, &MoyoReducer).unwrap();
    let second = fs::read_to_string(output.path().join("cu_fcc.cif")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn artifacts_generated_from_pipeline_outputs() {
    let artifacts = tempfile::tempdir().unwrap();

    let original = cif::parse(FCC_COPPER).unwrap();
    let reduced = MoyoReducer
        .reduce(&original, primcell::DEFAULT_TOLERANCE)
        .unwrap()
        .structure;

    let png = artifacts.path().join("cu.png");
    rendering::render_png(&original, "Cu original", &png, 800, 600).unwrap();
    assert!(fs::metadata(&png).unwrap().len() > 0);

    let html = artifacts.path().join("cu_compare.html");
    rendering::render_comparison_html(&original, &reduced, "Cu original vs primitive", &html)
        .unwrap();
    let body = fs::read_to_string(&html).unwrap();
    assert!(body.contains("original"));
    assert!(body.contains("primitive"));
    assert!(body.contains("scatter3d"));
}
