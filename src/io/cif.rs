//! CIF reading and writing.
//!
//! `parse` and `serialize` are pure functions over text. The parser handles
//! the cell-parameter tags, the `_atom_site_*` loop and, when present, a
//! symmetry-operator loop whose operations are expanded into an explicit P1
//! site list with duplicates removed.

use crate::error::{Error, Result};
use crate::model::{Lattice, Site, Structure};
use std::fs;
use std::path::Path;

/// Fractional distance below which two expanded sites are the same atom.
const DUPLICATE_EPS: f64 = 1e-3;

pub fn read_file(path: &Path) -> Result<Structure> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}

pub fn write_file(path: &Path, structure: &Structure) -> Result<()> {
    fs::write(path, serialize(structure))?;
    Ok(())
}

pub fn parse(text: &str) -> Result<Structure> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    let mut a = None;
    let mut b = None;
    let mut c = None;
    let mut alpha = None;
    let mut beta = None;
    let mut gamma = None;
    let mut hint: Option<String> = None;
    let mut ops: Vec<String> = Vec::new();
    let mut base_sites: Vec<Site> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if line.starts_with("loop_") {
            i += 1;
            let mut headers: Vec<&str> = Vec::new();
            while i < lines.len() && lines[i].starts_with('_') {
                headers.push(lines[i]);
                i += 1;
            }
            let mut rows: Vec<&str> = Vec::new();
            while i < lines.len()
                && !lines[i].starts_with('_')
                && !lines[i].starts_with("loop_")
                && !lines[i].starts_with("data_")
            {
                rows.push(lines[i]);
                i += 1;
            }

            if headers.iter().any(|h| h.contains("_atom_site_fract_x")) {
                parse_atom_rows(&headers, &rows, &mut base_sites)?;
            } else if headers.iter().any(|h| {
                h.contains("_symmetry_equiv_pos_as_xyz")
                    || h.contains("_space_group_symop_operation_xyz")
            }) {
                for row in rows {
                    if let Some(op) = extract_symmetry_op(row) {
                        ops.push(op);
                    }
                }
            }
            continue;
        }

        let mut parts = line.split_whitespace();
        if let Some(key) = parts.next() {
            match key {
                "_cell_length_a" => a = Some(require_float(line, key)?),
                "_cell_length_b" => b = Some(require_float(line, key)?),
                "_cell_length_c" => c = Some(require_float(line, key)?),
                "_cell_angle_alpha" => alpha = Some(require_float(line, key)?),
                "_cell_angle_beta" => beta = Some(require_float(line, key)?),
                "_cell_angle_gamma" => gamma = Some(require_float(line, key)?),
                "_symmetry_space_group_name_H-M" | "_space_group_name_H-M_alt" => {
                    let value = line[key.len()..].trim().trim_matches(['\'', '"']);
                    if !value.is_empty() {
                        hint = Some(value.to_string());
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    let (a, b, c) = match (a, b, c) {
        (Some(a), Some(b), Some(c)) => (a, b, c),
        _ => {
            return Err(Error::MalformedInput(
                "missing cell lengths (_cell_length_a/b/c)".into(),
            ))
        }
    };
    let (alpha, beta, gamma) = match (alpha, beta, gamma) {
        (Some(al), Some(be), Some(ga)) => (al, be, ga),
        _ => {
            return Err(Error::MalformedInput(
                "missing cell angles (_cell_angle_alpha/beta/gamma)".into(),
            ))
        }
    };
    if base_sites.is_empty() {
        return Err(Error::MalformedInput("no atom site loop found".into()));
    }

    let lattice = Lattice::from_parameters(a, b, c, alpha, beta, gamma)?;

    // A CIF with no operator loop is an explicit P1 listing.
    if ops.is_empty() {
        ops.push("x,y,z".to_string());
    }
    let sites = expand_symmetry(&base_sites, &ops);

    Ok(Structure::new(lattice, sites)?.with_hint(hint))
}

fn parse_atom_rows(headers: &[&str], rows: &[&str], sites: &mut Vec<Site>) -> Result<()> {
    let col = |name: &str| headers.iter().position(|h| h.contains(name));
    let x_idx = col("_atom_site_fract_x")
        .ok_or_else(|| Error::MalformedInput("missing _atom_site_fract_x".into()))?;
    let y_idx = col("_atom_site_fract_y")
        .ok_or_else(|| Error::MalformedInput("missing _atom_site_fract_y".into()))?;
    let z_idx = col("_atom_site_fract_z")
        .ok_or_else(|| Error::MalformedInput("missing _atom_site_fract_z".into()))?;
    let symbol_idx = col("_atom_site_type_symbol");
    let label_idx = col("_atom_site_label");
    let occ_idx = col("_atom_site_occupancy");

    for row in rows {
        let fields: Vec<&str> = row.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }
        let species_field = symbol_idx
            .or(label_idx)
            .and_then(|idx| fields.get(idx))
            .copied()
            .unwrap_or("X");
        let species: String = species_field
            .chars()
            .take_while(|ch| ch.is_ascii_alphabetic())
            .collect();
        if species.is_empty() {
            return Err(Error::MalformedInput(format!(
                "atom row without species label: '{}'",
                row
            )));
        }

        let coord = |idx: usize| -> Result<f64> {
            let field = fields.get(idx).ok_or_else(|| {
                Error::MalformedInput(format!("atom row too short: '{}'", row))
            })?;
            parse_float(field)
                .ok_or_else(|| Error::MalformedInput(format!("bad coordinate '{}'", field)))
        };

        let mut site = Site::new(species, [coord(x_idx)?, coord(y_idx)?, coord(z_idx)?]);
        if let Some(occ) = occ_idx.and_then(|idx| fields.get(idx)).and_then(|f| parse_float(f)) {
            site = site.with_occupancy(occ);
        }
        sites.push(site);
    }
    Ok(())
}

/// Apply every operator to every base site, wrap into [0,1) and drop
/// coincident duplicates (within periodic tolerance).
fn expand_symmetry(base: &[Site], ops: &[String]) -> Vec<Site> {
    let mut out: Vec<Site> = Vec::new();
    for site in base {
        for op in ops {
            let Some(pos) = apply_op(op, site.frac) else {
                continue;
            };
            let candidate = Site::new(site.species.clone(), pos).with_occupancy(site.occupancy);
            let duplicate = out.iter().any(|existing| {
                existing.species == candidate.species
                    && (0..3).all(|k| {
                        let d = (existing.frac[k] - candidate.frac[k]).abs();
                        d < DUPLICATE_EPS || (1.0 - d) < DUPLICATE_EPS
                    })
            });
            if !duplicate {
                out.push(candidate);
            }
        }
    }
    out
}

/// Pull the "x, y, z" part out of an operator row, which may carry an index
/// and quoting: `1 'x, -y, z+1/2'`. Fraction-first operators like
/// `1/2+x, 1/2+y, z` must keep their leading digits.
fn extract_symmetry_op(row: &str) -> Option<String> {
    let trimmed = row.trim();

    // Quoted rows: the operator is exactly the quoted substring.
    for quote in ['\'', '"'] {
        if let (Some(start), Some(end)) = (trimmed.find(quote), trimmed.rfind(quote)) {
            if end > start {
                let op = trimmed[start + 1..end].trim();
                if op.matches(',').count() == 2 {
                    return Some(op.to_string());
                }
            }
        }
    }

    // Unquoted rows: drop a standalone integer index token, but only when
    // what follows is still a full three-component operator.
    let mut op = trimmed;
    if let Some((first, rest)) = trimmed.split_once(char::is_whitespace) {
        if !first.is_empty()
            && first.chars().all(|ch| ch.is_ascii_digit())
            && rest.matches(',').count() == 2
        {
            op = rest.trim();
        }
    }
    if op.matches(',').count() == 2 {
        Some(op.to_string())
    } else {
        None
    }
}

fn apply_op(op: &str, p: [f64; 3]) -> Option<[f64; 3]> {
    let comps: Vec<&str> = op.split(',').collect();
    if comps.len() != 3 {
        return None;
    }
    Some([
        eval_component(comps[0], p),
        eval_component(comps[1], p),
        eval_component(comps[2], p),
    ])
}

/// Evaluate one component of a symmetry operator, e.g. "-x+1/2".
fn eval_component(expr: &str, p: [f64; 3]) -> f64 {
    let compact: String = expr
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let mut total = 0.0;
    let mut term = String::new();
    for ch in compact.chars() {
        if (ch == '+' || ch == '-') && !term.is_empty() {
            total += eval_term(&term, p);
            term.clear();
        }
        term.push(ch);
    }
    if !term.is_empty() {
        total += eval_term(&term, p);
    }
    total
}

fn eval_term(term: &str, p: [f64; 3]) -> f64 {
    let (sign, body) = match term.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, term.strip_prefix('+').unwrap_or(term)),
    };
    if body.contains('x') {
        return sign * p[0];
    }
    if body.contains('y') {
        return sign * p[1];
    }
    if body.contains('z') {
        return sign * p[2];
    }
    if let Some((num, den)) = body.split_once('/') {
        let n: f64 = num.parse().unwrap_or(0.0);
        let d: f64 = den.parse().unwrap_or(1.0);
        return sign * n / d;
    }
    sign * body.parse::<f64>().unwrap_or(0.0)
}

/// Parse a CIF numeric field, dropping the uncertainty suffix: "1.234(5)".
fn parse_float(field: &str) -> Option<f64> {
    let clean = field.split('(').next().unwrap_or(field);
    clean.parse::<f64>().ok()
}

fn require_float(line: &str, key: &str) -> Result<f64> {
    line.split_whitespace()
        .nth(1)
        .and_then(parse_float)
        .ok_or_else(|| Error::MalformedInput(format!("bad numeric value for {}", key)))
}

pub fn serialize(structure: &Structure) -> String {
    let (a, b, c, alpha, beta, gamma) = structure.lattice.parameters();
    let mut out = String::new();

    out.push_str("data_primcell\n");
    out.push_str(&format!("_chemical_formula_sum '{}'\n", structure.formula()));
    // Sites are written as an explicit list, so the cell is declared P1.
    out.push_str("_symmetry_space_group_name_H-M 'P 1'\n");
    out.push_str("_symmetry_Int_Tables_number 1\n");
    out.push_str(&format!("_cell_length_a    {:.6}\n", a));
    out.push_str(&format!("_cell_length_b    {:.6}\n", b));
    out.push_str(&format!("_cell_length_c    {:.6}\n", c));
    out.push_str(&format!("_cell_angle_alpha {:.6}\n", alpha));
    out.push_str(&format!("_cell_angle_beta  {:.6}\n", beta));
    out.push_str(&format!("_cell_angle_gamma {:.6}\n", gamma));
    out.push_str(&format!("_cell_volume      {:.6}\n", structure.volume()));
    out.push_str("loop_\n");
    out.push_str(" _atom_site_type_symbol\n");
    out.push_str(" _atom_site_label\n");
    out.push_str(" _atom_site_occupancy\n");
    out.push_str(" _atom_site_fract_x\n");
    out.push_str(" _atom_site_fract_y\n");
    out.push_str(" _atom_site_fract_z\n");
    for (i, site) in structure.sites.iter().enumerate() {
        out.push_str(&format!(
            " {} {}{} {:.4} {:.6} {:.6} {:.6}\n",
            site.species,
            site.species,
            i + 1,
            site.occupancy,
            site.frac[0],
            site.frac[1],
            site.frac[2]
        ));
    }
    out
}
