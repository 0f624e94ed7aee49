//! Interactive scene output: a self-contained HTML document embedding a
//! plotly.js figure (rotate/zoom in any browser, no producing process
//! needed).

use crate::error::Result;
use crate::model::{elements, Structure};
use crate::rendering::scene::{self, Scene, CELL_EDGES};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

/// Write one structure as an interactive HTML scene.
pub fn render_html(structure: &Structure, title: &str, path: &Path) -> Result<()> {
    let scene = scene::build(structure, true)?;
    let mut traces = vec![edge_trace(&scene, "scene")];
    let mut seen = HashSet::new();
    traces.extend(site_traces(&scene, "scene", &mut seen));

    let figure = json!({
        "data": traces,
        "layout": {
            "title": {"text": title},
            "margin": {"l": 0, "r": 0, "t": 50, "b": 0},
            "scene": scene_layout(),
            "legend": {"itemsizing": "constant"},
        },
    });
    write_document(path, title, &figure)
}

/// Original and reduced side by side with a shared legend.
pub fn render_comparison_html(
    original: &Structure,
    reduced: &Structure,
    title: &str,
    path: &Path,
) -> Result<()> {
    let left = scene::build(original, true)?;
    let right = scene::build(reduced, true)?;

    let mut traces = vec![edge_trace(&left, "scene"), edge_trace(&right, "scene2")];
    // One legend entry per species across both panels.
    let mut seen = HashSet::new();
    traces.extend(site_traces(&left, "scene", &mut seen));
    traces.extend(site_traces(&right, "scene2", &mut seen));

    let figure = json!({
        "data": traces,
        "layout": {
            "title": {"text": title},
            "margin": {"l": 0, "r": 0, "t": 60, "b": 30},
            "scene": with_domain(scene_layout(), [0.0, 0.48]),
            "scene2": with_domain(scene_layout(), [0.52, 1.0]),
            "legend": {"itemsizing": "constant"},
            "annotations": [
                panel_annotation(caption("original", original), 0.22),
                panel_annotation(caption("primitive", reduced), 0.78),
            ],
        },
    });
    write_document(path, title, &figure)
}

fn caption(label: &str, structure: &Structure) -> String {
    format!(
        "{}: V = {:.2} \u{212b}\u{b3}, {} sites",
        label,
        structure.volume(),
        structure.sites.len()
    )
}

fn panel_annotation(text: String, x: f64) -> Value {
    json!({
        "text": text,
        "x": x,
        "y": 0.0,
        "xref": "paper",
        "yref": "paper",
        "showarrow": false,
        "font": {"size": 14},
    })
}

fn scene_layout() -> Value {
    json!({
        "aspectmode": "data",
        "xaxis": {"title": "x (\u{212b})"},
        "yaxis": {"title": "y (\u{212b})"},
        "zaxis": {"title": "z (\u{212b})"},
    })
}

fn with_domain(mut layout: Value, x: [f64; 2]) -> Value {
    layout["domain"] = json!({"x": x, "y": [0.0, 1.0]});
    layout
}

/// Cell wireframe as one line trace with null breaks between edges.
fn edge_trace(scene: &Scene, scene_id: &str) -> Value {
    let mut xs: Vec<Value> = Vec::new();
    let mut ys: Vec<Value> = Vec::new();
    let mut zs: Vec<Value> = Vec::new();
    for (i, j) in CELL_EDGES {
        for &idx in &[i, j] {
            let c = scene.corners[idx];
            xs.push(json!(c[0]));
            ys.push(json!(c[1]));
            zs.push(json!(c[2]));
        }
        xs.push(Value::Null);
        ys.push(Value::Null);
        zs.push(Value::Null);
    }
    json!({
        "type": "scatter3d",
        "mode": "lines",
        "x": xs, "y": ys, "z": zs,
        "line": {"color": "#3a3a3a", "width": 4},
        "name": "unit cell",
        "showlegend": false,
        "hoverinfo": "skip",
        "scene": scene_id,
    })
}

/// One marker trace per species (plus a faint trace for periodic images).
/// `seen` suppresses duplicate legend entries across panels.
fn site_traces(scene: &Scene, scene_id: &str, seen: &mut HashSet<String>) -> Vec<Value> {
    let mut traces = Vec::new();
    for species in &scene.species {
        let display = elements::display_properties(species);
        let color = elements::hex_color(species);
        let size = 6.0 + display.radius * 5.0;

        for is_image in [false, true] {
            let (x, y, z): (Vec<f64>, Vec<f64>, Vec<f64>) = {
                let sel: Vec<&[f64; 3]> = scene
                    .sites
                    .iter()
                    .filter(|s| &s.species == species && s.is_image == is_image)
                    .map(|s| &s.position)
                    .collect();
                (
                    sel.iter().map(|p| p[0]).collect(),
                    sel.iter().map(|p| p[1]).collect(),
                    sel.iter().map(|p| p[2]).collect(),
                )
            };
            if x.is_empty() {
                continue;
            }
            let show_legend = !is_image && seen.insert(species.clone());
            traces.push(json!({
                "type": "scatter3d",
                "mode": "markers",
                "x": x, "y": y, "z": z,
                "marker": {
                    "size": size,
                    "color": color,
                    "opacity": if is_image { 0.35 } else { 0.95 },
                },
                "name": species,
                "legendgroup": species,
                "showlegend": show_legend,
                "scene": scene_id,
            }));
        }
    }
    traces
}

fn write_document(path: &Path, title: &str, figure: &Value) -> Result<()> {
    let payload = figure.to_string();
    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <script src=\"{PLOTLY_CDN}\"></script>\n</head>\n<body>\n\
         <div id=\"view\" style=\"width:100%;height:95vh;\"></div>\n<script>\n\
         var figure = {payload};\n\
         Plotly.newPlot(\"view\", figure.data, figure.layout, {{responsive: true}});\n\
         </script>\n</body>\n</html>\n"
    );
    fs::write(path, html)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Lattice, Site};

    fn sample() -> Structure {
        let lat = Lattice::new([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]).unwrap();
        Structure::new(
            lat,
            vec![
                Site::new("Na", [0.0, 0.0, 0.0]),
                Site::new("Cl", [0.5, 0.5, 0.5]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn html_contains_plotly_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.html");
        render_html(&sample(), "NaCl", &path).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("scatter3d"));
        assert!(html.contains("NaCl"));
    }

    #[test]
    fn comparison_has_two_scenes_and_captions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmp.html");
        render_comparison_html(&sample(), &sample(), "NaCl", &path).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("scene2"));
        assert!(html.contains("original"));
        assert!(html.contains("primitive"));
    }

    #[test]
    fn legend_not_duplicated_across_panels() {
        let scene_a = scene::build(&sample(), false).unwrap();
        let mut seen = HashSet::new();
        let first = site_traces(&scene_a, "scene", &mut seen);
        let second = site_traces(&scene_a, "scene2", &mut seen);
        let shown = |ts: &[Value]| {
            ts.iter()
                .filter(|t| t["showlegend"] == json!(true))
                .count()
        };
        assert_eq!(shown(&first), 2);
        assert_eq!(shown(&second), 0);
    }
}
