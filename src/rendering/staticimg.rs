//! Fixed-camera raster renders via plotters.

use crate::error::{Error, Result};
use crate::model::{elements, Structure};
use crate::rendering::scene::{self, Scene, CELL_EDGES};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

fn render_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Render(e.to_string())
}

/// Render one structure to a PNG at `path`.
pub fn render_png(
    structure: &Structure,
    title: &str,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<()> {
    let scene = scene::build(structure, true)?;
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    draw_panel(&root, &scene, &panel_caption(title, structure))?;
    root.present().map_err(render_err)?;
    Ok(())
}

/// Render original and reduced side by side into a single PNG.
pub fn render_comparison_png(
    original: &Structure,
    reduced: &Structure,
    title: &str,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<()> {
    let left = scene::build(original, true)?;
    let right = scene::build(reduced, true)?;

    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let root = root
        .titled(title, ("sans-serif", 28))
        .map_err(render_err)?;

    let panels = root.split_evenly((1, 2));
    draw_panel(&panels[0], &left, &panel_caption("original", original))?;
    draw_panel(&panels[1], &right, &panel_caption("primitive", reduced))?;
    root.present().map_err(render_err)?;
    Ok(())
}

fn panel_caption(label: &str, structure: &Structure) -> String {
    format!(
        "{} | V = {:.2} \u{212b}\u{b3} | {} sites",
        label,
        structure.volume(),
        structure.sites.len()
    )
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    scene: &Scene,
    caption: &str,
) -> Result<()> {
    // Equal half-extent on all axes keeps the cell undistorted.
    let mut half = 1.0f64;
    for k in 0..3 {
        half = half.max((scene.max[k] - scene.min[k]) / 2.0);
    }
    half *= 1.15;
    let center = [
        (scene.min[0] + scene.max[0]) / 2.0,
        (scene.min[1] + scene.max[1]) / 2.0,
        (scene.min[2] + scene.max[2]) / 2.0,
    ];

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .build_cartesian_3d(
            center[0] - half..center[0] + half,
            center[1] - half..center[1] + half,
            center[2] - half..center[2] + half,
        )
        .map_err(render_err)?;

    chart.with_projection(|mut pb| {
        pb.pitch = 0.28;
        pb.yaw = 0.62;
        pb.scale = 0.85;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.08))
        .draw()
        .map_err(render_err)?;

    for (i, j) in CELL_EDGES {
        let c0 = scene.corners[i];
        let c1 = scene.corners[j];
        chart
            .draw_series(LineSeries::new(
                vec![(c0[0], c0[1], c0[2]), (c1[0], c1[1], c1[2])],
                BLACK.mix(0.6).stroke_width(2),
            ))
            .map_err(render_err)?;
    }

    for species in &scene.species {
        let display = elements::display_properties(species);
        let (r, g, b) = display.color;
        let color = RGBColor(
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        );
        let size = marker_size(display.radius);

        let real: Vec<(f64, f64, f64)> = scene
            .sites
            .iter()
            .filter(|s| &s.species == species && !s.is_image)
            .map(|s| (s.position[0], s.position[1], s.position[2]))
            .collect();
        let images: Vec<(f64, f64, f64)> = scene
            .sites
            .iter()
            .filter(|s| &s.species == species && s.is_image)
            .map(|s| (s.position[0], s.position[1], s.position[2]))
            .collect();

        chart
            .draw_series(
                real.iter()
                    .map(|&p| Circle::new(p, size, color.filled())),
            )
            .map_err(render_err)?
            .label(species.clone())
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));

        // Ghost images, faint.
        chart
            .draw_series(
                images
                    .iter()
                    .map(|&p| Circle::new(p, size, color.mix(0.3).filled())),
            )
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.4))
        .draw()
        .map_err(render_err)?;

    Ok(())
}

fn marker_size(radius: f64) -> i32 {
    (3.0 + radius * 5.0).round().clamp(3.0, 14.0) as i32
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
    fn writes_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        render_png(&sample(), "sample", &path, 640, 480).unwrap();
        let len = std::fs::metadata(&path).unwrap().len();
        assert!(len > 0);
    }

    #[test]
    fn writes_comparison_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmp.png");
        render_comparison_png(&sample(), &sample(), "sample", &path, 1200, 500).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn marker_size_clamped() {
        assert_eq!(marker_size(0.0), 3);
        assert_eq!(marker_size(10.0), 14);
    }
}
