pub mod interactive;
pub mod scene;
pub mod staticimg;

pub use interactive::{render_comparison_html, render_html};
pub use staticimg::{render_comparison_png, render_png};

/// Default raster size for static renders.
pub const DEFAULT_WIDTH: u32 = 1400;
pub const DEFAULT_HEIGHT: u32 = 1000;
