#![deny(missing_docs)]

//! Renderings of random walks and their convex hulls.
//!
//! A [`Scene`] captures the positions of a walk and its hull once; the
//! renderers turn it into an SVG projection, a gnuplot script, a POV-Ray
//! scene or a standalone three.js page. [`render`] picks the renderer from a
//! [`RenderFormat`] and writes the result to a file.

use std::fmt::{self, Display};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use hw_core::{ErrorInfo, WalkError};
use hw_walk::Walker;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Gnuplot scripts with inline data blocks.
pub mod gnuplot;
/// POV-Ray scene descriptions.
pub mod povray;
/// Geometry shared by all renderers.
pub mod scene;
/// Two dimensional SVG projections.
pub mod svg;
/// Standalone three.js pages.
pub mod threejs;

pub use scene::Scene;

/// Output format of a rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderFormat {
    /// xy projection as scalable vector graphics.
    Svg,
    /// gnuplot script, `plot` in 2D and `splot` otherwise.
    Gnuplot,
    /// POV-Ray scene with spheres, cylinders and hull triangles.
    Povray,
    /// HTML page drawing the walk and hull with three.js.
    Threejs,
}

impl RenderFormat {
    /// Every format in declaration order.
    pub const ALL: &'static [RenderFormat] = &[
        RenderFormat::Svg,
        RenderFormat::Gnuplot,
        RenderFormat::Povray,
        RenderFormat::Threejs,
    ];

    /// Stable lower case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderFormat::Svg => "svg",
            RenderFormat::Gnuplot => "gnuplot",
            RenderFormat::Povray => "povray",
            RenderFormat::Threejs => "threejs",
        }
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            RenderFormat::Svg => "svg",
            RenderFormat::Gnuplot => "gp",
            RenderFormat::Povray => "pov",
            RenderFormat::Threejs => "html",
        }
    }
}

impl Display for RenderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderFormat {
    type Err = WalkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RenderFormat::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = RenderFormat::ALL.iter().map(|f| f.as_str()).collect();
                WalkError::Config(
                    ErrorInfo::new("unknown-render-format", format!("unknown render format '{s}'"))
                        .with_hint(format!("expected one of: {}", known.join(", "))),
                )
            })
    }
}

/// Renders a scene into a string.
pub fn render_scene(format: RenderFormat, scene: &Scene) -> Result<String, WalkError> {
    let mut out = String::new();
    let written = match format {
        RenderFormat::Svg => svg::write(scene, &mut out),
        RenderFormat::Gnuplot => gnuplot::write(scene, &mut out),
        RenderFormat::Povray => povray::write(scene, &mut out),
        RenderFormat::Threejs => threejs::write(scene, &mut out),
    };
    written.map_err(|err| {
        WalkError::Serde(
            ErrorInfo::new("render-format", err.to_string())
                .with_context("format", format.as_str()),
        )
    })?;
    Ok(out)
}

/// Renders the current walk and hull of `walker` into `path`.
pub fn render(format: RenderFormat, walker: &dyn Walker, path: &Path) -> Result<(), WalkError> {
    let scene = Scene::from_walker(walker);
    let text = render_scene(format, &scene)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                WalkError::Serde(
                    ErrorInfo::new("render-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
    }
    fs::write(path, text).map_err(|err| {
        WalkError::Serde(
            ErrorInfo::new("render-write", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    info!(%format, path = %path.display(), points = scene.walk.len(), "rendered walk");
    Ok(())
}
