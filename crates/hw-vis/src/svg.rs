use std::fmt::{self, Write};

use crate::scene::Scene;

const HEADER: &str = "<?xml version='1.0' encoding='UTF-8'?>\n\
<!DOCTYPE svg PUBLIC '-//W3C//DTD SVG 1.1//EN' 'http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd'>\n";

/// Writes the xy projection of a scene.
///
/// The walk is a `polyline`, the hull a `polygon` with a circle on every
/// vertex. The y axis points up, so the picture is not mirrored.
pub fn write(scene: &Scene, out: &mut impl Write) -> fmt::Result {
    let (lo, hi) = scene.bounds();
    let (_, size) = scene.extent();
    let scale = (size / 20.0).max(1.0);
    let radius = 0.2 * scale;
    let stroke = 0.1 * scale;
    let margin = 2.0 * scale;

    let min_x = lo[0] - margin;
    let min_y = -hi[1] - margin;
    let width = hi[0] - lo[0] + 2.0 * margin;
    let height = hi[1] - lo[1] + 2.0 * margin;

    out.write_str(HEADER)?;
    writeln!(
        out,
        "<svg xmlns='http://www.w3.org/2000/svg' version='1.1' baseProfile='full' \
         width='800px' height='800px' viewBox='{min_x} {min_y} {width} {height}'>"
    )?;
    writeln!(
        out,
        "<rect x='{min_x}' y='{min_y}' width='{width}' height='{height}' fill='white' />"
    )?;

    out.write_str("<polyline fill='none' points='")?;
    for p in &scene.walk {
        write!(out, "{},{} ", p[0], -p[1])?;
    }
    writeln!(out, "' stroke='black' stroke-width='{stroke}' />")?;

    if scene.hull.len() > 1 {
        out.write_str("<polygon fill='none' points='")?;
        for p in &scene.hull {
            write!(out, "{},{} ", p[0], -p[1])?;
        }
        writeln!(out, "' stroke='red' stroke-width='{stroke}' />")?;
    }
    for p in &scene.hull {
        writeln!(
            out,
            "<circle cx='{}' cy='{}' r='{radius}' stroke='black' stroke-width='0' fill='red'/>",
            p[0], -p[1]
        )?;
    }
    writeln!(out, "</svg>")
}
