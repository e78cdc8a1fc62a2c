use std::fmt::{self, Write};

use crate::scene::{Point3, Scene};

const STYLE: &str = "unset key\n\
unset border\n\
unset tics\n\
set style line 1 lc rgb '#b90046' lt 1 lw 1\n\
set style line 2 lc rgb '#000077' lt 1 lw 2\n";

/// Writes a self-contained gnuplot script with the data inline.
///
/// Planar scenes are drawn with `plot` and a closed hull outline. Other
/// scenes use `splot` with the hull facets as translucent `pm3d` surfaces.
pub fn write(scene: &Scene, out: &mut impl Write) -> fmt::Result {
    out.write_str(STYLE)?;
    if scene.is_planar() {
        write_planar(scene, out)
    } else {
        write_spatial(scene, out)
    }
}

fn write_planar(scene: &Scene, out: &mut impl Write) -> fmt::Result {
    writeln!(out, "set size ratio -1\n")?;
    writeln!(out, "$walk << EOD")?;
    for p in &scene.walk {
        writeln!(out, "{} {}", p[0], p[1])?;
    }
    writeln!(out, "EOD\n")?;

    writeln!(out, "$hull << EOD")?;
    for p in scene.hull.iter().chain(scene.hull.first()) {
        writeln!(out, "{} {}", p[0], p[1])?;
    }
    writeln!(out, "EOD\n")?;

    writeln!(
        out,
        "plot $walk w l ls 2, \\\n     $hull w lp ls 1 pt 7 ps 0.6\n"
    )?;
    writeln!(out, "pause mouse close")
}

fn triangle_block(out: &mut impl Write, t: &[Point3; 3]) -> fmt::Result {
    // pm3d needs a 2x2 grid per surface; the last corner is doubled
    let [a, b, c] = t;
    writeln!(out, "{} {} {}", a[0], a[1], a[2])?;
    writeln!(out, "{} {} {}\n", b[0], b[1], b[2])?;
    writeln!(out, "{} {} {}", c[0], c[1], c[2])?;
    writeln!(out, "{} {} {}\n\n", c[0], c[1], c[2])
}

fn write_spatial(scene: &Scene, out: &mut impl Write) -> fmt::Result {
    writeln!(
        out,
        "unset colorbox\n\
         set cbrange [0.9:1]\n\
         set palette defined (1 '#ce4c7d')\n\
         set style fill transparent solid 0.3 border\n\
         set pm3d depthorder hidden3d 1\n\
         set pm3d implicit\n\
         unset hidden3d\n\
         set view equal xyz\n"
    )?;
    writeln!(out, "$walk << EOD")?;
    for p in &scene.walk {
        writeln!(out, "{} {} {}", p[0], p[1], p[2])?;
    }
    writeln!(out, "EOD\n")?;

    writeln!(out, "$hull << EOD")?;
    for t in scene.triangles() {
        triangle_block(out, &t)?;
    }
    writeln!(out, "EOD\n")?;

    writeln!(
        out,
        "splot $walk w lp ls 2 pt 7 ps 0.5, \\\n      $hull u 1:2:3:(1) w l ls 1\n"
    )?;
    writeln!(out, "pause mouse close")
}
