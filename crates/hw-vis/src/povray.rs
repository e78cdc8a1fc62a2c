use std::fmt::{self, Write};

use crate::scene::{Point3, Scene};

fn vector(p: &Point3) -> String {
    format!("<{}, {}, {}>", p[0], p[1], p[2])
}

/// Writes a POV-Ray scene.
///
/// Every position becomes a sphere and every step a cylinder. Hull facets
/// are triangles in a translucent mesh; planar hulls are outlined with
/// cylinders instead.
pub fn write(scene: &Scene, out: &mut impl Write) -> fmt::Result {
    let (center, size) = scene.extent();
    let stroke = 0.1 * (size / 20.0).max(1.0);
    let eye = [center[0] + size, center[1] + size, center[2] - 1.5 * size];

    writeln!(out, "#version 3.7;")?;
    writeln!(out, "global_settings {{ assumed_gamma 1.0 }}")?;
    writeln!(out, "background {{ color rgb <1, 1, 1> }}")?;
    writeln!(
        out,
        "camera {{\n    location {}\n    look_at {}\n}}",
        vector(&eye),
        vector(&center)
    )?;
    writeln!(
        out,
        "light_source {{ {} color rgb <1, 1, 1> }}\n",
        vector(&[eye[0], eye[1] + size, eye[2]])
    )?;

    writeln!(out, "union {{")?;
    for p in &scene.walk {
        writeln!(out, "    sphere {{ {}, {} }}", vector(p), 1.2 * stroke)?;
    }
    for (a, b) in scene.segments() {
        writeln!(out, "    cylinder {{ {}, {}, {} }}", vector(&a), vector(&b), stroke)?;
    }
    writeln!(out, "    pigment {{ color rgb <0.27, 0.27, 0.27> }}\n}}\n")?;

    if scene.is_planar() {
        if scene.hull.len() > 1 {
            writeln!(out, "union {{")?;
            for (k, a) in scene.hull.iter().enumerate() {
                let b = &scene.hull[(k + 1) % scene.hull.len()];
                writeln!(out, "    cylinder {{ {}, {}, {} }}", vector(a), vector(b), stroke)?;
            }
            writeln!(out, "    pigment {{ color rgb <0.93, 0, 0> }}\n}}")?;
        }
        return Ok(());
    }

    let triangles = scene.triangles();
    if triangles.is_empty() {
        return Ok(());
    }
    writeln!(out, "mesh {{")?;
    for [a, b, c] in triangles {
        writeln!(
            out,
            "    triangle {{ {}, {}, {} }}",
            vector(&a),
            vector(&b),
            vector(&c)
        )?;
    }
    writeln!(
        out,
        "    texture {{ pigment {{ color rgbt <0.93, 0, 0, 0.5> }} finish {{ phong 0.6 }} }}\n}}"
    )
}
