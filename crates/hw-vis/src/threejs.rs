use std::fmt::{self, Write};

use crate::scene::{Point3, Scene};

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8"/>
    <script src="https://cdnjs.cloudflare.com/ajax/libs/three.js/r128/three.min.js"></script>
    <style>body { margin: 0; }</style>
</head>
<body>
<script>
"#;

const TAIL: &str = r#"
var scene = new THREE.Scene();
var camera = new THREE.PerspectiveCamera(75, window.innerWidth / window.innerHeight, 0.01, 100);
camera.position.z = 2;
scene.add(new THREE.AmbientLight(0x606060));
var light = new THREE.DirectionalLight(0xffffff, 1);
light.position.set(1, 1, 1).normalize();
scene.add(light);

var group = new THREE.Group();
var trace = new THREE.BufferGeometry();
trace.setAttribute('position', new THREE.Float32BufferAttribute(walk, 3));
group.add(new THREE.Line(trace, new THREE.LineBasicMaterial({ color: 0x444444 })));

var outline = new THREE.BufferGeometry();
outline.setAttribute('position', new THREE.Float32BufferAttribute(hullOutline, 3));
group.add(new THREE.LineLoop(outline, new THREE.LineBasicMaterial({ color: 0xee0000 })));

if (hullTriangles.length > 0) {
    var hull = new THREE.BufferGeometry();
    hull.setAttribute('position', new THREE.Float32BufferAttribute(hullTriangles, 3));
    hull.computeVertexNormals();
    var material = new THREE.MeshPhongMaterial({
        color: 0xee0000, transparent: true, opacity: 0.5, shininess: 60,
        flatShading: true, side: THREE.DoubleSide
    });
    group.add(new THREE.Mesh(hull, material));
}
scene.add(group);

var renderer = new THREE.WebGLRenderer({ alpha: true, antialias: true });
renderer.setSize(window.innerWidth, window.innerHeight);
document.body.appendChild(renderer.domElement);

var dragging = false, lastX = 0, lastY = 0;
renderer.domElement.addEventListener('mousedown', function (e) { dragging = true; lastX = e.clientX; lastY = e.clientY; });
window.addEventListener('mouseup', function () { dragging = false; });
window.addEventListener('mousemove', function (e) {
    if (!dragging) return;
    group.rotation.y += (e.clientX - lastX) * 0.01;
    group.rotation.x += (e.clientY - lastY) * 0.01;
    lastX = e.clientX;
    lastY = e.clientY;
});
renderer.domElement.addEventListener('wheel', function (e) {
    camera.position.z = Math.max(0.2, camera.position.z * (e.deltaY > 0 ? 1.1 : 0.9));
});

function animate() {
    requestAnimationFrame(animate);
    renderer.render(scene, camera);
}
animate();
</script>
</body>
</html>
"#;

fn array<'a>(
    out: &mut impl Write,
    name: &str,
    points: impl IntoIterator<Item = &'a Point3>,
    normalize: impl Fn(&Point3) -> Point3,
) -> fmt::Result {
    write!(out, "var {name} = [")?;
    for (k, p) in points.into_iter().enumerate() {
        if k > 0 {
            out.write_str(", ")?;
        }
        let q = normalize(p);
        write!(out, "{}, {}, {}", q[0], q[1], q[2])?;
    }
    writeln!(out, "];")
}

/// Writes an HTML page that draws the walk and its hull with three.js.
///
/// Coordinates are centered and scaled into the unit cube. The group can be
/// rotated by dragging and zoomed with the mouse wheel.
pub fn write(scene: &Scene, out: &mut impl Write) -> fmt::Result {
    let (center, size) = scene.extent();
    let normalize = |p: &Point3| -> Point3 {
        [
            (p[0] - center[0]) / size,
            (p[1] - center[1]) / size,
            (p[2] - center[2]) / size,
        ]
    };
    let triangles = scene.triangles();

    out.write_str(HEAD)?;
    array(out, "walk", &scene.walk, normalize)?;
    let outline: &[Point3] = if scene.is_planar() { &scene.hull } else { &[] };
    array(out, "hullOutline", outline, normalize)?;
    array(out, "hullTriangles", triangles.iter().flatten(), normalize)?;
    out.write_str(TAIL)
}
