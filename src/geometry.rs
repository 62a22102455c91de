//! Small fixed-size vector helpers on `[f64; 3]`.

/// A point or vector in 3D.
pub type Vec3 = [f64; 3];

#[inline]
pub(crate) fn sub(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub(crate) fn add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub(crate) fn scale(a: &Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub(crate) fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub(crate) fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub(crate) fn norm(a: &Vec3) -> f64 {
    dot(a, a).sqrt()
}

/// Circumcenter of the tetrahedron `(a, b, c, d)`.
///
/// Returns non-finite coordinates for a flat tetrahedron.
pub(crate) fn circumcenter(a: &Vec3, b: &Vec3, c: &Vec3, d: &Vec3) -> Vec3 {
    let u = sub(b, a);
    let v = sub(c, a);
    let w = sub(d, a);
    let vw = cross(&v, &w);
    let wu = cross(&w, &u);
    let uv = cross(&u, &v);
    let denom = 2.0 * dot(&u, &vw);
    let (uu, vv, ww) = (dot(&u, &u), dot(&v, &v), dot(&w, &w));
    let offset = [
        (uu * vw[0] + vv * wu[0] + ww * uv[0]) / denom,
        (uu * vw[1] + vv * wu[1] + ww * uv[1]) / denom,
        (uu * vw[2] + vv * wu[2] + ww * uv[2]) / denom,
    ];
    add(a, &offset)
}

/// Vector area of a closed planar polygon: its normal times its area,
/// with direction given by the right-hand rule on the vertex order.
pub(crate) fn vector_area(poly: &[Vec3]) -> Vec3 {
    let mut acc = [0.0; 3];
    if poly.len() < 3 {
        return acc;
    }
    let origin = &poly[0];
    for i in 1..poly.len() - 1 {
        let c = cross(&sub(&poly[i], origin), &sub(&poly[i + 1], origin));
        acc = add(&acc, &c);
    }
    scale(&acc, 0.5)
}

/// Signed volume of the tetrahedron `(a, b, c, d)`, positive when right-handed.
pub(crate) fn tet_volume(a: &Vec3, b: &Vec3, c: &Vec3, d: &Vec3) -> f64 {
    dot(&sub(b, a), &cross(&sub(c, a), &sub(d, a))) / 6.0
}
