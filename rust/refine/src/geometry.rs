// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tetrahedron geometry helpers

use nalgebra::Point3;

/// Signed volume of the tetrahedron `(p0, p1, p2, p3)`
///
/// Positive when `p3` lies on the side of the `(p0, p1, p2)` face its
/// right-handed normal points to.
#[inline]
pub fn signed_tet_volume(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
) -> f64 {
    let a = p1 - p0;
    let b = p2 - p0;
    let c = p3 - p0;
    a.cross(&b).dot(&c) / 6.0
}

/// Point halfway between `a` and `b`
#[inline]
pub fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    Point3::new(
        0.5 * (a.x + b.x),
        0.5 * (a.y + b.y),
        0.5 * (a.z + b.z),
    )
}
