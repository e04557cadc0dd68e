//! Symmetric quadrature rules for the reference triangle and tetrahedron.
//!
//! Rules are tabulated in barycentric coordinates with weights summing to one, then mapped to
//! the reference domain.

use crate::{Error, Rule};

/// Barycentric points `(1 - 2a, a, a)` and its rotations.
fn triangle_orbit(a: f64) -> [[f64; 3]; 3] {
    let b = 1.0 - 2.0 * a;
    [[b, a, a], [a, b, a], [a, a, b]]
}

/// Barycentric points `(1 - 3a, a, a, a)` and its permutations.
fn tetrahedron_orbit(a: f64) -> [[f64; 4]; 4] {
    let b = 1.0 - 3.0 * a;
    [[b, a, a, a], [a, b, a, a], [a, a, b, a], [a, a, a, b]]
}

fn map_triangle(barycentric_rule: &[(f64, [f64; 3])]) -> Rule<2> {
    // The reference triangle has area 2
    barycentric_rule
        .iter()
        .map(|&(w, [_, l1, l2])| (2.0 * w, [-1.0 + 2.0 * l1, -1.0 + 2.0 * l2]))
        .unzip()
}

fn map_tetrahedron(barycentric_rule: &[(f64, [f64; 4])]) -> Rule<3> {
    // The reference tetrahedron has volume 4/3
    barycentric_rule
        .iter()
        .map(|&(w, [_, l1, l2, l3])| (4.0 / 3.0 * w, [-1.0 + 2.0 * l1, -1.0 + 2.0 * l2, -1.0 + 2.0 * l3]))
        .unzip()
}

/// A quadrature rule for the reference triangle of at least the given strength.
///
/// Rules up to strength 5 are available. The strength 3 rule has a negative weight.
pub fn triangle(strength: usize) -> Result<Rule<2>, Error> {
    let centroid = [1.0 / 3.0; 3];
    let mut rule = Vec::new();
    match strength {
        0 | 1 => rule.push((1.0, centroid)),
        2 => rule.extend(triangle_orbit(1.0 / 6.0).map(|p| (1.0 / 3.0, p))),
        3 => {
            rule.push((-27.0 / 48.0, centroid));
            rule.extend(triangle_orbit(0.2).map(|p| (25.0 / 48.0, p)));
        }
        4 | 5 => {
            let sqrt15 = 15.0f64.sqrt();
            rule.push((9.0 / 40.0, centroid));
            rule.extend(triangle_orbit((6.0 - sqrt15) / 21.0).map(|p| ((155.0 - sqrt15) / 1200.0, p)));
            rule.extend(triangle_orbit((6.0 + sqrt15) / 21.0).map(|p| ((155.0 + sqrt15) / 1200.0, p)));
        }
        _ => return Err(Error::NoRuleAvailable { domain: "triangle", strength }),
    }
    Ok(map_triangle(&rule))
}

/// A quadrature rule for the reference tetrahedron of at least the given strength.
///
/// Rules up to strength 3 are available. The strength 3 rule has a negative weight.
pub fn tetrahedron(strength: usize) -> Result<Rule<3>, Error> {
    let centroid = [0.25; 4];
    let mut rule = Vec::new();
    match strength {
        0 | 1 => rule.push((1.0, centroid)),
        2 => {
            let a = (5.0 - 5.0f64.sqrt()) / 20.0;
            rule.extend(tetrahedron_orbit(a).map(|p| (0.25, p)));
        }
        3 => {
            rule.push((-0.8, centroid));
            rule.extend(tetrahedron_orbit(1.0 / 6.0).map(|p| (0.45, p)));
        }
        _ => return Err(Error::NoRuleAvailable { domain: "tetrahedron", strength }),
    }
    Ok(map_tetrahedron(&rule))
}
