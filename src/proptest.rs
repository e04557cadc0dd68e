//! Proptest strategies for elements with positive orientation.
use ::proptest::prelude::*;
use nalgebra::{Matrix3, Point2, Point3, Vector2, Vector3};

use crate::element::{Hex8Element, Quad4d2Element, Segment2d2Element, Tet4Element, Tri3d2Element};

pub fn point2() -> impl Strategy<Value = Point2<f64>> {
    // Pick a reasonably small range to pick coordinates from,
    // otherwise we can easily get floating point numbers that are
    // so ridiculously large as to break anything we might want to do with them
    let range = -10.0..10.0;
    [range.clone(), range.clone()].prop_map(|[x, y]| Point2::new(x, y))
}

pub fn point3() -> impl Strategy<Value = Point3<f64>> {
    let range = -10.0..10.0;
    [range.clone(), range.clone(), range.clone()].prop_map(|[x, y, z]| Point3::new(x, y, z))
}

fn vector2() -> impl Strategy<Value = Vector2<f64>> {
    point2().prop_map(|p| p.coords)
}

fn vector3() -> impl Strategy<Value = Vector3<f64>> {
    point3().prop_map(|p| p.coords)
}

// Rejects nearly flat elements, whose gradients are too ill-conditioned for tight tolerances
const MIN_MEASURE: f64 = 1e-2;

impl Arbitrary for Segment2d2Element<f64> {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        [point2(), point2()]
            .prop_filter("segment must have positive length", |[a, b]| (b - a).norm() > MIN_MEASURE)
            .prop_map(Self::from_vertices)
            .boxed()
    }
}

impl Arbitrary for Tri3d2Element<f64> {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        [point2(), point2(), point2()]
            .prop_filter_map("triangle must not be degenerate", |[a, b, c]| {
                let signed_area = (b - a).perp(&(c - a)) / 2.0;
                if signed_area.abs() < MIN_MEASURE {
                    None
                } else if signed_area > 0.0 {
                    Some(Self::from_vertices([a, b, c]))
                } else {
                    Some(Self::from_vertices([a, c, b]))
                }
            })
            .boxed()
    }
}

impl Arbitrary for Quad4d2Element<f64> {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    /// Counterclockwise parallelograms.
    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (point2(), vector2(), vector2())
            .prop_filter_map("quadrilateral must not be degenerate", |(origin, u, v)| {
                let area = u.perp(&v);
                if area.abs() < MIN_MEASURE {
                    return None;
                }
                let (u, v) = if area > 0.0 { (u, v) } else { (v, u) };
                Some(Self::from_vertices([origin, origin + u, origin + u + v, origin + v]))
            })
            .boxed()
    }
}

impl Arbitrary for Tet4Element<f64> {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        [point3(), point3(), point3(), point3()]
            .prop_filter_map("tetrahedron must not be degenerate", |[a, b, c, d]| {
                let volume = Matrix3::from_columns(&[b - a, c - a, d - a]).determinant() / 6.0;
                if volume.abs() < MIN_MEASURE {
                    None
                } else if volume > 0.0 {
                    Some(Self::from_vertices([a, b, c, d]))
                } else {
                    Some(Self::from_vertices([a, c, b, d]))
                }
            })
            .boxed()
    }
}

impl Arbitrary for Hex8Element<f64> {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    /// Positively oriented parallelepipeds.
    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (point3(), vector3(), vector3(), vector3())
            .prop_filter_map("hexahedron must not be degenerate", |(origin, u, v, w)| {
                let volume = u.cross(&v).dot(&w);
                if volume.abs() < MIN_MEASURE {
                    return None;
                }
                let (u, v) = if volume > 0.0 { (u, v) } else { (v, u) };
                Some(Self::from_vertices([
                    origin,
                    origin + u,
                    origin + u + v,
                    origin + v,
                    origin + w,
                    origin + u + w,
                    origin + u + v + w,
                    origin + v + w,
                ]))
            })
            .boxed()
    }
}
