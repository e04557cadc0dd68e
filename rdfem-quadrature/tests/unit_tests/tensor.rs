use rdfem_quadrature::tensor::{hexahedron_gauss, quadrilateral_gauss};
use rdfem_quadrature::{hexahedron, integrate, quadrilateral};
use matrixcompare::assert_scalar_eq;

fn monomial_integral_1d(alpha: i32) -> f64 {
    (1.0 - (-1.0f64).powi(alpha + 1)) / (alpha as f64 + 1.0)
}

#[test]
fn quadrilateral_gauss_rules_satisfy_expected_accuracy() {
    for n in 1..=12 {
        // Exact along each dimension separately
        let expected_polynomial_degree = 2 * n - 1;
        let rule = quadrilateral_gauss(n);

        assert_eq!(rule.0.len(), n * n);
        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=expected_polynomial_degree as i32 {
            for beta in 0..=expected_polynomial_degree as i32 {
                let expected = monomial_integral_1d(alpha) * monomial_integral_1d(beta);
                let estimated_integral = integrate(&rule, |&[x, y]| x.powi(alpha) * y.powi(beta));
                assert_scalar_eq!(estimated_integral, expected, comp = abs, tol = 1e-13);
            }
        }
    }
}

#[test]
fn hexahedral_gauss_rules_satisfy_expected_accuracy() {
    for n in 1..=6 {
        let expected_polynomial_degree = 2 * n - 1;
        let rule = hexahedron_gauss(n);

        assert_eq!(rule.0.len(), n * n * n);
        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=expected_polynomial_degree as i32 {
            for beta in 0..=expected_polynomial_degree as i32 {
                for gamma in 0..=expected_polynomial_degree as i32 {
                    let expected =
                        monomial_integral_1d(alpha) * monomial_integral_1d(beta) * monomial_integral_1d(gamma);
                    let estimated_integral =
                        integrate(&rule, |&[x, y, z]| x.powi(alpha) * y.powi(beta) * z.powi(gamma));
                    assert_scalar_eq!(estimated_integral, expected, comp = abs, tol = 1e-13);
                }
            }
        }
    }
}

#[test]
fn tensor_rules_order_last_coordinate_fastest() {
    let (_, points) = quadrilateral_gauss(2);
    assert_eq!(points[0][0], points[1][0]);
    assert_ne!(points[0][1], points[1][1]);
}

#[test]
fn strength_based_tensor_rules_use_minimal_point_count() {
    assert_eq!(quadrilateral(0).0.len(), 1);
    assert_eq!(quadrilateral(1).0.len(), 1);
    assert_eq!(quadrilateral(2).0.len(), 4);
    assert_eq!(quadrilateral(3).0.len(), 4);
    assert_eq!(hexahedron(3).0.len(), 8);
    assert_eq!(hexahedron(4).0.len(), 27);
}
