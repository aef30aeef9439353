// Finite-difference stencils on the uniform cavity grid

use na::DMatrix;

use crate::{ScalarField, VectorField, sim::params::CavityParams};

/// Sum of the 4-point von Neumann neighbourhood around `(r, c)`.
#[inline]
pub fn neighbour_sum(field: &ScalarField, r: usize, c: usize) -> f64 {
    field[(r, c + 1)] + field[(r, c - 1)] + field[(r + 1, c)] + field[(r - 1, c)]
}

/// Unscaled 5-point laplacian at `(r, c)`; divide by dx² for ∇²f.
#[inline]
pub fn laplacian_at(field: &ScalarField, r: usize, c: usize) -> f64 {
    neighbour_sum(field, r, c) - 4. * field[(r, c)]
}

/// Build the right-hand side of the pressure-Poisson equation from the
/// velocity field, allocating a fresh source field with a zero edge.
///
/// Parameters
/// - `u` - The velocity field <u, v>
/// - `params` - Run parameters (rho, dt & dx are read)
///
/// Returns
/// - The source field `b`
pub fn build_source(u: &VectorField, params: &CavityParams) -> ScalarField {
    let (rows, cols) = u[0].shape();
    let mut b: ScalarField = DMatrix::zeros(rows, cols);

    build_source_into(&mut b, u, params);

    b
}

/// Write the pressure-Poisson source into the interior of `b`. With
/// centered differences Δ over the 4-neighbourhood,
///
/// b = rho dx/16 ⋅ ( 2/dt (Δₓu + Δᵧv) - 2/dx Δᵧu Δₓv - (Δₓu)²/dx - (Δᵧv)²/dx )
///
/// Edge nodes of `b` are left as they are; the pressure relaxation never
/// reads them.
pub fn build_source_into(b: &mut ScalarField, u: &VectorField, params: &CavityParams) {
    let (rows, cols) = b.shape();
    let (ux, uy) = (&u[0], &u[1]);
    let CavityParams {
        density, dt, dx, ..
    } = *params;

    let scale = density * dx / 16.;

    for c in 1..(cols - 1) {
        for r in 1..(rows - 1) {
            let du_dx = ux[(r, c + 1)] - ux[(r, c - 1)];
            let du_dy = ux[(r + 1, c)] - ux[(r - 1, c)];
            let dv_dx = uy[(r, c + 1)] - uy[(r, c - 1)];
            let dv_dy = uy[(r + 1, c)] - uy[(r - 1, c)];

            b[(r, c)] = scale
                * ((2. / dt) * (du_dx + dv_dy)
                    - (2. / dx) * du_dy * dv_dx
                    - du_dx.powi(2) / dx
                    - dv_dy.powi(2) / dx);
        }
    }
}

/// Relative L2 change between two iterates, sqrt(Σ(p - pn)² / Σpn²).
///
/// When Σpn² is zero the ratio is undefined. An unchanged iterate is then
/// a fixed point (0); any change means relaxation has only just started
/// (+∞).
pub fn relative_l2_change(p: &ScalarField, pn: &ScalarField) -> f64 {
    let change: f64 = p.iter().zip(pn.iter()).map(|(a, b)| (a - b).powi(2)).sum();
    let reference: f64 = pn.norm_squared();

    if reference == 0. {
        return if change == 0. { 0. } else { f64::INFINITY };
    }

    (change / reference).sqrt()
}

#[cfg(test)]
mod tests {
    use na::dmatrix;

    use super::*;

    fn unit_params() -> CavityParams {
        CavityParams {
            density: 1.,
            dt: 0.5,
            dx: 0.5,
            ..CavityParams::reference()
        }
    }

    #[test]
    fn test_zero_velocity_gives_zero_source() {
        let u: VectorField = [DMatrix::zeros(7, 6), DMatrix::zeros(7, 6)];

        let b = build_source(&u, &CavityParams::reference());

        assert!(b.iter().all(|v| *v == 0.));
    }

    #[test]
    fn test_uniform_velocity_gives_zero_source() {
        let u: VectorField = [
            DMatrix::from_element(5, 5, 0.7),
            DMatrix::from_element(5, 5, -1.3),
        ];

        let b = build_source(&u, &CavityParams::reference());

        assert!(b.iter().all(|v| *v == 0.));
    }

    #[test]
    fn test_divergence_and_square_terms() {
        // Δₓu = 2, Δᵧv = 3, cross terms vanish
        let field_x: DMatrix<f64> = dmatrix![
            0., 0., 0.;
            1., 0., 3.;
            0., 0., 0.;
        ];

        let field_y: DMatrix<f64> = dmatrix![
            0., 1., 0.;
            0., 0., 0.;
            0., 4., 0.;
        ];

        let b = build_source(&[field_x, field_y], &unit_params());

        // 1/32 ⋅ (4⋅5 - 4/0.5 - 9/0.5)
        assert!((b[(1, 1)] - (-0.1875)).abs() < 1e-12);
    }

    #[test]
    fn test_cross_term() {
        // Δᵧu = 1, Δₓv = 3, divergence vanishes
        let field_x: DMatrix<f64> = dmatrix![
            0., 1., 0.;
            0., 0., 0.;
            0., 2., 0.;
        ];

        let field_y: DMatrix<f64> = dmatrix![
            0., 0., 0.;
            1., 0., 4.;
            0., 0., 0.;
        ];

        let b = build_source(&[field_x, field_y], &unit_params());

        // 1/32 ⋅ (-(2/0.5) ⋅ 1 ⋅ 3)
        assert!((b[(1, 1)] - (-0.375)).abs() < 1e-12);
    }

    #[test]
    fn test_source_leaves_edges_untouched() {
        let (rows, cols) = (5, 6);
        let u: VectorField = [
            DMatrix::from_fn(rows, cols, |r, c| (r * c) as f64 * 0.1),
            DMatrix::from_fn(rows, cols, |r, c| (r + 2 * c) as f64 * 0.05),
        ];

        let mut b: ScalarField = DMatrix::from_element(rows, cols, 7.);
        build_source_into(&mut b, &u, &CavityParams::reference());

        for c in 0..cols {
            assert_eq!(b[(0, c)], 7.);
            assert_eq!(b[(rows - 1, c)], 7.);
        }
        for r in 0..rows {
            assert_eq!(b[(r, 0)], 7.);
            assert_eq!(b[(r, cols - 1)], 7.);
        }

        assert_ne!(b[(2, 2)], 7.);
    }

    #[test]
    fn test_laplacian_at() {
        let field: DMatrix<f64> = dmatrix![
            1., 5., 2.;
            5., 4., 3.;
            2., 8., 2.;
        ];

        assert_eq!(neighbour_sum(&field, 1, 1), 21.);
        assert_eq!(laplacian_at(&field, 1, 1), 5.);
    }

    #[test]
    fn test_relative_l2_change() {
        let pn: DMatrix<f64> = dmatrix![3., 0.; 0., 4.];
        let p: DMatrix<f64> = dmatrix![3., 1.; 0., 4.];

        assert!((relative_l2_change(&p, &pn) - 0.2).abs() < 1e-15);
    }

    #[test]
    fn test_relative_l2_change_degenerate_reference() {
        let zeros: DMatrix<f64> = DMatrix::zeros(3, 3);
        let mut moved = zeros.clone();
        moved[(1, 1)] = 1e-3;

        assert_eq!(relative_l2_change(&zeros, &zeros), 0.);
        assert_eq!(relative_l2_change(&moved, &zeros), f64::INFINITY);
    }
}
