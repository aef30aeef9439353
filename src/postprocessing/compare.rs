// Comparison of final fields against a stored reference snapshot

use crate::{
    ScalarField, VectorField,
    error::{CavityError, CavityResult},
    preprocessing::serial_field::Snapshot,
};

/// Largest absolute deviation of one field from its reference
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldDeviation {
    pub field: &'static str,
    pub max_abs_diff: f64,
}

/// Largest |a - b| over all nodes of two equally shaped fields
pub fn max_abs_diff(actual: &ScalarField, expected: &ScalarField) -> CavityResult<f64> {
    if actual.shape() != expected.shape() {
        return Err(CavityError::ShapeMismatch {
            expected: expected.shape(),
            found: actual.shape(),
        });
    }

    Ok(actual
        .iter()
        .zip(expected.iter())
        .map(|(a, e)| (a - e).abs())
        .fold(0., |max, diff| if diff.is_nan() || diff > max { diff } else { max }))
}

/// Compare `u`, `v` & `p` against a reference snapshot.
///
/// Returns
/// - The deviation of each field, or `ReferenceMismatch` for the first
///   field whose deviation exceeds `tolerance` (NaN never passes)
pub fn compare_to_snapshot(
    velocity: &VectorField,
    pressure: &ScalarField,
    reference: &Snapshot,
    tolerance: f64,
) -> CavityResult<Vec<FieldDeviation>> {
    let ([ref_u, ref_v], ref_p) = reference.fields()?;

    let pairs = [
        ("u", &velocity[0], &ref_u),
        ("v", &velocity[1], &ref_v),
        ("p", pressure, &ref_p),
    ];

    let mut deviations = Vec::with_capacity(pairs.len());

    for (field, actual, expected) in pairs {
        let max_abs_diff = max_abs_diff(actual, expected)?;

        if !(max_abs_diff <= tolerance) {
            return Err(CavityError::ReferenceMismatch {
                field,
                max_abs_diff,
                tolerance,
            });
        }

        deviations.push(FieldDeviation {
            field,
            max_abs_diff,
        });
    }

    Ok(deviations)
}
