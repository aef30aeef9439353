// Boundary conditions for the cavity's pressure & velocity fields

use serde::{Deserialize, Serialize};

use crate::{ScalarField, VectorField};

/// The condition imposed on one edge of the pressure field.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCondition {
    /// dp/dn = 0; the edge copies its inward neighbour
    ZeroGradient,

    /// p = value on the edge
    Fixed(f64),
}

/// Pressure boundary of the cavity, one condition per edge. The bottom
/// edge is row 0 and the top (lid) edge is the last row.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PressureBoundary {
    pub left: EdgeCondition,
    pub right: EdgeCondition,
    pub bottom: EdgeCondition,
    pub top: EdgeCondition,
}

impl PressureBoundary {
    /// Closed cavity: zero-gradient walls with the reference pressure
    /// pinned to zero along the lid.
    pub fn cavity() -> Self {
        PressureBoundary {
            left: EdgeCondition::ZeroGradient,
            right: EdgeCondition::ZeroGradient,
            bottom: EdgeCondition::ZeroGradient,
            top: EdgeCondition::Fixed(0.),
        }
    }

    /// Same as [`PressureBoundary::cavity`] but with the right edge held at
    /// zero pressure as well.
    pub fn open_right() -> Self {
        PressureBoundary {
            right: EdgeCondition::Fixed(0.),
            ..Self::cavity()
        }
    }

    /// Apply the boundary values to `p`. Columns are set before rows, so
    /// the bottom & top conditions own the corners.
    ///
    /// Panics if `p` is smaller than 2x2.
    pub fn apply(&self, p: &mut ScalarField) {
        let (rows, cols) = p.shape();
        assert!(
            rows >= 2 && cols >= 2,
            "pressure field must be at least 2x2, got {rows}x{cols}"
        );

        match self.left {
            EdgeCondition::ZeroGradient => {
                let col = p.column(1).into_owned();
                p.set_column(0, &col);
            }
            EdgeCondition::Fixed(value) => p.column_mut(0).fill(value),
        }

        match self.right {
            EdgeCondition::ZeroGradient => {
                let col = p.column(cols - 2).into_owned();
                p.set_column(cols - 1, &col);
            }
            EdgeCondition::Fixed(value) => p.column_mut(cols - 1).fill(value),
        }

        match self.bottom {
            EdgeCondition::ZeroGradient => {
                let row = p.row(1).into_owned();
                p.set_row(0, &row);
            }
            EdgeCondition::Fixed(value) => p.row_mut(0).fill(value),
        }

        match self.top {
            EdgeCondition::ZeroGradient => {
                let row = p.row(rows - 2).into_owned();
                p.set_row(rows - 1, &row);
            }
            EdgeCondition::Fixed(value) => p.row_mut(rows - 1).fill(value),
        }
    }
}

impl Default for PressureBoundary {
    fn default() -> Self {
        Self::cavity()
    }
}

/// Set the boundary values on the velocity field `u`: no-slip on the
/// bottom, left & right walls and a lid sliding in +x along the top row.
pub fn apply_velocity_boundary(u: &mut VectorField, lid_velocity: f64) {
    let (rows, cols) = u[0].shape();

    for component in u.iter_mut() {
        component.row_mut(0).fill(0.);
        component.column_mut(0).fill(0.);
        component.column_mut(cols - 1).fill(0.);
        component.row_mut(rows - 1).fill(0.);
    }

    // driven lid
    u[0].row_mut(rows - 1).fill(lid_velocity);
}
