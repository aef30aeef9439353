use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use na::DMatrix;
use serde::{Deserialize, Serialize};

use crate::{
    ScalarField, VectorField,
    error::{CavityError, CavityResult},
};

/// A scalar field in a serializable form. `data` is row-major.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SerialField {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl SerialField {
    pub fn from_field(field: &ScalarField) -> Self {
        let (nrows, ncols) = field.shape();

        Self {
            // nalgebra stores column-major; the transpose's storage is row-major
            data: field.transpose().as_slice().to_vec(),
            nrows,
            ncols,
        }
    }

    pub fn to_field(&self) -> CavityResult<ScalarField> {
        // the shape comes from untrusted json
        if self.nrows.checked_mul(self.ncols) != Some(self.data.len()) {
            return Err(CavityError::ShapeMismatch {
                expected: (self.nrows, self.ncols),
                found: (self.data.len() / self.ncols.max(1), self.ncols),
            });
        }

        Ok(DMatrix::from_row_slice(self.nrows, self.ncols, &self.data))
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }
}

/// The full state of a cavity run after some number of steps.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Number of timesteps that produced this state
    pub steps: usize,
    pub u: SerialField,
    pub v: SerialField,
    pub p: SerialField,
}

impl Snapshot {
    pub fn capture(velocity: &VectorField, pressure: &ScalarField, steps: usize) -> Self {
        Self {
            steps,
            u: SerialField::from_field(&velocity[0]),
            v: SerialField::from_field(&velocity[1]),
            p: SerialField::from_field(pressure),
        }
    }

    /// Rebuild the velocity & pressure fields
    pub fn fields(&self) -> CavityResult<(VectorField, ScalarField)> {
        let u = self.u.to_field()?;
        let v = self.v.to_field()?;
        let p = self.p.to_field()?;

        Ok(([u, v], p))
    }

    pub fn load(path: &Path) -> CavityResult<Self> {
        let file = File::open(path).map_err(|err| CavityError::io(path, err))?;

        serde_json::from_reader(BufReader::new(file)).map_err(|err| CavityError::json(path, err))
    }

    pub fn save(&self, path: &Path) -> CavityResult<()> {
        let file = File::create(path).map_err(|err| CavityError::io(path, err))?;

        let mut writer = BufWriter::new(file);

        serde_json::to_writer(&mut writer, self).map_err(|err| CavityError::json(path, err))?;
        writer.flush().map_err(|err| CavityError::io(path, err))
    }
}
