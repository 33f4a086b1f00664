use nalgebra::{Matrix3, Vector3};
use std::fmt;
use thiserror::Error;

/// Entries below this magnitude are treated as zero when classifying a cell
/// matrix.
const BOX_ZERO_TOLERANCE: f64 = 1e-12;

/// The shape class of a simulation cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxShape {
    /// No periodicity; distances are plain Euclidean differences.
    Open,
    /// A rectangular cell described by the diagonal of the cell matrix.
    Orthorhombic,
    /// A general parallelepiped cell.
    Triclinic,
}

impl fmt::Display for BoxShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                BoxShape::Open => "Open",
                BoxShape::Orthorhombic => "Orthorhombic",
                BoxShape::Triclinic => "Triclinic",
            }
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("an open box has no shortest dimension")]
    OpenBoxDimension,
}

/// Represents the periodic cell of a topology: a 3x3 cell matrix whose
/// columns are the cell vectors, plus the shape tag derived from it.
///
/// The shape tag is never stored independently of the matrix; setting a new
/// matrix re-derives it. A zero matrix is an open (non-periodic) box, a
/// diagonal matrix an orthorhombic one, anything else triclinic.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCondition {
    matrix: Matrix3<f64>,
    shape: BoxShape,
}

impl Default for BoundaryCondition {
    fn default() -> Self {
        Self::open()
    }
}

impl BoundaryCondition {
    /// Creates an open (non-periodic) boundary condition.
    pub fn open() -> Self {
        Self {
            matrix: Matrix3::zeros(),
            shape: BoxShape::Open,
        }
    }

    /// Creates a boundary condition from a cell matrix, deriving the shape.
    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self {
            shape: Self::detect_shape(&matrix),
            matrix,
        }
    }

    /// Classifies a cell matrix: zero matrix is [`BoxShape::Open`], a
    /// diagonal matrix is [`BoxShape::Orthorhombic`], anything else is
    /// [`BoxShape::Triclinic`].
    pub fn detect_shape(matrix: &Matrix3<f64>) -> BoxShape {
        let mut any_diagonal = false;
        let mut any_off_diagonal = false;
        for row in 0..3 {
            for col in 0..3 {
                if matrix[(row, col)].abs() > BOX_ZERO_TOLERANCE {
                    if row == col {
                        any_diagonal = true;
                    } else {
                        any_off_diagonal = true;
                    }
                }
            }
        }
        if any_off_diagonal {
            BoxShape::Triclinic
        } else if any_diagonal {
            BoxShape::Orthorhombic
        } else {
            BoxShape::Open
        }
    }

    /// Returns the cell matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Returns the derived shape tag.
    pub fn shape(&self) -> BoxShape {
        self.shape
    }

    /// Replaces the cell matrix and re-derives the shape tag.
    pub fn set_matrix(&mut self, matrix: Matrix3<f64>) {
        self.shape = Self::detect_shape(&matrix);
        self.matrix = matrix;
    }

    /// Computes the minimum-image displacement from `r_i` to `r_j` under the
    /// current cell shape.
    pub fn shortest_connection(
        &self,
        r_i: &Vector3<f64>,
        r_j: &Vector3<f64>,
    ) -> Vector3<f64> {
        match self.shape {
            BoxShape::Open => r_j - r_i,
            BoxShape::Orthorhombic => {
                let mut r_ij = r_j - r_i;
                for k in 0..3 {
                    let length = self.matrix[(k, k)];
                    r_ij[k] -= length * (r_ij[k] / length).round();
                }
                r_ij
            }
            BoxShape::Triclinic => {
                // Wrap along c, then b, then a; valid for the usual
                // lower-triangular cell convention.
                let r_tp = r_j - r_i;
                let r_dp =
                    r_tp - self.matrix.column(2) * (r_tp.z / self.matrix[(2, 2)]).round();
                let r_sp =
                    r_dp - self.matrix.column(1) * (r_dp.y / self.matrix[(1, 1)]).round();
                r_sp - self.matrix.column(0) * (r_sp.x / self.matrix[(0, 0)]).round()
            }
        }
    }

    /// Returns the cell volume; zero for an open box.
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// Returns the smallest perpendicular distance between opposing cell
    /// faces.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::OpenBoxDimension`] for an open box, which has
    /// no finite cell.
    pub fn shortest_dimension(&self) -> Result<f64, BoundaryError> {
        if self.shape == BoxShape::Open {
            return Err(BoundaryError::OpenBoxDimension);
        }
        let a = self.matrix.column(0).into_owned();
        let b = self.matrix.column(1).into_owned();
        let c = self.matrix.column(2).into_owned();

        let height_a = a.dot(&b.cross(&c).normalize()).abs();
        let height_b = b.dot(&c.cross(&a).normalize()).abs();
        let height_c = c.dot(&a.cross(&b).normalize()).abs();

        Ok(height_a.min(height_b).min(height_c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orthorhombic(x: f64, y: f64, z: f64) -> BoundaryCondition {
        BoundaryCondition::from_matrix(Matrix3::from_diagonal(&Vector3::new(x, y, z)))
    }

    #[test]
    fn detect_shape_classifies_the_three_cases() {
        assert_eq!(
            BoundaryCondition::detect_shape(&Matrix3::zeros()),
            BoxShape::Open
        );
        assert_eq!(
            BoundaryCondition::detect_shape(&Matrix3::from_diagonal(&Vector3::new(
                1.0, 2.0, 3.0
            ))),
            BoxShape::Orthorhombic
        );
        let mut tilted = Matrix3::from_diagonal(&Vector3::new(1.0, 2.0, 3.0));
        tilted[(1, 0)] = 0.5;
        assert_eq!(
            BoundaryCondition::detect_shape(&tilted),
            BoxShape::Triclinic
        );
    }

    #[test]
    fn set_matrix_rederives_the_shape() {
        let mut bc = BoundaryCondition::open();
        assert_eq!(bc.shape(), BoxShape::Open);
        bc.set_matrix(Matrix3::from_diagonal(&Vector3::new(4.0, 4.0, 4.0)));
        assert_eq!(bc.shape(), BoxShape::Orthorhombic);
        bc.set_matrix(Matrix3::zeros());
        assert_eq!(bc.shape(), BoxShape::Open);
    }

    #[test]
    fn open_box_connection_is_a_plain_difference() {
        let bc = BoundaryCondition::open();
        let d = bc.shortest_connection(&Vector3::new(1.0, 1.0, 1.0), &Vector3::new(9.0, 0.0, 0.0));
        assert_eq!(d, Vector3::new(8.0, -1.0, -1.0));
    }

    #[test]
    fn orthorhombic_connection_wraps_each_component() {
        let bc = orthorhombic(10.0, 10.0, 10.0);
        let d = bc.shortest_connection(&Vector3::new(1.0, 5.0, 9.5), &Vector3::new(9.0, 5.0, 0.5));
        assert!((d - Vector3::new(-2.0, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn triclinic_connection_reduces_to_orthorhombic_for_diagonal_cells() {
        let mut tilted = Matrix3::from_diagonal(&Vector3::new(10.0, 10.0, 10.0));
        tilted[(0, 1)] = 1e-9; // force the triclinic path with a tiny tilt
        let bc = BoundaryCondition::from_matrix(tilted);
        assert_eq!(bc.shape(), BoxShape::Triclinic);
        let d = bc.shortest_connection(&Vector3::new(1.0, 1.0, 1.0), &Vector3::new(9.5, 1.0, 1.0));
        assert!((d.x - (-1.5)).abs() < 1e-6);
    }

    #[test]
    fn volume_is_the_cell_determinant() {
        assert_eq!(orthorhombic(2.0, 3.0, 4.0).volume(), 24.0);
        assert_eq!(BoundaryCondition::open().volume(), 0.0);
    }

    #[test]
    fn shortest_dimension_is_the_smallest_face_distance() {
        let bc = orthorhombic(2.0, 3.0, 4.0);
        assert!((bc.shortest_dimension().unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn shortest_dimension_accounts_for_tilt() {
        // A sheared cell: the perpendicular height along b is smaller than |b|.
        let mut tilted = Matrix3::from_diagonal(&Vector3::new(10.0, 10.0, 10.0));
        tilted[(0, 1)] = 8.0;
        let bc = BoundaryCondition::from_matrix(tilted);
        // The height along a drops below the edge length once b is sheared.
        let shortest = bc.shortest_dimension().unwrap();
        assert!(shortest < 10.0);
    }

    #[test]
    fn open_box_has_no_shortest_dimension() {
        assert_eq!(
            BoundaryCondition::open().shortest_dimension(),
            Err(BoundaryError::OpenBoxDimension)
        );
    }
}
