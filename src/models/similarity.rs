use serde::Deserialize;

use crate::error::AppError;

/// Dense, square item-item similarity matrix stored row-major
///
/// Scores are opaque reals: no range is assumed and the diagonal carries no
/// meaning.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>")]
pub struct SimilarityMatrix {
    dim: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// Builds the matrix from rows, rejecting ragged or non-square input
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, AppError> {
        let dim = rows.len();
        let mut scores = Vec::with_capacity(dim * dim);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(AppError::InvalidArtifact(format!(
                    "similarity row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
            scores.extend(row);
        }

        Ok(Self { dim, scores })
    }

    /// Number of rows (and columns)
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.dim {
            return None;
        }
        let start = index * self.dim;
        Some(&self.scores[start..start + self.dim])
    }
}

impl TryFrom<Vec<Vec<f64>>> for SimilarityMatrix {
    type Error = AppError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_addressable() {
        let matrix =
            SimilarityMatrix::from_rows(vec![vec![1.0, 0.2], vec![0.2, 1.0]]).unwrap();
        assert_eq!(matrix.dim(), 2);
        assert_eq!(matrix.row(0), Some(&[1.0, 0.2][..]));
        assert_eq!(matrix.row(1), Some(&[0.2, 1.0][..]));
        assert_eq!(matrix.row(2), None);
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let result = SimilarityMatrix::from_rows(vec![vec![1.0, 0.2], vec![0.2]]);
        assert!(matches!(result, Err(AppError::InvalidArtifact(_))));
    }

    #[test]
    fn test_rejects_non_square() {
        let result = SimilarityMatrix::from_rows(vec![vec![1.0, 0.2, 0.3], vec![0.2, 1.0, 0.3]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserializes_from_nested_arrays() {
        let matrix: SimilarityMatrix =
            serde_json::from_str("[[1.0, -3.5], [-3.5, 1.0]]").unwrap();
        assert_eq!(matrix.row(0), Some(&[1.0, -3.5][..]));

        let ragged = serde_json::from_str::<SimilarityMatrix>("[[1.0, 2.0], [1.0]]");
        assert!(ragged.is_err());
    }
}
