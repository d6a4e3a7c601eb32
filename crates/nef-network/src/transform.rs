// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transform builder
//!
//! Builds the `dim_post × dim_pre` routing matrix of a decoded connection.
//! Pairs `(index_post[i % len_post], index_pre[i % len_pre])` for
//! `i in 0..max(len_pre, len_post)` are set to `weight`; shorter index lists
//! wrap around.

use crate::errors::{NetworkError, NetworkResult};
use ndarray::Array2;

/// One index or a list of indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSpec {
    Single(usize),
    List(Vec<usize>),
}

impl IndexSpec {
    pub fn as_slice(&self) -> &[usize] {
        match self {
            IndexSpec::Single(index) => std::slice::from_ref(index),
            IndexSpec::List(indices) => indices,
        }
    }
}

impl From<usize> for IndexSpec {
    fn from(index: usize) -> Self {
        IndexSpec::Single(index)
    }
}

impl From<Vec<usize>> for IndexSpec {
    fn from(indices: Vec<usize>) -> Self {
        IndexSpec::List(indices)
    }
}

impl From<&[usize]> for IndexSpec {
    fn from(indices: &[usize]) -> Self {
        IndexSpec::List(indices.to_vec())
    }
}

/// Routing matrix `dim_post × dim_pre`.
///
/// Defaults: `index_pre = 0..dim_pre`, `index_post = 0..dim_post`.
///
/// # Errors
///
/// `InvalidParameters` for an empty index list or an index out of range.
pub fn compute_transform(
    dim_pre: usize,
    dim_post: usize,
    weight: f64,
    index_pre: Option<&IndexSpec>,
    index_post: Option<&IndexSpec>,
) -> NetworkResult<Array2<f64>> {
    let default_pre: Vec<usize> = (0..dim_pre).collect();
    let default_post: Vec<usize> = (0..dim_post).collect();
    let pre = index_pre.map_or(default_pre.as_slice(), IndexSpec::as_slice);
    let post = index_post.map_or(default_post.as_slice(), IndexSpec::as_slice);

    check_indices("index_pre", pre, dim_pre)?;
    check_indices("index_post", post, dim_post)?;

    let mut transform = Array2::zeros((dim_post, dim_pre));
    for i in 0..pre.len().max(post.len()) {
        transform[[post[i % post.len()], pre[i % pre.len()]]] = weight;
    }
    Ok(transform)
}

fn check_indices(name: &str, indices: &[usize], dim: usize) -> NetworkResult<()> {
    if indices.is_empty() {
        return Err(NetworkError::InvalidParameters(format!(
            "{} is empty (dimension {})",
            name, dim
        )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i >= dim) {
        return Err(NetworkError::InvalidParameters(format!(
            "{} contains {} but the dimension is {}",
            name, bad, dim
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_equal_dimensions_give_scaled_identity() {
        let t = compute_transform(3, 3, 2.0, None, None).unwrap();
        assert_eq!(t, Array2::eye(3) * 2.0);
    }

    #[test]
    fn test_wraparound_when_post_is_wider() {
        let t = compute_transform(2, 3, 1.0, None, None).unwrap();
        // i = 0,1,2 -> (0,0), (1,1), (2,0)
        assert_eq!(t, array![[1.0, 0.0], [0.0, 1.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_single_index_is_promoted() {
        let t = compute_transform(3, 1, 0.5, Some(&IndexSpec::from(2)), None).unwrap();
        assert_eq!(t, array![[0.0, 0.0, 0.5]]);
    }

    #[test]
    fn test_explicit_lists() {
        let pre = IndexSpec::from(vec![0, 1]);
        let post = IndexSpec::from(vec![1, 0]);
        let t = compute_transform(2, 2, 1.0, Some(&pre), Some(&post)).unwrap();
        assert_eq!(t, array![[0.0, 1.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let pre = IndexSpec::from(3);
        assert!(compute_transform(3, 1, 1.0, Some(&pre), None).is_err());
        assert!(compute_transform(0, 1, 1.0, None, None).is_err());
    }
}
