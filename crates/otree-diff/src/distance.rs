//! Distance functions over positioned nodes.

use std::fmt;

use otree_types::{Path, TreeResult};

use crate::error::{DiffError, DiffResult};

/// A node together with the path it was reached at.
#[derive(Clone, Debug)]
pub struct Positioned<K, N> {
    pub path: Path<K>,
    pub node: N,
}

impl<K, N> Positioned<K, N> {
    pub fn new(path: Path<K>, node: N) -> Self {
        Self { path, node }
    }
}

/// A similarity metric between two positioned nodes.
///
/// Must return a non-negative number; zero means identical. The diff engine
/// rejects negative and NaN results with [`DiffError::InvalidDistance`].
pub trait Distance<K, N> {
    fn distance(&self, before: &Positioned<K, N>, after: &Positioned<K, N>) -> TreeResult<f64>;
}

impl<K, N, F> Distance<K, N> for F
where
    F: Fn(&Positioned<K, N>, &Positioned<K, N>) -> TreeResult<f64>,
{
    fn distance(&self, before: &Positioned<K, N>, after: &Positioned<K, N>) -> TreeResult<f64> {
        self(before, after)
    }
}

/// `0.0` when the projected values are equal, `1.0` otherwise.
///
/// Position-insensitive: only the nodes are looked at.
#[derive(Clone, Copy)]
pub struct ByValue<F>(pub F);

impl<K, N, V, F> Distance<K, N> for ByValue<F>
where
    F: Fn(&N) -> V,
    V: PartialEq,
{
    fn distance(&self, before: &Positioned<K, N>, after: &Positioned<K, N>) -> TreeResult<f64> {
        if (self.0)(&before.node) == (self.0)(&after.node) {
            Ok(0.0)
        } else {
            Ok(1.0)
        }
    }
}

impl<F> fmt::Debug for ByValue<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ByValue(..)")
    }
}

/// Measure `before` against `after`, locating failures and rejecting
/// invalid results.
pub fn measure<K, N>(
    distance: &dyn Distance<K, N>,
    before: &Positioned<K, N>,
    after: &Positioned<K, N>,
) -> DiffResult<f64>
where
    K: fmt::Debug,
{
    let d = distance
        .distance(before, after)
        .map_err(|e| e.at(&after.path))?;
    if d.is_nan() || d < 0.0 {
        return Err(DiffError::InvalidDistance {
            before: before.path.to_debug_string(),
            after: after.path.to_debug_string(),
            distance: d,
        });
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use otree_types::TreeError;

    fn at(keys: &[u8], node: i32) -> Positioned<u8, i32> {
        Positioned::new(Path::from_keys(keys.iter().copied()), node)
    }

    #[test]
    fn by_value_compares_projections() {
        let parity = ByValue(|n: &i32| n % 2);
        assert_eq!(measure(&parity, &at(&[], 2), &at(&[], 4)).unwrap(), 0.0);
        assert_eq!(measure(&parity, &at(&[], 2), &at(&[], 3)).unwrap(), 1.0);
    }

    #[test]
    fn closures_are_distances() {
        let gap = |a: &Positioned<u8, i32>, b: &Positioned<u8, i32>| -> TreeResult<f64> {
            Ok(f64::from((a.node - b.node).abs()))
        };
        assert_eq!(measure(&gap, &at(&[0], 7), &at(&[0], 4)).unwrap(), 3.0);
    }

    #[test]
    fn negative_and_nan_are_rejected() {
        let negative = |_: &Positioned<u8, i32>, _: &Positioned<u8, i32>| -> TreeResult<f64> { Ok(-1.0) };
        let err = measure(&negative, &at(&[1], 0), &at(&[2], 0)).unwrap_err();
        assert_eq!(
            err,
            DiffError::InvalidDistance {
                before: "/1".into(),
                after: "/2".into(),
                distance: -1.0,
            }
        );

        let nan = |_: &Positioned<u8, i32>, _: &Positioned<u8, i32>| -> TreeResult<f64> { Ok(f64::NAN) };
        assert!(matches!(
            measure(&nan, &at(&[], 0), &at(&[], 0)),
            Err(DiffError::InvalidDistance { .. })
        ));
    }

    #[test]
    fn distance_errors_are_located() {
        let failing = |_: &Positioned<u8, i32>, _: &Positioned<u8, i32>| -> TreeResult<f64> {
            Err(TreeError::Distance("no metric".into()))
        };
        let err = measure(&failing, &at(&[3], 0), &at(&[4], 0)).unwrap_err();
        let DiffError::Tree(inner) = err else {
            unreachable!("expected a tree error");
        };
        assert_eq!(inner.path(), Some("/4"));
    }
}
