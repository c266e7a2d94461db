//! Helpers for sparse feature rows stored as CSR matrices.

use sprs::{CsMat, CsVecView};

/// One sparse row as `(column, value)` pairs with strictly increasing columns.
pub type FeatureRow = Vec<(usize, f64)>;

pub fn to_row(view: CsVecView<f64>) -> FeatureRow {
    view.iter().map(|(idx, value)| (idx, *value)).collect()
}

/// Builds a CSR matrix with `cols` columns from rows in order.
pub fn stack_rows<I>(cols: usize, rows: I) -> CsMat<f64>
where
    I: IntoIterator<Item = FeatureRow>,
{
    let mut indptr = vec![0usize];
    let mut indices = Vec::new();
    let mut data = Vec::new();

    for row in rows {
        for (idx, value) in row {
            indices.push(idx);
            data.push(value);
        }
        indptr.push(indices.len());
    }

    CsMat::new((indptr.len() - 1, cols), indptr, indices, data)
}

/// Copies the selected rows, in the order given, into a new matrix.
pub fn select_rows(matrix: &CsMat<f64>, selection: &[usize]) -> CsMat<f64> {
    stack_rows(
        matrix.cols(),
        selection
            .iter()
            .filter_map(|idx| matrix.outer_view(*idx))
            .map(to_row),
    )
}

pub fn squared_distance(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    merge(a, b).map(|(_, x, y)| (x - y) * (x - y)).sum()
}

/// `a + gap * (b - a)`, dropping entries that end up exactly zero.
pub fn interpolate(a: &[(usize, f64)], b: &[(usize, f64)], gap: f64) -> FeatureRow {
    merge(a, b)
        .map(|(idx, x, y)| (idx, x + gap * (y - x)))
        .filter(|(_, value)| *value != 0.0)
        .collect()
}

/// Walks the union of two sorted sparse rows, yielding zero for missing entries.
fn merge<'a>(a: &'a [(usize, f64)], b: &'a [(usize, f64)]) -> impl Iterator<Item = (usize, f64, f64)> + 'a {
    let mut i = 0;
    let mut j = 0;

    std::iter::from_fn(move || {
        match (a.get(i), b.get(j)) {
            (Some(&(ia, va)), Some(&(ib, vb))) => {
                if ia == ib {
                    i += 1;
                    j += 1;
                    Some((ia, va, vb))
                } else if ia < ib {
                    i += 1;
                    Some((ia, va, 0.0))
                } else {
                    j += 1;
                    Some((ib, 0.0, vb))
                }
            },
            (Some(&(ia, va)), None) => {
                i += 1;
                Some((ia, va, 0.0))
            },
            (None, Some(&(ib, vb))) => {
                j += 1;
                Some((ib, 0.0, vb))
            },
            (None, None) => None,
        }
    })
}
