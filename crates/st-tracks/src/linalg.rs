// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Small dense kernels used by the factorisation loop.

/// Pivot at which a Cholesky factorisation found a non-positive diagonal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NotPositiveDefinite {
    pub pivot: usize,
}

/// Solves `a · x = b` in place for a symmetric positive definite `a`.
///
/// `a` is row-major `n × n`; only its lower triangle is read and it is
/// overwritten with the Cholesky factor `L`. On success `b` holds `x`.
pub(crate) fn cholesky_solve(
    a: &mut [f64],
    b: &mut [f64],
    n: usize,
) -> Result<(), NotPositiveDefinite> {
    debug_assert_eq!(a.len(), n * n);
    debug_assert_eq!(b.len(), n);

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= a[i * n + k] * a[j * n + k];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(NotPositiveDefinite { pivot: i });
                }
                a[i * n + i] = sum.sqrt();
            } else {
                a[i * n + j] = sum / a[j * n + j];
            }
        }
    }

    // L · y = b
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= a[i * n + k] * b[k];
        }
        b[i] = sum / a[i * n + i];
    }
    // Lᵀ · x = y
    for i in (0..n).rev() {
        let mut sum = b[i];
        for k in (i + 1)..n {
            sum -= a[k * n + i] * b[k];
        }
        b[i] = sum / a[i * n + i];
    }
    Ok(())
}

/// Dot product accumulated in double precision.
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

/// `xᵀ · m · x` for a row-major symmetric `m`.
pub(crate) fn quadratic_form(m: &[f64], x: &[f32]) -> f64 {
    let n = x.len();
    let mut total = 0.0;
    for i in 0..n {
        let xi = f64::from(x[i]);
        let row = &m[i * n..(i + 1) * n];
        let inner: f64 = row
            .iter()
            .zip(x.iter())
            .map(|(&mij, &xj)| mij * f64::from(xj))
            .sum();
        total += xi * inner;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_a_small_spd_system() {
        // [[4, 2], [2, 3]] x = [2, 1] → x = [0.5, 0]
        let mut a = vec![4.0, 2.0, 2.0, 3.0];
        let mut b = vec![2.0, 1.0];
        cholesky_solve(&mut a, &mut b, 2).unwrap();
        assert!((b[0] - 0.5).abs() < 1e-12);
        assert!(b[1].abs() < 1e-12);
    }

    #[test]
    fn reads_only_the_lower_triangle() {
        let mut a = vec![4.0, f64::NAN, 2.0, 3.0];
        let mut b = vec![2.0, 1.0];
        cholesky_solve(&mut a, &mut b, 2).unwrap();
        assert!((b[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_indefinite_matrices() {
        let mut a = vec![1.0, 0.0, 2.0, 1.0];
        let mut b = vec![1.0, 1.0];
        assert_eq!(
            cholesky_solve(&mut a, &mut b, 2),
            Err(NotPositiveDefinite { pivot: 1 })
        );
    }

    #[test]
    fn quadratic_form_matches_expansion() {
        let m = [2.0, 1.0, 1.0, 3.0];
        let x = [1.0f32, 2.0];
        // 2·1 + 2·1·2·1 + 3·4 = 18
        assert!((quadratic_form(&m, &x) - 18.0).abs() < 1e-12);
        assert!((dot(&x, &x) - 5.0).abs() < 1e-12);
    }
}
