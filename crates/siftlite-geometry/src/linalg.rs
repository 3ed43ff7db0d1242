/// Determinant of a 3x3 matrix.
pub fn det_mat33(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Scale a 3x3 matrix in place so that its bottom-right entry is one.
///
/// Returns `false`, leaving the matrix untouched, when that entry is too close
/// to zero to divide by.
pub fn normalize_mat33_inplace(m: &mut [[f64; 3]; 3]) -> bool {
    let w = m[2][2];
    if w.abs() < 1e-12 {
        return false;
    }
    m.iter_mut().flatten().for_each(|v| *v /= w);
    true
}

/// Multiply a 3x3 matrix by a 3-vector.
pub fn mat33_mul_vec3(m: &[[f64; 3]; 3], v: &[f64; 3], dst: &mut [f64; 3]) {
    for (dst_i, row) in dst.iter_mut().zip(m.iter()) {
        *dst_i = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
}

/// Multiply two 3x3 matrices, `a · b`.
pub fn mat33_mul_mat33(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_det_mat33() {
        let m = [[2.0, 0.0, 1.0], [1.0, 3.0, 2.0], [1.0, 1.0, 1.0]];
        // 2 (3 - 2) - 0 + 1 (1 - 3)
        assert_relative_eq!(det_mat33(&m), 0.0);

        let m = [[1.0, 2.0, 3.0], [0.0, 4.0, 5.0], [1.0, 0.0, 6.0]];
        assert_relative_eq!(det_mat33(&m), 22.0);
    }

    #[test]
    fn test_normalize_mat33() {
        let mut m = [[2.0, 4.0, 6.0], [0.0, 2.0, 8.0], [0.0, 0.0, 2.0]];
        assert!(normalize_mat33_inplace(&mut m));
        assert_eq!(m, [[1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [0.0, 0.0, 1.0]]);

        let mut m = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        assert!(!normalize_mat33_inplace(&mut m));
        assert_eq!(m[0][0], 1.0);
    }

    #[test]
    fn test_mat33_products() {
        let a = [[1.0, 0.0, 5.0], [0.0, 1.0, 3.0], [0.0, 0.0, 1.0]];
        let b = [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]];

        let ab = mat33_mul_mat33(&a, &b);
        assert_eq!(ab, [[2.0, 0.0, 5.0], [0.0, 2.0, 3.0], [0.0, 0.0, 1.0]]);

        let mut p = [0.0; 3];
        mat33_mul_vec3(&ab, &[1.0, 1.0, 1.0], &mut p);
        assert_eq!(p, [7.0, 5.0, 1.0]);
    }
}
