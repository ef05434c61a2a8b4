#[allow(unused_imports)]
use micromath::F32Ext;

pub type Matrix4 = [[f32; 4]; 4];
pub type Vector4 = [f32; 4];

/// Solves `m * x = b` by gaussian elimination with partial pivoting.
///
/// Returns `None` when a pivot vanishes or the result is not finite.
pub fn solve4(mut m: Matrix4, mut b: Vector4) -> Option<Vector4> {
    for col in 0..4 {
        let pivot_row = (col..4).fold(col, |best, row| {
            if m[row][col].abs() > m[best][col].abs() {
                row
            } else {
                best
            }
        });
        let pivot = m[pivot_row][col];
        if pivot == 0.0 || !pivot.is_finite() {
            return None;
        }
        m.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..4 {
            let factor = m[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..4 {
                m[row][k] -= factor * m[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; 4];
    for row in (0..4).rev() {
        let sum = (row + 1..4).fold(b[row], |acc, k| acc - m[row][k] * x[k]);
        x[row] = sum / m[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_identity() {
        let m = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        assert_eq!(solve4(m, [1.0, 2.0, 3.0, 4.0]), Some([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_needs_pivoting() {
        // the first pivot candidate is zero
        let m = [
            [0.0, 2.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 3.0],
            [0.0, 0.0, 4.0, 0.0],
        ];
        let x = solve4(m, [2.0, 5.0, 9.0, 8.0]).unwrap();
        let expected = [5.0, 1.0, 2.0, 3.0];
        for (actual, expected) in x.iter().zip(expected.iter()) {
            assert_relative_eq!(*actual, *expected);
        }
    }

    #[test]
    fn test_singular() {
        let m = [
            [1.0, 2.0, 0.0, 0.0],
            [2.0, 4.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        assert_eq!(solve4(m, [1.0, 2.0, 3.0, 4.0]), None);
    }

    #[test]
    fn test_dense() {
        let m = [
            [4.0, -2.0, 1.0, 3.0],
            [3.0, 6.0, -4.0, 2.0],
            [2.0, 1.0, 8.0, -5.0],
            [1.0, -3.0, 2.0, 7.0],
        ];
        let expected = [1.0, -1.0, 2.0, 0.5];
        let b = [0, 1, 2, 3].map(|row| {
            (0..4).fold(0.0, |acc, col| acc + m[row][col] * expected[col])
        });
        let x = solve4(m, b).unwrap();
        for (actual, expected) in x.iter().zip(expected.iter()) {
            assert_relative_eq!(*actual, *expected, epsilon = 1e-5);
        }
    }
}
