/// A 2D affine transformation matrix.
///
/// Stored as six values `[a, b, c, d, e, f]` describing
///
/// ```text
/// | a  c  e |
/// | b  d  f |
/// | 0  0  1 |
/// ```
///
/// so a point maps as `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Matrix data in column order: [a, b, c, d, e, f]
    pub m: [f32; 6],
}

/// Result of splitting an affine matrix into its geometric parts.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Decomposition {
    /// Translation `[x, y]`
    pub translation: [f32; 2],
    /// Rotation in radians
    pub rotation: f32,
    /// Scale `[sx, sy]`
    pub scale: [f32; 2],
    /// Horizontal skew angle in radians left over after rotation and scale
    pub skew: f32,
}

impl Decomposition {
    /// Rotation converted to degrees.
    pub fn rotation_degrees(&self) -> f32 {
        self.rotation * 180.0 / std::f32::consts::PI
    }
}

impl Transform {
    /// Identity matrix (no transformation)
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Create an identity transform
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Create a transform from raw `[a, b, c, d, e, f]` values
    pub fn from_matrix(m: [f32; 6]) -> Self {
        Self { m }
    }

    /// Create a translation transform
    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    /// Create a rotation transform (clockwise in y-down screen space)
    pub fn rotate(angle_radians: f32) -> Self {
        let cos = angle_radians.cos();
        let sin = angle_radians.sin();
        Self {
            m: [cos, sin, -sin, cos, 0.0, 0.0],
        }
    }

    /// Create a rotation transform from degrees
    pub fn rotate_degrees(angle_degrees: f32) -> Self {
        Self::rotate(angle_degrees.to_radians())
    }

    /// Create a uniform scale transform
    pub fn scale(s: f32) -> Self {
        Self::scale_xy(s, s)
    }

    /// Create a non-uniform scale transform
    pub fn scale_xy(sx: f32, sy: f32) -> Self {
        Self {
            m: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Compose this transform with another: self * other
    /// Applies `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Transform {
        let [a1, b1, c1, d1, e1, f1] = self.m;
        let [a2, b2, c2, d2, e2, f2] = other.m;

        Transform {
            m: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * e2 + c1 * f2 + e1,
                b1 * e2 + d1 * f2 + f1,
            ],
        }
    }

    /// Compute the inverse of this transform.
    /// A degenerate (non-invertible) matrix yields the identity.
    pub fn inverse(&self) -> Transform {
        let [a, b, c, d, e, f] = self.m;
        let det = self.determinant();

        if det.abs() < 1e-10 {
            return Self::IDENTITY;
        }

        let inv_det = 1.0 / det;

        Transform {
            m: [
                d * inv_det,
                -b * inv_det,
                -c * inv_det,
                a * inv_det,
                (c * f - d * e) * inv_det,
                (b * e - a * f) * inv_det,
            ],
        }
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f32 {
        let [a, b, c, d, ..] = self.m;
        a * d - b * c
    }

    /// Transform a 2D point by this matrix
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.m;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Split the matrix into translation, rotation, scale and skew.
    ///
    /// QR-style: the rotation is the angle of the first basis vector and its
    /// length is the x scale; the y scale comes from the determinant so a
    /// mirrored matrix reports a negative `scale[1]`. The skew angle is
    /// `atan((a*c + b*d) / r^2)` where `r` is the first column's length.
    /// When the first column is zero the second column is used instead and
    /// no skew is reported.
    pub fn decompose(&self) -> Decomposition {
        let [a, b, c, d, e, f] = self.m;
        let det = self.determinant();
        let mut result = Decomposition {
            translation: [e, f],
            ..Decomposition::default()
        };

        if a != 0.0 || b != 0.0 {
            let r = a.hypot(b);
            result.rotation = b.atan2(a);
            result.scale = [r, det / r];
            result.skew = ((a * c + b * d) / (r * r)).atan();
        } else if c != 0.0 || d != 0.0 {
            let s = c.hypot(d);
            result.rotation = std::f32::consts::FRAC_PI_2 - d.atan2(c);
            result.scale = [det / s, s];
        }

        result
    }

    /// Raw matrix values `[a, b, c, d, e, f]`
    pub fn matrix(&self) -> [f32; 6] {
        self.m
    }

    /// Check if this is the identity transform
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.then(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_identity() {
        let t = Transform::identity();
        assert_eq!(t, Transform::IDENTITY);
        assert!(t.is_identity());
    }

    #[test]
    fn test_translate() {
        let t = Transform::translate(10.0, 20.0);
        let (x, y) = t.transform_point(0.0, 0.0);
        assert!(approx_eq(x, 10.0));
        assert!(approx_eq(y, 20.0));

        let (x2, y2) = t.transform_point(5.0, 5.0);
        assert!(approx_eq(x2, 15.0));
        assert!(approx_eq(y2, 25.0));
    }

    #[test]
    fn test_rotate() {
        let t = Transform::rotate_degrees(90.0);
        let (x, y) = t.transform_point(1.0, 0.0);
        assert!(approx_eq(x, 0.0));
        assert!(approx_eq(y, 1.0));
    }

    #[test]
    fn test_scale_xy() {
        let t = Transform::scale_xy(2.0, 3.0);
        let (x, y) = t.transform_point(1.0, 1.0);
        assert!(approx_eq(x, 2.0));
        assert!(approx_eq(y, 3.0));
    }

    #[test]
    fn test_compose() {
        // Point (0,0) -> translate -> (10,0) -> scale -> (20,0)
        let composed = Transform::scale(2.0).then(&Transform::translate(10.0, 0.0));
        let (x, y) = composed.transform_point(0.0, 0.0);
        assert!(approx_eq(x, 20.0));
        assert!(approx_eq(y, 0.0));

        let same = Transform::scale(2.0) * Transform::translate(10.0, 0.0);
        assert_eq!(composed, same);
    }

    #[test]
    fn test_inverse() {
        let t = Transform::translate(10.0, 20.0)
            .then(&Transform::rotate_degrees(30.0))
            .then(&Transform::scale_xy(2.0, 0.5));
        let composed = t.then(&t.inverse());

        let (x, y) = composed.transform_point(3.0, 4.0);
        assert!(approx_eq(x, 3.0));
        assert!(approx_eq(y, 4.0));
    }

    #[test]
    fn test_inverse_degenerate() {
        let t = Transform::scale(0.0);
        assert!(t.inverse().is_identity());
    }

    #[test]
    fn test_decompose_translate_rotate_scale() {
        let t = Transform::translate(10.0, 20.0)
            .then(&Transform::rotate(FRAC_PI_2))
            .then(&Transform::scale_xy(2.0, 1.0));
        let dec = t.decompose();

        assert!(approx_eq(dec.translation[0], 10.0));
        assert!(approx_eq(dec.translation[1], 20.0));
        assert!(approx_eq(dec.rotation, FRAC_PI_2));
        assert!(approx_eq(dec.rotation_degrees(), 90.0));
        assert!(approx_eq(dec.scale[0], 2.0));
        assert!(approx_eq(dec.scale[1], 1.0));
        assert!(approx_eq(dec.skew, 0.0));
    }

    #[test]
    fn test_decompose_shear() {
        // x' = x + y: a pure horizontal shear of 45°
        let dec = Transform::from_matrix([1.0, 0.0, 1.0, 1.0, 0.0, 0.0]).decompose();
        assert!(approx_eq(dec.rotation, 0.0));
        assert!(approx_eq(dec.scale[0], 1.0));
        assert!(approx_eq(dec.scale[1], 1.0));
        assert!(approx_eq(dec.skew, PI / 4.0));
    }

    #[test]
    fn test_decompose_negative_angle() {
        let dec = Transform::rotate(-PI / 4.0).decompose();
        assert!(approx_eq(dec.rotation, -PI / 4.0));
        assert!(approx_eq(dec.scale[0], 1.0));
        assert!(approx_eq(dec.scale[1], 1.0));
    }

    #[test]
    fn test_decompose_mirrored() {
        let dec = Transform::scale_xy(3.0, -2.0).decompose();
        assert!(approx_eq(dec.rotation, 0.0));
        assert!(approx_eq(dec.scale[0], 3.0));
        assert!(approx_eq(dec.scale[1], -2.0));
    }

    #[test]
    fn test_decompose_zero_first_column() {
        let dec = Transform::from_matrix([0.0, 0.0, 0.0, 4.0, 1.0, 2.0]).decompose();
        assert!(approx_eq(dec.rotation, 0.0));
        assert!(approx_eq(dec.scale[0], 0.0));
        assert!(approx_eq(dec.scale[1], 4.0));
        assert_eq!(dec.translation, [1.0, 2.0]);
    }

    #[test]
    fn test_decompose_zero_matrix() {
        let dec = Transform::from_matrix([0.0; 6]).decompose();
        assert_eq!(dec, Decomposition::default());
    }
}
