use crate::shell::Primitive;

/// Radial contraction and its derivatives with respect to r^2:
///
///   out[n] = d^n/d(r^2)^n  sum_p c_p exp(-a_p r^2) = sum_p c_p (-a_p)^n exp(-a_p r^2)
///
/// for `n <= order` (at most 3); higher slots stay zero. Large arguments are
/// left to underflow to zero.
#[inline]
pub fn radial_derivatives(primitives: &[Primitive], r2: f64, order: usize) -> [f64; 4] {
    let mut out = [0.0; 4];
    for prim in primitives {
        let e = prim.coefficient * (-prim.exponent * r2).exp();
        out[0] += e;
        if order >= 1 {
            let a = -prim.exponent;
            out[1] += a * e;
            if order >= 2 {
                out[2] += a * a * e;
                if order >= 3 {
                    out[3] += a * a * a * e;
                }
            }
        }
    }
    out
}
