// Small combinatorial helpers shared by the generic expander and the
// solid-harmonic table.

pub(crate) fn factorial(n: u32) -> f64 {
    (1..=n).fold(1.0, |acc, x| acc * x as f64)
}

/// i! / (i - a)!, zero when `a > i`.
pub(crate) fn falling_factorial(i: u32, a: u32) -> f64 {
    if a > i {
        return 0.0;
    }
    ((i - a + 1)..=i).fold(1.0, |acc, x| acc * x as f64)
}

pub(crate) fn binomial(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    falling_factorial(n, k) / factorial(k)
}

/// Exact binomial coefficient, zero when `k > n`.
pub(crate) fn binomial_exact(n: u32, k: u32) -> i128 {
    if k > n {
        return 0;
    }
    (0..i128::from(k)).fold(1, |c, i| c * (i128::from(n) - i) / (i + 1))
}

/// `n! / (a! b! c!)` as an exact integer; requires `a + b + c <= n <= 33`.
pub(crate) fn factorial_quotient(n: u32, parts: [u32; 3]) -> i128 {
    let mut rest = n;
    let mut acc = 1i128;
    for part in parts {
        acc *= binomial_exact(rest, part);
        rest -= part;
    }
    acc * (1..=i128::from(rest)).product::<i128>()
}

/// Number of ways the k-th term appears when differentiating g(x^2) a times
/// with respect to x:  a! / ((a - 2k)! k!).
pub(crate) fn hermite_weight(a: u32, k: u32) -> f64 {
    if 2 * k > a {
        return 0.0;
    }
    factorial(a) / (factorial(a - 2 * k) * factorial(k))
}

/// Integer power with `0^0 = 1`, used where exponents are known to be small.
#[inline]
pub(crate) fn ipow(x: f64, n: u32) -> f64 {
    x.powi(n as i32)
}
