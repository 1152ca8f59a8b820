//! Fast kernels specialised at compile time on angular momentum `L` and
//! derivative order `D`.
//!
//! Points are handled in lanes of [`LANE`] with structure-of-arrays scratch
//! on the stack: relative coordinates, power tables built by repeated
//! multiplication and the Gaussian partials written out explicitly for each
//! order. The component loop is then unrolled by the compiler since `L` is a
//! constant. Radial sums come from [`radial_derivatives`], the same routine
//! the generic path uses.

extern crate nalgebra as na;

use super::CartesianBlock;
use crate::radial::radial_derivatives;
use crate::shell::Shell;
use na::Vector3;

/// Highest angular momentum with a specialised kernel.
pub const SPECIALIZED_MAX_L: u32 = 8;

pub(crate) const LANE: usize = 32;
const POW_LEN: usize = SPECIALIZED_MAX_L as usize + 1;

// Gaussian partial slots, same order as the output buffers.
const S: usize = 0;
const SX: usize = 1;
const SY: usize = 2;
const SZ: usize = 3;
const SXX: usize = 4;
const SXY: usize = 5;
const SXZ: usize = 6;
const SYY: usize = 7;
const SYZ: usize = 8;
const SZZ: usize = 9;
const SXXX: usize = 10;
const SXXY: usize = 11;
const SXXZ: usize = 12;
const SXYY: usize = 13;
const SXYZ: usize = 14;
const SXZZ: usize = 15;
const SYYY: usize = 16;
const SYYZ: usize = 17;
const SYZZ: usize = 18;
const SZZZ: usize = 19;

/// `[t^n, d/dt t^n, d2/dt2 t^n, d3/dt3 t^n]` from a power table.
#[inline(always)]
fn axis_factors(pows: &[[f64; LANE]; POW_LEN], n: usize, p: usize) -> [f64; 4] {
    let nf = n as f64;
    [
        pows[n][p],
        if n >= 1 { nf * pows[n - 1][p] } else { 0.0 },
        if n >= 2 { nf * (nf - 1.0) * pows[n - 2][p] } else { 0.0 },
        if n >= 3 {
            nf * (nf - 1.0) * (nf - 2.0) * pows[n - 3][p]
        } else {
            0.0
        },
    ]
}

#[inline(always)]
fn fill_gaussian_partials<const D: usize>(x: f64, y: f64, z: f64, r: &[f64; 4], s: &mut [f64; 20]) {
    s[S] = r[0];
    if D >= 1 {
        let (tx, ty, tz) = (2.0 * x, 2.0 * y, 2.0 * z);
        s[SX] = tx * r[1];
        s[SY] = ty * r[1];
        s[SZ] = tz * r[1];
        if D >= 2 {
            let two_r1 = 2.0 * r[1];
            s[SXX] = two_r1 + tx * tx * r[2];
            s[SXY] = tx * ty * r[2];
            s[SXZ] = tx * tz * r[2];
            s[SYY] = two_r1 + ty * ty * r[2];
            s[SYZ] = ty * tz * r[2];
            s[SZZ] = two_r1 + tz * tz * r[2];
            if D >= 3 {
                let (r2, r3) = (r[2], r[3]);
                s[SXXX] = 6.0 * tx * r2 + tx * tx * tx * r3;
                s[SXXY] = 2.0 * ty * r2 + tx * tx * ty * r3;
                s[SXXZ] = 2.0 * tz * r2 + tx * tx * tz * r3;
                s[SXYY] = 2.0 * tx * r2 + tx * ty * ty * r3;
                s[SXYZ] = tx * ty * tz * r3;
                s[SXZZ] = 2.0 * tx * r2 + tx * tz * tz * r3;
                s[SYYY] = 6.0 * ty * r2 + ty * ty * ty * r3;
                s[SYYZ] = 2.0 * tz * r2 + ty * ty * tz * r3;
                s[SYZZ] = 2.0 * ty * r2 + ty * tz * tz * r3;
                s[SZZZ] = 6.0 * tz * r2 + tz * tz * tz * r3;
            }
        }
    }
}

/// Product rule for one component at one point. `a`, `b`, `c` are the
/// axis factors of x^lx, y^ly, z^lz; `s` the Gaussian partials.
#[inline(always)]
fn component_outputs<const D: usize>(a: &[f64; 4], b: &[f64; 4], c: &[f64; 4], s: &[f64; 20], out: &mut [f64; 20]) {
    let (a0, a1, a2, a3) = (a[0], a[1], a[2], a[3]);
    let (b0, b1, b2, b3) = (b[0], b[1], b[2], b[3]);
    let (c0, c1, c2, c3) = (c[0], c[1], c[2], c[3]);

    out[0] = a0 * b0 * c0 * s[S];
    if D == 0 {
        return;
    }

    out[1] = (a1 * s[S] + a0 * s[SX]) * b0 * c0;
    out[2] = a0 * (b1 * s[S] + b0 * s[SY]) * c0;
    out[3] = a0 * b0 * (c1 * s[S] + c0 * s[SZ]);
    if D == 1 {
        return;
    }

    // x-second-derivative of (A S), reused by the mixed third derivatives
    let axx = a2 * s[S] + 2.0 * a1 * s[SX] + a0 * s[SXX];
    let byy = b2 * s[S] + 2.0 * b1 * s[SY] + b0 * s[SYY];
    let czz = c2 * s[S] + 2.0 * c1 * s[SZ] + c0 * s[SZZ];

    out[4] = b0 * c0 * axx;
    out[5] = c0 * (a1 * b1 * s[S] + a1 * b0 * s[SY] + a0 * b1 * s[SX] + a0 * b0 * s[SXY]);
    out[6] = b0 * (a1 * c1 * s[S] + a1 * c0 * s[SZ] + a0 * c1 * s[SX] + a0 * c0 * s[SXZ]);
    out[7] = a0 * c0 * byy;
    out[8] = a0 * (b1 * c1 * s[S] + b1 * c0 * s[SZ] + b0 * c1 * s[SY] + b0 * c0 * s[SYZ]);
    out[9] = a0 * b0 * czz;
    if D == 2 {
        return;
    }

    out[10] = b0 * c0 * (a3 * s[S] + 3.0 * a2 * s[SX] + 3.0 * a1 * s[SXX] + a0 * s[SXXX]);
    out[11] = c0 * (b0 * (a2 * s[SY] + 2.0 * a1 * s[SXY] + a0 * s[SXXY]) + b1 * axx);
    out[12] = b0 * (c0 * (a2 * s[SZ] + 2.0 * a1 * s[SXZ] + a0 * s[SXXZ]) + c1 * axx);
    out[13] = c0 * (a0 * (b2 * s[SX] + 2.0 * b1 * s[SXY] + b0 * s[SXYY]) + a1 * byy);
    out[14] = a1 * b1 * c1 * s[S]
        + a1 * b1 * c0 * s[SZ]
        + a1 * b0 * c1 * s[SY]
        + a0 * b1 * c1 * s[SX]
        + a1 * b0 * c0 * s[SYZ]
        + a0 * b1 * c0 * s[SXZ]
        + a0 * b0 * c1 * s[SXY]
        + a0 * b0 * c0 * s[SXYZ];
    out[15] = b0 * (a0 * (c2 * s[SX] + 2.0 * c1 * s[SXZ] + c0 * s[SXZZ]) + a1 * czz);
    out[16] = a0 * c0 * (b3 * s[S] + 3.0 * b2 * s[SY] + 3.0 * b1 * s[SYY] + b0 * s[SYYY]);
    out[17] = a0 * (c0 * (b2 * s[SZ] + 2.0 * b1 * s[SYZ] + b0 * s[SYYZ]) + c1 * byy);
    out[18] = a0 * (b0 * (c2 * s[SY] + 2.0 * c1 * s[SYZ] + c0 * s[SYZZ]) + b1 * czz);
    out[19] = a0 * b0 * (c3 * s[S] + 3.0 * c2 * s[SZ] + 3.0 * c1 * s[SZZ] + c0 * s[SZZZ]);
}

pub(crate) fn specialized_kernel<const L: usize, const D: usize>(
    shell: &Shell,
    points: &[Vector3<f64>],
    block: &mut CartesianBlock,
) {
    debug_assert_eq!(shell.l() as usize, L);
    debug_assert_eq!(block.order(), D);

    let nout = block.n_outputs();
    let center = shell.center();
    block.reset(points.len());

    let mut xp = [[0.0; LANE]; POW_LEN];
    let mut yp = [[0.0; LANE]; POW_LEN];
    let mut zp = [[0.0; LANE]; POW_LEN];
    let mut partials = [[0.0; 20]; LANE];
    let mut out = [0.0; 20];

    for (lane_idx, lane) in points.chunks(LANE).enumerate() {
        let base = lane_idx * LANE;

        for (p, point) in lane.iter().enumerate() {
            let d = point - center;
            let radial = radial_derivatives(shell.primitives(), d.norm_squared(), D);
            fill_gaussian_partials::<D>(d.x, d.y, d.z, &radial, &mut partials[p]);

            xp[0][p] = 1.0;
            yp[0][p] = 1.0;
            zp[0][p] = 1.0;
            for n in 1..=L {
                xp[n][p] = xp[n - 1][p] * d.x;
                yp[n][p] = yp[n - 1][p] * d.y;
                zp[n][p] = zp[n - 1][p] * d.z;
            }
        }

        let mut comp = 0;
        for i in 0..=L {
            let lx = L - i;
            for j in 0..=i {
                let (ly, lz) = (i - j, j);
                for p in 0..lane.len() {
                    let a = axis_factors(&xp, lx, p);
                    let b = axis_factors(&yp, ly, p);
                    let c = axis_factors(&zp, lz, p);
                    component_outputs::<D>(&a, &b, &c, &partials[p], &mut out);
                    for (o, &value) in out.iter().enumerate().take(nout) {
                        block.set(o, comp, base + p, value);
                    }
                }
                comp += 1;
            }
        }
    }
}
