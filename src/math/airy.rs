//! Airy functions of the first and second kind on the real line.
//!
//! The gradual-sink model needs `Ai` and `Ai'` at positive arguments (its
//! distal domain is governed by the Airy equation `y'' = u y`); `Bi`/`Bi'`
//! complete the standard pair. All four values are computed together since
//! the evaluators always consume `Ai` and `Ai'` at the same point.
//!
//! Numerical scheme (three regimes, seams chosen so each regime is well
//! inside its accurate range):
//!
//! - `|x| <= 4.5`: Maclaurin series `Ai = c1 f - c2 g` (and the matching
//!   derivative series). Cancellation between `f` and `g` is still mild here.
//! - `4.5 < |x| < 9`: Taylor propagation of the Airy ODE from `±4.5`. The
//!   power series loses digits to cancellation on this range and the
//!   asymptotic series has not converged yet, so we step `y'' = x y`
//!   instead; its Taylor coefficients obey a three-term recurrence, making
//!   each half-unit step cheap and accurate to machine precision.
//! - `|x| >= 9`: Poincaré asymptotic expansions (DLMF 9.7), truncated at the
//!   smallest term.

/// `Ai(0) = 3^(-2/3) / Γ(2/3)`.
const AI_ZERO: f64 = 0.355_028_053_887_817_24;
/// `Ai'(0) = -3^(-1/3) / Γ(1/3)`.
const AI_PRIME_ZERO: f64 = -0.258_819_403_792_806_8;

/// Seam between the Maclaurin series and ODE stepping.
const SERIES_RADIUS: f64 = 4.5;
/// Seam between ODE stepping and the asymptotic expansions.
const ASYMPTOTIC_RADIUS: f64 = 9.0;
/// Step length for the ODE propagation.
const ODE_STEP: f64 = 0.5;

/// Values of the Airy pair and their derivatives at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Airy {
    pub ai: f64,
    pub ai_prime: f64,
    pub bi: f64,
    pub bi_prime: f64,
}

/// Evaluate `Ai`, `Ai'`, `Bi`, `Bi'` at `x`.
pub fn airy(x: f64) -> Airy {
    if !x.is_finite() {
        return Airy {
            ai: f64::NAN,
            ai_prime: f64::NAN,
            bi: f64::NAN,
            bi_prime: f64::NAN,
        };
    }
    if x.abs() <= SERIES_RADIUS {
        maclaurin(x)
    } else if x.abs() < ASYMPTOTIC_RADIUS {
        propagate(x)
    } else if x > 0.0 {
        asymptotic_pos(x)
    } else {
        asymptotic_neg(-x)
    }
}

/// Airy function of the first kind, `Ai(x)`.
pub fn airy_ai(x: f64) -> f64 {
    airy(x).ai
}

/// Derivative of the Airy function of the first kind, `Ai'(x)`.
pub fn airy_ai_prime(x: f64) -> f64 {
    airy(x).ai_prime
}

/// Airy function of the second kind, `Bi(x)`.
pub fn airy_bi(x: f64) -> f64 {
    airy(x).bi
}

/// Derivative of the Airy function of the second kind, `Bi'(x)`.
pub fn airy_bi_prime(x: f64) -> f64 {
    airy(x).bi_prime
}

/// Maclaurin series via the two standard solutions `f`, `g` of `y'' = x y`:
///
/// ```text
/// f(x) = 1 + x^3/6 + x^6/180 + ...      g(x) = x + x^4/12 + x^7/504 + ...
/// Ai = c1 f - c2 g,   Bi = sqrt(3) (c1 f + c2 g)
/// c1 = Ai(0),  c2 = -Ai'(0)
/// ```
fn maclaurin(x: f64) -> Airy {
    let x3 = x * x * x;

    let mut f = 1.0;
    let mut g = x;
    let mut gp = 1.0;

    let mut tf = 1.0;
    let mut tg = x;
    let mut tgp = 1.0;

    // f' starts at its k = 1 term x^2/2.
    let mut tfp = 0.5 * x * x;
    let mut fp = tfp;

    for k in 0..60usize {
        let kf = k as f64;
        tf *= x3 / ((3.0 * kf + 2.0) * (3.0 * kf + 3.0));
        tg *= x3 / ((3.0 * kf + 3.0) * (3.0 * kf + 4.0));
        tgp *= x3 / ((3.0 * kf + 1.0) * (3.0 * kf + 3.0));
        f += tf;
        g += tg;
        gp += tgp;
        if k >= 1 {
            tfp *= ((kf + 1.0) / kf) * x3 / ((3.0 * kf + 2.0) * (3.0 * kf + 3.0));
            fp += tfp;
        }
        if k >= 2
            && tf.abs() < f64::EPSILON * f.abs()
            && tg.abs() < f64::EPSILON * g.abs().max(1.0)
            && tgp.abs() < f64::EPSILON * gp.abs()
            && tfp.abs() < f64::EPSILON * fp.abs().max(1.0)
        {
            break;
        }
    }

    let sqrt3 = 3f64.sqrt();
    Airy {
        ai: AI_ZERO * f + AI_PRIME_ZERO * g,
        ai_prime: AI_ZERO * fp + AI_PRIME_ZERO * gp,
        bi: sqrt3 * (AI_ZERO * f - AI_PRIME_ZERO * g),
        bi_prime: sqrt3 * (AI_ZERO * fp - AI_PRIME_ZERO * gp),
    }
}

/// Propagate both solutions from the series seam to `x` with Taylor steps.
fn propagate(x: f64) -> Airy {
    let start = SERIES_RADIUS.copysign(x);
    let seed = maclaurin(start);

    let steps = ((x - start).abs() / ODE_STEP).ceil().max(1.0);
    let h = (x - start) / steps;

    let mut a = start;
    let mut ai = (seed.ai, seed.ai_prime);
    let mut bi = (seed.bi, seed.bi_prime);
    for _ in 0..steps as usize {
        ai = taylor_step(a, ai.0, ai.1, h);
        bi = taylor_step(a, bi.0, bi.1, h);
        a += h;
    }

    Airy {
        ai: ai.0,
        ai_prime: ai.1,
        bi: bi.0,
        bi_prime: bi.1,
    }
}

/// One Taylor step of `y'' = x y` from center `a` with step `h`.
///
/// With `y(a + t) = Σ c_n t^n`, matching coefficients of `y'' = (a + t) y`
/// gives `c_{n+2} = (a c_n + c_{n-1}) / ((n+1)(n+2))`, `c_{-1} = 0`.
fn taylor_step(a: f64, y: f64, yp: f64, h: f64) -> (f64, f64) {
    const MAX_TERMS: usize = 80;

    let mut coeffs = Vec::with_capacity(MAX_TERMS + 2);
    coeffs.push(y);
    coeffs.push(yp);

    let mut sum = y + yp * h;
    let mut dsum = yp;
    let mut hn = h; // h^{n+1} entering iteration n
    let mut scale = sum.abs().max(yp.abs());

    for n in 0..MAX_TERMS {
        let prev = if n == 0 { 0.0 } else { coeffs[n - 1] };
        let next = (a * coeffs[n] + prev) / (((n + 1) * (n + 2)) as f64);
        coeffs.push(next);

        hn *= h; // h^{n+2}
        let term = next * hn;
        sum += term;
        dsum += ((n + 2) as f64) * next * hn / h;

        scale = scale.max(term.abs());
        if n > 4 && term.abs() <= f64::EPSILON * scale {
            break;
        }
    }

    (sum, dsum)
}

/// Asymptotic coefficients `u_k` (DLMF 9.7.2) with `v_k = u_k (6k+1)/(1-6k)`.
fn next_u(u: f64, k: usize) -> f64 {
    let kf = k as f64; // producing u_k from u_{k-1}
    u * (6.0 * kf - 5.0) * (6.0 * kf - 3.0) * (6.0 * kf - 1.0) / (216.0 * kf * (2.0 * kf - 1.0))
}

/// DLMF 9.7.5–9.7.8 for large positive argument.
fn asymptotic_pos(x: f64) -> Airy {
    let zeta = 2.0 / 3.0 * x.powf(1.5);
    let root = x.powf(0.25);
    let sqrt_pi = std::f64::consts::PI.sqrt();

    let mut sum_alt_u = 1.0; // Σ (-1)^k u_k ζ^-k
    let mut sum_u = 1.0; // Σ u_k ζ^-k
    let mut sum_alt_v = 1.0;
    let mut sum_v = 1.0;

    let mut u = 1.0;
    let mut zk = 1.0;
    let mut last = f64::INFINITY;
    for k in 1..40usize {
        u = next_u(u, k);
        let v = u * (6.0 * k as f64 + 1.0) / (1.0 - 6.0 * k as f64);
        zk /= zeta;
        let tu = u * zk;
        if tu.abs() >= last {
            break; // divergent tail reached
        }
        last = tu.abs();
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        sum_alt_u += sign * tu;
        sum_u += tu;
        sum_alt_v += sign * v * zk;
        sum_v += v * zk;
        if tu.abs() < f64::EPSILON {
            break;
        }
    }

    let e = (-zeta).exp();
    let ep = zeta.exp();
    Airy {
        ai: e * sum_alt_u / (2.0 * sqrt_pi * root),
        ai_prime: -root * e * sum_alt_v / (2.0 * sqrt_pi),
        bi: ep * sum_u / (sqrt_pi * root),
        bi_prime: root * ep * sum_v / sqrt_pi,
    }
}

/// DLMF 9.7.9–9.7.12 for large negative argument (`x = -t`, `t > 0`).
fn asymptotic_neg(t: f64) -> Airy {
    let zeta = 2.0 / 3.0 * t.powf(1.5);
    let root = t.powf(0.25);
    let sqrt_pi = std::f64::consts::PI.sqrt();
    let chi = zeta - std::f64::consts::FRAC_PI_4;
    let (sin_chi, cos_chi) = chi.sin_cos();

    // Even/odd splits: P = Σ (-1)^k u_{2k} ζ^{-2k}, Q = Σ (-1)^k u_{2k+1} ζ^{-2k-1},
    // and R, S likewise with v.
    let mut p = 1.0;
    let mut q = 0.0;
    let mut r = 1.0;
    let mut s = 0.0;

    let mut u = 1.0;
    let mut zk = 1.0;
    let mut last = f64::INFINITY;
    for k in 1..40usize {
        u = next_u(u, k);
        let v = u * (6.0 * k as f64 + 1.0) / (1.0 - 6.0 * k as f64);
        zk /= zeta;
        let tu = u * zk;
        if tu.abs() >= last {
            break;
        }
        last = tu.abs();
        // (-1)^m with u_{2m} for even k = 2m and u_{2m+1} for odd k = 2m + 1.
        let sign = if (k / 2) % 2 == 0 { 1.0 } else { -1.0 };
        if k % 2 == 0 {
            p += sign * tu;
            r += sign * v * zk;
        } else {
            q += sign * tu;
            s += sign * v * zk;
        }
        if tu.abs() < f64::EPSILON {
            break;
        }
    }

    Airy {
        ai: (cos_chi * p + sin_chi * q) / (sqrt_pi * root),
        ai_prime: root * (sin_chi * r - cos_chi * s) / sqrt_pi,
        bi: (-sin_chi * p + cos_chi * q) / (sqrt_pi * root),
        bi_prime: root * (cos_chi * r + sin_chi * s) / sqrt_pi,
    }
}
