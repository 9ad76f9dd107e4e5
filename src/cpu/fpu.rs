//! Floating-point status, classify and conversion support for vector lanes.
//!
//! Lane values travel as raw bit patterns. Arithmetic runs on the host in
//! f64, where f16 and f32 operands are exact, and is then rounded into the
//! lane format under the requested rounding mode. Exception flags are derived
//! from the rounding error of each operation.
//!
//! Any NaN produced by an operation is the canonical quiet NaN of the lane
//! format. Narrow values held in a 64-bit FP register are NaN-boxed: upper
//! bits all ones, otherwise the value reads as the canonical NaN.

use half::f16;

use super::vector::elem::Element;

// Exception flags
pub const NX: u64 = 1; // Inexact
pub const UF: u64 = 2; // Underflow
pub const OF: u64 = 4; // Overflow
pub const DZ: u64 = 8; // Divide by zero
pub const NV: u64 = 16; // Invalid operation

/// IEEE-754 rounding modes, numbered as in the frm field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    Rne = 0,
    Rtz = 1,
    Rdn = 2,
    Rup = 3,
    Rmm = 4,
}

impl RoundingMode {
    /// Decode frm; 5, 6 and 7 are reserved.
    pub fn from_frm(frm: u64) -> Option<Self> {
        match frm & 7 {
            0 => Some(RoundingMode::Rne),
            1 => Some(RoundingMode::Rtz),
            2 => Some(RoundingMode::Rdn),
            3 => Some(RoundingMode::Rup),
            4 => Some(RoundingMode::Rmm),
            _ => None,
        }
    }
}

/// Rounding mode and accrued flags for one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpStatus {
    pub rm: RoundingMode,
    pub flags: u64,
}

impl FpStatus {
    pub fn new(rm: RoundingMode) -> Self {
        Self { rm, flags: 0 }
    }

    #[inline]
    pub fn raise(&mut self, flags: u64) {
        self.flags |= flags;
    }
}

/// An IEEE binary format usable as a vector lane.
pub trait Float: Copy {
    /// Integer lane type holding the bit pattern
    type Bits: Element;
    const BITS: u32;
    const FRAC_BITS: u32;
    const CANONICAL_NAN: u64;
    /// Smallest positive normal value
    const MIN_NORMAL: f64;

    fn from_bits(bits: u64) -> Self;
    fn to_bits(self) -> u64;
    /// Exact widening to f64
    fn to_f64(self) -> f64;
    /// Round-to-nearest-even narrowing from f64
    fn from_f64(v: f64) -> Self;

    fn value(bits: u64) -> f64 {
        Self::from_bits(bits).to_f64()
    }

    fn sign_mask() -> u64 {
        1u64 << (Self::BITS - 1)
    }

    fn width_mask() -> u64 {
        u64::MAX >> (64 - Self::BITS)
    }

    fn exp_mask() -> u64 {
        Self::width_mask() & !Self::sign_mask() & !Self::frac_mask()
    }

    fn frac_mask() -> u64 {
        (1u64 << Self::FRAC_BITS) - 1
    }

    fn quiet_bit() -> u64 {
        1u64 << (Self::FRAC_BITS - 1)
    }

    /// Exponent of the smallest subnormal, 2^MIN_SUB_EXP
    fn min_sub_exp() -> i32 {
        let exp_bits = Self::BITS - 1 - Self::FRAC_BITS;
        2 - (1i32 << (exp_bits - 1)) - Self::FRAC_BITS as i32
    }
}

impl Float for f16 {
    type Bits = u16;
    const BITS: u32 = 16;
    const FRAC_BITS: u32 = 10;
    const CANONICAL_NAN: u64 = 0x7E00;
    const MIN_NORMAL: f64 = 6.103515625e-5;

    fn from_bits(bits: u64) -> Self {
        f16::from_bits(bits as u16)
    }
    fn to_bits(self) -> u64 {
        f16::to_bits(self) as u64
    }
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }
    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }
}

impl Float for f32 {
    type Bits = u32;
    const BITS: u32 = 32;
    const FRAC_BITS: u32 = 23;
    const CANONICAL_NAN: u64 = 0x7FC0_0000;
    const MIN_NORMAL: f64 = f32::MIN_POSITIVE as f64;

    fn from_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
    fn to_bits(self) -> u64 {
        f32::to_bits(self) as u64
    }
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Float for f64 {
    type Bits = u64;
    const BITS: u32 = 64;
    const FRAC_BITS: u32 = 52;
    const CANONICAL_NAN: u64 = 0x7FF8_0000_0000_0000;
    const MIN_NORMAL: f64 = f64::MIN_POSITIVE;

    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }
    fn to_f64(self) -> f64 {
        self
    }
    fn from_f64(v: f64) -> Self {
        v
    }
}

// ============================================================================
// Bit-level predicates
// ============================================================================

pub fn is_nan<F: Float>(bits: u64) -> bool {
    bits & F::exp_mask() == F::exp_mask() && bits & F::frac_mask() != 0
}

pub fn is_snan<F: Float>(bits: u64) -> bool {
    is_nan::<F>(bits) && bits & F::quiet_bit() == 0
}

fn is_inf<F: Float>(bits: u64) -> bool {
    bits & (F::exp_mask() | F::frac_mask()) == F::exp_mask()
}

fn is_negative<F: Float>(bits: u64) -> bool {
    bits & F::sign_mask() != 0
}

fn inf<F: Float>(neg: bool) -> u64 {
    F::exp_mask() | if neg { F::sign_mask() } else { 0 }
}

fn max_finite<F: Float>(neg: bool) -> u64 {
    (F::exp_mask() - (1u64 << F::FRAC_BITS)) | F::frac_mask() | if neg { F::sign_mask() } else { 0 }
}

/// Next representable value toward +inf.
fn next_up<F: Float>(bits: u64) -> u64 {
    if is_nan::<F>(bits) || bits == inf::<F>(false) {
        return bits;
    }
    if bits & !F::sign_mask() == 0 {
        return 1;
    }
    if is_negative::<F>(bits) { bits - 1 } else { bits + 1 }
}

/// Next representable value toward -inf.
fn next_down<F: Float>(bits: u64) -> u64 {
    next_up::<F>(bits ^ F::sign_mask()) ^ F::sign_mask()
}

/// 10-bit one-hot class mask
pub fn classify<F: Float>(bits: u64) -> u64 {
    let neg = is_negative::<F>(bits);
    let exp = bits & F::exp_mask();
    let frac = bits & F::frac_mask();
    if exp == F::exp_mask() {
        if frac == 0 {
            if neg { 1 << 0 } else { 1 << 7 }
        } else if frac & F::quiet_bit() != 0 {
            1 << 9
        } else {
            1 << 8
        }
    } else if exp == 0 {
        match (frac == 0, neg) {
            (true, true) => 1 << 3,
            (true, false) => 1 << 4,
            (false, true) => 1 << 2,
            (false, false) => 1 << 5,
        }
    } else if neg {
        1 << 1
    } else {
        1 << 6
    }
}

/// NaN-box a narrow value into a 64-bit FP register image.
pub fn nanbox<F: Float>(bits: u64) -> u64 {
    (bits & F::width_mask()) | !F::width_mask()
}

/// Read a narrow value out of a 64-bit FP register image.
pub fn check_nanbox<F: Float>(reg: u64) -> u64 {
    let upper = !F::width_mask();
    if reg & upper == upper {
        reg & F::width_mask()
    } else {
        F::CANONICAL_NAN
    }
}

// ============================================================================
// Rounding
// ============================================================================

fn overflow<F: Float>(st: &mut FpStatus, neg: bool) -> u64 {
    st.raise(OF | NX);
    let to_max = match st.rm {
        RoundingMode::Rtz => true,
        RoundingMode::Rdn => !neg,
        RoundingMode::Rup => neg,
        _ => false,
    };
    if to_max { max_finite::<F>(neg) } else { inf::<F>(neg) }
}

/// v * 2^n without intermediate overflow for |n| up to a few thousand.
fn scale(v: f64, n: i32) -> f64 {
    let mut v = v;
    let mut n = n;
    while n > 1000 {
        v *= 2f64.powi(1000);
        n -= 1000;
    }
    while n < -1000 {
        v *= 2f64.powi(-1000);
        n += 1000;
    }
    v * 2f64.powi(n)
}

/// Binary exponent of a finite nonzero f64, so that v * 2^-exp is in [1, 2).
fn exponent(v: f64) -> i32 {
    let biased = ((v.to_bits() >> 52) & 0x7FF) as i32;
    if biased == 0 {
        exponent(v * 2f64.powi(64)) - 64
    } else {
        biased - 1023
    }
}

/// Host results below this magnitude are recomputed on scaled operands
/// when the lane format is f64, since their f64 residual can underflow.
fn needs_scaling<F: Float>(s: f64) -> bool {
    F::BITS == 64 && s.abs() < F::MIN_NORMAL * 2f64.powi(54)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Below,
    Tie,
    Above,
}

/// Round the magnitude `units + r` to an integer, where `units` is
/// non-negative and below 2^53 and `r` only contributes its sign.
/// Returns the rounded count and whether it was exact.
fn round_units(rm: RoundingMode, neg: bool, units: f64, r: f64) -> (f64, bool) {
    let mut n = units.floor();
    let frac = units - n;
    if frac == 0.0 && r == 0.0 {
        return (n, true);
    }
    let half = if frac == 0.0 {
        if r < 0.0 {
            // just below n
            n -= 1.0;
            Half::Above
        } else {
            Half::Below
        }
    } else if frac < 0.5 {
        Half::Below
    } else if frac > 0.5 {
        Half::Above
    } else if r > 0.0 {
        Half::Above
    } else if r < 0.0 {
        Half::Below
    } else {
        Half::Tie
    };
    let up = match rm {
        RoundingMode::Rne => half == Half::Above || (half == Half::Tie && n % 2.0 == 1.0),
        RoundingMode::Rmm => half != Half::Below,
        RoundingMode::Rtz => false,
        RoundingMode::Rdn => neg,
        RoundingMode::Rup => !neg,
    };
    (if up { n + 1.0 } else { n }, false)
}

/// Round a value below MIN_NORMAL, given as `units` multiples of the
/// smallest subnormal plus a residual sign `r`, into format F.
///
/// Tininess is detected after rounding: the value is tiny when rounding it
/// to full precision with an unbounded exponent stays below MIN_NORMAL,
/// which is rounding at half the subnormal quantum.
fn round_subnormal<F: Float>(st: &mut FpStatus, neg: bool, units: f64, r: f64) -> u64 {
    let sign = if neg { F::sign_mask() } else { 0 };
    let (q, exact) = round_units(st.rm, neg, units, r);
    if exact {
        return q as u64 | sign;
    }
    st.raise(NX);
    let min_normal = (1u64 << F::FRAC_BITS) as f64;
    let tiny = q < min_normal || round_units(st.rm, neg, 2.0 * units, r).0 < 2.0 * min_normal;
    if tiny {
        st.raise(UF);
    }
    q as u64 | sign
}

/// Round the exact value `(s + e) * 2^-k` into format F, where `s` is the
/// nonzero f64 result of an exactly scaled computation and `e` its residual.
fn round_scaled<F: Float>(st: &mut FpStatus, s: f64, e: f64, k: i32) -> u64 {
    let shift = -k - F::min_sub_exp();
    let units = if shift < -1000 {
        // far below half the smallest subnormal
        f64::MIN_POSITIVE
    } else {
        scale(s.abs(), shift)
    };
    if units >= (1u64 << F::FRAC_BITS) as f64 {
        let es = scale(e, -k);
        let es = if e != 0.0 && es == 0.0 { f64::from_bits(1).copysign(e) } else { es };
        return round_result::<F>(st, scale(s, -k), es);
    }
    let r = if s < 0.0 { -e } else { e };
    round_subnormal::<F>(st, s < 0.0, units, r)
}

/// Round an f64 result `s` whose exact value is `s + e` into format F.
///
/// `e` is the error left by the f64 computation; it only needs the right
/// sign and must be zero when `s` is exact.
fn round_result<F: Float>(st: &mut FpStatus, s: f64, e: f64) -> u64 {
    if s.is_infinite() {
        return overflow::<F>(st, s < 0.0);
    }
    if s != 0.0 && s.abs() < F::MIN_NORMAL {
        let units = scale(s.abs(), -F::min_sub_exp());
        let r = if s < 0.0 { -e } else { e };
        return round_subnormal::<F>(st, s < 0.0, units, r);
    }
    let r = F::from_f64(s).to_bits();
    let rf = F::value(r);
    if rf.is_infinite() {
        return overflow::<F>(st, rf < 0.0);
    }
    let d = s - rf;
    if d == 0.0 && e == 0.0 {
        return r;
    }
    st.raise(NX);

    // exact value lies above rf
    let above = if d != 0.0 { d > 0.0 } else { e > 0.0 };
    let gap = if above {
        F::value(next_up::<F>(r)) - rf
    } else {
        rf - F::value(next_down::<F>(r))
    };
    // s sits exactly between two F values
    let tie = 2.0 * d.abs() == gap;
    let away = if above { rf >= 0.0 } else { rf <= 0.0 };
    let step = match st.rm {
        // the f64 rounding may have landed on a midpoint the exact value is past
        RoundingMode::Rne => tie && e != 0.0 && (e > 0.0) == above,
        RoundingMode::Rmm => tie && if e == 0.0 { away } else { (e > 0.0) == above },
        RoundingMode::Rtz => !away,
        RoundingMode::Rdn => !above,
        RoundingMode::Rup => above,
    };
    let out = match (step, above) {
        (false, _) => r,
        (true, true) => next_up::<F>(r),
        (true, false) => next_down::<F>(r),
    };
    if is_inf::<F>(out) {
        st.raise(OF);
    } else if out & F::exp_mask() == 0 {
        // s was MIN_NORMAL and the exact value just below it rounded down
        st.raise(UF);
    }
    out
}

fn two_sum_err(a: f64, b: f64, s: f64) -> f64 {
    let bb = s - a;
    let err = (a - (s - bb)) + (b - bb);
    if err.is_finite() { err } else { 0.0 }
}

/// Canonical NaN if any operand is NaN, raising NV for signaling NaNs.
fn nan_operands<F: Float>(st: &mut FpStatus, ops: &[u64]) -> Option<u64> {
    if ops.iter().any(|&b| is_snan::<F>(b)) {
        st.raise(NV);
    }
    if ops.iter().any(|&b| is_nan::<F>(b)) {
        Some(F::CANONICAL_NAN)
    } else {
        None
    }
}

/// Result of an exactly cancelling sum: -0 under round-down, +0 otherwise.
fn exact_zero_sum<F: Float>(st: &FpStatus, x: f64, y: f64, s: f64) -> u64 {
    if x.is_sign_negative() != y.is_sign_negative() && st.rm == RoundingMode::Rdn {
        F::sign_mask()
    } else {
        F::from_f64(s).to_bits()
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

pub fn add<F: Float>(st: &mut FpStatus, a: u64, b: u64) -> u64 {
    if let Some(nan) = nan_operands::<F>(st, &[a, b]) {
        return nan;
    }
    let (x, y) = (F::value(a), F::value(b));
    let s = x + y;
    if x.is_infinite() || y.is_infinite() {
        if s.is_nan() {
            st.raise(NV);
            return F::CANONICAL_NAN;
        }
        return F::from_f64(s).to_bits();
    }
    if s == 0.0 {
        return exact_zero_sum::<F>(st, x, y, s);
    }
    round_result::<F>(st, s, two_sum_err(x, y, s))
}

pub fn sub<F: Float>(st: &mut FpStatus, a: u64, b: u64) -> u64 {
    // negate b unless it is a NaN, whose payload must survive for sNaN detection
    let nb = if is_nan::<F>(b) { b } else { b ^ F::sign_mask() };
    add::<F>(st, a, nb)
}

pub fn mul<F: Float>(st: &mut FpStatus, a: u64, b: u64) -> u64 {
    if let Some(nan) = nan_operands::<F>(st, &[a, b]) {
        return nan;
    }
    let (x, y) = (F::value(a), F::value(b));
    let s = x * y;
    if s.is_nan() {
        // 0 * inf
        st.raise(NV);
        return F::CANONICAL_NAN;
    }
    if x.is_infinite() || y.is_infinite() || s == 0.0 && (x == 0.0 || y == 0.0) {
        return F::from_f64(s).to_bits();
    }
    if needs_scaling::<F>(s) {
        let (ex, ey) = (exponent(x), exponent(y));
        let (xn, yn) = (scale(x, -ex), scale(y, -ey));
        let sn = xn * yn;
        return round_scaled::<F>(st, sn, xn.mul_add(yn, -sn), -(ex + ey));
    }
    let e = if s.is_finite() { x.mul_add(y, -s) } else { 0.0 };
    round_result::<F>(st, s, e)
}

pub fn div<F: Float>(st: &mut FpStatus, a: u64, b: u64) -> u64 {
    if let Some(nan) = nan_operands::<F>(st, &[a, b]) {
        return nan;
    }
    let (x, y) = (F::value(a), F::value(b));
    let s = x / y;
    if s.is_nan() {
        // 0/0 or inf/inf
        st.raise(NV);
        return F::CANONICAL_NAN;
    }
    if y == 0.0 {
        if !x.is_infinite() {
            st.raise(DZ);
        }
        return F::from_f64(s).to_bits();
    }
    if x.is_infinite() || y.is_infinite() || x == 0.0 {
        return F::from_f64(s).to_bits();
    }
    if needs_scaling::<F>(s) {
        let (ex, ey) = (exponent(x), exponent(y));
        let (xn, yn) = (scale(x, -ex), scale(y, -ey));
        let sn = xn / yn;
        let en = (-sn).mul_add(yn, xn) / yn;
        return round_scaled::<F>(st, sn, en, ey - ex);
    }
    let e = if s.is_finite() { (-s).mul_add(y, x) / y } else { 0.0 };
    round_result::<F>(st, s, e)
}

pub fn sqrt<F: Float>(st: &mut FpStatus, a: u64) -> u64 {
    if let Some(nan) = nan_operands::<F>(st, &[a]) {
        return nan;
    }
    let x = F::value(a);
    if x == 0.0 || x == f64::INFINITY {
        return a;
    }
    if x < 0.0 {
        st.raise(NV);
        return F::CANONICAL_NAN;
    }
    // keep the residual of a subnormal radicand representable
    let (s, e) = if x < 2f64.powi(-900) {
        let xs = scale(x, 1000);
        let ss = xs.sqrt();
        (scale(ss, -500), (-ss).mul_add(ss, xs) / (2.0 * ss))
    } else {
        let s = x.sqrt();
        (s, (-s).mul_add(s, x) / (2.0 * s))
    };
    round_result::<F>(st, s, e)
}

/// a * b + c with a single rounding
pub fn fma<F: Float>(st: &mut FpStatus, a: u64, b: u64, c: u64) -> u64 {
    let (x, y) = (F::value(a), F::value(b));
    if (x.is_infinite() && y == 0.0) || (x == 0.0 && y.is_infinite()) {
        st.raise(NV);
        if is_snan::<F>(c) {
            st.raise(NV);
        }
        return F::CANONICAL_NAN;
    }
    if let Some(nan) = nan_operands::<F>(st, &[a, b, c]) {
        return nan;
    }
    let z = F::value(c);
    let s = x.mul_add(y, z);
    if s.is_nan() {
        // inf - inf
        st.raise(NV);
        return F::CANONICAL_NAN;
    }
    if x.is_infinite() || y.is_infinite() || z.is_infinite() {
        return F::from_f64(s).to_bits();
    }
    if x != 0.0 && y != 0.0 && needs_scaling::<F>(s) {
        let (ex, ey) = (exponent(x), exponent(y));
        let k = -(ex + ey);
        let (xn, yn, zn) = (scale(x, -ex), scale(y, -ey), scale(z, k));
        let sn = xn.mul_add(yn, zn);
        let pn = xn * yn;
        let s1 = pn + zn;
        let en = ((s1 - sn) + two_sum_err(pn, zn, s1)) + xn.mul_add(yn, -pn);
        if sn == 0.0 && en == 0.0 {
            return exact_zero_sum::<F>(st, pn, zn, sn);
        }
        return round_scaled::<F>(st, sn, en, k);
    }
    let p = x * y;
    if s == 0.0 {
        if x == 0.0 || y == 0.0 {
            // exact zero product: sign follows the IEEE sum rule
            let zp = if p.is_sign_negative() { -0.0 } else { 0.0 };
            if z == 0.0 {
                return exact_zero_sum::<F>(st, zp, z, zp + z);
            }
        } else if p.is_finite() && x.mul_add(y, -p) == 0.0 && p + z == 0.0 {
            return exact_zero_sum::<F>(st, p, z, s);
        }
    }
    let e = if p.is_finite() {
        let pe = x.mul_add(y, -p);
        let s1 = p + z;
        let e1 = two_sum_err(p, z, s1);
        let err = ((s1 - s) + e1) + pe;
        if err.is_finite() { err } else { 0.0 }
    } else {
        0.0
    };
    round_result::<F>(st, s, e)
}

/// minimumNumber: a NaN operand yields the other operand, -0 < +0
pub fn min<F: Float>(st: &mut FpStatus, a: u64, b: u64) -> u64 {
    min_max::<F>(st, a, b, true)
}

/// maximumNumber: a NaN operand yields the other operand, -0 < +0
pub fn max<F: Float>(st: &mut FpStatus, a: u64, b: u64) -> u64 {
    min_max::<F>(st, a, b, false)
}

fn min_max<F: Float>(st: &mut FpStatus, a: u64, b: u64, want_min: bool) -> u64 {
    if is_snan::<F>(a) || is_snan::<F>(b) {
        st.raise(NV);
    }
    match (is_nan::<F>(a), is_nan::<F>(b)) {
        (true, true) => return F::CANONICAL_NAN,
        (true, false) => return b,
        (false, true) => return a,
        _ => {}
    }
    let (x, y) = (F::value(a), F::value(b));
    if x == y {
        // only differs for +0 / -0
        let a_wins = is_negative::<F>(a) == want_min;
        return if a_wins { a } else { b };
    }
    if (x < y) == want_min { a } else { b }
}

pub fn sgnj<F: Float>(a: u64, b: u64) -> u64 {
    (a & !F::sign_mask() | b & F::sign_mask()) & F::width_mask()
}

pub fn sgnjn<F: Float>(a: u64, b: u64) -> u64 {
    (a & !F::sign_mask() | !b & F::sign_mask()) & F::width_mask()
}

pub fn sgnjx<F: Float>(a: u64, b: u64) -> u64 {
    (a ^ (b & F::sign_mask())) & F::width_mask()
}

// ============================================================================
// Comparisons
// ============================================================================

/// Quiet equality: NV only for signaling NaNs.
pub fn eq<F: Float>(st: &mut FpStatus, a: u64, b: u64) -> bool {
    if nan_operands::<F>(st, &[a, b]).is_some() {
        return false;
    }
    F::value(a) == F::value(b)
}

/// Signaling less-than: NV for any NaN.
pub fn lt<F: Float>(st: &mut FpStatus, a: u64, b: u64) -> bool {
    if is_nan::<F>(a) || is_nan::<F>(b) {
        st.raise(NV);
        return false;
    }
    F::value(a) < F::value(b)
}

/// Signaling less-or-equal: NV for any NaN.
pub fn le<F: Float>(st: &mut FpStatus, a: u64, b: u64) -> bool {
    if is_nan::<F>(a) || is_nan::<F>(b) {
        st.raise(NV);
        return false;
    }
    F::value(a) <= F::value(b)
}

/// Quiet ordered test: neither operand is NaN.
pub fn ordered<F: Float>(st: &mut FpStatus, a: u64, b: u64) -> bool {
    nan_operands::<F>(st, &[a, b]).is_none()
}

// ============================================================================
// Conversions
// ============================================================================

/// Float to integer of `width` bits, honoring the rounding mode.
/// Out-of-range inputs saturate and raise NV; NaN converts to the maximum.
pub fn to_int<F: Float>(st: &mut FpStatus, a: u64, width: u32, signed: bool) -> u64 {
    let mask = u64::MAX >> (64 - width);
    let (min, max) = if signed {
        (1u64 << (width - 1), mask >> 1)
    } else {
        (0, mask)
    };
    if is_nan::<F>(a) {
        st.raise(NV);
        return max;
    }
    let x = F::value(a);
    let r = match st.rm {
        RoundingMode::Rne => x.round_ties_even(),
        RoundingMode::Rtz => x.trunc(),
        RoundingMode::Rdn => x.floor(),
        RoundingMode::Rup => x.ceil(),
        RoundingMode::Rmm => x.round(),
    };
    // exclusive upper bound and inclusive lower bound, both powers of two
    let (lo, hi) = if signed {
        (-(2f64.powi(width as i32 - 1)), 2f64.powi(width as i32 - 1))
    } else {
        (0.0, 2f64.powi(width as i32))
    };
    if r >= hi {
        st.raise(NV);
        return max;
    }
    if r < lo {
        st.raise(NV);
        return min;
    }
    if r != x {
        st.raise(NX);
    }
    if signed {
        (r as i64 as u64) & mask
    } else {
        (r as u64) & mask
    }
}

/// Integer (already sign- or zero-extended) to float.
pub fn from_int<F: Float>(st: &mut FpStatus, v: i128) -> u64 {
    let s = v as f64;
    let e = (v - s as i128) as f64;
    round_result::<F>(st, s, e)
}

/// Convert between float formats.
pub fn convert<F: Float, G: Float>(st: &mut FpStatus, a: u64) -> u64 {
    if nan_operands::<F>(st, &[a]).is_some() {
        return G::CANONICAL_NAN;
    }
    if is_inf::<F>(a) {
        return inf::<G>(is_negative::<F>(a));
    }
    round_result::<G>(st, F::value(a), 0.0)
}
