use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Exact fraction used for every metrical duration.
///
/// A `Rational` keeps the spelling it was built with: `Rational::new(9, 48)`
/// stores `9/48`, not `3/16`. Equality, ordering and hashing are defined by
/// cross-multiplication, so differently spelled but equal values compare,
/// hash and `==` equal.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Rational {
    pub numerator: i64,
    pub denominator: i64,
}

impl Rational {
    /// Create a rational without reducing it.
    ///
    /// # Panics
    ///
    /// Panics if `denominator` is zero.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        if denominator == 0 {
            panic!("Denominator cannot be zero");
        }
        Rational {
            numerator,
            denominator,
        }
    }

    /// Create a rational from a whole number
    pub fn from_int(n: i64) -> Self {
        Rational {
            numerator: n,
            denominator: 1,
        }
    }

    pub const fn zero() -> Self {
        Rational {
            numerator: 0,
            denominator: 1,
        }
    }

    /// Convert to float
    pub fn to_float(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// The same value in lowest terms with a positive denominator.
    pub fn reduced(&self) -> Self {
        let gcd = gcd(self.numerator.abs(), self.denominator.abs());
        let (mut numerator, mut denominator) = (self.numerator / gcd, self.denominator / gcd);
        if denominator < 0 {
            numerator = -numerator;
            denominator = -denominator;
        }
        Rational {
            numerator,
            denominator,
        }
    }

    /// The multiplicative inverse, or `None` for zero.
    pub fn inverse(&self) -> Option<Self> {
        if self.numerator == 0 {
            None
        } else {
            Some(Rational {
                numerator: self.denominator,
                denominator: self.numerator,
            })
        }
    }

    /// Division that returns `None` instead of panicking on a zero divisor.
    pub fn checked_div(self, other: Self) -> Option<Self> {
        other.inverse().map(|inverse| self * inverse)
    }

    /// Respell with the given numerator, scaling the denominator accordingly.
    ///
    /// Returns `None` when no integral denominator exists: `1/13` respells to
    /// `3/39`, while `2/7` cannot be written with numerator `3`.
    pub fn respelling_numerator(&self, numerator: i64) -> Option<Self> {
        if self.numerator == 0 {
            return if numerator == 0 { Some(*self) } else { None };
        }
        if numerator == 0 {
            return None;
        }
        let scaled = self.denominator.checked_mul(numerator)?;
        if scaled % self.numerator != 0 {
            return None;
        }
        Some(Rational {
            numerator,
            denominator: scaled / self.numerator,
        })
    }

    /// Respell with the given denominator, scaling the numerator accordingly.
    ///
    /// Returns `None` when no integral numerator exists (`3/7` has no
    /// spelling over `8`).
    pub fn respelling_denominator(&self, denominator: i64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let scaled = self.numerator.checked_mul(denominator)?;
        if scaled % self.denominator != 0 {
            return None;
        }
        Some(Rational {
            numerator: scaled / self.denominator,
            denominator,
        })
    }

    /// Check if rational is zero
    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// Check if rational is negative
    pub fn is_negative(&self) -> bool {
        (self.numerator < 0) != (self.denominator < 0) && self.numerator != 0
    }

    /// Absolute value
    pub fn abs(self) -> Self {
        Rational::new(self.numerator.abs(), self.denominator.abs())
    }

    fn common_denominator(self, other: Self) -> (i64, i64, i64) {
        let lcm = lcm(self.denominator, other.denominator);
        let num1 = self.numerator * (lcm / self.denominator);
        let num2 = other.numerator * (lcm / other.denominator);
        (num1, num2, lcm)
    }
}

/// Greatest common divisor (non-negative)
pub fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a.abs()
}

/// Least common multiple (non-negative)
pub fn lcm(a: i64, b: i64) -> i64 {
    if a == 0 || b == 0 {
        return 0;
    }
    (a / gcd(a, b) * b).abs()
}

impl Default for Rational {
    fn default() -> Self {
        Rational::zero()
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Rational::from_int(n)
    }
}

impl From<(i64, i64)> for Rational {
    fn from((num, den): (i64, i64)) -> Self {
        Rational::new(num, den)
    }
}

impl PartialEq for Rational {
    fn eq(&self, other: &Self) -> bool {
        self.numerator as i128 * other.denominator as i128
            == other.numerator as i128 * self.denominator as i128
    }
}

impl Eq for Rational {}

impl Hash for Rational {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let reduced = self.reduced();
        reduced.numerator.hash(state);
        reduced.denominator.hash(state);
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as i128 * other.denominator as i128;
        let rhs = other.numerator as i128 * self.denominator as i128;
        // Cross products flip when exactly one denominator is negative.
        if (self.denominator < 0) != (other.denominator < 0) {
            rhs.cmp(&lhs)
        } else {
            lhs.cmp(&rhs)
        }
    }
}

impl Add for Rational {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let (num1, num2, lcm) = self.common_denominator(other);
        Rational::new(num1 + num2, lcm)
    }
}

impl Sub for Rational {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        let (num1, num2, lcm) = self.common_denominator(other);
        Rational::new(num1 - num2, lcm)
    }
}

impl Mul for Rational {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Rational::new(
            self.numerator * other.numerator,
            self.denominator * other.denominator,
        )
    }
}

impl Div for Rational {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        match self.checked_div(other) {
            Some(quotient) => quotient,
            None => panic!("Cannot divide {} by zero", self),
        }
    }
}

impl Neg for Rational {
    type Output = Self;

    fn neg(self) -> Self {
        Rational::new(-self.numerator, self.denominator)
    }
}

impl AddAssign for Rational {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl SubAssign for Rational {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl MulAssign for Rational {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl DivAssign for Rational {
    fn div_assign(&mut self, other: Self) {
        *self = *self / other;
    }
}
