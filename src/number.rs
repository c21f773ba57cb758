//! Numeric tower shared by literals, runtimes and the numeric built-ins.
//!
//! Numbers keep the representation they were created with. Binary operations
//! (addition, comparison, averaging) first promote both operands to the
//! smallest representation that can hold either of them without losing
//! precision:
//!
//! ```text
//! integral  + integral  -> wider integral        (byte < short < integer < long < big-integer)
//! floating  + floating  -> wider floating        (float < double)
//! byte/short + float    -> float
//! integer   + float     -> double
//! long      + floating  -> big-decimal
//! anything  + big-decimal -> big-decimal
//! ```
//!
//! Integral overflow widens to the next representation instead of wrapping.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// The representation tag of a [`Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumberType {
    Byte,
    Short,
    Integer,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
}

impl NumberType {
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            NumberType::Byte
                | NumberType::Short
                | NumberType::Integer
                | NumberType::Long
                | NumberType::BigInteger
        )
    }

    /// Smallest representation able to hold values of both `self` and `other`.
    pub fn promote(self, other: NumberType) -> NumberType {
        use NumberType::*;

        if self == BigDecimal || other == BigDecimal {
            return BigDecimal;
        }
        if self.is_integral() == other.is_integral() {
            return self.max(other);
        }
        let (integral, floating) = if self.is_integral() {
            (self, other)
        } else {
            (other, self)
        };
        match integral {
            Byte | Short => floating,
            Integer => Double,
            _ => BigDecimal,
        }
    }

    /// Next representation used when an operation overflows.
    fn widen(self) -> NumberType {
        use NumberType::*;

        match self {
            Byte => Short,
            Short => Integer,
            Integer => Long,
            Long => BigInteger,
            Float => Double,
            BigInteger | Double | BigDecimal => BigDecimal,
        }
    }
}

impl fmt::Display for NumberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumberType::Byte => "byte",
            NumberType::Short => "short",
            NumberType::Integer => "integer",
            NumberType::Long => "long",
            NumberType::BigInteger => "big-integer",
            NumberType::Float => "float",
            NumberType::Double => "double",
            NumberType::BigDecimal => "big-decimal",
        };
        f.write_str(name)
    }
}

/// A JSON number with an explicit representation.
///
/// Equality and ordering are numeric: `Long(1) == Double(1.0)`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    BigInteger(i128),
    Float(f32),
    Double(f64),
    BigDecimal(Decimal),
}

impl Number {
    pub fn number_type(&self) -> NumberType {
        match self {
            Number::Byte(_) => NumberType::Byte,
            Number::Short(_) => NumberType::Short,
            Number::Integer(_) => NumberType::Integer,
            Number::Long(_) => NumberType::Long,
            Number::BigInteger(_) => NumberType::BigInteger,
            Number::Float(_) => NumberType::Float,
            Number::Double(_) => NumberType::Double,
            Number::BigDecimal(_) => NumberType::BigDecimal,
        }
    }

    pub fn is_integral(&self) -> bool {
        self.number_type().is_integral()
    }

    /// Parses JSON number text. Integers become `Long` (or a wider integral
    /// when they do not fit), anything with a fraction or exponent becomes `Double`.
    pub fn parse(text: &str) -> Option<Number> {
        if text.contains(|c| matches!(c, '.' | 'e' | 'E')) {
            return text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Number::Double);
        }
        if let Ok(v) = text.parse::<i64>() {
            return Some(Number::Long(v));
        }
        if let Ok(v) = text.parse::<i128>() {
            return Some(Number::BigInteger(v));
        }
        Decimal::from_str(text).ok().map(Number::BigDecimal)
    }

    /// The integral value, if this number has an integral representation.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Number::Byte(v) => Some(i128::from(v)),
            Number::Short(v) => Some(i128::from(v)),
            Number::Integer(v) => Some(i128::from(v)),
            Number::Long(v) => Some(i128::from(v)),
            Number::BigInteger(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    /// False for infinite and NaN floats, which have no JSON form.
    pub fn is_finite(&self) -> bool {
        match *self {
            Number::Float(v) => v.is_finite(),
            Number::Double(v) => v.is_finite(),
            _ => true,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match *self {
            Number::Byte(v) => f64::from(v),
            Number::Short(v) => f64::from(v),
            Number::Integer(v) => f64::from(v),
            Number::Long(v) => v as f64,
            Number::BigInteger(v) => v as f64,
            Number::Float(v) => f64::from(v),
            Number::Double(v) => v,
            Number::BigDecimal(v) => v.to_f64().unwrap_or(f64::NAN),
        }
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        match *self {
            Number::Float(v) => Decimal::from_f32(v),
            Number::Double(v) => Decimal::from_f64(v),
            Number::BigDecimal(v) => Some(v),
            _ => self.as_i128().and_then(Decimal::from_i128),
        }
    }

    /// Converts into `target`, which must be at least as wide as the current
    /// representation. Returns `None` when the value does not fit.
    fn convert(&self, target: NumberType) -> Option<Number> {
        if self.number_type() == target {
            return Some(*self);
        }
        match target {
            NumberType::Byte => self.as_i128().and_then(|v| i8::try_from(v).ok()).map(Number::Byte),
            NumberType::Short => self.as_i128().and_then(|v| i16::try_from(v).ok()).map(Number::Short),
            NumberType::Integer => self
                .as_i128()
                .and_then(|v| i32::try_from(v).ok())
                .map(Number::Integer),
            NumberType::Long => self.as_i128().and_then(|v| i64::try_from(v).ok()).map(Number::Long),
            NumberType::BigInteger => self.as_i128().map(Number::BigInteger),
            NumberType::Float => match *self {
                Number::Byte(v) => Some(Number::Float(f32::from(v))),
                Number::Short(v) => Some(Number::Float(f32::from(v))),
                _ => None,
            },
            NumberType::Double => match *self {
                Number::Float(v) => Some(Number::Double(f64::from(v))),
                Number::Byte(_) | Number::Short(_) | Number::Integer(_) => {
                    Some(Number::Double(self.to_f64()))
                }
                _ => None,
            },
            NumberType::BigDecimal => self.to_decimal().map(Number::BigDecimal),
        }
    }

    fn checked_add_same(&self, other: &Number) -> Option<Number> {
        match (*self, *other) {
            (Number::Byte(a), Number::Byte(b)) => a.checked_add(b).map(Number::Byte),
            (Number::Short(a), Number::Short(b)) => a.checked_add(b).map(Number::Short),
            (Number::Integer(a), Number::Integer(b)) => a.checked_add(b).map(Number::Integer),
            (Number::Long(a), Number::Long(b)) => a.checked_add(b).map(Number::Long),
            (Number::BigInteger(a), Number::BigInteger(b)) => {
                a.checked_add(b).map(Number::BigInteger)
            }
            (Number::Float(a), Number::Float(b)) => {
                Some(a + b).filter(|v| v.is_finite()).map(Number::Float)
            }
            (Number::Double(a), Number::Double(b)) => {
                Some(a + b).filter(|v| v.is_finite()).map(Number::Double)
            }
            (Number::BigDecimal(a), Number::BigDecimal(b)) => {
                a.checked_add(b).map(Number::BigDecimal)
            }
            _ => None,
        }
    }

    fn cmp_same(&self, other: &Number) -> Option<Ordering> {
        match (*self, *other) {
            (Number::Byte(a), Number::Byte(b)) => Some(a.cmp(&b)),
            (Number::Short(a), Number::Short(b)) => Some(a.cmp(&b)),
            (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(&b)),
            (Number::Long(a), Number::Long(b)) => Some(a.cmp(&b)),
            (Number::BigInteger(a), Number::BigInteger(b)) => Some(a.cmp(&b)),
            (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
            (Number::Double(a), Number::Double(b)) => a.partial_cmp(&b),
            (Number::BigDecimal(a), Number::BigDecimal(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }

    /// Adds two numbers after promotion, widening on overflow. `None` when
    /// the sum has no finite representation.
    pub fn checked_add(&self, other: &Number) -> Option<Number> {
        let mut target = self.number_type().promote(other.number_type());
        loop {
            let sum = match (self.convert(target), other.convert(target)) {
                (Some(a), Some(b)) => a.checked_add_same(&b),
                _ => None,
            };
            if sum.is_some() {
                return sum;
            }
            if target == NumberType::BigDecimal {
                return Some(self.to_f64() + other.to_f64())
                    .filter(|v| v.is_finite())
                    .map(Number::Double);
            }
            target = target.widen();
        }
    }

    pub fn abs(&self) -> Number {
        match *self {
            Number::Byte(v) => v
                .checked_abs()
                .map(Number::Byte)
                .unwrap_or_else(|| Number::Short(i16::from(v).abs())),
            Number::Short(v) => v
                .checked_abs()
                .map(Number::Short)
                .unwrap_or_else(|| Number::Integer(i32::from(v).abs())),
            Number::Integer(v) => v
                .checked_abs()
                .map(Number::Integer)
                .unwrap_or_else(|| Number::Long(i64::from(v).abs())),
            Number::Long(v) => v
                .checked_abs()
                .map(Number::Long)
                .unwrap_or_else(|| Number::BigInteger(i128::from(v).abs())),
            Number::BigInteger(v) => v.checked_abs().map(Number::BigInteger).unwrap_or_else(|| {
                Decimal::from_i128(v)
                    .map(|d| Number::BigDecimal(d.abs()))
                    .unwrap_or(Number::Double((v as f64).abs()))
            }),
            Number::Float(v) => Number::Float(v.abs()),
            Number::Double(v) => Number::Double(v.abs()),
            Number::BigDecimal(v) => Number::BigDecimal(v.abs()),
        }
    }

    pub fn floor(&self) -> Number {
        match *self {
            Number::Float(v) => Number::Float(v.floor()),
            Number::Double(v) => Number::Double(v.floor()),
            Number::BigDecimal(v) => Number::BigDecimal(v.floor()),
            integral => integral,
        }
    }

    pub fn ceil(&self) -> Number {
        match *self {
            Number::Float(v) => Number::Float(v.ceil()),
            Number::Double(v) => Number::Double(v.ceil()),
            Number::BigDecimal(v) => Number::BigDecimal(v.ceil()),
            integral => integral,
        }
    }

    /// Divides a sum by an element count, as `avg` does.
    ///
    /// Sums up to `integer`, `float` and `double` produce a `double`; wider
    /// sums produce a `big-decimal` so large integers keep their precision.
    pub fn divide(&self, count: usize) -> Option<Number> {
        if count == 0 {
            return None;
        }
        let approximate = Number::Double(self.to_f64() / count as f64);
        match self.number_type() {
            NumberType::Long | NumberType::BigInteger | NumberType::BigDecimal => {
                let exact = self
                    .to_decimal()
                    .zip(Decimal::from_usize(count))
                    .and_then(|(sum, count)| sum.checked_div(count))
                    .map(Number::BigDecimal);
                Some(exact.unwrap_or(approximate))
            }
            _ => Some(approximate),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let target = self.number_type().promote(other.number_type());
        match (self.convert(target), other.convert(target)) {
            (Some(a), Some(b)) => a.cmp_same(&b),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Byte(v) => write!(f, "{}", v),
            Number::Short(v) => write!(f, "{}", v),
            Number::Integer(v) => write!(f, "{}", v),
            Number::Long(v) => write!(f, "{}", v),
            Number::BigInteger(v) => write!(f, "{}", v),
            // Debug formatting keeps the fractional part (`1.0`, not `1`)
            Number::Float(v) => write!(f, "{:?}", v),
            Number::Double(v) => write!(f, "{:?}", v),
            Number::BigDecimal(v) => write!(f, "{}", v),
        }
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Integer(v)
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Long(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Double(v)
    }
}

impl From<Decimal> for Number {
    fn from(v: Decimal) -> Self {
        Number::BigDecimal(v)
    }
}
