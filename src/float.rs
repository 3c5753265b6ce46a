//!
//! Element types of the message kernels
//!
//! * `HmmFloat`: floating point type of probabilities, log probabilities and messages.
//!     Implemented for `f32` and `f64`.
//! * `StateIndex`: integer type of state sequences and compressed sparse indices.
//!     Any primitive integer.
//!
use crate::error::HmmError;
use approx::AbsDiffEq;
use ndarray::{LinalgScalar, ScalarOperand};
use num_traits::{Float, FromPrimitive, NumAssign, NumCast, PrimInt};
use rand::distributions::uniform::SampleUniform;
use std::fmt::{Debug, Display};
use std::iter::Sum;
use std::ops::AddAssign;

///
/// Floating point element of messages, transition matrices and emission log likelihoods.
///
pub trait HmmFloat:
    Float
    + NumAssign
    + FromPrimitive
    + LinalgScalar
    + ScalarOperand
    + AbsDiffEq<Epsilon = Self>
    + SampleUniform
    + for<'a> AddAssign<&'a Self>
    + Sum
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + 'static
{
    ///
    /// Convert from f64, rounding to the nearest representable value.
    ///
    fn of(x: f64) -> Self;
    ///
    /// Widen into f64.
    ///
    fn as_f64(self) -> f64;
    ///
    /// Tolerance used when checking that a distribution sums to one.
    ///
    fn sum_tolerance() -> Self;
}

impl HmmFloat for f32 {
    #[inline]
    fn of(x: f64) -> f32 {
        x as f32
    }
    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
    fn sum_tolerance() -> f32 {
        1e-4
    }
}

impl HmmFloat for f64 {
    #[inline]
    fn of(x: f64) -> f64 {
        x
    }
    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
    fn sum_tolerance() -> f64 {
        1e-6
    }
}

///
/// Integer element of state sequences (`stateseq`) and block/sparse indices (`rs`, `indptr`, `indices`).
///
pub trait StateIndex: PrimInt + Debug + Send + Sync + 'static {
    ///
    /// Convert a state index into `Self`, failing if it does not fit.
    ///
    fn from_state(k: usize) -> Result<Self, HmmError> {
        <Self as NumCast>::from(k).ok_or(HmmError::IndexOverflow(k))
    }
    ///
    /// Convert back into a state index. `None` for negative values.
    ///
    fn to_state(self) -> Option<usize> {
        self.to_usize()
    }
}

impl<T: PrimInt + Debug + Send + Sync + 'static> StateIndex for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_index_conversion() {
        assert_eq!(i32::from_state(10).unwrap(), 10i32);
        assert_eq!(u8::from_state(255).unwrap(), 255u8);
        assert!(matches!(u8::from_state(256), Err(HmmError::IndexOverflow(256))));
        assert_eq!((-1i32).to_state(), None);
        assert_eq!(7i64.to_state(), Some(7));
    }
    #[test]
    fn float_conversion() {
        assert_eq!(f32::of(0.5), 0.5f32);
        assert_eq!(f64::of(0.25).as_f64(), 0.25);
        assert!(f32::of(f64::NEG_INFINITY).is_infinite());
    }
}
