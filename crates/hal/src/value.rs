//! Typed tensor values
//!
//! A `Value` pairs a storage (public ring tensor or secret shares) with a
//! semantic dtype. The dtype never changes the bits: fixed-point values are
//! ring elements carrying an implicit 2^f scale, integers are unscaled.

use mantle_engine::{ArithShares, BoolShares};
use mantle_ring::{Field, RingTensor};
use serde::{Deserialize, Serialize};

/// Semantic interpretation of the ring elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    I8,
    I16,
    I32,
    I64,
    /// Fixed-point with the context's fractional-bit scale.
    Fxp,
}

impl DataType {
    pub fn is_int(self) -> bool {
        self != DataType::Fxp
    }

    pub fn is_fxp(self) -> bool {
        self == DataType::Fxp
    }

    /// The wider of two integer dtypes.
    pub fn promote_int(self, other: DataType) -> DataType {
        debug_assert!(self.is_int() && other.is_int());
        self.max(other)
    }
}

/// Share domain of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    SecretArith,
    SecretBool,
}

/// Backing data of a value.
#[derive(Debug, Clone)]
pub enum Storage {
    Public(RingTensor),
    SecretArith(ArithShares),
    SecretBool(BoolShares),
}

/// A tensor of ring elements with a dtype tag.
#[derive(Debug, Clone)]
pub struct Value {
    storage: Storage,
    dtype: DataType,
}

impl Value {
    pub fn public(tensor: RingTensor, dtype: DataType) -> Self {
        Self {
            storage: Storage::Public(tensor),
            dtype,
        }
    }

    pub fn secret_arith(shares: ArithShares, dtype: DataType) -> Self {
        Self {
            storage: Storage::SecretArith(shares),
            dtype,
        }
    }

    pub fn secret_bool(shares: BoolShares, dtype: DataType) -> Self {
        Self {
            storage: Storage::SecretBool(shares),
            dtype,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        match &self.storage {
            Storage::Public(t) => t.shape(),
            Storage::SecretArith(s) => s.shape(),
            Storage::SecretBool(s) => s.shape(),
        }
    }

    pub fn field(&self) -> Field {
        match &self.storage {
            Storage::Public(t) => t.field(),
            Storage::SecretArith(s) => s.field(),
            Storage::SecretBool(s) => s.field(),
        }
    }

    pub fn numel(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn visibility(&self) -> Visibility {
        match &self.storage {
            Storage::Public(_) => Visibility::Public,
            Storage::SecretArith(_) => Visibility::SecretArith,
            Storage::SecretBool(_) => Visibility::SecretBool,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self.storage, Storage::Public(_))
    }

    pub fn is_secret(&self) -> bool {
        !self.is_public()
    }

    pub fn is_fxp(&self) -> bool {
        self.dtype.is_fxp()
    }

    pub fn is_int(&self) -> bool {
        self.dtype.is_int()
    }

    /// Retag as fixed-point; the bits are untouched.
    pub fn as_fxp(mut self) -> Self {
        self.dtype = DataType::Fxp;
        self
    }

    /// Retag with a new dtype; the bits are untouched.
    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Narrow the significant-bit hint of a boolean-shared value. No-op for
    /// other domains.
    pub fn hint_nbits(mut self, nbits: usize) -> Self {
        if let Storage::SecretBool(shares) = &mut self.storage {
            shares.set_nbits(nbits);
        }
        self
    }

    /// The public tensor, if this value is public.
    pub fn as_public(&self) -> Option<&RingTensor> {
        match &self.storage {
            Storage::Public(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_promotion() {
        assert_eq!(DataType::I8.promote_int(DataType::I32), DataType::I32);
        assert_eq!(DataType::I64.promote_int(DataType::I16), DataType::I64);
        assert_eq!(DataType::I8.promote_int(DataType::I8), DataType::I8);
    }

    #[test]
    fn test_retagging_keeps_bits() {
        let t = RingTensor::splat(Field::Fm64, vec![2], 7);
        let v = Value::public(t.clone(), DataType::I32);
        let f = v.clone().as_fxp();
        assert!(f.is_fxp());
        assert_eq!(f.as_public().unwrap(), &t);
        assert_eq!(f.with_dtype(DataType::I64).dtype(), DataType::I64);
    }
}
