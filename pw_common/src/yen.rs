use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "JPY";

//--------------------------------------        Yen         ---------------------------------------------------------
/// An amount in the minor currency unit. Yen has no subdivision, so one unit is one yen.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Yen(i64);

op!(binary Yen, Add, add);
op!(binary Yen, Sub, sub);
op!(inplace Yen, SubAssign, sub_assign);

impl Sum for Yen {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in yen: {0}")]
pub struct YenConversionError(String);

impl From<i64> for Yen {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Yen {
    type Error = YenConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Self).map_err(|_| YenConversionError(format!("{value} is too large")))
    }
}

impl Display for Yen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}¥{grouped}")
    }
}

impl Yen {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
