use std::ops::Mul;

macro_rules! quantity {
    ($(#[$attr:meta])* $name:ident, $format:literal) => {
        #[repr(transparent)]
        #[derive(
            ::derive_more::Add,
            ::derive_more::AddAssign,
            ::derive_more::From,
            ::derive_more::FromStr,
            ::derive_more::Neg,
            ::derive_more::Sub,
            ::derive_more::SubAssign,
            ::derive_more::Sum,
            ::serde::Deserialize,
            ::serde::Serialize,
            ::std::clone::Clone,
            ::std::cmp::Eq,
            ::std::cmp::Ord,
            ::std::cmp::PartialEq,
            ::std::cmp::PartialOrd,
            ::std::marker::Copy,
        )]
        #[from(f64, ::ordered_float::OrderedFloat<f64>)]
        #[must_use]
        $(#[$attr])*
        pub struct $name(pub ::ordered_float::OrderedFloat<f64>);

        impl $name {
            pub const ZERO: Self = Self(::ordered_float::OrderedFloat(0.0));
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, $format, self.0)
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(self, f)
            }
        }
    };
}

quantity!(
    /// Energy in kilowatt-hours ("units" on the bill).
    KilowattHours,
    "{} kWh"
);

quantity!(
    /// Unit price in rupees per kilowatt-hour.
    KilowattHourRate,
    "₹{:.2}/kWh"
);

/// Whole rupees. Earnings are always quoted rounded to the rupee.
#[repr(transparent)]
#[derive(
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Sum,
    serde::Deserialize,
    serde::Serialize,
    Clone,
    Copy,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[must_use]
pub struct Rupees(pub i64);

impl Rupees {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl std::fmt::Display for Rupees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

impl std::fmt::Debug for Rupees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl Mul<KilowattHourRate> for KilowattHours {
    type Output = Rupees;

    /// Expected earnings, rounded to the whole rupee.
    #[expect(clippy::cast_possible_truncation)]
    fn mul(self, rate: KilowattHourRate) -> Rupees {
        Rupees((self.0.0 * rate.0.0).round() as i64)
    }
}
