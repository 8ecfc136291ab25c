//! Metrics that may be undefined.

use std::fmt;

use serde::Serialize;

/// A scalar metric that is either defined, or undefined for a stated reason.
///
/// Undefined metrics are never replaced by a default value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// A computed value.
    Defined(f64),
    /// A metric that could not be computed from the available data.
    Undefined(String),
}

impl Metric {
    /// Returns a defined metric if the value is not `NaN`, otherwise an undefined metric with the
    /// reason given by the closure.
    pub fn from_value<F, S>(value: f64, reason: F) -> Self
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        if value.is_nan() {
            Self::Undefined(reason().into())
        } else {
            Self::Defined(value)
        }
    }

    /// Returns `true` if the metric is defined.
    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Defined(_))
    }

    /// Returns the reason the metric is undefined, if it is.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Metric::Defined(_) => None,
            Metric::Undefined(reason) => Some(reason),
        }
    }

    /// Returns the value, if defined.
    pub fn value(&self) -> Option<f64> {
        match *self {
            Metric::Defined(value) => Some(value),
            Metric::Undefined(_) => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Defined(value) => match f.precision() {
                Some(precision) => write!(f, "{value:.precision$}"),
                None => write!(f, "{value}"),
            },
            Metric::Undefined(reason) => write!(f, "undefined ({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value() {
        assert_eq!(Metric::from_value(0.0, || "none"), Metric::Defined(0.0));
        assert_eq!(
            Metric::from_value(f64::NAN, || "no sites"),
            Metric::Undefined(String::from("no sites"))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{:.3}", Metric::Defined(0.72)), "0.720");
        assert_eq!(
            Metric::Undefined(String::from("no data")).to_string(),
            "undefined (no data)"
        );
    }
}
