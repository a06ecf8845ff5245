//! Cell values
//!
//! A tuple holds one [`Value`] per column. The variant must match the
//! column's kind; the table checks this whenever rows enter it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::column::ColumnKind;

/// A single cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Floating point; NaN marks a missing value
    Numeric(f64),
    Temporal(DateTime<Utc>),
    Categorical(String),
    /// Reference to an image (path or key), never the pixels
    Image(String),
    /// Element of a bivariate column: the values of its two source columns
    Pair(Box<Value>, Box<Value>),
}

impl Value {
    pub fn pair(first: Value, second: Value) -> Self {
        Self::Pair(Box::new(first), Box::new(second))
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_temporal(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Temporal(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Self::Categorical(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&str> {
        match self {
            Self::Image(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<(&Value, &Value)> {
        match self {
            Self::Pair(a, b) => Some((a, b)),
            _ => None,
        }
    }

    /// Name of the variant, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Temporal(_) => "temporal",
            Self::Categorical(_) => "categorical",
            Self::Image(_) => "image",
            Self::Pair(_, _) => "pair",
        }
    }

    /// Whether this value can be stored in a column of `kind`
    pub fn fits(&self, kind: &ColumnKind) -> bool {
        matches!(
            (self, kind),
            (Self::Numeric(_), ColumnKind::Numeric(_))
                | (Self::Temporal(_), ColumnKind::Temporal(_))
                | (Self::Categorical(_), ColumnKind::Categorical { .. })
                | (Self::Image(_), ColumnKind::Image)
                | (Self::Pair(_, _), ColumnKind::Bivariate { .. })
        )
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Numeric(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Temporal(t)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Categorical(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Categorical(s)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "{}", v),
            Self::Temporal(t) => write!(f, "{}", t.to_rfc3339()),
            Self::Categorical(s) | Self::Image(s) => write!(f, "{}", s),
            Self::Pair(a, b) => write!(f, "({}, {})", a, b),
        }
    }
}
