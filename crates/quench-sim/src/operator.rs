//! Site-local operators.
//!
//! An [`Operator`] is either a *name* that is looked up in the operator table
//! of the site it acts on, an inline matrix built by the caller, or a product
//! of such factors acting on the same site.
//!
//! ```rust
//! use quench_sim::operator::Operator;
//!
//! let op = Operator::parse("JW C");
//! assert_eq!(op.to_string(), "JW C");
//! assert!(matches!(op, Operator::Product(ref f) if f.len() == 2));
//! ```

use std::fmt;
use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Name of the identity operator in every site's table.
pub const IDENTITY: &str = "Id";

/// Name of the sign-string (Jordan-Wigner) operator in every site's table.
pub const STRING: &str = "JW";

/// A site-local operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OperatorRepr", into = "OperatorRepr")]
pub enum Operator {
    /// Looked up by name in the site's operator table.
    Named(String),
    /// Pre-built square matrix in the site's local basis.
    Inline(Arc<Array2<Complex64>>),
    /// Same-site product; the leftmost factor acts last.
    Product(Vec<Operator>),
}

impl Operator {
    /// Parse an operator name; whitespace-separated names form a product.
    pub fn parse(name: &str) -> Self {
        let mut factors: Vec<Operator> = name
            .split_whitespace()
            .map(|n| Operator::Named(n.to_string()))
            .collect();
        match factors.len() {
            0 => Self::identity(),
            1 => factors.remove(0),
            _ => Operator::Product(factors),
        }
    }

    /// The identity operator.
    pub fn identity() -> Self {
        Operator::Named(IDENTITY.to_string())
    }

    /// The sign-string operator.
    pub fn string() -> Self {
        Operator::Named(STRING.to_string())
    }

    /// Wrap a local matrix.
    pub fn inline(matrix: Array2<Complex64>) -> Self {
        Operator::Inline(Arc::new(matrix))
    }

    /// Build the product `factors[0] · factors[1] · …`, dropping identities.
    pub fn product(factors: Vec<Operator>) -> Self {
        let mut kept: Vec<Operator> = Vec::with_capacity(factors.len());
        for f in factors {
            match f {
                f if f.is_identity() => {}
                Operator::Product(inner) => kept.extend(inner),
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Self::identity(),
            1 => kept.remove(0),
            _ => Operator::Product(kept),
        }
    }

    /// True for the named identity.
    pub fn is_identity(&self) -> bool {
        matches!(self, Operator::Named(n) if n == IDENTITY)
    }

    /// The operator's name, if it is a plain named operator.
    pub fn name(&self) -> Option<&str> {
        match self {
            Operator::Named(n) => Some(n),
            _ => None,
        }
    }

    /// Text form for operators given by name (including products of names).
    pub fn label(&self) -> Option<String> {
        match self {
            Operator::Named(n) => Some(n.clone()),
            Operator::Inline(_) => None,
            Operator::Product(f) => f.iter().all(|op| op.label().is_some()).then(|| self.to_string()),
        }
    }

    /// The factors of this operator, leftmost first.
    pub fn factors(&self) -> &[Operator] {
        match self {
            Operator::Product(f) => f,
            other => std::slice::from_ref(other),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Named(n) => write!(f, "{n}"),
            Operator::Inline(m) => write!(f, "<inline {}x{}>", m.nrows(), m.ncols()),
            Operator::Product(factors) => {
                for (k, op) in factors.iter().enumerate() {
                    if k > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{op}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        Operator::parse(name)
    }
}

/// Wire form of an [`Operator`]: a name, a nested list of `[re, im]` pairs,
/// or `{product: [...]}` when a product mixes names and matrices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum OperatorRepr {
    Name(String),
    Matrix(Vec<Vec<Complex64>>),
    Factors { product: Vec<OperatorRepr> },
}

impl TryFrom<OperatorRepr> for Operator {
    type Error = String;

    fn try_from(repr: OperatorRepr) -> Result<Self, Self::Error> {
        match repr {
            OperatorRepr::Name(name) => Ok(Operator::parse(&name)),
            OperatorRepr::Matrix(rows) => {
                let n = rows.len();
                if n == 0 || rows.iter().any(|r| r.len() != n) {
                    return Err(format!("inline operator must be a square matrix, got {n} rows"));
                }
                let flat: Vec<Complex64> = rows.into_iter().flatten().collect();
                Array2::from_shape_vec((n, n), flat)
                    .map(Operator::inline)
                    .map_err(|e| e.to_string())
            }
            OperatorRepr::Factors { product } => product
                .into_iter()
                .map(Operator::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Operator::product),
        }
    }
}

impl From<Operator> for OperatorRepr {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Inline(m) => {
                OperatorRepr::Matrix(m.rows().into_iter().map(|r| r.to_vec()).collect())
            }
            Operator::Product(factors) if op_has_matrix(&factors) => {
                OperatorRepr::Factors {
                    product: factors.into_iter().map(OperatorRepr::from).collect(),
                }
            }
            other => OperatorRepr::Name(other.to_string()),
        }
    }
}

fn op_has_matrix(factors: &[Operator]) -> bool {
    factors.iter().any(|f| f.label().is_none())
}

/// A value given either as a scalar or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single scalar value.
    One(T),
    /// An explicit list (possibly of length one).
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Normalise to a list.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }

    /// Borrow as a slice.
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v),
            OneOrMany::Many(v) => v,
        }
    }

    /// True if the value was given as a list.
    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }
}
