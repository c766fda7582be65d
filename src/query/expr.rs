use rust_decimal::Decimal;
use time::{Duration, PrimitiveDateTime};
use uuid::Uuid;

/// A closed-over host value appearing in a predicate.
///
/// These are the leaves a query closes over; the translator never inlines
/// them into SQL text — each one becomes a positional parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Uuid(Uuid),
    Decimal(Decimal),
    DateTime(PrimitiveDateTime),
    Duration(Duration),
}

impl ScalarValue {
    pub(crate) fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

macro_rules! impl_from_for_scalar {
    ($( $ty:ty => $variant:ident $(($conv:expr))? ),+ $(,)?) => {
        $(
            impl From<$ty> for ScalarValue {
                fn from(value: $ty) -> Self {
                    impl_from_for_scalar!(@make value, $variant $(, $conv)?)
                }
            }
        )+
    };

    (@make $value:ident, $variant:ident) => { ScalarValue::$variant($value) };
    (@make $value:ident, $variant:ident, $conv:expr) => { ScalarValue::$variant(($conv)($value)) };
}

impl_from_for_scalar! {
    bool => Bool,
    i32 => Int((i64::from)),
    i64 => Int,
    u32 => Int((i64::from)),
    f64 => Real,
    String => Text,
    Vec<u8> => Blob,
    Uuid => Uuid,
    Decimal => Decimal,
    PrimitiveDateTime => DateTime,
    Duration => Duration,
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_owned())
    }
}

impl From<&[u8]> for ScalarValue {
    fn from(value: &[u8]) -> Self {
        ScalarValue::Blob(value.to_vec())
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ScalarValue::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    And,
    Or,
    Xor,
}

/// String functions a predicate may call on a column or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    StartsWith,
    EndsWith,
    Contains,
    ToLower,
    ToUpper,
    Trim,
    Length,
    Substr,
}

/// A boolean (or scalar) expression over record columns and closed-over
/// values, as a tagged variant tree.
///
/// Build expressions with [`col`], [`val`] and the combinator methods;
/// the translator turns the tree into a parameterized SQL fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a record column, by (unsanitized) column name.
    Column(String),

    /// A closed-over constant.
    Value(ScalarValue),

    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),

    /// `a ?? b` — the first operand unless it is null.
    Coalesce(Box<Expr>, Box<Expr>),

    /// `IS NULL` (`negated = false`) or `IS NOT NULL`.
    IsNull(Box<Expr>, bool),

    /// A supported method call; the receiver is the first element.
    Call(Func, Vec<Expr>),

    /// Membership in a closed-over sequence; renders as `IN (…)`.
    InList(Box<Expr>, Vec<ScalarValue>),

    /// `if cond then a else b` — renders as `CASE WHEN … END`.
    Case {
        cond: Box<Expr>,
        then: Box<Expr>,
        els: Box<Expr>,
    },
}

/// A reference to a record column.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// A closed-over constant value.
pub fn val(value: impl Into<ScalarValue>) -> Expr {
    Expr::Value(value.into())
}

macro_rules! binary_methods {
    ($( $method:ident => $op:ident ),+ $(,)?) => {
        $(
            pub fn $method(self, other: Expr) -> Expr {
                Expr::Binary(BinaryOp::$op, Box::new(self), Box::new(other))
            }
        )+
    };
}

impl Expr {
    binary_methods! {
        add => Add,
        sub => Sub,
        mul => Mul,
        div => Div,
        rem => Rem,
        eq => Eq,
        ne => Ne,
        lt => Lt,
        le => Le,
        gt => Gt,
        ge => Ge,
        and => And,
        or => Or,
        xor => Xor,
    }

    pub fn not(self) -> Expr {
        Expr::Unary(UnaryOp::Not, Box::new(self))
    }

    pub fn neg(self) -> Expr {
        Expr::Unary(UnaryOp::Neg, Box::new(self))
    }

    pub fn coalesce(self, other: Expr) -> Expr {
        Expr::Coalesce(Box::new(self), Box::new(other))
    }

    pub fn is_null(self) -> Expr {
        Expr::IsNull(Box::new(self), false)
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNull(Box::new(self), true)
    }

    pub fn starts_with(self, needle: Expr) -> Expr {
        Expr::Call(Func::StartsWith, vec![self, needle])
    }

    pub fn ends_with(self, needle: Expr) -> Expr {
        Expr::Call(Func::EndsWith, vec![self, needle])
    }

    /// Substring containment on strings. For sequence membership see
    /// [`in_list`](Self::in_list).
    pub fn contains(self, needle: Expr) -> Expr {
        Expr::Call(Func::Contains, vec![self, needle])
    }

    pub fn to_lower(self) -> Expr {
        Expr::Call(Func::ToLower, vec![self])
    }

    pub fn to_upper(self) -> Expr {
        Expr::Call(Func::ToUpper, vec![self])
    }

    pub fn trim(self) -> Expr {
        Expr::Call(Func::Trim, vec![self])
    }

    pub fn length(self) -> Expr {
        Expr::Call(Func::Length, vec![self])
    }

    /// Substring with a 0-based start offset and length, matching host
    /// conventions; the translation accounts for SQL's 1-based `substr`.
    pub fn substr(self, start: Expr, len: Expr) -> Expr {
        Expr::Call(Func::Substr, vec![self, start, len])
    }

    pub fn in_list<V: Into<ScalarValue>>(self, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::InList(Box::new(self), values.into_iter().map(Into::into).collect())
    }

    /// `if self then a else b`.
    pub fn if_then_else(self, then: Expr, els: Expr) -> Expr {
        Expr::Case { cond: Box::new(self), then: Box::new(then), els: Box::new(els) }
    }

    /// Whether any leaf of the tree refers to a record column.
    pub(crate) fn refers_to_column(&self) -> bool {
        match self {
            Expr::Column(_) => true,
            Expr::Value(_) => false,
            Expr::Unary(_, a) | Expr::IsNull(a, _) => a.refers_to_column(),
            Expr::Binary(_, a, b) | Expr::Coalesce(a, b) => {
                a.refers_to_column() || b.refers_to_column()
            }
            Expr::Call(_, args) => args.iter().any(Expr::refers_to_column),
            Expr::InList(a, _) => a.refers_to_column(),
            Expr::Case { cond, then, els } => {
                cond.refers_to_column() || then.refers_to_column() || els.refers_to_column()
            }
        }
    }
}
