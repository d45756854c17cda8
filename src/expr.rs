use std::{cell::RefCell, rc::Rc};

use crate::store::StoreType;

pub type ExprRef = Rc<RefCell<SqlExpr>>;

pub fn expr_ref(expr: SqlExpr) -> ExprRef {
    Rc::new(RefCell::new(expr))
}

/// The domain type of an expression as the host compiler sees it. This is
/// deliberately distinct from [`StoreType`], which names the physical
/// representation on the wire (a `Dictionary` column may be stored as
/// "hstore" or as "jsonb").
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    Bool,
    Int16,
    Int32,
    Int64,
    Real,
    Double,
    Decimal,
    Text,
    Char(u32),
    Bytes,
    Uuid,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,
    Array(Box<Type>),
    /// An in-memory key/value dictionary (string keys, string values).
    Dictionary,
    /// A structured document (JSON-like object or array).
    Document,
    Row(Vec<Type>),
    Range(Box<Type>),
    Inet,
    Cidr,
    MacAddr,
    MacAddr8,
    LTree,
    LQuery,
    LTxtQuery,
    TsVector,
    TsQuery,
    Unknown,
}

impl Type {
    pub fn array_of(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn range_of(elem: Type) -> Type {
        Type::Range(Box::new(elem))
    }

    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) | Type::Range(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Type::Text | Type::Char(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int16 | Type::Int32 | Type::Int64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Type::Real | Type::Double | Type::Decimal)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Type::Date | Type::Time | Type::Timestamp | Type::TimestampTz | Type::Interval
        )
    }

    pub fn is_document_like(&self) -> bool {
        matches!(self, Type::Dictionary | Type::Document)
    }

    /// The dialect type name used when a value of this type must be named in
    /// a cast and no explicit store mapping is available.
    pub fn dialect_name(&self) -> &'static str {
        match self {
            Type::Bool => "bool",
            Type::Int16 => "int2",
            Type::Int32 => "int4",
            Type::Int64 => "int8",
            Type::Real => "float4",
            Type::Double => "float8",
            Type::Decimal => "numeric",
            Type::Text | Type::Char(_) => "text",
            Type::Bytes => "bytea",
            Type::Uuid => "uuid",
            Type::Date => "date",
            Type::Time => "time",
            Type::Timestamp => "timestamp",
            Type::TimestampTz => "timestamptz",
            Type::Interval => "interval",
            Type::Array(_) => "array",
            Type::Dictionary => "hstore",
            Type::Document => "jsonb",
            Type::Row(_) => "record",
            Type::Range(_) => "range",
            Type::Inet => "inet",
            Type::Cidr => "cidr",
            Type::MacAddr => "macaddr",
            Type::MacAddr8 => "macaddr8",
            Type::LTree => "ltree",
            Type::LQuery => "lquery",
            Type::LTxtQuery => "ltxtquery",
            Type::TsVector => "tsvector",
            Type::TsQuery => "tsquery",
            Type::Unknown => "unknown",
        }
    }
}

/// Constant payloads. Temporal values use chrono's naive calendar types; the
/// printer decides how to quote them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Arbitrary-precision numerics travel as their literal text.
    Numeric(String),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(String),
    Date(chrono::NaiveDate),
    Timestamp(chrono::NaiveDateTime),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Per-argument null propagation for a function or aggregate call: `true`
/// at index `i` means "a NULL argument `i` makes the whole call NULL".
/// Fixed at construction; it must describe the named SQL function, it is
/// never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullMask(Vec<bool>);

impl NullMask {
    /// Every argument propagates NULL (the common strict-function case).
    pub fn all(arity: usize) -> Self {
        NullMask(vec![true; arity])
    }

    /// No argument propagates NULL (e.g. COALESCE-like functions).
    pub fn none(arity: usize) -> Self {
        NullMask(vec![false; arity])
    }

    pub fn of(mask: impl Into<Vec<bool>>) -> Self {
        NullMask(mask.into())
    }

    pub fn propagates(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A WHEN branch for CASE.
#[derive(Debug, Clone, PartialEq)]
pub struct When {
    pub cond: ExprRef,
    pub then: ExprRef,
}

/// The output representation: a closed union of PostgreSQL expression
/// shapes. Every variant carries the domain type the host expects back;
/// store-aware variants also carry the physical store mapping when one is
/// known. Trees are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    Constant {
        value: Value,
        ty: Type,
        store: Option<StoreType>,
    },
    Column {
        name: String,
        ty: Type,
        store: Option<StoreType>,
    },
    /// A query parameter. Kept distinct from constants because several rules
    /// (LIKE escaping, array containment) pick a different plan when the
    /// value is not known at translation time.
    Parameter {
        name: String,
        ty: Type,
        store: Option<StoreType>,
    },
    /// The parameter of a predicate lambda, as lowered by the host when it
    /// hands us a lambda body. Only ever appears inside such bodies.
    LambdaParam {
        ty: Type,
    },
    FunctionCall {
        name: String,
        args: Vec<ExprRef>,
        nullable: bool,
        null_mask: NullMask,
        ty: Type,
        store: Option<StoreType>,
    },
    AggregateCall {
        name: String,
        args: Vec<ExprRef>,
        null_mask: NullMask,
        ty: Type,
        store: Option<StoreType>,
    },
    BinaryOp {
        symbol: &'static str,
        left: ExprRef,
        right: ExprRef,
        ty: Type,
        store: Option<StoreType>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: ExprRef,
        ty: Type,
    },
    Cast {
        inner: ExprRef,
        ty: Type,
        store: Option<StoreType>,
    },
    /// A folded multi-step path descent into a document-typed value. The
    /// whole path is carried in one node so the printer can emit a single
    /// path operator; appending a step always extends `path`, never nests.
    Traversal {
        root: ExprRef,
        path: Vec<ExprRef>,
        returns_text: bool,
        ty: Type,
        store: Option<StoreType>,
    },
    /// A LIKE pattern match. `escape` of `Some("")` disables escape
    /// processing entirely; `None` leaves the dialect default (backslash).
    Like {
        match_expr: ExprRef,
        pattern: ExprRef,
        escape: Option<String>,
    },
    /// An ARRAY[...] constructor.
    NewArray {
        values: Vec<ExprRef>,
        ty: Type,
    },
    RowValue {
        values: Vec<ExprRef>,
        ty: Type,
    },
    CaseWhen {
        arms: Vec<When>,
        default: Option<ExprRef>,
        ty: Type,
    },
    /// Raw SQL text. Escape hatch for fragments with no structured variant.
    Fragment {
        text: String,
        ty: Type,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
    /// Bitwise complement (`~`), used by the network rules.
    BitwiseNot,
    /// Text-search query negation (`!!`).
    TsNegate,
}

impl SqlExpr {
    pub fn result_type(&self) -> &Type {
        match self {
            SqlExpr::Constant { ty, .. }
            | SqlExpr::Column { ty, .. }
            | SqlExpr::Parameter { ty, .. }
            | SqlExpr::LambdaParam { ty }
            | SqlExpr::FunctionCall { ty, .. }
            | SqlExpr::AggregateCall { ty, .. }
            | SqlExpr::BinaryOp { ty, .. }
            | SqlExpr::UnaryOp { ty, .. }
            | SqlExpr::Cast { ty, .. }
            | SqlExpr::Traversal { ty, .. }
            | SqlExpr::NewArray { ty, .. }
            | SqlExpr::RowValue { ty, .. }
            | SqlExpr::CaseWhen { ty, .. }
            | SqlExpr::Fragment { ty, .. } => ty,
            SqlExpr::Like { .. } => &Type::Bool,
        }
    }

    pub fn store_type(&self) -> Option<&StoreType> {
        match self {
            SqlExpr::Constant { store, .. }
            | SqlExpr::Column { store, .. }
            | SqlExpr::Parameter { store, .. }
            | SqlExpr::FunctionCall { store, .. }
            | SqlExpr::AggregateCall { store, .. }
            | SqlExpr::BinaryOp { store, .. }
            | SqlExpr::Cast { store, .. }
            | SqlExpr::Traversal { store, .. } => store.as_ref(),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            SqlExpr::Constant { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_null_constant(&self) -> bool {
        matches!(self.as_constant(), Some(Value::Null))
    }

    pub fn is_column(&self) -> bool {
        matches!(self, SqlExpr::Column { .. })
    }

    pub fn is_lambda_param(&self) -> bool {
        matches!(self, SqlExpr::LambdaParam { .. })
    }

    /// True if a lambda parameter occurs anywhere in this subtree. Used by
    /// pattern rewrites that must prove the parameter appears exactly once
    /// in a known position before committing.
    pub fn mentions_lambda_param(&self) -> bool {
        let any = |exprs: &[ExprRef]| exprs.iter().any(|e| e.borrow().mentions_lambda_param());
        match self {
            SqlExpr::LambdaParam { .. } => true,
            SqlExpr::Constant { .. }
            | SqlExpr::Column { .. }
            | SqlExpr::Parameter { .. }
            | SqlExpr::Fragment { .. } => false,
            SqlExpr::FunctionCall { args, .. } | SqlExpr::AggregateCall { args, .. } => any(args),
            SqlExpr::BinaryOp { left, right, .. } => {
                left.borrow().mentions_lambda_param() || right.borrow().mentions_lambda_param()
            }
            SqlExpr::UnaryOp { operand, .. } => operand.borrow().mentions_lambda_param(),
            SqlExpr::Cast { inner, .. } => inner.borrow().mentions_lambda_param(),
            SqlExpr::Traversal { root, path, .. } => {
                root.borrow().mentions_lambda_param() || any(path)
            }
            SqlExpr::Like {
                match_expr,
                pattern,
                ..
            } => {
                match_expr.borrow().mentions_lambda_param()
                    || pattern.borrow().mentions_lambda_param()
            }
            SqlExpr::NewArray { values, .. } | SqlExpr::RowValue { values, .. } => any(values),
            SqlExpr::CaseWhen { arms, default, .. } => {
                arms.iter().any(|w| {
                    w.cond.borrow().mentions_lambda_param()
                        || w.then.borrow().mentions_lambda_param()
                }) || default
                    .as_ref()
                    .is_some_and(|d| d.borrow().mentions_lambda_param())
            }
        }
    }
}

// Builders. Translation rules compose these rather than spelling the
// variants out; the defaults (strict null mask, nullable result) describe
// the overwhelming majority of PostgreSQL functions.

pub fn func(name: &str, args: Vec<ExprRef>, ty: Type) -> SqlExpr {
    let mask = NullMask::all(args.len());
    SqlExpr::FunctionCall {
        name: name.to_string(),
        args,
        nullable: true,
        null_mask: mask,
        ty,
        store: None,
    }
}

pub fn func_store(name: &str, args: Vec<ExprRef>, ty: Type, store: StoreType) -> SqlExpr {
    let mask = NullMask::all(args.len());
    SqlExpr::FunctionCall {
        name: name.to_string(),
        args,
        nullable: true,
        null_mask: mask,
        ty,
        store: Some(store),
    }
}

pub fn func_masked(name: &str, args: Vec<ExprRef>, mask: NullMask, ty: Type) -> SqlExpr {
    SqlExpr::FunctionCall {
        name: name.to_string(),
        args,
        nullable: true,
        null_mask: mask,
        ty,
        store: None,
    }
}

pub fn aggregate(name: &str, args: Vec<ExprRef>, ty: Type) -> SqlExpr {
    let mask = NullMask::all(args.len());
    SqlExpr::AggregateCall {
        name: name.to_string(),
        args,
        null_mask: mask,
        ty,
        store: None,
    }
}

pub fn aggregate_store(name: &str, args: Vec<ExprRef>, ty: Type, store: StoreType) -> SqlExpr {
    let mask = NullMask::all(args.len());
    SqlExpr::AggregateCall {
        name: name.to_string(),
        args,
        null_mask: mask,
        ty,
        store: Some(store),
    }
}

pub fn binary(symbol: &'static str, left: ExprRef, right: ExprRef, ty: Type) -> SqlExpr {
    SqlExpr::BinaryOp {
        symbol,
        left,
        right,
        ty,
        store: None,
    }
}

pub fn binary_store(
    symbol: &'static str,
    left: ExprRef,
    right: ExprRef,
    ty: Type,
    store: StoreType,
) -> SqlExpr {
    SqlExpr::BinaryOp {
        symbol,
        left,
        right,
        ty,
        store: Some(store),
    }
}

pub fn comparison(symbol: &'static str, left: ExprRef, right: ExprRef) -> SqlExpr {
    binary(symbol, left, right, Type::Bool)
}

pub fn and(left: ExprRef, right: ExprRef) -> SqlExpr {
    binary("AND", left, right, Type::Bool)
}

pub fn cast(inner: ExprRef, ty: Type) -> SqlExpr {
    SqlExpr::Cast {
        inner,
        ty,
        store: None,
    }
}

pub fn cast_store(inner: ExprRef, ty: Type, store: StoreType) -> SqlExpr {
    SqlExpr::Cast {
        inner,
        ty,
        store: Some(store),
    }
}

pub fn like(match_expr: ExprRef, pattern: ExprRef) -> SqlExpr {
    SqlExpr::Like {
        match_expr,
        pattern,
        escape: None,
    }
}

/// LIKE with escape processing disabled; used for pre-filters whose pattern
/// is not known at translation time and therefore cannot be pre-escaped.
pub fn like_unescaped(match_expr: ExprRef, pattern: ExprRef) -> SqlExpr {
    SqlExpr::Like {
        match_expr,
        pattern,
        escape: Some(String::new()),
    }
}

pub fn not(operand: ExprRef) -> SqlExpr {
    SqlExpr::UnaryOp {
        op: UnaryOp::Not,
        operand,
        ty: Type::Bool,
    }
}

pub fn is_not_null(operand: ExprRef) -> SqlExpr {
    SqlExpr::UnaryOp {
        op: UnaryOp::IsNotNull,
        operand,
        ty: Type::Bool,
    }
}

pub fn constant(value: Value, ty: Type) -> SqlExpr {
    SqlExpr::Constant {
        value,
        ty,
        store: None,
    }
}

pub fn column(name: impl Into<String>, ty: Type) -> SqlExpr {
    SqlExpr::Column {
        name: name.into(),
        ty,
        store: None,
    }
}

pub fn column_store(name: impl Into<String>, ty: Type, store: StoreType) -> SqlExpr {
    SqlExpr::Column {
        name: name.into(),
        ty,
        store: Some(store),
    }
}

pub fn parameter(name: impl Into<String>, ty: Type) -> SqlExpr {
    SqlExpr::Parameter {
        name: name.into(),
        ty,
        store: None,
    }
}

pub fn text(s: impl Into<String>) -> SqlExpr {
    constant(Value::Text(s.into()), Type::Text)
}

pub fn int(v: i64) -> SqlExpr {
    constant(Value::Int(v), Type::Int32)
}

pub fn null(ty: Type) -> SqlExpr {
    constant(Value::Null, ty)
}

// These From implementations help the translation rules read cleanly.
impl From<&str> for SqlExpr {
    fn from(s: &str) -> Self {
        text(s)
    }
}
impl From<String> for SqlExpr {
    fn from(s: String) -> Self {
        text(s)
    }
}
impl From<i64> for SqlExpr {
    fn from(v: i64) -> Self {
        int(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_mask_bounds() {
        let mask = NullMask::of([true, false]);
        assert!(mask.propagates(0));
        assert!(!mask.propagates(1));
        assert!(!mask.propagates(7));
    }

    #[test]
    fn mentions_lambda_param_walks_nested_trees() {
        let param = expr_ref(SqlExpr::LambdaParam { ty: Type::LTree });
        let call = func("nlevel", vec![param], Type::Int32);
        let wrapped = comparison(">", expr_ref(call), expr_ref(int(2)));
        assert!(wrapped.mentions_lambda_param());

        let plain = comparison(">", expr_ref(int(1)), expr_ref(int(2)));
        assert!(!plain.mentions_lambda_param());
    }

    #[test]
    fn builders_default_to_strict_mask() {
        let f = func("length", vec![expr_ref(text("x"))], Type::Int32);
        match f {
            SqlExpr::FunctionCall { null_mask, .. } => {
                assert_eq!(null_mask.len(), 1);
                assert!(null_mask.propagates(0));
            }
            _ => panic!("expected FunctionCall"),
        }
    }
}
