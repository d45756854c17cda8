//! Per-domain translation rules.
//!
//! Each module hosts one translator: a pure function from a call site to at
//! most one dialect expression. A translator that recognizes nothing about
//! a call site declines with `Ok(None)`; it never guesses. Modules are
//! wired together in a fixed order by [`Dispatcher`](crate::dispatch::Dispatcher).

pub mod aggregates;
pub mod arrays;
pub mod datetime;
pub mod fulltext;
pub mod json;
pub mod ltree;
pub mod misc;
pub mod network;
pub mod ranges;
pub mod rowvalue;
pub mod strings;
pub mod trigram;

use crate::{
    call_site::{AggregateSite, CallSite, MemberSite},
    error::TranslateResult,
    expr::ExprRef,
    store::{StoreType, TypeMapper},
    version::VersionGate,
};

/// Everything a translation rule may consult besides the call site itself:
/// the store-type catalog and the configured backend version. Built once
/// per dispatcher, immutable during translation.
pub struct Cx<'a> {
    pub types: &'a dyn TypeMapper,
    pub version: VersionGate,
}

impl Cx<'_> {
    /// The store type of an expression: its explicit mapping when it has
    /// one, otherwise whatever the catalog derives from its domain type.
    pub fn store_of(&self, expr: &ExprRef) -> Option<StoreType> {
        let e = expr.borrow();
        if let Some(store) = e.store_type() {
            return Some(store.clone());
        }
        self.types.resolve(e.result_type(), None)
    }
}

/// Rebases a 0-based source index onto the dialect's 1-based convention:
/// literal indices fold at translation time, anything else becomes a
/// runtime `+ 1` node.
pub fn one_based(index: &ExprRef) -> ExprRef {
    use crate::expr::{SqlExpr, Type, Value, binary, constant, expr_ref, int};
    let folded = match &*index.borrow() {
        SqlExpr::Constant {
            value: Value::Int(i),
            ..
        } => Some(int(i + 1)),
        _ => None,
    };
    match folded {
        Some(lit) => expr_ref(lit),
        None => expr_ref(binary(
            "+",
            index.clone(),
            expr_ref(constant(Value::Int(1), Type::Int32)),
            Type::Int32,
        )),
    }
}

pub trait MethodTranslator {
    fn translate(&self, call: &CallSite, cx: &Cx) -> TranslateResult;
}

pub trait MemberTranslator {
    fn translate(&self, site: &MemberSite, cx: &Cx) -> TranslateResult;
}

pub trait AggregateTranslator {
    fn translate(&self, site: &AggregateSite, cx: &Cx) -> TranslateResult;
}
