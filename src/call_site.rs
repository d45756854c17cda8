use crate::{
    expr::{ExprRef, Type},
    ops::{AggregateOp, MemberOp, MethodOp},
};

/// A typed call site handed over by the host compiler. Arguments are
/// already-lowered [`SqlExpr`](crate::expr::SqlExpr) subtrees; a translation
/// rule never sees un-lowered source syntax.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub receiver: Option<ExprRef>,
    pub operation: MethodOp,
    pub arguments: Vec<ExprRef>,
    pub result_type: Type,
}

impl CallSite {
    pub fn receiver(&self) -> Option<&ExprRef> {
        self.receiver.as_ref()
    }

    pub fn arg(&self, index: usize) -> Option<&ExprRef> {
        self.arguments.get(index)
    }
}

/// A member/property access site.
#[derive(Debug, Clone)]
pub struct MemberSite {
    pub receiver: ExprRef,
    pub operation: MemberOp,
    pub result_type: Type,
}

/// How each grouped row is projected before an aggregate consumes it. The
/// host lowers the selector before dispatch; shapes we cannot see through
/// arrive as `Opaque` and rules requiring a particular shape fail closed.
#[derive(Debug, Clone)]
pub enum GroupSelector {
    /// No projection: the aggregate consumes whole rows (e.g. `count(*)`).
    Star,
    /// Each row projected to one expression.
    Scalar(ExprRef),
    /// Each row projected to literally a two-element tuple. Required by
    /// two-argument statistical aggregates and object-building aggregates.
    Pair(ExprRef, ExprRef),
    /// Any other projection shape.
    Opaque,
}

impl GroupSelector {
    pub fn as_scalar(&self) -> Option<&ExprRef> {
        match self {
            GroupSelector::Scalar(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<(&ExprRef, &ExprRef)> {
        match self {
            GroupSelector::Pair(a, b) => Some((a, b)),
            _ => None,
        }
    }
}

/// An aggregate invocation over a grouped source.
#[derive(Debug, Clone)]
pub struct AggregateSite {
    pub operation: AggregateOp,
    pub selector: GroupSelector,
    pub arguments: Vec<ExprRef>,
    pub result_type: Type,
    /// Whether the projected element is nullable in the source model; some
    /// rules must coalesce nullable elements before aggregation.
    pub element_nullable: bool,
}
