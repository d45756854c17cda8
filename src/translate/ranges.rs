use super::{Cx, MemberTranslator, MethodTranslator};
use crate::{
    call_site::{CallSite, MemberSite},
    error::TranslateResult,
    expr::{ExprRef, Type, binary, binary_store, comparison, expr_ref, func},
    ops::{MemberOp, MethodOp},
};

/// Lowers range predicates and set-like range arithmetic.
pub struct RangeTranslator;

fn range_binary(call: &CallSite, symbol: &'static str, cx: &Cx) -> TranslateResult {
    let (Some(receiver), Some(other)) = (call.receiver(), call.arg(0)) else {
        return Ok(None);
    };
    let ty = call.result_type.clone();
    let expr = match cx.store_of(receiver) {
        Some(store) if !matches!(ty, Type::Bool) => {
            binary_store(symbol, receiver.clone(), other.clone(), ty, store)
        }
        _ => binary(symbol, receiver.clone(), other.clone(), ty),
    };
    Ok(Some(expr_ref(expr)))
}

impl MethodTranslator for RangeTranslator {
    fn translate(&self, call: &CallSite, cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        let Some(receiver) = call.receiver() else {
            return Ok(None);
        };
        if !matches!(receiver.borrow().result_type(), Type::Range(_)) {
            return Ok(None);
        }

        // predicates first; both element and range arguments go through the
        // same containment operator
        let symbol = match call.operation {
            M::RangeContains => Some("@>"),
            M::RangeContainedBy => Some("<@"),
            M::RangeOverlaps => Some("&&"),
            M::RangeIsStrictlyLeftOf => Some("<<"),
            M::RangeIsStrictlyRightOf => Some(">>"),
            // &< is "does not extend to the right of", &> the mirror
            M::RangeDoesNotExtendRightOf => Some("&<"),
            M::RangeDoesNotExtendLeftOf => Some("&>"),
            M::RangeIsAdjacentTo => Some("-|-"),
            _ => None,
        };
        if let Some(symbol) = symbol {
            let Some(other) = call.arg(0) else {
                return Ok(None);
            };
            return Ok(Some(expr_ref(comparison(
                symbol,
                receiver.clone(),
                other.clone(),
            ))));
        }

        match call.operation {
            M::RangeUnion => range_binary(call, "+", cx),
            M::RangeIntersect => range_binary(call, "*", cx),
            M::RangeExcept => range_binary(call, "-", cx),
            M::RangeMerge => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                Ok(Some(expr_ref(func(
                    "range_merge",
                    vec![receiver.clone(), other.clone()],
                    call.result_type.clone(),
                ))))
            }
            _ => Ok(None),
        }
    }
}

impl MemberTranslator for RangeTranslator {
    fn translate(&self, site: &MemberSite, _cx: &Cx) -> TranslateResult {
        use MemberOp as P;

        let receiver_type = site.receiver.borrow().result_type().clone();
        let Type::Range(elem) = receiver_type else {
            return Ok(None);
        };

        let bound = |name: &str| -> ExprRef {
            expr_ref(func(name, vec![site.receiver.clone()], (*elem).clone()))
        };
        let flag = |name: &str| -> ExprRef {
            expr_ref(func(name, vec![site.receiver.clone()], Type::Bool))
        };

        // lower()/upper() are NULL for unbounded or empty ranges; the flag
        // accessors are total
        let out = match site.operation {
            P::RangeLower => bound("lower"),
            P::RangeUpper => bound("upper"),
            P::RangeIsEmpty => flag("isempty"),
            P::RangeLowerInclusive => flag("lower_inc"),
            P::RangeUpperInclusive => flag("upper_inc"),
            P::RangeLowerInfinite => flag("lower_inf"),
            P::RangeUpperInfinite => flag("upper_inf"),
            _ => return Ok(None),
        };
        Ok(Some(out))
    }
}
