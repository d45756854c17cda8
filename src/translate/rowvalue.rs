use super::{Cx, MethodTranslator};
use crate::{
    call_site::CallSite,
    error::{Error, TranslateResult},
    expr::{SqlExpr, comparison, expr_ref},
    ops::MethodOp,
};

/// Lowers row-value comparisons. Non-row operands decline, leaving the
/// host's generic comparison lowering to apply. Two rows of differing
/// widths can never compare, so that case fails hard.
pub struct RowValueTranslator;

impl MethodTranslator for RowValueTranslator {
    fn translate(&self, call: &CallSite, _cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        let symbol = match call.operation {
            M::RowGreaterThan => ">",
            M::RowLessThan => "<",
            M::RowGreaterThanOrEqual => ">=",
            M::RowLessThanOrEqual => "<=",
            M::RowEqual => "=",
            M::RowNotEqual => "<>",
            _ => return Ok(None),
        };

        let (Some(left), Some(right)) = (call.arg(0), call.arg(1)) else {
            return Err(Error::IncorrectArgCount {
                operation: "row comparison",
                expected: 2,
                got: call.arguments.len(),
            });
        };
        let widths = match (&*left.borrow(), &*right.borrow()) {
            (SqlExpr::RowValue { values: l, .. }, SqlExpr::RowValue { values: r, .. }) => {
                (l.len(), r.len())
            }
            _ => return Ok(None),
        };
        if widths.0 != widths.1 {
            return Err(Error::InvalidArgument {
                operation: "row comparison",
                index: 1,
                expected: "a row of the same width",
            });
        }

        Ok(Some(expr_ref(comparison(
            symbol,
            left.clone(),
            right.clone(),
        ))))
    }
}
