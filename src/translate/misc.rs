use super::{Cx, MethodTranslator};
use crate::{
    call_site::CallSite,
    error::TranslateResult,
    expr::{ExprRef, NullMask, SqlExpr, Type, cast, expr_ref, func_masked},
    ops::MethodOp,
};

/// Conditional helpers and numeric conversions that belong to no single
/// type domain. Registered first so the cheap exact matches run before the
/// domain modules.
pub struct MiscTranslator;

fn convert(operand: &ExprRef, target: Type) -> TranslateResult {
    if *operand.borrow().result_type() == target {
        return Ok(Some(operand.clone()));
    }
    Ok(Some(expr_ref(cast(operand.clone(), target))))
}

impl MethodTranslator for MiscTranslator {
    fn translate(&self, call: &CallSite, cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        match call.operation {
            // greatest/least skip NULL inputs rather than propagating them
            M::Greatest | M::Least => {
                if call.arguments.len() < 2 {
                    return Ok(None);
                }
                let name = if call.operation == M::Greatest {
                    "greatest"
                } else {
                    "least"
                };
                Ok(Some(expr_ref(func_masked(
                    name,
                    call.arguments.clone(),
                    NullMask::none(call.arguments.len()),
                    call.result_type.clone(),
                ))))
            }
            // only the first operand drives nullability
            M::NullIf => {
                let (Some(a), Some(b)) = (call.arg(0), call.arg(1)) else {
                    return Ok(None);
                };
                Ok(Some(expr_ref(func_masked(
                    "nullif",
                    vec![a.clone(), b.clone()],
                    NullMask::of([true, false]),
                    call.result_type.clone(),
                ))))
            }
            M::NewGuid => {
                // in-core generation arrived in 13; older backends get the
                // uuid-ossp spelling
                let name = if cx.version.at_least(13, 0) {
                    "gen_random_uuid"
                } else {
                    "uuid_generate_v4"
                };
                Ok(Some(expr_ref(SqlExpr::FunctionCall {
                    name: name.to_string(),
                    args: vec![],
                    nullable: false,
                    null_mask: NullMask::none(0),
                    ty: Type::Uuid,
                    store: None,
                })))
            }
            M::ConvertToInt16 => convert(require_arg(call, 0)?, Type::Int16),
            M::ConvertToInt32 => convert(require_arg(call, 0)?, Type::Int32),
            M::ConvertToInt64 => convert(require_arg(call, 0)?, Type::Int64),
            M::ConvertToDouble => convert(require_arg(call, 0)?, Type::Double),
            M::ConvertToDecimal => convert(require_arg(call, 0)?, Type::Decimal),
            M::ConvertToBool => convert(require_arg(call, 0)?, Type::Bool),
            M::ConvertToString => convert(require_arg(call, 0)?, Type::Text),
            M::ObjectToString => {
                let Some(receiver) = call.receiver() else {
                    return Ok(None);
                };
                // rendering bytea through cast gives the hex form, which is
                // not what callers mean; let the host handle it
                if *receiver.borrow().result_type() == Type::Bytes {
                    return Ok(None);
                }
                convert(receiver, Type::Text)
            }
            _ => Ok(None),
        }
    }
}

fn require_arg<'a>(call: &'a CallSite, index: usize) -> Result<&'a ExprRef, crate::error::Error> {
    call.arg(index).ok_or(crate::error::Error::IncorrectArgCount {
        operation: "conversion",
        expected: index + 1,
        got: call.arguments.len(),
    })
}
