use super::{Cx, MethodTranslator};
use crate::{
    call_site::CallSite,
    error::TranslateResult,
    expr::{SqlExpr, Type, UnaryOp, binary, comparison, expr_ref, func},
    ops::MethodOp,
};

/// Lowers operations on inet/cidr/macaddr values.
pub struct NetworkTranslator;

fn is_network(ty: &Type) -> bool {
    matches!(ty, Type::Inet | Type::Cidr | Type::MacAddr | Type::MacAddr8)
}

impl MethodTranslator for NetworkTranslator {
    fn translate(&self, call: &CallSite, cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        let Some(receiver) = call.receiver() else {
            return Ok(None);
        };
        let receiver_type = receiver.borrow().result_type().clone();
        if !is_network(&receiver_type) {
            return Ok(None);
        }

        let predicate = match call.operation {
            M::NetContains => Some(">>"),
            M::NetContainsOrEquals => Some(">>="),
            M::NetContainedBy => Some("<<"),
            M::NetContainedByOrEquals => Some("<<="),
            M::NetOverlaps => Some("&&"),
            _ => None,
        };
        if let Some(symbol) = predicate {
            let Some(other) = call.arg(0) else {
                return Ok(None);
            };
            return Ok(Some(expr_ref(comparison(
                symbol,
                receiver.clone(),
                other.clone(),
            ))));
        }

        let out = match call.operation {
            M::NetAnd | M::NetOr => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                let symbol = if call.operation == M::NetAnd { "&" } else { "|" };
                binary(symbol, receiver.clone(), other.clone(), receiver_type)
            }
            M::NetNot => SqlExpr::UnaryOp {
                op: UnaryOp::BitwiseNot,
                operand: receiver.clone(),
                ty: receiver_type,
            },
            M::NetAdd | M::NetSubtract => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                let symbol = if call.operation == M::NetAdd { "+" } else { "-" };
                // address - address yields the element distance, not an address
                let ty = if call.operation == M::NetSubtract
                    && is_network(other.borrow().result_type())
                {
                    Type::Int64
                } else {
                    receiver_type
                };
                binary(symbol, receiver.clone(), other.clone(), ty)
            }
            M::NetAbbrev => func("abbrev", vec![receiver.clone()], Type::Text),
            M::NetBroadcast => func("broadcast", vec![receiver.clone()], Type::Inet),
            M::NetFamily => func("family", vec![receiver.clone()], Type::Int32),
            M::NetHost => func("host", vec![receiver.clone()], Type::Text),
            M::NetMaskLen => func("masklen", vec![receiver.clone()], Type::Int32),
            M::NetNetmask => func("netmask", vec![receiver.clone()], Type::Inet),
            M::NetNetwork => func("network", vec![receiver.clone()], Type::Cidr),
            M::NetSetMaskLen => {
                let Some(len) = call.arg(0) else {
                    return Ok(None);
                };
                func(
                    "set_masklen",
                    vec![receiver.clone(), len.clone()],
                    receiver_type,
                )
            }
            M::NetText => func("text", vec![receiver.clone()], Type::Text),
            M::NetSameFamily => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                func(
                    "inet_same_family",
                    vec![receiver.clone(), other.clone()],
                    Type::Bool,
                )
            }
            M::NetMerge => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                func(
                    "inet_merge",
                    vec![receiver.clone(), other.clone()],
                    Type::Cidr,
                )
            }
            M::MacTruncate => func("trunc", vec![receiver.clone()], receiver_type),
            M::Mac8Set7Bit => {
                cx.version.require(10, 0, "macaddr8_set7bit")?;
                func("macaddr8_set7bit", vec![receiver.clone()], Type::MacAddr8)
            }
            _ => return Ok(None),
        };
        Ok(Some(expr_ref(out)))
    }
}
