use super::{Cx, MemberTranslator, MethodTranslator};
use crate::{
    call_site::{CallSite, MemberSite},
    error::TranslateResult,
    expr::{ExprRef, SqlExpr, Type, binary_store, comparison, expr_ref, func, func_store},
    ops::{MemberOp, MethodOp},
    store::StoreType,
};

/// Lowers hierarchical label-path operations, including the rewrites that
/// turn a predicate over an ltree array into the extension's array-level
/// operators.
pub struct LTreeTranslator;

/// A lambda body recognized by the array rewrites, normalized so the
/// non-parameter operand sits on the right of an array-level operator.
struct ArrayPattern {
    /// Operator with the array on the left (`@>`, `<@`, `~`, `@`).
    any_symbol: &'static str,
    /// First-match flavor of the same test (`?@>`, `?<@`, `?~`, `?@`).
    first_symbol: &'static str,
    operand: ExprRef,
}

/// Matches a lambda body of the shape `param <op> x` or `x <op> param`
/// where the other side does not itself mention the parameter. Anything
/// else is not expressible at the array level and the rewrite declines.
fn recognize_pattern(body: &ExprRef) -> Option<ArrayPattern> {
    let borrowed = body.borrow();
    let SqlExpr::BinaryOp {
        symbol,
        left,
        right,
        ..
    } = &*borrowed
    else {
        return None;
    };
    let (param_on_left, operand) = if left.borrow().is_lambda_param() {
        (true, right)
    } else if right.borrow().is_lambda_param() {
        (false, left)
    } else {
        return None;
    };
    if operand.borrow().mentions_lambda_param() {
        return None;
    }

    // normalize: "some entry is an ancestor of x" is `array @> x`
    // regardless of which side of the comparison the entry appeared on
    let (any_symbol, first_symbol) = match (*symbol, param_on_left) {
        ("@>", true) | ("<@", false) => ("@>", "?@>"),
        ("<@", true) | ("@>", false) => ("<@", "?<@"),
        ("~", _) => ("~", "?~"),
        ("@", _) => ("@", "?@"),
        _ => return None,
    };
    Some(ArrayPattern {
        any_symbol,
        first_symbol,
        operand: operand.clone(),
    })
}

fn is_ltree_array(ty: &Type) -> bool {
    matches!(ty.element(), Some(Type::LTree))
}

impl MethodTranslator for LTreeTranslator {
    fn translate(&self, call: &CallSite, _cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        let Some(receiver) = call.receiver() else {
            return Ok(None);
        };
        let receiver_type = receiver.borrow().result_type().clone();

        // array-level rewrites run before the arrays module gets a chance
        // to decline the lambda forms
        if is_ltree_array(&receiver_type) {
            let symbol = match call.operation {
                M::ArrayAnyMatch | M::ArrayFirstMatch => {
                    let Some(body) = call.arg(0) else {
                        return Ok(None);
                    };
                    let Some(pattern) = recognize_pattern(body) else {
                        return Ok(None);
                    };
                    let first = call.operation == M::ArrayFirstMatch;
                    if first {
                        return Ok(Some(expr_ref(binary_store(
                            pattern.first_symbol,
                            receiver.clone(),
                            pattern.operand,
                            Type::LTree,
                            StoreType::LTree,
                        ))));
                    }
                    return Ok(Some(expr_ref(comparison(
                        pattern.any_symbol,
                        receiver.clone(),
                        pattern.operand,
                    ))));
                }
                // a whole-array match against a single query
                M::LTreeMatchesLQuery => Some("~"),
                M::LTreeMatchesLTxtQuery => Some("@"),
                _ => None,
            };
            if let Some(symbol) = symbol {
                let Some(query) = call.arg(0) else {
                    return Ok(None);
                };
                return Ok(Some(expr_ref(comparison(
                    symbol,
                    receiver.clone(),
                    query.clone(),
                ))));
            }
            return Ok(None);
        }

        if receiver_type != Type::LTree {
            return Ok(None);
        }

        let symbol = match call.operation {
            M::LTreeIsAncestorOf => Some("@>"),
            M::LTreeIsDescendantOf => Some("<@"),
            M::LTreeMatchesLQuery => Some("~"),
            M::LTreeMatchesLTxtQuery => Some("@"),
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

        let path = |args: Vec<ExprRef>| func_store("subpath", args, Type::LTree, StoreType::LTree);
        let out = match call.operation {
            M::LTreeConcat => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                binary_store(
                    "||",
                    receiver.clone(),
                    other.clone(),
                    Type::LTree,
                    StoreType::LTree,
                )
            }
            M::LTreeSubtree => {
                let (Some(start), Some(end)) = (call.arg(0), call.arg(1)) else {
                    return Ok(None);
                };
                func_store(
                    "subltree",
                    vec![receiver.clone(), start.clone(), end.clone()],
                    Type::LTree,
                    StoreType::LTree,
                )
            }
            M::LTreeSubpath => {
                let Some(offset) = call.arg(0) else {
                    return Ok(None);
                };
                let mut args = vec![receiver.clone(), offset.clone()];
                if let Some(len) = call.arg(1) {
                    args.push(len.clone());
                }
                path(args)
            }
            // index() is already 0-based with a -1 miss sentinel, so the
            // source convention maps straight through
            M::LTreeIndex => {
                let Some(needle) = call.arg(0) else {
                    return Ok(None);
                };
                let mut args = vec![receiver.clone(), needle.clone()];
                if let Some(offset) = call.arg(1) {
                    args.push(offset.clone());
                }
                func("index", args, Type::Int32)
            }
            M::LTreeLca => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                func_store(
                    "lca",
                    vec![receiver.clone(), other.clone()],
                    Type::LTree,
                    StoreType::LTree,
                )
            }
            _ => return Ok(None),
        };
        Ok(Some(expr_ref(out)))
    }
}

impl MemberTranslator for LTreeTranslator {
    fn translate(&self, site: &MemberSite, _cx: &Cx) -> TranslateResult {
        if site.operation != MemberOp::LTreeLevels
            || *site.receiver.borrow().result_type() != Type::LTree
        {
            return Ok(None);
        }
        Ok(Some(expr_ref(func(
            "nlevel",
            vec![site.receiver.clone()],
            Type::Int32,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        expr::{column, comparison, int},
        store::DefaultTypeMapper,
        version::VersionGate,
    };

    fn cx() -> Cx<'static> {
        Cx {
            types: &DefaultTypeMapper,
            version: VersionGate::any(),
        }
    }

    fn ltree(name: &str) -> ExprRef {
        expr_ref(column(name, Type::LTree))
    }

    fn ltree_array(name: &str) -> ExprRef {
        expr_ref(column(name, Type::array_of(Type::LTree)))
    }

    fn lambda_param() -> ExprRef {
        expr_ref(SqlExpr::LambdaParam { ty: Type::LTree })
    }

    #[test]
    fn ancestry_predicates_map_to_containment() {
        let call = CallSite {
            receiver: Some(ltree("path")),
            operation: MethodOp::LTreeIsAncestorOf,
            arguments: vec![ltree("other")],
            result_type: Type::Bool,
        };
        let out = crate::translate::MethodTranslator::translate(&LTreeTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp { symbol, .. } => assert_eq!(*symbol, "@>"),
            other => panic!("expected containment, got {other:?}"),
        }
    }

    #[test]
    fn any_match_rewrites_to_array_operator() {
        // paths.Any(p => p.IsAncestorOf(target))
        let body = expr_ref(comparison("@>", lambda_param(), ltree("target")));
        let call = CallSite {
            receiver: Some(ltree_array("paths")),
            operation: MethodOp::ArrayAnyMatch,
            arguments: vec![body],
            result_type: Type::Bool,
        };
        let out = crate::translate::MethodTranslator::translate(&LTreeTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp { symbol, ty, .. } => {
                assert_eq!(*symbol, "@>");
                assert_eq!(*ty, Type::Bool);
            }
            other => panic!("expected array-level operator, got {other:?}"),
        }
    }

    #[test]
    fn flipped_comparison_normalizes_the_operator() {
        // paths.Any(p => target.IsAncestorOf(p)) means the array holds a
        // descendant, so the array side takes <@
        let body = expr_ref(comparison("@>", ltree("target"), lambda_param()));
        let call = CallSite {
            receiver: Some(ltree_array("paths")),
            operation: MethodOp::ArrayAnyMatch,
            arguments: vec![body],
            result_type: Type::Bool,
        };
        let out = crate::translate::MethodTranslator::translate(&LTreeTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp { symbol, .. } => assert_eq!(*symbol, "<@"),
            other => panic!("expected array-level operator, got {other:?}"),
        }
    }

    #[test]
    fn first_match_uses_the_question_operators_and_returns_a_path() {
        let body = expr_ref(comparison(
            "~",
            lambda_param(),
            expr_ref(column("q", Type::LQuery)),
        ));
        let call = CallSite {
            receiver: Some(ltree_array("paths")),
            operation: MethodOp::ArrayFirstMatch,
            arguments: vec![body],
            result_type: Type::LTree,
        };
        let out = crate::translate::MethodTranslator::translate(&LTreeTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp { symbol, ty, .. } => {
                assert_eq!(*symbol, "?~");
                assert_eq!(*ty, Type::LTree);
            }
            other => panic!("expected first-match operator, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_lambda_shapes_decline() {
        // p.Levels > 2 is not expressible at the array level
        let nlevel = expr_ref(func("nlevel", vec![lambda_param()], Type::Int32));
        let body = expr_ref(comparison(">", nlevel, expr_ref(int(2))));
        let call = CallSite {
            receiver: Some(ltree_array("paths")),
            operation: MethodOp::ArrayAnyMatch,
            arguments: vec![body],
            result_type: Type::Bool,
        };
        assert!(crate::translate::MethodTranslator::translate(&LTreeTranslator, &call, &cx()).unwrap().is_none());
    }

    #[test]
    fn param_on_both_sides_declines() {
        let body = expr_ref(comparison("@>", lambda_param(), lambda_param()));
        let call = CallSite {
            receiver: Some(ltree_array("paths")),
            operation: MethodOp::ArrayAnyMatch,
            arguments: vec![body],
            result_type: Type::Bool,
        };
        assert!(crate::translate::MethodTranslator::translate(&LTreeTranslator, &call, &cx()).unwrap().is_none());
    }

    #[test]
    fn subpath_accepts_optional_length() {
        let call = CallSite {
            receiver: Some(ltree("path")),
            operation: MethodOp::LTreeSubpath,
            arguments: vec![expr_ref(int(1)), expr_ref(int(2))],
            result_type: Type::LTree,
        };
        let out = crate::translate::MethodTranslator::translate(&LTreeTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::FunctionCall { name, args, .. } => {
                assert_eq!(name, "subpath");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected subpath, got {other:?}"),
        }
    }

    #[test]
    fn levels_member_maps_to_nlevel() {
        let site = MemberSite {
            receiver: ltree("path"),
            operation: MemberOp::LTreeLevels,
            result_type: Type::Int32,
        };
        let out = crate::translate::MemberTranslator::translate(&LTreeTranslator, &site, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::FunctionCall { name, .. } => assert_eq!(name, "nlevel"),
            other => panic!("expected nlevel, got {other:?}"),
        }
    }
}
