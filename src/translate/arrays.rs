use super::{Cx, MemberTranslator, MethodTranslator, one_based};
use crate::{
    call_site::{CallSite, MemberSite},
    error::TranslateResult,
    expr::{
        ExprRef, NullMask, SqlExpr, Type, binary, comparison, expr_ref, func, func_masked,
        int, is_not_null,
    },
    ops::{MemberOp, MethodOp},
};

/// Lowers array and list operations. The interesting decisions live in
/// `translate_contains` (three physical strategies) and in element
/// indexing (0-based to 1-based rebasing).
pub struct ArrayTranslator;

fn is_array(expr: &ExprRef) -> bool {
    matches!(expr.borrow().result_type(), Type::Array(_))
}

fn element_type(expr: &ExprRef) -> Type {
    expr.borrow()
        .result_type()
        .element()
        .cloned()
        .unwrap_or(Type::Unknown)
}

/// `array_position(a, item) IS NOT NULL`. The containment operator treats
/// NULL elements as unmatchable, array_position does not, so this is the
/// null-exact membership form.
fn position_probe(array: &ExprRef, item: &ExprRef) -> SqlExpr {
    is_not_null(expr_ref(func(
        "array_position",
        vec![array.clone(), item.clone()],
        Type::Int32,
    )))
}

impl ArrayTranslator {
    /// Membership has three physical strategies depending on what the array
    /// side is:
    ///
    /// - a column: the containment operator (`@>`), so a GIN index on the
    ///   column stays usable; a probed literal NULL falls back to the
    ///   position probe because `@>` can never match NULL elements;
    /// - a constant array: decline, the host's generic IN-list lowering is
    ///   simpler and already correct;
    /// - anything else (parameter, derived): `item = ANY (a)`, which keeps
    ///   indexes on the *scalar* side usable.
    fn translate_contains(&self, call: &CallSite) -> TranslateResult {
        let Some(array) = call.receiver() else {
            return Ok(None);
        };
        let Some(item) = call.arg(0) else {
            return Ok(None);
        };

        if item.borrow().is_null_constant() {
            return Ok(Some(expr_ref(position_probe(array, item))));
        }

        let strategy = {
            let a = array.borrow();
            if a.is_column() {
                Strategy::Containment
            } else if a.as_constant().is_some() {
                Strategy::Decline
            } else {
                Strategy::AnyMembership
            }
        };

        match strategy {
            Strategy::Containment => {
                let elem = element_type(array);
                let single = SqlExpr::NewArray {
                    values: vec![item.clone()],
                    ty: Type::array_of(elem),
                };
                Ok(Some(expr_ref(comparison(
                    "@>",
                    array.clone(),
                    expr_ref(single),
                ))))
            }
            Strategy::Decline => Ok(None),
            Strategy::AnyMembership => Ok(Some(expr_ref(comparison(
                "= ANY",
                item.clone(),
                array.clone(),
            )))),
        }
    }
}

enum Strategy {
    Containment,
    Decline,
    AnyMembership,
}

impl MethodTranslator for ArrayTranslator {
    fn translate(&self, call: &CallSite, _cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        // Fill is the one array operation without an array receiver.
        if call.operation == M::ArrayFill {
            let (Some(value), Some(length)) = (call.arg(0), call.arg(1)) else {
                return Ok(None);
            };
            let elem = value.borrow().result_type().clone();
            let dims = SqlExpr::NewArray {
                values: vec![length.clone()],
                ty: Type::array_of(Type::Int32),
            };
            return Ok(Some(expr_ref(func(
                "array_fill",
                vec![value.clone(), expr_ref(dims)],
                Type::array_of(elem),
            ))));
        }

        let Some(receiver) = call.receiver() else {
            return Ok(None);
        };
        if !is_array(receiver) {
            return Ok(None);
        }

        let expr = match call.operation {
            M::ArrayContains => return self.translate_contains(call),
            M::ArrayIndex => {
                let Some(index) = call.arg(0) else {
                    return Ok(None);
                };
                // subscripting folds onto an existing subscript chain the
                // same way document traversal does
                let elem = element_type(receiver);
                match &*receiver.borrow() {
                    SqlExpr::Traversal {
                        root,
                        path,
                        returns_text,
                        store,
                        ..
                    } => {
                        let mut path = path.clone();
                        path.push(one_based(index));
                        SqlExpr::Traversal {
                            root: root.clone(),
                            path,
                            returns_text: *returns_text,
                            ty: elem,
                            store: store.clone(),
                        }
                    }
                    _ => SqlExpr::Traversal {
                        root: receiver.clone(),
                        path: vec![one_based(index)],
                        returns_text: false,
                        ty: elem,
                        store: None,
                    },
                }
            }
            M::ArrayContainsArray => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                comparison("@>", receiver.clone(), other.clone())
            }
            M::ArrayOverlaps => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                comparison("&&", receiver.clone(), other.clone())
            }
            M::ArraySequenceEqual => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                comparison("=", receiver.clone(), other.clone())
            }
            M::ArrayAppend => {
                let Some(item) = call.arg(0) else {
                    return Ok(None);
                };
                func(
                    "array_append",
                    vec![receiver.clone(), item.clone()],
                    receiver.borrow().result_type().clone(),
                )
            }
            M::ArrayPrepend => {
                let Some(item) = call.arg(0) else {
                    return Ok(None);
                };
                // note the flipped argument order: the element comes first
                func(
                    "array_prepend",
                    vec![item.clone(), receiver.clone()],
                    receiver.borrow().result_type().clone(),
                )
            }
            M::ArrayConcat => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                binary(
                    "||",
                    receiver.clone(),
                    other.clone(),
                    receiver.borrow().result_type().clone(),
                )
            }
            M::ArrayIndexOf => {
                let Some(item) = call.arg(0) else {
                    return Ok(None);
                };
                // array_position yields NULL for "absent" and 1-based hits;
                // COALESCE to 0 then shift restores the 0-based/-1 contract
                let position = func(
                    "array_position",
                    vec![receiver.clone(), item.clone()],
                    Type::Int32,
                );
                let coalesced = func_masked(
                    "coalesce",
                    vec![expr_ref(position), expr_ref(int(0))],
                    NullMask::none(2),
                    Type::Int32,
                );
                binary("-", expr_ref(coalesced), expr_ref(int(1)), Type::Int32)
            }
            M::ArrayPositions => {
                let Some(item) = call.arg(0) else {
                    return Ok(None);
                };
                func(
                    "array_positions",
                    vec![receiver.clone(), item.clone()],
                    Type::array_of(Type::Int32),
                )
            }
            M::ArrayRemove => {
                let Some(item) = call.arg(0) else {
                    return Ok(None);
                };
                func(
                    "array_remove",
                    vec![receiver.clone(), item.clone()],
                    receiver.borrow().result_type().clone(),
                )
            }
            M::ArrayReplace => {
                let (Some(from), Some(to)) = (call.arg(0), call.arg(1)) else {
                    return Ok(None);
                };
                func(
                    "array_replace",
                    vec![receiver.clone(), from.clone(), to.clone()],
                    receiver.borrow().result_type().clone(),
                )
            }
            M::ArrayJoin => {
                let Some(separator) = call.arg(0) else {
                    return Ok(None);
                };
                func(
                    "array_to_string",
                    vec![receiver.clone(), separator.clone()],
                    Type::Text,
                )
            }
            // cardinality(a) > 0; NULL arrays yield NULL, which the host
            // must have coalesced away if the column is nullable
            M::ArrayAny => comparison(
                ">",
                expr_ref(func("cardinality", vec![receiver.clone()], Type::Int32)),
                expr_ref(int(0)),
            ),
            // predicate forms belong to pattern-level rewrites (label
            // paths); per-element expansion is the host's generic fallback
            M::ArrayAnyMatch | M::ArrayFirstMatch => return Ok(None),
            _ => return Ok(None),
        };
        Ok(Some(expr_ref(expr)))
    }
}

impl MemberTranslator for ArrayTranslator {
    fn translate(&self, site: &MemberSite, _cx: &Cx) -> TranslateResult {
        if site.operation != MemberOp::ArrayLength {
            return Ok(None);
        }
        if !is_array(&site.receiver) {
            return Ok(None);
        }
        Ok(Some(expr_ref(func(
            "cardinality",
            vec![site.receiver.clone()],
            Type::Int32,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        expr::{Value, column, constant, null, parameter, text},
        store::DefaultTypeMapper,
        version::VersionGate,
    };

    fn cx() -> Cx<'static> {
        Cx {
            types: &DefaultTypeMapper,
            version: VersionGate::any(),
        }
    }

    fn int_array_column() -> SqlExpr {
        column("tags", Type::array_of(Type::Int32))
    }

    fn method(op: MethodOp, receiver: SqlExpr, args: Vec<SqlExpr>) -> CallSite {
        CallSite {
            receiver: Some(expr_ref(receiver)),
            operation: op,
            arguments: args.into_iter().map(expr_ref).collect(),
            result_type: Type::Bool,
        }
    }

    #[test]
    fn literal_index_folds_to_one_based() {
        let call = method(MethodOp::ArrayIndex, int_array_column(), vec![int(2)]);
        let out = crate::translate::MethodTranslator::translate(&ArrayTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::Traversal { path, .. } => {
                assert_eq!(path.len(), 1);
                assert_eq!(path[0].borrow().as_constant().unwrap().as_int(), Some(3));
            }
            other => panic!("expected Traversal, got {other:?}"),
        }
    }

    #[test]
    fn runtime_index_becomes_addition_node() {
        let call = method(
            MethodOp::ArrayIndex,
            int_array_column(),
            vec![parameter("i", Type::Int32)],
        );
        let out = crate::translate::MethodTranslator::translate(&ArrayTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::Traversal { path, .. } => match &*path[0].borrow() {
                SqlExpr::BinaryOp {
                    symbol: "+", right, ..
                } => {
                    assert_eq!(right.borrow().as_constant().unwrap().as_int(), Some(1));
                }
                other => panic!("expected + 1 node, got {other:?}"),
            },
            other => panic!("expected Traversal, got {other:?}"),
        }
    }

    #[test]
    fn nested_indexing_extends_the_path() {
        let outer = method(MethodOp::ArrayIndex, int_array_column(), vec![int(0)]);
        let first = crate::translate::MethodTranslator::translate(&ArrayTranslator, &outer, &cx()).unwrap().unwrap();
        let inner = CallSite {
            receiver: Some(first),
            operation: MethodOp::ArrayIndex,
            arguments: vec![expr_ref(int(1))],
            result_type: Type::Int32,
        };
        let out = crate::translate::MethodTranslator::translate(&ArrayTranslator, &inner, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::Traversal { path, .. } => assert_eq!(path.len(), 2),
            other => panic!("expected folded Traversal, got {other:?}"),
        }
    }

    #[test]
    fn contains_on_column_uses_containment_operator() {
        let call = method(MethodOp::ArrayContains, int_array_column(), vec![int(7)]);
        let out = crate::translate::MethodTranslator::translate(&ArrayTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp {
                symbol: "@>",
                right,
                ..
            } => {
                assert!(matches!(&*right.borrow(), SqlExpr::NewArray { values, .. } if values.len() == 1));
            }
            other => panic!("expected @> against ARRAY[item], got {other:?}"),
        }
    }

    #[test]
    fn contains_null_literal_uses_position_probe() {
        let call = method(
            MethodOp::ArrayContains,
            int_array_column(),
            vec![null(Type::Int32)],
        );
        let out = crate::translate::MethodTranslator::translate(&ArrayTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::UnaryOp { op, operand, .. } => {
                assert_eq!(*op, crate::expr::UnaryOp::IsNotNull);
                match &*operand.borrow() {
                    SqlExpr::FunctionCall { name, .. } => assert_eq!(name, "array_position"),
                    other => panic!("expected array_position, got {other:?}"),
                }
            }
            other => panic!("expected IS NOT NULL probe, got {other:?}"),
        }
    }

    #[test]
    fn contains_on_literal_array_declines() {
        let literal = constant(
            Value::Array(vec![Value::Int(1), Value::Int(2)]),
            Type::array_of(Type::Int32),
        );
        let call = method(MethodOp::ArrayContains, literal, vec![int(1)]);
        assert!(crate::translate::MethodTranslator::translate(&ArrayTranslator, &call, &cx()).unwrap().is_none());
    }

    #[test]
    fn contains_on_parameter_uses_any_membership() {
        let call = method(
            MethodOp::ArrayContains,
            parameter("xs", Type::array_of(Type::Int32)),
            vec![int(1)],
        );
        let out = crate::translate::MethodTranslator::translate(&ArrayTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp { symbol, .. } => assert_eq!(*symbol, "= ANY"),
            other => panic!("expected = ANY membership, got {other:?}"),
        }
    }

    #[test]
    fn index_of_coalesces_then_rebases() {
        let call = method(MethodOp::ArrayIndexOf, int_array_column(), vec![int(7)]);
        let out = crate::translate::MethodTranslator::translate(&ArrayTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp {
                symbol: "-", left, ..
            } => match &*left.borrow() {
                SqlExpr::FunctionCall { name, .. } => assert_eq!(name, "coalesce"),
                other => panic!("expected coalesce, got {other:?}"),
            },
            other => panic!("expected rebasing subtraction, got {other:?}"),
        }
    }

    #[test]
    fn any_without_predicate_is_cardinality_check() {
        let call = method(MethodOp::ArrayAny, int_array_column(), vec![]);
        let out = crate::translate::MethodTranslator::translate(&ArrayTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp {
                symbol: ">", left, ..
            } => match &*left.borrow() {
                SqlExpr::FunctionCall { name, .. } => assert_eq!(name, "cardinality"),
                other => panic!("expected cardinality, got {other:?}"),
            },
            other => panic!("expected cardinality comparison, got {other:?}"),
        }
    }

    #[test]
    fn join_becomes_array_to_string() {
        let call = method(MethodOp::ArrayJoin, int_array_column(), vec![text(",")]);
        let out = crate::translate::MethodTranslator::translate(&ArrayTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::FunctionCall { name, .. } => assert_eq!(name, "array_to_string"),
            other => panic!("expected array_to_string, got {other:?}"),
        }
    }
}
