//! Dictionary and document lowering.
//!
//! One source-level surface, three physical store types: the ordered
//! key/value store ("hstore"), the text document ("json") and the binary
//! document ("jsonb"). Binary operations coerce both operands onto a common
//! store before picking an operator; path access folds into a single
//! multi-step [`Traversal`](crate::expr::SqlExpr::Traversal) node.

use super::{Cx, MemberTranslator, MethodTranslator};
use crate::{
    call_site::{CallSite, MemberSite},
    error::TranslateResult,
    expr::{
        ExprRef, SqlExpr, Type, binary_store, cast_store, comparison, expr_ref, func, func_store,
        int, text,
    },
    ops::{MemberOp, MethodOp},
    store::StoreType,
};

pub struct JsonTranslator;

fn doc_store(cx: &Cx, expr: &ExprRef) -> Option<StoreType> {
    if !expr.borrow().result_type().is_document_like() {
        return None;
    }
    cx.store_of(expr).filter(StoreType::is_document_like)
}

/// The common store two document-like operands meet on. Fixed preference:
/// identical stores stay put, anything mixed lands on the binary document
/// type. Symmetric in argument order by construction.
fn common_store(a: &StoreType, b: &StoreType) -> StoreType {
    if a == b {
        a.clone()
    } else {
        StoreType::Jsonb
    }
}

/// Rewrites `expr` from its current store onto `target`. The key/value
/// store converts through its dedicated conversion functions; the text
/// document converts through an explicit cast. Identity when already there.
fn coerce(expr: &ExprRef, from: &StoreType, target: &StoreType) -> ExprRef {
    if from == target {
        return expr.clone();
    }
    match (from, target) {
        (StoreType::Hstore, StoreType::Jsonb) => expr_ref(func_store(
            "hstore_to_jsonb",
            vec![expr.clone()],
            Type::Document,
            StoreType::Jsonb,
        )),
        (StoreType::Hstore, StoreType::Json) => expr_ref(func_store(
            "hstore_to_json",
            vec![expr.clone()],
            Type::Document,
            StoreType::Json,
        )),
        (StoreType::Json, _) => expr_ref(cast_store(
            expr.clone(),
            Type::Document,
            target.clone(),
        )),
        _ => expr.clone(),
    }
}

/// Coerces both sides onto their common store. `None` when either side is
/// not document-like at all.
fn coerce_pair(cx: &Cx, a: &ExprRef, b: &ExprRef) -> Option<(ExprRef, ExprRef, StoreType)> {
    let sa = doc_store(cx, a)?;
    let sb = doc_store(cx, b)?;
    let target = common_store(&sa, &sb);
    Some((coerce(a, &sa, &target), coerce(b, &sb, &target), target))
}

/// For key-existence operators the receiver must not sit on the text
/// document store (the operators only exist for jsonb/hstore).
fn keyed_receiver(cx: &Cx, receiver: &ExprRef) -> Option<(ExprRef, StoreType)> {
    let store = doc_store(cx, receiver)?;
    match store {
        StoreType::Json => {
            let converted = coerce(receiver, &StoreType::Json, &StoreType::Jsonb);
            Some((converted, StoreType::Jsonb))
        }
        other => Some((receiver.clone(), other)),
    }
}

/// Scalar reads out of a document come back as text; the cast restores the
/// declared domain type. Text targets need no cast at all.
fn retype_terminal(traversal: SqlExpr, target: &Type) -> SqlExpr {
    if target.is_text() {
        return traversal;
    }
    let store = StoreType::named(target.dialect_name());
    cast_store(expr_ref(traversal), target.clone(), store)
}

/// Appends one path step onto a document value, folding onto an existing
/// traversal rather than nesting a new one. The `returns_text` flag and the
/// terminal cast are decided by the declared result type: document-typed
/// results are intermediate steps, anything else is a terminal scalar read.
fn traverse(receiver: &ExprRef, key: ExprRef, result_type: &Type, store: StoreType) -> SqlExpr {
    let (root, mut path) = match &*receiver.borrow() {
        SqlExpr::Traversal { root, path, .. } => (root.clone(), path.clone()),
        _ => (receiver.clone(), Vec::new()),
    };
    path.push(key);

    if result_type.is_document_like() {
        return SqlExpr::Traversal {
            root,
            path,
            returns_text: false,
            ty: result_type.clone(),
            store: Some(store),
        };
    }

    let traversal = SqlExpr::Traversal {
        root,
        path,
        returns_text: true,
        ty: Type::Text,
        store: Some(store),
    };
    retype_terminal(traversal, result_type)
}

impl MethodTranslator for JsonTranslator {
    fn translate(&self, call: &CallSite, cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        let Some(receiver) = call.receiver() else {
            return Ok(None);
        };
        let Some(store) = doc_store(cx, receiver) else {
            return Ok(None);
        };

        let expr = match call.operation {
            M::DictContainsKey => {
                let Some(key) = call.arg(0) else {
                    return Ok(None);
                };
                let Some((lhs, _)) = keyed_receiver(cx, receiver) else {
                    return Ok(None);
                };
                comparison("?", lhs, key.clone())
            }
            M::DictContainsAllKeys => {
                let Some(keys) = call.arg(0) else {
                    return Ok(None);
                };
                let Some((lhs, _)) = keyed_receiver(cx, receiver) else {
                    return Ok(None);
                };
                comparison("?&", lhs, keys.clone())
            }
            M::DictContainsAnyKeys => {
                let Some(keys) = call.arg(0) else {
                    return Ok(None);
                };
                let Some((lhs, _)) = keyed_receiver(cx, receiver) else {
                    return Ok(None);
                };
                comparison("?|", lhs, keys.clone())
            }
            M::DictContainsDoc | M::DictContainedByDoc => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                let Some((lhs, rhs, _)) = coerce_pair(cx, receiver, other) else {
                    return Ok(None);
                };
                let symbol = if call.operation == M::DictContainsDoc {
                    "@>"
                } else {
                    "<@"
                };
                comparison(symbol, lhs, rhs)
            }
            M::DictGet => {
                let Some(key) = call.arg(0) else {
                    return Ok(None);
                };
                match store.clone() {
                    // the key/value store is flat: a single binary operator,
                    // values are always text
                    StoreType::Hstore => binary_store(
                        "->",
                        receiver.clone(),
                        key.clone(),
                        Type::Text,
                        StoreType::Hstore,
                    ),
                    store => traverse(receiver, key.clone(), &call.result_type, store),
                }
            }
            M::DictRemove => {
                let Some(key) = call.arg(0) else {
                    return Ok(None);
                };
                let Some((lhs, store)) = keyed_receiver(cx, receiver) else {
                    return Ok(None);
                };
                binary_store(
                    "-",
                    lhs,
                    key.clone(),
                    receiver.borrow().result_type().clone(),
                    store,
                )
            }
            M::DictSlice => {
                let Some(keys) = call.arg(0) else {
                    return Ok(None);
                };
                // slice() only exists for the key/value store
                match store {
                    StoreType::Hstore => func_store(
                        "slice",
                        vec![receiver.clone(), keys.clone()],
                        Type::Dictionary,
                        StoreType::Hstore,
                    ),
                    _ => return Ok(None),
                }
            }
            M::DictConcat => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                let Some((lhs, rhs, store)) = coerce_pair(cx, receiver, other) else {
                    return Ok(None);
                };
                binary_store("||", lhs, rhs, call.result_type.clone(), store)
            }
            M::DictSubtract => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                let Some((lhs, rhs, store)) = coerce_pair(cx, receiver, other) else {
                    return Ok(None);
                };
                binary_store("-", lhs, rhs, call.result_type.clone(), store)
            }
            M::DictEquals => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                let Some((lhs, rhs, _)) = coerce_pair(cx, receiver, other) else {
                    return Ok(None);
                };
                comparison("=", lhs, rhs)
            }
            M::DictToJson => match store {
                StoreType::Hstore => func_store(
                    "hstore_to_json",
                    vec![receiver.clone()],
                    Type::Document,
                    StoreType::Json,
                ),
                _ => return Ok(None),
            },
            M::DictToJsonb => match store {
                StoreType::Hstore => func_store(
                    "hstore_to_jsonb",
                    vec![receiver.clone()],
                    Type::Document,
                    StoreType::Jsonb,
                ),
                _ => return Ok(None),
            },
            M::JsonTypeof => match store {
                StoreType::Jsonb => func("jsonb_typeof", vec![receiver.clone()], Type::Text),
                StoreType::Json => func("json_typeof", vec![receiver.clone()], Type::Text),
                _ => return Ok(None),
            },
            M::JsonArrayLength => match store {
                StoreType::Jsonb => {
                    func("jsonb_array_length", vec![receiver.clone()], Type::Int32)
                }
                StoreType::Json => func("json_array_length", vec![receiver.clone()], Type::Int32),
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(expr_ref(expr)))
    }
}

impl MemberTranslator for JsonTranslator {
    fn translate(&self, site: &MemberSite, cx: &Cx) -> TranslateResult {
        use MemberOp as P;

        let Some(store) = doc_store(cx, &site.receiver) else {
            return Ok(None);
        };

        let expr = match (&site.operation, &store) {
            // document property access: same folding and terminal re-typing
            // as the indexer form
            (P::DocMember(name), StoreType::Json | StoreType::Jsonb) => traverse(
                &site.receiver,
                expr_ref(text(name.clone())),
                &site.result_type,
                store.clone(),
            ),
            (P::DocMember(name), StoreType::Hstore) => binary_store(
                "->",
                site.receiver.clone(),
                expr_ref(text(name.clone())),
                Type::Text,
                StoreType::Hstore,
            ),

            // the key/value store has cheap array accessors; the document
            // stores have no scalar equivalents worth committing to, so we
            // decline and leave those to the host
            (P::DictCount, StoreType::Hstore) => func(
                "cardinality",
                vec![expr_ref(func(
                    "akeys",
                    vec![site.receiver.clone()],
                    Type::array_of(Type::Text),
                ))],
                Type::Int32,
            ),
            (P::DictKeys, StoreType::Hstore) => func(
                "akeys",
                vec![site.receiver.clone()],
                Type::array_of(Type::Text),
            ),
            (P::DictValues, StoreType::Hstore) => func(
                "avals",
                vec![site.receiver.clone()],
                Type::array_of(Type::Text),
            ),
            (P::DictIsEmpty, StoreType::Hstore) => comparison(
                "=",
                expr_ref(func(
                    "cardinality",
                    vec![expr_ref(func(
                        "akeys",
                        vec![site.receiver.clone()],
                        Type::array_of(Type::Text),
                    ))],
                    Type::Int32,
                )),
                expr_ref(int(0)),
            ),
            _ => return Ok(None),
        };
        Ok(Some(expr_ref(expr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        expr::{column_store, parameter},
        store::DefaultTypeMapper,
        version::VersionGate,
    };

    fn cx() -> Cx<'static> {
        Cx {
            types: &DefaultTypeMapper,
            version: VersionGate::any(),
        }
    }

    fn jsonb_column(name: &str) -> ExprRef {
        expr_ref(column_store(name, Type::Document, StoreType::Jsonb))
    }

    fn hstore_column(name: &str) -> ExprRef {
        expr_ref(column_store(name, Type::Dictionary, StoreType::Hstore))
    }

    fn json_column(name: &str) -> ExprRef {
        expr_ref(column_store(name, Type::Document, StoreType::Json))
    }

    fn member(receiver: ExprRef, name: &str, result_type: Type) -> MemberSite {
        MemberSite {
            receiver,
            operation: MemberOp::DocMember(name.into()),
            result_type,
        }
    }

    #[test]
    fn successive_accesses_fold_into_one_traversal() {
        let root = jsonb_column("doc");
        let first = crate::translate::MemberTranslator::translate(&JsonTranslator, &member(root, "customer", Type::Document), &cx())
            .unwrap()
            .unwrap();
        let second = crate::translate::MemberTranslator::translate(&JsonTranslator, &member(first, "address", Type::Document), &cx())
            .unwrap()
            .unwrap();
        let third = crate::translate::MemberTranslator::translate(&JsonTranslator, &member(second, "city", Type::Text), &cx())
            .unwrap()
            .unwrap();
        match &*third.borrow() {
            SqlExpr::Traversal {
                path, returns_text, ..
            } => {
                assert_eq!(path.len(), 3);
                assert!(*returns_text);
            }
            other => panic!("expected one folded Traversal, got {other:?}"),
        }
    }

    #[test]
    fn terminal_scalar_read_is_cast_to_target_type() {
        let root = jsonb_column("doc");
        let out = crate::translate::MemberTranslator::translate(&JsonTranslator, &member(root, "age", Type::Int32), &cx())
            .unwrap()
            .unwrap();
        match &*out.borrow() {
            SqlExpr::Cast { inner, ty, .. } => {
                assert_eq!(*ty, Type::Int32);
                match &*inner.borrow() {
                    SqlExpr::Traversal { returns_text, .. } => assert!(*returns_text),
                    other => panic!("expected Traversal under cast, got {other:?}"),
                }
            }
            other => panic!("expected Cast of text read, got {other:?}"),
        }
    }

    #[test]
    fn terminal_text_read_needs_no_cast() {
        let root = jsonb_column("doc");
        let out = crate::translate::MemberTranslator::translate(&JsonTranslator, &member(root, "name", Type::Text), &cx())
            .unwrap()
            .unwrap();
        assert!(matches!(&*out.borrow(), SqlExpr::Traversal { .. }));
    }

    #[test]
    fn coercion_is_symmetric_in_argument_order() {
        let a = hstore_column("a");
        let b = json_column("b");

        let lr = coerce_pair(&cx(), &a, &b).unwrap().2;
        let rl = coerce_pair(&cx(), &b, &a).unwrap().2;
        assert_eq!(lr, rl);
        assert_eq!(lr, StoreType::Jsonb);
    }

    #[test]
    fn same_store_pairs_stay_put() {
        let a = hstore_column("a");
        let b = hstore_column("b");
        let (lhs, _, store) = coerce_pair(&cx(), &a, &b).unwrap();
        assert_eq!(store, StoreType::Hstore);
        // no conversion wrapper on either side
        assert!(matches!(&*lhs.borrow(), SqlExpr::Column { .. }));
    }

    #[test]
    fn json_receiver_converts_before_key_operator() {
        let call = CallSite {
            receiver: Some(json_column("doc")),
            operation: MethodOp::DictContainsKey,
            arguments: vec![expr_ref(text("k"))],
            result_type: Type::Bool,
        };
        let out = crate::translate::MethodTranslator::translate(&JsonTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp {
                symbol: "?", left, ..
            } => {
                assert!(matches!(&*left.borrow(), SqlExpr::Cast { .. }));
            }
            other => panic!("expected ? over cast receiver, got {other:?}"),
        }
    }

    #[test]
    fn hstore_indexer_is_flat_arrow() {
        let call = CallSite {
            receiver: Some(hstore_column("attrs")),
            operation: MethodOp::DictGet,
            arguments: vec![expr_ref(text("color"))],
            result_type: Type::Text,
        };
        let out = crate::translate::MethodTranslator::translate(&JsonTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp { symbol, ty, .. } => {
                assert_eq!(*symbol, "->");
                assert_eq!(*ty, Type::Text);
            }
            other => panic!("expected -> on hstore, got {other:?}"),
        }
    }

    #[test]
    fn hstore_count_goes_through_akeys() {
        let site = MemberSite {
            receiver: hstore_column("attrs"),
            operation: MemberOp::DictCount,
            result_type: Type::Int32,
        };
        let out = crate::translate::MemberTranslator::translate(&JsonTranslator, &site, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::FunctionCall { name, args, .. } => {
                assert_eq!(name, "cardinality");
                match &*args[0].borrow() {
                    SqlExpr::FunctionCall { name, .. } => assert_eq!(name, "akeys"),
                    other => panic!("expected akeys, got {other:?}"),
                }
            }
            other => panic!("expected cardinality(akeys(..)), got {other:?}"),
        }
    }

    #[test]
    fn document_containment_coerces_before_comparing() {
        let call = CallSite {
            receiver: Some(json_column("doc")),
            operation: MethodOp::DictContainsDoc,
            arguments: vec![jsonb_column("probe")],
            result_type: Type::Bool,
        };
        let out = crate::translate::MethodTranslator::translate(&JsonTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp {
                symbol: "@>", left, ..
            } => {
                // the json side converts onto the binary store
                assert!(matches!(&*left.borrow(), SqlExpr::Cast { .. }));
            }
            other => panic!("expected @> after coercion, got {other:?}"),
        }
    }

    #[test]
    fn jsonb_count_declines() {
        let site = MemberSite {
            receiver: jsonb_column("doc"),
            operation: MemberOp::DictCount,
            result_type: Type::Int32,
        };
        assert!(crate::translate::MemberTranslator::translate(&JsonTranslator, &site, &cx()).unwrap().is_none());
    }

    // keys/values only exist as set-returning functions for the document
    // stores, which the expression model cannot represent
    #[test]
    fn document_keys_and_values_decline() {
        for op in [MemberOp::DictKeys, MemberOp::DictValues] {
            let site = MemberSite {
                receiver: jsonb_column("doc"),
                operation: op,
                result_type: Type::array_of(Type::Text),
            };
            assert!(crate::translate::MemberTranslator::translate(&JsonTranslator, &site, &cx()).unwrap().is_none());
        }
    }

    #[test]
    fn non_document_receiver_declines() {
        let call = CallSite {
            receiver: Some(expr_ref(parameter("p", Type::Int32))),
            operation: MethodOp::DictContainsKey,
            arguments: vec![expr_ref(text("k"))],
            result_type: Type::Bool,
        };
        assert!(crate::translate::MethodTranslator::translate(&JsonTranslator, &call, &cx()).unwrap().is_none());
    }
}
