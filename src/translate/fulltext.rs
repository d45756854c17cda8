use super::{Cx, MemberTranslator, MethodTranslator};
use crate::{
    call_site::{CallSite, MemberSite},
    error::TranslateResult,
    expr::{ExprRef, SqlExpr, Type, UnaryOp, binary_store, comparison, expr_ref, func, func_store},
    ops::{MemberOp, MethodOp},
    store::StoreType,
};

/// Lowers full-text search vectors and queries.
pub struct FullTextTranslator;

/// The parser functions take an optional leading configuration argument;
/// when present it arrives first and the text to parse second.
fn parser(name: &str, call: &CallSite, ty: Type, store: StoreType) -> TranslateResult {
    let args: Vec<ExprRef> = call.arguments.iter().cloned().collect();
    if args.is_empty() || args.len() > 2 {
        return Ok(None);
    }
    if !args[args.len() - 1].borrow().result_type().is_text() {
        return Ok(None);
    }
    Ok(Some(expr_ref(func_store(name, args, ty, store))))
}

impl MethodTranslator for FullTextTranslator {
    fn translate(&self, call: &CallSite, cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        // parser entry points have no receiver
        match call.operation {
            M::ToTsVector => {
                return parser("to_tsvector", call, Type::TsVector, StoreType::TsVector);
            }
            M::ToTsQuery => return parser("to_tsquery", call, Type::TsQuery, StoreType::TsQuery),
            M::PlainToTsQuery => {
                return parser("plainto_tsquery", call, Type::TsQuery, StoreType::TsQuery);
            }
            M::PhraseToTsQuery => {
                return parser("phraseto_tsquery", call, Type::TsQuery, StoreType::TsQuery);
            }
            M::WebSearchToTsQuery => {
                cx.version.require(11, 0, "websearch_to_tsquery")?;
                return parser(
                    "websearch_to_tsquery",
                    call,
                    Type::TsQuery,
                    StoreType::TsQuery,
                );
            }
            _ => {}
        }

        let Some(receiver) = call.receiver() else {
            return Ok(None);
        };
        let receiver_type = receiver.borrow().result_type().clone();

        if receiver_type == Type::TsVector {
            let out = match call.operation {
                M::TsMatches => {
                    let Some(query) = call.arg(0) else {
                        return Ok(None);
                    };
                    comparison("@@", receiver.clone(), query.clone())
                }
                M::TsConcat => {
                    let Some(other) = call.arg(0) else {
                        return Ok(None);
                    };
                    binary_store(
                        "||",
                        receiver.clone(),
                        other.clone(),
                        Type::TsVector,
                        StoreType::TsVector,
                    )
                }
                M::TsRank | M::TsRankCd => {
                    let Some(query) = call.arg(0) else {
                        return Ok(None);
                    };
                    let name = if call.operation == M::TsRank {
                        "ts_rank"
                    } else {
                        "ts_rank_cd"
                    };
                    let mut args = vec![receiver.clone(), query.clone()];
                    if let Some(normalization) = call.arg(1) {
                        args.push(normalization.clone());
                    }
                    func(name, args, Type::Real)
                }
                M::TsSetWeight => {
                    let Some(weight) = call.arg(0) else {
                        return Ok(None);
                    };
                    func_store(
                        "setweight",
                        vec![receiver.clone(), weight.clone()],
                        Type::TsVector,
                        StoreType::TsVector,
                    )
                }
                M::TsDelete => {
                    let Some(lexeme) = call.arg(0) else {
                        return Ok(None);
                    };
                    func_store(
                        "ts_delete",
                        vec![receiver.clone(), lexeme.clone()],
                        Type::TsVector,
                        StoreType::TsVector,
                    )
                }
                _ => return Ok(None),
            };
            return Ok(Some(expr_ref(out)));
        }

        if receiver_type != Type::TsQuery {
            return Ok(None);
        }

        let out = match call.operation {
            // query.Matches(document) keeps the vector on the left
            M::TsMatches => {
                let Some(vector) = call.arg(0) else {
                    return Ok(None);
                };
                comparison("@@", vector.clone(), receiver.clone())
            }
            M::TsQueryAnd | M::TsQueryOr => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                let symbol = if call.operation == M::TsQueryAnd {
                    "&&"
                } else {
                    "||"
                };
                binary_store(
                    symbol,
                    receiver.clone(),
                    other.clone(),
                    Type::TsQuery,
                    StoreType::TsQuery,
                )
            }
            M::TsQueryNot => SqlExpr::UnaryOp {
                op: UnaryOp::TsNegate,
                operand: receiver.clone(),
                ty: Type::TsQuery,
            },
            M::TsQueryContains => {
                let Some(other) = call.arg(0) else {
                    return Ok(None);
                };
                comparison("@>", receiver.clone(), other.clone())
            }
            M::TsRewrite => {
                let (Some(target), Some(substitute)) = (call.arg(0), call.arg(1)) else {
                    return Ok(None);
                };
                func_store(
                    "ts_rewrite",
                    vec![receiver.clone(), target.clone(), substitute.clone()],
                    Type::TsQuery,
                    StoreType::TsQuery,
                )
            }
            M::TsHeadline => {
                let Some(document) = call.arg(0) else {
                    return Ok(None);
                };
                if !document.borrow().result_type().is_text() {
                    return Ok(None);
                }
                let mut args = vec![document.clone(), receiver.clone()];
                if let Some(options) = call.arg(1) {
                    args.push(options.clone());
                }
                func("ts_headline", args, Type::Text)
            }
            _ => return Ok(None),
        };
        Ok(Some(expr_ref(out)))
    }
}

impl MemberTranslator for FullTextTranslator {
    fn translate(&self, site: &MemberSite, _cx: &Cx) -> TranslateResult {
        if site.operation != MemberOp::TsVectorLength
            || *site.receiver.borrow().result_type() != Type::TsVector
        {
            return Ok(None);
        }
        Ok(Some(expr_ref(func(
            "length",
            vec![site.receiver.clone()],
            Type::Int32,
        ))))
    }
}
