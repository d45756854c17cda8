use super::{Cx, MemberTranslator, MethodTranslator, one_based};
use crate::{
    call_site::{CallSite, MemberSite},
    error::TranslateResult,
    expr::{
        SqlExpr, Type, Value, and, binary, comparison, expr_ref, func, int, like, like_unescaped,
        text,
    },
    ops::{MemberOp, MethodOp},
};

/// Lowers string methods and members. Pattern-match operations pick between
/// a compiled-in LIKE pattern (constant patterns, sargable) and a two-part
/// pre-filter/post-filter plan (everything else); see `starts_or_ends_with`.
pub struct StringTranslator;

/// Doubles the LIKE metacharacters: `%`, `_` and the escape character
/// itself each get a leading backslash.
pub fn escape_like_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Clone, Copy)]
enum Anchor {
    Start,
    End,
}

/// StartsWith/EndsWith. A constant pattern is escaped and compiled straight
/// into LIKE. A non-constant pattern cannot be pre-escaped, so we emit an
/// escape-disabled LIKE pre-filter (keeps the index usable, may admit false
/// positives when the pattern itself contains wildcards) AND an exact
/// prefix/suffix equality post-filter. Both halves are load-bearing.
fn starts_or_ends_with(receiver: &crate::expr::ExprRef, pattern: &crate::expr::ExprRef, anchor: Anchor) -> SqlExpr {
    let constant_pattern = match &*pattern.borrow() {
        SqlExpr::Constant {
            value: Value::Text(s),
            ..
        } => Some(s.clone()),
        _ => None,
    };

    if let Some(s) = constant_pattern {
        let compiled = match anchor {
            Anchor::Start => format!("{}%", escape_like_pattern(&s)),
            Anchor::End => format!("%{}", escape_like_pattern(&s)),
        };
        return like(receiver.clone(), expr_ref(text(compiled)));
    }

    let wildcarded = match anchor {
        Anchor::Start => binary("||", pattern.clone(), expr_ref(text("%")), Type::Text),
        Anchor::End => binary("||", expr_ref(text("%")), pattern.clone(), Type::Text),
    };
    let pre_filter = like_unescaped(receiver.clone(), expr_ref(wildcarded));

    let slice_fn = match anchor {
        Anchor::Start => "left",
        Anchor::End => "right",
    };
    let pattern_len = func("length", vec![pattern.clone()], Type::Int32);
    let slice = func(
        slice_fn,
        vec![receiver.clone(), expr_ref(pattern_len)],
        Type::Text,
    );
    let post_filter = comparison("=", expr_ref(slice), pattern.clone());

    and(expr_ref(pre_filter), expr_ref(post_filter))
}

impl MethodTranslator for StringTranslator {
    fn translate(&self, call: &CallSite, _cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        // Regex operations carry no receiver; everything else requires a
        // text-typed one.
        match call.operation {
            M::RegexIsMatch => {
                let (Some(input), Some(pattern)) = (call.arg(0), call.arg(1)) else {
                    return Ok(None);
                };
                if !input.borrow().result_type().is_text() {
                    return Ok(None);
                }
                return Ok(Some(expr_ref(comparison(
                    "~",
                    input.clone(),
                    pattern.clone(),
                ))));
            }
            M::RegexReplace => {
                let (Some(input), Some(pattern), Some(replacement)) =
                    (call.arg(0), call.arg(1), call.arg(2))
                else {
                    return Ok(None);
                };
                if !input.borrow().result_type().is_text() {
                    return Ok(None);
                }
                return Ok(Some(expr_ref(func(
                    "regexp_replace",
                    vec![input.clone(), pattern.clone(), replacement.clone()],
                    Type::Text,
                ))));
            }
            _ => {}
        }

        let Some(receiver) = call.receiver() else {
            return Ok(None);
        };
        if !receiver.borrow().result_type().is_text() {
            return Ok(None);
        }

        let expr = match call.operation {
            M::StringStartsWith => {
                let Some(pattern) = call.arg(0) else {
                    return Ok(None);
                };
                starts_or_ends_with(receiver, pattern, Anchor::Start)
            }
            M::StringEndsWith => {
                let Some(pattern) = call.arg(0) else {
                    return Ok(None);
                };
                starts_or_ends_with(receiver, pattern, Anchor::End)
            }
            M::StringContains => {
                let Some(needle) = call.arg(0) else {
                    return Ok(None);
                };
                let constant_needle = match &*needle.borrow() {
                    SqlExpr::Constant {
                        value: Value::Text(s),
                        ..
                    } => Some(s.clone()),
                    _ => None,
                };
                match constant_needle {
                    Some(s) => like(
                        receiver.clone(),
                        expr_ref(text(format!("%{}%", escape_like_pattern(&s)))),
                    ),
                    // the needle may itself contain LIKE wildcards, so a
                    // position probe is the only exact non-constant form
                    None => comparison(
                        ">",
                        expr_ref(func(
                            "strpos",
                            vec![receiver.clone(), needle.clone()],
                            Type::Int32,
                        )),
                        expr_ref(int(0)),
                    ),
                }
            }
            M::StringIndexOf => {
                let Some(needle) = call.arg(0) else {
                    return Ok(None);
                };
                // strpos is 1-based with 0 for "absent"; shifting by one
                // restores the source convention including the -1 sentinel
                binary(
                    "-",
                    expr_ref(func(
                        "strpos",
                        vec![receiver.clone(), needle.clone()],
                        Type::Int32,
                    )),
                    expr_ref(int(1)),
                    Type::Int32,
                )
            }
            M::StringReplace => {
                let (Some(from), Some(to)) = (call.arg(0), call.arg(1)) else {
                    return Ok(None);
                };
                func(
                    "replace",
                    vec![receiver.clone(), from.clone(), to.clone()],
                    Type::Text,
                )
            }
            M::StringTrim => func("btrim", vec![receiver.clone()], Type::Text),
            M::StringTrimStart => func("ltrim", vec![receiver.clone()], Type::Text),
            M::StringTrimEnd => func("rtrim", vec![receiver.clone()], Type::Text),
            M::StringPadLeft | M::StringPadRight => {
                let Some(width) = call.arg(0) else {
                    return Ok(None);
                };
                let name = if call.operation == M::StringPadLeft {
                    "lpad"
                } else {
                    "rpad"
                };
                let mut args = vec![receiver.clone(), width.clone()];
                if let Some(fill) = call.arg(1) {
                    args.push(fill.clone());
                }
                func(name, args, Type::Text)
            }
            M::StringToUpper => func("upper", vec![receiver.clone()], Type::Text),
            M::StringToLower => func("lower", vec![receiver.clone()], Type::Text),
            M::StringSubstring => {
                let Some(start) = call.arg(0) else {
                    return Ok(None);
                };
                let mut args = vec![receiver.clone(), one_based(start)];
                if let Some(len) = call.arg(1) {
                    args.push(len.clone());
                }
                func("substr", args, Type::Text)
            }
            M::StringReverse => func("reverse", vec![receiver.clone()], Type::Text),
            _ => return Ok(None),
        };
        Ok(Some(expr_ref(expr)))
    }
}

impl MemberTranslator for StringTranslator {
    fn translate(&self, site: &MemberSite, _cx: &Cx) -> TranslateResult {
        if site.operation != MemberOp::StringLength {
            return Ok(None);
        }
        if !site.receiver.borrow().result_type().is_text() {
            return Ok(None);
        }
        Ok(Some(expr_ref(func(
            "length",
            vec![site.receiver.clone()],
            Type::Int32,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        expr::{column, parameter},
        store::DefaultTypeMapper,
        version::VersionGate,
    };

    fn cx() -> Cx<'static> {
        Cx {
            types: &DefaultTypeMapper,
            version: VersionGate::any(),
        }
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
    fn escape_doubles_metacharacters() {
        assert_eq!(escape_like_pattern("abc"), "abc");
        assert_eq!(escape_like_pattern("ab%c"), r"ab\%c");
        assert_eq!(escape_like_pattern("a_b"), r"a\_b");
        assert_eq!(escape_like_pattern(r"a\b"), r"a\\b");
    }

    #[test]
    fn constant_starts_with_compiles_to_single_like() {
        let call = method(
            MethodOp::StringStartsWith,
            column("name", Type::Text),
            vec![text("ab%c")],
        );
        let out = crate::translate::MethodTranslator::translate(&StringTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::Like {
                pattern, escape, ..
            } => {
                assert_eq!(escape, &None);
                assert_eq!(
                    pattern.borrow().as_constant().unwrap().as_text().unwrap(),
                    r"ab\%c%"
                );
            }
            other => panic!("expected Like, got {other:?}"),
        }
    }

    #[test]
    fn parameter_starts_with_emits_prefilter_and_postfilter() {
        let call = method(
            MethodOp::StringStartsWith,
            column("name", Type::Text),
            vec![parameter("p", Type::Text)],
        );
        let out = crate::translate::MethodTranslator::translate(&StringTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp {
                symbol: "AND",
                left,
                right,
                ..
            } => {
                match &*left.borrow() {
                    SqlExpr::Like { escape, .. } => {
                        assert_eq!(escape.as_deref(), Some(""));
                    }
                    other => panic!("expected unescaped Like pre-filter, got {other:?}"),
                }
                match &*right.borrow() {
                    SqlExpr::BinaryOp {
                        symbol: "=", left, ..
                    } => match &*left.borrow() {
                        SqlExpr::FunctionCall { name, .. } => assert_eq!(name, "left"),
                        other => panic!("expected left() in post-filter, got {other:?}"),
                    },
                    other => panic!("expected equality post-filter, got {other:?}"),
                }
            }
            other => panic!("expected AND of two filters, got {other:?}"),
        }
    }

    #[test]
    fn parameter_ends_with_uses_right_slice() {
        let call = method(
            MethodOp::StringEndsWith,
            column("name", Type::Text),
            vec![parameter("p", Type::Text)],
        );
        let out = crate::translate::MethodTranslator::translate(&StringTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp { right, .. } => match &*right.borrow() {
                SqlExpr::BinaryOp { left, .. } => match &*left.borrow() {
                    SqlExpr::FunctionCall { name, .. } => assert_eq!(name, "right"),
                    other => panic!("expected right(), got {other:?}"),
                },
                other => panic!("unexpected post-filter {other:?}"),
            },
            other => panic!("expected AND, got {other:?}"),
        }
    }

    #[test]
    fn non_constant_contains_avoids_like() {
        let call = method(
            MethodOp::StringContains,
            column("name", Type::Text),
            vec![parameter("p", Type::Text)],
        );
        let out = crate::translate::MethodTranslator::translate(&StringTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp {
                symbol: ">", left, ..
            } => match &*left.borrow() {
                SqlExpr::FunctionCall { name, .. } => assert_eq!(name, "strpos"),
                other => panic!("expected strpos, got {other:?}"),
            },
            other => panic!("expected strpos comparison, got {other:?}"),
        }
    }

    #[test]
    fn index_of_rebases_to_zero_based() {
        let call = method(
            MethodOp::StringIndexOf,
            column("name", Type::Text),
            vec![text("x")],
        );
        let out = crate::translate::MethodTranslator::translate(&StringTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp {
                symbol: "-", right, ..
            } => {
                assert_eq!(right.borrow().as_constant().unwrap().as_int(), Some(1));
            }
            other => panic!("expected subtraction, got {other:?}"),
        }
    }

    #[test]
    fn substring_rebases_start_index() {
        let call = method(
            MethodOp::StringSubstring,
            column("name", Type::Text),
            vec![int(2), int(5)],
        );
        let out = crate::translate::MethodTranslator::translate(&StringTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::FunctionCall { name, args, .. } => {
                assert_eq!(name, "substr");
                assert_eq!(args[1].borrow().as_constant().unwrap().as_int(), Some(3));
                assert_eq!(args[2].borrow().as_constant().unwrap().as_int(), Some(5));
            }
            other => panic!("expected substr call, got {other:?}"),
        }
    }

    #[test]
    fn non_text_receiver_declines() {
        let call = method(MethodOp::StringTrim, column("n", Type::Int32), vec![]);
        assert!(crate::translate::MethodTranslator::translate(&StringTranslator, &call, &cx()).unwrap().is_none());
    }
}
