use super::{Cx, MethodTranslator};
use crate::{
    call_site::CallSite,
    error::TranslateResult,
    expr::{Type, binary, comparison, expr_ref, func},
    ops::MethodOp,
};

/// Lowers fuzzy string matching from the trigram extension. All operations
/// here are receiver-less two-argument forms; the strict word variants did
/// not exist before version 11 and gate hard.
pub struct TrigramTranslator;

impl MethodTranslator for TrigramTranslator {
    fn translate(&self, call: &CallSite, cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        let (function, predicate, distance, strict) = match call.operation {
            M::TrgSimilarity => (Some("similarity"), None, None, false),
            M::TrgWordSimilarity => (Some("word_similarity"), None, None, false),
            M::TrgStrictWordSimilarity => (Some("strict_word_similarity"), None, None, true),
            M::TrgSimilar => (None, Some("%"), None, false),
            M::TrgWordSimilar => (None, Some("<%"), None, false),
            M::TrgStrictWordSimilar => (None, Some("<<%"), None, true),
            M::TrgSimilarityDistance => (None, None, Some("<->"), false),
            M::TrgWordSimilarityDistance => (None, None, Some("<<->"), false),
            M::TrgStrictWordSimilarityDistance => (None, None, Some("<<<->"), true),
            _ => return Ok(None),
        };

        let (Some(left), Some(right)) = (call.arg(0), call.arg(1)) else {
            return Ok(None);
        };
        if !left.borrow().result_type().is_text() || !right.borrow().result_type().is_text() {
            return Ok(None);
        }
        if strict {
            cx.version.require(11, 0, "strict word similarity")?;
        }

        let out = if let Some(name) = function {
            func(name, vec![left.clone(), right.clone()], Type::Real)
        } else if let Some(symbol) = predicate {
            comparison(symbol, left.clone(), right.clone())
        } else if let Some(symbol) = distance {
            binary(symbol, left.clone(), right.clone(), Type::Real)
        } else {
            return Ok(None);
        };
        Ok(Some(expr_ref(out)))
    }
}
