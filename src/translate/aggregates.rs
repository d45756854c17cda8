//! Aggregate lowering, split the way the rules group naturally: the
//! arithmetic aggregates (with their overflow-safe accumulators), the
//! statistical family, and the structural/miscellaneous family.

use super::{AggregateTranslator, Cx};
use crate::{
    call_site::{AggregateSite, GroupSelector},
    error::TranslateResult,
    expr::{
        ExprRef, NullMask, SqlExpr, Type, aggregate, aggregate_store, cast, expr_ref, func_masked,
        text,
    },
    ops::AggregateOp,
    store::StoreType,
};

fn count_star() -> ExprRef {
    expr_ref(SqlExpr::Fragment {
        text: "*".into(),
        ty: Type::Unknown,
    })
}

/// sum/avg/min/max/count.
pub struct SimpleAggregateTranslator;

impl AggregateTranslator for SimpleAggregateTranslator {
    fn translate(&self, site: &AggregateSite, _cx: &Cx) -> TranslateResult {
        use AggregateOp as A;

        let expr = match site.operation {
            // counting is natively 64-bit; Count narrows back, LongCount
            // keeps the native width
            A::Count => cast(
                expr_ref(aggregate("count", vec![count_star()], Type::Int64)),
                Type::Int32,
            ),
            A::LongCount => aggregate("count", vec![count_star()], Type::Int64),

            A::Sum => {
                let Some(element) = site.selector.as_scalar() else {
                    return Ok(None);
                };
                let elem_type = element.borrow().result_type().clone();
                match elem_type {
                    // the native sum over 32-bit values accumulates in 64
                    // bits; narrowing back preserves the declared result
                    // type while keeping the accumulator overflow-safe
                    Type::Int16 | Type::Int32 => cast(
                        expr_ref(aggregate("sum", vec![element.clone()], Type::Int64)),
                        elem_type,
                    ),
                    // 64-bit sums accumulate in arbitrary precision
                    Type::Int64 => cast(
                        expr_ref(aggregate("sum", vec![element.clone()], Type::Decimal)),
                        Type::Int64,
                    ),
                    Type::Real | Type::Double | Type::Decimal => {
                        aggregate("sum", vec![element.clone()], elem_type)
                    }
                    _ => return Ok(None),
                }
            }

            A::Average => {
                let Some(element) = site.selector.as_scalar() else {
                    return Ok(None);
                };
                let elem_type = element.borrow().result_type().clone();
                match elem_type {
                    // avg over integers comes back arbitrary-precision; the
                    // source contract wants a double
                    Type::Int16 | Type::Int32 | Type::Int64 => cast(
                        expr_ref(aggregate("avg", vec![element.clone()], Type::Decimal)),
                        Type::Double,
                    ),
                    Type::Real => cast(
                        expr_ref(aggregate("avg", vec![element.clone()], Type::Double)),
                        Type::Real,
                    ),
                    Type::Double | Type::Decimal => {
                        aggregate("avg", vec![element.clone()], elem_type)
                    }
                    _ => return Ok(None),
                }
            }

            A::Min | A::Max => {
                let Some(element) = site.selector.as_scalar() else {
                    return Ok(None);
                };
                let name = if site.operation == A::Min { "min" } else { "max" };
                let elem_type = element.borrow().result_type().clone();
                aggregate(name, vec![element.clone()], elem_type)
            }

            _ => return Ok(None),
        };
        Ok(Some(expr_ref(expr)))
    }
}

/// variance/stddev and the two-column regression family.
pub struct StatisticalAggregateTranslator;

impl AggregateTranslator for StatisticalAggregateTranslator {
    fn translate(&self, site: &AggregateSite, _cx: &Cx) -> TranslateResult {
        use AggregateOp as A;

        let one_arg = |name: &str| -> TranslateResult {
            let Some(element) = site.selector.as_scalar() else {
                return Ok(None);
            };
            Ok(Some(expr_ref(aggregate(
                name,
                vec![element.clone()],
                Type::Double,
            ))))
        };

        // The two-argument family requires the grouped selector to be
        // literally a two-element tuple projection: (Y, X), dependent
        // variable first. Any other shape fails closed. We never guess
        // which operand is which.
        let two_arg = |name: &str, ty: Type| -> TranslateResult {
            let Some((y, x)) = site.selector.as_pair() else {
                return Ok(None);
            };
            Ok(Some(expr_ref(aggregate(
                name,
                vec![y.clone(), x.clone()],
                ty,
            ))))
        };

        match site.operation {
            A::VariancePopulation => one_arg("var_pop"),
            A::VarianceSample => one_arg("var_samp"),
            A::StandardDeviationPopulation => one_arg("stddev_pop"),
            A::StandardDeviationSample => one_arg("stddev_samp"),
            A::Correlation => two_arg("corr", Type::Double),
            A::CovariancePopulation => two_arg("covar_pop", Type::Double),
            A::CovarianceSample => two_arg("covar_samp", Type::Double),
            A::RegressionSlope => two_arg("regr_slope", Type::Double),
            A::RegressionIntercept => two_arg("regr_intercept", Type::Double),
            A::RegressionR2 => two_arg("regr_r2", Type::Double),
            A::RegressionAverageX => two_arg("regr_avgx", Type::Double),
            A::RegressionAverageY => two_arg("regr_avgy", Type::Double),
            A::RegressionCount => two_arg("regr_count", Type::Int64),
            _ => Ok(None),
        }
    }
}

/// String joining, array/object building, boolean folds, range folds.
pub struct MiscAggregateTranslator;

impl AggregateTranslator for MiscAggregateTranslator {
    fn translate(&self, site: &AggregateSite, cx: &Cx) -> TranslateResult {
        use AggregateOp as A;

        let expr = match site.operation {
            A::StringJoin => {
                let Some(element) = site.selector.as_scalar() else {
                    return Ok(None);
                };
                let Some(separator) = site.arguments.first() else {
                    return Ok(None);
                };
                // the dialect's aggregate silently drops NULL elements; the
                // source treats them as empty strings, so nullable elements
                // get coalesced before joining
                let element = if site.element_nullable {
                    expr_ref(func_masked(
                        "coalesce",
                        vec![element.clone(), expr_ref(text(""))],
                        NullMask::none(2),
                        Type::Text,
                    ))
                } else {
                    element.clone()
                };
                let joined = aggregate("string_agg", vec![element, separator.clone()], Type::Text);
                // no rows joins to NULL in the dialect, to "" in the source
                func_masked(
                    "coalesce",
                    vec![expr_ref(joined), expr_ref(text(""))],
                    NullMask::none(2),
                    Type::Text,
                )
            }

            A::ArrayAgg => {
                let Some(element) = site.selector.as_scalar() else {
                    return Ok(None);
                };
                let elem_type = element.borrow().result_type().clone();
                aggregate(
                    "array_agg",
                    vec![element.clone()],
                    Type::array_of(elem_type),
                )
            }

            A::JsonAgg => {
                let Some(element) = site.selector.as_scalar() else {
                    return Ok(None);
                };
                aggregate_store(
                    "json_agg",
                    vec![element.clone()],
                    Type::Document,
                    StoreType::Json,
                )
            }
            A::JsonbAgg => {
                let Some(element) = site.selector.as_scalar() else {
                    return Ok(None);
                };
                aggregate_store(
                    "jsonb_agg",
                    vec![element.clone()],
                    Type::Document,
                    StoreType::Jsonb,
                )
            }

            // object building needs (key, value) columns, which only a
            // literal two-element tuple projection provides; fail closed on
            // anything else
            A::JsonObjectAgg => {
                let Some((keys, values)) = site.selector.as_pair() else {
                    return Ok(None);
                };
                aggregate_store(
                    "json_object_agg",
                    vec![keys.clone(), values.clone()],
                    Type::Document,
                    StoreType::Json,
                )
            }
            A::JsonbObjectAgg => {
                let Some((keys, values)) = site.selector.as_pair() else {
                    return Ok(None);
                };
                aggregate_store(
                    "jsonb_object_agg",
                    vec![keys.clone(), values.clone()],
                    Type::Document,
                    StoreType::Jsonb,
                )
            }

            A::BoolAnd | A::BoolOr => {
                let Some(element) = site.selector.as_scalar() else {
                    return Ok(None);
                };
                if *element.borrow().result_type() != Type::Bool {
                    return Ok(None);
                }
                let name = if site.operation == A::BoolAnd {
                    "bool_and"
                } else {
                    "bool_or"
                };
                aggregate(name, vec![element.clone()], Type::Bool)
            }

            // multirange folds exist only on 14+, and there is no generic
            // fallback worth emitting
            A::RangeAgg => {
                let Some(element) = site.selector.as_scalar() else {
                    return Ok(None);
                };
                cx.version.require(14, 0, "range_agg")?;
                aggregate("range_agg", vec![element.clone()], site.result_type.clone())
            }
            A::RangeIntersectAgg => {
                let Some(element) = site.selector.as_scalar() else {
                    return Ok(None);
                };
                cx.version.require(14, 0, "range_intersect_agg")?;
                aggregate(
                    "range_intersect_agg",
                    vec![element.clone()],
                    site.result_type.clone(),
                )
            }

            _ => return Ok(None),
        };
        Ok(Some(expr_ref(expr)))
    }
}
