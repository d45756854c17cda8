use super::{Cx, MemberTranslator, MethodTranslator};
use crate::{
    call_site::{CallSite, MemberSite},
    error::TranslateResult,
    expr::{ExprRef, SqlExpr, Type, Value, binary, cast, cast_store, expr_ref, func, text},
    ops::{MemberOp, MethodOp},
    store::StoreType,
};

/// Lowers date/time arithmetic and calendar member reads.
pub struct DateTimeTranslator;

fn is_datetime(ty: &Type) -> bool {
    matches!(ty, Type::Date | Type::Timestamp | Type::TimestampTz)
}

/// Builds the interval operand for an add-by-unit operation. A
/// compile-time amount folds into a literal interval constant; a runtime
/// amount is concatenated with the unit word and cast, which stays correct
/// when the value is NULL (a multi-field interval builder would not).
fn interval_operand(amount: &ExprRef, unit: &'static str) -> ExprRef {
    let literal = match &*amount.borrow() {
        SqlExpr::Constant {
            value: Value::Int(n),
            ..
        } => Some(format!("{n} {unit}")),
        SqlExpr::Constant {
            value: Value::Float(n),
            ..
        } => Some(format!("{n} {unit}")),
        _ => None,
    };
    match literal {
        Some(s) => expr_ref(SqlExpr::Constant {
            value: Value::Text(s),
            ty: Type::Interval,
            store: Some(StoreType::Interval),
        }),
        None => {
            let as_text = cast(amount.clone(), Type::Text);
            let tagged = binary(
                "||",
                expr_ref(as_text),
                expr_ref(text(format!(" {unit}"))),
                Type::Text,
            );
            expr_ref(cast_store(
                expr_ref(tagged),
                Type::Interval,
                StoreType::Interval,
            ))
        }
    }
}

/// Offset-bearing values are shifted to UTC before extraction; the
/// extraction function would otherwise ignore the offset entirely.
fn normalized(receiver: &ExprRef) -> ExprRef {
    if *receiver.borrow().result_type() == Type::TimestampTz {
        expr_ref(binary(
            "AT TIME ZONE",
            receiver.clone(),
            expr_ref(text("UTC")),
            Type::Timestamp,
        ))
    } else {
        receiver.clone()
    }
}

/// `date_part(field, x)` yields double precision; calendar members narrow
/// back to the declared integer type.
fn date_part(field: &str, operand: ExprRef) -> SqlExpr {
    let part = func(
        "date_part",
        vec![expr_ref(text(field)), operand],
        Type::Double,
    );
    cast(expr_ref(part), Type::Int32)
}

impl MethodTranslator for DateTimeTranslator {
    fn translate(&self, call: &CallSite, _cx: &Cx) -> TranslateResult {
        use MethodOp as M;

        let unit = match call.operation {
            M::AddYears => "years",
            M::AddMonths => "months",
            M::AddDays => "days",
            M::AddHours => "hours",
            M::AddMinutes => "minutes",
            M::AddSeconds => "seconds",
            _ => return Ok(None),
        };

        let Some(receiver) = call.receiver() else {
            return Ok(None);
        };
        let receiver_type = receiver.borrow().result_type().clone();
        if !is_datetime(&receiver_type) {
            return Ok(None);
        }
        // sub-day units make no sense on a plain date
        if receiver_type == Type::Date
            && matches!(call.operation, M::AddHours | M::AddMinutes | M::AddSeconds)
        {
            return Ok(None);
        }
        let Some(amount) = call.arg(0) else {
            return Ok(None);
        };

        Ok(Some(expr_ref(binary(
            "+",
            receiver.clone(),
            interval_operand(amount, unit),
            receiver_type,
        ))))
    }
}

impl MemberTranslator for DateTimeTranslator {
    fn translate(&self, site: &MemberSite, _cx: &Cx) -> TranslateResult {
        use MemberOp as P;

        // the current date is a bare keyword, independent of the receiver
        if site.operation == P::DateToday {
            return Ok(Some(expr_ref(SqlExpr::Fragment {
                text: "CURRENT_DATE".into(),
                ty: Type::Date,
            })));
        }

        let receiver_type = site.receiver.borrow().result_type().clone();

        if receiver_type == Type::Interval {
            let field = match site.operation {
                P::IntervalDays => "day",
                P::IntervalHours => "hour",
                P::IntervalMinutes => "minute",
                P::IntervalSeconds => "second",
                _ => return Ok(None),
            };
            return Ok(Some(expr_ref(date_part(field, site.receiver.clone()))));
        }

        if !is_datetime(&receiver_type) {
            return Ok(None);
        }

        let expr = match site.operation {
            P::DateYear => date_part("year", normalized(&site.receiver)),
            P::DateMonth => date_part("month", normalized(&site.receiver)),
            P::DateDay => date_part("day", normalized(&site.receiver)),
            P::DateHour => date_part("hour", normalized(&site.receiver)),
            P::DateMinute => date_part("minute", normalized(&site.receiver)),
            P::DateSecond => date_part("second", normalized(&site.receiver)),
            P::DateDayOfYear => date_part("doy", normalized(&site.receiver)),
            // the dialect's week starts on Sunday at 0, same as the source
            // convention, but the part comes back fractional-capable, so it
            // goes through floor before narrowing
            P::DateDayOfWeek => {
                let part = func(
                    "date_part",
                    vec![expr_ref(text("dow")), normalized(&site.receiver)],
                    Type::Double,
                );
                let floored = func("floor", vec![expr_ref(part)], Type::Double);
                cast(expr_ref(floored), Type::Int32)
            }
            P::DateDate => cast(normalized(&site.receiver), Type::Date),
            _ => return Ok(None),
        };
        Ok(Some(expr_ref(expr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        expr::{column, int, parameter},
        store::DefaultTypeMapper,
        version::VersionGate,
    };

    fn cx() -> Cx<'static> {
        Cx {
            types: &DefaultTypeMapper,
            version: VersionGate::any(),
        }
    }

    #[test]
    fn literal_amount_folds_to_interval_constant() {
        let call = CallSite {
            receiver: Some(expr_ref(column("created", Type::Timestamp))),
            operation: MethodOp::AddDays,
            arguments: vec![expr_ref(int(3))],
            result_type: Type::Timestamp,
        };
        let out = crate::translate::MethodTranslator::translate(&DateTimeTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp {
                symbol: "+", right, ..
            } => match &*right.borrow() {
                SqlExpr::Constant { value, ty, .. } => {
                    assert_eq!(*ty, Type::Interval);
                    assert_eq!(value.as_text(), Some("3 days"));
                }
                other => panic!("expected literal interval, got {other:?}"),
            },
            other => panic!("expected interval addition, got {other:?}"),
        }
    }

    #[test]
    fn runtime_amount_builds_concat_cast() {
        let call = CallSite {
            receiver: Some(expr_ref(column("created", Type::Timestamp))),
            operation: MethodOp::AddMonths,
            arguments: vec![expr_ref(parameter("n", Type::Int32))],
            result_type: Type::Timestamp,
        };
        let out = crate::translate::MethodTranslator::translate(&DateTimeTranslator, &call, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::BinaryOp { right, .. } => match &*right.borrow() {
                SqlExpr::Cast { inner, ty, .. } => {
                    assert_eq!(*ty, Type::Interval);
                    match &*inner.borrow() {
                        SqlExpr::BinaryOp { symbol, right, .. } => {
                            assert_eq!(*symbol, "||");
                            assert_eq!(
                                right.borrow().as_constant().unwrap().as_text(),
                                Some(" months")
                            );
                        }
                        other => panic!("expected unit concat, got {other:?}"),
                    }
                }
                other => panic!("expected cast to interval, got {other:?}"),
            },
            other => panic!("expected interval addition, got {other:?}"),
        }
    }

    #[test]
    fn sub_day_units_decline_on_plain_dates() {
        let call = CallSite {
            receiver: Some(expr_ref(column("d", Type::Date))),
            operation: MethodOp::AddHours,
            arguments: vec![expr_ref(int(1))],
            result_type: Type::Date,
        };
        assert!(crate::translate::MethodTranslator::translate(&DateTimeTranslator, &call, &cx()).unwrap().is_none());
    }

    #[test]
    fn year_member_extracts_and_narrows() {
        let site = MemberSite {
            receiver: expr_ref(column("created", Type::Timestamp)),
            operation: MemberOp::DateYear,
            result_type: Type::Int32,
        };
        let out = crate::translate::MemberTranslator::translate(&DateTimeTranslator, &site, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::Cast { inner, ty, .. } => {
                assert_eq!(*ty, Type::Int32);
                match &*inner.borrow() {
                    SqlExpr::FunctionCall { name, args, .. } => {
                        assert_eq!(name, "date_part");
                        assert_eq!(
                            args[0].borrow().as_constant().unwrap().as_text(),
                            Some("year")
                        );
                    }
                    other => panic!("expected date_part, got {other:?}"),
                }
            }
            other => panic!("expected narrowed extraction, got {other:?}"),
        }
    }

    #[test]
    fn offset_bearing_receiver_is_normalized_to_utc() {
        let site = MemberSite {
            receiver: expr_ref(column("created", Type::TimestampTz)),
            operation: MemberOp::DateDay,
            result_type: Type::Int32,
        };
        let out = crate::translate::MemberTranslator::translate(&DateTimeTranslator, &site, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::Cast { inner, .. } => match &*inner.borrow() {
                SqlExpr::FunctionCall { args, .. } => match &*args[1].borrow() {
                    SqlExpr::BinaryOp { symbol, right, .. } => {
                        assert_eq!(*symbol, "AT TIME ZONE");
                        assert_eq!(right.borrow().as_constant().unwrap().as_text(), Some("UTC"));
                    }
                    other => panic!("expected AT TIME ZONE wrapper, got {other:?}"),
                },
                other => panic!("expected date_part, got {other:?}"),
            },
            other => panic!("expected cast, got {other:?}"),
        }
    }

    #[test]
    fn today_lowers_to_the_bare_keyword() {
        let site = MemberSite {
            receiver: expr_ref(column("created", Type::Timestamp)),
            operation: MemberOp::DateToday,
            result_type: Type::Date,
        };
        let out = crate::translate::MemberTranslator::translate(&DateTimeTranslator, &site, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::Fragment { text, ty } => {
                assert_eq!(text, "CURRENT_DATE");
                assert_eq!(*ty, Type::Date);
            }
            other => panic!("expected bare keyword, got {other:?}"),
        }
    }

    #[test]
    fn day_of_week_goes_through_floor() {
        let site = MemberSite {
            receiver: expr_ref(column("created", Type::Timestamp)),
            operation: MemberOp::DateDayOfWeek,
            result_type: Type::Int32,
        };
        let out = crate::translate::MemberTranslator::translate(&DateTimeTranslator, &site, &cx()).unwrap().unwrap();
        match &*out.borrow() {
            SqlExpr::Cast { inner, .. } => match &*inner.borrow() {
                SqlExpr::FunctionCall { name, .. } => assert_eq!(name, "floor"),
                other => panic!("expected floor, got {other:?}"),
            },
            other => panic!("expected cast, got {other:?}"),
        }
    }
}
