//! The closed set of source-language operations the engine recognizes.
//!
//! The host identifies a call site by declaring domain, operation name and
//! arity; we resolve that triple through a static table built into
//! [`Operation::resolve`]. There is no runtime reflection: an operation the
//! table does not name simply does not resolve and the host falls back to
//! its generic handling.

/// Method-shaped operations (receiver + arguments).
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodOp {
    // arrays / lists
    ArrayIndex,
    ArrayContains,
    ArrayContainsArray,
    ArrayOverlaps,
    ArraySequenceEqual,
    ArrayAppend,
    ArrayPrepend,
    ArrayConcat,
    ArrayIndexOf,
    ArrayFill,
    ArrayPositions,
    ArrayRemove,
    ArrayReplace,
    ArrayJoin,
    /// Predicate-less existence check.
    ArrayAny,
    /// Existence check with a predicate; the lone argument is the lowered
    /// lambda body, with the lambda parameter appearing as `LambdaParam`.
    ArrayAnyMatch,
    /// First element satisfying a predicate, same argument shape.
    ArrayFirstMatch,

    // strings
    StringContains,
    StringStartsWith,
    StringEndsWith,
    StringIndexOf,
    StringReplace,
    StringTrim,
    StringTrimStart,
    StringTrimEnd,
    StringPadLeft,
    StringPadRight,
    StringToUpper,
    StringToLower,
    StringSubstring,
    StringReverse,
    RegexIsMatch,
    RegexReplace,

    // dictionary / document stores
    DictContainsKey,
    DictContainsAllKeys,
    DictContainsAnyKeys,
    DictContainsDoc,
    DictContainedByDoc,
    DictGet,
    DictRemove,
    DictSlice,
    DictConcat,
    DictSubtract,
    DictEquals,
    DictToJson,
    DictToJsonb,
    JsonTypeof,
    JsonArrayLength,

    // date/time
    AddYears,
    AddMonths,
    AddDays,
    AddHours,
    AddMinutes,
    AddSeconds,

    // ranges
    RangeContains,
    RangeContainedBy,
    RangeOverlaps,
    RangeIsStrictlyLeftOf,
    RangeIsStrictlyRightOf,
    RangeDoesNotExtendLeftOf,
    RangeDoesNotExtendRightOf,
    RangeIsAdjacentTo,
    RangeUnion,
    RangeIntersect,
    RangeExcept,
    RangeMerge,

    // network addresses
    NetContains,
    NetContainsOrEquals,
    NetContainedBy,
    NetContainedByOrEquals,
    NetOverlaps,
    NetAnd,
    NetOr,
    NetNot,
    NetAdd,
    NetSubtract,
    NetAbbrev,
    NetBroadcast,
    NetFamily,
    NetHost,
    NetMaskLen,
    NetNetmask,
    NetNetwork,
    NetSetMaskLen,
    NetText,
    NetSameFamily,
    NetMerge,
    MacTruncate,
    Mac8Set7Bit,

    // hierarchical label paths
    LTreeIsAncestorOf,
    LTreeIsDescendantOf,
    LTreeMatchesLQuery,
    LTreeMatchesLTxtQuery,
    LTreeConcat,
    LTreeSubtree,
    LTreeSubpath,
    LTreeIndex,
    LTreeLca,

    // full-text search
    TsMatches,
    TsConcat,
    TsRank,
    TsRankCd,
    TsHeadline,
    TsSetWeight,
    TsRewrite,
    TsDelete,
    ToTsVector,
    ToTsQuery,
    PlainToTsQuery,
    PhraseToTsQuery,
    WebSearchToTsQuery,
    TsQueryAnd,
    TsQueryOr,
    TsQueryNot,
    TsQueryContains,

    // fuzzy matching (trigram extension)
    TrgSimilarity,
    TrgWordSimilarity,
    TrgStrictWordSimilarity,
    TrgSimilar,
    TrgWordSimilar,
    TrgStrictWordSimilar,
    TrgSimilarityDistance,
    TrgWordSimilarityDistance,
    TrgStrictWordSimilarityDistance,

    // row values
    RowGreaterThan,
    RowLessThan,
    RowGreaterThanOrEqual,
    RowLessThanOrEqual,
    RowEqual,
    RowNotEqual,

    // conditional / conversion
    Greatest,
    Least,
    NullIf,
    NewGuid,
    ConvertToInt16,
    ConvertToInt32,
    ConvertToInt64,
    ConvertToDouble,
    ConvertToDecimal,
    ConvertToBool,
    ConvertToString,
    ObjectToString,
}

/// Member/property-shaped operations (receiver only).
#[derive(strum_macros::Display, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberOp {
    StringLength,
    ArrayLength,
    DictCount,
    DictKeys,
    DictValues,
    DictIsEmpty,
    DateYear,
    DateMonth,
    DateDay,
    DateHour,
    DateMinute,
    DateSecond,
    DateDayOfWeek,
    DateDayOfYear,
    DateDate,
    DateToday,
    IntervalDays,
    IntervalHours,
    IntervalMinutes,
    IntervalSeconds,
    RangeLower,
    RangeUpper,
    RangeIsEmpty,
    RangeLowerInclusive,
    RangeUpperInclusive,
    RangeLowerInfinite,
    RangeUpperInfinite,
    LTreeLevels,
    TsVectorLength,
    /// Property access into a document-typed value; the payload is the
    /// member name as written in the source model.
    DocMember(String),
}

/// Aggregate-shaped operations (grouped selector + arguments).
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Sum,
    Average,
    Min,
    Max,
    Count,
    LongCount,
    VariancePopulation,
    VarianceSample,
    StandardDeviationPopulation,
    StandardDeviationSample,
    Correlation,
    CovariancePopulation,
    CovarianceSample,
    RegressionSlope,
    RegressionIntercept,
    RegressionR2,
    RegressionAverageX,
    RegressionAverageY,
    RegressionCount,
    StringJoin,
    ArrayAgg,
    JsonAgg,
    JsonbAgg,
    JsonObjectAgg,
    JsonbObjectAgg,
    BoolAnd,
    BoolOr,
    RangeAgg,
    RangeIntersectAgg,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    Method(MethodOp),
    Member(MemberOp),
    Aggregate(AggregateOp),
}

impl Operation {
    /// Resolves a source-language operation from its declaring domain, name
    /// and arity (receiver excluded from the count). Returns `None` for
    /// anything outside the closed set.
    pub fn resolve(domain: &str, name: &str, arity: usize) -> Option<Operation> {
        use AggregateOp as A;
        use MemberOp as P;
        use MethodOp as M;

        let method = |op| Some(Operation::Method(op));
        let member = |op| Some(Operation::Member(op));
        let aggregate = |op| Some(Operation::Aggregate(op));

        match (domain, name, arity) {
            ("Array" | "List", "get_Item", 1) => method(M::ArrayIndex),
            ("Array" | "List", "Contains", 1) => method(M::ArrayContains),
            ("Array" | "List", "ContainsArray", 1) => method(M::ArrayContainsArray),
            ("Array" | "List", "Overlaps", 1) => method(M::ArrayOverlaps),
            ("Array" | "List", "SequenceEqual", 1) => method(M::ArraySequenceEqual),
            ("Array" | "List", "Append", 1) => method(M::ArrayAppend),
            ("Array" | "List", "Prepend", 1) => method(M::ArrayPrepend),
            ("Array" | "List", "Concat", 1) => method(M::ArrayConcat),
            ("Array" | "List", "IndexOf", 1) => method(M::ArrayIndexOf),
            ("Array" | "List", "Fill", 2) => method(M::ArrayFill),
            ("Array" | "List", "Positions", 1) => method(M::ArrayPositions),
            ("Array" | "List", "Remove", 1) => method(M::ArrayRemove),
            ("Array" | "List", "Replace", 2) => method(M::ArrayReplace),
            ("Array" | "List", "Join", 1) => method(M::ArrayJoin),
            ("Array" | "List", "Any", 0) => method(M::ArrayAny),
            ("Array" | "List", "Any", 1) => method(M::ArrayAnyMatch),
            ("Array" | "List", "FirstOrDefault", 1) => method(M::ArrayFirstMatch),
            ("Array" | "List", "Length" | "Count", 0) => member(P::ArrayLength),

            ("String", "Contains", 1) => method(M::StringContains),
            ("String", "StartsWith", 1) => method(M::StringStartsWith),
            ("String", "EndsWith", 1) => method(M::StringEndsWith),
            ("String", "IndexOf", 1) => method(M::StringIndexOf),
            ("String", "Replace", 2) => method(M::StringReplace),
            ("String", "Trim", 0) => method(M::StringTrim),
            ("String", "TrimStart", 0) => method(M::StringTrimStart),
            ("String", "TrimEnd", 0) => method(M::StringTrimEnd),
            ("String", "PadLeft", 1 | 2) => method(M::StringPadLeft),
            ("String", "PadRight", 1 | 2) => method(M::StringPadRight),
            ("String", "ToUpper", 0) => method(M::StringToUpper),
            ("String", "ToLower", 0) => method(M::StringToLower),
            ("String", "Substring", 1 | 2) => method(M::StringSubstring),
            ("String", "Reverse", 0) => method(M::StringReverse),
            ("String", "Length", 0) => member(P::StringLength),
            ("Regex", "IsMatch", 2) => method(M::RegexIsMatch),
            ("Regex", "Replace", 3) => method(M::RegexReplace),

            ("Dictionary" | "Document", "ContainsKey", 1) => method(M::DictContainsKey),
            ("Dictionary" | "Document", "ContainsAllKeys", 1) => method(M::DictContainsAllKeys),
            ("Dictionary" | "Document", "ContainsAnyKeys", 1) => method(M::DictContainsAnyKeys),
            ("Dictionary" | "Document", "Contains", 1) => method(M::DictContainsDoc),
            ("Dictionary" | "Document", "ContainedBy", 1) => method(M::DictContainedByDoc),
            ("Dictionary", "get_Item", 1) => method(M::DictGet),
            ("Dictionary" | "Document", "Remove", 1) => method(M::DictRemove),
            ("Dictionary", "Slice", 1) => method(M::DictSlice),
            ("Dictionary" | "Document", "Concat", 1) => method(M::DictConcat),
            ("Dictionary" | "Document", "Subtract", 1) => method(M::DictSubtract),
            ("Dictionary" | "Document", "Equals", 1) => method(M::DictEquals),
            ("Dictionary", "ToJson", 0) => method(M::DictToJson),
            ("Dictionary", "ToJsonb", 0) => method(M::DictToJsonb),
            ("Document", "Typeof", 0) => method(M::JsonTypeof),
            ("Document", "ArrayLength", 0) => method(M::JsonArrayLength),
            ("Dictionary", "Count", 0) => member(P::DictCount),
            ("Dictionary", "Keys", 0) => member(P::DictKeys),
            ("Dictionary", "Values", 0) => member(P::DictValues),
            ("Dictionary", "IsEmpty", 0) => member(P::DictIsEmpty),
            ("Document", "get_Item", 1) => method(M::DictGet),
            ("Document", _, 0) => member(P::DocMember(name.to_string())),

            ("DateTime", "AddYears", 1) => method(M::AddYears),
            ("DateTime", "AddMonths", 1) => method(M::AddMonths),
            ("DateTime", "AddDays", 1) => method(M::AddDays),
            ("DateTime", "AddHours", 1) => method(M::AddHours),
            ("DateTime", "AddMinutes", 1) => method(M::AddMinutes),
            ("DateTime", "AddSeconds", 1) => method(M::AddSeconds),
            ("DateTime", "Year", 0) => member(P::DateYear),
            ("DateTime", "Month", 0) => member(P::DateMonth),
            ("DateTime", "Day", 0) => member(P::DateDay),
            ("DateTime", "Hour", 0) => member(P::DateHour),
            ("DateTime", "Minute", 0) => member(P::DateMinute),
            ("DateTime", "Second", 0) => member(P::DateSecond),
            ("DateTime", "DayOfWeek", 0) => member(P::DateDayOfWeek),
            ("DateTime", "DayOfYear", 0) => member(P::DateDayOfYear),
            ("DateTime", "Date", 0) => member(P::DateDate),
            ("DateTime", "Today", 0) => member(P::DateToday),
            ("Interval", "Days", 0) => member(P::IntervalDays),
            ("Interval", "Hours", 0) => member(P::IntervalHours),
            ("Interval", "Minutes", 0) => member(P::IntervalMinutes),
            ("Interval", "Seconds", 0) => member(P::IntervalSeconds),

            ("Range", "Contains", 1) => method(M::RangeContains),
            ("Range", "ContainedBy", 1) => method(M::RangeContainedBy),
            ("Range", "Overlaps", 1) => method(M::RangeOverlaps),
            ("Range", "IsStrictlyLeftOf", 1) => method(M::RangeIsStrictlyLeftOf),
            ("Range", "IsStrictlyRightOf", 1) => method(M::RangeIsStrictlyRightOf),
            ("Range", "DoesNotExtendLeftOf", 1) => method(M::RangeDoesNotExtendLeftOf),
            ("Range", "DoesNotExtendRightOf", 1) => method(M::RangeDoesNotExtendRightOf),
            ("Range", "IsAdjacentTo", 1) => method(M::RangeIsAdjacentTo),
            ("Range", "Union", 1) => method(M::RangeUnion),
            ("Range", "Intersect", 1) => method(M::RangeIntersect),
            ("Range", "Except", 1) => method(M::RangeExcept),
            ("Range", "Merge", 1) => method(M::RangeMerge),
            ("Range", "Lower", 0) => member(P::RangeLower),
            ("Range", "Upper", 0) => member(P::RangeUpper),
            ("Range", "IsEmpty", 0) => member(P::RangeIsEmpty),
            ("Range", "LowerInclusive", 0) => member(P::RangeLowerInclusive),
            ("Range", "UpperInclusive", 0) => member(P::RangeUpperInclusive),
            ("Range", "LowerInfinite", 0) => member(P::RangeLowerInfinite),
            ("Range", "UpperInfinite", 0) => member(P::RangeUpperInfinite),

            ("Network", "Contains", 1) => method(M::NetContains),
            ("Network", "ContainsOrEquals", 1) => method(M::NetContainsOrEquals),
            ("Network", "ContainedBy", 1) => method(M::NetContainedBy),
            ("Network", "ContainedByOrEquals", 1) => method(M::NetContainedByOrEquals),
            ("Network", "Overlaps", 1) => method(M::NetOverlaps),
            ("Network", "And", 1) => method(M::NetAnd),
            ("Network", "Or", 1) => method(M::NetOr),
            ("Network", "Not", 0) => method(M::NetNot),
            ("Network", "Add", 1) => method(M::NetAdd),
            ("Network", "Subtract", 1) => method(M::NetSubtract),
            ("Network", "Abbreviate", 0) => method(M::NetAbbrev),
            ("Network", "Broadcast", 0) => method(M::NetBroadcast),
            ("Network", "Family", 0) => method(M::NetFamily),
            ("Network", "Host", 0) => method(M::NetHost),
            ("Network", "MaskLength", 0) => method(M::NetMaskLen),
            ("Network", "Netmask", 0) => method(M::NetNetmask),
            ("Network", "Network", 0) => method(M::NetNetwork),
            ("Network", "SetMaskLength", 1) => method(M::NetSetMaskLen),
            ("Network", "Text", 0) => method(M::NetText),
            ("Network", "SameFamily", 1) => method(M::NetSameFamily),
            ("Network", "Merge", 1) => method(M::NetMerge),
            ("Network", "Truncate", 0) => method(M::MacTruncate),
            ("Network", "Set7BitMac8", 0) => method(M::Mac8Set7Bit),

            ("LTree", "IsAncestorOf", 1) => method(M::LTreeIsAncestorOf),
            ("LTree", "IsDescendantOf", 1) => method(M::LTreeIsDescendantOf),
            ("LTree", "MatchesLQuery", 1) => method(M::LTreeMatchesLQuery),
            ("LTree", "MatchesLTxtQuery", 1) => method(M::LTreeMatchesLTxtQuery),
            ("LTree", "Concat", 1) => method(M::LTreeConcat),
            ("LTree", "Subtree", 2) => method(M::LTreeSubtree),
            ("LTree", "Subpath", 1 | 2) => method(M::LTreeSubpath),
            ("LTree", "IndexOf", 1 | 2) => method(M::LTreeIndex),
            ("LTree", "LongestCommonAncestor", 1) => method(M::LTreeLca),
            ("LTree", "Levels", 0) => member(P::LTreeLevels),

            ("FullText", "Matches", 1) => method(M::TsMatches),
            ("FullText", "Concat", 1) => method(M::TsConcat),
            ("FullText", "Rank", 1 | 2) => method(M::TsRank),
            ("FullText", "RankCoverDensity", 1 | 2) => method(M::TsRankCd),
            ("FullText", "Headline", 2 | 3) => method(M::TsHeadline),
            ("FullText", "SetWeight", 1) => method(M::TsSetWeight),
            ("FullText", "Rewrite", 2) => method(M::TsRewrite),
            ("FullText", "Delete", 1) => method(M::TsDelete),
            ("FullText", "ToTsVector", 1 | 2) => method(M::ToTsVector),
            ("FullText", "ToTsQuery", 1 | 2) => method(M::ToTsQuery),
            ("FullText", "PlainToTsQuery", 1 | 2) => method(M::PlainToTsQuery),
            ("FullText", "PhraseToTsQuery", 1 | 2) => method(M::PhraseToTsQuery),
            ("FullText", "WebSearchToTsQuery", 1 | 2) => method(M::WebSearchToTsQuery),
            ("FullText", "And", 1) => method(M::TsQueryAnd),
            ("FullText", "Or", 1) => method(M::TsQueryOr),
            ("FullText", "Not", 0) => method(M::TsQueryNot),
            ("FullText", "QueryContains", 1) => method(M::TsQueryContains),
            ("FullText", "Length", 0) => member(P::TsVectorLength),

            ("Trigram", "Similarity", 2) => method(M::TrgSimilarity),
            ("Trigram", "WordSimilarity", 2) => method(M::TrgWordSimilarity),
            ("Trigram", "StrictWordSimilarity", 2) => method(M::TrgStrictWordSimilarity),
            ("Trigram", "IsSimilarTo", 2) => method(M::TrgSimilar),
            ("Trigram", "WordSimilarTo", 2) => method(M::TrgWordSimilar),
            ("Trigram", "StrictWordSimilarTo", 2) => method(M::TrgStrictWordSimilar),
            ("Trigram", "SimilarityDistance", 2) => method(M::TrgSimilarityDistance),
            ("Trigram", "WordSimilarityDistance", 2) => method(M::TrgWordSimilarityDistance),
            ("Trigram", "StrictWordSimilarityDistance", 2) => {
                method(M::TrgStrictWordSimilarityDistance)
            }

            ("Row", "GreaterThan", 2) => method(M::RowGreaterThan),
            ("Row", "LessThan", 2) => method(M::RowLessThan),
            ("Row", "GreaterThanOrEqual", 2) => method(M::RowGreaterThanOrEqual),
            ("Row", "LessThanOrEqual", 2) => method(M::RowLessThanOrEqual),
            ("Row", "Equal", 2) => method(M::RowEqual),
            ("Row", "NotEqual", 2) => method(M::RowNotEqual),

            ("Math", "Greatest", _) if arity >= 2 => method(M::Greatest),
            ("Math", "Least", _) if arity >= 2 => method(M::Least),
            ("Object", "NullIf", 2) => method(M::NullIf),
            ("Guid", "NewGuid", 0) => method(M::NewGuid),
            ("Convert", "ToInt16", 1) => method(M::ConvertToInt16),
            ("Convert", "ToInt32", 1) => method(M::ConvertToInt32),
            ("Convert", "ToInt64", 1) => method(M::ConvertToInt64),
            ("Convert", "ToDouble", 1) => method(M::ConvertToDouble),
            ("Convert", "ToDecimal", 1) => method(M::ConvertToDecimal),
            ("Convert", "ToBoolean", 1) => method(M::ConvertToBool),
            ("Convert", "ToString", 1) => method(M::ConvertToString),
            ("Object", "ToString", 0) => method(M::ObjectToString),

            ("Enumerable", "Sum", 0 | 1) => aggregate(A::Sum),
            ("Enumerable", "Average", 0 | 1) => aggregate(A::Average),
            ("Enumerable", "Min", 0 | 1) => aggregate(A::Min),
            ("Enumerable", "Max", 0 | 1) => aggregate(A::Max),
            ("Enumerable", "Count", 0) => aggregate(A::Count),
            ("Enumerable", "LongCount", 0) => aggregate(A::LongCount),
            ("Statistics", "VariancePopulation", 1) => aggregate(A::VariancePopulation),
            ("Statistics", "VarianceSample", 1) => aggregate(A::VarianceSample),
            ("Statistics", "StandardDeviationPopulation", 1) => {
                aggregate(A::StandardDeviationPopulation)
            }
            ("Statistics", "StandardDeviationSample", 1) => aggregate(A::StandardDeviationSample),
            ("Statistics", "Correlation", 1) => aggregate(A::Correlation),
            ("Statistics", "CovariancePopulation", 1) => aggregate(A::CovariancePopulation),
            ("Statistics", "CovarianceSample", 1) => aggregate(A::CovarianceSample),
            ("Statistics", "RegressionSlope", 1) => aggregate(A::RegressionSlope),
            ("Statistics", "RegressionIntercept", 1) => aggregate(A::RegressionIntercept),
            ("Statistics", "RegressionR2", 1) => aggregate(A::RegressionR2),
            ("Statistics", "RegressionAverageX", 1) => aggregate(A::RegressionAverageX),
            ("Statistics", "RegressionAverageY", 1) => aggregate(A::RegressionAverageY),
            ("Statistics", "RegressionCount", 1) => aggregate(A::RegressionCount),
            ("String", "Join", 2) => aggregate(A::StringJoin),
            ("Enumerable", "ToArray", 0) => aggregate(A::ArrayAgg),
            ("Json", "Agg", 1) => aggregate(A::JsonAgg),
            ("Jsonb", "Agg", 1) => aggregate(A::JsonbAgg),
            ("Json", "ObjectAgg", 1) => aggregate(A::JsonObjectAgg),
            ("Jsonb", "ObjectAgg", 1) => aggregate(A::JsonbObjectAgg),
            ("Enumerable", "All", 1) => aggregate(A::BoolAnd),
            ("Enumerable", "AnyTrue", 1) => aggregate(A::BoolOr),
            ("Range", "Agg", 1) => aggregate(A::RangeAgg),
            ("Range", "IntersectAgg", 1) => aggregate(A::RangeIntersectAgg),

            _ => None,
        }
    }
}
