use crate::expr::Type;

/// The physical on-wire representation of a value in the target dialect.
/// Named variants exist for the store types the translation rules branch
/// on; everything else travels as `Named`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StoreType {
    Json,
    Jsonb,
    Hstore,
    Inet,
    Cidr,
    MacAddr,
    MacAddr8,
    LTree,
    LQuery,
    LTxtQuery,
    TsVector,
    TsQuery,
    Interval,
    Named(String),
}

impl StoreType {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.as_str() {
            "json" => StoreType::Json,
            "jsonb" => StoreType::Jsonb,
            "hstore" => StoreType::Hstore,
            "inet" => StoreType::Inet,
            "cidr" => StoreType::Cidr,
            "macaddr" => StoreType::MacAddr,
            "macaddr8" => StoreType::MacAddr8,
            "ltree" => StoreType::LTree,
            "lquery" => StoreType::LQuery,
            "ltxtquery" => StoreType::LTxtQuery,
            "tsvector" => StoreType::TsVector,
            "tsquery" => StoreType::TsQuery,
            "interval" => StoreType::Interval,
            _ => StoreType::Named(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StoreType::Json => "json",
            StoreType::Jsonb => "jsonb",
            StoreType::Hstore => "hstore",
            StoreType::Inet => "inet",
            StoreType::Cidr => "cidr",
            StoreType::MacAddr => "macaddr",
            StoreType::MacAddr8 => "macaddr8",
            StoreType::LTree => "ltree",
            StoreType::LQuery => "lquery",
            StoreType::LTxtQuery => "ltxtquery",
            StoreType::TsVector => "tsvector",
            StoreType::TsQuery => "tsquery",
            StoreType::Interval => "interval",
            StoreType::Named(name) => name,
        }
    }

    /// Document-like stores carry dictionary/document operations.
    pub fn is_document_like(&self) -> bool {
        matches!(self, StoreType::Json | StoreType::Jsonb | StoreType::Hstore)
    }
}

/// Pure lookup from a domain type (plus an optional store-type hint from the
/// host's mapping catalog) to a store type. The engine only ever reads
/// through this trait; the catalog itself belongs to the host.
pub trait TypeMapper {
    fn resolve(&self, ty: &Type, hint: Option<&str>) -> Option<StoreType>;
}

/// Default mapping used when the host supplies no catalog of its own: the
/// hint wins, otherwise each domain type maps to its canonical store type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeMapper;

impl TypeMapper for DefaultTypeMapper {
    fn resolve(&self, ty: &Type, hint: Option<&str>) -> Option<StoreType> {
        if let Some(hint) = hint {
            return Some(StoreType::named(hint));
        }
        let store = match ty {
            Type::Dictionary => StoreType::Hstore,
            Type::Document => StoreType::Jsonb,
            Type::Inet => StoreType::Inet,
            Type::Cidr => StoreType::Cidr,
            Type::MacAddr => StoreType::MacAddr,
            Type::MacAddr8 => StoreType::MacAddr8,
            Type::LTree => StoreType::LTree,
            Type::LQuery => StoreType::LQuery,
            Type::LTxtQuery => StoreType::LTxtQuery,
            Type::TsVector => StoreType::TsVector,
            Type::TsQuery => StoreType::TsQuery,
            Type::Interval => StoreType::Interval,
            Type::Range(elem) => StoreType::named(match elem.as_ref() {
                Type::Int32 => "int4range",
                Type::Int64 => "int8range",
                Type::Decimal => "numrange",
                Type::Date => "daterange",
                Type::Timestamp => "tsrange",
                Type::TimestampTz => "tstzrange",
                other => return Some(StoreType::Named(format!("{}range", other.dialect_name()))),
            }),
            other => StoreType::Named(other.dialect_name().to_string()),
        };
        Some(store)
    }
}
