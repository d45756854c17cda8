use crate::{
    call_site::{AggregateSite, CallSite, MemberSite},
    error::TranslateResult,
    store::{DefaultTypeMapper, TypeMapper},
    translate::{
        AggregateTranslator, Cx, MemberTranslator, MethodTranslator, aggregates, arrays, datetime,
        fulltext, json, ltree, misc, network, ranges, rowvalue, strings, trigram,
    },
    version::VersionGate,
};

/// The composite translator. Holds three ordered registries, populated once
/// at construction; each call site is offered to the registered rules in
/// order and the first non-empty result wins. Purely a function of its
/// registries and the input: the same call site always lowers the same way.
pub struct Dispatcher {
    types: Box<dyn TypeMapper>,
    version: VersionGate,
    methods: Vec<Box<dyn MethodTranslator>>,
    members: Vec<Box<dyn MemberTranslator>>,
    aggregates: Vec<Box<dyn AggregateTranslator>>,
}

impl Dispatcher {
    /// The standard PostgreSQL rule set with the default store-type catalog.
    pub fn postgres(version: VersionGate) -> Self {
        Self::with_types(Box::new(DefaultTypeMapper), version)
    }

    /// Registration order: general-purpose rules first, then the domain
    /// rules. The label-path rules precede the generic array rules so that
    /// the lambda-over-array rewrite gets first refusal on predicates the
    /// generic path would otherwise decline one by one.
    pub fn with_types(types: Box<dyn TypeMapper>, version: VersionGate) -> Self {
        let methods: Vec<Box<dyn MethodTranslator>> = vec![
            Box::new(misc::MiscTranslator),
            Box::new(strings::StringTranslator),
            Box::new(datetime::DateTimeTranslator),
            Box::new(ltree::LTreeTranslator),
            Box::new(arrays::ArrayTranslator),
            Box::new(json::JsonTranslator),
            Box::new(ranges::RangeTranslator),
            Box::new(network::NetworkTranslator),
            Box::new(fulltext::FullTextTranslator),
            Box::new(trigram::TrigramTranslator),
            Box::new(rowvalue::RowValueTranslator),
        ];
        let members: Vec<Box<dyn MemberTranslator>> = vec![
            Box::new(strings::StringTranslator),
            Box::new(datetime::DateTimeTranslator),
            Box::new(arrays::ArrayTranslator),
            Box::new(json::JsonTranslator),
            Box::new(ranges::RangeTranslator),
            Box::new(ltree::LTreeTranslator),
            Box::new(fulltext::FullTextTranslator),
        ];
        let aggregates: Vec<Box<dyn AggregateTranslator>> = vec![
            Box::new(aggregates::SimpleAggregateTranslator),
            Box::new(aggregates::StatisticalAggregateTranslator),
            Box::new(aggregates::MiscAggregateTranslator),
        ];
        Dispatcher {
            types,
            version,
            methods,
            members,
            aggregates,
        }
    }

    fn cx(&self) -> Cx<'_> {
        Cx {
            types: self.types.as_ref(),
            version: self.version,
        }
    }

    pub fn translate_method(&self, call: &CallSite) -> TranslateResult {
        let cx = self.cx();
        for rule in &self.methods {
            if let Some(expr) = rule.translate(call, &cx)? {
                return Ok(Some(expr));
            }
        }
        Ok(None)
    }

    pub fn translate_member(&self, site: &MemberSite) -> TranslateResult {
        let cx = self.cx();
        for rule in &self.members {
            if let Some(expr) = rule.translate(site, &cx)? {
                return Ok(Some(expr));
            }
        }
        Ok(None)
    }

    pub fn translate_aggregate(&self, site: &AggregateSite) -> TranslateResult {
        let cx = self.cx();
        for rule in &self.aggregates {
            if let Some(expr) = rule.translate(site, &cx)? {
                return Ok(Some(expr));
            }
        }
        Ok(None)
    }
}

/// A build-time registry for hosts that need to interleave their own rules
/// with the standard set. Once `build` runs the sequence is fixed; there is
/// no post-construction registration.
pub struct DispatcherBuilder {
    types: Box<dyn TypeMapper>,
    version: VersionGate,
    methods: Vec<Box<dyn MethodTranslator>>,
    members: Vec<Box<dyn MemberTranslator>>,
    aggregates: Vec<Box<dyn AggregateTranslator>>,
}

impl DispatcherBuilder {
    pub fn new(version: VersionGate) -> Self {
        DispatcherBuilder {
            types: Box::new(DefaultTypeMapper),
            version,
            methods: Vec::new(),
            members: Vec::new(),
            aggregates: Vec::new(),
        }
    }

    pub fn types(mut self, types: Box<dyn TypeMapper>) -> Self {
        self.types = types;
        self
    }

    pub fn method(mut self, rule: Box<dyn MethodTranslator>) -> Self {
        self.methods.push(rule);
        self
    }

    pub fn member(mut self, rule: Box<dyn MemberTranslator>) -> Self {
        self.members.push(rule);
        self
    }

    pub fn aggregate(mut self, rule: Box<dyn AggregateTranslator>) -> Self {
        self.aggregates.push(rule);
        self
    }

    /// Appends the standard PostgreSQL rules after anything registered so
    /// far, so host-specific rules get first refusal.
    pub fn with_postgres_rules(mut self) -> Self {
        let standard = Dispatcher::with_types(Box::new(DefaultTypeMapper), self.version);
        self.methods.extend(standard.methods);
        self.members.extend(standard.members);
        self.aggregates.extend(standard.aggregates);
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            types: self.types,
            version: self.version,
            methods: self.methods,
            members: self.members,
            aggregates: self.aggregates,
        }
    }
}
