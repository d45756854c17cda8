//! Lowers typed call sites from a host query compiler into PostgreSQL
//! expression trees.
//!
//! The host hands over method calls, member accesses and aggregate
//! invocations whose operands are already lowered [`expr::SqlExpr`]
//! subtrees; the [`dispatch::Dispatcher`] offers each site to a fixed
//! sequence of per-domain rules and returns the first rule's output. A rule
//! that does not recognize a site declines, leaving the host to fall back
//! to its generic handling; a rule that recognizes a site it cannot lower
//! correctly fails with an [`error::Error`] instead of guessing.

pub mod call_site;
pub mod dispatch;
pub mod error;
pub mod expr;
pub mod ops;
pub mod store;
pub mod translate;
pub mod version;

pub use call_site::{AggregateSite, CallSite, GroupSelector, MemberSite};
pub use dispatch::{Dispatcher, DispatcherBuilder};
pub use error::{Error, TranslateResult};
pub use expr::{ExprRef, SqlExpr, Type, Value};
pub use ops::{AggregateOp, MemberOp, MethodOp, Operation};
pub use store::{DefaultTypeMapper, StoreType, TypeMapper};
pub use version::VersionGate;
