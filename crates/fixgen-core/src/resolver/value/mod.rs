//! Default members of the resolver chain

mod collection;
mod function;
mod literal;
mod optional;
mod parameter;
mod reference;

pub use collection::{ArrayResolver, DynamicArrayResolver, ListResolver, MAX_DYNAMIC_ARRAY_LEN};
pub use function::FunctionCallResolver;
pub use literal::LiteralResolver;
pub use optional::OptionalResolver;
pub use parameter::{ParameterResolver, VariableResolver};
pub use reference::{
    FixtureReferenceResolver, PropertyReferenceResolver, RangeReferenceResolver, SelfReferenceResolver,
    WildcardReferenceResolver,
};
