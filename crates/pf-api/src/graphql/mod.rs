pub mod loaders;
pub mod schema;
pub mod types;

pub use schema::{build_schema, graphiql, graphql_handler, PinfluenceSchema};
