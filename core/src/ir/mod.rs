pub mod ident;
pub mod model;

pub use ident::{Ident, TableRef};
pub use model::{AlterConstraint, FkAction, ForeignKey, SchemaModel, Table};
