//! Form domain module.
//!
//! # Module Structure
//!
//! - `field`: Field block parsing and prompt rendering (`FieldSpec`)
//! - `primary_key`: Record keys and linking-token encoding
//! - `schema`: Validated per-form definition (`FormSchema`)
//! - `catalog`: All configured forms (`FormCatalog`)

mod catalog;
mod field;
mod primary_key;
mod schema;

pub use catalog::FormCatalog;
pub use field::{FieldSpec, parse_fields, render_fields};
pub use primary_key::{PrimaryKey, PrimaryKeyValue};
pub use schema::FormSchema;
