//! Conversion between environment-specific IDs and portable name references.
//!
//! Export rewrites foreign keys into `{{ fromName('...') }}` tokens so a
//! project can be deployed into any environment; deploy turns the tokens back
//! into whatever IDs the target environment assigned.

pub mod id_to_name;
pub mod name_to_id;
pub mod table;
pub mod token;
pub mod walker;

pub use id_to_name::MissingMapping;
pub use name_to_id::EntityResolution;
pub use table::{IdNameTable, NameIdTable};
