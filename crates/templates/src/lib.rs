//! Calculation templates (template de cálculo) and their resolution.
//!
//! Templates are owned by the surrounding application; this crate treats them
//! as read-only configuration reached through the narrow [`TemplateDirectory`]
//! interface, resolved fresh on every calculation so an edit takes effect on
//! the next call without restart.

pub mod resolver;
pub mod template;

pub use resolver::TemplateResolver;
pub use template::{TemplateCalculo, TemplateDirectory, TemplateId, TemplateLookupError};
