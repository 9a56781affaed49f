use tracing::{debug, warn};

use coopsol_core::UnidadeId;

use crate::template::{TemplateCalculo, TemplateDirectory, TemplateId, TemplateLookupError};

/// Decides which calculation template (if any) governs a billing calculation
/// for a given beneficiary unit.
///
/// Resolution is ordered and short-circuiting:
/// 1. the template explicitly assigned to the unit;
/// 2. the system-wide default template;
/// 3. none — the calculator's built-in formulas apply.
///
/// A lookup failure at any step is logged and treated as "not found" at that
/// step. Failures never abort the calculation; they only narrow the chain.
#[derive(Debug)]
pub struct TemplateResolver<D> {
    directory: D,
}

impl<D> TemplateResolver<D>
where
    D: TemplateDirectory,
{
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Resolve the governing template for `unidade`, if any.
    pub fn resolve(&self, unidade: UnidadeId) -> Option<TemplateCalculo> {
        if let Some(template) = self.unit_template(unidade) {
            debug!(%unidade, nome = %template.nome, "resolved unit-assigned template");
            return Some(template);
        }

        if let Some(template) = self.default_template() {
            debug!(%unidade, nome = %template.nome, "resolved system default template");
            return Some(template);
        }

        debug!(%unidade, "no calculation template; built-in formulas apply");
        None
    }

    fn unit_template(&self, unidade: UnidadeId) -> Option<TemplateCalculo> {
        let id = absorb(self.directory.unit_template_id(unidade), "unit_template_id")??;
        self.fetch(id)
    }

    fn default_template(&self) -> Option<TemplateCalculo> {
        let id = absorb(self.directory.default_template_id(), "default_template_id")??;
        self.fetch(id)
    }

    fn fetch(&self, id: TemplateId) -> Option<TemplateCalculo> {
        absorb(self.directory.template(id), "template")?
    }
}

/// Collapse a collaborator failure into "not found" for one lookup step.
fn absorb<T>(result: Result<T, TemplateLookupError>, step: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(%error, step, "template lookup failed; treating as not found");
            None
        }
    }
}
