use std::collections::HashMap;
use std::sync::RwLock;

use coopsol_core::UnidadeId;
use coopsol_templates::{TemplateCalculo, TemplateDirectory, TemplateId, TemplateLookupError};

/// In-memory template directory.
///
/// Intended for tests/dev. Templates registered here behave like the remote
/// store: edits are visible on the next lookup, and the directory can be
/// flipped to "unavailable" to exercise the resolver's absorb path.
#[derive(Debug, Default)]
pub struct InMemoryTemplateDirectory {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    unit_assignments: HashMap<UnidadeId, TemplateId>,
    default_id: Option<TemplateId>,
    templates: HashMap<TemplateId, TemplateCalculo>,
    unavailable: bool,
}

impl InMemoryTemplateDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_template(&self, id: TemplateId, template: TemplateCalculo) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.templates.insert(id, template);
    }

    pub fn remove_template(&self, id: TemplateId) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.templates.remove(&id);
    }

    pub fn assign_to_unit(&self, unidade: UnidadeId, id: TemplateId) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.unit_assignments.insert(unidade, id);
    }

    pub fn set_default(&self, id: Option<TemplateId>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.default_id = id;
    }

    /// Simulate the remote store being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.unavailable = unavailable;
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, TemplateLookupError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| TemplateLookupError::Unavailable("lock poisoned".to_string()))?;
        if inner.unavailable {
            return Err(TemplateLookupError::Unavailable(
                "template store unreachable".to_string(),
            ));
        }
        Ok(inner)
    }
}

impl TemplateDirectory for InMemoryTemplateDirectory {
    fn unit_template_id(
        &self,
        unidade: UnidadeId,
    ) -> Result<Option<TemplateId>, TemplateLookupError> {
        Ok(self.read()?.unit_assignments.get(&unidade).copied())
    }

    fn default_template_id(&self) -> Result<Option<TemplateId>, TemplateLookupError> {
        Ok(self.read()?.default_id)
    }

    fn template(&self, id: TemplateId) -> Result<Option<TemplateCalculo>, TemplateLookupError> {
        Ok(self.read()?.templates.get(&id).cloned())
    }
}
