use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<String>,
    pub context_window: Option<u64>,
}

impl ModelSpec {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|item| item == capability)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: &str) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: &str) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert =
        |name: &str, provider: &str, capabilities: &[&str], context_window: Option<u64>| {
            map.insert(
                name.to_string(),
                ModelSpec {
                    name: name.to_string(),
                    provider: provider.to_string(),
                    capabilities: capabilities
                        .iter()
                        .map(|item| (*item).to_string())
                        .collect(),
                    context_window,
                },
            );
        };

    insert("gemini-3-pro-preview", "gemini", &["text"], Some(128000));
    insert("gemini-2.5-flash-image", "gemini", &["image"], None);
    insert("gemini-3-pro-image-preview", "gemini", &["image"], None);
    insert("dryrun-text-1", "dryrun", &["text"], Some(8192));
    insert("dryrun-image-1", "dryrun", &["image"], None);

    map
}

#[cfg(test)]
mod tests {
    use super::ModelRegistry;

    #[test]
    fn defaults_cover_both_capabilities() {
        let registry = ModelRegistry::new(None);
        assert!(registry
            .ensure("gemini-3-pro-preview", "text")
            .is_some());
        assert!(registry
            .ensure("gemini-2.5-flash-image", "image")
            .is_some());
    }

    #[test]
    fn ensure_rejects_capability_mismatch() {
        let registry = ModelRegistry::new(None);
        assert!(registry.ensure("gemini-3-pro-preview", "image").is_none());
        assert!(registry.ensure("gemini-2.5-flash-image", "text").is_none());
        assert!(registry.ensure("no-such-model", "text").is_none());
    }

    #[test]
    fn first_capable_model_is_the_default() {
        let registry = ModelRegistry::new(None);
        let text = registry.by_capability("text");
        assert_eq!(text.first().map(|model| model.name.as_str()), Some("gemini-3-pro-preview"));
        let image = registry.by_capability("image");
        assert_eq!(
            image.first().map(|model| model.name.as_str()),
            Some("gemini-2.5-flash-image")
        );
    }
}
