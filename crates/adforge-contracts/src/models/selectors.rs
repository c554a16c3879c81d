use super::registry::{ModelRegistry, ModelSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_else(|| ModelRegistry::new(None)),
        }
    }

    pub fn select(
        &self,
        requested: Option<&str>,
        capability: &str,
    ) -> Result<ModelSelection, String> {
        let (fallback_reason, requested_text) = if let Some(requested_value) = requested {
            if let Some(model) = self.registry.ensure(requested_value, capability) {
                return Ok(ModelSelection {
                    model,
                    requested: Some(requested_value.to_string()),
                    fallback_reason: None,
                });
            }
            (
                Some(format!(
                    "Requested model '{requested_value}' unavailable for capability '{capability}'."
                )),
                Some(requested_value.to_string()),
            )
        } else {
            (Some("No model specified; using default.".to_string()), None)
        };

        let candidates = self.registry.by_capability(capability);
        let Some(model) = candidates.first().cloned() else {
            return Err(format!(
                "No models available for capability '{capability}'."
            ));
        };
        Ok(ModelSelection {
            model,
            requested: requested_text,
            fallback_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::super::registry::{ModelRegistry, ModelSpec};
    use super::ModelSelector;

    fn text_model(name: &str) -> ModelSpec {
        ModelSpec {
            name: name.to_string(),
            provider: "dryrun".to_string(),
            capabilities: vec!["text".to_string()],
            context_window: Some(8192),
        }
    }

    #[test]
    fn requested_capable_model_is_honored() {
        let selector = ModelSelector::new(None);
        let selection = selector
            .select(Some("gemini-2.5-flash-image"), "image")
            .unwrap();
        assert_eq!(selection.model.name, "gemini-2.5-flash-image");
        assert_eq!(selection.fallback_reason, None);
    }

    #[test]
    fn falls_back_when_requested_model_unavailable() {
        let selector = ModelSelector::new(None);
        let selection = selector.select(Some("missing"), "text").unwrap();
        assert_eq!(selection.model.name, "gemini-3-pro-preview");
        assert_eq!(selection.requested.as_deref(), Some("missing"));
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("Requested model 'missing' unavailable for capability 'text'.")
        );
    }

    #[test]
    fn no_request_uses_default_with_explanation() {
        let mut models = IndexMap::new();
        models.insert("only-text".to_string(), text_model("only-text"));
        let selector = ModelSelector::new(Some(ModelRegistry::new(Some(models))));
        let selection = selector.select(None, "text").unwrap();
        assert_eq!(selection.model.name, "only-text");
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("No model specified; using default.")
        );
    }

    #[test]
    fn raises_when_no_models_for_capability() {
        let mut models = IndexMap::new();
        models.insert("only-text".to_string(), text_model("only-text"));
        let selector = ModelSelector::new(Some(ModelRegistry::new(Some(models))));
        let err = selector.select(Some("gemini-2.5-flash-image"), "image").err();
        assert_eq!(
            err.as_deref(),
            Some("No models available for capability 'image'.")
        );
    }
}
