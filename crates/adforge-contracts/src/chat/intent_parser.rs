use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, IMAGE_COMMAND, NO_ARG_COMMANDS, RAW_ARG_COMMANDS, SHOW_COMMAND, TAB_NAMES,
};

/// Parsed user input from the interactive surface. Bare text is a product
/// search; slash commands select tabs, trigger per-piece image generation,
/// or switch models.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub prompt: Option<String>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            prompt: None,
            command_args: BTreeMap::new(),
        }
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let remainder = &slash_tail[command_len..];
            let arg = if remainder.is_empty() {
                ""
            } else {
                remainder.trim()
            };

            if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
                let mut intent = Intent::new(action, text);
                intent
                    .command_args
                    .insert("model".to_string(), Value::String(arg.to_string()));
                return intent;
            }

            if command == SHOW_COMMAND.command {
                let tab = arg.to_ascii_lowercase();
                if TAB_NAMES.iter().any(|name| *name == tab) {
                    let mut intent = Intent::new(SHOW_COMMAND.action, text);
                    intent
                        .command_args
                        .insert("tab".to_string(), Value::String(tab));
                    return intent;
                }
                let mut intent = Intent::new("unknown_tab", text);
                intent
                    .command_args
                    .insert("tab".to_string(), Value::String(tab));
                return intent;
            }

            if command == IMAGE_COMMAND.command {
                let parts = parse_args(arg);
                let mut intent = Intent::new(IMAGE_COMMAND.action, text);
                intent.command_args.insert(
                    "stage".to_string(),
                    Value::String(
                        parts
                            .first()
                            .map(|value| value.to_ascii_lowercase())
                            .unwrap_or_default(),
                    ),
                );
                intent.command_args.insert(
                    "piece_id".to_string(),
                    Value::String(parts.get(1..).unwrap_or_default().join(" ")),
                );
                return intent;
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            let mut intent = Intent::new("unknown", text);
            intent
                .command_args
                .insert("command".to_string(), Value::String(command));
            intent
                .command_args
                .insert("arg".to_string(), Value::String(arg.to_string()));
            return intent;
        }
    }

    let mut intent = Intent::new("analyze", text);
    intent.prompt = Some(raw_trimmed.to_string());
    intent
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_intent;

    #[test]
    fn bare_text_is_a_product_search() {
        let intent = parse_intent("  Organic Honey 500g  ");
        assert_eq!(intent.action, "analyze");
        assert_eq!(intent.prompt.as_deref(), Some("Organic Honey 500g"));
    }

    #[test]
    fn empty_input_is_a_noop() {
        assert_eq!(parse_intent("   ").action, "noop");
    }

    #[test]
    fn parse_show_tab() {
        let intent = parse_intent("/show retargeting");
        assert_eq!(intent.action, "show_tab");
        assert_eq!(intent.command_args["tab"], json!("retargeting"));

        let upper = parse_intent("/show Decision-Summary");
        assert_eq!(upper.action, "show_tab");
        assert_eq!(upper.command_args["tab"], json!("decision-summary"));
    }

    #[test]
    fn unknown_tab_is_reported() {
        let intent = parse_intent("/show lukewarm");
        assert_eq!(intent.action, "unknown_tab");
        assert_eq!(intent.command_args["tab"], json!("lukewarm"));
    }

    #[test]
    fn parse_image_command() {
        let intent = parse_intent("/image cold cold-1");
        assert_eq!(intent.action, "generate_image");
        assert_eq!(intent.command_args["stage"], json!("cold"));
        assert_eq!(intent.command_args["piece_id"], json!("cold-1"));
    }

    #[test]
    fn parse_image_command_quoted_id() {
        let intent = parse_intent("/image warm \"piece one\"");
        assert_eq!(intent.command_args["stage"], json!("warm"));
        assert_eq!(intent.command_args["piece_id"], json!("piece one"));
    }

    #[test]
    fn image_command_with_missing_args_keeps_empty_fields() {
        let intent = parse_intent("/image");
        assert_eq!(intent.action, "generate_image");
        assert_eq!(intent.command_args["stage"], json!(""));
        assert_eq!(intent.command_args["piece_id"], json!(""));
    }

    #[test]
    fn parse_model_commands() {
        let text_model = parse_intent("/text_model gemini-3-pro-preview");
        assert_eq!(text_model.action, "set_text_model");
        assert_eq!(text_model.command_args["model"], json!("gemini-3-pro-preview"));

        let image_model = parse_intent("/image_model gemini-2.5-flash-image");
        assert_eq!(image_model.action, "set_image_model");
        assert_eq!(
            image_model.command_args["model"],
            json!("gemini-2.5-flash-image")
        );
    }

    #[test]
    fn parse_no_arg_commands() {
        assert_eq!(parse_intent("/tabs").action, "list_tabs");
        assert_eq!(parse_intent("/summary").action, "show_summary");
        assert_eq!(parse_intent("/help").action, "help");
        assert_eq!(parse_intent("/quit").action, "quit");
        assert_eq!(parse_intent("/exit").action, "quit");
    }

    #[test]
    fn parse_unknown_command() {
        let intent = parse_intent("/magic foo bar");
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.command_args["command"], json!("magic"));
        assert_eq!(intent.command_args["arg"], json!("foo bar"));
    }

    #[test]
    fn slash_followed_by_non_command_is_a_search() {
        let intent = parse_intent("/ 500g honey");
        assert_eq!(intent.action, "analyze");
        assert_eq!(intent.prompt.as_deref(), Some("/ 500g honey"));
    }
}
