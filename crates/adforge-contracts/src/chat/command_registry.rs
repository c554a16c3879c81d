#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "text_model",
        action: "set_text_model",
    },
    CommandSpec {
        command: "image_model",
        action: "set_image_model",
    },
];

pub(crate) const SHOW_COMMAND: CommandSpec = CommandSpec {
    command: "show",
    action: "show_tab",
};

pub(crate) const IMAGE_COMMAND: CommandSpec = CommandSpec {
    command: "image",
    action: "generate_image",
};

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "tabs",
        action: "list_tabs",
    },
    CommandSpec {
        command: "summary",
        action: "show_summary",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

/// Dashboard tabs, in display order.
pub const TAB_NAMES: &[&str] = &[
    "decision-summary",
    "market-and-customers",
    "cold",
    "warm",
    "hot",
    "retargeting",
    "retention",
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/show <tab>",
    "/image <stage> <piece-id>",
    "/text_model <model>",
    "/image_model <model>",
    "/tabs",
    "/summary",
    "/help",
    "/quit",
];
