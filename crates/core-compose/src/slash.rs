//! Display-only hints for slash commands.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashCommand {
    pub usage: &'static str,
    pub description: &'static str,
}

pub const SLASH_COMMANDS: &[SlashCommand] = &[
    SlashCommand {
        usage: "/build <title>",
        description: "start a build",
    },
    SlashCommand {
        usage: "/b <update>",
        description: "update a build",
    },
    SlashCommand {
        usage: "/ship <title>",
        description: "ship something",
    },
    SlashCommand {
        usage: "/seek <question>",
        description: "ask for help",
    },
];

/// Commands whose usage starts with the typed text. Empty unless the buffer
/// begins with `/`.
pub fn slash_hints(text: &str) -> Vec<&'static SlashCommand> {
    let Some(typed) = text.strip_prefix('/') else {
        return Vec::new();
    };
    SLASH_COMMANDS
        .iter()
        .filter(|c| c.usage[1..].starts_with(typed))
        .collect()
}

/// Messages that create a project, so the project pool should be refreshed.
pub fn creates_project(body: &str) -> bool {
    body.starts_with("/build ")
}
