use crate::core::BlockKind;
use crate::trigger::{TriggerChar, TriggerContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandCategory {
    Basic,
    Lists,
    Blocks,
}

impl CommandCategory {
    pub fn label(self) -> &'static str {
        match self {
            CommandCategory::Basic => "Basic blocks",
            CommandCategory::Lists => "Lists",
            CommandCategory::Blocks => "Blocks",
        }
    }
}

/// A slash menu entry. Static, never stored in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub category: CommandCategory,
    pub target: BlockKind,
    pub shortcut_hint: Option<String>,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        category: CommandCategory,
        target: BlockKind,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            category,
            target,
            shortcut_hint: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn shortcut_hint(mut self, hint: impl Into<String>) -> Self {
        self.shortcut_hint = Some(hint.into());
        self
    }

    fn matches(&self, needle: &str) -> bool {
        self.label.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCatalog {
    commands: Vec<CommandSpec>,
}

impl CommandCatalog {
    pub fn new(mut commands: Vec<CommandSpec>) -> Self {
        commands.sort_by_key(|command| command.category);
        Self { commands }
    }

    pub fn standard() -> Self {
        use CommandCategory::*;
        Self::new(vec![
            CommandSpec::new("paragraph", "Text", Basic, BlockKind::Paragraph)
                .description("Just start writing with plain text."),
            CommandSpec::new("heading1", "Heading 1", Basic, BlockKind::heading(1))
                .description("Big section heading.")
                .shortcut_hint("#"),
            CommandSpec::new("heading2", "Heading 2", Basic, BlockKind::heading(2))
                .description("Medium section heading.")
                .shortcut_hint("##"),
            CommandSpec::new("heading3", "Heading 3", Basic, BlockKind::heading(3))
                .description("Small section heading.")
                .shortcut_hint("###"),
            CommandSpec::new("bulleted-list", "Bulleted list", Lists, BlockKind::BulletedItem)
                .description("Create a simple bulleted list.")
                .shortcut_hint("-"),
            CommandSpec::new("numbered-list", "Numbered list", Lists, BlockKind::NumberedItem)
                .description("Create a list with numbering.")
                .shortcut_hint("1."),
            CommandSpec::new("todo", "To-do list", Lists, BlockKind::todo())
                .description("Track tasks with a to-do list.")
                .shortcut_hint("[]"),
            CommandSpec::new("toggle", "Toggle list", Lists, BlockKind::toggle())
                .description("Toggles can hide and show content inside."),
            CommandSpec::new("quote", "Quote", Blocks, BlockKind::Quote)
                .description("Capture a quote.")
                .shortcut_hint(">"),
            CommandSpec::new("callout", "Callout", Blocks, BlockKind::Callout)
                .description("Make writing stand out."),
            CommandSpec::new("code", "Code", Blocks, BlockKind::Code)
                .description("Capture a code snippet.")
                .shortcut_hint("```"),
            CommandSpec::new("divider", "Divider", Blocks, BlockKind::Divider)
                .description("Visually divide blocks.")
                .shortcut_hint("---"),
        ])
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|command| command.id == id)
    }

    pub fn filter(&self, filter: &str) -> Vec<&CommandSpec> {
        let needle = filter.to_lowercase();
        self.commands
            .iter()
            .filter(|command| command.matches(&needle))
            .collect()
    }
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Command(CommandSpec),
    Tag(String),
    /// Synthetic "create new tag" entry carrying the typed filter.
    CreateTag(String),
}

impl MenuItem {
    pub fn label(&self) -> String {
        match self {
            MenuItem::Command(command) => command.label.clone(),
            MenuItem::Tag(name) => format!("#{name}"),
            MenuItem::CreateTag(name) => format!("Create new tag \"{name}\""),
        }
    }
}

/// Known tags containing `filter`, plus a create entry when nothing matches exactly.
pub fn filter_tags(tags: &[String], filter: &str) -> Vec<MenuItem> {
    let needle = filter.to_lowercase();
    let mut items: Vec<MenuItem> = tags
        .iter()
        .filter(|tag| tag.to_lowercase().contains(&needle))
        .map(|tag| MenuItem::Tag(tag.clone()))
        .collect();
    let exact = tags.iter().any(|tag| tag.to_lowercase() == needle);
    if !filter.is_empty() && !exact {
        items.push(MenuItem::CreateTag(filter.to_string()));
    }
    items
}

/// The stored casing of `typed` when the tag already exists.
pub fn resolve_tag_name(typed: &str, known: &[String]) -> String {
    let typed_lower = typed.to_lowercase();
    known
        .iter()
        .find(|tag| tag.to_lowercase() == typed_lower)
        .cloned()
        .unwrap_or_else(|| typed.to_string())
}

/// What committing a menu entry does to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommit {
    Block(BlockKind),
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub context: TriggerContext,
    pub items: Vec<MenuItem>,
    pub highlighted: usize,
}

impl MenuState {
    pub fn new(context: TriggerContext, catalog: &CommandCatalog, tags: &[String]) -> Self {
        let items = match context.trigger {
            TriggerChar::Slash => catalog
                .filter(&context.filter)
                .into_iter()
                .cloned()
                .map(MenuItem::Command)
                .collect(),
            TriggerChar::Hash => filter_tags(tags, &context.filter),
        };
        Self {
            context,
            items,
            highlighted: 0,
        }
    }

    pub fn with_highlighted(mut self, highlighted: usize) -> Self {
        self.highlighted = if self.items.is_empty() {
            0
        } else {
            highlighted.min(self.items.len() - 1)
        };
        self
    }

    pub fn is_visible(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.highlighted = (self.highlighted + 1) % self.items.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.items.is_empty() {
            self.highlighted = (self.highlighted + self.items.len() - 1) % self.items.len();
        }
    }

    pub fn highlighted_item(&self) -> Option<&MenuItem> {
        self.items.get(self.highlighted)
    }

    /// Converts the entry at `index` into a commit.
    ///
    /// Out of range falls back to the raw filter for tags and to nothing for
    /// slash commands.
    pub fn resolve(&self, index: usize, tags: &[String]) -> Option<MenuCommit> {
        match (self.context.trigger, self.items.get(index)) {
            (_, Some(MenuItem::Command(command))) => Some(MenuCommit::Block(command.target.clone())),
            (_, Some(MenuItem::Tag(name))) => Some(MenuCommit::Tag(name.clone())),
            (_, Some(MenuItem::CreateTag(name))) => {
                Some(MenuCommit::Tag(resolve_tag_name(name, tags)))
            }
            (TriggerChar::Hash, None) => self.raw_tag(tags),
            (TriggerChar::Slash, None) => None,
        }
    }

    pub fn raw_tag(&self, tags: &[String]) -> Option<MenuCommit> {
        if self.context.trigger != TriggerChar::Hash || self.context.filter.is_empty() {
            return None;
        }
        Some(MenuCommit::Tag(resolve_tag_name(&self.context.filter, tags)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPlacement {
    Below,
    Above,
}

/// Flips the menu above the caret when it would overflow the viewport.
pub fn menu_placement(caret_bottom: f32, menu_height: f32, viewport_height: f32) -> MenuPlacement {
    if caret_bottom + menu_height > viewport_height {
        MenuPlacement::Above
    } else {
        MenuPlacement::Below
    }
}
