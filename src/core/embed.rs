//! Embed data independent of the Discord client.
//!
//! [`EmbedSpec`] is what the template engine produces; [`EmbedPatch`] is a set of
//! optional field edits used both for rendered embeds and for the embed-editing
//! commands, which apply a patch on top of an embed fetched from Discord.

use crate::errors::{Error, Result};

/// Default colour for freshly created embeds (the classic blurple).
pub const DEFAULT_EMBED_COLOR: u32 = 0x0072_89DA;

/// A rich embed described as plain data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedSpec {
    /// Body text
    pub description: String,
    /// Optional title
    pub title: Option<String>,
    /// Optional footer text
    pub footer: Option<String>,
    /// Optional footer icon URL
    pub footer_icon: Option<String>,
    /// Optional author name
    pub author: Option<String>,
    /// Optional author icon URL
    pub author_icon: Option<String>,
    /// Optional thumbnail URL
    pub thumbnail: Option<String>,
    /// Optional image URL
    pub image: Option<String>,
    /// Optional RGB colour
    pub color: Option<u32>,
}

impl EmbedSpec {
    /// Creates an embed with only a description.
    #[must_use]
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Merges every field that is set in `patch` into this embed.
    pub fn apply(&mut self, patch: &EmbedPatch) {
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        merge_field(&mut self.title, patch.title.as_ref());
        merge_field(&mut self.footer, patch.footer.as_ref());
        merge_field(&mut self.footer_icon, patch.footer_icon.as_ref());
        merge_field(&mut self.author, patch.author.as_ref());
        merge_field(&mut self.author_icon, patch.author_icon.as_ref());
        merge_field(&mut self.thumbnail, patch.thumbnail.as_ref());
        merge_field(&mut self.image, patch.image.as_ref());
        if patch.color.is_some() {
            self.color = patch.color;
        }
    }
}

fn merge_field(target: &mut Option<String>, value: Option<&String>) {
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

/// Optional edits to an embed. Unset fields leave the embed untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedPatch {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New footer text
    pub footer: Option<String>,
    /// New footer icon URL
    pub footer_icon: Option<String>,
    /// New author name
    pub author: Option<String>,
    /// New author icon URL
    pub author_icon: Option<String>,
    /// New thumbnail URL
    pub thumbnail: Option<String>,
    /// New image URL
    pub image: Option<String>,
    /// New colour
    pub color: Option<u32>,
    /// Stamp the embed with the current time
    pub timestamp: bool,
}

impl EmbedPatch {
    /// True when the patch would not change anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.footer.is_none()
            && self.footer_icon.is_none()
            && self.author.is_none()
            && self.author_icon.is_none()
            && self.thumbnail.is_none()
            && self.image.is_none()
            && self.color.is_none()
            && !self.timestamp
    }
}

/// Parses a message id typed by a user, tolerating surrounding whitespace.
pub fn parse_message_id(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidInput("Message ID must be an integer.".to_string()));
    }
    trimmed
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| Error::InvalidInput("Message ID must be an integer.".to_string()))
}

/// Parses a hex colour such as `#7289da` or `7289DA`.
pub fn parse_hex_color(input: &str) -> Result<u32> {
    let digits = input.trim().trim_start_matches('#');
    if digits.is_empty() || digits.len() > 6 {
        return Err(Error::InvalidInput(
            "Invalid hex color. Example: `#7289da`".to_string(),
        ));
    }
    u32::from_str_radix(digits, 16)
        .map_err(|_| Error::InvalidInput("Invalid hex color. Example: `#7289da`".to_string()))
}

/// Parses a role colour, which must be exactly `#RRGGBB`.
pub fn parse_role_color(input: &str) -> Result<u32> {
    let input = input.trim();
    if !input.starts_with('#') || input.len() != 7 {
        return Err(Error::InvalidInput(
            "Invalid hex color. Example: `#FF5733`".to_string(),
        ));
    }
    u32::from_str_radix(&input[1..], 16)
        .map_err(|_| Error::InvalidInput("Invalid hex color. Example: `#FF5733`".to_string()))
}
