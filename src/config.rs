//! Presence configuration shape and the coercion rules the form uses when
//! writing back into the working copy.

use serde::{Deserialize, Serialize};

/// Discord caps an activity at two buttons.
pub const MAX_BUTTONS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub url: String,
}

/// A full Rich Presence configuration. An all-empty value means "unconfigured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub large_image: String,
    #[serde(rename = "large_text", default)]
    pub large_image_text: String,
    #[serde(default)]
    pub small_image: String,
    #[serde(rename = "small_text", default)]
    pub small_image_text: String,
    #[serde(default)]
    pub party_size: u32,
    #[serde(default)]
    pub max_party_size: u32,
    #[serde(rename = "timestamps", default)]
    pub show_timestamps: bool,
    /// Absent and empty both deserialize to an empty list, so equality never
    /// has to distinguish between them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

/// Form fields that take a raw string from an input control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    ClientId,
    Details,
    State,
    LargeImage,
    LargeImageText,
    SmallImage,
    SmallImageText,
    PartySize,
    MaxPartySize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonField {
    Label,
    Url,
}

/// Parse a party size from form input, keeping the leading run of digits
/// (`"3 players"` is 3). No digits, a sign or overflow gives 0.
fn coerce_count(raw: &str) -> u32 {
    let trimmed = raw.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed.get(..end).and_then(|d| d.parse().ok()).unwrap_or(0)
}

pub fn set_field(mut working: Configuration, field: ConfigField, raw: &str) -> Configuration {
    match field {
        ConfigField::ClientId => working.client_id = raw.to_string(),
        ConfigField::Details => working.details = raw.to_string(),
        ConfigField::State => working.state = raw.to_string(),
        ConfigField::LargeImage => working.large_image = raw.to_string(),
        ConfigField::LargeImageText => working.large_image_text = raw.to_string(),
        ConfigField::SmallImage => working.small_image = raw.to_string(),
        ConfigField::SmallImageText => working.small_image_text = raw.to_string(),
        ConfigField::PartySize => working.party_size = coerce_count(raw),
        ConfigField::MaxPartySize => working.max_party_size = coerce_count(raw),
    }
    working
}

pub fn set_show_timestamps(mut working: Configuration, enabled: bool) -> Configuration {
    working.show_timestamps = enabled;
    working
}

/// Replace one field of the button at `index`.
///
/// # Panics
///
/// Panics if `index` is out of range; the form only renders controls for
/// buttons that exist.
#[allow(clippy::indexing_slicing)]
pub fn set_button_field(
    mut working: Configuration,
    index: usize,
    field: ButtonField,
    value: &str,
) -> Configuration {
    assert!(
        index < working.buttons.len(),
        "button index {index} out of range (len {})",
        working.buttons.len()
    );
    let button = &mut working.buttons[index];
    match field {
        ButtonField::Label => button.label = value.to_string(),
        ButtonField::Url => button.url = value.to_string(),
    }
    working
}

pub fn add_button(mut working: Configuration) -> Configuration {
    if working.buttons.len() < MAX_BUTTONS {
        working.buttons.push(Button::default());
    }
    working
}

/// # Panics
///
/// Panics if `index` is out of range.
pub fn remove_button(mut working: Configuration, index: usize) -> Configuration {
    assert!(
        index < working.buttons.len(),
        "button index {index} out of range (len {})",
        working.buttons.len()
    );
    working.buttons.remove(index);
    working
}
