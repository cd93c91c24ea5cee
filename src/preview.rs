//! What a preview card shows for a configuration.

use serde::Serialize;

use crate::config::{Button, Configuration};

const NO_DETAILS: &str = "No details provided";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ImageSource {
    /// A direct image link.
    Url(String),
    /// An asset key uploaded to the Discord application.
    AssetKey(String),
}

impl ImageSource {
    fn from_field(value: &str) -> Option<Self> {
        if value.is_empty() {
            None
        } else if value.starts_with("http") {
            Some(Self::Url(value.to_string()))
        } else {
            Some(Self::AssetKey(value.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresencePreview {
    pub details: String,
    pub state: Option<String>,
    /// `"(2 of 4)"`, present only when both sizes are set.
    pub party: Option<String>,
    pub large_image: Option<ImageSource>,
    pub large_image_text: Option<String>,
    pub small_image: Option<ImageSource>,
    pub small_image_text: Option<String>,
    pub show_elapsed: bool,
    pub buttons: Vec<Button>,
    pub image_count: usize,
}

impl PresencePreview {
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl From<&Configuration> for PresencePreview {
    fn from(config: &Configuration) -> Self {
        let details = if config.details.is_empty() {
            NO_DETAILS.to_string()
        } else {
            config.details.clone()
        };

        let party = (config.party_size > 0 && config.max_party_size > 0)
            .then(|| format!("({} of {})", config.party_size, config.max_party_size));

        let large_image = ImageSource::from_field(&config.large_image);
        let small_image = ImageSource::from_field(&config.small_image);
        let image_count = [&large_image, &small_image]
            .iter()
            .filter(|i| i.is_some())
            .count();

        Self {
            details,
            state: non_empty(&config.state),
            party,
            large_image,
            large_image_text: non_empty(&config.large_image_text),
            small_image,
            small_image_text: non_empty(&config.small_image_text),
            show_elapsed: config.show_timestamps,
            buttons: config.buttons.clone(),
            image_count,
        }
    }
}
