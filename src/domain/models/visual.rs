use serde_derive::Deserialize;
use serde_derive::Serialize;

/// A document section paired with the prompt used to illustrate it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualItem {
    pub section: String,
    pub prompt: String,
}

impl VisualItem {
    pub fn new(section: &str, prompt: &str) -> VisualItem {
        return VisualItem {
            section: section.to_string(),
            prompt: prompt.to_string(),
        };
    }
}
