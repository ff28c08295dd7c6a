#[cfg(test)]
#[path = "visual_assets_test.rs"]
mod tests;

use std::time::Duration;

use indexmap::IndexMap;

use super::ImageRenderer;
use super::VisualPlanner;
use crate::domain::models::BackendRef;
use crate::domain::models::GeneratedImage;

/// Plans which sections to illustrate, then renders them one by one.
pub struct VisualAssets<'a> {
    backend: BackendRef<'a>,
    planner: VisualPlanner<'a>,
    renderer: ImageRenderer<'a>,
}

impl<'a> VisualAssets<'a> {
    pub fn new(backend: BackendRef<'a>, planner_model: &str, image_model: &str) -> VisualAssets<'a> {
        return VisualAssets {
            backend,
            planner: VisualPlanner::new(backend, planner_model),
            renderer: ImageRenderer::new(backend, image_model),
        };
    }

    pub fn with_backoff_unit(mut self, backoff_unit: Duration) -> VisualAssets<'a> {
        self.planner = self.planner.with_backoff_unit(backoff_unit);
        return self;
    }

    /// `progress` receives the completed fraction and a status line after
    /// each image. A later item with the same section name replaces the
    /// earlier image.
    pub async fn generate<F>(
        &self,
        plan_text: &str,
        style: &str,
        mut progress: F,
    ) -> IndexMap<String, GeneratedImage>
    where
        F: FnMut(f32, &str),
    {
        let mut images = IndexMap::new();
        if !self.backend.has_credential() {
            tracing::warn!("Skipping visual generation, no API key");
            return images;
        }

        let items = self.planner.plan(plan_text, style).await;
        let total = items.len();

        for (idx, item) in items.iter().enumerate() {
            tracing::info!(
                section = item.section.as_str(),
                prompt = item.prompt.as_str(),
                "Generating image"
            );

            let image = self.renderer.render(&item.prompt, style).await;
            images.insert(item.section.to_string(), image);

            let fraction = (idx + 1) as f32 / total as f32;
            progress(
                fraction,
                &format!("Generating asset for: {}", item.section),
            );
        }

        return images;
    }
}
