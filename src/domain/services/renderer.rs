#[cfg(test)]
#[path = "renderer_test.rs"]
mod tests;

use crate::domain::models::BackendError;
use crate::domain::models::BackendRef;
use crate::domain::models::GeneratedImage;

pub const MISSING_KEY_LABEL: &str = "[Error: Missing API Key]";
pub const NO_DATA_LABEL: &str = "[Image: Generation Failed - No Data]";

pub struct ImageRenderer<'a> {
    backend: BackendRef<'a>,
    model: String,
}

impl<'a> ImageRenderer<'a> {
    pub fn new(backend: BackendRef<'a>, model: &str) -> ImageRenderer<'a> {
        return ImageRenderer {
            backend,
            model: model.to_string(),
        };
    }

    pub fn build_prompt(prompt: &str, style: &str) -> String {
        return format!(
            "High quality, professional business illustration. {prompt}. Style: {style}. 8k resolution, detailed."
        );
    }

    pub fn error_label(err: &anyhow::Error) -> String {
        let message = err.to_string().chars().take(50).collect::<String>();
        return format!("[Image: Generation Error - {message}...]");
    }

    /// Always yields an image. Anything that prevents a real one from being
    /// produced is reported through a labelled placeholder instead.
    pub async fn render(&self, prompt: &str, style: &str) -> GeneratedImage {
        if !self.backend.has_credential() {
            tracing::error!("No API key provided for image generation");
            return GeneratedImage::placeholder(MISSING_KEY_LABEL);
        }

        let full_prompt = ImageRenderer::build_prompt(prompt, style);
        let res = self.backend.generate_image(&self.model, &full_prompt).await;

        let bytes = match res {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::warn!("No image data found in response");
                return GeneratedImage::placeholder(NO_DATA_LABEL);
            }
            Err(err) => {
                if BackendError::is_missing_credential_err(&err) {
                    return GeneratedImage::placeholder(MISSING_KEY_LABEL);
                }
                tracing::error!(error = ?err, "Error generating image");
                return GeneratedImage::placeholder(&ImageRenderer::error_label(&err));
            }
        };

        match GeneratedImage::from_bytes(&bytes) {
            Ok(img) => return img,
            Err(err) => {
                tracing::error!(error = ?err, "Image data could not be decoded");
                return GeneratedImage::placeholder(&ImageRenderer::error_label(&err));
            }
        }
    }
}
