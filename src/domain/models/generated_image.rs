#[cfg(test)]
#[path = "generated_image_test.rs"]
mod tests;

use std::io::Cursor;

use anyhow::Result;
use image::DynamicImage;
use image::ImageOutputFormat;
use image::Rgb;
use image::RgbImage;
use serde_derive::Deserialize;
use serde_derive::Serialize;

pub const PLACEHOLDER_SIZE: u32 = 512;
const PLACEHOLDER_FILL: Rgb<u8> = Rgb([200, 200, 200]);
const PLACEHOLDER_BAND: Rgb<u8> = Rgb([120, 120, 120]);

/// An illustration ready to be placed in a document. The bytes are always PNG
/// encoded, whatever format the image model answered with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    #[serde(with = "base64_png")]
    pub png: Vec<u8>,
    /// Diagnostic text, only set on placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GeneratedImage {
    pub fn from_bytes(bytes: &[u8]) -> Result<GeneratedImage> {
        let img = image::load_from_memory(bytes)?;
        return Ok(GeneratedImage {
            png: encode_png(&img)?,
            label: None,
        });
    }

    /// Flat grey square with a darker band. The pixels are the same for every
    /// label; the label travels in `label` and is printed as a caption under
    /// the picture in the compiled document.
    pub fn placeholder(label: &str) -> GeneratedImage {
        let band = (PLACEHOLDER_SIZE / 2 - 16)..(PLACEHOLDER_SIZE / 2 + 16);
        let img = RgbImage::from_fn(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, |_, y| {
            if band.contains(&y) {
                return PLACEHOLDER_BAND;
            }
            return PLACEHOLDER_FILL;
        });

        let png = encode_png(&DynamicImage::ImageRgb8(img)).unwrap_or_else(|err| {
            tracing::error!(error = ?err, "Failed to encode placeholder image");
            return vec![];
        });

        return GeneratedImage {
            png,
            label: Some(label.to_string()),
        };
    }

    pub fn is_placeholder(&self) -> bool {
        return self.label.is_some();
    }

    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let img = image::load_from_memory(&self.png)?;
        return Ok((img.width(), img.height()));
    }
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(vec![]);
    img.write_to(&mut buf, ImageOutputFormat::Png)?;
    return Ok(buf.into_inner());
}

mod base64_png {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        return serializer.serialize_str(&STANDARD.encode(bytes));
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        return STANDARD.decode(encoded).map_err(serde::de::Error::custom);
    }
}
