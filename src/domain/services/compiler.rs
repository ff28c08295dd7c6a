#[cfg(test)]
#[path = "compiler_test.rs"]
mod tests;

use std::io::Cursor;

use anyhow::Result;
use docx_rs::AlignmentType;
use docx_rs::BreakType;
use docx_rs::Docx;
use docx_rs::Paragraph;
use docx_rs::Pic;
use docx_rs::Run;
use docx_rs::Style;
use docx_rs::StyleType;
use indexmap::IndexMap;

use crate::domain::models::DocumentTheme;
use crate::domain::models::GeneratedImage;

pub const DOCUMENT_FILE_NAME: &str = "Business_Plan.docx";
pub const DOCUMENT_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Checked in order, the first one present becomes the cover picture.
pub const COVER_KEYS: [&str; 2] = ["The Cover Page", "Cover Page"];

const COVER_IMAGE_WIDTH_INCHES: u64 = 6;
const SECTION_IMAGE_WIDTH_INCHES: u64 = 5;
const EMU_PER_INCH: u64 = 914_400;

// Sizes are in half points.
const TITLE_SIZE: usize = 72;
const SLOGAN_SIZE: usize = 36;
const HEADING_1_SIZE: usize = 32;
const HEADING_2_SIZE: usize = 26;
const CAPTION_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Picture {
        key: &'a str,
        image: &'a GeneratedImage,
        width_inches: u64,
        centered: bool,
    },
    /// Placeholder label, right under its picture.
    Caption(&'a str),
    Spacer,
    Title(&'a str),
    Slogan(&'a str),
    PageBreak,
    Heading {
        level: u8,
        text: &'a str,
    },
    Paragraph(&'a str),
}

pub struct CompileRequest<'a> {
    pub business_name: &'a str,
    pub slogan: &'a str,
    /// `# ` starts a level 1 heading and `## ` a level 2 heading. Every other
    /// non blank line is a paragraph.
    pub plan_text: &'a str,
    pub theme: &'a str,
    pub images: &'a IndexMap<String, GeneratedImage>,
    /// Reserved for 3D-style charts and icons. Accepted, but nothing reads it
    /// yet.
    pub use_3d_assets: bool,
}

pub struct DocumentCompiler {}

impl DocumentCompiler {
    pub fn cover_image(
        images: &IndexMap<String, GeneratedImage>,
    ) -> Option<(&str, &GeneratedImage)> {
        return COVER_KEYS.iter().find_map(|key| {
            return images
                .get_key_value(*key)
                .map(|(k, v)| return (k.as_str(), v));
        });
    }

    /// First key, in map order, contained in the heading ignoring case. Cover
    /// images never match. Images are not consumed, so the same image can
    /// show up under several headings.
    pub fn section_image<'a>(
        heading: &str,
        images: &'a IndexMap<String, GeneratedImage>,
    ) -> Option<(&'a str, &'a GeneratedImage)> {
        let heading = heading.to_lowercase();
        return images.iter().find_map(|(key, image)| {
            let key_lower = key.to_lowercase();
            if !heading.contains(&key_lower) || key_lower.contains("cover") {
                return None;
            }
            return Some((key.as_str(), image));
        });
    }

    fn push_picture<'a>(
        blocks: &mut Vec<Block<'a>>,
        key: &'a str,
        image: &'a GeneratedImage,
        width_inches: u64,
        centered: bool,
    ) {
        blocks.push(Block::Picture {
            key,
            image,
            width_inches,
            centered,
        });
        if let Some(label) = &image.label {
            blocks.push(Block::Caption(label));
        }
    }

    pub fn layout<'a>(req: &CompileRequest<'a>) -> Vec<Block<'a>> {
        let mut blocks = vec![];

        if let Some((key, image)) = DocumentCompiler::cover_image(req.images) {
            DocumentCompiler::push_picture(
                &mut blocks,
                key,
                image,
                COVER_IMAGE_WIDTH_INCHES,
                true,
            );
        }

        blocks.push(Block::Spacer);
        blocks.push(Block::Title(req.business_name));
        blocks.push(Block::Slogan(req.slogan));
        blocks.push(Block::PageBreak);

        for line in req.plan_text.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(text) = line.strip_prefix("# ") {
                let text = text.trim();
                blocks.push(Block::Heading { level: 1, text });

                if let Some((key, image)) = DocumentCompiler::section_image(text, req.images) {
                    DocumentCompiler::push_picture(
                        &mut blocks,
                        key,
                        image,
                        SECTION_IMAGE_WIDTH_INCHES,
                        false,
                    );
                }
            } else if let Some(text) = line.strip_prefix("## ") {
                blocks.push(Block::Heading {
                    level: 2,
                    text: text.trim(),
                });
            } else {
                blocks.push(Block::Paragraph(line));
            }
        }

        return blocks;
    }

    fn picture(image: &GeneratedImage, width_inches: u64) -> Result<Pic> {
        let (width_px, height_px) = image.dimensions()?;
        let width_emu = width_inches * EMU_PER_INCH;
        let mut height_emu = width_emu;
        if width_px > 0 {
            height_emu = width_emu * u64::from(height_px) / u64::from(width_px);
        }

        return Ok(Pic::new(&image.png).size(width_emu as u32, height_emu as u32));
    }

    pub fn compile(req: &CompileRequest) -> Result<Vec<u8>> {
        if req.use_3d_assets {
            tracing::debug!("3D assets requested, nothing to add yet");
        }

        let color = DocumentTheme::color_for(req.theme).hex();

        let mut docx = Docx::new()
            .add_style(
                Style::new("Heading1", StyleType::Paragraph)
                    .name("Heading 1")
                    .size(HEADING_1_SIZE)
                    .bold(),
            )
            .add_style(
                Style::new("Heading2", StyleType::Paragraph)
                    .name("Heading 2")
                    .size(HEADING_2_SIZE)
                    .bold(),
            );

        for block in DocumentCompiler::layout(req) {
            let paragraph = match block {
                Block::Picture {
                    image,
                    width_inches,
                    centered,
                    ..
                } => {
                    let pic = DocumentCompiler::picture(image, width_inches)?;
                    let mut paragraph = Paragraph::new().add_run(Run::new().add_image(pic));
                    if centered {
                        paragraph = paragraph.align(AlignmentType::Center);
                    }
                    paragraph
                }
                Block::Caption(text) => Paragraph::new()
                    .add_run(Run::new().add_text(text).size(CAPTION_SIZE).italic())
                    .align(AlignmentType::Center),
                Block::Spacer => Paragraph::new(),
                Block::Title(text) => Paragraph::new()
                    .add_run(
                        Run::new()
                            .add_text(text)
                            .size(TITLE_SIZE)
                            .bold()
                            .color(&color),
                    )
                    .align(AlignmentType::Center),
                Block::Slogan(text) => Paragraph::new()
                    .add_run(Run::new().add_text(text).size(SLOGAN_SIZE).italic())
                    .align(AlignmentType::Center),
                Block::PageBreak => {
                    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
                }
                Block::Heading { level, text } => Paragraph::new()
                    .style(&format!("Heading{level}"))
                    .add_run(Run::new().add_text(text).color(&color)),
                Block::Paragraph(text) => Paragraph::new().add_run(Run::new().add_text(text)),
            };

            docx = docx.add_paragraph(paragraph);
        }

        let mut buf = Cursor::new(vec![]);
        docx.build().pack(&mut buf)?;

        return Ok(buf.into_inner());
    }
}
