#[cfg(test)]
#[path = "theme_test.rs"]
mod tests;

use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
pub enum DocumentTheme {
    #[strum(serialize = "Corporate Blue")]
    CorporateBlue,
    #[strum(serialize = "Eco Green")]
    EcoGreen,
    #[strum(serialize = "Modern Minimalist (Black/White)")]
    ModernMinimalist,
    #[strum(serialize = "Vibrant Startup")]
    VibrantStartup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadingColor(pub u8, pub u8, pub u8);

impl HeadingColor {
    pub const BLACK: HeadingColor = HeadingColor(0, 0, 0);

    /// Hex form used by WordprocessingML, e.g. `000080`.
    pub fn hex(&self) -> String {
        return format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2);
    }
}

impl DocumentTheme {
    pub fn parse(text: &str) -> Option<DocumentTheme> {
        return DocumentTheme::iter().find(|e| return e.to_string() == text);
    }

    pub fn heading_color(&self) -> HeadingColor {
        match self {
            DocumentTheme::CorporateBlue => return HeadingColor(0, 0, 128),
            DocumentTheme::EcoGreen => return HeadingColor(34, 139, 34),
            DocumentTheme::ModernMinimalist => return HeadingColor::BLACK,
            DocumentTheme::VibrantStartup => return HeadingColor(255, 69, 0),
        }
    }

    /// Resolves a theme name as typed by the user. Names that don't match a
    /// theme get black headings.
    pub fn color_for(name: &str) -> HeadingColor {
        return DocumentTheme::parse(name)
            .map(|theme| return theme.heading_color())
            .unwrap_or(HeadingColor::BLACK);
    }
}
