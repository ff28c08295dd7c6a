use std::io::Cursor;

use image::DynamicImage;
use image::ImageOutputFormat;
use image::Rgb;
use image::RgbImage;

/// Solid colour PNG of the given size.
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([10, 120, 200]));
    let mut buf = Cursor::new(vec![]);
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();

    return buf.into_inner();
}

pub fn plan_fixture() -> &'static str {
    return r#"
# Executive Summary
Harbor Loaf is a neighbourhood bakery focused on long-fermented sourdough.

## Mission Statement
Bake honest bread for the people who live around us.

# Market Research
Demand for artisanal bread grew steadily in the region.

#NotAHeading because there is no space
# Financial Highlights
Break-even is expected in month eighteen.

## Revenue Forecast
Year one revenue is projected at 420,000.

# Operational Plan
Two ovens, one shift, seven days a week.
"#
    .trim();
}
