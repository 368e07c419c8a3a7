//! PDF output for laid-out documents, using printpdf's built-in Helvetica.

use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Px, Rgb,
};

use crate::error::{HahnemannError, Result};
use crate::layout::{Document, DrawOp, FontWeight, Raster};

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn pdf_error(e: impl std::fmt::Display) -> HahnemannError {
    HahnemannError::PdfGeneration(e.to_string())
}

/// Render every page of `doc` and return the PDF bytes.
pub fn render(doc: &Document, title: &str) -> Result<Vec<u8>> {
    let geometry = doc.geometry();
    let (width, height) = (Mm(geometry.width), Mm(geometry.height));
    let (pdf, page1, layer1) = PdfDocument::new(title, width, height, "Layer 1");

    let fonts = Fonts {
        regular: pdf.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: pdf.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
    };

    for (idx, page) in doc.pages().iter().enumerate() {
        let layer = if idx == 0 {
            pdf.get_page(page1).get_layer(layer1)
        } else {
            let (page_idx, layer_idx) = pdf.add_page(width, height, "Layer 1");
            pdf.get_page(page_idx).get_layer(layer_idx)
        };

        for op in page.ops() {
            draw(&layer, op, &fonts, doc.assets(), geometry.height)?;
        }
    }

    pdf.save_to_bytes().map_err(pdf_error)
}

// Layout coordinates grow downwards from the top; PDF's grow upwards from the bottom.
fn draw(
    layer: &PdfLayerReference,
    op: &DrawOp,
    fonts: &Fonts,
    assets: &[Raster],
    page_height: f32,
) -> Result<()> {
    match op {
        DrawOp::Text {
            text,
            x,
            y,
            size,
            weight,
        } => {
            let font = match weight {
                FontWeight::Regular => &fonts.regular,
                FontWeight::Bold => &fonts.bold,
            };
            layer.use_text(text.as_str(), *size, Mm(*x), Mm(page_height - y), font);
        }
        DrawOp::Rule {
            x1,
            y1,
            x2,
            y2,
            thickness,
        } => {
            layer.set_outline_color(Color::Rgb(Rgb::new(0.55, 0.55, 0.55, None)));
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), Mm(page_height - y1)), false),
                    (Point::new(Mm(*x2), Mm(page_height - y2)), false),
                ],
                is_closed: false,
            });
        }
        DrawOp::Image {
            asset,
            x,
            y,
            width,
            height,
        } => {
            let raster = assets
                .get(*asset)
                .ok_or_else(|| pdf_error(format!("image asset {asset} is not registered")))?;
            place_image(layer, raster, *x, page_height - y - height, *width, *height);
        }
    }
    Ok(())
}

/// Place `raster` with its bottom-left corner at (`x`, `y`), stretched to `width` x `height` mm.
fn place_image(layer: &PdfLayerReference, raster: &Raster, x: f32, y: f32, width: f32, height: f32) {
    let image = Image::from(ImageXObject {
        width: Px(raster.width_px as usize),
        height: Px(raster.height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: raster.rgb.clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI = pixels / (mm / 25.4) fixes the width; scale_y corrects the height.
    let dpi = raster.width_px as f32 / (width / 25.4);
    let natural_height = raster.height_px as f32 / dpi * 25.4;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            dpi: Some(dpi),
            scale_y: Some(height / natural_height),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageGeometry;

    #[test]
    fn renders_a_multi_page_pdf() {
        let mut doc = Document::new(PageGeometry::A4);
        doc.current_page()
            .text("The Hahnemann Invoice", 14.0, 22.0, 18.0, FontWeight::Bold);
        doc.add_page().rule(14.0, 30.0, 196.0, 30.0, 0.4);
        let asset = doc.add_asset(Raster {
            width_px: 2,
            height_px: 2,
            rgb: vec![200; 12],
        });
        doc.stamp_every_page(DrawOp::Image {
            asset,
            x: 30.0,
            y: 50.0,
            width: 150.0,
            height: 150.0,
        });

        let bytes = render(&doc, "invoice").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn unknown_asset_is_an_error() {
        let mut doc = Document::new(PageGeometry::A4);
        doc.current_page().push(DrawOp::Image {
            asset: 3,
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        });
        assert!(matches!(
            render(&doc, "invoice"),
            Err(HahnemannError::PdfGeneration(_))
        ));
    }
}
