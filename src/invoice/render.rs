//! PDF rendering with printpdf's built-in Helvetica faces.

use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::InvoiceDocument;

const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;

#[derive(Debug, thiserror::Error)]
#[error("PDF rendering failed: {0}")]
pub struct RenderError(#[from] printpdf::Error);

pub fn render_pdf(document: &InvoiceDocument) -> Result<Vec<u8>, RenderError> {
    let (pdf, page, layer) =
        PdfDocument::new(&document.invoice_number, Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Invoice");
    let regular = pdf.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = pdf.add_builtin_font(BuiltinFont::HelveticaBold)?;

    for (index, runs) in document.layout().into_iter().enumerate() {
        let (page, layer) = if index == 0 {
            (page, layer)
        } else {
            pdf.add_page(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Invoice")
        };
        let canvas = pdf.get_page(page).get_layer(layer);
        for run in runs {
            let font = if run.bold { &bold } else { &regular };
            canvas.use_text(run.text, run.size, Mm(run.x), Mm(run.y), font);
        }
    }

    Ok(pdf.save_to_bytes()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn renders_a_pdf() {
        let document = InvoiceDocument {
            gallery_name: "Gallery".into(),
            invoice_number: "INV-2026-00007".into(),
            issued_at: Utc::now(),
            order_number: "ORD-20260301-AB12CD".into(),
            bill_to: vec!["Buyer".into()],
            lines: vec![],
            currency: "ZAR".into(),
            subtotal: 100,
            shipping: 0,
            vat: 15,
            total: 115,
            amount_paid: 115,
        };
        let bytes = render_pdf(&document).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
