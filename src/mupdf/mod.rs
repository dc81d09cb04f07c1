//! MuPDF decode engine
//!
//! MuPDF's `fz_context` is **NOT thread-safe**. Documents are either owned
//! by a single dedicated thread for their whole life, or reopened from
//! their bytes for each operation under a mutex (see [`SafeDocument`]).

mod engine;
mod render;
mod safe;
mod worker;

pub use engine::MupdfEngine;
pub use render::{open_pdf, render_page};
pub use safe::SafeDocument;
pub use worker::DecodeWorker;

#[cfg(test)]
pub(crate) mod test_support {
    /// Build a PDF with `pages` empty US Letter pages
    pub fn pdf_with_pages(pages: usize) -> Vec<u8> {
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                (0..pages)
                    .map(|i| format!("{} 0 R", i + 3))
                    .collect::<Vec<_>>()
                    .join(" "),
                pages
            ),
        ];
        for _ in 0..pages {
            objects.push(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << >> >>"
                    .to_string(),
            );
        }

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_offset = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF",
                objects.len() + 1,
                xref_offset
            )
            .as_bytes(),
        );
        pdf
    }

    pub fn minimal_pdf() -> Vec<u8> {
        pdf_with_pages(1)
    }
}
