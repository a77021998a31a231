//! Certificate artifact rendering.
//!
//! Produces a self-contained SVG document: header, code, company name,
//! validity window, the snapshotted document table, the content hash as
//! two fixed-width lines, and a QR code pointing at the public verifier.
//! Rendering is read-only; a failure here never affects a persisted
//! issuance.

use docuvi_core::error::DocuviResult;
use docuvi_core::models::certificate::{Certificate, CertificateDetail};
use qrcode::QrCode;
use qrcode::render::svg;

use crate::config::CertConfig;
use crate::error::CertError;

const PAGE_WIDTH: u32 = 700;
const ROW_HEIGHT: u32 = 24;

/// A rendered certificate artifact.
pub struct RenderedCertificate {
    pub svg: String,
    pub verification_url: String,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render a certificate into a printable SVG document.
pub fn render(
    certificate: &Certificate,
    client_name: &str,
    details: &[CertificateDetail],
    config: &CertConfig,
) -> DocuviResult<RenderedCertificate> {
    let verification_url = config.verification_url(&certificate.code);

    let qr = QrCode::new(verification_url.as_bytes())
        .map_err(|e| CertError::Rendering(e.to_string()))?;
    let qr_svg = qr
        .render::<svg::Color>()
        .min_dimensions(150, 150)
        .quiet_zone(true)
        .build();

    let table_top = 230;
    let page_height = table_top + (details.len() as u32 + 2) * ROW_HEIGHT + 280;

    let mut out = String::new();
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{PAGE_WIDTH}\" \
         height=\"{page_height}\" viewBox=\"0 0 {PAGE_WIDTH} {page_height}\" \
         font-family=\"Helvetica, Arial, sans-serif\">\n"
    ));
    out.push_str(&format!(
        "<rect width=\"{PAGE_WIDTH}\" height=\"{page_height}\" fill=\"#ffffff\" \
         stroke=\"#1a3c5e\" stroke-width=\"3\"/>\n"
    ));

    out.push_str(&format!(
        "<text x=\"{}\" y=\"60\" text-anchor=\"middle\" font-size=\"26\" \
         fill=\"#1a3c5e\">COMPLIANCE CERTIFICATE</text>\n",
        PAGE_WIDTH / 2
    ));
    out.push_str(&format!(
        "<text x=\"{}\" y=\"95\" text-anchor=\"middle\" font-size=\"16\" \
         fill=\"#444444\">{}</text>\n",
        PAGE_WIDTH / 2,
        escape(&certificate.code)
    ));
    out.push_str(&format!(
        "<text x=\"{}\" y=\"135\" text-anchor=\"middle\" font-size=\"20\">{}</text>\n",
        PAGE_WIDTH / 2,
        escape(client_name)
    ));
    out.push_str(&format!(
        "<text x=\"{}\" y=\"170\" text-anchor=\"middle\" font-size=\"14\" \
         fill=\"#444444\">Issued {} — valid from {} to {}</text>\n",
        PAGE_WIDTH / 2,
        certificate.issued_at.format("%Y-%m-%d"),
        certificate.valid_from,
        certificate.valid_to
    ));

    // Document table.
    out.push_str(&format!(
        "<text x=\"50\" y=\"{}\" font-size=\"14\" fill=\"#1a3c5e\">Documents \
         on file at issuance</text>\n",
        table_top - 10
    ));
    for (i, detail) in details.iter().enumerate() {
        let y = table_top + (i as u32 + 1) * ROW_HEIGHT;
        let expiry = detail
            .expires_at
            .map(|d| d.to_string())
            .unwrap_or_else(|| "no expiry".into());
        out.push_str(&format!(
            "<text x=\"50\" y=\"{y}\" font-size=\"12\">{}</text>\n\
             <text x=\"380\" y=\"{y}\" font-size=\"12\" fill=\"#444444\">approved {}</text>\n\
             <text x=\"560\" y=\"{y}\" font-size=\"12\" fill=\"#444444\">{}</text>\n",
            escape(&detail.document_type_name),
            detail.approved_at.format("%Y-%m-%d"),
            escape(&expiry)
        ));
    }

    // Content hash as two 32-char lines, monospaced.
    let hash_top = table_top + (details.len() as u32 + 2) * ROW_HEIGHT + 20;
    let (line_a, line_b) = certificate
        .hash
        .split_at(certificate.hash.len().min(32));
    out.push_str(&format!(
        "<text x=\"50\" y=\"{}\" font-size=\"11\" fill=\"#444444\">Fingerprint \
         (SHA-256)</text>\n",
        hash_top
    ));
    out.push_str(&format!(
        "<text x=\"50\" y=\"{}\" font-size=\"12\" font-family=\"monospace\">{}</text>\n",
        hash_top + 18,
        escape(line_a)
    ));
    out.push_str(&format!(
        "<text x=\"50\" y=\"{}\" font-size=\"12\" font-family=\"monospace\">{}</text>\n",
        hash_top + 34,
        escape(line_b)
    ));

    // Verification URL and QR.
    out.push_str(&format!(
        "<text x=\"50\" y=\"{}\" font-size=\"12\" fill=\"#1a3c5e\">Verify at {}</text>\n",
        hash_top + 70,
        escape(&verification_url)
    ));
    out.push_str(&format!(
        "<g transform=\"translate({}, {})\">{qr_svg}</g>\n",
        PAGE_WIDTH - 210,
        hash_top + 40
    ));

    out.push_str("</svg>\n");

    Ok(RenderedCertificate {
        svg: out,
        verification_url,
    })
}
