//! Per-page text acquisition: direct extraction with OCR fallback
//!
//! Pages come from the PDF text layer when it is usable; otherwise the page
//! is rasterized and run through optical recognition. Each tool is a
//! short-lived external process, awaited before the next page starts.

use std::path::Path;
use tokio::process::Command;

use crate::config::{MIN_DIRECT_TEXT, RASTER_DPI};
use crate::error::{Error, Result};
use crate::types::{Extraction, Page};

/// Recognition language passed to tesseract.
const OCR_LANG: &str = "eng";
/// Page segmentation mode: a single uniform block, suited to manual pages.
const OCR_PSM: &str = "6";

/// Number of pages in the document, from `pdfinfo`.
pub async fn probe_page_count(pdf: &Path) -> Result<u32> {
    let output = Command::new("pdfinfo")
        .arg(pdf)
        .output()
        .await
        .map_err(|e| Error::external_tool("pdfinfo", e.to_string()))?;

    if !output.status.success() {
        return Err(Error::external_tool(
            "pdfinfo",
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ));
    }

    parse_page_count(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| Error::external_tool("pdfinfo", "no Pages line in output"))
}

fn parse_page_count(info: &str) -> Option<u32> {
    info.lines().find_map(|line| {
        let rest = line.strip_prefix("Pages:")?;
        rest.trim().parse().ok()
    })
}

/// Whether directly extracted text is long enough to skip recognition.
pub fn usable_direct_text(text: &str) -> bool {
    text.trim().chars().count() >= MIN_DIRECT_TEXT
}

/// Best-effort text for one page, recording which path produced it.
pub async fn acquire_page(pdf: &Path, page: u32) -> Result<Page> {
    let direct = extract_text(pdf, page).await?;
    if usable_direct_text(&direct) {
        return Ok(Page {
            number: page,
            text: direct,
            method: Extraction::Direct,
        });
    }

    tracing::debug!(page, "direct extraction too thin, falling back to recognition");
    let recognized = recognize_page(pdf, page).await?;
    Ok(Page {
        number: page,
        text: recognized,
        method: Extraction::Recognized,
    })
}

/// Direct text-layer extraction via `pdftotext`.
async fn extract_text(pdf: &Path, page: u32) -> Result<String> {
    let page_arg = page.to_string();
    let output = Command::new("pdftotext")
        .args(["-f", &page_arg, "-l", &page_arg, "-layout", "-enc", "UTF-8"])
        .arg(pdf)
        .arg("-")
        .output()
        .await
        .map_err(|e| Error::external_tool("pdftotext", e.to_string()))?;

    if !output.status.success() {
        return Err(Error::external_tool(
            "pdftotext",
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Rasterize the page at a fixed resolution and run recognition on it.
async fn recognize_page(pdf: &Path, page: u32) -> Result<String> {
    let scratch = tempfile::tempdir()?;
    let prefix = scratch.path().join("page");
    let page_arg = page.to_string();

    let raster = Command::new("pdftoppm")
        .args(["-f", &page_arg, "-l", &page_arg])
        .args(["-r", &RASTER_DPI.to_string(), "-png", "-singlefile"])
        .arg(pdf)
        .arg(&prefix)
        .output()
        .await
        .map_err(|e| Error::external_tool("pdftoppm", e.to_string()))?;

    if !raster.status.success() {
        return Err(Error::external_tool(
            "pdftoppm",
            String::from_utf8_lossy(&raster.stderr).into_owned(),
        ));
    }

    let image = prefix.with_extension("png");
    let ocr = Command::new("tesseract")
        .arg(&image)
        .arg("stdout")
        .args(["-l", OCR_LANG, "--psm", OCR_PSM])
        .output()
        .await
        .map_err(|e| Error::Recognition(e.to_string()))?;

    if !ocr.status.success() {
        return Err(Error::Recognition(
            String::from_utf8_lossy(&ocr.stderr).into_owned(),
        ));
    }

    Ok(String::from_utf8_lossy(&ocr.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_count() {
        let info = "Title: Owner Manual\nPages:          412\nEncrypted: no";
        assert_eq!(parse_page_count(info), Some(412));
        assert_eq!(parse_page_count("Title: x\nEncrypted: no"), None);
    }

    #[test]
    fn test_direct_text_threshold() {
        // 30 characters is the minimum usable length
        assert!(usable_direct_text(&"x".repeat(30)));
        assert!(!usable_direct_text(&"x".repeat(29)));
        // padding does not count toward the minimum
        assert!(!usable_direct_text(&format!("  {}  \n", "x".repeat(29))));
        assert!(!usable_direct_text(""));
    }
}
