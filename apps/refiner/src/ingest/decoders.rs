//! Per-format decoders. Every failure is reported as `AppError::Adapter`
//! carrying the offending filename.
//!
//! PDF and DOCX parsing is CPU-bound and runs inside `spawn_blocking`.
//! OCR shells out to the `tesseract` binary under a timeout.

use std::io::{Cursor, Read};
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::Reader;
use tokio::process::Command;
use tracing::debug;

use crate::errors::AppError;

const DOCX_BODY: &str = "word/document.xml";

pub fn decode_text(filename: &str, bytes: Vec<u8>) -> Result<String, AppError> {
    String::from_utf8(bytes)
        .map_err(|_| AppError::adapter(filename, "file is not valid UTF-8 text"))
}

pub async fn decode_pdf(filename: &str, bytes: Vec<u8>) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::adapter(filename, format!("PDF decoder crashed: {e}")))?
        .map_err(|e| AppError::adapter(filename, format!("could not read PDF: {e}")))?;
    Ok(text)
}

pub async fn decode_docx(filename: &str, bytes: Vec<u8>) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || docx_text(bytes))
        .await
        .map_err(|e| AppError::adapter(filename, format!("DOCX decoder crashed: {e}")))?
        .map_err(|msg| AppError::adapter(filename, msg))
}

/// Paragraph text of `word/document.xml`, one paragraph per line.
fn docx_text(bytes: Vec<u8>) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("not a DOCX archive: {e}"))?;

    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|_| format!("archive has no {DOCX_BODY}"))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("could not read {DOCX_BODY}: {e}"))?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| format!("malformed document text: {e}"))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"w:p" => out.push('\n'),
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "malformed document XML at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }
    Ok(out.trim().to_string())
}

/// Runs `<tesseract_cmd> <path> stdout` and returns the recognized text.
pub async fn ocr_image(
    filename: &str,
    bytes: Vec<u8>,
    extension: &str,
    tesseract_cmd: &str,
    timeout: Duration,
) -> Result<String, AppError> {
    // tesseract reads from disk; keep the temp file alive until it exits.
    let mut file = tempfile::Builder::new()
        .prefix("refiner-ocr-")
        .suffix(&format!(".{extension}"))
        .tempfile()
        .map_err(|e| AppError::adapter(filename, format!("could not stage image: {e}")))?;
    std::io::Write::write_all(&mut file, &bytes)
        .map_err(|e| AppError::adapter(filename, format!("could not stage image: {e}")))?;

    let run = Command::new(tesseract_cmd)
        .arg(file.path())
        .arg("stdout")
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| {
            AppError::adapter(filename, format!("OCR timed out after {}s", timeout.as_secs()))
        })?
        .map_err(|e| AppError::adapter(filename, format!("could not run '{tesseract_cmd}': {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::adapter(
            filename,
            format!("OCR failed ({}): {}", output.status, stderr.trim()),
        ));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!(filename, chars = text.chars().count(), "OCR complete");
    Ok(text)
}
