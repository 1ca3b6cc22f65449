//! Content type detection from the leading bytes of a payload
//!
//! Follows the usual browser sniffing order: markup, documents, byte order
//! marks, images, audio/video, fonts, archives and finally plain text.
//! Image signatures are delegated to the `image` crate.

use image::ImageFormat;

/// Number of leading bytes inspected
pub const SNIFF_LEN: usize = 512;

/// Fallback when nothing matches
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Tags that mark a payload as HTML when they open the document
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// A byte signature: every `(offset, bytes)` part has to match and the
/// payload has to be at least `min_len` bytes long
struct Signature {
    parts: &'static [(usize, &'static [u8])],
    min_len: usize,
    content_type: &'static str,
}

impl Signature {
    fn matches(&self, data: &[u8]) -> bool {
        data.len() >= self.min_len
            && self.parts.iter().all(|(offset, bytes)| {
                data.get(*offset..offset + bytes.len())
                    .is_some_and(|window| window == *bytes)
            })
    }
}

const fn sig(parts: &'static [(usize, &'static [u8])], content_type: &'static str) -> Signature {
    Signature {
        parts,
        min_len: 0,
        content_type,
    }
}

/// Byte order marks only count in payloads of four bytes or more
const fn bom(mark: &'static [(usize, &'static [u8])], content_type: &'static str) -> Signature {
    Signature {
        parts: mark,
        min_len: 4,
        content_type,
    }
}

/// Signatures checked before images
const DOCUMENT_SIGNATURES: &[Signature] = &[
    sig(&[(0, b"%PDF-")], "application/pdf"),
    sig(&[(0, b"%!PS-Adobe-")], "application/postscript"),
    bom(&[(0, b"\xFE\xFF")], "text/plain; charset=utf-16be"),
    bom(&[(0, b"\xFF\xFE")], "text/plain; charset=utf-16le"),
    bom(&[(0, b"\xEF\xBB\xBF")], TEXT_PLAIN_UTF8),
];

/// Image signatures the `image` crate does not recognize
const CURSOR_SIGNATURES: &[Signature] = &[sig(&[(0, b"\x00\x00\x02\x00")], "image/x-icon")];

/// Signatures checked after images (mp4 has its own box check)
const MEDIA_SIGNATURES: &[Signature] = &[
    sig(&[(0, b"FORM"), (8, b"AIFF")], "audio/aiff"),
    sig(&[(0, b"ID3")], "audio/mpeg"),
    sig(&[(0, b"OggS\x00")], "application/ogg"),
    sig(&[(0, b"MThd\x00\x00\x00\x06")], "audio/midi"),
    sig(&[(0, b"RIFF"), (8, b"AVI ")], "video/avi"),
    sig(&[(0, b"RIFF"), (8, b"WAVE")], "audio/wave"),
];

const CONTAINER_SIGNATURES: &[Signature] = &[
    sig(&[(0, b"\x1A\x45\xDF\xA3")], "video/webm"),
    sig(&[(34, b"LP")], "application/vnd.ms-fontobject"),
    sig(&[(0, b"\x00\x01\x00\x00")], "font/ttf"),
    sig(&[(0, b"OTTO")], "font/otf"),
    sig(&[(0, b"ttcf")], "font/collection"),
    sig(&[(0, b"wOFF")], "font/woff"),
    sig(&[(0, b"wOF2")], "font/woff2"),
    sig(&[(0, b"\x1F\x8B\x08")], "application/x-gzip"),
    sig(&[(0, b"PK\x03\x04")], "application/zip"),
    sig(&[(0, b"Rar!\x1A\x07\x00")], "application/x-rar-compressed"),
    sig(&[(0, b"Rar!\x1A\x07\x01\x00")], "application/x-rar-compressed"),
    sig(&[(0, b"\x00\x61\x73\x6D")], "application/wasm"),
];

/// Detect the MIME type of a payload from at most its first [`SNIFF_LEN`] bytes.
///
/// Always returns a valid MIME type; unrecognized binary data maps to
/// [`OCTET_STREAM`].
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some(content_type) = sniff_markup(data) {
        return content_type;
    }

    if let Some(s) = DOCUMENT_SIGNATURES.iter().find(|s| s.matches(data)) {
        return s.content_type;
    }

    if let Some(content_type) = sniff_image(data) {
        return content_type;
    }

    if let Some(s) = CURSOR_SIGNATURES.iter().find(|s| s.matches(data)) {
        return s.content_type;
    }

    if let Some(s) = MEDIA_SIGNATURES.iter().find(|s| s.matches(data)) {
        return s.content_type;
    }

    if is_mp4(data) {
        return "video/mp4";
    }

    if let Some(s) = CONTAINER_SIGNATURES.iter().find(|s| s.matches(data)) {
        return s.content_type;
    }

    if !data.iter().copied().any(is_binary_byte) {
        return TEXT_PLAIN_UTF8;
    }

    OCTET_STREAM
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

fn sniff_markup(data: &[u8]) -> Option<&'static str> {
    let start = data.iter().position(|b| !is_whitespace(*b))?;
    let data = &data[start..];

    let is_html = HTML_TAGS.iter().any(|tag| {
        data.len() > tag.len()
            && data[..tag.len()].eq_ignore_ascii_case(tag)
            && matches!(data[tag.len()], b' ' | b'>')
    });
    if is_html {
        return Some("text/html; charset=utf-8");
    }

    if data.starts_with(b"<?xml") {
        return Some("text/xml; charset=utf-8");
    }

    None
}

fn sniff_image(data: &[u8]) -> Option<&'static str> {
    match image::guess_format(data).ok()? {
        format @ (ImageFormat::Png
        | ImageFormat::Jpeg
        | ImageFormat::Gif
        | ImageFormat::WebP
        | ImageFormat::Bmp
        | ImageFormat::Ico
        | ImageFormat::Avif) => Some(format.to_mime_type()),
        _ => None,
    }
}

/// ISO base media file: an `ftyp` box whose brands include `mp4`
fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }

    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }

    // Offset 12 holds the minor version, not a brand.
    (8..box_size)
        .step_by(4)
        .filter(|offset| *offset != 12)
        .any(|offset| &data[offset..offset + 3] == b"mp4")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    #[test]
    fn test_detect_png() {
        assert_eq!(detect_content_type(PNG_HEADER), "image/png");
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(detect_content_type(b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00"), "image/jpeg");
    }

    #[test]
    fn test_detect_gif() {
        assert_eq!(detect_content_type(b"GIF89a\x01\x00\x01\x00"), "image/gif");
        assert_eq!(detect_content_type(b"GIF87a\x01\x00\x01\x00"), "image/gif");
    }

    #[test]
    fn test_detect_webp() {
        assert_eq!(detect_content_type(b"RIFF\x24\x00\x00\x00WEBPVP8 "), "image/webp");
    }

    #[test]
    fn test_riff_variants_are_not_images() {
        assert_eq!(detect_content_type(b"RIFF\x24\x00\x00\x00WAVEfmt "), "audio/wave");
        assert_eq!(detect_content_type(b"RIFF\x24\x00\x00\x00AVI LIST"), "video/avi");
    }

    #[test]
    fn test_unknown_binary_is_octet_stream() {
        assert_eq!(detect_content_type(b"\x00\x01\x02\x03garbage\x04"), OCTET_STREAM);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(detect_content_type(b"hello, frog"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_empty_payload_is_text() {
        assert_eq!(detect_content_type(b""), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_html_after_whitespace() {
        assert_eq!(
            detect_content_type(b"  \n<!doctype html><html></html>"),
            "text/html; charset=utf-8"
        );
        assert_eq!(detect_content_type(b"<p>hi</p>"), "text/html; charset=utf-8");
    }

    #[test]
    fn test_html_tag_needs_terminator() {
        // "<Pa" is not a <p> tag
        assert_eq!(detect_content_type(b"<Pa"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_xml() {
        assert_eq!(
            detect_content_type(b"<?xml version=\"1.0\"?><svg/>"),
            "text/xml; charset=utf-8"
        );
    }

    #[test]
    fn test_documents_and_archives() {
        assert_eq!(detect_content_type(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(detect_content_type(b"PK\x03\x04\x14\x00"), "application/zip");
        assert_eq!(detect_content_type(b"\x1F\x8B\x08\x00\x00"), "application/x-gzip");
    }

    #[test]
    fn test_bom_text() {
        assert_eq!(detect_content_type(b"\xFE\xFF\x00h"), "text/plain; charset=utf-16be");
        assert_eq!(detect_content_type(b"\xEF\xBB\xBFhi"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_short_bom_is_not_matched() {
        assert_eq!(detect_content_type(b"\xFE\xFF"), "text/plain; charset=utf-8");
        assert_eq!(detect_content_type(b"\xFF\xFEh"), "text/plain; charset=utf-8");
        assert_eq!(detect_content_type(b"\xFF\xFEh\x00"), "text/plain; charset=utf-16le");
    }

    #[test]
    fn test_detect_cursor_and_icon() {
        assert_eq!(detect_content_type(b"\x00\x00\x02\x00\x01\x00\x20\x20"), "image/x-icon");
        assert_eq!(detect_content_type(b"\x00\x00\x01\x00\x01\x00\x20\x20"), "image/x-icon");
    }

    #[test]
    fn test_mp4() {
        let mut data = Vec::new();
        data.extend_from_slice(&24u32.to_be_bytes());
        data.extend_from_slice(b"ftypisom");
        data.extend_from_slice(&[0, 0, 2, 0]);
        data.extend_from_slice(b"isommp41");
        assert_eq!(detect_content_type(&data), "video/mp4");
    }

    #[test]
    fn test_only_prefix_is_inspected() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(detect_content_type(&data), "text/plain; charset=utf-8");
    }
}
