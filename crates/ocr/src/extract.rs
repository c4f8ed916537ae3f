use crate::types::{Line, OcrDocument, Word};

/// Read-only projections over an [`OcrDocument`]. Order is always
/// region, then line, then word, exactly as received.
pub struct Extractor;

impl Extractor {
    pub fn all_lines(doc: &OcrDocument) -> impl Iterator<Item = &Line> {
        doc.regions.iter().flat_map(|r| r.lines.iter())
    }

    pub fn words(doc: &OcrDocument) -> impl Iterator<Item = &Word> {
        Self::all_lines(doc).flat_map(|l| l.words.iter())
    }

    /// One string per line across all regions. Repeated lines are kept.
    pub fn lines(doc: &OcrDocument) -> Vec<String> {
        Self::all_lines(doc).map(Line::text).collect()
    }

    /// Each line's text paired with the `y` of the line's own bounding box.
    pub fn lines_with_position(doc: &OcrDocument) -> Vec<(u32, String)> {
        Self::all_lines(doc)
            .map(|l| (l.bounding_box.top(), l.text()))
            .collect()
    }

    /// Every word joined by single spaces; line boundaries are lost.
    pub fn text(doc: &OcrDocument) -> String {
        Self::words(doc)
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
