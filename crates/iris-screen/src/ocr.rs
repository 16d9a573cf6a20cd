// Copyright (c) 2025-2026 Iris Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! OCR word elements and the id/text table fed to the text-locator model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Frame, ScreenError};

/// Word bounding box in screen pixels: `(left, top, width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl BBox {
    /// Left edge, vertically centred.  Anchor for the *start* of a span.
    pub fn left_mid(&self) -> (i32, i32) {
        (self.left, self.top + self.height / 2)
    }

    /// Right edge, vertically centred.  Anchor for the *end* of a span.
    pub fn right_mid(&self) -> (i32, i32) {
        (self.left + self.width, self.top + self.height / 2)
    }

    pub fn center(&self) -> (i32, i32) {
        (self.left + self.width / 2, self.top + self.height / 2)
    }
}

/// One recognised word.  `id` is a 0-based index stable within a single OCR
/// call only; duplicate texts are distinguished only by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrElement {
    pub id: usize,
    pub text: String,
    pub bbox: BBox,
}

/// Runs OCR over a frame, returning words left-to-right, top-to-bottom.
/// The engine itself is an external collaborator; tests use [`StaticOcr`].
#[async_trait]
pub trait TextLocator: Send + Sync {
    async fn ocr(&self, frame: &Frame) -> Result<Vec<OcrElement>, ScreenError>;
}

/// Test double returning a fixed element list for every frame.
#[derive(Default)]
pub struct StaticOcr {
    elements: Vec<OcrElement>,
}

impl StaticOcr {
    pub fn new(elements: Vec<OcrElement>) -> Self {
        Self { elements }
    }

    /// Lay `words` out on one line, each 60 px wide and 20 px tall.
    pub fn from_words(words: &[&str]) -> Self {
        let elements = words
            .iter()
            .enumerate()
            .map(|(id, w)| OcrElement {
                id,
                text: (*w).to_string(),
                bbox: BBox { left: (id as i32) * 60, top: 100, width: 50, height: 20 },
            })
            .collect();
        Self { elements }
    }
}

#[async_trait]
impl TextLocator for StaticOcr {
    async fn ocr(&self, _frame: &Frame) -> Result<Vec<OcrElement>, ScreenError> {
        Ok(self.elements.clone())
    }
}

// ─── Word table rendering ─────────────────────────────────────────────────────

/// Characters preserved at word edges in addition to alphabetic ones.
pub const OCR_EDGE_KEEP: &[char] = &[' ', '.', ',', '!', '?', ';', ':', '-', '+'];

/// Strip leading/trailing characters that are neither alphabetic nor in
/// `keep`.  Interior characters are untouched.
pub fn clean_ocr_text(text: &str, keep: &[char]) -> String {
    text.trim_matches(|c: char| !c.is_alphabetic() && !keep.contains(&c))
        .to_string()
}

/// Two-column "id \t cleaned-text" table consumed by the text-locator model.
pub fn render_ocr_table(elements: &[OcrElement], keep: &[char]) -> String {
    let mut out = String::from("id\ttext\n");
    for e in elements {
        out.push_str(&format!("{}\t{}\n", e.id, clean_ocr_text(&e.text, keep)));
    }
    out
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_anchor_points() {
        let b = BBox { left: 100, top: 200, width: 40, height: 20 };
        assert_eq!(b.left_mid(), (100, 210));
        assert_eq!(b.right_mid(), (140, 210));
        assert_eq!(b.center(), (120, 210));
    }

    #[test]
    fn clean_strips_non_alphabetic_edges() {
        assert_eq!(clean_ocr_text("«Save»", OCR_EDGE_KEEP), "Save");
        assert_eq!(clean_ocr_text("(cancel)", OCR_EDGE_KEEP), "cancel");
        assert_eq!(clean_ocr_text("#42#", OCR_EDGE_KEEP), "");
    }

    #[test]
    fn clean_keeps_listed_punctuation() {
        assert_eq!(clean_ocr_text("done.", OCR_EDGE_KEEP), "done.");
        assert_eq!(clean_ocr_text("-option", OCR_EDGE_KEEP), "-option");
        assert_eq!(clean_ocr_text("+add", OCR_EDGE_KEEP), "+add");
    }

    #[test]
    fn clean_leaves_interior_characters() {
        assert_eq!(clean_ocr_text("\"re-open\"", OCR_EDGE_KEEP), "re-open");
        assert_eq!(clean_ocr_text("*a(b)c*", OCR_EDGE_KEEP), "a(b)c");
    }

    #[test]
    fn table_contains_id_and_cleaned_text() {
        let els = StaticOcr::from_words(&["Hello,", "[world]"]).elements;
        let table = render_ocr_table(&els, OCR_EDGE_KEEP);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "id\ttext");
        assert_eq!(lines[1], "0\tHello,");
        assert_eq!(lines[2], "1\tworld");
    }

    #[tokio::test]
    async fn static_ocr_ids_are_sequential() {
        let ocr = StaticOcr::from_words(&["a", "b", "c"]);
        let f = Frame { png: Vec::new(), width: 1, height: 1 };
        let els = ocr.ocr(&f).await.unwrap();
        let ids: Vec<usize> = els.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
