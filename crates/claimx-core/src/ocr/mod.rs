//! OCR word model and row segmentation.
//!
//! The OCR engine itself lives outside this crate. It hands us an
//! unordered list of words with their polygons; everything here works on
//! that list only.

mod rows;

pub use rows::{Row, RowClusterer, Rows};

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// A recognized word with its coordinates and content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWord")]
pub struct Word {
    /// Recognized text content.
    pub content: String,

    /// Quadrilateral coordinates (x1, y1, x2, y2, x3, y3, x4, y4), clockwise
    /// from the top-left vertex.
    pub polygon: [f32; 8],

    /// Recognition confidence reported by the OCR engine, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Wire shape of a word: either an 8-number polygon or a 4-number bbox.
#[derive(Deserialize)]
struct RawWord {
    content: String,
    #[serde(alias = "bbox")]
    polygon: Vec<f32>,
    #[serde(default)]
    confidence: Option<f32>,
}

impl TryFrom<RawWord> for Word {
    type Error = DocumentError;

    fn try_from(raw: RawWord) -> Result<Self, Self::Error> {
        let polygon = match raw.polygon.as_slice() {
            &[x1, y1, x2, y2, x3, y3, x4, y4] => [x1, y1, x2, y2, x3, y3, x4, y4],
            &[x, y, w, h] => bbox_to_polygon(x, y, w, h),
            other => {
                return Err(DocumentError::MalformedPolygon {
                    content: raw.content,
                    len: other.len(),
                })
            }
        };

        Ok(Self {
            content: raw.content,
            polygon,
            confidence: raw.confidence,
        })
    }
}

fn bbox_to_polygon(x: f32, y: f32, w: f32, h: f32) -> [f32; 8] {
    [x, y, x + w, y, x + w, y + h, x, y + h]
}

impl Word {
    /// Create a word from a full quadrilateral.
    pub fn new(content: impl Into<String>, polygon: [f32; 8]) -> Self {
        Self {
            content: content.into(),
            polygon,
            confidence: None,
        }
    }

    /// Create a word from an axis-aligned box (x, y, width, height).
    pub fn from_bbox(content: impl Into<String>, x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(content, bbox_to_polygon(x, y, w, h))
    }

    /// Y coordinate of the first vertex. This is the row-clustering key.
    pub fn top(&self) -> f32 {
        self.polygon[1]
    }

    /// X coordinate of the first vertex. Orders words inside a row.
    pub fn left(&self) -> f32 {
        self.polygon[0]
    }

    /// Get the axis-aligned bounding rectangle (min_x, min_y, max_x, max_y).
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.polygon[0], self.polygon[2], self.polygon[4], self.polygon[6]];
        let ys = [self.polygon[1], self.polygon[3], self.polygon[5], self.polygon[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }

    /// Number of ASCII digits in the content.
    pub fn digit_count(&self) -> usize {
        self.content.chars().filter(|c| c.is_ascii_digit()).count()
    }
}
