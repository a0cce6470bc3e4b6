use crate::caret::BoundingBox;
use crate::prompt::Prompt;
use ratatui::layout::Rect;
use unicode_width::UnicodeWidthChar;

/// Position of one glyph in the container's cell grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphCell {
    pub col: u16,
    pub row: u16,
    pub width: u16,
}

/// Word-wrapped placement of a prompt inside a terminal rectangle.
///
/// Glyphs that land below the container have no cell, which is what the caret
/// locator treats as "not laid out yet".
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    container: Rect,
    cells: Vec<Option<GlyphCell>>,
    end_marker: Option<GlyphCell>,
    rows: u16,
}

impl TextLayout {
    pub fn wrap(prompt: &Prompt, container: Rect) -> Self {
        let width = container.width as usize;
        let chars = prompt.chars();

        if width == 0 || container.height == 0 {
            return Self {
                container,
                cells: vec![None; chars.len()],
                end_marker: None,
                rows: 0,
            };
        }

        let mut placed = Vec::with_capacity(chars.len());
        let (mut col, mut row) = (0usize, 0usize);
        let mut idx = 0;

        while idx < chars.len() {
            if chars[idx] == ' ' {
                // a space at the right edge hangs on its row
                placed.push((col, row, 1));
                col += 1;
                idx += 1;
                continue;
            }

            let end = chars[idx..]
                .iter()
                .position(|c| *c == ' ')
                .map_or(chars.len(), |p| idx + p);
            let word_width: usize = chars[idx..end].iter().map(|c| glyph_width(*c)).sum();

            if col > 0 && col + word_width > width {
                row += 1;
                col = 0;
            }

            for c in &chars[idx..end] {
                let w = glyph_width(*c);
                if col > 0 && col + w > width {
                    row += 1;
                    col = 0;
                }
                placed.push((col, row, w));
                col += w;
            }
            idx = end;
        }

        let height = container.height as usize;
        let to_cell = |(col, row, width): (usize, usize, usize)| {
            (row < height).then(|| GlyphCell {
                col: col as u16,
                row: row as u16,
                width: width as u16,
            })
        };

        Self {
            container,
            cells: placed.into_iter().map(&to_cell).collect(),
            end_marker: to_cell((col, row, 0)),
            rows: (row + 1) as u16,
        }
    }

    pub fn container(&self) -> Rect {
        self.container
    }

    pub fn cell(&self, idx: usize) -> Option<GlyphCell> {
        self.cells.get(idx).copied().flatten()
    }

    pub fn end_marker(&self) -> Option<GlyphCell> {
        self.end_marker
    }

    /// Rows the wrapped prompt needs, including any that do not fit
    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn glyph_boxes(&self) -> Vec<Option<BoundingBox>> {
        self.cells
            .iter()
            .map(|cell| cell.map(|c| self.to_box(c)))
            .collect()
    }

    pub fn end_marker_box(&self) -> Option<BoundingBox> {
        self.end_marker.map(|c| self.to_box(c))
    }

    pub fn container_box(&self) -> Option<BoundingBox> {
        let Rect {
            x,
            y,
            width,
            height,
        } = self.container;
        (width > 0 && height > 0).then(|| {
            BoundingBox::new(x as f64, y as f64, width as f64, height as f64)
        })
    }

    fn to_box(&self, cell: GlyphCell) -> BoundingBox {
        BoundingBox::new(
            self.container.x.saturating_add(cell.col) as f64,
            self.container.y.saturating_add(cell.row) as f64,
            cell.width as f64,
            1.0,
        )
    }
}

fn glyph_width(c: char) -> usize {
    c.width().unwrap_or(0)
}
