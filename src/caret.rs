use crate::prompt::Prompt;

/// Axis-aligned box in the same units as the surrounding layout (pixels or cells)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Where to draw the caret, relative to the text container
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Caret {
    pub x: f64,
    pub y: f64,
    pub h: f64,
    pub visible: bool,
}

/// Unit-dependent constants for turning a glyph box into a caret
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaretMetrics {
    /// Shift left of the glyph edge
    pub x_offset: f64,
    pub min_height: f64,
}

impl CaretMetrics {
    /// One terminal cell per glyph; the caret sits on the glyph itself
    pub fn terminal() -> Self {
        Self {
            x_offset: 0.0,
            min_height: 1.0,
        }
    }
}

impl Default for CaretMetrics {
    fn default() -> Self {
        Self {
            x_offset: 2.0,
            min_height: 14.0,
        }
    }
}

/// Keeps the last caret so a layout miss can hide it without moving it
#[derive(Debug, Clone, Default)]
pub struct CaretLocator {
    metrics: CaretMetrics,
    caret: Caret,
}

impl CaretLocator {
    pub fn new(metrics: CaretMetrics) -> Self {
        Self {
            metrics,
            caret: Caret::default(),
        }
    }

    pub fn caret(&self) -> Caret {
        self.caret
    }

    /// Index of the next expected character, capped at the prompt length
    pub fn caret_index(prompt: &Prompt, typed_len: usize) -> usize {
        typed_len.min(prompt.len())
    }

    pub fn locate(
        &mut self,
        prompt: &Prompt,
        typed_len: usize,
        glyphs: &[Option<BoundingBox>],
        end_marker: Option<BoundingBox>,
        container: Option<BoundingBox>,
    ) -> Caret {
        let idx = Self::caret_index(prompt, typed_len);
        let glyph = if idx == prompt.len() {
            end_marker
        } else {
            glyphs.get(idx).copied().flatten()
        };

        match (glyph, container) {
            (Some(glyph), Some(container)) => {
                self.caret = Caret {
                    x: glyph.left - container.left - self.metrics.x_offset,
                    y: glyph.top - container.top,
                    h: glyph.height.max(self.metrics.min_height),
                    visible: true,
                };
            }
            _ => self.caret.visible = false,
        }

        self.caret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(n: usize) -> Vec<Option<BoundingBox>> {
        (0..n)
            .map(|i| Some(BoundingBox::new(110.0 + i as f64 * 10.0, 220.0, 10.0, 20.0)))
            .collect()
    }

    fn container() -> Option<BoundingBox> {
        Some(BoundingBox::new(100.0, 200.0, 400.0, 100.0))
    }

    #[test]
    fn test_locate_on_glyph() {
        let prompt = Prompt::new("abc");
        let mut locator = CaretLocator::default();

        let caret = locator.locate(&prompt, 1, &boxes(3), None, container());

        assert_eq!(
            caret,
            Caret {
                x: 120.0 - 100.0 - 2.0,
                y: 20.0,
                h: 20.0,
                visible: true,
            }
        );
    }

    #[test]
    fn test_locate_uses_end_marker_at_prompt_end() {
        let prompt = Prompt::new("abc");
        let mut locator = CaretLocator::default();
        let end = Some(BoundingBox::new(140.0, 220.0, 0.0, 20.0));

        let caret = locator.locate(&prompt, 3, &boxes(3), end, container());
        assert_eq!(caret.x, 38.0);
        assert!(caret.visible);

        // extra characters keep the caret on the end marker
        let caret = locator.locate(&prompt, 7, &boxes(3), end, container());
        assert_eq!(caret.x, 38.0);
    }

    #[test]
    fn test_min_height() {
        let prompt = Prompt::new("a");
        let mut locator = CaretLocator::default();
        let glyphs = vec![Some(BoundingBox::new(100.0, 200.0, 5.0, 9.0))];

        let caret = locator.locate(&prompt, 0, &glyphs, None, container());
        assert_eq!(caret.h, 14.0);
    }

    #[test]
    fn test_missing_layout_hides_without_moving() {
        let prompt = Prompt::new("abc");
        let mut locator = CaretLocator::default();
        let before = locator.locate(&prompt, 2, &boxes(3), None, container());

        let caret = locator.locate(&prompt, 3, &boxes(3), None, container());

        assert!(!caret.visible);
        assert_eq!((caret.x, caret.y, caret.h), (before.x, before.y, before.h));
    }

    #[test]
    fn test_missing_container_hides() {
        let prompt = Prompt::new("abc");
        let mut locator = CaretLocator::default();

        let caret = locator.locate(&prompt, 0, &boxes(3), None, None);
        assert!(!caret.visible);
    }

    #[test]
    fn test_terminal_metrics() {
        let prompt = Prompt::new("ab");
        let mut locator = CaretLocator::new(CaretMetrics::terminal());
        let glyphs = vec![
            Some(BoundingBox::new(4.0, 3.0, 1.0, 1.0)),
            Some(BoundingBox::new(5.0, 3.0, 1.0, 1.0)),
        ];

        let caret = locator.locate(
            &prompt,
            1,
            &glyphs,
            None,
            Some(BoundingBox::new(4.0, 3.0, 10.0, 2.0)),
        );
        assert_eq!((caret.x, caret.y, caret.h), (1.0, 0.0, 1.0));
    }

    #[test]
    fn test_caret_index_caps_at_prompt_len() {
        let prompt = Prompt::new("abc");
        assert_eq!(CaretLocator::caret_index(&prompt, 1), 1);
        assert_eq!(CaretLocator::caret_index(&prompt, 9), 3);
    }
}
