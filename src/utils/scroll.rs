/// Viewport position over growing content.
///
/// Every content change pins the view to the bottom so the newest streamed
/// text stays visible, including when the content shrinks below the
/// previous offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollFollow {
    offset: usize,
    content_height: usize,
    viewport_height: usize,
}

impl ScrollFollow {
    pub fn new(viewport_height: usize) -> Self {
        Self {
            offset: 0,
            content_height: 0,
            viewport_height,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn max_offset(&self) -> usize {
        self.content_height.saturating_sub(self.viewport_height)
    }

    /// Call after every redraw with the new content height.
    pub fn content_changed(&mut self, content_height: usize) {
        self.content_height = content_height;
        self.offset = self.max_offset();
    }

    /// Visible line range as `start..end` over the content.
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        let end = (self.offset + self.viewport_height).min(self.content_height);
        self.offset..end
    }
}
