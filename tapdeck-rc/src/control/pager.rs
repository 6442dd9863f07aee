//! Queue paging window
//!
//! A paging view over the engine's play queue, padded with one sentinel
//! slot on each end so the user can swipe past either edge and land on
//! the opposite real track. The engine's queue index stays authoritative:
//! metadata-driven resyncs only move the displayed page, and only a
//! settle that the user initiated ever sends a queue-position command.
//! Mixing those two paths up produces an endless resync loop, so user
//! intent is tagged strictly between drag-start and idle-settle.

use tracing::debug;

use crate::control::input::ScrollState;
use crate::error::{EngineResult, Error, Result};
use crate::remote::proxy::EngineProxy;
use crate::render::Render;

/// Translate a displayed page into a real queue index
///
/// Page 0 is the leading sentinel (wraps to the last track); page
/// `queue_length + 1` is the trailing sentinel (wraps to the first).
fn translate_page(page: usize, queue_length: usize) -> usize {
    if page == 0 {
        queue_length.saturating_sub(1)
    } else if page - 1 >= queue_length {
        0
    } else {
        page - 1
    }
}

/// Sentinel-padded paging window over the engine's queue
#[derive(Debug)]
pub struct QueueCursor {
    total_slots: usize,
    current_page: usize,
    from_user: bool,
}

impl QueueCursor {
    /// Build the window from the engine's queue length
    ///
    /// A window cannot be constructed from partial data: failure here is
    /// fatal to the controlling view, not a retry.
    pub async fn attach(proxy: &EngineProxy) -> Result<Self> {
        let queue_length = proxy
            .queue_length()
            .await
            .map_err(|e| Error::QueueWindow(format!("queue length unavailable: {}", e)))?;

        Ok(Self {
            total_slots: queue_length + 2,
            current_page: 0,
            from_user: false,
        })
    }

    /// Window size including both sentinel slots
    pub fn total_slots(&self) -> usize {
        self.total_slots
    }

    /// Currently displayed page
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Re-fetch the engine's queue index and move the displayed page
    ///
    /// Never issues a queue-position command; doing so here would feed
    /// the engine's own change back to it.
    pub async fn resync<R: Render>(
        &mut self,
        proxy: &EngineProxy,
        render: &mut R,
    ) -> EngineResult<()> {
        let page = proxy.queue_position().await? + 1;
        self.current_page = page;
        render.render_page(page);
        Ok(())
    }

    /// Track pager scroll state to tag user intent
    pub fn scroll_state(&mut self, state: ScrollState) {
        match state {
            ScrollState::Dragging => self.from_user = true,
            ScrollState::Idle => self.from_user = false,
            ScrollState::Settling => {}
        }
    }

    /// A page was selected; relay it to the engine only if the user did it
    pub async fn page_selected(&mut self, proxy: &EngineProxy, page: usize) -> EngineResult<()> {
        self.current_page = page;

        if !self.from_user {
            // Programmatic page change (resync); never echo it back
            return Ok(());
        }

        let queue_length = proxy.queue_length().await?;
        if queue_length == 0 {
            self.from_user = false;
            return Ok(());
        }

        let index = translate_page(page, queue_length);
        debug!(page, index, "User settled on queue page");
        proxy.set_queue_position(index).await?;
        self.from_user = false;
        Ok(())
    }

    /// Queue length changed; resize the window
    pub fn queue_resized(&mut self, queue_length: usize) {
        self.total_slots = queue_length + 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_interior_pages() {
        assert_eq!(translate_page(1, 5), 0);
        assert_eq!(translate_page(3, 5), 2);
        assert_eq!(translate_page(5, 5), 4);
    }

    #[test]
    fn test_translate_leading_sentinel_wraps_to_last() {
        assert_eq!(translate_page(0, 5), 4);
    }

    #[test]
    fn test_translate_trailing_sentinel_wraps_to_first() {
        assert_eq!(translate_page(6, 5), 0);
    }

    #[test]
    fn test_translate_single_entry_queue() {
        assert_eq!(translate_page(0, 1), 0);
        assert_eq!(translate_page(1, 1), 0);
        assert_eq!(translate_page(2, 1), 0);
    }
}
