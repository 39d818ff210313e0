//! Paged access to the device configuration text
//!
//! The config blob is caller-supplied and externally owned; the server only
//! reads through it. Clients fetch it page by page over the `SYS/CONF`
//! property because a whole blob never fits a single frame.

/// Bytes per config page.
///
/// The largest `t/` payload that still fits a reply frame:
/// token + `/t/` + page must stay within `MAX_FRAME_LEN`.
pub const TEXT_PAGE_LEN: usize = 16;

/// An installed config blob with its page geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigPages<'c> {
    content: &'c [u8],
    page_count: usize,
}

impl<'c> ConfigPages<'c> {
    /// Wrap a config blob, computing its page count.
    ///
    /// Returns `None` for an empty blob; the config stays uninstalled.
    pub fn new(content: &'c [u8]) -> Option<Self> {
        if content.is_empty() {
            return None;
        }
        Some(Self {
            content,
            page_count: content.len().div_ceil(TEXT_PAGE_LEN),
        })
    }

    /// Total length of the blob in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Never true; empty blobs are rejected at construction
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of pages, `ceil(len / TEXT_PAGE_LEN)`
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Fetch one page by index.
    ///
    /// The final page is clamped to the content length; a page never reads
    /// past the end of the blob. Out-of-range indices return `None`.
    pub fn page(&self, index: usize) -> Option<&'c [u8]> {
        if index >= self.page_count {
            return None;
        }
        let start = index * TEXT_PAGE_LEN;
        let end = (start + TEXT_PAGE_LEN).min(self.content.len());
        Some(&self.content[start..end])
    }
}
