//! Channel registry
//!
//! A fixed number of channels (tabs), each with a caption, the text appended
//! since the last reset and an unread counter that drives the caption badge.
//! The channel count is decided at startup and never changes afterwards.
//!
//! Indices come straight from untrusted datagrams, so every accessor is
//! bounds-checked and out-of-range indices are silently ignored.

/// One display slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    index: usize,
    caption: String,
    /// Appended fragments in arrival order; the buffer is their concatenation
    fragments: Vec<String>,
    unread: u32,
}

impl Channel {
    fn new(index: usize, caption: String) -> Self {
        Self {
            index,
            caption,
            fragments: Vec::new(),
            unread: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn unread(&self) -> u32 {
        self.unread
    }

    /// Accumulated text since the last reset
    pub fn buffer(&self) -> String {
        self.fragments.concat()
    }

    /// Individual appends, for renderers that lay them out as paragraphs
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Caption plus the unread badge, e.g. `"Errors (3)"`
    pub fn caption_with_badge(&self) -> String {
        if self.unread > 0 {
            format!("{} ({})", self.caption, self.unread)
        } else {
            self.caption.clone()
        }
    }

    fn reset(&mut self) {
        self.fragments.clear();
        self.unread = 0;
    }
}

/// Fixed-size, index-addressed collection of channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
}

impl ChannelRegistry {
    /// Create one empty channel per caption
    pub fn new<I, S>(captions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let channels = captions
            .into_iter()
            .enumerate()
            .map(|(index, caption)| Channel::new(index, caption.into()))
            .collect();
        Self { channels }
    }

    /// Number of channels (N)
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// All channels in index order
    pub fn get_all(&self) -> &[Channel] {
        &self.channels
    }

    pub fn get(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// Clear every buffer and unread count; captions are kept
    pub fn reset_all(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    /// Replace a caption; returns false when the index is out of range
    pub fn set_caption(&mut self, index: usize, caption: &str) -> bool {
        match self.channels.get_mut(index) {
            Some(channel) => {
                channel.caption = caption.to_string();
                true
            }
            None => false,
        }
    }

    /// Append already-formatted text and bump the unread count
    ///
    /// Empty text is not an update. Returns true when the channel changed.
    pub fn append(&mut self, index: usize, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self.channels.get_mut(index) {
            Some(channel) => {
                channel.fragments.push(text.to_string());
                channel.unread = channel.unread.saturating_add(1);
                true
            }
            None => false,
        }
    }

    pub fn caption_with_badge(&self, index: usize) -> Option<String> {
        self.channels.get(index).map(Channel::caption_with_badge)
    }

    pub fn buffer(&self, index: usize) -> Option<String> {
        self.channels.get(index).map(Channel::buffer)
    }

    /// Sum of unread counts across channels
    pub fn total_unread(&self) -> u64 {
        self.channels.iter().map(|c| u64::from(c.unread)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ChannelRegistry {
        ChannelRegistry::new(["A", "B", "C"])
    }

    #[test]
    fn test_new_channels_are_empty() {
        let reg = registry();
        assert_eq!(reg.len(), 3);
        for (i, channel) in reg.get_all().iter().enumerate() {
            assert_eq!(channel.index(), i);
            assert_eq!(channel.unread(), 0);
            assert!(channel.is_empty());
        }
    }

    #[test]
    fn test_append_concatenates_and_counts() {
        let mut reg = registry();
        assert!(reg.append(1, "one"));
        assert!(reg.append(1, "two"));

        assert_eq!(reg.buffer(1).as_deref(), Some("onetwo"));
        assert_eq!(reg.get(1).map(Channel::unread), Some(2));
        assert_eq!(reg.get(1).map(|c| c.fragments().len()), Some(2));
        assert_eq!(reg.buffer(0).as_deref(), Some(""));
    }

    #[test]
    fn test_empty_append_is_not_an_update() {
        let mut reg = registry();
        assert!(!reg.append(0, ""));
        assert_eq!(reg.get(0).map(Channel::unread), Some(0));
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut reg = registry();
        let before = reg.clone();

        assert!(!reg.append(3, "x"));
        assert!(!reg.set_caption(99, "x"));
        assert_eq!(reg.caption_with_badge(3), None);
        assert_eq!(reg.buffer(3), None);
        assert_eq!(reg, before);
    }

    #[test]
    fn test_badge_only_when_unread() {
        let mut reg = registry();
        assert_eq!(reg.caption_with_badge(0).as_deref(), Some("A"));

        reg.append(0, "x");
        reg.append(0, "y");
        assert_eq!(reg.caption_with_badge(0).as_deref(), Some("A (2)"));
        assert_eq!(reg.total_unread(), 2);
    }

    #[test]
    fn test_reset_all_keeps_captions() {
        let mut reg = registry();
        reg.set_caption(2, "Cookies");
        reg.append(0, "x");
        reg.append(2, "y");

        reg.reset_all();

        let captions: Vec<_> = reg.get_all().iter().map(|c| c.caption()).collect();
        assert_eq!(captions, ["A", "B", "Cookies"]);
        assert!(reg.get_all().iter().all(|c| c.unread() == 0 && c.is_empty()));
        assert_eq!(reg.caption_with_badge(2).as_deref(), Some("Cookies"));
    }
}
