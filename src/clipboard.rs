use log::{debug, warn};

/// Clipboard capability consumed by the custom passage editor.
pub trait Clipboard {
    fn get_text(&mut self) -> Option<String>;
    fn set_text(&mut self, text: &str);
}

/// Process-local clipboard.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            contents: Some(text.into()),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.contents.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.contents = Some(text.to_owned());
    }
}

/// System clipboard via `arboard`, backed by a local copy.
///
/// `arboard` fails in headless sessions and some terminals, so every failure
/// degrades to the in-process clipboard instead of surfacing to the user.
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
    fallback: MemoryClipboard,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let inner = match arboard::Clipboard::new() {
            Ok(cb) => Some(cb),
            Err(e) => {
                warn!("system clipboard unavailable, using local clipboard: {}", e);
                None
            }
        };
        Self {
            inner,
            fallback: MemoryClipboard::default(),
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&mut self) -> Option<String> {
        if let Some(cb) = self.inner.as_mut() {
            match cb.get_text() {
                Ok(text) => return Some(text),
                Err(e) => debug!("clipboard read failed: {}", e),
            }
        }
        self.fallback.get_text()
    }

    fn set_text(&mut self, text: &str) {
        self.fallback.set_text(text);
        if let Some(cb) = self.inner.as_mut() {
            if let Err(e) = cb.set_text(text.to_owned()) {
                debug!("clipboard write failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clipboard_starts_empty() {
        let mut cb = MemoryClipboard::default();
        assert_eq!(cb.get_text(), None);
    }

    #[test]
    fn memory_clipboard_keeps_last_value() {
        let mut cb = MemoryClipboard::with_text("first");
        assert_eq!(cb.get_text().as_deref(), Some("first"));
        cb.set_text("second");
        assert_eq!(cb.get_text().as_deref(), Some("second"));
    }
}
