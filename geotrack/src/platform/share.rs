//! Share sheet and clipboard.

use parking_lot::Mutex;

use super::PlatformError;
use crate::BoxFuture;

/// Content handed to the share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// System share sheet.
pub trait ShareTarget: Send + Sync {
    fn is_available(&self) -> bool;
    fn share(&self, payload: &SharePayload) -> BoxFuture<'_, Result<(), PlatformError>>;
}

/// System clipboard.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> BoxFuture<'_, Result<(), PlatformError>>;
}

/// Records shared payloads. Can be made unavailable or failing.
#[derive(Debug)]
pub struct RecordingShareTarget {
    available: bool,
    fail: bool,
    shared: Mutex<Vec<SharePayload>>,
}

impl RecordingShareTarget {
    pub fn available() -> Self {
        Self {
            available: true,
            fail: false,
            shared: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::available()
        }
    }

    /// Reports available but every share fails (e.g. user dismissed the sheet).
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::available()
        }
    }

    pub fn shared(&self) -> Vec<SharePayload> {
        self.shared.lock().clone()
    }
}

impl ShareTarget for RecordingShareTarget {
    fn is_available(&self) -> bool {
        self.available
    }

    fn share(&self, payload: &SharePayload) -> BoxFuture<'_, Result<(), PlatformError>> {
        let result = if !self.available {
            Err(PlatformError::Unavailable("share".to_string()))
        } else if self.fail {
            Err(PlatformError::Failed("share dismissed".to_string()))
        } else {
            self.shared.lock().push(payload.clone());
            Ok(())
        };
        Box::pin(async move { result })
    }
}

/// In-memory clipboard.
#[derive(Debug, Default)]
pub struct RecordingClipboard {
    contents: Mutex<Option<String>>,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl Clipboard for RecordingClipboard {
    fn write_text(&self, text: &str) -> BoxFuture<'_, Result<(), PlatformError>> {
        *self.contents.lock() = Some(text.to_string());
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> SharePayload {
        SharePayload {
            title: "t".to_string(),
            text: "x".to_string(),
            url: "u".to_string(),
        }
    }

    #[tokio::test]
    async fn test_recording_share_target() {
        let target = RecordingShareTarget::available();
        target.share(&payload()).await.unwrap();
        assert_eq!(target.shared(), vec![payload()]);

        let target = RecordingShareTarget::unavailable();
        assert!(!target.is_available());
        assert!(target.share(&payload()).await.is_err());

        let target = RecordingShareTarget::failing();
        assert!(target.is_available());
        assert_eq!(
            target.share(&payload()).await,
            Err(PlatformError::Failed("share dismissed".to_string()))
        );
    }

    #[tokio::test]
    async fn test_recording_clipboard() {
        let clipboard = RecordingClipboard::new();
        assert_eq!(clipboard.contents(), None);
        clipboard.write_text("hello").await.unwrap();
        assert_eq!(clipboard.contents(), Some("hello".to_string()));
    }
}
