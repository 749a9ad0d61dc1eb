use flicklist_models::MediaKind;
use tracing::info;

/// The surrounding media application, as seen by the sync core.
///
/// Both calls are fire-and-forget.
pub trait Host: Send + Sync {
    /// Forget the application's own watched markers for `kind`
    fn clear_watched_markers(&self, kind: MediaKind);

    /// Show a short message to the user
    fn notify(&self, message: &str);
}

/// Host that only logs; used when running outside a media application
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHost;

impl Host for LogHost {
    fn clear_watched_markers(&self, kind: MediaKind) {
        info!("Cleared host watched markers for {}", kind);
    }

    fn notify(&self, message: &str) {
        info!("{}", message);
    }
}
