//! Trait seams between the core engine and the outside world.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Notice;

/// Anything that can deliver a rendered notice to an audience target.
/// The scheduler only talks to this trait; the Discord channel implements it.
/// Implementations must bound their own timeouts — a hung sink would stall
/// the whole scan.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, target: &str, notice: &Notice) -> Result<()>;
}
