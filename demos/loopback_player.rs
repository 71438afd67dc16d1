//! Plays a simulated clip through the loopback engine.
//!
//! ```text
//! cargo run --example loopback_player
//! PLAYCTL_SYNC_MODE=1 cargo run --example loopback_player
//! ```

use std::sync::Arc;
use std::time::Duration;

use bridge_loopback::{LoopbackConfig, LoopbackEngine};
use bridge_traits::media_time::TICKS_PER_SECOND;
use core_async::time::sleep;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::SessionConfig;
use playctl_workspace::{MediaPlayer, Result};
use tracing::info;

#[core_async::main]
async fn main() -> Result<()> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))?;

    let config = SessionConfig::from_env()?;
    let engine =
        LoopbackEngine::new(LoopbackConfig::default().with_duration(10 * TICKS_PER_SECOND));
    let player = MediaPlayer::open(Arc::new(engine), config).await?;
    player.wait_until_ready(Duration::from_secs(1)).await?;
    info!(duration_ms = player.duration(), "clip loaded");

    player.set_media_time(2_000.0).await?;
    player.set_stop_time(2_600.0).await?;
    player.set_rate(1.5).await?;
    // Let the seek and rate confirmations land before starting.
    sleep(Duration::from_millis(50)).await;
    player.start().await?;

    sleep(Duration::from_millis(600)).await;
    info!(
        media_time_ms = player.media_time(),
        state = %player.state(),
        rate = player.rate(),
        "after playback"
    );

    let frame = player.next_frame(true).await?;
    info!(frame_ms = frame, "stepped one frame");

    player.close().await?;
    info!(state = %player.state(), "closed");
    Ok(())
}
