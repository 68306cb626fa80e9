//! Start a playback context once the streaming device comes online

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Diagnostics;
use crate::model::StreamingPlayerState;
use crate::sdk::ContextPlayer;

/// Grace period between the device turning ready and the play request
pub const AUTO_START_DELAY: Duration = Duration::from_secs(1);

pub struct AutoStart {
    context_uri: String,
    player: Arc<dyn ContextPlayer>,
    diagnostics: Diagnostics,
    delay: Duration,
}

impl AutoStart {
    pub fn new(context_uri: &str, player: Arc<dyn ContextPlayer>, diagnostics: Diagnostics) -> Self {
        Self {
            context_uri: context_uri.to_string(),
            player,
            diagnostics,
            delay: AUTO_START_DELAY,
        }
    }

    /// Watch the streaming state and fire one play request per readiness transition
    pub fn spawn(self, states: watch::Receiver<StreamingPlayerState>) -> JoinHandle<()> {
        tokio::spawn(self.run(states))
    }

    async fn run(self, mut states: watch::Receiver<StreamingPlayerState>) {
        let mut armed = true;

        loop {
            let device_id = ready_device(&states.borrow_and_update());
            match device_id {
                Some(device_id) if armed => {
                    armed = false;
                    tokio::time::sleep(self.delay).await;

                    // The device may have dropped while we waited
                    if ready_device(&states.borrow()).is_none() {
                        tracing::debug!(device_id = %device_id, "Device went away before auto-start");
                        armed = true;
                    } else {
                        self.start(&device_id).await;
                    }
                }
                Some(_) => {}
                None => armed = true,
            }

            if states.changed().await.is_err() {
                tracing::debug!("Streaming state closed, auto-start stopping");
                break;
            }
        }
    }

    async fn start(&self, device_id: &str) {
        tracing::info!(device_id, context_uri = %self.context_uri, "Starting context playback");
        if let Err(e) = self.player.play_context(device_id, &self.context_uri).await {
            self.diagnostics.report("autostart", e);
        }
    }
}

fn ready_device(state: &StreamingPlayerState) -> Option<String> {
    if state.is_ready {
        state.device_id.clone()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::{flush, RecordingContextPlayer};
    use crate::error::PlayerError;

    const CONTEXT: &str = "spotify:playlist:37i9dQZF1DXcBWIGoYBM5M";

    fn ready(device_id: &str) -> StreamingPlayerState {
        StreamingPlayerState {
            is_ready: true,
            device_id: Some(device_id.to_string()),
            ..Default::default()
        }
    }

    fn setup(diagnostics: &Diagnostics) -> (
        Arc<RecordingContextPlayer>,
        watch::Sender<StreamingPlayerState>,
        JoinHandle<()>,
    ) {
        let player = Arc::new(RecordingContextPlayer::default());
        let (tx, rx) = watch::channel(StreamingPlayerState::default());
        let task = AutoStart::new(CONTEXT, player.clone(), diagnostics.clone()).spawn(rx);
        (player, tx, task)
    }

    async fn wait(duration: Duration) {
        tokio::time::advance(duration).await;
        flush().await;
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (player, tx, _task) = setup(&Diagnostics::new());
        flush().await;

        tx.send_replace(ready("dev-1"));
        flush().await;
        wait(Duration::from_millis(999)).await;
        assert!(player.calls().is_empty());

        wait(Duration::from_millis(1)).await;
        assert_eq!(player.calls(), vec![("dev-1".to_string(), CONTEXT.to_string())]);

        // Position updates are not readiness transitions
        tx.send_modify(|s| s.position = 5_000);
        tx.send_modify(|s| s.is_paused = false);
        wait(AUTO_START_DELAY * 3).await;
        assert_eq!(player.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_rearms() {
        let (player, tx, _task) = setup(&Diagnostics::new());
        tx.send_replace(ready("dev-1"));
        flush().await;
        wait(AUTO_START_DELAY).await;

        tx.send_modify(|s| s.is_ready = false);
        flush().await;
        tx.send_modify(|s| s.is_ready = true);
        flush().await;
        wait(AUTO_START_DELAY).await;

        assert_eq!(player.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_during_delay_does_not_fire() {
        let (player, tx, _task) = setup(&Diagnostics::new());
        tx.send_replace(ready("dev-1"));
        flush().await;
        wait(Duration::from_millis(400)).await;

        tx.send_modify(|s| s.is_ready = false);
        wait(AUTO_START_DELAY).await;
        assert!(player.calls().is_empty());

        tx.send_modify(|s| s.is_ready = true);
        flush().await;
        wait(AUTO_START_DELAY).await;
        assert_eq!(player.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_without_device_waits() {
        let (player, tx, _task) = setup(&Diagnostics::new());
        tx.send_modify(|s| s.is_ready = true);
        flush().await;
        wait(AUTO_START_DELAY * 2).await;
        assert!(player.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_reported_not_retried() {
        let diagnostics = Diagnostics::new();
        let (player, tx, _task) = setup(&diagnostics);
        player.fail_with(PlayerError::Account("premium required".into()));

        tx.send_replace(ready("dev-1"));
        flush().await;
        wait(AUTO_START_DELAY * 5).await;

        assert_eq!(player.calls().len(), 1);
        assert_eq!(
            diagnostics.history(),
            vec![PlayerError::Account("premium required".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_state_is_dropped() {
        let (_player, tx, task) = setup(&Diagnostics::new());
        drop(tx);
        flush().await;
        assert!(task.is_finished());
    }
}
