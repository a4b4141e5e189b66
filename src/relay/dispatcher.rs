//! Event dispatch loop
//!
//! Single consumer over the push and click queues. Events are handled one
//! at a time and each handler future is awaited to completion before the
//! next event is accepted, so an in-flight display or open-window request
//! is never abandoned. On shutdown the queues are drained through the same
//! handlers before the loop returns.

use flume::Receiver;
use tokio::signal;
use tracing::{error, info};

use super::host::{NotificationHost, WindowOpener};
use super::NotificationRelay;
use crate::errors::AppResult;
use crate::push::{NotificationClickEvent, PushEvent};

pub struct RelayDispatcher<H, W> {
    relay: NotificationRelay<H, W>,
    push_rx: Receiver<PushEvent>,
    click_rx: Receiver<NotificationClickEvent>,
    shutdown_rx: Receiver<()>,
}

impl<H, W> RelayDispatcher<H, W>
where
    H: NotificationHost,
    W: WindowOpener,
{
    pub fn new(
        relay: NotificationRelay<H, W>,
        push_rx: Receiver<PushEvent>,
        click_rx: Receiver<NotificationClickEvent>,
        shutdown_rx: Receiver<()>,
    ) -> Self {
        RelayDispatcher {
            relay,
            push_rx,
            click_rx,
            shutdown_rx,
        }
    }

    pub async fn run(self) -> AppResult<()> {
        info!("relay dispatcher started");

        let ctrl_c = signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                event = self.push_rx.recv_async() => match event {
                    Ok(event) => self.dispatch_push(event).await,
                    Err(_) => {
                        info!("push queue closed, stopping dispatcher");
                        break;
                    }
                },

                event = self.click_rx.recv_async() => match event {
                    Ok(event) => self.dispatch_click(event).await,
                    Err(_) => {
                        info!("click queue closed, stopping dispatcher");
                        break;
                    }
                },

                _ = self.shutdown_rx.recv_async() => {
                    info!("received shutdown request, stopping dispatcher");
                    break;
                }

                _ = &mut ctrl_c => {
                    info!("received Ctrl+C, stopping dispatcher");
                    break;
                }
            }
        }

        self.drain().await;

        info!("relay dispatcher stopped");
        Ok(())
    }

    async fn dispatch_push(&self, event: PushEvent) {
        // Handler errors are the host's unhandled rejections: logged, never
        // fatal to the loop.
        if let Err(e) = self.relay.handle_push(event).await {
            error!("push handler failed: {e}");
        }
    }

    async fn dispatch_click(&self, event: NotificationClickEvent) {
        if let Err(e) = self.relay.handle_notification_click(event).await {
            error!("notification click handler failed: {e}");
        }
    }

    /// Handle whatever is still queued before the process exits
    async fn drain(&self) {
        let mut drained = 0usize;
        while let Ok(event) = self.push_rx.try_recv() {
            self.dispatch_push(event).await;
            drained += 1;
        }
        while let Ok(event) = self.click_rx.try_recv() {
            self.dispatch_click(event).await;
            drained += 1;
        }
        if drained > 0 {
            info!("drained {drained} queued events during shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::testing::{settings, RecordingHost, RecordingOpener};
    use std::sync::Arc;
    use std::time::Duration;

    type TestDispatcher = RelayDispatcher<RecordingHost, RecordingOpener>;

    struct Channels {
        push_tx: flume::Sender<PushEvent>,
        click_tx: flume::Sender<NotificationClickEvent>,
        shutdown_tx: flume::Sender<()>,
    }

    fn dispatcher(
        host: Arc<RecordingHost>,
        opener: Arc<RecordingOpener>,
    ) -> (TestDispatcher, Channels) {
        let (push_tx, push_rx) = flume::unbounded();
        let (click_tx, click_rx) = flume::unbounded();
        let (shutdown_tx, shutdown_rx) = flume::bounded(1);

        let relay = NotificationRelay::new(host, opener, settings());
        (
            RelayDispatcher::new(relay, push_rx, click_rx, shutdown_rx),
            Channels {
                push_tx,
                click_tx,
                shutdown_tx,
            },
        )
    }

    #[tokio::test]
    async fn test_queued_pushes_are_displayed_before_shutdown() {
        let host = Arc::new(RecordingHost::default());
        let opener = Arc::new(RecordingOpener::default());
        let (dispatcher, channels) = dispatcher(host.clone(), opener);

        channels
            .push_tx
            .send(PushEvent::new(Some(br#"{"title":"um"}"#.to_vec())))
            .unwrap();
        channels
            .push_tx
            .send(PushEvent::new(Some(br#"{"title":"dois"}"#.to_vec())))
            .unwrap();
        channels.shutdown_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), dispatcher.run())
            .await
            .expect("dispatcher should stop")
            .unwrap();

        // Both events were queued ahead of the shutdown request; the drain
        // pass guarantees they are displayed even if shutdown won the race.
        let shown = host.shown.lock().unwrap();
        assert_eq!(shown.len(), 2);
    }

    #[tokio::test]
    async fn test_clicks_are_dispatched() {
        let host = Arc::new(RecordingHost::default());
        let opener = Arc::new(RecordingOpener::default());
        let (dispatcher, channels) = dispatcher(host.clone(), opener.clone());

        channels
            .click_tx
            .send(NotificationClickEvent { notification_id: 4 })
            .unwrap();
        channels.shutdown_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), dispatcher.run())
            .await
            .expect("dispatcher should stop")
            .unwrap();

        assert_eq!(host.closed.lock().unwrap().as_slice(), &[4]);
        assert_eq!(opener.opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_handler_does_not_stop_the_loop() {
        let host = Arc::new(RecordingHost {
            fail_show: true,
            ..Default::default()
        });
        let opener = Arc::new(RecordingOpener::default());
        let (dispatcher, channels) = dispatcher(host.clone(), opener.clone());

        channels.push_tx.send(PushEvent::new(None)).unwrap();
        channels
            .click_tx
            .send(NotificationClickEvent { notification_id: 1 })
            .unwrap();
        channels.shutdown_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), dispatcher.run())
            .await
            .expect("dispatcher should stop")
            .unwrap();

        // The failing push handler did not prevent the click from being
        // serviced.
        assert_eq!(opener.opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_push_queue_stops_dispatcher() {
        let host = Arc::new(RecordingHost::default());
        let opener = Arc::new(RecordingOpener::default());
        let (dispatcher, channels) = dispatcher(host, opener);

        drop(channels.push_tx);

        tokio::time::timeout(Duration::from_secs(5), dispatcher.run())
            .await
            .expect("dispatcher should stop")
            .unwrap();
    }
}
