//! Bounded SPSC bridge to an out-of-process visualiser: a slow consumer must
//! never stall the simulation loop, so a full channel drops the newest snapshot
//! instead of blocking.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

use super::{Observer, RunOutcome, Snapshot};

/// Sent down the channel: either a per-tick snapshot or the terminal outcome.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Tick(Snapshot),
    Finished(RunOutcome),
}

/// The simulation-side half: implements `Observer`, owns the sending end.
pub struct ChannelObserver {
    sender: SyncSender<ChannelEvent>,
    dropped: u64,
}

impl ChannelObserver {
    /// Creates a bounded channel of the given capacity and returns the observer
    /// half plus the receiving half for the consumer (a TUI, a socket writer, a
    /// test harness).
    pub fn new(capacity: usize) -> (Self, Receiver<ChannelEvent>) {
        let (sender, receiver) = sync_channel(capacity.max(1));
        (Self { sender, dropped: 0 }, receiver)
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    fn send(&mut self, event: ChannelEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl Observer for ChannelObserver {
    fn on_tick(&mut self, snapshot: &Snapshot) {
        self.send(ChannelEvent::Tick(snapshot.clone()));
    }

    fn on_finish(&mut self, outcome: RunOutcome) {
        self.send(ChannelEvent::Finished(outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_channel_drops_newest_instead_of_blocking() {
        let (mut observer, receiver) = ChannelObserver::new(1);

        let snap = |tick| Snapshot {
            tick,
            positions: vec![[0.0, 0.0, 0.0]],
            speeds: vec![0.0],
            attack_angles: vec![0.0],
            flight_path_angles: vec![0.0],
            roll_angles: vec![0.0],
            azimuth_angles: vec![0.0],
        };

        observer.on_tick(&snap(0));
        observer.on_tick(&snap(1));
        assert_eq!(observer.dropped_count(), 1);

        match receiver.try_recv().unwrap() {
            ChannelEvent::Tick(s) => assert_eq!(s.tick, 0),
            _ => panic!("expected a tick event"),
        }
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn disconnected_receiver_does_not_panic_the_observer() {
        let (mut observer, receiver) = ChannelObserver::new(4);
        drop(receiver);

        let snap = Snapshot {
            tick: 0,
            positions: vec![[0.0, 0.0, 0.0]],
            speeds: vec![0.0],
            attack_angles: vec![0.0],
            flight_path_angles: vec![0.0],
            roll_angles: vec![0.0],
            azimuth_angles: vec![0.0],
        };
        observer.on_tick(&snap);
        observer.on_finish(RunOutcome::TickLimitReached);
    }
}
