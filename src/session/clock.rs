use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct ClockState {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl ClockState {
    fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + since.elapsed(),
            None => self.accumulated,
        }
    }
}

/// Elapsed recording time, excluding paused spans
///
/// While started, a background ticker publishes the elapsed time on a watch
/// channel for display. The ticker is aborted by `stop` and on drop.
pub struct ElapsedClock {
    state: Arc<Mutex<ClockState>>,
    display: Arc<watch::Sender<Duration>>,
    ticker: Option<JoinHandle<()>>,
}

impl ElapsedClock {
    pub fn new() -> Self {
        let (display, _) = watch::channel(Duration::ZERO);
        Self {
            state: Arc::new(Mutex::new(ClockState::default())),
            display: Arc::new(display),
            ticker: None,
        }
    }

    /// Reset to zero and start counting. Must be called inside a Tokio runtime.
    pub fn start(&mut self, tick: Duration) {
        self.cancel_ticker();

        {
            let mut state = self.state.lock();
            state.accumulated = Duration::ZERO;
            state.running_since = Some(Instant::now());
        }
        self.display.send_replace(Duration::ZERO);

        let state = Arc::clone(&self.state);
        let display = Arc::clone(&self.display);

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let elapsed = state.lock().elapsed();
                display.send_replace(elapsed);
            }
        }));
    }

    pub fn pause(&mut self) {
        let mut state = self.state.lock();
        if let Some(since) = state.running_since.take() {
            state.accumulated += since.elapsed();
        }
        self.display.send_replace(state.accumulated);
    }

    pub fn resume(&mut self) {
        let mut state = self.state.lock();
        if state.running_since.is_none() {
            state.running_since = Some(Instant::now());
        }
    }

    /// Freeze the clock, cancel the ticker and return the final elapsed time
    pub fn stop(&mut self) -> Duration {
        self.pause();
        self.cancel_ticker();
        self.elapsed()
    }

    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed()
    }

    /// Whether the display ticker is alive
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Receiver for periodic elapsed-time updates
    pub fn subscribe(&self) -> watch::Receiver<Duration> {
        self.display.subscribe()
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            debug!("Cancelling elapsed-time ticker");
            ticker.abort();
        }
    }
}

impl Default for ElapsedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ElapsedClock {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

/// Format as `HH:MM:SS`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00:00");
        assert_eq!(format_elapsed(Duration::from_millis(61_999)), "00:01:01");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "03:25:07");
    }

    #[tokio::test]
    async fn test_stop_cancels_ticker() {
        let mut clock = ElapsedClock::new();
        clock.start(Duration::from_millis(10));
        assert!(clock.is_ticking());

        clock.stop();
        assert!(!clock.is_ticking());
    }

    #[tokio::test]
    async fn test_paused_clock_does_not_advance() {
        let mut clock = ElapsedClock::new();
        clock.start(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(5)).await;

        clock.pause();
        let frozen = clock.elapsed();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(clock.elapsed(), frozen);

        clock.resume();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(clock.elapsed() > frozen);
    }

    #[tokio::test]
    async fn test_start_resets() {
        let mut clock = ElapsedClock::new();
        clock.start(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(15)).await;
        let first = clock.stop();
        assert!(first >= Duration::from_millis(15));

        clock.start(Duration::from_millis(10));
        assert!(clock.elapsed() < first);
        clock.stop();
    }
}
