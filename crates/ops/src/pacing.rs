//! Request pacing
//!
//! A fixed-window counter: at most `quota` admits per window. When the
//! quota is spent the caller is suspended until the window has run out, and
//! a fresh window starts at the moment it wakes.

use async_trait::async_trait;
use mailgate_config::Config;
use mailgate_events::{AppEvent, EventEmitter, EventSender, PacingEvent};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default number of calls admitted per window
pub const DEFAULT_QUOTA: u32 = 150;

/// Default window length
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

/// Time source used by the gate
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Suspend the calling task for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer
///
/// Follows tokio's paused clock in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Manually driven clock
///
/// `sleep` returns immediately after moving the clock forward, so pacing
/// decisions can be checked without waiting.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
    slept: Mutex<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            slept: Mutex::new(Vec::new()),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }

    /// Time elapsed since the clock was created
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every sleep requested so far, in order
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.advance(duration);
    }
}

#[async_trait]
impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

/// Quota and window length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub quota: u32,
    pub window: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            quota: DEFAULT_QUOTA,
            window: DEFAULT_WINDOW,
        }
    }
}

impl PacingPolicy {
    #[must_use]
    pub fn new(quota: u32, window: Duration) -> Self {
        Self { quota, window }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pacing.quota, config.pacing_window())
    }
}

/// Anything that can hold a caller back until it may proceed
///
/// The verification loop only depends on this trait, so other policies can
/// replace the fixed window without touching it.
#[async_trait]
pub trait RateLimiter: Send {
    /// Suspend until one more call is permitted, then count it
    async fn acquire(&mut self);
}

/// Counter state for the current window
#[derive(Debug, Clone, Copy)]
struct PacingWindow {
    count: u32,
    start: Instant,
}

impl PacingWindow {
    fn reset(&mut self, now: Instant) -> u32 {
        let admitted = self.count;
        self.count = 0;
        self.start = now;
        admitted
    }
}

/// Fixed-window pacing gate
#[derive(Debug)]
pub struct FixedWindowGate<C: Clock = SystemClock> {
    policy: PacingPolicy,
    clock: C,
    window: PacingWindow,
    tx: Option<EventSender>,
}

impl FixedWindowGate<SystemClock> {
    /// Gate on the system clock
    #[must_use]
    pub fn system(policy: PacingPolicy) -> Self {
        Self::new(policy, SystemClock)
    }
}

impl<C: Clock> FixedWindowGate<C> {
    /// Create a gate whose first window starts now
    #[must_use]
    pub fn new(policy: PacingPolicy, clock: C) -> Self {
        let start = clock.now();
        Self {
            policy,
            clock,
            window: PacingWindow { count: 0, start },
            tx: None,
        }
    }

    /// Report window resets and waits on `tx`
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn policy(&self) -> PacingPolicy {
        self.policy
    }

    /// Calls admitted in the current window
    #[must_use]
    pub fn admitted(&self) -> u32 {
        self.window.count
    }

    /// Start of the current window
    #[must_use]
    pub fn window_start(&self) -> Instant {
        self.window.start
    }

    /// Wait for a slot, then run `operation` and pass its outcome through
    pub async fn admit<F, Fut, T>(&mut self, operation: F) -> T
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
    {
        self.acquire().await;
        operation().await
    }

    async fn wait_for_slot(&mut self) {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.window.start);

        if elapsed >= self.policy.window {
            let admitted = self.window.reset(now);
            self.emit(AppEvent::Pacing(PacingEvent::WindowReset { admitted }));
        }

        if self.window.count >= self.policy.quota {
            let elapsed = now.saturating_duration_since(self.window.start);
            let wait = self.policy.window.saturating_sub(elapsed);
            tracing::debug!(
                wait_ms = duration_ms(wait),
                quota = self.policy.quota,
                "pacing quota exhausted"
            );
            self.emit(AppEvent::Pacing(PacingEvent::Waiting {
                wait_ms: duration_ms(wait),
                quota: self.policy.quota,
            }));

            self.clock.sleep(wait).await;

            let woke = self.clock.now();
            let admitted = self.window.reset(woke);
            self.emit(AppEvent::Pacing(PacingEvent::Resumed {
                waited_ms: duration_ms(woke.saturating_duration_since(now)),
            }));
            self.emit(AppEvent::Pacing(PacingEvent::WindowReset { admitted }));
        }
    }
}

impl<C: Clock> EventEmitter for FixedWindowGate<C> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

#[async_trait]
impl<C: Clock> RateLimiter for FixedWindowGate<C> {
    async fn acquire(&mut self) {
        self.wait_for_slot().await;
        self.window.count += 1;
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
