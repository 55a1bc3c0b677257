//! Generic bounded-queue, backpressure-aware publish/subscribe primitive.
//!
//! A slow subscriber must never stall the publisher, and overflow must be
//! observable (not just silently dropped).
//! `tokio::sync::broadcast` gets the fan-out right but only reports
//! `RecvError::Lagged` to the *subscriber* after the fact; there is no way
//! for the publisher (or an operator) to ask "is anyone backpressured right
//! now". This crate gives every subscriber its own bounded ring buffer and
//! an explicit `backpressure` flag, and publishing never blocks: an
//! overflowing queue drops its oldest entry and flips the flag.

use std::collections::VecDeque;
use std::future::poll_fn;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use futures_core::Stream;
use parking_lot::Mutex;

/// The per-subscriber ring buffer. Shared between the [`Bus`] (which pushes)
/// and the [`Subscriber`] (which pops), so overflow can actually evict the
/// oldest buffered item instead of only ever touching the send side.
struct Queue<T> {
    items: Mutex<VecDeque<T>>,
    waker: Mutex<Option<Waker>>,
    capacity: usize,
    backpressure: AtomicBool,
    closed: AtomicBool,
}

impl<T> Queue<T> {
    fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            waker: Mutex::new(None),
            capacity,
            backpressure: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Push an event, evicting the oldest buffered one first if already at
    /// capacity, then wake a waiting receiver.
    fn push(&self, event: T) {
        {
            let mut items = self.items.lock();
            if items.len() >= self.capacity {
                items.pop_front();
                self.backpressure.store(true, Ordering::Relaxed);
            } else {
                self.backpressure.store(false, Ordering::Relaxed);
            }
            items.push_back(event);
        }
        if let Some(waker) = self.waker.lock().take() {
            waker.wake();
        }
    }

    fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
        if let Some(waker) = self.waker.lock().take() {
            waker.wake();
        }
    }

    fn poll_pop(&self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if let Some(v) = self.try_pop() {
            return Poll::Ready(Some(v));
        }
        if self.closed.load(Ordering::Relaxed) {
            return Poll::Ready(None);
        }
        *self.waker.lock() = Some(cx.waker().clone());
        // Re-check: a push or close may have raced us between the first
        // try_pop and registering the waker above.
        if let Some(v) = self.try_pop() {
            return Poll::Ready(Some(v));
        }
        if self.closed.load(Ordering::Relaxed) {
            return Poll::Ready(None);
        }
        Poll::Pending
    }
}

/// A topic-less, generic event bus over `T`.
///
/// Cheap to clone — internally `Arc`-backed. Every [`Bus::subscribe`] call
/// gets its own bounded queue of depth `capacity`; publishing to a full
/// queue drops the oldest buffered event and marks that subscriber
/// `backpressure`, rather than blocking the publisher.
pub struct Bus<T> {
    subscribers: Arc<Mutex<Vec<Subscription<T>>>>,
    capacity: usize,
    published: AtomicU64,
}

struct Subscription<T> {
    queue: Arc<Queue<T>>,
}

impl<T: Clone + Send + 'static> Bus<T> {
    /// Create a bus whose subscribers each buffer up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            capacity: capacity.max(1),
            published: AtomicU64::new(0),
        }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Never blocks. A subscriber whose queue is full has its oldest
    /// buffered event dropped to make room (drop-oldest-on-overflow) and
    /// its `backpressure` flag set; the flag clears the next time that
    /// subscriber successfully drains without overflowing.
    pub fn publish(&self, event: T) {
        self.published.fetch_add(1, Ordering::Relaxed);
        let mut subs = self.subscribers.lock();
        subs.retain(|sub| {
            // Only the bus's own clone of the queue remains once every
            // Subscriber has been dropped.
            if Arc::strong_count(&sub.queue) <= 1 {
                return false;
            }
            sub.queue.push(event.clone());
            true
        });
    }

    /// Subscribe to future events. Events published before this call are
    /// never delivered (at-most-once, forward-only, best-effort delivery).
    pub fn subscribe(&self) -> Subscriber<T> {
        let queue = Arc::new(Queue::new(self.capacity));
        self.subscribers.lock().push(Subscription {
            queue: queue.clone(),
        });
        Subscriber { queue }
    }

    /// Number of currently live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Total events published since creation (delivered or dropped).
    #[must_use]
    pub fn total_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl<T> Default for Bus<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(256)
    }
}

impl<T> Drop for Bus<T> {
    fn drop(&mut self) {
        for sub in self.subscribers.lock().iter() {
            sub.queue.close();
        }
    }
}

/// A subscription handle returned by [`Bus::subscribe`].
pub struct Subscriber<T> {
    queue: Arc<Queue<T>>,
}

impl<T> Subscriber<T> {
    /// Receive the next event, waiting asynchronously.
    ///
    /// Returns `None` once the bus has been dropped and the queue drained.
    pub async fn recv(&mut self) -> Option<T> {
        poll_fn(|cx| self.queue.poll_pop(cx)).await
    }

    /// Receive without blocking; `None` if nothing is buffered right now.
    pub fn try_recv(&mut self) -> Option<T> {
        self.queue.try_pop()
    }

    /// `true` if this subscriber has dropped an event (or is currently
    /// full) since the last successful, non-overflowing publish.
    #[must_use]
    pub fn is_backpressured(&self) -> bool {
        self.queue.backpressure.load(Ordering::Relaxed)
    }
}

impl<T> Stream for Subscriber<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.queue.poll_pop(cx)
    }
}
