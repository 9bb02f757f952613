use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;
use log::{debug, warn};
use orrery_ids::{ChannelID, SubscriptionID};
use orrery_variant::Variant;

type Callback = dyn FnMut(&Variant);

struct Subscriber {
    id: SubscriptionID,
    active: Cell<bool>,
    callback: RefCell<Box<Callback>>,
}

/// Handle returned by [`StateBus::on`]; pass it to [`StateBus::off`] to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription {
    channel: ChannelID,
    id: SubscriptionID,
}

impl Subscription {
    #[inline]
    pub fn channel(&self) -> ChannelID {
        self.channel
    }

    #[inline]
    pub fn id(&self) -> SubscriptionID {
        self.id
    }
}

/// Shared key/value store with synchronous change notification.
///
/// Last write wins, no history. Notification walks a snapshot of the
/// subscribers registered when `set` was called, so a subscriber added from
/// inside a callback first runs on the next `set`, and one removed from inside
/// a callback is skipped.
#[derive(Default)]
pub struct StateBus {
    values: RefCell<AHashMap<ChannelID, Variant>>,
    subscribers: RefCell<AHashMap<ChannelID, Vec<Rc<Subscriber>>>>,
    next_subscription: Cell<u32>,
}

impl StateBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    pub fn set(&self, channel: &str, value: impl Into<Variant>) {
        let id = ChannelID::from_name(channel);
        let value = value.into();
        self.values.borrow_mut().insert(id, value.clone());

        let snapshot: Vec<Rc<Subscriber>> = match self.subscribers.borrow().get(&id) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => return,
        };

        for sub in snapshot {
            if !sub.active.get() {
                continue;
            }
            match sub.callback.try_borrow_mut() {
                Ok(mut callback) => callback(&value),
                Err(_) => warn!(
                    "[state] subscriber {} re-entered on channel '{}', skipped",
                    sub.id, channel
                ),
            }
        }
    }

    /// `None` means the channel was never written.
    pub fn get(&self, channel: &str) -> Option<Variant> {
        self.values
            .borrow()
            .get(&ChannelID::from_name(channel))
            .cloned()
    }

    pub fn get_f64(&self, channel: &str) -> Option<f64> {
        self.values
            .borrow()
            .get(&ChannelID::from_name(channel))
            .and_then(Variant::as_f64_lossy)
    }

    pub fn get_bool(&self, channel: &str) -> Option<bool> {
        self.values
            .borrow()
            .get(&ChannelID::from_name(channel))
            .and_then(Variant::as_bool)
    }

    /// Fires a trigger channel (`playRequested`, `pauseRequested`).
    pub fn trigger(&self, channel: &str) {
        self.set(channel, true);
    }

    pub fn on<F>(&self, channel: &str, callback: F) -> Subscription
    where
        F: FnMut(&Variant) + 'static,
    {
        let channel_id = ChannelID::from_name(channel);
        let index = self.next_subscription.get().wrapping_add(1);
        self.next_subscription.set(index);
        let id = SubscriptionID::from_parts(index, 0);

        self.subscribers
            .borrow_mut()
            .entry(channel_id)
            .or_default()
            .push(Rc::new(Subscriber {
                id,
                active: Cell::new(true),
                callback: RefCell::new(Box::new(callback)),
            }));
        debug!("[state] {} subscribed to '{}'", id, channel);

        Subscription {
            channel: channel_id,
            id,
        }
    }

    /// Returns false when the subscription was already removed.
    pub fn off(&self, subscription: &Subscription) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let Some(list) = subscribers.get_mut(&subscription.channel) else {
            return false;
        };
        let Some(pos) = list.iter().position(|s| s.id == subscription.id) else {
            return false;
        };
        let removed = list.remove(pos);
        removed.active.set(false);
        if list.is_empty() {
            subscribers.remove(&subscription.channel);
        }
        true
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.subscribers
            .borrow()
            .get(&ChannelID::from_name(channel))
            .map_or(0, Vec::len)
    }
}
