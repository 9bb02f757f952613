mod state_bus;

pub use state_bus::{StateBus, Subscription};

/// Channel names shared by the built-in components.
pub mod channels {
    pub const TIME: &str = "time";
    pub const SEEK: &str = "seek";
    pub const PLAY_REQUESTED: &str = "playRequested";
    pub const PAUSE_REQUESTED: &str = "pauseRequested";
    pub const YEAR: &str = "year";
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use orrery_variant::Variant;

    use super::*;

    #[test]
    fn unset_channel_reads_none() {
        let bus = StateBus::new();
        assert_eq!(bus.get("time"), None);
        assert_eq!(bus.get_f64("time"), None);
    }

    #[test]
    fn set_then_get_returns_last_value() {
        let bus = StateBus::new();
        bus.set("time", 12.5);
        bus.set("time", 13.0);
        assert_eq!(bus.get("time"), Some(Variant::from(13.0)));
        assert_eq!(bus.get_f64("time"), Some(13.0));

        bus.trigger("playRequested");
        assert_eq!(bus.get_bool("playRequested"), Some(true));
    }

    #[test]
    fn subscriber_called_once_per_set_with_new_value() {
        let bus = StateBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        bus.on("year", move |v| sink.borrow_mut().push(v.clone()));

        bus.set("year", 1900);
        bus.set("year", 1901);
        bus.set("other", 1);

        assert_eq!(*seen.borrow(), vec![Variant::from(1900), Variant::from(1901)]);
    }

    #[test]
    fn subscriber_added_during_notification_waits_for_next_set() {
        let bus = Rc::new(StateBus::new());
        let late_calls = Rc::new(Cell::new(0));
        let added = Rc::new(Cell::new(false));

        {
            let bus_ref = Rc::downgrade(&bus);
            let late_calls = late_calls.clone();
            let added = added.clone();
            bus.on("time", move |_| {
                if added.replace(true) {
                    return;
                }
                if let Some(bus) = bus_ref.upgrade() {
                    let late_calls = late_calls.clone();
                    bus.on("time", move |_| late_calls.set(late_calls.get() + 1));
                }
            });
        }

        bus.set("time", 1.0);
        assert_eq!(late_calls.get(), 0);
        assert_eq!(bus.subscriber_count("time"), 2);

        bus.set("time", 2.0);
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn subscriber_removed_during_notification_is_skipped() {
        let bus = Rc::new(StateBus::new());
        let second_calls = Rc::new(Cell::new(0));
        let second_sub: Rc<Cell<Option<Subscription>>> = Rc::new(Cell::new(None));

        {
            let bus_ref = Rc::downgrade(&bus);
            let second_sub = second_sub.clone();
            bus.on("seek", move |_| {
                if let (Some(bus), Some(sub)) = (bus_ref.upgrade(), second_sub.get()) {
                    bus.off(&sub);
                }
            });
        }
        {
            let second_calls = second_calls.clone();
            let sub = bus.on("seek", move |_| second_calls.set(second_calls.get() + 1));
            second_sub.set(Some(sub));
        }

        bus.set("seek", true);
        assert_eq!(second_calls.get(), 0);
        assert_eq!(bus.subscriber_count("seek"), 1);
    }

    #[test]
    fn off_is_idempotent() {
        let bus = StateBus::new();
        let sub = bus.on("time", |_| {});
        assert!(bus.off(&sub));
        assert!(!bus.off(&sub));
        assert_eq!(bus.subscriber_count("time"), 0);
    }

    #[test]
    fn reentrant_subscriber_is_skipped_not_panicking() {
        let bus = Rc::new(StateBus::new());
        let calls = Rc::new(Cell::new(0));
        {
            let bus_ref = Rc::downgrade(&bus);
            let calls = calls.clone();
            bus.on("echo", move |v| {
                calls.set(calls.get() + 1);
                if let Some(bus) = bus_ref.upgrade() {
                    bus.set("echo", v.clone());
                }
            });
        }

        bus.set("echo", 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(bus.get("echo"), Some(Variant::from(1)));
    }

    #[test]
    fn callback_may_write_other_channels() {
        let bus = Rc::new(StateBus::new());
        {
            let bus_ref = Rc::downgrade(&bus);
            bus.on("time", move |v| {
                if let (Some(bus), Some(t)) = (bus_ref.upgrade(), v.as_f64_lossy()) {
                    bus.set("year", 1850.0 + t);
                }
            });
        }
        bus.set("time", 10.0);
        assert_eq!(bus.get_f64("year"), Some(1860.0));
    }
}
