//! Shared controller handle.
//!
//! The widget may call back while the controller is already borrowed, for
//! example when Secure Fields fires `error` synchronously from inside
//! `submit()`. Such events are queued and applied as soon as the borrow
//! ends, in delivery order, so none of them is lost.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::controller::{Settlement, SubmissionController, SubmissionState};
use crate::widget::{WidgetAdapter, WidgetEvent};

type TransitionObserver = Rc<dyn Fn(SubmissionState, SubmissionState)>;

struct Inner {
    controller: RefCell<SubmissionController>,
    pending: RefCell<VecDeque<WidgetEvent>>,
    observer: RefCell<Option<TransitionObserver>>,
}

#[derive(Clone)]
pub struct ControllerHandle {
    inner: Rc<Inner>,
}

/// Non-owning [`ControllerHandle`], for listeners held by the widget.
#[derive(Clone)]
pub struct WeakControllerHandle {
    inner: Weak<Inner>,
}

impl WeakControllerHandle {
    pub fn upgrade(&self) -> Option<ControllerHandle> {
        self.inner.upgrade().map(|inner| ControllerHandle { inner })
    }
}

impl ControllerHandle {
    pub fn new(controller: SubmissionController) -> Self {
        Self {
            inner: Rc::new(Inner {
                controller: RefCell::new(controller),
                pending: RefCell::new(VecDeque::new()),
                observer: RefCell::new(None),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakControllerHandle {
        WeakControllerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Connect a widget to this controller.
    ///
    /// Every widget event is delivered through the handle, `on_change` sees
    /// the controller after each update or event, and card info is requested
    /// once per attempt, on entering `settled(success)`.
    pub fn bind(&self, adapter: &Rc<WidgetAdapter>, on_change: impl Fn(&SubmissionController) + 'static) {
        let weak = self.downgrade();
        adapter.on_event(move |event| {
            if let Some(handle) = weak.upgrade() {
                handle.deliver(event);
            }
        });

        let weak = self.downgrade();
        let weak_adapter = Rc::downgrade(adapter);
        self.on_transition(move |before, after| {
            let Some(handle) = weak.upgrade() else {
                return;
            };
            on_change(&handle.borrow());

            let paid = SubmissionState::Settled(Settlement::Success);
            if after != paid || before == paid {
                return;
            }
            if let Some(adapter) = weak_adapter.upgrade() {
                let weak = handle.downgrade();
                adapter.request_card_info(move |info| {
                    if let Some(handle) = weak.upgrade() {
                        handle.update(|controller| controller.record_card_info(info));
                    }
                });
            }
        });
    }

    /// Called with `(before, after)` after every update and every applied
    /// event, outside any borrow of the controller.
    pub fn on_transition(&self, observer: impl Fn(SubmissionState, SubmissionState) + 'static) {
        *self.inner.observer.borrow_mut() = Some(Rc::new(observer));
    }

    /// Read access. Events arriving while the guard is alive wait for the
    /// next update or delivery.
    pub fn borrow(&self) -> Ref<'_, SubmissionController> {
        self.inner.controller.borrow()
    }

    /// Run `f` against the controller, then apply any events it caused.
    pub fn update<R>(&self, f: impl FnOnce(&mut SubmissionController) -> R) -> R {
        let (before, after, result) = {
            let mut controller = self.inner.controller.borrow_mut();
            let before = controller.state();
            let result = f(&mut controller);
            (before, controller.state(), result)
        };
        self.notify(before, after);
        self.drain();
        result
    }

    /// Hand one widget event to the controller, now or once it is free.
    pub fn deliver(&self, event: WidgetEvent) {
        self.inner.pending.borrow_mut().push_back(event);
        self.drain();
    }

    /// Events still waiting for the controller.
    pub fn pending(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    fn drain(&self) {
        loop {
            let Ok(mut controller) = self.inner.controller.try_borrow_mut() else {
                log::debug!("controller busy, {} event(s) queued", self.pending());
                return;
            };
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(event) = next else {
                return;
            };
            let before = controller.state();
            controller.handle_event(event);
            let after = controller.state();
            drop(controller);
            self.notify(before, after);
        }
    }

    fn notify(&self, before: SubmissionState, after: SubmissionState) {
        let observer = self.inner.observer.borrow().clone();
        if let Some(observer) = observer {
            observer(before, after);
        }
    }
}
