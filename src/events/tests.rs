use std::cell::RefCell;
use std::rc::Rc;

use super::EventEmitter;

fn recorder(emitter: &EventEmitter<usize>) -> Rc<RefCell<Vec<usize>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    emitter.connect(move |value| sink.borrow_mut().push(*value));
    seen
}

#[test]
fn delivers_to_every_subscriber() {
    let emitter = EventEmitter::new();
    let first = recorder(&emitter);
    let second = recorder(&emitter);
    emitter.emit(3);
    assert_eq!(*first.borrow(), vec![3]);
    assert_eq!(*second.borrow(), vec![3]);
    assert_eq!(emitter.delivered(), 1);
}

#[test]
fn disconnect_stops_delivery() {
    let emitter = EventEmitter::new();
    let seen = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&seen);
    let id = emitter.connect(move |_: &()| *sink.borrow_mut() += 1);
    emitter.emit(());
    assert!(emitter.disconnect(id));
    assert!(!emitter.disconnect(id));
    emitter.emit(());
    assert_eq!(*seen.borrow(), 1);
}

#[test]
fn reentrant_emit_is_deferred_not_dropped() {
    let emitter: EventEmitter<usize> = EventEmitter::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let handle = emitter.clone();
    let sink = Rc::clone(&order);
    emitter.connect(move |value| {
        sink.borrow_mut().push(format!("start {value}"));
        if *value == 1 {
            handle.emit(2);
        }
        sink.borrow_mut().push(format!("end {value}"));
    });

    emitter.emit(1);
    assert_eq!(
        *order.borrow(),
        vec!["start 1", "end 1", "start 2", "end 2"]
    );
}

#[test]
fn blocker_flushes_single_notification() {
    let emitter = EventEmitter::new();
    let seen = recorder(&emitter);
    {
        let _outer = emitter.blocker();
        emitter.emit(1);
        {
            let _inner = emitter.blocker();
            emitter.emit(2);
        }
        assert!(emitter.is_blocked());
        emitter.emit(3);
        assert!(seen.borrow().is_empty());
    }
    assert!(!emitter.is_blocked());
    assert_eq!(*seen.borrow(), vec![3]);
}

#[test]
fn blocker_without_emission_stays_silent() {
    let emitter = EventEmitter::new();
    let seen = recorder(&emitter);
    drop(emitter.blocker());
    assert!(seen.borrow().is_empty());
    assert_eq!(emitter.delivered(), 0);
}
