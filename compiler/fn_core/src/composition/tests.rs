use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::*;

trait Greeter {
    fn greet(&self) -> String;
}

impl Extension for dyn Greeter {
    fn identifier_in_composition() -> &'static str {
        "Greeter"
    }
}

struct English;

impl Greeter for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

struct French;

impl Greeter for French {
    fn greet(&self) -> String {
        "bonjour".to_string()
    }
}

struct Counter(u32);

impl Extension for Counter {
    fn identifier_in_composition() -> &'static str {
        "Counter"
    }
}

/// Records its own release so tests can observe drop timing.
struct DropProbe(Rc<Cell<u32>>);

impl Extension for DropProbe {
    fn identifier_in_composition() -> &'static str {
        "Drop Probe"
    }
}

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn empty_composition_reports_absence() {
    let composition = Composition::new();
    assert!(composition.is_empty());
    assert!(!composition.has::<Counter>());
    assert!(composition.get::<dyn Greeter>().is_none());
}

#[test]
fn get_returns_stored_trait_object() {
    let mut composition = Composition::new();
    composition.add::<dyn Greeter>(Rc::new(English));

    let greeter = composition.get::<dyn Greeter>();
    assert_eq!(greeter.map(|g| g.greet()), Some("hello".to_string()));
}

#[test]
fn extensions_are_keyed_independently() {
    let mut composition = Composition::new();
    composition.add::<dyn Greeter>(Rc::new(English));
    composition.add(Rc::new(Counter(3)));

    assert_eq!(composition.len(), 2);
    assert_eq!(composition.get::<Counter>().map(|c| c.0), Some(3));
    assert!(composition.has::<dyn Greeter>());
}

#[test]
fn add_replaces_same_extension_type() {
    let mut composition = Composition::new();
    assert!(composition.add::<dyn Greeter>(Rc::new(English)).is_none());

    let previous = composition.add::<dyn Greeter>(Rc::new(French));
    assert_eq!(previous.map(|g| g.greet()), Some("hello".to_string()));
    assert_eq!(composition.len(), 1);
    assert_eq!(
        composition.get::<dyn Greeter>().map(|g| g.greet()),
        Some("bonjour".to_string())
    );
}

#[test]
fn identifiers_follow_insertion_order() {
    let mut composition = Composition::new();
    composition.add(Rc::new(Counter(0)));
    composition.add::<dyn Greeter>(Rc::new(French));

    assert_eq!(composition.identifiers(), vec!["Counter", "Greeter"]);
    assert_eq!(format!("{composition:?}"), r#"["Counter", "Greeter"]"#);
}

#[test]
fn remove_hands_back_ownership() {
    let released = Rc::new(Cell::new(0));
    let mut composition = Composition::new();
    composition.add(Rc::new(DropProbe(Rc::clone(&released))));

    let handle = composition.remove::<DropProbe>();
    assert!(handle.is_some());
    assert!(composition.is_empty());
    assert_eq!(released.get(), 0);

    drop(handle);
    assert_eq!(released.get(), 1);
}

#[test]
fn dropping_composition_releases_each_value_once() {
    let released = Rc::new(Cell::new(0));
    {
        let mut composition = Composition::new();
        composition.add(Rc::new(DropProbe(Rc::clone(&released))));
        let shared = composition.get::<DropProbe>();
        drop(composition);
        assert_eq!(released.get(), 0, "outstanding handle keeps the value alive");
        drop(shared);
    }
    assert_eq!(released.get(), 1);
}
