use pocketlife_core::store::StoreWriteKind;
use pocketlife_core::{ObservableStore, StoreError, StorePath};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn path(raw: &str) -> StorePath {
    StorePath::parse(raw).unwrap()
}

#[test]
fn subscriber_sees_writes_at_and_below_its_path() {
    let store = ObservableStore::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = store.subscribe(path("ui"), move |event| {
        sink.borrow_mut().push(event.path.to_string());
    });

    store.write(&path("ui.theme"), json!("dark")).unwrap();
    store.write(&path("prefs.font_size"), json!(16)).unwrap();
    store.write(&path("ui.sidebar_open"), json!(false)).unwrap();

    assert_eq!(*seen.borrow(), vec!["ui.theme", "ui.sidebar_open"]);
}

#[test]
fn leaf_subscriber_sees_ancestor_replacement() {
    let store = ObservableStore::new();
    let hits = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&hits);
    let _sub = store.subscribe(path("ui.theme"), move |_| *sink.borrow_mut() += 1);

    store
        .write(
            &path("ui"),
            json!({
                "theme": "dark",
                "sidebar_open": true,
                "selected_note_id": null,
                "selected_folder_id": null
            }),
        )
        .unwrap();
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn notification_order_follows_registration_order() {
    let store = ObservableStore::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&order);
    let _a = store.subscribe(path("ui"), move |_| first.borrow_mut().push("a"));
    let second = Rc::clone(&order);
    let _b = store.subscribe(StorePath::root(), move |_| second.borrow_mut().push("b"));
    let third = Rc::clone(&order);
    let _c = store.subscribe(path("ui.theme"), move |_| third.borrow_mut().push("c"));

    store.write(&path("ui.theme"), json!("dark")).unwrap();
    assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
}

#[test]
fn dropped_subscription_stops_notifications() {
    let store = ObservableStore::new();
    let hits = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&hits);
    let sub = store.subscribe(path("ui"), move |_| *sink.borrow_mut() += 1);

    store.write(&path("ui.theme"), json!("dark")).unwrap();
    drop(sub);
    store.write(&path("ui.theme"), json!("light")).unwrap();

    assert_eq!(*hits.borrow(), 1);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn write_from_callback_lands_and_does_not_recurse_forever() {
    let store = ObservableStore::new();
    let hits = Rc::new(RefCell::new(0u32));

    let sink = Rc::clone(&hits);
    let echo = store.clone();
    let _sub = store.subscribe(path("ui"), move |_| {
        *sink.borrow_mut() += 1;
        // Writing back into the watched subtree must not re-enter this
        // callback within the same cascade.
        echo.write(&StorePath::parse("ui.sidebar_open").unwrap(), json!(false))
            .unwrap();
    });

    store.write(&path("ui.theme"), json!("dark")).unwrap();

    assert_eq!(*hits.borrow(), 1);
    assert_eq!(
        store.read(&path("ui.sidebar_open")).unwrap(),
        json!(false)
    );
}

#[test]
fn failed_write_leaves_tree_and_subscribers_untouched() {
    let store = ObservableStore::new();
    let hits = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&hits);
    let _sub = store.subscribe(StorePath::root(), move |_| *sink.borrow_mut() += 1);

    let err = store
        .write(&path("notes.missing.title"), json!("x"))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(*hits.borrow(), 0);
    assert_eq!(store.read(&path("notes")).unwrap(), json!({}));
}

#[test]
fn remove_reports_its_kind_and_returns_the_value() {
    let store = ObservableStore::new();
    store.write(&path("notes.a"), json!({"title": "t"})).unwrap();

    let kinds = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&kinds);
    let _sub = store.subscribe(path("notes"), move |event| sink.borrow_mut().push(event.kind));

    let removed = store.remove(&path("notes.a")).unwrap();
    assert_eq!(removed, json!({"title": "t"}));
    assert_eq!(*kinds.borrow(), vec![StoreWriteKind::Remove]);
    assert!(matches!(
        store.read(&path("notes.a")).unwrap_err(),
        StoreError::NotFound(_)
    ));
}

#[test]
fn merge_patches_without_clobbering_siblings() {
    let store = ObservableStore::new();
    store
        .write(&path("notes.a"), json!({"title": "t", "body": "b"}))
        .unwrap();

    store
        .merge(&path("notes.a"), json!({"body": "patched"}))
        .unwrap();

    assert_eq!(
        store.read(&path("notes.a")).unwrap(),
        json!({"title": "t", "body": "patched"})
    );
}
