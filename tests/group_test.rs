//! Watch groups: independent members under one cleanup.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use domwatch::{Document, Element, WatchConfig, WatchError, WatchGroup, observe_all};
use tokio::time::sleep;

fn counting(selector: &str, stop: bool) -> (Arc<AtomicUsize>, WatchConfig) {
    let calls = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&calls);
    let config = WatchConfig::builder(selector, move |_: &Element| {
        sink.fetch_add(1, Ordering::SeqCst);
        stop
    })
    .debounce_ms(50)
    .build()
    .unwrap();
    (calls, config)
}

#[tokio::test(start_paused = true)]
async fn test_group_cleanup_leaves_nothing_active() {
    let doc = Document::new();
    doc.body().append_child(&doc.create_element("header")).unwrap();
    doc.body().append_child(&doc.create_element("nav")).unwrap();

    let (header_calls, header) = counting("header", false);
    let (nav_calls, nav) = counting("nav", true);
    let (never_calls, never) = counting("footer.never", false);

    let group = WatchGroup::start(&doc, [header, nav, never]).unwrap();
    assert_eq!(header_calls.load(Ordering::SeqCst), 1);
    assert_eq!(nav_calls.load(Ordering::SeqCst), 1);
    assert_eq!(group.active_count(), 2);
    assert_eq!(doc.observer_count(), 2);

    // Leave a debounced check pending on the surviving members
    doc.body().append_child(&doc.create_element("div")).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert!(group.watchers().iter().any(|w| w.has_pending_check()));

    let cleanup = group.cleanup();
    assert!(cleanup.cleanup());
    assert!(!cleanup.cleanup());

    assert_eq!(group.active_count(), 0);
    assert_eq!(doc.observer_count(), 0);
    assert!(group.watchers().iter().all(|w| !w.has_pending_check()));

    sleep(Duration::from_millis(200)).await;
    assert_eq!(header_calls.load(Ordering::SeqCst), 1);
    assert_eq!(never_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_members_are_independent() {
    let doc = Document::new();
    let (a_calls, a) = counting(".a", true);
    let (b_calls, b) = counting(".b", true);
    let _cleanup = observe_all(&doc, vec![a, b]).unwrap();

    let el = doc.create_element("div");
    el.set_attribute("class", "b");
    doc.body().append_child(&el).unwrap();
    sleep(Duration::from_millis(60)).await;

    assert_eq!(a_calls.load(Ordering::SeqCst), 0);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    // Only the `.a` watcher is still observing
    assert_eq!(doc.observer_count(), 1);
}

#[test]
fn test_failing_member_rolls_back() {
    let doc = Document::new();
    let other = Document::new();
    let (_, first) = counting(".first", false);
    let stray = WatchConfig::builder(".stray", |_: &Element| ())
        .root(other.body())
        .build()
        .unwrap();

    let err = observe_all(&doc, vec![first, stray]).unwrap_err();
    match err {
        WatchError::GroupMember { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(*source, WatchError::ForeignRoot));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(doc.observer_count(), 0);
}

#[test]
fn test_empty_group() {
    let doc = Document::new();
    let group = WatchGroup::start(&doc, Vec::<WatchConfig>::new()).unwrap();
    assert!(group.is_empty());
    assert!(group.cleanup().cleanup());
}
