use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use variant_element_picker::{ElementPicker, PickerState};
use variant_page_dom::{DomEvent, Document, EventKind, Rect};
use variant_selector::SelectorGenerator;

#[test]
fn click_on_button_reports_its_id_selector() {
    let mut doc = Document::parse(r#"<main><button id="cta">Buy</button></main>"#);
    let cta = doc.query_one("#cta").unwrap().unwrap();
    doc.set_layout(cta, Rect::new(100.0, 200.0, 90.0, 32.0)).unwrap();
    let before = doc.to_html();

    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&seen);
    let mut picker = ElementPicker::new(Arc::new(SelectorGenerator::default()));
    picker
        .start(&mut doc, Box::new(move |s: &str| sink.lock().unwrap().push(s.to_string())))
        .unwrap();
    let live = picker.liveness();
    assert!(live.load(std::sync::atomic::Ordering::SeqCst));

    let response = picker.handle_event(
        &mut doc,
        &DomEvent::pointer(EventKind::Click, None, 120.0, 210.0),
    );

    assert_eq!(response.selected.as_deref(), Some("#cta"));
    assert!(response.outcome.prevent_default);
    assert_eq!(*seen.lock().unwrap(), vec!["#cta".to_string()]);
    assert_eq!(doc.query_all("#cta").unwrap().len(), 1);

    // Auto-stopped: every session effect is gone.
    assert_eq!(picker.state(), PickerState::Idle);
    assert!(!live.load(std::sync::atomic::Ordering::SeqCst));
    assert_eq!(doc.listeners().count(), 0);
    assert_eq!(doc.to_html(), before);
}

#[test]
fn stop_is_idempotent_and_contextmenu_is_suppressed() {
    let mut doc = Document::parse("<p>x</p>");
    let mut picker = ElementPicker::new(Arc::new(SelectorGenerator::default()));
    picker.start(&mut doc, Box::new(|_: &str| {})).unwrap();

    let p = doc.query_one("p").unwrap().unwrap();
    let response = picker.handle_event(
        &mut doc,
        &DomEvent::pointer(EventKind::ContextMenu, Some(p), 0.0, 0.0),
    );
    assert!(response.outcome.is_consumed());

    picker.stop(&mut doc);
    picker.stop(&mut doc);
    assert_eq!(doc.to_html(), Document::parse("<p>x</p>").to_html());
    assert!(!picker
        .handle_event(&mut doc, &DomEvent::click(p))
        .outcome
        .is_consumed());
}
