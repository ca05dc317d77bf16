use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;
use variant_bridge::{
    HostEvent, HostInput, HostSettings, InboundMessage, OutboundMessage, PageHost, PreviewAction,
};
use variant_core_types::{DomChange, SessionKind};
use variant_page_dom::{DomEvent, Document, EventKind, Rect};

const PAGE: &str = r#"<main><button id="cta">Buy</button><p id="promo">Sale</p></main>"#;

fn host() -> (PageHost, mpsc::UnboundedReceiver<OutboundMessage>) {
    PageHost::new(Document::parse(PAGE), HostSettings::default())
}

fn node(host: &PageHost, selector: &str) -> variant_page_dom::NodeId {
    host.document().query_one(selector).unwrap().unwrap()
}

#[tokio::test]
async fn picker_click_reports_cta_selector() {
    let (mut host, mut rx) = host();
    let cta = node(&host, "#cta");
    host.document_mut()
        .set_layout(cta, Rect::new(10.0, 10.0, 80.0, 30.0))
        .unwrap();

    host.handle_message(InboundMessage::StartElementPicker { from_popup: true })
        .unwrap();
    assert_eq!(host.active_kind(), Some(SessionKind::Picker));

    let outcome = host.dispatch_event(&DomEvent::pointer(EventKind::Click, None, 20.0, 20.0));
    assert!(outcome.prevent_default);

    assert_eq!(
        rx.recv().await.unwrap(),
        OutboundMessage::ElementSelected {
            selector: "#cta".into()
        }
    );
    assert_eq!(host.document().query_all("#cta").unwrap().len(), 1);
    assert_eq!(host.active_kind(), None);
    assert_eq!(host.document().listeners().count(), 0);
}

#[tokio::test]
async fn starting_editor_tears_down_the_picker() {
    let (mut host, _rx) = host();
    let mut events = host.subscribe();

    host.handle_message(InboundMessage::StartElementPicker { from_popup: false })
        .unwrap();
    let picker_owner = host.picker().unwrap().listener_owner();
    host.handle_message(InboundMessage::StartVisualEditor {
        variant_name: "B".into(),
        changes: Vec::new(),
    })
    .unwrap();

    let listeners = host.document().listeners();
    assert_eq!(listeners.count_for(&picker_owner), 0);
    assert_eq!(listeners.count(), listeners.count_for(&host.editor().unwrap().listener_owner()));
    assert!(host.document().query_all(".vstudio-picker-overlay").unwrap().is_empty());

    let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|event| match event {
            HostEvent::SessionStarted { kind, .. } => format!("start:{}", kind.name()),
            HostEvent::SessionEnded { kind, .. } => format!("end:{}", kind.name()),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec!["start:picker", "end:picker", "start:editor"]);
}

#[tokio::test]
async fn editor_changes_stream_and_complete_once() {
    let (mut host, mut rx) = host();
    host.handle_message(InboundMessage::StartVisualEditor {
        variant_name: "B".into(),
        changes: Vec::new(),
    })
    .unwrap();

    let promo = node(&host, "#promo");
    host.dispatch_event(&DomEvent::click(promo));
    let hide = node(&host, r#"[data-vstudio-action="hide"]"#);
    host.dispatch_event(&DomEvent::click(hide));

    let expected = vec![DomChange::style("#promo", [("display", "none")])];
    assert_eq!(
        rx.recv().await.unwrap(),
        OutboundMessage::VisualEditorChanges {
            variant_name: "B".into(),
            changes: expected.clone(),
        }
    );

    host.handle_message(InboundMessage::StopVisualEditor).unwrap();
    host.handle_message(InboundMessage::StopVisualEditor).unwrap();
    assert_eq!(rx.recv().await.unwrap(), OutboundMessage::complete("B", expected));
    assert!(rx.try_recv().is_err());
    assert_eq!(host.active_kind(), None);
}

#[tokio::test]
async fn status_survives_a_failed_send() {
    let (mut host, rx) = host();
    drop(rx);
    host.handle_message(InboundMessage::StartVisualEditor {
        variant_name: "B".into(),
        changes: vec![DomChange::text("#cta", "Order")],
    })
    .unwrap();
    let cta = node(&host, "#cta");
    host.dispatch_event(&DomEvent::click(cta));
    host.editor_action(variant_visual_editor::EditorAction::AddClass("pulse".into()))
        .unwrap();
    host.handle_message(InboundMessage::StopVisualEditor).unwrap();

    match host.status() {
        OutboundMessage::VisualEditorStatus {
            active,
            variant_name,
            changes,
        } => {
            assert!(!active);
            assert_eq!(variant_name.as_deref(), Some("B"));
            assert_eq!(changes.len(), 2);
        }
        other => panic!("unexpected status: {other:?}"),
    }
}

#[tokio::test]
async fn page_channel_previews_with_source_check() {
    let (mut host, mut rx) = host();
    let original = host.document().to_html();
    let mut events = host.subscribe();

    let foreign = json!({
        "source": "evil",
        "payload": {"type": "PREVIEW", "action": "apply", "label": "exp1",
                    "changes": [{"selector": "#cta", "type": "text", "value": "Hacked"}]}
    });
    host.handle_page_message(&foreign.to_string()).unwrap();
    assert!(rx.try_recv().is_err());

    let apply = json!({
        "source": "variant-studio",
        "payload": {"type": "PREVIEW", "action": "apply", "label": "exp1",
                    "changes": [{"selector": "#cta", "type": "text", "value": "Buy Now"},
                                {"selector": "#missing", "type": "delete"}]}
    });
    host.handle_page_message(&apply.to_string()).unwrap();
    assert_eq!(
        rx.recv().await.unwrap(),
        OutboundMessage::PreviewApplied {
            label: "exp1".into(),
            applied: 1,
            skipped: 1,
            failed: Vec::new(),
        }
    );
    assert_eq!(host.document().text_content(node(&host, "#cta")), "Buy Now");

    let script = json!({
        "source": "variant-studio",
        "payload": {"type": "PREVIEW", "action": "apply",
                    "changes": [{"selector": "body", "type": "javascript", "value": "alert(1)"}]}
    });
    assert!(host.handle_page_message(&script.to_string()).unwrap_err().is_rejection());
    assert!(matches!(
        events.recv().await.unwrap(),
        HostEvent::MessageRejected { .. }
    ));

    host.handle_message(InboundMessage::Preview {
        action: PreviewAction::Remove,
        changes: Vec::new(),
        label: Some("exp1".into()),
    })
    .unwrap();
    assert_eq!(
        rx.recv().await.unwrap(),
        OutboundMessage::PreviewRemoved {
            label: "exp1".into(),
            restored: 1,
        }
    );
    assert_eq!(host.document().to_html(), original);
}

#[tokio::test]
async fn run_loop_processes_inputs_until_shutdown() {
    let (host, mut rx) = host();
    let promo = node(&host, "#promo");
    let (tx, inbox) = mpsc::channel(16);
    let task = tokio::spawn(host.run(inbox));

    tx.send(HostInput::Message(InboundMessage::StartVisualEditor {
        variant_name: "C".into(),
        changes: Vec::new(),
    }))
    .await
    .unwrap();
    tx.send(HostInput::Event(DomEvent::click(promo))).await.unwrap();
    tx.send(HostInput::Action(variant_visual_editor::EditorAction::EditText(
        "Big sale".into(),
    )))
    .await
    .unwrap();
    tx.send(HostInput::Shutdown).await.unwrap();

    let doc = task.await.unwrap();
    assert!(matches!(
        rx.recv().await.unwrap(),
        OutboundMessage::VisualEditorChanges { .. }
    ));
    assert_eq!(
        rx.recv().await.unwrap(),
        OutboundMessage::complete("C", vec![DomChange::text("#promo", "Big sale")])
    );
    assert_eq!(doc.text_content(doc.query_one("#promo").unwrap().unwrap()), "Big sale");
    assert!(!doc.to_html().contains("vstudio"));
}

#[tokio::test]
async fn cancelling_an_active_picker_reports_nothing() {
    let (mut host, mut rx) = host();
    let original = host.document().to_html();
    let cta = node(&host, "#cta");
    host.document_mut()
        .set_layout(cta, Rect::new(10.0, 10.0, 80.0, 30.0))
        .unwrap();

    host.handle_message(InboundMessage::StartElementPicker { from_popup: false })
        .unwrap();
    host.dispatch_event(&DomEvent::pointer(EventKind::MouseMove, None, 20.0, 20.0));
    assert!(host.document().listeners().count() > 0);

    host.handle_message(InboundMessage::CancelElementPicker).unwrap();
    assert_eq!(host.active_kind(), None);
    assert_eq!(host.document().listeners().count(), 0);
    assert!(host.document().query_all(".vstudio-picker-overlay").unwrap().is_empty());

    // A click after the cancel reaches no session.
    let outcome = host.dispatch_event(&DomEvent::pointer(EventKind::Click, None, 20.0, 20.0));
    assert!(!outcome.prevent_default);
    assert!(rx.try_recv().is_err());
    assert_eq!(host.document().to_html(), original);
}

#[tokio::test]
async fn cancel_after_the_picker_finished_is_a_noop() {
    let (mut host, mut rx) = host();
    let mut events = host.subscribe();
    let cta = node(&host, "#cta");

    host.handle_message(InboundMessage::StartElementPicker { from_popup: true })
        .unwrap();
    host.dispatch_event(&DomEvent::click(cta));
    assert_eq!(
        rx.recv().await.unwrap(),
        OutboundMessage::ElementSelected {
            selector: "#cta".into()
        }
    );
    assert_eq!(host.active_kind(), None);
    let html = host.document().to_html();

    host.handle_message(InboundMessage::CancelElementPicker).unwrap();
    assert_eq!(host.document().to_html(), html);
    assert_eq!(host.document().listeners().count(), 0);
    assert!(rx.try_recv().is_err());

    let ended = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|event| matches!(event, HostEvent::SessionEnded { .. }))
        .count();
    assert_eq!(ended, 1);
}

#[tokio::test]
async fn stopping_without_an_editor_changes_nothing() {
    let (mut host, mut rx) = host();
    let mut events = host.subscribe();
    let original = host.document().to_html();

    host.handle_message(InboundMessage::StopVisualEditor).unwrap();
    assert_eq!(host.active_kind(), None);
    assert_eq!(host.document().to_html(), original);
    assert!(rx.try_recv().is_err());
    assert!(events.try_recv().is_err());

    // A running picker is not an editor; the stop leaves it alone.
    host.handle_message(InboundMessage::StartElementPicker { from_popup: false })
        .unwrap();
    host.handle_message(InboundMessage::StopVisualEditor).unwrap();
    assert_eq!(host.active_kind(), Some(SessionKind::Picker));
    assert!(rx.try_recv().is_err());
}
