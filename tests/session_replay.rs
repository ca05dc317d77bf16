use pretty_assertions::assert_eq;
use serde_json::json;
use variant_bridge::{HostSettings, OutboundMessage, PageHost};
use variant_core_types::DomChange;
use variant_page_dom::Document;
use variant_studio::{parse_script, replay, Config};

const PAGE: &str = r#"<main><h1 class="title">Spring</h1><button id="cta">Buy</button></main>"#;

fn host(settings: HostSettings) -> (PageHost, tokio::sync::mpsc::UnboundedReceiver<OutboundMessage>) {
    PageHost::new(Document::parse(PAGE), settings)
}

#[test]
fn scripted_edit_session_reports_changes_and_leaves_edits() {
    let steps = parse_script(
        &json!([
            {"message": {"type": "START_VISUAL_EDITOR", "variantName": "B"}},
            {"click": {"selector": "#cta"}},
            {"action": {"action": "editText", "args": "Buy now"}},
            {"message": {"type": "GET_VISUAL_EDITOR_STATUS"}},
            {"message": {"type": "STOP_VISUAL_EDITOR"}}
        ])
        .to_string(),
    )
    .unwrap();

    let (host, outbox) = host(HostSettings::default());
    let report = replay(host, outbox, &steps).unwrap();

    let expected = vec![DomChange::text("#cta", "Buy now")];
    assert!(report.rejected.is_empty());
    assert_eq!(
        report.messages.last(),
        Some(&OutboundMessage::complete("B", expected.clone()))
    );
    assert!(report.messages.contains(&OutboundMessage::VisualEditorStatus {
        active: true,
        variant_name: Some("B".into()),
        changes: expected,
    }));
    assert!(report.final_html.contains(">Buy now</button>"));
    assert!(!report.final_html.contains("vstudio"));
}

#[test]
fn picker_by_coordinates_then_preview_over_page_channel() {
    let steps = parse_script(
        &json!([
            {"layout": {"selector": "h1", "x": 0.0, "y": 0.0, "width": 200.0, "height": 40.0}},
            {"message": {"type": "START_ELEMENT_PICKER"}},
            {"pointer": {"kind": "mousemove", "x": 10.0, "y": 10.0}},
            {"pointer": {"kind": "click", "x": 10.0, "y": 10.0}},
            {"page_message": {"source": "lab", "payload": {
                "type": "PREVIEW", "action": "apply", "label": "exp",
                "changes": [{"selector": ".title", "type": "style", "value": {"color": "red"}}]}}}
        ])
        .to_string(),
    )
    .unwrap();

    let mut config = Config::default();
    config.bridge.source_tag = "lab".into();
    let (host, outbox) = host(config.host_settings());
    let report = replay(host, outbox, &steps).unwrap();

    assert_eq!(
        report.messages,
        vec![
            OutboundMessage::ElementSelected {
                selector: "h1.title".into()
            },
            OutboundMessage::PreviewApplied {
                label: "exp".into(),
                applied: 1,
                skipped: 0,
                failed: Vec::new(),
            },
        ]
    );
    assert!(report.final_html.contains("color: red"));
}

#[test]
fn refused_steps_are_reported_and_replay_continues() {
    let steps = parse_script(
        &json!([
            {"action": {"action": "hide"}},
            {"page_message": {"source": "variant-studio", "payload": {"type": "STOP_VISUAL_EDITOR"}}},
            {"message": {"type": "GET_VISUAL_EDITOR_STATUS"}}
        ])
        .to_string(),
    )
    .unwrap();

    let (host, outbox) = host(HostSettings::default());
    let report = replay(host, outbox, &steps).unwrap();

    let rejected: Vec<usize> = report.rejected.iter().map(|r| r.step).collect();
    assert_eq!(rejected, vec![0, 1]);
    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.final_html, Document::parse(PAGE).to_html());
}

#[test]
fn run_loop_hands_back_the_page_after_shutdown() {
    use variant_bridge::{HostInput, InboundMessage};

    let (host, mut outbox) = host(HostSettings::default());
    let (tx, inbox) = tokio::sync::mpsc::channel(8);
    tokio_test::block_on(async {
        tx.send(HostInput::Message(InboundMessage::Preview {
            action: variant_bridge::PreviewAction::Apply,
            changes: vec![DomChange::delete("h1")],
            label: None,
        }))
        .await
        .unwrap();
        tx.send(HostInput::Shutdown).await.unwrap();

        let doc = host.run(inbox).await;
        assert!(doc.to_html().contains("display: none"));
    });

    assert_eq!(
        outbox.try_recv().unwrap(),
        OutboundMessage::PreviewApplied {
            label: "preview".into(),
            applied: 1,
            skipped: 0,
            failed: Vec::new(),
        }
    );
}
