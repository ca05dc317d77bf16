use pretty_assertions::assert_eq;
use variant_core_types::markers::{LABEL_ATTR, ORIGINAL_ATTR};
use variant_core_types::{ClassOp, DomChange, InsertPosition};
use variant_page_dom::Document;
use variant_preview::{PreviewPolicy, PreviewStateManager};

const PAGE: &str = r#"<main id="main">
  <h1 id="title" class="hero big" data-role="headline">Summer <em>sale</em></h1>
  <button id="cta" style="color: blue;" aria-label="Buy">Buy</button>
  <ul id="list"><li id="one">1</li><li id="two">2</li></ul>
</main>"#;

#[test]
fn buy_now_then_back_to_buy() {
    let mut doc = Document::parse(r#"<button id="cta">Buy</button>"#);
    let mut manager = PreviewStateManager::default();
    manager
        .apply_change(&mut doc, &DomChange::text("#cta", "Buy Now"), "exp1")
        .unwrap();
    let cta = doc.query_one("#cta").unwrap().unwrap();
    assert_eq!(doc.text_content(cta), "Buy Now");

    manager.remove_changes(&mut doc, "exp1");
    assert_eq!(doc.text_content(cta), "Buy");
}

#[test]
fn every_change_kind_reverts_to_the_original_markup() {
    let mut doc = Document::parse(PAGE);
    let original = doc.to_html();
    let mut manager = PreviewStateManager::default();

    let changes = vec![
        DomChange::text("#title", "Winter sale"),
        DomChange::html("#list", "<li>only</li>"),
        DomChange::style("#cta", [("color", "red"), ("font-weight", "700")]),
        DomChange::class("#title", "big", ClassOp::Remove),
        DomChange::class("#cta", "pulse", ClassOp::Add),
        DomChange::attribute("#cta", "aria-label", "Buy now"),
        DomChange::attribute("#cta", "title", "added"),
        DomChange::insert("#cta", r#"<p class="note">Free shipping</p>"#, InsertPosition::After),
        DomChange::duplicate("#title"),
        DomChange::moved("#cta", "#title", InsertPosition::Before),
        DomChange::delete("#list"),
    ];
    let report = manager.apply_changes(&mut doc, &changes, "exp");
    assert!(report.is_clean(), "{:?}", report.failed);
    assert_eq!(report.applied, changes.len());

    let cta = doc.query_one("#cta").unwrap().unwrap();
    assert_eq!(doc.style_property(cta, "color").as_deref(), Some("red"));
    assert_eq!(doc.attr(cta, "title"), Some("added"));
    assert!(doc.has_class(cta, "pulse"));
    assert_eq!(doc.query_all("p.note").unwrap().len(), 1);
    assert_eq!(doc.query_all("h1").unwrap().len(), 2);
    assert_eq!(doc.query_one("#main > :first-child").unwrap(), Some(cta));
    assert_ne!(doc.to_html(), original);

    let removed = manager.remove_changes(&mut doc, "exp");
    assert_eq!(removed.removed, 2);
    assert_eq!(doc.to_html(), original);
}

#[test]
fn remove_is_idempotent() {
    let mut doc = Document::parse(PAGE);
    let original = doc.to_html();
    let mut manager = PreviewStateManager::default();
    manager.apply_changes(&mut doc, &[DomChange::style("#cta", [("color", "red")])], "exp");

    let first = manager.remove_changes(&mut doc, "exp");
    let after_first = doc.to_html();
    let second = manager.remove_changes(&mut doc, "exp");
    assert!(!first.is_noop());
    assert!(second.is_noop());
    assert_eq!(doc.to_html(), after_first);
    assert_eq!(after_first, original);

    assert!(manager.remove_changes(&mut doc, "never-applied").is_noop());
}

#[test]
fn failing_change_does_not_abort_the_batch() {
    let mut doc = Document::parse(PAGE);
    let mut manager = PreviewStateManager::default();
    let changes = vec![
        DomChange::moved("#cta", "#nowhere", InsertPosition::After),
        DomChange::text("#missing", "x"),
        DomChange::text("#title", "Still applied").disabled(),
        DomChange::text("#cta", "Order"),
    ];
    let report = manager.apply_changes(&mut doc, &changes, "exp");
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 0);
    assert!(report.failed[0].1.is_retryable());

    let title = doc.query_one("#title").unwrap().unwrap();
    assert_eq!(doc.text_content(title), "Summer sale");
    assert_eq!(doc.attr(title, LABEL_ATTR), None);
}

#[test]
fn html_values_are_sanitized() {
    let mut doc = Document::parse(PAGE);
    let mut manager = PreviewStateManager::default();
    manager
        .apply_change(
            &mut doc,
            &DomChange::html("#title", r#"<b onclick="x()">Hi</b><script>alert(1)</script>"#),
            "exp",
        )
        .unwrap();
    let title = doc.query_one("#title").unwrap().unwrap();
    assert_eq!(doc.inner_html(title).unwrap(), "<b>Hi</b>");

    let mut raw = PreviewStateManager::new(PreviewPolicy {
        sanitize_html: false,
        ..PreviewPolicy::default()
    });
    raw.apply_change(&mut doc, &DomChange::html("#cta", "<i onclick=\"x()\">raw</i>"), "raw")
        .unwrap();
    assert!(doc.to_html().contains("onclick"));
}

#[test]
fn another_instance_can_revert_from_original_data() {
    let mut doc = Document::parse(PAGE);
    let original = doc.to_html();
    let mut first = PreviewStateManager::default();
    first.apply_changes(
        &mut doc,
        &[
            DomChange::text("#title", "Gone"),
            DomChange::attribute("#cta", "title", "added"),
            DomChange::insert("#list", "<li>new</li>", InsertPosition::Append),
        ],
        "exp",
    );
    let title = doc.query_one("#title").unwrap().unwrap();
    assert!(doc.has_attr(title, ORIGINAL_ATTR));
    drop(first);

    let mut second = PreviewStateManager::default();
    let report = second.remove_changes(&mut doc, "exp");
    assert_eq!(report.restored, 0);
    assert!(report.swept >= 3);
    assert_eq!(doc.to_html(), original);
}

#[test]
fn sweep_without_original_data_only_strips_markers() {
    let mut doc = Document::parse(PAGE);
    let mut first = PreviewStateManager::new(PreviewPolicy {
        write_original_data: false,
        ..PreviewPolicy::default()
    });
    first.apply_change(&mut doc, &DomChange::text("#cta", "Order"), "exp").unwrap();
    drop(first);

    PreviewStateManager::default().remove_changes(&mut doc, "exp");
    let cta = doc.query_one("#cta").unwrap().unwrap();
    assert_eq!(doc.text_content(cta), "Order");
    assert!(!doc.to_html().contains("data-vstudio-"));
}

#[test]
fn labels_sharing_an_element_revert_independently() {
    let mut doc = Document::parse(r#"<button id="cta">Buy</button>"#);
    let original = doc.to_html();
    let mut manager = PreviewStateManager::default();
    manager
        .apply_change(&mut doc, &DomChange::text("#cta", "Buy Now"), "A")
        .unwrap();
    manager
        .apply_change(&mut doc, &DomChange::style("#cta", [("color", "red")]), "B")
        .unwrap();
    let cta = doc.query_one("#cta").unwrap().unwrap();

    manager.remove_changes(&mut doc, "A");
    assert_eq!(doc.text_content(cta), "Buy");
    assert_eq!(doc.style_property(cta, "color").as_deref(), Some("red"));
    assert_eq!(doc.attr(cta, LABEL_ATTR), Some("B"));
    assert!(doc.has_attr(cta, ORIGINAL_ATTR));
    assert_eq!(manager.active_labels(), vec!["B"]);

    manager.remove_changes(&mut doc, "B");
    assert_eq!(doc.outer_html(cta), r#"<button id="cta">Buy</button>"#);
    assert_eq!(doc.to_html(), original);
    assert!(manager.active_labels().is_empty());
}

#[test]
fn shared_element_reverts_in_either_order() {
    let mut doc = Document::parse(r#"<button id="cta">Buy</button>"#);
    let original = doc.to_html();
    let mut manager = PreviewStateManager::default();
    manager.apply_change(&mut doc, &DomChange::text("#cta", "Buy Now"), "A").unwrap();
    manager
        .apply_change(&mut doc, &DomChange::style("#cta", [("color", "red")]), "B")
        .unwrap();
    manager
        .apply_change(&mut doc, &DomChange::class("#cta", "pulse", ClassOp::Add), "A")
        .unwrap();
    let cta = doc.query_one("#cta").unwrap().unwrap();

    manager.remove_changes(&mut doc, "B");
    assert_eq!(doc.text_content(cta), "Buy Now");
    assert!(doc.has_class(cta, "pulse"));
    assert_eq!(doc.style_property(cta, "color"), None);
    assert_eq!(doc.attr(cta, LABEL_ATTR), Some("A"));

    manager.remove_changes(&mut doc, "A");
    assert_eq!(doc.to_html(), original);
}

#[test]
fn other_labels_inserted_nodes_survive_a_shared_revert() {
    let mut doc = Document::parse(PAGE);
    let original = doc.to_html();
    let mut manager = PreviewStateManager::default();
    manager
        .apply_change(&mut doc, &DomChange::attribute("#list", "data-mode", "compact"), "A")
        .unwrap();
    manager
        .apply_change(&mut doc, &DomChange::insert("#list", "<li>three</li>", InsertPosition::Append), "B")
        .unwrap();

    manager.remove_changes(&mut doc, "A");
    let list = doc.query_one("#list").unwrap().unwrap();
    assert_eq!(doc.attr(list, "data-mode"), None);
    assert_eq!(doc.text_content(list), "12three");

    let report = manager.remove_changes(&mut doc, "B");
    assert_eq!(report.removed, 1);
    assert_eq!(doc.to_html(), original);
}
