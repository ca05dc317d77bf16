use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use variant_core_types::{DomChange, InsertPosition};
use variant_page_dom::{DomEvent, Document, EventKind};
use variant_selector::SelectorGenerator;
use variant_visual_editor::{EditorAction, InsertBlock, MenuCommand, ToolbarAction, VisualEditor};

type Seen = Arc<Mutex<Vec<Vec<DomChange>>>>;

fn start(doc: &mut Document, initial: Vec<DomChange>) -> (VisualEditor, Seen) {
    let mut editor = VisualEditor::new(Arc::new(SelectorGenerator::default()), "Variant B");
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    editor
        .start(
            doc,
            initial,
            Box::new(move |changes: &[DomChange]| sink.lock().unwrap().push(changes.to_vec())),
        )
        .unwrap();
    (editor, seen)
}

fn styles(pairs: &[(&str, &str)]) -> EditorAction {
    let map: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EditorAction::SetStyle(map)
}

#[test]
fn style_edits_merge_and_undo_walks_back_the_page() {
    let mut doc = Document::parse(r#"<button id="cta">Buy</button>"#);
    let cta = doc.query_one("#cta").unwrap().unwrap();
    let (mut editor, _) = start(&mut doc, Vec::new());
    editor.select(&mut doc, cta).unwrap();

    editor.apply_action(&mut doc, styles(&[("color", "red")])).unwrap();
    editor.apply_action(&mut doc, styles(&[("background", "blue")])).unwrap();
    assert_eq!(
        editor.changes(),
        &[DomChange::style("#cta", [("background", "blue"), ("color", "red")])]
    );
    assert_eq!(doc.style_property(cta, "background").as_deref(), Some("blue"));

    editor.undo_last_change(&mut doc);
    assert_eq!(editor.changes(), &[DomChange::style("#cta", [("color", "red")])]);
    assert_eq!(doc.style_property(cta, "background"), None);
    assert_eq!(doc.style_property(cta, "color").as_deref(), Some("red"));

    editor.undo_last_change(&mut doc);
    assert!(editor.changes().is_empty());
    assert_eq!(doc.attr(cta, "style"), None);
}

#[test]
fn move_down_records_sibling_anchor_and_undo_restores_order() {
    let mut doc = Document::parse(r#"<ul id="list"><li id="a">A</li><li id="b">B</li></ul>"#);
    let list = doc.query_one("#list").unwrap().unwrap();
    let a = doc.query_one("#a").unwrap().unwrap();
    let b = doc.query_one("#b").unwrap().unwrap();
    let (mut editor, _) = start(&mut doc, Vec::new());

    editor.select(&mut doc, a).unwrap();
    let change = editor.apply_action(&mut doc, EditorAction::MoveDown).unwrap();
    assert_eq!(change, Some(DomChange::moved("#a", "#b", InsertPosition::After)));
    assert_eq!(doc.element_children(list), vec![b, a]);

    assert!(editor.apply_action(&mut doc, EditorAction::MoveDown).is_err());

    editor.undo_last_change(&mut doc);
    assert_eq!(doc.element_children(list), vec![a, b]);
}

#[test]
fn remove_detaches_and_undo_puts_it_back() {
    let mut doc = Document::parse(r#"<div id="wrap"><p id="one">1</p><p id="two">2</p></div>"#);
    let wrap = doc.query_one("#wrap").unwrap().unwrap();
    let one = doc.query_one("#one").unwrap().unwrap();
    let two = doc.query_one("#two").unwrap().unwrap();
    let (mut editor, _) = start(&mut doc, Vec::new());

    editor.select(&mut doc, one).unwrap();
    let change = editor.apply_action(&mut doc, EditorAction::Remove).unwrap();
    assert_eq!(change, Some(DomChange::delete("#one")));
    assert_eq!(editor.selected(), None);
    assert_eq!(doc.element_children(wrap), vec![two]);

    editor.undo_last_change(&mut doc);
    assert_eq!(doc.element_children(wrap), vec![one, two]);
}

#[test]
fn insert_and_duplicate_are_undone_by_detaching() {
    let mut doc = Document::parse(r#"<section id="hero"><h1>Hi</h1></section>"#);
    let hero = doc.query_one("#hero").unwrap().unwrap();
    let (mut editor, _) = start(&mut doc, Vec::new());
    editor.select(&mut doc, hero).unwrap();

    let block = InsertBlock::new(InsertPosition::Append, "p", "Free shipping").with_classes(["note"]);
    let change = editor
        .apply_action(&mut doc, EditorAction::Insert(block))
        .unwrap()
        .unwrap();
    assert_eq!(
        change,
        DomChange::insert("#hero", r#"<p class="note">Free shipping</p>"#, InsertPosition::Append)
    );
    assert_eq!(doc.query_all("#hero > p.note").unwrap().len(), 1);

    editor.apply_action(&mut doc, EditorAction::Duplicate).unwrap();
    assert_eq!(doc.query_all("section").unwrap().len(), 2);
    assert_eq!(editor.change_count(), 2);

    editor.toolbar_action(&mut doc, ToolbarAction::Clear);
    assert_eq!(doc.query_all("section").unwrap().len(), 1);
    assert!(doc.query_all("p.note").unwrap().is_empty());
    assert_eq!(editor.change_count(), 0);
}

#[test]
fn menu_and_toolbar_clicks_drive_the_session() {
    let mut doc = Document::parse(r#"<p id="promo">Sale</p>"#);
    let promo = doc.query_one("#promo").unwrap().unwrap();
    let (mut editor, seen) = start(&mut doc, Vec::new());

    editor.handle_event(&mut doc, &DomEvent::click(promo));
    assert!(editor.is_menu_open());

    let hide = doc.query_one(r#"[data-vstudio-action="hide"]"#).unwrap().unwrap();
    let response = editor.handle_event(&mut doc, &DomEvent::click(hide));
    assert!(response.changed);
    assert!(!editor.is_menu_open());
    assert!(doc.is_display_none(promo));
    assert_eq!(editor.changes(), &[DomChange::style("#promo", [("display", "none")])]);
    assert_eq!(editor.chrome().unwrap().count_text(&doc), "1 change");

    editor.handle_event(&mut doc, &DomEvent::click(promo));
    let edit = doc.query_one(r#"[data-vstudio-action="edit-text"]"#).unwrap().unwrap();
    let response = editor.handle_event(&mut doc, &DomEvent::click(edit));
    assert_eq!(response.input_requested, Some(MenuCommand::EditText));
    assert_eq!(editor.change_count(), 1);

    let undo = doc.query_one(r#"[data-vstudio-action="undo"]"#).unwrap().unwrap();
    let response = editor.handle_event(&mut doc, &DomEvent::click(undo));
    assert!(response.changed);
    assert!(!doc.is_display_none(promo));
    assert_eq!(seen.lock().unwrap().last().unwrap(), &Vec::<DomChange>::new());
}

#[test]
fn seeded_changes_show_in_count_and_survive_undo() {
    let mut doc = Document::parse(r#"<h1 id="title">Hello</h1>"#);
    let seeded = vec![
        DomChange::text("#title", "Welcome"),
        DomChange::style("#title", [("color", "green")]),
    ];
    let (mut editor, _) = start(&mut doc, seeded.clone());
    assert_eq!(editor.chrome().unwrap().count_text(&doc), "2 changes");
    assert_eq!(editor.undo_last_change(&mut doc), None);
    assert_eq!(editor.changes(), seeded.as_slice());
}

#[test]
fn stop_restores_the_page_and_flushes_once() {
    let mut doc = Document::parse(r#"<main><p id="p">x</p></main>"#);
    let before = doc.to_html();
    let p = doc.query_one("#p").unwrap().unwrap();
    let (mut editor, _) = start(&mut doc, vec![DomChange::delete("#gone")]);
    let owner = editor.listener_owner();
    assert_eq!(doc.listeners().count_for(&owner), 7);

    editor.handle_event(&mut doc, &DomEvent::pointer(EventKind::MouseOver, Some(p), 0.0, 0.0));
    editor.handle_event(&mut doc, &DomEvent::click(p));
    assert_ne!(doc.to_html(), before);

    let exit = doc.query_one(r#"[data-vstudio-action="exit"]"#).unwrap().unwrap();
    let response = editor.handle_event(&mut doc, &DomEvent::click(exit));
    assert_eq!(response.completed, Some(vec![DomChange::delete("#gone")]));
    assert_eq!(editor.stop(&mut doc), None);

    assert_eq!(doc.to_html(), before);
    assert_eq!(doc.listeners().count_for(&owner), 0);
    assert!(!editor.liveness().load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn starting_twice_keeps_a_single_set_of_listeners() {
    let mut doc = Document::parse("<p>x</p>");
    let (mut editor, _) = start(&mut doc, Vec::new());
    editor
        .start(&mut doc, vec![DomChange::delete("#ignored")], Box::new(|_: &[DomChange]| {}))
        .unwrap();
    assert_eq!(doc.listeners().count(), 7);
    assert_eq!(editor.change_count(), 0);
    assert_eq!(doc.query_all(".vstudio-editor-toolbar").unwrap().len(), 1);
}
