use pretty_assertions::assert_eq;
use variant_page_dom::{css_escape, Adjacent, Document, Rect};

const PAGE: &str = r#"
<header><nav class="nav"><a href="/">Home</a><a href="/pricing">Pricing</a></nav></header>
<main>
  <section class="hero">
    <h1>Grow faster</h1>
    <button id="cta" class="btn btn-primary">Buy</button>
  </section>
  <div class="box">one</div>
  <div class="box">two</div>
  <div class="box">three</div>
</main>
"#;

#[test]
fn parse_query_mutate_serialize() {
    let mut doc = Document::parse(PAGE);

    let cta = doc.query_one("#cta").unwrap().unwrap();
    assert_eq!(doc.text_content(cta), "Buy");
    assert_eq!(doc.query_all(".box").unwrap().len(), 3);
    assert_eq!(
        doc.query_all("main > div.box:nth-child(3)").unwrap(),
        vec![doc.query_all(".box").unwrap()[1]]
    );

    doc.set_text_content(cta, "Buy Now").unwrap();
    doc.set_style_property(cta, "color", "red").unwrap();
    let html = doc.to_html();
    assert!(html.contains(r#"<button id="cta" class="btn btn-primary" style="color: red;">Buy Now</button>"#));
}

#[test]
fn move_and_duplicate_keep_tree_consistent() {
    let mut doc = Document::parse(PAGE);
    let boxes = doc.query_all(".box").unwrap();
    let hero = doc.query_one(".hero").unwrap().unwrap();

    doc.insert_adjacent(hero, Adjacent::BeforeBegin, boxes[2]).unwrap();
    let main = doc.query_one("main").unwrap().unwrap();
    assert_eq!(doc.element_children(main)[0], boxes[2]);

    let copy = doc.deep_clone(boxes[0]).unwrap();
    doc.insert_adjacent(boxes[0], Adjacent::AfterEnd, copy).unwrap();
    let texts: Vec<String> = doc
        .query_all(".box")
        .unwrap()
        .into_iter()
        .map(|n| doc.text_content(n))
        .collect();
    assert_eq!(texts, vec!["three", "one", "one", "two"]);
}

#[test]
fn hit_testing_uses_host_layout() {
    let mut doc = Document::parse(PAGE);
    let hero = doc.query_one(".hero").unwrap().unwrap();
    let cta = doc.query_one("#cta").unwrap().unwrap();
    doc.set_layout(hero, Rect::new(0.0, 0.0, 800.0, 400.0)).unwrap();
    doc.set_layout(cta, Rect::new(40.0, 300.0, 120.0, 40.0)).unwrap();

    assert_eq!(doc.element_from_point(50.0, 310.0), Some(cta));
    assert_eq!(doc.element_from_point(500.0, 10.0), Some(hero));
    assert_eq!(doc.element_from_point(900.0, 10.0), None);
}

#[test]
fn generated_id_selectors_resolve() {
    let mut doc = Document::parse("<p id=\"price:main\">9</p><p id=\"2024\">x</p>");
    for raw in ["price:main", "2024"] {
        let selector = format!("#{}", css_escape(raw));
        let found = doc.query_all(&selector).unwrap();
        assert_eq!(found.len(), 1, "{selector}");
        assert_eq!(doc.attr(found[0], "id"), Some(raw));
    }
    let body = doc.body().unwrap();
    doc.set_inner_html(body, "").unwrap();
    assert!(doc.query_all("p").unwrap().is_empty());
}
