use pretty_assertions::assert_eq;
use wikiedit_converter::{Converter, ConverterError};
use wikiedit_dom::{parse_fragment, to_html};
use wikiedit_model::data::chars;
use wikiedit_model::example::{bold, example_data, italic};
use wikiedit_model::{Annotation, AnnotationSet, Element, Item};

fn data_from_html(html: &str) -> Vec<Item> {
    let dom = parse_fragment(html).unwrap();
    Converter::with_defaults().get_data_from_dom(&dom).unwrap()
}

fn html_from_data(data: &[Item]) -> String {
    let dom = Converter::with_defaults().get_dom_from_data(data).unwrap();
    to_html(&dom)
}

fn annotated(ch: char, annotations: &[Annotation]) -> Item {
    let set: AnnotationSet = annotations.iter().cloned().collect();
    Item::Annotated(ch, set)
}

#[test]
fn test_example_document_round_trip() {
    let html = html_from_data(&example_data());
    assert!(html.starts_with(
        "<h1>a<b>b</b><i>c</i></h1><table><tbody><tr><td><p>d</p><ul><li><p>e</p><ul>"
    ));
    assert!(html.contains("<pre>h<img src=\"image.png\">i</pre>"));
    assert!(html.ends_with("<dl><dt><p>j</p></dt><dd><p>k</p></dd></dl><p>l</p><p>m</p>"));

    assert_eq!(data_from_html(&html), example_data());
}

#[test]
fn test_nested_annotations() {
    let data = data_from_html("<p><b>a<i>b</i></b>c</p>");
    assert_eq!(
        data,
        vec![
            Item::open("paragraph"),
            annotated('a', &[bold()]),
            annotated('b', &[bold(), italic()]),
            Item::Char('c'),
            Item::close("paragraph"),
        ]
    );
    assert_eq!(html_from_data(&data), "<p><b>a<i>b</i></b>c</p>");
}

#[test]
fn test_bare_content_is_wrapped() {
    let data = data_from_html("hi <b>x</b><p>y</p>");
    let mut expected = vec![Item::open("paragraph")];
    expected.extend(chars("hi "));
    expected.push(annotated('x', &[bold()]));
    expected.push(Item::close("paragraph"));
    expected.push(Item::open("paragraph"));
    expected.push(Item::Char('y'));
    expected.push(Item::close("paragraph"));
    assert_eq!(data, expected);
}

#[test]
fn test_list_item_text_is_wrapped() {
    assert_eq!(
        data_from_html("<ol><li>x</li></ol>"),
        vec![
            Item::Element(Element::open("list").with_attribute("style", "number")),
            Item::open("listItem"),
            Item::open("paragraph"),
            Item::Char('x'),
            Item::close("paragraph"),
            Item::close("listItem"),
            Item::close("list"),
        ]
    );
}

#[test]
fn test_inline_image_at_top_level_is_wrapped() {
    assert_eq!(
        data_from_html("<img src=\"x.png\">"),
        vec![
            Item::open("paragraph"),
            Item::Element(Element::open("image").with_attribute("html/src", "x.png")),
            Item::close("image"),
            Item::close("paragraph"),
        ]
    );
}

#[test]
fn test_whitespace_between_blocks_and_comments_are_dropped() {
    let data = data_from_html("<h2>a</h2>\n<!-- note -->\n<p>b<!-- x -->c</p>\n");
    let mut expected = vec![Item::Element(Element::open("heading").with_attribute("level", 2))];
    expected.push(Item::Char('a'));
    expected.push(Item::close("heading"));
    expected.push(Item::open("paragraph"));
    expected.extend(chars("bc"));
    expected.push(Item::close("paragraph"));
    assert_eq!(data, expected);
}

#[test]
fn test_unknown_markup_becomes_alien() {
    let html = "<div class=\"box\">hi</div><p>a<span>b</span><em data-mw-gc=\"1\">c</em></p>";
    let data = data_from_html(html);
    assert_eq!(
        data[0],
        Item::Element(Element::open("alienBlock").with_attribute("html", "<div class=\"box\">hi</div>"))
    );
    assert_eq!(data[1], Item::close("alienBlock"));
    assert_eq!(
        data[4],
        Item::Element(Element::open("alienInline").with_attribute("html", "<span>b</span>"))
    );
    assert_eq!(data[6].element_type(), Some("alienInline"));
    assert_eq!(data.len(), 9);

    assert_eq!(html_from_data(&data), html);
}

#[test]
fn test_link_annotation() {
    let html = "<p><a href=\"./Foo\" rel=\"mw:wikiLink\">Foo</a>s</p>";
    let data = data_from_html(html);
    let link = Annotation::new("link/wikiLink").with_data("href", "./Foo");
    assert_eq!(data[1], annotated('F', &[link]));
    assert_eq!(data[4], Item::Char('s'));
    assert_eq!(html_from_data(&data), html);
}

#[test]
fn test_conversion_errors() {
    let converter = Converter::with_defaults();
    let alien = vec![Item::open("alienBlock"), Item::close("alienBlock")];
    assert_eq!(
        converter.get_dom_from_data(&alien),
        Err(ConverterError::MissingAlienHtml("alienBlock".to_string()))
    );

    let heading = vec![
        Item::Element(Element::open("heading").with_attribute("level", 9)),
        Item::close("heading"),
    ];
    assert_eq!(
        converter.get_dom_from_data(&heading),
        Err(ConverterError::UnconvertibleElement("heading".to_string()))
    );
}
