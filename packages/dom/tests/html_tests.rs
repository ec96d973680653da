use pretty_assertions::assert_eq;
use wikiedit_dom::{parse_fragment, to_html, DomNode};

#[test]
fn test_parse_nested_elements() {
    let nodes = parse_fragment("<h1>a<b>b</b></h1><p>c</p>").unwrap();
    assert_eq!(
        nodes,
        vec![
            DomNode::element("h1")
                .with_child(DomNode::text("a"))
                .with_child(DomNode::element("b").with_child(DomNode::text("b"))),
            DomNode::element("p").with_child(DomNode::text("c")),
        ]
    );
}

#[test]
fn test_void_and_self_closing_elements() {
    let nodes = parse_fragment("<p>a<br>b<img src=\"x.png\"/>c</p>").unwrap();
    assert_eq!(nodes.len(), 1);
    let children = nodes[0].children();
    assert_eq!(children.len(), 5);
    assert_eq!(children[1].tag(), Some("br"));
    assert_eq!(children[3].attr("src"), Some("x.png"));
}

#[test]
fn test_implied_closings() {
    let nodes = parse_fragment("<ul><li>a<li>b</ul><p>x<p>y").unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].children().len(), 2);
    assert_eq!(nodes[1].text_content(), "x");
    assert_eq!(nodes[2].text_content(), "y");
}

#[test]
fn test_table_rows_close_cells() {
    let nodes = parse_fragment("<table><tbody><tr><td>a<td>b<tr><td>c</table>").unwrap();
    let tbody = &nodes[0].children()[0];
    assert_eq!(tbody.children().len(), 2);
    assert_eq!(tbody.children()[0].children().len(), 2);
}

#[test]
fn test_stray_closing_is_dropped() {
    let nodes = parse_fragment("a</b>c").unwrap();
    assert_eq!(nodes, vec![DomNode::text("ac")]);
}

#[test]
fn test_comments_and_entities_round_trip() {
    let source = "<p title=\"&quot;q&quot;\">a &amp; b<!-- note --></p>";
    let nodes = parse_fragment(source).unwrap();
    assert_eq!(nodes[0].attr("title"), Some("\"q\""));
    assert_eq!(to_html(&nodes), source);
}

#[test]
fn test_serde_shape() {
    let node = DomNode::element("a").with_attr("href", "x");
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"type": "Element", "tag": "a", "attributes": {"href": "x"}})
    );
}
