use pretty_assertions::assert_eq;
use wikiedit_editor::{AnnotationMethod, History, Surface, Transaction};
use wikiedit_model::data::chars;
use wikiedit_model::example::{bold, example_data};
use wikiedit_model::{Document, Item, Range};

fn surface() -> Surface {
    Surface::new(Document::with_defaults(example_data()).unwrap())
}

#[test]
fn test_change_records_and_undo_restores() {
    let mut surface = surface();
    let tx = Transaction::new_from_insertion(surface.document(), 1, &chars("hi")).unwrap();
    surface.change(Some(tx), Some(Range::new(1, 3))).unwrap();
    assert_eq!(surface.document().len(), 63);
    assert_eq!(surface.selection(), Range::new(1, 3));

    let selection = surface.undo().unwrap();
    assert_eq!(selection, Some(Range::new(1, 1)));
    assert_eq!(surface.document().data(), &example_data()[..]);
    assert!(surface.history().can_redo());

    let selection = surface.redo().unwrap();
    assert_eq!(selection, Some(Range::new(1, 3)));
    assert_eq!(surface.document().item(1), Some(&Item::Char('h')));
}

#[test]
fn test_breakpoints_split_undo_steps() {
    let mut surface = surface();
    for text in ["a", "b"] {
        let tx = Transaction::new_from_insertion(surface.document(), 1, &chars(text)).unwrap();
        surface.change(Some(tx), None).unwrap();
        surface.breakpoint();
    }
    assert_eq!(surface.history().undo_levels(), 2);

    surface.undo().unwrap();
    assert_eq!(surface.document().len(), 62);
    assert_eq!(surface.document().item(1), Some(&Item::Char('a')));
    surface.undo().unwrap();
    assert_eq!(surface.document().data(), &example_data()[..]);
    assert_eq!(surface.undo().unwrap(), None);
}

#[test]
fn test_selection_only_change_records_nothing() {
    let mut surface = surface();
    surface.change(None, Some(Range::new(5, 2))).unwrap();
    assert_eq!(surface.selection(), Range::new(2, 5));
    assert!(!surface.breakpoint());
}

#[test]
fn test_annotate_selection() {
    let mut surface = surface();
    surface.change(None, Some(Range::new(1, 2))).unwrap();
    surface.annotate(AnnotationMethod::Set, &bold()).unwrap();
    assert!(surface.document().offset_contains_annotation(1, &bold()));

    // Already bold everywhere, nothing to record
    surface.breakpoint();
    surface.annotate(AnnotationMethod::Set, &bold()).unwrap();
    assert!(!surface.breakpoint());

    surface.undo().unwrap();
    assert!(!surface.document().offset_contains_annotation(1, &bold()));
}

#[test]
fn test_history_limit() {
    let document = Document::with_defaults(example_data()).unwrap();
    let mut surface = Surface::with_history(document, History::with_max_levels(1));
    for _ in 0..3 {
        let tx = Transaction::new_from_insertion(surface.document(), 1, &chars("x")).unwrap();
        surface.change(Some(tx), None).unwrap();
        surface.breakpoint();
    }
    assert_eq!(surface.history().undo_levels(), 1);
    surface.undo().unwrap();
    assert_eq!(surface.document().len(), 63);
}
