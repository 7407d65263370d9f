use typemaster::clipboard::MemoryClipboard;
use typemaster::editor::{EditCommand, EditorBuffer, MAX_CHARS};
use typemaster::passage::PassageLibrary;
use typemaster::session::{InputEvent, Phase, Session, SessionConfig, SessionError, SideEffect};

// A passage authored in the editor, including a multi-line paste, becomes the only
// passage of a custom session.
#[test]
fn authored_passage_is_typed_verbatim() {
    let mut clipboard = MemoryClipboard::with_text("quick\r\nbrown\n\n  fox");
    let mut editor = EditorBuffer::new();
    for c in "the ".chars() {
        editor.apply(EditCommand::Insert(c), &mut clipboard);
    }
    editor.apply(EditCommand::Paste, &mut clipboard);
    assert_eq!(editor.text(), "the quick brown fox");

    let mut session = Session::new(SessionConfig {
        custom_passage: Some(editor.text()),
        ..SessionConfig::default()
    });
    session.start(&PassageLibrary::Bundled).unwrap();
    assert_eq!(session.passages().len(), 1);

    let inputs: Vec<_> = editor.text().chars().map(InputEvent::Char).collect();
    let transition = session.tick(&inputs, 0.0);
    assert_eq!(transition.phase, Phase::Completed);
    match transition.effects.as_slice() {
        [SideEffect::Completed(summary)] => {
            assert_eq!(summary.correct_chars, 19);
            assert_eq!(summary.accuracy, 100.0);
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[test]
fn cleared_editor_cannot_start() {
    let mut clipboard = MemoryClipboard::default();
    let mut editor = EditorBuffer::from_text("something");
    editor.apply(EditCommand::SelectAll, &mut clipboard);
    editor.apply(EditCommand::Backspace, &mut clipboard);
    assert!(editor.is_empty());

    let mut session = Session::new(SessionConfig {
        custom_passage: Some(editor.text()),
        ..SessionConfig::default()
    });
    assert_eq!(
        session.start(&PassageLibrary::Bundled),
        Err(SessionError::EmptyCustomPassage)
    );
    assert_eq!(session.phase(), Phase::Idle);
}

#[test]
fn oversized_paste_is_capped() {
    let mut clipboard = MemoryClipboard::with_text("x".repeat(MAX_CHARS * 2));
    let mut editor = EditorBuffer::from_text("ab");
    editor.apply(EditCommand::Paste, &mut clipboard);
    assert_eq!(editor.len(), MAX_CHARS);
    assert_eq!(editor.caret(), MAX_CHARS);
}
