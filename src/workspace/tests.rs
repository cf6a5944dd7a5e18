use rustc_hash::FxHashSet;

use super::*;

fn ids(ws: &Workspace) -> Vec<FileId> {
    ws.files().iter().map(|f| f.id).collect()
}

fn assert_invariants(ws: &Workspace) {
    let all = ids(ws);
    let unique: FxHashSet<_> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len(), "duplicate file ids");

    match ws.active_id() {
        Some(id) => assert!(ws.get(id).is_some(), "active file {id} does not exist"),
        None => assert!(ws.is_empty(), "no active file in a non-empty workspace"),
    }
}

#[test]
fn test_add_file_becomes_active_with_template() {
    let mut ws = Workspace::new();
    let id = ws.add_file(FileKind::Markup, "src");

    let file = ws.get(id).unwrap();
    assert_eq!(ws.active_id(), Some(id));
    assert_eq!(file.directory, "src");
    assert!(file.name.ends_with(".html"));
    assert_eq!(file.content, template::DEFAULT_MARKUP);

    let css = ws.add_file(FileKind::Style, "");
    assert_eq!(ws.get(css).unwrap().content, "");
    assert_eq!(ws.active_id(), Some(css));
}

#[test]
fn test_generated_names_unique_within_directory() {
    let mut ws = Workspace::new();
    ws.add_named_file("new_file1.js", FileKind::Script, "", "").unwrap();

    let id = ws.add_file(FileKind::Script, "");
    assert_ne!(ws.get(id).unwrap().name, "new_file1.js");
}

#[test]
fn test_add_directory() {
    let mut ws = Workspace::new();
    assert_eq!(ws.add_directory("", ""), None);
    assert_eq!(ws.add_directory("src", "  "), None);

    let id = ws.add_directory("src", "css").unwrap();
    let marker = ws.get(id).unwrap();
    assert!(marker.is_marker());
    assert_eq!(marker.directory, "src/css");
    assert!(marker.content.is_empty());

    // Same directory twice yields nothing
    assert_eq!(ws.add_directory("src", "css"), None);
    assert_eq!(ws.list_directories(), vec!["src/css".to_string()]);
}

#[test]
fn test_remove_marker_cascades_exactly() {
    let mut ws = Workspace::new();
    let root = ws.add_named_file("index.html", FileKind::Markup, "", "").unwrap();
    let marker = ws.add_directory("", "src").unwrap();
    let inner = ws.add_named_file("a.css", FileKind::Style, "src", "").unwrap();
    let nested = ws.add_named_file("b.js", FileKind::Script, "src/js", "").unwrap();
    let sibling = ws.add_named_file("c.js", FileKind::Script, "srcs", "").unwrap();

    let mut removed = ws.remove_file(marker);
    removed.sort();
    assert_eq!(removed, vec![marker, inner, nested]);
    assert_eq!(ids(&ws), vec![root, sibling]);
    assert_invariants(&ws);
}

#[test]
fn test_remove_active_falls_back_to_first_remaining() {
    let mut ws = Workspace::new();
    let dir = ws.add_directory("", "empty").unwrap();
    let first = ws.add_named_file("a.html", FileKind::Markup, "", "").unwrap();
    let second = ws.add_file(FileKind::Style, "");
    assert_eq!(ws.active_id(), Some(second));

    ws.remove_file(second);
    // Markers are skipped while a regular file remains
    assert_eq!(ws.active_id(), Some(first));

    ws.remove_file(first);
    assert_eq!(ws.active_id(), Some(dir));

    ws.remove_file(dir);
    assert_eq!(ws.active_id(), None);
    assert!(ws.is_empty());
}

#[test]
fn test_remove_unknown_is_noop() {
    let mut ws = Workspace::starter();
    let before = ids(&ws);
    let id = ws.add_file(FileKind::Script, "");
    ws.remove_file(id);
    assert!(ws.remove_file(id).is_empty());
    assert_eq!(ids(&ws), before);
}

#[test]
fn test_rename_keeps_id_and_directory() {
    let mut ws = Workspace::starter();
    let css = ws.first_of_kind(FileKind::Style).unwrap().id;

    ws.rename_file(css, "main.css").unwrap();
    let file = ws.get(css).unwrap();
    assert_eq!(file.name, "main.css");
    assert_eq!(file.directory, "src");
    assert_eq!(file.kind, FileKind::Style);
}

#[test]
fn test_rename_rejects_conflicts() {
    let mut ws = Workspace::starter();
    let css = ws.first_of_kind(FileKind::Style).unwrap().id;

    assert_eq!(ws.rename_file(css, ""), Err(WorkspaceError::EmptyName));
    assert!(matches!(
        ws.rename_file(css, "script.js"),
        Err(WorkspaceError::NameTaken { .. })
    ));
    assert!(matches!(
        ws.rename_file(css, DIRECTORY_MARKER),
        Err(WorkspaceError::ReservedName(_))
    ));
    // Renaming to its own name is fine
    assert_eq!(ws.rename_file(css, "styles.css"), Ok(()));
}

#[test]
fn test_ids_never_reused() {
    let mut ws = Workspace::new();
    let mut seen = FxHashSet::default();

    for round in 0..20 {
        let kind = FileKind::ALL[round % FileKind::ALL.len()];
        let id = ws.add_file(kind, if round % 3 == 0 { "src" } else { "" });
        assert!(seen.insert(id), "id {id} handed out twice");

        if round % 4 == 0 {
            ws.remove_file(id);
        }
        if round % 5 == 0
            && let Some(dir) = ws.add_directory("src", &format!("d{round}"))
        {
            assert!(seen.insert(dir));
        }
        if round % 7 == 0
            && let Some(first) = ws.files().first().map(|f| f.id)
        {
            ws.remove_file(first);
        }
        assert_invariants(&ws);
    }
}

#[test]
fn test_list_directories_sorted_with_root() {
    let mut ws = Workspace::new();
    ws.add_file(FileKind::Script, "src/js");
    ws.add_file(FileKind::Markup, "");
    ws.add_file(FileKind::Style, "src");

    assert_eq!(
        ws.list_directories(),
        vec![String::new(), "src".to_string(), "src/js".to_string()]
    );
}

#[test]
fn test_export_entries_skip_markers() {
    let mut ws = Workspace::starter();
    ws.add_directory("", "empty");

    let paths: Vec<_> = ws.export_entries().into_iter().map(|e| e.path).collect();
    assert_eq!(paths, vec!["src/index.html", "src/styles.css", "src/script.js"]);
}

#[test]
fn test_preview_info_from_active_markup() {
    let mut ws = Workspace::starter();
    let info = ws.preview_info().unwrap();
    assert_eq!(info.title, "My Project");
    assert_eq!(info.description, "This is my awesome project");

    let css = ws.first_of_kind(FileKind::Style).unwrap().id;
    ws.set_active(css).unwrap();
    assert_eq!(ws.preview_info(), None);
}

#[test]
fn test_update_content_unknown_file() {
    let mut ws = Workspace::starter();
    let id = ws.add_file(FileKind::Script, "");
    ws.remove_file(id);
    assert_eq!(
        ws.update_content(id, "x").unwrap_err(),
        WorkspaceError::UnknownFile(id)
    );
}
