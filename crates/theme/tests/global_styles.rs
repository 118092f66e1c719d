use std::fs;
use std::sync::Arc;

use tempfile::tempdir;
use themedhl_highlight::{Color, Grammar};
use themedhl_theme::{
    DirectoryResources, ResourceSink, ResourceSlot, ResourceTable, ResourceValue, ThemeCatalog,
    ThemeError, ThemeRegistry, XshdGrammarLoader, BASE_PREFIX, OVERLAY_PREFIX, THEME_NAMESPACE,
};

#[derive(Default)]
struct RecordingSink {
    calls: Vec<(ResourceSlot, Color)>,
}

impl ResourceSink for RecordingSink {
    fn set(&mut self, slot: ResourceSlot, color: Color) {
        self.calls.push((slot, color));
    }
}

fn overlay(styles: &str) -> String {
    format!(
        r#"<ThemeSyntaxDefinition name="Dark" xmlns="{THEME_NAMESPACE}">
  <GlobalStyles>
{styles}
  </GlobalStyles>
</ThemeSyntaxDefinition>"#
    )
}

fn registry_with_dark_overlay(xml: String) -> ThemeRegistry {
    let resources = themedhl_theme::MemoryResources::new().with(OVERLAY_PREFIX, "Dark.xshtd", xml);
    let registry = ThemeRegistry::new(Arc::new(resources));
    registry.set_current_theme("Dark").expect("switch");
    registry
}

#[test]
fn selection_without_border_sets_only_the_selection_brush() {
    let registry = registry_with_dark_overlay(overlay(r##"    <Selection background="#123456" />"##));
    let mut sink = RecordingSink::default();
    registry.apply_current_global_styles(&mut sink).expect("apply");
    assert_eq!(
        sink.calls,
        [(ResourceSlot::SelectionBackground, Color::rgb(0x12, 0x34, 0x56))]
    );
}

#[test]
fn styles_are_applied_in_document_order() {
    let registry = registry_with_dark_overlay(overlay(
        r##"    <DefaultStyle background="#1E1E1E" foreground="#DCDCDC" />
    <CurrentLineBackground background="#40000000" border="SystemColors.Highlight" />
    <LineNumbersForeground foreground="#2B91AF" />
    <Hyperlink foreground="#569CD6" />
    <NonPrintableCharacter foreground="Gray" />"##,
    ));
    let mut sink = RecordingSink::default();
    registry.apply_current_global_styles(&mut sink).expect("apply");

    let slots: Vec<_> = sink.calls.iter().map(|(slot, _)| slot.key()).collect();
    assert_eq!(
        slots,
        [
            "EditorBackground",
            "EditorForeground",
            "EditorCurrentLineBackground",
            "EditorCurrentLineBorder",
            "EditorLineNumbersForeground",
            "EditorLinkTextForegroundBrush",
            "EditorNonPrintableCharacterBrush",
        ]
    );
    assert_eq!(sink.calls[2].1, Color::argb(0x40, 0, 0, 0));
    assert_eq!(sink.calls[3].1, Color::rgb(0x00, 0x78, 0xD7));
}

#[test]
fn resource_table_leaves_non_color_slots_alone() {
    let registry = registry_with_dark_overlay(overlay(
        r##"    <DefaultStyle background="#1E1E1E" foreground="#DCDCDC" />"##,
    ));
    let mut table = ResourceTable::with_editor_defaults();
    table.insert(
        ResourceSlot::EditorForeground,
        ResourceValue::Opaque("gradient".into()),
    );
    registry.apply_current_global_styles(&mut table).expect("apply");

    assert_eq!(
        table.color(ResourceSlot::EditorBackground),
        Some(Color::rgb(0x1E, 0x1E, 0x1E))
    );
    assert_eq!(
        table.get(ResourceSlot::EditorForeground),
        Some(&ResourceValue::Opaque("gradient".into()))
    );
}

#[test]
fn unsupported_style_is_rejected_when_loading_the_overlay() {
    let registry = registry_with_dark_overlay(overlay(r##"    <Gutter background="#000000" />"##));
    let mut sink = RecordingSink::default();
    let err = registry.apply_current_global_styles(&mut sink).unwrap_err();
    match err.root_cause() {
        ThemeError::Format(format) => {
            assert_eq!(format.message, "GlobalStyle named 'Gutter' is not supported");
        }
        other => panic!("expected a format error, got {other:?}"),
    }
    assert!(sink.calls.is_empty());

    registry.apply_current_global_styles(&mut sink).expect("no overlay left");
    assert!(sink.calls.is_empty());
}

#[test]
fn theme_without_overlay_leaves_resources_untouched() {
    let registry = ThemeRegistry::new(Arc::new(themedhl_theme::MemoryResources::new()));
    let mut table = ResourceTable::with_editor_defaults();
    let before = table.clone();
    registry.apply_current_global_styles(&mut table).expect("apply");
    for slot in ResourceSlot::ALL {
        assert_eq!(table.get(slot), before.get(slot));
    }
}

#[test]
fn catalog_and_resources_load_from_disk() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("resources");
    fs::create_dir_all(root.join(BASE_PREFIX)).expect("base dir");
    fs::create_dir_all(root.join(OVERLAY_PREFIX)).expect("overlay dir");
    fs::write(
        root.join(BASE_PREFIX).join("Python-Mode.xshd"),
        r##"<SyntaxDefinition name="Python" extensions=".py;.pyw">
  <Color name="Comment" foreground="Green" />
  <Color name="Keyword" foreground="Blue" fontWeight="bold" />
</SyntaxDefinition>"##,
    )
    .expect("write grammar");
    fs::write(
        root.join(OVERLAY_PREFIX).join("Midnight.xshtd"),
        format!(
            r##"<ThemeSyntaxDefinition name="Midnight" xmlns="{THEME_NAMESPACE}">
  <SyntaxDefinition name="Python" extensions=".py">
    <Color name="Keyword" foreground="#569CD6" />
  </SyntaxDefinition>
  <GlobalStyles>
    <DefaultStyle background="#101020" />
  </GlobalStyles>
</ThemeSyntaxDefinition>"##
        ),
    )
    .expect("write overlay");

    let catalog_path = temp.path().join("themes.json");
    fs::write(
        &catalog_path,
        format!(
            r#"{{
  "current": "Midnight",
  "themes": [
    {{ "key": "Light" }},
    {{ "key": "Midnight", "overlay": {{ "prefix": "{OVERLAY_PREFIX}", "name": "Midnight.xshtd" }} }}
  ],
  "grammars": [
    {{ "name": "Python", "extensions": [".py", ".pyw"], "resource": "Python-Mode.xshd" }}
  ]
}}"#
        ),
    )
    .expect("write catalog");

    let catalog = ThemeCatalog::load(&catalog_path).expect("catalog");
    let registry = ThemeRegistry::from_catalog(
        catalog,
        Arc::new(DirectoryResources::new(&root)),
        Arc::new(XshdGrammarLoader),
    )
    .expect("registry");
    assert_eq!(registry.current_theme_key(), "Midnight");

    let python = registry
        .get_definition_by_extension("PYW")
        .expect("lookup")
        .expect("python");
    let keyword = python.named_color("Keyword").expect("keyword");
    assert_eq!(
        keyword.foreground.map(|brush| brush.color()),
        Some(Color::rgb(0x56, 0x9C, 0xD6))
    );
    assert!(keyword.font_weight.is_none());
    assert_eq!(registry.definitions().expect("definitions").len(), 1);

    let mut table = ResourceTable::with_editor_defaults();
    registry.apply_current_global_styles(&mut table).expect("apply");
    assert_eq!(
        table.color(ResourceSlot::EditorBackground),
        Some(Color::rgb(0x10, 0x10, 0x20))
    );
}

#[test]
fn missing_catalog_file_is_a_catalog_error() {
    let temp = tempdir().expect("tempdir");
    let err = ThemeCatalog::load(temp.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ThemeError::Catalog(_)));
}
