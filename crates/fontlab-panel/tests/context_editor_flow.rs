#![forbid(unsafe_code)]

//! Integration tests: a lab page's settings panel driven through its
//! controls.

use std::rc::Rc;
use std::time::Duration;

use fontlab_bind::{
    ControlKind, DeclaredElement, ElementSource, MemoryInput, MemoryOutput, Value,
};
use fontlab_panel::{
    ContextEditor, FileStorage, MemoryStorage, PanelConfig, PanelError, SampleValues,
    SettingsStorage, dynamic_tracking,
};
use web_time::Instant;

struct Panel {
    size: Rc<MemoryInput>,
    tracking: Rc<MemoryInput>,
    line_height: Rc<MemoryInput>,
    style: Rc<MemoryInput>,
    tracking_tip: Rc<MemoryOutput>,
}

impl Panel {
    fn new() -> Self {
        Self {
            size: MemoryInput::new(ControlKind::Range, 0.0),
            tracking: MemoryInput::new(ControlKind::Number, ""),
            line_height: MemoryInput::new(ControlKind::Range, 0.0),
            style: MemoryInput::new(ControlKind::Select, "regular"),
            tracking_tip: MemoryOutput::new(),
        }
    }

    fn elements(&self) -> Vec<DeclaredElement> {
        vec![
            DeclaredElement::control("size", self.size.clone()),
            DeclaredElement::control("tracking", self.tracking.clone()),
            DeclaredElement::control("lineHeight", self.line_height.clone()),
            DeclaredElement::control("style", self.style.clone()),
            DeclaredElement::display("tracking", self.tracking_tip.clone()),
        ]
    }
}

impl ElementSource for Panel {
    fn query(&self, selector: &str) -> Vec<DeclaredElement> {
        match selector {
            "#ctxedit-ui .control" => self.elements(),
            _ => Vec::new(),
        }
    }
}

fn page<S: SettingsStorage + 'static>(storage: S) -> (ContextEditor<S>, Panel) {
    let editor = ContextEditor::new("/lab/dynmetrics", storage).unwrap();
    let panel = Panel::new();
    assert_eq!(editor.bind_controls_matching(&panel, "#ctxedit-ui .control"), 5);
    editor
        .add_editable("body", SampleValues::default())
        .unwrap();
    editor
        .add_editable(
            "display",
            SampleValues {
                size: 72.0,
                tracking: -0.03,
                line_height: 1.1,
                style: "bold".into(),
            },
        )
        .unwrap();
    (editor, panel)
}

fn after_delay() -> Instant {
    Instant::now() + Duration::from_millis(301)
}

#[test]
fn focus_moves_sample_values_into_controls() {
    let (editor, panel) = page(MemoryStorage::new());

    editor.focus("display").unwrap();
    assert_eq!(panel.size.value(), Value::Float(72.0));
    assert_eq!(panel.tracking.value(), Value::from("-0.030"));
    assert_eq!(panel.tracking_tip.text(), "-0.030");
    assert_eq!(panel.style.value(), Value::from("bold"));

    editor.focus("body").unwrap();
    assert_eq!(panel.size.value(), Value::Float(16.0));
    assert_eq!(panel.style.value(), Value::from("regular"));
    assert!(!editor.is_save_pending());
}

#[test]
fn slider_drag_tracks_implicit_tracking_and_saves_once() {
    let (editor, panel) = page(MemoryStorage::new());
    editor.focus("body").unwrap();

    for size in [18.0, 20.0, 24.0] {
        panel.size.user_edit(size);
    }
    let expected = format!("{:.3}", dynamic_tracking(24.0));
    assert_eq!(panel.tracking.value(), Value::from(expected.as_str()));
    assert_eq!(panel.tracking_tip.text(), expected);
    assert!(editor.storage().is_empty());

    assert!(editor.tick(after_delay()).unwrap());
    assert_eq!(editor.storage().len(), 2);
    assert!(!editor.tick(after_delay()).unwrap());
}

#[test]
fn typing_tracking_pins_it_until_reset() {
    let (editor, panel) = page(MemoryStorage::new());
    editor.focus("body").unwrap();

    panel.tracking.user_edit("0.04");
    assert!(editor.editable("body").unwrap().explicit_tracking());

    panel.size.user_edit(40.0);
    assert_eq!(editor.editable("body").unwrap().values().tracking, 0.04);
    assert_eq!(panel.tracking_tip.text(), "0.040");

    editor.reset_tracking();
    let expected = format!("{:.3}", dynamic_tracking(40.0));
    assert_eq!(panel.tracking_tip.text(), expected);
    assert!(!editor.editable("body").unwrap().explicit_tracking());
}

#[test]
fn typed_tracking_on_a_half_rounds_up_in_the_tip() {
    let (editor, panel) = page(MemoryStorage::new());
    editor.focus("body").unwrap();

    panel.tracking.user_edit("0.0625");
    assert_eq!(panel.tracking_tip.text(), "0.063");
    panel.tracking.user_edit("-0.0625");
    assert_eq!(panel.tracking_tip.text(), "-0.063");
}

#[test]
fn settings_survive_reload_through_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    {
        let (editor, panel) = page(FileStorage::new(&path));
        editor.focus("display").unwrap();
        panel.line_height.user_edit(1.4);
        panel.style.user_edit("black-italic");
        editor.blur().unwrap();
    }

    let (editor, panel) = page(FileStorage::new(&path));
    let display = editor.editable("display").unwrap();
    assert_eq!(display.values().line_height, 1.4);
    assert_eq!(display.values().style, "black-italic");
    assert!(display.explicit_tracking());

    editor.focus("display").unwrap();
    assert_eq!(panel.line_height.value(), Value::Float(1.4));

    editor.reset().unwrap();
    assert_eq!(panel.style.value(), Value::from("bold"));
    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get("ctxedit:/lab/dynmetrics:display").unwrap(), None);
}

#[test]
fn config_adds_bindings_and_save_delay() {
    let config = PanelConfig::from_toml_str(
        r#"
save_delay_ms = 50

[[binding]]
name = "opsz"
initial = 14
parser = "float"
format = "fixed:1"
"#,
    )
    .unwrap();
    let editor =
        ContextEditor::with_config("/lab", MemoryStorage::new(), &config).unwrap();
    let tip = MemoryOutput::new();
    editor.bind_controls([DeclaredElement::display("opsz", tip.clone())]);
    assert_eq!(tip.text(), "14.0");

    editor.add_editable("a", SampleValues::default()).unwrap();
    editor.focus("a").unwrap();
    editor.bindings().set_value("size", 30.0);
    assert!(editor.tick(Instant::now() + Duration::from_millis(60)).unwrap());
}

#[test]
fn bad_config_fails_construction() {
    let config = PanelConfig::from_json_str(
        r#"{"binding": [{"name": "size", "format": "sci"}]}"#,
    )
    .unwrap();
    let err = ContextEditor::with_config("/lab", MemoryStorage::new(), &config).unwrap_err();
    assert!(matches!(err, PanelError::Bind { ref binding, .. } if binding == "size"));
}
