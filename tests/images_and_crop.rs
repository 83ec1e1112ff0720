use std::io::Cursor;

use canvas_editor::codec::{self, ImageInput, RasterFormat};
use canvas_editor::editor::Editor;
use canvas_editor::scene::{MemoryScene, Scene, SceneObject, Shape};
use canvas_editor::{EditorConfig, EditorError, ToolKind};
use futures::executor::block_on;
use image::{ImageFormat, Rgba, RgbaImage};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let pixels = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(pixels)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn editor(width: f32, height: f32) -> Editor<MemoryScene> {
    let mut editor = Editor::new(EditorConfig::default());
    editor.init(MemoryScene::new(width, height)).unwrap();
    editor
}

fn approx(actual: f32, expected: f32) -> bool {
    (actual - expected).abs() < 1e-3
}

#[test]
fn test_import_centers_and_scales_image() {
    let mut editor = editor(1000.0, 500.0);
    let id = block_on(editor.import_image(ImageInput::File(png_bytes(400, 400))))
        .unwrap()
        .unwrap();

    let object = editor.scene().unwrap().object(id).unwrap();
    assert!(approx(object.scale_x, 0.25));
    assert!(approx(object.scale_y, 0.25));
    assert!(approx(object.left, 450.0));
    assert!(approx(object.top, 200.0));
    assert_eq!(editor.active_object_id(), Some(id));
    assert_eq!(editor.active_object_type(), Some("image"));
    assert_eq!(editor.history().len(), 2);
}

#[test]
fn test_import_from_data_uri() {
    let mut editor = editor(800.0, 600.0);
    let uri = codec::to_data_uri(&png_bytes(20, 10), "image/png");
    let id = block_on(editor.import_image(ImageInput::Url(uri))).unwrap().unwrap();

    let object = editor.scene().unwrap().object(id).unwrap();
    assert_eq!(object.image_source().unwrap().natural_size(), [20, 10]);
}

#[test]
fn test_import_failures_leave_scene_alone() {
    let mut editor = editor(800.0, 600.0);

    let remote = block_on(editor.import_image(ImageInput::Url(
        "https://example.com/cat.png".to_owned(),
    )));
    assert!(matches!(remote, Err(EditorError::UnsupportedSource(_))));

    let garbage = block_on(editor.import_image(ImageInput::File(vec![0, 1, 2, 3])));
    assert!(garbage.is_err());

    assert!(editor.scene().unwrap().objects().is_empty());
    assert_eq!(editor.history().len(), 1);
}

#[test]
fn test_import_then_undo_removes_image() {
    let mut editor = editor(800.0, 600.0);
    block_on(editor.import_image(ImageInput::File(png_bytes(40, 40)))).unwrap();
    block_on(editor.undo()).unwrap();
    assert!(editor.scene().unwrap().objects().is_empty());

    block_on(editor.redo()).unwrap();
    let scene = editor.scene().unwrap();
    assert_eq!(scene.objects().len(), 1);
    assert_eq!(
        scene.objects()[0].image_source().unwrap().natural_size(),
        [40, 40]
    );
}

#[test]
fn test_crop_imported_image() {
    let mut editor = editor(1000.0, 500.0);
    editor.set_tool(ToolKind::Select);
    let image = block_on(editor.import_image(ImageInput::File(png_bytes(1000, 500))))
        .unwrap()
        .unwrap();

    let marker = editor.enter_crop().unwrap();
    assert!(editor.is_cropping());
    assert_eq!(editor.history().len(), 2);

    let cropped = editor.commit_crop().unwrap().unwrap();
    let scene = editor.scene().unwrap();
    assert!(!scene.contains(image));
    assert!(!scene.contains(marker));
    assert_eq!(scene.objects().len(), 1);

    let object = scene.object(cropped).unwrap();
    assert_eq!(object.image_source().unwrap().natural_size(), [800, 400]);
    assert!(approx(object.left, 420.0));
    assert!(approx(object.top, 210.0));
    assert_eq!(object.scale_x, 1.0);
    assert!(!editor.is_cropping());
    assert_eq!(editor.history().len(), 3);
}

#[test]
fn test_deleting_marker_ends_crop() {
    let mut editor = editor(800.0, 600.0);
    editor.set_tool(ToolKind::Select);
    block_on(editor.import_image(ImageInput::File(png_bytes(100, 100)))).unwrap();
    editor.enter_crop().unwrap();

    editor.delete_selected().unwrap();
    assert_eq!(editor.crop_session(), None);
    assert_eq!(editor.commit_crop().unwrap(), None);
    assert_eq!(editor.scene().unwrap().objects().len(), 1);
}

#[test]
fn test_export_canvas_at_double_density() {
    let editor = editor(100.0, 50.0);
    let file = editor.export_canvas(RasterFormat::Png).unwrap().unwrap();
    assert!(file.file_name.starts_with("drawing-"));
    assert!(file.file_name.ends_with(".png"));

    let decoded = image::load_from_memory(&file.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 100));
    assert!(file.data_uri().starts_with("data:image/png;base64,"));
}

#[test]
fn test_export_object_names_file_after_kind() {
    let mut editor = editor(400.0, 300.0);
    let scene = editor.scene_mut().unwrap();
    let id = scene.add_object(
        SceneObject::new(Shape::Rect { width: 30.0, height: 10.0 }).at(50.0, 60.0),
    );
    scene.set_active_object(id);

    let file = block_on(editor.export_object(RasterFormat::Jpeg)).unwrap().unwrap();
    assert!(file.file_name.starts_with("rectangle-"));
    assert!(file.file_name.ends_with(".jpeg"));

    let decoded = image::load_from_memory(&file.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (60, 20));
    // The live scene is untouched
    assert_eq!(editor.scene().unwrap().objects().len(), 1);
    assert_eq!(editor.active_object_id(), Some(id));
}

#[test]
fn test_export_without_scene_or_selection() {
    let detached: Editor<MemoryScene> = Editor::default();
    assert!(detached.export_canvas(RasterFormat::Png).unwrap().is_none());

    let editor = editor(100.0, 100.0);
    assert!(block_on(editor.export_object(RasterFormat::Png)).unwrap().is_none());
}

#[test]
fn test_export_object_rejects_oversized_surface() {
    let mut editor = editor(400.0, 300.0);
    let scene = editor.scene_mut().unwrap();
    let id = scene.add_object(SceneObject::new(Shape::Rect {
        width: 1.0e9,
        height: 1.0e9,
    }));
    scene.set_active_object(id);

    let result = block_on(editor.export_object(RasterFormat::Png));
    assert!(matches!(result, Err(EditorError::RenderContext { .. })));
    assert_eq!(editor.scene().unwrap().objects().len(), 1);
}

#[test]
fn test_exported_text_carries_glyphs() {
    let mut editor = editor(400.0, 300.0);
    editor.set_tool(ToolKind::Text);
    editor
        .handle_input(&canvas_editor::InputEvent::PointerDown {
            position: egui::pos2(20.0, 20.0),
        })
        .unwrap();

    let file = block_on(editor.export_object(RasterFormat::Png)).unwrap().unwrap();
    assert!(file.file_name.starts_with("text-"));
    let decoded = image::load_from_memory(&file.bytes).unwrap().to_rgba8();
    assert!(decoded.pixels().any(|pixel| pixel.0[3] > 0));
}

#[test]
fn test_import_from_local_file_url() {
    let mut editor = editor(800.0, 600.0);
    let path = std::env::temp_dir().join(format!("canvas-editor-import-{}.png", std::process::id()));
    std::fs::write(&path, png_bytes(30, 15)).unwrap();

    let result = block_on(editor.import_image(ImageInput::Url(format!(
        "file://{}",
        path.display()
    ))));
    std::fs::remove_file(&path).unwrap();

    let id = result.unwrap().unwrap();
    let object = editor.scene().unwrap().object(id).unwrap();
    assert_eq!(object.image_source().unwrap().natural_size(), [30, 15]);
    assert!(object.image_source().unwrap().src().starts_with("data:image/png;base64,"));
}
