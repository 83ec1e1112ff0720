use futures::executor::block_on;

use crate::codec::{ExportedFile, ImageInput, RasterFormat};
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::error::EditorResult;
use crate::file_handler::FileHandler;
use crate::input::InputHandler;
use crate::panels::{central_panel, tools_panel};
use crate::renderer::Renderer;
use crate::scene::MemoryScene;

const DEFAULT_CANVAS_SIZE: [f32; 2] = [960.0, 640.0];

/// Native host of the editor: one canvas, a tools panel, drag and drop import
pub struct PaintApp {
    editor: Editor<MemoryScene>,
    renderer: Renderer,
    input_handler: InputHandler,
    file_handler: FileHandler,
    /// Last message shown at the bottom of the tools panel
    status: Option<String>,
}

impl PaintApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        Self::with_config(&cc.egui_ctx, EditorConfig::default())
    }

    pub fn with_config(ctx: &egui::Context, config: EditorConfig) -> Self {
        let mut editor = Editor::new(config);
        let [width, height] = DEFAULT_CANVAS_SIZE;
        if let Err(err) = editor.init(MemoryScene::new(width, height)) {
            log::error!("Failed to initialize editor: {}", err);
        }
        Self {
            editor,
            renderer: Renderer::new(ctx),
            input_handler: InputHandler::new(),
            file_handler: FileHandler::new(),
            status: None,
        }
    }

    pub fn editor(&self) -> &Editor<MemoryScene> {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor<MemoryScene> {
        &mut self.editor
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Logs and shows the error of a failed operation
    pub fn report<T>(&mut self, result: EditorResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log::error!("{}", err);
                self.status = Some(err.to_string());
                None
            }
        }
    }

    pub fn undo(&mut self) {
        let result = block_on(self.editor.undo());
        self.report(result);
    }

    pub fn redo(&mut self) {
        let result = block_on(self.editor.redo());
        self.report(result);
    }

    pub fn duplicate(&mut self) {
        let result = block_on(self.editor.duplicate());
        self.report(result);
    }

    pub fn import_image(&mut self, input: ImageInput) {
        let result = block_on(self.editor.import_image(input));
        if let Some(Some(_)) = self.report(result) {
            self.status = Some("Image imported".to_owned());
        }
    }

    pub fn export_canvas(&mut self, format: RasterFormat) {
        let result = self.editor.export_canvas(format);
        if let Some(Some(file)) = self.report(result) {
            self.save_export(file);
        }
    }

    pub fn export_object(&mut self, format: RasterFormat) {
        let result = block_on(self.editor.export_object(format));
        if let Some(Some(file)) = self.report(result) {
            self.save_export(file);
        }
    }

    pub fn commit_crop(&mut self) {
        let result = self.editor.commit_crop();
        self.report(result);
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn save_export(&mut self, file: ExportedFile) {
        match std::fs::write(&file.file_name, &file.bytes) {
            Ok(()) => {
                log::info!("Wrote {} ({} bytes)", file.file_name, file.bytes.len());
                self.status = Some(format!("Saved {}", file.file_name));
            }
            Err(err) => {
                log::error!("Failed to write {}: {}", file.file_name, err);
                self.status = Some(format!("Failed to save {}: {}", file.file_name, err));
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn save_export(&mut self, file: ExportedFile) {
        log::info!("Export ready: {} ({} bytes)", file.file_name, file.bytes.len());
        self.status = Some(format!("Exported {}", file.file_name));
    }

    /// Feeds this frame's pointer input over `canvas_rect` to the editor
    pub fn handle_canvas_input(&mut self, ctx: &egui::Context, canvas_rect: egui::Rect) {
        if let Some(scene) = self.editor.scene_mut() {
            scene.set_viewport(canvas_rect.min, 1.0);
        }
        for event in self.input_handler.process_input(ctx, canvas_rect) {
            let result = self.editor.handle_input(&event);
            self.report(result);
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (undo, redo, delete) = ctx.input(|i| {
            let command = i.modifiers.command;
            (
                command && !i.modifiers.shift && i.key_pressed(egui::Key::Z),
                command && i.modifiers.shift && i.key_pressed(egui::Key::Z),
                i.key_pressed(egui::Key::Delete),
            )
        });
        if undo {
            self.undo();
        }
        if redo {
            self.redo();
        }
        if delete {
            let result = self.editor.delete_selected();
            self.report(result);
        }
    }

    pub fn render_canvas(&mut self, painter: &egui::Painter) {
        if let Some(scene) = self.editor.scene() {
            self.renderer.render(painter, scene);
        }
    }
}

impl eframe::App for PaintApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for input in self.file_handler.take_dropped_images(ctx) {
            self.import_image(input);
        }
        self.handle_shortcuts(ctx);

        tools_panel(self, ctx);
        central_panel(self, ctx);

        self.file_handler.preview_files_being_dropped(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.editor.dispose();
    }
}
