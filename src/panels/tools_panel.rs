use crate::PaintApp;
use crate::codec::RasterFormat;
use crate::components::ToolButton;
use crate::editor::FlipAxis;
use crate::scene::{Scene, Shape};
use crate::state::BrushUpdate;
use crate::tools::ToolKind;

pub fn tools_panel(app: &mut PaintApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Tools");
                tool_buttons(app, ui);
                ui.separator();

                brush_section(app, ui);
                ui.separator();

                history_section(app, ui);
                ui.separator();

                selection_section(app, ui);
                ui.separator();

                canvas_section(app, ui);

                if let Some(status) = app.status() {
                    ui.separator();
                    ui.small(status);
                }
            });
        });
}

fn tool_buttons(app: &mut PaintApp, ui: &mut egui::Ui) {
    let active = app.editor().active_tool();
    ui.horizontal_wrapped(|ui| {
        for kind in ToolKind::ALL {
            if ToolButton::new(kind, kind == active).show(ui).clicked() {
                log::info!("Tool selected from UI: {}", kind.name());
                app.editor_mut().set_tool(kind);
            }
        }
    });
}

fn brush_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.strong("Brush");
    let mut brush = *app.editor().brush();
    let mut update = BrushUpdate::default();

    ui.horizontal(|ui| {
        ui.label("Color");
        if ui.color_edit_button_srgba(&mut brush.color).changed() {
            update.color = Some(brush.color);
        }
    });
    if ui
        .add(egui::Slider::new(&mut brush.width, 1.0..=50.0).text("Width"))
        .changed()
    {
        update.width = Some(brush.width);
    }
    if ui
        .add(egui::Slider::new(&mut brush.opacity, 0.0..=1.0).text("Opacity"))
        .changed()
    {
        update.opacity = Some(brush.opacity);
    }

    if update != BrushUpdate::default() {
        app.editor_mut().update_brush(update);
    }
}

fn history_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        let can_undo = app.editor().can_undo();
        let can_redo = app.editor().can_redo();

        if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
            app.undo();
        }
        if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
            app.redo();
        }
    });

    let history = app.editor().history();
    let position = history.cursor().map_or(0, |cursor| cursor + 1);
    ui.label(format!("History: {} / {}", position, history.len()));
}

fn selection_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    let Some(kind) = app.editor().active_object_type() else {
        ui.weak("Nothing selected");
        return;
    };
    ui.strong(format!("Selection: {}", kind));

    ui.horizontal(|ui| {
        if ui.button("Flip H").clicked() {
            let result = app.editor_mut().flip(FlipAxis::Horizontal);
            app.report(result);
        }
        if ui.button("Flip V").clicked() {
            let result = app.editor_mut().flip(FlipAxis::Vertical);
            app.report(result);
        }
    });
    ui.horizontal(|ui| {
        if ui.button("⟲ 90°").clicked() {
            let result = app.editor_mut().rotate(-90.0);
            app.report(result);
        }
        if ui.button("⟳ 90°").clicked() {
            let result = app.editor_mut().rotate(90.0);
            app.report(result);
        }
    });

    let mut opacity = app.editor().opacity();
    let slider = ui.add(egui::Slider::new(&mut opacity, 0.0..=1.0).text("Opacity"));
    if slider.changed() {
        let result = app.editor_mut().set_opacity(opacity);
        app.report(result);
    }

    ui.horizontal(|ui| {
        if ui.button("Forward").clicked() {
            let result = app.editor_mut().bring_forward();
            app.report(result);
        }
        if ui.button("Backward").clicked() {
            let result = app.editor_mut().send_backward();
            app.report(result);
        }
    });
    ui.horizontal(|ui| {
        if ui.button("Duplicate").clicked() {
            app.duplicate();
        }
        if ui.button("Delete").clicked() {
            let result = app.editor_mut().delete_selected();
            app.report(result);
        }
    });

    text_editor(app, ui);
    crop_controls(app, ui, kind);

    ui.horizontal(|ui| {
        if ui.button("Export PNG").clicked() {
            app.export_object(RasterFormat::Png);
        }
        if ui.button("Export JPEG").clicked() {
            app.export_object(RasterFormat::Jpeg);
        }
    });
}

fn text_editor(app: &mut PaintApp, ui: &mut egui::Ui) {
    let Some(id) = app.editor().active_object_id() else {
        return;
    };
    let editing = app.editor().is_editing_text();
    let Some(scene) = app.editor_mut().scene_mut() else {
        return;
    };
    let Some(Shape::Text { content, .. }) = scene.object_mut(id).map(|object| &mut object.shape)
    else {
        return;
    };

    let response = ui.text_edit_multiline(content);
    if response.changed() {
        scene.render();
    }
    if response.lost_focus() {
        let result = app.editor_mut().finish_text_edit();
        app.report(result);
    } else if editing && !response.has_focus() {
        // Freshly placed text opens straight into the editor
        response.request_focus();
    }
}

fn crop_controls(app: &mut PaintApp, ui: &mut egui::Ui, kind: &str) {
    if app.editor().is_cropping() {
        ui.horizontal(|ui| {
            if ui.button("Apply crop").clicked() {
                app.commit_crop();
            }
            if ui.button("Cancel crop").clicked() {
                app.editor_mut().cancel_crop();
            }
        });
    } else if kind == "image" && ui.button("Crop").clicked() {
        if app.editor().active_tool() != ToolKind::Select {
            app.editor_mut().set_tool(ToolKind::Select);
        }
        app.editor_mut().enter_crop();
    }
}

fn canvas_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.strong("Canvas");

    if let Some(mut background) = app.editor().scene().map(|scene| scene.background()) {
        ui.horizontal(|ui| {
            ui.label("Background");
            if ui.color_edit_button_srgba(&mut background).changed() {
                app.editor_mut().set_canvas_background(background);
            }
        });
    }

    if ui.button("Clear canvas").clicked() {
        let result = app.editor_mut().clear_canvas();
        app.report(result);
    }

    ui.horizontal(|ui| {
        if ui.button("Export PNG").clicked() {
            app.export_canvas(RasterFormat::Png);
        }
        if ui.button("Export JPEG").clicked() {
            app.export_canvas(RasterFormat::Jpeg);
        }
    });
    ui.weak("Drop image files on the window to import them.");
}
