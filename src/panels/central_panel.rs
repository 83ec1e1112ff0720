use crate::PaintApp;

pub fn central_panel(app: &mut PaintApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(egui::Color32::from_gray(48)).inner_margin(16.0))
        .show(ctx, |ui| {
            let canvas_size = app
                .editor()
                .scene()
                .map(|scene| crate::scene::Scene::dimensions(scene))
                .unwrap_or(egui::Vec2::ZERO);
            let canvas_rect = egui::Rect::from_min_size(ui.max_rect().min, canvas_size);

            app.handle_canvas_input(ctx, canvas_rect);
            app.render_canvas(ui.painter());
        });
}
