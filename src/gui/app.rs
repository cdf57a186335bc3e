//! Graph Visualizer Desktop Application
//! One screen per wizard step, drawn in the central panel.

use crate::data::ChartKind;
use crate::gui::wizard::{Status, Step, Wizard};
use egui::{Color32, ComboBox, RichText, TextureHandle, TextureOptions};

const ACCENT: Color32 = Color32::from_rgb(76, 175, 80);
const ERROR: Color32 = Color32::from_rgb(220, 53, 69);

/// Main application window.
pub struct GraphVisualizerApp {
    wizard: Wizard,
    /// Texture for the current chart; rebuilt whenever a new chart is rendered.
    texture: Option<TextureHandle>,
}

impl GraphVisualizerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            wizard: Wizard::default(),
            texture: None,
        }
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.wizard.load(&path);
        }
    }

    fn handle_save_chart(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("chart.png")
            .save_file()
        {
            self.wizard.save(&path);
        }
    }

    fn chart_texture(&mut self, ctx: &egui::Context) -> Option<TextureHandle> {
        if self.texture.is_none() {
            let artifact = self.wizard.artifact()?;
            match artifact.to_rgba() {
                Ok(rgba) => {
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    let image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                    self.texture = Some(ctx.load_texture("chart", image, TextureOptions::LINEAR));
                }
                Err(err) => {
                    tracing::error!(error = %err, "could not decode rendered chart");
                    return None;
                }
            }
        }
        self.texture.clone()
    }

    fn heading(ui: &mut egui::Ui, text: &str) {
        ui.label(RichText::new(text).size(24.0).strong());
        ui.add_space(20.0);
    }

    fn primary_button(ui: &mut egui::Ui, text: &str) -> bool {
        let button = egui::Button::new(RichText::new(text).size(16.0).color(Color32::WHITE))
            .fill(ACCENT)
            .min_size(egui::vec2(200.0, 40.0));
        ui.add(button).clicked()
    }

    fn show_status(ui: &mut egui::Ui, status: &Status) {
        match status {
            Status::Idle => {}
            Status::Info(text) => {
                ui.add_space(10.0);
                ui.label(RichText::new(text).size(13.0).color(Color32::LIGHT_GRAY));
            }
            Status::Error(text) => {
                ui.add_space(10.0);
                ui.label(RichText::new(format!("Error: {text}")).size(13.0).color(ERROR));
            }
        }
    }

    fn show_welcome(&mut self, ui: &mut egui::Ui) {
        Self::heading(ui, "📊 Graph Visualizer");
        ui.label(RichText::new("Visualize CSV data step-by-step").size(14.0).color(Color32::LIGHT_GRAY));
        ui.add_space(40.0);
        if Self::primary_button(ui, "Continue") {
            self.wizard.continue_from_welcome();
        }
    }

    fn show_upload(&mut self, ui: &mut egui::Ui) {
        Self::heading(ui, "📁 Upload CSV File");
        if Self::primary_button(ui, "Select CSV File") {
            self.handle_browse_csv();
        }
    }

    fn show_choose_kind(&mut self, ui: &mut egui::Ui) {
        Self::heading(ui, "📈 Select Graph Type");

        if let Some(name) = self.wizard.session().and_then(|s| s.source().file_name()) {
            ui.label(RichText::new(name.to_string_lossy()).size(13.0).color(Color32::LIGHT_GRAY));
            ui.add_space(10.0);
        }

        ui.vertical(|ui| {
            for kind in ChartKind::ALL {
                ui.radio_value(&mut self.wizard.kind, kind, RichText::new(kind.label()).size(14.0));
            }
        });

        ui.add_space(30.0);
        if Self::primary_button(ui, "Next") {
            self.wizard.confirm_kind();
        }
    }

    fn show_choose_columns(&mut self, ui: &mut egui::Ui) {
        Self::heading(ui, "🧮 Select Columns");

        let columns = self.wizard.columns();
        let label_width = 70.0;
        let combo_width = 200.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("X-axis"));
            ComboBox::from_id_salt("x_column")
                .width(combo_width)
                .selected_text(&self.wizard.x_column)
                .show_ui(ui, |ui| {
                    for col in &columns {
                        ui.selectable_value(&mut self.wizard.x_column, col.clone(), col);
                    }
                });
        });

        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Y-axis"));
            ComboBox::from_id_salt("y_column")
                .width(combo_width)
                .selected_text(&self.wizard.y_column)
                .show_ui(ui, |ui| {
                    for col in &columns {
                        ui.selectable_value(&mut self.wizard.y_column, col.clone(), col);
                    }
                });
        });

        ui.add_space(30.0);
        if Self::primary_button(ui, "Plot Graph") {
            self.texture = None;
            self.wizard.plot();
        }
    }

    fn show_rendered(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        if let Some(texture) = self.chart_texture(ctx) {
            let max = egui::vec2(ui.available_width() * 0.9, ui.available_height() * 0.75);
            ui.add(egui::Image::new((texture.id(), texture.size_vec2())).max_size(max));
        }

        ui.add_space(20.0);
        ui.horizontal(|ui| {
            if Self::primary_button(ui, "Save Graph as Image") {
                self.handle_save_chart();
            }
            if ui.button("Change columns").clicked() {
                self.texture = None;
                self.wizard.change_columns();
            }
            if ui.button("Start over").clicked() {
                self.texture = None;
                self.wizard.restart();
            }
        });
    }
}

impl eframe::App for GraphVisualizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);

                match self.wizard.step() {
                    Step::Welcome => self.show_welcome(ui),
                    Step::Upload => self.show_upload(ui),
                    Step::ChooseKind => self.show_choose_kind(ui),
                    Step::ChooseColumns => self.show_choose_columns(ui),
                    Step::Rendered => self.show_rendered(ctx, ui),
                }

                Self::show_status(ui, self.wizard.status());
            });
        });
    }
}
