//! Properties panel

use std::path::Path;

use meshview_core::{MeshFormat, PanelAction, PropertyPanel};

/// Side panel with the light controls and mesh / frame info
pub struct PropertiesPanel;

impl PropertiesPanel {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &str {
        "Properties"
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, panel: PropertyPanel<'_>) -> Option<PanelAction> {
        let mut action = None;
        let PropertyPanel {
            light,
            mesh,
            mesh_path,
            camera_distance,
            stats,
        } = panel;

        ui.heading(self.name());
        ui.separator();

        // Light
        ui.heading("Light");

        ui.horizontal(|ui| {
            ui.label("Position:");
            ui.add(egui::DragValue::new(&mut light.position.x).speed(0.05).prefix("x: "));
            ui.add(egui::DragValue::new(&mut light.position.y).speed(0.05).prefix("y: "));
            ui.add(egui::DragValue::new(&mut light.position.z).speed(0.05).prefix("z: "));
        });

        ui.horizontal(|ui| {
            ui.label("Color:");
            let mut color = light.color.to_array();
            if ui.color_edit_button_rgb(&mut color).changed() {
                light.color = glam::Vec3::from_array(color);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Strength:");
            ui.add(
                egui::DragValue::new(&mut light.strength)
                    .speed(1.0)
                    .range(0.0..=10_000.0),
            );
        });

        ui.separator();

        // Mesh
        ui.heading("Mesh");
        ui.label(format!("File: {}", file_label(mesh_path)))
            .on_hover_text(mesh_path.display().to_string());
        match mesh {
            Some(summary) => {
                ui.label(format!("Vertices: {}", summary.vertex_count));
                ui.label(format!("Triangles: {}", summary.triangle_count));
            }
            None => {
                ui.weak("No mesh loaded");
            }
        }

        if ui.button("Open mesh…").clicked() {
            action = pick_mesh(mesh_path).map(PanelAction::LoadMesh);
        }

        ui.separator();

        // Camera
        ui.heading("Camera");
        ui.label(format!("Distance: {:.2}", camera_distance));
        ui.weak("Right drag: orbit   Middle drag: pan   W/S: zoom");
        if ui.button("Reset camera").clicked() {
            action = Some(PanelAction::ResetCamera);
        }

        ui.separator();

        // Frame
        ui.heading("Frame");
        ui.label(format!("Draw calls: {}", stats.draw_calls));
        ui.label(format!("Indices: {}", stats.indices));

        action
    }
}

impl Default for PropertiesPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Native file dialog starting next to the current mesh
fn pick_mesh(current: &Path) -> Option<std::path::PathBuf> {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Open mesh")
        .add_filter("Meshes", MeshFormat::extensions());
    if let Some(dir) = current.parent().filter(|d| d.is_dir()) {
        dialog = dialog.set_directory(dir);
    }
    dialog.pick_file()
}
