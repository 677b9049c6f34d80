use crate::prelude::*;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

pub struct ConfigEguiPlugin;

impl Plugin for ConfigEguiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, configure_visuals_system)
            .add_systems(Update, ui_system);
    }
}

fn configure_visuals_system(mut contexts: EguiContexts) {
    contexts.ctx_mut().set_visuals(egui::Visuals {
        window_corner_radius: 0.0.into(),
        ..Default::default()
    });
}

/// Slider drags count once, when released. Clicks, keyboard steps and typed
/// values count straight away.
fn is_commit(response: &egui::Response) -> bool {
    response.drag_stopped() || response.lost_focus() || (response.changed() && !response.dragged())
}

/// Color buttons open a picker popup; returns true when the color changed.
fn color_button(ui: &mut egui::Ui, color: &mut Srgba, label: &str) -> bool {
    ui.horizontal(|ui| {
        let mut rgb = [color.red, color.green, color.blue];
        let changed = egui::color_picker::color_edit_button_rgb(ui, &mut rgb).changed();
        if changed {
            *color = Srgba::rgb(rgb[0], rgb[1], rgb[2]);
        }
        ui.label(label);
        changed
    })
    .inner
}

fn galaxy_params_ui(params: &mut GalaxyParams, color_pending: &mut bool, ui: &mut egui::Ui) -> bool {
    let minval = GalaxyParams::MIN;
    let maxval = GalaxyParams::MAX;
    let mut committed = false;

    committed |= is_commit(&ui.add(
        egui::Slider::new(&mut params.count, minval.count..=maxval.count)
            .step_by(100.0)
            .text("Star count"),
    ));
    committed |= is_commit(&ui.add(
        egui::Slider::new(&mut params.size, minval.size..=maxval.size)
            .step_by(0.001)
            .text("Star size"),
    ));
    committed |= is_commit(&ui.add(
        egui::Slider::new(&mut params.radius, minval.radius..=maxval.radius)
            .step_by(0.1)
            .text("Radius"),
    ));
    committed |= is_commit(&ui.add(
        egui::Slider::new(&mut params.branches, minval.branches..=maxval.branches)
            .text("Branches"),
    ));
    committed |= is_commit(&ui.add(
        egui::Slider::new(&mut params.spin, minval.spin..=maxval.spin)
            .step_by(0.001)
            .text("Spin"),
    ));
    committed |= is_commit(&ui.add(
        egui::Slider::new(&mut params.randomness, minval.randomness..=maxval.randomness)
            .step_by(0.01)
            .text("Randomness"),
    ));
    committed |= is_commit(&ui.add(
        egui::Slider::new(
            &mut params.randomness_power,
            minval.randomness_power..=maxval.randomness_power,
        )
        .step_by(0.001)
        .text("Randomness power"),
    ));

    *color_pending |= color_button(ui, &mut params.inside_color, "Inside color");
    *color_pending |= color_button(ui, &mut params.outside_color, "Outside color");

    committed
}

fn ui_system(
    mut contexts: EguiContexts,
    mut galaxy_ui_config: ResMut<GalaxyConfigUi>,
    stats: Res<GenerationStats>,
    mut commits: EventWriter<CommitGalaxyParams>,
    // color edits wait until the picker closes
    mut color_pending: Local<bool>,
) {
    let ctx = contexts.ctx_mut();
    let mut committed = false;

    egui::SidePanel::left("side_panel")
        .default_width(250.0)
        .show(ctx, |ui| {
            ui.heading("Galaxy");
            committed = galaxy_params_ui(&mut galaxy_ui_config.params, &mut *color_pending, ui);

            ui.separator();
            ui.label(format!(
                "{} stars, generated in {:.1} ms",
                stats.points,
                stats.elapsed.as_secs_f64() * 1000.0
            ));
            if let Some(err) = &stats.last_error {
                ui.colored_label(egui::Color32::LIGHT_RED, err);
            }
        });

    if *color_pending && !ctx.memory(|memory| memory.any_popup_open()) {
        *color_pending = false;
        committed = true;
    }

    if committed {
        commits.write(CommitGalaxyParams(galaxy_ui_config.params));
    }
}
