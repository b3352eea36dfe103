// hide console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::collections::HashSet;
use std::path::PathBuf;

use eframe::egui::{self, vec2, CentralPanel, Frame, TopBottomPanel, Ui, ViewportBuilder, WidgetText};
use eframe::NativeOptions;
use egui_dock::{DockArea, DockState, NodeIndex, Style, SurfaceIndex, TabViewer};
use log::{info, warn};

use nh_glyphs::common::canvas::UiCanvas;
use nh_glyphs::common::config::{Palette, Settings};
use nh_glyphs::common::controller::{ItemProperty, Side};
use nh_glyphs::common::error::DiagramError;
use nh_glyphs::common::fluent::Localizer;
use nh_glyphs::common::model::{Attribute, Model, ModelEvent, ModelType, Relation, Value, Visibility};
use nh_glyphs::common::observer::Change;
use nh_glyphs::common::recipes::{self, End};
use nh_glyphs::common::uuid::{ModelUuid, ViewUuid};
use nh_glyphs::diagram::{Diagram, DrawEnv};
use nh_glyphs::uml::uml_property_pages::{AssociationPropertyPage, EditSession};

const CONFIG_ENV: &str = "NH_GLYPHS_CONFIG";
const DEFAULT_CONFIG: &str = "nh-glyphs.toml";

const NAVIGABILITY_LABELS: [&str; 3] = ["Unknown", "Not navigable", "Navigable"];
const AGGREGATION_LABELS: [&str; 3] = ["None", "Shared", "Composite"];

fn load_settings() -> Settings {
    let (path, explicit) = match std::env::var_os(CONFIG_ENV) {
        Some(p) => (PathBuf::from(p), true),
        None => (PathBuf::from(DEFAULT_CONFIG), false),
    };
    if !explicit && !path.exists() {
        return Settings::default();
    }
    match Settings::load(&path) {
        Ok(settings) => {
            info!(path:? = path; "Loaded settings");
            settings
        }
        Err(e) => {
            warn!(path:? = path, error:% = e; "Falling back to default settings");
            Settings::default()
        }
    }
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let settings = load_settings();
    let options = NativeOptions {
        viewport: ViewportBuilder::default().with_inner_size(vec2(1200.0, 800.0)),
        ..Default::default()
    };
    eframe::run_native(
        "nh-glyphs",
        options,
        Box::new(|_cc| Ok(Box::new(NHApp::new(settings)))),
    )
}

#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
enum NHTab {
    Diagram,
    Hierarchy,
    Properties,
}

impl NHTab {
    fn name(&self) -> &'static str {
        match self {
            NHTab::Diagram => "Diagram",
            NHTab::Hierarchy => "Hierarchy",
            NHTab::Properties => "Properties",
        }
    }
}

fn report(result: Result<(), DiagramError>) {
    if let Err(e) = result {
        warn!(error:% = e; "Edit failed");
    }
}

struct NHContext {
    settings: Settings,
    palette: Palette,
    localizer: Localizer,
    model: Model,
    diagram: Diagram,

    selected: Option<ViewUuid>,
    dragged: Option<ViewUuid>,
    camera_offset: egui::Pos2,
    camera_scale: f32,
    association_page: Option<AssociationPropertyPage>,

    open_unique_tabs: HashSet<NHTab>,
}

impl TabViewer for NHContext {
    type Tab = NHTab;

    fn title(&mut self, tab: &mut Self::Tab) -> WidgetText {
        tab.name().into()
    }

    fn ui(&mut self, ui: &mut Ui, tab: &mut Self::Tab) {
        match tab {
            NHTab::Diagram => self.diagram_tab(ui),
            NHTab::Hierarchy => self.hierarchy(ui),
            NHTab::Properties => self.properties(ui),
        }
    }

    fn closeable(&mut self, tab: &mut Self::Tab) -> bool {
        *tab != NHTab::Diagram
    }
}

impl NHContext {
    fn env(&self) -> DrawEnv<'_> {
        DrawEnv {
            model: &self.model,
            localizer: &self.localizer,
            fonts: &self.settings.fonts,
            palette: self.palette,
        }
    }

    /// Forwards model changes to the diagram and the open property page.
    fn apply_events(&mut self, events: Vec<ModelEvent>) {
        for event in events {
            let change = Change::Model(event);
            self.diagram.notify(&self.model, &change);
            if let Some(page) = self.association_page.as_mut() {
                report(page.notify(
                    &mut self.model,
                    &mut self.diagram,
                    &self.localizer,
                    &change,
                    EditSession::Idle,
                ));
            }
        }
        self.diagram.update(&self.model);
    }

    fn select(&mut self, id: Option<ViewUuid>) {
        if self.selected == id {
            return;
        }
        if let Some(mut page) = self.association_page.take() {
            page.destroy();
        }
        self.selected = id;
        self.association_page = id.and_then(|id| {
            AssociationPropertyPage::construct(&self.diagram, &self.model, &self.localizer, id)
        });
    }

    fn diagram_tab(&mut self, ui: &mut Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let mut canvas = UiCanvas::new(
            true,
            painter,
            response.rect,
            self.camera_offset,
            self.camera_scale,
        );
        canvas.clear(self.palette.fill);
        canvas.draw_gridlines(
            Some((50.0, egui::Color32::from_gray(225))),
            Some((50.0, egui::Color32::from_gray(225))),
        );
        self.diagram.draw_in(&mut canvas, &self.env(), self.selected);

        if let Some(pos) = response.interact_pointer_pos() {
            if response.clicked() || response.drag_started() {
                let hit = self.diagram.item_at(canvas.diagram_pos(pos));
                self.select(hit);
                self.dragged = hit;
            }
        }
        if response.dragged() {
            match self.dragged {
                Some(id) => report(
                    self.diagram
                        .move_item(id, response.drag_delta() / self.camera_scale),
                ),
                None => self.camera_offset += response.drag_delta(),
            }
        }
        if response.drag_stopped() {
            self.dragged = None;
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.camera_scale = (self.camera_scale * (1.0 + scroll / 500.0)).clamp(0.2, 5.0);
            }
        }
        if self.diagram.take_repaint() {
            ui.ctx().request_repaint();
        }
    }

    fn item_label(&self, id: ViewUuid) -> String {
        let Some(p) = self.diagram.item(id) else {
            return String::new();
        };
        match p.subject.map(|s| self.model.name(s)).filter(|n| !n.is_empty()) {
            Some(name) => format!("{} ({})", name, p.kind_name()),
            None => p.kind_name().to_owned(),
        }
    }

    fn hierarchy_node(&mut self, ui: &mut Ui, id: ViewUuid) {
        let children = self
            .diagram
            .item(id)
            .map(|p| p.children.clone())
            .unwrap_or_default();
        let label = self.item_label(id);
        let selected = self.selected == Some(id);
        if children.is_empty() {
            if ui.selectable_label(selected, label).clicked() {
                self.select(Some(id));
            }
            return;
        }
        egui::CollapsingHeader::new(label)
            .id_salt(id)
            .default_open(true)
            .show(ui, |ui| {
                if ui.selectable_label(selected, "(this item)").clicked() {
                    self.select(Some(id));
                }
                for child in children {
                    self.hierarchy_node(ui, child);
                }
            });
    }

    fn hierarchy(&mut self, ui: &mut Ui) {
        let roots: Vec<ViewUuid> = self.diagram.roots().map(|p| p.id).collect();
        egui::ScrollArea::vertical().show(ui, |ui| {
            for id in roots {
                self.hierarchy_node(ui, id);
            }
        });
    }

    fn set_item_property(&mut self, id: ViewUuid, property: ItemProperty) {
        let result = self.diagram.set_property(&self.model, id, property);
        report(result.map(|_| ()));
        self.diagram.update(&self.model);
    }

    fn properties(&mut self, ui: &mut Ui) {
        let Some(id) = self.selected else {
            ui.label("Nothing selected");
            return;
        };
        let Some(p) = self.diagram.item(id) else {
            return;
        };
        let subject = p.subject;
        let properties = p.properties.clone();
        ui.heading(p.kind_name());

        if self.association_page.is_some() {
            self.association_editor(ui);
            return;
        }

        let Some(subject) = subject else {
            return;
        };
        let mut name = self.model.name(subject).to_owned();
        ui.horizontal(|ui| {
            ui.label("Name");
            if ui.text_edit_singleline(&mut name).changed() {
                match self
                    .model
                    .set_attribute(subject, Attribute::Name, Value::from(name.as_str()))
                {
                    Ok(event) => self.apply_events(vec![event]),
                    Err(e) => warn!(error:% = e; "Rename failed"),
                }
            }
        });

        if self.model.is_a(subject, ModelType::Node) {
            let mut show = properties.show_stereotypes;
            if ui.checkbox(&mut show, "Show stereotypes").changed() {
                self.set_item_property(id, ItemProperty::ShowStereotypes(show));
            }
        }
        if self.model.is_a(subject, ModelType::ProxyPort) {
            let mut show = properties.show_type;
            if ui.checkbox(&mut show, "Show type").changed() {
                self.set_item_property(id, ItemProperty::ShowType(show));
            }
            let mut side = properties.connected_side;
            egui::ComboBox::from_label("Connected side")
                .selected_text(side.name())
                .show_ui(ui, |ui| {
                    for s in Side::ALL {
                        ui.selectable_value(&mut side, s, s.name());
                    }
                });
            if side != properties.connected_side {
                self.set_item_property(id, ItemProperty::ConnectedSide(side));
            }
        }
    }

    fn association_editor(&mut self, ui: &mut Ui) {
        let Some(mut page) = self.association_page.take() else {
            return;
        };

        let mut show_direction = page.show_direction;
        if ui.checkbox(&mut show_direction, "Show direction").changed() {
            report(page.on_show_direction_change(&self.model, &mut self.diagram, show_direction));
        }
        if ui.button("Invert direction").clicked() {
            report(page.on_invert_direction(&self.model, &mut self.diagram, &self.localizer));
        }

        for end in [End::Head, End::Tail] {
            let editor = page.editor(end).clone();
            ui.separator();
            ui.strong(&editor.title);

            let mut text = editor.name.text.clone();
            let response = ui.text_edit_singleline(&mut text);
            if response.gained_focus() {
                page.set_focus(&self.model, end, true);
            }
            if response.changed() {
                report(page.on_end_name_change(
                    &mut self.model,
                    &mut self.diagram,
                    &self.localizer,
                    end,
                    &text,
                    EditSession::Idle,
                ));
            }
            if response.lost_focus() {
                page.set_focus(&self.model, end, false);
            }

            let mut navigation = editor.navigation;
            egui::ComboBox::from_id_salt((page.item(), end, "navigation"))
                .selected_text(NAVIGABILITY_LABELS[navigation.min(2)])
                .show_ui(ui, |ui| {
                    for (idx, label) in NAVIGABILITY_LABELS.iter().enumerate() {
                        ui.selectable_value(&mut navigation, idx, *label);
                    }
                });
            if navigation != editor.navigation {
                report(page.on_end_navigability_change(
                    &mut self.model,
                    &mut self.diagram,
                    &self.localizer,
                    end,
                    navigation,
                ));
            }

            let mut aggregation = editor.aggregation;
            egui::ComboBox::from_id_salt((page.item(), end, "aggregation"))
                .selected_text(AGGREGATION_LABELS[aggregation.min(2)])
                .show_ui(ui, |ui| {
                    for (idx, label) in AGGREGATION_LABELS.iter().enumerate() {
                        ui.selectable_value(&mut aggregation, idx, *label);
                    }
                });
            if aggregation != editor.aggregation {
                report(page.on_end_aggregation_change(
                    &mut self.model,
                    &mut self.diagram,
                    &self.localizer,
                    end,
                    aggregation,
                ));
            }

            let Some(stereotypes) = &editor.stereotypes else {
                continue;
            };
            for row in &stereotypes.rows {
                let mut applied = row.applied;
                if ui.checkbox(&mut applied, &row.name).changed() {
                    report(page.toggle_stereotype(
                        &mut self.model,
                        &mut self.diagram,
                        &self.localizer,
                        end,
                        row.stereotype,
                        applied,
                    ));
                }
                for slot in &row.slots {
                    let mut value = slot.value.clone();
                    ui.horizontal(|ui| {
                        ui.label(&slot.name);
                        if ui.text_edit_singleline(&mut value).lost_focus() && value != slot.value {
                            report(page.set_slot_value(
                                &mut self.model,
                                &mut self.diagram,
                                &self.localizer,
                                end,
                                row.stereotype,
                                slot.attribute,
                                &value,
                            ));
                        }
                    });
                }
            }
        }

        self.diagram.update(&self.model);
        self.association_page = Some(page);
    }

    fn export_svg(&self, path: PathBuf) {
        if let Err(e) = self
            .diagram
            .export_svg(&self.env(), self.settings.export.padding, &path)
        {
            warn!(path:? = path, error:% = e; "Export failed");
        }
    }
}

/// Small project showing every kind of item.
fn demo_project() -> Result<(Model, Diagram), DiagramError> {
    let mut m = Model::new();
    let root = m.create_named(ModelType::Package, "Demo", None)?;
    let vehicles = m.create_named(ModelType::Package, "Vehicles", Some(root))?;
    let hazards = m.create_named(ModelType::Package, "Hazards", Some(root))?;
    let profile = m.create_named(ModelType::Profile, "Deployment", Some(root))?;

    let secure = m.create_named(ModelType::Stereotype, "secure", Some(profile))?;
    let level = m.create_named(ModelType::Property, "level", Some(secure))?;
    m.add_relation(secure, Relation::OwnedAttribute, level)?;

    let server = m.create_named(ModelType::Device, "Server", Some(root))?;
    let (instance, _) = recipes::apply_stereotype(&mut m, server, secure)?;
    recipes::set_slot_value(&mut m, instance, level, "high")?;
    let ethernet = m.create_named(ModelType::Class, "Ethernet", Some(root))?;
    let port = m.create_named(ModelType::ProxyPort, "eth0", Some(server))?;
    m.set_relation(port, Relation::Type, Some(ethernet))?;

    let car = m.create_named(ModelType::Class, "Car", Some(vehicles))?;
    let wheel = m.create_named(ModelType::Class, "Wheel", Some(vehicles))?;
    let association = m.create_named(ModelType::Association, "has", Some(vehicles))?;
    let wheels = m.create_named(ModelType::Property, "wheels", None)?;
    let owner = m.create_named(ModelType::Property, "car", None)?;
    for (end, ty) in [(wheels, wheel), (owner, car)] {
        m.add_relation(association, Relation::MemberEnd, end)?;
        m.set_relation(end, Relation::Association, Some(association))?;
        m.set_relation(end, Relation::Type, Some(ty))?;
    }
    m.set_attribute(wheels, Attribute::Visibility, Value::Visibility(Visibility::Public))?;
    m.set_attribute(wheels, Attribute::LowerValue, Value::from("0"))?;
    m.set_attribute(wheels, Attribute::UpperValue, Value::from("*"))?;

    let backend = m.create_named(ModelType::C4Container, "Backend", Some(root))?;
    m.set_attribute(backend, Attribute::Technology, Value::from("Linux"))?;
    let api = m.create_named(ModelType::C4Container, "API", Some(root))?;
    m.set_attribute(api, Attribute::Technology, Value::from("Rust"))?;
    m.set_attribute(api, Attribute::Description, Value::from("Serves the editor"))?;
    let store = m.create_named(ModelType::C4Database, "Store", Some(root))?;
    m.set_attribute(store, Attribute::Technology, Value::from("SQLite"))?;
    m.set_attribute(store, Attribute::Description, Value::from("Keeps every model"))?;

    let pump = m.create_named(ModelType::BasicEvent, "Pump fails", Some(hazards))?;
    let service = m.create_named(ModelType::HouseEvent, "Service", Some(hazards))?;
    let never = m.create_named(ModelType::ZeroEvent, "Never", Some(hazards))?;
    let vote = m.create_named(ModelType::MajorityVoteGate, "2 of 3", Some(hazards))?;

    let mut d = Diagram::new(Some(root));
    let pos = egui::Pos2::new;

    let vehicles_item = d.create_item(&m, vehicles, pos(20.0, 20.0))?;
    d.resize_item(vehicles_item, vec2(240.0, 160.0))?;
    let association_item = d.create_item(&m, association, pos(50.0, 90.0))?;
    d.set_parent(&m, association_item, Some(vehicles_item))?;

    let server_item = d.create_item(&m, server, pos(320.0, 40.0))?;
    d.resize_item(server_item, vec2(160.0, 110.0))?;
    d.set_property(&m, server_item, ItemProperty::ShowStereotypes(true))?;
    let port_item = d.create_item(&m, port, pos(472.0, 80.0))?;
    d.set_parent(&m, port_item, Some(server_item))?;
    d.set_property(&m, port_item, ItemProperty::ShowType(true))?;

    let backend_item = d.create_item(&m, backend, pos(20.0, 230.0))?;
    d.resize_item(backend_item, vec2(260.0, 150.0))?;
    let api_item = d.create_item(&m, api, pos(50.0, 290.0))?;
    d.resize_item(api_item, vec2(180.0, 70.0))?;
    d.set_parent(&m, api_item, Some(backend_item))?;
    let store_item = d.create_item(&m, store, pos(320.0, 250.0))?;
    d.resize_item(store_item, vec2(160.0, 80.0))?;

    for (i, event) in [pump, service, never, vote].into_iter().enumerate() {
        d.create_item(&m, event, pos(40.0 + 130.0 * i as f32, 440.0))?;
    }
    d.update(&m);
    Ok((m, d))
}

struct NHApp {
    context: NHContext,
    tree: DockState<NHTab>,
}

impl NHApp {
    fn new(settings: Settings) -> Self {
        let localizer = match settings.language.as_deref().map(Localizer::for_tag) {
            Some(Ok(localizer)) => localizer,
            Some(Err(e)) => {
                warn!(error:% = e; "Using the default language");
                Localizer::default()
            }
            None => Localizer::default(),
        };
        let palette = settings.palette().unwrap_or_default();
        let (model, diagram) = demo_project().unwrap_or_else(|e| {
            warn!(error:% = e; "Demo project could not be built");
            (Model::new(), Diagram::new(None::<ModelUuid>))
        });
        info!(items = diagram.len(); "Starting viewer");

        let mut dock_state = DockState::new(vec![NHTab::Diagram]);
        let [a, _] = dock_state.main_surface_mut().split_left(
            NodeIndex::root(),
            0.2,
            vec![NHTab::Hierarchy],
        );
        dock_state
            .main_surface_mut()
            .split_right(a, 0.7, vec![NHTab::Properties]);

        Self {
            context: NHContext {
                settings,
                palette,
                localizer,
                model,
                diagram,
                selected: None,
                dragged: None,
                camera_offset: egui::Pos2::ZERO,
                camera_scale: 1.0,
                association_page: None,
                open_unique_tabs: [NHTab::Hierarchy, NHTab::Properties].into_iter().collect(),
            },
            tree: dock_state,
        }
    }
}

impl eframe::App for NHApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        TopBottomPanel::top("egui_dock::MenuBar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Export SVG").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("SVG files", &["svg"])
                            .add_filter("All files", &["*"])
                            .set_file_name("diagram.svg")
                            .save_file()
                        {
                            self.context.export_svg(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Windows", |ui| {
                    for tab in &[NHTab::Hierarchy, NHTab::Properties] {
                        if ui
                            .selectable_label(self.context.open_unique_tabs.contains(tab), tab.name())
                            .clicked()
                        {
                            if let Some(index) = self.tree.find_tab(tab) {
                                self.tree.remove_tab(index);
                                self.context.open_unique_tabs.remove(tab);
                            } else {
                                self.tree[SurfaceIndex::main()].push_to_focused_leaf(*tab);
                                self.context.open_unique_tabs.insert(*tab);
                            }
                            ui.close_menu();
                        }
                    }
                });
            });
        });

        CentralPanel::default()
            .frame(Frame::central_panel(&ctx.style()).inner_margin(0.))
            .show(ctx, |ui| {
                let style = Style::from_egui(ui.style());
                DockArea::new(&mut self.tree)
                    .style(style)
                    .show_inside(ui, &mut self.context);
            });
    }
}
