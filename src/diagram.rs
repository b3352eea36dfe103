use std::collections::HashMap;

use eframe::egui;
use log::{debug, info};

use crate::common::canvas::{Highlight, MeasuringCanvas, NHCanvas, SVGCanvas};
use crate::common::config::{FontSettings, Palette};
use crate::common::controller::{ItemContext, ItemProperties, ItemProperty, PresentationItem};
use crate::common::error::{DiagramError, ExportError, ModelError};
use crate::common::fluent::Localizer;
use crate::common::model::Model;
use crate::common::observer::{Change, ItemEvent, ItemFeature, WatchAction, WatchRegistry};
use crate::common::render::{draw_shape, RenderContext, TextContext};
use crate::common::shapes::{BoxShape, Shape};
use crate::common::uuid::{ModelUuid, ViewUuid};
use crate::support::presentation_for;

/// One item placed on a diagram.
pub struct Presentation {
    pub id: ViewUuid,
    item: Box<dyn PresentationItem>,
    pub subject: Option<ModelUuid>,
    pub parent: Option<ViewUuid>,
    pub children: Vec<ViewUuid>,
    pub bounds: egui::Rect,
    pub properties: ItemProperties,
    shape: Shape,
    needs_rebuild: bool,
}

impl Presentation {
    pub fn kind_name(&self) -> &'static str {
        self.item.kind_name()
    }

    pub fn is_attached(&self) -> bool {
        self.item.is_attached()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// What painting needs besides the diagram itself.
pub struct DrawEnv<'a> {
    pub model: &'a Model,
    pub localizer: &'a Localizer,
    pub fonts: &'a FontSettings,
    pub palette: Palette,
}

pub struct Diagram {
    pub owner: Option<ModelUuid>,
    items: HashMap<ViewUuid, Presentation>,
    order: Vec<ViewUuid>,
    registry: WatchRegistry,
    repaint_requested: bool,
}

impl Diagram {
    pub fn new(owner: Option<ModelUuid>) -> Self {
        Self {
            owner,
            items: HashMap::new(),
            order: Vec::new(),
            registry: WatchRegistry::new(),
            repaint_requested: false,
        }
    }

    pub fn item(&self, id: ViewUuid) -> Option<&Presentation> {
        self.items.get(&id)
    }

    pub fn shape(&self, id: ViewUuid) -> Option<&Shape> {
        self.items.get(&id).map(|p| &p.shape)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn watch_count(&self, id: ViewUuid) -> usize {
        self.registry.watch_count(id)
    }

    /// Items without a parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = &Presentation> {
        self.order
            .iter()
            .filter_map(|id| self.items.get(id))
            .filter(|p| p.parent.is_none())
    }

    /// Parents before their children.
    fn paint_order(&self) -> Vec<ViewUuid> {
        fn visit(diagram: &Diagram, id: ViewUuid, out: &mut Vec<ViewUuid>) {
            out.push(id);
            if let Some(p) = diagram.items.get(&id) {
                for child in &p.children {
                    visit(diagram, *child, out);
                }
            }
        }
        let mut out = Vec::with_capacity(self.items.len());
        for root in self.roots() {
            visit(self, root.id, &mut out);
        }
        out
    }

    fn get_mut(&mut self, id: ViewUuid) -> Result<&mut Presentation, DiagramError> {
        self.items.get_mut(&id).ok_or(DiagramError::UnknownItem(id))
    }

    fn build(&self, model: &Model, presentation: &Presentation) -> Shape {
        presentation.item.build_shapes(&ItemContext {
            model,
            subject: presentation.subject,
            properties: &presentation.properties,
            has_children: !presentation.children.is_empty(),
        })
    }

    /// Places the item showing `subject`, picked by the type of the subject.
    pub fn create_item(
        &mut self,
        model: &Model,
        subject: ModelUuid,
        position: egui::Pos2,
    ) -> Result<ViewUuid, DiagramError> {
        let model_type = model.kind(subject).ok_or(ModelError::UnknownElement(subject))?;
        let item = presentation_for(model_type).ok_or(DiagramError::NoPresentation(model_type))?;
        Ok(self.add_item(model, item, Some(subject), position))
    }

    pub fn add_item(
        &mut self,
        model: &Model,
        item: Box<dyn PresentationItem>,
        subject: Option<ModelUuid>,
        position: egui::Pos2,
    ) -> ViewUuid {
        let id = ViewUuid::now_v7();
        for watch in item.watches() {
            self.registry.watch(id, subject, watch);
        }
        let mut presentation = Presentation {
            id,
            bounds: egui::Rect::from_min_size(position, item.default_size()),
            item,
            subject,
            parent: None,
            children: Vec::new(),
            properties: ItemProperties::default(),
            shape: BoxShape::new(Vec::new()).into(),
            needs_rebuild: false,
        };
        presentation.shape = self.build(model, &presentation);
        debug!(id:% = id, kind = presentation.kind_name(); "Created item");
        self.items.insert(id, presentation);
        self.order.push(id);
        id
    }

    /// Removes the item and everything nested in it, returning the removed ids.
    pub fn remove_item(&mut self, model: &Model, id: ViewUuid) -> Result<Vec<ViewUuid>, DiagramError> {
        let parent = self.items.get(&id).ok_or(DiagramError::UnknownItem(id))?.parent;
        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(p) = self.items.remove(&next) {
                pending.extend(p.children.iter().copied());
                self.registry.unsubscribe_all(next);
                removed.push(next);
            }
        }
        self.order.retain(|i| !removed.contains(i));
        if let Some(parent) = parent {
            if let Some(p) = self.items.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
            self.notify_item(model, parent, ItemFeature::Children);
        }
        debug!(id:% = id, count = removed.len(); "Removed item");
        Ok(removed)
    }

    /// Moves `child` into `parent`, or to the top level.
    pub fn set_parent(
        &mut self,
        model: &Model,
        child: ViewUuid,
        parent: Option<ViewUuid>,
    ) -> Result<(), DiagramError> {
        let old_parent = self.items.get(&child).ok_or(DiagramError::UnknownItem(child))?.parent;
        if let Some(parent) = parent {
            if !self.items.contains_key(&parent) {
                return Err(DiagramError::UnknownItem(parent));
            }
            let mut ancestor = Some(parent);
            while let Some(a) = ancestor {
                if a == child {
                    return Err(DiagramError::ContainmentCycle { child, parent });
                }
                ancestor = self.items.get(&a).and_then(|p| p.parent);
            }
        }
        if old_parent == parent {
            return Ok(());
        }

        if let Some(old) = old_parent {
            self.get_mut(old)?.children.retain(|c| *c != child);
        }
        if let Some(new) = parent {
            self.get_mut(new)?.children.push(child);
        }
        self.get_mut(child)?.parent = parent;

        for p in [old_parent, parent].into_iter().flatten() {
            self.notify_item(model, p, ItemFeature::Children);
        }
        Ok(())
    }

    /// Returns whether the value changed.
    pub fn set_property(
        &mut self,
        model: &Model,
        id: ViewUuid,
        property: ItemProperty,
    ) -> Result<bool, DiagramError> {
        let changed = property.apply(&mut self.get_mut(id)?.properties);
        if changed {
            self.notify_item(model, id, property.feature());
        }
        Ok(changed)
    }

    /// Shows another element in the item; its watches follow.
    pub fn set_subject(&mut self, id: ViewUuid, subject: Option<ModelUuid>) -> Result<(), DiagramError> {
        let presentation = self.get_mut(id)?;
        presentation.subject = subject;
        presentation.needs_rebuild = true;
        self.registry.rebind_subject(id, subject);
        Ok(())
    }

    /// Moves the item together with everything nested in it.
    pub fn move_item(&mut self, id: ViewUuid, delta: egui::Vec2) -> Result<(), DiagramError> {
        let mut pending = vec![id];
        self.get_mut(id)?;
        while let Some(next) = pending.pop() {
            if let Some(p) = self.items.get_mut(&next) {
                p.bounds = p.bounds.translate(delta);
                pending.extend(p.children.iter().copied());
            }
        }
        self.repaint_requested = true;
        Ok(())
    }

    pub fn resize_item(&mut self, id: ViewUuid, size: egui::Vec2) -> Result<(), DiagramError> {
        let presentation = self.get_mut(id)?;
        presentation.bounds =
            egui::Rect::from_min_size(presentation.bounds.min, size.max(egui::Vec2::splat(1.0)));
        self.repaint_requested = true;
        Ok(())
    }

    /// Marks the item for a rebuild regardless of its watches.
    pub fn request_rebuild(&mut self, id: ViewUuid) -> Result<(), DiagramError> {
        self.get_mut(id)?.needs_rebuild = true;
        Ok(())
    }

    fn notify_item(&mut self, model: &Model, view: ViewUuid, feature: ItemFeature) {
        self.notify(model, &Change::Item(ItemEvent { view, feature }));
    }

    /// Marks the items `change` concerns.
    pub fn notify(&mut self, model: &Model, change: &Change) {
        for (id, action) in self.registry.dispatch(model, change) {
            match action {
                WatchAction::Rebuild => {
                    if let Some(p) = self.items.get_mut(&id) {
                        p.needs_rebuild = true;
                    }
                }
                WatchAction::Repaint => self.repaint_requested = true,
            }
        }
    }

    /// Rebuilds the shape trees of the marked items, returning their ids.
    pub fn update(&mut self, model: &Model) -> Vec<ViewUuid> {
        let dirty: Vec<ViewUuid> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.items.get(id).is_some_and(|p| p.needs_rebuild))
            .collect();
        for id in &dirty {
            let Some(p) = self.items.get(id) else {
                continue;
            };
            let shape = self.build(model, p);
            if let Some(p) = self.items.get_mut(id) {
                p.shape = shape;
                p.needs_rebuild = false;
            }
            debug!(id:% = id; "Rebuilt shape tree");
        }
        if !dirty.is_empty() {
            self.repaint_requested = true;
        }
        dirty
    }

    /// Whether anything changed since the last call.
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.repaint_requested)
    }

    /// Topmost item under `pos`.
    pub fn item_at(&self, pos: egui::Pos2) -> Option<ViewUuid> {
        self.paint_order()
            .into_iter()
            .rev()
            .find(|id| self.items.get(id).is_some_and(|p| p.bounds.contains(pos)))
    }

    pub fn draw_in(&self, canvas: &mut dyn NHCanvas, env: &DrawEnv, selected: Option<ViewUuid>) {
        for id in self.paint_order() {
            let Some(p) = self.items.get(&id) else {
                continue;
            };
            let ctx = RenderContext {
                text: TextContext {
                    model: env.model,
                    localizer: env.localizer,
                    diagram_owner: self.owner,
                    subject: p.subject,
                    parent_subject: p
                        .parent
                        .and_then(|parent| self.items.get(&parent))
                        .and_then(|parent| parent.subject),
                    properties: &p.properties,
                    item_width: p.bounds.width(),
                },
                fonts: env.fonts,
                palette: env.palette,
                highlight: if selected == Some(id) {
                    Highlight::SELECTED
                } else {
                    Highlight::NONE
                },
            };
            draw_shape(&p.shape, canvas, &ctx, p.bounds);
        }
    }

    /// Bounds of everything the diagram paints.
    pub fn measure(&self, env: &DrawEnv) -> egui::Rect {
        let mut canvas = MeasuringCanvas::new();
        self.draw_in(&mut canvas, env, None);
        canvas.bounds()
    }

    pub fn to_svg(&self, env: &DrawEnv, padding: f32) -> SVGCanvas {
        let bounds = self.measure(env);
        let bounds = if bounds.is_positive() {
            bounds
        } else {
            egui::Rect::from_min_size(egui::Pos2::ZERO, egui::Vec2::ZERO)
        };
        let mut canvas = SVGCanvas::new(
            (egui::Vec2::splat(padding) - bounds.min.to_vec2()).to_pos2(),
            bounds.size() + egui::Vec2::splat(2.0 * padding),
        );
        self.draw_in(&mut canvas, env, None);
        canvas
    }

    pub fn export_svg(
        &self,
        env: &DrawEnv,
        padding: f32,
        path: &std::path::Path,
    ) -> Result<(), ExportError> {
        self.to_svg(env, padding).save_to(path)?;
        info!(path:? = path, items = self.items.len(); "Exported diagram");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::controller::Side;
    use crate::common::model::{Attribute, ModelType, Relation, Value};
    use crate::common::shapes::{JustifyContent, TextSource};

    struct Fixture {
        model: Model,
        package: ModelUuid,
        diagram: Diagram,
    }

    fn fixture() -> Fixture {
        let mut model = Model::new();
        let root = model.create_named(ModelType::Package, "root", None).unwrap();
        let package = model
            .create_named(ModelType::Package, "Vehicles", Some(root))
            .unwrap();
        Fixture {
            model,
            package,
            diagram: Diagram::new(Some(root)),
        }
    }

    fn justify(shape: &Shape) -> Option<JustifyContent> {
        match shape {
            Shape::Box(b) => b.style.justify_content,
            _ => None,
        }
    }

    #[test]
    fn create_item_uses_default_size_and_watches() {
        let mut f = fixture();
        let id = f
            .diagram
            .create_item(&f.model, f.package, egui::Pos2::new(10.0, 10.0))
            .unwrap();
        let item = f.diagram.item(id).unwrap();
        assert_eq!(item.kind_name(), "PackageItem");
        assert_eq!(item.bounds.size(), egui::Vec2::new(70.0, 70.0));
        assert!(f.diagram.watch_count(id) > 0);
    }

    #[test]
    fn create_item_rejects_unrepresented_types() {
        let mut f = fixture();
        let slot = f.model.create(ModelType::Slot);
        assert_eq!(
            f.diagram.create_item(&f.model, slot, egui::Pos2::ZERO),
            Err(DiagramError::NoPresentation(ModelType::Slot))
        );
        let missing = ModelUuid::now_v7();
        assert_eq!(
            f.diagram.create_item(&f.model, missing, egui::Pos2::ZERO),
            Err(DiagramError::Model(ModelError::UnknownElement(missing)))
        );
    }

    #[test]
    fn children_change_rebuilds_parent_only() {
        let mut f = fixture();
        let outer = f.diagram.create_item(&f.model, f.package, egui::Pos2::ZERO).unwrap();
        let class_package = f
            .model
            .create_named(ModelType::Package, "Inner", Some(f.package))
            .unwrap();
        let inner = f
            .diagram
            .create_item(&f.model, class_package, egui::Pos2::new(10.0, 30.0))
            .unwrap();
        assert_eq!(justify(f.diagram.shape(outer).unwrap()), Some(JustifyContent::Center));

        f.diagram.set_parent(&f.model, inner, Some(outer)).unwrap();
        assert_eq!(f.diagram.update(&f.model), vec![outer]);
        assert_eq!(justify(f.diagram.shape(outer).unwrap()), Some(JustifyContent::Start));
        assert_eq!(f.diagram.item(outer).unwrap().children, vec![inner]);

        f.diagram.set_parent(&f.model, inner, None).unwrap();
        assert_eq!(f.diagram.update(&f.model), vec![outer]);
        assert_eq!(justify(f.diagram.shape(outer).unwrap()), Some(JustifyContent::Center));
    }

    #[test]
    fn containment_cycles_are_rejected() {
        let mut f = fixture();
        let a = f.diagram.create_item(&f.model, f.package, egui::Pos2::ZERO).unwrap();
        let b = f.diagram.create_item(&f.model, f.package, egui::Pos2::ZERO).unwrap();
        f.diagram.set_parent(&f.model, b, Some(a)).unwrap();
        assert_eq!(
            f.diagram.set_parent(&f.model, a, Some(b)),
            Err(DiagramError::ContainmentCycle { child: a, parent: b })
        );
        assert_eq!(
            f.diagram.set_parent(&f.model, a, Some(a)),
            Err(DiagramError::ContainmentCycle { child: a, parent: a })
        );
    }

    #[test]
    fn repaint_does_not_rebuild() {
        let mut f = fixture();
        let id = f.diagram.create_item(&f.model, f.package, egui::Pos2::ZERO).unwrap();
        f.diagram.update(&f.model);
        f.diagram.take_repaint();
        let before = f.diagram.shape(id).unwrap().clone();

        let event = f
            .model
            .set_attribute(f.package, Attribute::Name, Value::from("Cars"))
            .unwrap();
        f.diagram.notify(&f.model, &event.into());
        assert!(f.diagram.update(&f.model).is_empty());
        assert!(f.diagram.take_repaint());
        assert_eq!(f.diagram.shape(id), Some(&before));
        assert!(before.find_text(&TextSource::SubjectName).is_some());
    }

    #[test]
    fn property_changes_rebuild_through_watches() {
        let mut model = Model::new();
        let block = model.create_named(ModelType::Class, "Motor", None).unwrap();
        let port = model.create_named(ModelType::ProxyPort, "p", Some(block)).unwrap();
        let mut diagram = Diagram::new(None);
        let id = diagram.create_item(&model, port, egui::Pos2::ZERO).unwrap();

        assert!(diagram
            .set_property(&model, id, ItemProperty::ConnectedSide(Side::Left))
            .unwrap());
        assert_eq!(diagram.update(&model), vec![id]);

        // unchanged value emits nothing
        assert!(!diagram
            .set_property(&model, id, ItemProperty::ConnectedSide(Side::Left))
            .unwrap());
        assert!(diagram.update(&model).is_empty());

        // show_type only repaints
        assert!(diagram.set_property(&model, id, ItemProperty::ShowType(true)).unwrap());
        assert!(diagram.update(&model).is_empty());
    }

    #[test]
    fn remove_releases_watches_recursively() {
        let mut f = fixture();
        let outer = f.diagram.create_item(&f.model, f.package, egui::Pos2::ZERO).unwrap();
        let inner = f.diagram.create_item(&f.model, f.package, egui::Pos2::ZERO).unwrap();
        f.diagram.set_parent(&f.model, inner, Some(outer)).unwrap();

        let removed = f.diagram.remove_item(&f.model, outer).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(f.diagram.is_empty());
        assert_eq!(f.diagram.watch_count(outer), 0);
        assert_eq!(f.diagram.watch_count(inner), 0);

        let event = f
            .model
            .set_attribute(f.package, Attribute::Name, Value::from("Gone"))
            .unwrap();
        f.diagram.take_repaint();
        f.diagram.notify(&f.model, &event.into());
        assert!(!f.diagram.take_repaint());
        assert_eq!(
            f.diagram.remove_item(&f.model, outer),
            Err(DiagramError::UnknownItem(outer))
        );
    }

    #[test]
    fn subject_rebinding_moves_watches() {
        let mut model = Model::new();
        let first = model.create_named(ModelType::Node, "first", None).unwrap();
        let second = model.create_named(ModelType::Node, "second", None).unwrap();
        let connector = model.create(ModelType::Connector);
        let mut diagram = Diagram::new(None);
        let id = diagram.create_item(&model, first, egui::Pos2::ZERO).unwrap();

        diagram.set_subject(id, Some(second)).unwrap();
        assert_eq!(diagram.update(&model), vec![id]);

        let event = model
            .add_relation(first, Relation::OwnedConnector, connector)
            .unwrap();
        diagram.notify(&model, &event.into());
        assert!(diagram.update(&model).is_empty());

        let event = model
            .add_relation(second, Relation::OwnedConnector, connector)
            .unwrap();
        diagram.notify(&model, &event.into());
        assert_eq!(diagram.update(&model), vec![id]);
    }

    #[test]
    fn item_at_prefers_children() {
        let mut f = fixture();
        let outer = f.diagram.create_item(&f.model, f.package, egui::Pos2::ZERO).unwrap();
        let inner = f
            .diagram
            .create_item(&f.model, f.package, egui::Pos2::new(10.0, 10.0))
            .unwrap();
        f.diagram.resize_item(outer, egui::Vec2::new(200.0, 200.0)).unwrap();
        f.diagram.set_parent(&f.model, inner, Some(outer)).unwrap();
        assert_eq!(f.diagram.item_at(egui::Pos2::new(20.0, 20.0)), Some(inner));
        assert_eq!(f.diagram.item_at(egui::Pos2::new(150.0, 150.0)), Some(outer));
        assert_eq!(f.diagram.item_at(egui::Pos2::new(500.0, 500.0)), None);

        f.diagram.move_item(outer, egui::Vec2::new(100.0, 0.0)).unwrap();
        assert_eq!(
            f.diagram.item(inner).unwrap().bounds.min,
            egui::Pos2::new(110.0, 10.0)
        );
    }

    #[test]
    fn svg_export_contains_item_texts() {
        let mut f = fixture();
        f.diagram
            .create_item(&f.model, f.package, egui::Pos2::new(-40.0, 15.0))
            .unwrap();
        let localizer = Localizer::default();
        let fonts = FontSettings::default();
        let env = DrawEnv {
            model: &f.model,
            localizer: &localizer,
            fonts: &fonts,
            palette: Palette::default(),
        };
        let svg = f.diagram.to_svg(&env, 10.0).to_svg_string();
        assert!(svg.contains("Vehicles"));
        assert!(!svg.contains("(from"));
        // shifted so the top left corner lands on the padding
        assert!(svg.contains(r#"<path d="M 60 30 L 60 10"#));

        let path = std::env::temp_dir().join(format!("nh-glyphs-{}.svg", uuid::Uuid::now_v7()));
        f.diagram.export_svg(&env, 10.0, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(written, svg);
    }
}
