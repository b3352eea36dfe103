use eframe::egui;

use super::model::Model;
use super::observer::{ItemFeature, Watch};
use super::shapes::Shape;
use super::uuid::ModelUuid;

/// Side of the parent an attached item (a port) sits on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    Left,
    #[default]
    Right,
    Top,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        }
    }
}

/// Presentation-level state of an item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemProperties {
    pub show_stereotypes: bool,
    pub show_type: bool,
    pub connected_side: Side,
    pub show_direction: bool,
    pub inverted: bool,
}

/// A single property change, as requested by the property editors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemProperty {
    ShowStereotypes(bool),
    ShowType(bool),
    ConnectedSide(Side),
    ShowDirection(bool),
    Inverted(bool),
}

impl ItemProperty {
    pub fn feature(self) -> ItemFeature {
        match self {
            ItemProperty::ShowStereotypes(_) => ItemFeature::ShowStereotypes,
            ItemProperty::ShowType(_) => ItemFeature::ShowType,
            ItemProperty::ConnectedSide(_) => ItemFeature::ConnectedSide,
            ItemProperty::ShowDirection(_) => ItemFeature::ShowDirection,
            ItemProperty::Inverted(_) => ItemFeature::Inverted,
        }
    }

    /// Writes the value, returning whether anything changed.
    pub fn apply(self, properties: &mut ItemProperties) -> bool {
        fn set<T: PartialEq>(slot: &mut T, value: T) -> bool {
            let changed = *slot != value;
            *slot = value;
            changed
        }
        match self {
            ItemProperty::ShowStereotypes(v) => set(&mut properties.show_stereotypes, v),
            ItemProperty::ShowType(v) => set(&mut properties.show_type, v),
            ItemProperty::ConnectedSide(v) => set(&mut properties.connected_side, v),
            ItemProperty::ShowDirection(v) => set(&mut properties.show_direction, v),
            ItemProperty::Inverted(v) => set(&mut properties.inverted, v),
        }
    }
}

/// Everything a shape tree may be derived from.
pub struct ItemContext<'a> {
    pub model: &'a Model,
    pub subject: Option<ModelUuid>,
    pub properties: &'a ItemProperties,
    pub has_children: bool,
}

/// One kind of diagram item.
///
/// Implementations are stateless; the diagram keeps the per-item state and
/// calls `build_shapes` again whenever a rebuild watch fires.
pub trait PresentationItem {
    fn kind_name(&self) -> &'static str;

    fn default_size(&self) -> egui::Vec2;

    /// Registered once when the item is created.
    fn watches(&self) -> Vec<Watch>;

    /// Must be a pure function of the context.
    fn build_shapes(&self, context: &ItemContext) -> Shape;

    /// Whether the item is drawn attached to the border of its parent.
    fn is_attached(&self) -> bool {
        false
    }
}
