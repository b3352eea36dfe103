use log::debug;

use crate::common::controller::ItemProperty;
use crate::common::error::DiagramError;
use crate::common::fluent::Localizer;
use crate::common::model::{
    AggregationKind, Attribute, Model, ModelEvent, ModelType, Relation, Value,
};
use crate::common::observer::{Change, Watch, WatchId, WatchPath, WatchRegistry};
use crate::common::recipes::{self, End};
use crate::common::uuid::{ModelUuid, ViewUuid};
use crate::diagram::Diagram;

pub const NAVIGABILITY: [Option<bool>; 3] = [None, Some(false), Some(true)];
pub const AGGREGATION: [AggregationKind; 3] = [
    AggregationKind::None,
    AggregationKind::Shared,
    AggregationKind::Composite,
];

/// Whether the call path already runs inside an edit made through this page.
///
/// Changes caused by the page's own edits come back through `notify`; passing
/// `Editing` keeps them from overwriting the text being typed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Idle,
    Editing,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NameField {
    pub text: String,
    pub has_focus: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SlotRow {
    pub attribute: ModelUuid,
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StereotypeRow {
    pub stereotype: ModelUuid,
    pub name: String,
    pub applied: bool,
    pub slots: Vec<SlotRow>,
}

/// Applicable stereotypes of an element with their slot values.
#[derive(Clone, Debug, PartialEq)]
pub struct StereotypeModel {
    pub rows: Vec<StereotypeRow>,
}

impl StereotypeModel {
    /// None when no stereotype can be applied to `element`.
    pub fn for_element(model: &Model, element: ModelUuid) -> Option<Self> {
        let stereotypes = recipes::get_stereotypes(model, element);
        if stereotypes.is_empty() {
            return None;
        }
        let rows = stereotypes
            .into_iter()
            .map(|stereotype| {
                let instance = recipes::applied_instance(model, element, stereotype);
                let slots = model
                    .related(stereotype, Relation::OwnedAttribute)
                    .iter()
                    .map(|attribute| SlotRow {
                        attribute: *attribute,
                        name: model.name(*attribute).to_owned(),
                        value: instance
                            .and_then(|i| recipes::slot_for(model, i, *attribute))
                            .and_then(|s| model.text(s, Attribute::Value))
                            .unwrap_or("")
                            .to_owned(),
                    })
                    .collect();
                StereotypeRow {
                    stereotype,
                    name: model.name(stereotype).to_owned(),
                    applied: instance.is_some(),
                    slots,
                }
            })
            .collect();
        Some(Self { rows })
    }
}

/// Editor state of one association end.
#[derive(Clone, Debug, PartialEq)]
pub struct EndEditor {
    pub end: End,
    pub subject: ModelUuid,
    pub title: String,
    pub name: NameField,
    pub navigation: usize,
    pub aggregation: usize,
    /// None hides the stereotype frame.
    pub stereotypes: Option<StereotypeModel>,
}

impl EndEditor {
    fn new(model: &Model, localizer: &Localizer, end: End, subject: ModelUuid) -> Self {
        let mut editor = Self {
            end,
            subject,
            title: String::new(),
            name: NameField::default(),
            navigation: NAVIGABILITY
                .iter()
                .position(|n| *n == recipes::navigability(model, subject))
                .unwrap_or(0),
            aggregation: match model.attribute(subject, Attribute::Aggregation) {
                Some(Value::Aggregation(kind)) => {
                    AGGREGATION.iter().position(|a| a == kind).unwrap_or(0)
                }
                _ => 0,
            },
            stereotypes: StereotypeModel::for_element(model, subject),
        };
        editor.update_title(model, localizer);
        editor.update_name(model, EditSession::Idle);
        editor
    }

    fn update_title(&mut self, model: &Model, localizer: &Localizer) {
        let end_label = localizer.gettext(self.end.message_id());
        self.title = match model.first_related(self.subject, Relation::Type) {
            Some(ty) => localizer.gettext_args(
                "association-end-title",
                &[("end", &end_label), ("type", model.name(ty))],
            ),
            None => end_label,
        };
    }

    /// Refreshes the name text unless the field is being edited.
    fn update_name(&mut self, model: &Model, session: EditSession) -> bool {
        if self.name.has_focus || session == EditSession::Editing {
            return false;
        }
        self.name.text = recipes::format_property(model, self.subject);
        true
    }
}

/// Editor state of the association shown by a diagram item.
pub struct AssociationPropertyPage {
    item: ViewUuid,
    subject: ModelUuid,
    watcher: ViewUuid,
    registry: WatchRegistry,
    name_watches: Vec<WatchId>,
    type_watch: WatchId,
    pub show_direction: bool,
    pub inverted: bool,
    pub head: EndEditor,
    pub tail: EndEditor,
}

fn member_end() -> WatchPath {
    WatchPath::subject_as(ModelType::Association).then_as(Relation::MemberEnd, ModelType::Property)
}

impl AssociationPropertyPage {
    /// None when the item shows no association with two ends.
    pub fn construct(
        diagram: &Diagram,
        model: &Model,
        localizer: &Localizer,
        item: ViewUuid,
    ) -> Option<Self> {
        let presentation = diagram.item(item)?;
        let subject = presentation.subject?;
        if !model.is_a(subject, ModelType::Association) {
            return None;
        }
        let inverted = presentation.properties.inverted;
        let head = recipes::association_end(model, subject, End::Head, inverted)?;
        let tail = recipes::association_end(model, subject, End::Tail, inverted)?;

        let watcher = ViewUuid::now_v7();
        let mut registry = WatchRegistry::new();
        let name_watches = [
            Attribute::Name,
            Attribute::Visibility,
            Attribute::LowerValue,
            Attribute::UpperValue,
        ]
        .into_iter()
        .map(|a| registry.watch(watcher, Some(subject), Watch::repaint(member_end().then(a))))
        .collect();
        let type_watch = registry.watch(
            watcher,
            Some(subject),
            Watch::repaint(member_end().then(Relation::Type)),
        );

        Some(Self {
            item,
            subject,
            watcher,
            registry,
            name_watches,
            type_watch,
            show_direction: presentation.properties.show_direction,
            inverted,
            head: EndEditor::new(model, localizer, End::Head, head),
            tail: EndEditor::new(model, localizer, End::Tail, tail),
        })
    }

    pub fn item(&self) -> ViewUuid {
        self.item
    }

    pub fn subject(&self) -> ModelUuid {
        self.subject
    }

    pub fn editor(&self, end: End) -> &EndEditor {
        match end {
            End::Head => &self.head,
            End::Tail => &self.tail,
        }
    }

    fn editor_mut(&mut self, end: End) -> &mut EndEditor {
        match end {
            End::Head => &mut self.head,
            End::Tail => &mut self.tail,
        }
    }

    /// Reacts to a change of the model.
    pub fn notify(
        &mut self,
        model: &mut Model,
        diagram: &mut Diagram,
        localizer: &Localizer,
        change: &Change,
        session: EditSession,
    ) -> Result<(), DiagramError> {
        let Change::Model(event) = change else {
            return Ok(());
        };
        let matched = self.registry.matching(model, change);
        if matched.iter().any(|id| self.name_watches.contains(id)) {
            for editor in [&mut self.head, &mut self.tail] {
                if editor.subject == event.element {
                    editor.update_name(model, session);
                }
            }
        }
        if matched.contains(&self.type_watch) && session == EditSession::Idle {
            for end in [End::Head, End::Tail] {
                self.editor_mut(end).update_title(model, localizer);
                let index = self.editor(end).navigation;
                self.on_end_navigability_change(model, diagram, localizer, end, index)?;
            }
        }
        Ok(())
    }

    /// Sends events caused by the page to the diagram and back to the page.
    fn propagate(
        &mut self,
        model: &mut Model,
        diagram: &mut Diagram,
        localizer: &Localizer,
        events: Vec<ModelEvent>,
    ) -> Result<(), DiagramError> {
        for event in events {
            let change = Change::Model(event);
            diagram.notify(model, &change);
            self.notify(model, diagram, localizer, &change, EditSession::Editing)?;
        }
        Ok(())
    }

    pub fn on_show_direction_change(
        &mut self,
        model: &Model,
        diagram: &mut Diagram,
        show_direction: bool,
    ) -> Result<(), DiagramError> {
        diagram.set_property(model, self.item, ItemProperty::ShowDirection(show_direction))?;
        self.show_direction = show_direction;
        Ok(())
    }

    /// Swaps head and tail of the item; the editors follow.
    pub fn on_invert_direction(
        &mut self,
        model: &Model,
        diagram: &mut Diagram,
        localizer: &Localizer,
    ) -> Result<(), DiagramError> {
        let inverted = !self.inverted;
        diagram.set_property(model, self.item, ItemProperty::Inverted(inverted))?;
        self.inverted = inverted;
        for end in [End::Head, End::Tail] {
            if let Some(subject) = recipes::association_end(model, self.subject, end, inverted) {
                *self.editor_mut(end) = EndEditor::new(model, localizer, end, subject);
            }
        }
        Ok(())
    }

    pub fn on_end_name_change(
        &mut self,
        model: &mut Model,
        diagram: &mut Diagram,
        localizer: &Localizer,
        end: End,
        text: &str,
        session: EditSession,
    ) -> Result<(), DiagramError> {
        if session == EditSession::Editing {
            return Ok(());
        }
        let editor = self.editor_mut(end);
        editor.name.text = text.to_owned();
        let events = recipes::parse_property(model, editor.subject, text)?;
        debug!(end:? = end, text = text; "Association end renamed");
        self.propagate(model, diagram, localizer, events)
    }

    /// Only ends whose opposite end has a type can change navigability.
    pub fn on_end_navigability_change(
        &mut self,
        model: &mut Model,
        diagram: &mut Diagram,
        localizer: &Localizer,
        end: End,
        index: usize,
    ) -> Result<(), DiagramError> {
        let Some(navigable) = NAVIGABILITY.get(index).copied() else {
            return Ok(());
        };
        let editor = self.editor_mut(end);
        editor.navigation = index;
        let property = editor.subject;
        let typed_opposite = model
            .opposite(property)
            .and_then(|o| model.first_related(o, Relation::Type))
            .is_some();
        if !typed_opposite {
            return Ok(());
        }
        let events = recipes::set_navigability(model, property, navigable)?;
        self.propagate(model, diagram, localizer, events)?;
        diagram.request_rebuild(self.item)
    }

    pub fn on_end_aggregation_change(
        &mut self,
        model: &mut Model,
        diagram: &mut Diagram,
        localizer: &Localizer,
        end: End,
        index: usize,
    ) -> Result<(), DiagramError> {
        let Some(kind) = AGGREGATION.get(index).copied() else {
            return Ok(());
        };
        let editor = self.editor_mut(end);
        editor.aggregation = index;
        let event =
            model.set_attribute(editor.subject, Attribute::Aggregation, Value::Aggregation(kind))?;
        self.propagate(model, diagram, localizer, vec![event])
    }

    pub fn toggle_stereotype(
        &mut self,
        model: &mut Model,
        diagram: &mut Diagram,
        localizer: &Localizer,
        end: End,
        stereotype: ModelUuid,
        active: bool,
    ) -> Result<(), DiagramError> {
        let subject = self.editor(end).subject;
        let events = if active {
            recipes::apply_stereotype(model, subject, stereotype)?.1
        } else {
            recipes::remove_stereotype(model, subject, stereotype)?
        };
        self.propagate(model, diagram, localizer, events)?;
        self.editor_mut(end).stereotypes = StereotypeModel::for_element(model, subject);
        Ok(())
    }

    /// Sets a slot value, applying the stereotype first when needed.
    pub fn set_slot_value(
        &mut self,
        model: &mut Model,
        diagram: &mut Diagram,
        localizer: &Localizer,
        end: End,
        stereotype: ModelUuid,
        attribute: ModelUuid,
        value: &str,
    ) -> Result<(), DiagramError> {
        let subject = self.editor(end).subject;
        let (instance, mut events) = recipes::apply_stereotype(model, subject, stereotype)?;
        events.extend(recipes::set_slot_value(model, instance, attribute, value)?);
        self.propagate(model, diagram, localizer, events)?;
        self.editor_mut(end).stereotypes = StereotypeModel::for_element(model, subject);
        Ok(())
    }

    /// Losing focus re-syncs the name field with the model.
    pub fn set_focus(&mut self, model: &Model, end: End, focused: bool) {
        let editor = self.editor_mut(end);
        editor.name.has_focus = focused;
        if !focused {
            editor.update_name(model, EditSession::Idle);
        }
    }

    /// Releases the page's watches, returning how many were held.
    pub fn destroy(&mut self) -> usize {
        self.registry.unsubscribe_all(self.watcher)
    }
}
