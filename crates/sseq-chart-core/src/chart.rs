use crate::chart_class::{ChartClass, ChartClassArgs};
use crate::chart_edge::{ChartEdge, EdgeArgs};
use crate::config::ChartSettings;
use crate::events::{ChartEvent, ObserverId, Observers};
use crate::message::{ChartEntity, Command, Message, TargetType};
use crate::page_property::{Page, PageRange};
use crate::stringifying_map::StringifyingMap;
use crate::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

/// A class or an edge, looked up through the shared object namespace.
#[derive(Debug, Clone, Copy)]
pub enum ObjectRef<'a> {
    Class(&'a ChartClass),
    Edge(&'a ChartEdge),
}

impl ObjectRef<'_> {
    pub fn target_type(&self) -> TargetType {
        match self {
            ObjectRef::Class(_) => TargetType::ChartClass,
            ObjectRef::Edge(e) => e.target_type(),
        }
    }
}

/// Classes and edges selected for display by [`SseqChart::elements_to_draw`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawSet {
    pub classes: Vec<Uuid>,
    pub edges: Vec<Uuid>,
}

/// The chart: owns every class and edge and keeps the indexes over them consistent.
///
/// Classes and edges share one uuid namespace. A uuid that has been deleted is never accepted
/// again until the chart is cleared.
#[derive(Debug)]
pub struct SseqChart {
    uuid: Uuid,
    settings: ChartSettings,
    initial_settings: ChartSettings,
    classes: IndexMap<Uuid, ChartClass>,
    edges: IndexMap<Uuid, ChartEdge>,
    /// Class uuid to the uuids of the edges touching it.
    incidence: FxHashMap<Uuid, IndexSet<Uuid>>,
    retired: FxHashSet<Uuid>,
    /// Insertion order is idx order. Entries are not removed when a class is deleted.
    classes_by_degree: StringifyingMap<Vec<i32>, Vec<Uuid>>,
    observers: Observers,
}

impl Default for SseqChart {
    fn default() -> Self {
        Self::new("", 2)
    }
}

fn parse_fields<T: DeserializeOwned + Default>(fields: &Value) -> Result<T> {
    if fields.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(fields.clone())?)
}

impl SseqChart {
    pub fn new(name: impl Into<String>, num_gradings: usize) -> Self {
        let settings = ChartSettings::new(name, num_gradings);
        Self {
            uuid: Uuid::new_v4(),
            initial_settings: settings.clone(),
            settings,
            classes: IndexMap::new(),
            edges: IndexMap::new(),
            incidence: FxHashMap::default(),
            retired: FxHashSet::default(),
            classes_by_degree: StringifyingMap::new(),
            observers: Observers::default(),
        }
    }

    pub fn from_settings(settings: ChartSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            initial_settings: settings.clone(),
            settings,
            ..Self::default()
        })
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn num_gradings(&self) -> usize {
        self.settings.num_gradings
    }

    pub fn page_list(&self) -> &[PageRange] {
        &self.settings.page_list
    }

    pub fn classes(&self) -> impl ExactSizeIterator<Item = &ChartClass> {
        self.classes.values()
    }

    pub fn edges(&self) -> impl ExactSizeIterator<Item = &ChartEdge> {
        self.edges.values()
    }

    pub fn class(&self, uuid: Uuid) -> Option<&ChartClass> {
        self.classes.get(&uuid)
    }

    /// Mutable access for cosmetic changes. Identity fields stay private to the class.
    pub fn class_mut(&mut self, uuid: Uuid) -> Option<&mut ChartClass> {
        self.classes.get_mut(&uuid)
    }

    pub fn edge(&self, uuid: Uuid) -> Option<&ChartEdge> {
        self.edges.get(&uuid)
    }

    pub fn object(&self, uuid: Uuid) -> Option<ObjectRef<'_>> {
        if let Some(c) = self.classes.get(&uuid) {
            return Some(ObjectRef::Class(c));
        }
        self.edges.get(&uuid).map(ObjectRef::Edge)
    }

    pub fn object_type(&self, uuid: Uuid) -> Option<TargetType> {
        self.object(uuid).map(|o| o.target_type())
    }

    pub fn contains(&self, uuid: Uuid) -> bool {
        self.classes.contains_key(&uuid) || self.edges.contains_key(&uuid)
    }

    /// Edges with `uuid` as source or target, in commit order.
    pub fn edges_of_class(&self, uuid: Uuid) -> impl Iterator<Item = &ChartEdge> {
        self.incidence
            .get(&uuid)
            .into_iter()
            .flatten()
            .filter_map(|e| self.edges.get(e))
    }

    fn check_arity(&self, degree: &[i32]) -> Result<()> {
        if degree.len() != self.settings.num_gradings {
            return Err(Error::DegreeArity {
                degree: degree.to_vec(),
                num_gradings: self.settings.num_gradings,
            });
        }
        Ok(())
    }

    fn check_fresh(&self, uuid: Uuid) -> Result<()> {
        if self.contains(uuid) || self.retired.contains(&uuid) {
            return Err(Error::DuplicateObject { uuid });
        }
        Ok(())
    }

    /// The uuids of the classes committed at `degree`, in idx order. Empty if none ever were.
    ///
    /// Deleted classes keep their slot, so an entry may no longer resolve to a class.
    pub fn classes_in_degree(&self, degree: &[i32]) -> Result<&[Uuid]> {
        self.check_arity(degree)?;
        Ok(self
            .classes_by_degree
            .get(degree)
            .map_or(&[][..], Vec::as_slice))
    }

    pub(crate) fn degree_bucket_len(&self, degree: &[i32]) -> usize {
        self.classes_by_degree.get(degree).map_or(0, Vec::len)
    }

    pub fn class_by_index(&self, degree: &[i32], idx: usize) -> Result<&ChartClass> {
        let bucket = self.classes_in_degree(degree)?;
        let Some(&uuid) = bucket.get(idx) else {
            return Err(Error::IndexOutOfRange {
                degree: degree.to_vec(),
                idx,
            });
        };
        self.classes.get(&uuid).ok_or(Error::UnknownClass { uuid })
    }

    pub fn class_tooltip(&self, uuid: Uuid, page: Page) -> Result<String> {
        self.classes
            .get(&uuid)
            .map(|c| c.tooltip(page))
            .ok_or(Error::UnknownClass { uuid })
    }

    /// Registers a constructed class: checks its degree, places it and indexes it.
    ///
    /// Nothing is modified when an error is returned.
    pub fn commit_class(&mut self, mut class: ChartClass) -> Result<Uuid> {
        self.check_arity(class.degree())?;
        let uuid = class.uuid();
        self.check_fresh(uuid)?;

        let (x, y) = self.settings.project(class.degree());
        let bucket = self
            .classes_by_degree
            .get_or_insert_with(class.degree().to_vec(), Vec::new);
        let idx = class.idx().unwrap_or(bucket.len());
        bucket.push(uuid);
        class.place(idx, x, y);
        tracing::debug!(%uuid, degree = ?class.degree(), idx, "committed class");
        self.classes.insert(uuid, class);
        Ok(uuid)
    }

    /// Registers a constructed edge. Both endpoints must be classes of this chart.
    pub fn commit_edge(&mut self, edge: ChartEdge) -> Result<Uuid> {
        let uuid = edge.uuid();
        self.check_fresh(uuid)?;
        for end in [edge.source_uuid(), edge.target_uuid()] {
            if !self.classes.contains_key(&end) {
                return Err(Error::UnknownClass { uuid: end });
            }
        }
        for end in [edge.source_uuid(), edge.target_uuid()] {
            self.incidence.entry(end).or_default().insert(uuid);
        }
        tracing::debug!(
            %uuid,
            target_type = %edge.target_type(),
            source = %edge.source_uuid(),
            target = %edge.target_uuid(),
            "committed edge"
        );
        self.edges.insert(uuid, edge);
        Ok(uuid)
    }

    pub fn add_class(&mut self, args: ChartClassArgs) -> Result<Uuid> {
        let uuid = self.commit_class(ChartClass::new(args)?)?;
        self.emit(ChartEvent::ClassAdded(uuid));
        self.emit(ChartEvent::Update);
        Ok(uuid)
    }

    pub fn add_structline(&mut self, args: EdgeArgs) -> Result<Uuid> {
        self.add_edge(ChartEdge::structline(args)?)
    }

    pub fn add_differential(&mut self, args: EdgeArgs) -> Result<Uuid> {
        self.add_edge(ChartEdge::differential(args)?)
    }

    /// Adds a differential and records its page as a page range. Both endpoints stop being
    /// drawn after that page.
    pub fn add_differential_auto(&mut self, args: EdgeArgs) -> Result<Uuid> {
        let edge = ChartEdge::differential(args)?;
        let page = edge.page();
        let (source, target) = (edge.source_uuid(), edge.target_uuid());
        let uuid = self.commit_edge(edge)?;
        if let Some(page) = page {
            for end in [source, target] {
                if let Some(class) = self.classes.get_mut(&end) {
                    class.max_page = page;
                }
            }
            self.insert_page_range([page, page]);
        }
        self.emit_edge_added(uuid, TargetType::ChartDifferential);
        self.emit(ChartEvent::Update);
        Ok(uuid)
    }

    pub fn add_extension(&mut self, args: EdgeArgs) -> Result<Uuid> {
        self.add_edge(ChartEdge::extension(args)?)
    }

    fn add_edge(&mut self, edge: ChartEdge) -> Result<Uuid> {
        let target_type = edge.target_type();
        let uuid = self.commit_edge(edge)?;
        self.emit_edge_added(uuid, target_type);
        self.emit(ChartEvent::Update);
        Ok(uuid)
    }

    fn emit_edge_added(&mut self, uuid: Uuid, target_type: TargetType) {
        let event = match target_type {
            TargetType::ChartStructline => ChartEvent::StructlineAdded(uuid),
            TargetType::ChartDifferential => ChartEvent::DifferentialAdded(uuid),
            TargetType::ChartExtension => ChartEvent::ExtensionAdded(uuid),
            TargetType::ChartClass | TargetType::SseqChart => return,
        };
        self.emit(event);
        self.emit(ChartEvent::EdgeAdded(uuid));
    }

    /// Inserts `range` into the page list before the first range with a larger start.
    ///
    /// Returns the insertion index, or `None` when the range is already listed.
    pub fn add_page_range(&mut self, range: PageRange) -> Option<usize> {
        let idx = self.insert_page_range(range)?;
        self.emit(ChartEvent::ChartUpdated);
        self.emit(ChartEvent::Update);
        Some(idx)
    }

    fn insert_page_range(&mut self, range: PageRange) -> Option<usize> {
        let page_list = &mut self.settings.page_list;
        if page_list.contains(&range) {
            return None;
        }
        let idx = page_list
            .iter()
            .position(|p| p[0] > range[0])
            .unwrap_or(page_list.len());
        page_list.insert(idx, range);
        Some(idx)
    }

    /// Deletes a class together with every edge touching it.
    pub fn delete_class(&mut self, uuid: Uuid) -> Result<ChartClass> {
        let class = self.remove_class(uuid)?;
        self.emit(ChartEvent::Update);
        Ok(class)
    }

    pub fn delete_edge(&mut self, uuid: Uuid) -> Result<ChartEdge> {
        let Some(edge) = self.detach_edge(uuid) else {
            return Err(Error::UnknownObject {
                command: "delete",
                uuid,
            });
        };
        self.emit(ChartEvent::ObjectDeleted {
            uuid,
            target_type: edge.target_type(),
        });
        self.emit(ChartEvent::Update);
        Ok(edge)
    }

    fn remove_class(&mut self, uuid: Uuid) -> Result<ChartClass> {
        let Some(class) = self.classes.shift_remove(&uuid) else {
            return Err(Error::UnknownObject {
                command: "delete",
                uuid,
            });
        };
        for edge_uuid in self.incidence.remove(&uuid).unwrap_or_default() {
            if let Some(edge) = self.detach_edge(edge_uuid) {
                self.emit(ChartEvent::ObjectDeleted {
                    uuid: edge_uuid,
                    target_type: edge.target_type(),
                });
            }
        }
        self.retired.insert(uuid);
        tracing::debug!(%uuid, "deleted class");
        self.emit(ChartEvent::ObjectDeleted {
            uuid,
            target_type: TargetType::ChartClass,
        });
        Ok(class)
    }

    fn detach_edge(&mut self, uuid: Uuid) -> Option<ChartEdge> {
        let edge = self.edges.shift_remove(&uuid)?;
        for end in [edge.source_uuid(), edge.target_uuid()] {
            if let Some(incident) = self.incidence.get_mut(&end) {
                incident.shift_remove(&uuid);
            }
        }
        self.retired.insert(uuid);
        tracing::debug!(%uuid, target_type = %edge.target_type(), "deleted edge");
        Some(edge)
    }

    /// Shallow assignment of global fields: ranges, page list, projections, name.
    ///
    /// `num_gradings` cannot change once classes may have been placed with it.
    pub fn update_settings(&mut self, fields: &Value) -> Result<()> {
        self.assign_settings(fields)?;
        self.emit(ChartEvent::ChartUpdated);
        self.emit(ChartEvent::Update);
        Ok(())
    }

    fn assign_settings(&mut self, fields: &Value) -> Result<()> {
        let Value::Object(fields) = fields else {
            return Err(Error::MissingPayload {
                command: "update",
                field: "target_fields",
            });
        };
        if let Some(uuid) = fields.get("uuid") {
            if serde_json::from_value::<Uuid>(uuid.clone())? != self.uuid {
                return Err(Error::Inconsistent {
                    uuid: self.uuid,
                    field: "uuid",
                });
            }
        }
        if let Some(n) = fields.get("num_gradings") {
            if n.as_u64() != Some(self.settings.num_gradings as u64) {
                return Err(Error::Inconsistent {
                    uuid: self.uuid,
                    field: "num_gradings",
                });
            }
        }
        let next = self.settings.overlay(fields)?;
        tracing::debug!(uuid = %self.uuid, "updated chart settings");
        self.settings = next;
        Ok(())
    }

    fn check_target(
        &self,
        command: &'static str,
        claimed: TargetType,
        uuid: Uuid,
    ) -> Result<()> {
        let Some(actual) = self.object_type(uuid) else {
            return Err(Error::UnknownObject { command, uuid });
        };
        if actual != claimed {
            return Err(Error::TypeMismatch {
                command,
                claimed,
                actual,
            });
        }
        Ok(())
    }

    /// Applies one protocol message.
    ///
    /// Errors leave earlier messages committed; there is no rollback across messages.
    pub fn handle_message(&mut self, message: &Message) -> Result<()> {
        match &message.command {
            Command::Create(ChartEntity::Class(class)) => {
                let uuid = self.commit_class(class.clone())?;
                self.emit(ChartEvent::ClassAdded(uuid));
            }
            Command::Create(ChartEntity::Edge(edge)) => {
                let uuid = self.commit_edge(edge.clone())?;
                self.emit_edge_added(uuid, edge.target_type());
            }
            Command::UpdateChart(fields)
            | Command::Update {
                target_type: TargetType::SseqChart,
                fields,
                ..
            } => {
                self.assign_settings(fields)?;
                self.emit(ChartEvent::ChartUpdated);
            }
            Command::Update {
                target_type,
                target_uuid,
                fields,
            } => {
                let uuid = *target_uuid;
                self.check_target("update", *target_type, uuid)?;
                if let Some(class) = self.classes.get_mut(&uuid) {
                    class.update(parse_fields(fields)?)?;
                } else if let Some(edge) = self.edges.get_mut(&uuid) {
                    edge.update(parse_fields(fields)?)?;
                }
                tracing::debug!(%uuid, target_type = %target_type, "updated object");
                self.emit(ChartEvent::ObjectUpdated {
                    uuid,
                    target_type: *target_type,
                });
            }
            Command::Delete {
                target_type: TargetType::SseqChart,
                ..
            } => {
                return Err(Error::UnsupportedCommand {
                    command: "delete",
                    target_type: TargetType::SseqChart,
                });
            }
            Command::Delete {
                target_type,
                target_uuid,
            } => {
                let uuid = *target_uuid;
                self.check_target("delete", *target_type, uuid)?;
                if *target_type == TargetType::ChartClass {
                    self.remove_class(uuid)?;
                } else if let Some(edge) = self.detach_edge(uuid) {
                    self.emit(ChartEvent::ObjectDeleted {
                        uuid,
                        target_type: edge.target_type(),
                    });
                }
            }
        }
        self.emit(ChartEvent::Update);
        Ok(())
    }

    /// Selects what to draw for `range` inside the viewport.
    ///
    /// Classes must be drawn on the first page of the range and lie in the viewport. Edges must
    /// be drawn on the range with both endpoints drawn and at least one endpoint in the
    /// viewport; the other endpoint is then selected as well.
    pub fn elements_to_draw(
        &self,
        range: PageRange,
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
    ) -> DrawSet {
        let page = range[0];
        let mut draw = DrawSet::default();
        let mut selected = FxHashSet::default();
        for class in self.classes.values() {
            if class.in_range_q(xmin, xmax, ymin, ymax) && class.draw_on_page_q(page) {
                selected.insert(class.uuid());
                draw.classes.push(class.uuid());
            }
        }

        let drawn = |uuid: Uuid| self.class(uuid).is_some_and(|c| c.draw_on_page_q(page));
        for edge in self.edges.values() {
            let (source, target) = (edge.source_uuid(), edge.target_uuid());
            if edge.draw_on_page_q(self, range)
                && drawn(source)
                && drawn(target)
                && (selected.contains(&source) || selected.contains(&target))
            {
                draw.edges.push(edge.uuid());
            }
        }
        for &edge_uuid in &draw.edges {
            let Some(edge) = self.edges.get(&edge_uuid) else {
                continue;
            };
            for end in [edge.source_uuid(), edge.target_uuid()] {
                if selected.insert(end) {
                    draw.classes.push(end);
                }
            }
        }
        draw
    }

    /// Removes every class and edge and restores the settings the chart was created with.
    ///
    /// Observers stay registered. Deleted uuids become usable again.
    pub fn clear(&mut self) {
        self.classes.clear();
        self.edges.clear();
        self.incidence.clear();
        self.retired.clear();
        self.classes_by_degree.clear();
        self.settings = self.initial_settings.clone();
        tracing::debug!(uuid = %self.uuid, "cleared chart");
        self.emit(ChartEvent::Cleared);
        self.emit(ChartEvent::Update);
    }

    pub fn on_event(
        &mut self,
        observer: impl FnMut(&SseqChart, &ChartEvent) + 'static,
    ) -> ObserverId {
        self.observers.insert(Box::new(observer))
    }

    pub fn off_event(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    fn emit(&mut self, event: ChartEvent) {
        if self.observers.is_empty() {
            return;
        }
        let mut observers = std::mem::take(&mut self.observers);
        observers.notify(self, &event);
        self.observers = observers;
    }
}
