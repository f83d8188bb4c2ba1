use serde_json::Value;

use schema::Table;

/// A single item pulled from a [`Resource`]: either a scalar value or a list of values, the
/// latter expanded into one item per element before table-name/table-schema hints run, per
/// spec.md §4.D step 3 ("evaluating it per item, expanding lists").
#[derive(Debug, Clone)]
pub enum ResourceItem {
    Scalar(Value),
    List(Vec<Value>),
}

impl ResourceItem {
    /// Expands a list into its elements; a scalar expands to itself.
    pub(crate) fn into_scalars(self) -> Vec<Value> {
        match self {
            ResourceItem::Scalar(v) => vec![v],
            ResourceItem::List(items) => items,
        }
    }
}

type TableNameHint = Box<dyn Fn(&Value) -> String + Send + Sync>;
type TableSchemaHint = Box<dyn Fn(&Value) -> Table + Send + Sync>;

/// A user-declared resource: a name (used as the static table name absent a dynamic hint), the
/// schema it writes under, a pull iterator of items, and optional dynamic table-name/table-shape
/// hint closures evaluated per item.
pub struct Resource {
    name: String,
    schema_name: String,
    items: Box<dyn Iterator<Item = Result<ResourceItem, String>> + Send>,
    table_name_hint: Option<TableNameHint>,
    table_schema_hint: Option<TableSchemaHint>,
}

impl Resource {
    /// Builds a resource with a static table name equal to `name`, pulling items from `items`.
    pub fn new(
        name: impl Into<String>,
        schema_name: impl Into<String>,
        items: impl Iterator<Item = Result<ResourceItem, String>> + Send + 'static,
    ) -> Self {
        Resource {
            name: name.into(),
            schema_name: schema_name.into(),
            items: Box::new(items),
            table_name_hint: None,
            table_schema_hint: None,
        }
    }

    /// Convenience constructor over plain JSON scalars (no resource ever fails).
    pub fn from_values(
        name: impl Into<String>,
        schema_name: impl Into<String>,
        values: impl IntoIterator<Item = Value, IntoIter: Send + 'static>,
    ) -> Self {
        Resource::new(
            name,
            schema_name,
            values.into_iter().map(|v| Ok(ResourceItem::Scalar(v))),
        )
    }

    /// Attaches a dynamic table-name hint, evaluated once per (post-list-expansion) item. When
    /// present this replaces the resource's static `name` as the routing key.
    pub fn with_table_name_hint(
        mut self,
        hint: impl Fn(&Value) -> String + Send + Sync + 'static,
    ) -> Self {
        self.table_name_hint = Some(Box::new(hint));
        self
    }

    /// Attaches a dynamic table-schema hint: given an item, returns the column delta that item
    /// implies. Resources without this hint contribute only a bare, column-less table entry to
    /// the dynamic-tables map (inserted once, left alone on subsequent items).
    pub fn with_table_schema_hint(
        mut self,
        hint: impl Fn(&Value) -> Table + Send + Sync + 'static,
    ) -> Self {
        self.table_schema_hint = Some(Box::new(hint));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub(crate) fn table_name_for(&self, item: &Value) -> String {
        match &self.table_name_hint {
            Some(hint) => hint(item),
            None => self.name.clone(),
        }
    }

    pub(crate) fn table_delta_for(&self, table_name: &str, item: &Value) -> Option<Table> {
        self.table_schema_hint.as_ref().map(|hint| {
            let mut delta = hint(item);
            delta.name = table_name.to_string();
            delta
        })
    }

    /// Whether this resource declares any dynamic hint -- a table-name hint, a table-schema
    /// hint, or both. A resource with neither routes under its static `name` and contributes
    /// nothing to the dynamic-tables map (spec.md §4.D / §8 scenario 5: a plain static-name
    /// resource's returned dynamic-tables map is empty).
    pub(crate) fn is_dynamic(&self) -> bool {
        self.table_name_hint.is_some() || self.table_schema_hint.is_some()
    }

    pub(crate) fn next_item(&mut self) -> Option<Result<ResourceItem, String>> {
        self.items.next()
    }
}

/// An ordered collection of [`Resource`]s. Order among resources is unspecified once pulled
/// (see [`crate::pipe::PipeIterator`]); order within a resource is preserved.
#[derive(Default)]
pub struct Source {
    resources: Vec<Resource>,
}

impl Source {
    pub fn new() -> Self {
        Source::default()
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub(crate) fn into_resources(self) -> Vec<Resource> {
        self.resources
    }
}

impl FromIterator<Resource> for Source {
    fn from_iter<T: IntoIterator<Item = Resource>>(iter: T) -> Self {
        Source {
            resources: iter.into_iter().collect(),
        }
    }
}
