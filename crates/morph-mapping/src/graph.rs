//! Reading and writing object graphs through cached accessors.
//!
//! [`ObjectGraphReader`] only implements [`GraphRead`], so writing through a
//! read-only graph does not compile.

use std::slice;

use morph_core::{ContainerKind, FromValue, Record, Value};

use crate::accessor::{FieldAccessor, Segment};
use crate::error::MappingError;

pub trait GraphRead {
    fn root(&self) -> &Record;

    /// True if every container above the final field is present.
    fn check_path(&self, accessor: &FieldAccessor) -> bool {
        parent_record(self.root(), accessor.segments()).is_some()
    }

    /// The value at the path; `None` if a container above it is absent.
    fn read_value(&self, accessor: &FieldAccessor) -> Option<&Value> {
        let (last, _) = accessor.segments().split_last()?;
        parent_record(self.root(), accessor.segments())?.slot(last.slot)
    }

    /// Elements of the collection at the path, yielded lazily.
    fn elements(&self, accessor: &FieldAccessor) -> Option<slice::Iter<'_, Value>> {
        self.read_value(accessor)?.elements().map(<[Value]>::iter)
    }

    /// Typed read. Absent containers and null values read as `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::ValueType`] if the value is not a `T`.
    fn read<T: FromValue>(&self, accessor: &FieldAccessor) -> Result<Option<T>, MappingError>
    where
        Self: Sized,
    {
        match self.read_value(accessor) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_value(value)
                .map(Some)
                .ok_or_else(|| MappingError::ValueType {
                    path: accessor.path().to_string(),
                    expected: T::TYPE_NAME,
                }),
        }
    }
}

pub trait GraphWrite: GraphRead {
    fn root_mut(&mut self) -> &mut Record;

    /// Same as [`GraphRead::check_path`], named for the destination side.
    fn check_container(&self, accessor: &FieldAccessor) -> bool {
        self.check_path(accessor)
    }

    /// Instantiate every missing container above the final field.
    ///
    /// Present containers are left alone. Returns false if a missing container
    /// cannot be created (read-only field, non-object value in the way).
    fn create_container(&mut self, accessor: &FieldAccessor) -> bool {
        create_parents(self.root_mut(), accessor.segments()).is_some()
    }

    /// Store `value` at the path. Returns false if a container is absent.
    fn write_value(&mut self, accessor: &FieldAccessor, value: Value) -> bool {
        write_leaf(self.root_mut(), accessor.segments(), value)
    }

    /// The value at the path, in place; `None` if a container is absent.
    fn value_mut(&mut self, accessor: &FieldAccessor) -> Option<&mut Value> {
        let (last, _) = accessor.segments().split_last()?;
        parent_record_mut(self.root_mut(), accessor.segments())?.slot_mut(last.slot)
    }

    fn write<T: Into<Value>>(&mut self, accessor: &FieldAccessor, value: T) -> bool
    where
        Self: Sized,
    {
        self.write_value(accessor, value.into())
    }

    /// Open a staging buffer for the collection at the path. Nothing is
    /// written until [`CollectionStream::commit`].
    fn stream<'a>(
        &'a mut self,
        accessor: &'a FieldAccessor,
        kind: ContainerKind,
    ) -> CollectionStream<'a> {
        CollectionStream {
            root: self.root_mut(),
            accessor,
            kind,
            items: Vec::new(),
        }
    }
}

/// Staged elements of a destination collection.
pub struct CollectionStream<'a> {
    root: &'a mut Record,
    accessor: &'a FieldAccessor,
    kind: ContainerKind,
    items: Vec<Value>,
}

impl CollectionStream<'_> {
    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Write the staged elements as one freshly allocated container.
    pub fn commit(self) -> bool {
        let value = Value::collection(self.kind, self.items);
        write_leaf(self.root, self.accessor.segments(), value)
    }
}

/// Read-only view of a graph.
#[derive(Debug, Clone, Copy)]
pub struct ObjectGraphReader<'a> {
    root: &'a Record,
}

impl<'a> ObjectGraphReader<'a> {
    #[must_use]
    pub const fn new(root: &'a Record) -> Self {
        Self { root }
    }
}

impl GraphRead for ObjectGraphReader<'_> {
    fn root(&self) -> &Record {
        self.root
    }
}

/// Read-write view of a graph.
#[derive(Debug)]
pub struct ObjectGraphReaderWriter<'a> {
    root: &'a mut Record,
}

impl<'a> ObjectGraphReaderWriter<'a> {
    pub const fn new(root: &'a mut Record) -> Self {
        Self { root }
    }
}

impl GraphRead for ObjectGraphReaderWriter<'_> {
    fn root(&self) -> &Record {
        self.root
    }
}

impl GraphWrite for ObjectGraphReaderWriter<'_> {
    fn root_mut(&mut self) -> &mut Record {
        self.root
    }
}

fn parent_record<'a>(root: &'a Record, segments: &[Segment]) -> Option<&'a Record> {
    let (_, parents) = segments.split_last()?;
    parents
        .iter()
        .try_fold(root, |record, segment| record.slot(segment.slot)?.as_record())
}

fn parent_record_mut<'a>(root: &'a mut Record, segments: &[Segment]) -> Option<&'a mut Record> {
    let (_, parents) = segments.split_last()?;
    parents.iter().try_fold(root, |record, segment| {
        record.slot_mut(segment.slot)?.as_record_mut()
    })
}

fn create_parents(root: &mut Record, segments: &[Segment]) -> Option<()> {
    let (_, parents) = segments.split_last()?;
    let mut record = root;
    for segment in parents {
        let slot = record.slot_mut(segment.slot)?;
        if slot.is_null() {
            if !segment.can_write {
                return None;
            }
            *slot = Value::Object(Record::new(segment.model.as_ref()?));
        }
        record = slot.as_record_mut()?;
    }
    Some(())
}

fn write_leaf(root: &mut Record, segments: &[Segment], value: Value) -> bool {
    let Some((last, _)) = segments.split_last() else {
        return false;
    };
    parent_record_mut(root, segments)
        .and_then(|parent| parent.slot_mut(last.slot))
        .map(|slot| *slot = value)
        .is_some()
}
