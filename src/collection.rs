//! Homogeneous result collections.
//!
//! `CommonAttributeList` treats an ordered list of structurally similar
//! elements as a single aggregate: a named field can be read from or written
//! to every element in one operation. `ResponseList` specializes it for
//! `ResponseInfo` elements and adds bulk callback resolution. `NotEmptyList`
//! is an ordinary ordered list that refuses to be iterated while empty.
//!
//! Broadcast writes are NOT transactional: a failure partway through the
//! list leaves earlier elements mutated.

use crate::field::{FieldAccess, FieldError};
use crate::response::ResponseInfo;
use serde_json::Value;
use std::ops::{Deref, DerefMut, Index, IndexMut};

/// Ordered collection of structurally similar elements with broadcast
/// named-field access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonAttributeList<T> {
    items: Vec<T>,
}

impl<T> CommonAttributeList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append one element.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Append every element of `items`, in order.
    pub fn extend<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.items.extend(items);
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Borrow the element at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Mutably borrow the element at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// Iterate the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Mutably iterate the elements in order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// View the elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// View the elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Read a value from every element through a typed accessor, in order.
    pub fn collect_with<U, F>(&self, mut read: F) -> Vec<U>
    where
        F: FnMut(&T) -> U,
    {
        let mut values = Vec::with_capacity(self.items.len());
        for item in &self.items {
            values.push(read(item));
        }
        values
    }

    /// Apply a typed mutation to every element, in order.
    pub fn apply_with<F>(&mut self, mut write: F)
    where
        F: FnMut(&mut T),
    {
        for item in &mut self.items {
            write(item);
        }
    }
}

impl<T: FieldAccess> CommonAttributeList<T> {
    /// Read the named field from every element, preserving order. Fails on
    /// the first element lacking the field.
    pub fn field_values(&self, name: &str) -> Result<Vec<Value>, FieldError> {
        self.items.iter().map(|item| item.field(name)).collect()
    }

    /// Write the named field on every element, in order. Not transactional:
    /// a mid-broadcast failure leaves earlier elements mutated.
    pub fn set_field_values(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        for item in &mut self.items {
            item.set_field(name, value.clone())?;
        }
        Ok(())
    }

    /// One broadcast write per `(name, value)` pair, in pair order. The same
    /// partial-mutation caveat as `set_field_values` applies.
    pub fn update_all<I, N>(&mut self, updates: I) -> Result<(), FieldError>
    where
        I: IntoIterator<Item = (N, Value)>,
        N: AsRef<str>,
    {
        for (name, value) in updates {
            self.set_field_values(name.as_ref(), value)?;
        }
        Ok(())
    }
}

impl<T> Default for CommonAttributeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for CommonAttributeList<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for CommonAttributeList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

impl<T> IntoIterator for CommonAttributeList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a CommonAttributeList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut CommonAttributeList<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

impl<T> Index<usize> for CommonAttributeList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> IndexMut<usize> for CommonAttributeList<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }
}

/// A list did not hold exactly one element when one was required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected exactly one element, found {len}")]
pub struct SingleItemError {
    /// The length the list actually had.
    pub len: usize,
}

/// Collection of `ResponseInfo` cells with bulk resolution.
#[derive(Debug)]
pub struct ResponseList<T, E> {
    items: CommonAttributeList<ResponseInfo<T, E>>,
}

impl<T, E> ResponseList<T, E> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self { items: CommonAttributeList::new() }
    }

    /// Borrow the sole element. Fails unless the list holds exactly one.
    pub fn single(&self) -> Result<&ResponseInfo<T, E>, SingleItemError> {
        match self.items.as_slice() {
            [only] => Ok(only),
            items => Err(SingleItemError { len: items.len() }),
        }
    }

    /// Mutably borrow the sole element. Fails unless the list holds exactly one.
    pub fn single_mut(&mut self) -> Result<&mut ResponseInfo<T, E>, SingleItemError> {
        match self.items.as_mut_slice() {
            [only] => Ok(only),
            items => Err(SingleItemError { len: items.len() }),
        }
    }

    /// Replace all contents with `values`, in order.
    pub fn set<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = ResponseInfo<T, E>>,
    {
        self.items.clear();
        self.items.extend(values);
    }

    /// Replace all contents with exactly one cell.
    pub fn set_single(&mut self, info: ResponseInfo<T, E>) {
        self.set([info]);
    }

    /// Run every element's consume-once callback, in list order, for side
    /// effect only. The first callback failure stops the sweep and
    /// propagates; elements already resolved stay resolved.
    pub fn resolve_all(&mut self) -> Result<(), E> {
        for info in self.items.iter_mut() {
            info.resolve()?;
        }
        Ok(())
    }
}

impl<T, E> Default for ResponseList<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> From<Vec<ResponseInfo<T, E>>> for ResponseList<T, E> {
    fn from(items: Vec<ResponseInfo<T, E>>) -> Self {
        Self { items: items.into() }
    }
}

impl<T, E> Deref for ResponseList<T, E> {
    type Target = CommonAttributeList<ResponseInfo<T, E>>;

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<T, E> DerefMut for ResponseList<T, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.items
    }
}

/// Ordered list that refuses to be iterated while empty.
///
/// Mutation is unrestricted; the invariant is enforced only when iteration
/// begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotEmptyList<T> {
    items: Vec<T>,
}

impl<T> NotEmptyList<T> {
    /// Create an empty list. Populate it before iterating.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append one element.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Append every element of `items`, in order.
    pub fn extend<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.items.extend(items);
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Borrow the element at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// View the elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate the elements in order.
    ///
    /// # Panics
    ///
    /// Panics if the list is empty when iteration begins.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        assert!(!self.items.is_empty(), "NotEmptyList must not be iterated while empty");
        self.items.iter()
    }

    /// Mutably iterate the elements in order.
    ///
    /// # Panics
    ///
    /// Panics if the list is empty when iteration begins.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        assert!(!self.items.is_empty(), "NotEmptyList must not be iterated while empty");
        self.items.iter_mut()
    }
}

impl<T> Default for NotEmptyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for NotEmptyList<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> IntoIterator for NotEmptyList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    /// # Panics
    ///
    /// Panics if the list is empty when iteration begins.
    fn into_iter(self) -> Self::IntoIter {
        assert!(!self.items.is_empty(), "NotEmptyList must not be iterated while empty");
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a NotEmptyList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    /// # Panics
    ///
    /// Panics if the list is empty when iteration begins.
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for NotEmptyList<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.items == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn cell_with_data(value: u64) -> ResponseInfo<String, Infallible> {
        ResponseInfo::builder().extra("data", json!(value)).build()
    }

    #[test]
    fn broadcast_read_preserves_element_order() {
        let mut list = CommonAttributeList::new();
        for value in 0..5u64 {
            list.push(cell_with_data(value));
        }

        let values = list.field_values("data").unwrap();
        assert_eq!(values, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn broadcast_read_fails_when_an_element_lacks_the_field() {
        let mut list = CommonAttributeList::new();
        list.push(cell_with_data(1));
        list.push(ResponseInfo::<String, Infallible>::builder().build());

        assert_eq!(list.field_values("data").unwrap_err(), FieldError::missing("data"));
    }

    #[test]
    fn broadcast_write_then_read_round_trips() {
        let mut list = CommonAttributeList::new();
        for value in 0..4u64 {
            list.push(cell_with_data(value));
        }

        list.set_field_values("data", json!("same everywhere")).unwrap();

        let values = list.field_values("data").unwrap();
        assert_eq!(values, vec![json!("same everywhere"); 4]);
    }

    #[test]
    fn update_all_broadcasts_each_pair_in_order() {
        let mut list = CommonAttributeList::new();
        for value in 0..3u64 {
            list.push(cell_with_data(value));
        }

        list.update_all([("data", json!("first")), ("data2", json!("second"))]).unwrap();

        assert_eq!(list.field_values("data").unwrap(), vec![json!("first"); 3]);
        assert_eq!(list.field_values("data2").unwrap(), vec![json!("second"); 3]);
    }

    /// Element whose `value` field rejects writes while locked.
    struct Gauge {
        value: i64,
        locked: bool,
    }

    impl FieldAccess for Gauge {
        fn field(&self, name: &str) -> Result<Value, FieldError> {
            match name {
                "value" => Ok(json!(self.value)),
                other => Err(FieldError::missing(other)),
            }
        }

        fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
            match name {
                "value" if self.locked => Err(FieldError::invalid(name, "gauge is locked")),
                "value" => {
                    self.value = value
                        .as_i64()
                        .ok_or_else(|| FieldError::invalid(name, "expected an integer"))?;
                    Ok(())
                }
                other => Err(FieldError::missing(other)),
            }
        }
    }

    #[test]
    fn broadcast_write_failure_leaves_earlier_elements_mutated() {
        let mut list: CommonAttributeList<Gauge> = vec![
            Gauge { value: 0, locked: false },
            Gauge { value: 0, locked: true },
            Gauge { value: 0, locked: false },
        ]
        .into();

        let err = list.set_field_values("value", json!(9)).unwrap_err();
        assert!(matches!(err, FieldError::Invalid { .. }));

        // Not transactional: the element before the failure was written, the
        // one after was not.
        assert_eq!(list[0].value, 9);
        assert_eq!(list[1].value, 0);
        assert_eq!(list[2].value, 0);
    }

    #[test]
    fn typed_accessors_mirror_the_broadcast_operations() {
        let mut list: CommonAttributeList<Gauge> = vec![
            Gauge { value: 1, locked: false },
            Gauge { value: 2, locked: false },
        ]
        .into();

        assert_eq!(list.collect_with(|g| g.value), vec![1, 2]);

        list.apply_with(|g| g.value *= 10);
        assert_eq!(list.collect_with(|g| g.value), vec![10, 20]);
    }

    #[test]
    fn single_requires_exactly_one_element() {
        let mut list: ResponseList<String, Infallible> = ResponseList::new();
        assert_eq!(list.single().unwrap_err(), SingleItemError { len: 0 });

        list.push(ResponseInfo::from_response("only".to_string()));
        assert_eq!(list.single().unwrap().response().unwrap(), "only");

        list.push(ResponseInfo::from_response("second".to_string()));
        assert_eq!(list.single().unwrap_err(), SingleItemError { len: 2 });
    }

    #[test]
    fn set_replaces_all_contents() {
        let mut list: ResponseList<String, Infallible> = ResponseList::new();
        list.extend((0..4).map(|i| ResponseInfo::from_response(i.to_string())));
        assert_eq!(list.len(), 4);

        list.set([]);
        assert_eq!(list.len(), 0);

        list.set([
            ResponseInfo::from_response("a".to_string()),
            ResponseInfo::from_response("b".to_string()),
        ]);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].response().unwrap(), "a");
        assert_eq!(list[1].response().unwrap(), "b");
    }

    #[test]
    fn set_single_leaves_one_element() {
        let mut list: ResponseList<String, Infallible> = ResponseList::new();
        list.extend((0..3).map(|i| ResponseInfo::from_response(i.to_string())));

        list.set_single(ResponseInfo::builder().response("fresh".to_string()).build());

        assert_eq!(list.len(), 1);
        assert_eq!(list.single().unwrap().response().unwrap(), "fresh");
    }

    #[test]
    fn resolve_all_runs_every_callback_in_order() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let count = 5;

        let mut list: ResponseList<String, Infallible> = ResponseList::new();
        list.extend((0..count).map(|_| {
            let invocations = invocations.clone();
            ResponseInfo::from_callback(move || {
                invocations.fetch_add(1, Ordering::SeqCst);
                Ok("resolved".to_string())
            })
        }));

        list.resolve_all().unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), count);

        // Consume-once: resolving again runs nothing.
        list.resolve_all().unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), count);
    }

    #[test]
    #[should_panic(expected = "iterated while empty")]
    fn empty_not_empty_list_panics_on_iteration() {
        let list: NotEmptyList<u32> = NotEmptyList::new();
        for _ in &list {
            unreachable!("no elements to visit");
        }
    }

    #[test]
    fn populated_not_empty_list_iterates_normally() {
        let count = 7;
        let mut list = NotEmptyList::new();
        list.extend(0..count);

        let visited: Vec<u32> = list.iter().copied().collect();
        assert_eq!(visited, (0..count).collect::<Vec<_>>());
        assert_eq!(list, (0..count).collect::<Vec<_>>());
    }

    #[test]
    fn not_empty_list_mutation_is_unrestricted_while_empty() {
        let mut list = NotEmptyList::new();
        assert!(list.is_empty());

        // Empty-then-populated-then-iterated succeeds.
        list.push(1);
        list.extend([2, 3]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
