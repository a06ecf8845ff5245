//! Tuples: one row of the table
//!
//! Elements are aligned with the enabled column list; values of disabled
//! columns move to a parallel list aligned with the disabled column list.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One row of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    elements: Vec<Value>,
    disabled_elements: Vec<Value>,
    /// Per-element focus flag, aligned with `elements`
    focus: Vec<bool>,
}

impl Tuple {
    pub fn new(elements: Vec<Value>) -> Self {
        let focus = vec![true; elements.len()];
        Self {
            elements,
            disabled_elements: Vec::new(),
            focus,
        }
    }

    /// Split a full-width row into enabled and disabled parts
    pub(crate) fn split(mut values: Vec<Value>, enabled_count: usize) -> Self {
        let disabled_elements = values.split_off(enabled_count.min(values.len()));
        let mut tuple = Self::new(values);
        tuple.disabled_elements = disabled_elements;
        tuple
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> Option<&Value> {
        self.elements.get(index)
    }

    /// Enabled elements followed by disabled elements
    pub fn into_elements(mut self) -> Vec<Value> {
        self.elements.append(&mut self.disabled_elements);
        self.elements
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn disabled_elements(&self) -> &[Value] {
        &self.disabled_elements
    }

    pub fn disabled_element(&self, index: usize) -> Option<&Value> {
        self.disabled_elements.get(index)
    }

    /// Whether the element at `index` lies inside its column's focus extent
    pub fn is_element_in_focus(&self, index: usize) -> bool {
        self.focus.get(index).copied().unwrap_or(false)
    }

    /// Whether every element is in focus
    pub fn is_in_focus(&self) -> bool {
        self.focus.iter().all(|&f| f)
    }

    pub(crate) fn set_element_focus(&mut self, index: usize, in_focus: bool) {
        if let Some(flag) = self.focus.get_mut(index) {
            *flag = in_focus;
        }
    }

    pub(crate) fn insert_element(&mut self, index: usize, value: Value) {
        let index = index.min(self.elements.len());
        self.elements.insert(index, value);
        self.focus.insert(index, true);
    }

    /// Move the element at `index` to the end of the disabled list
    pub(crate) fn disable_element(&mut self, index: usize) {
        if index < self.elements.len() {
            self.focus.remove(index);
            let value = self.elements.remove(index);
            self.disabled_elements.push(value);
        }
    }

    /// Move disabled element `index` to the end of the enabled list
    pub(crate) fn enable_element(&mut self, index: usize) {
        if index < self.disabled_elements.len() {
            let value = self.disabled_elements.remove(index);
            self.elements.push(value);
            self.focus.push(true);
        }
    }

    /// Reorder elements so that new position `i` holds old position `order[i]`
    pub(crate) fn permute(&mut self, order: &[usize]) {
        self.elements = order.iter().map(|&i| self.elements[i].clone()).collect();
        self.focus = order.iter().map(|&i| self.focus[i]).collect();
    }
}
