use log::info;

use super::{Layer, LayerId};
use crate::error::{Result, ViewerError};
use crate::events::EventEmitter;

#[derive(Debug, Clone, Default)]
pub struct LayerListEvents {
    /// Index the new layer landed at.
    pub added: EventEmitter<usize>,
    pub removed: EventEmitter<LayerId>,
    pub reordered: EventEmitter<()>,
}

/// Ordered layer stack, bottom first. Names are kept unique.
#[derive(Debug, Default)]
pub struct LayerList {
    layers: Vec<Box<dyn Layer>>,
    pub events: LayerListEvents,
}

impl LayerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Layer> + '_ {
        self.layers.iter().map(|layer| layer.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Layer>> + '_ {
        self.layers.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Layer> {
        self.layers.get(index).map(|layer| layer.as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Box<dyn Layer>> {
        self.layers.get_mut(index)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.base().id() == id)
    }

    pub fn by_name(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name() == name)
    }

    /// `name` if unused, otherwise `name [n]` with the smallest free `n`.
    /// Any existing ` [n]` suffix on `name` is replaced.
    pub fn coerce_name(&self, name: &str, skip: Option<LayerId>) -> String {
        let taken = |candidate: &str| {
            self.layers.iter().any(|layer| {
                Some(layer.base().id()) != skip && layer.name() == candidate
            })
        };
        if !taken(name) {
            return name.to_string();
        }
        let stem = strip_counter(name);
        (1..)
            .map(|counter| format!("{stem} [{counter}]"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    pub fn append(&mut self, layer: Box<dyn Layer>) -> usize {
        let index = self.layers.len();
        self.insert_unchecked(index, layer);
        index
    }

    pub fn insert(&mut self, index: usize, layer: Box<dyn Layer>) -> Result<()> {
        if index > self.layers.len() {
            return Err(ViewerError::LayerIndex {
                index,
                len: self.layers.len(),
            });
        }
        self.insert_unchecked(index, layer);
        Ok(())
    }

    fn insert_unchecked(&mut self, index: usize, mut layer: Box<dyn Layer>) {
        let name = self.coerce_name(layer.name(), None);
        layer.base_mut().set_name(name);
        info!("adding {} layer `{}` at {index}", layer.kind(), layer.name());
        self.layers.insert(index, layer);
        self.events.added.emit(index);
    }

    pub fn remove(&mut self, index: usize) -> Result<Box<dyn Layer>> {
        if index >= self.layers.len() {
            return Err(ViewerError::LayerIndex {
                index,
                len: self.layers.len(),
            });
        }
        let layer = self.layers.remove(index);
        info!("removed layer `{}`", layer.name());
        self.events.removed.emit(layer.base().id());
        Ok(layer)
    }

    pub fn move_layer(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.layers.len();
        for index in [from, to] {
            if index >= len {
                return Err(ViewerError::LayerIndex { index, len });
            }
        }
        if from != to {
            let layer = self.layers.remove(from);
            self.layers.insert(to, layer);
            self.events.reordered.emit(());
        }
        Ok(())
    }

    /// Renames a layer, keeping names unique.
    pub fn rename(&mut self, index: usize, name: &str) -> Result<String> {
        let id = self
            .get(index)
            .map(|layer| layer.base().id())
            .ok_or(ViewerError::LayerIndex {
                index,
                len: self.layers.len(),
            })?;
        let name = self.coerce_name(name, Some(id));
        self.layers[index].base_mut().set_name(name.clone());
        Ok(name)
    }

    pub fn selected(&self) -> Vec<usize> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.base().selected())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn unselect_all(&mut self) {
        for layer in &mut self.layers {
            layer.base_mut().set_selected(false);
        }
    }

    pub fn select_only(&mut self, index: usize) -> Result<()> {
        if index >= self.layers.len() {
            return Err(ViewerError::LayerIndex {
                index,
                len: self.layers.len(),
            });
        }
        for (position, layer) in self.layers.iter_mut().enumerate() {
            layer.base_mut().set_selected(position == index);
        }
        Ok(())
    }

    pub fn remove_selected(&mut self) -> Vec<Box<dyn Layer>> {
        let mut removed = Vec::new();
        for index in self.selected().into_iter().rev() {
            if let Ok(layer) = self.remove(index) {
                removed.push(layer);
            }
        }
        removed.reverse();
        removed
    }
}

fn strip_counter(name: &str) -> &str {
    name.rsplit_once(" [")
        .filter(|(_, counter)| {
            counter.strip_suffix(']').is_some_and(|digits| {
                !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
            })
        })
        .map_or(name, |(stem, _)| stem)
}
