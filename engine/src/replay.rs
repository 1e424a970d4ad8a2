//! Replay store: the latest zoom-invariant message per type and view.
//!
//! Cursor and selection positions arrive once and are not resent by the
//! kernel when the client zooms. The store keeps the last message of each
//! registered type so the dispatcher can re-run them after a zoom or layout
//! change and rebuild pixel geometry from twips.
//!
//! Own-view types hold a single slot each. Other-view types hold one slot per
//! view id. Replay order is registration order, own types first, remote views
//! ascending.

use std::collections::BTreeMap;

use wire::{Inbound, ViewId};

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

/// Document family reported by `status:`; decides which types are replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocKind {
    #[default]
    Text,
    Spreadsheet,
    Presentation,
    Drawing,
}

impl DocKind {
    #[must_use]
    pub fn from_status(doc_type: &str) -> Self {
        match doc_type {
            "spreadsheet" => Self::Spreadsheet,
            "presentation" => Self::Presentation,
            "drawing" => Self::Drawing,
            _ => Self::Text,
        }
    }

    fn own_types(self) -> &'static [&'static str] {
        match self {
            Self::Spreadsheet => &[
                "cellcursor",
                "referencemarks",
                "cellselectionarea",
                "textselection",
                "invalidatecursor",
                "textselectionstart",
                "textselectionend",
                "graphicselection",
            ],
            _ => &["invalidatecursor", "textselection", "graphicselection"],
        }
    }

    fn other_types(self) -> &'static [&'static str] {
        match self {
            Self::Spreadsheet => &["cellviewcursor", "textviewselection", "invalidateviewcursor", "graphicviewselection"],
            _ => &["textviewselection", "invalidateviewcursor"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayStore {
    kind: DocKind,
    own: Vec<(&'static str, Option<Inbound>)>,
    other: Vec<(&'static str, BTreeMap<ViewId, Inbound>)>,
}

impl ReplayStore {
    #[must_use]
    pub fn new(kind: DocKind) -> Self {
        Self {
            kind,
            own: kind.own_types().iter().map(|t| (*t, None)).collect(),
            other: kind.other_types().iter().map(|t| (*t, BTreeMap::new())).collect(),
        }
    }

    /// Re-register for `kind`. Entries of types registered under both kinds
    /// survive.
    pub fn set_doc_kind(&mut self, kind: DocKind) {
        if kind == self.kind {
            return;
        }
        let mut next = Self::new(kind);
        for (name, slot) in std::mem::take(&mut self.own) {
            if let Some(entry) = next.own.iter_mut().find(|(n, _)| *n == name) {
                entry.1 = slot;
            }
        }
        for (name, views) in std::mem::take(&mut self.other) {
            if let Some(entry) = next.other.iter_mut().find(|(n, _)| *n == name) {
                entry.1 = views;
            }
        }
        *self = next;
    }

    #[must_use]
    pub fn is_own_type(&self, kind: &str) -> bool {
        self.own.iter().any(|(name, _)| *name == kind)
    }

    #[must_use]
    pub fn is_other_type(&self, kind: &str) -> bool {
        self.other.iter().any(|(name, _)| *name == kind)
    }

    /// Store `msg`, overwriting the previous entry of its slot. `view_id` is
    /// `None` for own-view messages. Returns false for unregistered types.
    pub fn save(&mut self, msg: &Inbound, view_id: Option<ViewId>) -> bool {
        if let Some(view) = view_id {
            let Some((_, views)) = self.other.iter_mut().find(|(name, _)| *name == msg.kind) else {
                return false;
            };
            views.insert(view, msg.clone());
            return true;
        }

        let Some(slot) = self.own.iter_mut().find(|(name, _)| *name == msg.kind) else {
            return false;
        };
        slot.1 = Some(msg.clone());
        if msg.kind == "textselection" && msg.payload.trim().is_empty() {
            for (name, slot) in &mut self.own {
                if matches!(*name, "textselectionstart" | "textselectionend") {
                    *slot = Some(Inbound::new(*name, ""));
                }
            }
        }
        true
    }

    /// Every stored message in replay order. After a part change the own
    /// graphic selection belongs to the old part and is skipped.
    #[must_use]
    pub fn replay_all(&self, part_changed: bool) -> Vec<Inbound> {
        let own = self
            .own
            .iter()
            .filter(|(name, _)| !(part_changed && *name == "graphicselection"))
            .filter_map(|(_, slot)| slot.clone());
        let other = self.other.iter().flat_map(|(_, views)| views.values().cloned());
        own.chain(other).collect()
    }

    /// Stored messages of one remote view, in registration order.
    #[must_use]
    pub fn replay_view(&self, view: ViewId) -> Vec<Inbound> {
        self.other.iter().filter_map(|(_, views)| views.get(&view).cloned()).collect()
    }

    #[must_use]
    pub fn has_view(&self, view: ViewId) -> bool {
        self.other.iter().any(|(_, views)| views.contains_key(&view))
    }

    pub fn remove_view(&mut self, view: ViewId) {
        for (_, views) in &mut self.other {
            views.remove(&view);
        }
    }

    pub fn clear(&mut self) {
        self.clear_keep_other();
        for (_, views) in &mut self.other {
            views.clear();
        }
    }

    /// Drop own-view entries only.
    pub fn clear_keep_other(&mut self) {
        for (_, slot) in &mut self.own {
            *slot = None;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.own.iter().filter(|(_, slot)| slot.is_some()).count()
            + self.other.iter().map(|(_, views)| views.len()).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReplayStore {
    fn default() -> Self {
        Self::new(DocKind::default())
    }
}
