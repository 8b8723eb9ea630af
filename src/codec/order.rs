//! Ordering ledger for elements whose children mix typed fields and extensions
//!
//! Schema sequences are strict: writing children out of order produces
//! files Word refuses to open. Types that only know some of their children
//! record, while decoding, which typed field or which extras entry each
//! child was, and replay that sequence when encoding.

/// A typed child field with a position in the schema sequence
pub trait SchemaField: Copy + Eq {
    /// Position of the field in the schema sequence
    fn rank(self) -> u16;
}

/// One recorded child: a typed field or an index into the extras list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot<F> {
    Field(F),
    Extra(usize),
}

/// Decode-time record of child order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildOrder<F> {
    slots: Vec<Slot<F>>,
}

impl<F> Default for ChildOrder<F> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<F: SchemaField> ChildOrder<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a typed child; a repeated field keeps its first position
    pub fn push_field(&mut self, field: F) {
        if !self.slots.contains(&Slot::Field(field)) {
            self.slots.push(Slot::Field(field));
        }
    }

    /// Record an extension child by its index in the extras list
    pub fn push_extra(&mut self, index: usize) {
        self.slots.push(Slot::Extra(index));
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Emission sequence for the current state of the element.
    ///
    /// Recorded slots are replayed verbatim, skipping fields that are no
    /// longer set. Fields set after decoding are inserted right after the
    /// last typed field that precedes them in the schema, or first when none
    /// does. Extras added after decoding go last.
    pub fn resolve(&self, present: &[F], extras: usize) -> Vec<Slot<F>> {
        let mut slots: Vec<Slot<F>> = self
            .slots
            .iter()
            .copied()
            .filter(|slot| match slot {
                Slot::Field(f) => present.contains(f),
                Slot::Extra(i) => *i < extras,
            })
            .collect();

        let mut added: Vec<F> = present
            .iter()
            .copied()
            .filter(|f| !slots.contains(&Slot::Field(*f)))
            .collect();
        added.sort_by_key(|f| f.rank());

        for field in added {
            let pos = slots
                .iter()
                .rposition(|slot| matches!(slot, Slot::Field(other) if other.rank() < field.rank()))
                .map_or(0, |i| i + 1);
            slots.insert(pos, Slot::Field(field));
        }

        for i in 0..extras {
            if !slots.contains(&Slot::Extra(i)) {
                slots.push(Slot::Extra(i));
            }
        }

        slots
    }
}
