//! Forms - the owner of all blocks and of the collaborators.
//!
//! A [`Form`] holds its blocks in form order and addresses them by
//! [`BlockId`] index; blocks never reference each other. It also owns the
//! persistence and presentation collaborators and the per-block trigger
//! implementations, so every operation that crosses a block boundary goes
//! through it.
//!
//! # Components
//! - [`Form`] / [`FormBuilder`] - The form and its configuration
//! - [`FormFlavor`] - Standard or dictionary reset behaviour
//! - [`Trigger`] / [`Triggers`] - Lifecycle hooks
//! - `mode` - The block mode state machine (QUERY / INSERT / UPDATE)

mod mode;
mod triggers;

pub use triggers::{NoTriggers, Trigger, TriggerSite, Triggers};

use std::collections::HashSet;

use tracing::{debug, error, trace};

use crate::block::{Block, BlockBuilder, BlockEvent, MasterLink};
use crate::common::{BlockId, Error, MessageCode, Result};
use crate::dispatch::DispatchStats;
use crate::persistence::{MemoryPersistence, Persistence};
use crate::presentation::{FocusTarget, Presentation, ScriptedPresentation};

/// How resetting a block behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormFlavor {
    /// Reset clears the block and returns it to QUERY.
    #[default]
    Standard,
    /// Reset clears the whole form (without per-block confirmation).
    Dictionary,
}

/// A form: blocks plus the services they share.
pub struct Form {
    name: String,
    flavor: FormFlavor,
    pub(crate) blocks: Vec<Block>,
    pub(crate) triggers: Vec<Box<dyn Triggers>>,
    pub(crate) active_block: usize,
    pub(crate) persistence: Box<dyn Persistence>,
    pub(crate) presentation: Box<dyn Presentation>,
    pub(crate) stats: DispatchStats,
}

impl Form {
    // ========================================================================
    // Read-only accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flavor(&self) -> FormFlavor {
        self.flavor
    }

    /// Blocks in form order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    /// Mutable block access for field setters and typed text.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.0)
    }

    pub fn block_id(&self, name: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|b| b.name() == name)
            .map(BlockId::new)
    }

    pub fn active_block(&self) -> BlockId {
        BlockId::new(self.active_block)
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Drain the events of every block, in form order.
    pub fn take_events(&mut self) -> Vec<(BlockId, BlockEvent)> {
        self.blocks
            .iter_mut()
            .flat_map(|b| {
                let id = b.id();
                b.take_events().into_iter().map(move |e| (id, e))
            })
            .collect()
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    pub(crate) fn get(&self, id: BlockId) -> Result<&Block> {
        self.blocks
            .get(id.0)
            .ok_or_else(|| Error::internal(format!("form {} has no {}", self.name, id)))
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        let name = &self.name;
        self.blocks
            .get_mut(id.0)
            .ok_or_else(|| Error::internal(format!("form {} has no {}", name, id)))
    }

    /// Run the block's hook for `trigger`.
    pub(crate) fn fire(&mut self, trigger: Trigger, id: BlockId, site: TriggerSite) -> Result<()> {
        let (Some(block), Some(hooks)) = (self.blocks.get_mut(id.0), self.triggers.get_mut(id.0))
        else {
            return Err(Error::internal(format!("trigger {} for unknown {}", trigger, id)));
        };
        trace!(block = %block.name(), %trigger, record = site.record, "trigger");
        hooks.fire(trigger, block, site)
    }

    pub(crate) fn ask(&mut self, message: MessageCode) -> bool {
        self.presentation.ask(message, &[])
    }

    /// Focus a field of a block (or the block itself when `field` is `None`).
    pub(crate) fn focus_field(&mut self, id: BlockId, field: Option<usize>, record: usize) {
        let Some(block) = self.blocks.get_mut(id.0) else {
            return;
        };
        block.set_active_field(field);
        let target = match block.active_field() {
            Some(index) => FocusTarget::Field {
                field: block.fields()[index].id(),
                record,
            },
            None => FocusTarget::Block(id),
        };
        block.push_event(BlockEvent::Focus(target));
        self.presentation.focus(target);
    }

    pub(crate) fn focus_block(&mut self, id: BlockId) {
        let first = self.blocks.get(id.0).and_then(Block::first_enterable_field);
        let record = self.blocks.get(id.0).map_or(0, Block::active_record);
        self.focus_field(id, first, record);
    }

    /// Run `step` as an atomic transition of block `id`.
    ///
    /// On failure the block is put back exactly as it was.
    pub(crate) fn transition<T>(
        &mut self,
        id: BlockId,
        step: impl FnOnce(&mut Form) -> Result<T>,
    ) -> Result<T> {
        let checkpoint = self.get(id)?.checkpoint();
        match step(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(block) = self.blocks.get_mut(id.0) {
                    debug!(block = %block.name(), error = %err, "transition rolled back");
                    block.restore(checkpoint);
                }
                Err(err)
            }
        }
    }

    /// Deliver a failed action to the user.
    ///
    /// Field errors refocus the field, execution failures and internal
    /// errors become notifications, and aborts stay silent.
    pub fn report_failure(&mut self, err: &Error) {
        match err {
            Error::Aborted => {}
            Error::Field(field_err) => {
                let id = field_err.field.block;
                let record = self.blocks.get(id.0).map_or(0, Block::active_record);
                self.focus_field(id, Some(field_err.field.index), record);
                self.presentation.report(err);
            }
            Error::Internal(message) => {
                error!(form = %self.name, %message, "internal inconsistency");
                self.presentation.report(err);
            }
            Error::ExecFailed { .. } | Error::NoData => self.presentation.report(err),
        }
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("name", &self.name)
            .field("flavor", &self.flavor)
            .field("blocks", &self.blocks.len())
            .field("active_block", &self.active_block)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a form from block definitions and collaborators.
///
/// # Example
/// ```
/// use visforms::block::BlockBuilder;
/// use visforms::field::{FieldBuilder, FieldKind};
/// use visforms::form::FormBuilder;
///
/// let form = FormBuilder::new("staff")
///     .block(BlockBuilder::new("emp").table("emp")
///         .field(FieldBuilder::new("name", FieldKind::string(40))))
///     .build()
///     .unwrap();
/// assert_eq!(form.blocks().len(), 1);
/// ```
pub struct FormBuilder {
    name: String,
    flavor: FormFlavor,
    blocks: Vec<(BlockBuilder, Option<Box<dyn Triggers>>)>,
    persistence: Option<Box<dyn Persistence>>,
    presentation: Option<Box<dyn Presentation>>,
}

impl FormBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flavor: FormFlavor::Standard,
            blocks: Vec::new(),
            persistence: None,
            presentation: None,
        }
    }

    pub fn flavor(mut self, flavor: FormFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn block(mut self, block: BlockBuilder) -> Self {
        self.blocks.push((block, None));
        self
    }

    pub fn block_with_triggers(mut self, block: BlockBuilder, triggers: impl Triggers + 'static) -> Self {
        self.blocks.push((block, Some(Box::new(triggers))));
        self
    }

    /// Defaults to an empty [`MemoryPersistence`].
    pub fn persistence(mut self, persistence: impl Persistence + 'static) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    /// Defaults to a [`ScriptedPresentation`] that answers "yes".
    pub fn presentation(mut self, presentation: impl Presentation + 'static) -> Self {
        self.presentation = Some(Box::new(presentation));
        self
    }

    /// Build all blocks and resolve master/detail links.
    ///
    /// Configuration mistakes (duplicate names, unknown link targets, a
    /// master that does not precede its detail) are internal errors.
    pub fn build(self) -> Result<Form> {
        let config_error = |what: String| Error::internal(format!("form {}: {}", self.name, what));
        if self.blocks.is_empty() {
            return Err(config_error("no blocks".into()));
        }

        let mut names = HashSet::new();
        let mut blocks = Vec::with_capacity(self.blocks.len());
        let mut triggers: Vec<Box<dyn Triggers>> = Vec::with_capacity(self.blocks.len());
        let mut links = Vec::with_capacity(self.blocks.len());
        for (index, (builder, hooks)) in self.blocks.into_iter().enumerate() {
            if !names.insert(builder.name().to_string()) {
                return Err(config_error(format!("duplicate block {}", builder.name())));
            }
            links.push(builder.master_spec().cloned());
            blocks.push(builder.build(BlockId::new(index))?);
            triggers.push(hooks.unwrap_or_else(|| Box::new(NoTriggers)));
        }

        for (index, link) in links.into_iter().enumerate() {
            let Some((master_name, pairs)) = link else {
                continue;
            };
            let master = blocks
                .iter()
                .position(|b: &Block| b.name() == master_name)
                .ok_or_else(|| config_error(format!("unknown master block {}", master_name)))?;
            if master >= index {
                return Err(config_error(format!(
                    "master {} must precede detail {}",
                    master_name,
                    blocks[index].name()
                )));
            }
            let pairs = pairs
                .iter()
                .map(|(detail_field, master_field)| {
                    let d = blocks[index].field_index(detail_field);
                    let m = blocks[master].field_index(master_field);
                    match (d, m) {
                        (Some(d), Some(m)) => Ok((d, m)),
                        _ => Err(config_error(format!(
                            "unknown link {} = {}.{}",
                            detail_field, master_name, master_field
                        ))),
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            blocks[index].set_master(MasterLink {
                master: BlockId::new(master),
                pairs,
            });
        }

        debug!(form = %self.name, blocks = blocks.len(), "form built");
        Ok(Form {
            name: self.name,
            flavor: self.flavor,
            blocks,
            triggers,
            active_block: 0,
            persistence: self
                .persistence
                .unwrap_or_else(|| Box::new(MemoryPersistence::new())),
            presentation: self
                .presentation
                .unwrap_or_else(|| Box::new(ScriptedPresentation::new())),
            stats: DispatchStats::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldBuilder, FieldKind};

    fn two_blocks() -> FormBuilder {
        FormBuilder::new("orders")
            .block(
                BlockBuilder::new("head")
                    .table("head")
                    .field(FieldBuilder::new("no", FieldKind::integer())),
            )
            .block(
                BlockBuilder::new("line")
                    .table("line")
                    .field(FieldBuilder::new("head_no", FieldKind::integer()))
                    .master("head", &[("head_no", "no")]),
            )
    }

    #[test]
    fn test_build_resolves_master_link() {
        let form = two_blocks().build().unwrap();
        let line = form.block(BlockId::new(1)).unwrap();
        assert_eq!(
            line.master(),
            Some(&MasterLink {
                master: BlockId::new(0),
                pairs: vec![(0, 0)],
            })
        );
        assert_eq!(form.block_id("line"), Some(BlockId::new(1)));
    }

    #[test]
    fn test_build_rejects_empty_form() {
        assert!(matches!(FormBuilder::new("x").build(), Err(Error::Internal(_))));
    }

    #[test]
    fn test_build_rejects_duplicate_block() {
        let result = FormBuilder::new("x")
            .block(BlockBuilder::new("a"))
            .block(BlockBuilder::new("a"))
            .build();
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_build_rejects_master_after_detail() {
        let result = FormBuilder::new("x")
            .block(BlockBuilder::new("d").master("m", &[]))
            .block(BlockBuilder::new("m"))
            .build();
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_build_rejects_unknown_link_field() {
        let result = FormBuilder::new("x")
            .block(BlockBuilder::new("m"))
            .block(BlockBuilder::new("d").master("m", &[("a", "b")]))
            .build();
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_transition_restores_on_error() {
        let mut form = two_blocks().build().unwrap();
        let id = BlockId::new(0);
        let result: Result<()> = form.transition(id, |form| {
            let block = form.get_mut(id)?;
            block.field_mut(0)?.set_int(0, 5)?;
            Err(Error::Aborted)
        });

        assert_eq!(result, Err(Error::Aborted));
        assert!(form.block(id).unwrap().field(0).unwrap().is_null(0));
    }

    #[test]
    fn test_fire_runs_block_hooks() {
        let mut fired = Vec::new();
        let form_hooks = move |trigger: Trigger, _block: &mut Block, _site: TriggerSite| {
            if trigger == Trigger::PreBlock {
                return Err(Error::exec_message("blocked"));
            }
            fired.push(trigger);
            Ok(())
        };
        let mut form = FormBuilder::new("x")
            .block_with_triggers(BlockBuilder::new("a"), form_hooks)
            .build()
            .unwrap();

        let site = TriggerSite {
            field: None,
            record: 0,
        };
        assert!(form.fire(Trigger::PostBlock, BlockId::new(0), site).is_ok());
        assert!(form.fire(Trigger::PreBlock, BlockId::new(0), site).is_err());
        assert!(matches!(
            form.fire(Trigger::PreBlock, BlockId::new(3), site),
            Err(Error::Internal(_))
        ));
    }

    #[test]
    fn test_take_events_tags_blocks() {
        let mut form = two_blocks().build().unwrap();
        form.focus_block(BlockId::new(1));
        let events = form.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, BlockId::new(1));
        assert!(form.take_events().is_empty());
    }
}
