//! The per-worker selection cache.

use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use tracing::trace;

use crate::error::Result;
use crate::select::elem::SelectElem;
use crate::select::init;
use crate::select::param::SelectParam;
use crate::select::thresholds;
use crate::worker::{CfgIndex, Worker};

/// Maps packed selection parameters to their persistent decision, with a
/// one-slot fast path for the most recent lookup.
///
/// Worker-private: callers serialize all access. A failed construction is
/// never stored, so an unselectable parameter tuple is retried from scratch
/// on the next lookup.
pub struct SelectCache {
    hash: HashMap<u64, Arc<SelectElem>, RandomState>,
    last: Option<(u64, Arc<SelectElem>)>,
}

impl SelectCache {
    pub fn new() -> Self {
        Self {
            hash: HashMap::default(),
            last: None,
        }
    }

    /// Number of cached selection elements.
    pub fn len(&self) -> usize {
        self.hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }

    /// Return the decision for `select_param`, building and caching it on
    /// first use.
    pub fn lookup(
        &mut self,
        worker: &Worker,
        ep_cfg_index: CfgIndex,
        rkey_cfg_index: Option<CfgIndex>,
        select_param: &SelectParam,
    ) -> Result<Arc<SelectElem>> {
        let key = select_param.pack();
        if let Some(elem) = self.hash.get(&key) {
            return Ok(Arc::clone(elem));
        }

        // The insert below restructures the hash; the memoized fast-path
        // entry must not survive it.
        self.last = None;

        let elem = Arc::new(Self::build_elem(
            worker,
            ep_cfg_index,
            rkey_cfg_index,
            select_param,
        )?);
        self.hash.insert(key, Arc::clone(&elem));
        Ok(elem)
    }

    /// [`SelectCache::lookup`] with one-slot memoization of the most recent
    /// result.
    pub fn fast_lookup(
        &mut self,
        worker: &Worker,
        ep_cfg_index: CfgIndex,
        rkey_cfg_index: Option<CfgIndex>,
        select_param: &SelectParam,
    ) -> Result<Arc<SelectElem>> {
        let key = select_param.pack();
        if let Some((last_key, elem)) = &self.last {
            if *last_key == key {
                return Ok(Arc::clone(elem));
            }
        }
        let elem = self.lookup(worker, ep_cfg_index, rkey_cfg_index, select_param)?;
        self.last = Some((key, Arc::clone(&elem)));
        Ok(elem)
    }

    /// Cached elements, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SelectElem>> {
        self.hash.values()
    }

    fn build_elem(
        worker: &Worker,
        ep_cfg_index: CfgIndex,
        rkey_cfg_index: Option<CfgIndex>,
        select_param: &SelectParam,
    ) -> Result<SelectElem> {
        trace!(
            param = %select_param,
            ep_cfg_index,
            ?rkey_cfg_index,
            "initializing selection"
        );
        let proto_init = init::init_protocols(worker, ep_cfg_index, rkey_cfg_index, select_param)?;
        let list = thresholds::build_thresholds(proto_init.mask(), proto_init.caps_all(), select_param)?;
        Ok(SelectElem::assemble(proto_init, list, select_param))
    }
}

impl Default for SelectCache {
    fn default() -> Self {
        Self::new()
    }
}
