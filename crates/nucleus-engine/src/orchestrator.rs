//! Plugin dependency resolution and initialization.
//!
//! Plugins are ordered by a deterministic topological sort: among the
//! plugins whose dependencies are all satisfied, the one declared first
//! is initialized first. The same plugin set therefore always produces
//! the same initialization order, which fixes subscription sequence
//! numbers and manager registration order across runs.

use std::rc::Rc;

use indexmap::IndexSet;
use nucleus_core::{ContractError, ErrorCode, PluginId};

use crate::context::Context;
use crate::plugin::{Plugin, PluginContext, PluginData, PluginInit};

/// What survives of a plugin after initialization: enough to rebuild it
/// for a checkpoint.
pub(crate) struct PluginRecord {
    pub(crate) id: PluginId,
    pub(crate) dependencies: Vec<PluginId>,
    pub(crate) initializer: Option<Rc<PluginInit>>,
}

/// Order `plugins` so every plugin follows its dependencies.
///
/// # Errors
///
/// `DUPLICATE_PLUGIN_ID` if two plugins share an id,
/// `MISSING_PLUGIN_DEPENDENCY` if a declared dependency is absent,
/// `CIRCULAR_PLUGIN_DEPENDENCIES` if no topological order exists.
pub(crate) fn resolve_order(plugins: Vec<Plugin>) -> Result<Vec<Plugin>, ContractError> {
    let mut ids: IndexSet<PluginId> = IndexSet::with_capacity(plugins.len());
    for plugin in &plugins {
        if !ids.insert(plugin.id()) {
            return Err(ContractError::with_detail(
                ErrorCode::DuplicatePluginId,
                plugin.id().to_string(),
            ));
        }
    }
    for plugin in &plugins {
        for dep in plugin.dependencies() {
            if !ids.contains(dep) {
                return Err(ContractError::with_detail(
                    ErrorCode::MissingPluginDependency,
                    format!("{} requires {dep}", plugin.id()),
                ));
            }
        }
    }

    let mut remaining: Vec<Option<Plugin>> = plugins.into_iter().map(Some).collect();
    let mut resolved: IndexSet<PluginId> = IndexSet::with_capacity(remaining.len());
    let mut ordered = Vec::with_capacity(remaining.len());
    while ordered.len() < remaining.len() {
        let next = remaining.iter().position(|slot| {
            slot.as_ref().is_some_and(|p| {
                p.dependencies().iter().all(|dep| resolved.contains(dep))
            })
        });
        match next {
            Some(idx) => {
                let plugin = remaining[idx].take().expect("position matched a live slot");
                resolved.insert(plugin.id());
                ordered.push(plugin);
            }
            None => {
                let stuck: Vec<String> = remaining
                    .iter()
                    .flatten()
                    .map(|p| p.id().to_string())
                    .collect();
                return Err(ContractError::with_detail(
                    ErrorCode::CircularPluginDependencies,
                    stuck.join(", "),
                ));
            }
        }
    }
    Ok(ordered)
}

/// Initialize `plugins` against `ctx` in dependency order.
///
/// For each plugin: run its initializer (which registers the plugin's
/// data managers), then call `init` on each newly registered manager in
/// registration order, marking each initialized before the next so a
/// manager may look up managers registered earlier in the same plugin.
pub(crate) fn initialize_plugins(
    ctx: &mut Context,
    plugins: Vec<Plugin>,
) -> Result<Vec<PluginRecord>, ContractError> {
    let ordered = resolve_order(plugins)?;
    let mut records = Vec::with_capacity(ordered.len());
    for plugin in ordered {
        let (id, dependencies, data, initializer) = plugin.into_parts();
        if let Some(init) = initializer.as_ref() {
            let mut plugin_ctx = PluginContext::new(ctx, id, &data);
            init(&mut plugin_ctx)?;
        }
        for (type_id, manager) in ctx.pending_managers() {
            manager.borrow_mut().init(ctx)?;
            ctx.mark_initialized(type_id);
        }
        records.push(PluginRecord {
            id,
            dependencies,
            initializer,
        });
    }
    Ok(records)
}

/// Rebuild plugins from their records and a checkpoint's data
/// snapshots, preserving initialization order.
pub(crate) fn rebuild_plugins(
    records: &[PluginRecord],
    mut data: Vec<(PluginId, Box<dyn PluginData>)>,
) -> Vec<Plugin> {
    let mut plugins = Vec::with_capacity(records.len());
    for record in records {
        let mut plugin_data = Vec::new();
        let mut rest = Vec::with_capacity(data.len());
        for (id, boxed) in data {
            if id == record.id {
                plugin_data.push(boxed);
            } else {
                rest.push((id, boxed));
            }
        }
        data = rest;
        plugins.push(Plugin::from_parts(
            record.id,
            record.dependencies.clone(),
            plugin_data,
            record.initializer.clone(),
        ));
    }
    plugins
}
