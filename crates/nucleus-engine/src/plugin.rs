//! Plugins, plugin data, and data managers.
//!
//! A [`Plugin`] bundles an id, its dependencies, a set of immutable
//! [`PluginData`] snapshots, and an initializer that constructs the
//! plugin's [`DataManager`]s. Plugins are immutable after construction
//! and consumed by the orchestrator during simulation startup.

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use nucleus_core::{ContractError, PluginId};

use crate::context::Context;

/// An immutable, versioned snapshot of a data manager's state.
///
/// The only persisted representation of a plugin's data across a
/// pause/resume boundary. Implementations are value types built via
/// builders that clone-then-mutate on the first write after a build
/// (`Rc::make_mut` gives this for free — see the test-utils fixtures).
pub trait PluginData: 'static {
    /// Upcast for typed retrieval via [`Plugin::data`] and
    /// [`PluginContext::plugin_data`].
    fn as_any(&self) -> &dyn Any;
}

/// The mutable-state owner for one plugin's domain.
///
/// # Lifecycle
///
/// Constructed by the plugin initializer from the plugin's data
/// snapshots, then [`init`](DataManager::init)-ed exactly once, in
/// plugin dependency order. `init` is the only place a manager may
/// register event subscriptions and labelers — that is what makes
/// re-running `init` on a resumed run reproduce identical
/// registrations.
///
/// Managers never hold direct references to other managers; every
/// cross-manager call goes through [`Context::data_manager`] so resumed
/// runs rebuild the same reference graph.
pub trait DataManager: 'static {
    /// One-time initialization: register subscriptions, labelers, and
    /// initial plans.
    ///
    /// Looking up another data manager here resolves only managers that
    /// were already initialized by an earlier-ordered plugin.
    fn init(&mut self, ctx: &mut Context) -> Result<(), ContractError>;

    /// Export a finalized snapshot of this manager's state for
    /// checkpointing.
    fn checkpoint(&self, ctx: &Context) -> Box<dyn PluginData>;
}

/// Signature of a plugin initializer.
///
/// `Rc`-shared so a checkpoint can rebuild the plugin with fresh data
/// and the same behavior.
pub type PluginInit = dyn Fn(&mut PluginContext<'_>) -> Result<(), ContractError>;

/// A plugin: id, ordered dependencies, data snapshots, and initializer.
pub struct Plugin {
    id: PluginId,
    dependencies: Vec<PluginId>,
    data: Vec<Box<dyn PluginData>>,
    initializer: Option<Rc<PluginInit>>,
}

impl Plugin {
    /// Start building a plugin with the given id.
    pub fn builder(id: PluginId) -> PluginBuilder {
        PluginBuilder {
            id,
            dependencies: Vec::new(),
            data: Vec::new(),
            initializer: None,
        }
    }

    /// The plugin id.
    pub fn id(&self) -> PluginId {
        self.id
    }

    /// Declared dependencies, in declaration order.
    pub fn dependencies(&self) -> &[PluginId] {
        &self.dependencies
    }

    /// The first data snapshot of type `D`, if present.
    pub fn data<D: PluginData>(&self) -> Option<&D> {
        self.data.iter().find_map(|d| d.as_any().downcast_ref())
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        PluginId,
        Vec<PluginId>,
        Vec<Box<dyn PluginData>>,
        Option<Rc<PluginInit>>,
    ) {
        (self.id, self.dependencies, self.data, self.initializer)
    }

    pub(crate) fn from_parts(
        id: PluginId,
        dependencies: Vec<PluginId>,
        data: Vec<Box<dyn PluginData>>,
        initializer: Option<Rc<PluginInit>>,
    ) -> Self {
        Self {
            id,
            dependencies,
            data,
            initializer,
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("data", &self.data.len())
            .field("has_initializer", &self.initializer.is_some())
            .finish()
    }
}

/// Builder for [`Plugin`].
pub struct PluginBuilder {
    id: PluginId,
    dependencies: Vec<PluginId>,
    data: Vec<Box<dyn PluginData>>,
    initializer: Option<Rc<PluginInit>>,
}

impl PluginBuilder {
    /// Declare a dependency on another plugin.
    pub fn with_dependency(mut self, id: PluginId) -> Self {
        self.dependencies.push(id);
        self
    }

    /// Attach a data snapshot.
    pub fn with_data(mut self, data: impl PluginData) -> Self {
        self.data.push(Box::new(data));
        self
    }

    /// Set the initializer that constructs the plugin's data managers.
    pub fn with_initializer(
        mut self,
        init: impl Fn(&mut PluginContext<'_>) -> Result<(), ContractError> + 'static,
    ) -> Self {
        self.initializer = Some(Rc::new(init));
        self
    }

    /// Finish building.
    pub fn build(self) -> Plugin {
        Plugin {
            id: self.id,
            dependencies: self.dependencies,
            data: self.data,
            initializer: self.initializer,
        }
    }
}

/// The view a plugin initializer gets of the simulation.
///
/// Scopes data-manager registration to the plugin being initialized and
/// exposes the plugin's own data snapshots.
pub struct PluginContext<'a> {
    ctx: &'a mut Context,
    plugin: PluginId,
    data: &'a [Box<dyn PluginData>],
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(
        ctx: &'a mut Context,
        plugin: PluginId,
        data: &'a [Box<dyn PluginData>],
    ) -> Self {
        Self { ctx, plugin, data }
    }

    /// The id of the plugin being initialized.
    pub fn plugin_id(&self) -> PluginId {
        self.plugin
    }

    /// The plugin's first data snapshot of type `D`, if present.
    pub fn plugin_data<D: PluginData>(&self) -> Option<&D> {
        self.data.iter().find_map(|d| d.as_any().downcast_ref())
    }

    /// Register a data manager owned by this plugin.
    ///
    /// # Errors
    ///
    /// `DUPLICATE_DATA_MANAGER` if a manager of the same type is
    /// already registered.
    pub fn add_data_manager<T: DataManager>(&mut self, manager: T) -> Result<(), ContractError> {
        self.ctx.register_manager(self.plugin, manager)
    }
}

// Initializers use the full context surface (plans, subscriptions) in
// addition to the plugin-scoped methods above.
impl Deref for PluginContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for PluginContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}
