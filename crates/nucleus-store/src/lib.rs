//! Default-compressed property value containers for the Nucleus kernel.
//!
//! Domain plugins store per-entity property values in the containers
//! defined here. Storage is dense and indexed by small integer ids; only
//! deviations from a declared default occupy memory semantics-wise — an
//! id that was never written reads back the default without any backing
//! slot having been touched.
//!
//! # Containers
//!
//! - [`BoolStore`] — bit-packed, one bit per id plus a shared default bit
//! - [`IntStore`], [`FloatStore`], [`DoubleStore`] — dense scalar arrays
//! - [`ObjectStore`] — dense array of any `Clone` type
//! - [`PropertyManager`] — a definition-validated table over the scalar
//!   containers with optional assignment-time tracking
//!
//! All containers share the same contract: `get` returns the default for
//! ids never set, `set` grows capacity geometrically, and `remove_id` is
//! a lazy no-op with respect to stored content.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boolean;
mod dense;
pub mod definition;
pub mod manager;
pub mod numeric;
pub mod object;

pub use boolean::BoolStore;
pub use definition::{PropertyDefinition, PropertyKind, PropertyValue, PropertyValueRecord};
pub use manager::PropertyManager;
pub use numeric::{DoubleStore, FloatStore, IntStore};
pub use object::ObjectStore;
