//! Named handler constraints - registration and resolution.
//!
//! A collection may be constrained so that every handler it accepts
//! satisfies a named contract. Rust has no runtime interface lookup, so
//! the crate keeps a process-wide registry of definitions collected at
//! link time via `inventory`:
//!
//! - [`ContractDef`] names an interface-like contract and supplies its
//!   instance check
//! - [`HandlerTypeDef`] names a concrete handler type and lists the
//!   contracts it satisfies
//!
//! Constraint identifiers resolve against both: a collection can be
//! constrained to a contract or pinned to a single handler type.
//!
//! # Example
//!
//! ```
//! use handler_collection::{contract, handler_type, Handler};
//!
//! struct JsonBody;
//! impl Handler for JsonBody {}
//!
//! contract!("BodyParser", |h| h.is::<JsonBody>());
//! handler_type!("JsonBody", JsonBody, contracts: ["BodyParser"]);
//!
//! fn main() {
//!     use handler_collection::constraint::Constraint;
//!
//!     let constraint = Constraint::resolve("BodyParser").unwrap();
//!     assert!(constraint.allows(&JsonBody));
//!     assert!(constraint.accepts_type("JsonBody"));
//!     assert!(Constraint::resolve("NoSuchContract").is_err());
//! }
//! ```

use tracing::debug;

use crate::error::{CollectionError, Result};
use crate::handler::Handler;

/// An interface-like contract a collection can be constrained to.
pub struct ContractDef {
    /// Registry name, matched against constraint identifiers.
    pub name: &'static str,
    /// Instance check: does this handler satisfy the contract?
    pub satisfies: fn(&dyn Handler) -> bool,
}

/// Static contract registration entry.
/// Wrapper for `inventory::collect!`.
pub struct ContractReg(pub ContractDef);

inventory::collect!(ContractReg);

/// A named concrete handler type with its contract memberships.
///
/// Backs acceptance queries over type identifiers: a type name that was
/// never registered is unknown, and unknown names are never accepted.
pub struct HandlerTypeDef {
    /// Registry name, matched against type identifiers.
    pub name: &'static str,
    /// Names of the contracts instances of this type satisfy.
    pub contracts: &'static [&'static str],
    /// Instance-of check for this concrete type.
    pub is: fn(&dyn Handler) -> bool,
}

/// Static handler type registration entry.
/// Wrapper for `inventory::collect!`.
pub struct HandlerTypeReg(pub HandlerTypeDef);

inventory::collect!(HandlerTypeReg);

/// Register a contract under a name.
///
/// The check receives `&dyn Handler` and decides whether the instance
/// satisfies the contract.
#[macro_export]
macro_rules! contract {
    ($name:literal, $satisfies:expr) => {
        $crate::inventory::submit! {
            $crate::constraint::ContractReg($crate::constraint::ContractDef {
                name: $name,
                satisfies: $satisfies,
            })
        }
    };
}

/// Register a concrete handler type under a name, with the contracts its
/// instances satisfy.
#[macro_export]
macro_rules! handler_type {
    ($name:literal, $ty:ty) => {
        $crate::handler_type!($name, $ty, contracts: []);
    };
    ($name:literal, $ty:ty, contracts: [$($contract:literal),* $(,)?]) => {
        $crate::inventory::submit! {
            $crate::constraint::HandlerTypeReg($crate::constraint::HandlerTypeDef {
                name: $name,
                contracts: &[$($contract),*],
                is: |h| h.is::<$ty>(),
            })
        }
    };
}

/// Look up a registered contract by name.
pub fn find_contract(name: &str) -> Option<&'static ContractDef> {
    inventory::iter::<ContractReg>
        .into_iter()
        .map(|r| &r.0)
        .find(|def| def.name == name)
}

/// Look up a registered handler type by name.
pub fn find_handler_type(name: &str) -> Option<&'static HandlerTypeDef> {
    inventory::iter::<HandlerTypeReg>
        .into_iter()
        .map(|r| &r.0)
        .find(|def| def.name == name)
}

/// A constraint resolved against the registry.
///
/// Resolution copies the name and check out of the matching definition;
/// collections carry the result by value, so instances derived from an
/// immutable collection inherit it unchanged.
#[derive(Clone, Copy)]
pub struct Constraint {
    name: &'static str,
    check: fn(&dyn Handler) -> bool,
}

impl Constraint {
    /// Resolve a constraint identifier against the registered contracts
    /// and handler types.
    ///
    /// Contracts take precedence; a handler type name pins the
    /// constraint to that single type.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::InvalidConstraint`] if the name matches
    /// neither a contract nor a handler type.
    pub fn resolve(name: &str) -> Result<Self> {
        if let Some(def) = find_contract(name) {
            return Ok(Self {
                name: def.name,
                check: def.satisfies,
            });
        }
        if let Some(def) = find_handler_type(name) {
            return Ok(Self {
                name: def.name,
                check: def.is,
            });
        }
        debug!(constraint = name, "constraint did not resolve");
        Err(CollectionError::InvalidConstraint(name.to_string()))
    }

    /// Name the constraint was registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check a handler instance against the constraint.
    pub fn allows(&self, handler: &dyn Handler) -> bool {
        (self.check)(handler)
    }

    /// Whether instances of the named handler type would satisfy this
    /// constraint.
    ///
    /// Unknown type names are reported as not accepted rather than
    /// erroring.
    pub fn accepts_type(&self, name: &str) -> bool {
        match find_handler_type(name) {
            Some(def) => def.name == self.name || def.contracts.contains(&self.name),
            None => false,
        }
    }
}

impl std::fmt::Debug for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constraint")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
