//! Chain compositor.
//!
//! A chain bundles existing channels under one annotation name. Applying it
//! applies each member in order, so one field chain `| a | b` feeds the first
//! member with `a` and the second with `b`.

use heck::ToSnakeCase;

use crate::channel::{Annotate, Channel};
use crate::error::{CodegenError, CodegenResult};

/// An ordered composition of channels applied as one annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    name: String,
    members: Vec<Channel>,
}

impl Chain {
    /// Composes `members` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::EmptyChain`] when `members` is empty.
    pub fn compose(name: &str, members: Vec<Channel>) -> CodegenResult<Self> {
        let chain = name.to_snake_case();
        if members.is_empty() {
            return Err(CodegenError::EmptyChain { chain });
        }
        Ok(Self {
            name: chain,
            members,
        })
    }

    /// Chain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Annotate for Chain {
    fn annotation_name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> &[Channel] {
        &self.members
    }
}
