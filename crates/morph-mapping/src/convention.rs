//! Plug-ins that shape a mapping beyond what intersection analysis finds.

use morph_core::FieldPath;

use crate::error::MappingError;
use crate::factory::MappingFactoryContext;

/// Hooks run during compilation. Both default to doing nothing.
///
/// Conventions run before intersection-driven factories, so bindings they add
/// take precedence for their destinations.
pub trait Convention: Send + Sync {
    /// Called once per top-level source field, in declaration order.
    ///
    /// # Errors
    ///
    /// Errors abort the compilation.
    fn make_model_field(
        &self,
        _context: &mut MappingFactoryContext<'_>,
        _source: &FieldPath,
    ) -> Result<(), MappingError> {
        Ok(())
    }

    /// Called once after every binding has been produced.
    ///
    /// # Errors
    ///
    /// Errors abort the compilation.
    fn finalize_model(&self, _context: &mut MappingFactoryContext<'_>) -> Result<(), MappingError> {
        Ok(())
    }
}
