// Utilities module
//
// This module contains common utility functions:
// - path: Path joining, trimming and resolution helpers
// - validation: Common validation helpers

pub mod path;
pub mod validation;
